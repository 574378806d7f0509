use blake2::{
    digest::consts::{U28, U32},
    Blake2b, Digest,
};
use thiserror::Error;

pub use plutus_script::{PlutusScript, PlutusVersion};

/// On-chain data model and its CBOR codec
pub mod plutus_data;
/// Plutus scripts as they are published on-chain
pub mod plutus_script;

type Blake2b224 = Blake2b<U28>;
type Blake2b256 = Blake2b<U32>;

/// Blake2b hash with a 28 byte digest, used for script and key hashes
pub fn blake2b_224(bytes: &[u8]) -> [u8; 28] {
    Blake2b224::digest(bytes).into()
}

/// Blake2b hash with a 32 byte digest, used for transaction ids and script data hashes
pub fn blake2b_256(bytes: &[u8]) -> [u8; 32] {
    Blake2b256::digest(bytes).into()
}

#[allow(missing_docs)]
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScriptError {
    #[error("Failed to decode script bytes: {0:?}")]
    ScriptHexRetrieval(String),
    #[error("Failed to build script address: {0:?}")]
    Address(String),
}

#[allow(missing_docs)]
pub type ScriptResult<T> = Result<T, ScriptError>;
