use crate::scripts::{blake2b_224, plutus_script::network_id};
use async_trait::async_trait;
use ed25519_dalek::SigningKey;
use pallas_addresses::{Address, Network};
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

/// Environment variable holding the wallet's signing key
pub const SEED_VAR: &str = "SEED";

const KEY_ENTERPRISE_HEADER: u8 = 0b0110_0000;

#[allow(missing_docs)]
#[derive(Debug, Error)]
pub enum KeysError {
    #[error("Unable to read wallet's seed from env var {0}")]
    MissingSeed(String),
    #[error("Seed is not a hex encoded 32 byte Ed25519 key")]
    MalformedSeed,
    #[error("Failed to build wallet address: {0}")]
    Address(String),
}

#[allow(missing_docs)]
pub type KeysResult<T> = Result<T, KeysError>;

/// Source of the wallet's signing key
#[async_trait]
pub trait Keys: Send + Sync {
    /// Ed25519 key that signs transactions
    async fn signing_key(&self) -> KeysResult<SigningKey>;

    /// Enterprise address of the signing key's hash
    async fn base_addr(&self, network: Network) -> KeysResult<Address> {
        let key = self.signing_key().await?;
        key_hash_address(&key, network)
    }
}

/// Enterprise address of the payment key `key`
pub fn key_hash_address(key: &SigningKey, network: Network) -> KeysResult<Address> {
    let key_hash = blake2b_224(key.verifying_key().as_bytes());
    let mut bytes = Vec::with_capacity(29);
    bytes.push(KEY_ENTERPRISE_HEADER | network_id(network));
    bytes.extend_from_slice(&key_hash);
    Address::from_bytes(&bytes).map_err(|e| KeysError::Address(e.to_string()))
}

/// [`Keys`] read from the process environment each time they are needed
#[derive(Debug, Clone)]
pub struct EnvSeedKeys {
    var: String,
}

impl Default for EnvSeedKeys {
    fn default() -> Self {
        EnvSeedKeys::from_var(SEED_VAR)
    }
}

impl EnvSeedKeys {
    /// Read the seed from `var` instead of `SEED`
    pub fn from_var(var: &str) -> Self {
        EnvSeedKeys {
            var: var.to_string(),
        }
    }

    fn seed(&self) -> KeysResult<SecretString> {
        std::env::var(&self.var)
            .map(SecretString::new)
            .map_err(|_| KeysError::MissingSeed(self.var.clone()))
    }
}

#[async_trait]
impl Keys for EnvSeedKeys {
    async fn signing_key(&self) -> KeysResult<SigningKey> {
        let seed = self.seed()?;
        let bytes = hex::decode(seed.expose_secret().trim()).map_err(|_| KeysError::MalformedSeed)?;
        let secret: [u8; 32] = bytes.try_into().map_err(|_| KeysError::MalformedSeed)?;
        Ok(SigningKey::from_bytes(&secret))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_seed_is_reported_with_var_name() {
        let keys = EnvSeedKeys::from_var("ASTERIA_TEST_SEED_NEVER_SET");

        let err = keys.signing_key().await.unwrap_err();

        assert_eq!(
            err.to_string(),
            "Unable to read wallet's seed from env var ASTERIA_TEST_SEED_NEVER_SET"
        );
    }

    #[tokio::test]
    async fn seed_becomes_enterprise_address() {
        let var = "ASTERIA_TEST_SEED_ADDRESS";
        std::env::set_var(var, "11".repeat(32));
        let keys = EnvSeedKeys::from_var(var);

        let address = keys.base_addr(Network::Testnet).await.unwrap();

        let bytes = address.to_vec();
        assert_eq!(bytes[0], 0x60);
        assert_eq!(bytes.len(), 29);
    }

    #[tokio::test]
    async fn short_seed_is_malformed() {
        let var = "ASTERIA_TEST_SEED_SHORT";
        std::env::set_var(var, "abcd");
        let keys = EnvSeedKeys::from_var(var);

        let err = keys.signing_key().await.unwrap_err();

        assert!(matches!(err, KeysError::MalformedSeed));
    }
}
