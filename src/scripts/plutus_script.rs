use crate::scripts::{blake2b_224, ScriptError, ScriptResult};
use pallas_addresses::{Address, Network};
use serde::{Deserialize, Serialize};

const SCRIPT_ENTERPRISE_HEADER: u8 = 0b0111_0000;

/// Plutus language version of a script
#[allow(missing_docs)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PlutusVersion {
    V1,
    V2,
    V3,
}

impl PlutusVersion {
    /// Byte prepended to the script bytes before hashing
    pub fn language_tag(&self) -> u8 {
        match self {
            PlutusVersion::V1 => 1,
            PlutusVersion::V2 => 2,
            PlutusVersion::V3 => 3,
        }
    }
}

/// A Plutus script as it is stored in a transaction witness or a reference output. The same
/// script is used as a spending validator (through its address) and as a minting policy (through
/// its policy id).
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlutusScript {
    version: PlutusVersion,
    bytes: Vec<u8>,
}

impl PlutusScript {
    /// Constructor from the raw script bytes
    pub fn new(version: PlutusVersion, bytes: Vec<u8>) -> Self {
        PlutusScript { version, bytes }
    }

    /// Constructor from hex encoded script bytes
    pub fn from_hex(version: PlutusVersion, cbor_hex: &str) -> ScriptResult<Self> {
        let bytes =
            hex::decode(cbor_hex).map_err(|e| ScriptError::ScriptHexRetrieval(e.to_string()))?;
        Ok(PlutusScript { version, bytes })
    }

    /// Getter for script language version
    pub fn version(&self) -> PlutusVersion {
        self.version
    }

    /// Getter for raw script bytes
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Script hash: blake2b-224 of the language tag followed by the script bytes
    pub fn hash(&self) -> [u8; 28] {
        let mut tagged = Vec::with_capacity(self.bytes.len() + 1);
        tagged.push(self.version.language_tag());
        tagged.extend_from_slice(&self.bytes);
        blake2b_224(&tagged)
    }

    /// Policy id of the script when used as a minting policy, hex encoded
    pub fn policy_id(&self) -> String {
        hex::encode(self.hash())
    }

    /// Enterprise address locking outputs to this script
    pub fn address(&self, network: Network) -> ScriptResult<Address> {
        let mut bytes = Vec::with_capacity(29);
        bytes.push(SCRIPT_ENTERPRISE_HEADER | network_id(network));
        bytes.extend_from_slice(&self.hash());
        Address::from_bytes(&bytes).map_err(|e| ScriptError::Address(e.to_string()))
    }
}

/// Address header nibble for a given network
pub fn network_id(network: Network) -> u8 {
    match network {
        Network::Testnet => 0,
        Network::Mainnet => 1,
        Network::Other(inner) => inner,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn always_true() -> PlutusScript {
        PlutusScript::from_hex(PlutusVersion::V2, "4e4d01000033222220051200120011").unwrap()
    }

    #[test]
    fn hash_depends_on_language_version() {
        let v2 = always_true();
        let v3 = PlutusScript::new(PlutusVersion::V3, v2.bytes().to_vec());

        assert_ne!(v2.hash(), v3.hash());
        assert_eq!(v2.policy_id().len(), 56);
    }

    #[test]
    fn address_is_script_enterprise_address() {
        let script = always_true();

        let testnet = script.address(Network::Testnet).unwrap();
        let mainnet = script.address(Network::Mainnet).unwrap();

        let testnet_bytes = testnet.to_vec();
        assert_eq!(testnet_bytes[0], 0x70);
        assert_eq!(&testnet_bytes[1..], &script.hash());
        assert_eq!(mainnet.to_vec()[0], 0x71);
        assert!(testnet.to_bech32().unwrap().starts_with("addr_test1w"));
    }

    #[test]
    fn bad_hex_is_rejected() {
        let err = PlutusScript::from_hex(PlutusVersion::V2, "zz").unwrap_err();

        assert!(matches!(err, ScriptError::ScriptHexRetrieval(_)));
    }
}
