use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of a token held in a UTxO. Policy ids and asset names are hex encoded.
#[derive(PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Debug, Serialize, Deserialize)]
pub enum PolicyId {
    /// ADA as denominated in Lovelace (1 ADA = 1_000_000 Lovelace)
    Lovelace,
    /// Native token with policy id and optional asset name
    NativeToken(String, Option<String>),
}

impl PolicyId {
    /// Constructor for a native token whose asset name is given as raw bytes. An empty name is
    /// stored as `None`, the same form [`PolicyId::from_unit`] gives a bare policy id.
    pub fn native_token_named(id: &str, asset_name: &[u8]) -> PolicyId {
        let asset_name = if asset_name.is_empty() {
            None
        } else {
            Some(hex::encode(asset_name))
        };
        PolicyId::NativeToken(id.to_string(), asset_name)
    }

    /// Parse a Blockfrost style unit: `lovelace` or policy id hex followed by asset name hex
    pub fn from_unit(unit: &str) -> PolicyId {
        if unit == "lovelace" {
            PolicyId::Lovelace
        } else if unit.len() > 56 {
            let (id, asset) = unit.split_at(56);
            PolicyId::NativeToken(id.to_string(), Some(asset.to_string()))
        } else {
            PolicyId::NativeToken(unit.to_string(), None)
        }
    }

    /// Getter for asset name
    pub fn asset_name(&self) -> Option<String> {
        match self {
            PolicyId::Lovelace => None,
            PolicyId::NativeToken(_, asset_name) => asset_name.to_owned(),
        }
    }

    /// Asset name decoded from hex. Empty for Lovelace and unnamed tokens.
    pub fn asset_name_bytes(&self) -> Result<Vec<u8>, hex::FromHexError> {
        match self.asset_name() {
            Some(name) => hex::decode(name),
            None => Ok(Vec::new()),
        }
    }
}

impl fmt::Display for PolicyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PolicyId::Lovelace => write!(f, "lovelace"),
            PolicyId::NativeToken(id, None) => write!(f, "{id}"),
            PolicyId::NativeToken(id, Some(asset)) => write!(f, "{id}.{asset}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_splits_into_policy_and_asset_name() {
        let policy = "ab".repeat(28);
        let unit = format!("{policy}5348495035");

        let parsed = PolicyId::from_unit(&unit);

        assert_eq!(parsed, PolicyId::native_token_named(&policy, b"SHIP5"));
        assert_eq!(parsed.asset_name_bytes().unwrap(), b"SHIP5".to_vec());
        assert_eq!(PolicyId::from_unit("lovelace"), PolicyId::Lovelace);
    }

    #[test]
    fn empty_asset_name_matches_bare_unit() {
        let policy = "cd".repeat(28);

        let named = PolicyId::native_token_named(&policy, b"");

        assert_eq!(named, PolicyId::from_unit(&policy));
        assert_eq!(named.asset_name(), None);
        assert!(named.asset_name_bytes().unwrap().is_empty());
    }
}
