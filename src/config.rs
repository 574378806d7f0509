use crate::ledger_client::{
    blockfrost_client::BlockfrostLedgerClient,
    keys::Keys,
};
use dirs::home_dir;
use pallas_addresses::Network;
use secrecy::SecretString;
use serde::Deserialize;
use std::{fmt, fs, io, path::Path, path::PathBuf, str::FromStr};
use thiserror::Error;

/// Folder under the home directory holding the config file
pub const CONFIG_FOLDER: &str = ".asteria";
/// Name of the config file
pub const CONFIG_FILE: &str = "config.toml";

/// Blockfrost project id
pub const PROJECT_ID_VAR: &str = "BLOCKFROST_PROJECT_ID";
/// Blockfrost base url, optional
pub const URL_VAR: &str = "BLOCKFROST_URL";
/// `preprod`, `preview` or `mainnet`, optional
pub const NETWORK_VAR: &str = "ASTERIA_NETWORK";

/// Public Blockfrost endpoint of the preprod testnet
pub const PREPROD_URL: &str = "https://cardano-preprod.blockfrost.io/api/v0/";
/// Public Blockfrost endpoint of the preview testnet
pub const PREVIEW_URL: &str = "https://cardano-preview.blockfrost.io/api/v0/";
/// Public Blockfrost endpoint of mainnet
pub const MAINNET_URL: &str = "https://cardano-mainnet.blockfrost.io/api/v0/";

#[allow(missing_docs)]
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Could not find home directory")]
    NoHomeDir,
    #[error("Error while reading config file {0:?}: {1}")]
    FileRead(PathBuf, io::Error),
    #[error("Error while parsing Toml: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Missing environment variable {0}")]
    MissingVar(&'static str),
    #[error("Unknown network {0:?}, expected preprod, preview or mainnet")]
    UnknownNetwork(String),
}

#[allow(missing_docs)]
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Cardano network the client talks to
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum CardanoNetwork {
    Preprod,
    Preview,
    Mainnet,
}

impl CardanoNetwork {
    /// Public Blockfrost endpoint for the network
    pub fn default_endpoint(&self) -> &'static str {
        match self {
            CardanoNetwork::Preprod => PREPROD_URL,
            CardanoNetwork::Preview => PREVIEW_URL,
            CardanoNetwork::Mainnet => MAINNET_URL,
        }
    }
}

impl From<CardanoNetwork> for Network {
    fn from(network: CardanoNetwork) -> Self {
        match network {
            CardanoNetwork::Preprod | CardanoNetwork::Preview => Network::Testnet,
            CardanoNetwork::Mainnet => Network::Mainnet,
        }
    }
}

impl FromStr for CardanoNetwork {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "preprod" => Ok(CardanoNetwork::Preprod),
            "preview" => Ok(CardanoNetwork::Preview),
            "mainnet" => Ok(CardanoNetwork::Mainnet),
            _ => Err(ConfigError::UnknownNetwork(s.to_string())),
        }
    }
}

impl fmt::Display for CardanoNetwork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CardanoNetwork::Preprod => "preprod",
            CardanoNetwork::Preview => "preview",
            CardanoNetwork::Mainnet => "mainnet",
        };
        write!(f, "{name}")
    }
}

/// Where and how to reach the chain
///
/// ```toml
/// project_id = "preprodXXXXXXXX"
/// network = "Preprod"
/// # endpoint = "https://my-blockfrost-proxy/api/v0/"
/// ```
#[derive(Debug, Deserialize)]
pub struct NodeConfig {
    #[serde(default)]
    endpoint: Option<String>,
    project_id: SecretString,
    network: CardanoNetwork,
}

impl NodeConfig {
    /// Constructor for NodeConfig
    pub fn new(endpoint: Option<String>, project_id: SecretString, network: CardanoNetwork) -> Self {
        NodeConfig {
            endpoint,
            project_id,
            network,
        }
    }

    /// `~/.asteria/config.toml`
    pub fn default_path() -> ConfigResult<PathBuf> {
        let mut dir = home_dir().ok_or(ConfigError::NoHomeDir)?;
        dir.push(CONFIG_FOLDER);
        dir.push(CONFIG_FILE);
        Ok(dir)
    }

    /// Read the config from a TOML file
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let text =
            fs::read_to_string(path).map_err(|e| ConfigError::FileRead(path.to_owned(), e))?;
        let config = toml::from_str(&text)?;
        Ok(config)
    }

    /// Read the config from the process environment
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Read the config through `lookup`, which maps variable names to values
    pub fn from_lookup<F: Fn(&str) -> Option<String>>(lookup: F) -> ConfigResult<Self> {
        let project_id = lookup(PROJECT_ID_VAR).ok_or(ConfigError::MissingVar(PROJECT_ID_VAR))?;
        let network = match lookup(NETWORK_VAR) {
            Some(name) => name.parse()?,
            None => CardanoNetwork::Preprod,
        };
        let endpoint = lookup(URL_VAR);
        Ok(NodeConfig::new(
            endpoint,
            SecretString::new(project_id),
            network,
        ))
    }

    /// Environment if `BLOCKFROST_PROJECT_ID` is set, the default file otherwise
    pub fn load() -> ConfigResult<Self> {
        if std::env::var(PROJECT_ID_VAR).is_ok() {
            tracing::debug!("Loading node config from environment");
            Self::from_env()
        } else {
            let path = Self::default_path()?;
            tracing::debug!(?path, "Loading node config from file");
            Self::from_file(&path)
        }
    }

    /// Base url of the Blockfrost API
    pub fn endpoint(&self) -> &str {
        self.endpoint
            .as_deref()
            .unwrap_or_else(|| self.network.default_endpoint())
    }

    /// Getter for the network
    pub fn network(&self) -> CardanoNetwork {
        self.network
    }

    /// Blockfrost ledger client signing with `keys`
    pub fn to_ledger_client<K: Keys, Datum, Redeemer>(
        &self,
        keys: K,
    ) -> BlockfrostLedgerClient<K, Datum, Redeemer> {
        BlockfrostLedgerClient::new(
            self.endpoint(),
            self.project_id.clone(),
            self.network.into(),
            keys,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn reads_toml_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "project_id = \"preprod123\"").unwrap();
        writeln!(file, "network = \"Preview\"").unwrap();

        let config = NodeConfig::from_file(file.path()).unwrap();

        assert_eq!(config.network(), CardanoNetwork::Preview);
        assert_eq!(config.endpoint(), PREVIEW_URL);
        assert_eq!(config.project_id.expose_secret(), "preprod123");
    }

    #[test]
    fn explicit_endpoint_wins() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "endpoint = \"http://localhost:3000/\"").unwrap();
        writeln!(file, "project_id = \"abc\"").unwrap();
        writeln!(file, "network = \"Mainnet\"").unwrap();

        let config = NodeConfig::from_file(file.path()).unwrap();

        assert_eq!(config.endpoint(), "http://localhost:3000/");
    }

    #[test]
    fn missing_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope.toml");

        let err = NodeConfig::from_file(&path).unwrap_err();

        assert!(matches!(err, ConfigError::FileRead(p, _) if p == path));
    }

    #[test]
    fn env_defaults_to_preprod() {
        let vars = HashMap::from([(PROJECT_ID_VAR, "preprod123".to_string())]);

        let config = NodeConfig::from_lookup(|var| vars.get(var).cloned()).unwrap();

        assert_eq!(config.network(), CardanoNetwork::Preprod);
        assert_eq!(config.endpoint(), PREPROD_URL);
    }

    #[test]
    fn env_needs_project_id() {
        let err = NodeConfig::from_lookup(|_| None).unwrap_err();

        assert!(matches!(err, ConfigError::MissingVar(PROJECT_ID_VAR)));
    }

    #[test]
    fn env_rejects_unknown_network() {
        let vars = HashMap::from([
            (PROJECT_ID_VAR, "x".to_string()),
            (NETWORK_VAR, "testnet".to_string()),
        ]);

        let err = NodeConfig::from_lookup(|var| vars.get(var).cloned()).unwrap_err();

        assert!(matches!(err, ConfigError::UnknownNetwork(name) if name == "testnet"));
    }
}
