use thiserror::Error;

use crate::{
    config::ConfigError, ledger_client::LedgerClientError, logic::error::SCLogicError, PolicyId,
};

#[allow(missing_docs)]
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Top level error returned from [`crate::smart_contract::SmartContract`] and friends
#[allow(missing_docs)]
#[derive(Debug, Error)]
pub enum Error {
    #[error("Error: Insufficient amount of {0:?}.")]
    InsufficientAmountOf(PolicyId),
    #[error("Error: Amount of {0} overflows.")]
    ValueOverflow(PolicyId),
    #[error("Error from SCLogic: {0}")]
    SCLogic(#[from] SCLogicError),
    #[error("Error from LedgerClient: {0}")]
    LedgerClient(#[from] LedgerClientError),
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}
