use crate::{ledger_client::LedgerClientError, scripts::ScriptError};
use std::error;
use thiserror::Error;

#[allow(missing_docs)]
#[derive(Debug, Error)]
pub enum SCLogicError {
    #[error("Error handling endpoint: {0}")]
    Endpoint(Box<dyn error::Error + Send + Sync>),
    #[error("Error doing lookup: {0}")]
    Lookup(Box<dyn error::Error + Send + Sync>),
    #[error("From LedgerClient: {0}")]
    LedgerClient(#[from] LedgerClientError),
    #[error("Error from Script: {0}")]
    Script(#[from] ScriptError),
}

impl SCLogicError {
    /// The boxed domain error of an endpoint or lookup failure, if that's what this is
    pub fn domain_error(&self) -> Option<&(dyn error::Error + Send + Sync + 'static)> {
        match self {
            SCLogicError::Endpoint(inner) | SCLogicError::Lookup(inner) => Some(inner.as_ref()),
            _ => None,
        }
    }
}

#[allow(missing_docs)]
pub type SCLogicResult<T> = crate::error::Result<T, SCLogicError>;
