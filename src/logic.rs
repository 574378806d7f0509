use crate::{ledger_client::LedgerClient, transaction::TxActions};

use async_trait::async_trait;
use std::fmt::Debug;

pub use error::*;

/// Errors returned by [`SCLogic`] implementations
pub mod error;

/// Interface for the off-chain side of a contract. Endpoints turn into [`TxActions`] for a ledger
/// client to build and submit. Lookups only read.
#[async_trait]
pub trait SCLogic: Send + Sync {
    /// Operations that produce a transaction
    type Endpoints: Send + Sync;
    /// Read-only queries
    type Lookups: Send + Sync;
    /// Answers to [`SCLogic::Lookups`]
    type LookupResponses: Send + Sync;
    /// Datum type of the contract's outputs
    type Datums: Clone + Eq + Debug + Send + Sync;
    /// Redeemer type of the contract's scripts
    type Redeemers: Clone + PartialEq + Eq + Debug + Send + Sync;

    /// Build the transaction for `endpoint`
    async fn handle_endpoint<LC: LedgerClient<Self::Datums, Self::Redeemers>>(
        endpoint: Self::Endpoints,
        ledger_client: &LC,
    ) -> SCLogicResult<TxActions<Self::Datums, Self::Redeemers>>;

    /// Answer `query`
    async fn lookup<LC: LedgerClient<Self::Datums, Self::Redeemers>>(
        query: Self::Lookups,
        ledger_client: &LC,
    ) -> SCLogicResult<Self::LookupResponses>;
}
