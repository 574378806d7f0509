use thiserror::Error;

/// Blockfrost backed ledger client module
pub mod blockfrost_client;
/// Signing keys module
pub mod keys;
/// Test ledger client module
pub mod test_ledger_client;

use async_trait::async_trait;

use crate::{
    output::{Output, OutputId},
    transaction::{TxActions, TxId},
    PolicyId,
};
use pallas_addresses::{Address, Network};
use std::error;

/// Interface defining interactions with your specific ledger--AKA the Cardano blockchain. The
/// abstraction allows the concept of fake and mock ledgers to be used in tests and simulations.
#[async_trait]
pub trait LedgerClient<Datum, Redeemer>: Send + Sync {
    /// Get the base address for the signer key owned by instance of the `LedgerClient`
    async fn signer_base_address(&self) -> LedgerClientResult<Address>;

    /// Get list of UTxOs owned by a given address limited by `count`
    async fn outputs_at_address(
        &self,
        address: &Address,
        count: usize,
    ) -> LedgerClientResult<Vec<Output<Datum>>>;

    /// Get complete list of UTxOs owned by a given address
    async fn all_outputs_at_address(
        &self,
        address: &Address,
    ) -> LedgerClientResult<Vec<Output<Datum>>>;

    /// Get a specific UTxO. `None` if it was never created or has been spent.
    async fn output_by_id(&self, id: &OutputId) -> LedgerClientResult<Option<Output<Datum>>>;

    /// Get the balance for a specific policy at a given address
    async fn balance_at_address(
        &self,
        address: &Address,
        policy: &PolicyId,
    ) -> LedgerClientResult<u64> {
        self.all_outputs_at_address(address)
            .await?
            .iter()
            .filter_map(|o| o.values().get(policy))
            .try_fold(0u64, |acc, val| acc.checked_add(val))
            .ok_or_else(|| LedgerClientError::BalanceOverflow(address.clone(), policy.clone()))
    }

    /// Issue a transaction to the ledger signed by the signer key owned by the instance of `LedgerClient`
    async fn issue(&self, tx: TxActions<Datum, Redeemer>) -> LedgerClientResult<TxId>;

    /// Get the network identifier for the ledger
    async fn network(&self) -> LedgerClientResult<Network>;
}

#[allow(missing_docs)]
#[derive(Debug, Error)]
pub enum LedgerClientError {
    #[error("Couldn't retrieve signer credential: {0}")]
    BaseAddress(Box<dyn error::Error + Send + Sync>),
    #[error("Balance of {1} at {0:?} overflows")]
    BalanceOverflow(Address, PolicyId),
    #[error("Failed to retrieve outputs at {0:?}: {1:?}.")]
    FailedToRetrieveOutputsAt(Address, Box<dyn error::Error + Send + Sync>),
    #[error("Failed to retrieve UTXO with ID {0}: {1:?}.")]
    FailedToRetrieveOutputWithId(OutputId, Box<dyn error::Error + Send + Sync>),
    #[error("Failed to issue transaction: {0}")]
    FailedToIssueTx(Box<dyn error::Error + Send + Sync>),
    #[error("There isn't a single utxo big enough for collateral")]
    NoBigEnoughCollateralUTxO,
    #[error("The script input you're trying to spend doesn't have a datum")]
    NoDatumOnScriptInput,
    #[error("Config error: {0}")]
    ConfigError(String),
}

#[allow(missing_docs)]
pub type LedgerClientResult<T> = Result<T, LedgerClientError>;
