use async_trait::async_trait;
use std::fmt::Debug;

use crate::{
    error::Result, ledger_client::LedgerClient, logic::SCLogic, transaction::TxId,
};

/// Interface for running a contract's endpoints and lookups
#[async_trait]
pub trait SmartContractTrait {
    /// Endpoint type
    type Endpoint;
    /// Lookup type
    type Lookup;
    /// Lookup response type
    type LookupResponse;
    /// Build, sign and submit the transaction for `endpoint`
    async fn hit_endpoint(&self, endpoint: Self::Endpoint) -> Result<TxId>;
    /// Answer `lookup` without submitting anything
    async fn lookup(&self, lookup: Self::Lookup) -> Result<Self::LookupResponse>;
}

/// A contract's logic bound to the ledger it runs against
#[derive(Debug)]
pub struct SmartContract<Logic, LC>
where
    Logic: SCLogic,
    LC: LedgerClient<Logic::Datums, Logic::Redeemers>,
{
    offchain_logic: Logic,
    ledger_client: LC,
}

impl<Logic, LC> SmartContract<Logic, LC>
where
    Logic: SCLogic,
    LC: LedgerClient<Logic::Datums, Logic::Redeemers>,
{
    /// Constructor for SmartContract
    pub fn new(offchain_logic: Logic, ledger_client: LC) -> Self {
        SmartContract {
            offchain_logic,
            ledger_client,
        }
    }

    /// Getter for the contract's logic
    pub fn logic(&self) -> &Logic {
        &self.offchain_logic
    }

    /// Getter for the underlying ledger client
    pub fn ledger_client(&self) -> &LC {
        &self.ledger_client
    }
}

#[async_trait]
impl<Logic, LC> SmartContractTrait for SmartContract<Logic, LC>
where
    Logic: SCLogic + Eq + Debug + Send + Sync,
    LC: LedgerClient<Logic::Datums, Logic::Redeemers> + Send + Sync,
{
    type Endpoint = Logic::Endpoints;
    type Lookup = Logic::Lookups;
    type LookupResponse = Logic::LookupResponses;

    async fn hit_endpoint(&self, endpoint: Logic::Endpoints) -> Result<TxId> {
        let tx_actions = Logic::handle_endpoint(endpoint, &self.ledger_client).await?;
        let tx_id = self.ledger_client.issue(tx_actions).await?;
        tracing::info!(tx_id = %tx_id, "Submitted transaction");
        Ok(tx_id)
    }

    async fn lookup(&self, lookup: Self::Lookup) -> Result<Self::LookupResponse> {
        Ok(Logic::lookup(lookup, &self.ledger_client).await?)
    }
}
