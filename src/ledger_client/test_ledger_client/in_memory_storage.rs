use crate::ledger_client::test_ledger_client::{TestLCError, TestLedgerStorage};
use crate::ledger_client::LedgerClientError::FailedToIssueTx;
use crate::ledger_client::{LedgerClientError, LedgerClientResult};
use crate::output::{Output, OutputId};
use crate::Address;
use pallas_addresses::Network;
use std::sync::{Arc, Mutex, MutexGuard};

type MutableData<Datum> = Arc<Mutex<Vec<Output<Datum>>>>;

/// UTxO set held behind a mutex
#[derive(Debug)]
pub struct InMemoryStorage<Datum> {
    /// Signing address, `None` when no credential is configured
    pub signer: Option<Address>,
    /// Live outputs
    pub outputs: MutableData<Datum>,
    /// Network reported to callers
    pub network: Network,
}

impl<Datum> InMemoryStorage<Datum> {
    fn lock(&self) -> Result<MutexGuard<'_, Vec<Output<Datum>>>, TestLCError> {
        self.outputs
            .lock()
            .map_err(|e| TestLCError::Mutex(format! {"{:?}", e}))
    }
}

#[async_trait::async_trait]
impl<Datum: Clone + Send + Sync + PartialEq> TestLedgerStorage<Datum> for InMemoryStorage<Datum> {
    async fn signer(&self) -> LedgerClientResult<Address> {
        self.signer
            .clone()
            .ok_or_else(|| LedgerClientError::BaseAddress(Box::new(TestLCError::NoSigner)))
    }

    async fn outputs_by_count(
        &self,
        address: &Address,
        count: usize,
    ) -> LedgerClientResult<Vec<Output<Datum>>> {
        let outputs = self
            .lock()
            .map_err(|e| {
                LedgerClientError::FailedToRetrieveOutputsAt(address.clone(), Box::new(e))
            })?
            .iter()
            .filter(|o| o.owner() == address)
            .take(count)
            .cloned()
            .collect();
        Ok(outputs)
    }

    async fn all_outputs(&self, address: &Address) -> LedgerClientResult<Vec<Output<Datum>>> {
        let outputs = self
            .lock()
            .map_err(|e| {
                LedgerClientError::FailedToRetrieveOutputsAt(address.clone(), Box::new(e))
            })?
            .iter()
            .filter(|o| o.owner() == address)
            .cloned()
            .collect();
        Ok(outputs)
    }

    async fn output_by_id(&self, id: &OutputId) -> LedgerClientResult<Option<Output<Datum>>> {
        let output = self
            .lock()
            .map_err(|e| LedgerClientError::FailedToRetrieveOutputWithId(id.clone(), Box::new(e)))?
            .iter()
            .find(|o| o.id() == id)
            .cloned();
        Ok(output)
    }

    async fn commit(
        &self,
        spent: &[OutputId],
        created: Vec<Output<Datum>>,
    ) -> LedgerClientResult<()> {
        let mut ledger_utxos = self.lock().map_err(|e| FailedToIssueTx(Box::new(e)))?;
        if let Some(stale) = spent
            .iter()
            .find(|id| !ledger_utxos.iter().any(|o| o.id() == *id))
        {
            return Err(FailedToIssueTx(Box::new(TestLCError::StaleInput(
                stale.clone(),
            ))));
        }
        ledger_utxos.retain(|o| !spent.contains(o.id()));
        ledger_utxos.extend(created);
        Ok(())
    }

    async fn network(&self) -> LedgerClientResult<Network> {
        Ok(self.network)
    }
}
