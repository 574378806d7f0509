use std::{
    fmt::Debug,
    marker::PhantomData,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
};

use crate::{
    ledger_client::{
        test_ledger_client::in_memory_storage::InMemoryStorage, LedgerClient, LedgerClientError,
        LedgerClientResult,
    },
    output::{DatumKind, Output, OutputId, UnbuiltOutput},
    scripts::{plutus_data::PlutusData, PlutusScript, ScriptError},
    transaction::{TxActions, TxId},
    values::Values,
    PolicyId,
};
use async_trait::async_trait;
use pallas_addresses::{Address, Network};
use rand::Rng;
use thiserror::Error;

/// In-memory storage backing the test ledger client
pub mod in_memory_storage;

#[cfg(test)]
mod tests;

/// Builder for a [`TestLedgerClient`] seeded with outputs
pub struct TestBackendsBuilder<Datum, Redeemer> {
    signer: Option<Address>,
    network: Network,
    outputs: Vec<Output<Datum>>,
    _redeemer: PhantomData<Redeemer>,
}

impl<Datum, Redeemer> TestBackendsBuilder<Datum, Redeemer>
where
    Datum: Clone + PartialEq + Debug + Send + Sync,
    Redeemer: Clone + PartialEq + Debug + Send + Sync,
{
    /// Ledger whose transactions are signed by `signer`
    pub fn new(signer: &Address) -> TestBackendsBuilder<Datum, Redeemer> {
        TestBackendsBuilder {
            signer: Some(signer.clone()),
            network: Network::Testnet,
            outputs: Vec::new(),
            _redeemer: PhantomData,
        }
    }

    /// Ledger with no signing credential. Anything needing the signer fails.
    pub fn without_signer() -> TestBackendsBuilder<Datum, Redeemer> {
        TestBackendsBuilder {
            signer: None,
            network: Network::Testnet,
            outputs: Vec::new(),
            _redeemer: PhantomData,
        }
    }

    /// Start describing an output owned by `owner`
    pub fn start_output(self, owner: &Address) -> OutputBuilder<Datum, Redeemer> {
        OutputBuilder {
            inner: self,
            owner: owner.clone(),
            tx_hash: None,
            values: Values::default(),
            datum: DatumKind::None,
            script_ref: None,
        }
    }

    fn add_output(&mut self, output: Output<Datum>) {
        self.outputs.push(output)
    }

    /// Build a ledger client holding the described outputs in memory
    pub fn build_in_memory(&self) -> TestLedgerClient<Datum, Redeemer, InMemoryStorage<Datum>> {
        TestLedgerClient::new_in_memory(self.signer.clone(), self.outputs.clone(), self.network)
    }
}

/// Builder for a single seeded output
pub struct OutputBuilder<Datum, Redeemer> {
    inner: TestBackendsBuilder<Datum, Redeemer>,
    owner: Address,
    tx_hash: Option<Vec<u8>>,
    values: Values,
    datum: DatumKind<Datum>,
    script_ref: Option<PlutusScript>,
}

impl<Datum, Redeemer> OutputBuilder<Datum, Redeemer>
where
    Datum: Clone + PartialEq + Debug + Send + Sync,
    Redeemer: Clone + PartialEq + Debug + Send + Sync,
{
    /// Set the amount of `policy` held by the output
    pub fn with_value(mut self, policy: PolicyId, amount: u64) -> OutputBuilder<Datum, Redeemer> {
        self.values = std::mem::take(&mut self.values).with(&policy, amount);
        self
    }

    /// Attach a typed datum
    pub fn with_datum(mut self, datum: Datum) -> OutputBuilder<Datum, Redeemer> {
        self.datum = DatumKind::Typed(datum);
        self
    }

    /// Attach a datum that doesn't decode to `Datum`
    pub fn with_untyped_datum(mut self, datum: PlutusData) -> OutputBuilder<Datum, Redeemer> {
        self.datum = DatumKind::UnTyped(datum);
        self
    }

    /// Publish `script` in the output
    pub fn with_script_ref(mut self, script: PlutusScript) -> OutputBuilder<Datum, Redeemer> {
        self.script_ref = Some(script);
        self
    }

    /// Use a known transaction hash. The output gets index 0 of that transaction.
    pub fn with_tx_hash(mut self, tx_hash: &[u8]) -> OutputBuilder<Datum, Redeemer> {
        self.tx_hash = Some(tx_hash.to_vec());
        self
    }

    /// Finish the output and return to the ledger builder
    pub fn finish_output(self) -> TestBackendsBuilder<Datum, Redeemer> {
        let OutputBuilder {
            mut inner,
            owner,
            tx_hash,
            values,
            datum,
            script_ref,
        } = self;
        let tx_hash = tx_hash.unwrap_or_else(|| arbitrary_tx_id().to_vec());
        let index = 0;
        let output = match datum {
            DatumKind::Typed(datum) => Output::new_validator(tx_hash, index, owner, values, datum),
            DatumKind::UnTyped(data) => {
                Output::new_untyped_validator(tx_hash, index, owner, values, data)
            }
            DatumKind::None => Output::new_wallet(tx_hash, index, owner, values),
        };
        let output = match script_ref {
            Some(script) => output.with_script_ref(script),
            None => output,
        };
        inner.add_output(output);
        inner
    }
}

#[derive(Debug, Error)]
enum TestLCError {
    #[error("Mutex lock error: {0:?}")]
    Mutex(String),
    #[error("Not enough input value available for outputs")]
    NotEnoughInputs,
    #[error("The same input is listed twice")]
    DuplicateInput,
    #[error("Input {0} doesn't exist or was already spent")]
    StaleInput(OutputId),
    #[error("No signing credential configured")]
    NoSigner,
    #[error("Input {0} isn't locked by the script supplied to spend it")]
    WrongScriptAddress(OutputId),
    #[error("Script error: {0}")]
    Script(ScriptError),
    #[error("Value error: {0}")]
    Value(crate::error::Error),
}

/// Storage seam for [`TestLedgerClient`]
#[async_trait::async_trait]
pub trait TestLedgerStorage<Datum> {
    /// Signing address, if there is one
    async fn signer(&self) -> LedgerClientResult<Address>;
    /// First `count` outputs at `address`
    async fn outputs_by_count(
        &self,
        address: &Address,
        count: usize,
    ) -> LedgerClientResult<Vec<Output<Datum>>>;
    /// Every output at `address`
    async fn all_outputs(&self, address: &Address) -> LedgerClientResult<Vec<Output<Datum>>>;
    /// Live output with `id`
    async fn output_by_id(&self, id: &OutputId) -> LedgerClientResult<Option<Output<Datum>>>;
    /// Atomically remove `spent` and add `created`. Fails without changes if any of `spent`
    /// isn't live.
    async fn commit(
        &self,
        spent: &[OutputId],
        created: Vec<Output<Datum>>,
    ) -> LedgerClientResult<()>;
    /// Network the storage pretends to be
    async fn network(&self) -> LedgerClientResult<Network>;
}

/// Ledger client that keeps its UTxO set in a [`TestLedgerStorage`]. Counts the calls a real
/// ledger would answer over the network.
#[derive(Debug)]
pub struct TestLedgerClient<Datum, Redeemer, Storage: TestLedgerStorage<Datum>> {
    storage: Storage,
    lookups: AtomicUsize,
    issues: AtomicUsize,
    _datum: PhantomData<Datum>,
    _redeemer: PhantomData<Redeemer>,
}

impl<Datum, Redeemer> TestLedgerClient<Datum, Redeemer, InMemoryStorage<Datum>>
where
    Datum: Clone + Send + Sync + PartialEq,
{
    /// Constructor for an in-memory ledger
    pub fn new_in_memory(
        signer: Option<Address>,
        outputs: Vec<Output<Datum>>,
        network: Network,
    ) -> Self {
        let storage = InMemoryStorage {
            signer,
            outputs: Arc::new(Mutex::new(outputs)),
            network,
        };
        TestLedgerClient {
            storage,
            lookups: AtomicUsize::new(0),
            issues: AtomicUsize::new(0),
            _datum: PhantomData,
            _redeemer: PhantomData,
        }
    }
}

impl<Datum, Redeemer, Storage: TestLedgerStorage<Datum>> TestLedgerClient<Datum, Redeemer, Storage> {
    /// Number of UTxO queries answered so far
    pub fn lookup_count(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    /// Number of transactions received so far, accepted or not
    pub fn issue_count(&self) -> usize {
        self.issues.load(Ordering::SeqCst)
    }

    /// Every call that would have hit the network
    pub fn call_count(&self) -> usize {
        self.lookup_count() + self.issue_count()
    }

    fn count_lookup(&self) {
        self.lookups.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl<Datum, Redeemer, Storage> LedgerClient<Datum, Redeemer>
    for TestLedgerClient<Datum, Redeemer, Storage>
where
    Datum: Clone + PartialEq + Debug + Send + Sync,
    Redeemer: Clone + PartialEq + Debug + Send + Sync,
    Storage: TestLedgerStorage<Datum> + Send + Sync,
{
    async fn signer_base_address(&self) -> LedgerClientResult<Address> {
        self.storage.signer().await
    }

    async fn outputs_at_address(
        &self,
        address: &Address,
        count: usize,
    ) -> LedgerClientResult<Vec<Output<Datum>>> {
        self.count_lookup();
        self.storage.outputs_by_count(address, count).await
    }

    async fn all_outputs_at_address(
        &self,
        address: &Address,
    ) -> LedgerClientResult<Vec<Output<Datum>>> {
        self.count_lookup();
        self.storage.all_outputs(address).await
    }

    async fn output_by_id(&self, id: &OutputId) -> LedgerClientResult<Option<Output<Datum>>> {
        self.count_lookup();
        self.storage.output_by_id(id).await
    }

    async fn issue(&self, tx: TxActions<Datum, Redeemer>) -> LedgerClientResult<TxId> {
        let signer = self.signer_base_address().await?;
        let network = self.network().await?;
        self.issues.fetch_add(1, Ordering::SeqCst);

        for reference in tx.reference_inputs.iter() {
            self.ensure_live(reference.id()).await?;
        }

        let mut spent: Vec<OutputId> = Vec::new();
        let mut total_input_value = Values::default();
        for input in tx.script_inputs.iter() {
            let id = input.output.id();
            if spent.contains(id) {
                return Err(issue_err(TestLCError::DuplicateInput));
            }
            if let DatumKind::None = input.output.datum() {
                return Err(LedgerClientError::NoDatumOnScriptInput);
            }
            let script_address = input
                .script
                .address(network)
                .map_err(|e| issue_err(TestLCError::Script(e)))?;
            if input.output.owner() != &script_address {
                return Err(issue_err(TestLCError::WrongScriptAddress(id.clone())));
            }
            self.ensure_live(id).await?;
            total_input_value
                .add_values(input.output.values())
                .map_err(value_err)?;
            spent.push(id.clone());
        }

        let reference_ids: Vec<&OutputId> =
            tx.reference_inputs.iter().map(|o| o.id()).collect();
        let wallet_inputs: Vec<Output<Datum>> = self
            .storage
            .all_outputs(&signer)
            .await?
            .into_iter()
            .filter(|o| !reference_ids.contains(&o.id()))
            .collect();
        for input in wallet_inputs.iter() {
            total_input_value.add_values(input.values()).map_err(value_err)?;
            spent.push(input.id().clone());
        }

        let minted = tx.minted_values().map_err(value_err)?;
        total_input_value.add_values(&minted).map_err(value_err)?;

        let total_output_value = tx
            .outputs
            .iter()
            .try_fold(Values::default(), |mut acc, o| {
                acc.add_values(o.values())?;
                Ok(acc)
            })
            .map_err(value_err)?;

        let remainder = total_input_value
            .try_subtract(&total_output_value)
            .map_err(|_| issue_err(TestLCError::NotEnoughInputs))?;

        let mut construction_ctx = TxIdConstructionCtx::new();
        let mut created = build_outputs(tx.outputs, &mut construction_ctx);
        if !remainder.is_empty() {
            created.push(new_wallet_output(&signer, &remainder, &mut construction_ctx));
        }

        self.storage.commit(&spent, created).await?;

        Ok(TxId::new(&hex::encode(construction_ctx.tx_hash())))
    }

    async fn network(&self) -> LedgerClientResult<Network> {
        self.storage.network().await
    }
}

impl<Datum, Redeemer, Storage> TestLedgerClient<Datum, Redeemer, Storage>
where
    Datum: Clone + Send + Sync,
    Storage: TestLedgerStorage<Datum> + Send + Sync,
{
    async fn ensure_live(&self, id: &OutputId) -> LedgerClientResult<()> {
        match self.storage.output_by_id(id).await? {
            Some(_) => Ok(()),
            None => Err(issue_err(TestLCError::StaleInput(id.clone()))),
        }
    }
}

fn value_err(error: crate::error::Error) -> LedgerClientError {
    issue_err(TestLCError::Value(error))
}

fn issue_err(error: TestLCError) -> LedgerClientError {
    LedgerClientError::FailedToIssueTx(Box::new(error))
}

struct TxIdConstructionCtx {
    tx_hash: Vec<u8>,
    next_index: u64,
}

impl TxIdConstructionCtx {
    pub fn new() -> Self {
        let tx_hash = arbitrary_tx_id().to_vec();
        TxIdConstructionCtx {
            tx_hash,
            next_index: 0,
        }
    }

    pub fn tx_hash(&self) -> Vec<u8> {
        self.tx_hash.clone()
    }

    pub fn next_index(&mut self) -> u64 {
        let next_index = self.next_index;
        self.next_index += 1;
        next_index
    }
}

fn new_wallet_output<Datum>(
    addr: &Address,
    vals: &Values,
    construction_ctx: &mut TxIdConstructionCtx,
) -> Output<Datum> {
    let tx_hash = construction_ctx.tx_hash();
    let index = construction_ctx.next_index();
    Output::new_wallet(tx_hash, index, addr.clone(), vals.clone())
}

fn build_outputs<Datum>(
    unbuilt_outputs: Vec<UnbuiltOutput<Datum>>,
    construction_ctx: &mut TxIdConstructionCtx,
) -> Vec<Output<Datum>> {
    unbuilt_outputs
        .into_iter()
        .map(|output| match output {
            UnbuiltOutput::Wallet { owner, values } => {
                new_wallet_output(&owner, &values, construction_ctx)
            }
            UnbuiltOutput::Validator {
                script_address,
                values,
                datum,
            } => {
                let tx_hash = construction_ctx.tx_hash();
                let index = construction_ctx.next_index();
                Output::new_validator(tx_hash, index, script_address, values, datum)
            }
        })
        .collect()
}

fn arbitrary_tx_id() -> [u8; 32] {
    rand::thread_rng().gen()
}
