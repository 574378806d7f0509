use crate::{
    ledger_client::{
        blockfrost_client::{
            blockfrost_http::{BlockfrostError, BlockfrostHttp, BlockfrostHttpTrait, MAX_PAGE_SIZE},
            issuance::{
                min_fee, Balancer, ExUnitsMap, IssuanceError, VKeyWitness, FEE_BUFFER,
            },
            schemas::{values_from_amounts, UTxO},
        },
        keys::Keys,
        LedgerClient, LedgerClientError, LedgerClientResult,
    },
    output::{DatumKind, Output, OutputId},
    scripts::{
        plutus_data::{PlutusData, PlutusDataError},
        PlutusScript, ScriptError,
    },
    transaction::{TxActions, TxId},
};
use async_trait::async_trait;
use ed25519_dalek::Signer;
use pallas_addresses::{Address, Network};
use secrecy::SecretString;
use std::{collections::BTreeSet, marker::PhantomData};
use thiserror::Error;

#[allow(missing_docs)]
pub mod blockfrost_http;
#[allow(missing_docs)]
pub mod issuance;
#[allow(missing_docs)]
pub mod schemas;


#[allow(missing_docs)]
#[derive(Debug, Error)]
pub enum BlockfrostLCError {
    #[error(transparent)]
    Http(#[from] BlockfrostError),
    #[error("Malformed hex from Blockfrost: {0}")]
    Hex(#[from] hex::FromHexError),
    #[error("Malformed address {0:?}: {1}")]
    Address(String, String),
    #[error(transparent)]
    Datum(#[from] PlutusDataError),
    #[error(transparent)]
    Script(#[from] ScriptError),
    #[error(transparent)]
    Issuance(#[from] IssuanceError),
    #[error("Transaction is {0} bytes, the limit is {1}")]
    TooLarge(usize, u64),
}

fn issue_err<E: Into<BlockfrostLCError>>(error: E) -> LedgerClientError {
    match error.into() {
        BlockfrostLCError::Issuance(IssuanceError::NoCollateral) => {
            LedgerClientError::NoBigEnoughCollateralUTxO
        }
        other => LedgerClientError::FailedToIssueTx(Box::new(other)),
    }
}

/// [`LedgerClient`] talking to a Blockfrost instance and signing with `K`
pub struct BlockfrostLedgerClient<K, Datum, Redeemer, H = BlockfrostHttp> {
    http: H,
    keys: K,
    network: Network,
    _datum: PhantomData<(Datum, Redeemer)>,
}

impl<K: Keys, Datum, Redeemer> BlockfrostLedgerClient<K, Datum, Redeemer> {
    /// Client for the Blockfrost API at `url`
    pub fn new(url: &str, project_id: SecretString, network: Network, keys: K) -> Self {
        let http = BlockfrostHttp::new(url, project_id);
        Self::with_http(http, network, keys)
    }
}

impl<K: Keys, Datum, Redeemer, H: BlockfrostHttpTrait> BlockfrostLedgerClient<K, Datum, Redeemer, H> {
    /// Client over any implementation of the Blockfrost endpoints
    pub fn with_http(http: H, network: Network, keys: K) -> Self {
        BlockfrostLedgerClient {
            http,
            keys,
            network,
            _datum: PhantomData,
        }
    }
}

impl<K, Datum, Redeemer, H> BlockfrostLedgerClient<K, Datum, Redeemer, H>
where
    K: Keys,
    Datum: TryFrom<PlutusData> + Send + Sync,
    Redeemer: Send + Sync,
    H: BlockfrostHttpTrait,
{
    async fn utxos_at(
        &self,
        address: &Address,
        count: usize,
    ) -> Result<Vec<Output<Datum>>, BlockfrostLCError> {
        let bech32 = address
            .to_bech32()
            .map_err(|e| BlockfrostLCError::Address(address.to_hex(), e.to_string()))?;
        let page_size = count.min(MAX_PAGE_SIZE);
        let mut utxos = Vec::new();
        let mut page = 1;
        while utxos.len() < count {
            let batch = self.http.utxos(&bech32, page_size, page).await?;
            let last_page = batch.len() < page_size;
            let wanted = count - utxos.len();
            utxos.extend(batch.into_iter().take(wanted));
            if last_page {
                break;
            }
            page += 1;
        }
        let mut outputs = Vec::with_capacity(utxos.len());
        for utxo in utxos {
            outputs.push(self.to_output(utxo).await?);
        }
        Ok(outputs)
    }

    async fn to_output(&self, utxo: UTxO) -> Result<Output<Datum>, BlockfrostLCError> {
        let tx_hash = hex::decode(&utxo.tx_hash)?;
        let owner = Address::from_bech32(&utxo.address)
            .map_err(|e| BlockfrostLCError::Address(utxo.address.clone(), e.to_string()))?;
        let values = values_from_amounts(&utxo.amount)?;

        let datum_cbor = match (&utxo.inline_datum, &utxo.data_hash) {
            (Some(inline), _) => Some(inline.clone()),
            (None, Some(hash)) => self.http.datum_cbor(hash).await?.cbor,
            (None, None) => None,
        };
        let output = match datum_cbor {
            Some(cbor) => {
                let datum = PlutusData::from_cbor(&hex::decode(cbor)?)?;
                Output::new_untyped_validator(tx_hash, utxo.output_index, owner, values, datum)
                    .with_typed_datum_if_possible()
            }
            None => Output::new_wallet(tx_hash, utxo.output_index, owner, values),
        };

        match &utxo.reference_script_hash {
            Some(hash) => match self.reference_script(hash).await? {
                Some(script) => Ok(output.with_script_ref(script)),
                None => Ok(output),
            },
            None => Ok(output),
        }
    }

    async fn reference_script(&self, hash: &str) -> Result<Option<PlutusScript>, BlockfrostLCError> {
        let info = self.http.script_info(hash).await?;
        let version = match info.plutus_version() {
            Some(version) => version,
            // Native scripts are never needed as Plutus witnesses
            None => return Ok(None),
        };
        match self.http.script_cbor(hash).await?.cbor {
            Some(cbor) => Ok(Some(PlutusScript::from_hex(version, &cbor)?)),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl<K, Datum, Redeemer, H> LedgerClient<Datum, Redeemer>
    for BlockfrostLedgerClient<K, Datum, Redeemer, H>
where
    K: Keys,
    Datum: Clone + TryFrom<PlutusData> + Into<PlutusData> + Send + Sync,
    Redeemer: Clone + Into<PlutusData> + Send + Sync,
    H: BlockfrostHttpTrait,
{
    async fn signer_base_address(&self) -> LedgerClientResult<Address> {
        self.keys
            .base_addr(self.network)
            .await
            .map_err(|e| LedgerClientError::BaseAddress(Box::new(e)))
    }

    async fn outputs_at_address(
        &self,
        address: &Address,
        count: usize,
    ) -> LedgerClientResult<Vec<Output<Datum>>> {
        self.utxos_at(address, count)
            .await
            .map_err(|e| LedgerClientError::FailedToRetrieveOutputsAt(address.clone(), Box::new(e)))
    }

    async fn all_outputs_at_address(
        &self,
        address: &Address,
    ) -> LedgerClientResult<Vec<Output<Datum>>> {
        self.outputs_at_address(address, usize::MAX).await
    }

    async fn output_by_id(&self, id: &OutputId) -> LedgerClientResult<Option<Output<Datum>>> {
        let wrap = |e: BlockfrostLCError| {
            LedgerClientError::FailedToRetrieveOutputWithId(id.clone(), Box::new(e))
        };
        let tx_hash = hex::encode(id.tx_hash());
        let tx = match self.http.tx_utxos(&tx_hash).await.map_err(|e| wrap(e.into()))? {
            Some(tx) => tx,
            None => return Ok(None),
        };
        let unspent = tx
            .outputs
            .into_iter()
            .find(|output| output.output_index == id.index() && output.consumed_by_tx.is_none());
        match unspent {
            Some(output) => {
                let output = self.to_output(output.into_utxo(&tx_hash)).await.map_err(wrap)?;
                Ok(Some(output))
            }
            None => Ok(None),
        }
    }

    async fn issue(&self, tx: TxActions<Datum, Redeemer>) -> LedgerClientResult<TxId> {
        let signer = self.signer_base_address().await?;
        let signing_key = self
            .keys
            .signing_key()
            .await
            .map_err(|e| LedgerClientError::BaseAddress(Box::new(e)))?;
        if tx
            .script_inputs
            .iter()
            .any(|input| matches!(input.output.datum(), DatumKind::None))
        {
            return Err(LedgerClientError::NoDatumOnScriptInput);
        }

        let params = self.http.protocol_params().await.map_err(issue_err)?;
        let busy: BTreeSet<&OutputId> = tx
            .reference_inputs
            .iter()
            .map(|output| output.id())
            .chain(tx.script_inputs.iter().map(|input| input.output.id()))
            .collect();
        let wallet: Vec<Output<Datum>> = self
            .all_outputs_at_address(&signer)
            .await?
            .into_iter()
            .filter(|output| !busy.contains(output.id()))
            .collect();
        let balancer = Balancer::new(&tx, &wallet, &signer).map_err(issue_err)?;

        let ex_units: Option<ExUnitsMap> = if balancer.runs_any_script() {
            let draft = balancer.draft(FEE_BUFFER, None, &params).map_err(issue_err)?;
            let bytes = draft
                .tx_bytes(&[VKeyWitness::dummy()])
                .map_err(issue_err)?;
            let evaluation = self.http.execution_units(&bytes).await.map_err(issue_err)?;
            let units = evaluation.ex_units().map_err(issue_err)?;
            tracing::debug!(?units, "Evaluated redeemers");
            Some(units.into_iter().map(|(tag, index, units)| ((tag, index), units)).collect())
        } else {
            None
        };

        let ref_script_size = balancer.ref_script_size();
        let mut fee = params.min_fee_b;
        let draft = loop {
            let draft = balancer
                .draft(fee, ex_units.as_ref(), &params)
                .map_err(issue_err)?;
            let size = draft
                .tx_bytes(&[VKeyWitness::dummy()])
                .map_err(issue_err)?
                .len();
            let needed = min_fee(&params, size, draft.total_ex_units(), ref_script_size);
            if needed <= fee {
                break draft;
            }
            fee = needed;
        };

        let tx_id = draft.id().map_err(issue_err)?;
        let witness = VKeyWitness {
            vkey: signing_key.verifying_key().to_bytes(),
            signature: signing_key.sign(&tx_id).to_bytes(),
        };
        let bytes = draft.tx_bytes(&[witness]).map_err(issue_err)?;
        if bytes.len() as u64 > params.max_tx_size {
            return Err(issue_err(BlockfrostLCError::TooLarge(
                bytes.len(),
                params.max_tx_size,
            )));
        }

        let submitted = self.http.submit_tx(&bytes).await.map_err(issue_err)?;
        tracing::info!(tx_id = %submitted, fee, size = bytes.len(), "Transaction accepted by Blockfrost");
        Ok(TxId::new(&submitted))
    }

    async fn network(&self) -> LedgerClientResult<Network> {
        Ok(self.network)
    }
}
