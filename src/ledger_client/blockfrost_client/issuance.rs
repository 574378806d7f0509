use crate::{
    error::Error,
    ledger_client::blockfrost_client::schemas::ProtocolParams,
    output::{Output, OutputId, UnbuiltOutput},
    scripts::{
        blake2b_256,
        plutus_data::{LedgerPlutusData, PlutusData, PlutusDataError},
        PlutusScript, PlutusVersion,
    },
    transaction::TxActions,
    values::{MultiAsset, Values},
    PolicyId,
};
use pallas_addresses::Address;
use pallas_codec::{
    minicbor,
    utils::{Bytes, CborWrap, KeyValuePairs, Nullable},
};
use pallas_crypto::hash::Hash;
use pallas_primitives::{
    babbage::{PostAlonzoTransactionOutput, PseudoDatumOption, PseudoTransactionOutput},
    conway,
};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use thiserror::Error;

/// Lovelace set aside for the fee while picking wallet inputs
pub const FEE_BUFFER: u64 = 2_000_000;
/// Smallest change output the balancer aims for
pub const MIN_CHANGE: u64 = 1_000_000;
/// Smallest pure-ADA output accepted as collateral
pub const MIN_COLLATERAL: u64 = 5_000_000;

/// Budget given to every redeemer before the real one is known
pub const PLACEHOLDER_EX_UNITS: ExUnits = ExUnits {
    mem: 7_000_000,
    steps: 3_000_000_000,
};

const REF_SCRIPT_SIZE_INCREMENT: usize = 25_600;
const REF_SCRIPT_MULTIPLIER: f64 = 1.2;

#[derive(Debug, Error)]
pub enum IssuanceError {
    #[error("Failed to encode transaction: {0}")]
    Encode(String),
    #[error(transparent)]
    Data(#[from] PlutusDataError),
    #[error("Malformed asset name: {0}")]
    Hex(#[from] hex::FromHexError),
    #[error("Plutus {0:?} scripts are not supported")]
    UnsupportedLanguage(PlutusVersion),
    #[error("Protocol parameters lack a cost model for Plutus {0:?}")]
    MissingCostModel(PlutusVersion),
    #[error("There isn't a single utxo big enough for collateral")]
    NoCollateral,
    #[error("Wallet can't cover the transaction, short of {0}")]
    InsufficientFunds(PolicyId),
    #[error("Amount of {0} overflows")]
    ValueOverflow(PolicyId),
    #[error("Evaluation returned no budget for {0:?} redeemer {1}")]
    MissingExUnits(RedeemerTag, u64),
    #[error("Fee {0} exceeds the lovelace reserved for it")]
    FeeTooHigh(u64),
}

pub type IssuanceResult<T> = Result<T, IssuanceError>;

fn to_cbor<T: minicbor::Encode<()>>(value: &T) -> IssuanceResult<Vec<u8>> {
    minicbor::to_vec(value).map_err(|e| IssuanceError::Encode(e.to_string()))
}

fn out_of_range(what: &str) -> IssuanceError {
    IssuanceError::Encode(format!("{what} is out of range"))
}

fn value_error(error: Error) -> IssuanceError {
    match error {
        Error::InsufficientAmountOf(policy) => IssuanceError::InsufficientFunds(policy),
        Error::ValueOverflow(policy) => IssuanceError::ValueOverflow(policy),
        other => IssuanceError::Encode(other.to_string()),
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RedeemerTag {
    Spend,
    Mint,
}

impl From<RedeemerTag> for conway::RedeemerTag {
    fn from(tag: RedeemerTag) -> Self {
        match tag {
            RedeemerTag::Spend => conway::RedeemerTag::Spend,
            RedeemerTag::Mint => conway::RedeemerTag::Mint,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ExUnits {
    pub mem: u64,
    pub steps: u64,
}

pub type ExUnitsMap = HashMap<(RedeemerTag, u64), ExUnits>;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DraftRedeemer {
    pub tag: RedeemerTag,
    pub index: u64,
    pub data: PlutusData,
    pub ex_units: ExUnits,
}

impl DraftRedeemer {
    fn to_ledger(&self) -> IssuanceResult<conway::Redeemer> {
        Ok(conway::Redeemer {
            tag: self.tag.into(),
            index: u32::try_from(self.index).map_err(|_| out_of_range("redeemer index"))?,
            data: LedgerPlutusData::try_from(&self.data)?,
            ex_units: conway::ExUnits {
                mem: u32::try_from(self.ex_units.mem).map_err(|_| out_of_range("memory budget"))?,
                steps: self.ex_units.steps,
            },
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DraftOutput {
    pub address: Vec<u8>,
    pub values: Values,
    pub datum: Option<PlutusData>,
}

impl DraftOutput {
    fn from_unbuilt<D: Clone + Into<PlutusData>>(output: &UnbuiltOutput<D>) -> Self {
        DraftOutput {
            address: output.owner().to_vec(),
            values: output.values().clone(),
            datum: output.datum().map(|datum| datum.clone().into()),
        }
    }

    /// Post-Alonzo output, the datum inlined
    fn to_ledger(&self) -> IssuanceResult<conway::TransactionOutput> {
        let datum_option = self
            .datum
            .as_ref()
            .map(|datum| LedgerPlutusData::try_from(datum).map(|d| PseudoDatumOption::Data(CborWrap(d))))
            .transpose()?;
        Ok(PseudoTransactionOutput::PostAlonzo(PostAlonzoTransactionOutput {
            address: self.address.clone().into(),
            value: ledger_value(&self.values)?,
            datum_option,
            script_ref: None,
        }))
    }
}

/// Signature over the transaction id by an Ed25519 key
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VKeyWitness {
    pub vkey: [u8; 32],
    pub signature: [u8; 64],
}

impl VKeyWitness {
    /// Same size as a real witness, used to measure the transaction before signing
    pub fn dummy() -> Self {
        VKeyWitness {
            vkey: [0; 32],
            signature: [0; 64],
        }
    }
}

/// Babbage transaction before signing
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DraftTx {
    pub inputs: BTreeSet<OutputId>,
    pub reference_inputs: BTreeSet<OutputId>,
    pub collateral: Vec<OutputId>,
    pub outputs: Vec<DraftOutput>,
    pub fee: u64,
    pub mint: MultiAsset,
    pub redeemers: Vec<DraftRedeemer>,
    pub scripts: Vec<PlutusScript>,
    pub script_data_hash: Option<[u8; 32]>,
}

impl DraftTx {
    pub fn body(&self) -> IssuanceResult<conway::TransactionBody> {
        let mint = if self.mint.is_empty() {
            None
        } else {
            Some(multiasset(&self.mint, |amount| {
                i64::try_from(amount).map_err(|_| out_of_range("mint amount"))
            })?)
        };
        let collateral = if self.redeemers.is_empty() {
            None
        } else {
            Some(transaction_inputs(&self.collateral)?)
        };
        let reference_inputs = if self.reference_inputs.is_empty() {
            None
        } else {
            Some(transaction_inputs(&self.reference_inputs)?)
        };
        Ok(conway::TransactionBody {
            inputs: transaction_inputs(&self.inputs)?,
            outputs: self
                .outputs
                .iter()
                .map(DraftOutput::to_ledger)
                .collect::<IssuanceResult<Vec<_>>>()?,
            fee: self.fee,
            ttl: None,
            certificates: None,
            withdrawals: None,
            auxiliary_data_hash: None,
            validity_interval_start: None,
            mint,
            script_data_hash: self.script_data_hash.map(Hash::from),
            collateral,
            required_signers: None,
            network_id: None,
            collateral_return: None,
            total_collateral: None,
            reference_inputs,
            voting_procedures: None,
            proposal_procedures: None,
            treasury_value: None,
            donation: None,
        })
    }

    /// Key witnesses, redeemers and the scripts not provided by reference inputs
    pub fn witness_set(&self, vkeys: &[VKeyWitness]) -> IssuanceResult<conway::WitnessSet> {
        let vkeywitness: Vec<_> = vkeys
            .iter()
            .map(|witness| conway::VKeyWitness {
                vkey: witness.vkey.to_vec().into(),
                signature: witness.signature.to_vec().into(),
            })
            .collect();
        let redeemer = self
            .redeemers
            .iter()
            .map(DraftRedeemer::to_ledger)
            .collect::<IssuanceResult<Vec<_>>>()?;
        Ok(conway::WitnessSet {
            vkeywitness: non_empty(vkeywitness),
            native_script: None,
            bootstrap_witness: None,
            plutus_v1_script: non_empty(
                self.scripts_of(PlutusVersion::V1)
                    .map(conway::PlutusV1Script)
                    .collect(),
            ),
            plutus_data: None,
            redeemer: non_empty(redeemer),
            plutus_v2_script: non_empty(
                self.scripts_of(PlutusVersion::V2)
                    .map(conway::PlutusV2Script)
                    .collect(),
            ),
            // pallas types V3 witnesses with the V2 wrapper
            plutus_v3_script: non_empty(
                self.scripts_of(PlutusVersion::V3)
                    .map(conway::PlutusV2Script)
                    .collect(),
            ),
        })
    }

    /// Complete transaction: body, witnesses, validity flag and no auxiliary data
    pub fn tx(&self, vkeys: &[VKeyWitness]) -> IssuanceResult<conway::Tx> {
        Ok(conway::Tx {
            transaction_body: self.body()?,
            transaction_witness_set: self.witness_set(vkeys)?,
            success: true,
            auxiliary_data: Nullable::Null,
        })
    }

    pub fn body_bytes(&self) -> IssuanceResult<Vec<u8>> {
        to_cbor(&self.body()?)
    }

    pub fn tx_bytes(&self, vkeys: &[VKeyWitness]) -> IssuanceResult<Vec<u8>> {
        to_cbor(&self.tx(vkeys)?)
    }

    /// Transaction id, the hash every key witness signs
    pub fn id(&self) -> IssuanceResult<[u8; 32]> {
        Ok(blake2b_256(&self.body_bytes()?))
    }

    pub fn total_ex_units(&self) -> ExUnits {
        self.redeemers.iter().fold(ExUnits::default(), |acc, r| ExUnits {
            mem: acc.mem + r.ex_units.mem,
            steps: acc.steps + r.ex_units.steps,
        })
    }

    fn scripts_of(&self, version: PlutusVersion) -> impl Iterator<Item = Bytes> + '_ {
        self.scripts
            .iter()
            .filter(move |script| script.version() == version)
            .map(|script| Bytes::from(script.bytes().to_vec()))
    }
}

fn non_empty<T>(items: Vec<T>) -> Option<Vec<T>> {
    if items.is_empty() {
        None
    } else {
        Some(items)
    }
}

fn transaction_inputs<'a, I>(ids: I) -> IssuanceResult<Vec<conway::TransactionInput>>
where
    I: IntoIterator<Item = &'a OutputId>,
{
    ids.into_iter()
        .map(|id| {
            let tx_hash: [u8; 32] = id
                .tx_hash()
                .try_into()
                .map_err(|_| IssuanceError::Encode(format!("bad tx hash in input {id}")))?;
            Ok(conway::TransactionInput {
                transaction_id: Hash::from(tx_hash),
                index: id.index(),
            })
        })
        .collect()
}

fn multiasset<A, F>(assets: &MultiAsset, amount: F) -> IssuanceResult<conway::Multiasset<A>>
where
    A: Clone,
    F: Fn(u64) -> IssuanceResult<A>,
{
    let mut policies = Vec::with_capacity(assets.len());
    for (policy, names) in assets {
        let policy: [u8; 28] = policy
            .as_slice()
            .try_into()
            .map_err(|_| IssuanceError::Encode(format!("bad policy id {}", hex::encode(policy))))?;
        let names = names
            .iter()
            .map(|(name, quantity)| Ok((Bytes::from(name.clone()), amount(*quantity)?)))
            .collect::<IssuanceResult<Vec<_>>>()?;
        policies.push((Hash::from(policy), KeyValuePairs::from(names)));
    }
    Ok(KeyValuePairs::from(policies))
}

fn ledger_value(values: &Values) -> IssuanceResult<conway::Value> {
    let assets = values.multi_asset()?;
    let value = if assets.is_empty() {
        conway::Value::Coin(values.lovelace())
    } else {
        conway::Value::Multiasset(values.lovelace(), multiasset(&assets, Ok)?)
    };
    Ok(value)
}

/// Hash binding the redeemers and the cost models of `languages` to the body
pub fn script_data_hash(
    redeemers: &[DraftRedeemer],
    languages: &BTreeSet<PlutusVersion>,
    params: &ProtocolParams,
) -> IssuanceResult<[u8; 32]> {
    let redeemers = redeemers
        .iter()
        .map(DraftRedeemer::to_ledger)
        .collect::<IssuanceResult<Vec<_>>>()?;
    let mut views: Vec<(u8, conway::CostModel)> = Vec::with_capacity(languages.len());
    for version in languages {
        let key = match version {
            // V1 views use a different, double-encoded layout
            PlutusVersion::V1 => return Err(IssuanceError::UnsupportedLanguage(*version)),
            PlutusVersion::V2 => 1,
            PlutusVersion::V3 => 2,
        };
        let cost_model = params
            .cost_model(*version)
            .ok_or(IssuanceError::MissingCostModel(*version))?;
        views.push((key, cost_model.clone()));
    }
    let mut preimage = to_cbor(&redeemers)?;
    preimage.extend(to_cbor(&KeyValuePairs::from(views))?);
    Ok(blake2b_256(&preimage))
}

/// Fee charged for the reference scripts a transaction touches, priced per byte in tiers
pub fn ref_script_fee(base_price: f64, size: usize) -> u64 {
    let mut fee = 0.0;
    let mut price = base_price;
    let mut remaining = size;
    while remaining >= REF_SCRIPT_SIZE_INCREMENT {
        fee += REF_SCRIPT_SIZE_INCREMENT as f64 * price;
        remaining -= REF_SCRIPT_SIZE_INCREMENT;
        price *= REF_SCRIPT_MULTIPLIER;
    }
    fee += remaining as f64 * price;
    fee.ceil() as u64
}

/// Smallest fee the ledger accepts for a transaction of `tx_size` bytes
pub fn min_fee(
    params: &ProtocolParams,
    tx_size: usize,
    ex_units: ExUnits,
    ref_script_size: usize,
) -> u64 {
    let size_fee = params.min_fee_a * tx_size as u64 + params.min_fee_b;
    let exec_fee =
        (params.price_mem * ex_units.mem as f64 + params.price_step * ex_units.steps as f64).ceil()
            as u64;
    let ref_fee = params
        .min_fee_ref_script_cost_per_byte
        .map(|price| ref_script_fee(price, ref_script_size))
        .unwrap_or_default();
    size_fee + exec_fee + ref_fee
}

/// Smallest pure-ADA output holding at least [`MIN_COLLATERAL`]
pub fn select_collateral<D>(wallet: &[Output<D>]) -> Option<&Output<D>> {
    wallet
        .iter()
        .filter(|output| output.values().is_pure_ada())
        .filter(|output| output.values().lovelace() >= MIN_COLLATERAL)
        .min_by_key(|output| output.values().lovelace())
}

/// Wallet outputs, largest lovelace first, until `available` plus them covers `target`
pub fn select_inputs<D: Clone>(
    wallet: &[Output<D>],
    available: &Values,
    target: &Values,
) -> IssuanceResult<Vec<Output<D>>> {
    let mut candidates: Vec<&Output<D>> = wallet.iter().collect();
    candidates.sort_by_key(|output| std::cmp::Reverse(output.values().lovelace()));
    let mut total = available.clone();
    let mut selected = Vec::new();
    let mut candidates = candidates.into_iter();
    loop {
        match total.try_subtract(target) {
            Ok(_) => return Ok(selected),
            Err(err) => match candidates.next() {
                Some(output) => {
                    total.add_values(output.values()).map_err(value_error)?;
                    selected.push(output.clone());
                }
                None => return Err(value_error(err)),
            },
        }
    }
}

/// Turns [`TxActions`] into balanced drafts. Inputs and collateral are picked once, so drafts for
/// different fees and budgets only differ in those fields.
pub struct Balancer<'a, D, R> {
    actions: &'a TxActions<D, R>,
    change_address: &'a Address,
    wallet_inputs: Vec<Output<D>>,
    collateral: Option<OutputId>,
}

impl<'a, D, R> Balancer<'a, D, R>
where
    D: Clone + Into<PlutusData>,
    R: Clone + Into<PlutusData>,
{
    /// `wallet` holds the signer's spendable outputs, change goes to `change_address`
    pub fn new(
        actions: &'a TxActions<D, R>,
        wallet: &[Output<D>],
        change_address: &'a Address,
    ) -> IssuanceResult<Self> {
        let mut available = actions.minted_values().map_err(value_error)?;
        for input in &actions.script_inputs {
            available
                .add_values(input.output.values())
                .map_err(value_error)?;
        }
        let mut target = Values::default().with(&PolicyId::Lovelace, FEE_BUFFER + MIN_CHANGE);
        for output in &actions.outputs {
            target.add_values(output.values()).map_err(value_error)?;
        }
        let wallet_inputs = select_inputs(wallet, &available, &target)?;
        let collateral = if Self::runs_scripts(actions) {
            let collateral = select_collateral(wallet).ok_or(IssuanceError::NoCollateral)?;
            Some(collateral.id().clone())
        } else {
            None
        };
        Ok(Balancer {
            actions,
            change_address,
            wallet_inputs,
            collateral,
        })
    }

    fn runs_scripts(actions: &TxActions<D, R>) -> bool {
        !actions.script_inputs.is_empty() || !actions.minting.is_empty()
    }

    pub fn runs_any_script(&self) -> bool {
        Self::runs_scripts(self.actions)
    }

    /// Bytes of reference scripts carried by the spent and referenced outputs
    pub fn ref_script_size(&self) -> usize {
        let spent = self.actions.script_inputs.iter().map(|input| &input.output);
        self.actions
            .reference_inputs
            .iter()
            .chain(spent)
            .chain(self.wallet_inputs.iter())
            .filter_map(|output| output.script_ref())
            .map(|script| script.bytes().len())
            .sum()
    }

    /// Balanced transaction paying `fee`. Redeemers get `ex_units` budgets, or
    /// [`PLACEHOLDER_EX_UNITS`] when `None`.
    pub fn draft(
        &self,
        fee: u64,
        ex_units: Option<&ExUnitsMap>,
        params: &ProtocolParams,
    ) -> IssuanceResult<DraftTx> {
        if fee > FEE_BUFFER {
            return Err(IssuanceError::FeeTooHigh(fee));
        }
        let actions = self.actions;
        let inputs: BTreeSet<OutputId> = actions
            .script_inputs
            .iter()
            .map(|input| input.output.id().clone())
            .chain(self.wallet_inputs.iter().map(|output| output.id().clone()))
            .collect();
        let reference_inputs: BTreeSet<OutputId> = actions
            .reference_inputs
            .iter()
            .map(|output| output.id().clone())
            .collect();

        let mut mint = MultiAsset::new();
        let mut mint_redeemers: BTreeMap<Vec<u8>, &R> = BTreeMap::new();
        for action in &actions.minting {
            let policy = action.policy.hash().to_vec();
            let amount = mint
                .entry(policy.clone())
                .or_default()
                .entry(action.asset_name.clone())
                .or_insert(0);
            *amount += action.amount;
            mint_redeemers.entry(policy).or_insert(&action.redeemer);
        }

        let budget = |tag: RedeemerTag, index: u64| -> IssuanceResult<ExUnits> {
            match ex_units {
                Some(units) => units
                    .get(&(tag, index))
                    .copied()
                    .ok_or(IssuanceError::MissingExUnits(tag, index)),
                None => Ok(PLACEHOLDER_EX_UNITS),
            }
        };
        let mut redeemers = Vec::new();
        for input in &actions.script_inputs {
            let index = inputs
                .iter()
                .position(|id| id == input.output.id())
                .unwrap_or_default() as u64;
            redeemers.push(DraftRedeemer {
                tag: RedeemerTag::Spend,
                index,
                data: input.redeemer.clone().into(),
                ex_units: budget(RedeemerTag::Spend, index)?,
            });
        }
        for (index, redeemer) in mint_redeemers.values().enumerate() {
            let index = index as u64;
            redeemers.push(DraftRedeemer {
                tag: RedeemerTag::Mint,
                index,
                data: (*redeemer).clone().into(),
                ex_units: budget(RedeemerTag::Mint, index)?,
            });
        }
        redeemers.sort_by_key(|redeemer| (redeemer.tag, redeemer.index));

        let executed = actions
            .script_inputs
            .iter()
            .map(|input| &input.script)
            .chain(actions.minting.iter().map(|action| &action.policy));
        let mut languages = BTreeSet::new();
        let mut scripts: Vec<PlutusScript> = Vec::new();
        for script in executed {
            languages.insert(script.version());
            if !actions.is_referenced(script) && !scripts.contains(script) {
                scripts.push(script.clone());
            }
        }
        let script_data_hash = if redeemers.is_empty() {
            None
        } else {
            Some(script_data_hash(&redeemers, &languages, params)?)
        };

        let mut outputs: Vec<DraftOutput> =
            actions.outputs.iter().map(DraftOutput::from_unbuilt).collect();
        let change = self.change(fee)?;
        if !change.is_empty() {
            outputs.push(DraftOutput {
                address: self.change_address.to_vec(),
                values: change,
                datum: None,
            });
        }

        Ok(DraftTx {
            inputs,
            reference_inputs,
            collateral: self.collateral.iter().cloned().collect(),
            outputs,
            fee,
            mint,
            redeemers,
            scripts,
            script_data_hash,
        })
    }

    fn change(&self, fee: u64) -> IssuanceResult<Values> {
        let mut total = self.actions.minted_values().map_err(value_error)?;
        for input in &self.actions.script_inputs {
            total
                .add_values(input.output.values())
                .map_err(value_error)?;
        }
        let wallet = Values::from_outputs(&self.wallet_inputs).map_err(value_error)?;
        total.add_values(&wallet).map_err(value_error)?;
        let mut spent = Values::default().with(&PolicyId::Lovelace, fee);
        for output in &self.actions.outputs {
            spent.add_values(output.values()).map_err(value_error)?;
        }
        total.try_subtract(&spent).map_err(value_error)
    }
}
