use crate::{
    ledger_client::blockfrost_client::{
        blockfrost_http::{BlockfrostError, Result},
        issuance::{ExUnits, RedeemerTag},
    },
    scripts::PlutusVersion,
    values::Values,
    PolicyId,
};
use serde::Deserialize;
use std::collections::HashMap;

#[derive(Deserialize, Debug, Clone)]
pub struct Value {
    pub unit: String,
    pub quantity: String,
}

/// Sum `amounts` into a [`Values`]
pub fn values_from_amounts(amounts: &[Value]) -> Result<Values> {
    let mut values = Values::default();
    for value in amounts {
        let quantity = value
            .quantity
            .parse::<u64>()
            .map_err(|e| BlockfrostError::Schema(format!("quantity {:?}: {e}", value.quantity)))?;
        values
            .add_one_value(&PolicyId::from_unit(&value.unit), quantity)
            .map_err(|e| BlockfrostError::Schema(e.to_string()))?;
    }
    Ok(values)
}

/// Entry of `addresses/{address}/utxos`
#[derive(Deserialize, Debug, Clone)]
pub struct UTxO {
    pub address: String,
    pub tx_hash: String,
    pub output_index: u64,
    pub amount: Vec<Value>,
    pub data_hash: Option<String>,
    pub inline_datum: Option<String>,
    pub reference_script_hash: Option<String>,
}

/// Response of `txs/{hash}/utxos`
#[derive(Deserialize, Debug, Clone)]
pub struct TxUtxos {
    pub hash: String,
    pub outputs: Vec<TxOutput>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct TxOutput {
    pub address: String,
    pub amount: Vec<Value>,
    pub output_index: u64,
    pub data_hash: Option<String>,
    pub inline_datum: Option<String>,
    pub reference_script_hash: Option<String>,
    #[serde(default)]
    pub consumed_by_tx: Option<String>,
}

impl TxOutput {
    /// View as an address UTxO of transaction `tx_hash`
    pub fn into_utxo(self, tx_hash: &str) -> UTxO {
        UTxO {
            address: self.address,
            tx_hash: tx_hash.to_string(),
            output_index: self.output_index,
            amount: self.amount,
            data_hash: self.data_hash,
            inline_datum: self.inline_datum,
            reference_script_hash: self.reference_script_hash,
        }
    }
}

/// Response of `scripts/{hash}`
#[derive(Deserialize, Debug, Clone)]
pub struct ScriptInfo {
    pub script_hash: String,
    pub r#type: String,
}

impl ScriptInfo {
    /// Plutus version, `None` for native scripts
    pub fn plutus_version(&self) -> Option<PlutusVersion> {
        match self.r#type.as_str() {
            "plutusV1" => Some(PlutusVersion::V1),
            "plutusV2" => Some(PlutusVersion::V2),
            "plutusV3" => Some(PlutusVersion::V3),
            _ => None,
        }
    }
}

/// Response of `scripts/{hash}/cbor` and `scripts/datum/{hash}/cbor`
#[derive(Deserialize, Debug, Clone)]
pub struct Cbor {
    pub cbor: Option<String>,
}

/// Subset of `epochs/latest/parameters` needed to balance a transaction
#[derive(Deserialize, Debug, Clone)]
pub struct ProtocolParams {
    pub min_fee_a: u64,
    pub min_fee_b: u64,
    pub max_tx_size: u64,
    pub price_mem: f64,
    pub price_step: f64,
    #[serde(default)]
    pub min_fee_ref_script_cost_per_byte: Option<f64>,
    #[serde(default)]
    pub collateral_percent: Option<u64>,
    #[serde(default)]
    pub cost_models_raw: Option<HashMap<String, Vec<i64>>>,
}

impl ProtocolParams {
    /// Cost model parameters for `version`, in ledger order
    pub fn cost_model(&self, version: PlutusVersion) -> Option<&Vec<i64>> {
        let key = match version {
            PlutusVersion::V1 => "PlutusV1",
            PlutusVersion::V2 => "PlutusV2",
            PlutusVersion::V3 => "PlutusV3",
        };
        self.cost_models_raw.as_ref()?.get(key)
    }
}

/// JSON-WSP envelope returned by `utils/txs/evaluate`
#[derive(Deserialize, Debug)]
pub struct EvaluateTxResult {
    #[serde(default)]
    pub result: Option<serde_json::Value>,
    #[serde(default)]
    pub fault: Option<serde_json::Value>,
}

#[derive(Deserialize, Debug)]
struct Budget {
    memory: u64,
    steps: u64,
}

impl EvaluateTxResult {
    /// Execution units per redeemer pointer
    pub fn ex_units(&self) -> Result<Vec<(RedeemerTag, u64, ExUnits)>> {
        if let Some(fault) = &self.fault {
            return Err(BlockfrostError::EvaluateTxResult(fault.to_string()));
        }
        let result = self
            .result
            .as_ref()
            .ok_or_else(|| BlockfrostError::EvaluateTxResult("empty result".to_string()))?;
        let evaluation = match result.get("EvaluationResult") {
            Some(evaluation) => evaluation,
            None => return Err(BlockfrostError::EvaluateTxResult(result.to_string())),
        };
        let inner = evaluation.as_object().ok_or_else(|| {
            BlockfrostError::EvaluateTxResult(format!("not an object: {evaluation}"))
        })?;
        let mut units = Vec::new();
        for (key, val) in inner {
            let (tag, index) = key
                .split_once(':')
                .ok_or_else(|| BlockfrostError::EvaluateTxResult(format!("pointer {key:?}")))?;
            let tag = match tag {
                "spend" => RedeemerTag::Spend,
                "mint" => RedeemerTag::Mint,
                other => {
                    return Err(BlockfrostError::EvaluateTxResult(format!(
                        "unsupported purpose {other:?}"
                    )))
                }
            };
            let index = index
                .parse::<u64>()
                .map_err(|e| BlockfrostError::EvaluateTxResult(e.to_string()))?;
            let budget: Budget = serde_json::from_value(val.clone())
                .map_err(|e| BlockfrostError::EvaluateTxResult(e.to_string()))?;
            units.push((
                tag,
                index,
                ExUnits {
                    mem: budget.memory,
                    steps: budget.steps,
                },
            ));
        }
        Ok(units)
    }
}
