use crate::{
    asteria::AsteriaError,
    ledger_client::LedgerClient,
    output::{Output, OutputId},
    scripts::PlutusScript,
};

const TX_HASH_LEN: usize = 32;
const REFERENCE_OUTPUT_INDEX: u64 = 0;

/// A published script and the output carrying it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceScript<Datum> {
    /// Output to add as reference input
    pub output: Output<Datum>,
    /// The script it carries
    pub script: PlutusScript,
}

/// Parse a hex encoded transaction hash
pub fn parse_tx_hash(tx_hash: &str) -> Result<Vec<u8>, AsteriaError> {
    match hex::decode(tx_hash) {
        Ok(bytes) if bytes.len() == TX_HASH_LEN => Ok(bytes),
        _ => Err(AsteriaError::InvalidTxHash(tx_hash.to_string())),
    }
}

/// Output 0 of `tx_hash`, which must carry a script
pub async fn fetch_reference_script<Datum, Redeemer, LC>(
    ledger_client: &LC,
    tx_hash: &str,
) -> Result<ReferenceScript<Datum>, AsteriaError>
where
    LC: LedgerClient<Datum, Redeemer>,
{
    let id = OutputId::new(parse_tx_hash(tx_hash)?, REFERENCE_OUTPUT_INDEX);
    let output = ledger_client
        .output_by_id(&id)
        .await?
        .ok_or_else(|| AsteriaError::MissingValidator(tx_hash.to_string()))?;
    let script = output
        .script_ref()
        .cloned()
        .ok_or_else(|| AsteriaError::MissingValidator(tx_hash.to_string()))?;
    tracing::debug!(reference = %id, script_hash = %script.policy_id(), "Resolved reference script");
    Ok(ReferenceScript { output, script })
}
