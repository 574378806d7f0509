use crate::{
    asteria::{
        display_address, reference::fetch_reference_script, AssetClass, AsteriaDatum,
        AsteriaDatums, AsteriaError, AsteriaRedeemers, AsteriaState,
    },
    ledger_client::LedgerClient,
    output::Output,
};
use pallas_addresses::Address;

/// The Asteria UTxO and its decoded datum. The first output at `address` holding `admin_token`
/// wins, otherwise the first output there.
pub async fn current_asteria<LC>(
    ledger_client: &LC,
    address: &Address,
    admin_token: Option<&AssetClass>,
) -> Result<(Output<AsteriaDatums>, AsteriaDatum), AsteriaError>
where
    LC: LedgerClient<AsteriaDatums, AsteriaRedeemers>,
{
    let mut outputs = ledger_client.all_outputs_at_address(address).await?;
    let holder = admin_token.and_then(|token| {
        let policy = token.policy_id();
        outputs
            .iter()
            .position(|output| output.values().get(&policy).unwrap_or_default() > 0)
    });
    if outputs.is_empty() {
        return Err(AsteriaError::AsteriaNotFound(display_address(address)));
    }
    let output = outputs.swap_remove(holder.unwrap_or_default());
    match output.typed_datum() {
        Some(AsteriaDatums::Asteria(datum)) => Ok((output, datum)),
        _ => Err(AsteriaError::MissingAsteriaDatum(output.id().clone())),
    }
}

/// Counter, balance and location of the Asteria UTxO
pub async fn asteria_state<LC>(
    ledger_client: &LC,
    asteria_ref_tx_hash: &str,
    admin_token: Option<&AssetClass>,
) -> Result<AsteriaState, AsteriaError>
where
    LC: LedgerClient<AsteriaDatums, AsteriaRedeemers>,
{
    let network = ledger_client.network().await?;
    let asteria =
        fetch_reference_script::<_, AsteriaRedeemers, _>(ledger_client, asteria_ref_tx_hash)
            .await?;
    let address = asteria.script.address(network)?;
    let (output, datum) = current_asteria(ledger_client, &address, admin_token).await?;
    Ok(AsteriaState {
        output_id: output.id().clone(),
        lovelace: output.values().lovelace(),
        address,
        datum,
    })
}
