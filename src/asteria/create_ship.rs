use crate::{
    asteria::{
        display_address, lookups::current_asteria, pilot_token_name,
        reference::fetch_reference_script, ship_token_name, AsteriaDatums, AsteriaError,
        AsteriaRedeemers, CreateShip, ShipDatum, SHIP_MIN_LOVELACE,
    },
    ledger_client::LedgerClient,
    transaction::TxActions,
    values::Values,
    PolicyId,
};

/// Spend the Asteria UTxO to bump its counter and collect the fee, mint the ship and pilot
/// tokens, and lock the ship at the Spacetime address.
pub async fn create_ship<LC>(
    ledger_client: &LC,
    params: CreateShip,
) -> Result<TxActions<AsteriaDatums, AsteriaRedeemers>, AsteriaError>
where
    LC: LedgerClient<AsteriaDatums, AsteriaRedeemers>,
{
    // Fails without touching the network when there is no credential
    ledger_client.signer_base_address().await?;
    let network = ledger_client.network().await?;

    let (asteria_ref, spacetime_ref) = futures::try_join!(
        fetch_reference_script::<_, AsteriaRedeemers, _>(
            ledger_client,
            &params.asteria_ref_tx_hash
        ),
        fetch_reference_script::<_, AsteriaRedeemers, _>(
            ledger_client,
            &params.spacetime_ref_tx_hash
        ),
    )?;
    let asteria_address = asteria_ref.script.address(network)?;
    let spacetime_address = spacetime_ref.script.address(network)?;
    let shipyard_policy = spacetime_ref.script.policy_id();
    tracing::debug!(
        asteria = %display_address(&asteria_address),
        spacetime = %display_address(&spacetime_address),
        %shipyard_policy,
        "Resolved contract addresses"
    );

    let (asteria, datum) =
        current_asteria(ledger_client, &asteria_address, Some(&params.admin_token)).await?;
    let counter = datum.ship_counter;
    let next_datum = datum.next_ship()?;

    let ship_name = ship_token_name(counter);
    let pilot_name = pilot_token_name(counter);
    let ship_token = PolicyId::native_token_named(&shipyard_policy, &ship_name);
    let ship_datum = ShipDatum {
        fuel: params.initial_fuel,
        pos_x: params.pos_x,
        pos_y: params.pos_y,
        ship_token_name: ship_name.clone(),
        pilot_token_name: pilot_name.clone(),
    };
    let ship_values = Values::default()
        .with(&PolicyId::Lovelace, SHIP_MIN_LOVELACE)
        .with(&ship_token, 1);

    let asteria_lovelace = asteria
        .values()
        .lovelace()
        .checked_add(params.ship_mint_lovelace_fee)
        .ok_or(AsteriaError::FeeOverflow)?;
    let asteria_values = Values::default()
        .with(&params.admin_token.policy_id(), 1)
        .with(&PolicyId::Lovelace, asteria_lovelace);

    tracing::info!(
        asteria = %asteria.id(),
        ship_counter = counter,
        ship = %String::from_utf8_lossy(&ship_name),
        "Creating ship"
    );

    let shipyard = spacetime_ref.script.clone();
    let actions = TxActions::default()
        .with_reference_input(asteria_ref.output)
        .with_reference_input(spacetime_ref.output)
        .with_mint(1, ship_name, AsteriaRedeemers::MintShip, shipyard.clone())
        .with_mint(1, pilot_name, AsteriaRedeemers::MintShip, shipyard)
        .with_script_redeem(asteria, AsteriaRedeemers::AddNewShip, asteria_ref.script)
        .with_script_init(ship_datum.into(), ship_values, spacetime_address)
        .with_script_init(next_datum.into(), asteria_values, asteria_address);
    Ok(actions)
}
