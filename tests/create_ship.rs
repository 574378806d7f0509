#![allow(non_snake_case)]

use asteria::{
    asteria::{
        AsteriaDatum, AsteriaDatums, AsteriaEndpoints, AsteriaLogic, AsteriaRedeemers, AssetClass,
        CreateShip, ShipDatum,
    },
    error::Error,
    ledger_client::{
        test_ledger_client::{in_memory_storage::InMemoryStorage, TestBackendsBuilder, TestLedgerClient},
        LedgerClient, LedgerClientError,
    },
    logic::{SCLogic, SCLogicError},
    scripts::{PlutusScript, PlutusVersion},
    smart_contract::{SmartContract, SmartContractTrait},
    Address, Network, PolicyId,
};

type Ledger = TestLedgerClient<AsteriaDatums, AsteriaRedeemers, InMemoryStorage<AsteriaDatums>>;

const ASTERIA_REF: [u8; 32] = [0x11; 32];
const SPACETIME_REF: [u8; 32] = [0x22; 32];

fn address(header: u8, fill: u8) -> Address {
    let mut bytes = vec![header];
    bytes.extend_from_slice(&[fill; 28]);
    Address::from_bytes(&bytes).unwrap()
}

fn me() -> Address {
    address(0x60, 0x01)
}

fn publisher() -> Address {
    address(0x60, 0x02)
}

fn asteria_validator() -> PlutusScript {
    PlutusScript::new(PlutusVersion::V2, vec![0x46, 0x01, 0x00, 0x00, 0x22, 0x22, 0x11])
}

fn spacetime_validator() -> PlutusScript {
    PlutusScript::new(PlutusVersion::V2, vec![0x46, 0x01, 0x00, 0x00, 0x22, 0x22, 0x22])
}

fn admin() -> AssetClass {
    AssetClass::new(&"0f".repeat(28), b"asteriaAdmin").unwrap()
}

fn params(fee: u64) -> CreateShip {
    CreateShip {
        asteria_ref_tx_hash: hex::encode(ASTERIA_REF),
        spacetime_ref_tx_hash: hex::encode(SPACETIME_REF),
        admin_token: admin(),
        ship_mint_lovelace_fee: fee,
        initial_fuel: 30,
        pos_x: 20,
        pos_y: -20,
    }
}

fn game(builder: TestBackendsBuilder<AsteriaDatums, AsteriaRedeemers>) -> Ledger {
    let asteria_address = asteria_validator().address(Network::Testnet).unwrap();
    builder
        .start_output(&me())
        .with_value(PolicyId::Lovelace, 50_000_000)
        .finish_output()
        .start_output(&publisher())
        .with_tx_hash(&ASTERIA_REF)
        .with_value(PolicyId::Lovelace, 15_000_000)
        .with_script_ref(asteria_validator())
        .finish_output()
        .start_output(&publisher())
        .with_tx_hash(&SPACETIME_REF)
        .with_value(PolicyId::Lovelace, 15_000_000)
        .with_script_ref(spacetime_validator())
        .finish_output()
        .start_output(&asteria_address)
        .with_value(admin().policy_id(), 1)
        .with_value(PolicyId::Lovelace, 2_000_000)
        .with_datum(AsteriaDatums::Asteria(AsteriaDatum {
            ship_counter: 5,
            shipyard_policy: spacetime_validator().hash().to_vec(),
        }))
        .finish_output()
        .build_in_memory()
}

#[tokio::test]
async fn create_ship__mints_fifth_ship_and_pilot() {
    let contract = SmartContract::new(AsteriaLogic, game(TestBackendsBuilder::new(&me())));

    contract
        .hit_endpoint(AsteriaEndpoints::CreateShip(params(1_000_000)))
        .await
        .unwrap();

    let ledger = contract.ledger_client();
    let shipyard = spacetime_validator().policy_id();
    let pilot = PolicyId::native_token_named(&shipyard, b"PILOT5");
    let ship = PolicyId::native_token_named(&shipyard, b"SHIP5");
    assert_eq!(ledger.balance_at_address(&me(), &pilot).await.unwrap(), 1);

    let spacetime_address = spacetime_validator().address(Network::Testnet).unwrap();
    let ships = ledger.all_outputs_at_address(&spacetime_address).await.unwrap();
    assert_eq!(ships.len(), 1);
    assert_eq!(ships[0].values().get(&ship), Some(1));
    assert_eq!(
        ships[0].typed_datum(),
        Some(AsteriaDatums::Ship(ShipDatum {
            fuel: 30,
            pos_x: 20,
            pos_y: -20,
            ship_token_name: b"SHIP5".to_vec(),
            pilot_token_name: b"PILOT5".to_vec(),
        }))
    );

    let asteria_address = asteria_validator().address(Network::Testnet).unwrap();
    let asteria = ledger.all_outputs_at_address(&asteria_address).await.unwrap();
    assert_eq!(asteria.len(), 1);
    assert_eq!(asteria[0].values().lovelace(), 3_000_000);
    match asteria[0].typed_datum() {
        Some(AsteriaDatums::Asteria(datum)) => assert_eq!(datum.ship_counter, 6),
        other => panic!("unexpected datum {other:?}"),
    }
}

#[tokio::test]
async fn create_ship__zero_fee_keeps_asteria_balance() {
    let contract = SmartContract::new(AsteriaLogic, game(TestBackendsBuilder::new(&me())));

    contract
        .hit_endpoint(AsteriaEndpoints::CreateShip(params(0)))
        .await
        .unwrap();

    let asteria_address = asteria_validator().address(Network::Testnet).unwrap();
    let asteria = contract
        .ledger_client()
        .all_outputs_at_address(&asteria_address)
        .await
        .unwrap();
    assert_eq!(asteria[0].values().lovelace(), 2_000_000);
    assert_eq!(asteria[0].values().get(&admin().policy_id()), Some(1));
}

#[tokio::test]
async fn create_ship__racing_transactions_only_one_lands() {
    let ledger = game(TestBackendsBuilder::new(&me()));
    let first = AsteriaLogic::handle_endpoint(AsteriaEndpoints::CreateShip(params(1_000_000)), &ledger)
        .await
        .unwrap();
    let second = AsteriaLogic::handle_endpoint(AsteriaEndpoints::CreateShip(params(1_000_000)), &ledger)
        .await
        .unwrap();

    ledger.issue(first).await.unwrap();
    let err = ledger.issue(second).await.unwrap_err();

    assert!(matches!(err, LedgerClientError::FailedToIssueTx(_)));
    assert!(err.to_string().contains("already spent"));
}

#[tokio::test]
async fn create_ship__without_credential_makes_no_calls() {
    let contract = SmartContract::new(AsteriaLogic, game(TestBackendsBuilder::without_signer()));

    let err = contract
        .hit_endpoint(AsteriaEndpoints::CreateShip(params(1_000_000)))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        Error::SCLogic(SCLogicError::LedgerClient(LedgerClientError::BaseAddress(_)))
    ));
    assert_eq!(contract.ledger_client().call_count(), 0);
}
