#![allow(non_snake_case)]

use super::*;
use crate::scripts::PlutusVersion;

fn wallet(seed: u8) -> Address {
    let mut bytes = vec![0x60];
    bytes.extend_from_slice(&[seed; 28]);
    Address::from_bytes(&bytes).unwrap()
}

fn script() -> PlutusScript {
    PlutusScript::new(PlutusVersion::V2, vec![0x46, 0x01, 0x00, 0x00, 0x22, 0x22, 0x01])
}

fn token() -> PolicyId {
    PolicyId::native_token_named(&script().policy_id(), b"TOKEN")
}

#[tokio::test]
async fn outputs_at_address() {
    let signer = wallet(1);
    let starting_amount = 10_000_000;
    let record: TestLedgerClient<(), (), _> = TestBackendsBuilder::new(&signer)
        .start_output(&signer)
        .with_value(PolicyId::Lovelace, starting_amount)
        .finish_output()
        .build_in_memory();

    let mut outputs = record.all_outputs_at_address(&signer).await.unwrap();

    assert_eq!(outputs.len(), 1);
    let first_output = outputs.pop().unwrap();
    assert_eq!(first_output.values().lovelace(), starting_amount);
    assert_eq!(record.lookup_count(), 1);
}

#[tokio::test]
async fn outputs_at_address__respects_count() {
    let signer = wallet(1);
    let record: TestLedgerClient<(), (), _> = TestBackendsBuilder::new(&signer)
        .start_output(&signer)
        .with_value(PolicyId::Lovelace, 1)
        .finish_output()
        .start_output(&signer)
        .with_value(PolicyId::Lovelace, 2)
        .finish_output()
        .build_in_memory();

    let outputs = record.outputs_at_address(&signer, 1).await.unwrap();

    assert_eq!(outputs.len(), 1);
    assert_eq!(outputs[0].values().lovelace(), 1);
}

#[tokio::test]
async fn balance_at_address() {
    let signer = wallet(1);
    let starting_amount = 10_000_000;
    let record: TestLedgerClient<(), (), _> = TestBackendsBuilder::new(&signer)
        .start_output(&signer)
        .with_value(PolicyId::Lovelace, starting_amount)
        .finish_output()
        .build_in_memory();

    let actual = record
        .balance_at_address(&signer, &PolicyId::Lovelace)
        .await
        .unwrap();

    assert_eq!(actual, starting_amount);
}

#[tokio::test]
async fn balance_at_address__overflow_is_an_error() {
    let signer = wallet(1);
    let record: TestLedgerClient<(), (), _> = TestBackendsBuilder::new(&signer)
        .start_output(&signer)
        .with_value(PolicyId::Lovelace, u64::MAX)
        .finish_output()
        .start_output(&signer)
        .with_value(PolicyId::Lovelace, 1)
        .finish_output()
        .build_in_memory();

    let err = record
        .balance_at_address(&signer, &PolicyId::Lovelace)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        LedgerClientError::BalanceOverflow(address, PolicyId::Lovelace) if address == signer
    ));
}

#[tokio::test]
async fn output_by_id__finds_seeded_output() {
    let signer = wallet(1);
    let tx_hash = [7; 32];
    let record: TestLedgerClient<(), (), _> = TestBackendsBuilder::new(&signer)
        .start_output(&wallet(2))
        .with_tx_hash(&tx_hash)
        .with_script_ref(script())
        .finish_output()
        .build_in_memory();

    let found = record
        .output_by_id(&OutputId::new(tx_hash.to_vec(), 0))
        .await
        .unwrap()
        .unwrap();
    let missing = record
        .output_by_id(&OutputId::new(tx_hash.to_vec(), 1))
        .await
        .unwrap();

    assert_eq!(found.script_ref(), Some(&script()));
    assert!(missing.is_none());
}

#[tokio::test]
async fn issue_transfer() {
    let sender = wallet(1);
    let recipient = wallet(2);
    let starting_amount = 10_000_000;
    let transfer_amount = 3_000_000;
    let record: TestLedgerClient<(), (), _> = TestBackendsBuilder::new(&sender)
        .start_output(&sender)
        .with_value(PolicyId::Lovelace, starting_amount)
        .finish_output()
        .build_in_memory();

    let values = Values::default().with(&PolicyId::Lovelace, transfer_amount);
    let tx = TxActions::default().with_wallet_output(values, recipient.clone());
    let tx_id = record.issue(tx).await.unwrap();

    let actual_bob = record
        .all_outputs_at_address(&recipient)
        .await
        .unwrap()
        .pop()
        .unwrap();
    assert_eq!(actual_bob.values().lovelace(), transfer_amount);
    assert_eq!(actual_bob.id().index(), 0);
    assert_eq!(hex::encode(actual_bob.id().tx_hash()), tx_id.as_str());

    let actual_alice = record
        .all_outputs_at_address(&sender)
        .await
        .unwrap()
        .pop()
        .unwrap();
    assert_eq!(
        actual_alice.values().lovelace(),
        starting_amount - transfer_amount
    );
    assert_eq!(actual_alice.id().index(), 1);
    assert_eq!(actual_bob.id().tx_hash(), actual_alice.id().tx_hash());
}

#[tokio::test]
async fn errors_if_spending_more_than_you_own() {
    let sender = wallet(1);
    let record: TestLedgerClient<(), (), _> =
        TestBackendsBuilder::new(&sender).build_in_memory();

    let values = Values::default().with(&PolicyId::Lovelace, 3_000_000);
    let tx = TxActions::default().with_wallet_output(values, wallet(2));
    let error = record.issue(tx).await.unwrap_err();

    assert!(matches!(error, LedgerClientError::FailedToIssueTx(_)));
}

#[tokio::test]
async fn issue__without_signer_fails_before_any_lookup() {
    let record: TestLedgerClient<(), (), _> =
        TestBackendsBuilder::without_signer().build_in_memory();

    let error = record.issue(TxActions::default()).await.unwrap_err();

    assert!(matches!(error, LedgerClientError::BaseAddress(_)));
    assert_eq!(record.call_count(), 0);
}

#[tokio::test]
async fn issue__mints_and_spends_script_output() {
    let signer = wallet(1);
    let script_address = script().address(Network::Testnet).unwrap();
    let record: TestLedgerClient<u64, (), _> = TestBackendsBuilder::new(&signer)
        .start_output(&signer)
        .with_value(PolicyId::Lovelace, 5_000_000)
        .finish_output()
        .start_output(&script_address)
        .with_value(PolicyId::Lovelace, 2_000_000)
        .with_datum(1)
        .finish_output()
        .build_in_memory();
    let locked = record
        .all_outputs_at_address(&script_address)
        .await
        .unwrap()
        .pop()
        .unwrap();

    let values = Values::default()
        .with(&PolicyId::Lovelace, 2_500_000)
        .with(&token(), 1);
    let tx = TxActions::default()
        .with_mint(1, b"TOKEN".to_vec(), (), script())
        .with_script_redeem(locked, (), script())
        .with_script_init(2, values, script_address.clone());
    record.issue(tx).await.unwrap();

    let relocked = record.all_outputs_at_address(&script_address).await.unwrap();
    assert_eq!(relocked.len(), 1);
    assert_eq!(relocked[0].typed_datum(), Some(2));
    assert_eq!(relocked[0].values().get(&token()), Some(1));
    let change = record.balance_at_address(&signer, &PolicyId::Lovelace).await;
    assert_eq!(change.unwrap(), 4_500_000);
}

#[tokio::test]
async fn issue__rejects_already_spent_input() {
    let signer = wallet(1);
    let script_address = script().address(Network::Testnet).unwrap();
    let record: TestLedgerClient<u64, (), _> = TestBackendsBuilder::new(&signer)
        .start_output(&script_address)
        .with_value(PolicyId::Lovelace, 2_000_000)
        .with_datum(1)
        .finish_output()
        .build_in_memory();
    let locked = record
        .all_outputs_at_address(&script_address)
        .await
        .unwrap()
        .pop()
        .unwrap();
    let first = TxActions::default().with_script_redeem(locked.clone(), (), script());
    let second = TxActions::default().with_script_redeem(locked, (), script());

    record.issue(first).await.unwrap();
    let error = record.issue(second).await.unwrap_err();

    assert!(matches!(error, LedgerClientError::FailedToIssueTx(_)));
    assert!(error.to_string().contains("already spent"));
}

#[tokio::test]
async fn issue__rejects_duplicate_script_input() {
    let signer = wallet(1);
    let script_address = script().address(Network::Testnet).unwrap();
    let record: TestLedgerClient<u64, (), _> = TestBackendsBuilder::new(&signer)
        .start_output(&script_address)
        .with_datum(1)
        .finish_output()
        .build_in_memory();
    let locked = record
        .all_outputs_at_address(&script_address)
        .await
        .unwrap()
        .pop()
        .unwrap();

    let tx = TxActions::default()
        .with_script_redeem(locked.clone(), (), script())
        .with_script_redeem(locked, (), script());
    let error = record.issue(tx).await.unwrap_err();

    assert!(error.to_string().contains("listed twice"));
}

#[tokio::test]
async fn issue__rejects_input_without_datum() {
    let signer = wallet(1);
    let script_address = script().address(Network::Testnet).unwrap();
    let record: TestLedgerClient<u64, (), _> = TestBackendsBuilder::new(&signer)
        .start_output(&script_address)
        .with_value(PolicyId::Lovelace, 1)
        .finish_output()
        .build_in_memory();
    let locked = record
        .all_outputs_at_address(&script_address)
        .await
        .unwrap()
        .pop()
        .unwrap();

    let tx = TxActions::default().with_script_redeem(locked, (), script());
    let error = record.issue(tx).await.unwrap_err();

    assert!(matches!(error, LedgerClientError::NoDatumOnScriptInput));
}

#[tokio::test]
async fn issue__rejects_stale_reference_input() {
    let signer = wallet(1);
    let record: TestLedgerClient<u64, (), _> = TestBackendsBuilder::new(&signer).build_in_memory();
    let phantom = Output::new_wallet(vec![9; 32], 0, wallet(3), Values::default())
        .with_script_ref(script());

    let tx = TxActions::default().with_reference_input(phantom);
    let error = record.issue(tx).await.unwrap_err();

    assert!(error.to_string().contains("already spent"));
}
