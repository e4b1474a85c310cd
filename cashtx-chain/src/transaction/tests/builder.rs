use super::super::*;
use super::{address_of, key, p2pkh_utxo};

use crate::amount::Amount;
use crate::serialization::sha256d;
use crate::transaction::sighash::{SighashType, SigningAlgorithm};
use crate::transparent::token::{Capability, Nft, TokenData};
use crate::transparent::{Output, Script, UnspentOutput};

fn sat(value: i64) -> Amount {
    Amount::from_sat(value)
}

#[test]
fn empty_transaction_serialization() {
    cashtx_test::init();

    let tx = Transaction::new();
    assert_eq!(tx.serialize_unchecked(), "02000000000000000000");
}

#[test]
fn id_is_reversed_sha256d_of_serialization() {
    cashtx_test::init();

    let tx = Transaction::new();
    let mut digest = sha256d::digest(&tx.to_bytes());
    digest.reverse();
    assert_eq!(tx.id(), hex::encode(digest));
}

#[test]
fn empty_data_is_rejected() {
    cashtx_test::init();

    assert!(matches!(
        Transaction::from_hex(""),
        Err(TransactionError::NoData)
    ));
    assert!(matches!(
        Transaction::from_bytes(&[]),
        Err(TransactionError::NoData)
    ));
}

#[test]
fn p2pkh_payment_roundtrip() {
    cashtx_test::init();

    let sender = key(1);
    let recipient = key(2);
    let utxo = p2pkh_utxo(0xaa, 0, 100_000, &sender);

    let mut tx = Transaction::new();
    tx.spend(&utxo)
        .unwrap()
        .pay_to(&address_of(&recipient), sat(90_000))
        .unwrap()
        .set_fee(sat(10_000))
        .unwrap()
        .sign(&sender)
        .unwrap();

    assert!(tx.is_fully_signed().unwrap());
    assert_eq!(tx.fee().unwrap(), sat(10_000));

    let hex_form = tx.serialize_checked().expect("all gates should pass");
    let parsed = Transaction::from_hex(&hex_form).expect("serialization should parse");
    assert_eq!(parsed, tx);
    assert_eq!(parsed.id(), tx.id());
    assert_eq!(parsed.inputs.len(), 1);
    assert_eq!(parsed.outputs.len(), 1);
}

#[test]
fn sub_dust_change_is_surrendered_as_fee() {
    cashtx_test::init();

    let sender = key(1);
    let utxo = p2pkh_utxo(0xaa, 0, 100_000, &sender);

    let mut tx = Transaction::new();
    tx.spend(&utxo)
        .unwrap()
        .pay_to(&address_of(&key(2)), sat(99_455))
        .unwrap()
        .change_to(&address_of(&key(3)))
        .unwrap();

    // 545 sat of surplus is below the dust threshold: no change output.
    assert!(tx.change_output().is_none());
    assert_eq!(tx.outputs.len(), 1);
    assert_eq!(tx.fee().unwrap(), sat(545));
}

#[test]
fn change_and_fee_solve_to_conservation() {
    cashtx_test::init();

    let sender = key(1);
    let utxo = p2pkh_utxo(0xaa, 0, 1_000_000, &sender);

    let mut tx = Transaction::new();
    tx.spend(&utxo)
        .unwrap()
        .pay_to(&address_of(&key(2)), sat(100_000))
        .unwrap()
        .change_to(&address_of(&key(3)))
        .unwrap();

    let change = tx.change_output().expect("surplus is far above dust");
    assert!(change.value.as_sat() >= DUST_AMOUNT);
    assert_eq!(change.script, address_of(&key(3)).lock_script());

    // Σ inputs = Σ outputs + fee.
    let conservation =
        tx.output_amount().unwrap().as_sat() + tx.fee().unwrap().as_sat();
    assert_eq!(tx.input_amount().unwrap().as_sat(), conservation);
}

#[test]
fn large_fee_needs_a_change_address_or_an_override() {
    cashtx_test::init();

    let sender = key(1);
    let utxo = p2pkh_utxo(0xaa, 0, 100_000_000, &sender);

    let mut tx = Transaction::new();
    tx.spend(&utxo)
        .unwrap()
        .pay_to(&address_of(&key(2)), sat(600))
        .unwrap()
        .sign(&sender)
        .unwrap();

    assert!(matches!(
        tx.serialize_checked(),
        Err(TransactionError::ChangeAddressMissing)
    ));

    let opts = SerializeOptions {
        disable_large_fees: true,
        ..SerializeOptions::default()
    };
    tx.serialize_with(&opts)
        .expect("disabling the large-fee gate lets the surplus through");
}

#[test]
fn explicit_fee_must_match_the_surplus() {
    cashtx_test::init();

    let sender = key(1);
    let utxo = p2pkh_utxo(0xaa, 0, 100_000, &sender);

    let mut tx = Transaction::new();
    tx.spend(&utxo)
        .unwrap()
        .pay_to(&address_of(&key(2)), sat(90_000))
        .unwrap()
        .set_fee(sat(5_000))
        .unwrap()
        .sign(&sender)
        .unwrap();

    assert!(matches!(
        tx.serialize_checked(),
        Err(TransactionError::FeeDifferent {
            expected: 5_000,
            actual: 10_000
        })
    ));
}

#[test]
fn tiny_fees_are_rejected() {
    cashtx_test::init();

    let sender = key(1);
    let utxo = p2pkh_utxo(0xaa, 0, 100_000, &sender);

    let mut tx = Transaction::new();
    tx.spend(&utxo)
        .unwrap()
        .pay_to(&address_of(&key(2)), sat(99_999))
        .unwrap()
        .sign(&sender)
        .unwrap();

    assert!(matches!(
        tx.serialize_checked(),
        Err(TransactionError::FeeTooSmall { fee: 1, .. })
    ));
}

#[test]
fn dust_outputs_are_rejected() {
    cashtx_test::init();

    let sender = key(1);
    let utxo = p2pkh_utxo(0xaa, 0, 100_000, &sender);

    let mut tx = Transaction::new();
    tx.spend(&utxo)
        .unwrap()
        .pay_to(&address_of(&key(2)), sat(500))
        .unwrap()
        .pay_to(&address_of(&key(3)), sat(98_000))
        .unwrap()
        .sign(&sender)
        .unwrap();

    assert!(matches!(
        tx.serialize_checked(),
        Err(TransactionError::DustOutputs { index: 0, .. })
    ));

    let opts = SerializeOptions {
        disable_dust_outputs: true,
        ..SerializeOptions::default()
    };
    tx.serialize_with(&opts).expect("only the dust gate fails");
}

#[test]
fn data_outputs_are_exempt_from_dust() {
    cashtx_test::init();

    let sender = key(1);
    let utxo = p2pkh_utxo(0xaa, 0, 100_000, &sender);

    let mut tx = Transaction::new();
    tx.spend(&utxo)
        .unwrap()
        .add_data(b"zero value payload")
        .unwrap()
        .pay_to(&address_of(&key(2)), sat(98_000))
        .unwrap()
        .sign(&sender)
        .unwrap();

    tx.serialize_checked()
        .expect("an OP_RETURN output carries no spendable value");
}

#[test]
fn unsigned_transactions_do_not_serialize() {
    cashtx_test::init();

    let sender = key(1);
    let utxo = p2pkh_utxo(0xaa, 0, 100_000, &sender);

    let mut tx = Transaction::new();
    tx.spend(&utxo)
        .unwrap()
        .pay_to(&address_of(&key(2)), sat(98_000))
        .unwrap();

    assert!(matches!(
        tx.serialize_checked(),
        Err(TransactionError::MissingSignatures)
    ));

    let opts = SerializeOptions {
        disable_is_fully_signed: true,
        ..SerializeOptions::default()
    };
    tx.serialize_with(&opts).expect("signing was the only gap");
}

#[test]
fn structural_mutation_clears_signatures() {
    cashtx_test::init();

    let sender = key(1);
    let utxo = p2pkh_utxo(0xaa, 0, 100_000, &sender);

    let mut tx = Transaction::new();
    tx.spend(&utxo)
        .unwrap()
        .pay_to(&address_of(&key(2)), sat(98_000))
        .unwrap()
        .sign(&sender)
        .unwrap();
    assert!(tx.is_fully_signed().unwrap());

    tx.pay_to(&address_of(&key(3)), sat(1_000)).unwrap();
    assert!(!tx.is_fully_signed().unwrap());
    assert!(tx.inputs[0].unlock_script.is_empty());
}

#[test]
fn duplicate_utxos_are_spent_once() {
    cashtx_test::init();

    let sender = key(1);
    let utxo = p2pkh_utxo(0xaa, 0, 100_000, &sender);

    let mut tx = Transaction::new();
    tx.spend_all(&[utxo.clone(), utxo]).unwrap();
    assert_eq!(tx.inputs.len(), 1);
}

#[test]
fn schnorr_signatures_are_accepted() {
    cashtx_test::init();

    let sender = key(1);
    let utxo = p2pkh_utxo(0xaa, 0, 100_000, &sender);

    let mut tx = Transaction::new();
    tx.spend(&utxo)
        .unwrap()
        .pay_to(&address_of(&key(2)), sat(98_000))
        .unwrap()
        .sign_with(&sender, SighashType::default(), SigningAlgorithm::Schnorr)
        .unwrap();

    assert!(tx.is_fully_signed().unwrap());
    let pushes = tx.inputs[0].unlock_script.push_values().unwrap();
    // 64-byte schnorr payload plus the sighash type byte.
    assert_eq!(pushes[0].len(), 65);
}

#[test]
fn bare_multisig_signs_to_threshold() {
    cashtx_test::init();

    let keys = [key(1), key(2), key(3)];
    let pubkeys: Vec<_> = keys.iter().map(|k| k.public_key()).collect();
    let mut utxo = p2pkh_utxo(0xaa, 0, 100_000, &keys[0]);
    utxo.script = Script::multisig_out(&pubkeys, 2);

    let mut tx = Transaction::new();
    tx.spend_multisig(&utxo, &pubkeys, 2)
        .unwrap()
        .pay_to(&address_of(&key(4)), sat(98_000))
        .unwrap();

    tx.sign(&keys[0]).unwrap();
    assert!(!tx.is_fully_signed().unwrap());
    tx.sign(&keys[1]).unwrap();
    assert!(tx.is_fully_signed().unwrap());

    // OP_0 dummy plus two signature pushes.
    assert_eq!(tx.inputs[0].unlock_script.0[0], 0x00);
}

#[test]
fn p2sh_multisig_reconstructs_its_redeem_script() {
    cashtx_test::init();

    let keys = [key(1), key(2)];
    let pubkeys: Vec<_> = keys.iter().map(|k| k.public_key()).collect();
    let redeem = Script::multisig_out(&pubkeys, 2);
    let mut utxo = p2pkh_utxo(0xaa, 0, 100_000, &keys[0]);
    utxo.script = Script::p2sh_out(&crate::transparent::keys::hash160(&redeem.0));

    let mut tx = Transaction::new();
    tx.spend_multisig(&utxo, &pubkeys, 2)
        .unwrap()
        .pay_to(&address_of(&key(4)), sat(98_000))
        .unwrap();
    tx.sign(&keys[0]).unwrap();
    tx.sign(&keys[1]).unwrap();

    assert!(tx.is_fully_signed().unwrap());
    let pushes = tx.inputs[0].unlock_script.push_values();
    // OP_0 parses as an opcode, not a push, so pushes are unavailable; the
    // redeem script is the final byte run instead.
    assert!(pushes.is_none());
    assert!(tx.inputs[0].unlock_script.0.ends_with(&redeem.0));
}

#[test]
fn multisig_over_other_scripts_is_unsupported() {
    cashtx_test::init();

    let keys = [key(1), key(2)];
    let pubkeys: Vec<_> = keys.iter().map(|k| k.public_key()).collect();
    let utxo = p2pkh_utxo(0xaa, 0, 100_000, &keys[0]);

    let mut tx = Transaction::new();
    assert!(matches!(
        tx.spend_multisig(&utxo, &pubkeys, 3),
        Err(TransactionError::InvalidArgument(_))
    ));

    let mut data_utxo = utxo;
    data_utxo.script = Script::data_out(b"not spendable");
    assert!(matches!(
        tx.spend_multisig(&data_utxo, &pubkeys, 2),
        Err(TransactionError::UnsupportedScript(_))
    ));
}

#[test]
fn unrecognized_scripts_cannot_attest_signatures() {
    cashtx_test::init();

    let sender = key(1);
    let mut utxo = p2pkh_utxo(0xaa, 0, 100_000, &sender);
    utxo.script = Script(vec![0x51, 0x87]); // OP_1 OP_EQUAL

    let mut tx = Transaction::new();
    tx.spend(&utxo)
        .unwrap()
        .pay_to(&address_of(&key(2)), sat(98_000))
        .unwrap();

    assert!(matches!(
        tx.is_fully_signed(),
        Err(TransactionError::UnableToVerifySignature)
    ));
}

#[test]
fn p2pk_outputs_select_the_public_key_signer() {
    cashtx_test::init();

    let sender = key(1);
    let mut utxo = p2pkh_utxo(0xaa, 0, 100_000, &sender);
    let mut script = vec![33u8];
    script.extend_from_slice(&sender.public_key().serialize());
    script.push(0xac); // OP_CHECKSIG
    utxo.script = Script(script);

    let mut tx = Transaction::new();
    tx.spend(&utxo)
        .unwrap()
        .pay_to(&address_of(&key(2)), sat(98_000))
        .unwrap()
        .sign(&sender)
        .unwrap();

    assert!(tx.is_fully_signed().unwrap());
    // A P2PK unlocking script is a single signature push.
    let pushes = tx.inputs[0].unlock_script.push_values().unwrap();
    assert_eq!(pushes.len(), 1);
}

#[test]
fn bip69_orders_inputs_and_outputs() {
    cashtx_test::init();

    let sender = key(1);
    let mut tx = Transaction::new();
    tx.spend(&p2pkh_utxo(0xbb, 1, 50_000, &sender))
        .unwrap()
        .spend(&p2pkh_utxo(0xaa, 7, 50_000, &sender))
        .unwrap()
        .spend(&p2pkh_utxo(0xaa, 2, 50_000, &sender))
        .unwrap();
    tx.add_output(Output::new(sat(200), Script(vec![0x51])))
        .unwrap();
    tx.add_output(Output::new(sat(100), Script(vec![0x52])))
        .unwrap();

    tx.sort().unwrap();

    assert_eq!(tx.inputs[0].outpoint.hash, Hash([0xaa; 32]));
    assert_eq!(tx.inputs[0].outpoint.index, 2);
    assert_eq!(tx.inputs[1].outpoint.index, 7);
    assert_eq!(tx.inputs[2].outpoint.hash, Hash([0xbb; 32]));
    assert_eq!(
        tx.outputs.iter().map(|o| o.value.as_sat()).collect::<Vec<_>>(),
        vec![100, 200]
    );
}

#[test]
fn change_index_follows_the_sorted_change_output() {
    cashtx_test::init();

    let sender = key(1);
    let change_address = address_of(&key(3));
    let mut tx = Transaction::new();
    tx.spend(&p2pkh_utxo(0xaa, 0, 1_000_000, &sender))
        .unwrap()
        .pay_to(&address_of(&key(2)), sat(900_000))
        .unwrap()
        .change_to(&change_address)
        .unwrap();

    let change_value = tx.change_output().expect("change exists").value;
    tx.sort().unwrap();

    let change = tx.change_output().expect("change index survived the sort");
    assert_eq!(change.script, change_address.lock_script());
    assert_eq!(change.value, change_value);
}

#[test]
fn sorting_must_be_a_permutation() {
    cashtx_test::init();

    let mut tx = Transaction::new();
    tx.add_output(Output::new(sat(1_000), Script(vec![0x51])))
        .unwrap();

    assert!(matches!(
        tx.sort_outputs_with(|_| Vec::new()),
        Err(TransactionError::InvalidSorting)
    ));
    assert!(matches!(
        tx.sort_outputs_with(|_| vec![Output::new(sat(2_000), Script(vec![0x51]))]),
        Err(TransactionError::InvalidSorting)
    ));
}

#[test]
fn lock_time_classification() {
    cashtx_test::init();

    let sender = key(1);
    let mut tx = Transaction::new();
    tx.spend(&p2pkh_utxo(0xaa, 0, 100_000, &sender)).unwrap();

    assert_eq!(tx.lock_time(), None);
    assert_eq!(tx.inputs[0].sequence, DEFAULT_SEQNUMBER);

    tx.lock_until_height(650_000).unwrap();
    assert_eq!(tx.lock_time(), Some(LockTime::Height(650_000)));
    assert_eq!(tx.inputs[0].sequence, DEFAULT_LOCKTIME_SEQNUMBER);

    tx.lock_until_timestamp(1_600_000_000).unwrap();
    match tx.lock_time() {
        Some(LockTime::Time(time)) => assert_eq!(time.timestamp(), 1_600_000_000),
        other => panic!("expected a time lock, got {:?}", other),
    }
}

#[test]
fn lock_time_domain_boundaries() {
    cashtx_test::init();

    let mut tx = Transaction::new();
    assert!(matches!(
        tx.lock_until_timestamp(400),
        Err(TransactionError::LockTimeTooEarly(400))
    ));
    assert!(matches!(
        tx.lock_until_height(LockTime::BLOCK_HEIGHT_LIMIT),
        Err(TransactionError::BlockHeightTooHigh(_))
    ));
}

#[test]
fn coinbase_carries_no_fee() {
    cashtx_test::init();

    let mut tx = Transaction::new();
    let coinbase_input = Input::from_wire(
        crate::transparent::OutPoint {
            hash: Hash::ZERO,
            index: u32::MAX,
        },
        Script(vec![0x01, 0x02, 0x03]),
        DEFAULT_SEQNUMBER,
    );
    tx.add_input_unchecked(coinbase_input).unwrap();
    tx.add_output(Output::new(sat(5_000_000), Script(vec![0x51])))
        .unwrap();

    assert!(tx.is_coinbase());
    assert_eq!(tx.fee().unwrap(), Amount::ZERO);
    tx.verify().expect("a well-formed coinbase verifies");
}

#[test]
fn verify_reports_the_first_structural_failure() {
    cashtx_test::init();

    let sender = key(1);

    assert!(matches!(
        Transaction::new().verify(),
        Err(TransactionError::NoInputs)
    ));

    let mut no_outputs = Transaction::new();
    no_outputs.spend(&p2pkh_utxo(0xaa, 0, 100_000, &sender)).unwrap();
    assert!(matches!(no_outputs.verify(), Err(TransactionError::NoOutputs)));

    let mut bad_value = no_outputs.clone();
    bad_value
        .add_output(Output::new(sat(-1), Script(vec![0x51])))
        .unwrap();
    assert!(matches!(
        bad_value.verify(),
        Err(TransactionError::InvalidSatoshis(-1))
    ));

    let mut duplicate = no_outputs.clone();
    let existing = duplicate.inputs[0].clone();
    duplicate.add_input_unchecked(existing).unwrap();
    duplicate
        .add_output(Output::new(sat(1_000), Script(vec![0x51])))
        .unwrap();
    assert!(matches!(
        duplicate.verify(),
        Err(TransactionError::DuplicateInput {
            first: 0,
            second: 1
        })
    ));

    let mut null_input = no_outputs;
    null_input
        .add_input_unchecked(Input::from_wire(
            crate::transparent::OutPoint {
                hash: Hash::ZERO,
                index: u32::MAX,
            },
            Script::empty(),
            DEFAULT_SEQNUMBER,
        ))
        .unwrap();
    null_input
        .add_output(Output::new(sat(1_000), Script(vec![0x51])))
        .unwrap();
    assert!(matches!(
        null_input.verify(),
        Err(TransactionError::NullInput(1))
    ));

    let mut oversized = Transaction::new();
    oversized
        .add_input_unchecked(Input::from_wire(
            crate::transparent::OutPoint {
                hash: Hash([0x11; 32]),
                index: 0,
            },
            Script(vec![0; MAX_BLOCK_SIZE + 1]),
            DEFAULT_SEQNUMBER,
        ))
        .unwrap();
    oversized
        .add_output(Output::new(sat(1_000), Script(vec![0x51])))
        .unwrap();
    assert!(matches!(
        oversized.verify(),
        Err(TransactionError::OversizedTransaction { .. })
    ));
}

#[test]
fn outputs_and_inputs_can_be_removed() {
    cashtx_test::init();

    let sender = key(1);
    let mut tx = Transaction::new();
    tx.spend(&p2pkh_utxo(0xaa, 0, 100_000, &sender))
        .unwrap()
        .spend(&p2pkh_utxo(0xbb, 3, 100_000, &sender))
        .unwrap()
        .pay_to(&address_of(&key(2)), sat(10_000))
        .unwrap()
        .pay_to(&address_of(&key(3)), sat(20_000))
        .unwrap();

    tx.remove_output(0).unwrap();
    assert_eq!(tx.outputs.len(), 1);
    assert_eq!(tx.outputs[0].value, sat(20_000));
    assert!(matches!(
        tx.remove_output(5),
        Err(TransactionError::InvalidIndex { index: 5, len: 1 })
    ));

    tx.remove_input_by_outpoint(&Hash([0xbb; 32]), 3).unwrap();
    assert_eq!(tx.inputs.len(), 1);
    assert!(matches!(
        tx.remove_input_by_outpoint(&Hash([0xbb; 32]), 3),
        Err(TransactionError::InvalidArgument(_))
    ));

    tx.remove_input_at(0).unwrap();
    assert!(tx.inputs.is_empty());
}

#[test]
fn cleared_outputs_regrow_a_change_output() {
    cashtx_test::init();

    let sender = key(1);
    let change_address = address_of(&key(3));
    let mut tx = Transaction::new();
    tx.spend(&p2pkh_utxo(0xaa, 0, 1_000_000, &sender))
        .unwrap()
        .pay_to(&address_of(&key(2)), sat(500_000))
        .unwrap()
        .change_to(&change_address)
        .unwrap();

    tx.clear_outputs().unwrap();
    // The only output left is the regrown change, absorbing everything
    // above the fee.
    assert_eq!(tx.outputs.len(), 1);
    assert_eq!(
        tx.change_output().map(|output| output.script.clone()),
        Some(change_address.lock_script())
    );
}

#[test]
fn associate_inputs_reports_positions() {
    cashtx_test::init();

    let sender = key(1);
    let utxo_a = p2pkh_utxo(0xaa, 0, 100_000, &sender);
    let utxo_b = p2pkh_utxo(0xbb, 1, 100_000, &sender);
    let mut tx = Transaction::new();
    tx.spend(&utxo_a).unwrap();

    let hex_form = tx.serialize_unchecked();
    let mut parsed = Transaction::from_hex(&hex_form).unwrap();
    assert!(matches!(
        parsed.is_fully_signed(),
        Err(TransactionError::UnableToVerifySignature)
    ));

    let indices = parsed
        .associate_inputs(&[utxo_a.clone(), utxo_b])
        .unwrap();
    assert_eq!(indices, vec![0, -1]);
    // The association upgraded the raw input into a signable one.
    assert_eq!(parsed.is_fully_signed().unwrap(), false);
}

#[test]
fn escrow_without_change_drops_the_explicit_fee() {
    cashtx_test::init();

    let sender = key(1);
    let merchant_keys = [sender.public_key(), key(2).public_key()];
    let reclaim = key(9).public_key();

    let mut tx = Transaction::new();
    tx.spend(&p2pkh_utxo(0xaa, 0, 100_000, &sender))
        .unwrap()
        .set_fee(sat(1_000))
        .unwrap();
    assert_eq!(tx.to_data().fee, Some(1_000));

    tx.escrow(&merchant_keys, &reclaim, sat(50_000)).unwrap();
    assert_eq!(tx.to_data().fee, None);
    assert!(tx.outputs[0].script.is_p2sh());
}

#[test]
fn token_overspend_is_a_consensus_violation() {
    cashtx_test::init();

    let sender = key(1);
    let category = Hash([0xcc; 32]);
    let token = |amount| TokenData {
        category,
        amount,
        nft: None,
    };

    let mut utxo_a = p2pkh_utxo(0xaa, 0, 50_000, &sender);
    utxo_a.token = Some(token(50));
    let mut utxo_b = p2pkh_utxo(0xbb, 1, 50_000, &sender);
    utxo_b.token = Some(token(30));

    let mut tx = Transaction::new();
    tx.spend_all(&[utxo_a, utxo_b]).unwrap();
    tx.add_output(Output::with_token(
        sat(546),
        address_of(&key(2)).lock_script(),
        token(90),
    ))
    .unwrap();

    assert!(matches!(
        tx.validate_tokens(),
        Err(TransactionError::TokenAmountExceedsInputs {
            sent: 90,
            available: 80,
            ..
        })
    ));

    // 80 of 80 moves cleanly.
    tx.remove_output(0).unwrap();
    tx.add_output(Output::with_token(
        sat(546),
        address_of(&key(2)).lock_script(),
        token(80),
    ))
    .unwrap();
    tx.validate_tokens().expect("inputs cover the sent amount");
}

#[test]
fn token_minting_requires_the_genesis_outpoint() {
    cashtx_test::init();

    let sender = key(1);
    let category = Hash([0xaa; 32]);
    let minted = TokenData {
        category,
        amount: 1_000,
        nft: None,
    };

    // Spending output 0 of the genesis transaction mints the category.
    let mut tx = Transaction::new();
    tx.spend(&p2pkh_utxo(0xaa, 0, 100_000, &sender)).unwrap();
    tx.add_output(Output::with_token(
        sat(546),
        address_of(&key(2)).lock_script(),
        minted.clone(),
    ))
    .unwrap();
    tx.validate_tokens().expect("genesis minting is permitted");

    // Any other outpoint of that transaction cannot mint.
    let mut wrong_vout = Transaction::new();
    wrong_vout.spend(&p2pkh_utxo(0xaa, 1, 100_000, &sender)).unwrap();
    wrong_vout
        .add_output(Output::with_token(
            sat(546),
            address_of(&key(2)).lock_script(),
            minted,
        ))
        .unwrap();
    assert!(matches!(
        wrong_vout.validate_tokens(),
        Err(TransactionError::TokenGenesisInputIndex(_))
    ));
}

#[test]
fn nft_outputs_need_a_permitting_parent() {
    cashtx_test::init();

    let sender = key(1);
    let category = Hash([0xcc; 32]);
    let nft_token = |capability, commitment: &[u8]| TokenData {
        category,
        amount: 0,
        nft: Some(Nft {
            capability,
            commitment: commitment.to_vec(),
        }),
    };

    let mut utxo = p2pkh_utxo(0xbb, 0, 50_000, &sender);
    utxo.token = Some(nft_token(Capability::None, b"artifact"));

    let mut tx = Transaction::new();
    tx.spend(&utxo).unwrap();
    tx.add_output(Output::with_token(
        sat(546),
        address_of(&key(2)).lock_script(),
        nft_token(Capability::None, b"artifact"),
    ))
    .unwrap();
    tx.validate_tokens()
        .expect("an immutable NFT may move with its commitment intact");

    let mut reworded = tx.clone();
    reworded.remove_output(0).unwrap();
    reworded
        .add_output(Output::with_token(
            sat(546),
            address_of(&key(2)).lock_script(),
            nft_token(Capability::None, b"forgery"),
        ))
        .unwrap();
    assert!(matches!(
        reworded.validate_tokens(),
        Err(TransactionError::TokenParentMissing { index: 0, .. })
    ));
}
