//! End-to-end zero-confirmation escrow verification, with real keys and
//! signatures on both the payment and its reclaim transaction.

use super::super::*;
use super::{address_of, key, p2pkh_utxo};

use crate::amount::Amount;
use crate::transparent::{Script, UnspentOutput};

const ESCROW_AMOUNT: i64 = 10_000;
const ESCROW_VALUE: i64 = 15_000;
const MIN_FEE_RATE: u64 = 1;

struct ZcePair {
    payment: Transaction,
    reclaim: Transaction,
}

fn build_pair() -> ZcePair {
    let payer_a = key(1);
    let payer_b = key(2);
    let merchant = key(3);
    let reclaim_key = key(9);

    let input_pubkeys = [payer_a.public_key(), payer_b.public_key()];

    let mut payment = Transaction::new();
    payment
        .spend(&p2pkh_utxo(0xaa, 0, 60_000, &payer_a))
        .unwrap()
        .spend(&p2pkh_utxo(0xbb, 1, 60_000, &payer_b))
        .unwrap()
        .pay_to(&address_of(&merchant), Amount::from_sat(90_000))
        .unwrap()
        .escrow(
            &input_pubkeys,
            &reclaim_key.public_key(),
            Amount::from_sat(ESCROW_VALUE),
        )
        .unwrap();
    payment.sign(&payer_a).unwrap();
    payment.sign(&payer_b).unwrap();
    assert!(payment.is_fully_signed().unwrap());

    // The escrow output is the P2SH one.
    let escrow_vout = payment
        .outputs
        .iter()
        .position(|output| output.script.is_p2sh())
        .expect("the escrow output is present") as u32;

    // The reclaim spends the escrow back to the merchant's reclaim key.
    let mut escrow_utxo = UnspentOutput::new(
        payment.hash(),
        escrow_vout,
        payment.outputs[escrow_vout as usize].script.clone(),
        payment.outputs[escrow_vout as usize].value,
    );
    escrow_utxo.public_keys = vec![
        reclaim_key.public_key(),
        payer_a.public_key(),
        payer_b.public_key(),
    ];

    let mut reclaim = Transaction::new();
    reclaim
        .spend(&escrow_utxo)
        .unwrap()
        .pay_to(&address_of(&reclaim_key), Amount::from_sat(14_000))
        .unwrap();
    reclaim.sign(&reclaim_key).unwrap();
    assert!(reclaim.is_fully_signed().unwrap());

    ZcePair { payment, reclaim }
}

#[test]
fn a_well_formed_pair_is_secured() {
    cashtx_test::init();

    let pair = build_pair();
    assert!(pair.payment.is_zce_secured(
        &pair.reclaim,
        Amount::from_sat(ESCROW_AMOUNT),
        MIN_FEE_RATE
    ));
}

#[test]
fn an_underfunded_escrow_is_not_secured() {
    cashtx_test::init();

    let pair = build_pair();
    // Demand more collateral than the escrow output holds.
    assert!(!pair.payment.is_zce_secured(
        &pair.reclaim,
        Amount::from_sat(ESCROW_VALUE + 1),
        MIN_FEE_RATE
    ));
}

#[test]
fn a_reclaim_for_another_key_is_not_secured() {
    cashtx_test::init();

    let pair = build_pair();

    // Rebuild the reclaim with a different reclaim key: its redeem script
    // no longer hashes to the escrow output's commitment.
    let stranger = key(7);
    let escrow_vout = pair.reclaim.inputs[0].outpoint.index;
    let mut escrow_utxo = UnspentOutput::new(
        pair.payment.hash(),
        escrow_vout,
        pair.payment.outputs[escrow_vout as usize].script.clone(),
        pair.payment.outputs[escrow_vout as usize].value,
    );
    escrow_utxo.public_keys = vec![stranger.public_key(), key(1).public_key()];

    let mut forged = Transaction::new();
    forged
        .spend(&escrow_utxo)
        .unwrap()
        .pay_to(&address_of(&stranger), Amount::from_sat(14_000))
        .unwrap();
    forged.sign(&stranger).unwrap();

    assert!(!pair.payment.is_zce_secured(
        &forged,
        Amount::from_sat(ESCROW_AMOUNT),
        MIN_FEE_RATE
    ));
}

#[test]
fn a_starved_reclaim_fee_is_not_secured() {
    cashtx_test::init();

    let pair = build_pair();
    // The escrow still covers the collateral at 5 sat/byte, but the
    // reclaim pays ~1000 sat over well more than 200 bytes.
    assert!(!pair.payment.is_zce_secured(
        &pair.reclaim,
        Amount::from_sat(ESCROW_AMOUNT),
        5
    ));
}

#[test]
fn non_p2pkh_payment_inputs_are_not_secured() {
    cashtx_test::init();

    let payer = key(1);
    let reclaim_key = key(9);
    let mut utxo = p2pkh_utxo(0xaa, 0, 60_000, &payer);
    let mut bare = vec![33u8];
    bare.extend_from_slice(&payer.public_key().serialize());
    bare.push(0xac);
    utxo.script = Script(bare); // P2PK, not P2PKH

    let mut payment = Transaction::new();
    payment
        .spend(&utxo)
        .unwrap()
        .escrow(
            &[payer.public_key()],
            &reclaim_key.public_key(),
            Amount::from_sat(ESCROW_VALUE),
        )
        .unwrap();
    payment.sign(&payer).unwrap();

    let pair = build_pair();
    assert!(!payment.is_zce_secured(
        &pair.reclaim,
        Amount::from_sat(ESCROW_AMOUNT),
        MIN_FEE_RATE
    ));
}
