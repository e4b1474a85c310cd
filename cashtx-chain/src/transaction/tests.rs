//! Engine tests: round-trip properties, the builder scenarios, the object
//! form, and end-to-end escrow verification.

mod builder;
mod zce;

use crate::amount::Amount;
use crate::parameters::Network;
use crate::transparent::{keys::PrivateKey, Address, UnspentOutput};

use super::Hash;

/// A deterministic key; any nonzero repeated byte is a valid secret.
fn key(byte: u8) -> PrivateKey {
    PrivateKey::from_slice(&[byte; 32], Network::Mainnet).expect("repeated byte is a valid secret")
}

fn address_of(key: &PrivateKey) -> Address {
    Address::from_public_key(&key.public_key(), Network::Mainnet)
}

/// A P2PKH unspent output locked to `key`.
fn p2pkh_utxo(txid_byte: u8, vout: u32, value: i64, key: &PrivateKey) -> UnspentOutput {
    UnspentOutput::new(
        Hash([txid_byte; 32]),
        vout,
        address_of(key).lock_script(),
        Amount::from_sat(value),
    )
}
