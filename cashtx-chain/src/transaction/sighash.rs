//! Signature digests.
//!
//! Two digest algorithms coexist: the replay-protected form used whenever
//! the fork-id flag is set (hashed prevout/sequence/output sections plus the
//! spent value), and the legacy form (a stripped re-serialization of the
//! whole transaction) for signatures without it.

use secp256k1::{ecdsa, schnorr, KeyPair, Message, PublicKey};

use crate::{
    amount::Amount,
    serialization::{sha256d, CashSerialize},
    transparent::{
        keys::{PrivateKey, SECP256K1},
        Script,
    },
};

use super::{error::TransactionError, Transaction};

/// A sighash type byte: a base mode plus modifier flags.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SighashType(pub u32);

impl SighashType {
    pub const ALL: u32 = 0x01;
    pub const NONE: u32 = 0x02;
    pub const SINGLE: u32 = 0x03;
    pub const FORKID: u32 = 0x40;
    pub const ANYONECANPAY: u32 = 0x80;

    /// `ALL | FORKID`, the type every standard payment signs with.
    pub fn all_forkid() -> SighashType {
        SighashType(SighashType::ALL | SighashType::FORKID)
    }

    pub fn base(self) -> u32 {
        self.0 & 0x1f
    }

    pub fn has_forkid(self) -> bool {
        self.0 & SighashType::FORKID != 0
    }

    pub fn anyone_can_pay(self) -> bool {
        self.0 & SighashType::ANYONECANPAY != 0
    }

    /// The byte appended to signatures on the wire.
    pub fn to_byte(self) -> u8 {
        (self.0 & 0xff) as u8
    }

    pub fn from_byte(byte: u8) -> SighashType {
        SighashType(byte as u32)
    }
}

impl Default for SighashType {
    fn default() -> Self {
        SighashType::all_forkid()
    }
}

/// Which signature scheme to produce.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SigningAlgorithm {
    Ecdsa,
    Schnorr,
}

impl Default for SigningAlgorithm {
    fn default() -> Self {
        SigningAlgorithm::Ecdsa
    }
}

/// The digest input `input_index` commits to when signed with
/// `sighash_type`. `subscript` is the script being satisfied (the lock
/// script, or the redeem script for script-hash spends); `value` is the
/// spent output's value.
pub fn digest(
    transaction: &Transaction,
    input_index: usize,
    subscript: &Script,
    value: Amount,
    sighash_type: SighashType,
) -> Result<[u8; 32], TransactionError> {
    if input_index >= transaction.inputs.len() {
        return Err(TransactionError::InvalidIndex {
            index: input_index,
            len: transaction.inputs.len(),
        });
    }
    if sighash_type.has_forkid() {
        Ok(digest_forkid(
            transaction,
            input_index,
            subscript,
            value,
            sighash_type,
        ))
    } else {
        Ok(digest_legacy(
            transaction,
            input_index,
            subscript,
            sighash_type,
        ))
    }
}

fn hash_writer<F: FnOnce(&mut sha256d::Writer)>(write: F) -> [u8; 32] {
    let mut writer = sha256d::Writer::default();
    write(&mut writer);
    writer.finish()
}

// Writes to a sha256d::Writer cannot fail.
macro_rules! hashed {
    ($writer:ident, $value:expr) => {
        $value
            .cash_serialize(&mut *$writer)
            .expect("sha256d::Writer is infallible")
    };
}

fn digest_forkid(
    transaction: &Transaction,
    input_index: usize,
    subscript: &Script,
    value: Amount,
    sighash_type: SighashType,
) -> [u8; 32] {
    let zero = [0u8; 32];
    let base = sighash_type.base();
    let anyone_can_pay = sighash_type.anyone_can_pay();
    let input = &transaction.inputs[input_index];

    let hash_prevouts = if anyone_can_pay {
        zero
    } else {
        hash_writer(|w| {
            for input in &transaction.inputs {
                hashed!(w, input.outpoint);
            }
        })
    };

    let hash_sequence =
        if anyone_can_pay || base == SighashType::SINGLE || base == SighashType::NONE {
            zero
        } else {
            hash_writer(|w| {
                for input in &transaction.inputs {
                    hashed!(w, input.sequence);
                }
            })
        };

    let hash_outputs = if base != SighashType::SINGLE && base != SighashType::NONE {
        hash_writer(|w| {
            for output in &transaction.outputs {
                hashed!(w, output);
            }
        })
    } else if base == SighashType::SINGLE && input_index < transaction.outputs.len() {
        hash_writer(|w| hashed!(w, transaction.outputs[input_index]))
    } else {
        zero
    };

    let mut preimage = sha256d::Writer::default();
    let w = &mut preimage;
    hashed!(w, transaction.version);
    hashed!(w, hash_prevouts);
    hashed!(w, hash_sequence);
    hashed!(w, input.outpoint);
    hashed!(w, subscript);
    hashed!(w, value);
    hashed!(w, input.sequence);
    hashed!(w, hash_outputs);
    hashed!(w, transaction.locktime);
    hashed!(w, sighash_type.0);
    preimage.finish()
}

fn digest_legacy(
    transaction: &Transaction,
    input_index: usize,
    subscript: &Script,
    sighash_type: SighashType,
) -> [u8; 32] {
    let base = sighash_type.base();
    let anyone_can_pay = sighash_type.anyone_can_pay();

    // Consensus quirk inherited from the original client: signing a
    // nonexistent matching output yields the digest "one".
    if base == SighashType::SINGLE && input_index >= transaction.outputs.len() {
        let mut digest = [0u8; 32];
        digest[0] = 1;
        return digest;
    }

    let subscript = subscript.without_code_separators();
    let mut preimage = sha256d::Writer::default();
    let w = &mut preimage;
    hashed!(w, transaction.version);

    if anyone_can_pay {
        hashed!(w, crate::compactint::CompactInt::from(1));
        hashed!(w, transaction.inputs[input_index].outpoint);
        hashed!(w, subscript);
        hashed!(w, transaction.inputs[input_index].sequence);
    } else {
        hashed!(
            w,
            crate::compactint::CompactInt::from(transaction.inputs.len())
        );
        for (index, input) in transaction.inputs.iter().enumerate() {
            hashed!(w, input.outpoint);
            if index == input_index {
                hashed!(w, subscript);
            } else {
                hashed!(w, Script::empty());
            }
            let sequence = if index != input_index
                && (base == SighashType::SINGLE || base == SighashType::NONE)
            {
                0u32
            } else {
                input.sequence
            };
            hashed!(w, sequence);
        }
    }

    match base {
        SighashType::NONE => hashed!(w, crate::compactint::CompactInt::from(0)),
        SighashType::SINGLE => {
            hashed!(
                w,
                crate::compactint::CompactInt::from(input_index + 1)
            );
            for _ in 0..input_index {
                // A blanked output: value -1, empty script.
                hashed!(w, Amount::from_sat(-1));
                hashed!(w, Script::empty());
            }
            hashed!(w, transaction.outputs[input_index]);
        }
        _ => {
            hashed!(
                w,
                crate::compactint::CompactInt::from(transaction.outputs.len())
            );
            for output in &transaction.outputs {
                hashed!(w, output);
            }
        }
    }

    hashed!(w, transaction.locktime);
    hashed!(w, sighash_type.0);
    preimage.finish()
}

/// Signs `input_index` and returns the signature with the sighash type byte
/// appended, ready to place in an unlocking script.
pub fn sign_input(
    transaction: &Transaction,
    input_index: usize,
    subscript: &Script,
    value: Amount,
    sighash_type: SighashType,
    key: &PrivateKey,
    algorithm: SigningAlgorithm,
) -> Result<Vec<u8>, TransactionError> {
    let digest = digest(transaction, input_index, subscript, value, sighash_type)?;
    let message = Message::from_slice(&digest).expect("digest is exactly 32 bytes");
    let mut signature = match algorithm {
        SigningAlgorithm::Ecdsa => SECP256K1
            .sign_ecdsa(&message, key.secret_key())
            .serialize_der()
            .to_vec(),
        SigningAlgorithm::Schnorr => {
            let keypair = KeyPair::from_secret_key(&SECP256K1, key.secret_key());
            SECP256K1
                .sign_schnorr_no_aux_rand(&message, &keypair)
                .as_ref()
                .to_vec()
        }
    };
    signature.push(sighash_type.to_byte());
    Ok(signature)
}

/// Verifies a wire-form signature (sighash byte included) against `pubkey`.
/// The scheme is chosen by length: 64-byte payloads are Schnorr, anything
/// else is DER-encoded ECDSA.
pub fn verify_input_signature(
    transaction: &Transaction,
    input_index: usize,
    subscript: &Script,
    value: Amount,
    signature: &[u8],
    pubkey: &PublicKey,
) -> bool {
    let (&type_byte, payload) = match signature.split_last() {
        Some(split) => split,
        None => return false,
    };
    let sighash_type = SighashType::from_byte(type_byte);
    let digest = match digest(transaction, input_index, subscript, value, sighash_type) {
        Ok(digest) => digest,
        Err(_) => return false,
    };
    let message = Message::from_slice(&digest).expect("digest is exactly 32 bytes");

    if payload.len() == 64 {
        match schnorr::Signature::from_slice(payload) {
            Ok(signature) => SECP256K1
                .verify_schnorr(&signature, &message, &pubkey.x_only_public_key().0)
                .is_ok(),
            Err(_) => false,
        }
    } else {
        match ecdsa::Signature::from_der(payload) {
            Ok(signature) => SECP256K1.verify_ecdsa(&message, &signature, pubkey).is_ok(),
            Err(_) => false,
        }
    }
}
