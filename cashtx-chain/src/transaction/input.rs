//! Transaction inputs and the per-template signing strategies.
//!
//! Each input carries a [`Signer`] chosen from the shape of the output it
//! spends. The signer knows how large the signed input can get, which keys
//! it accepts, and how to assemble the unlocking script once signatures
//! arrive. The `Raw` signer stands for scripts the engine does not
//! recognize; its signing capabilities answer `None` ("not implemented"),
//! which the engine surfaces as an unverifiable input.

use secp256k1::PublicKey;

use crate::{
    compactint::CompactInt,
    transparent::{keys::PrivateKey, OutPoint, Output, Script, UnspentOutput},
};

use super::{
    error::TransactionError,
    sighash::{self, SighashType, SigningAlgorithm},
    Transaction,
};

/// The sequence number of inputs that opt out of lock-time semantics.
pub const DEFAULT_SEQNUMBER: u32 = u32::MAX;

/// The sequence number the lock-time setters rewrite defaults to, making
/// the transaction's lock time effective.
pub const DEFAULT_LOCKTIME_SEQNUMBER: u32 = DEFAULT_SEQNUMBER - 1;

// Worst-case unlocking-script components: a pushed DER signature with its
// sighash byte, and a pushed compressed public key.
const SIGNATURE_PUSH_SIZE: usize = 73;
const PUBKEY_PUSH_SIZE: usize = 34;

/// The number of bytes a push of `len` bytes spends on its opcode header.
fn push_overhead(len: usize) -> usize {
    if len < 0x4c {
        1
    } else if len <= 0xff {
        2
    } else {
        3
    }
}

/// A produced signature, addressed to the input it satisfies.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignatureRecord {
    pub input_index: usize,
    pub sighash_type: SighashType,
    pub public_key: PublicKey,
    pub signature: Vec<u8>,
}

/// The signing strategy attached to an input.
#[derive(Clone, Debug)]
pub enum Signer {
    /// An unrecognized script; can serialize but not sign or verify.
    Raw,
    /// Spends a P2PKH (or wrapped P2PKH) output.
    PublicKeyHash { signature: Option<SignatureRecord> },
    /// Spends a bare P2PK output paying `pubkey`.
    PublicKey {
        pubkey: PublicKey,
        signature: Option<SignatureRecord>,
    },
    /// Spends a bare multisig output.
    MultiSig {
        public_keys: Vec<PublicKey>,
        threshold: usize,
        signatures: Vec<Option<SignatureRecord>>,
    },
    /// Spends a P2SH output whose redeem script is a multisig template.
    MultiSigScriptHash {
        public_keys: Vec<PublicKey>,
        threshold: usize,
        signatures: Vec<Option<SignatureRecord>>,
    },
    /// Spends a zero-confirmation escrow output via its reclaim key.
    Escrow {
        input_keys: Vec<PublicKey>,
        reclaim_key: PublicKey,
        signature: Option<SignatureRecord>,
    },
}

/// A transaction input.
#[derive(Clone, Debug)]
pub struct Input {
    pub outpoint: OutPoint,
    pub unlock_script: Script,
    pub sequence: u32,
    /// The output being spent; required for signing and amount accounting.
    pub output: Option<Output>,
    pub(crate) signer: Signer,
}

/// Inputs compare by wire fields only; signer state and the attached
/// output are builder bookkeeping.
impl PartialEq for Input {
    fn eq(&self, other: &Self) -> bool {
        self.outpoint == other.outpoint
            && self.unlock_script == other.unlock_script
            && self.sequence == other.sequence
    }
}

impl Eq for Input {}

impl Input {
    fn from_utxo(utxo: &UnspentOutput, signer: Signer) -> Input {
        Input {
            outpoint: utxo.outpoint(),
            unlock_script: Script::empty(),
            sequence: utxo.sequence.unwrap_or(DEFAULT_SEQNUMBER),
            output: Some(utxo.output()),
            signer,
        }
    }

    /// An input over a script the engine has no template for. The unlocking
    /// script, if any, must be supplied ready-made.
    pub fn raw(utxo: &UnspentOutput) -> Input {
        Input::from_utxo(utxo, Signer::Raw)
    }

    pub fn public_key_hash(utxo: &UnspentOutput) -> Input {
        Input::from_utxo(utxo, Signer::PublicKeyHash { signature: None })
    }

    pub fn public_key(utxo: &UnspentOutput) -> Result<Input, TransactionError> {
        let pubkey = utxo
            .script
            .p2pk_pubkey()
            .and_then(|bytes| PublicKey::from_slice(bytes).ok())
            .ok_or_else(|| TransactionError::UnsupportedScript(utxo.script.clone()))?;
        Ok(Input::from_utxo(
            utxo,
            Signer::PublicKey {
                pubkey,
                signature: None,
            },
        ))
    }

    pub fn multisig(utxo: &UnspentOutput, public_keys: &[PublicKey], threshold: usize) -> Input {
        Input::from_utxo(
            utxo,
            Signer::MultiSig {
                public_keys: public_keys.to_vec(),
                threshold,
                signatures: vec![None; public_keys.len()],
            },
        )
    }

    pub fn multisig_script_hash(
        utxo: &UnspentOutput,
        public_keys: &[PublicKey],
        threshold: usize,
    ) -> Input {
        Input::from_utxo(
            utxo,
            Signer::MultiSigScriptHash {
                public_keys: public_keys.to_vec(),
                threshold,
                signatures: vec![None; public_keys.len()],
            },
        )
    }

    /// Builds an escrow input from a descriptor whose key list holds the
    /// reclaim key first and the payment-input keys after it.
    pub fn escrow(utxo: &UnspentOutput) -> Result<Input, TransactionError> {
        let (reclaim_key, input_keys) = match utxo.public_keys.split_first() {
            Some((reclaim, rest)) if !rest.is_empty() => (*reclaim, rest.to_vec()),
            _ => {
                return Err(TransactionError::InvalidArgument(
                    "an escrow input needs a reclaim key and at least one input key".into(),
                ))
            }
        };
        Ok(Input::from_utxo(
            utxo,
            Signer::Escrow {
                input_keys,
                reclaim_key,
                signature: None,
            },
        ))
    }

    /// An input parsed off the wire: raw signer, no attached output.
    pub(crate) fn from_wire(outpoint: OutPoint, unlock_script: Script, sequence: u32) -> Input {
        Input {
            outpoint,
            unlock_script,
            sequence,
            output: None,
            signer: Signer::Raw,
        }
    }

    pub fn signer(&self) -> &Signer {
        &self.signer
    }

    /// Coinbase-style null outpoint.
    pub fn is_null(&self) -> bool {
        self.outpoint.is_null()
    }

    /// Worst-case serialized size of this input once fully signed.
    pub fn estimated_size(&self) -> usize {
        let script_len = match &self.signer {
            Signer::Raw => self.unlock_script.0.len(),
            Signer::PublicKeyHash { .. } => SIGNATURE_PUSH_SIZE + PUBKEY_PUSH_SIZE,
            Signer::PublicKey { .. } => SIGNATURE_PUSH_SIZE,
            Signer::MultiSig { threshold, .. } => 1 + threshold * SIGNATURE_PUSH_SIZE,
            Signer::MultiSigScriptHash {
                public_keys,
                threshold,
                ..
            } => {
                let redeem_len = Script::multisig_out(public_keys, *threshold).0.len();
                1 + threshold * SIGNATURE_PUSH_SIZE + push_overhead(redeem_len) + redeem_len
            }
            Signer::Escrow {
                input_keys,
                reclaim_key,
                ..
            } => {
                let redeem_len = Script::escrow_redeem(input_keys, reclaim_key).0.len();
                SIGNATURE_PUSH_SIZE + PUBKEY_PUSH_SIZE + push_overhead(redeem_len) + redeem_len
            }
        };
        OutPoint::len() + CompactInt::size(script_len) + script_len + 4
    }

    /// The script this input's signatures commit to: the lock script for
    /// direct spends, the reconstructed redeem script for script-hash
    /// spends. `None` for raw inputs.
    pub fn subscript(&self) -> Option<Script> {
        match &self.signer {
            Signer::Raw => None,
            Signer::PublicKeyHash { .. } | Signer::PublicKey { .. } | Signer::MultiSig { .. } => {
                self.output.as_ref().map(|output| output.script.clone())
            }
            Signer::MultiSigScriptHash {
                public_keys,
                threshold,
                ..
            } => Some(Script::multisig_out(public_keys, *threshold)),
            Signer::Escrow {
                input_keys,
                reclaim_key,
                ..
            } => Some(Script::escrow_redeem(input_keys, reclaim_key)),
        }
    }

    /// Produces the signatures `key` can contribute to this input, if any.
    /// `pubkey_hash` is hash160 of the key's compressed public key.
    pub fn signatures_for(
        &self,
        transaction: &Transaction,
        key: &PrivateKey,
        input_index: usize,
        sighash_type: SighashType,
        pubkey_hash: &[u8; 20],
        algorithm: SigningAlgorithm,
    ) -> Result<Vec<SignatureRecord>, TransactionError> {
        let output = self
            .output
            .as_ref()
            .ok_or(TransactionError::MissingUtxoInfo(input_index))?;
        let subscript = match self.subscript() {
            Some(subscript) => subscript,
            None => return Ok(Vec::new()),
        };
        let pubkey = key.public_key();
        let key_matches = match &self.signer {
            Signer::Raw => false,
            Signer::PublicKeyHash { .. } => output.script.p2pkh_hash().as_ref() == Some(pubkey_hash),
            Signer::PublicKey {
                pubkey: script_key, ..
            } => *script_key == pubkey,
            Signer::MultiSig { public_keys, .. } | Signer::MultiSigScriptHash { public_keys, .. } => {
                public_keys.contains(&pubkey)
            }
            Signer::Escrow { reclaim_key, .. } => *reclaim_key == pubkey,
        };
        if !key_matches {
            return Ok(Vec::new());
        }
        let signature = sighash::sign_input(
            transaction,
            input_index,
            &subscript,
            output.value,
            sighash_type,
            key,
            algorithm,
        )?;
        Ok(vec![SignatureRecord {
            input_index,
            sighash_type,
            public_key: pubkey,
            signature,
        }])
    }

    /// Whether `record` verifies against this input. `None` means this
    /// input cannot judge signatures at all.
    pub fn is_valid_signature(
        &self,
        transaction: &Transaction,
        record: &SignatureRecord,
    ) -> Option<bool> {
        if matches!(self.signer, Signer::Raw) {
            return None;
        }
        let output = match &self.output {
            Some(output) => output,
            None => return Some(false),
        };
        let subscript = match self.subscript() {
            Some(subscript) => subscript,
            None => return Some(false),
        };
        Some(sighash::verify_input_signature(
            transaction,
            record.input_index,
            &subscript,
            output.value,
            &record.signature,
            &record.public_key,
        ))
    }

    /// Stores a validated signature and rebuilds the unlocking script.
    pub(crate) fn apply_signature_unchecked(&mut self, record: SignatureRecord) {
        match &mut self.signer {
            Signer::Raw => {}
            Signer::PublicKeyHash { signature } => {
                self.unlock_script =
                    Script::p2pkh_in(&record.signature, &record.public_key.serialize());
                *signature = Some(record);
            }
            Signer::PublicKey { signature, .. } => {
                self.unlock_script = Script::p2pk_in(&record.signature);
                *signature = Some(record);
            }
            Signer::MultiSig {
                public_keys,
                signatures,
                ..
            } => {
                if let Some(slot) = public_keys
                    .iter()
                    .position(|key| *key == record.public_key)
                {
                    signatures[slot] = Some(record);
                }
                self.unlock_script = Script::multisig_in(
                    signatures
                        .iter()
                        .flatten()
                        .map(|record| record.signature.as_slice()),
                    None,
                );
            }
            Signer::MultiSigScriptHash {
                public_keys,
                threshold,
                signatures,
            } => {
                if let Some(slot) = public_keys
                    .iter()
                    .position(|key| *key == record.public_key)
                {
                    signatures[slot] = Some(record);
                }
                let redeem = Script::multisig_out(public_keys, *threshold);
                self.unlock_script = Script::multisig_in(
                    signatures
                        .iter()
                        .flatten()
                        .map(|record| record.signature.as_slice()),
                    Some(&redeem),
                );
            }
            Signer::Escrow {
                input_keys,
                reclaim_key,
                signature,
            } => {
                let redeem = Script::escrow_redeem(input_keys, reclaim_key);
                self.unlock_script = Script::escrow_in(
                    &record.signature,
                    &record.public_key.serialize(),
                    &redeem,
                );
                *signature = Some(record);
            }
        }
    }

    /// Drops all held signatures. Raw inputs keep their script: it was
    /// supplied, not produced.
    pub fn clear_signatures(&mut self) {
        match &mut self.signer {
            Signer::Raw => {}
            Signer::PublicKeyHash { signature }
            | Signer::PublicKey { signature, .. }
            | Signer::Escrow { signature, .. } => {
                *signature = None;
                self.unlock_script = Script::empty();
            }
            Signer::MultiSig { signatures, .. } | Signer::MultiSigScriptHash { signatures, .. } => {
                for slot in signatures.iter_mut() {
                    *slot = None;
                }
                self.unlock_script = Script::empty();
            }
        }
    }

    /// Whether enough signatures are present. `None` means this input
    /// cannot tell.
    pub fn is_fully_signed(&self) -> Option<bool> {
        match &self.signer {
            Signer::Raw => None,
            Signer::PublicKeyHash { signature }
            | Signer::PublicKey { signature, .. }
            | Signer::Escrow { signature, .. } => Some(signature.is_some()),
            Signer::MultiSig {
                threshold,
                signatures,
                ..
            }
            | Signer::MultiSigScriptHash {
                threshold,
                signatures,
                ..
            } => Some(signatures.iter().flatten().count() >= *threshold),
        }
    }
}
