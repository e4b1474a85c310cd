#![allow(clippy::unit_arg)]
//! Script blobs, the standard output templates, and the small amount of
//! opcode handling the engine needs (push parsing and assembly).

use crate::{
    compactint::CompactInt,
    serialization::{CashDeserialize, CashSerialize, SerializationError},
};
use std::{
    fmt,
    io::{self, Read},
};

use super::keys::hash160;
use super::Address;

/// The opcodes the standard templates are built from.
pub mod opcodes {
    pub const OP_0: u8 = 0x00;
    pub const OP_PUSHDATA1: u8 = 0x4c;
    pub const OP_PUSHDATA2: u8 = 0x4d;
    pub const OP_PUSHDATA4: u8 = 0x4e;
    pub const OP_1: u8 = 0x51;
    pub const OP_16: u8 = 0x60;
    pub const OP_RETURN: u8 = 0x6a;
    pub const OP_DROP: u8 = 0x75;
    pub const OP_DUP: u8 = 0x76;
    pub const OP_EQUAL: u8 = 0x87;
    pub const OP_EQUALVERIFY: u8 = 0x88;
    pub const OP_HASH160: u8 = 0xa9;
    pub const OP_CODESEPARATOR: u8 = 0xab;
    pub const OP_CHECKSIG: u8 = 0xac;
    pub const OP_CHECKMULTISIG: u8 = 0xae;
}

use opcodes::*;

/// An encoding of a transaction script.
#[derive(Clone, Eq, PartialEq, Serialize, Deserialize, Hash)]
#[cfg_attr(
    any(test, feature = "proptest-impl"),
    derive(proptest_derive::Arbitrary)
)]
pub struct Script(pub Vec<u8>);

/// A single parsed script token: either a bare opcode or a data push.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction<'a> {
    Op(u8),
    Push(&'a [u8]),
}

/// Iterator over a script's instructions; yields a parse error on a
/// truncated push.
pub struct Instructions<'a> {
    bytes: &'a [u8],
}

impl<'a> Iterator for Instructions<'a> {
    type Item = Result<Instruction<'a>, SerializationError>;

    fn next(&mut self) -> Option<Self::Item> {
        let bytes = self.bytes;
        let (&opcode, rest) = match bytes.split_first() {
            Some(split) => split,
            None => return None,
        };
        let (push_len, header_len): (Option<usize>, usize) = match opcode {
            len @ 0x01..=0x4b => (Some(len as usize), 1),
            OP_PUSHDATA1 => (rest.first().map(|&len| len as usize), 2),
            OP_PUSHDATA2 => (
                rest.get(..2)
                    .map(|len| u16::from_le_bytes([len[0], len[1]]) as usize),
                3,
            ),
            OP_PUSHDATA4 => (
                rest.get(..4)
                    .map(|len| u32::from_le_bytes([len[0], len[1], len[2], len[3]]) as usize),
                5,
            ),
            op => {
                self.bytes = rest;
                return Some(Ok(Instruction::Op(op)));
            }
        };
        let end = push_len.and_then(|len| header_len.checked_add(len));
        match end.and_then(|end| bytes.get(header_len..end)) {
            Some(data) => {
                self.bytes = &bytes[header_len + data.len()..];
                Some(Ok(Instruction::Push(data)))
            }
            None => {
                self.bytes = &[];
                Some(Err(SerializationError::Parse("truncated script push")))
            }
        }
    }
}

/// Appends `data` to `out` with the minimal push encoding. An empty push
/// becomes OP_0.
fn push_data(out: &mut Vec<u8>, data: &[u8]) {
    match data.len() {
        0 => out.push(OP_0),
        len @ 0x01..=0x4b => out.push(len as u8),
        len if len <= 0xff => {
            out.push(OP_PUSHDATA1);
            out.push(len as u8);
        }
        len if len <= 0xffff => {
            out.push(OP_PUSHDATA2);
            out.extend_from_slice(&(len as u16).to_le_bytes());
        }
        len => {
            out.push(OP_PUSHDATA4);
            out.extend_from_slice(&(len as u32).to_le_bytes());
        }
    }
    out.extend_from_slice(data);
}

/// The opcode pushing the small integer `n` (`0 ..= 16`).
fn small_int(n: usize) -> u8 {
    debug_assert!(n <= 16);
    if n == 0 {
        OP_0
    } else {
        OP_1 + (n as u8 - 1)
    }
}

impl Script {
    pub fn empty() -> Script {
        Script(Vec::new())
    }

    pub fn serialized_size(&self) -> usize {
        CompactInt::size(self.0.len()) + self.0.len()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn instructions(&self) -> Instructions<'_> {
        Instructions { bytes: &self.0 }
    }

    /// The script's data pushes, in order, if the script consists of pushes
    /// only. Any bare opcode or truncated push yields `None`.
    pub fn push_values(&self) -> Option<Vec<&[u8]>> {
        let mut pushes = Vec::new();
        for instruction in self.instructions() {
            match instruction {
                Ok(Instruction::Push(data)) => pushes.push(data),
                _ => return None,
            }
        }
        Some(pushes)
    }

    /// A copy of this script with all OP_CODESEPARATOR occurrences removed,
    /// as the legacy signature digest requires. Unparseable scripts are
    /// passed through untouched.
    pub fn without_code_separators(&self) -> Script {
        let mut out = Vec::with_capacity(self.0.len());
        for instruction in self.instructions() {
            match instruction {
                Ok(Instruction::Op(OP_CODESEPARATOR)) => {}
                Ok(Instruction::Op(op)) => out.push(op),
                Ok(Instruction::Push(data)) => push_data(&mut out, data),
                Err(_) => return self.clone(),
            }
        }
        Script(out)
    }

    // Standard output templates.

    /// `OP_DUP OP_HASH160 <20 bytes> OP_EQUALVERIFY OP_CHECKSIG`
    pub fn is_p2pkh(&self) -> bool {
        let s = &self.0;
        s.len() == 25
            && s[0] == OP_DUP
            && s[1] == OP_HASH160
            && s[2] == 0x14
            && s[23] == OP_EQUALVERIFY
            && s[24] == OP_CHECKSIG
    }

    /// `OP_HASH160 <20 bytes> OP_EQUAL`
    pub fn is_p2sh(&self) -> bool {
        let s = &self.0;
        s.len() == 23 && s[0] == OP_HASH160 && s[1] == 0x14 && s[22] == OP_EQUAL
    }

    /// `<33 or 65 byte key> OP_CHECKSIG`
    pub fn is_p2pk(&self) -> bool {
        let s = &self.0;
        (s.len() == 35 && s[0] == 33 && s[34] == OP_CHECKSIG)
            || (s.len() == 67 && s[0] == 65 && s[66] == OP_CHECKSIG)
    }

    /// `OP_m <keys...> OP_n OP_CHECKMULTISIG`
    pub fn is_multisig_out(&self) -> bool {
        let s = &self.0;
        if s.len() < 4 || s[s.len() - 1] != OP_CHECKMULTISIG {
            return false;
        }
        let m = s[0];
        let n = s[s.len() - 2];
        if !(OP_1..=OP_16).contains(&m) || !(OP_1..=OP_16).contains(&n) || m > n {
            return false;
        }
        match Script(s[1..s.len() - 2].to_vec()).push_values() {
            Some(keys) => {
                keys.len() == (n - OP_1 + 1) as usize
                    && keys.iter().all(|key| key.len() == 33 || key.len() == 65)
            }
            None => false,
        }
    }

    /// `OP_RETURN` followed by data pushes only.
    pub fn is_data_out(&self) -> bool {
        match self.0.first() {
            Some(&OP_RETURN) => Script(self.0[1..].to_vec()).push_values().is_some(),
            _ => false,
        }
    }

    /// Version-0 witness program with a 20-byte payload.
    pub fn is_witness_pkh_out(&self) -> bool {
        self.0.len() == 22 && self.0[0] == OP_0 && self.0[1] == 0x14
    }

    /// Version-0 witness program with a 32-byte payload.
    pub fn is_witness_sh_out(&self) -> bool {
        self.0.len() == 34 && self.0[0] == OP_0 && self.0[1] == 0x20
    }

    /// The hash committed to by a P2PKH lock script.
    pub fn p2pkh_hash(&self) -> Option<[u8; 20]> {
        if self.is_p2pkh() {
            let mut hash = [0u8; 20];
            hash.copy_from_slice(&self.0[3..23]);
            Some(hash)
        } else {
            None
        }
    }

    /// The hash committed to by a P2SH lock script.
    pub fn p2sh_hash(&self) -> Option<[u8; 20]> {
        if self.is_p2sh() {
            let mut hash = [0u8; 20];
            hash.copy_from_slice(&self.0[2..22]);
            Some(hash)
        } else {
            None
        }
    }

    /// The key a P2PK lock script pays.
    pub fn p2pk_pubkey(&self) -> Option<&[u8]> {
        if self.is_p2pk() {
            Some(&self.0[1..1 + self.0[0] as usize])
        } else {
            None
        }
    }

    // Standard output builders.

    pub fn p2pkh_out(pubkey_hash: &[u8; 20]) -> Script {
        let mut out = Vec::with_capacity(25);
        out.extend_from_slice(&[OP_DUP, OP_HASH160]);
        push_data(&mut out, pubkey_hash);
        out.extend_from_slice(&[OP_EQUALVERIFY, OP_CHECKSIG]);
        Script(out)
    }

    pub fn p2sh_out(script_hash: &[u8; 20]) -> Script {
        let mut out = Vec::with_capacity(23);
        out.push(OP_HASH160);
        push_data(&mut out, script_hash);
        out.push(OP_EQUAL);
        Script(out)
    }

    /// The lock script paying `address`.
    pub fn pay_to_address(address: &Address) -> Script {
        match address {
            Address::PayToPublicKeyHash { pub_key_hash, .. } => Script::p2pkh_out(pub_key_hash),
            Address::PayToScriptHash { script_hash, .. } => Script::p2sh_out(script_hash),
        }
    }

    /// An unspendable OP_RETURN output carrying `data`.
    pub fn data_out(data: &[u8]) -> Script {
        let mut out = Vec::with_capacity(data.len() + 3);
        out.push(OP_RETURN);
        if !data.is_empty() {
            push_data(&mut out, data);
        }
        Script(out)
    }

    /// A raw `threshold`-of-`pubkeys.len()` multisignature lock script.
    pub fn multisig_out(pubkeys: &[secp256k1::PublicKey], threshold: usize) -> Script {
        debug_assert!(threshold >= 1 && threshold <= pubkeys.len() && pubkeys.len() <= 16);
        let mut out = Vec::new();
        out.push(small_int(threshold));
        for pubkey in pubkeys {
            push_data(&mut out, &pubkey.serialize());
        }
        out.push(small_int(pubkeys.len()));
        out.push(OP_CHECKMULTISIG);
        Script(out)
    }

    /// The zero-confirmation-escrow redeem script.
    ///
    /// Commits to the hash of every payment-input key (sorted by compressed
    /// encoding, duplicates removed) ahead of a P2PKH-style check on the
    /// reclaim key, so the same set of keys always produces the same redeem
    /// hash no matter the input order.
    pub fn escrow_redeem(
        input_keys: &[secp256k1::PublicKey],
        reclaim_key: &secp256k1::PublicKey,
    ) -> Script {
        let mut hashes: Vec<[u8; 20]> = input_keys
            .iter()
            .map(|key| hash160(&key.serialize()))
            .collect();
        hashes.sort_unstable();
        hashes.dedup();

        let mut out = Vec::new();
        for hash in &hashes {
            push_data(&mut out, hash);
            out.push(OP_DROP);
        }
        out.extend_from_slice(&[OP_DUP, OP_HASH160]);
        push_data(&mut out, &hash160(&reclaim_key.serialize()));
        out.extend_from_slice(&[OP_EQUALVERIFY, OP_CHECKSIG]);
        Script(out)
    }

    /// The P2SH lock script of the escrow redeem script for these keys.
    pub fn escrow_out(
        input_keys: &[secp256k1::PublicKey],
        reclaim_key: &secp256k1::PublicKey,
    ) -> Script {
        Script::p2sh_out(&hash160(&Script::escrow_redeem(input_keys, reclaim_key).0))
    }

    // Unlocking-script builders used by the input signers.

    /// `<sig> <pubkey>`
    pub fn p2pkh_in(signature: &[u8], pubkey: &[u8]) -> Script {
        let mut out = Vec::with_capacity(signature.len() + pubkey.len() + 2);
        push_data(&mut out, signature);
        push_data(&mut out, pubkey);
        Script(out)
    }

    /// `<sig>`
    pub fn p2pk_in(signature: &[u8]) -> Script {
        let mut out = Vec::with_capacity(signature.len() + 1);
        push_data(&mut out, signature);
        Script(out)
    }

    /// `OP_0 <sig>...` with an optional trailing redeem-script push.
    pub fn multisig_in<'a>(
        signatures: impl Iterator<Item = &'a [u8]>,
        redeem: Option<&Script>,
    ) -> Script {
        let mut out = vec![OP_0];
        for signature in signatures {
            push_data(&mut out, signature);
        }
        if let Some(redeem) = redeem {
            push_data(&mut out, &redeem.0);
        }
        Script(out)
    }

    /// `<sig> <pubkey> <redeem>`
    pub fn escrow_in(signature: &[u8], pubkey: &[u8], redeem: &Script) -> Script {
        let mut out = Vec::new();
        push_data(&mut out, signature);
        push_data(&mut out, pubkey);
        push_data(&mut out, &redeem.0);
        Script(out)
    }
}

impl fmt::Debug for Script {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_tuple("Script")
            .field(&hex::encode(&self.0))
            .finish()
    }
}

impl CashSerialize for Script {
    fn cash_serialize<W: io::Write>(&self, mut writer: W) -> Result<(), io::Error> {
        CompactInt::from(self.0.len()).cash_serialize(&mut writer)?;
        writer.write_all(&self.0[..])?;
        Ok(())
    }
}

impl CashDeserialize for Script {
    fn cash_deserialize<R: io::Read>(mut reader: R) -> Result<Self, SerializationError> {
        let len = CompactInt::cash_deserialize(&mut reader)?.value();
        let mut bytes = Vec::new();
        reader.take(len).read_to_end(&mut bytes)?;
        if bytes.len() as u64 != len {
            return Err(SerializationError::Parse("truncated script"));
        }
        Ok(Script(bytes))
    }
}
