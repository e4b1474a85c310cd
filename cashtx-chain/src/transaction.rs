//! Transactions: the mutable builder, the change and fee solver, signing,
//! deterministic ordering, and the verification flows.
//!
//! A [`Transaction`] starts empty (or parsed from hex/bytes), accumulates
//! inputs via [`Transaction::spend`] and outputs via
//! [`Transaction::pay_to`] and friends, and recomputes its change output
//! after every mutation. Mutation invalidates all prior signatures: any
//! structural change alters the digests signatures commit to.

use std::convert::TryFrom;

use chrono::{DateTime, TimeZone, Utc};

use crate::amount::{Amount, MAX_MONEY};
use crate::cached::Cached;
use crate::compactint::CompactInt;
use crate::serialization::{CashDeserializeInto, CashSerialize};
use crate::transparent::{
    keys::{hash160, PrivateKey},
    Address, Output, Script, UnspentOutput,
};

mod data;
mod error;
mod hash;
mod input;
mod lock_time;
mod serialize;
mod tokens;
mod zce;

pub mod sighash;

#[cfg(any(test, feature = "proptest-impl"))]
mod arbitrary;
#[cfg(test)]
mod tests;

pub use data::{InputData, OutputData, TransactionData};
pub use error::TransactionError;
pub use hash::Hash;
pub use input::{
    Input, SignatureRecord, Signer, DEFAULT_LOCKTIME_SEQNUMBER, DEFAULT_SEQNUMBER,
};
pub use lock_time::LockTime;
pub use serialize::MAX_TX_SIZE;
pub use sighash::{SighashType, SigningAlgorithm};

/// The transaction version new transactions carry, and the highest version
/// the builder accepts.
pub const CURRENT_VERSION: i32 = 2;

/// The serialized-size ceiling sanity verification enforces.
pub const MAX_BLOCK_SIZE: usize = 1_000_000;

/// Outputs below this value are uneconomical to spend and rejected by the
/// serialization gate; change below it is surrendered as fee.
pub const DUST_AMOUNT: i64 = 546;

/// The factor between the estimated fee and the largest (or smallest) fee
/// the serialization gate will let through.
pub const FEE_SECURITY_MARGIN: u64 = 150;

/// Default fee rate, in base units per 1000 bytes.
pub const FEE_PER_KB: u64 = 100_000;

/// Worst-case serialized size of a change output (value, script length,
/// P2SH/P2PKH lock script), used when sizing against rate bounds.
pub const CHANGE_OUTPUT_MAX_SIZE: usize = 62;

/// Serialized bytes not attributable to any input or output: version,
/// lock time, and both worst-case count prefixes.
pub const MAXIMUM_EXTRA_SIZE: usize = 4 + 9 + 9 + 4;

/// Switches for [`Transaction::serialize_with`], bypassing individual gate
/// checks.
#[derive(Clone, Copy, Debug, Default)]
pub struct SerializeOptions {
    /// Skip every gate.
    pub disable_all: bool,
    /// Allow outputs to exceed inputs.
    pub disable_more_output_than_input: bool,
    /// Allow an implied fee above the security bound.
    pub disable_large_fees: bool,
    /// Allow an implied fee below the security bound.
    pub disable_small_fees: bool,
    /// Allow dust outputs.
    pub disable_dust_outputs: bool,
    /// Allow missing signatures.
    pub disable_is_fully_signed: bool,
}

impl SerializeOptions {
    /// The options `serialize_unchecked` is shorthand for.
    pub fn unchecked() -> SerializeOptions {
        SerializeOptions {
            disable_all: true,
            ..SerializeOptions::default()
        }
    }
}

/// A Bitcoin-Cash-family transaction under construction.
///
/// The wire fields are public, like any parsed structure; the builder
/// surface keeps the change output, the cached txid, and the cached value
/// sums consistent, so prefer it over direct field edits when both would
/// do.
#[derive(Clone, Debug)]
pub struct Transaction {
    /// The transaction version. Versions greater than 1 mean that BIP 68
    /// applies.
    pub version: i32,
    /// The transaction inputs.
    pub inputs: Vec<Input>,
    /// The transaction outputs.
    pub outputs: Vec<Output>,
    /// The transaction lock time.
    pub locktime: LockTime,
    hash: Cached<Hash>,
    input_amount: Cached<Amount>,
    output_amount: Cached<Amount>,
    change_script: Option<Script>,
    change_index: Option<usize>,
    fee_override: Option<Amount>,
    fee_per_kb: Option<u64>,
    fee_per_byte: Option<u64>,
}

/// Transactions compare by wire content; builder bookkeeping and caches
/// are ignored, so a built transaction equals its parsed serialization.
impl PartialEq for Transaction {
    fn eq(&self, other: &Self) -> bool {
        self.version == other.version
            && self.inputs == other.inputs
            && self.outputs == other.outputs
            && self.locktime == other.locktime
            && self.hash == other.hash
    }
}

impl Eq for Transaction {}

impl Default for Transaction {
    fn default() -> Self {
        Transaction::new()
    }
}

impl Transaction {
    /// An empty version-2 transaction with lock time zero.
    pub fn new() -> Transaction {
        Transaction::from_wire_parts(CURRENT_VERSION, Vec::new(), Vec::new(), LockTime::unlocked())
    }

    pub(crate) fn from_wire_parts(
        version: i32,
        inputs: Vec<Input>,
        outputs: Vec<Output>,
        locktime: LockTime,
    ) -> Transaction {
        Transaction {
            version,
            inputs,
            outputs,
            locktime,
            hash: Cached::new(),
            input_amount: Cached::new(),
            output_amount: Cached::new(),
            change_script: None,
            change_index: None,
            fee_override: None,
            fee_per_kb: None,
            fee_per_byte: None,
        }
    }

    /// Parses a lowercase or uppercase hex serialization.
    pub fn from_hex(hex_str: &str) -> Result<Transaction, TransactionError> {
        let trimmed = hex_str.trim();
        if trimmed.is_empty() {
            return Err(TransactionError::NoData);
        }
        let bytes = hex::decode(trimmed)
            .map_err(|_| TransactionError::InvalidArgument("invalid transaction hex".into()))?;
        Transaction::from_bytes(&bytes)
    }

    /// Parses the canonical wire serialization.
    pub fn from_bytes(bytes: &[u8]) -> Result<Transaction, TransactionError> {
        if bytes.is_empty() {
            return Err(TransactionError::NoData);
        }
        Ok(bytes.cash_deserialize_into()?)
    }

    /// The canonical wire serialization.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.cash_serialize_to_vec()
            .expect("writing to a Vec never fails")
    }

    /// Get the hash (txid) of this transaction.
    pub fn hash(&self) -> Hash {
        // If we have a cached version, just return that
        if let Some(hash) = self.hash.value() {
            return hash;
        }
        // Otherwise, serialize the tx to calculate and return the hash
        Hash::from(self)
    }

    /// The txid in its display (reversed-hex) form.
    pub fn id(&self) -> String {
        self.hash().to_string()
    }

    /// Returns `true` if this transaction is a coinbase transaction.
    pub fn is_coinbase(&self) -> bool {
        self.inputs.len() == 1 && self.inputs[0].is_null()
    }

    /// Returns the serialized length (in bytes) of this transaction.
    pub fn serialized_size(&self) -> usize {
        let mut size = 4 + CompactInt::size(self.inputs.len());
        for input in self.inputs.iter() {
            size += 36 + input.unlock_script.serialized_size() + 4;
        }
        size += CompactInt::size(self.outputs.len());
        for output in self.outputs.iter() {
            size += output.len();
        }
        size + 4
    }

    /// Worst-case serialized size once every input is signed.
    pub fn estimated_size(&self) -> usize {
        let mut size = MAXIMUM_EXTRA_SIZE;
        for input in self.inputs.iter() {
            size += input.estimated_size();
        }
        for output in self.outputs.iter() {
            size += output.len();
        }
        size
    }

    // Value accounting.

    /// The sum of the attached spent-output values.
    pub fn input_amount(&self) -> Result<Amount, TransactionError> {
        if let Some(cached) = self.input_amount.value() {
            return Ok(cached);
        }
        let mut total: i128 = 0;
        for (index, input) in self.inputs.iter().enumerate() {
            let output = input
                .output
                .as_ref()
                .ok_or(TransactionError::MissingUtxoInfo(index))?;
            total += output.value.as_sat() as i128;
        }
        widened_amount(total)
    }

    /// The sum of the output values.
    pub fn output_amount(&self) -> Result<Amount, TransactionError> {
        if let Some(cached) = self.output_amount.value() {
            return Ok(cached);
        }
        let total: i128 = self.outputs.iter().map(|output| output.value).sum();
        widened_amount(total)
    }

    /// Input sum minus output sum; negative when outputs overspend.
    pub fn unspent_value(&self) -> Result<i64, TransactionError> {
        Ok(self.input_amount()?.as_sat() - self.output_amount()?.as_sat())
    }

    /// The fee this transaction pays: zero for a coinbase, the explicit
    /// override when set, the whole surplus when no change output exists
    /// to absorb it, and the rate-based estimate otherwise.
    pub fn fee(&self) -> Result<Amount, TransactionError> {
        if self.is_coinbase() {
            return Ok(Amount::ZERO);
        }
        if let Some(fee) = self.fee_override {
            return Ok(fee);
        }
        if self.change_index.is_none() {
            return self.unspent_value().map(Amount::from_sat);
        }
        Ok(Amount::from_sat(self.estimate_fee()? as i64))
    }

    /// The fee target implied by the configured rate and the estimated
    /// size, accounting for the change output only when it will exist.
    pub fn estimate_fee(&self) -> Result<u64, TransactionError> {
        let estimated_size = self.estimated_size();
        let fee_no_change = self.apply_fee_rate(estimated_size);
        let change_script = match &self.change_script {
            None => return Ok(fee_no_change),
            Some(script) => script,
        };
        let change_output_size =
            8 + CompactInt::size(change_script.0.len()) + change_script.0.len();
        let fee_with_change = self.apply_fee_rate(estimated_size + change_output_size);
        let available = self.unspent_value()?;
        if available <= fee_with_change as i64 {
            Ok(fee_no_change)
        } else {
            Ok(fee_with_change)
        }
    }

    fn apply_fee_rate(&self, size: usize) -> u64 {
        match self.fee_per_byte {
            Some(rate) => size as u64 * rate,
            None => {
                let per_kb = self.fee_per_kb.unwrap_or(FEE_PER_KB);
                (size as u64 * per_kb + 999) / 1000
            }
        }
    }

    // Builder surface. Every mutation ends in `update_change_output`, which
    // clears signatures and recomputes the change output.

    fn has_input(&self, outpoint: &crate::transparent::OutPoint) -> bool {
        self.inputs.iter().any(|input| input.outpoint == *outpoint)
    }

    fn build_input(&self, utxo: &UnspentOutput) -> Result<Input, TransactionError> {
        if utxo.public_keys.len() > 1 {
            return Input::escrow(utxo);
        }
        if utxo.script.is_p2pkh() || utxo.script.is_witness_pkh_out() || utxo.script.is_p2sh() {
            return Ok(Input::public_key_hash(utxo));
        }
        if utxo.script.is_p2pk() {
            return Input::public_key(utxo);
        }
        Ok(Input::raw(utxo))
    }

    /// Adds an input spending `utxo`, selecting the signing strategy from
    /// the shape of its lock script. Spending the same outpoint twice is
    /// silently ignored.
    pub fn spend(&mut self, utxo: &UnspentOutput) -> Result<&mut Self, TransactionError> {
        if self.has_input(&utxo.outpoint()) {
            return Ok(self);
        }
        let input = self.build_input(utxo)?;
        self.add_input(input)
    }

    pub fn spend_all(&mut self, utxos: &[UnspentOutput]) -> Result<&mut Self, TransactionError> {
        for utxo in utxos {
            self.spend(utxo)?;
        }
        Ok(self)
    }

    /// Adds a multisignature input: directly over a bare multisig output,
    /// or via a reconstructed redeem script over a script-hash output.
    pub fn spend_multisig(
        &mut self,
        utxo: &UnspentOutput,
        public_keys: &[secp256k1::PublicKey],
        threshold: usize,
    ) -> Result<&mut Self, TransactionError> {
        if self.has_input(&utxo.outpoint()) {
            return Ok(self);
        }
        if threshold == 0 || threshold > public_keys.len() || public_keys.len() > 16 {
            return Err(TransactionError::InvalidArgument(format!(
                "invalid multisig shape: {} of {}",
                threshold,
                public_keys.len()
            )));
        }
        let input = if utxo.script.is_multisig_out() {
            Input::multisig(utxo, public_keys, threshold)
        } else if utxo.script.is_p2sh() || utxo.script.is_witness_sh_out() {
            Input::multisig_script_hash(utxo, public_keys, threshold)
        } else {
            return Err(TransactionError::UnsupportedScript(utxo.script.clone()));
        };
        self.add_input(input)
    }

    /// Adds a prepared input; its spent output must be attached.
    pub fn add_input(&mut self, input: Input) -> Result<&mut Self, TransactionError> {
        if input.output.is_none() {
            return Err(TransactionError::MissingUtxoInfo(self.inputs.len()));
        }
        self.add_input_unchecked(input)
    }

    /// Adds an input without requiring its spent output.
    pub fn add_input_unchecked(&mut self, input: Input) -> Result<&mut Self, TransactionError> {
        self.inputs.push(input);
        self.update_change_output()?;
        Ok(self)
    }

    /// Rebuilds the inputs matching `utxos` in place (typically after
    /// parsing, to make a transaction signable again). Returns the input
    /// index for each descriptor, or -1 where none matched.
    pub fn associate_inputs(
        &mut self,
        utxos: &[UnspentOutput],
    ) -> Result<Vec<i64>, TransactionError> {
        let mut indices = Vec::with_capacity(utxos.len());
        let mut changed = false;
        for utxo in utxos {
            match self
                .inputs
                .iter()
                .position(|input| input.outpoint == utxo.outpoint())
            {
                Some(index) => {
                    let mut input = self.build_input(utxo)?;
                    if utxo.sequence.is_none() {
                        input.sequence = self.inputs[index].sequence;
                    }
                    self.inputs[index] = input;
                    indices.push(index as i64);
                    changed = true;
                }
                None => indices.push(-1),
            }
        }
        if changed {
            self.update_change_output()?;
        }
        Ok(indices)
    }

    /// Appends an output paying `amount` to `address`.
    pub fn pay_to(
        &mut self,
        address: &Address,
        amount: Amount,
    ) -> Result<&mut Self, TransactionError> {
        if !amount.is_valid() {
            return Err(TransactionError::InvalidSatoshis(amount.as_sat()));
        }
        self.outputs.push(Output::new(amount, address.lock_script()));
        self.update_change_output()?;
        Ok(self)
    }

    /// Appends a zero-value OP_RETURN output carrying `data`.
    pub fn add_data(&mut self, data: &[u8]) -> Result<&mut Self, TransactionError> {
        self.outputs
            .push(Output::new(Amount::ZERO, Script::data_out(data)));
        self.update_change_output()?;
        Ok(self)
    }

    /// Appends a pre-built output.
    pub fn add_output(&mut self, output: Output) -> Result<&mut Self, TransactionError> {
        self.outputs.push(output);
        self.update_change_output()?;
        Ok(self)
    }

    /// Appends the escrow output securing a zero-confirmation payment:
    /// a P2SH wrap of the redeem script for `input_keys` + `reclaim_key`.
    ///
    /// When no change address is set, a previously configured explicit fee
    /// is dropped so the escrow value does not unbalance the fee equation.
    pub fn escrow(
        &mut self,
        input_keys: &[secp256k1::PublicKey],
        reclaim_key: &secp256k1::PublicKey,
        amount: Amount,
    ) -> Result<&mut Self, TransactionError> {
        if !amount.is_valid() {
            return Err(TransactionError::InvalidSatoshis(amount.as_sat()));
        }
        self.outputs
            .push(Output::new(amount, Script::escrow_out(input_keys, reclaim_key)));
        if self.change_script.is_none() {
            self.fee_override = None;
        }
        self.update_change_output()?;
        Ok(self)
    }

    /// Removes every output (the change recompute may immediately restore
    /// a change output).
    pub fn clear_outputs(&mut self) -> Result<&mut Self, TransactionError> {
        self.outputs.clear();
        self.change_index = None;
        self.update_change_output()?;
        Ok(self)
    }

    pub fn remove_output(&mut self, index: usize) -> Result<&mut Self, TransactionError> {
        if index >= self.outputs.len() {
            return Err(TransactionError::InvalidIndex {
                index,
                len: self.outputs.len(),
            });
        }
        self.outputs.remove(index);
        self.change_index = match self.change_index {
            Some(change) if change == index => None,
            Some(change) if change > index => Some(change - 1),
            other => other,
        };
        self.update_change_output()?;
        Ok(self)
    }

    pub fn remove_input_at(&mut self, index: usize) -> Result<&mut Self, TransactionError> {
        if index >= self.inputs.len() {
            return Err(TransactionError::InvalidIndex {
                index,
                len: self.inputs.len(),
            });
        }
        self.inputs.remove(index);
        self.update_change_output()?;
        Ok(self)
    }

    pub fn remove_input_by_outpoint(
        &mut self,
        txid: &Hash,
        output_index: u32,
    ) -> Result<&mut Self, TransactionError> {
        let position = self
            .inputs
            .iter()
            .position(|input| input.outpoint.hash == *txid && input.outpoint.index == output_index)
            .ok_or_else(|| {
                TransactionError::InvalidArgument(format!(
                    "no input spends {}:{}",
                    txid, output_index
                ))
            })?;
        self.inputs.remove(position);
        self.update_change_output()?;
        Ok(self)
    }

    /// Directs future surplus value to `address`.
    pub fn change_to(&mut self, address: &Address) -> Result<&mut Self, TransactionError> {
        self.change_script = Some(address.lock_script());
        self.update_change_output()?;
        Ok(self)
    }

    pub fn change_script(&self) -> Option<&Script> {
        self.change_script.as_ref()
    }

    /// The current change output, if the last recompute produced one.
    pub fn change_output(&self) -> Option<&Output> {
        self.change_index.map(|index| &self.outputs[index])
    }

    pub fn change_index(&self) -> Option<usize> {
        self.change_index
    }

    /// Pins the fee to an absolute amount.
    pub fn set_fee(&mut self, amount: Amount) -> Result<&mut Self, TransactionError> {
        if !amount.is_valid() {
            return Err(TransactionError::InvalidSatoshis(amount.as_sat()));
        }
        self.fee_override = Some(amount);
        self.update_change_output()?;
        Ok(self)
    }

    /// Sets the fee rate in base units per 1000 bytes.
    pub fn set_fee_per_kb(&mut self, rate: u64) -> Result<&mut Self, TransactionError> {
        self.fee_per_kb = Some(rate);
        self.update_change_output()?;
        Ok(self)
    }

    /// Sets the fee rate in base units per byte; a per-kilobyte rate takes
    /// precedence when both are set.
    pub fn set_fee_per_byte(&mut self, rate: u64) -> Result<&mut Self, TransactionError> {
        self.fee_per_byte = Some(rate);
        self.update_change_output()?;
        Ok(self)
    }

    pub fn set_version(&mut self, version: i32) -> Result<&mut Self, TransactionError> {
        if !(1..=CURRENT_VERSION).contains(&version) {
            return Err(TransactionError::InvalidArgument(format!(
                "unsupported transaction version {}",
                version
            )));
        }
        self.version = version;
        self.hash.clear();
        Ok(self)
    }

    // Lock times.

    /// Locks the transaction until `date`. Moments before the timestamp
    /// domain begins cannot be expressed as time locks and are rejected.
    pub fn lock_until_time(&mut self, date: DateTime<Utc>) -> Result<&mut Self, TransactionError> {
        self.lock_until_raw_timestamp(date.timestamp())
    }

    /// Timestamp flavor of [`Transaction::lock_until_time`].
    pub fn lock_until_timestamp(&mut self, timestamp: u32) -> Result<&mut Self, TransactionError> {
        self.lock_until_raw_timestamp(timestamp as i64)
    }

    fn lock_until_raw_timestamp(&mut self, timestamp: i64) -> Result<&mut Self, TransactionError> {
        if timestamp < LockTime::MIN_TIMESTAMP {
            return Err(TransactionError::LockTimeTooEarly(timestamp));
        }
        if timestamp > LockTime::MAX_TIMESTAMP {
            return Err(TransactionError::NLockTimeOutOfRange(timestamp));
        }
        self.enable_locktime_sequences();
        self.locktime = LockTime::Time(Utc.timestamp(timestamp, 0));
        self.hash.clear();
        Ok(self)
    }

    /// Locks the transaction until the chain reaches `height`.
    pub fn lock_until_height(&mut self, height: u32) -> Result<&mut Self, TransactionError> {
        if height >= LockTime::BLOCK_HEIGHT_LIMIT {
            return Err(TransactionError::BlockHeightTooHigh(height));
        }
        self.enable_locktime_sequences();
        self.locktime = LockTime::Height(height);
        self.hash.clear();
        Ok(self)
    }

    /// Inputs still carrying the default sequence opt in to the lock time.
    fn enable_locktime_sequences(&mut self) {
        for input in self.inputs.iter_mut() {
            if input.sequence == DEFAULT_SEQNUMBER {
                input.sequence = DEFAULT_LOCKTIME_SEQNUMBER;
            }
        }
    }

    /// The effective lock time: `None` when unlocked.
    pub fn lock_time(&self) -> Option<LockTime> {
        if self.locktime.is_unlocked() {
            None
        } else {
            Some(self.locktime)
        }
    }

    // Change recompute: the fixed point between fee target, estimated
    // size, and the dust threshold.

    fn touch(&mut self) {
        self.hash.clear();
        self.input_amount.clear();
        self.output_amount.clear();
    }

    fn update_change_output(&mut self) -> Result<(), TransactionError> {
        self.touch();
        self.clear_signatures();
        if let Some(index) = self.change_index.take() {
            if index < self.outputs.len() {
                self.outputs.remove(index);
            }
        }
        let change_script = match &self.change_script {
            Some(script) => script.clone(),
            None => return Ok(()),
        };
        let available = self.unspent_value()?;
        let fee = match self.fee_override {
            Some(fee) => fee.as_sat(),
            None => self.estimate_fee()? as i64,
        };
        let change = available - fee;
        if change >= DUST_AMOUNT {
            self.outputs
                .push(Output::new(Amount::from_sat(change), change_script));
            self.change_index = Some(self.outputs.len() - 1);
        }
        // Refresh the cached sums while they are known-consistent.
        let input_amount = self.input_amount()?;
        let output_amount = self.output_amount()?;
        self.input_amount.set(input_amount);
        self.output_amount.set(output_amount);
        Ok(())
    }

    // Signature orchestration.

    /// Signs every input `key` can satisfy with `SIGHASH_ALL | FORKID`
    /// ECDSA signatures.
    pub fn sign(&mut self, key: &PrivateKey) -> Result<&mut Self, TransactionError> {
        self.sign_with(key, SighashType::default(), SigningAlgorithm::default())
    }

    pub fn sign_with(
        &mut self,
        key: &PrivateKey,
        sighash_type: SighashType,
        algorithm: SigningAlgorithm,
    ) -> Result<&mut Self, TransactionError> {
        for (index, input) in self.inputs.iter().enumerate() {
            if input.output.is_none() {
                return Err(TransactionError::MissingUtxoInfo(index));
            }
        }
        let pubkey_hash = hash160(&key.public_key().serialize());
        tracing::trace!(
            inputs = self.inputs.len(),
            ?algorithm,
            "producing signatures"
        );
        let mut records = Vec::new();
        for index in 0..self.inputs.len() {
            records.extend(self.inputs[index].signatures_for(
                self,
                key,
                index,
                sighash_type,
                &pubkey_hash,
                algorithm,
            )?);
        }
        for record in records {
            self.apply_signature(record)?;
        }
        Ok(self)
    }

    pub fn sign_all(
        &mut self,
        keys: &[PrivateKey],
        sighash_type: SighashType,
        algorithm: SigningAlgorithm,
    ) -> Result<&mut Self, TransactionError> {
        for key in keys {
            self.sign_with(key, sighash_type, algorithm)?;
        }
        Ok(self)
    }

    /// Validates `record` against its input, then installs it.
    pub fn apply_signature(
        &mut self,
        record: SignatureRecord,
    ) -> Result<&mut Self, TransactionError> {
        let index = record.input_index;
        if index >= self.inputs.len() {
            return Err(TransactionError::InvalidIndex {
                index,
                len: self.inputs.len(),
            });
        }
        match self.inputs[index].is_valid_signature(self, &record) {
            None => Err(TransactionError::UnableToVerifySignature),
            Some(false) => Err(TransactionError::InvalidArgument(
                "signature does not verify against its input".into(),
            )),
            Some(true) => {
                self.inputs[index].apply_signature_unchecked(record);
                self.hash.clear();
                Ok(self)
            }
        }
    }

    /// Checks `record` without mutating anything.
    pub fn verify_signature(&self, record: &SignatureRecord) -> Result<bool, TransactionError> {
        let index = record.input_index;
        if index >= self.inputs.len() {
            return Err(TransactionError::InvalidIndex {
                index,
                len: self.inputs.len(),
            });
        }
        self.inputs[index]
            .is_valid_signature(self, record)
            .ok_or(TransactionError::UnableToVerifySignature)
    }

    /// Whether every input holds the signatures it needs. Errs when any
    /// input cannot answer (an unrecognized script).
    pub fn is_fully_signed(&self) -> Result<bool, TransactionError> {
        let mut fully_signed = true;
        for input in &self.inputs {
            match input.is_fully_signed() {
                None => return Err(TransactionError::UnableToVerifySignature),
                Some(signed) => fully_signed &= signed,
            }
        }
        Ok(fully_signed)
    }

    pub fn clear_signatures(&mut self) {
        for input in self.inputs.iter_mut() {
            input.clear_signatures();
        }
    }

    // Deterministic (BIP-69) ordering.

    /// Sorts inputs by reversed txid then output index, and outputs by
    /// value then script bytes; ties keep their original order, and the
    /// change index follows its output.
    pub fn sort(&mut self) -> Result<&mut Self, TransactionError> {
        self.sort_inputs_with(|inputs| {
            let mut sorted = inputs.to_vec();
            sorted.sort_by(|a, b| {
                a.outpoint
                    .hash
                    .reversed()
                    .cmp(&b.outpoint.hash.reversed())
                    .then(a.outpoint.index.cmp(&b.outpoint.index))
            });
            sorted
        })?;
        self.sort_outputs_with(|outputs| {
            let mut sorted = outputs.to_vec();
            sorted.sort_by(|a, b| {
                a.value
                    .as_sat()
                    .cmp(&b.value.as_sat())
                    .then_with(|| a.script.0.cmp(&b.script.0))
            });
            sorted
        })
    }

    /// Replaces the outputs with `sorter`'s ordering, which must be a
    /// permutation of the originals.
    pub fn sort_outputs_with<F>(&mut self, sorter: F) -> Result<&mut Self, TransactionError>
    where
        F: FnOnce(&[Output]) -> Vec<Output>,
    {
        let sorted = sorter(&self.outputs);
        let map = permutation_map(&self.outputs, &sorted).ok_or(TransactionError::InvalidSorting)?;
        if let Some(change) = self.change_index {
            self.change_index = Some(map[change]);
        }
        self.outputs = sorted;
        self.hash.clear();
        Ok(self)
    }

    /// Replaces the inputs with `sorter`'s ordering, which must be a
    /// permutation of the originals. Reordering inputs invalidates every
    /// signature.
    pub fn sort_inputs_with<F>(&mut self, sorter: F) -> Result<&mut Self, TransactionError>
    where
        F: FnOnce(&[Input]) -> Vec<Input>,
    {
        let sorted = sorter(&self.inputs);
        permutation_map(&self.inputs, &sorted).ok_or(TransactionError::InvalidSorting)?;
        self.inputs = sorted;
        self.clear_signatures();
        self.hash.clear();
        Ok(self)
    }

    // Sanity verification: a diagnostic, not a gate.

    /// Checks the structural consensus rules a relayable transaction must
    /// satisfy. The returned error's `Display` describes the first
    /// failure.
    pub fn verify(&self) -> Result<(), TransactionError> {
        if self.inputs.is_empty() {
            return Err(TransactionError::NoInputs);
        }
        if self.outputs.is_empty() {
            return Err(TransactionError::NoOutputs);
        }
        let mut total: i128 = 0;
        for output in &self.outputs {
            if !output.has_valid_value() {
                return Err(TransactionError::InvalidSatoshis(output.value.as_sat()));
            }
            total += output.value.as_sat() as i128;
            if total > MAX_MONEY as i128 {
                return Err(TransactionError::InvalidOutputAmountSum);
            }
        }
        let size = self.serialized_size();
        if size > MAX_BLOCK_SIZE {
            return Err(TransactionError::OversizedTransaction {
                size,
                max: MAX_BLOCK_SIZE,
            });
        }
        for (first, input) in self.inputs.iter().enumerate() {
            for (offset, other) in self.inputs[first + 1..].iter().enumerate() {
                if input.outpoint == other.outpoint {
                    return Err(TransactionError::DuplicateInput {
                        first,
                        second: first + 1 + offset,
                    });
                }
            }
        }
        if self.is_coinbase() {
            let script_len = self.inputs[0].unlock_script.0.len();
            if !(2..=100).contains(&script_len) {
                return Err(TransactionError::CoinbaseScriptSize(script_len));
            }
        } else {
            for (index, input) in self.inputs.iter().enumerate() {
                if input.is_null() {
                    return Err(TransactionError::NullInput(index));
                }
            }
        }
        Ok(())
    }

    // The safe serialization gate.

    /// Serializes after running every gate check.
    pub fn serialize_checked(&self) -> Result<String, TransactionError> {
        self.serialize_with(&SerializeOptions::default())
    }

    /// Serializes after running the gate checks `opts` leaves enabled.
    pub fn serialize_with(&self, opts: &SerializeOptions) -> Result<String, TransactionError> {
        if opts.disable_all {
            return Ok(self.serialize_unchecked());
        }
        match self.serialization_error(opts) {
            Some(error) => Err(error),
            None => Ok(self.serialize_unchecked()),
        }
    }

    /// The lowercase-hex wire form, no questions asked.
    pub fn serialize_unchecked(&self) -> String {
        hex::encode(self.to_bytes())
    }

    /// The first gate failure `opts` leaves enabled, if any.
    pub fn serialization_error(&self, opts: &SerializeOptions) -> Option<TransactionError> {
        for output in &self.outputs {
            if !output.has_valid_value() {
                return Some(TransactionError::InvalidSatoshis(output.value.as_sat()));
            }
        }

        let unspent = match self.unspent_value() {
            Ok(unspent) => unspent,
            Err(error) => return Some(error),
        };
        if !opts.disable_more_output_than_input && unspent < 0 {
            return Some(TransactionError::InvalidOutputAmountSum);
        }
        if let Some(error) = self.fee_error(opts, unspent) {
            return Some(error);
        }
        if !opts.disable_dust_outputs {
            for (index, output) in self.outputs.iter().enumerate() {
                if output.value.as_sat() < DUST_AMOUNT && !output.script.is_data_out() {
                    return Some(TransactionError::DustOutputs {
                        index,
                        threshold: DUST_AMOUNT,
                    });
                }
            }
        }
        if !opts.disable_is_fully_signed {
            match self.is_fully_signed() {
                Err(error) => return Some(error),
                Ok(false) => return Some(TransactionError::MissingSignatures),
                Ok(true) => {}
            }
        }
        None
    }

    fn fee_error(&self, opts: &SerializeOptions, unspent: i64) -> Option<TransactionError> {
        if let Some(fee) = self.fee_override {
            if fee.as_sat() != unspent {
                return Some(TransactionError::FeeDifferent {
                    expected: fee.as_sat(),
                    actual: unspent,
                });
            }
            return None;
        }
        let estimate = match self.estimate_fee() {
            Ok(estimate) => estimate,
            Err(error) => return Some(error),
        };
        if !opts.disable_large_fees {
            let max_fee = (FEE_SECURITY_MARGIN * estimate) as i64;
            if unspent > max_fee {
                return Some(if self.change_script.is_none() {
                    TransactionError::ChangeAddressMissing
                } else {
                    TransactionError::FeeTooLarge {
                        fee: unspent,
                        max: max_fee,
                    }
                });
            }
        }
        if !opts.disable_small_fees {
            let min_fee = ((estimate + FEE_SECURITY_MARGIN - 1) / FEE_SECURITY_MARGIN) as i64;
            if unspent < min_fee {
                return Some(TransactionError::FeeTooSmall {
                    fee: unspent,
                    min: min_fee,
                });
            }
        }
        None
    }
}

fn widened_amount(total: i128) -> Result<Amount, TransactionError> {
    i64::try_from(total)
        .map(Amount::from_sat)
        .map_err(|_| {
            TransactionError::InvalidArgument(format!("value sum {} overflows 64 bits", total))
        })
}

/// Maps each index of `old` to the position of the matching element in
/// `new`, matching duplicates in order. `None` unless `new` is a
/// permutation of `old`.
fn permutation_map<T: PartialEq>(old: &[T], new: &[T]) -> Option<Vec<usize>> {
    if old.len() != new.len() {
        return None;
    }
    let mut used = vec![false; new.len()];
    let mut map = Vec::with_capacity(old.len());
    for item in old {
        let position = new
            .iter()
            .enumerate()
            .position(|(index, candidate)| !used[index] && candidate == item)?;
        used[position] = true;
        map.push(position);
    }
    Some(map)
}
