//! Wire codec for transactions and their inputs, so that all of the
//! serialization logic is in one place.

use std::io;

use crate::cached::Cached;
use crate::serialization::{CashDeserialize, CashSerialize, SerializationError};
use crate::transparent::{self, Script};

use super::{Hash, Input, LockTime, Transaction};

/// The maximum size of a serialized transaction in bytes.
pub const MAX_TX_SIZE: u64 = 1_000_000;

impl CashSerialize for Input {
    fn cash_serialize<W: io::Write>(&self, mut writer: W) -> Result<(), io::Error> {
        self.outpoint.cash_serialize(&mut writer)?;
        self.unlock_script.cash_serialize(&mut writer)?;
        self.sequence.cash_serialize(&mut writer)?;
        Ok(())
    }
}

/// Inputs parse with the raw signer and no attached output; callers
/// re-associate unspent outputs before signing.
impl CashDeserialize for Input {
    fn cash_deserialize<R: io::Read>(mut reader: R) -> Result<Self, SerializationError> {
        let outpoint = transparent::OutPoint::cash_deserialize(&mut reader)?;
        let unlock_script = Script::cash_deserialize(&mut reader)?;
        let sequence = u32::cash_deserialize(&mut reader)?;
        Ok(Input::from_wire(outpoint, unlock_script, sequence))
    }
}

impl CashSerialize for Transaction {
    fn cash_serialize<W: io::Write>(&self, mut writer: W) -> Result<(), io::Error> {
        self.version.cash_serialize(&mut writer)?;
        self.inputs.cash_serialize(&mut writer)?;
        self.outputs.cash_serialize(&mut writer)?;
        self.locktime.cash_serialize(&mut writer)?;
        Ok(())
    }
}

/// Deserializes a transaction, calculating and caching its txid.
impl CashDeserialize for Transaction {
    fn cash_deserialize<R: io::Read>(src: R) -> Result<Self, SerializationError> {
        // Cap reads at one block's worth of transaction to protect against
        // DOS attacks.
        let mut src = src.take(MAX_TX_SIZE);
        let version = i32::cash_deserialize(&mut src)?;
        let inputs = <Vec<Input>>::cash_deserialize(&mut src)?;
        let outputs = <Vec<transparent::Output>>::cash_deserialize(&mut src)?;
        let locktime = LockTime::cash_deserialize(&mut src)?;
        let mut transaction = Transaction::from_wire_parts(version, inputs, outputs, locktime);
        // Calculate and cache the txid.
        let own_hash = Hash::from(&transaction);
        transaction.hash = Cached::from(own_hash);
        Ok(transaction)
    }
}
