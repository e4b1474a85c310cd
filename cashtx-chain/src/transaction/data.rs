//! The object form of a transaction: a serde-friendly mirror structure for
//! JSON interchange, storage, and debugging.

use std::str::FromStr;

use crate::amount::Amount;
use crate::transparent::{Output, Script, TokenData};

use super::{Hash, Input, LockTime, Transaction, TransactionError};

/// The object form of an output.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputData {
    pub satoshis: i64,
    /// Lock script, hex.
    pub script: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_data: Option<TokenData>,
}

/// The object form of an input.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputData {
    /// Previous txid in display (big-endian) hex.
    pub prev_tx_id: String,
    pub output_index: u32,
    pub sequence_number: u32,
    /// Unlocking script, hex.
    pub script: String,
    /// The spent output, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<OutputData>,
}

/// The object form of a transaction, including the builder state a wallet
/// needs to resume work on it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionData {
    /// The txid; verified against the content when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
    pub version: i32,
    pub inputs: Vec<InputData>,
    pub outputs: Vec<OutputData>,
    pub n_lock_time: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub change_script: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub change_index: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fee: Option<i64>,
}

impl From<&Output> for OutputData {
    fn from(output: &Output) -> Self {
        OutputData {
            satoshis: output.value.as_sat(),
            script: hex::encode(&output.script.0),
            token_data: output.token.clone(),
        }
    }
}

impl OutputData {
    fn into_output(self) -> Result<Output, TransactionError> {
        let script = decode_script(&self.script)?;
        Ok(Output {
            value: Amount::from_sat(self.satoshis),
            script,
            token: self.token_data,
        })
    }
}

fn decode_script(hex_str: &str) -> Result<Script, TransactionError> {
    hex::decode(hex_str)
        .map(Script)
        .map_err(|_| TransactionError::InvalidArgument("invalid script hex".into()))
}

impl Transaction {
    /// The object form of this transaction.
    pub fn to_data(&self) -> TransactionData {
        TransactionData {
            hash: Some(self.id()),
            version: self.version,
            inputs: self
                .inputs
                .iter()
                .map(|input| InputData {
                    prev_tx_id: input.outpoint.hash.to_string(),
                    output_index: input.outpoint.index,
                    sequence_number: input.sequence,
                    script: hex::encode(&input.unlock_script.0),
                    output: input.output.as_ref().map(OutputData::from),
                })
                .collect(),
            outputs: self.outputs.iter().map(OutputData::from).collect(),
            n_lock_time: self.locktime.raw_value(),
            change_script: self
                .change_script
                .as_ref()
                .map(|script| hex::encode(&script.0)),
            change_index: self.change_index,
            fee: self.fee_override.map(Amount::as_sat),
        }
    }

    /// Rebuilds a transaction from its object form. A present `hash` field
    /// must match the reconstructed txid.
    pub fn from_data(data: TransactionData) -> Result<Transaction, TransactionError> {
        let mut inputs = Vec::with_capacity(data.inputs.len());
        for input_data in data.inputs {
            let hash = Hash::from_str(&input_data.prev_tx_id).map_err(|_| {
                TransactionError::InvalidArgument(format!(
                    "invalid previous txid {}",
                    input_data.prev_tx_id
                ))
            })?;
            let mut input = Input::from_wire(
                crate::transparent::OutPoint {
                    hash,
                    index: input_data.output_index,
                },
                decode_script(&input_data.script)?,
                input_data.sequence_number,
            );
            input.output = input_data
                .output
                .map(OutputData::into_output)
                .transpose()?;
            inputs.push(input);
        }
        let outputs = data
            .outputs
            .into_iter()
            .map(OutputData::into_output)
            .collect::<Result<Vec<_>, _>>()?;

        let locktime = if data.n_lock_time < LockTime::BLOCK_HEIGHT_LIMIT {
            LockTime::Height(data.n_lock_time)
        } else {
            use chrono::TimeZone;
            LockTime::Time(chrono::Utc.timestamp(data.n_lock_time as i64, 0))
        };

        let mut transaction =
            Transaction::from_wire_parts(data.version, inputs, outputs, locktime);
        transaction.change_script = data.change_script.as_deref().map(decode_script).transpose()?;
        transaction.change_index = data.change_index;
        transaction.fee_override = data.fee.map(Amount::from_sat);

        if let Some(expected) = data.hash {
            let actual = transaction.id();
            if actual != expected {
                return Err(TransactionError::InvalidArgument(format!(
                    "hash mismatch: object says {}, content hashes to {}",
                    expected, actual
                )));
            }
        }
        Ok(transaction)
    }
}
