//! Transparent value transfer: outputs, outpoints, and unspent-output
//! descriptors.
#![allow(clippy::unit_arg)]

mod address;
mod serialize;

pub mod keys;
pub mod script;
pub mod token;

pub use address::Address;
pub use script::Script;
pub use token::TokenData;

use crate::{amount::Amount, compactint::CompactInt, transaction};
use cash_serde_derive::{CashDeserialize, CashSerialize};

use crate::{CashDeserialize, CashSerialize, SerializationError};

#[cfg(any(test, feature = "proptest-impl"))]
use proptest_derive::Arbitrary;

#[cfg(any(test, feature = "proptest-impl"))]
mod arbitrary;

/// OutPoint
///
/// A particular transaction output reference.
#[derive(
    Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize, Hash, CashSerialize, CashDeserialize,
)]
#[cfg_attr(any(test, feature = "proptest-impl"), derive(Arbitrary))]
pub struct OutPoint {
    /// References the transaction that contains the UTXO being spent.
    pub hash: transaction::Hash,

    /// Identifies which UTXO from that transaction is referenced; the
    /// first output is 0, etc.
    pub index: u32,
}

impl OutPoint {
    #[inline]
    pub const fn len() -> usize {
        36
    }

    /// The outpoint of a coinbase input: an all-zero txid and the maximum
    /// index.
    pub fn is_null(&self) -> bool {
        self.hash.0 == [0u8; 32] && self.index == u32::MAX
    }
}

/// A transparent output of a transaction.
///
/// UTXOs are indivisible, discrete units of value which can only be
/// consumed in their entirety. Spending part of one means paying the
/// remainder back to yourself as change.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize, Hash)]
pub struct Output {
    /// Transaction value; `i64` on the wire.
    pub value: Amount,

    /// The lock script defines the conditions under which this output can
    /// be spent.
    pub script: Script,

    /// CashToken data, encoded inside the script field on the wire.
    pub token: Option<TokenData>,
}

impl Output {
    pub fn new(value: Amount, script: Script) -> Output {
        Output {
            value,
            script,
            token: None,
        }
    }

    pub fn with_token(value: Amount, script: Script, token: TokenData) -> Output {
        Output {
            value,
            script,
            token: Some(token),
        }
    }

    /// Returns the serialized length (in bytes) of this Output.
    pub fn len(&self) -> usize {
        8 + match &self.token {
            Some(token) => {
                let combined = token.encoded_size() + self.script.0.len();
                CompactInt::size(combined) + combined
            }
            None => self.script.serialized_size(),
        }
    }

    /// Whether the value is within the monetary range consensus accepts.
    pub fn has_valid_value(&self) -> bool {
        self.value.is_valid()
    }
}

/// A caller-supplied unspent output, normalized into the fields the
/// transaction builder consumes.
#[derive(Clone, Debug, PartialEq)]
pub struct UnspentOutput {
    /// The id of the transaction that created the output.
    pub txid: transaction::Hash,
    /// The output's position in that transaction.
    pub output_index: u32,
    /// The output's lock script.
    pub script: Script,
    /// The output's value.
    pub value: Amount,
    /// Token data attached to the output, if any.
    pub token: Option<TokenData>,
    /// An explicit sequence number for the spending input.
    pub sequence: Option<u32>,
    /// Escrow key material: the first key reclaims, the rest belong to the
    /// payment inputs.
    pub public_keys: Vec<secp256k1::PublicKey>,
}

impl UnspentOutput {
    pub fn new(
        txid: transaction::Hash,
        output_index: u32,
        script: Script,
        value: Amount,
    ) -> UnspentOutput {
        UnspentOutput {
            txid,
            output_index,
            script,
            value,
            token: None,
            sequence: None,
            public_keys: Vec::new(),
        }
    }

    pub fn outpoint(&self) -> OutPoint {
        OutPoint {
            hash: self.txid,
            index: self.output_index,
        }
    }

    /// The spent output this descriptor stands for.
    pub fn output(&self) -> Output {
        Output {
            value: self.value,
            script: self.script.clone(),
            token: self.token.clone(),
        }
    }
}
