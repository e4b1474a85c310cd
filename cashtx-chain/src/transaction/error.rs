use thiserror::Error;

use crate::serialization::SerializationError;
use crate::transparent::Script;

use super::Hash;

/// Everything the transaction engine can reject.
///
/// Each variant carries enough context (indices, expected vs actual values)
/// to diagnose the failure without reading the engine's source.
#[derive(Error, Debug)]
pub enum TransactionError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("no transaction data")]
    NoData,

    #[error("invalid satoshi amount: {0}")]
    InvalidSatoshis(i64),

    #[error("a running total of output values exceeds the money cap")]
    InvalidOutputAmountSum,

    #[error("the configured fee of {expected} sat differs from the unspent value of {actual} sat")]
    FeeDifferent { expected: i64, actual: i64 },

    #[error("the unspent value of {fee} sat exceeds the safety bound of {max} sat; lower the fee or add a change address")]
    FeeTooLarge { fee: i64, max: i64 },

    #[error("the unspent value of {fee} sat is below the safety bound of {min} sat")]
    FeeTooSmall { fee: i64, min: i64 },

    #[error("the surplus above the fee bound needs a change address to return to")]
    ChangeAddressMissing,

    #[error("transaction pays a dust output below {threshold} sat at index {index}")]
    DustOutputs { index: usize, threshold: i64 },

    #[error("transaction is missing signatures")]
    MissingSignatures,

    #[error("input {0} has no attached output; associate its unspent output first")]
    MissingUtxoInfo(usize),

    #[error("unsupported script: {0:?}")]
    UnsupportedScript(Script),

    #[error("index {index} out of bounds for length {len}")]
    InvalidIndex { index: usize, len: usize },

    #[error("sorting function did not return a permutation of the original items")]
    InvalidSorting,

    #[error("lock time {0} falls in the block-height domain; use a height lock instead")]
    LockTimeTooEarly(i64),

    #[error("block height {0} falls in the timestamp domain; use a time lock instead")]
    BlockHeightTooHigh(u32),

    #[error("lock time {0} does not fit the 32-bit wire field")]
    NLockTimeOutOfRange(i64),

    #[error("signatures on this input cannot be verified")]
    UnableToVerifySignature,

    // Diagnostic failures reported by sanity verification.
    #[error("transaction has no inputs")]
    NoInputs,

    #[error("transaction has no outputs")]
    NoOutputs,

    #[error("serialized size {size} exceeds the {max} byte limit")]
    OversizedTransaction { size: usize, max: usize },

    #[error("inputs {first} and {second} spend the same outpoint")]
    DuplicateInput { first: usize, second: usize },

    #[error("coinbase script length {0} outside the accepted 2..=100 range")]
    CoinbaseScriptSize(usize),

    #[error("input {0} has a null outpoint but the transaction is not a coinbase")]
    NullInput(usize),

    // Token accounting violations.
    #[error("token outputs of category {category} send {sent} units but inputs provide {available}")]
    TokenAmountExceedsInputs {
        category: Hash,
        sent: u128,
        available: u128,
    },

    #[error("category {0} can only be minted by spending output 0 of its genesis transaction")]
    TokenGenesisInputIndex(Hash),

    #[error("minted amount for category {0} overflows the token amount cap")]
    TokenMintOverflow(Hash),

    #[error("no token input of category {category} permits the NFT output at index {index}")]
    TokenParentMissing { category: Hash, index: usize },

    #[error(transparent)]
    Serialization(#[from] SerializationError),
}
