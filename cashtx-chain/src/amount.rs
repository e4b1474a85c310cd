//! Monetary amounts in base units ("satoshis").

use std::iter::Sum;

use crate::{CashDeserialize, CashSerialize, SerializationError};

/// Base units per coin.
pub const COIN: i64 = 100_000_000;

/// The network money cap: no output value, and no sum of output values, may
/// exceed this.
pub const MAX_MONEY: i64 = 21_000_000 * COIN;

/// A transaction amount in base units.
///
/// Stored as the wire's `i64`, so out-of-range values read from untrusted
/// serializations are representable; [`Amount::is_valid`] is the predicate
/// consensus checks use before trusting one.
#[derive(
    Clone, Copy, Debug, Default, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize,
)]
pub struct Amount(i64);

impl Amount {
    pub const ZERO: Amount = Amount(0);

    /// Wraps a raw satoshi value, valid or not.
    pub const fn from_sat(sat: i64) -> Amount {
        Amount(sat)
    }

    pub const fn as_sat(self) -> i64 {
        self.0
    }

    /// An amount is valid when it lies in `[0, MAX_MONEY]`.
    pub const fn is_valid(self) -> bool {
        0 <= self.0 && self.0 <= MAX_MONEY
    }

    pub fn checked_add(self, rhs: Amount) -> Option<Amount> {
        self.0.checked_add(rhs.0).map(Amount)
    }

    pub fn checked_sub(self, rhs: Amount) -> Option<Amount> {
        self.0.checked_sub(rhs.0).map(Amount)
    }
}

impl std::fmt::Display for Amount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} sat", self.0)
    }
}

/// Widening sum; use when intermediate totals may exceed `i64`.
impl Sum<Amount> for i128 {
    fn sum<I: Iterator<Item = Amount>>(iter: I) -> i128 {
        iter.map(|amount| amount.0 as i128).sum()
    }
}

impl CashSerialize for Amount {
    fn cash_serialize<W: std::io::Write>(&self, target: W) -> Result<(), std::io::Error> {
        self.0.cash_serialize(target)
    }
}

impl CashDeserialize for Amount {
    fn cash_deserialize<R: std::io::Read>(reader: R) -> Result<Self, SerializationError> {
        Ok(Amount(i64::cash_deserialize(reader)?))
    }
}
