use std::{convert::TryFrom, io};

use chrono::{DateTime, TimeZone, Utc};

use crate::serialization::{CashDeserialize, CashSerialize, SerializationError};

/// A transaction lock time.
///
/// The raw `u32` field splits into two domains: values below
/// [`LockTime::BLOCK_HEIGHT_LIMIT`] are block heights, everything at or
/// above it is a unix timestamp.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum LockTime {
    /// Unlocked once the chain reaches this height.
    Height(u32),
    /// Unlocked once the median past time passes this moment.
    Time(DateTime<Utc>),
}

impl LockTime {
    /// The boundary between the block-height and timestamp domains.
    pub const BLOCK_HEIGHT_LIMIT: u32 = 500_000_000;

    /// The smallest raw value interpreted as a timestamp.
    pub const MIN_TIMESTAMP: i64 = LockTime::BLOCK_HEIGHT_LIMIT as i64;

    /// The largest lock time the wire field can carry.
    pub const MAX_TIMESTAMP: i64 = u32::MAX as i64;

    /// The lock time new transactions carry: height zero, i.e. unlocked.
    pub fn unlocked() -> LockTime {
        LockTime::Height(0)
    }

    pub fn is_unlocked(&self) -> bool {
        matches!(self, LockTime::Height(0))
    }

    /// The raw wire value.
    pub fn raw_value(&self) -> u32 {
        match self {
            LockTime::Height(height) => *height,
            LockTime::Time(time) => {
                u32::try_from(time.timestamp()).expect("timestamp domain fits in u32")
            }
        }
    }
}

impl Default for LockTime {
    fn default() -> Self {
        LockTime::unlocked()
    }
}

impl CashSerialize for LockTime {
    fn cash_serialize<W: io::Write>(&self, writer: W) -> Result<(), io::Error> {
        self.raw_value().cash_serialize(writer)
    }
}

impl CashDeserialize for LockTime {
    fn cash_deserialize<R: io::Read>(reader: R) -> Result<Self, SerializationError> {
        let raw = u32::cash_deserialize(reader)?;
        if raw < LockTime::BLOCK_HEIGHT_LIMIT {
            Ok(LockTime::Height(raw))
        } else {
            Ok(LockTime::Time(Utc.timestamp(raw as i64, 0)))
        }
    }
}
