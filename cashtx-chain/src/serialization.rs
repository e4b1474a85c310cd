//! Consensus-critical serialization.
//!
//! This module contains the `CashSerialize` and `CashDeserialize` traits,
//! analogs of the Serde `Serialize` and `Deserialize` traits but intended for
//! the consensus-critical wire formats of Bitcoin-Cash-family chains, plus
//! impls for the primitive types those formats are built from (little-endian
//! fixed-width integers, byte arrays, compact-length-prefixed vectors).

mod deserialize;
mod error;

pub mod sha256d;

use chrono::{DateTime, Utc};
use std::convert::TryFrom;

pub use deserialize::{CashDeserialize, CashDeserializeInto};
pub use error::SerializationError;

use crate::compactint::CompactInt;
use byteorder::{LittleEndian, WriteBytesExt};

pub trait CashSerialize {
    fn cash_serialize<W: std::io::Write>(&self, target: W) -> Result<(), std::io::Error>;

    fn cash_serialize_to_vec(&self) -> Result<Vec<u8>, std::io::Error> {
        let mut data = Vec::new();
        self.cash_serialize(&mut data)?;
        Ok(data)
    }
}

impl CashSerialize for bool {
    fn cash_serialize<W>(&self, mut target: W) -> Result<(), std::io::Error>
    where
        W: std::io::Write,
    {
        target.write_all(&[*self as u8])
    }
}

impl CashSerialize for &u8 {
    fn cash_serialize<W>(&self, mut target: W) -> Result<(), std::io::Error>
    where
        W: std::io::Write,
    {
        target.write_all(&[*(*self)])
    }
}

impl CashSerialize for u16 {
    fn cash_serialize<W>(&self, mut target: W) -> Result<(), std::io::Error>
    where
        W: std::io::Write,
    {
        target.write_u16::<LittleEndian>(*self)
    }
}

impl CashSerialize for u32 {
    fn cash_serialize<W>(&self, mut target: W) -> Result<(), std::io::Error>
    where
        W: std::io::Write,
    {
        target.write_u32::<LittleEndian>(*self)
    }
}

impl CashSerialize for u64 {
    fn cash_serialize<W>(&self, mut target: W) -> Result<(), std::io::Error>
    where
        W: std::io::Write,
    {
        target.write_u64::<LittleEndian>(*self)
    }
}

impl CashSerialize for i32 {
    fn cash_serialize<W>(&self, mut target: W) -> Result<(), std::io::Error>
    where
        W: std::io::Write,
    {
        target.write_i32::<LittleEndian>(*self)
    }
}

impl CashSerialize for i64 {
    fn cash_serialize<W>(&self, mut target: W) -> Result<(), std::io::Error>
    where
        W: std::io::Write,
    {
        target.write_i64::<LittleEndian>(*self)
    }
}

/// Times on the wire are u32 unix seconds; values outside that range clamp.
impl CashSerialize for DateTime<Utc> {
    fn cash_serialize<W>(&self, mut target: W) -> Result<(), std::io::Error>
    where
        W: std::io::Write,
    {
        let time_u32 = match u32::try_from(self.timestamp()) {
            Ok(t) => t,
            Err(_) => std::u32::MAX,
        };
        target.write_u32::<LittleEndian>(time_u32)
    }
}

impl CashSerialize for &[u8] {
    fn cash_serialize<W>(&self, mut target: W) -> Result<(), std::io::Error>
    where
        W: std::io::Write,
    {
        target.write_all(self)
    }
}

impl CashSerialize for [u8; 4] {
    fn cash_serialize<W>(&self, mut target: W) -> Result<(), std::io::Error>
    where
        W: std::io::Write,
    {
        target.write_all(self)
    }
}

impl CashSerialize for [u8; 20] {
    fn cash_serialize<W>(&self, mut target: W) -> Result<(), std::io::Error>
    where
        W: std::io::Write,
    {
        target.write_all(self)
    }
}

impl CashSerialize for [u8; 32] {
    fn cash_serialize<W>(&self, mut target: W) -> Result<(), std::io::Error>
    where
        W: std::io::Write,
    {
        target.write_all(self)
    }
}

impl CashSerialize for Vec<u8> {
    fn cash_serialize<W>(&self, mut target: W) -> Result<(), std::io::Error>
    where
        W: std::io::Write,
    {
        CompactInt::from(self.len()).cash_serialize(&mut target)?;
        target.write_all(self)?;
        Ok(())
    }
}

impl<T> CashSerialize for Vec<T>
where
    T: CashSerialize,
{
    fn cash_serialize<W>(&self, mut target: W) -> Result<(), std::io::Error>
    where
        W: std::io::Write,
    {
        CompactInt::from(self.len()).cash_serialize(&mut target)?;
        for item in self.iter() {
            item.cash_serialize(&mut target)?
        }
        Ok(())
    }
}

impl<T: CashSerialize> CashSerialize for Option<T> {
    fn cash_serialize<W>(&self, mut target: W) -> Result<(), std::io::Error>
    where
        W: std::io::Write,
    {
        match self {
            Some(contents) => contents.cash_serialize(&mut target),
            None => Ok(()),
        }
    }
}
