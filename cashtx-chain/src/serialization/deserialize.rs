use super::CompactInt;
use byteorder::{LittleEndian, ReadBytesExt};
use chrono::{DateTime, TimeZone, Utc};
use std::io;

use super::SerializationError;

type Result<R> = std::result::Result<R, SerializationError>;

pub trait CashDeserialize {
    fn cash_deserialize<R: io::Read>(reader: R) -> Result<Self>
    where
        Self: Sized;
}

/// Helper for deserializing more succinctly via type inference
pub trait CashDeserializeInto {
    /// Deserialize based on type inference
    fn cash_deserialize_into<T>(self) -> Result<T>
    where
        T: CashDeserialize;
}

impl<R: io::Read> CashDeserializeInto for R {
    fn cash_deserialize_into<T>(self) -> Result<T>
    where
        T: CashDeserialize,
    {
        T::cash_deserialize(self)
    }
}

impl CashDeserialize for bool {
    fn cash_deserialize<R: io::Read>(mut reader: R) -> Result<bool> {
        let value = reader.read_u8()?;
        match value {
            0 => Ok(false),
            1 => Ok(true),
            _ => Err(SerializationError::Parse("Invalid bool")),
        }
    }
}

impl CashDeserialize for u8 {
    fn cash_deserialize<R: io::Read>(mut reader: R) -> Result<u8> {
        Ok(reader.read_u8()?)
    }
}

impl CashDeserialize for u16 {
    fn cash_deserialize<R: io::Read>(mut reader: R) -> Result<u16> {
        Ok(reader.read_u16::<LittleEndian>()?)
    }
}

impl CashDeserialize for u32 {
    fn cash_deserialize<R: io::Read>(mut reader: R) -> Result<u32> {
        Ok(reader.read_u32::<LittleEndian>()?)
    }
}

impl CashDeserialize for u64 {
    fn cash_deserialize<R: io::Read>(mut reader: R) -> Result<u64> {
        Ok(reader.read_u64::<LittleEndian>()?)
    }
}

impl CashDeserialize for i32 {
    fn cash_deserialize<R: io::Read>(mut reader: R) -> Result<i32> {
        Ok(reader.read_i32::<LittleEndian>()?)
    }
}

impl CashDeserialize for i64 {
    fn cash_deserialize<R: io::Read>(mut reader: R) -> Result<i64> {
        Ok(reader.read_i64::<LittleEndian>()?)
    }
}

impl CashDeserialize for DateTime<Utc> {
    fn cash_deserialize<R: io::Read>(mut reader: R) -> Result<DateTime<Utc>> {
        Ok(Utc.timestamp(reader.read_u32::<LittleEndian>()? as i64, 0))
    }
}

impl<T> CashDeserialize for Vec<T>
where
    T: CashDeserialize,
{
    fn cash_deserialize<R: io::Read>(mut reader: R) -> Result<Vec<T>> {
        let len = CompactInt::cash_deserialize(&mut reader)?.value() as usize;
        // Limit preallocation since blind preallocation is a DOS vulnerability
        let blind_alloc_limit = 1024;
        let mut result: Vec<T> = Vec::with_capacity(std::cmp::min(len, blind_alloc_limit));
        for _ in 0..len {
            result.push(T::cash_deserialize(&mut reader)?);
        }
        Ok(result)
    }
}

impl<T: Sized + CashDeserialize> CashDeserialize for Option<T> {
    fn cash_deserialize<R: io::Read>(reader: R) -> Result<Option<T>> {
        Ok(Some(T::cash_deserialize(reader)?))
    }
}

// TODO: Replace when const generics stabilize
macro_rules! impl_deserializable_byte_array {
    ($size:expr) => {
        impl CashDeserialize for [u8; $size] {
            fn cash_deserialize<R: io::Read>(mut reader: R) -> Result<[u8; $size]> {
                let mut result = [0u8; $size];
                reader.read_exact(&mut result)?;
                Ok(result)
            }
        }
    };
}

impl_deserializable_byte_array!(4);
impl_deserializable_byte_array!(20);
impl_deserializable_byte_array!(32);
