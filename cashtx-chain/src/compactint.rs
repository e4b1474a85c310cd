//! The Bitcoin variable-length integer encoding (1, 3, 5, or 9 byte forms).

use crate::{CashDeserialize, CashSerialize, SerializationError};
use byteorder::{LittleEndian, WriteBytesExt};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompactInt(u64);

impl CompactInt {
    pub fn new() -> CompactInt {
        CompactInt(0)
    }

    pub fn from(value: usize) -> CompactInt {
        CompactInt(value as u64)
    }

    pub fn value(&self) -> u64 {
        self.0
    }

    /// The encoded length of `value`, in bytes.
    pub fn size(value: usize) -> usize {
        if value < 0xfd {
            1
        } else if value <= 0xffff {
            3
        } else if value <= 0xffff_ffff {
            5
        } else {
            9
        }
    }
}

impl Default for CompactInt {
    fn default() -> Self {
        CompactInt::new()
    }
}

impl CashSerialize for CompactInt {
    fn cash_serialize<W>(&self, mut target: W) -> Result<(), std::io::Error>
    where
        W: std::io::Write,
    {
        if self.value() < 0xfd {
            target.write_all(&[self.value() as u8])
        } else if self.value() <= 0xffff {
            target.write_all(&[0xfd])?;
            target.write_u16::<LittleEndian>(self.value() as u16)
        } else if self.value() <= 0xffff_ffff {
            target.write_all(&[0xfe])?;
            target.write_u32::<LittleEndian>(self.value() as u32)
        } else {
            target.write_all(&[0xff])?;
            target.write_u64::<LittleEndian>(self.value())
        }
    }
}

impl CashDeserialize for CompactInt {
    fn cash_deserialize<R: std::io::Read>(mut target: R) -> Result<CompactInt, SerializationError> {
        let first = u8::cash_deserialize(&mut target)?;
        if first < 0xfd {
            Ok(CompactInt(first as u64))
        } else if first == 0xfd {
            Ok(CompactInt(u16::cash_deserialize(&mut target)? as u64))
        } else if first == 0xfe {
            Ok(CompactInt(u32::cash_deserialize(&mut target)? as u64))
        } else {
            Ok(CompactInt(u64::cash_deserialize(&mut target)?))
        }
    }
}
