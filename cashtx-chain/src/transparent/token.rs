//! CashToken data carried by transaction outputs.
//!
//! On the wire, token data rides inside the output's script field: a
//! `PREFIX_TOKEN` byte, the 32-byte category id, a structure bitfield, an
//! optional NFT commitment, and an optional fungible amount, followed by the
//! actual lock script.

use std::io::{self, Read};

use crate::{
    compactint::CompactInt,
    serialization::{CashDeserialize, CashSerialize, SerializationError},
    transaction,
};

/// Marks a token-carrying output script field.
pub const PREFIX_TOKEN: u8 = 0xef;

/// The largest representable fungible amount, for a single output and for a
/// category's total supply.
pub const MAX_FUNGIBLE_AMOUNT: u64 = i64::MAX as u64;

bitflags::bitflags! {
    /// The token-prefix structure bitfield. The low nibble carries the NFT
    /// capability and must stay clear here.
    struct Structure: u8 {
        const RESERVED = 0x80;
        const HAS_COMMITMENT_LENGTH = 0x40;
        const HAS_NFT = 0x20;
        const HAS_AMOUNT = 0x10;
    }
}

/// What a non-fungible token may do when spent.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Capability {
    /// The token can only be moved.
    None,
    /// The commitment may be rewritten when spent.
    Mutable,
    /// New tokens of the category may be created.
    Minting,
}

impl Capability {
    fn to_bits(self) -> u8 {
        match self {
            Capability::None => 0x00,
            Capability::Mutable => 0x01,
            Capability::Minting => 0x02,
        }
    }

    fn from_bits(bits: u8) -> Result<Capability, SerializationError> {
        match bits {
            0x00 => Ok(Capability::None),
            0x01 => Ok(Capability::Mutable),
            0x02 => Ok(Capability::Minting),
            _ => Err(SerializationError::Parse("invalid token capability")),
        }
    }
}

/// The non-fungible half of a token: a capability and a commitment blob.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct Nft {
    pub capability: Capability,
    pub commitment: Vec<u8>,
}

/// Token data attached to an output.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct TokenData {
    /// The category id: the txid of the category's genesis transaction,
    /// stored in wire byte order like any other txid.
    pub category: transaction::Hash,
    /// Fungible amount; zero when the output only carries an NFT.
    pub amount: u64,
    pub nft: Option<Nft>,
}

impl TokenData {
    fn structure(&self) -> Structure {
        let mut bits = Structure::empty();
        if self.amount > 0 {
            bits |= Structure::HAS_AMOUNT;
        }
        if let Some(nft) = &self.nft {
            bits |= Structure::HAS_NFT;
            if !nft.commitment.is_empty() {
                bits |= Structure::HAS_COMMITMENT_LENGTH;
            }
        }
        bits
    }

    /// The encoded length of the token prefix, in bytes.
    pub fn encoded_size(&self) -> usize {
        let mut size = 1 + 32 + 1;
        if let Some(nft) = &self.nft {
            if !nft.commitment.is_empty() {
                size += CompactInt::size(nft.commitment.len()) + nft.commitment.len();
            }
        }
        if self.amount > 0 {
            size += CompactInt::size(self.amount as usize);
        }
        size
    }
}

impl CashSerialize for TokenData {
    fn cash_serialize<W: io::Write>(&self, mut writer: W) -> Result<(), io::Error> {
        writer.write_all(&[PREFIX_TOKEN])?;
        self.category.0.cash_serialize(&mut writer)?;
        let capability = self
            .nft
            .as_ref()
            .map(|nft| nft.capability.to_bits())
            .unwrap_or(0);
        writer.write_all(&[self.structure().bits() | capability])?;
        if let Some(nft) = &self.nft {
            if !nft.commitment.is_empty() {
                nft.commitment.cash_serialize(&mut writer)?;
            }
        }
        if self.amount > 0 {
            CompactInt::from(self.amount as usize).cash_serialize(&mut writer)?;
        }
        Ok(())
    }
}

/// Reads the token prefix after the `PREFIX_TOKEN` byte has been consumed.
impl CashDeserialize for TokenData {
    fn cash_deserialize<R: Read>(mut reader: R) -> Result<Self, SerializationError> {
        let category = transaction::Hash(<[u8; 32]>::cash_deserialize(&mut reader)?);
        let bitfield = u8::cash_deserialize(&mut reader)?;
        let structure = Structure::from_bits(bitfield & 0xf0)
            .expect("masked high nibble always holds defined flags");
        let capability = Capability::from_bits(bitfield & 0x0f)?;

        if structure.contains(Structure::RESERVED) {
            return Err(SerializationError::Parse("reserved token bit set"));
        }
        if !structure.intersects(Structure::HAS_NFT | Structure::HAS_AMOUNT) {
            return Err(SerializationError::Parse("token prefix encodes no token"));
        }
        if !structure.contains(Structure::HAS_NFT) {
            if capability != Capability::None {
                return Err(SerializationError::Parse("capability without an NFT"));
            }
            if structure.contains(Structure::HAS_COMMITMENT_LENGTH) {
                return Err(SerializationError::Parse("commitment without an NFT"));
            }
        }

        let nft = if structure.contains(Structure::HAS_NFT) {
            let commitment = if structure.contains(Structure::HAS_COMMITMENT_LENGTH) {
                let commitment = <Vec<u8>>::cash_deserialize(&mut reader)?;
                if commitment.is_empty() {
                    return Err(SerializationError::Parse("empty token commitment"));
                }
                commitment
            } else {
                Vec::new()
            };
            Some(Nft {
                capability,
                commitment,
            })
        } else {
            None
        };

        let amount = if structure.contains(Structure::HAS_AMOUNT) {
            let amount = CompactInt::cash_deserialize(&mut reader)?.value();
            if amount == 0 || amount > MAX_FUNGIBLE_AMOUNT {
                return Err(SerializationError::Parse("token amount out of range"));
            }
            amount
        } else {
            0
        };

        Ok(TokenData {
            category,
            amount,
            nft,
        })
    }
}
