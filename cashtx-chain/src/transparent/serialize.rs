//! Wire codec for outputs.
//!
//! The value is a little-endian `i64`; the script field is length-prefixed
//! and, for token-bearing outputs, starts with the encoded token prefix.

use std::io::{self, Read};

use super::{token, Output};
use crate::{
    amount::Amount,
    compactint::CompactInt,
    serialization::{CashDeserialize, CashSerialize, SerializationError},
    transparent::{Script, TokenData},
};

impl CashSerialize for Output {
    fn cash_serialize<W: io::Write>(&self, mut writer: W) -> Result<(), io::Error> {
        self.value.cash_serialize(&mut writer)?;
        match &self.token {
            Some(token) => {
                let combined = token.encoded_size() + self.script.0.len();
                CompactInt::from(combined).cash_serialize(&mut writer)?;
                token.cash_serialize(&mut writer)?;
                writer.write_all(&self.script.0)?;
            }
            None => self.script.cash_serialize(&mut writer)?,
        }
        Ok(())
    }
}

impl CashDeserialize for Output {
    fn cash_deserialize<R: io::Read>(mut reader: R) -> Result<Self, SerializationError> {
        let value = Amount::cash_deserialize(&mut reader)?;
        let len = CompactInt::cash_deserialize(&mut reader)?.value();
        let mut bytes = Vec::new();
        reader.take(len).read_to_end(&mut bytes)?;
        if bytes.len() as u64 != len {
            return Err(SerializationError::Parse("truncated output script"));
        }
        let (token, script) = match bytes.split_first() {
            Some((&token::PREFIX_TOKEN, rest)) => {
                let mut rest = rest;
                let token = TokenData::cash_deserialize(&mut rest)?;
                (Some(token), rest.to_vec())
            }
            _ => (None, bytes),
        };
        Ok(Output {
            value,
            script: Script(script),
            token,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::serialization::CashDeserializeInto;
    use crate::transaction;
    use crate::transparent::token::{Capability, Nft};

    #[test]
    fn plain_output_roundtrip() {
        cashtx_test::init();

        let output = Output::new(Amount::from_sat(50_000), Script::p2pkh_out(&[7; 20]));
        let bytes = output.cash_serialize_to_vec().expect("output serializes");
        assert_eq!(bytes.len(), output.len());

        let parsed: Output = bytes[..].cash_deserialize_into().expect("output parses");
        assert_eq!(parsed, output);
    }

    #[test]
    fn token_output_roundtrip() {
        cashtx_test::init();

        let token_data = TokenData {
            category: transaction::Hash([0xcd; 32]),
            amount: 42,
            nft: Some(Nft {
                capability: Capability::None,
                commitment: vec![9, 9],
            }),
        };
        let output = Output::with_token(
            Amount::from_sat(546),
            Script::p2pkh_out(&[7; 20]),
            token_data,
        );
        let bytes = output.cash_serialize_to_vec().expect("output serializes");
        assert_eq!(bytes.len(), output.len());
        // The script field leads with the token prefix.
        assert_eq!(bytes[9], token::PREFIX_TOKEN);

        let parsed: Output = bytes[..].cash_deserialize_into().expect("output parses");
        assert_eq!(parsed, output);
    }
}
