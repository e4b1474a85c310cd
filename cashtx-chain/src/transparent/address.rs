//! Legacy Base58Check addresses.
//!
//! An address is a 20-byte hash plus one leading version byte that fixes
//! both the address kind (key hash vs script hash) and the network, with
//! the whole payload Base58Check-encoded. Addresses never appear on the
//! wire: they exist only as text, so this module implements the text codec
//! and the conversion into the lock script an address stands for.

use std::fmt;

use secp256k1::PublicKey;

#[cfg(test)]
use proptest::prelude::*;

use crate::{parameters::Network, serialization::SerializationError};

use super::keys::hash160;
use super::Script;

// Version bytes, one per (kind, network) pair.
const P2PKH_MAINNET: u8 = 0x00;
const P2PKH_TESTNET: u8 = 0x6f;
const P2SH_MAINNET: u8 = 0x05;
const P2SH_TESTNET: u8 = 0xc4;

/// A spendable destination in its human-readable form.
#[derive(Copy, Clone, Eq, PartialEq)]
pub enum Address {
    /// Pays the hash of a redeem script.
    PayToScriptHash {
        network: Network,
        script_hash: [u8; 20],
    },
    /// Pays the hash160 of a public key.
    PayToPublicKeyHash {
        network: Network,
        pub_key_hash: [u8; 20],
    },
}

impl Address {
    /// The address paying to a compressed public key.
    pub fn from_public_key(pubkey: &PublicKey, network: Network) -> Address {
        Address::PayToPublicKeyHash {
            network,
            pub_key_hash: hash160(&pubkey.serialize()),
        }
    }

    /// The address paying to the hash of `script`.
    pub fn from_redeem_script(script: &Script, network: Network) -> Address {
        Address::PayToScriptHash {
            network,
            script_hash: hash160(script.as_bytes()),
        }
    }

    /// The lock script that pays this address.
    pub fn lock_script(&self) -> Script {
        Script::pay_to_address(self)
    }

    fn parts(&self) -> (u8, &[u8; 20]) {
        match self {
            Address::PayToScriptHash {
                network: Network::Mainnet,
                script_hash,
            } => (P2SH_MAINNET, script_hash),
            Address::PayToScriptHash {
                script_hash, ..
            } => (P2SH_TESTNET, script_hash),
            Address::PayToPublicKeyHash {
                network: Network::Mainnet,
                pub_key_hash,
            } => (P2PKH_MAINNET, pub_key_hash),
            Address::PayToPublicKeyHash {
                pub_key_hash, ..
            } => (P2PKH_TESTNET, pub_key_hash),
        }
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let (version, hash) = self.parts();
        let mut payload = [0u8; 21];
        payload[0] = version;
        payload[1..].copy_from_slice(hash);
        f.write_str(&bs58::encode(payload).with_check().into_string())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut debug_struct = f.debug_struct("Address");
        match self {
            Address::PayToScriptHash {
                network,
                script_hash,
            } => debug_struct
                .field("network", network)
                .field("script_hash", &hex::encode(script_hash))
                .finish(),
            Address::PayToPublicKeyHash {
                network,
                pub_key_hash,
            } => debug_struct
                .field("network", network)
                .field("pub_key_hash", &hex::encode(pub_key_hash))
                .finish(),
        }
    }
}

impl std::str::FromStr for Address {
    type Err = SerializationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let payload = bs58::decode(s)
            .with_check(None)
            .into_vec()
            .map_err(|_| SerializationError::Parse("base58check decoding error"))?;
        let (version, hash) = match payload.split_first() {
            Some((version, hash)) if hash.len() == 20 => (*version, hash),
            _ => return Err(SerializationError::Parse("bad address payload length")),
        };
        let mut bytes = [0u8; 20];
        bytes.copy_from_slice(hash);
        match version {
            P2PKH_MAINNET => Ok(Address::PayToPublicKeyHash {
                network: Network::Mainnet,
                pub_key_hash: bytes,
            }),
            P2PKH_TESTNET => Ok(Address::PayToPublicKeyHash {
                network: Network::Testnet,
                pub_key_hash: bytes,
            }),
            P2SH_MAINNET => Ok(Address::PayToScriptHash {
                network: Network::Mainnet,
                script_hash: bytes,
            }),
            P2SH_TESTNET => Ok(Address::PayToScriptHash {
                network: Network::Testnet,
                script_hash: bytes,
            }),
            _ => Err(SerializationError::Parse("unknown address version byte")),
        }
    }
}

#[cfg(test)]
impl Arbitrary for Address {
    type Parameters = ();

    fn arbitrary_with(_args: Self::Parameters) -> Self::Strategy {
        (any::<Network>(), any::<[u8; 20]>(), any::<bool>())
            .prop_map(|(network, hash, is_script_hash)| {
                if is_script_hash {
                    Address::PayToScriptHash {
                        network,
                        script_hash: hash,
                    }
                } else {
                    Address::PayToPublicKeyHash {
                        network,
                        pub_key_hash: hash,
                    }
                }
            })
            .boxed()
    }

    type Strategy = BoxedStrategy<Self>;
}


#[cfg(test)]
proptest! {

    #[test]
    fn address_text_roundtrip(addr in any::<Address>()) {
        cashtx_test::init();

        let encoded = addr.to_string();
        let decoded: Address = encoded.parse().expect("own encoding should parse");

        prop_assert_eq![addr, decoded];
    }
}
