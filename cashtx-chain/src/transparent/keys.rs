//! Private keys and the hashing used to reference public keys.

use ripemd160::{Digest, Ripemd160};
use secp256k1::{All, PublicKey, Secp256k1, SecretKey};
use sha2::{Digest as Sha2Digest, Sha256};

use crate::parameters::Network;
use crate::serialization::SerializationError;

lazy_static::lazy_static! {
    /// The shared signing/verification context.
    pub static ref SECP256K1: Secp256k1<All> = Secp256k1::new();
}

/// RIPEMD160(SHA256(data)), the 20-byte hash lock scripts commit to.
pub fn hash160(data: &[u8]) -> [u8; 20] {
    let sha = Sha256::digest(data);
    let ripe = Ripemd160::digest(&sha);
    let mut hash = [0u8; 20];
    hash.copy_from_slice(&ripe);
    hash
}

/// WIF version bytes.
mod magics {
    pub const MAINNET: u8 = 0x80;
    pub const TESTNET: u8 = 0xef;
}

/// A secp256k1 secret key together with the network it belongs to.
///
/// Public keys are always handled in compressed form.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PrivateKey {
    secret: SecretKey,
    pub network: Network,
}

impl PrivateKey {
    pub fn new(secret: SecretKey, network: Network) -> PrivateKey {
        PrivateKey { secret, network }
    }

    pub fn from_slice(data: &[u8], network: Network) -> Result<PrivateKey, SerializationError> {
        let secret = SecretKey::from_slice(data)
            .map_err(|_| SerializationError::Parse("invalid secret key"))?;
        Ok(PrivateKey { secret, network })
    }

    /// Parses a base58check WIF string; the trailing 0x01 compression marker
    /// is accepted and ignored.
    pub fn from_wif(wif: &str) -> Result<PrivateKey, SerializationError> {
        let bytes = bs58::decode(wif)
            .with_check(None)
            .into_vec()
            .map_err(|_| SerializationError::Parse("WIF decoding error"))?;
        let network = match bytes.first() {
            Some(&magics::MAINNET) => Network::Mainnet,
            Some(&magics::TESTNET) => Network::Testnet,
            _ => return Err(SerializationError::Parse("bad WIF version byte")),
        };
        let payload = match bytes.len() {
            33 => &bytes[1..33],
            34 if bytes[33] == 0x01 => &bytes[1..33],
            _ => return Err(SerializationError::Parse("bad WIF payload length")),
        };
        PrivateKey::from_slice(payload, network)
    }

    pub fn public_key(&self) -> PublicKey {
        PublicKey::from_secret_key(&SECP256K1, &self.secret)
    }

    /// hash160 of the compressed public key.
    pub fn public_key_hash(&self) -> [u8; 20] {
        hash160(&self.public_key().serialize())
    }

    pub(crate) fn secret_key(&self) -> &SecretKey {
        &self.secret
    }
}
