//! Key type enumeration

use std::fmt;

use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

use crate::CryptoError;

/// Known cryptographic key types
#[derive(Debug, Default, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Zeroize)]
pub enum KeyType {
    Ed25519,
    P256,
    Secp256k1,
    /// Symmetric octet sequence (`kty: oct`)
    Oct,
    #[default]
    Unknown,
}

impl KeyType {
    /// Default JOSE signature algorithm for keys of this type, if one exists
    pub fn signature_algorithm(&self) -> Option<&'static str> {
        match self {
            KeyType::Ed25519 => Some("EdDSA"),
            KeyType::P256 => Some("ES256"),
            KeyType::Secp256k1 => Some("ES256K"),
            KeyType::Oct | KeyType::Unknown => None,
        }
    }
}

impl TryFrom<&str> for KeyType {
    type Error = CryptoError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "Ed25519" => Ok(KeyType::Ed25519),
            "P-256" => Ok(KeyType::P256),
            "secp256k1" => Ok(KeyType::Secp256k1),
            "oct" => Ok(KeyType::Oct),
            _ => Err(CryptoError::UnsupportedKeyType(value.to_string())),
        }
    }
}

impl fmt::Display for KeyType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            KeyType::Ed25519 => write!(f, "Ed25519"),
            KeyType::P256 => write!(f, "P-256"),
            KeyType::Secp256k1 => write!(f, "secp256k1"),
            KeyType::Oct => write!(f, "oct"),
            KeyType::Unknown => write!(f, "Unknown"),
        }
    }
}
