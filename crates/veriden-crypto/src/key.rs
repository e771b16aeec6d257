//! Opaque key handles routed through algorithm providers

use std::fmt;

use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::{CryptoError, JWK, error::Result};

/// Whether a key is the public or private half of a pair, or a symmetric secret
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyKind {
    Public,
    Private,
    Secret,
}

impl fmt::Display for KeyKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            KeyKind::Public => write!(f, "public"),
            KeyKind::Private => write!(f, "private"),
            KeyKind::Secret => write!(f, "secret"),
        }
    }
}

/// Operations a key is allowed to perform. Spellings follow JWK `key_ops`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum KeyUsage {
    Encrypt,
    Decrypt,
    Sign,
    Verify,
    DeriveKey,
    DeriveBits,
    WrapKey,
    UnwrapKey,
}

impl fmt::Display for KeyUsage {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            KeyUsage::Encrypt => write!(f, "encrypt"),
            KeyUsage::Decrypt => write!(f, "decrypt"),
            KeyUsage::Sign => write!(f, "sign"),
            KeyUsage::Verify => write!(f, "verify"),
            KeyUsage::DeriveKey => write!(f, "deriveKey"),
            KeyUsage::DeriveBits => write!(f, "deriveBits"),
            KeyUsage::WrapKey => write!(f, "wrapKey"),
            KeyUsage::UnwrapKey => write!(f, "unwrapKey"),
        }
    }
}

/// Raw material backing a CryptoKey. Providers read this; everyone else goes
/// through export_key, which honors the extractable flag.
#[derive(Debug, Clone, Zeroize, ZeroizeOnDrop)]
pub enum KeyMaterial {
    Raw(Vec<u8>),
    Jwk(JWK),
}

/// Handle to key material bound to one algorithm, a set of allowed usages
/// and an extractability flag
#[derive(Debug, Clone)]
pub struct CryptoKey {
    pub algorithm: String,
    pub kind: KeyKind,
    pub extractable: bool,
    pub usages: Vec<KeyUsage>,
    material: KeyMaterial,
}

impl CryptoKey {
    pub fn new(
        algorithm: impl Into<String>,
        kind: KeyKind,
        extractable: bool,
        usages: Vec<KeyUsage>,
        material: KeyMaterial,
    ) -> Self {
        CryptoKey {
            algorithm: algorithm.into(),
            kind,
            extractable,
            usages,
            material,
        }
    }

    pub fn material(&self) -> &KeyMaterial {
        &self.material
    }

    /// Fails unless the key was created for the named algorithm
    /// (case-insensitive)
    pub fn check_algorithm(&self, name: &str) -> Result<()> {
        if self.algorithm.eq_ignore_ascii_case(name) {
            Ok(())
        } else {
            Err(CryptoError::UsageDenied(format!(
                "Key belongs to algorithm {} and can't be routed to {name}",
                self.algorithm
            )))
        }
    }

    /// Fails unless the key's declared usages include the requested one
    pub fn check_usage(&self, usage: KeyUsage) -> Result<()> {
        if self.usages.contains(&usage) {
            Ok(())
        } else {
            Err(CryptoError::UsageDenied(format!(
                "Key doesn't allow the {usage} operation"
            )))
        }
    }

    /// Fails unless the key is of the expected kind
    pub fn check_kind(&self, kind: KeyKind) -> Result<()> {
        if self.kind == kind {
            Ok(())
        } else {
            Err(CryptoError::UsageDenied(format!(
                "Operation needs a {kind} key, got a {} key",
                self.kind
            )))
        }
    }
}

/// Matched public and private key handles
#[derive(Debug, Clone)]
pub struct CryptoKeyPair {
    pub public_key: CryptoKey,
    pub private_key: CryptoKey,
}

/// Splits requested usages between the halves of a generated key pair
pub(crate) fn split_pair_usages(usages: &[KeyUsage]) -> (Vec<KeyUsage>, Vec<KeyUsage>) {
    let public = usages
        .iter()
        .copied()
        .filter(|u| matches!(u, KeyUsage::Verify | KeyUsage::Encrypt | KeyUsage::WrapKey))
        .collect();
    let private = usages
        .iter()
        .copied()
        .filter(|u| {
            matches!(
                u,
                KeyUsage::Sign
                    | KeyUsage::Decrypt
                    | KeyUsage::UnwrapKey
                    | KeyUsage::DeriveKey
                    | KeyUsage::DeriveBits
            )
        })
        .collect();
    (public, private)
}
