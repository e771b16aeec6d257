//! Typed key wrappers around JWKs
//!
//! PublicKey, PrivateKey and SecretKey validate the shape of the underlying
//! JWK on construction, so the rest of the library can rely on the material
//! being there.

use serde::{Deserialize, Serialize};

use crate::{
    CryptoError, JWK, KeyType, Params,
    error::Result,
    key::{CryptoKey, KeyKind, KeyMaterial, KeyUsage},
};

/// Public half of an asymmetric key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "JWK", into = "JWK")]
pub struct PublicKey {
    jwk: JWK,
}

impl PublicKey {
    pub fn new(jwk: JWK) -> Result<Self> {
        if matches!(jwk.params, Params::Oct(_)) {
            return Err(CryptoError::KeyError(
                "Symmetric material can't form a public key".into(),
            ));
        }
        if jwk.has_private_material() {
            return Err(CryptoError::KeyError(
                "Public key can't carry private material".into(),
            ));
        }
        Ok(PublicKey { jwk })
    }

    pub fn jwk(&self) -> &JWK {
        &self.jwk
    }

    pub fn into_jwk(self) -> JWK {
        self.jwk
    }

    pub fn key_id(&self) -> Option<&str> {
        self.jwk.key_id.as_deref()
    }

    pub fn set_key_id(&mut self, key_id: impl Into<String>) {
        self.jwk.key_id = Some(key_id.into());
    }

    pub fn key_type(&self) -> KeyType {
        self.jwk.key_type()
    }

    pub fn algorithm(&self) -> Result<String> {
        self.jwk.signature_algorithm()
    }

    pub fn thumbprint(&self) -> String {
        self.jwk.thumbprint()
    }

    /// Handle for routing this key through a provider
    pub fn to_crypto_key(&self, usages: &[KeyUsage]) -> Result<CryptoKey> {
        Ok(CryptoKey::new(
            self.algorithm()?,
            KeyKind::Public,
            true,
            usages.to_vec(),
            KeyMaterial::Jwk(self.jwk.clone()),
        ))
    }
}

impl TryFrom<JWK> for PublicKey {
    type Error = CryptoError;

    fn try_from(jwk: JWK) -> Result<Self> {
        PublicKey::new(jwk)
    }
}

impl From<PublicKey> for JWK {
    fn from(key: PublicKey) -> JWK {
        key.jwk
    }
}

/// Private half of an asymmetric key. The public half is computed from it,
/// never stored separately.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "JWK", into = "JWK")]
pub struct PrivateKey {
    jwk: JWK,
}

impl PrivateKey {
    pub fn new(jwk: JWK) -> Result<Self> {
        if matches!(jwk.params, Params::Oct(_)) {
            return Err(CryptoError::KeyError(
                "Symmetric material can't form a private key".into(),
            ));
        }
        if !jwk.has_private_material() {
            return Err(CryptoError::KeyError(
                "Private key is missing the d parameter".into(),
            ));
        }
        Ok(PrivateKey { jwk })
    }

    pub fn jwk(&self) -> &JWK {
        &self.jwk
    }

    pub fn into_jwk(self) -> JWK {
        self.jwk
    }

    pub fn key_id(&self) -> Option<&str> {
        self.jwk.key_id.as_deref()
    }

    pub fn set_key_id(&mut self, key_id: impl Into<String>) {
        self.jwk.key_id = Some(key_id.into());
    }

    pub fn key_type(&self) -> KeyType {
        self.jwk.key_type()
    }

    pub fn algorithm(&self) -> Result<String> {
        self.jwk.signature_algorithm()
    }

    /// Corresponding public key, derived from the embedded coordinates
    pub fn public_key(&self) -> Result<PublicKey> {
        PublicKey::new(self.jwk.public_only()?)
    }

    pub fn to_crypto_key(&self, usages: &[KeyUsage]) -> Result<CryptoKey> {
        Ok(CryptoKey::new(
            self.algorithm()?,
            KeyKind::Private,
            true,
            usages.to_vec(),
            KeyMaterial::Jwk(self.jwk.clone()),
        ))
    }
}

impl TryFrom<JWK> for PrivateKey {
    type Error = CryptoError;

    fn try_from(jwk: JWK) -> Result<Self> {
        PrivateKey::new(jwk)
    }
}

impl From<PrivateKey> for JWK {
    fn from(key: PrivateKey) -> JWK {
        key.jwk
    }
}

/// Symmetric key (`kty: oct`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "JWK", into = "JWK")]
pub struct SecretKey {
    jwk: JWK,
}

impl SecretKey {
    pub fn new(jwk: JWK) -> Result<Self> {
        if !matches!(jwk.params, Params::Oct(_)) {
            return Err(CryptoError::KeyError(
                "Secret keys must carry oct parameters".into(),
            ));
        }
        Ok(SecretKey { jwk })
    }

    pub fn jwk(&self) -> &JWK {
        &self.jwk
    }

    pub fn key_id(&self) -> Option<&str> {
        self.jwk.key_id.as_deref()
    }

    pub fn set_key_id(&mut self, key_id: impl Into<String>) {
        self.jwk.key_id = Some(key_id.into());
    }

    /// Secret keys don't have an inferable algorithm, so `alg` must be set
    pub fn algorithm(&self) -> Result<String> {
        self.jwk.signature_algorithm()
    }

    pub fn thumbprint(&self) -> String {
        self.jwk.thumbprint()
    }

    pub fn to_crypto_key(&self, usages: &[KeyUsage]) -> Result<CryptoKey> {
        Ok(CryptoKey::new(
            self.algorithm()?,
            KeyKind::Secret,
            true,
            usages.to_vec(),
            KeyMaterial::Jwk(self.jwk.clone()),
        ))
    }
}

impl TryFrom<JWK> for SecretKey {
    type Error = CryptoError;

    fn try_from(jwk: JWK) -> Result<Self> {
        SecretKey::new(jwk)
    }
}

impl From<SecretKey> for JWK {
    fn from(key: SecretKey) -> JWK {
        key.jwk
    }
}

/// Matched asymmetric key pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyPair {
    pub public_key: PublicKey,
    pub private_key: PrivateKey,
}

impl KeyPair {
    /// Builds a pair from a private key, computing the public half
    pub fn new(private_key: PrivateKey) -> Result<Self> {
        let public_key = private_key.public_key()?;
        Ok(KeyPair {
            public_key,
            private_key,
        })
    }

    /// Builds a pair from existing halves, checking they belong together
    pub fn from_parts(public_key: PublicKey, private_key: PrivateKey) -> Result<Self> {
        if public_key.thumbprint() != private_key.public_key()?.thumbprint() {
            return Err(CryptoError::KeyError(
                "Public and private keys don't belong to the same pair".into(),
            ));
        }
        Ok(KeyPair {
            public_key,
            private_key,
        })
    }

    /// Sets the same key id on both halves
    pub fn with_key_id(mut self, key_id: impl Into<String>) -> Self {
        let key_id = key_id.into();
        self.public_key.set_key_id(key_id.clone());
        self.private_key.set_key_id(key_id);
        self
    }
}
