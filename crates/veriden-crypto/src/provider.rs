//! The provider contract for pluggable cryptographic algorithms

use crate::{
    Algorithm, CryptoError, JWK,
    error::Result,
    key::{CryptoKey, CryptoKeyPair, KeyUsage},
};

/// Key serialization formats understood by import and export
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyFormat {
    Raw,
    Jwk,
}

/// One cryptographic algorithm implementation.
///
/// Every operation has a default body that fails with an explicit
/// "unsupported" error, so a provider only implements what its algorithm
/// actually does. Registration and lookup are case-insensitive on `name()`.
pub trait Provider: Send + Sync {
    /// Canonical algorithm name in its JOSE spelling (e.g. "ES256K")
    fn name(&self) -> &'static str;

    fn encrypt(&self, algorithm: &Algorithm, key: &CryptoKey, data: &[u8]) -> Result<Vec<u8>> {
        let _ = (algorithm, key, data);
        Err(self.unsupported("encrypt"))
    }

    fn decrypt(&self, algorithm: &Algorithm, key: &CryptoKey, data: &[u8]) -> Result<Vec<u8>> {
        let _ = (algorithm, key, data);
        Err(self.unsupported("decrypt"))
    }

    fn sign(&self, algorithm: &Algorithm, key: &CryptoKey, data: &[u8]) -> Result<Vec<u8>> {
        let _ = (algorithm, key, data);
        Err(self.unsupported("sign"))
    }

    /// Checks a signature. A well-formed but wrong signature is `Ok(false)`,
    /// not an error.
    fn verify(
        &self,
        algorithm: &Algorithm,
        key: &CryptoKey,
        signature: &[u8],
        data: &[u8],
    ) -> Result<bool> {
        let _ = (algorithm, key, signature, data);
        Err(self.unsupported("verify"))
    }

    fn digest(&self, algorithm: &Algorithm, data: &[u8]) -> Result<Vec<u8>> {
        let _ = (algorithm, data);
        Err(self.unsupported("digest"))
    }

    fn generate_key(
        &self,
        algorithm: &Algorithm,
        extractable: bool,
        usages: &[KeyUsage],
    ) -> Result<CryptoKey> {
        let _ = (algorithm, extractable, usages);
        Err(self.unsupported("generateKey"))
    }

    fn generate_key_pair(
        &self,
        algorithm: &Algorithm,
        extractable: bool,
        usages: &[KeyUsage],
    ) -> Result<CryptoKeyPair> {
        let _ = (algorithm, extractable, usages);
        Err(self.unsupported("generateKey"))
    }

    fn derive_bits(&self, algorithm: &Algorithm, base_key: &CryptoKey, length: u64) -> Result<Vec<u8>> {
        let _ = (algorithm, base_key, length);
        Err(self.unsupported("deriveBits"))
    }

    fn import_raw(
        &self,
        algorithm: &Algorithm,
        data: &[u8],
        extractable: bool,
        usages: &[KeyUsage],
    ) -> Result<CryptoKey> {
        let _ = (algorithm, data, extractable, usages);
        Err(self.unsupported("importKey"))
    }

    fn import_jwk(
        &self,
        algorithm: &Algorithm,
        jwk: &JWK,
        extractable: bool,
        usages: &[KeyUsage],
    ) -> Result<CryptoKey> {
        let _ = (algorithm, jwk, extractable, usages);
        Err(self.unsupported("importKey"))
    }

    fn export_raw(&self, key: &CryptoKey) -> Result<Vec<u8>> {
        let _ = key;
        Err(self.unsupported("exportKey"))
    }

    fn export_jwk(&self, key: &CryptoKey) -> Result<JWK> {
        let _ = key;
        Err(self.unsupported("exportKey"))
    }

    /// Validates derived-key parameters before a derive operation targets
    /// this algorithm (e.g. a required `length`)
    fn check_derived_key_params(&self, algorithm: &Algorithm) -> Result<()> {
        let _ = algorithm;
        Err(self.unsupported("deriveKey target"))
    }

    fn unsupported(&self, operation: &str) -> CryptoError {
        CryptoError::UnsupportedOperation {
            algorithm: self.name().to_string(),
            operation: operation.to_string(),
        }
    }
}
