//! AES-256-GCM encryption provider (A256GCM)

use aes_gcm::{
    Aes256Gcm, Nonce,
    aead::{Aead, KeyInit, Payload},
};
use rand::{RngCore, rngs::OsRng};
use zeroize::Zeroizing;

use crate::{
    Algorithm, CryptoError, JWK,
    error::Result,
    key::{CryptoKey, KeyKind, KeyMaterial, KeyUsage},
    provider::Provider,
    providers::hmac::{oct_jwk, secret_bytes},
};

const KEY_BYTES: usize = 32;
const IV_BYTES: usize = 12;

fn cipher(key: &CryptoKey) -> Result<Aes256Gcm> {
    let secret = secret_bytes(key)?;
    if secret.len() != KEY_BYTES {
        return Err(CryptoError::KeyError(format!(
            "A256GCM needs a {KEY_BYTES}-byte key, got {}",
            secret.len()
        )));
    }
    Aes256Gcm::new_from_slice(&secret)
        .map_err(|e| CryptoError::KeyError(format!("A256GCM key isn't usable: {e}")))
}

fn iv_bytes(algorithm: &Algorithm) -> Result<Vec<u8>> {
    let iv = algorithm.require_bytes("iv")?;
    if iv.len() != IV_BYTES {
        return Err(CryptoError::InvalidParameter {
            parameter: "iv",
            reason: format!("A256GCM needs a {IV_BYTES}-byte iv, got {}", iv.len()),
        });
    }
    Ok(iv)
}

/// AES-256 in Galois/Counter mode. The ciphertext carries the
/// authentication tag appended.
pub struct AesGcmProvider;

impl Provider for AesGcmProvider {
    fn name(&self) -> &'static str {
        "A256GCM"
    }

    fn encrypt(&self, algorithm: &Algorithm, key: &CryptoKey, data: &[u8]) -> Result<Vec<u8>> {
        key.check_kind(KeyKind::Secret)?;
        let cipher = cipher(key)?;
        let iv = iv_bytes(algorithm)?;
        let aad = algorithm.param_bytes("aad")?.unwrap_or_default();

        cipher
            .encrypt(
                Nonce::from_slice(&iv),
                Payload {
                    msg: data,
                    aad: &aad,
                },
            )
            .map_err(|_| CryptoError::OperationFailed("AES-GCM encryption failed".into()))
    }

    fn decrypt(&self, algorithm: &Algorithm, key: &CryptoKey, data: &[u8]) -> Result<Vec<u8>> {
        key.check_kind(KeyKind::Secret)?;
        let cipher = cipher(key)?;
        let iv = iv_bytes(algorithm)?;
        let aad = algorithm.param_bytes("aad")?.unwrap_or_default();

        cipher
            .decrypt(
                Nonce::from_slice(&iv),
                Payload {
                    msg: data,
                    aad: &aad,
                },
            )
            .map_err(|_| CryptoError::OperationFailed("AES-GCM authentication failed".into()))
    }

    fn generate_key(
        &self,
        _algorithm: &Algorithm,
        extractable: bool,
        usages: &[KeyUsage],
    ) -> Result<CryptoKey> {
        let mut k = Zeroizing::new(vec![0u8; KEY_BYTES]);
        OsRng.fill_bytes(&mut k);

        Ok(CryptoKey::new(
            self.name(),
            KeyKind::Secret,
            extractable,
            usages.to_vec(),
            KeyMaterial::Jwk(oct_jwk(self.name(), &k)),
        ))
    }

    fn import_raw(
        &self,
        _algorithm: &Algorithm,
        data: &[u8],
        extractable: bool,
        usages: &[KeyUsage],
    ) -> Result<CryptoKey> {
        if data.len() != KEY_BYTES {
            return Err(CryptoError::KeyError(format!(
                "A256GCM needs a {KEY_BYTES}-byte key, got {}",
                data.len()
            )));
        }
        Ok(CryptoKey::new(
            self.name(),
            KeyKind::Secret,
            extractable,
            usages.to_vec(),
            KeyMaterial::Jwk(oct_jwk(self.name(), data)),
        ))
    }

    fn import_jwk(
        &self,
        _algorithm: &Algorithm,
        jwk: &JWK,
        extractable: bool,
        usages: &[KeyUsage],
    ) -> Result<CryptoKey> {
        let key = CryptoKey::new(
            self.name(),
            KeyKind::Secret,
            extractable,
            usages.to_vec(),
            KeyMaterial::Jwk(jwk.clone()),
        );

        let secret = secret_bytes(&key)?;
        if secret.len() != KEY_BYTES {
            return Err(CryptoError::KeyError(format!(
                "A256GCM needs a {KEY_BYTES}-byte key, got {}",
                secret.len()
            )));
        }
        Ok(key)
    }

    fn export_raw(&self, key: &CryptoKey) -> Result<Vec<u8>> {
        if !key.extractable {
            return Err(CryptoError::NotExtractable);
        }
        Ok(secret_bytes(key)?.to_vec())
    }

    fn export_jwk(&self, key: &CryptoKey) -> Result<JWK> {
        if !key.extractable {
            return Err(CryptoError::NotExtractable);
        }
        match key.material() {
            KeyMaterial::Jwk(jwk) => Ok(jwk.clone()),
            KeyMaterial::Raw(bytes) => Ok(oct_jwk(self.name(), bytes)),
        }
    }

    fn check_derived_key_params(&self, algorithm: &Algorithm) -> Result<()> {
        let length = algorithm
            .length()
            .ok_or_else(|| CryptoError::MissingParameter {
                algorithm: self.name().to_string(),
                parameter: "length",
            })?;
        if length != (KEY_BYTES as u64) * 8 {
            return Err(CryptoError::InvalidParameter {
                parameter: "length",
                reason: format!("A256GCM keys are 256 bits, got {length}"),
            });
        }
        Ok(())
    }
}
