//! HKDF-SHA256 key derivation provider
//!
//! The derive source for the registry's deriveKey pipeline. HKDF keys can
//! only derive; they never sign or export.

use hkdf::Hkdf;
use sha2::Sha256;

use crate::{
    Algorithm, CryptoError,
    error::Result,
    key::{CryptoKey, KeyKind, KeyMaterial, KeyUsage},
    provider::Provider,
    providers::hmac::secret_bytes,
};

pub struct HkdfProvider;

impl Provider for HkdfProvider {
    fn name(&self) -> &'static str {
        "HKDF"
    }

    fn derive_bits(
        &self,
        algorithm: &Algorithm,
        base_key: &CryptoKey,
        length: u64,
    ) -> Result<Vec<u8>> {
        base_key.check_kind(KeyKind::Secret)?;
        if length == 0 || length % 8 != 0 {
            return Err(CryptoError::InvalidParameter {
                parameter: "length",
                reason: format!("derived length must be a positive multiple of 8 bits, got {length}"),
            });
        }

        let ikm = secret_bytes(base_key)?;
        let salt = algorithm.param_bytes("salt")?;
        let info = algorithm.param_bytes("info")?.unwrap_or_default();

        let hk = Hkdf::<Sha256>::new(salt.as_deref(), &ikm);
        let mut okm = vec![0u8; (length / 8) as usize];
        hk.expand(&info, &mut okm)
            .map_err(|_| CryptoError::InvalidParameter {
                parameter: "length",
                reason: format!("{length} bits is more than HKDF-SHA256 can expand"),
            })?;
        Ok(okm)
    }

    fn import_raw(
        &self,
        _algorithm: &Algorithm,
        data: &[u8],
        extractable: bool,
        usages: &[KeyUsage],
    ) -> Result<CryptoKey> {
        if data.is_empty() {
            return Err(CryptoError::KeyError("HKDF input keying material can't be empty".into()));
        }
        Ok(CryptoKey::new(
            self.name(),
            KeyKind::Secret,
            extractable,
            usages.to_vec(),
            KeyMaterial::Raw(data.to_vec()),
        ))
    }

    fn import_jwk(
        &self,
        _algorithm: &Algorithm,
        jwk: &crate::JWK,
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
        secret_bytes(&key)?;
        Ok(key)
    }
}
