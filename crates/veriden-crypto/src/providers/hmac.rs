//! HMAC message authentication providers (HS256, HS512)

use base64::{Engine, prelude::BASE64_URL_SAFE_NO_PAD};
use hmac::{Hmac, Mac};
use rand::{RngCore, rngs::OsRng};
use sha2::{Sha256, Sha512};
use zeroize::Zeroizing;

use crate::{
    Algorithm, CryptoError, JWK, OctParams, Params,
    error::Result,
    key::{CryptoKey, KeyKind, KeyMaterial, KeyUsage},
    provider::Provider,
};

type HmacSha256 = Hmac<Sha256>;
type HmacSha512 = Hmac<Sha512>;

#[derive(Debug, Clone, Copy, PartialEq)]
enum HmacHash {
    Sha256,
    Sha512,
}

pub(crate) fn secret_bytes(key: &CryptoKey) -> Result<Zeroizing<Vec<u8>>> {
    match key.material() {
        KeyMaterial::Raw(bytes) => Ok(Zeroizing::new(bytes.clone())),
        KeyMaterial::Jwk(jwk) => match &jwk.params {
            Params::Oct(params) => Ok(Zeroizing::new(
                BASE64_URL_SAFE_NO_PAD
                    .decode(&params.k)
                    .map_err(|e| CryptoError::Decoding(format!("Couldn't decode k: {e}")))?,
            )),
            _ => Err(CryptoError::KeyFormat(
                "Symmetric operations need an oct JWK".into(),
            )),
        },
    }
}

pub(crate) fn oct_jwk(algorithm_name: &str, k: &[u8]) -> JWK {
    let mut jwk = JWK::from_params(Params::Oct(OctParams {
        k: BASE64_URL_SAFE_NO_PAD.encode(k),
    }));
    jwk.algorithm = Some(algorithm_name.to_string());
    jwk
}

/// Keyed MAC over SHA-256 or SHA-512
pub struct HmacProvider {
    hash: HmacHash,
}

impl HmacProvider {
    pub fn sha256() -> Self {
        HmacProvider {
            hash: HmacHash::Sha256,
        }
    }

    pub fn sha512() -> Self {
        HmacProvider {
            hash: HmacHash::Sha512,
        }
    }

    fn key_length(&self) -> usize {
        match self.hash {
            HmacHash::Sha256 => 32,
            HmacHash::Sha512 => 64,
        }
    }
}

impl Provider for HmacProvider {
    fn name(&self) -> &'static str {
        match self.hash {
            HmacHash::Sha256 => "HS256",
            HmacHash::Sha512 => "HS512",
        }
    }

    fn sign(&self, _algorithm: &Algorithm, key: &CryptoKey, data: &[u8]) -> Result<Vec<u8>> {
        key.check_kind(KeyKind::Secret)?;
        let secret = secret_bytes(key)?;

        let tag = match self.hash {
            HmacHash::Sha256 => {
                let mut mac = HmacSha256::new_from_slice(&secret)
                    .map_err(|e| CryptoError::KeyError(format!("HMAC key isn't usable: {e}")))?;
                mac.update(data);
                mac.finalize().into_bytes().to_vec()
            }
            HmacHash::Sha512 => {
                let mut mac = HmacSha512::new_from_slice(&secret)
                    .map_err(|e| CryptoError::KeyError(format!("HMAC key isn't usable: {e}")))?;
                mac.update(data);
                mac.finalize().into_bytes().to_vec()
            }
        };
        Ok(tag)
    }

    fn verify(
        &self,
        _algorithm: &Algorithm,
        key: &CryptoKey,
        signature: &[u8],
        data: &[u8],
    ) -> Result<bool> {
        key.check_kind(KeyKind::Secret)?;
        let secret = secret_bytes(key)?;

        // verify_slice compares in constant time
        let ok = match self.hash {
            HmacHash::Sha256 => {
                let mut mac = HmacSha256::new_from_slice(&secret)
                    .map_err(|e| CryptoError::KeyError(format!("HMAC key isn't usable: {e}")))?;
                mac.update(data);
                mac.verify_slice(signature).is_ok()
            }
            HmacHash::Sha512 => {
                let mut mac = HmacSha512::new_from_slice(&secret)
                    .map_err(|e| CryptoError::KeyError(format!("HMAC key isn't usable: {e}")))?;
                mac.update(data);
                mac.verify_slice(signature).is_ok()
            }
        };
        Ok(ok)
    }

    fn generate_key(
        &self,
        _algorithm: &Algorithm,
        extractable: bool,
        usages: &[KeyUsage],
    ) -> Result<CryptoKey> {
        let mut k = Zeroizing::new(vec![0u8; self.key_length()]);
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
        if data.is_empty() {
            return Err(CryptoError::KeyError("HMAC key can't be empty".into()));
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
        if !matches!(jwk.params, Params::Oct(_)) {
            return Err(CryptoError::KeyFormat("Expected an oct JWK".into()));
        }
        if let Some(alg) = &jwk.algorithm
            && !alg.eq_ignore_ascii_case(self.name())
        {
            return Err(CryptoError::KeyFormat(format!(
                "JWK declares algorithm {alg}, expected {}",
                self.name()
            )));
        }

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
        if length == 0 || length % 8 != 0 {
            return Err(CryptoError::InvalidParameter {
                parameter: "length",
                reason: format!("HMAC key length must be a positive multiple of 8 bits, got {length}"),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secret_key(provider: &HmacProvider, k: &[u8]) -> CryptoKey {
        provider
            .import_raw(
                &Algorithm::new(provider.name()),
                k,
                true,
                &[KeyUsage::Sign, KeyUsage::Verify],
            )
            .unwrap()
    }

    #[test]
    fn hs512_matches_known_vector() {
        let provider = HmacProvider::sha512();
        let key = secret_key(&provider, &[1u8; 32]);

        let tag = provider
            .sign(&Algorithm::new("HS512"), &key, b"did:example:persona")
            .unwrap();

        assert_eq!(
            BASE64_URL_SAFE_NO_PAD.encode(&tag),
            "FT8aK3BGXiL5jNFZa-E0_vOgRg0tWGCoojzYbdVVPRs42qhh7NE-mOzTsYix9yaxJLjF3kdrRFfLwHsr1BuFjg"
        );
    }

    #[test]
    fn verify_detects_tampering() {
        let provider = HmacProvider::sha256();
        let key = secret_key(&provider, b"0123456789abcdef0123456789abcdef");
        let alg = Algorithm::new("HS256");

        let mut tag = provider.sign(&alg, &key, b"data").unwrap();
        assert!(provider.verify(&alg, &key, &tag, b"data").unwrap());

        tag[0] ^= 0x01;
        assert!(!provider.verify(&alg, &key, &tag, b"data").unwrap());
    }

    #[test]
    fn generated_keys_match_the_hash_width() {
        let provider = HmacProvider::sha256();
        let key = provider
            .generate_key(&Algorithm::new("HS256"), true, &[KeyUsage::Sign])
            .unwrap();
        assert_eq!(provider.export_raw(&key).unwrap().len(), 32);
    }

    #[test]
    fn derived_key_length_must_be_whole_bytes() {
        let provider = HmacProvider::sha256();
        assert!(provider
            .check_derived_key_params(&Algorithm::new("HS256").with_param("length", 256))
            .is_ok());
        assert!(matches!(
            provider.check_derived_key_params(&Algorithm::new("HS256").with_param("length", 100)),
            Err(CryptoError::InvalidParameter { .. })
        ));
        assert!(matches!(
            provider.check_derived_key_params(&Algorithm::new("HS256")),
            Err(CryptoError::MissingParameter { .. })
        ));
    }
}
