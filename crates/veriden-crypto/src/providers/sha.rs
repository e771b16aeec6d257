//! SHA-2 digest providers

use sha2::{Digest, Sha256, Sha512};

use crate::{Algorithm, error::Result, provider::Provider};

#[derive(Debug, Clone, Copy, PartialEq)]
enum ShaHash {
    Sha256,
    Sha512,
}

pub struct ShaProvider {
    hash: ShaHash,
}

impl ShaProvider {
    pub fn sha256() -> Self {
        ShaProvider {
            hash: ShaHash::Sha256,
        }
    }

    pub fn sha512() -> Self {
        ShaProvider {
            hash: ShaHash::Sha512,
        }
    }
}

impl Provider for ShaProvider {
    fn name(&self) -> &'static str {
        match self.hash {
            ShaHash::Sha256 => "SHA-256",
            ShaHash::Sha512 => "SHA-512",
        }
    }

    fn digest(&self, _algorithm: &Algorithm, data: &[u8]) -> Result<Vec<u8>> {
        let digest = match self.hash {
            ShaHash::Sha256 => Sha256::digest(data).to_vec(),
            ShaHash::Sha512 => Sha512::digest(data).to_vec(),
        };
        Ok(digest)
    }
}

#[cfg(test)]
mod tests {
    use base64::{Engine, prelude::BASE64_URL_SAFE_NO_PAD};

    use super::*;

    #[test]
    fn sha256_matches_known_vector() {
        let digest = ShaProvider::sha256()
            .digest(&Algorithm::new("SHA-256"), b"veriden")
            .unwrap();
        assert_eq!(
            BASE64_URL_SAFE_NO_PAD.encode(&digest),
            "AjJShR1_s3BpY76otmymSPEqmoL9PG8V-fnkmNhv7mw"
        );
    }

    #[test]
    fn sha512_matches_known_vector() {
        let digest = ShaProvider::sha512()
            .digest(&Algorithm::new("SHA-512"), b"veriden")
            .unwrap();
        assert_eq!(digest.len(), 64);
        assert_eq!(
            BASE64_URL_SAFE_NO_PAD.encode(&digest[..16]),
            "zMNRbq-0QxMwBzhI_J29Tg"
        );
    }

    #[test]
    fn digest_providers_do_not_sign() {
        let provider = ShaProvider::sha256();
        let err = provider
            .sign(
                &Algorithm::new("SHA-256"),
                &crate::CryptoKey::new(
                    "SHA-256",
                    crate::KeyKind::Secret,
                    true,
                    vec![crate::KeyUsage::Sign],
                    crate::KeyMaterial::Raw(vec![0u8; 32]),
                ),
                b"data",
            )
            .unwrap_err();
        assert!(matches!(err, crate::CryptoError::UnsupportedOperation { .. }));
    }
}
