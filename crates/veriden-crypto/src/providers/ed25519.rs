//! Ed25519 keys and the EdDSA signature provider

use base64::{Engine, prelude::BASE64_URL_SAFE_NO_PAD};
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use rand::rngs::OsRng;
use zeroize::Zeroizing;

use crate::{
    Algorithm, CryptoError, JWK, OKPParams, Params,
    error::Result,
    key::{CryptoKey, CryptoKeyPair, KeyKind, KeyMaterial, KeyUsage, split_pair_usages},
    provider::Provider,
};

const CURVE: &str = "Ed25519";

fn seed_array(bytes: &[u8]) -> Result<[u8; 32]> {
    bytes
        .try_into()
        .map_err(|_| CryptoError::KeyError("Ed25519 secret material must be 32 bytes".into()))
}

/// Generates an Ed25519 JWK, optionally from an existing 32-byte seed
pub fn jwk_from_secret(secret: Option<&[u8]>) -> Result<JWK> {
    let signing_key = match secret {
        Some(secret) => SigningKey::from_bytes(&seed_array(secret)?),
        None => SigningKey::generate(&mut OsRng),
    };

    let public_bytes = signing_key.verifying_key().to_bytes();

    Ok(JWK::from_params(Params::OKP(OKPParams {
        curve: CURVE.to_string(),
        x: BASE64_URL_SAFE_NO_PAD.encode(public_bytes),
        d: Some(BASE64_URL_SAFE_NO_PAD.encode(signing_key.to_bytes())),
    })))
}

/// Generates a public JWK from raw Ed25519 public key bytes
pub fn public_jwk(data: &[u8]) -> Result<JWK> {
    let array: [u8; 32] = data
        .try_into()
        .map_err(|_| CryptoError::KeyError("Ed25519 public key must be 32 bytes".into()))?;

    // Parse to confirm the bytes are a valid curve point
    VerifyingKey::from_bytes(&array)
        .map_err(|e| CryptoError::KeyError(format!("Ed25519 public key isn't valid: {e}")))?;

    Ok(JWK::from_params(Params::OKP(OKPParams {
        curve: CURVE.to_string(),
        x: BASE64_URL_SAFE_NO_PAD.encode(array),
        d: None,
    })))
}

fn curve_params(jwk: &JWK) -> Result<&OKPParams> {
    match &jwk.params {
        Params::OKP(params) if params.curve == CURVE => Ok(params),
        _ => Err(CryptoError::KeyFormat(
            "Key material isn't an Ed25519 JWK".into(),
        )),
    }
}

fn signing_key(key: &CryptoKey) -> Result<SigningKey> {
    match key.material() {
        KeyMaterial::Raw(bytes) => Ok(SigningKey::from_bytes(&seed_array(bytes)?)),
        KeyMaterial::Jwk(jwk) => {
            let params = curve_params(jwk)?;
            let d = params
                .d
                .as_ref()
                .ok_or_else(|| CryptoError::KeyError("Key has no private material".into()))?;
            let d = Zeroizing::new(
                BASE64_URL_SAFE_NO_PAD
                    .decode(d)
                    .map_err(|e| CryptoError::Decoding(format!("Couldn't decode d: {e}")))?,
            );
            Ok(SigningKey::from_bytes(&seed_array(&d)?))
        }
    }
}

fn verifying_key(key: &CryptoKey) -> Result<VerifyingKey> {
    let from_bytes = |bytes: &[u8]| {
        VerifyingKey::from_bytes(&seed_array(bytes)?)
            .map_err(|e| CryptoError::KeyError(format!("Ed25519 public key isn't valid: {e}")))
    };

    match key.material() {
        KeyMaterial::Raw(bytes) => from_bytes(bytes),
        KeyMaterial::Jwk(jwk) => {
            let params = curve_params(jwk)?;
            let x = BASE64_URL_SAFE_NO_PAD
                .decode(&params.x)
                .map_err(|e| CryptoError::Decoding(format!("Couldn't decode x: {e}")))?;
            from_bytes(&x)
        }
    }
}

/// EdDSA over Ed25519 (RFC 8032)
pub struct Ed25519Provider;

impl Provider for Ed25519Provider {
    fn name(&self) -> &'static str {
        "EdDSA"
    }

    fn sign(&self, _algorithm: &Algorithm, key: &CryptoKey, data: &[u8]) -> Result<Vec<u8>> {
        key.check_kind(KeyKind::Private)?;
        let signing_key = signing_key(key)?;
        let signature: Signature = signing_key.sign(data);
        Ok(signature.to_bytes().to_vec())
    }

    fn verify(
        &self,
        _algorithm: &Algorithm,
        key: &CryptoKey,
        signature: &[u8],
        data: &[u8],
    ) -> Result<bool> {
        let verifying_key = verifying_key(key)?;
        let Ok(signature) = Signature::from_slice(signature) else {
            return Ok(false);
        };
        Ok(verifying_key.verify(data, &signature).is_ok())
    }

    fn generate_key_pair(
        &self,
        _algorithm: &Algorithm,
        extractable: bool,
        usages: &[KeyUsage],
    ) -> Result<CryptoKeyPair> {
        let jwk = jwk_from_secret(None)?;
        let public = jwk.public_only()?;
        let (public_usages, private_usages) = split_pair_usages(usages);

        Ok(CryptoKeyPair {
            public_key: CryptoKey::new(
                self.name(),
                KeyKind::Public,
                true,
                public_usages,
                KeyMaterial::Jwk(public),
            ),
            private_key: CryptoKey::new(
                self.name(),
                KeyKind::Private,
                extractable,
                private_usages,
                KeyMaterial::Jwk(jwk),
            ),
        })
    }

    /// Raw import takes public key bytes; private keys come in as JWKs
    fn import_raw(
        &self,
        _algorithm: &Algorithm,
        data: &[u8],
        extractable: bool,
        usages: &[KeyUsage],
    ) -> Result<CryptoKey> {
        let jwk = public_jwk(data)?;
        Ok(CryptoKey::new(
            self.name(),
            KeyKind::Public,
            extractable,
            usages.to_vec(),
            KeyMaterial::Jwk(jwk),
        ))
    }

    fn import_jwk(
        &self,
        _algorithm: &Algorithm,
        jwk: &JWK,
        extractable: bool,
        usages: &[KeyUsage],
    ) -> Result<CryptoKey> {
        let params = curve_params(jwk)?;
        let kind = if params.d.is_some() {
            KeyKind::Private
        } else {
            KeyKind::Public
        };

        let key = CryptoKey::new(
            self.name(),
            kind,
            extractable,
            usages.to_vec(),
            KeyMaterial::Jwk(jwk.clone()),
        );

        match kind {
            KeyKind::Private => {
                signing_key(&key)?;
            }
            _ => {
                verifying_key(&key)?;
            }
        }
        Ok(key)
    }

    fn export_raw(&self, key: &CryptoKey) -> Result<Vec<u8>> {
        if !key.extractable {
            return Err(CryptoError::NotExtractable);
        }
        match key.kind {
            KeyKind::Private => Ok(signing_key(key)?.to_bytes().to_vec()),
            KeyKind::Public => Ok(verifying_key(key)?.to_bytes().to_vec()),
            KeyKind::Secret => Err(CryptoError::KeyFormat("Ed25519 keys are asymmetric".into())),
        }
    }

    fn export_jwk(&self, key: &CryptoKey) -> Result<JWK> {
        if !key.extractable {
            return Err(CryptoError::NotExtractable);
        }
        match key.material() {
            KeyMaterial::Jwk(jwk) => Ok(jwk.clone()),
            KeyMaterial::Raw(bytes) => match key.kind {
                KeyKind::Private => jwk_from_secret(Some(bytes)),
                _ => public_jwk(bytes),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generate_from_secret() {
        let d = "2g6O3yhIflXTxt2gtxX5F6K68x4g3hQt4H_hef9ZT18";
        let x = "bIWa9fD8X-YEFFsmuyiZfz94XRyp7osP9GppuSbiC0A";

        let secret_bytes = BASE64_URL_SAFE_NO_PAD.decode(d).unwrap();
        let jwk = jwk_from_secret(Some(&secret_bytes)).unwrap();

        if let Params::OKP(params) = &jwk.params {
            assert_eq!(params.d.as_ref().unwrap(), d);
            assert_eq!(params.x, x);
        } else {
            panic!("Expected OKP params");
        }
    }

    #[test]
    fn sign_and_verify_round_trip() {
        let provider = Ed25519Provider;
        let alg = Algorithm::new("EdDSA");
        let pair = provider
            .generate_key_pair(&alg, true, &[KeyUsage::Sign, KeyUsage::Verify])
            .unwrap();

        let signature = provider.sign(&alg, &pair.private_key, b"payload").unwrap();
        assert_eq!(signature.len(), 64);
        assert!(provider.verify(&alg, &pair.public_key, &signature, b"payload").unwrap());
        assert!(!provider.verify(&alg, &pair.public_key, &signature, b"other").unwrap());
    }

    #[test]
    fn raw_public_import_verifies_signatures() {
        let provider = Ed25519Provider;
        let alg = Algorithm::new("EdDSA");
        let pair = provider
            .generate_key_pair(&alg, true, &[KeyUsage::Sign, KeyUsage::Verify])
            .unwrap();

        let raw = provider.export_raw(&pair.public_key).unwrap();
        let imported = provider
            .import_raw(&alg, &raw, true, &[KeyUsage::Verify])
            .unwrap();

        let signature = provider.sign(&alg, &pair.private_key, b"payload").unwrap();
        assert!(provider.verify(&alg, &imported, &signature, b"payload").unwrap());
    }
}
