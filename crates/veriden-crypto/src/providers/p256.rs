//! P-256 (secp256r1/prime256v1) keys and the ES256 signature provider

use base64::{Engine, prelude::BASE64_URL_SAFE_NO_PAD};
use p256::{
    AffinePoint, EncodedPoint, FieldBytes,
    ecdsa::{
        Signature, SigningKey, VerifyingKey,
        signature::{Signer, Verifier},
    },
    elliptic_curve::sec1::{FromEncodedPoint, ToEncodedPoint},
};
use rand::rngs::OsRng;
use zeroize::Zeroizing;

use crate::{
    Algorithm, CryptoError, ECParams, JWK, Params,
    error::Result,
    key::{CryptoKey, CryptoKeyPair, KeyKind, KeyMaterial, KeyUsage, split_pair_usages},
    provider::Provider,
};

const CURVE: &str = "P-256";

/// Generates a P-256 JWK, optionally from existing secret material
pub fn jwk_from_secret(secret: Option<&[u8]>) -> Result<JWK> {
    let signing_key = match secret {
        Some(secret) => SigningKey::from_slice(secret)
            .map_err(|e| CryptoError::KeyError(format!("P-256 secret material isn't valid: {e}")))?,
        None => SigningKey::random(&mut OsRng),
    };

    let verifying_key = VerifyingKey::from(&signing_key);
    let point = verifying_key.to_encoded_point(false);

    Ok(JWK::from_params(Params::EC(ECParams {
        curve: CURVE.to_string(),
        x: BASE64_URL_SAFE_NO_PAD.encode(
            point
                .x()
                .ok_or_else(|| CryptoError::KeyError("Couldn't get X coordinate".into()))?
                .as_slice(),
        ),
        y: BASE64_URL_SAFE_NO_PAD.encode(
            point
                .y()
                .ok_or_else(|| CryptoError::KeyError("Couldn't get Y coordinate".into()))?
                .as_slice(),
        ),
        d: Some(BASE64_URL_SAFE_NO_PAD.encode(signing_key.to_bytes())),
    })))
}

/// Generates a public JWK from raw SEC1 bytes (compressed or uncompressed)
pub fn public_jwk(data: &[u8]) -> Result<JWK> {
    let ep = EncodedPoint::from_bytes(data)
        .map_err(|e| CryptoError::KeyError(format!("P-256 public key isn't valid: {e}")))?;

    // Convert to AffinePoint to validate the point is on the curve
    let ap: AffinePoint = AffinePoint::from_encoded_point(&ep)
        .into_option()
        .ok_or_else(|| {
            CryptoError::KeyError("Couldn't convert P-256 EncodedPoint to AffinePoint".into())
        })?;

    let ep = ap.to_encoded_point(false);

    Ok(JWK::from_params(Params::EC(ECParams {
        curve: CURVE.to_string(),
        x: BASE64_URL_SAFE_NO_PAD.encode(
            ep.x()
                .ok_or_else(|| CryptoError::KeyError("Couldn't get X coordinate".into()))?
                .as_slice(),
        ),
        y: BASE64_URL_SAFE_NO_PAD.encode(
            ep.y()
                .ok_or_else(|| CryptoError::KeyError("Couldn't get Y coordinate".into()))?
                .as_slice(),
        ),
        d: None,
    })))
}

fn decode_coordinate(value: &str, name: &str) -> Result<FieldBytes> {
    let bytes = BASE64_URL_SAFE_NO_PAD
        .decode(value)
        .map_err(|e| CryptoError::Decoding(format!("Couldn't decode {name}: {e}")))?;
    if bytes.len() != 32 {
        return Err(CryptoError::KeyError(format!(
            "P-256 {name} coordinate must be 32 bytes"
        )));
    }
    Ok(*FieldBytes::from_slice(&bytes))
}

fn curve_params(jwk: &JWK) -> Result<&ECParams> {
    match &jwk.params {
        Params::EC(params) if params.curve == CURVE => Ok(params),
        _ => Err(CryptoError::KeyFormat("Key material isn't a P-256 JWK".into())),
    }
}

fn signing_key(key: &CryptoKey) -> Result<SigningKey> {
    let make = |bytes: &[u8]| {
        SigningKey::from_slice(bytes)
            .map_err(|e| CryptoError::KeyError(format!("P-256 secret material isn't valid: {e}")))
    };

    match key.material() {
        KeyMaterial::Raw(bytes) => make(bytes),
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
            make(&d)
        }
    }
}

fn verifying_key(key: &CryptoKey) -> Result<VerifyingKey> {
    match key.material() {
        KeyMaterial::Raw(bytes) => {
            let ep = EncodedPoint::from_bytes(bytes)
                .map_err(|e| CryptoError::KeyError(format!("P-256 public key isn't valid: {e}")))?;
            VerifyingKey::from_encoded_point(&ep)
                .map_err(|e| CryptoError::KeyError(format!("P-256 public key isn't valid: {e}")))
        }
        KeyMaterial::Jwk(jwk) => {
            let params = curve_params(jwk)?;
            let x = decode_coordinate(&params.x, "x")?;
            let y = decode_coordinate(&params.y, "y")?;
            let ep = EncodedPoint::from_affine_coordinates(&x, &y, false);
            VerifyingKey::from_encoded_point(&ep)
                .map_err(|e| CryptoError::KeyError(format!("P-256 public key isn't valid: {e}")))
        }
    }
}

/// ECDSA over P-256 with SHA-256. Signatures are the fixed-width `r || s`
/// form JOSE uses.
pub struct P256Provider;

impl Provider for P256Provider {
    fn name(&self) -> &'static str {
        "ES256"
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

    fn import_raw(
        &self,
        _algorithm: &Algorithm,
        data: &[u8],
        extractable: bool,
        usages: &[KeyUsage],
    ) -> Result<CryptoKey> {
        // 32 bytes is a secret scalar, 33 or 65 a SEC1 public point
        if data.len() == 32 {
            let jwk = jwk_from_secret(Some(data))?;
            Ok(CryptoKey::new(
                self.name(),
                KeyKind::Private,
                extractable,
                usages.to_vec(),
                KeyMaterial::Jwk(jwk),
            ))
        } else {
            let jwk = public_jwk(data)?;
            Ok(CryptoKey::new(
                self.name(),
                KeyKind::Public,
                extractable,
                usages.to_vec(),
                KeyMaterial::Jwk(jwk),
            ))
        }
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
            KeyKind::Public => Ok(verifying_key(key)?.to_encoded_point(false).as_bytes().to_vec()),
            KeyKind::Secret => Err(CryptoError::KeyFormat("P-256 keys are asymmetric".into())),
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
