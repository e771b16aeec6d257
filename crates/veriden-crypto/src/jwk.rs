//! JWK (JSON Web Key) types per RFC 7517

use base64::{Engine, prelude::BASE64_URL_SAFE_NO_PAD};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::{CryptoError, KeyType, error::Result};

/// RFC 7517 JWK Struct
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Zeroize, ZeroizeOnDrop)]
pub struct JWK {
    #[serde(rename = "kid")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_id: Option<String>,
    #[serde(rename = "alg")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub algorithm: Option<String>,
    #[serde(rename = "use")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_key_use: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_ops: Option<Vec<String>>,
    #[serde(flatten)]
    pub params: Params,
}

impl JWK {
    /// Builds a JWK carrying only key parameters, no metadata fields
    pub fn from_params(params: Params) -> Self {
        JWK {
            key_id: None,
            algorithm: None,
            public_key_use: None,
            key_ops: None,
            params,
        }
    }

    /// Returns the KeyType for a JWK
    pub fn key_type(&self) -> KeyType {
        match &self.params {
            Params::EC(params) => match params.curve.as_str() {
                "P-256" => KeyType::P256,
                "secp256k1" => KeyType::Secp256k1,
                _ => KeyType::Unknown,
            },
            Params::OKP(params) => match params.curve.as_str() {
                "Ed25519" => KeyType::Ed25519,
                _ => KeyType::Unknown,
            },
            Params::Oct(_) => KeyType::Oct,
        }
    }

    /// JOSE signature algorithm for this key: the declared `alg` if present,
    /// otherwise inferred from the curve
    pub fn signature_algorithm(&self) -> Result<String> {
        if let Some(alg) = &self.algorithm {
            return Ok(alg.clone());
        }
        self.key_type()
            .signature_algorithm()
            .map(|alg| alg.to_string())
            .ok_or_else(|| {
                CryptoError::UnsupportedKeyType(format!(
                    "No signature algorithm known for key type {}",
                    self.key_type()
                ))
            })
    }

    /// True if the JWK carries private or secret material (`d` or `k`)
    pub fn has_private_material(&self) -> bool {
        match &self.params {
            Params::EC(params) => params.d.is_some(),
            Params::OKP(params) => params.d.is_some(),
            Params::Oct(_) => true,
        }
    }

    /// Public half of this JWK: metadata kept, private material stripped.
    /// Symmetric keys have no public half.
    pub fn public_only(&self) -> Result<JWK> {
        let params = match &self.params {
            Params::EC(params) => Params::EC(ECParams {
                curve: params.curve.clone(),
                x: params.x.clone(),
                y: params.y.clone(),
                d: None,
            }),
            Params::OKP(params) => Params::OKP(OKPParams {
                curve: params.curve.clone(),
                x: params.x.clone(),
                d: None,
            }),
            Params::Oct(_) => {
                return Err(CryptoError::KeyError(
                    "Symmetric keys have no public form".into(),
                ));
            }
        };

        Ok(JWK {
            key_id: self.key_id.clone(),
            algorithm: self.algorithm.clone(),
            public_key_use: self.public_key_use.clone(),
            key_ops: None,
            params,
        })
    }

    /// Canonical form used for fingerprinting: the required public parameters
    /// serialized with alphabetically ordered keys and no whitespace
    pub fn minimum_alphabetic_jwk(&self) -> String {
        match &self.params {
            Params::EC(p) => format!(
                r#"{{"crv":"{}","kty":"EC","x":"{}","y":"{}"}}"#,
                p.curve, p.x, p.y
            ),
            Params::OKP(p) => {
                format!(r#"{{"crv":"{}","kty":"OKP","x":"{}"}}"#, p.curve, p.x)
            }
            Params::Oct(p) => format!(r#"{{"k":"{}","kty":"oct"}}"#, p.k),
        }
    }

    /// base64url(SHA-256) digest of the canonical form. Stable across
    /// serializations, usable as a key identifier.
    pub fn thumbprint(&self) -> String {
        let digest = Sha256::digest(self.minimum_alphabetic_jwk().as_bytes());
        BASE64_URL_SAFE_NO_PAD.encode(digest)
    }
}

/// JWK Key Types and associated Parameters
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Zeroize, ZeroizeOnDrop)]
#[serde(tag = "kty")]
pub enum Params {
    EC(ECParams),
    OKP(OKPParams),
    #[serde(rename = "oct")]
    Oct(OctParams),
}

/// Elliptic Curve parameters (P-256, secp256k1)
#[derive(Debug, Serialize, Deserialize, Clone, Zeroize, PartialEq, ZeroizeOnDrop)]
pub struct ECParams {
    #[serde(rename = "crv")]
    pub curve: String,
    pub x: String,
    pub y: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub d: Option<String>,
}

/// Octet Key Pair parameters (Ed25519)
#[derive(Debug, Serialize, Deserialize, Clone, Zeroize, PartialEq, ZeroizeOnDrop)]
pub struct OKPParams {
    #[serde(rename = "crv")]
    pub curve: String,
    pub x: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub d: Option<String>,
}

/// Symmetric key parameters
#[derive(Debug, Serialize, Deserialize, Clone, Zeroize, PartialEq, ZeroizeOnDrop)]
pub struct OctParams {
    pub k: String,
}
