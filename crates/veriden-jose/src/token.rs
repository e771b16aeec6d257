//! JWS token building, signing, verification and serialization
//!
//! A token owns its payload bytes and an ordered list of signatures.
//! Signing is additive: each call appends one signature and never touches
//! the existing ones, so multiple parties can countersign the same payload.
//! Verification is all-or-nothing. Every signature has to validate or the
//! whole token is rejected.
//!
//! The protected header of each signature is kept as the exact base64url
//! string it was produced or parsed with. Re-serializing a parsed token
//! reproduces it byte for byte.

use base64::{Engine, prelude::BASE64_URL_SAFE_NO_PAD};
use serde::{Deserialize, Deserializer, Serialize, Serializer, de};
use serde_json::{Map, Value};
use tracing::warn;
use veriden_crypto::{Algorithm, KeyUsage, ProviderRegistry, PublicKey};
use veriden_keystore::{KeyStore, StoredKey, errors::KeyStoreError};

use crate::{
    errors::{JoseError, Result},
    header::JwsHeader,
};

/// Serialization forms for a signed token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JwsFormat {
    /// `b64(header).b64(payload).b64(signature)`, single signature only
    #[default]
    Compact,
    /// Single-signature JSON object
    FlattenedJson,
    /// JSON object with a `signatures` array
    GeneralJson,
}

/// One signature over the token payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JwsSignature {
    /// Protected header, kept as the exact base64url string
    pub protected: String,

    /// Unprotected header members
    #[serde(skip_serializing_if = "Option::is_none")]
    pub header: Option<Map<String, Value>>,

    #[serde(serialize_with = "se_b64", deserialize_with = "de_b64")]
    pub signature: Vec<u8>,
}

impl JwsSignature {
    fn protected_map(&self) -> Result<Map<String, Value>> {
        if self.protected.is_empty() {
            return Ok(Map::new());
        }
        let decoded = BASE64_URL_SAFE_NO_PAD
            .decode(&self.protected)
            .map_err(|e| JoseError::MalformedToken(format!("Couldn't decode protected header: {e}")))?;
        Ok(serde_json::from_slice(&decoded)?)
    }

    /// Header member lookup, protected first then unprotected
    fn header_str(&self, name: &str) -> Option<String> {
        if let Ok(protected) = self.protected_map()
            && let Some(value) = protected.get(name)
            && let Some(value) = value.as_str()
        {
            return Some(value.to_string());
        }
        self.header
            .as_ref()
            .and_then(|header| header.get(name))
            .and_then(Value::as_str)
            .map(str::to_string)
    }

    /// The kid this signature claims to be made with
    pub fn kid(&self) -> Option<String> {
        self.header_str("kid")
    }

    /// The algorithm this signature claims to be made with
    pub fn algorithm(&self) -> Option<String> {
        self.header_str("alg")
    }
}

fn se_b64<S>(bytes: &Vec<u8>, serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&BASE64_URL_SAFE_NO_PAD.encode(bytes))
}

fn de_b64<'de, D>(deserializer: D) -> std::result::Result<Vec<u8>, D::Error>
where
    D: Deserializer<'de>,
{
    let encoded = String::deserialize(deserializer)?;
    BASE64_URL_SAFE_NO_PAD
        .decode(&encoded)
        .map_err(de::Error::custom)
}

/// Single-signature JSON wire form
#[derive(Serialize, Deserialize)]
struct JwsFlatJson {
    payload: String,
    protected: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    header: Option<Map<String, Value>>,
    signature: String,
}

/// Multi-signature JSON wire form
#[derive(Serialize, Deserialize)]
struct JwsGeneralJson {
    payload: String,
    signatures: Vec<JwsSignature>,
}

/// Optional knobs for [JwsToken::sign]
#[derive(Debug, Clone, Default)]
pub struct SignOptions {
    /// Overrides the kid taken from the signing key
    pub kid: Option<String>,
    pub typ: Option<String>,
    pub cty: Option<String>,
    /// Extra members for the protected header
    pub protected_headers: Map<String, Value>,
}

/// A JWS token: payload bytes plus zero or more signatures
#[derive(Debug, Clone, PartialEq)]
pub struct JwsToken {
    payload: Vec<u8>,
    signatures: Vec<JwsSignature>,
}

impl JwsToken {
    /// A fresh, unsigned token over `content`
    pub fn new(content: impl Into<Vec<u8>>) -> Self {
        JwsToken {
            payload: content.into(),
            signatures: Vec::new(),
        }
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// The payload as UTF-8 text
    ///
    /// Available whether or not the token has been verified. Treat the
    /// result as untrusted until `verify` has passed.
    pub fn content(&self) -> Result<String> {
        String::from_utf8(self.payload.clone())
            .map_err(|_| JoseError::MalformedToken("Payload is not UTF-8 text".into()))
    }

    pub fn signatures(&self) -> &[JwsSignature] {
        &self.signatures
    }

    /// Sign the payload with the key saved under `key_reference` and append
    /// the signature
    ///
    /// The protected header carries the key's algorithm and kid. Signing
    /// happens inside the key store, so non-extractable keys work too.
    pub async fn sign<S: KeyStore>(
        &mut self,
        key_reference: &str,
        key_store: &S,
        registry: &ProviderRegistry,
        options: SignOptions,
    ) -> Result<()> {
        let public = match key_store.get(key_reference, true).await? {
            StoredKey::Public(public) => public,
            _ => {
                return Err(KeyStoreError::Capability(format!(
                    "({key_reference}) can't provide public header material"
                ))
                .into());
            }
        };

        let mut header = JwsHeader::new(public.algorithm()?);
        header.kid = match options.kid {
            Some(kid) => Some(kid),
            None => Some(public.key_id().map(str::to_string).ok_or_else(|| {
                JoseError::MalformedKid(format!("Signing key ({key_reference}) carries no kid"))
            })?),
        };
        header.typ = options.typ;
        header.cty = options.cty;
        header.extra = options.protected_headers;

        let protected = BASE64_URL_SAFE_NO_PAD.encode(serde_json::to_string(&header)?);
        let input = format!("{protected}.{}", BASE64_URL_SAFE_NO_PAD.encode(&self.payload));
        let signature = key_store
            .sign(key_reference, input.as_bytes(), registry)
            .await?;

        self.signatures.push(JwsSignature {
            protected,
            header: None,
            signature,
        });
        Ok(())
    }

    /// Verify every signature against the candidate keys
    ///
    /// A signature validates if any candidate with a matching algorithm
    /// accepts it. The token passes only when all signatures validate; a
    /// token without signatures never passes.
    pub fn verify(&self, candidates: &[PublicKey], registry: &ProviderRegistry) -> Result<()> {
        if self.signatures.is_empty() {
            return Err(JoseError::TokenRejected(
                "Token carries no signatures".into(),
            ));
        }
        for index in 0..self.signatures.len() {
            self.verify_signature(index, candidates, registry)?;
        }
        Ok(())
    }

    /// Verify one signature against its own candidate set
    pub(crate) fn verify_signature(
        &self,
        index: usize,
        candidates: &[PublicKey],
        registry: &ProviderRegistry,
    ) -> Result<()> {
        let signature = self.signatures.get(index).ok_or_else(|| {
            JoseError::MalformedToken(format!("Token has no signature {index}"))
        })?;
        let alg = signature.algorithm().ok_or_else(|| {
            JoseError::MalformedToken(format!("Signature {index} carries no alg header"))
        })?;
        let input = format!(
            "{}.{}",
            signature.protected,
            BASE64_URL_SAFE_NO_PAD.encode(&self.payload)
        );

        for candidate in candidates {
            if candidate.algorithm().ok().as_deref() != Some(alg.as_str()) {
                continue;
            }
            let Ok(verifier) = candidate.to_crypto_key(&[KeyUsage::Verify]) else {
                continue;
            };
            if registry
                .verify(&Algorithm::new(&alg), &verifier, &signature.signature, input.as_bytes())
                .is_ok_and(|verified| verified)
            {
                return Ok(());
            }
        }

        let kid = signature.kid().unwrap_or_default();
        warn!("signature {index} ({kid}) failed verification");
        Err(JoseError::TokenRejected(format!(
            "Signature {index} ({kid}) did not validate against any candidate key"
        )))
    }

    /// Serialize the token in the requested form
    pub fn serialize(&self, format: JwsFormat) -> Result<String> {
        let payload = BASE64_URL_SAFE_NO_PAD.encode(&self.payload);
        match format {
            JwsFormat::Compact => {
                let signature = self.single_signature()?;
                if signature.header.is_some() {
                    return Err(JoseError::MalformedToken(
                        "Compact form can't carry an unprotected header".into(),
                    ));
                }
                Ok(format!(
                    "{}.{payload}.{}",
                    signature.protected,
                    BASE64_URL_SAFE_NO_PAD.encode(&signature.signature)
                ))
            }
            JwsFormat::FlattenedJson => {
                let signature = self.single_signature()?;
                Ok(serde_json::to_string(&JwsFlatJson {
                    payload,
                    protected: signature.protected.clone(),
                    header: signature.header.clone(),
                    signature: BASE64_URL_SAFE_NO_PAD.encode(&signature.signature),
                })?)
            }
            JwsFormat::GeneralJson => Ok(serde_json::to_string(&JwsGeneralJson {
                payload,
                signatures: self.signatures.clone(),
            })?),
        }
    }

    fn single_signature(&self) -> Result<&JwsSignature> {
        match self.signatures.as_slice() {
            [signature] => Ok(signature),
            _ => Err(JoseError::MalformedToken(format!(
                "This form carries exactly one signature, token has {}",
                self.signatures.len()
            ))),
        }
    }

    /// Parse a token from any of the three serialization forms
    pub fn deserialize(jws: &str) -> Result<JwsToken> {
        let jws = jws.trim();

        let segments: Vec<&str> = jws.split('.').collect();
        if segments.len() == 3 && segments.iter().all(|segment| is_base64url(segment)) {
            return Ok(JwsToken {
                payload: decode_segment(segments[1], "payload")?,
                signatures: vec![JwsSignature {
                    protected: segments[0].to_string(),
                    header: None,
                    signature: decode_segment(segments[2], "signature")?,
                }],
            });
        }

        let lowered = jws.to_lowercase();
        if lowered.contains("\"signatures\"") {
            let token: JwsGeneralJson = serde_json::from_str(jws)
                .map_err(|e| JoseError::MalformedToken(format!("Unable to parse JWS token: {e}")))?;
            return Ok(JwsToken {
                payload: decode_segment(&token.payload, "payload")?,
                signatures: token.signatures,
            });
        }
        if lowered.contains("\"signature\"") {
            let token: JwsFlatJson = serde_json::from_str(jws)
                .map_err(|e| JoseError::MalformedToken(format!("Unable to parse JWS token: {e}")))?;
            return Ok(JwsToken {
                payload: decode_segment(&token.payload, "payload")?,
                signatures: vec![JwsSignature {
                    protected: token.protected,
                    header: token.header,
                    signature: decode_segment(&token.signature, "signature")?,
                }],
            });
        }

        Err(JoseError::MalformedToken("Unable to parse JWS token".into()))
    }
}

fn is_base64url(segment: &str) -> bool {
    segment
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}

fn decode_segment(segment: &str, name: &str) -> Result<Vec<u8>> {
    BASE64_URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|e| JoseError::MalformedToken(format!("Couldn't decode {name}: {e}")))
}
