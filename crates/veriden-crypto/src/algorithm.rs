//! Algorithm descriptors passed to providers

use std::collections::HashMap;

use base64::{Engine, prelude::BASE64_URL_SAFE_NO_PAD};
use serde_json::Value;

use crate::{CryptoError, error::Result};

/// An algorithm name plus whatever parameters the operation needs
/// (iv, aad, salt, info, length). Parameter validation belongs to the
/// provider that consumes the descriptor.
#[derive(Debug, Clone, Default)]
pub struct Algorithm {
    pub name: String,
    pub params: HashMap<String, Value>,
}

impl Algorithm {
    pub fn new(name: impl Into<String>) -> Self {
        Algorithm {
            name: name.into(),
            params: HashMap::new(),
        }
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Stores a byte parameter in its base64url form
    pub fn with_bytes_param(self, key: impl Into<String>, value: &[u8]) -> Self {
        let encoded = BASE64_URL_SAFE_NO_PAD.encode(value);
        self.with_param(key, encoded)
    }

    /// Requested derived-key length in bits, if present
    pub fn length(&self) -> Option<u64> {
        self.params.get("length").and_then(Value::as_u64)
    }

    pub fn param_str(&self, key: &str) -> Option<&str> {
        self.params.get(key).and_then(Value::as_str)
    }

    /// Decodes an optional base64url byte parameter
    pub fn param_bytes(&self, key: &'static str) -> Result<Option<Vec<u8>>> {
        match self.param_str(key) {
            None => Ok(None),
            Some(encoded) => BASE64_URL_SAFE_NO_PAD
                .decode(encoded)
                .map(Some)
                .map_err(|e| CryptoError::InvalidParameter {
                    parameter: key,
                    reason: format!("not valid base64url: {e}"),
                }),
        }
    }

    /// Decodes a required base64url byte parameter
    pub fn require_bytes(&self, key: &'static str) -> Result<Vec<u8>> {
        self.param_bytes(key)?
            .ok_or_else(|| CryptoError::MissingParameter {
                algorithm: self.name.clone(),
                parameter: key,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn byte_params_round_trip() {
        let alg = Algorithm::new("A256GCM").with_bytes_param("iv", &[0u8; 12]);

        assert_eq!(alg.require_bytes("iv").unwrap(), vec![0u8; 12]);
        assert!(alg.param_bytes("aad").unwrap().is_none());
    }

    #[test]
    fn missing_required_param_names_algorithm_and_parameter() {
        let alg = Algorithm::new("A256GCM");
        let err = alg.require_bytes("iv").unwrap_err();

        assert!(matches!(
            err,
            CryptoError::MissingParameter {
                parameter: "iv",
                ..
            }
        ));
    }

    #[test]
    fn invalid_base64_is_a_parameter_error() {
        let alg = Algorithm::new("A256GCM").with_param("iv", "not base64!!!");
        assert!(matches!(
            alg.param_bytes("iv"),
            Err(CryptoError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn length_reads_from_params() {
        let alg = Algorithm::new("A256GCM").with_param("length", 256);
        assert_eq!(alg.length(), Some(256));
        assert_eq!(Algorithm::new("A256GCM").length(), None);
    }
}
