//! JWS header definition

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Protected header of a single JWS signature
///
/// `alg` is always present; everything else is optional. Extra members pass
/// through the flattened map untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JwsHeader {
    pub alg: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub kid: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub typ: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub cty: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl JwsHeader {
    pub fn new(alg: impl Into<String>) -> Self {
        JwsHeader {
            alg: alg.into(),
            kid: None,
            typ: None,
            cty: None,
            extra: Map::new(),
        }
    }
}
