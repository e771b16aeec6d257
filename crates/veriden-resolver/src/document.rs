//! Identifier document definition
//!
//! The document shape follows the DID data model: an id, an ordered list of
//! public key entries carrying JWKs, and service endpoints. Order of the key
//! entries is preserved because kid matching scans them first to last.

use std::{collections::HashMap, fmt};

use serde::{
    Deserialize, Deserializer, Serialize,
    de::{self, SeqAccess, Visitor},
};
use serde_json::Value;
use veriden_crypto::{JWK, PublicKey};

use crate::errors::{ResolverError, Result};

/// Context emitted on newly created documents
pub const DOCUMENT_CONTEXT: &str = "https://w3id.org/did/v1";

/// An identifier document
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct IdentifierDocument {
    #[serde(rename = "@context")]
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    #[serde(deserialize_with = "de_context")]
    pub context: Vec<String>,

    /// Identifier the document describes
    pub id: String,

    /// Public key entries, in document order
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub public_key: Vec<PublicKeyEntry>,

    /// Set of services
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub service: Vec<ServiceEndpoint>,
}

impl IdentifierDocument {
    pub fn new(id: impl Into<String>) -> Self {
        IdentifierDocument {
            context: vec![DOCUMENT_CONTEXT.to_string()],
            id: id.into(),
            public_key: Vec::new(),
            service: Vec::new(),
        }
    }

    pub fn with_public_key(mut self, entry: PublicKeyEntry) -> Self {
        self.public_key.push(entry);
        self
    }

    pub fn with_service(mut self, service: ServiceEndpoint) -> Self {
        self.service.push(service);
        self
    }
}

/// Accepts `@context` as either a single string or a sequence of strings
fn de_context<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    struct StringOrVecVisitor;

    impl<'de> Visitor<'de> for StringOrVecVisitor {
        type Value = Vec<String>;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a string or a sequence of strings")
        }

        fn visit_str<E>(self, value: &str) -> std::result::Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(vec![value.to_owned()])
        }

        fn visit_seq<A>(self, mut seq: A) -> std::result::Result<Self::Value, A::Error>
        where
            A: SeqAccess<'de>,
        {
            let mut vec = Vec::new();
            while let Some(elem) = seq.next_element()? {
                vec.push(elem);
            }
            Ok(vec)
        }
    }

    deserializer.deserialize_any(StringOrVecVisitor)
}

/// A public key listed in an identifier document
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PublicKeyEntry {
    /// Full key id, `<did>#<fragment>`
    pub id: String,

    #[serde(rename = "type")]
    pub type_: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub controller: Option<String>,

    pub public_key_jwk: JWK,

    /// Each entry can carry other properties
    #[serde(flatten)]
    pub property_set: HashMap<String, Value>,
}

impl PublicKeyEntry {
    /// Converts the embedded JWK into the typed key model
    ///
    /// The entry id becomes the key's kid when the JWK doesn't carry one.
    pub fn to_public_key(&self) -> Result<PublicKey> {
        let mut jwk = self.public_key_jwk.clone();
        if jwk.key_id.is_none() {
            jwk.key_id = Some(self.id.clone());
        }
        PublicKey::new(jwk).map_err(|e| {
            ResolverError::InvalidDocument(format!(
                "public key entry ({}) doesn't hold a usable public key: {e}",
                self.id
            ))
        })
    }
}

/// A service listed in an identifier document
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ServiceEndpoint {
    pub id: String,

    #[serde(rename = "type")]
    pub type_: String,

    pub service_endpoint: Endpoint,

    #[serde(flatten)]
    pub property_set: HashMap<String, Value>,
}

/// Service endpoint value, a plain URI or a richer map
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(untagged)]
pub enum Endpoint {
    Uri(String),
    Map(Value),
}

impl Endpoint {
    /// Returns the URI for the endpoint, if one is available
    pub fn get_uri(&self) -> Option<&str> {
        match self {
            Endpoint::Uri(uri) => Some(uri),
            Endpoint::Map(map) => map.get("uri").and_then(Value::as_str),
        }
    }
}

#[cfg(test)]
mod tests {
    use veriden_crypto::{ECParams, Params};

    use super::*;

    fn secp256k1_entry(id: &str) -> PublicKeyEntry {
        PublicKeyEntry {
            id: id.to_string(),
            type_: "EcdsaSecp256k1VerificationKey2019".to_string(),
            controller: None,
            public_key_jwk: JWK::from_params(Params::EC(ECParams {
                curve: "secp256k1".to_string(),
                x: "Q5foEFNl8VHSCkLkTV8FhXZdIxSCDDGW5HB_g1GjxYU".to_string(),
                y: "Av6CmlrJnu0oMNQBvGGKAq6SX5PvZaeavLTkLi8pCQM".to_string(),
                d: None,
            })),
            property_set: HashMap::new(),
        }
    }

    #[test]
    fn document_serde_uses_did_field_names() {
        let document = IdentifierDocument::new("did:example:abc")
            .with_public_key(secp256k1_entry("did:example:abc#sig-1"))
            .with_service(ServiceEndpoint {
                id: "did:example:abc#hub".to_string(),
                type_: "IdentityHub".to_string(),
                service_endpoint: Endpoint::Uri("https://hub.example.com".to_string()),
                property_set: HashMap::new(),
            });

        let json = serde_json::to_value(&document).unwrap();
        assert_eq!(json["@context"][0], DOCUMENT_CONTEXT);
        assert_eq!(json["publicKey"][0]["id"], "did:example:abc#sig-1");
        assert_eq!(json["publicKey"][0]["type"], "EcdsaSecp256k1VerificationKey2019");
        assert_eq!(json["publicKey"][0]["publicKeyJwk"]["kty"], "EC");
        assert_eq!(json["service"][0]["serviceEndpoint"], "https://hub.example.com");

        let back: IdentifierDocument = serde_json::from_value(json).unwrap();
        assert_eq!(back, document);
    }

    #[test]
    fn context_accepts_a_single_string() {
        let document: IdentifierDocument = serde_json::from_str(
            r#"{ "@context": "https://w3id.org/did/v1", "id": "did:example:abc" }"#,
        )
        .unwrap();
        assert_eq!(document.context, vec![DOCUMENT_CONTEXT.to_string()]);
    }

    #[test]
    fn to_public_key_attaches_entry_id_as_kid() {
        let entry = secp256k1_entry("did:example:abc#sig-1");
        let key = entry.to_public_key().unwrap();
        assert_eq!(key.key_id(), Some("did:example:abc#sig-1"));

        // an existing kid wins over the entry id
        let mut named = secp256k1_entry("did:example:abc#sig-1");
        named.public_key_jwk.key_id = Some("#already-set".to_string());
        assert_eq!(named.to_public_key().unwrap().key_id(), Some("#already-set"));
    }

    #[test]
    fn to_public_key_rejects_private_material() {
        let mut entry = secp256k1_entry("did:example:abc#sig-1");
        if let Params::EC(params) = &mut entry.public_key_jwk.params {
            params.d = Some("B80Bz2dcNosPeAsM-3HTvQ4ROkqy9Ciuig85R2ps-pY".to_string());
        }
        assert!(matches!(
            entry.to_public_key(),
            Err(ResolverError::InvalidDocument(_))
        ));
    }

    #[test]
    fn endpoint_uri_from_map_or_string() {
        let uri = Endpoint::Uri("https://hub.example.com".to_string());
        assert_eq!(uri.get_uri(), Some("https://hub.example.com"));

        let map = Endpoint::Map(serde_json::json!({ "uri": "https://hub.example.com", "routingKeys": [] }));
        assert_eq!(map.get_uri(), Some("https://hub.example.com"));
    }
}
