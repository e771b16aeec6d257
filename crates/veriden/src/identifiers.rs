/*!
 * Identifier records
 */

use serde::{Deserialize, Serialize};
use veriden_resolver::IdentifierDocument;

/// An identifier this client owns
///
/// Carries the document the identifier publishes and the key store
/// reference its signing key is saved under. The record itself holds no
/// key material and is safe to persist anywhere.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Identifier {
    /// The decentralized identifier
    pub id: String,

    /// Name the identifier is known by locally. For pairwise identifiers
    /// this is the stable hash of the peer.
    pub name: String,

    /// Document the identifier publishes
    pub document: IdentifierDocument,

    /// Key store reference of the signing key
    pub signature_key_reference: String,
}

impl Identifier {
    /// The kid signatures by this identifier carry
    pub fn kid(&self) -> String {
        format!("{}#{}", self.id, self.signature_key_reference)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_round_trip_with_wire_field_names() {
        let identifier = Identifier {
            id: "did:veriden:abc".into(),
            name: "main".into(),
            document: IdentifierDocument::new("did:veriden:abc"),
            signature_key_reference: "main-signing".into(),
        };

        let json = serde_json::to_string(&identifier).unwrap();
        assert!(json.contains("\"signatureKeyReference\":\"main-signing\""));

        let parsed: Identifier = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, identifier);
        assert_eq!(parsed.kid(), "did:veriden:abc#main-signing");
    }
}
