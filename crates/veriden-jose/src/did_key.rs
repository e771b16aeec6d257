//! Key discovery through DID documents
//!
//! A kid of the form `did:method:id#fragment` names one key inside one
//! identifier document. The helpers here split kids apart, look the named
//! key up through a resolver and drive token verification with the result.
//!
//! Two verification entry points with different trust shapes:
//! [verify_with_identifier] takes a document the caller already trusts and
//! accepts any of its keys. [verify_with_resolver] resolves each
//! signature's kid and holds that signature to exactly the key it names.

use futures_util::future::try_join_all;
use veriden_crypto::{ProviderRegistry, PublicKey};
use veriden_resolver::{IdentifierDocument, Resolver};

use crate::{
    errors::{JoseError, Result},
    token::JwsToken,
};

/// The identifier part of a kid, everything before the `#`
pub fn identifier_from_kid(kid: &str) -> Result<&str> {
    match kid.split_once('#') {
        Some((did, fragment)) if !did.is_empty() && !fragment.is_empty() => Ok(did),
        _ => Err(JoseError::MalformedKid(format!(
            "No identifier found in kid ({kid})"
        ))),
    }
}

/// The key name part of a kid, the `#` and everything after it
pub fn fragment_from_kid(kid: &str) -> Result<&str> {
    let did = identifier_from_kid(kid)?;
    Ok(&kid[did.len()..])
}

/// Resolve a kid to the public key its document publishes under that name
///
/// An entry matches when its JWK kid or its entry id ends with the kid's
/// fragment. The first match wins.
pub async fn key_from_kid(kid: &str, resolver: &dyn Resolver) -> Result<PublicKey> {
    let did = identifier_from_kid(kid)?;
    let fragment = fragment_from_kid(kid)?;
    let document = resolver.resolve(did).await?;

    document
        .public_key
        .iter()
        .find(|entry| {
            entry
                .public_key_jwk
                .key_id
                .as_deref()
                .is_some_and(|entry_kid| entry_kid.ends_with(fragment))
                || entry.id.ends_with(fragment)
        })
        .ok_or_else(|| JoseError::KeyNotFound(kid.to_string()))?
        .to_public_key()
        .map_err(JoseError::from)
}

/// Verify a token against a document the caller already trusts
///
/// Every key the document publishes is a candidate for every signature.
pub fn verify_with_identifier(
    token: &JwsToken,
    document: &IdentifierDocument,
    registry: &ProviderRegistry,
) -> Result<()> {
    let candidates = document
        .public_key
        .iter()
        .map(|entry| entry.to_public_key())
        .collect::<std::result::Result<Vec<_>, _>>()?;
    token.verify(&candidates, registry)
}

/// Verify a token by resolving each signature's kid
///
/// Each signature must name a kid, the kid must resolve, and the signature
/// must validate against exactly the key the kid names. Key lookups for
/// the signatures run concurrently.
pub async fn verify_with_resolver(
    token: &JwsToken,
    resolver: &dyn Resolver,
    registry: &ProviderRegistry,
) -> Result<()> {
    if token.signatures().is_empty() {
        return Err(JoseError::TokenRejected(
            "Token carries no signatures".into(),
        ));
    }

    let mut lookups = Vec::with_capacity(token.signatures().len());
    for (index, signature) in token.signatures().iter().enumerate() {
        let kid = signature.kid().ok_or_else(|| {
            JoseError::MalformedKid(format!("Could not find kid in signature {index}"))
        })?;
        lookups.push(async move { key_from_kid(&kid, resolver).await });
    }
    let keys = try_join_all(lookups).await?;

    for (index, key) in keys.iter().enumerate() {
        token.verify_signature(index, std::slice::from_ref(key), registry)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use base64::{Engine, prelude::BASE64_URL_SAFE_NO_PAD};
    use veriden_crypto::{KeyPair, PrivateKey, providers};
    use veriden_keystore::{KeyStore, MemoryKeyStore};
    use veriden_resolver::{PublicKeyEntry, StaticResolver};

    use super::*;
    use crate::token::{JwsFormat, SignOptions};

    fn secp256k1_pair(kid: &str) -> KeyPair {
        let jwk = providers::secp256k1::jwk_from_secret(None).unwrap();
        KeyPair::new(PrivateKey::new(jwk).unwrap())
            .unwrap()
            .with_key_id(kid)
    }

    fn document_for(did: &str, keys: &[(&str, &PublicKey)]) -> IdentifierDocument {
        let mut document = IdentifierDocument::new(did);
        for (fragment, key) in keys {
            document = document.with_public_key(PublicKeyEntry {
                id: format!("{did}{fragment}"),
                type_: "EcdsaSecp256k1VerificationKey2019".to_string(),
                controller: Some(did.to_string()),
                public_key_jwk: (*key).clone().into_jwk(),
                property_set: HashMap::new(),
            });
        }
        document
    }

    #[test]
    fn kid_splits_into_identifier_and_fragment() {
        let kid = "did:example:abc#key-1";
        assert_eq!(identifier_from_kid(kid).unwrap(), "did:example:abc");
        assert_eq!(fragment_from_kid(kid).unwrap(), "#key-1");
    }

    #[test]
    fn kid_needs_both_parts() {
        for kid in ["did:example:abc", "did:example:abc#", "#key-1", ""] {
            assert!(matches!(
                identifier_from_kid(kid),
                Err(JoseError::MalformedKid(_))
            ));
            assert!(matches!(
                fragment_from_kid(kid),
                Err(JoseError::MalformedKid(_))
            ));
        }
    }

    #[tokio::test]
    async fn key_lookup_matches_entry_id_suffix() {
        let pair = secp256k1_pair("did:example:abc#key-1");
        let mut document = document_for("did:example:abc", &[("#key-1", &pair.public_key)]);
        // entries often publish a bare JWK, the entry id still names it
        document.public_key[0].public_key_jwk.key_id = None;

        let resolver = StaticResolver::new();
        resolver.insert(document).await;

        let key = key_from_kid("did:example:abc#key-1", &resolver)
            .await
            .unwrap();
        assert_eq!(key.thumbprint(), pair.public_key.thumbprint());
        // the entry id fills in for the missing JWK kid
        assert_eq!(key.key_id(), Some("did:example:abc#key-1"));
    }

    #[tokio::test]
    async fn unknown_fragment_is_key_not_found() {
        let pair = secp256k1_pair("did:example:abc#key-1");
        let resolver = StaticResolver::new();
        resolver
            .insert(document_for("did:example:abc", &[("#key-1", &pair.public_key)]))
            .await;

        assert!(matches!(
            key_from_kid("did:example:abc#key-2", &resolver).await,
            Err(JoseError::KeyNotFound(_))
        ));
    }

    #[tokio::test]
    async fn identifier_verification_accepts_any_document_key() {
        let registry = ProviderRegistry::with_default_providers();
        let signing = secp256k1_pair("did:example:abc#sig-1");
        let rotation = secp256k1_pair("did:example:abc#sig-2");
        let document = document_for(
            "did:example:abc",
            &[
                ("#sig-1", &signing.public_key),
                ("#sig-2", &rotation.public_key),
            ],
        );

        let store = MemoryKeyStore::new();
        store
            .save("signing", signing.private_key.clone().into())
            .await
            .unwrap();
        let mut token = JwsToken::new("card payload");
        token
            .sign("signing", &store, &registry, SignOptions::default())
            .await
            .unwrap();

        verify_with_identifier(&token, &document, &registry).unwrap();

        let stranger = secp256k1_pair("did:example:other#sig");
        let foreign = document_for("did:example:other", &[("#sig", &stranger.public_key)]);
        assert!(matches!(
            verify_with_identifier(&token, &foreign, &registry),
            Err(JoseError::TokenRejected(_))
        ));
    }

    #[tokio::test]
    async fn resolver_verification_follows_the_kid() {
        let registry = ProviderRegistry::with_default_providers();
        let pair = secp256k1_pair("did:example:abc#sig-1");
        let resolver = StaticResolver::new();
        resolver
            .insert(document_for("did:example:abc", &[("#sig-1", &pair.public_key)]))
            .await;

        let store = MemoryKeyStore::new();
        store
            .save("signing", pair.private_key.clone().into())
            .await
            .unwrap();
        let mut token = JwsToken::new("card payload");
        token
            .sign("signing", &store, &registry, SignOptions::default())
            .await
            .unwrap();

        verify_with_resolver(&token, &resolver, &registry)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn signatures_are_held_to_the_key_their_kid_names() {
        let registry = ProviderRegistry::with_default_providers();
        let alice = secp256k1_pair("did:example:abc#alice");
        let bob = secp256k1_pair("did:example:abc#bob");
        let document = document_for(
            "did:example:abc",
            &[("#alice", &alice.public_key), ("#bob", &bob.public_key)],
        );
        let resolver = StaticResolver::new();
        resolver.insert(document.clone()).await;

        // signed with alice's key but claiming bob's kid
        let store = MemoryKeyStore::new();
        store
            .save("alice", alice.private_key.clone().into())
            .await
            .unwrap();
        let mut token = JwsToken::new("card payload");
        token
            .sign(
                "alice",
                &store,
                &registry,
                SignOptions {
                    kid: Some("did:example:abc#bob".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        // the document as a whole would vouch for it
        verify_with_identifier(&token, &document, &registry).unwrap();

        // pinned to bob's key it does not hold up
        assert!(matches!(
            verify_with_resolver(&token, &resolver, &registry).await,
            Err(JoseError::TokenRejected(_))
        ));
    }

    #[tokio::test]
    async fn resolution_failure_fails_the_token() {
        let registry = ProviderRegistry::with_default_providers();
        let pair = secp256k1_pair("did:example:gone#sig-1");
        let store = MemoryKeyStore::new();
        store
            .save("signing", pair.private_key.clone().into())
            .await
            .unwrap();
        let mut token = JwsToken::new("card payload");
        token
            .sign("signing", &store, &registry, SignOptions::default())
            .await
            .unwrap();

        let resolver = StaticResolver::new();
        assert!(matches!(
            verify_with_resolver(&token, &resolver, &registry).await,
            Err(JoseError::Resolver(_))
        ));
    }

    #[tokio::test]
    async fn signatures_without_a_kid_are_malformed() {
        let registry = ProviderRegistry::with_default_providers();
        let protected = BASE64_URL_SAFE_NO_PAD.encode(r#"{"alg":"ES256K"}"#);
        let payload = BASE64_URL_SAFE_NO_PAD.encode("card payload");
        let signature = BASE64_URL_SAFE_NO_PAD.encode([1u8, 2, 3]);
        let token = JwsToken::deserialize(&format!("{protected}.{payload}.{signature}")).unwrap();

        let resolver = StaticResolver::new();
        assert!(matches!(
            verify_with_resolver(&token, &resolver, &registry).await,
            Err(JoseError::MalformedKid(_))
        ));
    }

    #[tokio::test]
    async fn unsigned_tokens_never_pass_resolver_verification() {
        let registry = ProviderRegistry::with_default_providers();
        let resolver = StaticResolver::new();
        let token = JwsToken::new("card payload");

        // an empty signatures array survives serialization but never verifies
        let general = token.serialize(JwsFormat::GeneralJson).unwrap();
        let parsed = JwsToken::deserialize(&general).unwrap();
        assert!(matches!(
            verify_with_resolver(&parsed, &resolver, &registry).await,
            Err(JoseError::TokenRejected(_))
        ));
    }
}
