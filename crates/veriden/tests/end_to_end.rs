//! Full client flows: personas, pairwise identifiers, signing, resolution
//! and verification working together.

use std::sync::Arc;

use base64::{Engine, prelude::BASE64_URL_SAFE_NO_PAD};
use veriden::{
    Veriden,
    config::VeridenConfig,
    errors::VeridenError,
    jose::{JoseError, JwsFormat, JwsToken, SignOptions},
    resolver::{IdentifierDocument, StaticResolver},
};

const PEER: &str = "did:example:peer";

async fn client() -> Veriden {
    Veriden::new(VeridenConfig::builder().build()).await.unwrap()
}

fn seeded_config() -> VeridenConfig {
    VeridenConfig::builder().with_seed(vec![7u8; 32]).build()
}

#[tokio::test]
async fn sign_resolve_verify_round_trip() {
    let client = client().await;
    let persona = client.create_persona("main").await.unwrap();
    let pairwise = client.create_pairwise(&persona, PEER).await.unwrap();

    let token = client.sign(&pairwise, "card payload").await.unwrap();
    client.verify(&token).await.unwrap();

    // A token that crossed the wire verifies the same
    let serialized = token.serialize(JwsFormat::Compact).unwrap();
    let received = JwsToken::deserialize(&serialized).unwrap();
    client.verify(&received).await.unwrap();
    assert_eq!(received.content().unwrap(), "card payload");
}

#[tokio::test]
async fn pairwise_identifiers_are_stable_per_peer() {
    let client = Veriden::new(seeded_config()).await.unwrap();
    let persona = client.create_persona("main").await.unwrap();

    let first = client.create_pairwise(&persona, PEER).await.unwrap();
    let second = client.create_pairwise(&persona, PEER).await.unwrap();
    assert_eq!(first, second);

    let other = client
        .create_pairwise(&persona, "did:example:another")
        .await
        .unwrap();
    assert_ne!(first.id, other.id);
    assert_ne!(first.name, other.name);
}

#[tokio::test]
async fn a_seed_restore_rebuilds_pairwise_identifiers() {
    let original = Veriden::new(seeded_config()).await.unwrap();
    let persona = original.create_persona("main").await.unwrap();
    let pairwise = original.create_pairwise(&persona, PEER).await.unwrap();

    // A fresh client restored from the seed and the persona record comes
    // back to the same pairwise identifier. No key material crossed over.
    let restored = Veriden::new(seeded_config()).await.unwrap();
    let rebuilt = restored.create_pairwise(&persona, PEER).await.unwrap();
    assert_eq!(rebuilt.id, pairwise.id);
    assert_eq!(rebuilt.document, pairwise.document);

    // What the restored client signs, the original can verify
    let token = restored.sign(&rebuilt, "hello again").await.unwrap();
    original.verify(&token).await.unwrap();
}

#[tokio::test]
async fn tampered_payloads_fail_verification() {
    let client = client().await;
    let persona = client.create_persona("main").await.unwrap();
    let token = client.sign(&persona, "genuine").await.unwrap();

    let serialized = token.serialize(JwsFormat::Compact).unwrap();
    let segments: Vec<&str> = serialized.split('.').collect();
    let tampered = format!(
        "{}.{}.{}",
        segments[0],
        BASE64_URL_SAFE_NO_PAD.encode("forged"),
        segments[2]
    );

    let received = JwsToken::deserialize(&tampered).unwrap();
    assert!(matches!(
        client.verify(&received).await,
        Err(VeridenError::Jose(JoseError::TokenRejected(_)))
    ));
}

#[tokio::test]
async fn replacing_a_document_key_breaks_verification() {
    let client = client().await;
    let persona = client.create_persona("main").await.unwrap();
    let token = client.sign(&persona, "payload").await.unwrap();
    client.verify(&token).await.unwrap();

    // Publish a replacement document without the signing key and drop the
    // cached copy
    client
        .documents()
        .insert(IdentifierDocument::new(&persona.id))
        .await;
    client.resolver().remove(&persona.id).await;

    assert!(matches!(
        client.verify(&token).await,
        Err(VeridenError::Jose(JoseError::KeyNotFound(_)))
    ));
}

#[tokio::test]
async fn every_cosigner_is_checked() {
    let client = client().await;
    let alice = client.create_persona("alice").await.unwrap();
    let bob = client.create_persona("bob").await.unwrap();

    let mut token = JwsToken::new("joint statement");
    for identifier in [&alice, &bob] {
        token
            .sign(
                &identifier.signature_key_reference,
                client.key_store(),
                client.registry(),
                SignOptions::default(),
            )
            .await
            .unwrap();
    }
    client.verify(&token).await.unwrap();

    // Lose bob's key and the whole token goes with it
    client
        .documents()
        .insert(IdentifierDocument::new(&bob.id))
        .await;
    client.resolver().remove(&bob.id).await;
    assert!(matches!(
        client.verify(&token).await,
        Err(VeridenError::Jose(JoseError::KeyNotFound(_)))
    ));
}

#[tokio::test]
async fn peers_verify_through_a_shared_registry() {
    // The shared registry stands in for wherever documents get anchored
    let shared = Arc::new(StaticResolver::new());
    let verifier = Veriden::new(
        VeridenConfig::builder()
            .with_resolver(shared.clone())
            .build(),
    )
    .await
    .unwrap();

    let signer = client().await;
    let persona = signer.create_persona("main").await.unwrap();
    shared.insert(persona.document.clone()).await;

    let token = signer.sign(&persona, "cross-client payload").await.unwrap();
    verifier.verify(&token).await.unwrap();
}
