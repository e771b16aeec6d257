/*!
 * Veriden Pairwise
 *
 * Deterministic per-relationship identifiers and keys. A persona holds one
 * master seed; for each peer DID the same seed always derives the same
 * identifier name and key pair, while different peers get unrelated ones,
 * so nobody can correlate the persona's relationships by comparing keys.
 *
 * Derivation chain: stored seed -> HMAC-SHA-512 over the persona DID ->
 * master key -> HMAC-SHA-512 over the peer DID -> curve secret. The seed
 * is saved non-extractable and the first step runs inside the key store,
 * so the seed itself never crosses the store boundary.
 */

use base64::{Engine, prelude::BASE64_URL_SAFE_NO_PAD};
use k256::elliptic_curve::{Field, PrimeField, ops::Reduce};
use sha2::{Digest, Sha256};
use tracing::debug;
use veriden_crypto::{
    Algorithm, CryptoKey, KeyFormat, KeyMaterial, KeyPair, KeyUsage, PrivateKey, ProviderRegistry,
    SecretKey, providers,
};
use veriden_keystore::{KeyStore, errors::KeyStoreError};
use zeroize::Zeroizing;

use crate::errors::{PairwiseError, Result};

pub mod errors;

const SEED_ALGORITHM: &str = "HS512";

/// Create a fresh persona master seed and save it under `reference`
///
/// The seed comes from the HS512 provider at its native width and is saved
/// non-extractable: derivations run through the store, the raw seed is
/// never handed out.
pub async fn generate_seed<S: KeyStore>(
    store: &S,
    reference: &str,
    registry: &ProviderRegistry,
) -> Result<()> {
    let key = registry.generate_key(&Algorithm::new(SEED_ALGORITHM), false, &[KeyUsage::Sign])?;
    save_seed(store, reference, &key).await
}

/// Save caller-supplied seed bytes under `reference`
///
/// Restores a persona from a backed-up seed. Same non-extractable handling
/// as [generate_seed].
pub async fn import_seed<S: KeyStore>(
    store: &S,
    reference: &str,
    seed: &[u8],
    registry: &ProviderRegistry,
) -> Result<()> {
    let key = registry.import_key(
        KeyFormat::Raw,
        seed,
        &Algorithm::new(SEED_ALGORITHM),
        false,
        &[KeyUsage::Sign],
    )?;
    save_seed(store, reference, &key).await
}

async fn save_seed<S: KeyStore>(store: &S, reference: &str, key: &CryptoKey) -> Result<()> {
    let KeyMaterial::Jwk(jwk) = key.material() else {
        return Err(PairwiseError::Derivation(
            "Seed material is not a JWK".into(),
        ));
    };
    store
        .save_non_extractable(reference, SecretKey::new(jwk.clone())?.into())
        .await?;
    debug!("Saved persona seed under ({reference})");
    Ok(())
}

/// The persona-scoped master key: HMAC-SHA-512 over the persona DID, keyed
/// by the stored seed
///
/// Computed through `KeyStore::sign`, so it works for non-extractable and
/// platform-held seeds alike.
pub async fn persona_master_key<S: KeyStore>(
    store: &S,
    seed_reference: &str,
    persona_did: &str,
    registry: &ProviderRegistry,
) -> Result<Zeroizing<Vec<u8>>> {
    match store
        .sign(seed_reference, persona_did.as_bytes(), registry)
        .await
    {
        Ok(master) => Ok(Zeroizing::new(master)),
        Err(KeyStoreError::NotFound(_)) => {
            Err(PairwiseError::MissingSeed(seed_reference.to_string()))
        }
        Err(e) => Err(e.into()),
    }
}

/// Derive the pairwise key pair for one peer
///
/// A pure function of (master key, peer DID, algorithm): the same inputs
/// always yield bit-identical pairs, and no clock, counter or ambient
/// randomness enters the chain. `algorithm` picks the target curve:
/// ES256K, ES256 or EdDSA.
pub fn derive_pairwise_key(
    registry: &ProviderRegistry,
    master_key: &[u8],
    peer_did: &str,
    algorithm: &str,
) -> Result<KeyPair> {
    validate_peer_did(peer_did)?;
    debug!("Deriving pairwise key for peer ({peer_did}) using {algorithm}");

    let hmac_key = registry.import_key(
        KeyFormat::Raw,
        master_key,
        &Algorithm::new(SEED_ALGORITHM),
        false,
        &[KeyUsage::Sign],
    )?;
    let pairwise_seed = Zeroizing::new(registry.sign(
        &Algorithm::new(SEED_ALGORITHM),
        &hmac_key,
        peer_did.as_bytes(),
    )?);

    let jwk = if algorithm.eq_ignore_ascii_case("ES256K") {
        providers::secp256k1::jwk_from_secret(Some(&secp256k1_scalar(&pairwise_seed)?))?
    } else if algorithm.eq_ignore_ascii_case("ES256") {
        providers::p256::jwk_from_secret(Some(&p256_scalar(&pairwise_seed)?))?
    } else if algorithm.eq_ignore_ascii_case("EdDSA") {
        providers::ed25519::jwk_from_secret(Some(&pairwise_seed[..32]))?
    } else {
        return Err(PairwiseError::Derivation(format!(
            "No pairwise mapping for algorithm {algorithm}"
        )));
    };

    Ok(KeyPair::new(PrivateKey::new(jwk)?)?)
}

/// The stable identifier name for a peer relationship: base64url of the
/// SHA-256 of the peer DID
pub fn pairwise_identifier_name(peer_did: &str) -> String {
    BASE64_URL_SAFE_NO_PAD.encode(Sha256::digest(peer_did.as_bytes()))
}

fn validate_peer_did(peer_did: &str) -> Result<()> {
    let mut parts = peer_did.splitn(3, ':');
    match (parts.next(), parts.next(), parts.next()) {
        (Some("did"), Some(method), Some(id)) if !method.is_empty() && !id.is_empty() => Ok(()),
        _ => Err(PairwiseError::InvalidPeerDid(peer_did.to_string())),
    }
}

/// Reduce the first 32 derived bytes into a non-zero secp256k1 scalar
fn secp256k1_scalar(seed: &[u8]) -> Result<Zeroizing<Vec<u8>>> {
    let scalar = <k256::Scalar as Reduce<k256::U256>>::reduce_bytes(k256::FieldBytes::from_slice(
        &seed[..32],
    ));
    if bool::from(scalar.is_zero()) {
        return Err(PairwiseError::Derivation(
            "Derived secp256k1 scalar is zero".into(),
        ));
    }
    Ok(Zeroizing::new(scalar.to_repr().to_vec()))
}

/// Reduce the first 32 derived bytes into a non-zero P-256 scalar
fn p256_scalar(seed: &[u8]) -> Result<Zeroizing<Vec<u8>>> {
    let scalar = <p256::Scalar as Reduce<p256::U256>>::reduce_bytes(p256::FieldBytes::from_slice(
        &seed[..32],
    ));
    if bool::from(scalar.is_zero()) {
        return Err(PairwiseError::Derivation(
            "Derived P-256 scalar is zero".into(),
        ));
    }
    Ok(Zeroizing::new(scalar.to_repr().to_vec()))
}

#[cfg(test)]
mod tests {
    use veriden_crypto::Params;
    use veriden_keystore::MemoryKeyStore;

    use super::*;

    const PERSONA: &str = "did:example:persona";
    const PEER: &str = "did:example:peer123456";

    async fn seeded_store(registry: &ProviderRegistry) -> MemoryKeyStore {
        let store = MemoryKeyStore::new();
        import_seed(&store, "seed", &[1u8; 32], registry)
            .await
            .unwrap();
        store
    }

    async fn master(registry: &ProviderRegistry, store: &MemoryKeyStore) -> Zeroizing<Vec<u8>> {
        persona_master_key(store, "seed", PERSONA, registry)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn master_key_is_the_keyed_digest_of_the_persona_did() {
        let registry = ProviderRegistry::with_default_providers();
        let store = seeded_store(&registry).await;

        let master = master(&registry, &store).await;
        assert_eq!(
            BASE64_URL_SAFE_NO_PAD.encode(&*master),
            "FT8aK3BGXiL5jNFZa-E0_vOgRg0tWGCoojzYbdVVPRs42qhh7NE-mOzTsYix9yaxJLjF3kdrRFfLwHsr1BuFjg"
        );
    }

    #[tokio::test]
    async fn seeds_are_saved_non_extractable() {
        let registry = ProviderRegistry::with_default_providers();
        let store = MemoryKeyStore::new();
        generate_seed(&store, "seed", &registry).await.unwrap();

        assert!(matches!(
            store.get("seed", false).await,
            Err(KeyStoreError::Capability(_))
        ));
        // derivation through the store still works
        let master = persona_master_key(&store, "seed", PERSONA, &registry)
            .await
            .unwrap();
        assert_eq!(master.len(), 64);
    }

    #[tokio::test]
    async fn missing_seed_is_its_own_error_kind() {
        let registry = ProviderRegistry::with_default_providers();
        let store = MemoryKeyStore::new();

        assert!(matches!(
            persona_master_key(&store, "never-seeded", PERSONA, &registry).await,
            Err(PairwiseError::MissingSeed(_))
        ));
    }

    #[tokio::test]
    async fn secp256k1_derivation_matches_the_fixed_chain() {
        let registry = ProviderRegistry::with_default_providers();
        let store = seeded_store(&registry).await;
        let master = master(&registry, &store).await;

        let pair = derive_pairwise_key(&registry, &master, PEER, "ES256K").unwrap();
        let Params::EC(params) = &pair.private_key.jwk().params else {
            panic!("expected EC parameters");
        };
        assert_eq!(
            params.d.as_deref(),
            Some("bF7Ec_OdkUEce9gi_momh1VRq95PzbKXWQlcY0eqIAY")
        );
        assert_eq!(params.x, "2vwRv1yRmp1PT1XhkmZduYXmAepJk7YtQr841qe5318");
        assert_eq!(params.y, "htiIz0zhNWawHy-UavwCF_s1cgRpXGH5uZz3w0WBPak");
    }

    #[tokio::test]
    async fn p256_derivation_matches_the_fixed_chain() {
        let registry = ProviderRegistry::with_default_providers();
        let store = seeded_store(&registry).await;
        let master = master(&registry, &store).await;

        let pair = derive_pairwise_key(&registry, &master, PEER, "ES256").unwrap();
        let Params::EC(params) = &pair.private_key.jwk().params else {
            panic!("expected EC parameters");
        };
        assert_eq!(
            params.d.as_deref(),
            Some("bF7Ec_OdkUEce9gi_momh1VRq95PzbKXWQlcY0eqIAY")
        );
        assert_eq!(params.x, "lkTWT8ERWjgRvXmKm9aeXqTR-Rcm0heSVN7u5bkDz_I");
        assert_eq!(params.y, "BxvIlUHeFKXgjTgSHV3JGK-KYnfOT5f4GhpgFWNkdEc");
    }

    #[tokio::test]
    async fn ed25519_derivation_matches_the_fixed_chain() {
        let registry = ProviderRegistry::with_default_providers();
        let store = seeded_store(&registry).await;
        let master = master(&registry, &store).await;

        let pair = derive_pairwise_key(&registry, &master, PEER, "EdDSA").unwrap();
        let Params::OKP(params) = &pair.private_key.jwk().params else {
            panic!("expected OKP parameters");
        };
        assert_eq!(
            params.d.as_deref(),
            Some("bF7Ec_OdkUEce9gi_momh1VRq95PzbKXWQlcY0eqIAY")
        );
        assert_eq!(params.x, "LMoi-ykCfsZzoXtM_0Vnh4JNK4E-5ONdbua_9pVXVvE");
    }

    #[tokio::test]
    async fn derivation_is_deterministic_per_peer_and_distinct_across_peers() {
        let registry = ProviderRegistry::with_default_providers();
        let store = seeded_store(&registry).await;
        let master = master(&registry, &store).await;

        for algorithm in ["ES256K", "ES256", "EdDSA"] {
            let first = derive_pairwise_key(&registry, &master, PEER, algorithm).unwrap();
            let second = derive_pairwise_key(&registry, &master, PEER, algorithm).unwrap();
            assert_eq!(first, second);

            let other =
                derive_pairwise_key(&registry, &master, "did:example:other", algorithm).unwrap();
            assert_ne!(
                first.public_key.thumbprint(),
                other.public_key.thumbprint()
            );
        }
    }

    #[tokio::test]
    async fn different_seeds_derive_different_keys_for_the_same_peer() {
        let registry = ProviderRegistry::with_default_providers();
        let store = MemoryKeyStore::new();
        import_seed(&store, "seed-a", &[1u8; 32], &registry)
            .await
            .unwrap();
        import_seed(&store, "seed-b", &[2u8; 32], &registry)
            .await
            .unwrap();

        let master_a = persona_master_key(&store, "seed-a", PERSONA, &registry)
            .await
            .unwrap();
        let master_b = persona_master_key(&store, "seed-b", PERSONA, &registry)
            .await
            .unwrap();

        let pair_a = derive_pairwise_key(&registry, &master_a, PEER, "ES256K").unwrap();
        let pair_b = derive_pairwise_key(&registry, &master_b, PEER, "ES256K").unwrap();
        assert_ne!(
            pair_a.public_key.thumbprint(),
            pair_b.public_key.thumbprint()
        );
    }

    #[test]
    fn malformed_peer_dids_are_rejected() {
        let registry = ProviderRegistry::with_default_providers();
        let master = [7u8; 64];

        for peer in ["", "peer", "did:", "did:example", "did::abc", "did:example:", "web:example:abc"] {
            assert!(matches!(
                derive_pairwise_key(&registry, &master, peer, "ES256K"),
                Err(PairwiseError::InvalidPeerDid(_))
            ));
        }

        // ids may themselves contain colons
        assert!(derive_pairwise_key(&registry, &master, "did:peer:2.Ez6L.SeyJ0", "ES256K").is_ok());
    }

    #[test]
    fn unknown_target_algorithm_is_a_derivation_error() {
        let registry = ProviderRegistry::with_default_providers();
        assert!(matches!(
            derive_pairwise_key(&registry, &[7u8; 64], PEER, "RS256"),
            Err(PairwiseError::Derivation(_))
        ));
    }

    #[test]
    fn identifier_name_is_the_stable_hash_of_the_peer_did() {
        assert_eq!(
            pairwise_identifier_name(PEER),
            "dFaKDIUYTDFPeQYWvp0kyeNUbduGCENBOFc1vfGnEd4"
        );
        assert_eq!(pairwise_identifier_name(PEER), pairwise_identifier_name(PEER));
        assert_ne!(
            pairwise_identifier_name(PEER),
            pairwise_identifier_name("did:example:other")
        );
    }
}
