/*!
 * Veriden SDK
 *
 * Instantiate a Veriden client with the `new` function, then create
 * personas, derive pairwise identifiers towards peers, sign payloads as
 * any identifier you hold and verify what others send back.
 */

use std::{collections::HashMap, future::Future, pin::Pin, sync::Arc};

use tracing::debug;
use veriden_crypto::{Algorithm, KeyMaterial, KeyPair, KeyUsage, PrivateKey, ProviderRegistry};
use veriden_jose::{JwsToken, SignOptions, verify_with_resolver};
use veriden_keystore::{KeyStore, MemoryKeyStore, StoredKey};
use veriden_pairwise::{
    derive_pairwise_key, generate_seed, import_seed, pairwise_identifier_name, persona_master_key,
};
use veriden_resolver::{
    CachingResolver, IdentifierDocument, PublicKeyEntry, Resolver, ResolverError, StaticResolver,
};

use crate::{
    config::VeridenConfig,
    errors::{Result, VeridenError},
    identifiers::Identifier,
    receipts::RevocationReceipt,
    transport::Transport,
};

pub mod cards;
pub mod config;
pub mod errors;
pub mod identifiers;
pub mod receipts;
pub mod transport;

// Re-export the component crates for convenience to applications
pub use veriden_crypto as crypto;
pub use veriden_jose as jose;
pub use veriden_keystore as keystore;
pub use veriden_pairwise as pairwise;
pub use veriden_resolver as resolver;

/// Veriden client holding the key store, providers and resolution every
/// operation shares
#[derive(Clone)]
pub struct Veriden {
    pub(crate) inner: Arc<SharedState>,
}

/// Private SharedState struct for the client to use internally
pub(crate) struct SharedState {
    pub(crate) config: VeridenConfig,
    pub(crate) registry: ProviderRegistry,
    pub(crate) key_store: MemoryKeyStore,
    pub(crate) documents: Arc<StaticResolver>,
    pub(crate) resolver: CachingResolver,
}

/// Resolves locally registered documents first and hands anything unknown
/// to the configured fallback
struct RegistryFirst {
    local: Arc<StaticResolver>,
    fallback: Arc<dyn Resolver>,
}

impl Resolver for RegistryFirst {
    fn resolve<'a>(
        &'a self,
        did: &'a str,
    ) -> Pin<Box<dyn Future<Output = veriden_resolver::Result<IdentifierDocument>> + Send + 'a>>
    {
        Box::pin(async move {
            match self.local.resolve(did).await {
                Err(ResolverError::NotFound(_)) => self.fallback.resolve(did).await,
                resolved => resolved,
            }
        })
    }
}

impl Veriden {
    pub async fn new(mut config: VeridenConfig) -> Result<Self> {
        let registry = ProviderRegistry::with_default_providers();
        let key_store = MemoryKeyStore::new();

        // Seed the pairwise derivation chain
        // The seed is taken out of the config itself, the key store holds
        // it from here
        match config.seed.take() {
            Some(seed) => import_seed(&key_store, &config.seed_reference, &seed, &registry).await?,
            None => generate_seed(&key_store, &config.seed_reference, &registry).await?,
        }

        let documents = Arc::new(StaticResolver::new());
        let inner: Arc<dyn Resolver> = match &config.resolver {
            Some(fallback) => Arc::new(RegistryFirst {
                local: documents.clone(),
                fallback: fallback.clone(),
            }),
            None => documents.clone(),
        };
        let resolver = CachingResolver::new(config.resolver_config.clone(), inner);

        Ok(Veriden {
            inner: Arc::new(SharedState {
                config,
                registry,
                key_store,
                documents,
                resolver,
            }),
        })
    }

    /// The provider registry operations dispatch through
    pub fn registry(&self) -> &ProviderRegistry {
        &self.inner.registry
    }

    /// The key store holding this client's keys
    pub fn key_store(&self) -> &MemoryKeyStore {
        &self.inner.key_store
    }

    /// The resolver verification runs against
    pub fn resolver(&self) -> &CachingResolver {
        &self.inner.resolver
    }

    /// The local document registry created identifiers publish to
    pub fn documents(&self) -> &StaticResolver {
        &self.inner.documents
    }

    /// Create a named persona: a fresh signing key pair saved in the key
    /// store and a local identifier document carrying the public half
    pub async fn create_persona(&self, name: &str) -> Result<Identifier> {
        let algorithm = &self.inner.config.default_algorithm;
        let generated = self.inner.registry.generate_key_pair(
            &Algorithm::new(algorithm),
            false,
            &[KeyUsage::Sign, KeyUsage::Verify],
        )?;
        let KeyMaterial::Jwk(jwk) = generated.private_key.material() else {
            return Err(VeridenError::Identifier(
                "Generated signing key is not a JWK".into(),
            ));
        };

        let pair = KeyPair::new(PrivateKey::new(jwk.clone())?)?;
        let key_reference = format!("{name}-signing");
        self.register(name, &key_reference, pair).await
    }

    /// Create the pairwise identifier between a persona and one peer
    ///
    /// Derivation is deterministic: the same persona and peer always come
    /// back to the same identifier and key, on this client or any other
    /// restored from the same seed.
    pub async fn create_pairwise(
        &self,
        persona: &Identifier,
        peer_did: &str,
    ) -> Result<Identifier> {
        let state = &self.inner;
        let master = persona_master_key(
            &state.key_store,
            &state.config.seed_reference,
            &persona.id,
            &state.registry,
        )
        .await?;
        let pair = derive_pairwise_key(
            &state.registry,
            &master,
            peer_did,
            &state.config.default_algorithm,
        )?;

        let name = pairwise_identifier_name(peer_did);
        let key_reference = format!("{}-{name}", persona.name);
        self.register(&name, &key_reference, pair).await
    }

    /// Mint the local identifier for a signing pair: the private half goes
    /// into the key store, the document carrying the public half into the
    /// document registry
    async fn register(&self, name: &str, key_reference: &str, pair: KeyPair) -> Result<Identifier> {
        let state = &self.inner;
        let did = format!(
            "did:{}:{}",
            state.config.method,
            pair.public_key.thumbprint()
        );
        let kid = format!("{did}#{key_reference}");
        let pair = pair.with_key_id(&kid);

        let entry = PublicKeyEntry {
            id: kid,
            type_: verification_type(&pair.public_key.algorithm()?).to_string(),
            controller: Some(did.clone()),
            public_key_jwk: pair.public_key.jwk().clone(),
            property_set: HashMap::new(),
        };
        state
            .key_store
            .save_non_extractable(key_reference, StoredKey::Private(pair.private_key))
            .await?;

        let document = IdentifierDocument::new(&did).with_public_key(entry);
        state.documents.insert(document.clone()).await;
        debug!("Registered identifier ({did}) as ({name})");

        Ok(Identifier {
            id: did,
            name: name.to_string(),
            document,
            signature_key_reference: key_reference.to_string(),
        })
    }

    /// Sign a payload as an identifier
    ///
    /// The token's protected header carries the identifier's kid, so
    /// anyone resolving it can verify.
    pub async fn sign(
        &self,
        identifier: &Identifier,
        payload: impl Into<Vec<u8>>,
    ) -> Result<JwsToken> {
        let mut token = JwsToken::new(payload);
        token
            .sign(
                &identifier.signature_key_reference,
                &self.inner.key_store,
                &self.inner.registry,
                SignOptions::default(),
            )
            .await?;
        Ok(token)
    }

    /// Verify every signature on a token against the key its kid resolves to
    pub async fn verify(&self, token: &JwsToken) -> Result<()> {
        verify_with_resolver(token, &self.inner.resolver, &self.inner.registry).await?;
        Ok(())
    }

    /// Send a signed revocation request and unwrap the receipt the service
    /// answers with
    pub async fn submit_revocation<T: Transport>(
        &self,
        transport: &T,
        url: &str,
        signed_request: &str,
    ) -> Result<RevocationReceipt> {
        receipts::submit_revocation(
            transport,
            url,
            signed_request,
            &self.inner.resolver,
            &self.inner.registry,
        )
        .await
    }
}

/// Verification method type string documents carry for a signing algorithm
fn verification_type(algorithm: &str) -> &'static str {
    match algorithm {
        "ES256K" => "EcdsaSecp256k1VerificationKey2019",
        "EdDSA" => "Ed25519VerificationKey2018",
        _ => "JsonWebKey2020",
    }
}
