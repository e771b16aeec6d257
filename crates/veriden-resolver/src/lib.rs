/*!
 * Veriden Resolver
 *
 * Turns identifiers into identifier documents.
 *
 * [Resolver] is the pluggable trait: implement it for whatever registry or
 * network your identifiers live on. [CachingResolver] wraps any resolver
 * with shape checks, a moka document cache and a resolution timeout.
 * [StaticResolver] serves a fixed set of documents, useful for fixtures
 * and local work.
 */

use std::{future::Future, pin::Pin};

use ahash::AHashMap;
use tokio::sync::RwLock;

pub mod cache;
pub mod config;
pub mod document;
pub mod errors;

pub use cache::CachingResolver;
pub use config::{ResolverConfig, ResolverConfigBuilder};
pub use document::{
    DOCUMENT_CONTEXT, Endpoint, IdentifierDocument, PublicKeyEntry, ServiceEndpoint,
};
pub use errors::{ResolverError, Result};

/// Pluggable identifier resolution
///
/// Dyn-compatible so resolvers can be composed and swapped at run time.
pub trait Resolver: Send + Sync {
    /// Resolve an identifier to its document
    fn resolve<'a>(
        &'a self,
        did: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<IdentifierDocument>> + Send + 'a>>;
}

/// Serves a fixed set of documents from memory
#[derive(Default)]
pub struct StaticResolver {
    documents: RwLock<AHashMap<String, IdentifierDocument>>,
}

impl StaticResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a document, keyed by its own id
    pub async fn insert(&self, document: IdentifierDocument) {
        self.documents
            .write()
            .await
            .insert(document.id.clone(), document);
    }

    /// Parse a JSON document and add it
    pub async fn insert_from_string(&self, document: &str) -> Result<()> {
        let document: IdentifierDocument = serde_json::from_str(document).map_err(|e| {
            ResolverError::InvalidDocument(format!("Couldn't parse identifier document: {e}"))
        })?;
        self.insert(document).await;
        Ok(())
    }
}

impl Resolver for StaticResolver {
    fn resolve<'a>(
        &'a self,
        did: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<IdentifierDocument>> + Send + 'a>> {
        Box::pin(async move {
            let documents = self.documents.read().await;
            match documents.get(did) {
                Some(document) => Ok(document.clone()),
                None => Err(ResolverError::NotFound(did.to_string())),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn serves_inserted_documents() {
        let resolver = StaticResolver::new();
        resolver
            .insert(IdentifierDocument::new("did:example:abc"))
            .await;

        let document = resolver.resolve("did:example:abc").await.unwrap();
        assert_eq!(document.id, "did:example:abc");

        assert!(matches!(
            resolver.resolve("did:example:other").await,
            Err(ResolverError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn insert_from_string_parses_documents() {
        let resolver = StaticResolver::new();
        resolver
            .insert_from_string(r#"{ "id": "did:example:abc" }"#)
            .await
            .unwrap();
        assert!(resolver.resolve("did:example:abc").await.is_ok());

        assert!(matches!(
            resolver.insert_from_string("{ not json }").await,
            Err(ResolverError::InvalidDocument(_))
        ));
    }
}
