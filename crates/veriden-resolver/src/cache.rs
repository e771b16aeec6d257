//! Caching front end for identifier resolution
//!
//! Checks the identifier's shape and size before anything else, serves
//! repeat lookups from a moka cache, and bounds how long a single
//! resolution may run.

use std::{future::Future, pin::Pin, sync::Arc, time::Duration};

use moka::future::Cache;
use tracing::debug;

use crate::{
    Resolver,
    config::ResolverConfig,
    document::IdentifierDocument,
    errors::{ResolverError, Result},
};

/// Caches documents in front of an inner resolver
#[derive(Clone)]
pub struct CachingResolver {
    config: ResolverConfig,
    inner: Arc<dyn Resolver>,
    cache: Cache<String, IdentifierDocument>,
}

impl CachingResolver {
    pub fn new(config: ResolverConfig, inner: Arc<dyn Resolver>) -> Self {
        let cache = Cache::builder()
            .max_capacity(config.cache_capacity.into())
            .time_to_live(Duration::from_secs(config.cache_ttl.into()))
            .build();
        CachingResolver {
            config,
            inner,
            cache,
        }
    }

    /// Front end for resolving an identifier
    ///
    /// Checks the cache first; on a miss, runs the inner resolver under the
    /// configured timeout and caches the result.
    pub async fn resolve(&self, did: &str) -> Result<IdentifierDocument> {
        if did.len() > self.config.max_did_size_in_bytes {
            return Err(ResolverError::DID(format!(
                "The DID size of {}bytes exceeds the limit of {}",
                did.len(),
                self.config.max_did_size_in_bytes
            )));
        }

        let parts: Vec<&str> = did.split(':').collect();
        if parts.len() < 3 || parts[0] != "did" {
            return Err(ResolverError::DID(format!("did isn't to spec! did ({did})")));
        }

        if let Some(document) = self.cache.get(did).await {
            debug!("found did ({did}) in cache");
            return Ok(document);
        }
        debug!("did ({did}) NOT in cache");

        let document = match tokio::time::timeout(
            self.config.resolution_timeout,
            self.inner.resolve(did),
        )
        .await
        {
            Ok(resolved) => resolved?,
            Err(_) => return Err(ResolverError::Timeout(self.config.resolution_timeout)),
        };

        debug!("adding did ({did}) to cache");
        self.cache.insert(did.to_string(), document.clone()).await;
        Ok(document)
    }

    /// Removes the specified identifier from the cache
    ///
    /// Returns the removed document if it was cached, or None if it was not
    pub async fn remove(&self, did: &str) -> Option<IdentifierDocument> {
        self.cache.remove(did).await
    }

    /// Add a document to the cache manually
    pub async fn add_document(&self, did: &str, document: IdentifierDocument) {
        debug!("manually adding did ({did}) to cache");
        self.cache.insert(did.to_string(), document).await;
    }
}

impl Resolver for CachingResolver {
    fn resolve<'a>(
        &'a self,
        did: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<IdentifierDocument>> + Send + 'a>> {
        Box::pin(CachingResolver::resolve(self, did))
    }
}
