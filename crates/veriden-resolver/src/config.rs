//! Handles the configuration for the caching resolver.
//!
//! Call the [ResolverConfigBuilder] to create a new configuration.
//!
//! Example: defaults
//! ```rust
//! use veriden_resolver::config::ResolverConfigBuilder;
//! let config = ResolverConfigBuilder::default().build();
//! ```
//!
//! Example: custom settings
//! ```rust
//! use veriden_resolver::config::ResolverConfigBuilder;
//! let config = ResolverConfigBuilder::default()
//!     .with_cache_capacity(500)
//!     .with_cache_ttl(60)
//!     .with_resolution_timeout(10_000)
//!     .build();
//! ```

use std::time::Duration;

/// Configuration for the caching resolver.
///
/// Use the [ResolverConfigBuilder] to create a new configuration.
#[derive(Clone, Debug)]
pub struct ResolverConfig {
    pub(crate) cache_capacity: u32,
    pub(crate) cache_ttl: u32,
    pub(crate) resolution_timeout: Duration,
    pub(crate) max_did_size_in_bytes: usize,
}

/// Resolver Config Builder to construct options for the caching resolver.
///
/// - cache_capacity: The maximum number of documents to keep in the cache (default: 100).
/// - cache_ttl: The time-to-live in seconds for each cached document (default: 300 (5 Minutes)).
/// - resolution_timeout: The timeout for a single resolution in milliseconds (default: 5000 (5 seconds)).
/// - max_did_size_in_bytes: Identifiers larger than this are rejected up front (default: 1_000).
pub struct ResolverConfigBuilder {
    cache_capacity: u32,
    cache_ttl: u32,
    resolution_timeout: u32,
    max_did_size_in_bytes: usize,
}

impl Default for ResolverConfigBuilder {
    fn default() -> Self {
        Self {
            cache_capacity: 100,
            cache_ttl: 300,
            resolution_timeout: 5000,
            max_did_size_in_bytes: 1_000,
        }
    }
}

impl ResolverConfigBuilder {
    /// Set the cache capacity (approx)
    /// Default: 100 documents
    pub fn with_cache_capacity(mut self, cache_capacity: u32) -> Self {
        self.cache_capacity = cache_capacity;
        self
    }

    /// Set the time-to-live in seconds for each cached document.
    /// Default: 300 (5 Minutes)
    pub fn with_cache_ttl(mut self, cache_ttl: u32) -> Self {
        self.cache_ttl = cache_ttl;
        self
    }

    /// Set the timeout for a single resolution in milliseconds.
    /// Default: 5000 (5 seconds)
    pub fn with_resolution_timeout(mut self, resolution_timeout: u32) -> Self {
        self.resolution_timeout = resolution_timeout;
        self
    }

    /// Set maximum size in bytes of an identifier to be resolved
    /// Default: 1_000 bytes
    pub fn with_max_did_size_in_bytes(mut self, max_did_size_in_bytes: usize) -> Self {
        self.max_did_size_in_bytes = max_did_size_in_bytes;
        self
    }

    /// Build the [ResolverConfig].
    pub fn build(self) -> ResolverConfig {
        ResolverConfig {
            cache_capacity: self.cache_capacity,
            cache_ttl: self.cache_ttl,
            resolution_timeout: Duration::from_millis(self.resolution_timeout.into()),
            max_did_size_in_bytes: self.max_did_size_in_bytes,
        }
    }
}
