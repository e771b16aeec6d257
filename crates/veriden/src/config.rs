/*!
 * Veriden SDK configuration options
 *
 * Example: defaults
 * ```rust
 * use veriden::config::VeridenConfig;
 * let config = VeridenConfig::builder().build();
 * ```
 *
 * Example: custom settings
 * ```rust
 * use veriden::config::VeridenConfig;
 * let config = VeridenConfig::builder()
 *     .with_seed(vec![7u8; 32])
 *     .with_method("example")
 *     .with_default_algorithm("EdDSA")
 *     .build();
 * ```
 */

use std::sync::Arc;

use veriden_resolver::{Resolver, ResolverConfig, ResolverConfigBuilder};
use zeroize::Zeroizing;

const DEFAULT_SEED_REFERENCE: &str = "seed";
const DEFAULT_METHOD: &str = "veriden";
const DEFAULT_ALGORITHM: &str = "ES256K";

#[derive(Clone)]
pub struct VeridenConfig {
    pub resolver: Option<Arc<dyn Resolver>>,
    pub resolver_config: ResolverConfig,
    /// Seed bytes to restore a persona from. Taken out of the config when
    /// the client starts, the key store holds them from then on.
    pub seed: Option<Zeroizing<Vec<u8>>>,
    pub seed_reference: String,
    pub method: String,
    pub default_algorithm: String,
}

impl VeridenConfig {
    /// Returns a builder for `VeridenConfig`
    pub fn builder() -> VeridenConfigBuilder {
        VeridenConfigBuilder::default()
    }
}

/// Builder for `VeridenConfig`.
///
/// - resolver: resolve identifiers created elsewhere through this (default: none,
///   only locally registered documents resolve)
/// - resolver_config: cache and timeout settings for document resolution
/// - seed: restore the persona master seed from a backup (default: a fresh
///   seed is generated on startup)
/// - seed_reference: key store reference the seed is saved under (default: "seed")
/// - method: method tag for locally minted identifiers (default: "veriden")
/// - default_algorithm: signing algorithm for new identifiers (default: "ES256K")
#[derive(Default)]
pub struct VeridenConfigBuilder {
    resolver: Option<Arc<dyn Resolver>>,
    resolver_config: Option<ResolverConfig>,
    seed: Option<Zeroizing<Vec<u8>>>,
    seed_reference: Option<String>,
    method: Option<String>,
    default_algorithm: Option<String>,
}

impl VeridenConfigBuilder {
    /// Default starting constructor for `VeridenConfigBuilder`
    pub fn new() -> VeridenConfigBuilder {
        VeridenConfigBuilder::default()
    }

    /// Build the `VeridenConfig` from the builder
    pub fn build(self) -> VeridenConfig {
        VeridenConfig {
            resolver: self.resolver,
            resolver_config: self
                .resolver_config
                .unwrap_or_else(|| ResolverConfigBuilder::default().build()),
            seed: self.seed,
            seed_reference: self
                .seed_reference
                .unwrap_or(DEFAULT_SEED_REFERENCE.into()),
            method: self.method.unwrap_or(DEFAULT_METHOD.into()),
            default_algorithm: self.default_algorithm.unwrap_or(DEFAULT_ALGORITHM.into()),
        }
    }

    /// Resolve identifiers that aren't in the local document registry
    /// through this resolver
    pub fn with_resolver(mut self, resolver: Arc<dyn Resolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    /// Custom cache and timeout settings for document resolution
    pub fn with_resolver_config(mut self, resolver_config: ResolverConfig) -> Self {
        self.resolver_config = Some(resolver_config);
        self
    }

    /// Restore the persona master seed from backed-up bytes instead of
    /// generating a fresh one
    pub fn with_seed(mut self, seed: Vec<u8>) -> Self {
        self.seed = Some(Zeroizing::new(seed));
        self
    }

    /// Key store reference the master seed is saved under
    /// Default: "seed"
    pub fn with_seed_reference(mut self, seed_reference: impl Into<String>) -> Self {
        self.seed_reference = Some(seed_reference.into());
        self
    }

    /// Method tag for locally minted identifiers, the `<method>` in
    /// `did:<method>:<name>`
    /// Default: "veriden"
    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self
    }

    /// Signing algorithm new identifiers are keyed for: ES256K, ES256 or EdDSA
    /// Default: "ES256K"
    pub fn with_default_algorithm(mut self, default_algorithm: impl Into<String>) -> Self {
        self.default_algorithm = Some(default_algorithm.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = VeridenConfig::builder().build();
        assert!(config.resolver.is_none());
        assert!(config.seed.is_none());
        assert_eq!(config.seed_reference, "seed");
        assert_eq!(config.method, "veriden");
        assert_eq!(config.default_algorithm, "ES256K");
    }

    #[test]
    fn overrides() {
        let config = VeridenConfig::builder()
            .with_seed(vec![1u8; 32])
            .with_seed_reference("master")
            .with_method("example")
            .with_default_algorithm("EdDSA")
            .build();
        assert_eq!(config.seed.as_deref(), Some(&vec![1u8; 32]));
        assert_eq!(config.seed_reference, "master");
        assert_eq!(config.method, "example");
        assert_eq!(config.default_algorithm, "EdDSA");
    }
}
