//! Name-keyed dispatch to algorithm providers

use std::sync::Arc;

use ahash::AHashMap;
use tracing::debug;
use zeroize::Zeroizing;

use crate::{
    Algorithm, CryptoError, JWK,
    error::Result,
    key::{CryptoKey, CryptoKeyPair, KeyUsage},
    provider::{KeyFormat, Provider},
    providers::default_providers,
};

/// Case-insensitive name → provider table.
///
/// Built once at configuration time with `new`/`register`; every operation
/// afterwards takes `&self`, so a registry behind an `Arc` is safe to share
/// across tasks.
pub struct ProviderRegistry {
    providers: AHashMap<String, Arc<dyn Provider>>,
}

impl ProviderRegistry {
    pub fn new(providers: Vec<Arc<dyn Provider>>) -> Self {
        let mut registry = ProviderRegistry {
            providers: AHashMap::new(),
        };
        for provider in providers {
            registry.register(provider);
        }
        registry
    }

    /// Registry with every built-in provider
    pub fn with_default_providers() -> Self {
        Self::new(default_providers())
    }

    /// Registers a provider under its declared name. A later registration
    /// under the same name replaces the earlier one.
    pub fn register(&mut self, provider: Arc<dyn Provider>) {
        let name = provider.name().to_ascii_lowercase();
        debug!("registered algorithm provider {name}");
        self.providers.insert(name, provider);
    }

    pub fn has_provider(&self, name: &str) -> bool {
        self.providers.contains_key(&name.to_ascii_lowercase())
    }

    fn provider(&self, name: &str) -> Result<&Arc<dyn Provider>> {
        self.providers
            .get(&name.to_ascii_lowercase())
            .ok_or_else(|| CryptoError::UnknownAlgorithm(name.to_string()))
    }

    pub fn encrypt(&self, algorithm: &Algorithm, key: &CryptoKey, data: &[u8]) -> Result<Vec<u8>> {
        let provider = self.provider(&algorithm.name)?;
        key.check_algorithm(provider.name())?;
        key.check_usage(KeyUsage::Encrypt)?;
        provider.encrypt(algorithm, key, data)
    }

    pub fn decrypt(&self, algorithm: &Algorithm, key: &CryptoKey, data: &[u8]) -> Result<Vec<u8>> {
        let provider = self.provider(&algorithm.name)?;
        key.check_algorithm(provider.name())?;
        key.check_usage(KeyUsage::Decrypt)?;
        provider.decrypt(algorithm, key, data)
    }

    pub fn sign(&self, algorithm: &Algorithm, key: &CryptoKey, data: &[u8]) -> Result<Vec<u8>> {
        let provider = self.provider(&algorithm.name)?;
        key.check_algorithm(provider.name())?;
        key.check_usage(KeyUsage::Sign)?;
        provider.sign(algorithm, key, data)
    }

    pub fn verify(
        &self,
        algorithm: &Algorithm,
        key: &CryptoKey,
        signature: &[u8],
        data: &[u8],
    ) -> Result<bool> {
        let provider = self.provider(&algorithm.name)?;
        key.check_algorithm(provider.name())?;
        key.check_usage(KeyUsage::Verify)?;
        provider.verify(algorithm, key, signature, data)
    }

    pub fn digest(&self, algorithm: &Algorithm, data: &[u8]) -> Result<Vec<u8>> {
        self.provider(&algorithm.name)?.digest(algorithm, data)
    }

    pub fn generate_key(
        &self,
        algorithm: &Algorithm,
        extractable: bool,
        usages: &[KeyUsage],
    ) -> Result<CryptoKey> {
        self.provider(&algorithm.name)?
            .generate_key(algorithm, extractable, usages)
    }

    pub fn generate_key_pair(
        &self,
        algorithm: &Algorithm,
        extractable: bool,
        usages: &[KeyUsage],
    ) -> Result<CryptoKeyPair> {
        self.provider(&algorithm.name)?
            .generate_key_pair(algorithm, extractable, usages)
    }

    pub fn derive_bits(
        &self,
        algorithm: &Algorithm,
        base_key: &CryptoKey,
        length: u64,
    ) -> Result<Vec<u8>> {
        let provider = self.provider(&algorithm.name)?;
        base_key.check_algorithm(provider.name())?;
        base_key.check_usage(KeyUsage::DeriveBits)?;
        provider.derive_bits(algorithm, base_key, length)
    }

    /// Derives a new key: the target algorithm's provider validates the
    /// requested parameters, the source provider produces the bits, and the
    /// result is imported as a key of the target algorithm.
    pub fn derive_key(
        &self,
        algorithm: &Algorithm,
        base_key: &CryptoKey,
        derived_algorithm: &Algorithm,
        extractable: bool,
        usages: &[KeyUsage],
    ) -> Result<CryptoKey> {
        let target = self.provider(&derived_algorithm.name)?;
        target.check_derived_key_params(derived_algorithm)?;
        let length =
            derived_algorithm
                .length()
                .ok_or_else(|| CryptoError::MissingParameter {
                    algorithm: derived_algorithm.name.clone(),
                    parameter: "length",
                })?;

        let source = self.provider(&algorithm.name)?;
        base_key.check_algorithm(source.name())?;
        base_key.check_usage(KeyUsage::DeriveKey)?;

        let bits = Zeroizing::new(source.derive_bits(algorithm, base_key, length)?);
        target.import_raw(derived_algorithm, &bits, extractable, usages)
    }

    pub fn import_key(
        &self,
        format: KeyFormat,
        data: &[u8],
        algorithm: &Algorithm,
        extractable: bool,
        usages: &[KeyUsage],
    ) -> Result<CryptoKey> {
        let provider = self.provider(&algorithm.name)?;
        match format {
            KeyFormat::Raw => provider.import_raw(algorithm, data, extractable, usages),
            KeyFormat::Jwk => {
                let jwk: JWK = serde_json::from_slice(data)
                    .map_err(|e| CryptoError::KeyFormat(format!("Couldn't parse JWK: {e}")))?;
                provider.import_jwk(algorithm, &jwk, extractable, usages)
            }
        }
    }

    pub fn import_jwk(
        &self,
        jwk: &JWK,
        algorithm: &Algorithm,
        extractable: bool,
        usages: &[KeyUsage],
    ) -> Result<CryptoKey> {
        self.provider(&algorithm.name)?
            .import_jwk(algorithm, jwk, extractable, usages)
    }

    pub fn export_key(&self, format: KeyFormat, key: &CryptoKey) -> Result<Vec<u8>> {
        if !key.extractable {
            return Err(CryptoError::NotExtractable);
        }
        let provider = self.provider(&key.algorithm)?;
        match format {
            KeyFormat::Raw => provider.export_raw(key),
            KeyFormat::Jwk => {
                let jwk = provider.export_jwk(key)?;
                serde_json::to_vec(&jwk)
                    .map_err(|e| CryptoError::KeyFormat(format!("Couldn't serialize JWK: {e}")))
            }
        }
    }

    pub fn export_jwk(&self, key: &CryptoKey) -> Result<JWK> {
        if !key.extractable {
            return Err(CryptoError::NotExtractable);
        }
        self.provider(&key.algorithm)?.export_jwk(key)
    }

    /// Exports a key and encrypts the result under the wrapping key
    pub fn wrap_key(
        &self,
        format: KeyFormat,
        key: &CryptoKey,
        wrapping_key: &CryptoKey,
        wrap_algorithm: &Algorithm,
    ) -> Result<Vec<u8>> {
        let provider = self.provider(&wrap_algorithm.name)?;
        wrapping_key.check_algorithm(provider.name())?;
        wrapping_key.check_usage(KeyUsage::WrapKey)?;

        let material = Zeroizing::new(self.export_key(format, key)?);
        provider.encrypt(wrap_algorithm, wrapping_key, &material)
    }

    /// Decrypts wrapped material and imports it as a key of the unwrapped
    /// algorithm
    #[allow(clippy::too_many_arguments)]
    pub fn unwrap_key(
        &self,
        format: KeyFormat,
        wrapped: &[u8],
        unwrapping_key: &CryptoKey,
        unwrap_algorithm: &Algorithm,
        unwrapped_algorithm: &Algorithm,
        extractable: bool,
        usages: &[KeyUsage],
    ) -> Result<CryptoKey> {
        let provider = self.provider(&unwrap_algorithm.name)?;
        unwrapping_key.check_algorithm(provider.name())?;
        unwrapping_key.check_usage(KeyUsage::UnwrapKey)?;

        let material = Zeroizing::new(provider.decrypt(unwrap_algorithm, unwrapping_key, wrapped)?);
        self.import_key(format, &material, unwrapped_algorithm, extractable, usages)
    }
}
