//! Built-in algorithm providers
//!
//! Each submodule implements [`Provider`](crate::Provider) for one JOSE
//! algorithm family. [`default_providers`] collects the full set that
//! [`ProviderRegistry::with_default_providers`](crate::ProviderRegistry::with_default_providers)
//! installs.

use std::sync::Arc;

use crate::provider::Provider;

pub mod aes_gcm;
pub mod ed25519;
pub mod hkdf;
pub mod hmac;
pub mod p256;
pub mod secp256k1;
pub mod sha;

/// Every provider this crate ships with
pub fn default_providers() -> Vec<Arc<dyn Provider>> {
    vec![
        Arc::new(secp256k1::Secp256k1Provider),
        Arc::new(p256::P256Provider),
        Arc::new(ed25519::Ed25519Provider),
        Arc::new(hmac::HmacProvider::sha256()),
        Arc::new(hmac::HmacProvider::sha512()),
        Arc::new(aes_gcm::AesGcmProvider),
        Arc::new(hkdf::HkdfProvider),
        Arc::new(sha::ShaProvider::sha256()),
        Arc::new(sha::ShaProvider::sha512()),
    ]
}
