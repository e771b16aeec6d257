//! Cryptographic primitives and JWK types for Veriden
//!
//! This crate provides:
//! - JWK (JSON Web Key) types per RFC 7517, with canonical form and thumbprints
//! - Typed key wrappers (PublicKey, PrivateKey, SecretKey, KeyPair)
//! - A pluggable [`Provider`] trait plus a [`ProviderRegistry`] that dispatches
//!   sign/verify/encrypt/decrypt/digest/derive by JOSE algorithm name
//! - Built-in providers for ES256K, ES256, EdDSA, HS256/HS512, A256GCM, HKDF
//!   and SHA-256/SHA-512

mod algorithm;
mod error;
mod jwk;
mod key;
mod key_type;
mod keys;
mod provider;
pub mod providers;
mod registry;

pub use algorithm::Algorithm;
pub use error::{CryptoError, Result};
pub use jwk::{ECParams, JWK, OKPParams, OctParams, Params};
pub use key::{CryptoKey, CryptoKeyPair, KeyKind, KeyMaterial, KeyUsage};
pub use key_type::KeyType;
pub use keys::{KeyPair, PrivateKey, PublicKey, SecretKey};
pub use provider::{KeyFormat, Provider};
pub use registry::ProviderRegistry;
