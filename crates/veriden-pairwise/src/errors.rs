//! Pairwise derivation error types

use thiserror::Error;
use veriden_crypto::CryptoError;
use veriden_keystore::errors::KeyStoreError;

#[derive(Error, Debug)]
pub enum PairwiseError {
    /// The persona was never seeded, nothing can be derived
    #[error("Missing seed: nothing saved under ({0})")]
    MissingSeed(String),

    #[error("Invalid peer DID: {0}")]
    InvalidPeerDid(String),

    /// The derivation math itself failed
    #[error("Derivation error: {0}")]
    Derivation(String),

    #[error("Crypto error: {0}")]
    Crypto(#[from] CryptoError),

    #[error("Key store error: {0}")]
    KeyStore(#[from] KeyStoreError),
}

pub type Result<T> = std::result::Result<T, PairwiseError>;
