/*!
 * Key Store Errors
 */

use thiserror::Error;

/// Veriden Key Store Errors
#[derive(Error, Debug)]
pub enum KeyStoreError {
    /// No key saved under the reference
    #[error("Key reference not found: {0}")]
    NotFound(String),

    /// The entry exists but doesn't allow the requested access
    #[error("Capability Error: {0}")]
    Capability(String),

    #[error("Crypto error: {0}")]
    Crypto(#[from] veriden_crypto::CryptoError),
}

pub type Result<T> = std::result::Result<T, KeyStoreError>;
