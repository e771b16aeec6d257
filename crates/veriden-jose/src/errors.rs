/*!
 * JOSE Errors
 */

use thiserror::Error;

/// Veriden JOSE Errors
#[derive(Error, Debug)]
pub enum JoseError {
    /// The kid doesn't follow the `<did>#<fragment>` form
    #[error("Malformed kid: {0}")]
    MalformedKid(String),

    /// A token or header that can't be parsed
    #[error("Malformed token: {0}")]
    MalformedToken(String),

    /// The kid resolved to a document without a matching key
    #[error("Could not find key {0}")]
    KeyNotFound(String),

    /// Verification failed. Always reported for the token as a whole.
    #[error("Token rejected: {0}")]
    TokenRejected(String),

    #[error("Serde error: {0}")]
    SerdeError(#[from] serde_json::Error),

    #[error("Crypto error: {0}")]
    Crypto(#[from] veriden_crypto::CryptoError),

    #[error("Key store error: {0}")]
    KeyStore(#[from] veriden_keystore::errors::KeyStoreError),

    #[error("Resolver error: {0}")]
    Resolver(#[from] veriden_resolver::ResolverError),
}

pub type Result<T> = std::result::Result<T, JoseError>;
