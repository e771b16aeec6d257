/*!
 * Veriden SDK Errors
 */

use thiserror::Error;

/// Veriden SDK Errors
#[derive(Error, Debug)]
pub enum VeridenError {
    /// Creating or registering an identifier failed
    #[error("Identifier error: {0}")]
    Identifier(String),

    /// A receipt response that can't be used
    #[error("Receipt error: {0}")]
    Receipt(String),

    /// The transport collaborator reported a failed exchange
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Serde error: {0}")]
    SerdeError(#[from] serde_json::Error),

    #[error("Crypto error: {0}")]
    Crypto(#[from] veriden_crypto::CryptoError),

    #[error("Key store error: {0}")]
    KeyStore(#[from] veriden_keystore::errors::KeyStoreError),

    #[error("Resolver error: {0}")]
    Resolver(#[from] veriden_resolver::ResolverError),

    #[error("JOSE error: {0}")]
    Jose(#[from] veriden_jose::JoseError),

    #[error("Pairwise error: {0}")]
    Pairwise(#[from] veriden_pairwise::errors::PairwiseError),
}

pub type Result<T> = std::result::Result<T, VeridenError>;
