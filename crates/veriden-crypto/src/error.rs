//! Error types for cryptographic operations

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CryptoError {
    /// No provider is registered under the requested algorithm name
    #[error("Unknown algorithm: {0}")]
    UnknownAlgorithm(String),

    /// The provider exists but doesn't implement the requested operation
    #[error("Algorithm {algorithm} doesn't support {operation}")]
    UnsupportedOperation {
        algorithm: String,
        operation: String,
    },

    #[error("Algorithm {algorithm} requires parameter {parameter}")]
    MissingParameter {
        algorithm: String,
        parameter: &'static str,
    },

    #[error("Invalid parameter {parameter}: {reason}")]
    InvalidParameter {
        parameter: &'static str,
        reason: String,
    },

    #[error("Key error: {0}")]
    KeyError(String),

    #[error("Key format error: {0}")]
    KeyFormat(String),

    /// The key's declared usages or kind forbid the requested operation
    #[error("Key can't be used: {0}")]
    UsageDenied(String),

    #[error("Key material isn't extractable")]
    NotExtractable,

    #[error("Decoding error: {0}")]
    Decoding(String),

    #[error("Unsupported key type: {0}")]
    UnsupportedKeyType(String),

    #[error("Operation failed: {0}")]
    OperationFailed(String),
}

pub type Result<T> = std::result::Result<T, CryptoError>;
