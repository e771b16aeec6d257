/*!
 * Resolver Errors
 */

use std::time::Duration;
use thiserror::Error;

/// Veriden Resolver Errors
#[derive(Error, Debug)]
pub enum ResolverError {
    /// The identifier itself is malformed or oversized
    #[error("DID error: {0}")]
    DID(String),

    /// No document exists for the identifier
    #[error("Identifier not found: {0}")]
    NotFound(String),

    #[error("Resolution timed out after {0:?}")]
    Timeout(Duration),

    #[error("Transport error: {0}")]
    Transport(String),

    /// The document came back but can't be used
    #[error("Invalid identifier document: {0}")]
    InvalidDocument(String),
}

pub type Result<T> = std::result::Result<T, ResolverError>;
