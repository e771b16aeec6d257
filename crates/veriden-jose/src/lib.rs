/*!
 * Veriden JOSE
 *
 * JWS tokens bound to decentralized identifiers.
 *
 * [JwsToken] carries a payload and any number of signatures, signs through
 * a [veriden_keystore::KeyStore] and round-trips the compact, flattened
 * and general JSON forms byte for byte. The [did_key] module resolves the
 * kid of each signature to a published key and verifies tokens against
 * identifier documents.
 */

pub mod did_key;
pub mod errors;
pub mod header;
pub mod token;

pub use did_key::{
    fragment_from_kid, identifier_from_kid, key_from_kid, verify_with_identifier,
    verify_with_resolver,
};
pub use errors::{JoseError, Result};
pub use header::JwsHeader;
pub use token::{JwsFormat, JwsSignature, JwsToken, SignOptions};
