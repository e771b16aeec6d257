/*!
 * Transport collaborator
 *
 * The SDK never owns a network stack. Anything that can carry a request
 * body to a URL and report the outcome implements [Transport].
 */

use crate::errors::Result;

/// Outcome of one transport exchange
#[derive(Debug, Clone)]
pub struct TransportResponse {
    /// Whether the service accepted the request
    pub success: bool,

    /// Raw response body
    pub body: String,
}

/// Carries requests to services on behalf of the SDK
#[allow(async_fn_in_trait)]
pub trait Transport {
    /// POST `body` to `url`
    async fn post(&self, url: &str, body: &str) -> Result<TransportResponse>;
}
