/*!
 * Receipts of credential activity
 *
 * [Receipt] records what a relying party did with a credential.
 * Revocation services answer with a signed token wrapping a
 * [RevocationReceipt]; [unwrap_signed_receipt] verifies that token
 * before anything is parsed out of it.
 */

use std::collections::HashMap;

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tracing::debug;
use veriden_crypto::ProviderRegistry;
use veriden_jose::{JwsToken, verify_with_resolver};
use veriden_resolver::Resolver;

use crate::{
    errors::{Result, VeridenError},
    transport::Transport,
};

/// What a relying party did with a credential
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum ReceiptAction {
    Issuance,
    Presentation,
}

/// Record of one credential exchange, kept in the card store
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Receipt {
    pub action: ReceiptAction,

    /// Identifier of the relying party
    pub entity_identifier: String,

    /// When the exchange happened, in seconds since the epoch
    pub activity_date: i64,

    pub entity_name: String,

    /// Credential the exchange was about
    pub vc_id: String,
}

/// Receipt a revocation service returns inside its signed token
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RevocationReceipt {
    /// Token id of the receipt
    pub jti: String,

    /// Identifier of the revocation service
    pub iss: String,

    /// When the revocation was recorded, in seconds since the epoch
    pub iat: i64,

    /// Relying parties the revocation was announced to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relying_party_list: Option<Vec<String>>,
}

/// Body a revocation endpoint answers with: signed receipts keyed by
/// credential id
#[derive(Debug, Deserialize)]
struct RevocationResponse {
    receipt: HashMap<String, String>,
}

/// Parse a signed receipt token, verifying it first
///
/// Every signature must validate against the key its kid resolves to.
/// Nothing is parsed out of a token that doesn't verify.
pub async fn unwrap_signed_receipt<T: DeserializeOwned>(
    serialized: &str,
    resolver: &dyn Resolver,
    registry: &ProviderRegistry,
) -> Result<T> {
    let token = JwsToken::deserialize(serialized)?;
    verify_with_resolver(&token, resolver, registry).await?;
    Ok(serde_json::from_str(&token.content()?)?)
}

/// Send a signed revocation request and unwrap the receipt that comes back
pub async fn submit_revocation<T: Transport>(
    transport: &T,
    url: &str,
    signed_request: &str,
    resolver: &dyn Resolver,
    registry: &ProviderRegistry,
) -> Result<RevocationReceipt> {
    debug!("Submitting revocation request to ({url})");
    let response = transport.post(url, signed_request).await?;
    if !response.success {
        return Err(VeridenError::Transport(format!(
            "Revocation request to ({url}) failed: {}",
            response.body
        )));
    }

    let response: RevocationResponse = serde_json::from_str(&response.body)?;
    let Some(receipt) = response.receipt.into_values().next() else {
        return Err(VeridenError::Receipt(
            "Revocation response carries no receipt".into(),
        ));
    };
    unwrap_signed_receipt(&receipt, resolver, registry).await
}
