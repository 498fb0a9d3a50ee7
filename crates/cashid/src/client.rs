//! # Client-Side Helpers
//!
//! What an identity manager needs to answer a request: decode the URL to see
//! which fields the service wants, then build and sign a response payload.

use std::collections::BTreeMap;

use crate::domain::codec;
use crate::domain::entities::{RequestDescriptor, ResponsePayload};
use crate::domain::errors::CashIdError;
use crate::ports::outbound::SignatureProvider;

/// Decode a request URL. Thin alias over the codec for client-side use.
pub fn parse_request(request_url: &str) -> Result<RequestDescriptor, CashIdError> {
    codec::decode(request_url)
}

/// Build a response payload for a request.
///
/// Rejects the build early when the supplied metadata leaves required fields
/// empty, so broken responses are caught before anything is signed. With a
/// key, the address is derived and the verbatim request URL is signed through
/// the provider; without one the payload is returned unsigned for the caller
/// to complete.
pub async fn create_response<P: SignatureProvider>(
    provider: &P,
    request_url: &str,
    metadata: BTreeMap<String, String>,
    key: Option<&str>,
) -> Result<ResponsePayload, CashIdError> {
    let parsed = codec::decode(request_url)?;
    let nonce = parsed.nonce.unwrap_or_default();

    let missing: Vec<String> = parsed
        .required
        .iter()
        .filter(|field| metadata.get(field.as_str()).map_or(true, |v| v.is_empty()))
        .cloned()
        .collect();
    if !missing.is_empty() {
        return Err(CashIdError::ResponseMissingMetadata {
            nonce,
            fields: missing,
        });
    }

    let mut payload = ResponsePayload {
        request: request_url.to_string(),
        metadata,
        ..ResponsePayload::default()
    };
    if let Some(key) = key {
        payload.address = provider.derive_address(key).await?;
        payload.signature = provider.sign(key, request_url).await?;
    }
    Ok(payload)
}
