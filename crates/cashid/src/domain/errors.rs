//! # CashID Error Taxonomy
//!
//! The protocol defines a closed catalogue of failure conditions, each with a
//! stable numeric status code. Codes are grouped by tier:
//!
//! - `1xx`: request encoding/validity errors
//! - `2xx`: response structure/semantic errors
//! - `3xx`: service-level policy errors (reserved for layers built on top
//!   of this engine)
//!
//! Status code `0` (authentication successful) is not an error; it is
//! recorded on the stored request at consumption time.

use thiserror::Error;

/// Status code written to a stored request when validation succeeds.
pub const STATUS_AUTHENTICATION_SUCCESSFUL: u16 = 0;

/// Every failure the protocol engine can surface.
///
/// One variant per taxonomy entry. Variants that matter for diagnostics carry
/// the request nonce and/or the list of missing metadata fields, so callers
/// can machine-branch on the kind without parsing messages.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CashIdError {
    /// The request could not be parsed as a URL at all.
    #[error("request broken")]
    RequestBroken,

    /// The request URL carries no scheme.
    #[error("request missing scheme")]
    RequestMissingScheme,

    /// The request URL carries no domain component.
    #[error("request missing domain")]
    RequestMissingDomain,

    /// The request URL carries no `x=` nonce parameter.
    #[error("request missing nonce")]
    RequestMissingNonce,

    /// The URL scheme is not the protocol's reserved `cashid` scheme.
    #[error("request does not appear to be a cashid request")]
    NotARequest,

    /// The domain component is not a plain host name.
    #[error("request malformed domain")]
    RequestMalformedDomain,

    /// A compact field list contained a character that cannot be decoded:
    /// either a code before any namespace letter, or an unknown
    /// (namespace, code) pair.
    #[error("malformed field list at {character:?}")]
    MalformedFieldList { character: char },

    /// A field name is not part of the catalogue.
    #[error("unsupported metadata field: {field}")]
    UnsupportedField { field: String },

    /// The request names a domain this service does not answer for.
    #[error("request invalid domain")]
    RequestInvalidDomain,

    /// The nonce is unknown (server-initiated) or outside the freshness
    /// window (user-initiated).
    #[error("request invalid nonce: {nonce}")]
    RequestInvalidNonce { nonce: String },

    /// The responded request URL differs from the one that was issued.
    #[error("request altered: {nonce}")]
    RequestAltered { nonce: String },

    /// The request is past its acceptance window.
    #[error("request expired: {nonce}")]
    RequestExpired { nonce: String },

    /// The request was already validated once; replays are rejected.
    #[error("request consumed: {nonce}")]
    RequestConsumed { nonce: String },

    /// The response payload is not a structured object.
    #[error("response broken")]
    ResponseBroken,

    /// The response payload carries no request URL.
    #[error("response missing request")]
    ResponseMissingRequest,

    /// The response payload carries no address.
    #[error("response missing address: {nonce}")]
    ResponseMissingAddress { nonce: String },

    /// The response payload carries no signature.
    #[error("response missing signature: {nonce}")]
    ResponseMissingSignature { nonce: String },

    /// One or more required metadata fields are absent or empty. Carries the
    /// complete missing-field list; the check does not short-circuit.
    #[error("response missing metadata ({nonce}): {fields:?}")]
    ResponseMissingMetadata { nonce: String, fields: Vec<String> },

    /// The address is not valid, or carries the internal network prefix.
    #[error("response malformed address: {nonce}")]
    ResponseMalformedAddress { nonce: String },

    /// The signature is not syntactically valid.
    #[error("response malformed signature")]
    ResponseMalformedSignature,

    /// The metadata mapping is not well formed.
    #[error("response malformed metadata")]
    ResponseMalformedMetadata,

    /// The response used an unsupported method.
    #[error("response invalid method")]
    ResponseInvalidMethod,

    /// The address does not belong to the responding identity.
    #[error("response invalid address")]
    ResponseInvalidAddress,

    /// Signature verification over the verbatim request URL failed.
    #[error("response invalid signature")]
    ResponseInvalidSignature,

    /// Metadata values failed service-side validation.
    #[error("response invalid metadata")]
    ResponseInvalidMetadata,

    /// The service is misconfigured or unavailable.
    #[error("service broken")]
    ServiceBroken,

    /// Policy: this address is denied.
    #[error("service address denied")]
    ServiceAddressDenied,

    /// Policy: this address has been revoked.
    #[error("service address revoked")]
    ServiceAddressRevoked,

    /// Policy: this action is denied.
    #[error("service action denied")]
    ServiceActionDenied,

    /// Policy: this action is currently unavailable.
    #[error("service action unavailable")]
    ServiceActionUnavailable,

    /// Policy: this action is not implemented.
    #[error("service action not implemented")]
    ServiceActionNotImplemented,

    /// An injected adapter failed; the engine performs no retries.
    #[error("service internal error: {0}")]
    ServiceInternalError(String),
}

impl CashIdError {
    /// Stable numeric status code for this failure kind.
    pub fn code(&self) -> u16 {
        match self {
            CashIdError::RequestBroken => 100,
            CashIdError::RequestMissingScheme => 111,
            CashIdError::RequestMissingDomain => 112,
            CashIdError::RequestMissingNonce => 113,
            CashIdError::NotARequest => 121,
            CashIdError::RequestMalformedDomain => 122,
            CashIdError::MalformedFieldList { .. } => 123,
            CashIdError::UnsupportedField { .. } => 124,
            CashIdError::RequestInvalidDomain => 131,
            CashIdError::RequestInvalidNonce { .. } => 132,
            CashIdError::RequestAltered { .. } => 141,
            CashIdError::RequestExpired { .. } => 142,
            CashIdError::RequestConsumed { .. } => 143,
            CashIdError::ResponseBroken => 200,
            CashIdError::ResponseMissingRequest => 211,
            CashIdError::ResponseMissingAddress { .. } => 212,
            CashIdError::ResponseMissingSignature { .. } => 213,
            CashIdError::ResponseMissingMetadata { .. } => 214,
            CashIdError::ResponseMalformedAddress { .. } => 221,
            CashIdError::ResponseMalformedSignature => 222,
            CashIdError::ResponseMalformedMetadata => 223,
            CashIdError::ResponseInvalidMethod => 231,
            CashIdError::ResponseInvalidAddress => 232,
            CashIdError::ResponseInvalidSignature => 233,
            CashIdError::ResponseInvalidMetadata => 234,
            CashIdError::ServiceBroken => 300,
            CashIdError::ServiceAddressDenied => 311,
            CashIdError::ServiceAddressRevoked => 312,
            CashIdError::ServiceActionDenied => 321,
            CashIdError::ServiceActionUnavailable => 322,
            CashIdError::ServiceActionNotImplemented => 323,
            CashIdError::ServiceInternalError(_) => 331,
        }
    }

    /// The nonce attached to this error, when the failure occurred after the
    /// request URL decoded successfully.
    pub fn nonce(&self) -> Option<&str> {
        match self {
            CashIdError::RequestInvalidNonce { nonce }
            | CashIdError::RequestAltered { nonce }
            | CashIdError::RequestExpired { nonce }
            | CashIdError::RequestConsumed { nonce }
            | CashIdError::ResponseMissingAddress { nonce }
            | CashIdError::ResponseMissingSignature { nonce }
            | CashIdError::ResponseMissingMetadata { nonce, .. }
            | CashIdError::ResponseMalformedAddress { nonce } => Some(nonce),
            _ => None,
        }
    }
}
