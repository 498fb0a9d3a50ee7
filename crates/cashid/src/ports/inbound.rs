//! # Inbound Ports (Driving Ports / API)
//!
//! The public API a relying service programs against.

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::domain::entities::{IssuedRequest, RequestOptions, ResponsePayload, ValidationResult};
use crate::domain::errors::CashIdError;

/// Primary authentication API.
///
/// Implemented by [`CashIdService`](crate::service::CashIdService).
/// Implementations must be thread-safe (`Send + Sync`); the engine keeps no
/// state across calls beyond its injected collaborators.
#[async_trait]
pub trait AuthenticationApi: Send + Sync {
    /// Issue a server-initiated challenge.
    ///
    /// Stamps the service's configured domain and path onto the request,
    /// mints a nonce when none was supplied, persists the challenge in the
    /// replay store and returns the encoded URL for out-of-band delivery.
    /// `extra` is an opaque bag stored alongside the challenge and echoed
    /// back on successful validation.
    async fn create_request(
        &self,
        opts: RequestOptions,
        extra: Map<String, Value>,
    ) -> Result<IssuedRequest, CashIdError>;

    /// Validate a signed response payload.
    ///
    /// Runs the full check sequence (payload structure, request decoding,
    /// address and signature presence, replay/freshness rules, signature
    /// verification, required-metadata completeness), failing on the first
    /// violated check. On success a server-initiated challenge is marked
    /// consumed; validating the same payload again fails with
    /// `RequestConsumed`.
    async fn validate_request(
        &self,
        payload: &ResponsePayload,
    ) -> Result<ValidationResult, CashIdError>;

    /// Drop a stored challenge without consuming it. Eviction of stale
    /// requests is the caller's policy; the engine enforces no TTL.
    async fn delete_request(&self, nonce: &str) -> Result<(), CashIdError>;
}
