//! # Domain Entities
//!
//! Core data structures of the protocol: the decoded request, the stored
//! challenge, the client's signed response and the validation outcome.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::errors::CashIdError;

/// Seconds since the Unix epoch.
pub type Timestamp = u64;

/// Network prefix that addresses must not carry inside a response payload.
/// Addresses travel in their short, unprefixed form.
pub const INTERNAL_ADDRESS_PREFIX: &str = "bitcoincash:";

/// Protocol action carried in the `a=` query parameter.
///
/// The four non-auth variants are user-initiated: the client constructs the
/// request itself and its nonce is a creation timestamp rather than a
/// server-minted challenge. Services may recognize additional user-initiated
/// action names through their configuration.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Action {
    Auth,
    Delete,
    Revoke,
    Logout,
    Update,
    Other(String),
}

impl Action {
    /// Parse the wire form of an action name.
    pub fn parse(name: &str) -> Self {
        match name {
            "auth" => Action::Auth,
            "delete" => Action::Delete,
            "revoke" => Action::Revoke,
            "logout" => Action::Logout,
            "update" => Action::Update,
            other => Action::Other(other.to_string()),
        }
    }

    /// The wire form of this action.
    pub fn as_str(&self) -> &str {
        match self {
            Action::Auth => "auth",
            Action::Delete => "delete",
            Action::Revoke => "revoke",
            Action::Logout => "logout",
            Action::Update => "update",
            Action::Other(name) => name,
        }
    }

    /// Whether this action belongs to the protocol's fixed user-initiated
    /// set. Service-defined additions are matched in `ServiceConfig`.
    pub fn is_user_initiated(&self) -> bool {
        matches!(
            self,
            Action::Delete | Action::Revoke | Action::Logout | Action::Update
        )
    }
}

impl Default for Action {
    fn default() -> Self {
        Action::Auth
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A decoded protocol request.
///
/// Produced by the codec or by the issuing service; immutable once built.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RequestDescriptor {
    /// Authority the request targets (no scheme, no slashes).
    pub domain: String,
    /// Endpoint path, with exactly one leading slash.
    pub path: String,
    pub action: Action,
    /// Required metadata field names, no duplicates.
    pub required: Vec<String>,
    /// Optional metadata field names, disjoint from `required`.
    pub optional: Vec<String>,
    /// Random integer token (server-initiated) or Unix timestamp
    /// (user-initiated). Callers that need a nonce must check presence.
    pub nonce: Option<String>,
    /// Opaque action data.
    pub data: Option<String>,
}

/// Caller-facing options for issuing a request.
///
/// Deliberately carries no domain or path: those always come from the
/// service configuration and cannot be overridden per request.
#[derive(Clone, Debug, Default)]
pub struct RequestOptions {
    pub action: Action,
    pub required: Vec<String>,
    pub optional: Vec<String>,
    pub data: Option<String>,
    /// Explicit nonce. When absent the service mints a random one.
    pub nonce: Option<String>,
}

impl RequestOptions {
    pub fn new(action: Action) -> Self {
        Self {
            action,
            ..Self::default()
        }
    }

    pub fn with_required<S: Into<String>>(mut self, names: impl IntoIterator<Item = S>) -> Self {
        self.required = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_optional<S: Into<String>>(mut self, names: impl IntoIterator<Item = S>) -> Self {
        self.optional = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_data(mut self, data: impl Into<String>) -> Self {
        self.data = Some(data.into());
        self
    }

    pub fn with_nonce(mut self, nonce: impl Into<String>) -> Self {
        self.nonce = Some(nonce.into());
        self
    }
}

/// An issued challenge as recorded in the replay store, keyed by nonce.
///
/// Mutated exactly once, when validation succeeds: `status`, `consumed_at`
/// and `payload` are written together and the entry never transitions back.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StoredRequest {
    /// The issued request URL, byte-for-byte.
    pub request: String,
    pub issued_at: Timestamp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consumed_at: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<ResponsePayload>,
    /// Caller-supplied opaque bag stored alongside the request.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub extra: Map<String, Value>,
}

impl StoredRequest {
    pub fn new(request: String, issued_at: Timestamp, extra: Map<String, Value>) -> Self {
        Self {
            request,
            issued_at,
            status: None,
            consumed_at: None,
            payload: None,
            extra,
        }
    }

    /// Whether the one-way consumption gate has been passed.
    pub fn is_consumed(&self) -> bool {
        self.consumed_at.is_some()
    }
}

/// The signed response a client submits for validation.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponsePayload {
    /// The original request URL, verbatim. This exact string is the signed
    /// message.
    #[serde(default)]
    pub request: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub signature: String,
    /// Field name to value. Empty values do not satisfy required fields.
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

impl ResponsePayload {
    /// Parse a payload from raw JSON. Anything that is not a structured
    /// object is rejected as `ResponseBroken`; an object whose `metadata`
    /// member is not a string-to-string mapping fails as
    /// `ResponseMalformedMetadata`.
    pub fn from_json(value: &Value) -> Result<Self, CashIdError> {
        let object = value.as_object().ok_or(CashIdError::ResponseBroken)?;
        if let Some(metadata) = object.get("metadata") {
            let well_formed = metadata
                .as_object()
                .map_or(false, |m| m.values().all(Value::is_string));
            if !well_formed {
                return Err(CashIdError::ResponseMalformedMetadata);
            }
        }
        serde_json::from_value(value.clone()).map_err(|_| CashIdError::ResponseBroken)
    }

    /// Parse a payload from a JSON string.
    pub fn from_json_str(raw: &str) -> Result<Self, CashIdError> {
        let value: Value = serde_json::from_str(raw).map_err(|_| CashIdError::ResponseBroken)?;
        Self::from_json(&value)
    }
}

/// What issuance hands back to the relying service.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct IssuedRequest {
    pub nonce: String,
    /// The encoded request URL to deliver out-of-band.
    pub request: String,
    pub issued_at: Timestamp,
    pub extra: Map<String, Value>,
}

/// Successful validation outcome.
///
/// `issued_at` and `consumed_at` are absent for user-initiated requests,
/// which never had a stored entry.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ValidationResult {
    pub nonce: String,
    pub request: String,
    pub issued_at: Option<Timestamp>,
    /// Always `STATUS_AUTHENTICATION_SUCCESSFUL` on this type.
    pub status: u16,
    pub consumed_at: Option<Timestamp>,
    pub payload: ResponsePayload,
    pub extra: Map<String, Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_action_parse_round_trip() {
        for name in ["auth", "delete", "revoke", "logout", "update", "login"] {
            assert_eq!(Action::parse(name).as_str(), name);
        }
    }

    #[test]
    fn test_fixed_user_initiated_set() {
        assert!(!Action::Auth.is_user_initiated());
        assert!(Action::Delete.is_user_initiated());
        assert!(Action::Revoke.is_user_initiated());
        assert!(Action::Logout.is_user_initiated());
        assert!(Action::Update.is_user_initiated());
        assert!(!Action::Other("login".to_string()).is_user_initiated());
    }

    #[test]
    fn test_payload_from_json_requires_object() {
        assert_eq!(
            ResponsePayload::from_json(&json!("just a string")),
            Err(CashIdError::ResponseBroken)
        );
        assert_eq!(
            ResponsePayload::from_json(&json!(42)),
            Err(CashIdError::ResponseBroken)
        );
        assert_eq!(
            ResponsePayload::from_json_str("[1, 2]"),
            Err(CashIdError::ResponseBroken)
        );
    }

    #[test]
    fn test_payload_from_json_flags_malformed_metadata() {
        // Non-string values and non-mapping metadata get their own code,
        // distinct from a payload that is not an object at all.
        assert_eq!(
            ResponsePayload::from_json(&json!({
                "request": "cashid:test/test?a=auth&x=1",
                "metadata": { "age": 34 }
            })),
            Err(CashIdError::ResponseMalformedMetadata)
        );
        assert_eq!(
            ResponsePayload::from_json(&json!({ "metadata": "name=x" })),
            Err(CashIdError::ResponseMalformedMetadata)
        );
        assert_eq!(
            ResponsePayload::from_json(&json!({ "metadata": null })),
            Err(CashIdError::ResponseMalformedMetadata)
        );
    }

    #[test]
    fn test_payload_from_json_fills_defaults() {
        let payload = ResponsePayload::from_json(&json!({
            "request": "cashid:test/test?a=auth&x=1"
        }))
        .unwrap();
        assert_eq!(payload.request, "cashid:test/test?a=auth&x=1");
        assert!(payload.address.is_empty());
        assert!(payload.signature.is_empty());
        assert!(payload.metadata.is_empty());
    }

    #[test]
    fn test_stored_request_consumption_flag() {
        let mut stored = StoredRequest::new("cashid:test/test?a=auth&x=1".to_string(), 10, Map::new());
        assert!(!stored.is_consumed());
        stored.consumed_at = Some(11);
        assert!(stored.is_consumed());
    }

    #[test]
    fn test_stored_request_serde_round_trip() {
        let stored = StoredRequest::new(
            "cashid:test/test?a=auth&x=1".to_string(),
            1_594_000_000,
            Map::new(),
        );
        let encoded = serde_json::to_string(&stored).unwrap();
        let decoded: StoredRequest = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded, stored);
    }
}
