//! # CashID Protocol Engine
//!
//! Challenge/response authentication for users who control a private key,
//! without a pre-registered account. A relying service issues a request as a
//! `cashid:` URL, delivers it out-of-band (link, QR), and the client answers
//! with the requested metadata plus a signature over the verbatim URL. The
//! engine enforces the request lifecycle: freshness for user-initiated
//! requests, single consumption for server-initiated ones.
//!
//! ## Architecture
//!
//! Hexagonal:
//! - **Domain** (`domain/`): field catalogue, URL codec, entities, error
//!   taxonomy; pure logic, no I/O
//! - **Ports** (`ports/`): the inbound [`AuthenticationApi`] and the outbound
//!   [`StorageAdapter`] / [`SignatureProvider`] / [`TimeSource`] seams
//! - **Adapters** (`adapters/`): in-memory replay store
//! - **Service** (`service.rs`): [`CashIdService`], the lifecycle engine
//!
//! Signing primitives and address derivation are external collaborators; the
//! engine passes opaque strings through [`SignatureProvider`] and never
//! inspects their encoding.
//!
//! ## Example
//!
//! ```ignore
//! let service = CashIdService::new(
//!     ServiceConfig::new("auth.example.com", "/api/auth")?,
//!     MemoryStorageAdapter::new(),
//!     my_signature_provider,
//! );
//!
//! let issued = service
//!     .create_request(
//!         RequestOptions::new(Action::Auth).with_required(["name", "family"]),
//!         Map::new(),
//!     )
//!     .await?;
//! // deliver issued.request to the client, later:
//! let result = service.validate_request(&payload).await?;
//! ```

pub mod adapters;
pub mod client;
pub mod domain;
pub mod ports;
pub mod service;
pub mod test_utils;

// Re-export public API
pub use adapters::memory::MemoryStorageAdapter;
pub use domain::codec::{decode as parse_request, encode as encode_request, SCHEME};
pub use domain::config::ServiceConfig;
pub use domain::entities::{
    Action, IssuedRequest, RequestDescriptor, RequestOptions, ResponsePayload, StoredRequest,
    Timestamp, ValidationResult, INTERNAL_ADDRESS_PREFIX,
};
pub use domain::errors::{CashIdError, STATUS_AUTHENTICATION_SUCCESSFUL};
pub use domain::fields::{
    code_for_name, decode_field_list, encode_field_list, name_for_code, FieldNamespace, FieldSpec,
    FIELD_CATALOG,
};
pub use ports::inbound::AuthenticationApi;
pub use ports::outbound::{
    SignatureError, SignatureProvider, StorageAdapter, StorageError, SystemTimeSource, TimeSource,
};
pub use service::CashIdService;
