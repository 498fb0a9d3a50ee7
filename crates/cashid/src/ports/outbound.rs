//! # Outbound Ports (Driven Ports)
//!
//! Capabilities the engine consumes but does not implement: replay storage,
//! message signing and the clock. Every call may suspend or block inside the
//! adapter; the engine assumes nothing beyond what these traits state.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::entities::{StoredRequest, Timestamp};

/// Error from a storage adapter.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The backend cannot be reached.
    #[error("storage backend unavailable: {0}")]
    Unavailable(String),

    /// The backend rejected or failed the operation.
    #[error("storage operation failed: {0}")]
    Backend(String),
}

impl From<StorageError> for crate::domain::errors::CashIdError {
    fn from(err: StorageError) -> Self {
        crate::domain::errors::CashIdError::ServiceInternalError(err.to_string())
    }
}

/// Keyed storage of issued, not-yet-consumed requests, addressed by nonce.
///
/// The default in-process implementation is
/// [`MemoryStorageAdapter`](crate::adapters::memory::MemoryStorageAdapter);
/// services behind a load balancer swap in a shared store (e.g. Redis).
///
/// Retention is the adapter's responsibility: the engine never evicts stale
/// unconsumed entries. Consumption goes through [`consume`](Self::consume);
/// adapters that stay on its default read-then-write implementation keep a
/// narrow window when two validations race on one nonce, so shared backends
/// should override it with their own compare-and-set.
#[async_trait]
pub trait StorageAdapter: Send + Sync {
    /// Fetch the stored request for a nonce, if any.
    async fn get(&self, nonce: &str) -> Result<Option<StoredRequest>, StorageError>;

    /// Store or replace the request for a nonce.
    async fn set(&self, nonce: &str, request: StoredRequest) -> Result<(), StorageError>;

    /// Drop the request for a nonce. Absent keys are not an error.
    async fn delete(&self, nonce: &str) -> Result<(), StorageError>;

    /// Replace the entry for a nonce only while it is still unconsumed.
    /// Returns whether the write happened; a missing or already-consumed
    /// entry refuses it.
    ///
    /// The default implementation is read-then-write and leaves a window
    /// between the check and the write when two consumers race on one nonce.
    /// Adapters with an atomic primitive (in-process locking, compare-and-set)
    /// should override it.
    async fn consume(&self, nonce: &str, entry: StoredRequest) -> Result<bool, StorageError> {
        match self.get(nonce).await? {
            Some(existing) if !existing.is_consumed() => {
                self.set(nonce, entry).await?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

/// Error from a signature provider.
#[derive(Debug, Error)]
pub enum SignatureError {
    /// The key material could not be used.
    #[error("invalid key material: {0}")]
    InvalidKey(String),

    /// Signing failed inside the provider.
    #[error("signing failed: {0}")]
    SigningFailed(String),
}

impl From<SignatureError> for crate::domain::errors::CashIdError {
    fn from(err: SignatureError) -> Self {
        crate::domain::errors::CashIdError::ServiceInternalError(err.to_string())
    }
}

/// Opaque message-signing capability.
///
/// Keys, addresses and signatures are strings whose internal encoding the
/// engine never inspects. The message is always the verbatim request URL.
#[async_trait]
pub trait SignatureProvider: Send + Sync {
    /// Sign a message with a private key.
    async fn sign(&self, key: &str, message: &str) -> Result<String, SignatureError>;

    /// Check a signature over a message against an address. Malformed input
    /// verifies as `false`.
    async fn verify(&self, address: &str, signature: &str, message: &str) -> bool;

    /// Derive the address controlled by a private key.
    async fn derive_address(&self, key: &str) -> Result<String, SignatureError>;

    /// Whether a string is a well-formed address.
    fn is_valid_address(&self, address: &str) -> bool;
}

/// Time operations, injectable for tests.
pub trait TimeSource: Send + Sync {
    /// Current timestamp in seconds since epoch.
    fn now(&self) -> Timestamp;
}

/// Default time source using the system clock.
#[derive(Default)]
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now(&self) -> Timestamp {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0)
    }
}
