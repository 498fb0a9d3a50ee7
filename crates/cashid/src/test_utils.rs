//! Test support: a deterministic signature provider and a controllable
//! clock. Test-grade only; production services plug in their own wallet or
//! HSM-backed provider.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};

use crate::domain::entities::Timestamp;
use crate::ports::outbound::{SignatureError, SignatureProvider, TimeSource};

/// Ed25519 seed for tests (RFC 8032 test vector 1).
pub const TEST_KEY: &str = "9d61b19deffd5a60ba844af492ec2cc44449c5697b326919703bac031cae7f60";

/// Signature provider backed by Ed25519.
///
/// Keys are hex-encoded 32-byte seeds; an address is the hex-encoded
/// verifying key, so verification needs no key registry.
#[derive(Default)]
pub struct Ed25519SignatureProvider;

fn signing_key(key: &str) -> Result<SigningKey, SignatureError> {
    let bytes = hex::decode(key).map_err(|e| SignatureError::InvalidKey(e.to_string()))?;
    let seed: [u8; 32] = bytes
        .try_into()
        .map_err(|_| SignatureError::InvalidKey("seed must be 32 bytes".to_string()))?;
    Ok(SigningKey::from_bytes(&seed))
}

#[async_trait]
impl SignatureProvider for Ed25519SignatureProvider {
    async fn sign(&self, key: &str, message: &str) -> Result<String, SignatureError> {
        let signing = signing_key(key)?;
        Ok(hex::encode(signing.sign(message.as_bytes()).to_bytes()))
    }

    async fn verify(&self, address: &str, signature: &str, message: &str) -> bool {
        let Ok(key_bytes) = hex::decode(address) else {
            return false;
        };
        let Ok(key_bytes) = <[u8; 32]>::try_from(key_bytes) else {
            return false;
        };
        let Ok(verifying) = VerifyingKey::from_bytes(&key_bytes) else {
            return false;
        };
        let Ok(sig_bytes) = hex::decode(signature) else {
            return false;
        };
        let Ok(signature) = Signature::from_slice(&sig_bytes) else {
            return false;
        };
        verifying.verify(message.as_bytes(), &signature).is_ok()
    }

    async fn derive_address(&self, key: &str) -> Result<String, SignatureError> {
        let signing = signing_key(key)?;
        Ok(hex::encode(signing.verifying_key().to_bytes()))
    }

    fn is_valid_address(&self, address: &str) -> bool {
        address.len() == 64 && address.chars().all(|c| c.is_ascii_hexdigit())
    }
}

/// Clock pinned to a settable instant.
pub struct FixedTimeSource {
    now: AtomicU64,
}

impl FixedTimeSource {
    pub fn new(now: Timestamp) -> Self {
        Self {
            now: AtomicU64::new(now),
        }
    }

    pub fn set(&self, now: Timestamp) {
        self.now.store(now, Ordering::Relaxed);
    }

    pub fn advance(&self, secs: u64) {
        self.now.fetch_add(secs, Ordering::Relaxed);
    }
}

impl TimeSource for FixedTimeSource {
    fn now(&self) -> Timestamp {
        self.now.load(Ordering::Relaxed)
    }
}
