//! # CashID Service
//!
//! Application service that wires the protocol codec to the storage and
//! signature ports. This is the request lifecycle engine: it issues
//! server-initiated challenges and validates signed responses, and is
//! stateless apart from its injected collaborators.

use async_trait::async_trait;
use rand::Rng;
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::domain::codec;
use crate::domain::config::ServiceConfig;
use crate::domain::entities::{
    IssuedRequest, RequestDescriptor, RequestOptions, ResponsePayload, StoredRequest,
    ValidationResult, INTERNAL_ADDRESS_PREFIX,
};
use crate::domain::errors::{CashIdError, STATUS_AUTHENTICATION_SUCCESSFUL};
use crate::ports::inbound::AuthenticationApi;
use crate::ports::outbound::{SignatureProvider, StorageAdapter, SystemTimeSource, TimeSource};

/// Minted nonces are uniform in `0..=NONCE_MAX`. Large enough that collisions
/// across a store's retention window are negligible; the engine still refuses
/// to overwrite a live challenge on the off chance (see `MINT_ATTEMPTS`).
const NONCE_MAX: u64 = 999_999_999;

/// How many times minting retries before giving up on a free nonce.
const MINT_ATTEMPTS: usize = 8;

/// Request lifecycle engine for a relying service.
///
/// Generic over its three ports: the replay store, the signature provider
/// and the clock. `new` wires the system clock; tests inject a fixed one via
/// `with_clock`.
pub struct CashIdService<S, P, T = SystemTimeSource> {
    config: ServiceConfig,
    store: S,
    signer: P,
    clock: T,
}

impl<S, P> CashIdService<S, P>
where
    S: StorageAdapter,
    P: SignatureProvider,
{
    pub fn new(config: ServiceConfig, store: S, signer: P) -> Self {
        Self::with_clock(config, store, signer, SystemTimeSource)
    }
}

impl<S, P, T> CashIdService<S, P, T>
where
    S: StorageAdapter,
    P: SignatureProvider,
    T: TimeSource,
{
    pub fn with_clock(config: ServiceConfig, store: S, signer: P, clock: T) -> Self {
        Self {
            config,
            store,
            signer,
            clock,
        }
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Parse a raw JSON payload and validate it. Anything that is not a
    /// structured object fails with `ResponseBroken`.
    pub async fn validate_json(&self, payload: &Value) -> Result<ValidationResult, CashIdError> {
        let payload = ResponsePayload::from_json(payload)?;
        self.validate_request(&payload).await
    }

    /// Build the descriptor for an issued request. Caller-supplied domain or
    /// path never enter here; the configured values are authoritative.
    fn descriptor_for(&self, opts: RequestOptions) -> RequestDescriptor {
        RequestDescriptor {
            domain: self.config.domain.clone(),
            path: self.config.path.clone(),
            action: opts.action,
            required: opts.required,
            optional: opts.optional,
            nonce: opts.nonce,
            data: opts.data,
        }
    }

    fn mint_nonce() -> String {
        rand::thread_rng().gen_range(0..=NONCE_MAX).to_string()
    }

    /// Freshness-window check for user-initiated requests: the nonce is the
    /// client's creation timestamp and must fall within
    /// `[now - freshness_window, now + clock_skew]`.
    fn check_freshness(&self, nonce: &str) -> Result<(), CashIdError> {
        let invalid = || CashIdError::RequestInvalidNonce {
            nonce: nonce.to_string(),
        };
        let timestamp: i64 = nonce.parse().map_err(|_| invalid())?;
        let now = self.clock.now() as i64;
        let upper = now + self.config.clock_skew_secs as i64;
        let lower = now - self.config.freshness_window_secs as i64;
        if timestamp < lower || timestamp > upper {
            return Err(invalid());
        }
        Ok(())
    }
}

#[async_trait]
impl<S, P, T> AuthenticationApi for CashIdService<S, P, T>
where
    S: StorageAdapter,
    P: SignatureProvider,
    T: TimeSource,
{
    async fn create_request(
        &self,
        opts: RequestOptions,
        extra: Map<String, Value>,
    ) -> Result<IssuedRequest, CashIdError> {
        let mut descriptor = self.descriptor_for(opts);
        let issued_at = self.clock.now();

        // An explicit nonce is the caller's to manage; it may overwrite.
        if let Some(nonce) = descriptor.nonce.clone() {
            let request = codec::encode(&descriptor)?;
            self.store
                .set(&nonce, StoredRequest::new(request.clone(), issued_at, extra.clone()))
                .await?;
            debug!(%nonce, action = %descriptor.action, "issued request");
            return Ok(IssuedRequest {
                nonce,
                request,
                issued_at,
                extra,
            });
        }

        // Minted nonces refuse to displace a live challenge: look the key up
        // first and retry on collision.
        for _ in 0..MINT_ATTEMPTS {
            let nonce = Self::mint_nonce();
            if self.store.get(&nonce).await?.is_some() {
                debug!(%nonce, "minted nonce collided, retrying");
                continue;
            }
            descriptor.nonce = Some(nonce.clone());
            let request = codec::encode(&descriptor)?;
            self.store
                .set(&nonce, StoredRequest::new(request.clone(), issued_at, extra.clone()))
                .await?;
            debug!(%nonce, action = %descriptor.action, "issued request");
            return Ok(IssuedRequest {
                nonce,
                request,
                issued_at,
                extra,
            });
        }

        Err(CashIdError::ServiceInternalError(
            "could not mint an unused nonce".to_string(),
        ))
    }

    async fn validate_request(
        &self,
        payload: &ResponsePayload,
    ) -> Result<ValidationResult, CashIdError> {
        // Structural checks that need no descriptor come first; everything
        // after the decode carries the nonce for error context.
        if payload.request.is_empty() {
            return Err(CashIdError::ResponseMissingRequest);
        }

        let parsed = codec::decode(&payload.request)?;
        let nonce = parsed.nonce.clone().ok_or(CashIdError::RequestMissingNonce)?;

        if payload.address.is_empty() {
            return Err(CashIdError::ResponseMissingAddress { nonce });
        }
        if !self.signer.is_valid_address(&payload.address)
            || payload.address.contains(INTERNAL_ADDRESS_PREFIX)
        {
            return Err(CashIdError::ResponseMalformedAddress { nonce });
        }
        if payload.signature.is_empty() {
            return Err(CashIdError::ResponseMissingSignature { nonce });
        }

        // User-initiated requests are validated purely by freshness window;
        // server-initiated ones by stored-challenge lookup.
        let stored = if self.config.is_user_initiated(&parsed.action) {
            self.check_freshness(&nonce)?;
            None
        } else {
            let entry = self
                .store
                .get(&nonce)
                .await?
                .ok_or_else(|| CashIdError::RequestInvalidNonce {
                    nonce: nonce.clone(),
                })?;
            if payload.request != entry.request {
                return Err(CashIdError::RequestAltered { nonce });
            }
            if entry.is_consumed() {
                return Err(CashIdError::RequestConsumed { nonce });
            }
            Some(entry)
        };

        // The signed message is the verbatim request URL, never a re-encoded
        // form.
        if !self
            .signer
            .verify(&payload.address, &payload.signature, &payload.request)
            .await
        {
            return Err(CashIdError::ResponseInvalidSignature);
        }

        // Collect every missing required field before failing.
        let missing: Vec<String> = parsed
            .required
            .iter()
            .filter(|field| {
                payload
                    .metadata
                    .get(field.as_str())
                    .map_or(true, |value| value.is_empty())
            })
            .cloned()
            .collect();
        if !missing.is_empty() {
            return Err(CashIdError::ResponseMissingMetadata {
                nonce,
                fields: missing,
            });
        }

        match stored {
            Some(mut entry) => {
                // One-way gate: unconsumed -> consumed, never back. The
                // conditional write catches a racing validation that consumed
                // the entry while the signature was being verified.
                entry.status = Some(STATUS_AUTHENTICATION_SUCCESSFUL);
                entry.consumed_at = Some(self.clock.now());
                entry.payload = Some(payload.clone());
                if !self.store.consume(&nonce, entry.clone()).await? {
                    return Err(CashIdError::RequestConsumed { nonce });
                }
                info!(%nonce, address = %payload.address, "request consumed");
                Ok(ValidationResult {
                    nonce,
                    request: entry.request,
                    issued_at: Some(entry.issued_at),
                    status: STATUS_AUTHENTICATION_SUCCESSFUL,
                    consumed_at: entry.consumed_at,
                    payload: payload.clone(),
                    extra: entry.extra,
                })
            }
            None => {
                info!(%nonce, address = %payload.address, "user-initiated request accepted");
                Ok(ValidationResult {
                    nonce,
                    request: payload.request.clone(),
                    issued_at: None,
                    status: STATUS_AUTHENTICATION_SUCCESSFUL,
                    consumed_at: None,
                    payload: payload.clone(),
                    extra: Map::new(),
                })
            }
        }
    }

    async fn delete_request(&self, nonce: &str) -> Result<(), CashIdError> {
        self.store.delete(nonce).await?;
        debug!(%nonce, "dropped stored request");
        Ok(())
    }
}
