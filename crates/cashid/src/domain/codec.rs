//! # Request URL Codec
//!
//! Encodes a [`RequestDescriptor`] into the protocol's URL form and decodes
//! it back, validating syntax. The wire contract:
//!
//! ```text
//! cashid:<domain><path>?a=<action>[&d=<data>][&r=<fields>][&o=<fields>]&x=<nonce>
//! ```
//!
//! The scheme is matched case-insensitively. Query values are URL-escaped;
//! `r`/`o` carry the compact field encoding of [`crate::domain::fields`].

use url::form_urlencoded;
use url::Url;

use crate::domain::entities::{Action, RequestDescriptor};
use crate::domain::errors::CashIdError;
use crate::domain::fields::{decode_field_list, encode_field_list};

/// The protocol's reserved URL scheme.
pub const SCHEME: &str = "cashid";

/// Encode a request descriptor into its URL form.
///
/// The `a` parameter is always emitted, even for the default `auth` action,
/// so service-issued requests are unambiguous. `r` and `o` are omitted when
/// the corresponding field list is empty.
pub fn encode(descriptor: &RequestDescriptor) -> Result<String, CashIdError> {
    if descriptor.domain.is_empty() {
        return Err(CashIdError::RequestMissingDomain);
    }
    let nonce = descriptor
        .nonce
        .as_deref()
        .ok_or(CashIdError::RequestMissingNonce)?;

    let mut query = form_urlencoded::Serializer::new(String::new());
    query.append_pair("a", descriptor.action.as_str());
    if let Some(data) = &descriptor.data {
        query.append_pair("d", data);
    }
    if !descriptor.required.is_empty() {
        query.append_pair("r", &encode_field_list(&descriptor.required)?);
    }
    if !descriptor.optional.is_empty() {
        query.append_pair("o", &encode_field_list(&descriptor.optional)?);
    }
    query.append_pair("x", nonce);

    let path = normalize_path(&descriptor.path);
    Ok(format!(
        "{SCHEME}:{}{}?{}",
        descriptor.domain,
        path,
        query.finish()
    ))
}

/// Decode a request URL into a descriptor.
///
/// Fails with `NotARequest` for foreign schemes; any field-list failure
/// aborts the whole decode. A missing `x` parameter leaves the nonce absent;
/// callers that require one must check for presence.
pub fn decode(request_url: &str) -> Result<RequestDescriptor, CashIdError> {
    let url = Url::parse(request_url).map_err(|e| match e {
        url::ParseError::RelativeUrlWithoutBase => CashIdError::RequestMissingScheme,
        _ => CashIdError::RequestBroken,
    })?;

    // Url::parse lowercases the scheme, making the match case-insensitive.
    if url.scheme() != SCHEME {
        return Err(CashIdError::NotARequest);
    }

    // The canonical form has no authority: everything after the scheme is
    // path. Tolerate a `cashid://domain/path` spelling by reading the host.
    let (domain, path) = match url.host_str() {
        Some(host) => (host.to_string(), normalize_path(url.path())),
        None => {
            let raw = url.path();
            let mut parts = raw.splitn(2, '/');
            let domain = parts.next().unwrap_or("").to_string();
            let remainder = parts.next().unwrap_or("");
            (domain, normalize_path(remainder))
        }
    };
    if domain.is_empty() {
        return Err(CashIdError::RequestMissingDomain);
    }

    let mut action = Action::default();
    let mut required = Vec::new();
    let mut optional = Vec::new();
    let mut nonce = None;
    let mut data = None;

    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "a" => action = Action::parse(&value),
            "d" => data = Some(value.into_owned()),
            "r" => required = decode_field_list(&value)?,
            "o" => optional = decode_field_list(&value)?,
            "x" => nonce = Some(value.into_owned()),
            _ => {}
        }
    }

    Ok(RequestDescriptor {
        domain,
        path,
        action,
        required,
        optional,
        nonce,
        data,
    })
}

/// Collapse leading slashes to exactly one.
fn normalize_path(path: &str) -> String {
    format!("/{}", path.trim_start_matches('/'))
}
