//! Service configuration and validation.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::domain::entities::Action;
use crate::domain::errors::CashIdError;

/// Default freshness window for user-initiated nonces, in seconds.
pub const DEFAULT_FRESHNESS_WINDOW_SECS: u64 = 15 * 60;

/// Default forward clock-skew allowance, in seconds.
pub const DEFAULT_CLOCK_SKEW_SECS: u64 = 60;

/// Protocol configuration of a relying service.
///
/// `domain` and `path` are stamped onto every issued request; caller-supplied
/// values are never trusted.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Authority the service issues requests for (no scheme, no slashes).
    pub domain: String,
    /// Endpoint path, with exactly one leading slash.
    pub path: String,
    /// Action names treated as user-initiated in addition to the protocol's
    /// fixed set (delete, revoke, logout, update).
    pub user_initiated_actions: BTreeSet<String>,
    /// Forward allowance for variance in client clocks, seconds.
    pub clock_skew_secs: u64,
    /// How far in the past a user-initiated nonce may lie, seconds.
    pub freshness_window_secs: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            domain: "auth.cashid.org".to_string(),
            path: "/api/auth".to_string(),
            user_initiated_actions: BTreeSet::new(),
            clock_skew_secs: DEFAULT_CLOCK_SKEW_SECS,
            freshness_window_secs: DEFAULT_FRESHNESS_WINDOW_SECS,
        }
    }
}

impl ServiceConfig {
    /// Create a configuration for the given authority, normalizing the path
    /// to a single leading slash and validating the domain.
    pub fn new(domain: impl Into<String>, path: impl Into<String>) -> Result<Self, CashIdError> {
        let path = path.into();
        let config = Self {
            domain: domain.into(),
            path: format!("/{}", path.trim_start_matches('/')),
            ..Self::default()
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate the configured authority.
    pub fn validate(&self) -> Result<(), CashIdError> {
        if self.domain.is_empty() {
            return Err(CashIdError::RequestMissingDomain);
        }
        if self
            .domain
            .chars()
            .any(|c| c == '/' || c == ':' || c == '?' || c == '#' || c.is_whitespace())
        {
            return Err(CashIdError::RequestMalformedDomain);
        }
        if !self.path.starts_with('/') {
            return Err(CashIdError::RequestMalformedDomain);
        }
        Ok(())
    }

    /// Builder-style method to recognize an extra user-initiated action name.
    pub fn with_user_initiated_action(mut self, action: impl Into<String>) -> Self {
        self.user_initiated_actions.insert(action.into());
        self
    }

    /// Builder-style method to set the freshness window.
    pub fn with_freshness_window_secs(mut self, secs: u64) -> Self {
        self.freshness_window_secs = secs;
        self
    }

    /// Whether requests for this action are validated by freshness window
    /// rather than by stored-challenge lookup.
    pub fn is_user_initiated(&self, action: &Action) -> bool {
        if action.is_user_initiated() {
            return true;
        }
        match action {
            Action::Other(name) => self.user_initiated_actions.contains(name),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = ServiceConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.domain, "auth.cashid.org");
        assert_eq!(config.path, "/api/auth");
        assert_eq!(config.clock_skew_secs, 60);
        assert_eq!(config.freshness_window_secs, 900);
    }

    #[test]
    fn test_new_normalizes_leading_slash() {
        let config = ServiceConfig::new("test", "test").unwrap();
        assert_eq!(config.path, "/test");

        let config = ServiceConfig::new("test", "///api/test").unwrap();
        assert_eq!(config.path, "/api/test");
    }

    #[test]
    fn test_validation_rejects_empty_domain() {
        let result = ServiceConfig::new("", "/api/auth");
        assert_eq!(result.unwrap_err(), CashIdError::RequestMissingDomain);
    }

    #[test]
    fn test_validation_rejects_domain_with_reserved_characters() {
        for domain in ["a/b", "a:1", "a?b", "a b"] {
            let result = ServiceConfig::new(domain, "/api/auth");
            assert_eq!(result.unwrap_err(), CashIdError::RequestMalformedDomain);
        }
    }

    #[test]
    fn test_fixed_actions_are_user_initiated() {
        let config = ServiceConfig::default();
        assert!(config.is_user_initiated(&Action::Delete));
        assert!(config.is_user_initiated(&Action::Update));
        assert!(!config.is_user_initiated(&Action::Auth));
        assert!(!config.is_user_initiated(&Action::Other("login".to_string())));
    }

    #[test]
    fn test_configured_extra_action_is_user_initiated() {
        let config = ServiceConfig::default().with_user_initiated_action("unsubscribe");
        assert!(config.is_user_initiated(&Action::Other("unsubscribe".to_string())));
        assert!(!config.is_user_initiated(&Action::Other("login".to_string())));
    }
}
