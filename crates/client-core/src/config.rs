//! Client configuration
//!
//! [`ClientConfig`] collects everything the facade applies on behalf of the
//! caller: endpoint identity, NAT defaults for every account, how digest
//! credentials are installed and how long shutdown waits for the stack.
//!
//! # Loading
//!
//! ```rust,no_run
//! use std::path::Path;
//! use softphone_client_core::config::ClientConfig;
//!
//! // softphone.toml, overridden by SOFTPHONE_* environment variables
//! let config = ClientConfig::load(Some(Path::new("softphone.toml"))).unwrap();
//! println!("user agent: {}", config.user_agent);
//! ```
//!
//! ```toml
//! user_agent = "Desk/2.0"
//! shutdown_grace_ms = 250
//!
//! [nat]
//! udp_keepalive_secs = 15
//!
//! [credentials]
//! default_realm = "asterisk"
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use softphone_infra_common::config::{from_toml_str, load_config};

use crate::account::{AuthCredential, NatConfig, WILDCARD_REALM};

/// Prefix of environment overrides
pub const ENV_PREFIX: &str = "SOFTPHONE";

/// How digest credentials are derived from a user/password/realm triple
///
/// The same policy applies to every flow that installs credentials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CredentialPolicy {
    /// Realm used when the caller passes none or an empty one
    pub default_realm: String,
    /// Also install a wildcard entry next to a realm-scoped one
    pub wildcard_fallback: bool,
}

impl Default for CredentialPolicy {
    fn default() -> Self {
        Self {
            default_realm: WILDCARD_REALM.to_string(),
            wildcard_fallback: true,
        }
    }
}

impl CredentialPolicy {
    /// Realm after defaulting
    pub fn effective_realm<'a>(&'a self, realm: Option<&'a str>) -> &'a str {
        match realm.map(str::trim) {
            Some(realm) if !realm.is_empty() => realm,
            _ => &self.default_realm,
        }
    }

    /// Credential list for one user
    ///
    /// A scoped realm yields the scoped entry followed by a wildcard entry
    /// (when `wildcard_fallback` is set); the wildcard realm yields a single
    /// entry.
    ///
    /// ```rust
    /// use softphone_client_core::config::CredentialPolicy;
    ///
    /// let policy = CredentialPolicy::default();
    ///
    /// let creds = policy.credentials("1001", "secret", Some("asterisk"));
    /// let realms: Vec<&str> = creds.iter().map(|c| c.realm.as_str()).collect();
    /// assert_eq!(realms, ["asterisk", "*"]);
    ///
    /// assert_eq!(policy.credentials("1001", "secret", None).len(), 1);
    /// ```
    pub fn credentials(&self, username: &str, password: &str, realm: Option<&str>) -> Vec<AuthCredential> {
        let realm = self.effective_realm(realm);
        let mut creds = vec![AuthCredential::digest(realm, username, password)];
        if self.wildcard_fallback && realm != WILDCARD_REALM {
            creds.push(AuthCredential::digest(WILDCARD_REALM, username, password));
        }
        creds
    }
}

/// Main client configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// User-Agent header value
    pub user_agent: String,
    /// Maximum concurrent calls the endpoint accepts
    pub max_calls: u32,
    /// NAT settings applied to every account
    pub nat: NatConfig,
    pub credentials: CredentialPolicy,
    /// How long shutdown waits for the stack to drain, in milliseconds
    pub shutdown_grace_ms: u64,
    /// Install the global log subscriber on init
    pub install_log_subscriber: bool,
    /// Emit JSON log lines
    pub json_logs: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            user_agent: "Softphone/1.0".to_string(),
            max_calls: 4,
            nat: NatConfig::default(),
            credentials: CredentialPolicy::default(),
            shutdown_grace_ms: 100,
            install_log_subscriber: true,
            json_logs: false,
        }
    }
}

impl ClientConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from an optional TOML file plus `SOFTPHONE_*` environment overrides
    pub fn load(path: Option<&Path>) -> softphone_infra_common::Result<Self> {
        load_config(path, ENV_PREFIX)
    }

    /// Parse TOML text
    pub fn from_toml(text: &str) -> softphone_infra_common::Result<Self> {
        from_toml_str(text)
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_max_calls(mut self, max_calls: u32) -> Self {
        self.max_calls = max_calls;
        self
    }

    pub fn with_nat(mut self, nat: NatConfig) -> Self {
        self.nat = nat;
        self
    }

    pub fn with_credential_policy(mut self, policy: CredentialPolicy) -> Self {
        self.credentials = policy;
        self
    }

    pub fn with_shutdown_grace(mut self, grace: Duration) -> Self {
        self.shutdown_grace_ms = grace.as_millis() as u64;
        self
    }

    /// Leave the global subscriber to the host application
    pub fn without_log_subscriber(mut self) -> Self {
        self.install_log_subscriber = false;
        self
    }

    pub fn with_json_logs(mut self) -> Self {
        self.json_logs = true;
        self
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_millis(self.shutdown_grace_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.user_agent, "Softphone/1.0");
        assert_eq!(config.max_calls, 4);
        assert_eq!(config.shutdown_grace(), Duration::from_millis(100));
        assert_eq!(config.credentials.default_realm, "*");
        assert!(config.credentials.wildcard_fallback);
        assert!(config.install_log_subscriber);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = ClientConfig::from_toml(
            r#"
            user_agent = "Desk/2.0"

            [nat]
            udp_keepalive_secs = 15

            [credentials]
            default_realm = "asterisk"
            "#,
        )
        .unwrap();

        assert_eq!(config.user_agent, "Desk/2.0");
        assert_eq!(config.max_calls, 4);
        assert_eq!(config.nat.udp_keepalive_secs, 15);
        assert!(config.nat.via_rewrite);
        assert_eq!(config.credentials.default_realm, "asterisk");
        assert!(config.credentials.wildcard_fallback);
    }

    #[test]
    fn test_realm_defaulting() {
        let policy = CredentialPolicy::default();
        assert_eq!(policy.effective_realm(None), "*");
        assert_eq!(policy.effective_realm(Some("")), "*");
        assert_eq!(policy.effective_realm(Some("  ")), "*");
        assert_eq!(policy.effective_realm(Some("pbx")), "pbx");
    }

    #[test]
    fn test_scoped_default_realm_adds_wildcard() {
        let policy = CredentialPolicy {
            default_realm: "asterisk".to_string(),
            wildcard_fallback: true,
        };
        let creds = policy.credentials("1001", "pw", None);
        assert_eq!(creds.len(), 2);
        assert_eq!(creds[0].realm, "asterisk");
        assert!(creds[1].is_wildcard());
        assert!(creds.iter().all(|c| c.username == "1001" && c.data == "pw"));
    }

    #[test]
    fn test_no_wildcard_fallback() {
        let policy = CredentialPolicy {
            default_realm: "*".to_string(),
            wildcard_fallback: false,
        };
        let creds = policy.credentials("u", "p", Some("asterisk"));
        assert_eq!(creds.len(), 1);
        assert_eq!(creds[0].realm, "asterisk");
    }

    #[test]
    fn test_builders() {
        let config = ClientConfig::new()
            .with_user_agent("Test/0.1")
            .with_max_calls(1)
            .with_shutdown_grace(Duration::from_millis(20))
            .without_log_subscriber();
        assert_eq!(config.user_agent, "Test/0.1");
        assert_eq!(config.max_calls, 1);
        assert_eq!(config.shutdown_grace_ms, 20);
        assert!(!config.install_log_subscriber);
    }
}
