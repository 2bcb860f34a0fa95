//! Account configuration handed to the stack
//!
//! The stack owns the runtime state of an account (registration timers,
//! authentication challenges, NAT bindings). This module only describes what
//! the account should look like when it is created or modified.
//!
//! # Examples
//!
//! ```rust
//! use softphone_client_core::account::{AccountConfig, AuthCredential, NatConfig};
//!
//! let config = AccountConfig::new("sip:1001@pbx.example.com")
//!     .with_registrar("sip:pbx.example.com")
//!     .with_credentials(vec![AuthCredential::digest("*", "1001", "secret")])
//!     .with_nat(NatConfig::default())
//!     .without_retry();
//!
//! assert_eq!(config.reg.registrar_uri, "sip:pbx.example.com");
//! assert_eq!(config.reg.retry_interval_secs, Some(0));
//! assert!(!config.reg.register_on_add);
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::transport::TransportId;

/// Realm that matches any challenge
pub const WILDCARD_REALM: &str = "*";

/// Authentication scheme of every credential the client installs
pub const DIGEST_SCHEME: &str = "digest";

/// Credential data is the plain-text password
pub const DATA_TYPE_PLAIN: u8 = 0;

/// One entry of an account's credential list
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthCredential {
    pub scheme: String,
    pub realm: String,
    pub username: String,
    pub data_type: u8,
    pub data: String,
}

impl AuthCredential {
    /// A digest credential with a plain-text password
    pub fn digest(realm: impl Into<String>, username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            scheme: DIGEST_SCHEME.to_string(),
            realm: realm.into(),
            username: username.into(),
            data_type: DATA_TYPE_PLAIN,
            data: password.into(),
        }
    }

    pub fn is_wildcard(&self) -> bool {
        self.realm == WILDCARD_REALM
    }
}

impl fmt::Debug for AuthCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthCredential")
            .field("scheme", &self.scheme)
            .field("realm", &self.realm)
            .field("username", &self.username)
            .field("data_type", &self.data_type)
            .field("data", &"<redacted>")
            .finish()
    }
}

/// NAT traversal settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NatConfig {
    /// UDP keep-alive interval in seconds, 0 disables
    pub udp_keepalive_secs: u32,
    /// Add `;ob` and use SIP outbound (RFC 5626)
    pub sip_outbound: bool,
    /// Rewrite Contact with the address the registrar saw
    pub contact_rewrite: bool,
    /// Rewrite Via sent-by with the address the registrar saw
    pub via_rewrite: bool,
}

impl Default for NatConfig {
    fn default() -> Self {
        Self {
            udp_keepalive_secs: 25,
            sip_outbound: false,
            contact_rewrite: true,
            via_rewrite: true,
        }
    }
}

/// Registration settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegConfig {
    /// Registrar URI, empty for no registration
    pub registrar_uri: String,
    /// Send REGISTER as soon as the account is created
    pub register_on_add: bool,
    /// Retry interval after a failed registration; `None` keeps the stack default, 0 disables
    pub retry_interval_secs: Option<u32>,
    /// Interval before the first retry; `None` keeps the stack default, 0 disables
    pub first_retry_interval_secs: Option<u32>,
}

/// Everything the stack needs to create an account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountConfig {
    /// Identity (address of record), e.g. `sip:1001@pbx.example.com`
    pub id_uri: String,
    pub reg: RegConfig,
    pub credentials: Vec<AuthCredential>,
    /// Transport the account is bound to
    pub transport_id: Option<TransportId>,
    pub nat: NatConfig,
}

impl AccountConfig {
    pub fn new(id_uri: impl Into<String>) -> Self {
        Self {
            id_uri: id_uri.into(),
            reg: RegConfig::default(),
            credentials: Vec::new(),
            transport_id: None,
            nat: NatConfig::default(),
        }
    }

    pub fn with_registrar(mut self, registrar_uri: impl Into<String>) -> Self {
        self.reg.registrar_uri = registrar_uri.into();
        self
    }

    pub fn with_register_on_add(mut self, register_on_add: bool) -> Self {
        self.reg.register_on_add = register_on_add;
        self
    }

    pub fn with_credentials(mut self, credentials: Vec<AuthCredential>) -> Self {
        self.credentials = credentials;
        self
    }

    pub fn with_transport(mut self, transport_id: Option<TransportId>) -> Self {
        self.transport_id = transport_id;
        self
    }

    pub fn with_nat(mut self, nat: NatConfig) -> Self {
        self.nat = nat;
        self
    }

    /// Disable the stack's registration retry backoff
    pub fn without_retry(mut self) -> Self {
        self.reg.retry_interval_secs = Some(0);
        self.reg.first_retry_interval_secs = Some(0);
        self
    }

    pub fn has_registrar(&self) -> bool {
        !self.reg.registrar_uri.is_empty()
    }
}

/// Prefix `sip:` unless the URI already carries a SIP scheme
///
/// Empty input stays empty so that "no registrar" survives.
///
/// ```rust
/// use softphone_client_core::account::ensure_sip_scheme;
///
/// assert_eq!(ensure_sip_scheme("pbx.example.com"), "sip:pbx.example.com");
/// assert_eq!(ensure_sip_scheme("sip:pbx.example.com"), "sip:pbx.example.com");
/// assert_eq!(ensure_sip_scheme("sips:pbx.example.com"), "sips:pbx.example.com");
/// assert_eq!(ensure_sip_scheme(""), "");
/// ```
pub fn ensure_sip_scheme(uri: &str) -> String {
    let uri = uri.trim();
    if uri.is_empty() || uri.starts_with("sip:") || uri.starts_with("sips:") {
        uri.to_string()
    } else {
        format!("sip:{}", uri)
    }
}
