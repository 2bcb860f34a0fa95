//! Transport selection and configuration

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Identifier the stack assigns to a transport
pub type TransportId = i32;

/// SIP transport protocol
///
/// ```rust
/// use softphone_client_core::transport::TransportKind;
///
/// assert_eq!(TransportKind::from_code(1), TransportKind::Tcp);
/// assert_eq!(TransportKind::from_code(7), TransportKind::Udp);
/// assert_eq!("tls".parse::<TransportKind>().unwrap(), TransportKind::Tls);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    #[default]
    Udp,
    Tcp,
    Tls,
}

impl TransportKind {
    /// Map a numeric code: 0 UDP, 1 TCP, 2 TLS, anything else UDP
    pub fn from_code(code: i32) -> Self {
        match code {
            1 => TransportKind::Tcp,
            2 => TransportKind::Tls,
            _ => TransportKind::Udp,
        }
    }

    pub fn code(&self) -> i32 {
        match self {
            TransportKind::Udp => 0,
            TransportKind::Tcp => 1,
            TransportKind::Tls => 2,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TransportKind::Udp => "UDP",
            TransportKind::Tcp => "TCP",
            TransportKind::Tls => "TLS",
        }
    }

    /// Default port when none is requested
    pub fn default_port(&self) -> u16 {
        match self {
            TransportKind::Tls => 5061,
            _ => 5060,
        }
    }
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransportKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "udp" => Ok(TransportKind::Udp),
            "tcp" => Ok(TransportKind::Tcp),
            "tls" => Ok(TransportKind::Tls),
            other => Err(format!("unknown transport: {}", other)),
        }
    }
}

/// Transport settings handed to the stack
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransportConfig {
    /// Local address to bind, `None` for any
    pub bound_address: Option<String>,
    /// Address advertised in Via/Contact, `None` to let the stack decide
    pub public_address: Option<String>,
    /// Local port, 0 for automatic allocation
    pub port: u16,
}

impl TransportConfig {
    /// A non-empty bind address is used as both bound and public address
    pub fn new(bind_address: Option<&str>, port: u16) -> Self {
        let address = bind_address
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .map(str::to_string);
        Self {
            bound_address: address.clone(),
            public_address: address,
            port,
        }
    }
}

/// What the stack reports about a created transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportInfo {
    pub id: TransportId,
    pub kind: TransportKind,
    /// Protocol name as the stack prints it
    pub type_name: String,
    /// `host:port` the transport listens on
    pub local_name: String,
}
