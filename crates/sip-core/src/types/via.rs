//! # SIP Via header
//!
//! Only the top-most Via entry matters to the shim: its `branch` parameter
//! identifies the client transaction and, for RFC 3261 compliance, must start
//! with the magic cookie `z9hG4bK`.
//!
//! ```text
//! Via: SIP/2.0/UDP pc33.atlanta.com:5060;branch=z9hG4bK776asdhds;rport
//! ```

use std::fmt;

use bytes::Bytes;

use crate::sanitizer::MAGIC_COOKIE;

/// A single Via entry
///
/// ```rust
/// use softphone_sip_core::types::Via;
///
/// let via = Via::new("UDP", "pc33.atlanta.com:5060", Some("z9hG4bK776asdhds"))
///     .with_param("rport", None);
/// assert_eq!(via.branch_str(), Some("z9hG4bK776asdhds"));
/// assert!(via.has_magic_cookie());
/// assert_eq!(
///     via.to_string(),
///     "SIP/2.0/UDP pc33.atlanta.com:5060;branch=z9hG4bK776asdhds;rport"
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Via {
    /// Transport token (`UDP`, `TCP`, `TLS`)
    pub transport: String,
    /// `host[:port]` the request was sent from
    pub sent_by: String,
    branch: Option<Bytes>,
    /// Remaining parameters in order, flag parameters carry `None`
    pub params: Vec<(String, Option<String>)>,
}

impl Via {
    /// Create a Via entry; `branch: None` leaves the parameter out entirely
    pub fn new(transport: impl Into<String>, sent_by: impl Into<String>, branch: Option<&str>) -> Self {
        Self {
            transport: transport.into(),
            sent_by: sent_by.into(),
            branch: branch.map(|b| Bytes::copy_from_slice(b.as_bytes())),
            params: Vec::new(),
        }
    }

    /// Append a parameter
    pub fn with_param(mut self, name: impl Into<String>, value: Option<&str>) -> Self {
        self.params.push((name.into(), value.map(str::to_string)));
        self
    }

    /// Raw branch value
    pub fn branch(&self) -> Option<&[u8]> {
        self.branch.as_deref()
    }

    /// Branch value as text, `None` when unset or not UTF-8
    pub fn branch_str(&self) -> Option<&str> {
        self.branch().and_then(|v| std::str::from_utf8(v).ok())
    }

    /// Replace the branch value
    pub fn set_branch(&mut self, value: Bytes) {
        self.branch = Some(value);
    }

    /// Set the branch from raw bytes, whatever they contain
    pub fn set_raw_branch(&mut self, value: &[u8]) {
        self.branch = Some(Bytes::copy_from_slice(value));
    }

    /// Whether the branch starts with `z9hG4bK`
    pub fn has_magic_cookie(&self) -> bool {
        self.branch()
            .map(|b| b.starts_with(MAGIC_COOKIE.as_bytes()))
            .unwrap_or(false)
    }
}

impl fmt::Display for Via {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SIP/2.0/{} {}", self.transport, self.sent_by)?;
        if let Some(branch) = &self.branch {
            write!(f, ";branch={}", String::from_utf8_lossy(branch))?;
        }
        for (name, value) in &self.params {
            match value {
                Some(v) => write!(f, ";{}={}", name, v)?,
                None => write!(f, ";{}", name)?,
            }
        }
        Ok(())
    }
}
