use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// SIP header names
///
/// Header names are case-insensitive on the wire; parsing accepts the
/// compact forms for the headers that have one.
///
/// ```rust
/// use softphone_sip_core::types::HeaderName;
/// use std::str::FromStr;
///
/// assert_eq!(HeaderName::from_str("i").unwrap(), HeaderName::CallId);
/// assert_eq!(HeaderName::from_str("VIA").unwrap(), HeaderName::Via);
/// assert_eq!(HeaderName::CallId.as_str(), "Call-ID");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum HeaderName {
    /// Call-ID: Unique identifier for this call
    CallId,
    /// Contact: Where subsequent requests should be sent
    Contact,
    /// Content-Length: Size of the message body
    ContentLength,
    /// CSeq: Command sequence number
    CSeq,
    /// Expires: Expiration time for registration
    Expires,
    /// From: Initiator of the request
    From,
    /// Max-Forwards: Limit on the number of hops
    MaxForwards,
    /// To: Logical recipient of the request
    To,
    /// User-Agent: Product information
    UserAgent,
    /// Via: Path taken by the request so far
    Via,
    /// Any other header
    Other(String),
}

impl HeaderName {
    /// Canonical spelling
    pub fn as_str(&self) -> &str {
        match self {
            HeaderName::CallId => "Call-ID",
            HeaderName::Contact => "Contact",
            HeaderName::ContentLength => "Content-Length",
            HeaderName::CSeq => "CSeq",
            HeaderName::Expires => "Expires",
            HeaderName::From => "From",
            HeaderName::MaxForwards => "Max-Forwards",
            HeaderName::To => "To",
            HeaderName::UserAgent => "User-Agent",
            HeaderName::Via => "Via",
            HeaderName::Other(name) => name,
        }
    }
}

impl fmt::Display for HeaderName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HeaderName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let name = s.trim();
        if name.is_empty() {
            return Err(Error::InvalidHeader("empty header name".to_string()));
        }
        let parsed = match name.to_ascii_lowercase().as_str() {
            "call-id" | "i" => HeaderName::CallId,
            "contact" | "m" => HeaderName::Contact,
            "content-length" | "l" => HeaderName::ContentLength,
            "cseq" => HeaderName::CSeq,
            "expires" => HeaderName::Expires,
            "from" | "f" => HeaderName::From,
            "max-forwards" => HeaderName::MaxForwards,
            "to" | "t" => HeaderName::To,
            "user-agent" => HeaderName::UserAgent,
            "via" | "v" => HeaderName::Via,
            _ => HeaderName::Other(name.to_string()),
        };
        Ok(parsed)
    }
}
