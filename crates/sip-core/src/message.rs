//! Outbound messages
//!
//! A [`TxData`] is what the stack hands to the TX pipeline: the message
//! itself plus the [`TxPool`] that owns every string produced while the
//! message is being finalized. The pool lives exactly as long as the
//! `TxData`; replacement values are duplicated into it and are released
//! together with the message, never on their own.

use std::fmt;

use bytes::Bytes;

use crate::types::{CallId, Header, HeaderName, Method, Via};

/// First line of a SIP message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartLine {
    Request { method: Method, uri: String },
    Response { status: u16, reason: String },
}

impl fmt::Display for StartLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StartLine::Request { method, uri } => write!(f, "{} {} SIP/2.0", method, uri),
            StartLine::Response { status, reason } => write!(f, "SIP/2.0 {} {}", status, reason),
        }
    }
}

/// A SIP message with an ordered header list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub start_line: StartLine,
    pub headers: Vec<Header>,
    pub body: Bytes,
}

impl Message {
    /// An empty request
    pub fn request(method: Method, uri: impl Into<String>) -> Self {
        Self {
            start_line: StartLine::Request {
                method,
                uri: uri.into(),
            },
            headers: Vec::new(),
            body: Bytes::new(),
        }
    }

    /// An empty response
    pub fn response(status: u16, reason: impl Into<String>) -> Self {
        Self {
            start_line: StartLine::Response {
                status,
                reason: reason.into(),
            },
            headers: Vec::new(),
            body: Bytes::new(),
        }
    }

    /// Append a header, builder style
    pub fn with_header(mut self, header: Header) -> Self {
        self.headers.push(header);
        self
    }

    /// Append a header
    pub fn push_header(&mut self, header: Header) {
        self.headers.push(header);
    }

    pub fn is_request(&self) -> bool {
        matches!(self.start_line, StartLine::Request { .. })
    }

    /// Request method, `None` for responses
    pub fn method(&self) -> Option<&Method> {
        match &self.start_line {
            StartLine::Request { method, .. } => Some(method),
            StartLine::Response { .. } => None,
        }
    }

    /// First header with the given name
    pub fn find_hdr(&self, name: &HeaderName) -> Option<&Header> {
        self.headers.iter().find(|h| &h.name() == name)
    }

    /// Number of headers with the given name
    pub fn count_hdr(&self, name: &HeaderName) -> usize {
        self.headers.iter().filter(|h| &h.name() == name).count()
    }

    /// First `Call-ID` header
    pub fn call_id(&self) -> Option<&CallId> {
        self.headers.iter().find_map(|h| match h {
            Header::CallId(id) => Some(id),
            _ => None,
        })
    }

    pub fn call_id_mut(&mut self) -> Option<&mut CallId> {
        self.headers.iter_mut().find_map(|h| match h {
            Header::CallId(id) => Some(id),
            _ => None,
        })
    }

    /// Top-most `Via` header
    pub fn via(&self) -> Option<&Via> {
        self.headers.iter().find_map(|h| match h {
            Header::Via(via) => Some(via),
            _ => None,
        })
    }

    pub fn via_mut(&mut self) -> Option<&mut Via> {
        self.headers.iter_mut().find_map(|h| match h {
            Header::Via(via) => Some(via),
            _ => None,
        })
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\r\n", self.start_line)?;
        for header in &self.headers {
            write!(f, "{}\r\n", header)?;
        }
        write!(f, "Content-Length: {}\r\n\r\n", self.body.len())?;
        if !self.body.is_empty() {
            write!(f, "{}", String::from_utf8_lossy(&self.body))?;
        }
        Ok(())
    }
}

/// Memory pool bound to one outbound message
///
/// Tracks what was duplicated into it so owners can see how much a message
/// cost. Dropped with its [`TxData`].
#[derive(Debug)]
pub struct TxPool {
    name: String,
    used: usize,
    allocations: usize,
}

impl TxPool {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            used: 0,
            allocations: 0,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Duplicate `src` into the pool, NUL terminator included in the accounting
    pub fn strdup(&mut self, src: &[u8]) -> Bytes {
        self.used += src.len() + 1;
        self.allocations += 1;
        Bytes::copy_from_slice(src)
    }

    /// Bytes handed out so far
    pub fn used(&self) -> usize {
        self.used
    }

    /// Number of duplications so far
    pub fn allocations(&self) -> usize {
        self.allocations
    }

    /// Address of the pool, used to salt identifiers of this message
    pub fn salt(&self) -> usize {
        self as *const Self as usize
    }
}

/// An outbound message on its way to the wire
#[derive(Debug)]
pub struct TxData {
    pub msg: Option<Message>,
    pub pool: Option<TxPool>,
    /// Short description for logs, e.g. `Request msg REGISTER/cseq=1`
    pub info: String,
}

impl TxData {
    /// Wrap a message together with a fresh pool
    pub fn new(msg: Message, pool_name: impl Into<String>) -> Self {
        let info = match &msg.start_line {
            StartLine::Request { method, .. } => format!("Request msg {}", method),
            StartLine::Response { status, .. } => format!("Response msg {}", status),
        };
        Self {
            msg: Some(msg),
            pool: Some(TxPool::new(pool_name)),
            info,
        }
    }

    /// Whether this carries a response; an empty `TxData` counts as a request
    pub fn is_response(&self) -> bool {
        self.msg.as_ref().map(|m| !m.is_request()).unwrap_or(false)
    }
}

impl fmt::Display for TxData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.info)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn register() -> Message {
        Message::request(Method::Register, "sip:pbx.example.com")
            .with_header(Header::Via(Via::new("UDP", "10.0.0.2:5060", Some("z9hG4bKtop"))))
            .with_header(Header::Via(Via::new("UDP", "10.0.0.3:5060", Some("z9hG4bKlower"))))
            .with_header(Header::CallId(CallId::new("abc")))
            .with_header(Header::other(HeaderName::CSeq, "1 REGISTER"))
    }

    #[test]
    fn test_top_via_is_first() {
        let msg = register();
        assert_eq!(msg.via().unwrap().branch_str(), Some("z9hG4bKtop"));
        assert_eq!(msg.count_hdr(&HeaderName::Via), 2);
    }

    #[test]
    fn test_wire_rendering() {
        let text = register().to_string();
        assert!(text.starts_with("REGISTER sip:pbx.example.com SIP/2.0\r\n"));
        assert!(text.contains("Call-ID: abc\r\n"));
        assert!(text.contains("CSeq: 1 REGISTER\r\n"));
        assert!(text.ends_with("Content-Length: 0\r\n\r\n"));
    }

    #[test]
    fn test_pool_accounting() {
        let mut pool = TxPool::new("tdata");
        let copy = pool.strdup(b"hello");
        assert_eq!(&copy[..], b"hello");
        assert_eq!(pool.used(), 6);
        assert_eq!(pool.allocations(), 1);
    }

    #[test]
    fn test_tdata_kind() {
        let req = TxData::new(register(), "req");
        assert!(!req.is_response());
        assert_eq!(req.to_string(), "Request msg REGISTER");

        let resp = TxData::new(Message::response(200, "OK"), "resp");
        assert!(resp.is_response());

        let empty = TxData {
            msg: None,
            pool: None,
            info: String::new(),
        };
        assert!(!empty.is_response());
    }
}
