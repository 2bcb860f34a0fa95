use std::fmt;

use bytes::Bytes;

/// The `Call-ID` header value
///
/// Stored as raw bytes because a defective stack can hand over anything,
/// including no value at all (`CallId::null`).
///
/// ```rust
/// use softphone_sip_core::types::CallId;
///
/// let id = CallId::new("a84b4c76e66710@pc33.atlanta.com");
/// assert_eq!(id.as_str(), Some("a84b4c76e66710@pc33.atlanta.com"));
/// assert_eq!(CallId::null().value(), None);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CallId {
    id: Option<Bytes>,
}

impl CallId {
    /// A Call-ID holding `value`
    pub fn new(value: impl AsRef<[u8]>) -> Self {
        Self {
            id: Some(Bytes::copy_from_slice(value.as_ref())),
        }
    }

    /// A Call-ID whose value was never set
    pub fn null() -> Self {
        Self { id: None }
    }

    /// Raw value, `None` when unset
    pub fn value(&self) -> Option<&[u8]> {
        self.id.as_deref()
    }

    /// Value as text, `None` when unset or not UTF-8
    pub fn as_str(&self) -> Option<&str> {
        self.value().and_then(|v| std::str::from_utf8(v).ok())
    }

    /// Replace the value
    pub fn set(&mut self, value: Bytes) {
        self.id = Some(value);
    }
}

impl fmt::Display for CallId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.id {
            Some(v) => write!(f, "{}", String::from_utf8_lossy(v)),
            None => Ok(()),
        }
    }
}
