use std::fmt;

use crate::types::{CallId, HeaderName, Via};

/// A header of an outbound message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Header {
    Via(Via),
    CallId(CallId),
    /// Any header the shim does not inspect
    Other { name: HeaderName, value: String },
}

impl Header {
    /// Build an untyped header
    pub fn other(name: HeaderName, value: impl Into<String>) -> Self {
        Header::Other {
            name,
            value: value.into(),
        }
    }

    pub fn name(&self) -> HeaderName {
        match self {
            Header::Via(_) => HeaderName::Via,
            Header::CallId(_) => HeaderName::CallId,
            Header::Other { name, .. } => name.clone(),
        }
    }
}

impl fmt::Display for Header {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Header::Via(via) => write!(f, "Via: {}", via),
            Header::CallId(id) => write!(f, "Call-ID: {}", id),
            Header::Other { name, value } => write!(f, "{}: {}", name, value),
        }
    }
}
