//! # softphone-sip-core
//!
//! The pieces of outbound SIP handling that the softphone shim owns itself,
//! independent of the SIP stack it wraps:
//!
//! - [`unique`] - 32-character hex tokens and 16-byte GUIDs for Call-ID and
//!   branch values, plus the [`IdGenerator`] strategy handed to the stack
//! - [`validation`] - the visible-ASCII predicate that decides whether a
//!   token needs repair
//! - [`message`] - the outbound message (`TxData`) with its owning pool
//! - [`pipeline`] - an ordered list of named stages every outbound message
//!   passes before it reaches the wire
//! - [`sanitizer`] - the stage that repairs `Call-ID` and `Via` branch
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use softphone_sip_core::prelude::*;
//!
//! let mut pipeline = TxPipeline::new();
//! pipeline.register(Arc::new(TxSanitizer::new())).unwrap();
//!
//! let msg = Message::request(Method::Register, "sip:pbx.example.com")
//!     .with_header(Header::Via(Via::new("UDP", "10.0.0.2:5060", Some(""))))
//!     .with_header(Header::CallId(CallId::null()));
//! let mut tdata = TxData::new(msg, "tdata-register");
//!
//! pipeline.process(&mut tdata).unwrap();
//!
//! let msg = tdata.msg.as_ref().unwrap();
//! assert_eq!(msg.call_id().unwrap().value().unwrap().len(), 32);
//! assert!(msg.via().unwrap().branch_str().unwrap().starts_with("z9hG4bK"));
//! ```

pub mod error;
pub mod message;
pub mod pipeline;
pub mod sanitizer;
pub mod types;
pub mod unique;
pub mod validation;

pub use error::{Error, Result};
pub use message::{Message, StartLine, TxData, TxPool};
pub use pipeline::{ModuleId, TxModule, TxPipeline};
pub use sanitizer::{SanitizeReport, TxSanitizer};
pub use types::{CallId, Header, HeaderName, Method, Via};
pub use unique::{HexIdGenerator, IdGenerator};

/// Commonly used items
pub mod prelude {
    pub use crate::message::{Message, StartLine, TxData, TxPool};
    pub use crate::pipeline::{
        ModuleId, TxModule, TxPipeline, PRIORITY_APPLICATION, PRIORITY_DIALOG_USAGE,
        PRIORITY_TRANSPORT_LAYER, PRIORITY_TSX_LAYER, PRIORITY_UA_PROXY_LAYER,
    };
    pub use crate::sanitizer::{SanitizeReport, TxSanitizer, MAGIC_COOKIE};
    pub use crate::types::{CallId, Header, HeaderName, Method, Via};
    pub use crate::unique::{HexIdGenerator, IdGenerator};
    pub use crate::validation::has_only_printables;
}
