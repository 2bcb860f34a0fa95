//! Client-core: softphone shim over a wrapped SIP stack
//!
//! This crate is the thin layer a softphone UI talks to. The SIP stack
//! itself sits behind the [`SipStack`] trait; this crate owns the lifecycle
//! around it and the outbound identifier repair.
//!
//! ## Layering
//! ```text
//! StatusFacade (i32) -> SoftphoneClient -> SipStack -> EndpointHandle -> TxPipeline
//!                                                                         └─ TxSanitizer (sip-core)
//! ```
//!
//! Client-core focuses on:
//! - Library bootstrap and idempotent start
//! - Transport creation with the first UDP transport bound to accounts
//! - A single live account with digest credentials and NAT defaults
//! - Reacting to registration failures (no endless 401 retry loop)
//! - The integer status boundary for foreign callers
//!
//! [`loopback::LoopbackStack`] is an in-memory stack for tests and dry runs.

pub mod account;
pub mod client;
pub mod config;
pub mod error;
pub mod loopback;
pub mod registration;
pub mod stack;
pub mod status;
pub mod transport;

// Public API exports
pub use account::{ensure_sip_scheme, AccountConfig, AuthCredential, NatConfig, RegConfig};
pub use client::{LifecycleState, ModuleRegistration, SoftphoneClient, SHIM_BUILD_TAG};
pub use config::{ClientConfig, CredentialPolicy};
pub use error::{ClientError, ClientResult, Operation};
pub use registration::RegistrationObserver;
pub use stack::{
    AccountId, AccountInfo, AccountObserver, EndpointConfig, EndpointHandle, RegStateEvent, SipStack,
    StackError, StackResult,
};
pub use status::StatusFacade;
pub use transport::{TransportConfig, TransportId, TransportInfo, TransportKind};

/// Client-core version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
