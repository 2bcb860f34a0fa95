//! Common infrastructure for the softphone SIP shim
//!
//! Shared by every crate in the workspace:
//!
//! - **logging** - subscriber setup and log contexts
//! - **errors** - the infrastructure error type and error context helpers
//! - **config** - layered configuration loading (file + environment)

pub mod config;
pub mod errors;
pub mod logging;

pub use errors::context::{ErrorContext, ErrorExt};
pub use errors::types::{Error, Result};
pub use logging::context::LogContext;
pub use logging::setup::{level_from_verbosity, setup_logging, LoggingConfig};
