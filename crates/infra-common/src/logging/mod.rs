//! Logging setup and structured log contexts

pub mod context;
pub mod setup;
