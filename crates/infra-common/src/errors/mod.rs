//! Error types shared across the workspace

pub mod context;
pub mod types;
