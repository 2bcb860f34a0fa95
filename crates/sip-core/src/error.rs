//! Error types for sip-core

use thiserror::Error;

use crate::pipeline::ModuleId;

/// Result type for sip-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the message model and the TX pipeline
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum Error {
    /// A stage with the same name is already part of the pipeline
    #[error("module '{0}' is already registered")]
    DuplicateModule(String),

    /// No stage with this id is part of the pipeline
    #[error("module id {0} is not registered")]
    UnknownModule(ModuleId),

    /// A stage refused to let the message go out
    #[error("stage '{stage}' rejected the message: {reason}")]
    StageRejected { stage: String, reason: String },

    /// Header could not be built from the given input
    #[error("invalid header: {0}")]
    InvalidHeader(String),
}
