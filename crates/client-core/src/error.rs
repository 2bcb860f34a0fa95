//! Error types for the softphone client
//!
//! Every failure carries the [`Operation`] it happened in, so the integer
//! boundary can map it to the status code that operation has always
//! returned without parsing messages.

use std::fmt;

use thiserror::Error;

use crate::stack::StackError;

/// Result type for client operations
pub type ClientResult<T> = Result<T, ClientError>;

/// Facade operation an error originated from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Init,
    CreateTransport,
    Start,
    AddAccount,
    SetCredentials,
    Reregister,
    RegisterWithCredentials,
    Login,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Init => "init",
            Operation::CreateTransport => "create_transport",
            Operation::Start => "start",
            Operation::AddAccount => "add_account",
            Operation::SetCredentials => "set_credentials",
            Operation::Reregister => "reregister",
            Operation::RegisterWithCredentials => "register_with_credentials",
            Operation::Login => "login",
        }
    }

    /// Status returned when the precondition of this operation is not met
    pub fn not_ready_code(&self) -> i32 {
        match self {
            Operation::Init => -1,
            Operation::CreateTransport => -2,
            Operation::Start => -3,
            Operation::AddAccount | Operation::SetCredentials | Operation::Reregister => -1,
            Operation::RegisterWithCredentials => -10,
            Operation::Login => -5,
        }
    }

    /// Status returned when the wrapped stack rejects this operation
    pub fn failure_code(&self) -> i32 {
        match self {
            Operation::Init => -1,
            Operation::CreateTransport => -2,
            Operation::Start => -3,
            Operation::AddAccount | Operation::SetCredentials | Operation::Reregister => -2,
            Operation::RegisterWithCredentials => -11,
            Operation::Login => -6,
        }
    }

    /// Status returned for anything else going wrong
    pub fn other_code(&self) -> i32 {
        match self {
            Operation::Login => -7,
            other => other.failure_code(),
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that can occur in the softphone client
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// The library has not been initialized
    #[error("{operation}: library not initialized")]
    NotReady { operation: Operation },

    /// The operation needs an account and there is none
    #[error("{operation}: no active account")]
    NoAccount { operation: Operation },

    /// The wrapped stack reported a failure
    #[error("{operation}: {source}")]
    Stack {
        operation: Operation,
        #[source]
        source: StackError,
    },

    /// Caller supplied an unusable argument
    #[error("{operation}: invalid argument: {reason}")]
    InvalidArgument { operation: Operation, reason: String },

    /// Internal error
    #[error("{operation}: internal error: {message}")]
    Internal { operation: Operation, message: String },
}

impl ClientError {
    pub fn not_ready(operation: Operation) -> Self {
        Self::NotReady { operation }
    }

    pub fn no_account(operation: Operation) -> Self {
        Self::NoAccount { operation }
    }

    pub fn stack(operation: Operation, source: StackError) -> Self {
        Self::Stack { operation, source }
    }

    pub fn invalid_argument(operation: Operation, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            operation,
            reason: reason.into(),
        }
    }

    pub fn internal(operation: Operation, message: impl Into<String>) -> Self {
        Self::Internal {
            operation,
            message: message.into(),
        }
    }

    /// Operation this error belongs to
    pub fn operation(&self) -> Operation {
        match self {
            ClientError::NotReady { operation }
            | ClientError::NoAccount { operation }
            | ClientError::Stack { operation, .. }
            | ClientError::InvalidArgument { operation, .. }
            | ClientError::Internal { operation, .. } => *operation,
        }
    }

    /// Whether the call failed a precondition rather than in the stack
    pub fn is_not_ready(&self) -> bool {
        matches!(self, ClientError::NotReady { .. } | ClientError::NoAccount { .. })
    }

    /// Negative status code reported across the integer boundary
    pub fn status_code(&self) -> i32 {
        let operation = self.operation();
        match self {
            ClientError::NotReady { .. } | ClientError::NoAccount { .. } => operation.not_ready_code(),
            ClientError::Stack { .. } => operation.failure_code(),
            ClientError::InvalidArgument { .. } | ClientError::Internal { .. } => operation.other_code(),
        }
    }
}
