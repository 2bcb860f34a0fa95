use std::collections::BTreeMap;
use std::fmt;
use tracing::{Level, Span};

/// Context information for logging
#[derive(Debug, Clone)]
pub struct LogContext {
    /// Component that is generating the log
    pub component: String,
    /// Operation or action being performed
    pub operation: Option<String>,
    /// Additional contextual fields, kept sorted for stable output
    pub fields: BTreeMap<String, String>,
}

impl LogContext {
    /// Create a new log context with just the component name
    pub fn new<S: Into<String>>(component: S) -> Self {
        LogContext {
            component: component.into(),
            operation: None,
            fields: BTreeMap::new(),
        }
    }

    /// Create a new log context with component and operation
    pub fn with_operation<S: Into<String>, T: Into<String>>(component: S, operation: T) -> Self {
        LogContext {
            component: component.into(),
            operation: Some(operation.into()),
            fields: BTreeMap::new(),
        }
    }

    /// Add a field to the context
    pub fn with_field<S: Into<String>, T: Into<String>>(mut self, key: S, value: T) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Create a span with this context's information
    pub fn span(&self, level: Level) -> Span {
        let op = self.operation.as_deref().unwrap_or("-");
        // span levels have to be known at compile time
        if level == Level::TRACE {
            tracing::trace_span!("softphone", component = %self.component, operation = %op)
        } else if level == Level::DEBUG {
            tracing::debug_span!("softphone", component = %self.component, operation = %op)
        } else if level == Level::INFO {
            tracing::info_span!("softphone", component = %self.component, operation = %op)
        } else if level == Level::WARN {
            tracing::warn_span!("softphone", component = %self.component, operation = %op)
        } else {
            tracing::error_span!("softphone", component = %self.component, operation = %op)
        }
    }
}

impl fmt::Display for LogContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.component)?;

        if let Some(op) = &self.operation {
            write!(f, "[{}]", op)?;
        }

        for (key, value) in &self.fields {
            write!(f, "[{}={}]", key, value)?;
        }

        Ok(())
    }
}
