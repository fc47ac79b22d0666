//! Error types for the logging framework

pub type Result<T> = std::result::Result<T, LoggerError>;

#[derive(Debug, thiserror::Error)]
pub enum LoggerError {
    /// Misconfiguration surfaced to the caller, optionally wrapping the cause
    #[error("Unable to configure {component}: {message}")]
    Configuration {
        component: String,
        message: String,
        #[source]
        source: Option<Box<LoggerError>>,
    },

    /// Unknown level name or value
    #[error("Invalid level: '{0}'")]
    InvalidLevel(String),

    /// A template referenced an attribute the record does not carry
    #[error("Record has no attribute '{name}'")]
    MissingAttribute { name: String },

    /// Malformed template or message arguments that do not fit it
    #[error("Format error: {message}")]
    Format { message: String },

    /// IO error with context
    #[error("IO error while {operation}: {message}")]
    IoOperation {
        operation: String,
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// Generic IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// File rotation error
    #[error("File rotation failed for '{path}': {message}")]
    FileRotation { path: String, message: String },

    /// Bounded queue rejected a record
    #[error("Log queue full: capacity {capacity}")]
    QueueFull { capacity: usize },

    /// Queue consumer side is gone
    #[error("Log queue closed")]
    QueueClosed,

    /// A handler was re-entered from its own emit path
    #[error("Handler '{handler}' re-entered while emitting")]
    ReentrantEmit { handler: String },

    /// A sink panicked while emitting
    #[error("Handler panicked: {0}")]
    Panicked(String),
}

impl LoggerError {
    /// Create a configuration error
    pub fn config(component: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::Configuration {
            component: component.into(),
            message: message.into(),
            source: None,
        }
    }

    /// Create a configuration error wrapping an underlying cause
    pub fn config_caused(
        component: impl Into<String>,
        message: impl Into<String>,
        source: LoggerError,
    ) -> Self {
        LoggerError::Configuration {
            component: component.into(),
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a missing attribute error
    pub fn missing_attribute(name: impl Into<String>) -> Self {
        LoggerError::MissingAttribute { name: name.into() }
    }

    /// Create a format error
    pub fn format<S: Into<String>>(message: S) -> Self {
        LoggerError::Format {
            message: message.into(),
        }
    }

    /// Create an IO operation error with context
    pub fn io_operation(
        operation: impl Into<String>,
        message: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        LoggerError::IoOperation {
            operation: operation.into(),
            message: message.into(),
            source,
        }
    }

    /// Create a file rotation error
    pub fn file_rotation(path: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::FileRotation {
            path: path.into(),
            message: message.into(),
        }
    }

    /// True for the errors raised by misuse of the formatting API
    pub fn is_format_error(&self) -> bool {
        matches!(
            self,
            LoggerError::Format { .. } | LoggerError::MissingAttribute { .. }
        )
    }
}
