//! Error types for the ChatterBoxer application.

use thiserror::Error;

/// A shared error type for every ChatterBoxer crate.
///
/// Storage backends map their library errors into these variants at the call
/// site so the orchestrator only ever sees one error type.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChatterError {
    /// An expected directory is missing or a configuration value is invalid.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A malformed on-disk record (Parquet file, TOML config, ...)
    #[error("Serialization error: {origin} - {message}")]
    Serialization {
        /// The file (or format) the bad data came from.
        origin: String,
        message: String,
    },

    /// IO error (file system operations)
    #[error("IO error: {message}")]
    Io { message: String },

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ChatterError {
    // ============================================================================
    // Constructor helpers
    // ============================================================================

    /// Creates a Configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Creates a Serialization error attributed to `origin`
    pub fn serialization(origin: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Serialization {
            origin: origin.into(),
            message: message.into(),
        }
    }

    /// Creates an IO error
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    // ============================================================================
    // Type checking methods
    // ============================================================================

    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }

    pub fn is_serialization(&self) -> bool {
        matches!(self, Self::Serialization { .. })
    }

    pub fn is_io(&self) -> bool {
        matches!(self, Self::Io { .. })
    }

    /// Returns the file a serialization error was attributed to, if any.
    pub fn origin(&self) -> Option<&str> {
        match self {
            Self::Serialization { origin, .. } => Some(origin),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ChatterError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

/// A type alias for `Result<T, ChatterError>`.
pub type Result<T> = std::result::Result<T, ChatterError>;
