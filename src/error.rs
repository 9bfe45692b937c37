//! Error types for the wagerlab crate

use thiserror::Error;

/// Main error type for the wagerlab crate
///
/// The trial state machine never produces these: malformed input is clamped
/// or ignored there. Errors only surface at the edges (configuration, token
/// parsing, exports).
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error("invalid configuration: {message}")]
    InvalidConfiguration { message: String },

    #[error("unknown action '{token}' (expected one of: retract, hold, add)")]
    UnknownAction { token: String },

    #[error("scripted dice need at least one face")]
    EmptyDiceScript,

    #[error("scripted die face {face} must be at least 1")]
    InvalidDieFace { face: u32 },

    #[error("session stalled in phase {phase} after {steps} steps")]
    Stalled { phase: String, steps: usize },

    #[error("failed to {operation}: {source}")]
    Io {
        operation: String,
        #[source]
        source: std::io::Error,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("progress bar template error: {message}")]
    ProgressBarTemplate { message: String },
}

/// Convenience type alias for Results using the crate's Error type
pub type Result<T> = std::result::Result<T, Error>;

impl From<std::io::Error> for Error {
    fn from(source: std::io::Error) -> Self {
        Error::Io {
            operation: "IO operation".to_string(),
            source,
        }
    }
}

impl Error {
    pub(crate) fn invalid_config(message: impl Into<String>) -> Self {
        Error::InvalidConfiguration {
            message: message.into(),
        }
    }
}
