//! Error types for the mesh-export crate.

use std::fmt;

/// Result type for mesh-export operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while resolving or aligning a mesh export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The export service reported an explicit error in the response body.
    Resolution {
        /// The message provided by the server, surfaced as-is.
        message: String,
    },
    /// The request failed or its body could not be parsed.
    Transport {
        /// The URL that failed.
        url: String,
        /// The underlying cause.
        message: String,
    },
    /// An input violated a documented precondition.
    Precondition {
        /// The operation whose precondition was violated.
        context: &'static str,
        /// Description of the violation.
        detail: String,
    },
    /// A well-formed response contained a value that could not be interpreted.
    InvalidData {
        /// Context for where the error occurred.
        context: &'static str,
        /// Description of what was invalid.
        detail: String,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Resolution { message } => write!(f, "{message}"),
            Error::Transport { url, message } => {
                write!(f, "request to {url} failed: {message}")
            }
            Error::Precondition { context, detail } => {
                write!(f, "{context}: {detail}")
            }
            Error::InvalidData { context, detail } => {
                write!(f, "invalid {context}: {detail}")
            }
        }
    }
}

impl std::error::Error for Error {}

impl Error {
    pub(crate) fn transport(url: &str, cause: impl fmt::Display) -> Self {
        Error::Transport {
            url: url.to_string(),
            message: cause.to_string(),
        }
    }
}
