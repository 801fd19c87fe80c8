//! Error types for carrayrs.

use std::fmt;

/// Errors that can occur while sizing, configuring or filling a chunked array.
#[derive(Debug)]
pub enum CArrayError {
    /// An I/O error occurred while reading process diagnostics.
    Io(std::io::Error),

    /// A caller-supplied argument was rejected.
    InvalidArgument {
        /// Description of what was invalid.
        message: &'static str,
    },

    /// A source element could not be converted to the container's element type.
    TypeMismatch {
        /// Position of the offending element in the source stream.
        index: u64,
        /// Name of the element type the container stores.
        expected: &'static str,
        /// Conversion failure reported by the element type.
        reason: String,
    },
}

impl CArrayError {
    pub(crate) const fn invalid(message: &'static str) -> Self {
        CArrayError::InvalidArgument { message }
    }
}

impl fmt::Display for CArrayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CArrayError::Io(e) => write!(f, "io error: {}", e),
            CArrayError::InvalidArgument { message } => {
                write!(f, "invalid argument: {}", message)
            }
            CArrayError::TypeMismatch {
                index,
                expected,
                reason,
            } => {
                write!(
                    f,
                    "type mismatch at element {}: cannot convert to {} ({})",
                    index, expected, reason
                )
            }
        }
    }
}

impl std::error::Error for CArrayError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CArrayError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for CArrayError {
    fn from(e: std::io::Error) -> Self {
        CArrayError::Io(e)
    }
}
