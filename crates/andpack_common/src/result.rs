//! Common result and error types for the packaging pipeline.

/// The standard result type for fallible internal operations.
///
/// `Ok` contains the result value (which may be partial after a user error
/// was reported). `Err` indicates a bug in andpack, not a problem with the
/// project being built. Project problems are reported as diagnostics and the
/// operation still returns `Ok`.
pub type AndpackResult<T> = Result<T, InternalError>;

/// An internal error indicating a bug in andpack, not a user input problem.
#[derive(Debug, thiserror::Error)]
#[error("internal error: {message}")]
pub struct InternalError {
    /// Description of the internal error.
    pub message: String,
}

impl InternalError {
    /// Creates a new internal error with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<String> for InternalError {
    fn from(message: String) -> Self {
        Self { message }
    }
}
