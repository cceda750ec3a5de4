//! Common result and error types for the leakopt workspace.

/// The standard result type for fallible internal operations.
///
/// `Err` indicates an unrecoverable internal error (a bug in leakopt), not a
/// problem with the design being optimized. Design-level conditions such as a
/// timing violation after a swap are normal control flow and never surface
/// through this type.
pub type LeakoptResult<T> = Result<T, InternalError>;

/// An internal error indicating a bug in leakopt, not a user input problem.
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
