use std::time::Duration;

use thiserror::Error;

/// Errors raised when work cannot be marshalled onto the UI thread.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    /// The dispatch loop has stopped (or never ran); nothing will execute
    /// submitted work.
    #[error("No UI thread available: the dispatch loop is not running")]
    NoUiThread,

    /// The UI thread did not finish a blocking invoke in time.
    #[error("UI thread did not complete the operation within {0:?}")]
    Timeout(Duration),

    /// The operation is only valid on the UI thread.
    #[error("Operation must run on the UI thread")]
    WrongThread,

    #[error("Invalid dispatcher argument: {message}")]
    InvalidArgument { message: String },

    #[error("Failed to spawn UI thread: {message}")]
    Spawn { message: String },
}
