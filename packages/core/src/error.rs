//! Error types for blocking operations.

/// Errors raised by waiters and the block manager.
#[derive(thiserror::Error, Debug)]
pub enum BlockError {
    /// A required constructor input was missing.
    #[error("{field} is required to construct a blocker")]
    Construction { field: &'static str },

    /// Population arguments were unusable.
    #[error("{prefix} blocker {message}")]
    Argument { prefix: String, message: String },

    /// The handle validator rejected a handle.
    #[error("{handle}: invalid handle: {reason}")]
    Validation { handle: String, reason: String },

    /// A handle in the set has no registry entry.
    #[error("handle '{handle}' doesn't map to a valid blockable")]
    UnknownHandle { handle: String },

    /// A waiter with no real handles was woken.
    #[error("internal invariant violated: {message}")]
    InternalInvariant { message: String },

    /// The notifier tag was requested before any wait completed.
    #[error("{prefix} blocker has no result: block() has not completed")]
    NoBlockResult { prefix: String },

    /// The waiter's monitor was poisoned by a panicking thread.
    #[error("blocker monitor poisoned")]
    Poisoned,

    /// A chain link thread could not be started.
    #[error("failed to spawn chain link thread: {0}")]
    Spawn(#[from] std::io::Error),

    /// A chain link thread ended without reporting an outcome.
    #[error("block manager lost a chain link")]
    ManagerDisconnected,
}

impl BlockError {
    pub(crate) fn argument(prefix: &str, message: &str) -> Self {
        BlockError::Argument {
            prefix: prefix.to_string(),
            message: message.to_string(),
        }
    }
}

/// Result type alias for blocking operations.
pub type Result<T> = std::result::Result<T, BlockError>;
