use thiserror::Error;

/// Failure of an asynchronous backend call (query, procedure, image lookup).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    /// The backend rejected the call; the message is shown to the user as is.
    #[error("{0}")]
    Rejected(String),

    #[error("backend unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NotificationError {
    #[error("subscription rejected: {0}")]
    Rejected(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActionError {
    #[error("{0}")]
    Failed(String),

    #[error("action target not found: {0}")]
    NotFound(String),
}
