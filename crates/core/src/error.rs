/// Result alias that carries the custom [`FollowMeError`] type.
pub type Result<T> = std::result::Result<T, FollowMeError>;

/// Common error type for the core crate.
///
/// Only storage, persistence and collaborator services produce these. Guard
/// rejections inside the trainer are reported through
/// [`Outcome`](crate::Outcome) instead.
#[derive(Debug, thiserror::Error)]
pub enum FollowMeError {
    /// Free-form failure reported by a backend or collaborator.
    #[error("{0}")]
    Message(String),
    /// A value handed to the core was outside its accepted range.
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),
    /// Wrapper around standard IO errors.
    #[error("{0}")]
    Io(#[from] std::io::Error),
    /// A persisted document could not be encoded or decoded.
    #[error("{0}")]
    Json(#[from] serde_json::Error),
}

impl FollowMeError {
    /// Creates a new error that simply wraps the provided message.
    pub fn msg<T: Into<String>>(msg: T) -> Self {
        Self::Message(msg.into())
    }
}

impl From<&str> for FollowMeError {
    fn from(value: &str) -> Self {
        Self::msg(value)
    }
}

impl From<String> for FollowMeError {
    fn from(value: String) -> Self {
        Self::Message(value)
    }
}
