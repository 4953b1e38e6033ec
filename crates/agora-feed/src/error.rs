use agora_types::Username;

/// Errors from feed computation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FeedError {
    /// The user whose feed was requested is not registered.
    #[error("unknown user: {0}")]
    UnknownUser(Username),
}

pub type FeedResult<T> = Result<T, FeedError>;
