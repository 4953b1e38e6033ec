use agora_content::ContentError;
use agora_types::{PostId, Username};

/// Reasons an interaction is rejected.
///
/// Each variant corresponds to exactly one violated precondition. A rejected
/// interaction leaves every store unchanged.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GuardError {
    #[error("user not found: {0}")]
    UserNotFound(Username),

    #[error("invalid vote value: {0} (expected +1 or -1)")]
    InvalidVoteValue(i64),

    #[error("post not found: #{0}")]
    PostNotFound(PostId),

    /// The actor is the author of the post they tried to react to.
    #[error("{user} cannot interact with their own post #{post}")]
    SameAuthor { post: PostId, user: Username },

    /// The post is not in the actor's feed.
    #[error("post #{post} is not in the feed of {user}")]
    NotInFeed { post: PostId, user: Username },

    /// The voter already voted on this post.
    #[error("{voter} already voted on post #{post}")]
    DuplicateVote { post: PostId, voter: Username },

    /// The requester is not allowed to perform this operation on the post.
    #[error("invalid operation: {requester} is not the author of post #{post}")]
    InvalidOperation { post: PostId, requester: Username },

    #[error("title too long: {len} characters (max {max})")]
    TitleTooLong { len: usize, max: usize },

    #[error("content too long: {len} characters (max {max})")]
    ContentTooLong { len: usize, max: usize },

    /// A custom stage rejected the interaction.
    #[error("rejected by stage '{stage}': {message}")]
    Stage { stage: String, message: String },
}

impl GuardError {
    /// Create a rejection from a custom stage.
    pub fn stage(stage: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Stage {
            stage: stage.into(),
            message: message.into(),
        }
    }

    /// Stable short name of the violated precondition.
    pub fn code(&self) -> &'static str {
        match self {
            Self::UserNotFound(_) => "user-not-found",
            Self::InvalidVoteValue(_) => "invalid-vote-value",
            Self::PostNotFound(_) => "post-not-found",
            Self::SameAuthor { .. } => "same-author",
            Self::NotInFeed { .. } => "not-in-feed",
            Self::DuplicateVote { .. } => "duplicate-vote",
            Self::InvalidOperation { .. } => "invalid-operation",
            Self::TitleTooLong { .. } => "title-too-long",
            Self::ContentTooLong { .. } => "content-too-long",
            Self::Stage { .. } => "stage",
        }
    }
}

impl From<ContentError> for GuardError {
    fn from(err: ContentError) -> Self {
        match err {
            ContentError::UserNotFound(u) => Self::UserNotFound(u),
            ContentError::PostNotFound(id) => Self::PostNotFound(id),
            ContentError::TitleTooLong { len, max } => Self::TitleTooLong { len, max },
            ContentError::ContentTooLong { len, max } => Self::ContentTooLong { len, max },
            ContentError::DuplicateVote { post, voter } => Self::DuplicateVote { post, voter },
            ContentError::NotAuthor { post, requester } => {
                Self::InvalidOperation { post, requester }
            }
            // Only `ContentStore::restore` reports this and the guard never
            // restores, so no guarded mutation produces it.
            ContentError::DuplicatePostId(id) => {
                Self::stage("content", format!("post #{id} already exists"))
            }
        }
    }
}

pub type GuardResult<T> = Result<T, GuardError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_author_becomes_invalid_operation() {
        let err: GuardError = ContentError::NotAuthor {
            post: PostId(3),
            requester: "bob".into(),
        }
        .into();
        assert_eq!(err.code(), "invalid-operation");
        assert_eq!(err.to_string(), "invalid operation: bob is not the author of post #3");
    }

    #[test]
    fn codes_are_distinct_for_split_kinds() {
        let dup = GuardError::DuplicateVote { post: PostId(1), voter: "a".into() };
        let op = GuardError::InvalidOperation { post: PostId(1), requester: "a".into() };
        assert_ne!(dup.code(), op.code());
    }
}
