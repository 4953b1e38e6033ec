use agora_types::{PostId, Username};

/// Errors from content store operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ContentError {
    /// The author is not a registered user.
    #[error("user not found: {0}")]
    UserNotFound(Username),

    /// No post with this identifier exists.
    #[error("post not found: #{0}")]
    PostNotFound(PostId),

    /// The title exceeds the configured maximum length.
    #[error("title too long: {len} characters (max {max})")]
    TitleTooLong { len: usize, max: usize },

    /// The body exceeds the configured maximum length.
    #[error("content too long: {len} characters (max {max})")]
    ContentTooLong { len: usize, max: usize },

    /// The voter already voted on this post.
    #[error("{voter} already voted on post #{post}")]
    DuplicateVote { post: PostId, voter: Username },

    /// Only the author may delete a post.
    #[error("{requester} is not the author of post #{post}")]
    NotAuthor { post: PostId, requester: Username },

    /// A restored post collides with one already in the store.
    #[error("post #{0} already exists")]
    DuplicatePostId(PostId),
}

/// Result alias for content store operations.
pub type ContentResult<T> = Result<T, ContentError>;
