use std::fmt;
use std::time::Duration;

use agora_content::ContentStore;
use agora_feed::FeedEngine;
use agora_graph::GraphStore;
use agora_types::{Post, PostId};

use crate::error::GuardResult;

// ---------------------------------------------------------------------------
// Interaction
// ---------------------------------------------------------------------------

/// The kind of interaction, used to select a pipeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum InteractionKind {
    CreatePost,
    RatePost,
    CommentPost,
    DeletePost,
}

impl InteractionKind {
    pub const ALL: [InteractionKind; 4] = [
        InteractionKind::CreatePost,
        InteractionKind::RatePost,
        InteractionKind::CommentPost,
        InteractionKind::DeletePost,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::CreatePost => "create-post",
            Self::RatePost => "rate-post",
            Self::CommentPost => "comment-post",
            Self::DeletePost => "delete-post",
        }
    }
}

impl fmt::Display for InteractionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A request from a user to change content, evaluated by the guard.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Interaction<'a> {
    CreatePost {
        author: &'a str,
        title: &'a str,
        body: &'a str,
    },
    RatePost {
        voter: &'a str,
        post: PostId,
        value: i64,
    },
    CommentPost {
        author: &'a str,
        post: PostId,
        text: &'a str,
    },
    DeletePost {
        requester: &'a str,
        post: PostId,
    },
}

impl<'a> Interaction<'a> {
    pub fn kind(&self) -> InteractionKind {
        match self {
            Self::CreatePost { .. } => InteractionKind::CreatePost,
            Self::RatePost { .. } => InteractionKind::RatePost,
            Self::CommentPost { .. } => InteractionKind::CommentPost,
            Self::DeletePost { .. } => InteractionKind::DeletePost,
        }
    }

    /// The user performing the interaction.
    pub fn actor(&self) -> &'a str {
        match *self {
            Self::CreatePost { author, .. } => author,
            Self::RatePost { voter, .. } => voter,
            Self::CommentPost { author, .. } => author,
            Self::DeletePost { requester, .. } => requester,
        }
    }

    /// The post being acted on, if any.
    pub fn target(&self) -> Option<PostId> {
        match *self {
            Self::CreatePost { .. } => None,
            Self::RatePost { post, .. }
            | Self::CommentPost { post, .. }
            | Self::DeletePost { post, .. } => Some(post),
        }
    }
}

// ---------------------------------------------------------------------------
// StageResult
// ---------------------------------------------------------------------------

/// Recorded result from a stage that ran.
#[derive(Clone, Debug)]
pub struct StageResult {
    pub stage_name: String,
    pub passed: bool,
    pub elapsed: Duration,
}

// ---------------------------------------------------------------------------
// GuardContext
// ---------------------------------------------------------------------------

/// Everything a stage may consult.
///
/// The target post is resolved once, before the first stage runs, so every
/// stage sees the same snapshot.
pub struct GuardContext<'a> {
    pub graph: &'a dyn GraphStore,
    pub content: &'a ContentStore,
    pub feeds: &'a FeedEngine,
    /// Snapshot of the target post, `None` if it does not exist or the
    /// interaction has no target.
    pub post: Option<Post>,
}

// ---------------------------------------------------------------------------
// GuardStage trait
// ---------------------------------------------------------------------------

/// A single precondition in a guard pipeline.
///
/// Stages run in order and the first failure ends the evaluation, so the
/// position of a stage decides which error is reported when several
/// preconditions are violated at once.
pub trait GuardStage: Send + Sync {
    /// Short name of this stage (e.g. "post-exists").
    fn name(&self) -> &str;

    /// Check the interaction, returning the specific violation on failure.
    fn check(&self, interaction: &Interaction<'_>, ctx: &GuardContext<'_>) -> GuardResult<()>;
}
