use agora_feed::FeedError;

use crate::error::{GuardError, GuardResult};
use crate::stage::{GuardContext, GuardStage, Interaction};

/// The actor must not be the author of the target post.
pub struct NotOwnPostStage;

impl GuardStage for NotOwnPostStage {
    fn name(&self) -> &str {
        "not-own-post"
    }

    fn check(&self, interaction: &Interaction<'_>, ctx: &GuardContext<'_>) -> GuardResult<()> {
        let actor = interaction.actor();
        match &ctx.post {
            Some(post) if post.author.as_str() == actor => Err(GuardError::SameAuthor {
                post: post.id,
                user: actor.into(),
            }),
            _ => Ok(()),
        }
    }
}

/// The target post must be in the actor's feed: users only react to posts
/// by people they follow.
pub struct InFeedStage;

impl GuardStage for InFeedStage {
    fn name(&self) -> &str {
        "in-feed"
    }

    fn check(&self, interaction: &Interaction<'_>, ctx: &GuardContext<'_>) -> GuardResult<()> {
        let Some(id) = interaction.target() else {
            return Ok(());
        };
        let actor = interaction.actor();
        match ctx.feeds.is_post_in_feed(id, actor) {
            Ok(true) => Ok(()),
            Ok(false) => Err(GuardError::NotInFeed {
                post: id,
                user: actor.into(),
            }),
            Err(FeedError::UnknownUser(u)) => Err(GuardError::UserNotFound(u)),
        }
    }
}

/// The voter must not have voted on the target post before.
pub struct SingleVoteStage;

impl GuardStage for SingleVoteStage {
    fn name(&self) -> &str {
        "single-vote"
    }

    fn check(&self, interaction: &Interaction<'_>, ctx: &GuardContext<'_>) -> GuardResult<()> {
        let voter = interaction.actor();
        match &ctx.post {
            Some(post) if post.vote_by(&voter.into()).is_some() => {
                Err(GuardError::DuplicateVote {
                    post: post.id,
                    voter: voter.into(),
                })
            }
            _ => Ok(()),
        }
    }
}

/// Only the author may act on the post (used for deletion).
pub struct AuthorshipStage;

impl GuardStage for AuthorshipStage {
    fn name(&self) -> &str {
        "authorship"
    }

    fn check(&self, interaction: &Interaction<'_>, ctx: &GuardContext<'_>) -> GuardResult<()> {
        let requester = interaction.actor();
        match &ctx.post {
            Some(post) if post.author.as_str() != requester => {
                Err(GuardError::InvalidOperation {
                    post: post.id,
                    requester: requester.into(),
                })
            }
            _ => Ok(()),
        }
    }
}
