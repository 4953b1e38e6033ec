use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::debug;

use agora_content::ContentStore;
use agora_feed::FeedEngine;
use agora_graph::GraphStore;
use agora_types::{PostId, VoteValue};

use crate::error::{GuardError, GuardResult};
use crate::stage::{GuardContext, GuardStage, Interaction, InteractionKind, StageResult};
use crate::stages::{
    ActorRegisteredStage, AuthorshipStage, ContentLengthStage, InFeedStage, NotOwnPostStage,
    PostExistsStage, SingleVoteStage, VoteValueStage,
};

// ---------------------------------------------------------------------------
// GuardReport
// ---------------------------------------------------------------------------

/// Audit trail of an accepted interaction.
#[derive(Clone, Debug)]
pub struct GuardReport {
    pub kind: InteractionKind,
    /// Per-stage results in evaluation order.
    pub stage_results: Vec<StageResult>,
    /// Total wall-clock time for the pipeline evaluation.
    pub elapsed: Duration,
}

// ---------------------------------------------------------------------------
// InteractionGuard
// ---------------------------------------------------------------------------

/// The rule engine in front of the content store.
///
/// Each interaction kind has an ordered pipeline of [`GuardStage`]s. The
/// pipeline is fail-fast: the first stage that rejects ends evaluation and
/// its error is returned. Existence checks come before relational checks, so
/// when several preconditions fail at once the reported error is stable.
///
/// Mutating calls ([`InteractionGuard::rate_post`] and friends) are the only
/// path to the content store's write operations that applies the rules.
pub struct InteractionGuard {
    graph: Arc<dyn GraphStore>,
    content: Arc<ContentStore>,
    feeds: FeedEngine,
    pipelines: HashMap<InteractionKind, Vec<Box<dyn GuardStage>>>,
}

impl InteractionGuard {
    /// Create a guard with empty pipelines.
    pub fn new(graph: Arc<dyn GraphStore>, content: Arc<ContentStore>, feeds: FeedEngine) -> Self {
        let pipelines = InteractionKind::ALL
            .into_iter()
            .map(|kind| (kind, Vec::new()))
            .collect();
        Self {
            graph,
            content,
            feeds,
            pipelines,
        }
    }

    /// Create a guard with the standard pipelines:
    ///
    /// - create: actor registered -> content length
    /// - rate: actor registered -> vote value -> post exists -> not own post
    ///   -> in feed -> single vote
    /// - comment: post exists -> not own post -> in feed
    /// - delete: post exists -> authorship
    pub fn with_default_stages(
        graph: Arc<dyn GraphStore>,
        content: Arc<ContentStore>,
        feeds: FeedEngine,
    ) -> Self {
        use InteractionKind::*;

        let mut guard = Self::new(graph, content, feeds);
        guard.add_stage(CreatePost, Box::new(ActorRegisteredStage));
        guard.add_stage(CreatePost, Box::new(ContentLengthStage));

        guard.add_stage(RatePost, Box::new(ActorRegisteredStage));
        guard.add_stage(RatePost, Box::new(VoteValueStage));
        guard.add_stage(RatePost, Box::new(PostExistsStage));
        guard.add_stage(RatePost, Box::new(NotOwnPostStage));
        guard.add_stage(RatePost, Box::new(InFeedStage));
        guard.add_stage(RatePost, Box::new(SingleVoteStage));

        guard.add_stage(CommentPost, Box::new(PostExistsStage));
        guard.add_stage(CommentPost, Box::new(NotOwnPostStage));
        guard.add_stage(CommentPost, Box::new(InFeedStage));

        guard.add_stage(DeletePost, Box::new(PostExistsStage));
        guard.add_stage(DeletePost, Box::new(AuthorshipStage));
        guard
    }

    /// Append a stage to the end of a pipeline.
    pub fn add_stage(&mut self, kind: InteractionKind, stage: Box<dyn GuardStage>) {
        self.pipelines.entry(kind).or_default().push(stage);
    }

    /// Number of stages in the pipeline for `kind`.
    pub fn stage_count(&self, kind: InteractionKind) -> usize {
        self.pipelines.get(&kind).map_or(0, Vec::len)
    }

    /// Names of the stages for `kind`, in evaluation order.
    pub fn stage_names(&self, kind: InteractionKind) -> Vec<&str> {
        self.pipelines
            .get(&kind)
            .map(|stages| stages.iter().map(|s| s.name()).collect())
            .unwrap_or_default()
    }

    pub fn feeds(&self) -> &FeedEngine {
        &self.feeds
    }

    /// Run the pipeline for an interaction without mutating anything.
    pub fn evaluate(&self, interaction: &Interaction<'_>) -> GuardResult<GuardReport> {
        let pipeline_start = Instant::now();
        let kind = interaction.kind();

        let ctx = GuardContext {
            graph: self.graph.as_ref(),
            content: self.content.as_ref(),
            feeds: &self.feeds,
            post: interaction.target().and_then(|id| self.content.get_post(id)),
        };

        let stages = self.pipelines.get(&kind).map(Vec::as_slice).unwrap_or_default();
        let mut stage_results = Vec::with_capacity(stages.len());

        for stage in stages {
            let stage_start = Instant::now();
            let outcome = stage.check(interaction, &ctx);
            stage_results.push(StageResult {
                stage_name: stage.name().to_string(),
                passed: outcome.is_ok(),
                elapsed: stage_start.elapsed(),
            });

            if let Err(err) = outcome {
                debug!(
                    %kind,
                    actor = interaction.actor(),
                    stage = stage.name(),
                    error = %err,
                    "interaction rejected"
                );
                return Err(err);
            }
        }

        Ok(GuardReport {
            kind,
            stage_results,
            elapsed: pipeline_start.elapsed(),
        })
    }

    // ---- Guarded mutations ----

    /// Create a post on behalf of `author`.
    pub fn create_post(&self, author: &str, title: &str, body: &str) -> GuardResult<PostId> {
        self.evaluate(&Interaction::CreatePost { author, title, body })?;
        Ok(self.content.create_post(author, title, body)?)
    }

    /// Vote on a post. `value` must be +1 or -1.
    pub fn rate_post(&self, voter: &str, post: PostId, value: i64) -> GuardResult<()> {
        self.evaluate(&Interaction::RatePost { voter, post, value })?;
        let vote = VoteValue::try_from(value).map_err(|_| GuardError::InvalidVoteValue(value))?;
        // The store re-checks the single-vote rule under the post lock, which
        // catches a concurrent vote that slipped in after evaluation.
        Ok(self.content.attach_vote(post, voter, vote)?)
    }

    /// Comment on a post.
    pub fn comment_post(&self, author: &str, post: PostId, text: &str) -> GuardResult<()> {
        self.evaluate(&Interaction::CommentPost { author, post, text })?;
        Ok(self.content.attach_comment(post, author, text)?)
    }

    /// Delete a post. Only its author may do so.
    pub fn delete_post(&self, requester: &str, post: PostId) -> GuardResult<()> {
        self.evaluate(&Interaction::DeletePost { requester, post })?;
        self.content.delete_post(post, requester)?;
        Ok(())
    }
}

impl std::fmt::Debug for InteractionGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut s = f.debug_struct("InteractionGuard");
        for kind in InteractionKind::ALL {
            s.field(kind.name(), &self.stage_names(kind));
        }
        s.finish()
    }
}
