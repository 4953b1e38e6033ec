use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use agora_content::{ContentLimits, ContentStore};
use agora_feed::{FeedEngine, FeedError};
use agora_graph::{GraphError, GraphStore, InMemoryGraph};
use agora_guard::{GuardReport, Interaction, InteractionGuard};
use agora_types::{Clock, Post, PostId, SystemClock, User, Username};

use crate::config::{ConfigProvider, CoreConfig};
use crate::error::{CoreError, CoreResult};
use crate::wallet::{Wallet, WalletRegistry, WalletSummary};

/// Sizes of the shared tables.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoreCounts {
    pub users: usize,
    pub posts: usize,
    pub wallets: usize,
}

/// The social core: one owned object holding every shared table.
///
/// All methods take `&self` and are safe to call from many threads at once;
/// wrap the core in an [`Arc`] to hand it to a transport layer. Content
/// mutations go through the [`InteractionGuard`], so a rejected call returns
/// one specific error and leaves every table unchanged.
pub struct SocialCore {
    config: CoreConfig,
    clock: Arc<dyn Clock>,
    graph: Arc<dyn GraphStore>,
    content: Arc<ContentStore>,
    guard: InteractionGuard,
    wallets: WalletRegistry,
}

impl SocialCore {
    /// Build an empty core from parsed settings.
    pub fn new(config: CoreConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Build an empty core stamping posts and wallet entries with `clock`.
    pub fn with_clock(config: CoreConfig, clock: Arc<dyn Clock>) -> Self {
        let graph: Arc<dyn GraphStore> = Arc::new(InMemoryGraph::new());
        let content = Arc::new(
            ContentStore::new(Arc::clone(&graph), config.limits, config.next_post_id)
                .with_clock(Arc::clone(&clock)),
        );
        let feeds = FeedEngine::new(Arc::clone(&graph), Arc::clone(&content));
        let guard =
            InteractionGuard::with_default_stages(Arc::clone(&graph), Arc::clone(&content), feeds);
        Self {
            config,
            clock,
            graph,
            content,
            guard,
            wallets: WalletRegistry::new(),
        }
    }

    /// Read settings from `provider` and build a core seeded with them.
    pub fn open(provider: &dyn ConfigProvider) -> CoreResult<Self> {
        let config = CoreConfig::from_provider(provider)?;
        info!(
            next_post_id = config.next_post_id,
            max_title_len = config.limits.max_title_len,
            max_content_len = config.limits.max_content_len,
            "social core opened"
        );
        Ok(Self::new(config))
    }

    /// Persist the identifier allocator so the next run continues after the
    /// last issued id.
    pub fn close(&self, provider: &mut dyn ConfigProvider) -> CoreResult<()> {
        let next = self.next_post_id();
        provider.save_last_id(next.as_u64())?;
        info!(next_post_id = next.as_u64(), posts = self.content.len(), "social core closed");
        Ok(())
    }

    // ---- Content operations ----

    pub fn create_post(&self, author: &str, title: &str, body: &str) -> CoreResult<PostId> {
        let id = self.guard.create_post(author, title, body)?;
        debug!(%author, post = %id, "post created");
        Ok(id)
    }

    /// Vote +1 or -1 on a post from the voter's feed.
    pub fn rate_post(&self, voter: &str, post: PostId, value: i64) -> CoreResult<()> {
        self.guard.rate_post(voter, post, value)?;
        debug!(%voter, %post, value, "post rated");
        Ok(())
    }

    pub fn comment_post(&self, author: &str, post: PostId, text: &str) -> CoreResult<()> {
        self.guard.comment_post(author, post, text)?;
        debug!(%author, %post, "comment added");
        Ok(())
    }

    pub fn delete_post(&self, requester: &str, post: PostId) -> CoreResult<()> {
        self.guard.delete_post(requester, post)?;
        debug!(%requester, %post, "post deleted");
        Ok(())
    }

    /// Run the rule pipeline for `interaction` without applying it.
    ///
    /// The report lists every stage that ran with its timing. A transport
    /// layer can use it to validate a request before committing to it.
    pub fn preflight(&self, interaction: &Interaction<'_>) -> CoreResult<GuardReport> {
        Ok(self.guard.evaluate(interaction)?)
    }

    pub fn get_post(&self, id: PostId) -> Option<Post> {
        self.content.get_post(id)
    }

    /// Posts written by `username`, ascending by id.
    pub fn user_posts(&self, username: &str) -> CoreResult<Vec<Post>> {
        self.ensure_user(username)?;
        Ok(self.content.posts_by(username))
    }

    /// Posts by everyone `username` follows, newest first.
    pub fn user_feed(&self, username: &str) -> CoreResult<Vec<Post>> {
        self.guard.feeds().compute_feed(username).map_err(unknown_user)
    }

    pub fn is_post_in_feed(&self, post: PostId, username: &str) -> CoreResult<bool> {
        self.guard
            .feeds()
            .is_post_in_feed(post, username)
            .map_err(unknown_user)
    }

    /// Human-readable form of a post, `None` if it does not exist.
    pub fn render_post(&self, id: PostId, hide_author: bool) -> Option<String> {
        self.content.render(id, hide_author)
    }

    /// Every live post, ascending by id.
    pub fn posts_snapshot(&self) -> Vec<Post> {
        self.content.snapshot()
    }

    /// Load previously saved posts. The allocator moves past the highest
    /// restored id.
    pub fn restore_posts(&self, posts: Vec<Post>) -> CoreResult<usize> {
        let restored = self.content.restore(posts)?;
        info!(restored, next_post_id = %self.next_post_id(), "posts restored");
        Ok(restored)
    }

    /// The identifier the next created post will receive.
    pub fn next_post_id(&self) -> PostId {
        self.content.next_id()
    }

    // ---- Users ----

    pub fn add_user<I, T>(&self, username: &str, tags: I) -> CoreResult<()>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        self.graph.register(User::new(username, tags))?;
        Ok(())
    }

    /// Unregister a user and drop every follow edge touching them. Their
    /// posts and wallet are kept.
    pub fn remove_user(&self, username: &str) -> CoreResult<User> {
        Ok(self.graph.remove_user(username)?)
    }

    pub fn find_user(&self, username: &str) -> Option<User> {
        self.graph.find_user(username)
    }

    pub fn contains_user(&self, username: &str) -> bool {
        self.graph.contains_user(username)
    }

    /// All registered users, sorted by username.
    pub fn users(&self) -> Vec<User> {
        self.graph.users()
    }

    pub fn users_by_tag(&self, tag: &str) -> Vec<User> {
        self.graph.users_by_tag(tag)
    }

    /// Users sharing at least one of `tags`, each listed once.
    pub fn users_with_similar_tags(&self, tags: &[&str]) -> Vec<User> {
        self.graph.users_with_similar_tags(tags)
    }

    fn ensure_user(&self, username: &str) -> CoreResult<()> {
        if self.graph.contains_user(username) {
            Ok(())
        } else {
            Err(GraphError::UserNotFound(username.into()).into())
        }
    }

    // ---- Follow graph ----

    /// `follower` starts receiving `followed`'s posts. Returns `false` if the
    /// edge already existed.
    pub fn follow(&self, follower: &str, followed: &str) -> CoreResult<bool> {
        Ok(self.graph.follow(follower, followed)?)
    }

    pub fn unfollow(&self, follower: &str, followed: &str) -> CoreResult<bool> {
        Ok(self.graph.unfollow(follower, followed)?)
    }

    /// Record that `follower` follows `username`.
    pub fn add_follower(&self, username: &str, follower: &str) -> CoreResult<bool> {
        self.follow(follower, username)
    }

    pub fn remove_follower(&self, username: &str, follower: &str) -> CoreResult<bool> {
        self.unfollow(follower, username)
    }

    /// Whether `follower` is among the followers of `username`.
    pub fn find_follower(&self, username: &str, follower: &str) -> CoreResult<bool> {
        Ok(self.graph.is_following(follower, username)?)
    }

    /// Record that `username` follows `followed`.
    pub fn add_following(&self, username: &str, followed: &str) -> CoreResult<bool> {
        self.follow(username, followed)
    }

    pub fn remove_following(&self, username: &str, followed: &str) -> CoreResult<bool> {
        self.unfollow(username, followed)
    }

    /// Whether `username` follows `followed`.
    pub fn find_following(&self, username: &str, followed: &str) -> CoreResult<bool> {
        Ok(self.graph.is_following(username, followed)?)
    }

    pub fn followers(&self, username: &str) -> CoreResult<Vec<Username>> {
        Ok(self.graph.followers(username)?)
    }

    pub fn following(&self, username: &str) -> CoreResult<Vec<Username>> {
        Ok(self.graph.following(username)?)
    }

    pub fn follower_count(&self, username: &str) -> CoreResult<usize> {
        Ok(self.graph.follower_count(username)?)
    }

    pub fn following_count(&self, username: &str) -> CoreResult<usize> {
        Ok(self.graph.following_count(username)?)
    }

    pub fn counts(&self) -> CoreCounts {
        CoreCounts {
            users: self.graph.user_count(),
            posts: self.content.len(),
            wallets: self.wallets.len(),
        }
    }

    // ---- Wallets ----

    /// The wallet of `username`, created empty on first access.
    pub fn get_or_create_wallet(&self, username: &str) -> Arc<Wallet> {
        self.wallets.get_or_create(username)
    }

    /// Credit `username`'s wallet, stamped with the core's clock. Returns
    /// the new balance.
    pub fn credit_wallet(&self, username: &str, amount: f64, reason: &str) -> CoreResult<f64> {
        self.wallets
            .get_or_create(username)
            .credit(amount, reason, self.clock.now())
    }

    pub fn wallet_summaries(&self) -> Vec<WalletSummary> {
        self.wallets.summaries()
    }

    // ---- Accessors ----

    pub fn config(&self) -> &CoreConfig {
        &self.config
    }

    pub fn limits(&self) -> ContentLimits {
        self.content.limits()
    }

    pub fn graph(&self) -> &Arc<dyn GraphStore> {
        &self.graph
    }

    pub fn content(&self) -> &Arc<ContentStore> {
        &self.content
    }

    pub fn guard(&self) -> &InteractionGuard {
        &self.guard
    }
}

/// Report a missing user the same way the graph queries do.
fn unknown_user(err: FeedError) -> CoreError {
    match err {
        FeedError::UnknownUser(u) => GraphError::UserNotFound(u).into(),
    }
}

impl std::fmt::Debug for SocialCore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SocialCore")
            .field("config", &self.config)
            .field("counts", &self.counts())
            .field("next_post_id", &self.next_post_id())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{MemoryConfig, LAST_POST_ID_KEY};
    use agora_guard::GuardError;
    use agora_types::ManualClock;

    fn core_with(names: &[&str]) -> SocialCore {
        let core = SocialCore::with_clock(CoreConfig::default(), Arc::new(ManualClock::new(0)));
        for name in names {
            core.add_user(name, ["general"]).unwrap();
        }
        core
    }

    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    #[test]
    fn open_seeds_allocator_and_close_persists_it() {
        let mut provider = MemoryConfig::with_defaults().with(LAST_POST_ID_KEY, "40");
        let core = SocialCore::open(&provider).unwrap();
        core.add_user("alice", ["rust"]).unwrap();
        assert_eq!(core.create_post("alice", "t", "c").unwrap(), PostId(40));
        assert_eq!(core.create_post("alice", "t", "c").unwrap(), PostId(41));

        core.close(&mut provider).unwrap();
        assert_eq!(provider.get_preference(LAST_POST_ID_KEY).as_deref(), Some("42"));

        let reopened = SocialCore::open(&provider).unwrap();
        assert_eq!(reopened.next_post_id(), PostId(42));
    }

    #[test]
    fn open_rejects_bad_config() {
        let provider = MemoryConfig::with_defaults().with(LAST_POST_ID_KEY, "-1");
        assert!(matches!(
            SocialCore::open(&provider),
            Err(CoreError::ConfigurationInvalid { .. })
        ));
    }

    // -----------------------------------------------------------------------
    // Users and edges
    // -----------------------------------------------------------------------

    #[test]
    fn follower_and_following_views_agree() {
        let core = core_with(&["alice", "bob", "carol"]);
        assert!(core.add_follower("alice", "bob").unwrap());
        assert!(core.add_following("carol", "alice").unwrap());

        assert!(core.find_follower("alice", "bob").unwrap());
        assert!(core.find_following("bob", "alice").unwrap());
        assert_eq!(core.follower_count("alice").unwrap(), 2);
        assert_eq!(core.following_count("carol").unwrap(), 1);

        assert!(core.remove_follower("alice", "bob").unwrap());
        assert!(!core.find_following("bob", "alice").unwrap());
        assert!(!core.remove_following("bob", "alice").unwrap());
    }

    #[test]
    fn unknown_user_queries_are_typed_errors() {
        let core = core_with(&["alice"]);
        assert!(matches!(
            core.followers("ghost"),
            Err(CoreError::Graph(GraphError::UserNotFound(_)))
        ));
        assert!(matches!(
            core.user_posts("ghost"),
            Err(CoreError::Graph(GraphError::UserNotFound(_)))
        ));
        assert!(matches!(
            core.user_feed("ghost"),
            Err(CoreError::Graph(GraphError::UserNotFound(_)))
        ));
        assert!(matches!(
            core.is_post_in_feed(PostId(0), "ghost"),
            Err(CoreError::Graph(GraphError::UserNotFound(_)))
        ));
    }

    #[test]
    fn remove_user_keeps_posts() {
        let core = core_with(&["alice", "bob"]);
        core.follow("bob", "alice").unwrap();
        let id = core.create_post("alice", "t", "c").unwrap();

        core.remove_user("alice").unwrap();
        assert!(!core.contains_user("alice"));
        assert!(core.following("bob").unwrap().is_empty());
        assert!(core.get_post(id).is_some());
        assert!(core.user_feed("bob").unwrap().is_empty());
    }

    #[test]
    fn tag_discovery() {
        let core = SocialCore::new(CoreConfig::default());
        core.add_user("alice", ["Rust", "music"]).unwrap();
        core.add_user("bob", ["music"]).unwrap();
        core.add_user("carol", ["chess"]).unwrap();

        let music: Vec<_> =
            core.users_by_tag("music").into_iter().map(|u| u.username.to_string()).collect();
        assert_eq!(music, vec!["alice", "bob"]);

        let similar: Vec<_> = core
            .users_with_similar_tags(&["rust", "chess"])
            .into_iter()
            .map(|u| u.username.to_string())
            .collect();
        assert_eq!(similar, vec!["alice", "carol"]);
    }

    // -----------------------------------------------------------------------
    // Content
    // -----------------------------------------------------------------------

    #[test]
    fn rejected_create_leaves_allocator_untouched() {
        let core = core_with(&["alice"]);
        let long_title = "x".repeat(core.limits().max_title_len + 1);
        let err = core.create_post("alice", &long_title, "c").unwrap_err();
        assert!(matches!(err.as_guard(), Some(GuardError::TitleTooLong { .. })));
        assert_eq!(core.next_post_id(), PostId(0));
        assert_eq!(core.counts().posts, 0);
    }

    #[test]
    fn preflight_reports_without_mutating() {
        let core = core_with(&["alice", "bob", "carol"]);
        core.follow("bob", "alice").unwrap();
        let id = core.create_post("alice", "T", "C").unwrap();

        let report = core
            .preflight(&Interaction::RatePost { voter: "bob", post: id, value: 1 })
            .unwrap();
        let names: Vec<_> = report.stage_results.iter().map(|r| r.stage_name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "actor-registered",
                "vote-value",
                "post-exists",
                "not-own-post",
                "in-feed",
                "single-vote",
            ]
        );
        assert!(report.stage_results.iter().all(|r| r.passed));
        assert!(core.get_post(id).unwrap().votes.is_empty());

        let err = core
            .preflight(&Interaction::CommentPost { author: "carol", post: id, text: "hi" })
            .unwrap_err();
        assert!(matches!(err.as_guard(), Some(GuardError::NotInFeed { .. })));

        // The real call still goes through afterwards.
        core.rate_post("bob", id, 1).unwrap();
    }

    #[test]
    fn render_and_snapshot() {
        let core = core_with(&["alice", "bob"]);
        core.follow("bob", "alice").unwrap();
        let id = core.create_post("alice", "Hello", "World").unwrap();
        core.rate_post("bob", id, 1).unwrap();
        core.comment_post("bob", id, "nice").unwrap();

        let text = core.render_post(id, false).unwrap();
        assert!(text.contains("Author: alice"));
        assert!(text.contains("Votes: 1 upvote, 0 downvotes"));
        assert!(text.contains("- bob: nice"));
        assert!(!core.render_post(id, true).unwrap().contains("Author:"));
        assert!(core.render_post(PostId(7), false).is_none());

        let saved = core.posts_snapshot();
        let fresh = core_with(&["alice"]);
        assert_eq!(fresh.restore_posts(saved).unwrap(), 1);
        assert_eq!(fresh.get_post(id).unwrap().comments.len(), 1);
        assert_eq!(fresh.next_post_id(), PostId(1));
    }

    // -----------------------------------------------------------------------
    // Wallets
    // -----------------------------------------------------------------------

    #[test]
    fn wallets_are_lazy() {
        let core = core_with(&["alice"]);
        assert_eq!(core.counts().wallets, 0);
        let wallet = core.get_or_create_wallet("alice");
        assert_eq!(wallet.balance(), 0.0);
        assert_eq!(core.credit_wallet("alice", 1.5, "author reward").unwrap(), 1.5);
        assert_eq!(wallet.balance(), 1.5);
        assert_eq!(core.counts().wallets, 1);
        assert_eq!(core.wallet_summaries()[0].transactions.len(), 1);
    }
}
