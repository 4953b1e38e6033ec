use std::cmp::Ordering;
use std::collections::HashSet;
use std::sync::Arc;

use tracing::debug;

use agora_content::ContentStore;
use agora_graph::{GraphError, GraphStore};
use agora_types::{Post, PostId, Username};

use crate::error::{FeedError, FeedResult};

/// Feed ordering: newest first, ties broken by ascending identifier.
pub fn feed_order(a: &Post, b: &Post) -> Ordering {
    b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id))
}

/// Computes feeds from the follow graph and the post table.
#[derive(Clone)]
pub struct FeedEngine {
    graph: Arc<dyn GraphStore>,
    content: Arc<ContentStore>,
}

impl FeedEngine {
    pub fn new(graph: Arc<dyn GraphStore>, content: Arc<ContentStore>) -> Self {
        Self { graph, content }
    }

    fn followed_by(&self, username: &str) -> FeedResult<HashSet<Username>> {
        self.graph
            .following(username)
            .map(|list| list.into_iter().collect())
            .map_err(|e| match e {
                GraphError::UserNotFound(u) => FeedError::UnknownUser(u),
                _ => FeedError::UnknownUser(username.into()),
            })
    }

    /// The feed of `username`, most recent post first.
    ///
    /// A user who follows nobody gets an empty feed. An unregistered user
    /// gets [`FeedError::UnknownUser`].
    pub fn compute_feed(&self, username: &str) -> FeedResult<Vec<Post>> {
        let followed = self.followed_by(username)?;
        if followed.is_empty() {
            return Ok(Vec::new());
        }
        let mut feed = self.content.posts_where(|author| followed.contains(author));
        feed.sort_by(feed_order);
        debug!(user = %username, followed = followed.len(), posts = feed.len(), "feed computed");
        Ok(feed)
    }

    /// Returns `true` if the post exists and appears in the feed of
    /// `username`.
    ///
    /// A feed is exactly the posts of followed authors, so membership is
    /// decided from the post's author without building the whole feed.
    pub fn is_post_in_feed(&self, post_id: PostId, username: &str) -> FeedResult<bool> {
        let followed = self.followed_by(username)?;
        let Some(author) = self.content.author_of(post_id) else {
            return Ok(false);
        };
        Ok(followed.contains(&author) && self.content.contains_post(post_id))
    }
}

impl std::fmt::Debug for FeedEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeedEngine")
            .field("users", &self.graph.user_count())
            .field("posts", &self.content.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agora_content::ContentLimits;
    use agora_graph::InMemoryGraph;
    use agora_types::{ManualClock, User};

    struct Fixture {
        graph: Arc<InMemoryGraph>,
        content: Arc<ContentStore>,
        clock: Arc<ManualClock>,
        feeds: FeedEngine,
    }

    fn fixture(names: &[&str]) -> Fixture {
        let graph = Arc::new(InMemoryGraph::new());
        for name in names {
            graph.register(User::new(*name, ["general"])).unwrap();
        }
        let clock = Arc::new(ManualClock::new(0));
        let content = Arc::new(
            ContentStore::new(graph.clone(), ContentLimits::default(), 0)
                .with_clock(clock.clone()),
        );
        let feeds = FeedEngine::new(graph.clone(), content.clone());
        Fixture { graph, content, clock, feeds }
    }

    fn post_at(f: &Fixture, author: &str, millis: i64) -> PostId {
        f.clock.set(millis);
        f.content.create_post(author, "t", "c").unwrap()
    }

    // -----------------------------------------------------------------------
    // compute_feed
    // -----------------------------------------------------------------------

    #[test]
    fn feed_is_sorted_newest_first() {
        let f = fixture(&["alice", "bob"]);
        f.graph.follow("bob", "alice").unwrap();
        let p1 = post_at(&f, "alice", 1);
        let p2 = post_at(&f, "alice", 3);
        let p3 = post_at(&f, "alice", 2);

        let ids: Vec<_> = f.feeds.compute_feed("bob").unwrap().into_iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![p2, p3, p1]);
    }

    #[test]
    fn ties_broken_by_ascending_id() {
        let f = fixture(&["alice", "carol", "bob"]);
        f.graph.follow("bob", "alice").unwrap();
        f.graph.follow("bob", "carol").unwrap();
        let a = post_at(&f, "carol", 5);
        let b = post_at(&f, "alice", 5);
        let c = post_at(&f, "alice", 9);

        let ids: Vec<_> = f.feeds.compute_feed("bob").unwrap().into_iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![c, a, b]);
    }

    #[test]
    fn feed_only_contains_followed_authors() {
        let f = fixture(&["alice", "bob", "carol"]);
        f.graph.follow("bob", "alice").unwrap();
        let mine = post_at(&f, "bob", 1);
        let followed = post_at(&f, "alice", 2);
        let stranger = post_at(&f, "carol", 3);

        let ids: Vec<_> = f.feeds.compute_feed("bob").unwrap().into_iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![followed]);
        assert!(!ids.contains(&mine));
        assert!(!ids.contains(&stranger));
    }

    #[test]
    fn empty_feed_when_following_nobody() {
        let f = fixture(&["alice", "bob"]);
        post_at(&f, "alice", 1);
        assert!(f.feeds.compute_feed("bob").unwrap().is_empty());
    }

    #[test]
    fn unknown_user_is_an_error() {
        let f = fixture(&["alice"]);
        assert_eq!(
            f.feeds.compute_feed("ghost").unwrap_err(),
            FeedError::UnknownUser("ghost".into())
        );
        assert_eq!(
            f.feeds.is_post_in_feed(PostId(0), "ghost").unwrap_err(),
            FeedError::UnknownUser("ghost".into())
        );
    }

    #[test]
    fn feed_tracks_graph_and_deletions() {
        let f = fixture(&["alice", "bob"]);
        let id = post_at(&f, "alice", 1);
        assert!(f.feeds.compute_feed("bob").unwrap().is_empty());

        f.graph.follow("bob", "alice").unwrap();
        assert_eq!(f.feeds.compute_feed("bob").unwrap().len(), 1);

        f.content.delete_post(id, "alice").unwrap();
        assert!(f.feeds.compute_feed("bob").unwrap().is_empty());

        let id = post_at(&f, "alice", 2);
        assert_eq!(f.feeds.compute_feed("bob").unwrap()[0].id, id);
        f.graph.unfollow("bob", "alice").unwrap();
        assert!(f.feeds.compute_feed("bob").unwrap().is_empty());
    }

    // -----------------------------------------------------------------------
    // is_post_in_feed
    // -----------------------------------------------------------------------

    #[test]
    fn membership_matches_computed_feed() {
        let f = fixture(&["alice", "bob", "carol"]);
        f.graph.follow("bob", "alice").unwrap();
        f.graph.follow("carol", "bob").unwrap();
        let mut ids = Vec::new();
        for (i, author) in ["alice", "bob", "carol", "alice"].iter().enumerate() {
            ids.push(post_at(&f, author, i as i64));
        }
        f.content.delete_post(ids[3], "alice").unwrap();
        ids.push(PostId(99));

        for user in ["alice", "bob", "carol"] {
            let feed: Vec<PostId> =
                f.feeds.compute_feed(user).unwrap().into_iter().map(|p| p.id).collect();
            for id in &ids {
                assert_eq!(
                    f.feeds.is_post_in_feed(*id, user).unwrap(),
                    feed.contains(id),
                    "user {user}, post {id}"
                );
            }
        }
    }

    mod props {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn feed_is_always_recency_ordered(times in proptest::collection::vec(0i64..50, 1..30)) {
                let f = fixture(&["alice", "carol", "bob"]);
                f.graph.follow("bob", "alice").unwrap();
                f.graph.follow("bob", "carol").unwrap();
                for (i, t) in times.iter().enumerate() {
                    let author = if i % 2 == 0 { "alice" } else { "carol" };
                    post_at(&f, author, *t);
                }
                let feed = f.feeds.compute_feed("bob").unwrap();
                prop_assert_eq!(feed.len(), times.len());
                for pair in feed.windows(2) {
                    prop_assert_ne!(feed_order(&pair[0], &pair[1]), Ordering::Greater);
                    prop_assert!(pair[0].created_at >= pair[1].created_at);
                }
            }
        }
    }
}
