use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use parking_lot::Mutex;
use tracing::debug;

use agora_graph::GraphStore;
use agora_types::{Clock, Comment, Post, PostId, SystemClock, Username, Vote, VoteValue};

use crate::allocator::IdAllocator;
use crate::error::{ContentError, ContentResult};
use crate::limits::ContentLimits;
use crate::render::render_post;

/// Mutable side of a post. One lock per post serializes appends.
#[derive(Debug, Default)]
struct Activity {
    deleted: bool,
    comments: Vec<Comment>,
    votes: Vec<Vote>,
}

#[derive(Debug)]
struct PostEntry {
    id: PostId,
    author: Username,
    title: String,
    body: String,
    created_at: DateTime<Utc>,
    activity: Mutex<Activity>,
}

impl PostEntry {
    fn from_post(post: Post) -> Self {
        Self {
            id: post.id,
            author: post.author,
            title: post.title,
            body: post.body,
            created_at: post.created_at,
            activity: Mutex::new(Activity {
                deleted: false,
                comments: post.comments,
                votes: post.votes,
            }),
        }
    }

    /// Copy out the current state, or `None` once deletion has started.
    fn snapshot(&self) -> Option<Post> {
        let activity = self.activity.lock();
        if activity.deleted {
            return None;
        }
        Some(Post {
            id: self.id,
            author: self.author.clone(),
            title: self.title.clone(),
            body: self.body.clone(),
            created_at: self.created_at,
            comments: activity.comments.clone(),
            votes: activity.votes.clone(),
        })
    }
}

/// Concurrent post table.
///
/// Posts live in a sharded map keyed by [`PostId`]. Reads copy a snapshot
/// out; writes to one post's comments or votes take only that post's lock.
pub struct ContentStore {
    users: Arc<dyn GraphStore>,
    posts: DashMap<PostId, Arc<PostEntry>>,
    ids: IdAllocator,
    limits: ContentLimits,
    clock: Arc<dyn Clock>,
}

impl ContentStore {
    /// Create an empty store that issues identifiers starting at `first_id`.
    pub fn new(users: Arc<dyn GraphStore>, limits: ContentLimits, first_id: u64) -> Self {
        Self {
            users,
            posts: DashMap::new(),
            ids: IdAllocator::starting_at(first_id),
            limits,
            clock: Arc::new(SystemClock),
        }
    }

    /// Replace the time source used to stamp posts, comments and votes.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn limits(&self) -> ContentLimits {
        self.limits
    }

    /// The identifier the next successful [`ContentStore::create_post`] will use.
    pub fn next_id(&self) -> PostId {
        self.ids.peek()
    }

    pub fn len(&self) -> usize {
        self.posts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }

    fn entry(&self, id: PostId) -> ContentResult<Arc<PostEntry>> {
        self.posts
            .get(&id)
            .map(|e| Arc::clone(e.value()))
            .ok_or(ContentError::PostNotFound(id))
    }

    /// Check that a post could be created, without consuming an identifier.
    pub fn validate_new_post(&self, author: &str, title: &str, body: &str) -> ContentResult<()> {
        if !self.users.contains_user(author) {
            return Err(ContentError::UserNotFound(author.into()));
        }
        let title_len = title.chars().count();
        if title_len > self.limits.max_title_len {
            return Err(ContentError::TitleTooLong {
                len: title_len,
                max: self.limits.max_title_len,
            });
        }
        let body_len = body.chars().count();
        if body_len > self.limits.max_content_len {
            return Err(ContentError::ContentTooLong {
                len: body_len,
                max: self.limits.max_content_len,
            });
        }
        Ok(())
    }

    /// Create a post and return its identifier.
    ///
    /// Validation runs before allocation, so a failed call consumes no
    /// identifier.
    pub fn create_post(&self, author: &str, title: &str, body: &str) -> ContentResult<PostId> {
        self.validate_new_post(author, title, body)?;

        let id = self.ids.next();
        let post = Post::new(id, author.into(), title, body, self.clock.now());
        self.posts.insert(id, Arc::new(PostEntry::from_post(post)));
        debug!(post = %id, %author, "post created");
        Ok(id)
    }

    pub fn get_post(&self, id: PostId) -> Option<Post> {
        self.posts.get(&id).and_then(|e| e.value().snapshot())
    }

    pub fn contains_post(&self, id: PostId) -> bool {
        self.get_post(id).is_some()
    }

    /// Author of a post, without copying its comments and votes.
    pub fn author_of(&self, id: PostId) -> Option<Username> {
        self.posts.get(&id).map(|e| e.value().author.clone())
    }

    /// All posts whose author satisfies `pred`, ordered by identifier.
    ///
    /// Matching entries are collected first and snapshotted after the map
    /// guards are released.
    pub fn posts_where<F>(&self, pred: F) -> Vec<Post>
    where
        F: Fn(&Username) -> bool,
    {
        let entries: Vec<Arc<PostEntry>> = self
            .posts
            .iter()
            .filter(|e| pred(&e.value().author))
            .map(|e| Arc::clone(e.value()))
            .collect();
        let mut posts: Vec<Post> = entries.iter().filter_map(|e| e.snapshot()).collect();
        posts.sort_by_key(|p| p.id);
        posts
    }

    /// All posts by `author`, ordered by identifier.
    pub fn posts_by(&self, author: &str) -> Vec<Post> {
        self.posts_where(|a| a.as_str() == author)
    }

    /// Delete a post on behalf of `requester`, who must be its author.
    ///
    /// Returns the post as it was at deletion time.
    pub fn delete_post(&self, id: PostId, requester: &str) -> ContentResult<Post> {
        let entry = self.entry(id)?;
        if entry.author.as_str() != requester {
            return Err(ContentError::NotAuthor {
                post: id,
                requester: requester.into(),
            });
        }

        let removed = {
            let mut activity = entry.activity.lock();
            if activity.deleted {
                return Err(ContentError::PostNotFound(id));
            }
            activity.deleted = true;
            Post {
                id,
                author: entry.author.clone(),
                title: entry.title.clone(),
                body: entry.body.clone(),
                created_at: entry.created_at,
                comments: std::mem::take(&mut activity.comments),
                votes: std::mem::take(&mut activity.votes),
            }
        };
        self.posts.remove_if(&id, |_, current| Arc::ptr_eq(current, &entry));
        debug!(post = %id, author = %requester, "post deleted");
        Ok(removed)
    }

    /// Append a vote.
    ///
    /// The only check made here is the per-post one: a voter who already
    /// voted gets `DuplicateVote`. The existence check and the append run
    /// under the same lock.
    pub fn attach_vote(&self, id: PostId, voter: &str, value: VoteValue) -> ContentResult<()> {
        let entry = self.entry(id)?;
        let mut activity = entry.activity.lock();
        if activity.deleted {
            return Err(ContentError::PostNotFound(id));
        }
        if activity.votes.iter().any(|v| v.voter.as_str() == voter) {
            return Err(ContentError::DuplicateVote {
                post: id,
                voter: voter.into(),
            });
        }
        activity.votes.push(Vote {
            voter: voter.into(),
            value,
            cast_at: self.clock.now(),
        });
        debug!(post = %id, %voter, %value, "vote recorded");
        Ok(())
    }

    /// Append a comment. Comments keep insertion order.
    pub fn attach_comment(&self, id: PostId, author: &str, text: &str) -> ContentResult<()> {
        let entry = self.entry(id)?;
        let mut activity = entry.activity.lock();
        if activity.deleted {
            return Err(ContentError::PostNotFound(id));
        }
        activity.comments.push(Comment {
            author: author.into(),
            text: text.to_owned(),
            posted_at: self.clock.now(),
        });
        debug!(post = %id, %author, "comment recorded");
        Ok(())
    }

    /// Display form of a post, or `None` if it does not exist.
    pub fn render(&self, id: PostId, hide_author: bool) -> Option<String> {
        self.get_post(id).map(|p| render_post(&p, hide_author))
    }

    /// Every post, ordered by identifier.
    pub fn snapshot(&self) -> Vec<Post> {
        self.posts_where(|_| true)
    }

    /// Load previously saved posts.
    ///
    /// The allocator is moved past the highest restored identifier so that
    /// restored identifiers are never issued again. Nothing is inserted if
    /// any identifier collides with an existing post or repeats within the
    /// batch.
    pub fn restore(&self, posts: Vec<Post>) -> ContentResult<usize> {
        let mut seen = HashSet::with_capacity(posts.len());
        for post in &posts {
            if !seen.insert(post.id) || self.posts.contains_key(&post.id) {
                return Err(ContentError::DuplicatePostId(post.id));
            }
        }
        let count = posts.len();
        if let Some(max) = posts.iter().map(|p| p.id.as_u64()).max() {
            self.ids.advance_to(max.saturating_add(1));
        }
        for post in posts {
            self.posts.insert(post.id, Arc::new(PostEntry::from_post(post)));
        }
        debug!(count, next_id = %self.ids.peek(), "posts restored");
        Ok(count)
    }
}

impl std::fmt::Debug for ContentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentStore")
            .field("post_count", &self.posts.len())
            .field("next_id", &self.ids.peek())
            .field("limits", &self.limits)
            .finish()
    }
}
