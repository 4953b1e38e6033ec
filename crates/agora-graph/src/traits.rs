//! The [`GraphStore`] trait defining the identity and follow-graph interface.

use std::collections::BTreeMap;

use agora_types::{User, Username};

use crate::error::GraphResult;

/// Storage backend for users and follow edges.
///
/// Implementations must be thread-safe (`Send + Sync`). Edge writes are
/// atomic with respect to both index directions: once `follow(a, b)`
/// returns, `b` is in `following(a)` and `a` is in `followers(b)`, and no
/// reader can observe one side without the other.
pub trait GraphStore: Send + Sync {
    /// Register a new user.
    ///
    /// Fails with `UserAlreadyExists` if the name is taken and with
    /// `InvalidUsername` if it is blank.
    fn register(&self, user: User) -> GraphResult<()>;

    /// Look up a registered user.
    fn find_user(&self, username: &str) -> Option<User>;

    /// Returns `true` if the user is registered.
    fn contains_user(&self, username: &str) -> bool;

    /// Remove a user and every follow edge that touches them.
    ///
    /// Returns the removed user.
    fn remove_user(&self, username: &str) -> GraphResult<User>;

    /// Record that `follower` follows `followed`.
    ///
    /// Returns `Ok(true)` if the edge was created, `Ok(false)` if it already
    /// existed.
    fn follow(&self, follower: &str, followed: &str) -> GraphResult<bool>;

    /// Remove the edge `follower -> followed`.
    ///
    /// Returns `Ok(true)` if the edge existed, `Ok(false)` if it did not.
    fn unfollow(&self, follower: &str, followed: &str) -> GraphResult<bool>;

    /// Users following `username`, sorted by name.
    fn followers(&self, username: &str) -> GraphResult<Vec<Username>>;

    /// Users that `username` follows, sorted by name.
    fn following(&self, username: &str) -> GraphResult<Vec<Username>>;

    /// Returns `true` if `follower` follows `followed`.
    fn is_following(&self, follower: &str, followed: &str) -> GraphResult<bool>;

    /// Number of registered users.
    fn user_count(&self) -> usize;

    /// All registered users, sorted by name.
    fn users(&self) -> Vec<User>;

    fn follower_count(&self, username: &str) -> GraphResult<usize> {
        self.followers(username).map(|f| f.len())
    }

    fn following_count(&self, username: &str) -> GraphResult<usize> {
        self.following(username).map(|f| f.len())
    }

    /// Users who declared `tag`, sorted by name.
    fn users_by_tag(&self, tag: &str) -> Vec<User> {
        self.users().into_iter().filter(|u| u.has_tag(tag)).collect()
    }

    /// Users sharing at least one of `tags`, deduplicated and sorted by name.
    fn users_with_similar_tags(&self, tags: &[&str]) -> Vec<User> {
        let mut found: BTreeMap<Username, User> = BTreeMap::new();
        for tag in tags {
            for user in self.users_by_tag(tag) {
                found.entry(user.username.clone()).or_insert(user);
            }
        }
        found.into_values().collect()
    }
}
