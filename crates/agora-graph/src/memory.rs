//! In-memory graph store.
//!
//! [`InMemoryGraph`] keeps one node per user in a sharded `DashMap`. Each
//! node owns both of that user's edge sets behind a single mutex, so an edge
//! write locks exactly the two nodes it touches, in username order.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::{Mutex, MutexGuard};
use tracing::debug;

use agora_types::{User, Username};

use crate::error::{GraphError, GraphResult};
use crate::traits::GraphStore;

#[derive(Debug, Default)]
struct Edges {
    followers: BTreeSet<Username>,
    following: BTreeSet<Username>,
}

#[derive(Debug)]
struct UserNode {
    user: User,
    /// Cleared (under the `edges` lock) when removal starts.
    live: AtomicBool,
    edges: Mutex<Edges>,
}

impl UserNode {
    fn new(user: User) -> Self {
        Self {
            user,
            live: AtomicBool::new(true),
            edges: Mutex::new(Edges::default()),
        }
    }

    fn is_live(&self) -> bool {
        self.live.load(Ordering::Acquire)
    }
}

/// Sharded in-memory implementation of [`GraphStore`].
#[derive(Debug, Default)]
pub struct InMemoryGraph {
    users: DashMap<Username, Arc<UserNode>>,
}

impl InMemoryGraph {
    pub fn new() -> Self {
        Self::default()
    }

    fn node(&self, username: &str) -> GraphResult<Arc<UserNode>> {
        self.users
            .get(username)
            .map(|entry| Arc::clone(entry.value()))
            .filter(|node| node.is_live())
            .ok_or_else(|| GraphError::UserNotFound(username.into()))
    }

    /// Resolve both ends of an edge and lock them in username order.
    ///
    /// The guards come back in argument order. Both nodes are re-checked for
    /// liveness once locked.
    fn lock_edge<'a>(
        a: &'a UserNode,
        b: &'a UserNode,
    ) -> GraphResult<(MutexGuard<'a, Edges>, MutexGuard<'a, Edges>)> {
        let (ga, gb) = if a.user.username <= b.user.username {
            let ga = a.edges.lock();
            let gb = b.edges.lock();
            (ga, gb)
        } else {
            let gb = b.edges.lock();
            let ga = a.edges.lock();
            (ga, gb)
        };
        for node in [a, b] {
            if !node.is_live() {
                return Err(GraphError::UserNotFound(node.user.username.clone()));
            }
        }
        Ok((ga, gb))
    }

    fn edge_endpoints(
        &self,
        follower: &str,
        followed: &str,
    ) -> GraphResult<(Arc<UserNode>, Arc<UserNode>)> {
        if follower == followed {
            return Err(GraphError::SelfFollow(follower.into()));
        }
        Ok((self.node(follower)?, self.node(followed)?))
    }
}

impl GraphStore for InMemoryGraph {
    fn register(&self, user: User) -> GraphResult<()> {
        if user.username.is_blank() {
            return Err(GraphError::InvalidUsername(user.username.to_string()));
        }
        match self.users.entry(user.username.clone()) {
            Entry::Occupied(_) => Err(GraphError::UserAlreadyExists(user.username)),
            Entry::Vacant(slot) => {
                debug!(user = %user.username, tags = user.tags.len(), "registered user");
                slot.insert(Arc::new(UserNode::new(user)));
                Ok(())
            }
        }
    }

    fn find_user(&self, username: &str) -> Option<User> {
        self.node(username).ok().map(|node| node.user.clone())
    }

    fn contains_user(&self, username: &str) -> bool {
        self.node(username).is_ok()
    }

    fn remove_user(&self, username: &str) -> GraphResult<User> {
        let node = self.node(username)?;

        // Retire the node while it is still registered, so the name cannot be
        // re-registered until every peer has been cleaned.
        let (followers, following) = {
            let mut edges = node.edges.lock();
            if !node.is_live() {
                return Err(GraphError::UserNotFound(username.into()));
            }
            node.live.store(false, Ordering::Release);
            (
                std::mem::take(&mut edges.followers),
                std::mem::take(&mut edges.following),
            )
        };

        for peer in &followers {
            if let Some(peer) = self.users.get(peer).map(|e| Arc::clone(e.value())) {
                peer.edges.lock().following.remove(username);
            }
        }
        for peer in &following {
            if let Some(peer) = self.users.get(peer).map(|e| Arc::clone(e.value())) {
                peer.edges.lock().followers.remove(username);
            }
        }

        self.users
            .remove_if(username, |_, current| Arc::ptr_eq(current, &node));
        debug!(
            user = %username,
            followers = followers.len(),
            following = following.len(),
            "removed user"
        );
        Ok(node.user.clone())
    }

    fn follow(&self, follower: &str, followed: &str) -> GraphResult<bool> {
        let (a, b) = self.edge_endpoints(follower, followed)?;
        let (mut ea, mut eb) = Self::lock_edge(&a, &b)?;
        let created = ea.following.insert(b.user.username.clone());
        eb.followers.insert(a.user.username.clone());
        if created {
            debug!(%follower, %followed, "follow edge added");
        }
        Ok(created)
    }

    fn unfollow(&self, follower: &str, followed: &str) -> GraphResult<bool> {
        let (a, b) = self.edge_endpoints(follower, followed)?;
        let (mut ea, mut eb) = Self::lock_edge(&a, &b)?;
        let removed = ea.following.remove(followed);
        eb.followers.remove(follower);
        if removed {
            debug!(%follower, %followed, "follow edge removed");
        }
        Ok(removed)
    }

    fn followers(&self, username: &str) -> GraphResult<Vec<Username>> {
        let node = self.node(username)?;
        let edges = node.edges.lock();
        Ok(edges.followers.iter().cloned().collect())
    }

    fn following(&self, username: &str) -> GraphResult<Vec<Username>> {
        let node = self.node(username)?;
        let edges = node.edges.lock();
        Ok(edges.following.iter().cloned().collect())
    }

    fn is_following(&self, follower: &str, followed: &str) -> GraphResult<bool> {
        let a = self.node(follower)?;
        if !self.contains_user(followed) {
            return Err(GraphError::UserNotFound(followed.into()));
        }
        let edges = a.edges.lock();
        Ok(edges.following.contains(followed))
    }

    fn user_count(&self) -> usize {
        self.users.iter().filter(|e| e.value().is_live()).count()
    }

    fn users(&self) -> Vec<User> {
        let mut users: Vec<User> = self
            .users
            .iter()
            .filter(|e| e.value().is_live())
            .map(|e| e.value().user.clone())
            .collect();
        users.sort_by(|a, b| a.username.cmp(&b.username));
        users
    }

    fn follower_count(&self, username: &str) -> GraphResult<usize> {
        let node = self.node(username)?;
        let count = node.edges.lock().followers.len();
        Ok(count)
    }

    fn following_count(&self, username: &str) -> GraphResult<usize> {
        let node = self.node(username)?;
        let count = node.edges.lock().following.len();
        Ok(count)
    }
}
