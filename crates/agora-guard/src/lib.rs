//! Interaction guard for Agora.
//!
//! Every post creation, vote, comment and deletion passes through the guard
//! before it reaches the content store. The guard runs an ordered pipeline
//! of precondition stages per interaction kind and reports the first
//! violation as a specific [`GuardError`].
//!
//! # Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use agora_content::{ContentLimits, ContentStore};
//! use agora_feed::FeedEngine;
//! use agora_graph::{GraphStore, InMemoryGraph};
//! use agora_guard::{GuardError, InteractionGuard};
//! use agora_types::User;
//!
//! let graph = Arc::new(InMemoryGraph::new());
//! graph.register(User::new("alice", ["rust"])).unwrap();
//! graph.register(User::new("bob", ["rust"])).unwrap();
//! graph.follow("bob", "alice").unwrap();
//!
//! let content = Arc::new(ContentStore::new(graph.clone(), ContentLimits::default(), 0));
//! let feeds = FeedEngine::new(graph.clone(), content.clone());
//! let guard = InteractionGuard::with_default_stages(graph, content, feeds);
//!
//! let id = guard.create_post("alice", "T", "C").unwrap();
//! guard.rate_post("bob", id, 1).unwrap();
//! assert!(matches!(guard.rate_post("alice", id, 1), Err(GuardError::SameAuthor { .. })));
//! ```

pub mod error;
pub mod guard;
pub mod stage;
pub mod stages;

pub use error::{GuardError, GuardResult};
pub use guard::{GuardReport, InteractionGuard};
pub use stage::{GuardContext, GuardStage, Interaction, InteractionKind, StageResult};
pub use stages::{
    ActorRegisteredStage, AuthorshipStage, ContentLengthStage, InFeedStage, NotOwnPostStage,
    PostExistsStage, SingleVoteStage, VoteValueStage,
};
