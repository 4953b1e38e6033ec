//! Identity and follow-graph store for Agora.
//!
//! This crate owns the registered users and the directed follow relation
//! between them. A follow edge `a -> b` ("a follows b") is indexed in both
//! directions so that "who follows b" and "whom does a follow" are both
//! single lookups.
//!
//! # Design Rules
//!
//! 1. Both directions of an edge are written in one step by
//!    [`GraphStore::follow`] / [`GraphStore::unfollow`]; there is no way to
//!    write one side without the other.
//! 2. Each user's edge sets sit behind that user's own lock. Operations on
//!    unrelated users never contend.
//! 3. Removing a user removes every edge that touches them, on both sides.
//! 4. Queries about an unregistered user return
//!    [`GraphError::UserNotFound`], never an empty answer.
//!
//! # Modules
//!
//! - [`error`]: Error types for graph operations
//! - [`traits`]: The [`GraphStore`] trait
//! - [`memory`]: Sharded in-memory [`InMemoryGraph`]

pub mod error;
pub mod memory;
pub mod traits;

pub use error::{GraphError, GraphResult};
pub use memory::InMemoryGraph;
pub use traits::GraphStore;
