//! Foundation types for Agora, the in-memory social graph and content store.
//!
//! Every other Agora crate depends on `agora-types`. The types here carry no
//! storage or concurrency concerns; they are plain values that the stores
//! hand out as snapshots.
//!
//! # Key Types
//!
//! - [`Username`]: identity key of a user
//! - [`User`]: a registered user and their interest tags
//! - [`PostId`]: monotonically issued post identifier
//! - [`Post`]: immutable content plus the comments and votes attached to it
//! - [`VoteValue`]: a +1 / -1 reaction
//! - [`Clock`]: time source used to stamp posts and comments

pub mod error;
pub mod post;
pub mod temporal;
pub mod user;

pub use error::TypeError;
pub use post::{Comment, Post, PostId, Vote, VoteValue};
pub use temporal::{Clock, ManualClock, SystemClock};
pub use user::{User, Username};
