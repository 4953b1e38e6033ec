//! Feed engine for Agora.
//!
//! A user's feed is every post authored by someone they follow, most recent
//! first. Feeds are recomputed from the current follow graph and post table
//! on every call; nothing is cached, so a feed never shows a deleted post or
//! misses a fresh follow.

pub mod engine;
pub mod error;

pub use engine::{feed_order, FeedEngine};
pub use error::{FeedError, FeedResult};
