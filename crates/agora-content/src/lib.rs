//! Content store for Agora.
//!
//! Posts are created on an author's behalf, carry immutable title/body
//! content, and accumulate comments and votes over their lifetime. Every
//! post gets a fresh identifier from a single atomic allocator; identifiers
//! are never reused, even after deletion.
//!
//! The store validates authorship (the author must be registered) and
//! content lengths. It does *not* decide who may vote or comment; those
//! rules belong to the interaction guard. What it does guarantee is that
//! per-post appends are serialized, so the "one vote per voter" check and
//! the insert happen as one step.

pub mod allocator;
pub mod error;
pub mod limits;
pub mod render;
pub mod store;

pub use allocator::IdAllocator;
pub use error::{ContentError, ContentResult};
pub use limits::ContentLimits;
pub use render::render_post;
pub use store::ContentStore;
