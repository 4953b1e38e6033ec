//! The Agora social core.
//!
//! [`SocialCore`] owns every shared table (users and follow edges, posts,
//! wallets) and exposes the synchronous call surface a transport layer
//! drives. It is built from a [`ConfigProvider`] at startup and writes the
//! identifier allocator back to it at shutdown.
//!
//! # Quick Start
//!
//! ```rust
//! use agora_core::{CoreError, GuardError, MemoryConfig, SocialCore};
//!
//! let mut config = MemoryConfig::with_defaults();
//! let core = SocialCore::open(&config).unwrap();
//!
//! core.add_user("alice", ["rust"]).unwrap();
//! core.add_user("bob", ["rust"]).unwrap();
//! core.follow("bob", "alice").unwrap();
//!
//! let id = core.create_post("alice", "T", "C").unwrap();
//! core.rate_post("bob", id, 1).unwrap();
//!
//! let err = core.rate_post("bob", id, 1).unwrap_err();
//! assert!(matches!(err, CoreError::Guard(GuardError::DuplicateVote { .. })));
//!
//! core.close(&mut config).unwrap();
//! ```

pub mod config;
pub mod error;
pub mod social;
pub mod wallet;

pub use config::{
    ConfigProvider, CoreConfig, MemoryConfig, TomlConfig, LAST_POST_ID_KEY,
    MAX_CONTENT_LENGTH_KEY, MAX_TITLE_LENGTH_KEY,
};
pub use error::{CoreError, CoreResult};
pub use social::{CoreCounts, SocialCore};
pub use wallet::{Wallet, WalletRegistry, WalletSummary, WalletTransaction};

// Re-export the vocabulary callers need.
pub use agora_content::ContentLimits;
pub use agora_guard::{GuardError, GuardReport, Interaction};
pub use agora_types::{Comment, Post, PostId, User, Username, Vote, VoteValue};
