//! Built-in guard stages.

pub mod content;
pub mod existence;
pub mod relation;

pub use content::{ContentLengthStage, VoteValueStage};
pub use existence::{ActorRegisteredStage, PostExistsStage};
pub use relation::{AuthorshipStage, InFeedStage, NotOwnPostStage, SingleVoteStage};
