use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::TypeError;
use crate::user::Username;

/// Identifier of a post.
///
/// Issued by a single monotonically increasing allocator and never reused,
/// even after the post is deleted.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PostId(pub u64);

impl PostId {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for PostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PostId({})", self.0)
    }
}

impl fmt::Display for PostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for PostId {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

/// A reaction to a post: exactly +1 or -1.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VoteValue {
    Up,
    Down,
}

impl VoteValue {
    pub fn as_i8(self) -> i8 {
        match self {
            Self::Up => 1,
            Self::Down => -1,
        }
    }
}

impl TryFrom<i64> for VoteValue {
    type Error = TypeError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Up),
            -1 => Ok(Self::Down),
            other => Err(TypeError::InvalidVoteValue(other)),
        }
    }
}

impl fmt::Display for VoteValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Up => f.write_str("+1"),
            Self::Down => f.write_str("-1"),
        }
    }
}

/// A vote attached to exactly one post.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vote {
    pub voter: Username,
    pub value: VoteValue,
    pub cast_at: DateTime<Utc>,
}

/// A comment attached to a post. Comments keep insertion order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub author: Username,
    pub text: String,
    pub posted_at: DateTime<Utc>,
}

/// Point-in-time view of a post.
///
/// Title, body, author and creation time never change after creation. The
/// comment and vote collections reflect the state at the moment the
/// snapshot was taken.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: PostId,
    pub author: Username,
    pub title: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub comments: Vec<Comment>,
    pub votes: Vec<Vote>,
}

impl Post {
    /// A post with no comments or votes yet.
    pub fn new(
        id: PostId,
        author: Username,
        title: impl Into<String>,
        body: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            author,
            title: title.into(),
            body: body.into(),
            created_at,
            comments: Vec::new(),
            votes: Vec::new(),
        }
    }

    pub fn is_authored_by(&self, username: &Username) -> bool {
        &self.author == username
    }

    /// The vote cast by `voter`, if any.
    pub fn vote_by(&self, voter: &Username) -> Option<&Vote> {
        self.votes.iter().find(|v| &v.voter == voter)
    }

    pub fn upvotes(&self) -> usize {
        self.votes.iter().filter(|v| v.value == VoteValue::Up).count()
    }

    pub fn downvotes(&self) -> usize {
        self.votes.iter().filter(|v| v.value == VoteValue::Down).count()
    }

    /// Net score: upvotes minus downvotes.
    pub fn score(&self) -> i64 {
        self.votes.iter().map(|v| i64::from(v.value.as_i8())).sum()
    }
}
