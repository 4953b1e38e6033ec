//! Error types for graph operations.

use agora_types::Username;
use thiserror::Error;

/// Errors that can occur during user and follow-edge operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GraphError {
    /// The user is not registered.
    #[error("user not found: {0}")]
    UserNotFound(Username),

    /// A user with this name is already registered.
    #[error("user already exists: {0}")]
    UserAlreadyExists(Username),

    /// The username is empty or whitespace only.
    #[error("invalid username: {0:?}")]
    InvalidUsername(String),

    /// A user tried to follow themselves.
    #[error("user cannot follow themselves: {0}")]
    SelfFollow(Username),
}

/// Convenience type alias for graph operations.
pub type GraphResult<T> = std::result::Result<T, GraphError>;
