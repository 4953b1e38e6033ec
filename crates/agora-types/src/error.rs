use thiserror::Error;

/// Errors produced by type conversions.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid vote value: {0} (expected +1 or -1)")]
    InvalidVoteValue(i64),
}
