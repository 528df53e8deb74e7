//! Error taxonomy for the multimap access layer.
//!
//! Errors raised on a partition owner travel back over the wire unchanged, so
//! every variant carries only plain data and the enum derives `Serialize`.

use serde::{Deserialize, Serialize};

pub type Result<T> = std::result::Result<T, MultiMapError>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum MultiMapError {
    /// Caller passed arguments that cannot describe a valid request.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The map was destroyed; later operations must not resurrect it.
    #[error("multimap '{0}' not found")]
    MapNotFound(String),

    /// No member owns the partition, or the request reached a member that does not own it.
    #[error("no owner for partition {0}")]
    NoPartitionOwner(u32),

    #[error("unknown member: {0}")]
    UnknownMember(String),

    /// The request could not be delivered or the response could not be read.
    #[error("transport failure: {0}")]
    Transport(String),

    /// The owner answered with something that is not a valid response.
    #[error("remote failure: {0}")]
    Remote(String),

    #[error("serialization failure: {0}")]
    Serialization(String),

    /// `unlock` called by a caller that does not hold the key's lock.
    #[error("lock on key in '{0}' is not held by caller")]
    LockNotHeld(String),

    /// `lock` called by the caller that already holds the key's lock.
    #[error("lock on key in '{0}' is already held by caller")]
    AlreadyLocked(String),

    #[error("unexpected response: expected {expected}, got {actual}")]
    UnexpectedResponse { expected: String, actual: String },
}

impl MultiMapError {
    /// The owning member could not be reached or did not answer sensibly.
    pub fn is_routing(&self) -> bool {
        matches!(
            self,
            MultiMapError::NoPartitionOwner(_)
                | MultiMapError::UnknownMember(_)
                | MultiMapError::Transport(_)
                | MultiMapError::Remote(_)
        )
    }
}

impl From<bincode::Error> for MultiMapError {
    fn from(e: bincode::Error) -> Self {
        MultiMapError::Serialization(e.to_string())
    }
}

impl From<reqwest::Error> for MultiMapError {
    fn from(e: reqwest::Error) -> Self {
        MultiMapError::Transport(e.to_string())
    }
}
