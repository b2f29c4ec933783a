//! Crate-wide error type.
//!
//! Remote failures come in two kinds (`Network`, `Protocol`) which the
//! projector collapses into a single `Error` fetch state. Store failures
//! (`Duplicate`, `NotFound`) go back to whoever issued the save or delete.

use thiserror::Error;

use crate::state::data::PhotoId;

#[derive(Debug, Error)]
pub enum Error {
    /// The remote source could not be reached or the body could not be read
    #[error("network error: {0}")]
    Network(#[source] reqwest::Error),

    /// The remote source answered, but not with the expected payload
    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("photo {0} is already saved")]
    Duplicate(PhotoId),

    #[error("photo {0} is not saved")]
    NotFound(PhotoId),

    #[error("no photo is selected")]
    NoSelection,

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("invalid configuration: {0}")]
    Config(String),

    /// The projector's state owner is gone (shutdown or dropped)
    #[error("state owner has shut down")]
    Closed,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Which kind of remote failure ended a fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Network,
    Protocol,
}

impl Error {
    /// The remote failure kind, if this is a fetch error at all.
    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            Error::Network(_) => Some(FailureKind::Network),
            Error::Protocol(_) => Some(FailureKind::Protocol),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Protocol(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_kind() {
        let protocol = Error::from(serde_json::from_str::<Vec<i64>>("{").unwrap_err());
        assert_eq!(protocol.failure_kind(), Some(FailureKind::Protocol));

        assert_eq!(Error::Duplicate(3).failure_kind(), None);
        assert_eq!(Error::NotFound(3).failure_kind(), None);
    }

    #[test]
    fn test_messages_name_the_photo() {
        assert_eq!(Error::Duplicate(42).to_string(), "photo 42 is already saved");
        assert_eq!(Error::NotFound(7).to_string(), "photo 7 is not saved");
    }
}
