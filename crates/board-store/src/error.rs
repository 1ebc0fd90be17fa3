//! Store error types

use board_model::{ErrorKind, TeamId};

/// Authentication failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    /// Identifier or secret missing
    #[error("identifier and secret are required")]
    MissingCredentials,

    /// Unknown identifier or wrong secret
    #[error("invalid identifier or secret")]
    InvalidCredentials,

    /// Identifier already registered
    #[error("identifier already registered: {0}")]
    AlreadyRegistered(String),

    /// Credential check could not run
    #[error("authentication backend failure: {0}")]
    Backend(String),
}

/// Team Data Store errors
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Reading a team document failed
    #[error("failed to read {team}: {reason}")]
    ReadFailed {
        /// Team being read
        team: TeamId,
        /// Cause
        reason: String,
    },

    /// Writing a team document failed
    #[error("failed to write {team}: {reason}")]
    WriteFailed {
        /// Team being written
        team: TeamId,
        /// Cause
        reason: String,
    },

    /// Storage area is full
    #[error("storage quota exceeded: {needed} bytes needed, {available} available")]
    QuotaExceeded {
        /// Bytes the write required
        needed: usize,
        /// Bytes left
        available: usize,
    },

    /// Remote document service failure
    #[error("sync error: {0}")]
    Sync(String),

    /// Operation attempted without a session
    #[error("not signed in")]
    Unauthenticated,

    /// Sign-in failed
    #[error("authentication failed: {0}")]
    Auth(#[from] AuthError),

    /// JSON encode/decode failure
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Filesystem failure
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    /// Wrap any read-path error with team context
    #[must_use]
    pub fn read(team: &TeamId, cause: impl std::fmt::Display) -> Self {
        Self::ReadFailed {
            team: team.clone(),
            reason: cause.to_string(),
        }
    }

    /// Wrap any write-path error with team context
    #[must_use]
    pub fn write(team: &TeamId, cause: impl std::fmt::Display) -> Self {
        Self::WriteFailed {
            team: team.clone(),
            reason: cause.to_string(),
        }
    }

    /// Classify this error
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ReadFailed { .. } => ErrorKind::PersistenceReadFailed,
            Self::WriteFailed { .. } | Self::QuotaExceeded { .. } | Self::Serialization(_) => {
                ErrorKind::PersistenceWriteFailed
            }
            Self::Io(_) => ErrorKind::PersistenceReadFailed,
            Self::Sync(_) => ErrorKind::SyncError,
            Self::Unauthenticated | Self::Auth(_) => ErrorKind::AuthenticationFailed,
        }
    }
}
