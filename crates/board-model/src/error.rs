//! Error types for the board model
//!
//! [`ErrorKind`] is the cross-crate classification every error in the
//! workspace maps onto. UIs branch on the kind, not on the concrete type.

use serde::{Deserialize, Serialize};

/// User-facing classification of failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Save failed (quota, serialization, network). Local state stays authoritative.
    PersistenceWriteFailed,
    /// Load failed. Surfaced as a blocking state-level error.
    PersistenceReadFailed,
    /// Remote subscription or document service failure.
    SyncError,
    /// No session, or sign-in rejected.
    AuthenticationFailed,
    /// Import payload rejected as a whole.
    InvalidImportFormat,
    /// One file of an upload could not be turned into an image.
    ImageDecodeFailed,
}

impl ErrorKind {
    /// Whether the failure blocks the affected team until it is reselected
    #[inline]
    #[must_use]
    pub fn is_blocking(self) -> bool {
        matches!(
            self,
            Self::PersistenceReadFailed | Self::SyncError | Self::AuthenticationFailed
        )
    }
}

/// Model-level errors
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// Team identifier failed validation
    #[error("invalid team id {id:?}: {reason}")]
    InvalidTeamId {
        /// Rejected input
        id: String,
        /// Why it was rejected
        reason: &'static str,
    },

    /// Import payload is not a valid export bundle
    #[error("invalid import format: {0}")]
    InvalidFormat(String),

    /// Layout dimensions out of range
    #[error("invalid layout {rows}x{cols}")]
    InvalidLayout {
        /// Requested rows
        rows: u32,
        /// Requested columns
        cols: u32,
    },

    /// JSON encoding failure
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ModelError {
    /// Classify this error
    #[must_use]
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            Self::InvalidFormat(_) => Some(ErrorKind::InvalidImportFormat),
            _ => None,
        }
    }
}
