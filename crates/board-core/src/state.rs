//! Controller state machine
//!
//! One document at a time, keyed by the selected team:
//! - `Uninitialized`: nothing selected yet, or disposed
//! - `Loading(team)`: a load or subscription is in flight
//! - `Ready(team, document)`: the live document
//! - `Error(team, reason)`: load or sync failed; no automatic retry

use crate::error::BoardError;
use board_model::{TeamDocument, TeamId};
use std::fmt;

/// Full controller state
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ControllerState {
    /// Nothing selected
    #[default]
    Uninitialized,
    /// Waiting on the store
    Loading(TeamId),
    /// Live document
    Ready {
        /// Selected team
        team: TeamId,
        /// Current document
        document: TeamDocument,
    },
    /// Load or sync failure
    Error {
        /// Selected team
        team: TeamId,
        /// Human-readable cause
        reason: String,
    },
}

impl ControllerState {
    /// Discriminant without payload
    #[must_use]
    pub fn phase(&self) -> Phase {
        match self {
            Self::Uninitialized => Phase::Uninitialized,
            Self::Loading(_) => Phase::Loading,
            Self::Ready { .. } => Phase::Ready,
            Self::Error { .. } => Phase::Error,
        }
    }

    /// Team this state concerns
    #[must_use]
    pub fn team(&self) -> Option<&TeamId> {
        match self {
            Self::Uninitialized => None,
            Self::Loading(team) | Self::Ready { team, .. } | Self::Error { team, .. } => Some(team),
        }
    }

    /// Live document, if ready
    #[must_use]
    pub fn document(&self) -> Option<&TeamDocument> {
        match self {
            Self::Ready { document, .. } => Some(document),
            _ => None,
        }
    }

    /// Whether the controller holds `team`'s live document
    #[must_use]
    pub fn is_ready_for(&self, team: &TeamId) -> bool {
        matches!(self, Self::Ready { team: current, .. } if current == team)
    }
}

/// Controller phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Nothing selected
    Uninitialized,
    /// Load in flight
    Loading,
    /// Live document held
    Ready,
    /// Failed
    Error,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Uninitialized => "uninitialized",
            Self::Loading => "loading",
            Self::Ready => "ready",
            Self::Error => "error",
        };
        f.write_str(name)
    }
}

/// Phases reachable from `from`
#[must_use]
pub fn allowed_transitions(from: Phase) -> Vec<Phase> {
    use Phase::{Error, Loading, Ready, Uninitialized};
    match from {
        Uninitialized => vec![Loading, Uninitialized],
        Loading => vec![Loading, Ready, Error, Uninitialized],
        Ready => vec![Loading, Ready, Error, Uninitialized],
        Error => vec![Loading, Uninitialized],
    }
}

/// Validates a phase transition.
///
/// # Errors
/// `BoardError::IllegalTransition` when `to` is not reachable from `from`.
pub fn validate_transition(from: Phase, to: Phase) -> Result<(), BoardError> {
    if allowed_transitions(from).contains(&to) {
        Ok(())
    } else {
        Err(BoardError::IllegalTransition { from, to })
    }
}
