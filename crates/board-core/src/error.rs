//! Error types for the board core
//!
//! - Widget operations rejected against the current document
//! - Image files that cannot be turned into data URIs
//! - Controller calls made in the wrong state
//! - Store and schema failures bubbling up from the lower crates

use crate::state::Phase;
use board_model::{ErrorKind, ModelError};
use board_store::StoreError;

/// Main board error type
#[derive(Debug, thiserror::Error)]
pub enum BoardError {
    /// Team Data Store failure
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Schema or bundle failure
    #[error(transparent)]
    Model(#[from] ModelError),

    /// Widget operation rejected
    #[error("widget error: {0}")]
    Widget(#[from] WidgetError),

    /// Image could not be ingested
    #[error(transparent)]
    Image(#[from] ImageError),

    /// Operation needs a loaded document
    #[error("no dashboard loaded (controller is {phase})")]
    NotReady {
        /// Phase the controller was in
        phase: Phase,
    },

    /// Controller state machine refused a transition
    #[error("illegal state transition: {from} -> {to}")]
    IllegalTransition {
        /// Current phase
        from: Phase,
        /// Requested phase
        to: Phase,
    },

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),
}

impl BoardError {
    /// Map onto the user-facing error kinds, when one applies
    #[must_use]
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Store(e) => Some(e.kind()),
            Self::Model(e) => e.kind(),
            Self::Image(_) => Some(ErrorKind::ImageDecodeFailed),
            Self::Widget(_) | Self::NotReady { .. } | Self::IllegalTransition { .. } | Self::Config(_) => {
                None
            }
        }
    }
}

/// Widget operation errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WidgetError {
    /// Row or KPI index past the end
    #[error("index {index} out of range (len {len})")]
    IndexOutOfRange {
        /// Requested index
        index: usize,
        /// Sequence length
        len: usize,
    },

    /// Layout has no free cell
    #[error("layout is full ({capacity} KPIs)")]
    LayoutFull {
        /// Layout capacity
        capacity: usize,
    },

    /// The last KPI cannot be deleted
    #[error("at least one KPI must remain")]
    LastKpi,

    /// No image with that id on the page
    #[error("no image {0} on this page")]
    UnknownImage(String),

    /// Invalid layout shape
    #[error("invalid layout: {0}")]
    Layout(String),
}

/// Image ingestion errors
#[derive(Debug, thiserror::Error)]
pub enum ImageError {
    /// File is not a supported image or could not be read
    #[error("could not decode {name}: {reason}")]
    DecodeFailed {
        /// File name
        name: String,
        /// Cause
        reason: String,
    },
}

impl ImageError {
    /// Decode failure for `name`
    #[must_use]
    pub fn decode(name: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::DecodeFailed {
            name: name.into(),
            reason: reason.to_string(),
        }
    }

    /// Name of the offending file
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::DecodeFailed { name, .. } => name,
        }
    }
}
