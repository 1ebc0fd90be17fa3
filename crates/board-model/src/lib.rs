//! Board Model - per-team dashboard documents
//!
//! Defines:
//! - [`TeamDocument`], the unit of persistence, and its parts
//! - [`TeamPatch`], the shallow partial update widgets send
//! - The shared default/validation layer ([`schema`]) used by both the
//!   Default Data Factory and widget fallbacks
//! - [`ExportBundle`], the backup/restore format
//!
//! # Example
//!
//! ```rust
//! use board_model::{schema, TeamId, TeamPatch};
//!
//! let team = TeamId::new("PUD").unwrap();
//! let mut doc = schema::default_document(&team);
//! doc.apply(TeamPatch::new().team_news("Shift change at 14:00"));
//! assert_eq!(doc.team_news(), "Shift change at 14:00");
//! ```

#![warn(unreachable_pub)]

pub mod bundle;
pub mod document;
pub mod error;
pub mod layout;
pub mod patch;
pub mod schema;
pub mod team;

pub use bundle::ExportBundle;
pub use document::{
    ActionStatus, AdditionalContent, ContentPage, IdeaAction, Kpi, KpiPeriod, TeamDocument,
    Topic, UploadedImage, MAX_IMAGES,
};
pub use error::{ErrorKind, ModelError};
pub use layout::PerformanceLayout;
pub use patch::TeamPatch;
pub use team::TeamId;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
