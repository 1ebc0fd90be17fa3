//! Board Core - live dashboard state
//!
//! Provides:
//! - [`DashboardController`]: the per-team state machine with debounced
//!   persistence, team switching and remote push handling
//! - [`widgets`]: the Widget Contract and the pure operations each
//!   quadrant and content page performs
//! - [`bridge`]: multi-team import/export
//! - [`images`]: image ingestion into data URIs
//! - [`BoardConfig`]: TOML configuration
//!
//! # Example
//!
//! ```rust,ignore
//! use board_core::{BoardConfig, DashboardController};
//! use board_core::widgets::ideas;
//! use board_store::MemoryStore;
//! use std::sync::Arc;
//!
//! let controller = DashboardController::new(Arc::new(MemoryStore::new()), BoardConfig::local());
//! controller.select("PUD".parse()?).await?;
//! controller.update_with(|doc| Ok(ideas::add_row(doc))).await?;
//! ```

#![warn(unreachable_pub)]

pub mod bridge;
pub mod config;
pub mod controller;
pub mod error;
pub mod images;
pub mod state;
pub mod widgets;

pub use config::{BoardConfig, PersistMode, DEFAULT_DEBOUNCE_MS};
pub use controller::{DashboardController, Notice, SelectOutcome};
pub use error::{BoardError, ImageError, WidgetError};
pub use state::{ControllerState, Phase};
pub use widgets::{Direction, WidgetContract};
