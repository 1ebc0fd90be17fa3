//! Widget Contract and widget operations
//!
//! Every widget sees the live document plus one update function. Operations
//! here are pure: they read the fields the widget owns (with schema
//! fallbacks) and return a [`TeamPatch`] naming only those fields. The
//! controller merges and persists.
//!
//! Index-based operations re-read the sequence from the document they are
//! given, so run them through [`crate::DashboardController::update_with`]
//! to evaluate against the latest state.

pub mod content;
pub mod ideas;
pub mod notes;
pub mod performance;
pub mod text;

use crate::error::BoardError;
use async_trait::async_trait;
use board_model::{TeamDocument, TeamPatch};

/// The `{dashboardData, updateDashboardData}` pair handed to widgets
#[async_trait]
pub trait WidgetContract: Send + Sync {
    /// Latest document snapshot, `None` unless a team is ready
    fn dashboard_data(&self) -> Option<TeamDocument>;

    /// Merge `patch` into the live document and schedule persistence
    ///
    /// # Errors
    /// `BoardError::NotReady` when no document is loaded.
    async fn update_dashboard_data(&self, patch: TeamPatch) -> Result<TeamDocument, BoardError>;
}

/// Direction for reordering
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Towards index 0
    Up,
    /// Towards the end
    Down,
}

/// Swap `index` with its neighbour; `false` at either end
pub(crate) fn move_item<T>(items: &mut [T], index: usize, direction: Direction) -> bool {
    let target = match direction {
        Direction::Up => index.checked_sub(1),
        Direction::Down => index.checked_add(1).filter(|t| *t < items.len()),
    };
    match target {
        Some(target) if index < items.len() => {
            items.swap(index, target);
            true
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn move_item_stops_at_ends() {
        let mut items = vec![1, 2, 3];
        assert!(!move_item(&mut items, 0, Direction::Up));
        assert!(!move_item(&mut items, 2, Direction::Down));
        assert!(move_item(&mut items, 1, Direction::Up));
        assert_eq!(items, vec![2, 1, 3]);
        assert!(!move_item(&mut items, 7, Direction::Up));
    }
}
