//! The Team Data Store contract
//!
//! Abstracts where team state lives. Pull-based backends implement
//! `load`/`save`; push-based backends additionally return a
//! [`Subscription`] from `subscribe`, which delivers the initial snapshot
//! followed by every remote mutation.

use crate::error::StoreError;
use async_trait::async_trait;
use board_model::{TeamDocument, TeamId};
use std::fmt;
use tokio::sync::mpsc;
use tokio::task::AbortHandle;

/// One observation of a team's document
#[derive(Debug, Clone, PartialEq)]
pub enum Snapshot {
    /// Document exists
    Present(TeamDocument),
    /// No document stored for the team
    Absent,
}

impl Snapshot {
    /// Convert into an optional document
    #[inline]
    #[must_use]
    pub fn into_document(self) -> Option<TeamDocument> {
        match self {
            Self::Present(doc) => Some(doc),
            Self::Absent => None,
        }
    }
}

impl From<Option<TeamDocument>> for Snapshot {
    fn from(value: Option<TeamDocument>) -> Self {
        value.map_or(Self::Absent, Self::Present)
    }
}

/// Live feed of snapshots for one team
///
/// Dropping the subscription is the unsubscribe handle: the feeding task is
/// aborted and no further snapshots are produced.
#[derive(Debug)]
pub struct Subscription {
    team: TeamId,
    rx: mpsc::Receiver<Snapshot>,
    feed: Option<AbortHandle>,
}

impl Subscription {
    /// Wrap a snapshot channel. `feed` is aborted on drop.
    #[must_use]
    pub fn new(team: TeamId, rx: mpsc::Receiver<Snapshot>, feed: Option<AbortHandle>) -> Self {
        Self { team, rx, feed }
    }

    /// Team this feed observes
    #[inline]
    #[must_use]
    pub fn team(&self) -> &TeamId {
        &self.team
    }

    /// Next snapshot; `None` once the feed is closed
    pub async fn next(&mut self) -> Option<Snapshot> {
        self.rx.recv().await
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(feed) = self.feed.take() {
            feed.abort();
        }
    }
}

/// Where team documents live
#[async_trait]
pub trait TeamStore: Send + Sync + fmt::Debug {
    /// Prepare the backend (create directories, open connections)
    async fn init(&self) -> Result<(), StoreError> {
        Ok(())
    }

    /// Read a team's document, `None` when absent
    async fn load(&self, team: &TeamId) -> Result<Option<TeamDocument>, StoreError>;

    /// Persist a team's full document
    async fn save(&self, team: &TeamId, doc: &TeamDocument) -> Result<(), StoreError>;

    /// Delete a team's document. Absent documents are not an error.
    async fn remove(&self, team: &TeamId) -> Result<(), StoreError>;

    /// Every team with a stored document, sorted
    async fn team_ids(&self) -> Result<Vec<TeamId>, StoreError>;

    /// Push-based feed for a team, `None` for pull-only backends
    async fn subscribe(&self, _team: &TeamId) -> Result<Option<Subscription>, StoreError> {
        Ok(None)
    }

    /// Whether calls are currently permitted
    fn is_authenticated(&self) -> bool {
        true
    }

    /// Release resources and tear down live subscriptions
    async fn dispose(&self) {}
}
