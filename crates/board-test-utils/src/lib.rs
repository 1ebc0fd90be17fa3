//! Testing utilities for the board workspace
//!
//! Shared fixtures and an instrumented store.

#![allow(missing_docs)]

use async_trait::async_trait;
use board_model::{schema, TeamDocument, TeamId};
use board_store::{MemoryStore, StoreError, TeamStore};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::time::Duration;

pub const PNG_BYTES: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR\0\0\0\x01\0\0\0\x01";

pub fn team(id: &str) -> TeamId {
    TeamId::new(id).unwrap()
}

pub fn default_doc(id: &str) -> TeamDocument {
    schema::default_document(&team(id))
}

/// Memory store that records every save and can be told to stall or fail
#[derive(Debug, Default)]
pub struct RecordingStore {
    inner: MemoryStore,
    saves: Mutex<Vec<(TeamId, TeamDocument)>>,
    loads: Mutex<Vec<TeamId>>,
    load_delays: Mutex<HashMap<TeamId, Duration>>,
    failing_loads: Mutex<HashSet<TeamId>>,
    failing_saves: Mutex<HashSet<TeamId>>,
    fail_every_save: Mutex<bool>,
}

impl RecordingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a document without recording it as a save
    pub async fn seed(&self, team: &TeamId, doc: TeamDocument) {
        self.inner.save(team, &doc).await.unwrap();
    }

    pub fn saves(&self) -> Vec<(TeamId, TeamDocument)> {
        self.saves.lock().clone()
    }

    pub fn save_count(&self) -> usize {
        self.saves.lock().len()
    }

    pub fn saves_for(&self, team: &TeamId) -> Vec<TeamDocument> {
        self.saves
            .lock()
            .iter()
            .filter(|(t, _)| t == team)
            .map(|(_, doc)| doc.clone())
            .collect()
    }

    pub fn loads(&self) -> Vec<TeamId> {
        self.loads.lock().clone()
    }

    pub fn set_load_delay(&self, team: &TeamId, delay: Duration) {
        self.load_delays.lock().insert(team.clone(), delay);
    }

    pub fn fail_loads_for(&self, team: &TeamId) {
        self.failing_loads.lock().insert(team.clone());
    }

    pub fn fail_saves_for(&self, team: &TeamId) {
        self.failing_saves.lock().insert(team.clone());
    }

    pub fn fail_every_save(&self, fail: bool) {
        *self.fail_every_save.lock() = fail;
    }

    pub fn clear_failures(&self) {
        self.failing_loads.lock().clear();
        self.failing_saves.lock().clear();
        *self.fail_every_save.lock() = false;
    }

    /// Stored document, bypassing delays and failures
    pub async fn stored(&self, team: &TeamId) -> Option<TeamDocument> {
        self.inner.load(team).await.unwrap()
    }
}

#[async_trait]
impl TeamStore for RecordingStore {
    async fn load(&self, team: &TeamId) -> Result<Option<TeamDocument>, StoreError> {
        self.loads.lock().push(team.clone());
        let delay = self.load_delays.lock().get(team).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing_loads.lock().contains(team) {
            return Err(StoreError::read(team, "injected read failure"));
        }
        self.inner.load(team).await
    }

    async fn save(&self, team: &TeamId, doc: &TeamDocument) -> Result<(), StoreError> {
        let fail = *self.fail_every_save.lock() || self.failing_saves.lock().contains(team);
        if fail {
            return Err(StoreError::QuotaExceeded {
                needed: 4096,
                available: 0,
            });
        }
        self.saves.lock().push((team.clone(), doc.clone()));
        self.inner.save(team, doc).await
    }

    async fn remove(&self, team: &TeamId) -> Result<(), StoreError> {
        self.inner.remove(team).await
    }

    async fn team_ids(&self) -> Result<Vec<TeamId>, StoreError> {
        self.inner.team_ids().await
    }
}
