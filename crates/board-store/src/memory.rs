//! In-memory store, nothing survives the process

use crate::error::StoreError;
use crate::store::TeamStore;
use async_trait::async_trait;
use board_model::{TeamDocument, TeamId};
use dashmap::DashMap;

/// Volatile team store
#[derive(Debug, Default)]
pub struct MemoryStore {
    docs: DashMap<TeamId, TeamDocument>,
}

impl MemoryStore {
    /// Create empty store
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored documents
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.docs.len()
    }

    /// Whether nothing is stored
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }
}

#[async_trait]
impl TeamStore for MemoryStore {
    async fn load(&self, team: &TeamId) -> Result<Option<TeamDocument>, StoreError> {
        Ok(self.docs.get(team).map(|entry| entry.value().clone()))
    }

    async fn save(&self, team: &TeamId, doc: &TeamDocument) -> Result<(), StoreError> {
        self.docs.insert(team.clone(), doc.clone());
        Ok(())
    }

    async fn remove(&self, team: &TeamId) -> Result<(), StoreError> {
        self.docs.remove(team);
        Ok(())
    }

    async fn team_ids(&self) -> Result<Vec<TeamId>, StoreError> {
        let mut ids: Vec<TeamId> = self.docs.iter().map(|e| e.key().clone()).collect();
        ids.sort();
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn save_then_load() {
        let store = MemoryStore::new();
        let team = TeamId::new("PUD").unwrap();
        assert!(store.load(&team).await.unwrap().is_none());

        let doc = TeamDocument {
            team_news: Some("hi".into()),
            ..TeamDocument::default()
        };
        store.save(&team, &doc).await.unwrap();
        assert_eq!(store.load(&team).await.unwrap(), Some(doc));
        assert_eq!(store.team_ids().await.unwrap(), vec![team.clone()]);

        store.remove(&team).await.unwrap();
        assert!(store.is_empty());
    }
}
