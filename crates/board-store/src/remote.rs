//! Remote document-store backend
//!
//! One document per team inside a fixed collection. Writes are top-level
//! merge-patches; reads are subscriptions that deliver the current snapshot
//! and then every mutation. Nothing is reachable without a [`Session`].

use crate::auth::{Authenticator, Session};
use crate::error::StoreError;
use crate::store::{Snapshot, Subscription, TeamStore};
use async_trait::async_trait;
use board_model::{TeamDocument, TeamId};
use dashmap::DashMap;
use parking_lot::RwLock;
use serde_json::{Map, Value};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::sync::mpsc;
use tokio::task::AbortHandle;
use uuid::Uuid;

/// Collection holding team documents
pub const DEFAULT_COLLECTION: &str = "dashboards";

const WATCH_CAPACITY: usize = 64;
const FEED_CAPACITY: usize = 16;

/// Opaque document key-value service
#[async_trait]
pub trait DocumentService: Send + Sync + fmt::Debug {
    /// Fetch a document
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Value>, StoreError>;

    /// Merge top-level keys into a document, creating it if needed.
    /// `null` values delete the key.
    async fn merge(&self, collection: &str, id: &str, patch: Value) -> Result<(), StoreError>;

    /// Delete a document
    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError>;

    /// Ids of every document in a collection
    async fn list(&self, collection: &str) -> Result<Vec<String>, StoreError>;

    /// Change feed for one document; each message is the full new state
    fn watch(&self, collection: &str, id: &str) -> broadcast::Receiver<Option<Value>>;
}

type DocKey = (String, String);

/// Document service living in this process
///
/// Stands in for a hosted document database: several stores (clients) can
/// share one instance and observe each other's writes.
#[derive(Debug, Default)]
pub struct InMemoryDocumentService {
    docs: DashMap<DocKey, Value>,
    channels: DashMap<DocKey, broadcast::Sender<Option<Value>>>,
    offline: AtomicBool,
}

impl InMemoryDocumentService {
    /// Empty service
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate losing connectivity; every call fails while offline
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    fn ensure_online(&self) -> Result<(), StoreError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(StoreError::Sync("document service unreachable".to_string()));
        }
        Ok(())
    }

    fn sender(&self, key: &DocKey) -> broadcast::Sender<Option<Value>> {
        self.channels
            .entry(key.clone())
            .or_insert_with(|| broadcast::channel(WATCH_CAPACITY).0)
            .clone()
    }

    fn publish(&self, key: &DocKey, value: Option<Value>) {
        // No receivers is fine.
        let _ = self.sender(key).send(value);
    }
}

fn doc_key(collection: &str, id: &str) -> DocKey {
    (collection.to_string(), id.to_string())
}

#[async_trait]
impl DocumentService for InMemoryDocumentService {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Value>, StoreError> {
        self.ensure_online()?;
        Ok(self
            .docs
            .get(&doc_key(collection, id))
            .map(|entry| entry.value().clone()))
    }

    async fn merge(&self, collection: &str, id: &str, patch: Value) -> Result<(), StoreError> {
        self.ensure_online()?;
        let Value::Object(patch) = patch else {
            return Err(StoreError::Sync("merge patch must be a JSON object".to_string()));
        };

        let key = doc_key(collection, id);
        let merged = {
            let mut entry = self
                .docs
                .entry(key.clone())
                .or_insert_with(|| Value::Object(Map::new()));
            if !entry.value().is_object() {
                *entry.value_mut() = Value::Object(Map::new());
            }
            if let Value::Object(target) = entry.value_mut() {
                for (field, value) in patch {
                    if value.is_null() {
                        target.remove(&field);
                    } else {
                        target.insert(field, value);
                    }
                }
            }
            entry.value().clone()
        };

        self.publish(&key, Some(merged));
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        self.ensure_online()?;
        let key = doc_key(collection, id);
        if self.docs.remove(&key).is_some() {
            self.publish(&key, None);
        }
        Ok(())
    }

    async fn list(&self, collection: &str) -> Result<Vec<String>, StoreError> {
        self.ensure_online()?;
        let mut ids: Vec<String> = self
            .docs
            .iter()
            .filter(|entry| entry.key().0 == collection)
            .map(|entry| entry.key().1.clone())
            .collect();
        ids.sort();
        Ok(ids)
    }

    fn watch(&self, collection: &str, id: &str) -> broadcast::Receiver<Option<Value>> {
        self.sender(&doc_key(collection, id)).subscribe()
    }
}

fn decode(team: &TeamId, value: Option<Value>) -> Result<Snapshot, StoreError> {
    match value {
        None => Ok(Snapshot::Absent),
        Some(value) => serde_json::from_value::<TeamDocument>(value)
            .map(Snapshot::Present)
            .map_err(|e| StoreError::Sync(format!("undecodable document for {team}: {e}"))),
    }
}

/// Team store over a [`DocumentService`], gated by authentication
#[derive(Debug)]
pub struct RemoteStore {
    service: Arc<dyn DocumentService>,
    auth: Arc<dyn Authenticator>,
    collection: String,
    session: RwLock<Option<Session>>,
    feeds: DashMap<Uuid, AbortHandle>,
}

impl RemoteStore {
    /// Store over `service`, signed out
    #[must_use]
    pub fn new(service: Arc<dyn DocumentService>, auth: Arc<dyn Authenticator>) -> Self {
        Self {
            service,
            auth,
            collection: DEFAULT_COLLECTION.to_string(),
            session: RwLock::new(None),
            feeds: DashMap::new(),
        }
    }

    /// With collection namespace
    #[must_use]
    pub fn with_collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = collection.into();
        self
    }

    /// Collection namespace
    #[inline]
    #[must_use]
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Establish an identity
    ///
    /// # Errors
    /// `StoreError::Auth` when the credentials are rejected; no session is
    /// kept in that case.
    pub async fn sign_in(&self, identifier: &str, secret: &str) -> Result<Session, StoreError> {
        let session = self.auth.authenticate(identifier, secret).await?;
        *self.session.write() = Some(session.clone());
        Ok(session)
    }

    /// Drop the session and every live subscription feed
    pub fn sign_out(&self) {
        let previous = self.session.write().take();
        for feed in self.feeds.iter() {
            feed.value().abort();
        }
        let closed = self.feeds.len();
        self.feeds.clear();
        if let Some(session) = previous {
            tracing::info!(
                identifier = %session.identifier,
                "Signed out, closed {} subscription feeds",
                closed
            );
        }
    }

    /// Current session
    #[must_use]
    pub fn session(&self) -> Option<Session> {
        self.session.read().clone()
    }

    fn require_session(&self) -> Result<(), StoreError> {
        if self.session.read().is_some() {
            Ok(())
        } else {
            Err(StoreError::Unauthenticated)
        }
    }
}

#[async_trait]
impl TeamStore for RemoteStore {
    async fn load(&self, team: &TeamId) -> Result<Option<TeamDocument>, StoreError> {
        self.require_session()?;
        let value = self.service.get(&self.collection, team.as_str()).await?;
        Ok(decode(team, value)?.into_document())
    }

    async fn save(&self, team: &TeamId, doc: &TeamDocument) -> Result<(), StoreError> {
        self.require_session()?;
        let patch = serde_json::to_value(doc).map_err(|e| StoreError::write(team, e))?;
        self.service
            .merge(&self.collection, team.as_str(), patch)
            .await
            .map_err(|e| StoreError::write(team, e))
    }

    async fn remove(&self, team: &TeamId) -> Result<(), StoreError> {
        self.require_session()?;
        self.service.delete(&self.collection, team.as_str()).await
    }

    async fn team_ids(&self) -> Result<Vec<TeamId>, StoreError> {
        self.require_session()?;
        let ids = self.service.list(&self.collection).await?;
        Ok(ids
            .into_iter()
            .filter_map(|id| TeamId::new(id).ok())
            .collect())
    }

    async fn subscribe(&self, team: &TeamId) -> Result<Option<Subscription>, StoreError> {
        self.require_session()?;
        self.feeds.retain(|_, feed| !feed.is_finished());

        // Watch before reading so no mutation between the two is missed.
        let mut changes = self.service.watch(&self.collection, team.as_str());
        let initial = decode(team, self.service.get(&self.collection, team.as_str()).await?)?;

        let (tx, rx) = mpsc::channel(FEED_CAPACITY);
        tx.try_send(initial)
            .map_err(|e| StoreError::Sync(format!("feed rejected initial snapshot: {e}")))?;

        let service = Arc::clone(&self.service);
        let collection = self.collection.clone();
        let feed_team = team.clone();
        let task = tokio::spawn(async move {
            loop {
                let value = match changes.recv().await {
                    Ok(value) => value,
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(
                            team = %feed_team,
                            "Feed lagged by {} changes, refetching",
                            skipped
                        );
                        match service.get(&collection, feed_team.as_str()).await {
                            Ok(value) => value,
                            Err(e) => {
                                tracing::error!(team = %feed_team, "Refetch failed: {}", e);
                                break;
                            }
                        }
                    }
                    Err(RecvError::Closed) => break,
                };

                match decode(&feed_team, value) {
                    Ok(snapshot) => {
                        if tx.send(snapshot).await.is_err() {
                            break;
                        }
                    }
                    Err(e) => tracing::warn!(team = %feed_team, "Skipping remote change: {}", e),
                }
            }
        });

        let feed = task.abort_handle();
        self.feeds.insert(Uuid::new_v4(), feed.clone());
        tracing::debug!(team = %team, collection = %self.collection, "Subscribed");
        Ok(Some(Subscription::new(team.clone(), rx, Some(feed))))
    }

    fn is_authenticated(&self) -> bool {
        self.session.read().is_some()
    }

    async fn dispose(&self) {
        self.sign_out();
    }
}
