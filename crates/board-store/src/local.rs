//! Local persistent store over a string-keyed storage area
//!
//! One entry per team: key = prefix + team id, value = the JSON-serialized
//! [`TeamDocument`]. The area abstraction covers both a quota-limited
//! in-process area and a directory of files.

use crate::error::StoreError;
use crate::store::TeamStore;
use async_trait::async_trait;
use board_model::{TeamDocument, TeamId};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

/// Key prefix for team entries
pub const DEFAULT_KEY_PREFIX: &str = "dashboardData_";

const FILE_EXTENSION: &str = "json";

/// String-keyed key-value area
#[async_trait]
pub trait StorageArea: Send + Sync + fmt::Debug {
    /// Prepare the area
    async fn init(&self) -> Result<(), StoreError> {
        Ok(())
    }

    /// Read one entry
    async fn get_item(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Write one entry
    async fn set_item(&self, key: &str, value: String) -> Result<(), StoreError>;

    /// Delete one entry
    async fn remove_item(&self, key: &str) -> Result<(), StoreError>;

    /// All keys
    async fn keys(&self) -> Result<Vec<String>, StoreError>;
}

/// In-process area with an optional byte quota
#[derive(Debug, Default)]
pub struct MemoryArea {
    items: Mutex<BTreeMap<String, String>>,
    quota: Option<usize>,
}

impl MemoryArea {
    /// Unlimited area
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Area that rejects writes once keys plus values exceed `bytes`
    #[inline]
    #[must_use]
    pub fn with_quota(bytes: usize) -> Self {
        Self {
            items: Mutex::new(BTreeMap::new()),
            quota: Some(bytes),
        }
    }

    /// Bytes currently used
    #[must_use]
    pub fn used_bytes(&self) -> usize {
        self.items
            .lock()
            .iter()
            .map(|(k, v)| k.len() + v.len())
            .sum()
    }
}

#[async_trait]
impl StorageArea for MemoryArea {
    async fn get_item(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.items.lock().get(key).cloned())
    }

    async fn set_item(&self, key: &str, value: String) -> Result<(), StoreError> {
        let mut items = self.items.lock();
        if let Some(quota) = self.quota {
            let used: usize = items
                .iter()
                .filter(|(k, _)| k.as_str() != key)
                .map(|(k, v)| k.len() + v.len())
                .sum();
            let needed = key.len() + value.len();
            let available = quota.saturating_sub(used);
            if needed > available {
                return Err(StoreError::QuotaExceeded { needed, available });
            }
        }
        items.insert(key.to_string(), value);
        Ok(())
    }

    async fn remove_item(&self, key: &str) -> Result<(), StoreError> {
        self.items.lock().remove(key);
        Ok(())
    }

    async fn keys(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.items.lock().keys().cloned().collect())
    }
}

/// Directory-backed area, one `<key>.json` file per entry
#[derive(Debug, Clone)]
pub struct FileArea {
    root: PathBuf,
}

impl FileArea {
    /// Area rooted at `root`
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root directory
    #[inline]
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StoreError> {
        let safe = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.')
            && !key.starts_with('.');
        if !safe {
            return Err(StoreError::Io(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("storage key not usable as a file name: {key:?}"),
            )));
        }
        Ok(self.root.join(format!("{key}.{FILE_EXTENSION}")))
    }
}

#[async_trait]
impl StorageArea for FileArea {
    async fn init(&self) -> Result<(), StoreError> {
        tokio::fs::create_dir_all(&self.root).await?;
        Ok(())
    }

    async fn get_item(&self, key: &str) -> Result<Option<String>, StoreError> {
        let path = self.path_for(key)?;
        match tokio::fs::read_to_string(&path).await {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn set_item(&self, key: &str, value: String) -> Result<(), StoreError> {
        let path = self.path_for(key)?;
        let tmp = path.with_extension(format!("{FILE_EXTENSION}.tmp"));
        tokio::fs::write(&tmp, value.as_bytes()).await?;
        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }

    async fn remove_item(&self, key: &str) -> Result<(), StoreError> {
        let path = self.path_for(key)?;
        match tokio::fs::remove_file(&path).await {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }

    async fn keys(&self) -> Result<Vec<String>, StoreError> {
        let mut entries = match tokio::fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut keys = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(FILE_EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                keys.push(stem.to_string());
            }
        }
        keys.sort();
        Ok(keys)
    }
}

/// Team store over a [`StorageArea`]
#[derive(Debug)]
pub struct LocalStore<A> {
    area: A,
    prefix: String,
}

impl<A: StorageArea> LocalStore<A> {
    /// Store using [`DEFAULT_KEY_PREFIX`]
    #[must_use]
    pub fn new(area: A) -> Self {
        Self::with_prefix(area, DEFAULT_KEY_PREFIX)
    }

    /// Store using a custom key prefix
    #[must_use]
    pub fn with_prefix(area: A, prefix: impl Into<String>) -> Self {
        Self {
            area,
            prefix: prefix.into(),
        }
    }

    /// Storage key of a team
    #[must_use]
    pub fn key_for(&self, team: &TeamId) -> String {
        format!("{}{}", self.prefix, team)
    }

    /// Underlying area
    #[inline]
    #[must_use]
    pub fn area(&self) -> &A {
        &self.area
    }
}

#[async_trait]
impl<A: StorageArea> TeamStore for LocalStore<A> {
    async fn init(&self) -> Result<(), StoreError> {
        self.area.init().await
    }

    async fn load(&self, team: &TeamId) -> Result<Option<TeamDocument>, StoreError> {
        let raw = self
            .area
            .get_item(&self.key_for(team))
            .await
            .map_err(|e| StoreError::read(team, e))?;

        match raw {
            None => Ok(None),
            Some(raw) => serde_json::from_str(&raw)
                .map(Some)
                .map_err(|e| StoreError::read(team, format!("corrupt entry: {e}"))),
        }
    }

    async fn save(&self, team: &TeamId, doc: &TeamDocument) -> Result<(), StoreError> {
        let raw = serde_json::to_string(doc).map_err(|e| StoreError::write(team, e))?;
        self.area
            .set_item(&self.key_for(team), raw)
            .await
            .map_err(|e| match e {
                quota @ StoreError::QuotaExceeded { .. } => quota,
                other => StoreError::write(team, other),
            })
    }

    async fn remove(&self, team: &TeamId) -> Result<(), StoreError> {
        self.area
            .remove_item(&self.key_for(team))
            .await
            .map_err(|e| StoreError::write(team, e))
    }

    async fn team_ids(&self) -> Result<Vec<TeamId>, StoreError> {
        let keys = self.area.keys().await?;
        let mut ids: Vec<TeamId> = keys
            .iter()
            .filter_map(|key| key.strip_prefix(self.prefix.as_str()))
            .filter_map(|suffix| TeamId::new(suffix).ok())
            .collect();
        ids.sort();
        Ok(ids)
    }
}
