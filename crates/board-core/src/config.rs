//! Board configuration
//!
//! Read from TOML; every key is optional and falls back to the local
//! (debounced) variant. [`BoardConfig::remote`] gives the remote preset,
//! which persists each accepted patch immediately.

use crate::error::BoardError;
use board_model::TeamId;
use board_store::{Authenticator, DocumentService, LocalStore, RemoteStore, StorageArea};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Default debounce window for local persistence
pub const DEFAULT_DEBOUNCE_MS: u64 = 500;

const DEFAULT_APPLICATION: &str = "Performance Dialogue Dashboard";
const FALLBACK_TITLE: &str = "DHL Performance Dialogue";
const TITLE_SUFFIX: &str = "Performance Dialogue";
const DEFAULT_TEAMS: [&str; 7] = ["PUD", "WTH", "SPV", "Team4", "Team5", "Team6", "Team7"];

/// When accepted patches reach the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PersistMode {
    /// One write after the debounce window closes
    #[default]
    Debounced,
    /// One write per accepted patch
    Immediate,
}

/// Board configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoardConfig {
    /// `application` field of export bundles
    pub application: String,
    /// Debounce window in milliseconds
    pub debounce_ms: u64,
    /// Persistence timing
    pub persist: PersistMode,
    /// Local storage key prefix
    pub storage_prefix: String,
    /// Remote collection namespace
    pub collection: String,
    /// Team selector entries
    pub teams: Vec<TeamId>,
    /// Team selected on start; the first selector entry when unset
    pub default_team: Option<TeamId>,
}

impl BoardConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Local-storage variant: debounced writes
    #[must_use]
    pub fn local() -> Self {
        Self::default()
    }

    /// Remote variant: immediate writes
    #[must_use]
    pub fn remote() -> Self {
        Self::default().with_persist(PersistMode::Immediate)
    }

    /// With debounce window
    #[inline]
    #[must_use]
    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce_ms = u64::try_from(debounce.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// With persistence timing
    #[inline]
    #[must_use]
    pub fn with_persist(mut self, persist: PersistMode) -> Self {
        self.persist = persist;
        self
    }

    /// With export `application` name
    #[must_use]
    pub fn with_application(mut self, application: impl Into<String>) -> Self {
        self.application = application.into();
        self
    }

    /// With team selector entries
    #[must_use]
    pub fn with_teams(mut self, teams: Vec<TeamId>) -> Self {
        self.teams = teams;
        self
    }

    /// With start team
    #[must_use]
    pub fn with_default_team(mut self, team: TeamId) -> Self {
        self.default_team = Some(team);
        self
    }

    /// Team to select on start
    #[must_use]
    pub fn start_team(&self) -> Option<&TeamId> {
        self.default_team.as_ref().or_else(|| self.teams.first())
    }

    /// Debounce window
    #[inline]
    #[must_use]
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// Parse TOML
    ///
    /// # Errors
    /// `BoardError::Config` on malformed TOML or invalid team ids.
    pub fn from_toml_str(raw: &str) -> Result<Self, BoardError> {
        toml::from_str(raw).map_err(|e| BoardError::Config(e.to_string()))
    }

    /// Read a TOML file
    ///
    /// # Errors
    /// `BoardError::Config` if the file is unreadable or malformed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, BoardError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| BoardError::Config(format!("{}: {e}", path.display())))?;
        let config = Self::from_toml_str(&raw)?;
        tracing::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Render as TOML
    ///
    /// # Errors
    /// `BoardError::Config` if serialization fails.
    pub fn to_toml_string(&self) -> Result<String, BoardError> {
        toml::to_string_pretty(self).map_err(|e| BoardError::Config(e.to_string()))
    }

    /// Local store over `area`, keyed with the configured prefix
    #[must_use]
    pub fn local_store<A: StorageArea>(&self, area: A) -> LocalStore<A> {
        LocalStore::with_prefix(area, self.storage_prefix.clone())
    }

    /// Remote store over `service`, in the configured collection
    #[must_use]
    pub fn remote_store(
        &self,
        service: Arc<dyn DocumentService>,
        auth: Arc<dyn Authenticator>,
    ) -> RemoteStore {
        RemoteStore::new(service, auth).with_collection(self.collection.clone())
    }

    /// Dashboard header for a team
    ///
    /// `TeamN` ids read as `Team N`; unknown teams get the generic title.
    #[must_use]
    pub fn header_title(&self, team: &TeamId) -> String {
        if !self.teams.contains(team) {
            return FALLBACK_TITLE.to_string();
        }
        match team.as_str().strip_prefix("Team") {
            Some(n) if !n.is_empty() && n.chars().all(|c| c.is_ascii_digit()) => {
                format!("Team {n} {TITLE_SUFFIX}")
            }
            _ => format!("{team} {TITLE_SUFFIX}"),
        }
    }
}

fn default_teams() -> Vec<TeamId> {
    DEFAULT_TEAMS
        .iter()
        .filter_map(|id| TeamId::new(*id).ok())
        .collect()
}

impl Default for BoardConfig {
    fn default() -> Self {
        let teams = default_teams();
        let default_team = teams.first().cloned();
        Self {
            application: DEFAULT_APPLICATION.to_string(),
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            persist: PersistMode::Debounced,
            storage_prefix: board_store::DEFAULT_KEY_PREFIX.to_string(),
            collection: board_store::DEFAULT_COLLECTION.to_string(),
            teams,
            default_team,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn team(id: &str) -> TeamId {
        TeamId::new(id).unwrap()
    }

    #[test]
    fn defaults_are_local_variant() {
        let config = BoardConfig::new();
        assert_eq!(config.debounce(), Duration::from_millis(500));
        assert_eq!(config.persist, PersistMode::Debounced);
        assert_eq!(config.storage_prefix, "dashboardData_");
        assert_eq!(config.start_team(), Some(&team("PUD")));
        assert_eq!(config.teams.len(), 7);
        assert_eq!(BoardConfig::remote().persist, PersistMode::Immediate);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = BoardConfig::from_toml_str(
            r#"
            debounce_ms = 250
            persist = "immediate"
            teams = ["PUD", "WTH"]
            "#,
        )
        .unwrap();
        assert_eq!(config.debounce_ms, 250);
        assert_eq!(config.persist, PersistMode::Immediate);
        assert_eq!(config.teams, vec![team("PUD"), team("WTH")]);
        assert_eq!(config.collection, "dashboards");
        assert_eq!(config.start_team(), Some(&team("PUD")));
    }

    #[test]
    fn bad_team_id_is_config_error() {
        let err = BoardConfig::from_toml_str(r#"default_team = "../etc""#).unwrap_err();
        assert!(matches!(err, BoardError::Config(_)));
    }

    #[test]
    fn stores_follow_configured_namespaces() {
        use board_store::{InMemoryDocumentService, MemoryArea, PasswordAuthenticator};

        let config = BoardConfig::from_toml_str(
            r#"
            storage_prefix = "board_"
            collection = "ops"
            "#,
        )
        .unwrap();
        assert_eq!(config.local_store(MemoryArea::new()).key_for(&team("PUD")), "board_PUD");

        let remote = config.remote_store(
            Arc::new(InMemoryDocumentService::new()),
            Arc::new(PasswordAuthenticator::with_iterations(1_000)),
        );
        assert_eq!(remote.collection(), "ops");
    }

    #[test]
    fn header_titles() {
        let config = BoardConfig::new();
        assert_eq!(config.header_title(&team("PUD")), "PUD Performance Dialogue");
        assert_eq!(config.header_title(&team("Team4")), "Team 4 Performance Dialogue");
        assert_eq!(config.header_title(&team("Elsewhere")), "DHL Performance Dialogue");
    }

    #[test]
    fn toml_round_trip() {
        let config = BoardConfig::remote().with_application("Ops Board");
        let raw = config.to_toml_string().unwrap();
        assert_eq!(BoardConfig::from_toml_str(&raw).unwrap(), config);
    }
}
