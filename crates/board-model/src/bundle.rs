//! Backup/restore file format
//!
//! ```json
//! { "exportDate": "...", "version": "1.0", "application": "...",
//!   "teams": { "PUD": { ...TeamDocument... } } }
//! ```

use crate::document::TeamDocument;
use crate::error::ModelError;
use crate::schema::SCHEMA_VERSION;
use crate::team::TeamId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Every team's document plus provenance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportBundle {
    /// When the bundle was produced
    pub export_date: DateTime<Utc>,
    /// Schema tag
    pub version: String,
    /// Producing application
    pub application: String,
    /// Documents by team
    pub teams: BTreeMap<TeamId, TeamDocument>,
}

impl ExportBundle {
    /// Package documents
    #[must_use]
    pub fn new(
        application: impl Into<String>,
        teams: BTreeMap<TeamId, TeamDocument>,
        export_date: DateTime<Utc>,
    ) -> Self {
        Self {
            export_date,
            version: SCHEMA_VERSION.to_string(),
            application: application.into(),
            teams,
        }
    }

    /// Parse an import file
    ///
    /// All-or-nothing: either every team document decodes or the whole
    /// payload is rejected. Only `teams` is mandatory; missing envelope
    /// fields get defaults (`exportDate` becomes the parse time).
    ///
    /// # Errors
    /// `ModelError::InvalidFormat` for unparseable JSON, a missing or
    /// non-object `teams` key, an invalid team id or an undecodable document.
    pub fn parse(raw: &str) -> Result<Self, ModelError> {
        let value: Value = serde_json::from_str(raw)
            .map_err(|e| ModelError::InvalidFormat(format!("unparseable content: {e}")))?;
        Self::from_value(value)
    }

    /// Validate an already-decoded JSON value
    ///
    /// # Errors
    /// Same as [`ExportBundle::parse`].
    pub fn from_value(value: Value) -> Result<Self, ModelError> {
        let Value::Object(mut root) = value else {
            return Err(ModelError::InvalidFormat(
                "expected a JSON object at top level".to_string(),
            ));
        };

        let teams_value = root
            .remove("teams")
            .ok_or_else(|| ModelError::InvalidFormat("missing `teams` key".to_string()))?;
        let Value::Object(raw_teams) = teams_value else {
            return Err(ModelError::InvalidFormat(
                "`teams` must be an object keyed by team id".to_string(),
            ));
        };

        let mut teams = BTreeMap::new();
        for (key, doc) in raw_teams {
            let team = TeamId::new(key.as_str())
                .map_err(|e| ModelError::InvalidFormat(e.to_string()))?;
            let doc: TeamDocument = serde_json::from_value(doc)
                .map_err(|e| ModelError::InvalidFormat(format!("team {key}: {e}")))?;
            teams.insert(team, doc);
        }

        let export_date = match root.remove("exportDate") {
            Some(raw) => serde_json::from_value(raw)
                .map_err(|e| ModelError::InvalidFormat(format!("exportDate: {e}")))?,
            None => Utc::now(),
        };
        let text = |root: &mut serde_json::Map<String, Value>, key: &str, fallback: &str| {
            root.remove(key)
                .and_then(|v| v.as_str().map(str::to_string))
                .unwrap_or_else(|| fallback.to_string())
        };
        let version = text(&mut root, "version", SCHEMA_VERSION);
        let application = text(&mut root, "application", "");

        Ok(Self {
            export_date,
            version,
            application,
            teams,
        })
    }

    /// Pretty-printed JSON
    ///
    /// # Errors
    /// Serialization failure.
    pub fn to_json_pretty(&self) -> Result<String, ModelError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Whether the bundle carries `team`
    #[inline]
    #[must_use]
    pub fn contains(&self, team: &TeamId) -> bool {
        self.teams.contains_key(team)
    }
}
