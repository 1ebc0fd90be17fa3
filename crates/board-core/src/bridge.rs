//! Import/Export Bridge
//!
//! Moves the full multi-team document set between a [`TeamStore`] and the
//! portable [`ExportBundle`] format.
//!
//! Imports are all-or-nothing:
//! - the payload is parsed and every document validated before any write
//! - a failed write restores every team already written to its prior
//!   contents, or removes it if it had none

use crate::error::BoardError;
use board_model::{schema, ExportBundle, TeamDocument, TeamId};
use board_store::TeamStore;
use chrono::{DateTime, Utc};
use futures::future::try_join_all;
use std::collections::BTreeMap;

/// Read every stored team and package them
///
/// # Errors
/// Any store read failure; nothing is returned partially.
pub async fn export_bundle(
    store: &dyn TeamStore,
    application: &str,
    now: DateTime<Utc>,
) -> Result<ExportBundle, BoardError> {
    let ids = store.team_ids().await?;
    let docs = try_join_all(ids.iter().map(|team| store.load(team))).await?;

    let teams: BTreeMap<TeamId, TeamDocument> = ids
        .into_iter()
        .zip(docs)
        .filter_map(|(team, doc)| doc.map(|doc| (team, doc)))
        .collect();

    tracing::info!("Exported {} team dashboards", teams.len());
    Ok(ExportBundle::new(application, teams, now))
}

/// Single-team export: the bare document as pretty JSON
///
/// # Errors
/// Serialization failure.
pub fn team_json(doc: &TeamDocument) -> Result<String, BoardError> {
    serde_json::to_string_pretty(doc)
        .map_err(|e| BoardError::Model(board_model::ModelError::Serialization(e)))
}

/// Parse and validate an import payload without touching any store
///
/// # Errors
/// `ModelError::InvalidFormat` (as `BoardError::Model`) for malformed input.
pub fn parse_import(raw: &str) -> Result<ExportBundle, BoardError> {
    let mut bundle = ExportBundle::parse(raw)?;
    for (team, doc) in &mut bundle.teams {
        report_issues(team, doc, "Imported");
        doc.enforce_invariants();
    }
    Ok(bundle)
}

/// Log every schema deviation of `doc`; returns how many were found
pub(crate) fn report_issues(team: &TeamId, doc: &TeamDocument, origin: &str) -> usize {
    let issues = schema::validate(doc);
    for issue in &issues {
        tracing::warn!(team = %team, ?issue, "{} document deviates from schema", origin);
    }
    issues.len()
}

/// Write every document of `bundle`, rolling back on failure
///
/// Returns the teams written, in bundle order.
///
/// # Errors
/// The first store failure; earlier writes are undone first.
pub async fn import_bundle(
    store: &dyn TeamStore,
    bundle: &ExportBundle,
) -> Result<Vec<TeamId>, BoardError> {
    let mut written: Vec<(TeamId, Option<TeamDocument>)> = Vec::with_capacity(bundle.teams.len());

    for (team, doc) in &bundle.teams {
        let prior = match store.load(team).await {
            Ok(prior) => prior,
            Err(e) => {
                rollback(store, written).await;
                return Err(e.into());
            }
        };
        if let Err(e) = store.save(team, doc).await {
            tracing::warn!(team = %team, "Import write failed, rolling back: {}", e);
            rollback(store, written).await;
            return Err(e.into());
        }
        written.push((team.clone(), prior));
    }

    let teams: Vec<TeamId> = written.into_iter().map(|(team, _)| team).collect();
    tracing::info!("Imported {} team dashboards", teams.len());
    Ok(teams)
}

async fn rollback(store: &dyn TeamStore, written: Vec<(TeamId, Option<TeamDocument>)>) {
    for (team, prior) in written.into_iter().rev() {
        let restored = match &prior {
            Some(doc) => store.save(&team, doc).await,
            None => store.remove(&team).await,
        };
        if let Err(e) = restored {
            tracing::error!(team = %team, "Rollback failed: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use board_model::{ErrorKind, Kpi, PerformanceLayout};
    use board_store::MemoryStore;

    fn team(id: &str) -> TeamId {
        TeamId::new(id).unwrap()
    }

    #[tokio::test]
    async fn export_reads_every_stored_team() {
        let store = MemoryStore::new();
        for id in ["PUD", "WTH"] {
            store
                .save(&team(id), &schema::default_document(&team(id)))
                .await
                .unwrap();
        }
        let bundle = export_bundle(&store, "Board", Utc::now()).await.unwrap();
        assert_eq!(bundle.teams.len(), 2);
        assert_eq!(bundle.version, "1.0");
        assert_eq!(bundle.application, "Board");
    }

    #[test]
    fn parse_rejects_missing_teams() {
        let err = parse_import(r#"{"version": "1.0"}"#).unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::InvalidImportFormat));
        let err = parse_import("not json").unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::InvalidImportFormat));
    }

    #[test]
    fn issues_are_counted_before_truncation() {
        let mut doc = schema::default_document(&team("PUD"));
        doc.performance_layout = Some(PerformanceLayout::new(1, 1).unwrap());
        doc.kpis = Some(vec![Kpi::new("a", 1.0, 1.0), Kpi::new("b", 1.0, 1.0)]);
        assert_eq!(report_issues(&team("PUD"), &doc, "Test"), 1);

        let raw = serde_json::json!({ "teams": { "PUD": doc } }).to_string();
        let bundle = parse_import(&raw).unwrap();
        let imported = &bundle.teams[&team("PUD")];
        assert_eq!(imported.kpis.as_ref().map(Vec::len), Some(1));
        assert_eq!(report_issues(&team("PUD"), imported, "Test"), 0);
    }

    #[test]
    fn single_team_export_is_bare_document() {
        let doc = schema::default_document(&team("SPV"));
        let json: serde_json::Value = serde_json::from_str(&team_json(&doc).unwrap()).unwrap();
        assert!(json.get("teams").is_none());
        assert_eq!(json["performanceLayout"]["label"], "2 × 4");
    }
}
