//! Shared defaults and the Default Data Factory
//!
//! Widgets fall back to these values when a field is absent and the factory
//! builds new documents from them, so the two can never drift apart.

use crate::document::{
    ActionStatus, AdditionalContent, ContentPage, IdeaAction, Kpi, TeamDocument,
};
use crate::layout::PerformanceLayout;
use crate::team::TeamId;
use chrono::{DateTime, Utc};

/// Current schema tag
pub const SCHEMA_VERSION: &str = "1.0";

/// Safety and news panels start visible
pub const DEFAULT_SHOW_PANEL: bool = true;

/// Seed KPIs
#[must_use]
pub fn default_kpis() -> Vec<Kpi> {
    vec![
        Kpi::new("On-Time Delivery", 98.0, 95.0),
        Kpi::new("Error Rate", 1.2, 2.0).lower_is_better(),
    ]
}

/// Seed idea/action row
#[must_use]
pub fn default_ideas_actions() -> Vec<IdeaAction> {
    vec![IdeaAction {
        idea: "Improve process".to_string(),
        todo: "Review SOP".to_string(),
        who: "Ana".to_string(),
        when: "10.07".to_string(),
        status: ActionStatus::InProgress,
    }]
}

/// Canonical empty-state document for a team, stamped with `now`
///
/// Deterministic in shape: only the timestamps depend on `now`.
#[must_use]
pub fn default_document_at(team: &TeamId, now: DateTime<Utc>) -> TeamDocument {
    tracing::debug!(team = %team, "Building default dashboard document");
    let mut doc = TeamDocument {
        created_at: Some(now),
        last_updated: Some(now),
        ..TeamDocument::default()
    };
    fill_missing(&mut doc);
    doc
}

/// Canonical empty-state document stamped with the current time
#[must_use]
pub fn default_document(team: &TeamId) -> TeamDocument {
    default_document_at(team, Utc::now())
}

/// Materialize every absent field with its default
///
/// Present fields and timestamps are left untouched.
pub fn fill_missing(doc: &mut TeamDocument) {
    doc.kpis.get_or_insert_with(default_kpis);
    doc.performance_layout
        .get_or_insert_with(PerformanceLayout::default);
    doc.show_safety.get_or_insert(DEFAULT_SHOW_PANEL);
    doc.show_news.get_or_insert(DEFAULT_SHOW_PANEL);
    doc.safety_text.get_or_insert_with(String::new);
    doc.news_text.get_or_insert_with(String::new);
    doc.team_news.get_or_insert_with(String::new);
    doc.ideas_actions.get_or_insert_with(default_ideas_actions);
    doc.additional_content1
        .get_or_insert_with(AdditionalContent::default);
    doc.additional_content2
        .get_or_insert_with(AdditionalContent::default);
    doc.additional_content3
        .get_or_insert_with(AdditionalContent::default);
    doc.version
        .get_or_insert_with(|| SCHEMA_VERSION.to_string());
    doc.enforce_invariants();
}

/// A field that deviates from the schema
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaIssue {
    /// More KPIs than the layout holds
    KpiOverflow {
        /// KPIs stored
        count: usize,
        /// Layout capacity
        capacity: usize,
    },
    /// More than three images on a page
    ImageOverflow {
        /// Affected page
        page: ContentPage,
        /// Images stored
        count: usize,
    },
    /// Unknown schema tag
    UnknownVersion(String),
    /// `lastUpdated` precedes `createdAt`
    TimestampsReversed,
}

/// Report schema deviations without modifying the document
#[must_use]
pub fn validate(doc: &TeamDocument) -> Vec<SchemaIssue> {
    let mut issues = Vec::new();
    let capacity = doc.performance_layout().capacity();

    if let Some(kpis) = &doc.kpis {
        if kpis.len() > capacity {
            issues.push(SchemaIssue::KpiOverflow {
                count: kpis.len(),
                capacity,
            });
        }
    }

    for page in ContentPage::ALL {
        let count = doc.additional_content(page).uploaded_images.len();
        if count > crate::document::MAX_IMAGES {
            issues.push(SchemaIssue::ImageOverflow { page, count });
        }
    }

    if let Some(version) = &doc.version {
        if version != SCHEMA_VERSION {
            issues.push(SchemaIssue::UnknownVersion(version.clone()));
        }
    }

    if let (Some(created), Some(updated)) = (doc.created_at, doc.last_updated) {
        if updated < created {
            issues.push(SchemaIssue::TimestampsReversed);
        }
    }

    issues
}
