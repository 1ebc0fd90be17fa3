//! The persisted per-team dashboard document
//!
//! Every field of [`TeamDocument`] is optional on read. Accessors fall back to
//! the shared defaults in [`crate::schema`], so a partially populated document
//! renders exactly like a freshly created one.

use crate::layout::PerformanceLayout;
use crate::patch::TeamPatch;
use crate::schema;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Maximum images per additional-content page
pub const MAX_IMAGES: usize = 3;

/// Reporting period of a KPI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KpiPeriod {
    /// No period
    #[default]
    Permanent,
    /// Per day
    Daily,
    /// Per week
    Weekly,
    /// Month to date
    Mtd,
    /// Year to date
    Ytd,
}

/// A single key performance indicator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Kpi {
    /// Display name
    pub name: String,
    /// Current value
    pub value: f64,
    /// Target value
    pub target: f64,
    /// Reporting period
    pub period: KpiPeriod,
    /// Direction of improvement
    pub higher_is_better: bool,
}

impl Kpi {
    /// Build a KPI
    #[must_use]
    pub fn new(name: impl Into<String>, value: f64, target: f64) -> Self {
        Self {
            name: name.into(),
            value,
            target,
            period: KpiPeriod::Permanent,
            higher_is_better: true,
        }
    }

    /// With period
    #[inline]
    #[must_use]
    pub fn with_period(mut self, period: KpiPeriod) -> Self {
        self.period = period;
        self
    }

    /// Mark lower values as better
    #[inline]
    #[must_use]
    pub fn lower_is_better(mut self) -> Self {
        self.higher_is_better = false;
        self
    }

    /// Whether the target is met
    #[must_use]
    pub fn achieved(&self) -> bool {
        if self.higher_is_better {
            self.value >= self.target
        } else {
            self.value <= self.target
        }
    }

    /// Signed improvement over target in percent, rounded to one decimal
    ///
    /// Positive means better than target. Zero when the target is zero.
    #[must_use]
    pub fn diff_percent(&self) -> f64 {
        if self.target == 0.0 {
            return 0.0;
        }
        let diff = if self.higher_is_better {
            self.value - self.target
        } else {
            self.target - self.value
        };
        (diff / self.target * 1000.0).round() / 10.0
    }
}

impl Default for Kpi {
    fn default() -> Self {
        Self::new("New KPI", 0.0, 0.0)
    }
}

/// Status of an idea/action row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ActionStatus {
    /// Open
    #[default]
    #[serde(rename = "In Progress")]
    InProgress,
    /// Done
    #[serde(rename = "Completed")]
    Completed,
}

impl ActionStatus {
    /// Display label, identical to the serialized form
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::InProgress => "In Progress",
            Self::Completed => "Completed",
        }
    }
}

/// One row of the ideas & actions table
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct IdeaAction {
    /// The idea
    pub idea: String,
    /// Follow-up action
    pub todo: String,
    /// Owner
    pub who: String,
    /// Due date, free form (usually `dd.mm`)
    pub when: String,
    /// Progress
    pub status: ActionStatus,
}

/// Topic of an additional-content page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Topic {
    /// Performance
    #[default]
    Performance,
    /// News
    News,
    /// Safety
    Safety,
    /// Team
    Team,
    /// Anything else
    Other,
}

impl Topic {
    /// Selector order
    pub const ALL: [Topic; 5] = [
        Topic::Performance,
        Topic::News,
        Topic::Safety,
        Topic::Team,
        Topic::Other,
    ];
}

/// Image attached to an additional-content page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedImage {
    /// Identifier, unique within the page
    #[serde(deserialize_with = "id_from_string_or_number")]
    pub id: String,
    /// `data:` URI holding the image bytes
    pub src: String,
    /// Original file name
    pub name: String,
}

// Older exports carry numeric ids.
fn id_from_string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(text) => text,
        RawId::Number(number) => number.to_string(),
    })
}

/// One of the three free-form pages
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AdditionalContent {
    /// Page topic
    pub selected_topic: Topic,
    /// Whether the text column is shown
    pub show_text: bool,
    /// Page text
    pub text_content: String,
    /// At most [`MAX_IMAGES`] images
    pub uploaded_images: Vec<UploadedImage>,
}

impl Default for AdditionalContent {
    fn default() -> Self {
        Self {
            selected_topic: Topic::Performance,
            show_text: true,
            text_content: String::new(),
            uploaded_images: Vec::new(),
        }
    }
}

impl AdditionalContent {
    /// Free image slots
    #[inline]
    #[must_use]
    pub fn remaining_image_slots(&self) -> usize {
        MAX_IMAGES.saturating_sub(self.uploaded_images.len())
    }
}

/// Selects one of the additional-content pages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ContentPage {
    /// `additionalContent1`
    One,
    /// `additionalContent2`
    Two,
    /// `additionalContent3`
    Three,
}

impl ContentPage {
    /// All pages in order
    pub const ALL: [ContentPage; 3] = [ContentPage::One, ContentPage::Two, ContentPage::Three];

    /// Page from its 1-based number
    #[must_use]
    pub fn from_number(number: u8) -> Option<Self> {
        match number {
            1 => Some(Self::One),
            2 => Some(Self::Two),
            3 => Some(Self::Three),
            _ => None,
        }
    }

    /// 1-based page number
    #[must_use]
    pub fn number(self) -> u8 {
        match self {
            Self::One => 1,
            Self::Two => 2,
            Self::Three => 3,
        }
    }
}

/// Complete persisted state of one team
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TeamDocument {
    /// KPI cards, row-major
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kpis: Option<Vec<Kpi>>,
    /// KPI grid shape
    #[serde(skip_serializing_if = "Option::is_none")]
    pub performance_layout: Option<PerformanceLayout>,
    /// Safety panel visible
    #[serde(skip_serializing_if = "Option::is_none")]
    pub show_safety: Option<bool>,
    /// News panel visible
    #[serde(skip_serializing_if = "Option::is_none")]
    pub show_news: Option<bool>,
    /// Safety notes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub safety_text: Option<String>,
    /// News notes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub news_text: Option<String>,
    /// Team news quadrant
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team_news: Option<String>,
    /// Ideas & actions table
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ideas_actions: Option<Vec<IdeaAction>>,
    /// Additional page 1
    #[serde(skip_serializing_if = "Option::is_none")]
    pub additional_content1: Option<AdditionalContent>,
    /// Additional page 2
    #[serde(skip_serializing_if = "Option::is_none")]
    pub additional_content2: Option<AdditionalContent>,
    /// Additional page 3
    #[serde(skip_serializing_if = "Option::is_none")]
    pub additional_content3: Option<AdditionalContent>,
    /// Set once at creation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    /// Refreshed on every accepted patch
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<DateTime<Utc>>,
    /// Schema tag
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

impl TeamDocument {
    /// KPIs, falling back to the defaults, never exceeding layout capacity
    #[must_use]
    pub fn kpis(&self) -> Vec<Kpi> {
        let capacity = self.performance_layout().capacity();
        let mut kpis = self.kpis.clone().unwrap_or_else(schema::default_kpis);
        kpis.truncate(capacity);
        kpis
    }

    /// Layout, falling back to `2 × 4`
    #[must_use]
    pub fn performance_layout(&self) -> PerformanceLayout {
        self.performance_layout.clone().unwrap_or_default()
    }

    /// Safety panel visibility
    #[inline]
    #[must_use]
    pub fn show_safety(&self) -> bool {
        self.show_safety.unwrap_or(schema::DEFAULT_SHOW_PANEL)
    }

    /// News panel visibility
    #[inline]
    #[must_use]
    pub fn show_news(&self) -> bool {
        self.show_news.unwrap_or(schema::DEFAULT_SHOW_PANEL)
    }

    /// Safety text
    #[inline]
    #[must_use]
    pub fn safety_text(&self) -> &str {
        self.safety_text.as_deref().unwrap_or_default()
    }

    /// News text
    #[inline]
    #[must_use]
    pub fn news_text(&self) -> &str {
        self.news_text.as_deref().unwrap_or_default()
    }

    /// Team news text
    #[inline]
    #[must_use]
    pub fn team_news(&self) -> &str {
        self.team_news.as_deref().unwrap_or_default()
    }

    /// Ideas & actions rows, falling back to the seed row
    #[must_use]
    pub fn ideas_actions(&self) -> Vec<IdeaAction> {
        self.ideas_actions
            .clone()
            .unwrap_or_else(schema::default_ideas_actions)
    }

    /// One additional-content page, falling back to an empty page
    #[must_use]
    pub fn additional_content(&self, page: ContentPage) -> AdditionalContent {
        self.content_slot(page).clone().unwrap_or_default()
    }

    /// Schema version, `"1.0"` when absent
    #[must_use]
    pub fn version(&self) -> &str {
        self.version.as_deref().unwrap_or(schema::SCHEMA_VERSION)
    }

    fn content_slot(&self, page: ContentPage) -> &Option<AdditionalContent> {
        match page {
            ContentPage::One => &self.additional_content1,
            ContentPage::Two => &self.additional_content2,
            ContentPage::Three => &self.additional_content3,
        }
    }

    pub(crate) fn content_slot_mut(&mut self, page: ContentPage) -> &mut Option<AdditionalContent> {
        match page {
            ContentPage::One => &mut self.additional_content1,
            ContentPage::Two => &mut self.additional_content2,
            ContentPage::Three => &mut self.additional_content3,
        }
    }

    /// Shallow-merge a patch: each field present in `patch` replaces the
    /// whole field here. Invariants are re-established afterwards.
    pub fn apply(&mut self, patch: TeamPatch) {
        patch.merge_into(self);
        self.enforce_invariants();
    }

    /// Refresh `lastUpdated`, never moving it backwards
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.last_updated = Some(match self.last_updated {
            Some(previous) if previous > now => previous,
            _ => now,
        });
    }

    /// Truncate KPIs to layout capacity and image lists to [`MAX_IMAGES`]
    ///
    /// Returns whether anything was dropped.
    pub fn enforce_invariants(&mut self) -> bool {
        let capacity = self.performance_layout().capacity();
        let mut dropped = false;

        if let Some(kpis) = self.kpis.as_mut() {
            if kpis.len() > capacity {
                tracing::debug!(
                    "Truncating {} KPIs to layout capacity {}",
                    kpis.len(),
                    capacity
                );
                kpis.truncate(capacity);
                dropped = true;
            }
        }

        for page in ContentPage::ALL {
            if let Some(content) = self.content_slot_mut(page).as_mut() {
                if content.uploaded_images.len() > MAX_IMAGES {
                    content.uploaded_images.truncate(MAX_IMAGES);
                    dropped = true;
                }
            }
        }

        dropped
    }
}
