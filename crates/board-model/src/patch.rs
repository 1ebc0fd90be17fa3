//! Partial updates to a [`TeamDocument`]
//!
//! A patch names only the fields a widget owns. Merging is shallow: a field
//! present in the patch replaces the document's field wholesale. Timestamps
//! and the schema tag are owned by the controller and cannot be patched.

use crate::document::{AdditionalContent, ContentPage, IdeaAction, Kpi, TeamDocument};
use crate::layout::PerformanceLayout;
use serde::{Deserialize, Serialize};

/// Shallow partial update
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct TeamPatch {
    /// Replace KPI list
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kpis: Option<Vec<Kpi>>,
    /// Replace layout
    #[serde(skip_serializing_if = "Option::is_none")]
    pub performance_layout: Option<PerformanceLayout>,
    /// Safety visibility
    #[serde(skip_serializing_if = "Option::is_none")]
    pub show_safety: Option<bool>,
    /// News visibility
    #[serde(skip_serializing_if = "Option::is_none")]
    pub show_news: Option<bool>,
    /// Safety text
    #[serde(skip_serializing_if = "Option::is_none")]
    pub safety_text: Option<String>,
    /// News text
    #[serde(skip_serializing_if = "Option::is_none")]
    pub news_text: Option<String>,
    /// Team news text
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team_news: Option<String>,
    /// Replace ideas table
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ideas_actions: Option<Vec<IdeaAction>>,
    /// Replace page 1
    #[serde(skip_serializing_if = "Option::is_none")]
    pub additional_content1: Option<AdditionalContent>,
    /// Replace page 2
    #[serde(skip_serializing_if = "Option::is_none")]
    pub additional_content2: Option<AdditionalContent>,
    /// Replace page 3
    #[serde(skip_serializing_if = "Option::is_none")]
    pub additional_content3: Option<AdditionalContent>,
}

impl TeamPatch {
    /// Empty patch
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set KPIs
    #[must_use]
    pub fn kpis(mut self, kpis: Vec<Kpi>) -> Self {
        self.kpis = Some(kpis);
        self
    }

    /// Set layout
    #[must_use]
    pub fn performance_layout(mut self, layout: PerformanceLayout) -> Self {
        self.performance_layout = Some(layout);
        self
    }

    /// Set safety visibility
    #[must_use]
    pub fn show_safety(mut self, show: bool) -> Self {
        self.show_safety = Some(show);
        self
    }

    /// Set news visibility
    #[must_use]
    pub fn show_news(mut self, show: bool) -> Self {
        self.show_news = Some(show);
        self
    }

    /// Set safety text
    #[must_use]
    pub fn safety_text(mut self, text: impl Into<String>) -> Self {
        self.safety_text = Some(text.into());
        self
    }

    /// Set news text
    #[must_use]
    pub fn news_text(mut self, text: impl Into<String>) -> Self {
        self.news_text = Some(text.into());
        self
    }

    /// Set team news
    #[must_use]
    pub fn team_news(mut self, text: impl Into<String>) -> Self {
        self.team_news = Some(text.into());
        self
    }

    /// Set ideas table
    #[must_use]
    pub fn ideas_actions(mut self, rows: Vec<IdeaAction>) -> Self {
        self.ideas_actions = Some(rows);
        self
    }

    /// Set one additional-content page
    #[must_use]
    pub fn additional_content(mut self, page: ContentPage, content: AdditionalContent) -> Self {
        let slot = match page {
            ContentPage::One => &mut self.additional_content1,
            ContentPage::Two => &mut self.additional_content2,
            ContentPage::Three => &mut self.additional_content3,
        };
        *slot = Some(content);
        self
    }

    /// Whether the patch changes nothing
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.field_names().is_empty()
    }

    /// Document keys this patch touches
    #[must_use]
    pub fn field_names(&self) -> Vec<&'static str> {
        let mut names = Vec::new();
        let mut mark = |present: bool, name: &'static str| {
            if present {
                names.push(name);
            }
        };
        mark(self.kpis.is_some(), "kpis");
        mark(self.performance_layout.is_some(), "performanceLayout");
        mark(self.show_safety.is_some(), "showSafety");
        mark(self.show_news.is_some(), "showNews");
        mark(self.safety_text.is_some(), "safetyText");
        mark(self.news_text.is_some(), "newsText");
        mark(self.team_news.is_some(), "teamNews");
        mark(self.ideas_actions.is_some(), "ideasActions");
        mark(self.additional_content1.is_some(), "additionalContent1");
        mark(self.additional_content2.is_some(), "additionalContent2");
        mark(self.additional_content3.is_some(), "additionalContent3");
        names
    }

    /// Later patch wins on overlapping keys
    #[must_use]
    pub fn then(mut self, later: TeamPatch) -> Self {
        fn over<T>(slot: &mut Option<T>, later: Option<T>) {
            if later.is_some() {
                *slot = later;
            }
        }
        over(&mut self.kpis, later.kpis);
        over(&mut self.performance_layout, later.performance_layout);
        over(&mut self.show_safety, later.show_safety);
        over(&mut self.show_news, later.show_news);
        over(&mut self.safety_text, later.safety_text);
        over(&mut self.news_text, later.news_text);
        over(&mut self.team_news, later.team_news);
        over(&mut self.ideas_actions, later.ideas_actions);
        over(&mut self.additional_content1, later.additional_content1);
        over(&mut self.additional_content2, later.additional_content2);
        over(&mut self.additional_content3, later.additional_content3);
        self
    }

    pub(crate) fn merge_into(self, doc: &mut TeamDocument) {
        fn set<T>(slot: &mut Option<T>, value: Option<T>) {
            if let Some(value) = value {
                *slot = Some(value);
            }
        }
        set(&mut doc.kpis, self.kpis);
        set(&mut doc.performance_layout, self.performance_layout);
        set(&mut doc.show_safety, self.show_safety);
        set(&mut doc.show_news, self.show_news);
        set(&mut doc.safety_text, self.safety_text);
        set(&mut doc.news_text, self.news_text);
        set(&mut doc.team_news, self.team_news);
        set(&mut doc.ideas_actions, self.ideas_actions);
        set(doc.content_slot_mut(ContentPage::One), self.additional_content1);
        set(doc.content_slot_mut(ContentPage::Two), self.additional_content2);
        set(doc.content_slot_mut(ContentPage::Three), self.additional_content3);
    }
}
