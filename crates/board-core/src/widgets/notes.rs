//! Safety/News quadrant and Team News

use board_model::{TeamDocument, TeamPatch};

/// Which half of the Safety/News quadrant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Panel {
    /// Safety notes
    Safety,
    /// News notes
    News,
}

/// Panel visibility and text as the quadrant renders them
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelView {
    /// Shown
    pub visible: bool,
    /// Body text
    pub text: String,
}

/// Read a panel with fallbacks
#[must_use]
pub fn panel(doc: &TeamDocument, which: Panel) -> PanelView {
    match which {
        Panel::Safety => PanelView {
            visible: doc.show_safety(),
            text: doc.safety_text().to_string(),
        },
        Panel::News => PanelView {
            visible: doc.show_news(),
            text: doc.news_text().to_string(),
        },
    }
}

/// Show or hide a panel
#[must_use]
pub fn set_visible(which: Panel, visible: bool) -> TeamPatch {
    match which {
        Panel::Safety => TeamPatch::new().show_safety(visible),
        Panel::News => TeamPatch::new().show_news(visible),
    }
}

/// Flip a panel's visibility
#[must_use]
pub fn toggle(doc: &TeamDocument, which: Panel) -> TeamPatch {
    set_visible(which, !panel(doc, which).visible)
}

/// Replace a panel's text
#[must_use]
pub fn set_text(which: Panel, text: impl Into<String>) -> TeamPatch {
    match which {
        Panel::Safety => TeamPatch::new().safety_text(text),
        Panel::News => TeamPatch::new().news_text(text),
    }
}

/// Replace the Team News text
#[must_use]
pub fn set_team_news(text: impl Into<String>) -> TeamPatch {
    TeamPatch::new().team_news(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggles_flip_fallback() {
        let mut doc = TeamDocument::default();
        assert!(panel(&doc, Panel::News).visible);
        doc.apply(toggle(&doc, Panel::News));
        assert_eq!(doc.show_news, Some(false));
        assert_eq!(doc.show_safety, None);
    }

    #[test]
    fn text_patches_touch_one_field() {
        assert_eq!(set_text(Panel::Safety, "gloves").field_names(), vec!["safetyText"]);
        assert_eq!(set_team_news("hi").field_names(), vec!["teamNews"]);
    }
}
