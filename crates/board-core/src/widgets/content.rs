//! Additional content pages 1-3: topic, text and up to three images

use crate::error::WidgetError;
use board_model::{AdditionalContent, ContentPage, TeamDocument, TeamPatch, Topic, UploadedImage};

/// Outcome of adding images to a page
#[derive(Debug, Clone, PartialEq)]
pub struct ImageAddition {
    /// Patch carrying the accepted images
    pub patch: TeamPatch,
    /// Number of images accepted
    pub accepted: usize,
    /// Names of images refused because the page was full
    pub rejected: Vec<String>,
}

fn with_page(
    doc: &TeamDocument,
    page: ContentPage,
    edit: impl FnOnce(&mut AdditionalContent),
) -> TeamPatch {
    let mut content = doc.additional_content(page);
    edit(&mut content);
    TeamPatch::new().additional_content(page, content)
}

/// Pick the page topic
#[must_use]
pub fn select_topic(doc: &TeamDocument, page: ContentPage, topic: Topic) -> TeamPatch {
    with_page(doc, page, |c| c.selected_topic = topic)
}

/// Show or hide the text block
#[must_use]
pub fn set_show_text(doc: &TeamDocument, page: ContentPage, show: bool) -> TeamPatch {
    with_page(doc, page, |c| c.show_text = show)
}

/// Replace the page text
#[must_use]
pub fn set_text(doc: &TeamDocument, page: ContentPage, text: impl Into<String>) -> TeamPatch {
    let text = text.into();
    with_page(doc, page, |c| c.text_content = text)
}

/// Append images up to the page limit; the rest are reported, not stored
#[must_use]
pub fn add_images(doc: &TeamDocument, page: ContentPage, images: Vec<UploadedImage>) -> ImageAddition {
    let mut content = doc.additional_content(page);
    let free = content.remaining_image_slots();
    let mut incoming = images;
    let overflow = if incoming.len() > free {
        incoming.split_off(free)
    } else {
        Vec::new()
    };
    let accepted = incoming.len();
    content.uploaded_images.extend(incoming);

    let rejected: Vec<String> = overflow.into_iter().map(|image| image.name).collect();
    if !rejected.is_empty() {
        tracing::warn!(
            page = page.number(),
            "Image limit reached, refused {} file(s)",
            rejected.len()
        );
    }

    let patch = if accepted == 0 {
        TeamPatch::new()
    } else {
        TeamPatch::new().additional_content(page, content)
    };
    ImageAddition {
        patch,
        accepted,
        rejected,
    }
}

/// Remove one image by id
///
/// # Errors
/// `WidgetError::UnknownImage` if the page has no such image.
pub fn remove_image(doc: &TeamDocument, page: ContentPage, id: &str) -> Result<TeamPatch, WidgetError> {
    let mut content = doc.additional_content(page);
    let before = content.uploaded_images.len();
    content.uploaded_images.retain(|image| image.id != id);
    if content.uploaded_images.len() == before {
        return Err(WidgetError::UnknownImage(id.to_string()));
    }
    Ok(TeamPatch::new().additional_content(page, content))
}

#[cfg(test)]
mod tests {
    use super::*;
    use board_model::MAX_IMAGES;

    fn image(n: usize) -> UploadedImage {
        UploadedImage {
            id: n.to_string(),
            src: "data:image/png;base64,iVBORw0KGgo=".into(),
            name: format!("img-{n}.png"),
        }
    }

    #[test]
    fn pages_are_independent() {
        let mut doc = TeamDocument::default();
        doc.apply(select_topic(&doc, ContentPage::Two, Topic::Safety));
        doc.apply(set_text(&doc, ContentPage::Two, "stack pallets low"));
        assert_eq!(doc.additional_content(ContentPage::Two).selected_topic, Topic::Safety);
        assert_eq!(doc.additional_content(ContentPage::One).selected_topic, Topic::Performance);
        assert!(doc.additional_content1.is_none());
    }

    #[test]
    fn images_capped_at_three() {
        let mut doc = TeamDocument::default();
        let first = add_images(&doc, ContentPage::One, vec![image(1), image(2)]);
        assert_eq!(first.accepted, 2);
        doc.apply(first.patch);

        let second = add_images(&doc, ContentPage::One, vec![image(3), image(4), image(5)]);
        assert_eq!(second.accepted, 1);
        assert_eq!(second.rejected, vec!["img-4.png", "img-5.png"]);
        doc.apply(second.patch);
        assert_eq!(doc.additional_content(ContentPage::One).uploaded_images.len(), MAX_IMAGES);

        let full = add_images(&doc, ContentPage::One, vec![image(6)]);
        assert!(full.patch.is_empty());
    }

    #[test]
    fn remove_by_id() {
        let mut doc = TeamDocument::default();
        doc.apply(add_images(&doc, ContentPage::Three, vec![image(1), image(2)]).patch);
        doc.apply(remove_image(&doc, ContentPage::Three, "1").unwrap());
        let names: Vec<_> = doc
            .additional_content(ContentPage::Three)
            .uploaded_images
            .into_iter()
            .map(|i| i.name)
            .collect();
        assert_eq!(names, vec!["img-2.png"]);
        assert_eq!(
            remove_image(&doc, ContentPage::Three, "1").unwrap_err(),
            WidgetError::UnknownImage("1".into())
        );
    }
}
