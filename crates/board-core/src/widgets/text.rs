//! Text formatting helpers shared by every free-text field
//!
//! Selections are character offsets, clamped to the text.

const BULLET: &str = "• ";
const PARAGRAPH: &str = "\n\n";

/// Text selection, `start <= end`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Selection {
    /// First selected character
    pub start: usize,
    /// One past the last selected character
    pub end: usize,
}

impl Selection {
    /// Collapsed selection at `at`
    #[inline]
    #[must_use]
    pub fn caret(at: usize) -> Self {
        Self { start: at, end: at }
    }

    /// Selection from `start` to `end`, reordered if needed
    #[inline]
    #[must_use]
    pub fn new(start: usize, end: usize) -> Self {
        Self {
            start: start.min(end),
            end: start.max(end),
        }
    }
}

fn byte_offset(text: &str, chars: usize) -> usize {
    text.char_indices().nth(chars).map_or(text.len(), |(i, _)| i)
}

/// Prefix the selection with a bullet, on a new line unless already at one
///
/// Returns the new text and the selection over the original selected text.
#[must_use]
pub fn insert_bullet(text: &str, selection: Selection) -> (String, Selection) {
    let start = byte_offset(text, selection.start);
    let end = byte_offset(text, selection.end).max(start);
    let at_line_start = start == 0 || text[..start].ends_with('\n');
    let prefix = if at_line_start {
        BULLET.to_string()
    } else {
        format!("\n{BULLET}")
    };

    let mut out = String::with_capacity(text.len() + prefix.len());
    out.push_str(&text[..start]);
    out.push_str(&prefix);
    out.push_str(&text[start..]);

    let start_chars = text[..start].chars().count();
    let selected = text[start..end].chars().count();
    let shift = prefix.chars().count();
    (
        out,
        Selection::new(start_chars + shift, start_chars + shift + selected),
    )
}

/// Insert a blank line at the selection start, caret after it
#[must_use]
pub fn insert_paragraph(text: &str, selection: Selection) -> (String, Selection) {
    let start = byte_offset(text, selection.start);
    let mut out = String::with_capacity(text.len() + PARAGRAPH.len());
    out.push_str(&text[..start]);
    out.push_str(PARAGRAPH);
    out.push_str(&text[start..]);
    let caret = text[..start].chars().count() + PARAGRAPH.len();
    (out, Selection::caret(caret))
}
