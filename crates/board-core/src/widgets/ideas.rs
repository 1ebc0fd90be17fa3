//! Ideas & Actions table

use crate::error::WidgetError;
use board_model::{ActionStatus, IdeaAction, TeamDocument, TeamPatch};

const WHEN_MAX_LEN: usize = 5;
const CSV_HEADER: [&str; 5] = ["Idea", "To Do", "Who", "Till When", "Status"];

/// Editable text column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdeaField {
    /// Idea
    Idea,
    /// To do
    Todo,
    /// Owner
    Who,
    /// Due date, `dd.mm`
    When,
}

/// Append a blank row
#[must_use]
pub fn add_row(doc: &TeamDocument) -> TeamPatch {
    let mut rows = doc.ideas_actions();
    rows.push(IdeaAction::default());
    TeamPatch::new().ideas_actions(rows)
}

fn with_row(
    doc: &TeamDocument,
    index: usize,
    edit: impl FnOnce(&mut IdeaAction),
) -> Result<TeamPatch, WidgetError> {
    let mut rows = doc.ideas_actions();
    let len = rows.len();
    let row = rows
        .get_mut(index)
        .ok_or(WidgetError::IndexOutOfRange { index, len })?;
    edit(row);
    Ok(TeamPatch::new().ideas_actions(rows))
}

/// Set one text field of one row, stored as typed
///
/// # Errors
/// `WidgetError::IndexOutOfRange` for a stale index.
pub fn edit_field(
    doc: &TeamDocument,
    index: usize,
    field: IdeaField,
    value: impl Into<String>,
) -> Result<TeamPatch, WidgetError> {
    let value = value.into();
    with_row(doc, index, |row| {
        let slot = match field {
            IdeaField::Idea => &mut row.idea,
            IdeaField::Todo => &mut row.todo,
            IdeaField::Who => &mut row.who,
            IdeaField::When => &mut row.when,
        };
        *slot = value;
    })
}

/// Set the `when` column from raw input, see [`normalize_when`]
///
/// Rejected input yields an empty patch.
///
/// # Errors
/// `WidgetError::IndexOutOfRange` for a stale index.
pub fn edit_when(doc: &TeamDocument, index: usize, input: &str) -> Result<TeamPatch, WidgetError> {
    match normalize_when(input) {
        Some(when) => edit_field(doc, index, IdeaField::When, when),
        None => {
            let len = doc.ideas_actions().len();
            if index >= len {
                return Err(WidgetError::IndexOutOfRange { index, len });
            }
            Ok(TeamPatch::new())
        }
    }
}

/// Set a row's status
///
/// # Errors
/// `WidgetError::IndexOutOfRange` for a stale index.
pub fn set_status(
    doc: &TeamDocument,
    index: usize,
    status: ActionStatus,
) -> Result<TeamPatch, WidgetError> {
    with_row(doc, index, |row| row.status = status)
}

/// Remove a row
///
/// # Errors
/// `WidgetError::IndexOutOfRange` for a stale index.
pub fn delete_row(doc: &TeamDocument, index: usize) -> Result<TeamPatch, WidgetError> {
    let mut rows = doc.ideas_actions();
    if index >= rows.len() {
        return Err(WidgetError::IndexOutOfRange {
            index,
            len: rows.len(),
        });
    }
    rows.remove(index);
    Ok(TeamPatch::new().ideas_actions(rows))
}

/// Clean `dd.mm` input as it is typed
///
/// Keeps digits and dots, appends a dot after two bare digits, and rejects
/// (`None`) anything longer than five characters.
#[must_use]
pub fn normalize_when(input: &str) -> Option<String> {
    let clean: String = input
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    if clean.len() == 2 && !clean.contains('.') {
        Some(format!("{clean}."))
    } else if clean.len() <= WHEN_MAX_LEN {
        Some(clean)
    } else {
        None
    }
}

/// Render rows as CSV with a header line
#[must_use]
pub fn to_csv(rows: &[IdeaAction]) -> String {
    let mut out = String::new();
    out.push_str(&CSV_HEADER.join(","));
    out.push('\n');
    for row in rows {
        let fields = [
            row.idea.as_str(),
            row.todo.as_str(),
            row.who.as_str(),
            row.when.as_str(),
            row.status.label(),
        ];
        let line: Vec<String> = fields.iter().map(|f| csv_escape(f)).collect();
        out.push_str(&line.join(","));
        out.push('\n');
    }
    out
}

fn should_neutralize_csv(value: &str) -> bool {
    let trimmed = value.trim_start();
    matches!(trimmed.chars().next(), Some('=' | '+' | '-' | '@'))
}

fn csv_escape(value: &str) -> String {
    let safe = if should_neutralize_csv(value) {
        format!("'{value}")
    } else {
        value.to_string()
    };
    if safe.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", safe.replace('"', "\"\""))
    } else {
        safe
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use board_model::schema;

    fn doc() -> TeamDocument {
        schema::default_document(&"PUD".parse().unwrap())
    }

    #[test]
    fn when_is_normalised() {
        assert_eq!(normalize_when("10").as_deref(), Some("10."));
        assert_eq!(normalize_when("10.0a7").as_deref(), Some("10.07"));
        assert_eq!(normalize_when("1").as_deref(), Some("1"));
        assert_eq!(normalize_when("10.071"), None);
        assert_eq!(normalize_when("").as_deref(), Some(""));
    }

    #[test]
    fn add_edit_delete() {
        let mut d = doc();
        d.apply(add_row(&d));
        assert_eq!(d.ideas_actions().len(), 2);
        assert_eq!(d.ideas_actions()[1].status, ActionStatus::InProgress);

        d.apply(edit_field(&d, 1, IdeaField::Who, "Ben").unwrap());
        d.apply(edit_when(&d, 1, "3104").unwrap());
        d.apply(set_status(&d, 1, ActionStatus::Completed).unwrap());
        let row = &d.ideas_actions()[1];
        assert_eq!((row.who.as_str(), row.when.as_str()), ("Ben", "3104"));
        assert_eq!(row.status, ActionStatus::Completed);

        d.apply(delete_row(&d, 0).unwrap());
        assert_eq!(d.ideas_actions()[0].who, "Ben");
        assert!(delete_row(&d, 1).is_err());
    }

    #[test]
    fn rejected_when_is_noop() {
        assert!(edit_when(&doc(), 0, "123456").unwrap().is_empty());
        assert!(edit_when(&doc(), 4, "123456").is_err());
    }

    #[test]
    fn csv_neutralises_formulas() {
        let rows = vec![IdeaAction {
            idea: "=HYPERLINK(\"x\")".into(),
            todo: "plan, then act".into(),
            who: "Ana".into(),
            when: "10.07".into(),
            status: ActionStatus::Completed,
        }];
        let csv = to_csv(&rows);
        let mut lines = csv.lines();
        assert_eq!(lines.next(), Some("Idea,To Do,Who,Till When,Status"));
        assert_eq!(
            lines.next(),
            Some("\"'=HYPERLINK(\"\"x\"\")\",\"plan, then act\",Ana,10.07,Completed")
        );
    }
}
