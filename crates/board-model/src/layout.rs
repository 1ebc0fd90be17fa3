//! Performance quadrant grid layout

use crate::error::ModelError;
use serde::{Deserialize, Serialize};

/// Grid shape of the performance quadrant
///
/// `rows * cols` bounds the number of KPIs a document may hold. Decoding
/// goes through [`PerformanceLayout::new`], so zero dimensions never load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawLayout")]
pub struct PerformanceLayout {
    /// Grid rows
    pub rows: u32,
    /// Grid columns
    pub cols: u32,
    /// Display label, `"{rows} × {cols}"`
    pub label: String,
}

#[derive(Deserialize)]
struct RawLayout {
    rows: u32,
    cols: u32,
    #[serde(default)]
    label: String,
}

impl TryFrom<RawLayout> for PerformanceLayout {
    type Error = ModelError;

    fn try_from(raw: RawLayout) -> Result<Self, Self::Error> {
        let mut layout = Self::new(raw.rows, raw.cols)?;
        if !raw.label.trim().is_empty() {
            layout.label = raw.label;
        }
        Ok(layout)
    }
}

/// Selectable presets, `(rows, cols)`
pub const LAYOUT_PRESETS: [(u32, u32); 8] = [
    (1, 1),
    (1, 2),
    (1, 3),
    (1, 4),
    (2, 1),
    (2, 2),
    (2, 3),
    (2, 4),
];

impl PerformanceLayout {
    /// Build a layout with its canonical label
    ///
    /// # Errors
    /// `ModelError::InvalidLayout` when either dimension is zero.
    pub fn new(rows: u32, cols: u32) -> Result<Self, ModelError> {
        if rows == 0 || cols == 0 {
            return Err(ModelError::InvalidLayout { rows, cols });
        }
        Ok(Self {
            rows,
            cols,
            label: format!("{rows} × {cols}"),
        })
    }

    /// All preset layouts in selector order
    #[must_use]
    pub fn presets() -> Vec<Self> {
        LAYOUT_PRESETS
            .iter()
            .map(|&(rows, cols)| Self {
                rows,
                cols,
                label: format!("{rows} × {cols}"),
            })
            .collect()
    }

    /// Maximum KPI count
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        (self.rows as usize).saturating_mul(self.cols as usize)
    }
}

impl Default for PerformanceLayout {
    fn default() -> Self {
        Self {
            rows: 2,
            cols: 4,
            label: "2 × 4".to_string(),
        }
    }
}
