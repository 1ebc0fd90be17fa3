//! Performance quadrant: KPI grid bounded by the layout

use super::{move_item, Direction};
use crate::error::WidgetError;
use board_model::{Kpi, PerformanceLayout, TeamDocument, TeamPatch};

/// One rendered KPI cell
#[derive(Debug, Clone, PartialEq)]
pub struct KpiCell {
    /// Position in the KPI sequence
    pub index: usize,
    /// The KPI
    pub kpi: Kpi,
    /// Whether the target is met
    pub achieved: bool,
    /// Signed improvement over target, percent
    pub diff_percent: f64,
}

/// KPI cells arranged row-major over the layout; only filled cells appear
#[must_use]
pub fn grid(doc: &TeamDocument) -> Vec<Vec<KpiCell>> {
    let layout = doc.performance_layout();
    let cols = usize::try_from(layout.cols).unwrap_or(usize::MAX).max(1);
    let cells: Vec<KpiCell> = doc
        .kpis()
        .into_iter()
        .enumerate()
        .map(|(index, kpi)| KpiCell {
            index,
            achieved: kpi.achieved(),
            diff_percent: kpi.diff_percent(),
            kpi,
        })
        .collect();
    cells.chunks(cols).map(<[KpiCell]>::to_vec).collect()
}

/// Append a blank KPI
///
/// # Errors
/// `WidgetError::LayoutFull` when every cell is taken.
pub fn add_kpi(doc: &TeamDocument) -> Result<TeamPatch, WidgetError> {
    let capacity = doc.performance_layout().capacity();
    let mut kpis = doc.kpis();
    if kpis.len() >= capacity {
        return Err(WidgetError::LayoutFull { capacity });
    }
    kpis.push(Kpi::default());
    Ok(TeamPatch::new().kpis(kpis))
}

/// Replace the KPI at `index`
///
/// # Errors
/// `WidgetError::IndexOutOfRange` for a stale index.
pub fn edit_kpi(doc: &TeamDocument, index: usize, kpi: Kpi) -> Result<TeamPatch, WidgetError> {
    let mut kpis = doc.kpis();
    let len = kpis.len();
    let slot = kpis
        .get_mut(index)
        .ok_or(WidgetError::IndexOutOfRange { index, len })?;
    *slot = kpi;
    Ok(TeamPatch::new().kpis(kpis))
}

/// Remove the KPI at `index`
///
/// # Errors
/// `WidgetError::LastKpi` when only one remains, or a stale index.
pub fn delete_kpi(doc: &TeamDocument, index: usize) -> Result<TeamPatch, WidgetError> {
    let mut kpis = doc.kpis();
    if index >= kpis.len() {
        return Err(WidgetError::IndexOutOfRange {
            index,
            len: kpis.len(),
        });
    }
    if kpis.len() <= 1 {
        return Err(WidgetError::LastKpi);
    }
    kpis.remove(index);
    Ok(TeamPatch::new().kpis(kpis))
}

/// Swap a KPI with its neighbour; an empty patch at either end
#[must_use]
pub fn move_kpi(doc: &TeamDocument, index: usize, direction: Direction) -> TeamPatch {
    let mut kpis = doc.kpis();
    if move_item(&mut kpis, index, direction) {
        TeamPatch::new().kpis(kpis)
    } else {
        TeamPatch::new()
    }
}

/// Switch the grid shape, dropping KPIs past the new capacity
///
/// # Errors
/// `WidgetError::Layout` for a zero dimension.
pub fn change_layout(doc: &TeamDocument, rows: u32, cols: u32) -> Result<TeamPatch, WidgetError> {
    let layout =
        PerformanceLayout::new(rows, cols).map_err(|e| WidgetError::Layout(e.to_string()))?;
    let mut kpis = doc.kpis();
    if kpis.len() > layout.capacity() {
        tracing::debug!(
            "Layout {} drops {} KPIs",
            layout.label,
            kpis.len() - layout.capacity()
        );
        kpis.truncate(layout.capacity());
    }
    Ok(TeamPatch::new().performance_layout(layout).kpis(kpis))
}

#[cfg(test)]
mod tests {
    use super::*;
    use board_model::schema;

    fn doc() -> TeamDocument {
        schema::default_document(&"PUD".parse().unwrap())
    }

    fn with_patch(mut doc: TeamDocument, patch: TeamPatch) -> TeamDocument {
        doc.apply(patch);
        doc
    }

    #[test]
    fn grid_is_row_major() {
        let mut d = doc();
        for _ in 0..3 {
            d = with_patch(d.clone(), add_kpi(&d).unwrap());
        }
        let rows = grid(&d);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].len(), 4);
        assert_eq!(rows[1][0].index, 4);
        assert!(rows[0][0].achieved);
        assert!((rows[0][1].diff_percent - 40.0).abs() < 1e-9);
    }

    #[test]
    fn add_respects_capacity() {
        let d = with_patch(doc(), change_layout(&doc(), 1, 2).unwrap());
        assert_eq!(
            add_kpi(&d).unwrap_err(),
            WidgetError::LayoutFull { capacity: 2 }
        );
    }

    #[test]
    fn new_kpi_is_blank() {
        let patch = add_kpi(&doc()).unwrap();
        let added = patch.kpis.unwrap().pop().unwrap();
        assert_eq!(added.name, "New KPI");
        assert!(added.higher_is_better);
    }

    #[test]
    fn delete_keeps_last_kpi() {
        let d = with_patch(doc(), delete_kpi(&doc(), 0).unwrap());
        assert_eq!(d.kpis().len(), 1);
        assert_eq!(d.kpis()[0].name, "Error Rate");
        assert_eq!(delete_kpi(&d, 0).unwrap_err(), WidgetError::LastKpi);
        assert!(matches!(
            delete_kpi(&d, 5),
            Err(WidgetError::IndexOutOfRange { index: 5, len: 1 })
        ));
    }

    #[test]
    fn move_swaps_or_noops() {
        let moved = with_patch(doc(), move_kpi(&doc(), 1, Direction::Up));
        assert_eq!(moved.kpis()[0].name, "Error Rate");
        assert!(move_kpi(&doc(), 0, Direction::Up).is_empty());
        assert!(move_kpi(&doc(), 1, Direction::Down).is_empty());
    }

    #[test]
    fn shrinking_layout_truncates() {
        let d = with_patch(doc(), change_layout(&doc(), 1, 1).unwrap());
        assert_eq!(d.performance_layout().label, "1 × 1");
        assert_eq!(d.kpis.as_ref().map(Vec::len), Some(1));
        assert_eq!(d.kpis()[0].name, "On-Time Delivery");
        assert!(change_layout(&d, 0, 3).is_err());
    }

    #[test]
    fn edit_replaces_in_place() {
        let kpi = Kpi::new("Scans", 10.0, 12.0);
        let d = with_patch(doc(), edit_kpi(&doc(), 1, kpi.clone()).unwrap());
        assert_eq!(d.kpis()[1], kpi);
        assert!(edit_kpi(&d, 9, kpi).is_err());
    }
}
