//! Anchor lookup within a grid.

use nps_model::AnchorMatcher;

use crate::grid::Grid;

/// Zero-based cell address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellPos {
    pub row: usize,
    pub col: usize,
}

impl CellPos {
    /// Apply a signed offset; `None` if the result is negative.
    pub fn offset(self, rows: i64, cols: i64) -> Option<(i64, i64)> {
        let row = i64::try_from(self.row).ok()?.checked_add(rows)?;
        let col = i64::try_from(self.col).ok()?.checked_add(cols)?;
        (row >= 0 && col >= 0).then_some((row, col))
    }
}

/// Position of the first cell matching the anchor, scanning row by row.
///
/// Anchors are assumed unique within a sheet, so the first hit wins.
pub fn locate_anchor(grid: &Grid, matcher: &AnchorMatcher) -> Option<CellPos> {
    grid.cells()
        .find(|(_, _, text)| matcher.is_match(text))
        .map(|(row, col, _)| CellPos { row, col })
}
