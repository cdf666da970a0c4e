//! Anchor + offset field extraction.

use std::collections::BTreeMap;

use nps_model::{CompiledField, DType, FieldValue};
use tracing::warn;

use crate::anchor::locate_anchor;
use crate::grid::Grid;

/// Raw cell texts that mean "no value".
const MISSING_MARKERS: [&str; 3] = ["", "NA", "N/A"];

/// Extract every field present in the grid.
///
/// Missing anchors, out-of-range offsets, empty cells and unparseable values
/// all yield no entry; none of them is an error.
pub fn extract_fields(
    grid: &Grid,
    fields: &[CompiledField<'_>],
    source: &str,
) -> BTreeMap<String, FieldValue> {
    fields
        .iter()
        .filter_map(|field| {
            extract_field(grid, field, source).map(|value| (field.name.to_string(), value))
        })
        .collect()
}

pub fn extract_field(grid: &Grid, field: &CompiledField<'_>, source: &str) -> Option<FieldValue> {
    let anchor = locate_anchor(grid, &field.matcher)?;
    let (row, col) = anchor.offset(field.spec.row_offset, field.spec.col_offset)?;
    let raw = grid.get_offset(row, col)?;
    if is_missing_text(raw) {
        return None;
    }
    coerce(raw, field.spec.dtype, &field.spec.anchor, source)
}

/// True for empty text and the `NA` / `N/A` markers, case-insensitively.
pub fn is_missing_text(raw: &str) -> bool {
    let trimmed = raw.trim();
    MISSING_MARKERS
        .iter()
        .any(|marker| trimmed.eq_ignore_ascii_case(marker))
}

/// Coerce raw cell text to `dtype`, logging and dropping incompatible values.
pub fn coerce(raw: &str, dtype: DType, anchor: &str, source: &str) -> Option<FieldValue> {
    let parsed = match dtype {
        DType::String => return Some(FieldValue::Text(raw.to_string())),
        DType::Int => parse_int(raw).map(FieldValue::Int),
        DType::Float => raw
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|value| value.is_finite())
            .map(FieldValue::Float),
    };
    if parsed.is_none() {
        warn!(
            anchor,
            source,
            dtype = %dtype,
            "raw value in sheet not compatible with defined dtype"
        );
    }
    parsed
}

/// Integers may arrive as integral floats from numeric spreadsheet cells.
fn parse_int(raw: &str) -> Option<i64> {
    let trimmed = raw.trim();
    if let Ok(value) = trimmed.parse::<i64>() {
        return Some(value);
    }
    let value = trimmed.parse::<f64>().ok()?;
    (value.is_finite() && value.fract() == 0.0 && value.abs() < 9.0e15).then_some(value as i64)
}
