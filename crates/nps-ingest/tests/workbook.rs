//! Loading real workbooks through the local source.

use std::path::PathBuf;

use nps_ingest::{FileSource, LocalFileSource, WalkPatterns, extract_fields, locate_anchor, walk};
use nps_model::{AnchorMatcher, DType, FieldMap, FieldSpec, FieldValue};

fn fixtures() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

#[test]
fn workbook_keeps_absolute_coordinates() {
    let source = LocalFileSource::new(fixtures()).unwrap();
    let patterns = WalkPatterns::new("", r"\d{4} Score").unwrap();
    let entries = walk(&source, &patterns).unwrap();
    assert_eq!(entries.len(), 1);

    // Used range starts at C4.
    let grid = source.open_grid(&entries[0]).unwrap();
    assert_eq!(grid.get(3, 2), Some("Score"));
    assert_eq!(grid.get(3, 3), Some("14"));
    assert_eq!(grid.get(0, 0), None);

    let spec = FieldSpec::new("Score", 0, 1, DType::Int);
    let anchor = locate_anchor(&grid, &AnchorMatcher::compile("score", &spec).unwrap()).unwrap();
    assert_eq!((anchor.row, anchor.col), (3, 2));
}

#[test]
fn workbook_values_are_typed() {
    let source = LocalFileSource::new(fixtures()).unwrap();
    let patterns = WalkPatterns::new("", r"\d{4} Score").unwrap();
    let entry = walk(&source, &patterns).unwrap().remove(0);
    let grid = source.open_grid(&entry).unwrap();

    let mut map = FieldMap::new();
    map.insert("score", FieldSpec::new("Score", 0, 1, DType::Int));
    map.insert("memory", FieldSpec::new("Memory", 0, 1, DType::Int));
    map.insert("ratio", FieldSpec::new("Ratio", 0, 1, DType::Float));
    let fields = map.compile().unwrap();

    let values = extract_fields(&grid, &fields, &entry.path);
    assert_eq!(values.get("score"), Some(&FieldValue::Int(14)));
    assert_eq!(values.get("ratio"), Some(&FieldValue::Float(0.5)));
    assert!(!values.contains_key("memory"));
}
