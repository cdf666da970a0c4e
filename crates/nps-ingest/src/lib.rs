//! Spreadsheet ingestion for neuropsych summary sheets.
//!
//! This crate finds candidate spreadsheets in a directory tree, loads the
//! first sheet of each into a [`Grid`], and extracts typed fields using
//! anchor + offset specifications.
//!
//! # Features
//!
//! - **Tree walking**: regex-pruned traversal over any [`FileSource`]
//! - **Grid loading**: xlsx/xls/ods workbooks via calamine, CSV via `csv`
//! - **Anchor lookup**: row-major search for a label cell
//! - **Field extraction**: offset, missing-marker and dtype handling
//!
//! # Example
//!
//! ```ignore
//! use nps_ingest::{LocalFileSource, WalkPatterns, walk, extract_fields};
//!
//! let source = LocalFileSource::new("/data/neuropsych")?;
//! let patterns = WalkPatterns::new(r"\d{4}|Visit \d+", r"\d{3,4}.*Score.*\.xlsx$")?;
//! for entry in walk(&source, &patterns)? {
//!     let grid = source.open_grid(&entry)?;
//!     let values = extract_fields(&grid, &fields, &entry.path);
//! }
//! ```

mod anchor;
mod error;
mod extract;
mod grid;
mod local;
mod source;
mod walk;

// === Error Types ===
pub use error::{IngestError, Result};

// === Sources ===
pub use local::LocalFileSource;
pub use source::{EntryKind, FileSource, SourceEntry};
pub use walk::{WalkPatterns, walk};

// === Grids ===
pub use grid::{Grid, GridFormat, read_csv_grid, read_csv_grid_from_reader, read_workbook_grid};

// === Extraction ===
pub use anchor::{CellPos, locate_anchor};
pub use extract::{coerce, extract_field, extract_fields, is_missing_text};
