//! Record accumulation over candidate spreadsheets.

use nps_ingest::{FileSource, SourceEntry, WalkPatterns, extract_fields, walk};
use nps_model::{CompiledField, ExtractedRecord, RecordSet};
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::identity::IdentityResolver;

/// Counts collected while accumulating records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AccumulateStats {
    pub candidates: usize,
    pub unreadable: usize,
    pub empty_sheets: usize,
    pub empty_records: usize,
    pub records: usize,
}

/// Records built from every loadable candidate, in traversal order.
#[derive(Debug, Clone, Default)]
pub struct Accumulated {
    pub records: RecordSet,
    pub stats: AccumulateStats,
}

/// Walk the source and accumulate one record per matching spreadsheet.
pub fn harvest<S: FileSource + ?Sized>(
    source: &S,
    patterns: &WalkPatterns,
    fields: &[CompiledField<'_>],
    resolver: &IdentityResolver<'_>,
) -> Result<Accumulated> {
    let entries = walk(source, patterns)?;
    info!(candidates = entries.len(), "source walk complete");
    accumulate(source, &entries, fields, resolver)
}

/// Build records for the given entries.
///
/// Sheets that cannot be loaded are logged and skipped. Sheets that yield no
/// field, participant or event are dropped. A participant id mismatch in a
/// linked-study path aborts accumulation.
pub fn accumulate<S: FileSource + ?Sized>(
    source: &S,
    entries: &[SourceEntry],
    fields: &[CompiledField<'_>],
    resolver: &IdentityResolver<'_>,
) -> Result<Accumulated> {
    let mut accumulated = Accumulated::default();
    accumulated.stats.candidates = entries.len();

    for entry in entries {
        let grid = match source.open_grid(entry) {
            Ok(grid) => grid,
            Err(error) => {
                warn!(path = %entry.path, %error, "cannot process spreadsheet");
                accumulated.stats.unreadable += 1;
                continue;
            }
        };
        if grid.is_empty() {
            debug!(path = %entry.path, "empty spreadsheet");
            accumulated.stats.empty_sheets += 1;
            continue;
        }

        let hint = source.identity_hint(entry);
        let identity = resolver.resolve(&hint, &entry.name)?;
        let record = ExtractedRecord {
            source: entry.path.clone(),
            participant_id: identity.participant_id.map(|id| id.to_string()),
            event_label: identity.event_label,
            fields: extract_fields(&grid, fields, &entry.path),
        };
        if record.is_empty() {
            accumulated.stats.empty_records += 1;
            continue;
        }
        info!(path = %entry.path, fields = record.fields.len(), "processed spreadsheet");
        accumulated.records.push(record);
    }

    accumulated.stats.records = accumulated.records.len();
    Ok(accumulated)
}
