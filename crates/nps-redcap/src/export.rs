//! Cleaning of exported records into an [`ExternalTable`].

use tracing::{debug, info};

use nps_model::{
    EVENT_COLUMN, EventLabel, ExternalRecord, ExternalTable, PARTICIPANT_COLUMN, ParticipantId,
};

use crate::client::RawRecord;

/// Column that must be non-empty for an exported row to count.
pub const FORM_DATE_COLUMN: &str = "form_date";

/// Keep rows with a canonical `participant_prefix` id, a visit or linked
/// visit event and a form date; index them by (participant, event).
pub fn clean_export(rows: Vec<RawRecord>, participant_prefix: &str) -> ExternalTable {
    let total = rows.len();
    let kept: Vec<ExternalRecord> = rows
        .into_iter()
        .filter_map(|row| clean_row(row, participant_prefix))
        .collect();
    info!(exported = total, kept = kept.len(), "cleaned records export");
    ExternalTable::new(kept)
}

fn clean_row(mut row: RawRecord, participant_prefix: &str) -> Option<ExternalRecord> {
    let raw_id = row.remove(PARTICIPANT_COLUMN)?;
    let raw_event = row.remove(EVENT_COLUMN)?;

    let participant_id = ParticipantId::parse(raw_id.trim())
        .ok()
        .filter(|id| id.as_str().starts_with(participant_prefix));
    let event_label = EventLabel::new(raw_event.trim());
    let dated = row
        .get(FORM_DATE_COLUMN)
        .is_some_and(|date| !date.trim().is_empty());

    match participant_id {
        Some(participant_id) if dated && (event_label.is_visit() || event_label.is_linked_visit()) => {
            Some(ExternalRecord {
                participant_id,
                event_label,
                values: row,
            })
        }
        _ => {
            debug!(ptid = %raw_id, event = %raw_event, "skipping exported row");
            None
        }
    }
}
