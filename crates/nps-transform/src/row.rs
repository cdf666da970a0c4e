use std::collections::BTreeMap;

use nps_model::{EventLabel, FieldValue, ParticipantId, VisitModality};

/// Participant + event key of a visit row.
pub type VisitKey = (ParticipantId, EventLabel);

/// A record whose participant and event are resolved and normalized.
#[derive(Debug, Clone, PartialEq)]
pub struct VisitRow {
    pub participant_id: ParticipantId,
    pub event_label: EventLabel,
    pub source: String,
    /// Modality recorded for this visit in the records system, if known.
    pub modality: Option<VisitModality>,
    /// Present column values keyed by output column name.
    pub values: BTreeMap<String, FieldValue>,
}

impl VisitRow {
    pub fn key(&self) -> VisitKey {
        (self.participant_id.clone(), self.event_label.clone())
    }

    pub fn value(&self, column: &str) -> Option<&FieldValue> {
        self.values.get(column)
    }
}
