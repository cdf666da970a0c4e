//! Rows exported from the clinical records system.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{EventLabel, ParticipantId};

/// Encoded value the records system uses for a completed form.
pub const COMPLETE: &str = "2";

/// Export column holding the participant id.
pub const PARTICIPANT_COLUMN: &str = "ptid";

/// Export column holding the event label.
pub const EVENT_COLUMN: &str = "redcap_event_name";

/// Visit modality of a records-system event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VisitModality {
    InPersonInitial,
    InPersonFollowUp,
    TeleFollowUp,
}

impl VisitModality {
    pub const ALL: [Self; 3] = [
        Self::InPersonInitial,
        Self::InPersonFollowUp,
        Self::TeleFollowUp,
    ];

    /// Completion flag of the first form in this modality's packet.
    pub const fn marker_flag(self) -> &'static str {
        match self {
            Self::InPersonInitial => "ivp_a1_complete",
            Self::InPersonFollowUp => "fvp_a1_complete",
            Self::TeleFollowUp => "tvp_a1_complete",
        }
    }

    pub const fn code(self) -> &'static str {
        match self {
            Self::InPersonInitial => "II",
            Self::InPersonFollowUp => "IF",
            Self::TeleFollowUp => "TF",
        }
    }
}

impl fmt::Display for VisitModality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// One participant + event row of the records system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalRecord {
    pub participant_id: ParticipantId,
    pub event_label: EventLabel,
    /// Remaining exported columns, raw encoded values.
    pub values: BTreeMap<String, String>,
}

impl ExternalRecord {
    pub fn value(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    pub fn is_complete(&self, flag: &str) -> bool {
        self.value(flag) == Some(COMPLETE)
    }

    /// Modality of the visit, judged by which packet's first form is complete.
    ///
    /// Later modalities win when more than one marker is set.
    pub fn visit_modality(&self) -> Option<VisitModality> {
        VisitModality::ALL
            .into_iter()
            .rev()
            .find(|modality| self.is_complete(modality.marker_flag()))
    }
}

/// Exported records keyed by (participant, event).
#[derive(Debug, Clone, Default)]
pub struct ExternalTable {
    rows: Vec<ExternalRecord>,
    index: BTreeMap<(ParticipantId, EventLabel), usize>,
}

impl ExternalTable {
    /// Build a table; later duplicates of a key are ignored.
    pub fn new(rows: Vec<ExternalRecord>) -> Self {
        let mut index = BTreeMap::new();
        let mut kept = Vec::with_capacity(rows.len());
        for row in rows {
            let key = (row.participant_id.clone(), row.event_label.clone());
            if index.contains_key(&key) {
                continue;
            }
            index.insert(key, kept.len());
            kept.push(row);
        }
        Self { rows: kept, index }
    }

    pub fn get(&self, participant: &ParticipantId, event: &EventLabel) -> Option<&ExternalRecord> {
        self.index
            .get(&(participant.clone(), event.clone()))
            .map(|&idx| &self.rows[idx])
    }

    pub fn rows(&self) -> &[ExternalRecord] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
