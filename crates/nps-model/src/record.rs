use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{EventLabel, FieldValue};

/// One row built from one successfully loaded spreadsheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedRecord {
    /// Path or identifier of the source spreadsheet.
    pub source: String,
    /// Participant id resolved from the path, already normalized.
    pub participant_id: Option<String>,
    pub event_label: Option<EventLabel>,
    /// Present values only; a missing field has no entry.
    pub fields: BTreeMap<String, FieldValue>,
}

impl ExtractedRecord {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            participant_id: None,
            event_label: None,
            fields: BTreeMap::new(),
        }
    }

    pub fn field(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    /// True when no field, participant or event could be resolved.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.participant_id.is_none() && self.event_label.is_none()
    }
}

/// Records in source traversal order.
pub type RecordSet = Vec<ExtractedRecord>;
