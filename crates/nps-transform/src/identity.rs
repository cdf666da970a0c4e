//! Participant and visit resolution from spreadsheet paths.
//!
//! Two naming conventions coexist in the source tree. Sheets of the primary
//! study carry a short participant number in the file name and the visit in
//! a `Visit N` directory. Sheets of the linked study sit under a directory
//! whose name contains the linked-study marker, repeat a 4-digit participant
//! number in both their directory and file names, and number visits in the
//! linked study's own sequence, which must be translated through the linked
//! study's records.

use std::sync::LazyLock;

use regex::Regex;
use tracing::warn;

use nps_model::{EventLabel, ExternalTable, IdentityOptions, ParticipantId};

use crate::error::{Result, TransformError};

/// Leading 3-4 digit participant number of a primary-study file name.
static DIRECT_ID_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{3,4})\D*[Ss]cor").expect("Invalid direct participant id regex")
});

/// Directory and file copies of a linked-study participant number.
static LINKED_ID_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[/\\][A-Za-z]{2}\d{6}\s*-\s*(\d{4})[/\\][A-Za-z]{2}\d{6}_(\d{4})")
        .expect("Invalid linked participant id regex")
});

static VISIT_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Visit\s*(\d+)").expect("Invalid visit regex"));

/// Naming convention a spreadsheet follows, decided once per file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityScheme {
    /// Primary study: event label follows directly from the visit number.
    Direct,
    /// Linked study: event label is looked up in the linked study's records.
    Linked,
}

impl IdentityScheme {
    pub fn detect(hint: &str, options: &IdentityOptions) -> Self {
        if !options.linked_marker.is_empty() && hint.contains(&options.linked_marker) {
            Self::Linked
        } else {
            Self::Direct
        }
    }
}

/// Participant and event resolved for one spreadsheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub scheme: IdentityScheme,
    pub participant_id: Option<ParticipantId>,
    pub visit: Option<u32>,
    pub event_label: Option<EventLabel>,
}

/// Resolves identities against the linked study's records.
#[derive(Debug, Clone)]
pub struct IdentityResolver<'a> {
    options: &'a IdentityOptions,
    linked: &'a ExternalTable,
}

impl<'a> IdentityResolver<'a> {
    pub fn new(options: &'a IdentityOptions, linked: &'a ExternalTable) -> Self {
        Self { options, linked }
    }

    /// Resolve participant and event from a path hint and file name.
    ///
    /// Unparseable identifiers are logged and left unresolved. Disagreeing
    /// linked-study participant numbers are an error.
    pub fn resolve(&self, hint: &str, name: &str) -> Result<Identity> {
        let scheme = IdentityScheme::detect(hint, self.options);
        let participant_id = match scheme {
            IdentityScheme::Direct => self.direct_participant(hint, name),
            IdentityScheme::Linked => self.linked_participant(hint)?,
        };
        let visit = visit_number(hint);
        let event_label = match scheme {
            IdentityScheme::Direct => visit.map(EventLabel::visit),
            IdentityScheme::Linked => match (&participant_id, visit) {
                (Some(participant), Some(visit)) => self.linked_event(participant, visit, hint),
                _ => None,
            },
        };
        Ok(Identity {
            scheme,
            participant_id,
            visit,
            event_label,
        })
    }

    fn direct_participant(&self, hint: &str, name: &str) -> Option<ParticipantId> {
        let Some(captures) = DIRECT_ID_REGEX.captures(name) else {
            warn!(path = hint, "no participant number in file name");
            return None;
        };
        self.normalize(&captures[1], hint)
    }

    fn linked_participant(&self, hint: &str) -> Result<Option<ParticipantId>> {
        let Some(captures) = LINKED_ID_REGEX.captures(hint) else {
            warn!(path = hint, "no linked-study participant number in path");
            return Ok(None);
        };
        let (directory, file) = (&captures[1], &captures[2]);
        if directory != file {
            return Err(TransformError::IdentityMismatch {
                path: hint.to_string(),
                directory: directory.to_string(),
                file: file.to_string(),
            });
        }
        Ok(self.normalize(directory, hint))
    }

    fn normalize(&self, raw: &str, hint: &str) -> Option<ParticipantId> {
        ParticipantId::normalize(raw, &self.options.participant_prefix)
            .inspect_err(|error| warn!(path = hint, %error, "unusable participant number"))
            .ok()
    }

    fn linked_event(&self, participant: &ParticipantId, visit: u32, hint: &str) -> Option<EventLabel> {
        let provisional = EventLabel::linked_visit(visit);
        let Some(row) = self.linked.get(participant, &provisional) else {
            warn!(
                path = hint,
                participant = %participant,
                event = %provisional,
                "no linked-study record for visit"
            );
            return None;
        };
        let raw = row.value(&self.options.linked_visit_column)?.trim();
        match raw.parse::<u32>() {
            Ok(number) => Some(EventLabel::visit(number)),
            Err(error) => {
                warn!(path = hint, value = raw, %error, "unusable linked visit number");
                None
            }
        }
    }
}

/// Digits following the last `Visit` token of a path.
pub fn visit_number(hint: &str) -> Option<u32> {
    let Some(captures) = VISIT_REGEX.captures_iter(hint).last() else {
        warn!(path = hint, "no visit number in path");
        return None;
    };
    captures[1]
        .parse()
        .inspect_err(|error| warn!(path = hint, %error, "unusable visit number"))
        .ok()
}
