#![deny(unsafe_code)]

use std::fmt;

use crate::ModelError;

/// Number of digits following the two-letter prefix of a canonical id.
pub const PARTICIPANT_DIGITS: usize = 8;

/// Prefix used by the primary study when none is configured.
pub const DEFAULT_PARTICIPANT_PREFIX: &str = "UM";

/// Canonical participant identifier: two uppercase letters followed by eight digits.
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct ParticipantId(String);

impl ParticipantId {
    /// Normalize a raw identifier into canonical form.
    ///
    /// Canonical input is returned unchanged. A run of 3 or 4 digits is
    /// left-padded with zeros and given `prefix`. Anything else is rejected.
    pub fn normalize(raw: &str, prefix: &str) -> Result<Self, ModelError> {
        let raw = raw.trim();
        if is_canonical(raw) {
            return Ok(Self(raw.to_string()));
        }
        if !is_prefix(prefix) {
            return Err(ModelError::InvalidPrefix(prefix.to_string()));
        }
        if (3..=4).contains(&raw.len()) && raw.bytes().all(|b| b.is_ascii_digit()) {
            return Ok(Self(format!(
                "{prefix}{raw:0>width$}",
                width = PARTICIPANT_DIGITS
            )));
        }
        Err(ModelError::InvalidParticipantId(raw.to_string()))
    }

    /// Wrap a value that is already canonical.
    pub fn parse(value: &str) -> Result<Self, ModelError> {
        if is_canonical(value) {
            Ok(Self(value.to_string()))
        } else {
            Err(ModelError::InvalidParticipantId(value.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Returns true if `value` matches `[A-Z]{2}\d{8}`.
pub fn is_canonical(value: &str) -> bool {
    let bytes = value.as_bytes();
    bytes.len() == 2 + PARTICIPANT_DIGITS
        && bytes[..2].iter().all(u8::is_ascii_uppercase)
        && bytes[2..].iter().all(u8::is_ascii_digit)
}

fn is_prefix(prefix: &str) -> bool {
    prefix.len() == 2 && prefix.bytes().all(|b| b.is_ascii_uppercase())
}

/// Study event (visit) label, e.g. `visit_2_arm_1`.
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(transparent)]
pub struct EventLabel(String);

impl EventLabel {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Event label of a primary-study visit.
    pub fn visit(number: u32) -> Self {
        Self(format!("visit_{number}_arm_1"))
    }

    /// Provisional event label of a linked-study visit, before translation.
    pub fn linked_visit(number: u32) -> Self {
        Self(format!("sv{number}_arm_1"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true for primary-study visit labels (`visit_N_arm_1`).
    pub fn is_visit(&self) -> bool {
        matches_numbered(&self.0, "visit_")
    }

    /// Returns true for linked-study visit labels (`svN_arm_1`).
    pub fn is_linked_visit(&self) -> bool {
        matches_numbered(&self.0, "sv")
    }

    /// Visit number of a primary-study label, used for ordering.
    pub fn visit_number(&self) -> Option<u32> {
        numbered_part(&self.0, "visit_")?.parse().ok()
    }
}

fn numbered_part<'a>(value: &'a str, prefix: &str) -> Option<&'a str> {
    value
        .strip_prefix(prefix)
        .and_then(|rest| rest.strip_suffix("_arm_1"))
        .filter(|digits| !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()))
}

fn matches_numbered(value: &str, prefix: &str) -> bool {
    numbered_part(value, prefix).is_some()
}

impl fmt::Display for EventLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EventLabel {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}
