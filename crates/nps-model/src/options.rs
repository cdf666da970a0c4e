//! Options controlling identity resolution and reconciliation.

use serde::{Deserialize, Serialize};

use crate::{DEFAULT_PARTICIPANT_PREFIX, VisitModality};

/// Options for resolving a spreadsheet's participant and event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentityOptions {
    /// Path substring selecting the linked-study identity scheme.
    pub linked_marker: String,
    /// Two-letter prefix of canonical participant ids.
    pub participant_prefix: String,
    /// Linked-study column holding the primary-study visit number.
    pub linked_visit_column: String,
}

impl Default for IdentityOptions {
    fn default() -> Self {
        Self {
            linked_marker: "ELECTRA".to_string(),
            participant_prefix: DEFAULT_PARTICIPANT_PREFIX.to_string(),
            linked_visit_column: "ummap_visit_number".to_string(),
        }
    }
}

/// Events a phase checklist may satisfy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseScope {
    #[default]
    Any,
    Baseline,
    FollowUp,
}

impl PhaseScope {
    pub fn applies(self, is_baseline: bool) -> bool {
        match self {
            Self::Any => true,
            Self::Baseline => is_baseline,
            Self::FollowUp => !is_baseline,
        }
    }
}

/// Forms that must all be complete for a visit phase to count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseChecklist {
    pub modality: VisitModality,
    #[serde(default)]
    pub scope: PhaseScope,
    pub flags: Vec<String>,
}

impl PhaseChecklist {
    fn from_forms(modality: VisitModality, packet: &str, forms: &[&str]) -> Self {
        Self {
            modality,
            scope: PhaseScope::Any,
            flags: forms
                .iter()
                .map(|form| format!("{packet}_{form}_complete"))
                .collect(),
        }
    }

    /// Checklists of the in-person initial, in-person follow-up and telephone packets.
    pub fn defaults() -> Vec<Self> {
        vec![
            Self::from_forms(
                VisitModality::InPersonInitial,
                "ivp",
                &[
                    "a1", "a2", "a3", "a4", "a5", "b1", "b4", "b5", "b6", "b7", "b8", "b9", "d1",
                    "d2",
                ],
            ),
            Self::from_forms(
                VisitModality::InPersonFollowUp,
                "fvp",
                &[
                    "a1", "a2", "a3", "a4", "b1", "b4", "b5", "b6", "b7", "b8", "b9", "d1", "d2",
                ],
            ),
            Self::from_forms(
                VisitModality::TeleFollowUp,
                "tvp",
                &["a1", "a2", "a3", "a4", "b4", "b5", "b9", "d1", "d2"],
            ),
        ]
    }
}

/// Visit-specific fields renamed with `prefix` at follow-up visits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrefixGroup {
    pub prefix: String,
    /// Modality of follow-up visits this group claims.
    pub modality: Option<VisitModality>,
    #[serde(default)]
    pub fields: Vec<String>,
}

impl PrefixGroup {
    pub fn new(prefix: impl Into<String>, modality: Option<VisitModality>) -> Self {
        Self {
            prefix: prefix.into(),
            modality,
            fields: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn column(&self, field: &str) -> String {
        format!("{}{field}", self.prefix)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.iter().any(|f| f == field)
    }
}

/// Options for the reshape and reconcile stages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconcileOptions {
    pub baseline_event: String,
    pub header_flag: String,
    pub phases: Vec<PhaseChecklist>,
    /// Columns removed from the final table when present.
    pub drop_columns: Vec<String>,
}

impl Default for ReconcileOptions {
    fn default() -> Self {
        Self {
            baseline_event: "visit_1_arm_1".to_string(),
            header_flag: "header_complete".to_string(),
            phases: PhaseChecklist::defaults(),
            drop_columns: default_drop_columns(),
        }
    }
}

/// Columns collected at video visits that the telephone packet does not define.
pub fn default_drop_columns() -> Vec<String> {
    [
        "otraila",
        "otrlarr",
        "vnttotw",
        "vntpcnc",
        "otrailb",
        "otrlbrr",
        "tele_animals_c2",
        "tele_animals_c2z",
        "tele_craftdrez",
        "tele_craftdvrz",
        "tele_craftparaz",
        "tele_craftvrsz",
        "tele_digbacctz",
        "tele_digbacspanz",
        "tele_digforctz",
        "tele_digforspanz",
        "tele_mintpcngz",
        "tele_minttots",
        "tele_minttotsz",
        "tele_mocatots",
        "tele_mocaz",
        "tele_udsverfcz",
        "tele_udsverlcz",
        "tele_udsbentc",
        "tele_udsbentcz",
        "tele_udsbentd",
        "tele_udsbentdz",
        "tele_veg_c2",
        "tele_veg_c2z",
        "tele_npiq_score",
        "tele_fas_score",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}
