//! Reconciliation of harvested records against the records system.
//!
//! Harvested records are keyed, deduplicated and reshaped, then restricted
//! to visits whose forms are complete in the primary study's records.

use std::collections::BTreeSet;

use nps_model::{
    ExternalRecord, ExternalTable, FieldMap, ParticipantId, PrefixGroup, RecordSet,
    ReconcileOptions,
};
use tracing::{debug, info};

use crate::dedupe::dedupe_by_key;
use crate::error::{Result, TransformError};
use crate::reshape::{coerce_integers, integer_columns, split_visit_specific};
use crate::row::{VisitKey, VisitRow};

/// Counts of rows removed at each reconciliation step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileStats {
    pub input: usize,
    pub unresolved_event: usize,
    pub unresolved_participant: usize,
    pub duplicates: usize,
    pub not_complete: usize,
    pub output: usize,
}

/// Reshaped rows for complete visits, sorted by participant and visit.
#[derive(Debug, Clone, Default)]
pub struct Reconciled {
    pub rows: Vec<VisitRow>,
    pub stats: ReconcileStats,
}

/// Inputs shared by the reconciliation steps.
#[derive(Debug, Clone, Copy)]
pub struct ReconcileContext<'a> {
    pub field_map: &'a FieldMap,
    pub groups: &'a [PrefixGroup],
    pub options: &'a ReconcileOptions,
    pub participant_prefix: &'a str,
}

/// Run every reconciliation step over the accumulated records.
pub fn reconcile(
    records: RecordSet,
    external: &ExternalTable,
    ctx: &ReconcileContext<'_>,
) -> Result<Reconciled> {
    let mut stats = ReconcileStats {
        input: records.len(),
        ..ReconcileStats::default()
    };

    let (rows, unresolved_event, unresolved_participant) =
        resolve_keys(records, ctx.participant_prefix)?;
    stats.unresolved_event = unresolved_event;
    stats.unresolved_participant = unresolved_participant;

    let (mut rows, duplicates) = dedupe_by_key(rows);
    stats.duplicates = duplicates;

    attach_modalities(&mut rows, external);
    split_visit_specific(&mut rows, ctx.groups, &ctx.options.baseline_event);
    coerce_integers(&mut rows, &integer_columns(ctx.field_map, ctx.groups));

    let eligible = eligible_keys(external, ctx.options);
    let (mut rows, not_complete) = join_eligible(rows, &eligible);
    stats.not_complete = not_complete;

    sort_rows(&mut rows);
    stats.output = rows.len();
    info!(
        input = stats.input,
        unresolved_event = stats.unresolved_event,
        unresolved_participant = stats.unresolved_participant,
        duplicates = stats.duplicates,
        not_complete = stats.not_complete,
        output = stats.output,
        "reconciliation complete"
    );
    Ok(Reconciled { rows, stats })
}

/// Key records by normalized participant and event.
///
/// Records lacking either are dropped and counted. A participant id that
/// cannot be normalized is an error.
pub fn resolve_keys(
    records: RecordSet,
    participant_prefix: &str,
) -> Result<(Vec<VisitRow>, usize, usize)> {
    let mut rows = Vec::with_capacity(records.len());
    let (mut no_event, mut no_participant) = (0usize, 0usize);
    for record in records {
        let Some(event_label) = record.event_label else {
            debug!(source = %record.source, "dropping record without event");
            no_event += 1;
            continue;
        };
        let Some(raw) = record.participant_id else {
            debug!(source = %record.source, "dropping record without participant");
            no_participant += 1;
            continue;
        };
        let participant_id = ParticipantId::normalize(&raw, participant_prefix).map_err(
            |source| TransformError::Normalize {
                source_path: record.source.clone(),
                source,
            },
        )?;
        rows.push(VisitRow {
            participant_id,
            event_label,
            source: record.source,
            modality: None,
            values: record.fields,
        });
    }
    Ok((rows, no_event, no_participant))
}

/// Record each row's visit modality from the records system.
pub fn attach_modalities(rows: &mut [VisitRow], external: &ExternalTable) {
    for row in rows.iter_mut() {
        row.modality = external
            .get(&row.participant_id, &row.event_label)
            .and_then(ExternalRecord::visit_modality);
    }
}

/// Whether a records-system row counts as a complete visit.
///
/// The header form must be complete, and so must every form of at least
/// one phase checklist applicable to the row's event.
pub fn is_complete_visit(record: &ExternalRecord, options: &ReconcileOptions) -> bool {
    if !record.is_complete(&options.header_flag) {
        return false;
    }
    let is_baseline = record.event_label.as_str() == options.baseline_event;
    options
        .phases
        .iter()
        .filter(|phase| phase.scope.applies(is_baseline))
        .any(|phase| phase.flags.iter().all(|flag| record.is_complete(flag)))
}

/// Keys of every complete visit in the records system.
pub fn eligible_keys(external: &ExternalTable, options: &ReconcileOptions) -> BTreeSet<VisitKey> {
    external
        .rows()
        .iter()
        .filter(|record| is_complete_visit(record, options))
        .map(|record| (record.participant_id.clone(), record.event_label.clone()))
        .collect()
}

/// Keep rows whose key is eligible; returns the kept rows and the drop count.
pub fn join_eligible(rows: Vec<VisitRow>, eligible: &BTreeSet<VisitKey>) -> (Vec<VisitRow>, usize) {
    let before = rows.len();
    let kept: Vec<VisitRow> = rows
        .into_iter()
        .filter(|row| {
            let keep = eligible.contains(&row.key());
            if !keep {
                debug!(
                    participant = %row.participant_id,
                    event = %row.event_label,
                    "visit not complete in records system"
                );
            }
            keep
        })
        .collect();
    let dropped = before - kept.len();
    (kept, dropped)
}

fn sort_rows(rows: &mut [VisitRow]) {
    rows.sort_by(|a, b| {
        a.participant_id
            .cmp(&b.participant_id)
            .then_with(|| {
                a.event_label
                    .visit_number()
                    .cmp(&b.event_label.visit_number())
            })
            .then_with(|| a.event_label.cmp(&b.event_label))
    });
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use nps_model::{EventLabel, ExtractedRecord, FieldValue};

    use super::*;

    fn external(ptid: &str, visit: u32, flags: &[&str]) -> ExternalRecord {
        ExternalRecord {
            participant_id: ParticipantId::parse(ptid).unwrap(),
            event_label: EventLabel::visit(visit),
            values: flags
                .iter()
                .map(|flag| ((*flag).to_string(), "2".to_string()))
                .collect(),
        }
    }

    fn ivp_flags() -> Vec<String> {
        let options = ReconcileOptions::default();
        let mut flags = vec![options.header_flag.clone()];
        flags.extend(options.phases[0].flags.iter().cloned());
        flags
    }

    #[test]
    fn header_and_one_full_phase_required() {
        let options = ReconcileOptions::default();
        let flags = ivp_flags();
        let all: Vec<&str> = flags.iter().map(String::as_str).collect();
        assert!(is_complete_visit(&external("UM00000456", 1, &all), &options));

        let without_header: Vec<&str> = all[1..].to_vec();
        assert!(!is_complete_visit(
            &external("UM00000456", 1, &without_header),
            &options
        ));

        let partial: Vec<&str> = all[..all.len() - 1].to_vec();
        assert!(!is_complete_visit(&external("UM00000456", 1, &partial), &options));
    }

    #[test]
    fn phase_scope_limits_events() {
        let mut options = ReconcileOptions::default();
        options.phases[0].scope = nps_model::PhaseScope::Baseline;
        let flags = ivp_flags();
        let all: Vec<&str> = flags.iter().map(String::as_str).collect();
        assert!(is_complete_visit(&external("UM00000456", 1, &all), &options));
        assert!(!is_complete_visit(&external("UM00000456", 2, &all), &options));
    }

    #[test]
    fn unresolved_records_are_counted() {
        let record = |participant: Option<&str>, event: Option<u32>| ExtractedRecord {
            source: "s".into(),
            participant_id: participant.map(String::from),
            event_label: event.map(EventLabel::visit),
            fields: BTreeMap::from([("x".to_string(), FieldValue::Int(1))]),
        };
        let (rows, no_event, no_participant) = resolve_keys(
            vec![
                record(Some("456"), Some(1)),
                record(None, Some(1)),
                record(Some("456"), None),
            ],
            "UM",
        )
        .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].participant_id.as_str(), "UM00000456");
        assert_eq!((no_event, no_participant), (1, 1));
    }

    #[test]
    fn malformed_participant_is_fatal() {
        let record = ExtractedRecord {
            source: "bad.xlsx".into(),
            participant_id: Some("45".into()),
            event_label: Some(EventLabel::visit(1)),
            fields: BTreeMap::new(),
        };
        let err = resolve_keys(vec![record], "UM").unwrap_err();
        assert!(matches!(err, TransformError::Normalize { .. }));
        assert!(err.to_string().contains("bad.xlsx"));
    }
}
