//! Column reshaping for visit-specific fields.
//!
//! Fields collected at every visit keep their base name at the baseline
//! visit and move to a prefixed column (e.g. `fu_`, `tele_`) at follow-up
//! visits, so baseline and follow-up values land in distinct import fields.

use std::collections::BTreeSet;

use nps_model::{FieldMap, FieldValue, PrefixGroup, VisitModality};
use tracing::warn;

use crate::row::VisitRow;

/// Move follow-up values of visit-specific fields into prefixed columns.
///
/// Each non-baseline row sends a field to the group whose modality matches
/// the row's visit modality, falling back to the first group listing the
/// field. Base and prefixed columns are never both set on one row, and
/// applying the split again changes nothing.
pub fn split_visit_specific(rows: &mut [VisitRow], groups: &[PrefixGroup], baseline_event: &str) {
    let fields = visit_specific_fields(groups);
    for row in rows.iter_mut() {
        if row.event_label.as_str() == baseline_event {
            continue;
        }
        for field in &fields {
            let Some(group) = claiming_group(groups, field, row.modality) else {
                continue;
            };
            if let Some(value) = row.values.remove(*field) {
                row.values.insert(group.column(field), value);
            }
        }
    }
}

fn visit_specific_fields(groups: &[PrefixGroup]) -> Vec<&str> {
    let mut seen = BTreeSet::new();
    groups
        .iter()
        .flat_map(|group| group.fields.iter().map(String::as_str))
        .filter(|field| seen.insert(*field))
        .collect()
}

fn claiming_group<'g>(
    groups: &'g [PrefixGroup],
    field: &str,
    modality: Option<VisitModality>,
) -> Option<&'g PrefixGroup> {
    let mut listing = groups.iter().filter(|group| group.contains(field));
    let fallback = listing.clone().next();
    modality
        .and_then(|modality| listing.find(|group| group.modality == Some(modality)))
        .or(fallback)
}

/// Integer-typed columns: int fields plus their prefixed variants.
pub fn integer_columns(field_map: &FieldMap, groups: &[PrefixGroup]) -> BTreeSet<String> {
    let mut columns = BTreeSet::new();
    for field in field_map.int_fields() {
        columns.insert(field.to_string());
        for group in groups.iter().filter(|group| group.contains(field)) {
            columns.insert(group.column(field));
        }
    }
    columns
}

/// Re-coerce integer columns; values with no integer reading become absent.
pub fn coerce_integers(rows: &mut [VisitRow], columns: &BTreeSet<String>) {
    for row in rows.iter_mut() {
        for column in columns {
            let Some(value) = row.values.get(column) else {
                continue;
            };
            if matches!(value, FieldValue::Int(_)) {
                continue;
            }
            match value.as_i64() {
                Some(int) => {
                    row.values.insert(column.clone(), FieldValue::Int(int));
                }
                None => {
                    warn!(
                        source = %row.source,
                        column = %column,
                        value = %value,
                        "value is not an integer"
                    );
                    row.values.remove(column);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use nps_model::{DType, EventLabel, FieldSpec, ParticipantId};

    use super::*;

    fn groups() -> Vec<PrefixGroup> {
        vec![
            PrefixGroup::new("fu_", Some(VisitModality::InPersonFollowUp))
                .with_fields(["mocatots", "craftvrs"]),
            PrefixGroup::new("tele_", Some(VisitModality::TeleFollowUp))
                .with_fields(["mocatots", "digforct"]),
        ]
    }

    fn row(visit: u32, modality: Option<VisitModality>) -> VisitRow {
        VisitRow {
            participant_id: ParticipantId::parse("UM00000456").unwrap(),
            event_label: EventLabel::visit(visit),
            source: "sheet".to_string(),
            modality,
            values: BTreeMap::from([
                ("mocatots".to_string(), FieldValue::Int(26)),
                ("craftvrs".to_string(), FieldValue::Int(18)),
                ("digforct".to_string(), FieldValue::Int(8)),
                ("otraila".to_string(), FieldValue::Int(30)),
            ]),
        }
    }

    fn columns(row: &VisitRow) -> Vec<&str> {
        row.values.keys().map(String::as_str).collect()
    }

    #[test]
    fn baseline_keeps_base_names() {
        let mut rows = vec![row(1, Some(VisitModality::InPersonInitial))];
        split_visit_specific(&mut rows, &groups(), "visit_1_arm_1");
        assert_eq!(
            columns(&rows[0]),
            vec!["craftvrs", "digforct", "mocatots", "otraila"]
        );
    }

    #[test]
    fn follow_up_routes_by_modality() {
        let mut rows = vec![
            row(2, Some(VisitModality::InPersonFollowUp)),
            row(3, Some(VisitModality::TeleFollowUp)),
            row(4, None),
        ];
        split_visit_specific(&mut rows, &groups(), "visit_1_arm_1");

        assert_eq!(
            columns(&rows[0]),
            vec!["fu_craftvrs", "fu_mocatots", "otraila", "tele_digforct"]
        );
        assert_eq!(
            columns(&rows[1]),
            vec!["fu_craftvrs", "otraila", "tele_digforct", "tele_mocatots"]
        );
        assert_eq!(
            columns(&rows[2]),
            vec!["fu_craftvrs", "fu_mocatots", "otraila", "tele_digforct"]
        );
    }

    #[test]
    fn split_is_idempotent() {
        let mut once = vec![row(2, Some(VisitModality::TeleFollowUp)), row(1, None)];
        split_visit_specific(&mut once, &groups(), "visit_1_arm_1");
        let mut twice = once.clone();
        split_visit_specific(&mut twice, &groups(), "visit_1_arm_1");
        assert_eq!(once, twice);
    }

    #[test]
    fn integer_columns_include_prefixed_variants() {
        let mut map = FieldMap::new();
        map.insert("mocatots", FieldSpec::new("MoCA", 0, 1, DType::Int));
        map.insert("craftvrs", FieldSpec::new("Craft", 0, 1, DType::Float));
        let columns = integer_columns(&map, &groups());
        let names: Vec<&str> = columns.iter().map(String::as_str).collect();
        assert_eq!(names, vec!["fu_mocatots", "mocatots", "tele_mocatots"]);
    }

    #[test]
    fn integer_coercion_keeps_absent_values_absent() {
        let mut r = row(1, None);
        r.values.insert("mocatots".into(), FieldValue::Float(26.0));
        r.values.insert("fu_mocatots".into(), FieldValue::Text("n/a".into()));
        r.values.remove("craftvrs");
        let mut rows = vec![r];
        let columns = BTreeSet::from([
            "mocatots".to_string(),
            "fu_mocatots".to_string(),
            "craftvrs".to_string(),
        ]);
        coerce_integers(&mut rows, &columns);
        assert_eq!(rows[0].value("mocatots"), Some(&FieldValue::Int(26)));
        assert_eq!(rows[0].value("fu_mocatots"), None);
        assert_eq!(rows[0].value("craftvrs"), None);
    }
}
