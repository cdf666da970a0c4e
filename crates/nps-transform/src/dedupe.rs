use std::collections::BTreeSet;

use tracing::warn;

use crate::row::VisitRow;

/// Keep the first row of each (participant, event) key, in traversal order.
///
/// Returns the kept rows and the number of duplicates removed.
pub fn dedupe_by_key(rows: Vec<VisitRow>) -> (Vec<VisitRow>, usize) {
    let mut seen = BTreeSet::new();
    let mut kept = Vec::with_capacity(rows.len());
    let mut dropped = 0usize;
    for row in rows {
        if seen.insert(row.key()) {
            kept.push(row);
        } else {
            warn!(
                participant = %row.participant_id,
                event = %row.event_label,
                source = %row.source,
                "duplicate sheet for participant visit ignored"
            );
            dropped += 1;
        }
    }
    (kept, dropped)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use nps_model::{EventLabel, ParticipantId};

    use super::*;

    fn row(ptid: &str, visit: u32, source: &str) -> VisitRow {
        VisitRow {
            participant_id: ParticipantId::parse(ptid).unwrap(),
            event_label: EventLabel::visit(visit),
            source: source.to_string(),
            modality: None,
            values: BTreeMap::new(),
        }
    }

    #[test]
    fn first_row_wins() {
        let (kept, dropped) = dedupe_by_key(vec![
            row("UM00000456", 1, "a"),
            row("UM00000456", 2, "b"),
            row("UM00000456", 1, "c"),
        ]);
        assert_eq!(dropped, 1);
        let sources: Vec<&str> = kept.iter().map(|r| r.source.as_str()).collect();
        assert_eq!(sources, vec!["a", "b"]);
    }
}
