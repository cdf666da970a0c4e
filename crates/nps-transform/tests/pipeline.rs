//! End-to-end tests from a source tree to the output table.

use std::collections::BTreeMap;

use nps_ingest::{EntryKind, FileSource, Grid, IngestError, SourceEntry, WalkPatterns};
use nps_model::{
    DType, EventLabel, ExternalRecord, ExternalTable, FieldMap, FieldSpec, IdentityOptions,
    ParticipantId, PrefixGroup, ReconcileOptions, VisitModality,
};
use nps_transform::{
    IdentityResolver, OutputSchema, ReconcileContext, TransformError, build_frame, frame_to_csv,
    harvest, reconcile, write_output,
};

const ROOT: &str = "/box";

/// Source tree held in memory, keyed by slash-separated file path.
#[derive(Default)]
struct MemorySource {
    files: BTreeMap<String, Vec<Vec<&'static str>>>,
}

impl MemorySource {
    fn with(mut self, path: &str, rows: Vec<Vec<&'static str>>) -> Self {
        self.files.insert(format!("{ROOT}/{path}"), rows);
        self
    }
}

impl FileSource for MemorySource {
    fn root(&self) -> SourceEntry {
        SourceEntry::new("box", ROOT, EntryKind::Directory)
    }

    fn list_children(&self, dir: &SourceEntry) -> nps_ingest::Result<Vec<SourceEntry>> {
        let prefix = format!("{}/", dir.path);
        let mut children = BTreeMap::new();
        for path in self.files.keys() {
            let Some(rest) = path.strip_prefix(&prefix) else {
                continue;
            };
            let (name, kind) = match rest.split_once('/') {
                Some((name, _)) => (name, EntryKind::Directory),
                None => (rest, EntryKind::File),
            };
            children
                .entry(name.to_string())
                .or_insert_with(|| SourceEntry::new(name, format!("{prefix}{name}"), kind));
        }
        Ok(children.into_values().collect())
    }

    fn open_grid(&self, file: &SourceEntry) -> nps_ingest::Result<Grid> {
        self.files
            .get(&file.path)
            .map(|rows| Grid::from_text_rows(rows.clone()))
            .ok_or_else(|| IngestError::EntryNotFound {
                path: file.path.clone(),
            })
    }
}

fn sheet(moca: &'static str, craft: &'static str) -> Vec<Vec<&'static str>> {
    vec![
        vec!["Neuropsych Score Summary", "", ""],
        vec!["", "MoCA Total", moca],
        vec!["", "Craft Verbatim", craft],
    ]
}

fn field_map() -> FieldMap {
    let mut map = FieldMap::new();
    map.insert("mocatots", FieldSpec::new("MoCA", 0, 1, DType::Int));
    map.insert("craftvrs", FieldSpec::new("Craft Verbatim", 0, 1, DType::Float));
    map.insert("examiner", FieldSpec::new("Examiner", 0, 1, DType::String));
    map
}

fn groups() -> Vec<PrefixGroup> {
    vec![
        PrefixGroup::new("fu_", Some(VisitModality::InPersonFollowUp))
            .with_fields(["mocatots", "craftvrs"]),
        PrefixGroup::new("tele_", Some(VisitModality::TeleFollowUp)).with_fields(["mocatots"]),
    ]
}

fn patterns() -> WalkPatterns {
    WalkPatterns::new(r"Visit|ELECTRA|KG\d{6}", r"\d{3,4} Score|KG\d{6}_\d{4}_Score").unwrap()
}

fn external(ptid: &str, event: &str, flags: &[String]) -> ExternalRecord {
    ExternalRecord {
        participant_id: ParticipantId::parse(ptid).unwrap(),
        event_label: EventLabel::new(event),
        values: flags.iter().map(|f| (f.clone(), "2".to_string())).collect(),
    }
}

fn complete_flags(options: &ReconcileOptions, modality: VisitModality) -> Vec<String> {
    let phase = options
        .phases
        .iter()
        .find(|phase| phase.modality == modality)
        .unwrap();
    let mut flags = vec![options.header_flag.clone()];
    flags.extend(phase.flags.iter().cloned());
    flags
}

fn primary_table(options: &ReconcileOptions) -> ExternalTable {
    ExternalTable::new(vec![
        external(
            "UM00000456",
            "visit_1_arm_1",
            &complete_flags(options, VisitModality::InPersonInitial),
        ),
        external(
            "UM00000456",
            "visit_2_arm_1",
            &complete_flags(options, VisitModality::InPersonFollowUp),
        ),
        external("UM00000457", "visit_2_arm_1", &[options.header_flag.clone()]),
        external(
            "UM00000458",
            "visit_2_arm_1",
            &complete_flags(options, VisitModality::TeleFollowUp),
        ),
    ])
}

fn linked_table() -> ExternalTable {
    ExternalTable::new(vec![ExternalRecord {
        participant_id: ParticipantId::parse("UM00000458").unwrap(),
        event_label: EventLabel::linked_visit(1),
        values: BTreeMap::from([("ummap_visit_number".to_string(), "2".to_string())]),
    }])
}

fn source() -> MemorySource {
    MemorySource::default()
        .with("Visit 1/0456 Score Summary.csv", {
            let mut rows = sheet("26", "18.5");
            rows.push(vec!["", "Examiner", "JS"]);
            rows
        })
        .with("Visit 2/0456 Score Summary.csv", sheet("24", "N/A"))
        .with("Visit 2/0456 Score Summary~old.csv", sheet("99", "1"))
        .with("Visit 2/0457 Score Summary.csv", sheet("20", "12"))
        .with("Visit 2/notes.csv", sheet("1", "1"))
        .with("Archive/0460 Score Summary.csv", sheet("1", "1"))
        .with(
            "ELECTRA/Visit 1/KG000123 - 0458/KG000123_0458_Score_Summary.csv",
            sheet("22", "n/a"),
        )
}

#[test]
fn harvests_and_reconciles_complete_visits() {
    let map = field_map();
    let fields = map.compile().unwrap();
    let identity = IdentityOptions::default();
    let linked = linked_table();
    let resolver = IdentityResolver::new(&identity, &linked);

    let accumulated = harvest(&source(), &patterns(), &fields, &resolver).unwrap();
    assert_eq!(accumulated.stats.candidates, 5);
    assert_eq!(accumulated.records.len(), 5);

    let options = ReconcileOptions {
        drop_columns: Vec::new(),
        ..ReconcileOptions::default()
    };
    let groups = groups();
    let ctx = ReconcileContext {
        field_map: &map,
        groups: &groups,
        options: &options,
        participant_prefix: &identity.participant_prefix,
    };
    let reconciled = reconcile(accumulated.records, &primary_table(&options), &ctx).unwrap();
    assert_eq!(reconciled.stats.duplicates, 1);
    assert_eq!(reconciled.stats.not_complete, 1);
    assert_eq!(reconciled.stats.output, 3);

    let schema = OutputSchema::new(&map, &groups, &options.drop_columns);
    let mut frame = build_frame(&reconciled.rows, &schema).unwrap();
    let csv = frame_to_csv(&mut frame).unwrap();
    insta::assert_snapshot!(csv, @r"
    ptid,redcap_event_name,craftvrs,examiner,mocatots,fu_mocatots,fu_craftvrs,tele_mocatots
    UM00000456,visit_1_arm_1,18.5,JS,26,,,
    UM00000456,visit_2_arm_1,,,,24,,
    UM00000458,visit_2_arm_1,,,,,,22
    ");
}

#[test]
fn rerunning_reconciliation_is_stable() {
    let map = field_map();
    let fields = map.compile().unwrap();
    let identity = IdentityOptions::default();
    let linked = linked_table();
    let resolver = IdentityResolver::new(&identity, &linked);
    let options = ReconcileOptions::default();
    let groups = groups();
    let ctx = ReconcileContext {
        field_map: &map,
        groups: &groups,
        options: &options,
        participant_prefix: &identity.participant_prefix,
    };
    let schema = OutputSchema::new(&map, &groups, &options.drop_columns);

    let run = || {
        let accumulated = harvest(&source(), &patterns(), &fields, &resolver).unwrap();
        let reconciled = reconcile(accumulated.records, &primary_table(&options), &ctx).unwrap();
        let mut frame = build_frame(&reconciled.rows, &schema).unwrap();
        frame_to_csv(&mut frame).unwrap()
    };
    let first = run();
    assert_eq!(first, run());
    assert!(!first.contains("tele_mocatots"));
}

#[test]
fn linked_identity_mismatch_aborts_harvest() {
    let map = field_map();
    let fields = map.compile().unwrap();
    let identity = IdentityOptions::default();
    let linked = linked_table();
    let resolver = IdentityResolver::new(&identity, &linked);
    let source = MemorySource::default().with(
        "ELECTRA/Visit 1/KG000123 - 0458/KG000123_0459_Score_Summary.csv",
        sheet("22", "3"),
    );
    let err = harvest(&source, &patterns(), &fields, &resolver).unwrap_err();
    assert!(matches!(err, TransformError::IdentityMismatch { .. }));
}

#[test]
fn unreadable_and_blank_sheets_are_skipped() {
    let map = field_map();
    let fields = map.compile().unwrap();
    let identity = IdentityOptions::default();
    let linked = ExternalTable::default();
    let resolver = IdentityResolver::new(&identity, &linked);
    let source = MemorySource::default()
        .with("Visit 1/0456 Score Summary.csv", Vec::new())
        .with("Visit 1/0457 Score Summary.csv", sheet("20", "4"));
    let entries = vec![
        SourceEntry::new("gone.csv", "/box/Visit 1/0458 Score.csv", EntryKind::File),
        SourceEntry::new(
            "0456 Score Summary.csv",
            "/box/Visit 1/0456 Score Summary.csv",
            EntryKind::File,
        ),
        SourceEntry::new(
            "0457 Score Summary.csv",
            "/box/Visit 1/0457 Score Summary.csv",
            EntryKind::File,
        ),
    ];
    let accumulated = nps_transform::accumulate(&source, &entries, &fields, &resolver).unwrap();
    assert_eq!(accumulated.stats.unreadable, 1);
    assert_eq!(accumulated.stats.empty_sheets, 1);
    assert_eq!(accumulated.records.len(), 1);
    assert_eq!(
        accumulated.records[0].participant_id.as_deref(),
        Some("UM00000457")
    );
}

#[test]
fn output_is_written_to_dated_file() {
    let dir = tempfile::TempDir::new().unwrap();
    let schema = OutputSchema::new(&field_map(), &groups(), &[]);
    let mut frame = build_frame(&[], &schema).unwrap();
    let date = chrono::NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
    let path = write_output(&mut frame, &dir.path().join("out"), date).unwrap();
    assert!(path.ends_with("neuropsych_scrape_data-2024-03-15.csv"));
    let written = std::fs::read_to_string(path).unwrap();
    assert!(written.starts_with("ptid,redcap_event_name,craftvrs"));
}
