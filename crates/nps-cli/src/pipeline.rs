//! Harvest pipeline with explicit stages.
//!
//! The pipeline follows these stages in order:
//! 1. **Resources**: Load the field map, visit-specific fields and export fields
//! 2. **Records**: Export and clean both records-system projects
//! 3. **Harvest**: Walk the source tree and extract one record per sheet
//! 4. **Reconcile**: Key, dedupe, reshape and join against complete visits
//! 5. **Output**: Build the frame and write the dated CSV
//!
//! Each stage takes the output of the previous stage and returns typed results.
//! The records system and the file tree come in through traits, so the same
//! stages run against in-memory fakes in tests.

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use polars::prelude::DataFrame;
use tracing::{info, info_span};

use nps_ingest::{FileSource, WalkPatterns};
use nps_model::{ExternalTable, FieldMap, IdentityOptions, PrefixGroup, RecordSet};
use nps_redcap::{RecordsSource, clean_export};
use nps_transform::{
    Accumulated, IdentityResolver, OutputSchema, ReconcileContext, Reconciled, build_frame,
    harvest, reconcile, write_output,
};

use crate::config::{AppConfig, ExportFields, load_export_fields, load_field_map, load_prefix_groups};
use crate::types::RunResult;

// ============================================================================
// Stage 1: Resources
// ============================================================================

/// JSON resources referenced by the configuration.
#[derive(Debug, Clone)]
pub struct Resources {
    pub field_map: FieldMap,
    pub groups: Vec<PrefixGroup>,
    pub export_fields: ExportFields,
}

pub fn load_resources(config: &AppConfig) -> Result<Resources> {
    let paths = &config.resources;
    Ok(Resources {
        field_map: load_field_map(&paths.field_map)?,
        groups: load_prefix_groups(&paths.visit_fields)?,
        export_fields: load_export_fields(&paths.export_fields)?,
    })
}

// ============================================================================
// Stage 2: Records
// ============================================================================

/// Cleaned exports of the primary and linked projects.
#[derive(Debug, Clone, Default)]
pub struct ExternalTables {
    pub primary: ExternalTable,
    pub linked: ExternalTable,
}

/// Export both projects. Any failure here is fatal to the run.
pub fn fetch_external<P, L>(
    primary: &P,
    linked: &L,
    config: &AppConfig,
    export_fields: &ExportFields,
) -> Result<ExternalTables>
where
    P: RecordsSource + ?Sized,
    L: RecordsSource + ?Sized,
{
    let prefix = &config.identity.participant_prefix;
    let primary_fields = export_fields.get(&config.records.primary.fields_key)?;
    let linked_fields = export_fields.get(&config.records.linked.fields_key)?;
    let primary_rows = primary
        .fetch_records(primary_fields)
        .context("export primary project records")?;
    let linked_rows = linked
        .fetch_records(linked_fields)
        .context("export linked project records")?;
    Ok(ExternalTables {
        primary: clean_export(primary_rows, prefix),
        linked: clean_export(linked_rows, prefix),
    })
}

// ============================================================================
// Stage 3: Harvest
// ============================================================================

pub fn harvest_records<S: FileSource + ?Sized>(
    source: &S,
    patterns: &WalkPatterns,
    field_map: &FieldMap,
    identity: &IdentityOptions,
    linked: &ExternalTable,
) -> Result<Accumulated> {
    let fields = field_map.compile().context("compile field map")?;
    let resolver = IdentityResolver::new(identity, linked);
    let accumulated =
        harvest(source, patterns, &fields, &resolver).context("harvest summary sheets")?;
    let stats = &accumulated.stats;
    info!(
        candidates = stats.candidates,
        unreadable = stats.unreadable,
        empty_sheets = stats.empty_sheets,
        empty_records = stats.empty_records,
        records = stats.records,
        "harvest complete"
    );
    Ok(accumulated)
}

// ============================================================================
// Stage 4: Reconcile
// ============================================================================

/// Reconciled rows with their output schema and frame.
#[derive(Debug)]
pub struct ReconcileResult {
    pub reconciled: Reconciled,
    pub schema: OutputSchema,
    pub frame: DataFrame,
}

pub fn reconcile_records(
    records: RecordSet,
    primary: &ExternalTable,
    resources: &Resources,
    config: &AppConfig,
) -> Result<ReconcileResult> {
    let ctx = ReconcileContext {
        field_map: &resources.field_map,
        groups: &resources.groups,
        options: &config.reconcile,
        participant_prefix: &config.identity.participant_prefix,
    };
    let reconciled = reconcile(records, primary, &ctx).context("reconcile records")?;
    let schema = OutputSchema::new(
        &resources.field_map,
        &resources.groups,
        &config.reconcile.drop_columns,
    );
    let frame = build_frame(&reconciled.rows, &schema).context("build output frame")?;
    Ok(ReconcileResult {
        reconciled,
        schema,
        frame,
    })
}

// ============================================================================
// Stage 5: Output
// ============================================================================

/// Where and whether to write the output file.
#[derive(Debug, Clone)]
pub struct OutputOptions {
    pub dir: PathBuf,
    pub date: NaiveDate,
    pub dry_run: bool,
}

pub fn output(frame: &mut DataFrame, options: &OutputOptions) -> Result<Option<PathBuf>> {
    if options.dry_run {
        info!(rows = frame.height(), "dry run, output not written");
        return Ok(None);
    }
    let path = write_output(frame, &options.dir, options.date)
        .with_context(|| format!("write output to {}", options.dir.display()))?;
    Ok(Some(path))
}

// ============================================================================
// Full run
// ============================================================================

/// Run every stage; returns the summary and the final frame.
pub fn run_pipeline<S, P, L>(
    source: &S,
    primary: &P,
    linked: &L,
    config: &AppConfig,
    resources: &Resources,
    output_options: &OutputOptions,
) -> Result<(RunResult, DataFrame)>
where
    S: FileSource + ?Sized,
    P: RecordsSource + ?Sized,
    L: RecordsSource + ?Sized,
{
    let patterns = config.walk_patterns()?;

    let external = info_span!("records")
        .in_scope(|| fetch_external(primary, linked, config, &resources.export_fields))?;

    let accumulated = info_span!("harvest", root = %config.source.root.display()).in_scope(|| {
        harvest_records(
            source,
            &patterns,
            &resources.field_map,
            &config.identity,
            &external.linked,
        )
    })?;
    let harvest_stats = accumulated.stats;

    let ReconcileResult {
        reconciled,
        schema,
        mut frame,
    } = info_span!("reconcile").in_scope(|| {
        reconcile_records(accumulated.records, &external.primary, resources, config)
    })?;

    let written = output(&mut frame, output_options)?;
    let result = RunResult {
        source_root: config.source.root.clone(),
        output: written,
        imported: None,
        harvest: harvest_stats,
        reconcile: reconciled.stats,
        columns: schema.names().len(),
    };
    Ok((result, frame))
}
