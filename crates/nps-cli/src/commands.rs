use anyhow::{Context, Result};
use chrono::Local;
use comfy_table::Table;
use tracing::info_span;

use nps_cli::config::AppConfig;
use nps_cli::pipeline::{OutputOptions, load_resources, run_pipeline};
use nps_cli::types::RunResult;
use nps_ingest::{FileSource, LocalFileSource, walk};
use nps_redcap::RedcapClient;
use nps_transform::{IdentityScheme, frame_to_csv, visit_number};

use crate::cli::{ConfigArgs, RunArgs};
use crate::summary::apply_table_style;

pub fn run_harvest(args: &RunArgs) -> Result<RunResult> {
    let config = AppConfig::load_in(&args.config.app_path, &args.config.config)?;
    let run_span = info_span!("run", config = %args.config.config.display());
    let _run_guard = run_span.enter();

    let resources = load_resources(&config)?;
    let source = LocalFileSource::new(&config.source.root)
        .with_context(|| format!("open source root {}", config.source.root.display()))?;
    let primary = RedcapClient::new(config.records.primary.api.clone())
        .context("create primary project client")?;
    let linked = RedcapClient::new(config.records.linked.api.clone())
        .context("create linked project client")?;

    let output_options = OutputOptions {
        dir: args
            .output_dir
            .clone()
            .unwrap_or_else(|| config.output.dir.clone()),
        date: Local::now().date_naive(),
        dry_run: args.dry_run,
    };
    let (mut result, mut frame) = run_pipeline(
        &source,
        &primary,
        &linked,
        &config,
        &resources,
        &output_options,
    )?;

    if args.import {
        let csv = frame_to_csv(&mut frame).context("serialize rows for import")?;
        let count = primary
            .import_records(&csv)
            .with_context(|| format!("import records into {}", primary.uri()))?;
        result.imported = Some(count);
    }
    Ok(result)
}

pub fn run_scan(args: &ConfigArgs) -> Result<()> {
    let config = AppConfig::load_in(&args.app_path, &args.config)?;
    let patterns = config.walk_patterns()?;
    let source = LocalFileSource::new(&config.source.root)
        .with_context(|| format!("open source root {}", config.source.root.display()))?;
    let entries = walk(&source, &patterns).context("walk source tree")?;

    let mut table = Table::new();
    table.set_header(vec!["Spreadsheet", "Scheme", "Visit"]);
    apply_table_style(&mut table);
    for entry in &entries {
        let hint = source.identity_hint(entry);
        let scheme = match IdentityScheme::detect(&hint, &config.identity) {
            IdentityScheme::Direct => "direct",
            IdentityScheme::Linked => "linked",
        };
        let visit = visit_number(&hint).map_or_else(|| "-".to_string(), |n| n.to_string());
        table.add_row(vec![entry.path.clone(), scheme.to_string(), visit]);
    }
    println!("{table}");
    println!("{} candidate spreadsheets", entries.len());
    Ok(())
}

pub fn run_fields(args: &ConfigArgs) -> Result<()> {
    let config = AppConfig::load_in(&args.app_path, &args.config)?;
    let resources = load_resources(&config)?;

    let mut table = Table::new();
    table.set_header(vec!["Field", "Anchor", "Match", "Offset", "Type", "Follow-up"]);
    apply_table_style(&mut table);
    for (name, spec) in resources.field_map.iter() {
        let follow_up: Vec<String> = resources
            .groups
            .iter()
            .filter(|group| group.contains(name))
            .map(|group| group.column(name))
            .collect();
        table.add_row(vec![
            name.to_string(),
            spec.anchor.clone(),
            format!("{:?}", spec.anchor_mode).to_lowercase(),
            format!("({}, {})", spec.row_offset, spec.col_offset),
            spec.dtype.to_string(),
            if follow_up.is_empty() {
                "-".to_string()
            } else {
                follow_up.join(", ")
            },
        ]);
    }
    println!("{table}");
    Ok(())
}
