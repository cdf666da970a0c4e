//! Application configuration and JSON resource loading.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use serde::Deserialize;

use nps_ingest::WalkPatterns;
use nps_model::{FieldMap, IdentityOptions, PrefixGroup, ReconcileOptions, VisitModality};
use nps_redcap::RedcapConfig;

/// Default configuration path, relative to the application directory (`--app-path`).
pub const DEFAULT_CONFIG_PATH: &str = "resources/config/config.toml";

/// Keys of the visit-fields resource and the prefix groups they feed.
const VISIT_FIELD_GROUPS: [(&str, &str, VisitModality); 2] = [
    ("nacc_fvp_cols", "fu_", VisitModality::InPersonFollowUp),
    ("nacc_tvp_cols", "tele_", VisitModality::TeleFollowUp),
];

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    pub source: SourceConfig,
    #[serde(default)]
    pub identity: IdentityOptions,
    pub records: RecordsConfig,
    #[serde(default)]
    pub resources: ResourcesConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub reconcile: ReconcileOptions,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SourceConfig {
    pub root: PathBuf,
    pub patterns: Vec<PatternConfig>,
}

/// One study's directory and file name patterns.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PatternConfig {
    pub name: String,
    pub subdirs_regex: String,
    pub file_regex: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RecordsConfig {
    pub primary: ProjectConfig,
    pub linked: ProjectConfig,
}

/// A records-system project and the key of its export field list.
#[derive(Debug, Clone, Deserialize)]
pub struct ProjectConfig {
    #[serde(flatten)]
    pub api: RedcapConfig,
    pub fields_key: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ResourcesConfig {
    pub field_map: PathBuf,
    pub visit_fields: PathBuf,
    pub export_fields: PathBuf,
}

impl Default for ResourcesConfig {
    fn default() -> Self {
        Self {
            field_map: PathBuf::from("resources/json/parse_map.json"),
            visit_fields: PathBuf::from("resources/json/nacc_fields.json"),
            export_fields: PathBuf::from("resources/json/redcap_fields.json"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    pub dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("data/csv"),
        }
    }
}

impl AppConfig {
    /// Load the config at `path` under `app_path` and anchor its relative
    /// source, resource and output paths there.
    pub fn load_in(app_path: &Path, path: &Path) -> Result<Self> {
        let mut config = Self::load(&app_path.join(path))?;
        config.resolve_paths(app_path);
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("read config {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("parse config {}", path.display()))
    }

    pub fn parse(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)?;
        if config.source.patterns.is_empty() {
            bail!("[source] needs at least one [[source.patterns]] entry");
        }
        Ok(config)
    }

    /// Join relative paths onto `base`; absolute paths are left as they are.
    pub fn resolve_paths(&mut self, base: &Path) {
        for path in [
            &mut self.source.root,
            &mut self.resources.field_map,
            &mut self.resources.visit_fields,
            &mut self.resources.export_fields,
            &mut self.output.dir,
        ] {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        }
    }

    /// Walk patterns of every configured study, joined.
    pub fn walk_patterns(&self) -> Result<WalkPatterns> {
        let pairs = self
            .source
            .patterns
            .iter()
            .map(|p| (p.subdirs_regex.as_str(), p.file_regex.as_str()));
        WalkPatterns::from_pairs(pairs).context("compile source patterns")
    }
}

/// Export field lists, keyed by project.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct ExportFields(BTreeMap<String, Vec<String>>);

impl ExportFields {
    pub fn get(&self, key: &str) -> Result<&[String]> {
        self.0
            .get(key)
            .map(Vec::as_slice)
            .with_context(|| format!("no export field list named '{key}'"))
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path, what: &str) -> Result<T> {
    let text =
        fs::read_to_string(path).with_context(|| format!("read {what} {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parse {what} {}", path.display()))
}

pub fn load_field_map(path: &Path) -> Result<FieldMap> {
    let map: FieldMap = read_json(path, "field map")?;
    if map.is_empty() {
        bail!("field map {} defines no fields", path.display());
    }
    Ok(map)
}

/// Prefix groups for follow-up visits from the visit-fields resource.
pub fn load_prefix_groups(path: &Path) -> Result<Vec<PrefixGroup>> {
    let mut lists: BTreeMap<String, Vec<String>> = read_json(path, "visit fields")?;
    VISIT_FIELD_GROUPS
        .iter()
        .map(|(key, prefix, modality)| {
            let fields = lists
                .remove(*key)
                .with_context(|| format!("visit fields {} lack '{key}'", path.display()))?;
            Ok(PrefixGroup::new(*prefix, Some(*modality)).with_fields(fields))
        })
        .collect()
}

pub fn load_export_fields(path: &Path) -> Result<ExportFields> {
    read_json(path, "export fields")
}
