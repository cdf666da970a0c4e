use std::path::PathBuf;

use nps_transform::{AccumulateStats, ReconcileStats};

#[derive(Debug)]
pub struct RunResult {
    pub source_root: PathBuf,
    /// Written output file; `None` on a dry run.
    pub output: Option<PathBuf>,
    /// Records accepted by the records system when importing.
    pub imported: Option<usize>,
    pub harvest: AccumulateStats,
    pub reconcile: ReconcileStats,
    pub columns: usize,
}
