//! Pattern-pruned traversal of a [`FileSource`] tree.

use std::collections::BTreeSet;

use regex::Regex;
use tracing::{debug, warn};

use crate::error::{IngestError, Result};
use crate::source::{FileSource, SourceEntry};

/// Directory and file name patterns for a walk.
///
/// Patterns match at the start of an entry name.
#[derive(Debug, Clone)]
pub struct WalkPatterns {
    dirs: Regex,
    files: Regex,
}

impl WalkPatterns {
    pub fn new(dirs: &str, files: &str) -> Result<Self> {
        Ok(Self {
            dirs: compile_anchored("directory", dirs)?,
            files: compile_anchored("file", files)?,
        })
    }

    /// Join several (directory, file) pattern pairs into one alternation each.
    pub fn from_pairs<'a, I>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let (dirs, files): (Vec<&str>, Vec<&str>) = pairs.into_iter().unzip();
        Self::new(&dirs.join("|"), &files.join("|"))
    }

    pub fn matches_dir(&self, name: &str) -> bool {
        self.dirs.is_match(name)
    }

    pub fn matches_file(&self, name: &str) -> bool {
        self.files.is_match(name)
    }
}

fn compile_anchored(kind: &'static str, pattern: &str) -> Result<Regex> {
    Regex::new(&format!("^(?:{pattern})")).map_err(|source| IngestError::Pattern {
        kind,
        pattern: pattern.to_string(),
        source,
    })
}

/// Collect file entries below the source root.
///
/// Only directories whose names match are descended into; only files whose
/// names match are returned. Children are visited in name order. A
/// subdirectory that cannot be listed is logged and skipped; failing to list
/// the root is an error.
pub fn walk<S: FileSource + ?Sized>(source: &S, patterns: &WalkPatterns) -> Result<Vec<SourceEntry>> {
    let root = source.root();
    let mut visited = BTreeSet::new();
    visited.insert(root.path.clone());
    let mut found = Vec::new();
    let children = source.list_children(&root)?;
    descend(source, patterns, children, &mut visited, &mut found);
    Ok(found)
}

fn descend<S: FileSource + ?Sized>(
    source: &S,
    patterns: &WalkPatterns,
    mut children: Vec<SourceEntry>,
    visited: &mut BTreeSet<String>,
    found: &mut Vec<SourceEntry>,
) {
    children.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.path.cmp(&b.path)));
    for child in children {
        if !visited.insert(child.path.clone()) {
            continue;
        }
        if child.is_dir() && patterns.matches_dir(&child.name) {
            match source.list_children(&child) {
                Ok(grandchildren) => descend(source, patterns, grandchildren, visited, found),
                Err(error) => {
                    warn!(path = %child.path, %error, "skipping unreadable directory");
                }
            }
        } else if child.is_file() && patterns.matches_file(&child.name) {
            debug!(path = %child.path, "candidate spreadsheet");
            found.push(child);
        }
    }
}
