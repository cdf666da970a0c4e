//! Hierarchical file sources.
//!
//! A [`FileSource`] exposes just enough of a directory tree to walk it and
//! load spreadsheets from it. The local filesystem is one provider; a remote
//! folder-tree client is another and only needs to implement this trait.

use crate::error::Result;
use crate::grid::Grid;

/// Kind of a tree entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
    /// Symbolic links and special files; never descended into or loaded.
    Other,
}

/// A node in a source tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceEntry {
    /// Base name of the entry.
    pub name: String,
    /// Full slash-separated path from the source root.
    pub path: String,
    pub kind: EntryKind,
}

impl SourceEntry {
    pub fn new(name: impl Into<String>, path: impl Into<String>, kind: EntryKind) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            kind,
        }
    }

    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }

    pub fn is_file(&self) -> bool {
        self.kind == EntryKind::File
    }
}

/// Capability interface over a file store.
pub trait FileSource {
    /// The root directory entry.
    fn root(&self) -> SourceEntry;

    /// Immediate children of a directory entry, in any order.
    fn list_children(&self, dir: &SourceEntry) -> Result<Vec<SourceEntry>>;

    /// Load the first sheet of a spreadsheet entry.
    fn open_grid(&self, file: &SourceEntry) -> Result<Grid>;

    /// Text the identity resolver inspects for participant and visit markers.
    fn identity_hint(&self, file: &SourceEntry) -> String {
        file.path.clone()
    }
}
