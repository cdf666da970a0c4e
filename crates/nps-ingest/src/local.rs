//! Local filesystem provider.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{IngestError, Result};
use crate::grid::{Grid, GridFormat, read_csv_grid, read_workbook_grid};
use crate::source::{EntryKind, FileSource, SourceEntry};

/// [`FileSource`] backed by a directory on the local filesystem.
#[derive(Debug, Clone)]
pub struct LocalFileSource {
    root: PathBuf,
}

impl LocalFileSource {
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        if !root.is_dir() {
            return Err(IngestError::DirectoryNotFound { path: root });
        }
        Ok(Self { root })
    }
}

impl FileSource for LocalFileSource {
    fn root(&self) -> SourceEntry {
        let name = self
            .root
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default();
        SourceEntry::new(
            name,
            self.root.to_string_lossy().into_owned(),
            EntryKind::Directory,
        )
    }

    fn list_children(&self, dir: &SourceEntry) -> Result<Vec<SourceEntry>> {
        let dir_path = PathBuf::from(&dir.path);
        let read_error = |source| IngestError::DirectoryRead {
            path: dir_path.clone(),
            source,
        };
        let mut children = Vec::new();
        for entry in fs::read_dir(&dir_path).map_err(read_error)? {
            let entry = entry.map_err(read_error)?;
            // DirEntry::file_type does not follow symlinks.
            let file_type = entry.file_type().map_err(read_error)?;
            let kind = if file_type.is_dir() {
                EntryKind::Directory
            } else if file_type.is_file() {
                EntryKind::File
            } else {
                EntryKind::Other
            };
            children.push(SourceEntry::new(
                entry.file_name().to_string_lossy().into_owned(),
                entry.path().to_string_lossy().into_owned(),
                kind,
            ));
        }
        Ok(children)
    }

    fn open_grid(&self, file: &SourceEntry) -> Result<Grid> {
        let path = Path::new(&file.path);
        match GridFormat::from_name(&file.name) {
            Some(GridFormat::Workbook) => read_workbook_grid(path),
            Some(GridFormat::Csv) => read_csv_grid(path),
            None => Err(IngestError::UnsupportedFormat {
                path: file.path.clone(),
            }),
        }
    }
}
