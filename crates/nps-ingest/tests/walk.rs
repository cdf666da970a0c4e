//! Tests for source tree traversal.

use std::fs;
use std::path::Path;

use nps_ingest::{EntryKind, FileSource, LocalFileSource, WalkPatterns, walk};
use tempfile::TempDir;

fn touch(dir: &Path, name: &str) {
    fs::create_dir_all(dir).expect("create dir");
    fs::write(dir.join(name), ",Score,14\n").expect("write file");
}

fn names(entries: &[nps_ingest::SourceEntry]) -> Vec<String> {
    entries.iter().map(|e| e.name.clone()).collect()
}

#[test]
fn descends_only_into_matching_directories() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    touch(&root.join("Visit 2"), "0456 Score Summary 2021.csv");
    touch(&root.join("Visit 1"), "0123 Score Summary 2020.csv");
    touch(&root.join("Visit 1"), "notes.txt");
    touch(&root.join("Archive"), "0999 Score Summary 2019.csv");
    touch(root, "0777 Score Summary 2022.csv");

    let source = LocalFileSource::new(root).unwrap();
    let patterns = WalkPatterns::new("Visit", r"\d{3,4} Score").unwrap();
    let found = walk(&source, &patterns).unwrap();

    assert_eq!(
        names(&found),
        vec![
            "0777 Score Summary 2022.csv",
            "0123 Score Summary 2020.csv",
            "0456 Score Summary 2021.csv",
        ]
    );
    assert!(found.iter().all(|e| e.kind == EntryKind::File));
    assert!(found[2].path.ends_with("0456 Score Summary 2021.csv"));
    assert!(found[2].path.contains("Visit 2"));
}

#[test]
fn empty_root_yields_nothing() {
    let dir = TempDir::new().unwrap();
    let source = LocalFileSource::new(dir.path()).unwrap();
    let patterns = WalkPatterns::new(".*", ".*").unwrap();
    assert!(walk(&source, &patterns).unwrap().is_empty());
}

#[test]
fn missing_root_is_an_error() {
    let dir = TempDir::new().unwrap();
    assert!(LocalFileSource::new(dir.path().join("absent")).is_err());
}

#[test]
fn pattern_pairs_are_joined() {
    let patterns =
        WalkPatterns::from_pairs([("Visit", r"\d{3,4}"), ("ELECTRA|KG", "KG")]).unwrap();
    assert!(patterns.matches_dir("Visit 3"));
    assert!(patterns.matches_dir("KG000123 - 0456"));
    assert!(!patterns.matches_dir("Old Visit"));
    assert!(patterns.matches_file("KG000123_0456_Score_Summary_2021.xlsx"));
    assert!(patterns.matches_file("0456.Score Summary.xlsx"));
}

#[test]
fn invalid_pattern_is_reported() {
    let err = WalkPatterns::new("(", ".*").unwrap_err();
    assert!(err.to_string().contains("directory"));
}

#[test]
fn csv_grids_load_through_the_source() {
    let dir = TempDir::new().unwrap();
    touch(dir.path(), "0456 Score Summary.csv");
    let source = LocalFileSource::new(dir.path()).unwrap();
    let entries = source.list_children(&source.root()).unwrap();
    let grid = source.open_grid(&entries[0]).unwrap();
    assert_eq!(grid.get(0, 1), Some("Score"));
    assert_eq!(grid.get(0, 2), Some("14"));
}

#[test]
fn unsupported_and_corrupt_files_fail_to_load() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("notes.txt"), "x").unwrap();
    fs::write(dir.path().join("broken.xlsx"), "not a zip archive").unwrap();
    let source = LocalFileSource::new(dir.path()).unwrap();
    for entry in source.list_children(&source.root()).unwrap() {
        assert!(source.open_grid(&entry).is_err(), "{} should fail", entry.name);
    }
}

#[cfg(unix)]
#[test]
fn symlinks_are_not_followed() {
    let dir = TempDir::new().unwrap();
    let root = dir.path().join("root");
    let outside = dir.path().join("outside");
    touch(&outside, "0456 Score.csv");
    fs::create_dir_all(&root).unwrap();
    std::os::unix::fs::symlink(&outside, root.join("Visit 9")).unwrap();
    std::os::unix::fs::symlink(outside.join("0456 Score.csv"), root.join("0457 Score.csv"))
        .unwrap();

    let source = LocalFileSource::new(&root).unwrap();
    let patterns = WalkPatterns::new(".*", ".*").unwrap();
    assert!(walk(&source, &patterns).unwrap().is_empty());
}

#[cfg(unix)]
#[test]
fn unreadable_subdirectory_is_skipped() {
    use std::os::unix::fs::PermissionsExt;

    let dir = TempDir::new().unwrap();
    let locked = dir.path().join("Visit 2");
    touch(&locked, "0456 Score.csv");
    touch(&dir.path().join("Visit 1"), "0123 Score.csv");
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

    let source = LocalFileSource::new(dir.path()).unwrap();
    let patterns = WalkPatterns::new("Visit", ".*").unwrap();
    let result = walk(&source, &patterns);
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

    let found = result.unwrap();
    // Running as root can still read the locked directory.
    assert!(found.iter().any(|e| e.name == "0123 Score.csv"));
}
