use std::fs;

use harvest_engine::{ensure_dir, AtomicFileWriter};
use tempfile::TempDir;

#[test]
fn creates_missing_directory() {
    let temp = TempDir::new().unwrap();
    let new_dir = temp.path().join("cache");
    assert!(!new_dir.exists());
    ensure_dir(&new_dir).unwrap();
    assert!(new_dir.is_dir());
}

#[test]
fn atomic_write_replaces_existing() {
    let temp = TempDir::new().unwrap();
    let writer = AtomicFileWriter::new(temp.path().to_path_buf());

    let first = writer.write("pol_videos.json", "[]").unwrap();
    assert_eq!(first.file_name().unwrap(), "pol_videos.json");
    assert_eq!(fs::read_to_string(&first).unwrap(), "[]");

    // A later checkpoint replaces the whole file.
    let second = writer.write("pol_videos.json", "[1]").unwrap();
    assert_eq!(first, second);
    assert_eq!(fs::read_to_string(&second).unwrap(), "[1]");
}

#[test]
fn no_partial_file_on_error() {
    let temp = TempDir::new().unwrap();
    let file_path = temp.path().join("not_a_dir");
    fs::write(&file_path, "x").unwrap();

    let writer = AtomicFileWriter::new(file_path.clone());
    let result = writer.write("pol_videos.json", "[]");
    assert!(result.is_err());
    assert!(!file_path.with_file_name("pol_videos.json").exists());
}
