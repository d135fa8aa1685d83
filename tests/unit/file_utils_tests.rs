/*!
 * Tests for file utility functions
 */

use std::fs;
use anyhow::Result;
use helptrans::file_utils::{FileManager, PageStore};
use crate::common;

/// Test that file_exists returns true for existing files
#[test]
fn test_file_exists_withExistingFile_shouldReturnTrue() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let test_file = common::create_test_file(temp_dir.path(), "page.html", "<p>x</p>")?;

    assert!(FileManager::file_exists(&test_file));
    assert!(!FileManager::file_exists(temp_dir.path()));
    Ok(())
}

/// Test that file_exists returns false for non-existent files
#[test]
fn test_file_exists_withNonExistentFile_shouldReturnFalse() {
    assert!(!FileManager::file_exists("non_existent_file.tmp"));
}

#[test]
fn test_ensure_dir_withNestedPath_shouldCreateParents() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let nested = temp_dir.path().join("a").join("b");

    FileManager::ensure_dir(&nested)?;
    FileManager::ensure_dir(&nested)?;

    assert!(FileManager::dir_exists(&nested));
    Ok(())
}

#[test]
fn test_find_files_shouldMatchExtensionShallowAndSorted() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    common::create_test_file(temp_dir.path(), "b.html", "")?;
    common::create_test_file(temp_dir.path(), "a.HTML", "")?;
    common::create_test_file(temp_dir.path(), "notes.txt", "")?;
    fs::create_dir(temp_dir.path().join("nested"))?;
    common::create_test_file(&temp_dir.path().join("nested"), "c.html", "")?;

    let files = FileManager::find_files(temp_dir.path(), ".html")?;
    let names: Vec<String> = files.iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
        .collect();

    assert_eq!(names, vec!["a.HTML", "b.html"]);
    Ok(())
}

#[test]
fn test_write_to_file_shouldCreateParentDirectory() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = temp_dir.path().join("out").join("page.html");

    FileManager::write_to_file(&path, "日本語")?;

    assert_eq!(FileManager::read_to_string(&path)?, "日本語");
    Ok(())
}

#[test]
fn test_append_to_log_file_shouldAppendTimestampedLines() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = temp_dir.path().join("run.log");

    FileManager::append_to_log_file(&path, "first")?;
    FileManager::append_to_log_file(&path, "second")?;

    let content = fs::read_to_string(&path)?;
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with('[') && lines[0].ends_with("] first"));
    assert!(lines[1].ends_with("] second"));
    Ok(())
}

#[test]
fn test_page_store_shouldStorePagesById() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let store = PageStore::new(temp_dir.path().join("pages"));

    assert!(!store.exists("help-1"));
    assert!(store.list()?.is_empty());

    let path = store.write("help-1", "<main>本文</main>")?;

    assert_eq!(path, temp_dir.path().join("pages").join("help-1.html"));
    assert!(store.exists("help-1"));
    assert_eq!(store.read("help-1")?, "<main>本文</main>");
    assert_eq!(store.list()?, vec![path]);
    Ok(())
}
