// crates/gridreg-services/tests/bulk_import.rs
// ============================================================================
// Module: Bulk Import Tests
// Description: Validate JSON regulation import with per-row collection.
// Purpose: Ensure skip, overwrite, fallback, and partial-failure behavior.
// Dependencies: gridreg-services, gridreg-core, gridreg-store-sqlite, tempfile
// ============================================================================

//! ## Overview
//! Bulk import never aborts on a single bad record: failures collect into
//! the stats, existing codes skip unless overwriting, invalid status labels
//! fall back to active, and re-importing the same document is idempotent on
//! the skip path.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only assertions and helpers are permitted."
)]

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::path::PathBuf;

use gridreg_core::RegulationStatus;
use gridreg_core::ServiceError;
use gridreg_services::RegulationImporter;
use gridreg_store_sqlite::Store;
use tempfile::TempDir;

// ============================================================================
// SECTION: Helpers
// ============================================================================

fn write_document(temp: &TempDir, body: &str) -> PathBuf {
    let path = temp.path().join("import.json");
    fs::write(&path, body).unwrap();
    path
}

const DOCUMENT: &str = r#"{
  "regulations": [
    {"code": "VDE-4105", "name": "LV interconnection", "country": "DE",
     "status": "active", "tags": ["lv", "de"]},
    {"code": "G99", "name": "GB interconnection", "status": "not-a-status"},
    {"code": "", "name": "Nameless"},
    {"code": "NO-NAME"}
  ]
}"#;

// ============================================================================
// SECTION: Tests
// ============================================================================

#[test]
fn partial_failures_never_abort_the_run() {
    let temp = TempDir::new().unwrap();
    let store = Store::open_in_memory().unwrap();
    let importer = RegulationImporter::new(&store);
    let path = write_document(&temp, DOCUMENT);

    let stats = importer.import_json(&path, None, false).unwrap();
    assert_eq!(stats.total, 4);
    assert_eq!(stats.succeeded, 2);
    assert_eq!(stats.failed, 2);
    assert_eq!(stats.skipped, 0);
    assert_eq!(stats.errors.len(), 2);

    // Invalid status fell back to active.
    let imported = store.regulation_by_code("G99").unwrap().unwrap();
    assert_eq!(imported.status, RegulationStatus::Active);
    let tagged = store.regulation_by_code("VDE-4105").unwrap().unwrap();
    assert_eq!(tagged.tags, vec!["lv".to_string(), "de".to_string()]);
}

#[test]
fn existing_codes_skip_unless_overwriting() {
    let temp = TempDir::new().unwrap();
    let store = Store::open_in_memory().unwrap();
    let importer = RegulationImporter::new(&store);
    let path = write_document(&temp, DOCUMENT);

    importer.import_json(&path, None, false).unwrap();
    let second = importer.import_json(&path, None, false).unwrap();
    assert_eq!(second.succeeded, 0);
    assert_eq!(second.skipped, 2);

    let overwrite_doc = r#"{"regulations": [
        {"code": "G99", "name": "GB interconnection 2026", "status": "archived"}
    ]}"#;
    let overwrite_path = temp.path().join("overwrite.json");
    fs::write(&overwrite_path, overwrite_doc).unwrap();
    let third = importer.import_json(&overwrite_path, None, true).unwrap();
    assert_eq!(third.succeeded, 1);
    let updated = store.regulation_by_code("G99").unwrap().unwrap();
    assert_eq!(updated.name, "GB interconnection 2026");
    assert_eq!(updated.status, RegulationStatus::Archived);
}

#[test]
fn unreadable_or_empty_documents_fail_up_front() {
    let temp = TempDir::new().unwrap();
    let store = Store::open_in_memory().unwrap();
    let importer = RegulationImporter::new(&store);

    let err = importer
        .import_json(&temp.path().join("absent.json"), None, false)
        .unwrap_err();
    assert!(matches!(err, ServiceError::SourceFile(_)));

    let empty = write_document(&temp, r#"{"regulations": []}"#);
    let err = importer.import_json(&empty, None, false).unwrap_err();
    assert!(matches!(err, ServiceError::Validation(_)));
}
