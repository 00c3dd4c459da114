// crates/gridreg-services/tests/regulation_service.rs
// ============================================================================
// Module: Regulation Service Tests
// Description: Validate regulation lifecycle through the service layer.
// Purpose: Ensure taxonomy mapping, storage copies, and two-phase delete.
// Dependencies: gridreg-services, gridreg-config, gridreg-core, gridreg-store-sqlite, tempfile
// ============================================================================

//! ## Overview
//! End-to-end service tests over an in-memory store and a temporary managed
//! storage tree: duplicate rejection, partial updates with history, file
//! uploads copied into managed directories, cascade delete with storage
//! cleanup, and role-based permission failures.

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
use std::path::Path;

use gridreg_config::AppConfig;
use gridreg_core::ChangeType;
use gridreg_core::DocumentType;
use gridreg_core::EntityType;
use gridreg_core::Role;
use gridreg_core::ServiceError;
use gridreg_core::User;
use gridreg_services::CreateRegulation;
use gridreg_services::RegulationService;
use gridreg_services::SearchService;
use gridreg_services::UpdateRegulation;
use gridreg_store_sqlite::RegulationFilter;
use gridreg_store_sqlite::Store;
use tempfile::TempDir;

// ============================================================================
// SECTION: Helpers
// ============================================================================

fn storage_config(root: &Path) -> AppConfig {
    AppConfig {
        data_dir: root.to_path_buf(),
        ..AppConfig::default()
    }
}

fn admin(store: &Store) -> User {
    store.insert_user("admin", "hash", None, Role::Admin).unwrap()
}

fn viewer(store: &Store) -> User {
    store.insert_user("viewer", "hash", None, Role::Viewer).unwrap()
}

fn create_input(code: &str) -> CreateRegulation {
    CreateRegulation {
        code: code.to_string(),
        name: format!("Regulation {code}"),
        ..CreateRegulation::default()
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[test]
fn duplicate_code_fails_and_inserts_nothing() {
    let temp = TempDir::new().unwrap();
    let store = Store::open_in_memory().unwrap();
    let service = RegulationService::new(&store, storage_config(temp.path()).storage());

    service.create(None, create_input("G99")).unwrap();
    let err = service.create(None, create_input("G99")).unwrap_err();
    assert!(matches!(err, ServiceError::Duplicate(_)));
    assert_eq!(service.list(&RegulationFilter::default()).unwrap().len(), 1);
}

#[test]
fn blank_code_or_name_is_a_validation_error() {
    let temp = TempDir::new().unwrap();
    let store = Store::open_in_memory().unwrap();
    let service = RegulationService::new(&store, storage_config(temp.path()).storage());

    let err = service.create(None, create_input(" ")).unwrap_err();
    assert!(matches!(err, ServiceError::Validation(_)));
    let mut input = create_input("OK");
    input.name = String::new();
    let err = service.create(None, input).unwrap_err();
    assert!(matches!(err, ServiceError::Validation(_)));
}

#[test]
fn create_and_update_record_history_with_snapshots() {
    let temp = TempDir::new().unwrap();
    let store = Store::open_in_memory().unwrap();
    let service = RegulationService::new(&store, storage_config(temp.path()).storage());
    let actor = admin(&store);

    let created = service.create(Some(&actor), create_input("EN50549")).unwrap();
    let update = UpdateRegulation {
        name: Some("Renamed".to_string()),
        ..UpdateRegulation::default()
    };
    service.update(Some(&actor), created.id, update).unwrap();

    let records =
        store.history_for_entity(EntityType::Regulation, created.id.get()).unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].change_type, ChangeType::Create);
    assert_eq!(records[1].change_type, ChangeType::Update);
    // The update payload carries before/after snapshots.
    let payload: serde_json::Value =
        serde_json::from_str(records[1].change_data.as_deref().unwrap()).unwrap();
    assert_eq!(payload["old"]["name"], "Regulation EN50549");
    assert_eq!(payload["new"]["name"], "Renamed");
}

#[test]
fn update_missing_regulation_is_not_found() {
    let temp = TempDir::new().unwrap();
    let store = Store::open_in_memory().unwrap();
    let service = RegulationService::new(&store, storage_config(temp.path()).storage());
    let created = service.create(None, create_input("X")).unwrap();
    service.delete(None, created.id).unwrap();
    let err = service
        .update(None, created.id, UpdateRegulation::default())
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));
}

#[test]
fn uploads_copy_into_managed_storage() {
    let temp = TempDir::new().unwrap();
    let store = Store::open_in_memory().unwrap();
    let config = storage_config(&temp.path().join("data"));
    let service = RegulationService::new(&store, config.storage());
    let regulation = service.create(None, create_input("UPLOAD")).unwrap();

    let source = temp.path().join("grid_code.pdf");
    fs::write(&source, b"pdf bytes").unwrap();
    let document = service
        .add_document(None, regulation.id, &source, DocumentType::Pdf)
        .unwrap();
    assert_eq!(document.file_name, "grid_code.pdf");
    // The metadata row references the managed copy, not the original.
    assert!(document.file_path.contains("documents"));
    assert!(Path::new(&document.file_path).exists());
    assert_eq!(fs::read(&document.file_path).unwrap(), b"pdf bytes");

    let code_source = temp.path().join("params.c");
    fs::write(&code_source, b"int x;").unwrap();
    let code_file = service
        .add_code_file(None, regulation.id, &code_source, None, None, Some("1.0".to_string()))
        .unwrap();
    assert!(Path::new(&code_file.file_path).exists());
}

#[test]
fn missing_upload_source_is_a_source_file_error() {
    let temp = TempDir::new().unwrap();
    let store = Store::open_in_memory().unwrap();
    let service = RegulationService::new(&store, storage_config(temp.path()).storage());
    let regulation = service.create(None, create_input("SRC")).unwrap();
    let err = service
        .add_document(
            None,
            regulation.id,
            &temp.path().join("missing.pdf"),
            DocumentType::Pdf,
        )
        .unwrap_err();
    assert!(matches!(err, ServiceError::SourceFile(_)));
}

#[test]
fn delete_removes_rows_and_storage_directories() {
    let temp = TempDir::new().unwrap();
    let store = Store::open_in_memory().unwrap();
    let config = storage_config(&temp.path().join("data"));
    let service = RegulationService::new(&store, config.storage());
    let actor = admin(&store);

    let regulation = service.create(Some(&actor), create_input("DOOM")).unwrap();
    let source = temp.path().join("doc.pdf");
    fs::write(&source, b"bytes").unwrap();
    service
        .add_document(Some(&actor), regulation.id, &source, DocumentType::Pdf)
        .unwrap();
    let doc_dir = config.storage().documents_dir(regulation.id.get());
    assert!(doc_dir.exists());

    let outcome = service.delete(Some(&actor), regulation.id).unwrap();
    assert!(outcome.warnings.is_empty());
    assert!(!doc_dir.exists());
    assert!(matches!(service.get(regulation.id), Err(ServiceError::NotFound(_))));

    // The delete snapshot was recorded before the row disappeared.
    let records =
        store.history_for_entity(EntityType::Regulation, regulation.id.get()).unwrap();
    assert!(records.iter().any(|record| record.change_type == ChangeType::Delete));
}

#[test]
fn viewer_cannot_mutate() {
    let temp = TempDir::new().unwrap();
    let store = Store::open_in_memory().unwrap();
    let service = RegulationService::new(&store, storage_config(temp.path()).storage());
    let actor = viewer(&store);

    let err = service.create(Some(&actor), create_input("NOPE")).unwrap_err();
    assert!(matches!(err, ServiceError::Permission(_)));

    let editor = store.insert_user("editor", "hash", None, Role::Editor).unwrap();
    let regulation = service.create(Some(&editor), create_input("EDIT")).unwrap();
    // Editors write but do not delete.
    let err = service.delete(Some(&editor), regulation.id).unwrap_err();
    assert!(matches!(err, ServiceError::Permission(_)));
}

#[test]
fn search_matches_list_semantics() {
    let temp = TempDir::new().unwrap();
    let store = Store::open_in_memory().unwrap();
    let service = RegulationService::new(&store, storage_config(temp.path()).storage());
    let mut input = create_input("SEARCH-1");
    input.name = "Voltage ride through".to_string();
    input.country = Some("DE".to_string());
    service.create(None, input).unwrap();
    let mut other = create_input("SEARCH-2");
    other.name = "Frequency response".to_string();
    service.create(None, other).unwrap();

    let search = SearchService::new(&store);
    let hits = search.search("Voltage", None, None).unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].code, "SEARCH-1");
    let scoped = search.search("Voltage", Some("FR"), None).unwrap();
    assert!(scoped.is_empty());
}
