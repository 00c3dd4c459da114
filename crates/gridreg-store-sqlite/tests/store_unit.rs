// crates/gridreg-store-sqlite/tests/store_unit.rs
// ============================================================================
// Module: SQLite Store Tests
// Description: Validate Gridreg store behavior.
// Purpose: Ensure constraints, cascades, ordering, and read markers hold.
// Dependencies: gridreg-store-sqlite, gridreg-core, tempfile
// ============================================================================

//! ## Overview
//! Conformance tests for the relational store: unique-code rejection,
//! cascade deletion of owned rows, parameter full-replace round-trips, list
//! filtering, and notification read markers.

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

use gridreg_core::ChangeType;
use gridreg_core::DocumentType;
use gridreg_core::EntityType;
use gridreg_core::NotificationType;
use gridreg_core::RegulationStatus;
use gridreg_core::Role;
use gridreg_store_sqlite::NewCodeFile;
use gridreg_store_sqlite::NewDocument;
use gridreg_store_sqlite::NewParameter;
use gridreg_store_sqlite::NewRegulation;
use gridreg_store_sqlite::RegulationFilter;
use gridreg_store_sqlite::RegulationUpdate;
use gridreg_store_sqlite::Store;
use gridreg_store_sqlite::StoreConfig;
use gridreg_store_sqlite::StoreError;
use tempfile::TempDir;

// ============================================================================
// SECTION: Helpers
// ============================================================================

fn new_regulation(code: &str, name: &str) -> NewRegulation {
    NewRegulation {
        code: code.to_string(),
        name: name.to_string(),
        status: Some(RegulationStatus::Active),
        ..NewRegulation::default()
    }
}

fn parameter(name: &str, protocol_bit: &str) -> NewParameter {
    NewParameter {
        parameter_name: name.to_string(),
        protocol_bit: protocol_bit.to_string(),
        ..NewParameter::default()
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[test]
fn store_persists_across_reopen() {
    let temp = TempDir::new().unwrap();
    let config = StoreConfig {
        path: temp.path().join("regulations.db"),
        busy_timeout_ms: 1_000,
    };
    {
        let store = Store::open(&config).unwrap();
        store.insert_regulation(&new_regulation("VDE-4105", "Grid connection LV")).unwrap();
    }
    let store = Store::open(&config).unwrap();
    let found = store.regulation_by_code("VDE-4105").unwrap();
    assert!(found.is_some());
}

#[test]
fn duplicate_code_is_a_constraint_violation_and_inserts_nothing() {
    let store = Store::open_in_memory().unwrap();
    store.insert_regulation(&new_regulation("G99", "GB interconnection")).unwrap();
    let err = store.insert_regulation(&new_regulation("G99", "Other name")).unwrap_err();
    assert!(matches!(err, StoreError::Constraint(_)));
    let all = store.list_regulations(&RegulationFilter::default()).unwrap();
    assert_eq!(all.len(), 1);
}

#[test]
fn tags_are_created_once_and_replaced_on_update() {
    let store = Store::open_in_memory().unwrap();
    let mut new = new_regulation("EN50549", "EU LV requirements");
    new.tags = vec!["lv".to_string(), "eu".to_string()];
    let created = store.insert_regulation(&new).unwrap();
    assert_eq!(created.tags, vec!["lv".to_string(), "eu".to_string()]);

    let mut other = new_regulation("EN50549-2", "EU MV requirements");
    other.tags = vec!["eu".to_string(), "mv".to_string()];
    let second = store.insert_regulation(&other).unwrap();
    // "eu" resolved to the existing tag rather than a duplicate.
    assert_eq!(second.tags, vec!["eu".to_string(), "mv".to_string()]);

    let update = RegulationUpdate {
        tags: Some(vec!["hv".to_string()]),
        ..RegulationUpdate::default()
    };
    let updated = store.update_regulation(created.id, &update).unwrap();
    assert_eq!(updated.tags, vec!["hv".to_string()]);
}

#[test]
fn partial_update_keeps_absent_fields() {
    let store = Store::open_in_memory().unwrap();
    let mut new = new_regulation("IEEE1547", "US interconnection");
    new.country = Some("US".to_string());
    let created = store.insert_regulation(&new).unwrap();

    let update = RegulationUpdate {
        name: Some("US interconnection 2018".to_string()),
        ..RegulationUpdate::default()
    };
    let updated = store.update_regulation(created.id, &update).unwrap();
    assert_eq!(updated.name, "US interconnection 2018");
    assert_eq!(updated.country.as_deref(), Some("US"));
    assert_eq!(updated.code, "IEEE1547");
}

#[test]
fn delete_cascades_to_owned_rows_only() {
    let store = Store::open_in_memory().unwrap();
    let kept = store.insert_regulation(&new_regulation("KEEP", "Kept")).unwrap();
    let doomed = store.insert_regulation(&new_regulation("DOOM", "Doomed")).unwrap();

    for index in 0..2 {
        store
            .insert_document(&NewDocument {
                regulation_id: doomed.id,
                doc_type: DocumentType::Pdf,
                file_name: format!("doc{index}.pdf"),
                file_path: format!("/managed/doc{index}.pdf"),
                file_size: Some(100),
                upload_by: None,
            })
            .unwrap();
    }
    store
        .insert_code_file(&NewCodeFile {
            regulation_id: doomed.id,
            file_name: "params.c".to_string(),
            file_path: "/managed/params.c".to_string(),
            description: None,
            usage_guide: None,
            version: None,
            created_by: None,
        })
        .unwrap();
    store.replace_parameters(doomed.id, &[parameter("Vmax", "P01")]).unwrap();
    store
        .insert_document(&NewDocument {
            regulation_id: kept.id,
            doc_type: DocumentType::Docx,
            file_name: "kept.docx".to_string(),
            file_path: "/managed/kept.docx".to_string(),
            file_size: None,
            upload_by: None,
        })
        .unwrap();

    store.delete_regulation(doomed.id).unwrap();

    assert!(store.regulation_by_id(doomed.id).unwrap().is_none());
    assert!(store.documents_for(doomed.id).unwrap().is_empty());
    assert!(store.code_files_for(doomed.id).unwrap().is_empty());
    assert_eq!(store.parameter_count(doomed.id).unwrap(), 0);
    assert_eq!(store.documents_for(kept.id).unwrap().len(), 1);
}

#[test]
fn delete_missing_regulation_reports_not_found() {
    let store = Store::open_in_memory().unwrap();
    let created = store.insert_regulation(&new_regulation("ONE", "One")).unwrap();
    store.delete_regulation(created.id).unwrap();
    let err = store.delete_regulation(created.id).unwrap_err();
    assert!(matches!(err, StoreError::NotFound(_)));
}

#[test]
fn list_filters_compose() {
    let store = Store::open_in_memory().unwrap();
    let mut a = new_regulation("A-1", "Voltage ride through");
    a.country = Some("DE".to_string());
    a.tags = vec!["lvrt".to_string()];
    store.insert_regulation(&a).unwrap();
    let mut b = new_regulation("B-1", "Frequency response");
    b.country = Some("DE".to_string());
    store.insert_regulation(&b).unwrap();
    let mut c = new_regulation("C-1", "Voltage limits");
    c.country = Some("FR".to_string());
    store.insert_regulation(&c).unwrap();

    let by_country = store
        .list_regulations(&RegulationFilter {
            country: Some("DE".to_string()),
            ..RegulationFilter::default()
        })
        .unwrap();
    assert_eq!(by_country.len(), 2);

    let by_keyword = store
        .list_regulations(&RegulationFilter {
            keyword: Some("Voltage".to_string()),
            ..RegulationFilter::default()
        })
        .unwrap();
    assert_eq!(by_keyword.len(), 2);

    let by_both = store
        .list_regulations(&RegulationFilter {
            country: Some("DE".to_string()),
            keyword: Some("Voltage".to_string()),
            ..RegulationFilter::default()
        })
        .unwrap();
    assert_eq!(by_both.len(), 1);
    assert_eq!(by_both[0].code, "A-1");

    let by_tag = store
        .list_regulations(&RegulationFilter {
            tags: vec!["lvrt".to_string()],
            ..RegulationFilter::default()
        })
        .unwrap();
    assert_eq!(by_tag.len(), 1);
    assert_eq!(by_tag[0].code, "A-1");
}

#[test]
fn parameters_round_trip_with_row_order() {
    let store = Store::open_in_memory().unwrap();
    let regulation = store.insert_regulation(&new_regulation("PARAM", "Parameters")).unwrap();
    let rows = vec![
        NewParameter {
            category: "Protection".to_string(),
            parameter_name: "Over-voltage".to_string(),
            default_value: "120".to_string(),
            coefficient: "10".to_string(),
            protocol_bit: "P01".to_string(),
            ..NewParameter::default()
        },
        parameter("Under-voltage", "P02"),
        parameter("Over-frequency", "-"),
    ];
    let inserted = store.replace_parameters(regulation.id, &rows).unwrap();
    assert_eq!(inserted, 3);

    let loaded = store.parameters_for(regulation.id).unwrap();
    assert_eq!(loaded.len(), 3);
    for (index, row) in loaded.iter().enumerate() {
        assert_eq!(row.row_order, i64::try_from(index).unwrap());
    }
    assert_eq!(loaded[0].parameter_name, "Over-voltage");
    assert_eq!(loaded[0].default_value, "120");
    assert_eq!(loaded[2].protocol_bit, "-");

    // Replace is destructive; saving a shorter table drops the tail.
    store.replace_parameters(regulation.id, &rows[..1]).unwrap();
    assert_eq!(store.parameter_count(regulation.id).unwrap(), 1);
}

#[test]
fn history_appends_and_lists_in_order() {
    let store = Store::open_in_memory().unwrap();
    let regulation = store.insert_regulation(&new_regulation("HIST", "History")).unwrap();
    store
        .insert_history(
            EntityType::Regulation,
            regulation.id.get(),
            ChangeType::Create,
            Some("{\"code\":\"HIST\"}"),
            Some("created"),
            None,
        )
        .unwrap();
    store
        .insert_history(
            EntityType::Regulation,
            regulation.id.get(),
            ChangeType::Update,
            None,
            Some("renamed"),
            None,
        )
        .unwrap();

    let records = store.history_for_entity(EntityType::Regulation, regulation.id.get()).unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].change_type, ChangeType::Create);
    assert_eq!(records[1].change_type, ChangeType::Update);

    let recent = store.recent_history(1).unwrap();
    assert_eq!(recent.len(), 1);
    assert_eq!(recent[0].change_type, ChangeType::Update);
}

#[test]
fn unread_count_tracks_read_markers() {
    let store = Store::open_in_memory().unwrap();
    for index in 0..3 {
        store
            .insert_notification(
                NotificationType::Software,
                &format!("Release {index}"),
                None,
                Some("1.2.0"),
                None,
            )
            .unwrap();
    }
    let listed = store.list_notifications(10).unwrap();
    assert_eq!(listed.len(), 3);
    store.mark_notification_read(listed[0].id).unwrap();
    assert_eq!(store.unread_notification_count().unwrap(), 2);
    store.mark_all_notifications_read().unwrap();
    assert_eq!(store.unread_notification_count().unwrap(), 0);
    let cleared = store.clear_notifications().unwrap();
    assert_eq!(cleared, 3);
}

#[test]
fn usernames_are_unique_and_roles_round_trip() {
    let store = Store::open_in_memory().unwrap();
    let user = store.insert_user("alice", "hash-a", None, Role::Admin).unwrap();
    assert_eq!(user.role, Role::Admin);
    let err = store.insert_user("alice", "hash-b", None, Role::Viewer).unwrap_err();
    assert!(matches!(err, StoreError::Constraint(_)));

    store.update_user_role(user.id, Role::Editor).unwrap();
    let reloaded = store.user_by_id(user.id).unwrap().unwrap();
    assert_eq!(reloaded.role, Role::Editor);
}
