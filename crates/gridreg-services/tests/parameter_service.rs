// crates/gridreg-services/tests/parameter_service.rs
// ============================================================================
// Module: Parameter Service Tests
// Description: Validate grid save/load and code generation via the service.
// Purpose: Ensure replace semantics, placeholders, and template rewrites.
// Dependencies: gridreg-services, gridreg-core, gridreg-store-sqlite, tempfile
// ============================================================================

//! ## Overview
//! Parameter grids round-trip through the destructive-replace save: field
//! values and row order survive, image cells persist as the fixed
//! placeholder, and the code generator reads the stored rows to rewrite a
//! template without touching the database.

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

use gridreg_core::Field;
use gridreg_core::IMAGE_PLACEHOLDER;
use gridreg_core::ImageRef;
use gridreg_core::ParamCell;
use gridreg_core::ParameterGrid;
use gridreg_core::RegulationStatus;
use gridreg_core::SchemaWidth;
use gridreg_services::ParameterService;
use gridreg_store_sqlite::NewRegulation;
use gridreg_store_sqlite::Store;
use tempfile::TempDir;

// ============================================================================
// SECTION: Helpers
// ============================================================================

fn regulation(store: &Store) -> gridreg_core::Regulation {
    store
        .insert_regulation(&NewRegulation {
            code: "PARAMS".to_string(),
            name: "Parameter host".to_string(),
            status: Some(RegulationStatus::Active),
            ..NewRegulation::default()
        })
        .unwrap()
}

fn extended_row(values: [&str; 9]) -> Vec<String> {
    values.into_iter().map(str::to_string).collect()
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[test]
fn save_then_load_round_trips_values_and_order() {
    let store = Store::open_in_memory().unwrap();
    let service = ParameterService::new(&store);
    let host = regulation(&store);

    let mut grid = ParameterGrid::new(SchemaWidth::Extended);
    grid.push_text_row(extended_row([
        "Protection",
        "Over-voltage",
        "120",
        "130",
        "110",
        "V",
        "10",
        "P01",
        "note",
    ]));
    grid.push_text_row(extended_row([
        "", "Under-voltage", "-", "100", "80", "V", "-", "P02", "",
    ]));

    let saved = service.save_grid(None, host.id, &grid).unwrap();
    assert_eq!(saved, 2);

    let loaded = service.load_grid(host.id).unwrap();
    assert_eq!(loaded.len(), 2);
    assert_eq!(loaded.field_text(0, Field::Name), "Over-voltage");
    assert_eq!(loaded.field_text(0, Field::Coefficient), "10");
    assert_eq!(loaded.field_text(1, Field::Default), "-");
    assert_eq!(loaded.field_text(1, Field::ProtocolBit), "P02");

    // Saving again replaces rather than appends.
    let saved = service.save_grid(None, host.id, &loaded).unwrap();
    assert_eq!(saved, 2);
    assert_eq!(store.parameter_count(host.id).unwrap(), 2);
}

#[test]
fn image_cells_persist_as_placeholder() {
    let store = Store::open_in_memory().unwrap();
    let service = ParameterService::new(&store);
    let host = regulation(&store);

    let mut grid = ParameterGrid::new(SchemaWidth::Extended);
    grid.push_text_row(extended_row([
        "Cat", "With image", "1", "2", "0", "V", "1", "P01", "",
    ]));
    if let Some(cell) = grid.cell_mut(0, 8) {
        *cell = ParamCell::Image(ImageRef {
            image_id: Some("AB12".to_string()),
            data: vec![1, 2, 3],
        });
    }
    service.save_grid(None, host.id, &grid).unwrap();

    let rows = store.parameters_for(host.id).unwrap();
    assert_eq!(rows[0].remark, IMAGE_PLACEHOLDER);
}

#[test]
fn generate_code_rewrites_template_from_stored_rows() {
    let temp = TempDir::new().unwrap();
    let store = Store::open_in_memory().unwrap();
    let service = ParameterService::new(&store);
    let host = regulation(&store);

    let mut grid = ParameterGrid::new(SchemaWidth::Extended);
    grid.push_text_row(extended_row([
        "Cat", "Over-voltage", "120", "130", "110", "V", "10", "P01", "",
    ]));
    grid.push_text_row(extended_row([
        "Cat", "Placeholder", "-", "1", "0", "V", "1", "P02", "",
    ]));
    service.save_grid(None, host.id, &grid).unwrap();

    let template_path = temp.path().join("template.c");
    fs::write(
        &template_path,
        "// h1\n// h2\n// h3\n// h4\n\
             {   0 ,   0 ,   500 },   // P01 over-voltage\n\
             {   9 ,   1 ,   100 },   // P02 placeholder\n\
             {   7 ,   2 ,   300 },   // P77 unknown\n\
         };\n",
    )
    .unwrap();
    let output_path = temp.path().join("out.c");
    let report = service.generate_code(host.id, &template_path, &output_path).unwrap();
    assert_eq!(report.lines_rewritten, 3);
    assert_eq!(report.unknown_bits, 1);

    let generated = fs::read_to_string(&output_path).unwrap();
    assert!(generated.contains("{   12      ,   0      ,   500    },   // P01 over-voltage"));
    assert!(generated.contains("{   0       ,   1      ,   100    },   // P02 placeholder"));
    assert!(generated.contains("{   0       ,   2      ,   300    },   // P77 unknown"));
    // Generation never mutates the table.
    assert_eq!(store.parameter_count(host.id).unwrap(), 2);
}

#[test]
fn missing_template_is_a_source_file_error() {
    let temp = TempDir::new().unwrap();
    let store = Store::open_in_memory().unwrap();
    let service = ParameterService::new(&store);
    let host = regulation(&store);
    let err = service
        .generate_code(host.id, &temp.path().join("absent.c"), &temp.path().join("out.c"))
        .unwrap_err();
    assert!(matches!(err, gridreg_core::ServiceError::SourceFile(_)));
}
