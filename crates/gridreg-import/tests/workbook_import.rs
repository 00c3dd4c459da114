// crates/gridreg-import/tests/workbook_import.rs
// ============================================================================
// Module: Workbook Import Tests
// Description: Validate xlsx import end to end against built packages.
// Purpose: Ensure row selection, image detection, and reconciliation hold.
// Dependencies: gridreg-import, gridreg-core, zip, tempfile
// ============================================================================

//! ## Overview
//! These tests assemble real xlsx packages with the zip writer and run the
//! importer against them: plain text rows, shared strings, vendor image
//! formulas with loose media, drawing-anchored images, and the idempotence
//! of repeated imports.

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

use std::io::Cursor;
use std::io::Write;

use gridreg_core::Field;
use gridreg_core::ParamCell;
use gridreg_core::SchemaWidth;
use gridreg_core::merge_category_spans;
use gridreg_import::import_workbook_bytes;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

// ============================================================================
// SECTION: Package Builders
// ============================================================================

/// Builds an xlsx package from named parts.
fn build_package(parts: &[(&str, &[u8])]) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default();
    for (name, data) in parts {
        writer.start_file(name.to_string(), options).unwrap();
        writer.write_all(data).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

/// Renders one worksheet row of inline-string cells starting at column A.
fn sheet_row(row_number: u32, values: &[&str]) -> String {
    let mut cells = String::new();
    for (index, value) in values.iter().enumerate() {
        let column = char::from(b'A' + u8::try_from(index).unwrap());
        if value.starts_with("=_xlfn.DISPIMG") {
            cells.push_str(&format!(
                "<c r=\"{column}{row_number}\" t=\"str\"><f>{}</f><v>0</v></c>",
                value.trim_start_matches('=')
            ));
        } else if !value.is_empty() {
            cells.push_str(&format!(
                "<c r=\"{column}{row_number}\" t=\"inlineStr\"><is><t>{value}</t></is></c>"
            ));
        }
    }
    format!("<row r=\"{row_number}\">{cells}</row>")
}

/// Wraps rows into a worksheet document.
fn sheet_xml(rows: &[String]) -> String {
    format!("<worksheet><sheetData>{}</sheetData></worksheet>", rows.join(""))
}

const HEADER: &[&str] = &[
    "Category", "Parameter", "Default", "Upper", "Lower", "Unit", "Coefficient", "Protocol",
    "Remark",
];

// ============================================================================
// SECTION: Tests
// ============================================================================

#[test]
fn imports_text_rows_skipping_header_and_blanks() {
    let rows = vec![
        sheet_row(1, HEADER),
        sheet_row(2, &["Protection", "Over-voltage", "120", "130", "110", "V", "10", "P01", ""]),
        sheet_row(3, &["", "", "", "", "", "", "", "", ""]),
        sheet_row(4, &["", "Under-voltage", "90", "100", "80", "V", "10", "P02", "note"]),
    ];
    let bytes =
        build_package(&[("xl/worksheets/sheet1.xml", sheet_xml(&rows).as_bytes())]);
    let (grid, summary) = import_workbook_bytes(&bytes, SchemaWidth::Extended).unwrap();

    assert_eq!(summary.rows_imported, 2);
    assert_eq!(summary.image_formulas, 0);
    assert_eq!(grid.field_text(0, Field::Name), "Over-voltage");
    assert_eq!(grid.field_text(0, Field::Coefficient), "10");
    assert_eq!(grid.field_text(1, Field::ProtocolBit), "P02");
    assert_eq!(grid.field_text(1, Field::Remark), "note");
}

#[test]
fn shared_strings_resolve() {
    let sheet = "<worksheet><sheetData>\
                 <row r=\"1\"><c r=\"A1\" t=\"s\"><v>0</v></c></row>\
                 <row r=\"2\"><c r=\"A2\" t=\"s\"><v>1</v></c></row>\
                 </sheetData></worksheet>";
    let shared = "<sst><si><t>Header</t></si><si><t>Protection</t></si></sst>";
    let bytes = build_package(&[
        ("xl/worksheets/sheet1.xml", sheet.as_bytes()),
        ("xl/sharedStrings.xml", shared.as_bytes()),
    ]);
    let (grid, _) = import_workbook_bytes(&bytes, SchemaWidth::Compact).unwrap();
    assert_eq!(grid.len(), 1);
    assert_eq!(grid.field_text(0, Field::Category), "Protection");
}

#[test]
fn loose_media_matches_formula_positions_in_file_order() {
    let rows = vec![
        sheet_row(1, HEADER),
        sheet_row(
            2,
            &["Cat", "P-one", "1", "2", "0", "V", "1", "P01", "=_xlfn.DISPIMG(\"ID_AAAA\",1)"],
        ),
        sheet_row(
            3,
            &["Cat", "P-two", "1", "2", "0", "V", "1", "P02", "=_xlfn.DISPIMG(\"ID_BBBB\",1)"],
        ),
    ];
    let bytes = build_package(&[
        ("xl/worksheets/sheet1.xml", sheet_xml(&rows).as_bytes()),
        ("xl/media/image1.png", b"png-one"),
        ("xl/media/image2.png", b"png-two"),
    ]);
    let (grid, summary) = import_workbook_bytes(&bytes, SchemaWidth::Extended).unwrap();

    assert_eq!(summary.image_formulas, 2);
    assert_eq!(summary.media_entries, 2);
    assert_eq!(summary.images_resolved, 2);
    assert_eq!(summary.images_unresolved, 0);
    // File order pairs image1 with the first formula position.
    match &grid.rows()[0].cells[8] {
        ParamCell::Image(image) => {
            assert_eq!(image.data, b"png-one");
            assert_eq!(image.image_id.as_deref(), Some("AAAA"));
        }
        other => panic!("expected image cell, got {other:?}"),
    }
    match &grid.rows()[1].cells[8] {
        ParamCell::Image(image) => assert_eq!(image.data, b"png-two"),
        other => panic!("expected image cell, got {other:?}"),
    }
}

#[test]
fn missing_media_yields_unresolved_placeholder() {
    let rows = vec![
        sheet_row(1, HEADER),
        sheet_row(
            2,
            &["Cat", "P-one", "1", "2", "0", "V", "1", "P01", "=_xlfn.DISPIMG(\"ID_AAAA\",1)"],
        ),
    ];
    let bytes =
        build_package(&[("xl/worksheets/sheet1.xml", sheet_xml(&rows).as_bytes())]);
    let (grid, summary) = import_workbook_bytes(&bytes, SchemaWidth::Extended).unwrap();

    assert_eq!(summary.image_formulas, 1);
    assert_eq!(summary.images_resolved, 0);
    assert_eq!(summary.images_unresolved, 1);
    assert_eq!(grid.rows()[0].cells[8], ParamCell::UnresolvedImage);
}

#[test]
fn anchored_image_lands_at_its_cell() {
    let rows = vec![
        sheet_row(1, &["Category", "Parameter", "Default", "Upper", "Lower", "Unit", "Remark"]),
        sheet_row(2, &["Cat", "P-one", "1", "2", "0", "V", ""]),
    ];
    let drawing = "<xdr:wsDr><xdr:twoCellAnchor>\
         <xdr:from><xdr:col>6</xdr:col><xdr:row>1</xdr:row></xdr:from>\
         <xdr:pic><xdr:blipFill><a:blip r:embed=\"rId1\"/></xdr:blipFill></xdr:pic>\
         </xdr:twoCellAnchor></xdr:wsDr>";
    let rels = "<Relationships>\
                <Relationship Id=\"rId1\" Target=\"../media/image1.png\"/>\
                </Relationships>";
    let bytes = build_package(&[
        ("xl/worksheets/sheet1.xml", sheet_xml(&rows).as_bytes()),
        ("xl/media/image1.png", b"anchored-bytes"),
        ("xl/drawings/drawing1.xml", drawing.as_bytes()),
        ("xl/drawings/_rels/drawing1.xml.rels", rels.as_bytes()),
    ]);
    let (grid, summary) = import_workbook_bytes(&bytes, SchemaWidth::Compact).unwrap();

    assert_eq!(summary.images_resolved, 1);
    match &grid.rows()[0].cells[6] {
        ParamCell::Image(image) => assert_eq!(image.data, b"anchored-bytes"),
        other => panic!("expected image cell, got {other:?}"),
    }
}

#[test]
fn import_is_idempotent() {
    let rows = vec![
        sheet_row(1, HEADER),
        sheet_row(2, &["A", "P-one", "1", "2", "0", "V", "1", "P01", ""]),
        sheet_row(3, &["A", "P-two", "3", "4", "2", "V", "1", "P02", ""]),
    ];
    let bytes =
        build_package(&[("xl/worksheets/sheet1.xml", sheet_xml(&rows).as_bytes())]);
    let (first, first_summary) = import_workbook_bytes(&bytes, SchemaWidth::Extended).unwrap();
    let (second, second_summary) = import_workbook_bytes(&bytes, SchemaWidth::Extended).unwrap();
    assert_eq!(first, second);
    assert_eq!(first_summary, second_summary);
}

#[test]
fn category_spans_merge_after_import() {
    let rows = vec![
        sheet_row(1, HEADER),
        sheet_row(2, &["A", "p1", "", "", "", "", "", "", ""]),
        sheet_row(3, &["A", "p2", "", "", "", "", "", "", ""]),
        sheet_row(4, &["", "p3", "", "", "", "", "", "", ""]),
        sheet_row(5, &["B", "p4", "", "", "", "", "", "", ""]),
        sheet_row(6, &["B", "p5", "", "", "", "", "", "", ""]),
        sheet_row(7, &["B", "p6", "", "", "", "", "", "", ""]),
    ];
    let bytes =
        build_package(&[("xl/worksheets/sheet1.xml", sheet_xml(&rows).as_bytes())]);
    let (grid, _) = import_workbook_bytes(&bytes, SchemaWidth::Extended).unwrap();
    let spans = merge_category_spans(&grid);
    assert_eq!(spans.len(), 2);
    assert_eq!((spans[0].start, spans[0].len, spans[0].value.as_str()), (0, 3, "A"));
    assert_eq!((spans[1].start, spans[1].len, spans[1].value.as_str()), (3, 3, "B"));
}
