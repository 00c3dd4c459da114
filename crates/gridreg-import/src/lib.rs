// crates/gridreg-import/src/lib.rs
// ============================================================================
// Module: Gridreg Spreadsheet Import
// Description: Parameter table import from xlsx packages.
// Purpose: Turn a spreadsheet into an ordered parameter grid with images.
// Dependencies: gridreg-core, quick-xml, zip
// ============================================================================

//! ## Overview
//! The importer reads a parameter table from an `.xlsx` package: data rows
//! from row 2 onward, vendor image formulas (`_xlfn.DISPIMG`) detected per
//! cell, and embedded raster images extracted through two reconciled paths.
//! Drawing-anchored images land at their anchored cell; loose media entries
//! are matched to unanchored formula positions in file order. That order
//! correlation is best-effort: the package format provides no reliable
//! id-to-filename mapping, so a mismatch assigns a wrong image rather than
//! failing, and unresolved positions surface as a placeholder plus a
//! summary count.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod import;
pub mod package;
pub mod sheet;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use import::ImportError;
pub use import::ImportSummary;
pub use import::import_workbook;
pub use import::import_workbook_bytes;
