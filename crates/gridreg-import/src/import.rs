// crates/gridreg-import/src/import.rs
// ============================================================================
// Module: Parameter Import Algorithm
// Description: Workbook-to-grid conversion with image reconciliation.
// Purpose: Build the ordered parameter grid the editor and store consume.
// Dependencies: gridreg-core, crate::{package, sheet}
// ============================================================================

//! ## Overview
//! Conversion runs in three passes over the parsed package: collect data
//! rows (row 2 onward, kept when any cell inside the schema width is
//! non-empty), mark cells whose formula is a vendor image formula, then
//! resolve images. Drawing-anchored images claim their exact cell; media
//! entries left unclaimed are handed to unanchored formula positions in
//! file order. The file-order correlation is a documented best effort; a
//! position that stays unresolved renders as a placeholder and is counted
//! in the summary.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use gridreg_core::ImageRef;
use gridreg_core::ParamCell;
use gridreg_core::ParameterGrid;
use gridreg_core::SchemaWidth;
use thiserror::Error;

use crate::package::PackageError;
use crate::package::WorkbookPackage;
use crate::package::read_package;
use crate::sheet::CellMap;
use crate::sheet::SheetError;
use crate::sheet::parse_shared_strings;
use crate::sheet::parse_worksheet;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Marker the vendor image formula carries.
const IMAGE_FORMULA_MARKER: &str = "_xlfn.DISPIMG";

/// Prefix of the image id inside the formula.
const IMAGE_ID_PREFIX: &str = "ID_";

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Import errors.
#[derive(Debug, Error)]
pub enum ImportError {
    /// Workbook file could not be read.
    #[error("import io error: {0}")]
    Io(String),
    /// Package container failure.
    #[error(transparent)]
    Package(#[from] PackageError),
    /// Worksheet parse failure.
    #[error(transparent)]
    Sheet(#[from] SheetError),
}

// ============================================================================
// SECTION: Summary
// ============================================================================

/// Post-import summary surfaced to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ImportSummary {
    /// Data rows converted into grid rows.
    pub rows_imported: usize,
    /// Image formulas detected inside the schema width.
    pub image_formulas: usize,
    /// Media entries extracted from the package.
    pub media_entries: usize,
    /// Image cells resolved to actual image bytes.
    pub images_resolved: usize,
    /// Image cells left unresolved (placeholder shown).
    pub images_unresolved: usize,
}

// ============================================================================
// SECTION: Entry Points
// ============================================================================

/// Imports a workbook file into a parameter grid.
///
/// # Errors
///
/// Returns [`ImportError`] when the file or package is unreadable. Per-cell
/// oddities never fail the import; they degrade to placeholders.
pub fn import_workbook(
    path: &Path,
    schema: SchemaWidth,
) -> Result<(ParameterGrid, ImportSummary), ImportError> {
    let bytes = fs::read(path).map_err(|err| ImportError::Io(err.to_string()))?;
    import_workbook_bytes(&bytes, schema)
}

/// Imports workbook bytes into a parameter grid.
///
/// # Errors
///
/// Returns [`ImportError`] when the package or worksheet is unreadable.
pub fn import_workbook_bytes(
    bytes: &[u8],
    schema: SchemaWidth,
) -> Result<(ParameterGrid, ImportSummary), ImportError> {
    let package = read_package(bytes)?;
    let shared = match &package.shared_strings_xml {
        Some(xml) => parse_shared_strings(xml)?,
        None => Vec::new(),
    };
    let cells = parse_worksheet(&package.sheet_xml, &shared)?;
    Ok(build_grid(&package, &cells, schema))
}

// ============================================================================
// SECTION: Grid Assembly
// ============================================================================

/// Extracts the image id out of a vendor image formula.
fn formula_image_id(formula: &str) -> Option<String> {
    let start = formula.find(IMAGE_ID_PREFIX)?;
    let tail = &formula[start + IMAGE_ID_PREFIX.len()..];
    let id: String = tail.chars().take_while(char::is_ascii_alphanumeric).collect();
    if id.is_empty() { None } else { Some(id) }
}

/// Builds the grid and summary from parsed package parts.
fn build_grid(
    package: &WorkbookPackage,
    cells: &CellMap,
    schema: SchemaWidth,
) -> (ParameterGrid, ImportSummary) {
    let width = schema.width();
    let mut summary = ImportSummary {
        media_entries: package.media.len(),
        ..ImportSummary::default()
    };

    // Pass 1: collect sheet rows from row 2 (index 1) that hold any value
    // inside the schema width, preserving sheet order.
    let sheet_rows: Vec<u32> = cells
        .keys()
        .filter(|(row, column)| {
            *row >= 1 && usize::try_from(*column).unwrap_or(usize::MAX) < width
        })
        .map(|(row, _)| *row)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    // Pass 2: build text rows, recording image-formula positions keyed by
    // grid coordinates.
    let mut grid = ParameterGrid::new(schema);
    let mut formula_positions: BTreeMap<(usize, usize), Option<String>> = BTreeMap::new();
    for (grid_row, sheet_row) in sheet_rows.iter().enumerate() {
        let mut values = Vec::with_capacity(width);
        for column in 0..width {
            let cell = cells.get(&(*sheet_row, u32::try_from(column).unwrap_or(u32::MAX)));
            let value = match cell {
                Some(cell) => {
                    if cell
                        .formula
                        .as_deref()
                        .is_some_and(|formula| formula.contains(IMAGE_FORMULA_MARKER))
                        || cell.value.contains(IMAGE_FORMULA_MARKER)
                    {
                        let id = cell
                            .formula
                            .as_deref()
                            .and_then(formula_image_id)
                            .or_else(|| formula_image_id(&cell.value));
                        formula_positions.insert((grid_row, column), id);
                        summary.image_formulas += 1;
                        String::new()
                    } else {
                        cell.value.clone()
                    }
                }
                None => String::new(),
            };
            values.push(value);
        }
        grid.push_text_row(values);
    }
    summary.rows_imported = grid.len();

    // Pass 3a: anchored images claim their exact grid position. The anchor
    // row is a sheet row; the grid dropped the header row and any empty
    // rows, so translate through the collected sheet rows.
    let sheet_to_grid: BTreeMap<u32, usize> =
        sheet_rows.iter().enumerate().map(|(grid_row, sheet_row)| (*sheet_row, grid_row)).collect();
    let mut claimed_media: BTreeSet<String> = BTreeSet::new();
    let mut resolved: BTreeMap<(usize, usize), ImageRef> = BTreeMap::new();
    for anchor in &package.anchored {
        let Some(grid_row) = sheet_to_grid.get(&anchor.row).copied() else {
            continue;
        };
        let column = usize::try_from(anchor.column).unwrap_or(usize::MAX);
        if column >= width {
            continue;
        }
        let Some(entry) = package.media.iter().find(|entry| entry.name == anchor.media_name)
        else {
            continue;
        };
        claimed_media.insert(entry.name.clone());
        resolved.insert(
            (grid_row, column),
            ImageRef {
                image_id: None,
                data: entry.data.clone(),
            },
        );
    }

    // Pass 3b: unclaimed media entries pair with unresolved formula
    // positions in file order. Best effort only; the format records no
    // id-to-filename mapping to do better with.
    let mut loose_media = package
        .media
        .iter()
        .filter(|entry| !claimed_media.contains(&entry.name));
    for (position, image_id) in &formula_positions {
        if resolved.contains_key(position) {
            continue;
        }
        let Some(entry) = loose_media.next() else {
            break;
        };
        resolved.insert(
            *position,
            ImageRef {
                image_id: image_id.clone(),
                data: entry.data.clone(),
            },
        );
    }

    // Pass 4: write image cells back into the grid.
    for position in formula_positions.keys() {
        let (row, column) = *position;
        let Some(cell) = grid.cell_mut(row, column) else {
            continue;
        };
        match resolved.get(position) {
            Some(image) => {
                *cell = ParamCell::Image(image.clone());
                summary.images_resolved += 1;
            }
            None => {
                *cell = ParamCell::UnresolvedImage;
                summary.images_unresolved += 1;
            }
        }
    }

    // Anchored images at positions without an image formula still resolve;
    // they were placed by explicit coordinates.
    for (position, image) in &resolved {
        if formula_positions.contains_key(position) {
            continue;
        }
        let (row, column) = *position;
        if let Some(cell) = grid.cell_mut(row, column) {
            *cell = ParamCell::Image(image.clone());
            summary.images_resolved += 1;
        }
    }

    (grid, summary)
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use gridreg_core::SchemaWidth;

    use super::formula_image_id;

    #[test]
    fn image_id_extracts_from_formula() {
        assert_eq!(
            formula_image_id("=_xlfn.DISPIMG(\"ID_9A3FB27C\",1)").as_deref(),
            Some("9A3FB27C")
        );
        assert_eq!(formula_image_id("=SUM(A1:A2)"), None);
    }

    #[test]
    fn schema_width_bounds_columns() {
        assert_eq!(SchemaWidth::Compact.width(), 7);
        assert_eq!(SchemaWidth::Extended.width(), 9);
    }
}
