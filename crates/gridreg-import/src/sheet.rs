// crates/gridreg-import/src/sheet.rs
// ============================================================================
// Module: Worksheet XML Parsing
// Description: Cell grid and shared-string parsing for one worksheet.
// Purpose: Produce positioned cell values and formulas from sheet XML.
// Dependencies: quick-xml
// ============================================================================

//! ## Overview
//! Parses the subset of SpreadsheetML the importer needs: `sheetData` rows
//! with cell references, cell types (shared string, inline string, formula
//! string, numeric), cached values, and formula bodies. Values are kept as
//! their raw XML text; no numeric round-tripping is applied.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use quick_xml::Reader;
use quick_xml::events::Event;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Hard cap on parsed rows; larger sheets fail closed.
const MAX_ROWS: u32 = 100_000;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Worksheet parsing errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SheetError {
    /// Malformed XML.
    #[error("sheet xml error: {0}")]
    Xml(String),
    /// Malformed cell reference.
    #[error("invalid cell reference: {0}")]
    CellRef(String),
    /// Sheet exceeds the row cap.
    #[error("sheet exceeds {MAX_ROWS} rows")]
    TooManyRows,
}

// ============================================================================
// SECTION: Cell Model
// ============================================================================

/// One parsed worksheet cell.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SheetCell {
    /// Cached display value, resolved through shared strings.
    pub value: String,
    /// Formula body when the cell is a formula cell.
    pub formula: Option<String>,
}

/// Parsed worksheet: cells keyed by zero-based `(row, column)`.
pub type CellMap = BTreeMap<(u32, u32), SheetCell>;

/// Converts an `A1`-style reference into zero-based `(row, column)`.
///
/// # Errors
///
/// Returns [`SheetError::CellRef`] when the reference is malformed.
pub fn parse_cell_ref(reference: &str) -> Result<(u32, u32), SheetError> {
    let letters: String =
        reference.chars().take_while(char::is_ascii_alphabetic).collect();
    let digits = &reference[letters.len()..];
    if letters.is_empty() || digits.is_empty() {
        return Err(SheetError::CellRef(reference.to_string()));
    }
    let mut column: u32 = 0;
    for letter in letters.chars() {
        let value = u32::from(letter.to_ascii_uppercase()) - u32::from('A') + 1;
        column = column
            .checked_mul(26)
            .and_then(|total| total.checked_add(value))
            .ok_or_else(|| SheetError::CellRef(reference.to_string()))?;
    }
    let row: u32 =
        digits.parse().map_err(|_| SheetError::CellRef(reference.to_string()))?;
    if row == 0 {
        return Err(SheetError::CellRef(reference.to_string()));
    }
    Ok((row - 1, column - 1))
}

/// Strips a namespace prefix from an element name.
fn local_name(name: &[u8]) -> &[u8] {
    name.rsplit(|byte| *byte == b':').next().unwrap_or(name)
}

// ============================================================================
// SECTION: Shared Strings
// ============================================================================

/// Parses `xl/sharedStrings.xml` into the indexed string table.
///
/// Rich-text runs inside one entry are concatenated.
///
/// # Errors
///
/// Returns [`SheetError::Xml`] on malformed XML.
pub fn parse_shared_strings(xml: &str) -> Result<Vec<String>, SheetError> {
    let mut reader = Reader::from_str(xml);
    let mut strings = Vec::new();
    let mut current = String::new();
    let mut in_entry = false;
    let mut in_text = false;
    loop {
        match reader.read_event() {
            Ok(Event::Start(element)) => match local_name(element.name().as_ref()) {
                b"si" => {
                    in_entry = true;
                    current.clear();
                }
                b"t" if in_entry => in_text = true,
                _ => {}
            },
            Ok(Event::Text(text)) if in_text => {
                let piece =
                    text.unescape().map_err(|err| SheetError::Xml(err.to_string()))?;
                current.push_str(&piece);
            }
            Ok(Event::End(element)) => match local_name(element.name().as_ref()) {
                b"si" => {
                    in_entry = false;
                    strings.push(current.clone());
                }
                b"t" => in_text = false,
                _ => {}
            },
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(err) => return Err(SheetError::Xml(err.to_string())),
        }
    }
    Ok(strings)
}

// ============================================================================
// SECTION: Worksheet
// ============================================================================

/// Parses a worksheet XML document into positioned cells.
///
/// Cells without a reference attribute are skipped; empty cells (no value
/// and no formula) are not recorded.
///
/// # Errors
///
/// Returns [`SheetError`] on malformed XML, bad references, or oversized
/// sheets.
pub fn parse_worksheet(xml: &str, shared: &[String]) -> Result<CellMap, SheetError> {
    let mut reader = Reader::from_str(xml);
    let mut cells = CellMap::new();
    let mut position: Option<(u32, u32)> = None;
    let mut cell_type = String::new();
    let mut value = String::new();
    let mut formula: Option<String> = None;
    let mut capture: Option<Capture> = None;

    /// Which text node is being captured inside a cell.
    enum Capture {
        /// The `<v>` cached value.
        Value,
        /// The `<f>` formula body.
        Formula,
        /// An inline string `<t>` run.
        Inline,
    }

    loop {
        match reader.read_event() {
            Ok(Event::Start(element)) => match local_name(element.name().as_ref()) {
                b"c" => {
                    position = None;
                    cell_type.clear();
                    value.clear();
                    formula = None;
                    for attribute in element.attributes() {
                        let attribute =
                            attribute.map_err(|err| SheetError::Xml(err.to_string()))?;
                        match attribute.key.as_ref() {
                            b"r" => {
                                let reference =
                                    String::from_utf8_lossy(&attribute.value);
                                position = Some(parse_cell_ref(&reference)?);
                            }
                            b"t" => {
                                cell_type =
                                    String::from_utf8_lossy(&attribute.value).into_owned();
                            }
                            _ => {}
                        }
                    }
                }
                b"v" => capture = Some(Capture::Value),
                b"f" => {
                    formula = Some(String::new());
                    capture = Some(Capture::Formula);
                }
                b"t" if position.is_some() => capture = Some(Capture::Inline),
                _ => {}
            },
            Ok(Event::Text(text)) => {
                let piece =
                    text.unescape().map_err(|err| SheetError::Xml(err.to_string()))?;
                match capture {
                    Some(Capture::Value | Capture::Inline) => value.push_str(&piece),
                    Some(Capture::Formula) => {
                        if let Some(body) = formula.as_mut() {
                            body.push_str(&piece);
                        }
                    }
                    None => {}
                }
            }
            Ok(Event::End(element)) => match local_name(element.name().as_ref()) {
                b"v" | b"f" | b"t" => capture = None,
                b"c" => {
                    if let Some((row, column)) = position.take() {
                        if row >= MAX_ROWS {
                            return Err(SheetError::TooManyRows);
                        }
                        let resolved = resolve_value(&cell_type, &value, shared);
                        if !resolved.is_empty() || formula.is_some() {
                            cells.insert(
                                (row, column),
                                SheetCell {
                                    value: resolved,
                                    formula: formula.take(),
                                },
                            );
                        }
                    }
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(err) => return Err(SheetError::Xml(err.to_string())),
        }
    }
    Ok(cells)
}

/// Resolves a cached value through the cell type.
fn resolve_value(cell_type: &str, raw: &str, shared: &[String]) -> String {
    if cell_type == "s" {
        let index: usize = match raw.trim().parse() {
            Ok(value) => value,
            Err(_) => return String::new(),
        };
        return shared.get(index).cloned().unwrap_or_default();
    }
    raw.to_string()
}

// ============================================================================
// SECTION: Tests
// ============================================================================
