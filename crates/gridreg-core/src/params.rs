// crates/gridreg-core/src/params.rs
// ============================================================================
// Module: Gridreg Parameter Table Model
// Description: Ordered parameter grid with text and image cells.
// Purpose: Back the parameter editor, importer, and code generator.
// Dependencies: thiserror
// ============================================================================

//! ## Overview
//! A parameter table is an ordered grid of string-typed cells. A cell can
//! instead hold an extracted image, or the marker for an image the importer
//! detected but could not extract. Two column schemas exist: the compact
//! seven-column layout and the extended nine-column layout that adds the
//! coefficient and protocol-bit columns used by code generation.
//!
//! Category spans are computed, not stored: vertically-adjacent identical
//! non-empty category values form one visual span, and empty category cells
//! continue the open span.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Storage serialization for an image cell; the backing column is text-only.
pub const IMAGE_PLACEHOLDER: &str = "[image]";

/// Display text for an image cell the importer could not extract.
pub const UNRESOLVED_IMAGE_PLACEHOLDER: &str = "[image not extracted]";

/// Placeholder token meaning "no value" in free-form numeric fields.
pub const VALUE_PLACEHOLDER: &str = "-";

// ============================================================================
// SECTION: Schema
// ============================================================================

/// Column schema width of a parameter table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaWidth {
    /// Seven columns: category, name, default, upper, lower, unit, remark.
    Compact,
    /// Nine columns: compact plus coefficient and protocol bit before remark.
    Extended,
}

/// Logical field of a parameter row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    /// Category (merged column).
    Category,
    /// Parameter name.
    Name,
    /// Default value.
    Default,
    /// Upper limit.
    Upper,
    /// Lower limit.
    Lower,
    /// Measurement unit.
    Unit,
    /// Scaling divisor for code generation (extended schema only).
    Coefficient,
    /// Protocol bit identifier (extended schema only).
    ProtocolBit,
    /// Free-text remark.
    Remark,
}

impl SchemaWidth {
    /// Number of columns in this schema.
    #[must_use]
    pub const fn width(self) -> usize {
        match self {
            Self::Compact => 7,
            Self::Extended => 9,
        }
    }

    /// Column index of a logical field, `None` when the schema lacks it.
    #[must_use]
    pub const fn column_of(self, field: Field) -> Option<usize> {
        match (self, field) {
            (_, Field::Category) => Some(0),
            (_, Field::Name) => Some(1),
            (_, Field::Default) => Some(2),
            (_, Field::Upper) => Some(3),
            (_, Field::Lower) => Some(4),
            (_, Field::Unit) => Some(5),
            (Self::Compact, Field::Remark) => Some(6),
            (Self::Compact, Field::Coefficient | Field::ProtocolBit) => None,
            (Self::Extended, Field::Coefficient) => Some(6),
            (Self::Extended, Field::ProtocolBit) => Some(7),
            (Self::Extended, Field::Remark) => Some(8),
        }
    }
}

// ============================================================================
// SECTION: Cells and Rows
// ============================================================================

/// Extracted raster image carried by an image cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRef {
    /// Image id referenced by the originating formula, when known.
    pub image_id: Option<String>,
    /// Raw image bytes as stored in the package.
    pub data: Vec<u8>,
}

/// One cell of the parameter grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamCell {
    /// Plain text value (possibly empty or the `-` placeholder).
    Text(String),
    /// Resolved embedded image.
    Image(ImageRef),
    /// Image formula detected but the image could not be extracted.
    UnresolvedImage,
}

impl ParamCell {
    /// Text form of the cell as persisted to the text-only storage column.
    #[must_use]
    pub fn storage_text(&self) -> &str {
        match self {
            Self::Text(text) => text,
            Self::Image(_) => IMAGE_PLACEHOLDER,
            Self::UnresolvedImage => UNRESOLVED_IMAGE_PLACEHOLDER,
        }
    }

    /// Trimmed text for logic that inspects values; image cells read as their
    /// placeholders.
    #[must_use]
    pub fn display_text(&self) -> &str {
        match self {
            Self::Text(text) => text.trim(),
            Self::Image(_) => IMAGE_PLACEHOLDER,
            Self::UnresolvedImage => UNRESOLVED_IMAGE_PLACEHOLDER,
        }
    }

    /// True when the cell holds no usable value.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Text(text) => text.trim().is_empty(),
            Self::Image(_) | Self::UnresolvedImage => false,
        }
    }
}

/// One ordered row of the parameter grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterRow {
    /// Cells in column order; width matches the owning grid's schema.
    pub cells: Vec<ParamCell>,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Error raised when a row does not match the grid schema.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("row width {actual} does not match schema width {expected}")]
pub struct RowWidthError {
    /// Width the schema requires.
    pub expected: usize,
    /// Width the row supplied.
    pub actual: usize,
}

// ============================================================================
// SECTION: Grid
// ============================================================================

/// Ordered parameter table bound to a column schema.
///
/// # Invariants
/// - Every row has exactly `schema.width()` cells.
/// - Row index equals display order and persisted `row_order`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterGrid {
    /// Column schema of the grid.
    schema: SchemaWidth,
    /// Rows in display order.
    rows: Vec<ParameterRow>,
}

impl ParameterGrid {
    /// Creates an empty grid for the schema.
    #[must_use]
    pub const fn new(schema: SchemaWidth) -> Self {
        Self {
            schema,
            rows: Vec::new(),
        }
    }

    /// Returns the grid schema.
    #[must_use]
    pub const fn schema(&self) -> SchemaWidth {
        self.schema
    }

    /// Returns the rows in display order.
    #[must_use]
    pub fn rows(&self) -> &[ParameterRow] {
        &self.rows
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// True when the grid holds no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Appends a row after checking its width against the schema.
    ///
    /// # Errors
    ///
    /// Returns [`RowWidthError`] when the row width differs from the schema.
    pub fn push_row(&mut self, row: ParameterRow) -> Result<(), RowWidthError> {
        if row.cells.len() != self.schema.width() {
            return Err(RowWidthError {
                expected: self.schema.width(),
                actual: row.cells.len(),
            });
        }
        self.rows.push(row);
        Ok(())
    }

    /// Appends a row of plain text cells, padding or truncating to the schema
    /// width.
    pub fn push_text_row<I>(&mut self, values: I)
    where
        I: IntoIterator<Item = String>,
    {
        let width = self.schema.width();
        let mut cells: Vec<ParamCell> =
            values.into_iter().take(width).map(ParamCell::Text).collect();
        while cells.len() < width {
            cells.push(ParamCell::Text(String::new()));
        }
        self.rows.push(ParameterRow { cells });
    }

    /// Trimmed text of the logical field in a row; empty string when the
    /// schema lacks the field or the row index is out of range.
    #[must_use]
    pub fn field_text(&self, row: usize, field: Field) -> &str {
        let Some(column) = self.schema.column_of(field) else {
            return "";
        };
        self.rows
            .get(row)
            .and_then(|r| r.cells.get(column))
            .map_or("", ParamCell::display_text)
    }

    /// Storage text of every cell in a row, in column order.
    #[must_use]
    pub fn storage_row(&self, row: usize) -> Vec<String> {
        self.rows.get(row).map_or_else(Vec::new, |r| {
            r.cells.iter().map(|cell| cell.storage_text().to_string()).collect()
        })
    }

    /// Mutable access to a cell, `None` when out of range.
    pub fn cell_mut(&mut self, row: usize, column: usize) -> Option<&mut ParamCell> {
        self.rows.get_mut(row).and_then(|r| r.cells.get_mut(column))
    }
}

// ============================================================================
// SECTION: Category Spans
// ============================================================================

/// A vertical span of rows sharing one category value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategorySpan {
    /// First row of the span.
    pub start: usize,
    /// Number of rows covered.
    pub len: usize,
    /// Category value shared by the span.
    pub value: String,
}

/// Computes category spans for display merging.
///
/// A non-empty category opens a span; following rows extend it while their
/// category is empty or identical; the first differing non-empty category
/// closes it. Rows with an empty category before any span opens are not
/// covered by any span.
#[must_use]
pub fn merge_category_spans(grid: &ParameterGrid) -> Vec<CategorySpan> {
    let row_count = grid.len();
    let mut spans = Vec::new();
    let mut index = 0;
    while index < row_count {
        let category = grid.field_text(index, Field::Category);
        if category.is_empty() {
            index += 1;
            continue;
        }
        let value = category.to_string();
        let start = index;
        let mut next = index + 1;
        while next < row_count {
            let next_category = grid.field_text(next, Field::Category);
            if next_category.is_empty() || next_category == value {
                next += 1;
            } else {
                break;
            }
        }
        spans.push(CategorySpan {
            start,
            len: next - start,
            value,
        });
        index = next;
    }
    spans
}

// ============================================================================
// SECTION: Tests
// ============================================================================
