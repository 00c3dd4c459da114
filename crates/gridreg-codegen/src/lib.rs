// crates/gridreg-codegen/src/lib.rs
// ============================================================================
// Module: Parameter Code Generator
// Description: Deterministic rewriter for C parameter-array templates.
// Purpose: Substitute computed defaults into a fixed-format source template.
// Dependencies: gridreg-core, thiserror
// ============================================================================

//! ## Overview
//! The generator rewrites the literal array values of a line-oriented C
//! source template from the current parameter table. It is a pure text
//! transform: the template's first four lines and its closing line pass
//! through unchanged, each data line receives a newly computed default while
//! keeping its original min/max pair and trailing comment, and every other
//! line is emitted verbatim. The database is never touched.
//!
//! ### Design Notes
//! - Output is deterministic for a given template and parameter table.
//! - Value computation fails soft: malformed numeric inputs produce `0`
//!   rather than aborting the generation.
//! - Rounding is half-away-from-zero.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use gridreg_core::RegulationParameter;
use gridreg_core::params::VALUE_PLACEHOLDER;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Maximum template size accepted by the generator.
pub const MAX_TEMPLATE_BYTES: u64 = 1024 * 1024;

/// Number of fixed header lines passed through unchanged.
const HEADER_LINES: usize = 4;

/// Fallback min value when a data line is malformed.
const FALLBACK_MIN: &str = "32768";

/// Fallback max value when a data line is malformed.
const FALLBACK_MAX: &str = "32767";

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised by the code generator.
///
/// # Invariants
/// - Variant meanings are stable for automation and tests.
#[derive(Debug, Error)]
pub enum CodegenError {
    /// IO error while reading the template or writing the output.
    #[error("io error: {0}")]
    Io(String),
    /// Template exceeded the accepted size limit.
    #[error("template too large: {actual_bytes} bytes (max {MAX_TEMPLATE_BYTES})")]
    TooLarge {
        /// Actual template size in bytes.
        actual_bytes: u64,
    },
}

// ============================================================================
// SECTION: Inputs
// ============================================================================

/// Borrowed view of the three parameter fields the generator reads.
#[derive(Debug, Clone, Copy)]
pub struct ParameterInput<'a> {
    /// Protocol bit identifier tying the row to a template slot.
    pub protocol_bit: &'a str,
    /// Human-readable default value.
    pub default_value: &'a str,
    /// Scaling divisor applied to the default.
    pub coefficient: &'a str,
}

impl<'a> From<&'a RegulationParameter> for ParameterInput<'a> {
    fn from(row: &'a RegulationParameter) -> Self {
        Self {
            protocol_bit: &row.protocol_bit,
            default_value: &row.default_value,
            coefficient: &row.coefficient,
        }
    }
}

/// Summary of one generation run.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GenerationReport {
    /// Total lines emitted.
    pub lines_total: usize,
    /// Data lines whose default was substituted.
    pub lines_rewritten: usize,
    /// Data lines whose protocol bit had no parameter row (default set to 0).
    pub unknown_bits: usize,
}

// ============================================================================
// SECTION: Value Computation
// ============================================================================

/// True when a field is empty or the `-` placeholder.
fn is_blank(value: &str) -> bool {
    let trimmed = value.trim();
    trimmed.is_empty() || trimmed == VALUE_PLACEHOLDER
}

/// Rounds a finite value and clamps it into the `i64` range.
fn round_to_i64(value: f64) -> i64 {
    let rounded = value.round();
    if !rounded.is_finite() {
        return 0;
    }
    #[allow(
        clippy::cast_possible_truncation,
        reason = "value is clamped into the i64 range before the cast"
    )]
    {
        rounded.clamp(i64::MIN as f64, i64::MAX as f64) as i64
    }
}

/// Computes the encoded default for one parameter row.
///
/// Blank defaults produce 0. A usable coefficient divides the default before
/// rounding; otherwise the default is rounded directly. Non-numeric inputs
/// fail soft to 0.
#[must_use]
pub fn computed_default(default_value: &str, coefficient: &str) -> i64 {
    if is_blank(default_value) {
        return 0;
    }
    let Ok(default) = default_value.trim().parse::<f64>() else {
        return 0;
    };
    let divisor = if is_blank(coefficient) {
        None
    } else {
        match coefficient.trim().parse::<f64>() {
            Ok(value) if value != 0.0 => Some(value),
            Ok(_) | Err(_) => None,
        }
    };
    match divisor {
        Some(value) => round_to_i64(default / value),
        None => round_to_i64(default),
    }
}

/// Builds the protocol-bit to encoded-default mapping from parameter rows.
///
/// Rows with a blank protocol bit are skipped. Later rows win on duplicate
/// protocol bits, matching table order semantics.
#[must_use]
pub fn build_protocol_map<'a, I>(rows: I) -> BTreeMap<String, i64>
where
    I: IntoIterator<Item = ParameterInput<'a>>,
{
    let mut map = BTreeMap::new();
    for row in rows {
        let protocol = row.protocol_bit.trim();
        if is_blank(protocol) {
            continue;
        }
        let value = computed_default(row.default_value, row.coefficient);
        map.insert(protocol.to_string(), value);
    }
    map
}

// ============================================================================
// SECTION: Template Rewrite
// ============================================================================

/// Parsed pieces of one data line.
struct DataLine<'a> {
    /// Existing min literal.
    min: &'a str,
    /// Existing max literal.
    max: &'a str,
    /// Full comment text after the `//` marker.
    comment: &'a str,
    /// Leading token of the comment, i.e. the protocol bit.
    protocol: &'a str,
}

/// Splits a candidate data line into its tuple and comment pieces.
///
/// Returns `None` when the line does not carry both an initializer brace and
/// a trailing comment.
fn parse_data_line(line: &str) -> Option<DataLine<'_>> {
    let comment_at = line.find("//")?;
    if !line[..comment_at].contains('{') {
        return None;
    }
    let comment = &line[comment_at + 2..];
    let protocol = comment.split_whitespace().next().unwrap_or("");
    let tuple = line[..comment_at]
        .find('{')
        .and_then(|open| {
            let rest = &line[..comment_at][open + 1..];
            rest.find('}').map(|close| &rest[..close])
        })
        .unwrap_or("");
    let mut parts = tuple.split(',').map(str::trim);
    let _default = parts.next();
    let min = parts.next().filter(|part| !part.is_empty()).unwrap_or(FALLBACK_MIN);
    let max = parts.next().filter(|part| !part.is_empty()).unwrap_or(FALLBACK_MAX);
    Some(DataLine {
        min,
        max,
        comment,
        protocol,
    })
}

/// Renders the substituted default literal, casting negatives.
fn default_literal(value: i64) -> String {
    if value < 0 {
        format!("(Uint16){value}")
    } else {
        value.to_string()
    }
}

/// Rewrites the template text against the protocol map.
#[must_use]
pub fn render_template(
    template: &str,
    protocol_map: &BTreeMap<String, i64>,
) -> (String, GenerationReport) {
    let trailing_newline = template.ends_with('\n');
    let mut report = GenerationReport::default();
    let mut output_lines = Vec::new();
    for (index, line) in template.lines().enumerate() {
        if index < HEADER_LINES || line.trim() == "};" {
            output_lines.push(line.to_string());
            continue;
        }
        match parse_data_line(line) {
            Some(data) => {
                let value = protocol_map.get(data.protocol).copied().unwrap_or_else(|| {
                    report.unknown_bits += 1;
                    0
                });
                let literal = default_literal(value);
                output_lines.push(format!(
                    "    {{   {literal:<7} ,   {min:<6} ,   {max:<6} }},   // {comment}",
                    min = data.min,
                    max = data.max,
                    comment = data.comment.trim_start(),
                ));
                report.lines_rewritten += 1;
            }
            None => output_lines.push(line.to_string()),
        }
    }
    report.lines_total = output_lines.len();
    let mut rendered = output_lines.join("\n");
    if trailing_newline {
        rendered.push('\n');
    }
    (rendered, report)
}

/// Reads the template, rewrites it, and writes the result.
///
/// # Errors
///
/// Returns [`CodegenError`] when the template is missing, oversized, or the
/// output path cannot be written.
pub fn generate_to_path<'a, I>(
    template_path: &Path,
    output_path: &Path,
    rows: I,
) -> Result<GenerationReport, CodegenError>
where
    I: IntoIterator<Item = ParameterInput<'a>>,
{
    let metadata =
        fs::metadata(template_path).map_err(|err| CodegenError::Io(err.to_string()))?;
    if metadata.len() > MAX_TEMPLATE_BYTES {
        return Err(CodegenError::TooLarge {
            actual_bytes: metadata.len(),
        });
    }
    let template =
        fs::read_to_string(template_path).map_err(|err| CodegenError::Io(err.to_string()))?;
    let protocol_map = build_protocol_map(rows);
    let (rendered, report) = render_template(&template, &protocol_map);
    fs::write(output_path, rendered).map_err(|err| CodegenError::Io(err.to_string()))?;
    Ok(report)
}

// ============================================================================
// SECTION: Tests
// ============================================================================
