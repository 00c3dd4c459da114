// crates/gridreg-codegen/tests/template_rewrite.rs
// ============================================================================
// Module: Template Rewrite Tests
// Description: Validate the C parameter-array rewriter end to end.
// Purpose: Ensure substitution, passthrough, and soft-fail behavior.
// Dependencies: gridreg-codegen, proptest, tempfile
// ============================================================================

//! ## Overview
//! End-to-end tests for the code generator: file-to-file generation, value
//! substitution from parameter rows, and passthrough invariants checked with
//! property tests.

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

use std::collections::BTreeMap;
use std::fs;

use gridreg_codegen::ParameterInput;
use gridreg_codegen::build_protocol_map;
use gridreg_codegen::generate_to_path;
use gridreg_codegen::render_template;
use proptest::prelude::*;
use tempfile::TempDir;

// ============================================================================
// SECTION: Helpers
// ============================================================================

const TEMPLATE: &str = "\
/* Safety parameter array */\n\
/* generated block */\n\
/* default , min , max */\n\
Uint16 SafetyParams[][3] = {\n\
    {   0       ,   0      ,   500    },   // P01 over-voltage trip\n\
    {   0       ,   0      ,   100    },   // P02 over-frequency trip\n\
    {   0       ,   10     ,   900    },   // P99 spare slot\n\
};\n";

fn row<'a>(bit: &'a str, default: &'a str, coefficient: &'a str) -> ParameterInput<'a> {
    ParameterInput {
        protocol_bit: bit,
        default_value: default,
        coefficient,
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[test]
fn generates_file_with_computed_defaults() {
    let temp = TempDir::new().unwrap();
    let template_path = temp.path().join("template.c");
    let output_path = temp.path().join("generated.c");
    fs::write(&template_path, TEMPLATE).unwrap();

    let rows = [row("P01", "120", "10"), row("P02", "-", "1")];
    let report = generate_to_path(&template_path, &output_path, rows).unwrap();

    let generated = fs::read_to_string(&output_path).unwrap();
    assert_eq!(report.lines_rewritten, 3);
    assert_eq!(report.unknown_bits, 1);
    assert!(generated.contains("{   12      ,   0      ,   500    },   // P01 over-voltage trip"));
    assert!(generated.contains("{   0       ,   0      ,   100    },   // P02 over-frequency trip"));
    assert!(generated.contains("{   0       ,   10     ,   900    },   // P99 spare slot"));
    assert!(generated.starts_with("/* Safety parameter array */"));
    assert!(generated.ends_with("};\n"));
}

#[test]
fn header_and_terminator_pass_through_verbatim() {
    let map = build_protocol_map([row("P01", "120", "10")]);
    let (rendered, _) = render_template(TEMPLATE, &map);
    let original: Vec<&str> = TEMPLATE.lines().collect();
    let output: Vec<&str> = rendered.lines().collect();
    assert_eq!(&output[..4], &original[..4]);
    assert_eq!(output.last(), original.last());
}

#[test]
fn generation_never_reads_more_than_the_template() {
    // Lines outside the data pattern are emitted verbatim.
    let template = "// a\n// b\n// c\n// d\nplain line without braces\n};\n";
    let (rendered, report) = render_template(template, &BTreeMap::new());
    assert_eq!(rendered, template);
    assert_eq!(report.lines_rewritten, 0);
}

proptest! {
    #[test]
    fn substituted_line_preserves_min_max_and_comment(
        value in -30_000_i64..30_000,
        min in 0_u32..60_000,
        max in 0_u32..60_000,
    ) {
        let template = format!(
            "// a\n// b\n// c\n// d\n    {{   1 ,   {min} ,   {max} }},   // PX probe\n}};\n"
        );
        let mut map = BTreeMap::new();
        map.insert("PX".to_string(), value);
        let (rendered, report) = render_template(&template, &map);
        assert_eq!(report.lines_rewritten, 1);
        assert_eq!(report.unknown_bits, 0);
        assert!(rendered.contains(&format!("{min:<6}")));
        assert!(rendered.contains(&format!("{max:<6}")));
        assert!(rendered.contains("// PX probe"));
        if value < 0 {
            assert!(rendered.contains(&format!("(Uint16){value}")));
        } else {
            assert!(rendered.contains(&format!("{{   {value:<7} ,")));
        }
    }
}
