// crates/gridreg-config/tests/load_validation.rs
// ============================================================================
// Module: Config Load Tests
// Description: Validate TOML loading, defaults, and fail-closed errors.
// Purpose: Ensure the configuration surface loads deterministically.
// Dependencies: gridreg-config, tempfile
// ============================================================================

//! ## Overview
//! Loading tests: explicit file wins, absent default file yields defaults,
//! malformed TOML and out-of-range values fail closed.

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

use gridreg_config::AppConfig;
use gridreg_config::ConfigError;
use tempfile::TempDir;

// ============================================================================
// SECTION: Tests
// ============================================================================

#[test]
fn explicit_file_overrides_defaults() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("gridreg.toml");
    fs::write(
        &path,
        "data_dir = \"/srv/gridreg\"\n\
         [update]\n\
         check_url = \"https://example.invalid/v.json\"\n\
         timeout_ms = 2500\n\
         [auth]\n\
         secret = \"deployment-secret\"\n",
    )
    .unwrap();
    let config = AppConfig::load(Some(&path)).unwrap();
    assert_eq!(config.data_dir.to_string_lossy(), "/srv/gridreg");
    assert_eq!(config.update.timeout_ms, 2_500);
    assert_eq!(config.auth.secret, "deployment-secret");
    // Sections absent from the file keep their defaults.
    assert_eq!(config.sync.remote, "origin");
}

#[test]
fn explicitly_named_missing_file_is_an_error() {
    let temp = TempDir::new().unwrap();
    let missing = temp.path().join("absent.toml");
    assert!(matches!(AppConfig::load(Some(&missing)), Err(ConfigError::Io(_))));
}

#[test]
fn malformed_toml_fails_closed() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("bad.toml");
    fs::write(&path, "data_dir = [not toml").unwrap();
    assert!(matches!(AppConfig::load(Some(&path)), Err(ConfigError::Parse(_))));
}

#[test]
fn out_of_range_timeout_fails_validation() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("gridreg.toml");
    fs::write(&path, "[update]\ntimeout_ms = 5\n").unwrap();
    assert!(matches!(AppConfig::load(Some(&path)), Err(ConfigError::Invalid(_))));
}

#[test]
fn app_version_parses() {
    let config = AppConfig::default();
    assert!(config.app_version().is_ok());
}
