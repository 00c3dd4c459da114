// crates/gridreg-services/tests/update_service.rs
// ============================================================================
// Module: Update Service Tests
// Description: Validate version checks against a local HTTP server.
// Purpose: Ensure strictly-newer semantics and soft-fail degradation.
// Dependencies: gridreg-services, gridreg-config, gridreg-core, gridreg-store-sqlite, tiny_http
// ============================================================================

//! ## Overview
//! The version check runs against a loopback `tiny_http` server serving
//! descriptor JSON: strictly newer reports available, equal and older
//! report up to date, and malformed or unreachable endpoints degrade to "no
//! update" without an error. Notification CRUD is exercised through the
//! service.

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

use std::thread;

use gridreg_config::UpdateConfig;
use gridreg_core::AppVersion;
use gridreg_core::NotificationType;
use gridreg_services::UpdateCheck;
use gridreg_services::UpdateService;
use gridreg_store_sqlite::Store;
use tiny_http::Response;
use tiny_http::Server;

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Serves `body` for one request and returns the URL.
fn serve_once(body: String) -> (String, thread::JoinHandle<()>) {
    let server = Server::http("127.0.0.1:0").unwrap();
    let addr = server.server_addr().to_ip().unwrap();
    let url = format!("http://{addr}/version.json");
    let handle = thread::spawn(move || {
        if let Ok(request) = server.recv() {
            let _ = request.respond(Response::from_string(body));
        }
    });
    (url, handle)
}

fn config_for(url: &str) -> UpdateConfig {
    UpdateConfig {
        check_url: url.to_string(),
        timeout_ms: 2_000,
        ..UpdateConfig::default()
    }
}

fn version(text: &str) -> AppVersion {
    text.parse().unwrap()
}

fn descriptor_json(remote_version: &str) -> String {
    format!(
        "{{\"version\":\"{remote_version}\",\"release_date\":\"2026-08-01\",\
         \"download_url\":\"https://example.invalid/app.zip\",\
         \"changelog\":[\"fixes\"],\"required\":false,\"min_version\":\"1.0.0\"}}"
    )
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[test]
fn strictly_newer_version_reports_available() {
    let store = Store::open_in_memory().unwrap();
    let (url, handle) = serve_once(descriptor_json("1.1.5"));
    let config = config_for(&url);
    let service = UpdateService::new(&store, &config, version("1.1.4"));
    let check = service.check_for_updates();
    handle.join().unwrap();
    match check {
        UpdateCheck::Available(descriptor) => {
            assert_eq!(descriptor.version, "1.1.5");
            assert_eq!(descriptor.changelog, vec!["fixes".to_string()]);
        }
        UpdateCheck::UpToDate => panic!("expected available"),
    }
}

#[test]
fn equal_and_older_versions_report_up_to_date() {
    let store = Store::open_in_memory().unwrap();
    for remote in ["1.1.4", "1.0.9"] {
        let (url, handle) = serve_once(descriptor_json(remote));
        let config = config_for(&url);
        let service = UpdateService::new(&store, &config, version("1.1.4"));
        assert_eq!(service.check_for_updates(), UpdateCheck::UpToDate);
        handle.join().unwrap();
    }
}

#[test]
fn malformed_descriptor_degrades_to_up_to_date() {
    let store = Store::open_in_memory().unwrap();
    let (url, handle) = serve_once("not json at all".to_string());
    let config = config_for(&url);
    let service = UpdateService::new(&store, &config, version("1.1.4"));
    assert_eq!(service.check_for_updates(), UpdateCheck::UpToDate);
    handle.join().unwrap();
}

#[test]
fn unreachable_endpoint_degrades_to_up_to_date() {
    let store = Store::open_in_memory().unwrap();
    let config = UpdateConfig {
        check_url: "http://127.0.0.1:1/version.json".to_string(),
        timeout_ms: 500,
        ..UpdateConfig::default()
    };
    let service = UpdateService::new(&store, &config, version("1.1.4"));
    assert_eq!(service.check_for_updates(), UpdateCheck::UpToDate);
}

#[test]
fn malformed_remote_version_degrades_to_up_to_date() {
    let store = Store::open_in_memory().unwrap();
    let (url, handle) = serve_once("{\"version\":\"latest-and-greatest\"}".to_string());
    let config = config_for(&url);
    let service = UpdateService::new(&store, &config, version("1.1.4"));
    assert_eq!(service.check_for_updates(), UpdateCheck::UpToDate);
    handle.join().unwrap();
}

#[test]
fn notification_flow_counts_unread() {
    let store = Store::open_in_memory().unwrap();
    let config = UpdateConfig::default();
    let service = UpdateService::new(&store, &config, version("1.0.0"));

    for index in 0..3 {
        service
            .notify(
                NotificationType::Software,
                &format!("Release {index}"),
                Some("changelog"),
                Some("1.2.0"),
                None,
            )
            .unwrap();
    }
    let listed = service.notifications(10).unwrap();
    assert_eq!(listed.len(), 3);
    service.mark_read(listed[0].id).unwrap();
    assert_eq!(service.unread_count().unwrap(), 2);
    service.mark_all_read().unwrap();
    assert_eq!(service.unread_count().unwrap(), 0);
    assert_eq!(service.clear_all().unwrap(), 3);
    assert!(service.notifications(10).unwrap().is_empty());
}
