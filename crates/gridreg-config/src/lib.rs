// crates/gridreg-config/src/lib.rs
// ============================================================================
// Module: Gridreg Configuration Library
// Description: Configuration surface for the Gridreg application.
// Purpose: Expose strict, fail-closed config loading and storage layout.
// Dependencies: crate::config
// ============================================================================

//! ## Overview
//! Configuration is an explicit struct constructed once at startup and passed
//! by reference into every component that needs it. There is no ambient
//! global lookup. Loading is strict: oversized files, malformed TOML, and
//! out-of-range values fail closed.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::AppConfig;
pub use config::AuthConfig;
pub use config::ConfigError;
pub use config::DatabaseConfig;
pub use config::ReleaseConfig;
pub use config::StorageLayout;
pub use config::SyncConfig;
pub use config::UpdateConfig;
