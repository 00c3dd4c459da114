// crates/gridreg-store-sqlite/src/lib.rs
// ============================================================================
// Module: Gridreg SQLite Store
// Description: Relational persistence for Gridreg entities.
// Purpose: Provide scoped transactions over one SQLite database file.
// Dependencies: gridreg-core, rusqlite
// ============================================================================

//! ## Overview
//! This crate persists the Gridreg entity families in a single `SQLite`
//! database. The store is stateless beyond its guarded connection: every
//! call acquires the connection, runs inside an explicit transaction where a
//! mutation is involved, and releases deterministically on all exit paths.
//! Raw driver errors never escape; they are classified into [`StoreError`]
//! at this boundary.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod history;
pub mod notifications;
pub mod parameters;
pub mod regulations;
pub mod store;
pub mod users;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use parameters::NewParameter;
pub use regulations::NewCodeFile;
pub use regulations::NewDocument;
pub use regulations::NewRegulation;
pub use regulations::RegulationFilter;
pub use regulations::RegulationUpdate;
pub use store::Store;
pub use store::StoreConfig;
pub use store::StoreError;
