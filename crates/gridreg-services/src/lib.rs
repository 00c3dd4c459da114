// crates/gridreg-services/src/lib.rs
// ============================================================================
// Module: Gridreg Services
// Description: Service layer over the store, storage, and external tools.
// Purpose: Expose the application operations behind the error taxonomy.
// Dependencies: crate::{auth, history, importer, parameters, regulation, release, search, sync, token, update, worker}
// ============================================================================

//! ## Overview
//! Services are stateless: each holds references to the store and config,
//! opens a scoped transaction per call through the store, and converts
//! low-level failures into the shared [`gridreg_core::ServiceError`]
//! taxonomy. Change-history recording is fire-and-forget; it never fails a
//! primary mutation. Long-running network and subprocess operations are
//! designed to run on [`worker`] threads with results delivered over a
//! channel.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod auth;
pub mod history;
pub mod importer;
pub mod parameters;
pub mod regulation;
pub mod release;
pub mod search;
pub mod sync;
pub mod token;
pub mod update;
pub mod worker;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use auth::AuthService;
pub use auth::LoginSession;
pub use history::HistoryRecorder;
pub use importer::ImportStats;
pub use importer::RegulationImporter;
pub use parameters::ParameterService;
pub use regulation::CreateRegulation;
pub use regulation::DeleteOutcome;
pub use regulation::RegulationService;
pub use regulation::UpdateRegulation;
pub use regulation::doc_type_from_extension;
pub use release::ReleaseInfo;
pub use release::ReleaseService;
pub use search::SearchService;
pub use sync::RemoteDivergence;
pub use sync::SyncService;
pub use token::SessionClaims;
pub use token::TokenSigner;
pub use update::UpdateCheck;
pub use update::UpdateService;
pub use update::VersionDescriptor;
pub use worker::TaskError;
pub use worker::TaskHandle;
pub use worker::spawn_task;
