// crates/gridreg-services/src/importer.rs
// ============================================================================
// Module: Bulk Regulation Import
// Description: JSON document import with per-row error collection.
// Purpose: Load regulation sets without aborting on a single bad row.
// Dependencies: gridreg-core, gridreg-store-sqlite, serde, serde_json
// ============================================================================

//! ## Overview
//! Imports a `{"regulations": [...]}` document. Each record is processed
//! independently: an existing code is skipped unless `overwrite` is set, an
//! invalid status string falls back to `active`, tags are created when
//! absent, and a failed record lands in the error list without stopping the
//! run. The caller receives total, succeeded, skipped, and failed counts
//! alongside the per-row messages.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::path::Path;
use std::str::FromStr;

use gridreg_core::ChangeType;
use gridreg_core::EntityType;
use gridreg_core::RegulationStatus;
use gridreg_core::ServiceError;
use gridreg_core::ServiceResult;
use gridreg_core::User;
use gridreg_store_sqlite::NewRegulation;
use gridreg_store_sqlite::RegulationUpdate;
use gridreg_store_sqlite::Store;
use serde::Deserialize;
use tracing::info;

use crate::history::HistoryRecorder;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Maximum import document size in bytes.
const MAX_IMPORT_BYTES: u64 = 16 * 1024 * 1024;

// ============================================================================
// SECTION: Document Model
// ============================================================================

/// Top-level import document.
#[derive(Debug, Deserialize)]
struct ImportDocument {
    /// Regulation records.
    #[serde(default)]
    regulations: Vec<RegulationRecord>,
}

/// One regulation record in the document.
#[derive(Debug, Deserialize)]
struct RegulationRecord {
    /// Unique regulation code; required.
    #[serde(default)]
    code: String,
    /// Display name.
    #[serde(default)]
    name: String,
    /// Issuing country or region.
    #[serde(default)]
    country: Option<String>,
    /// Category.
    #[serde(default)]
    category: Option<String>,
    /// Description.
    #[serde(default)]
    description: Option<String>,
    /// Status label; invalid values fall back to `active`.
    #[serde(default)]
    status: Option<String>,
    /// Regulation version.
    #[serde(default)]
    version: Option<String>,
    /// Tag names.
    #[serde(default)]
    tags: Vec<String>,
}

/// Per-run import statistics.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ImportStats {
    /// Records in the document.
    pub total: usize,
    /// Records created or overwritten.
    pub succeeded: usize,
    /// Records skipped because the code already existed.
    pub skipped: usize,
    /// Records that failed.
    pub failed: usize,
    /// Per-record failure messages.
    pub errors: Vec<String>,
}

// ============================================================================
// SECTION: Importer
// ============================================================================

/// Bulk regulation importer.
pub struct RegulationImporter<'a> {
    /// Backing store.
    store: &'a Store,
    /// History recorder.
    history: HistoryRecorder<'a>,
}

impl<'a> RegulationImporter<'a> {
    /// Creates the importer over the store.
    #[must_use]
    pub const fn new(store: &'a Store) -> Self {
        Self {
            store,
            history: HistoryRecorder::new(store),
        }
    }

    /// Imports a JSON document from disk.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::SourceFile`] for an unreadable file and
    /// [`ServiceError::Validation`] for an unparseable document. Individual
    /// record failures are collected, never raised.
    pub fn import_json(
        &self,
        path: &Path,
        actor: Option<&User>,
        overwrite: bool,
    ) -> ServiceResult<ImportStats> {
        let metadata = fs::metadata(path)
            .map_err(|_| ServiceError::SourceFile(format!("{} not found", path.display())))?;
        if metadata.len() > MAX_IMPORT_BYTES {
            return Err(ServiceError::Validation(format!(
                "import document exceeds {MAX_IMPORT_BYTES} bytes"
            )));
        }
        let bytes =
            fs::read(path).map_err(|err| ServiceError::SourceFile(err.to_string()))?;
        let document: ImportDocument = serde_json::from_slice(&bytes)
            .map_err(|err| ServiceError::Validation(format!("import parse failed: {err}")))?;
        if document.regulations.is_empty() {
            return Err(ServiceError::Validation(
                "document holds no regulations".to_string(),
            ));
        }
        Ok(self.apply(&document.regulations, actor, overwrite))
    }

    /// Applies the records, collecting per-record outcomes.
    fn apply(
        &self,
        records: &[RegulationRecord],
        actor: Option<&User>,
        overwrite: bool,
    ) -> ImportStats {
        let mut stats = ImportStats {
            total: records.len(),
            ..ImportStats::default()
        };
        for record in records {
            match self.apply_one(record, actor, overwrite) {
                Ok(RecordOutcome::Imported) => stats.succeeded += 1,
                Ok(RecordOutcome::Skipped) => stats.skipped += 1,
                Err(message) => {
                    stats.failed += 1;
                    stats.errors.push(message);
                }
            }
        }
        info!(
            total = stats.total,
            succeeded = stats.succeeded,
            skipped = stats.skipped,
            failed = stats.failed,
            "bulk import finished"
        );
        stats
    }

    /// Imports one record; errors are messages, not aborts.
    fn apply_one(
        &self,
        record: &RegulationRecord,
        actor: Option<&User>,
        overwrite: bool,
    ) -> Result<RecordOutcome, String> {
        let code = record.code.trim();
        if code.is_empty() {
            return Err("record has no code".to_string());
        }
        let status = record
            .status
            .as_deref()
            .and_then(|label| RegulationStatus::from_str(label).ok())
            .unwrap_or(RegulationStatus::Active);
        let existing = self
            .store
            .regulation_by_code(code)
            .map_err(|err| format!("{code}: {err}"))?;
        match existing {
            Some(_) if !overwrite => Ok(RecordOutcome::Skipped),
            Some(existing) => {
                let update = RegulationUpdate {
                    code: None,
                    name: non_empty(&record.name),
                    country: record.country.clone(),
                    category: record.category.clone(),
                    description: record.description.clone(),
                    status: Some(status),
                    version: record.version.clone(),
                    tags: Some(record.tags.clone()),
                };
                let updated = self
                    .store
                    .update_regulation(existing.id, &update)
                    .map_err(|err| format!("{code}: {err}"))?;
                if let Some(actor) = actor {
                    self.history.record(
                        EntityType::Regulation,
                        updated.id.get(),
                        ChangeType::Update,
                        &updated,
                        &format!("bulk import overwrote regulation: {code}"),
                        Some(actor.id),
                    );
                }
                Ok(RecordOutcome::Imported)
            }
            None => {
                if record.name.trim().is_empty() {
                    return Err(format!("{code}: record has no name"));
                }
                let new = NewRegulation {
                    code: code.to_string(),
                    name: record.name.clone(),
                    country: record.country.clone(),
                    category: record.category.clone(),
                    description: record.description.clone(),
                    status: Some(status),
                    version: record.version.clone(),
                    created_by: actor.map(|user| user.id),
                    tags: record.tags.clone(),
                };
                let created = self
                    .store
                    .insert_regulation(&new)
                    .map_err(|err| format!("{code}: {err}"))?;
                if let Some(actor) = actor {
                    self.history.record(
                        EntityType::Regulation,
                        created.id.get(),
                        ChangeType::Create,
                        &created,
                        &format!("bulk import created regulation: {code}"),
                        Some(actor.id),
                    );
                }
                Ok(RecordOutcome::Imported)
            }
        }
    }
}

/// Outcome of one record.
enum RecordOutcome {
    /// Created or overwritten.
    Imported,
    /// Skipped on an existing code.
    Skipped,
}

/// Maps an empty string to `None`.
fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
