// crates/gridreg-services/src/parameters.rs
// ============================================================================
// Module: Parameter Service
// Description: Parameter table load, save, import, and code generation.
// Purpose: Bridge the grid model, the importer, and the store.
// Dependencies: gridreg-codegen, gridreg-core, gridreg-import, gridreg-store-sqlite
// ============================================================================

//! ## Overview
//! Saving is a destructive replace inside one transaction: every existing
//! row for the regulation is deleted and the grid is inserted with
//! `row_order` equal to the table index. Image cells serialize as the fixed
//! placeholder because the backing column is text-only. Loading rebuilds the
//! grid from `row_order`. Code generation reads the stored rows and runs the
//! pure template rewrite; it never mutates the database.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;

use gridreg_codegen::CodegenError;
use gridreg_codegen::GenerationReport;
use gridreg_codegen::ParameterInput;
use gridreg_codegen::generate_to_path;
use gridreg_core::ChangeType;
use gridreg_core::EntityType;
use gridreg_core::Field;
use gridreg_core::ParameterGrid;
use gridreg_core::RegulationId;
use gridreg_core::SchemaWidth;
use gridreg_core::ServiceError;
use gridreg_core::ServiceResult;
use gridreg_core::User;
use gridreg_import::ImportError;
use gridreg_import::ImportSummary;
use gridreg_import::import_workbook;
use gridreg_store_sqlite::NewParameter;
use gridreg_store_sqlite::Store;
use serde_json::json;
use tracing::info;

use crate::history::HistoryRecorder;
use crate::regulation::require_capability;

// ============================================================================
// SECTION: Service
// ============================================================================

/// Parameter table service.
pub struct ParameterService<'a> {
    /// Backing store.
    store: &'a Store,
    /// History recorder.
    history: HistoryRecorder<'a>,
}

impl<'a> ParameterService<'a> {
    /// Creates the service over the store.
    #[must_use]
    pub const fn new(store: &'a Store) -> Self {
        Self {
            store,
            history: HistoryRecorder::new(store),
        }
    }

    /// Loads the stored parameter table as an extended-schema grid.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Storage`] on persistence failure.
    pub fn load_grid(&self, regulation_id: RegulationId) -> ServiceResult<ParameterGrid> {
        let rows = self
            .store
            .parameters_for(regulation_id)
            .map_err(|err| ServiceError::Storage(err.to_string()))?;
        let mut grid = ParameterGrid::new(SchemaWidth::Extended);
        for row in rows {
            grid.push_text_row([
                row.category,
                row.parameter_name,
                row.default_value,
                row.upper_limit,
                row.lower_limit,
                row.unit,
                row.coefficient,
                row.protocol_bit,
                row.remark,
            ]);
        }
        Ok(grid)
    }

    /// Saves the grid with full-replace semantics; returns the row count.
    ///
    /// Image cells persist as their fixed placeholder string.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Storage`] when the transaction fails; the
    /// previous rows remain in that case.
    pub fn save_grid(
        &self,
        actor: Option<&User>,
        regulation_id: RegulationId,
        grid: &ParameterGrid,
    ) -> ServiceResult<usize> {
        require_capability(actor, gridreg_core::Capability::Write)?;
        let schema = grid.schema();
        let rows: Vec<NewParameter> = (0..grid.len())
            .map(|index| {
                let cells = grid.storage_row(index);
                let cell = |field: Field| {
                    schema
                        .column_of(field)
                        .and_then(|column| cells.get(column).cloned())
                        .unwrap_or_default()
                };
                NewParameter {
                    category: cell(Field::Category),
                    parameter_name: cell(Field::Name),
                    default_value: cell(Field::Default),
                    upper_limit: cell(Field::Upper),
                    lower_limit: cell(Field::Lower),
                    unit: cell(Field::Unit),
                    coefficient: cell(Field::Coefficient),
                    protocol_bit: cell(Field::ProtocolBit),
                    remark: cell(Field::Remark),
                    remark_image: None,
                }
            })
            .collect();
        let saved = self
            .store
            .replace_parameters(regulation_id, &rows)
            .map_err(|err| ServiceError::Storage(err.to_string()))?;
        if let Some(actor) = actor {
            self.history.record(
                EntityType::Regulation,
                regulation_id.get(),
                ChangeType::Update,
                &json!({ "parameter_rows": saved }),
                &format!("saved parameter table: {saved} rows"),
                Some(actor.id),
            );
        }
        info!(regulation = regulation_id.get(), rows = saved, "parameters saved");
        Ok(saved)
    }

    /// Imports a workbook into a grid without touching the database.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::SourceFile`] for unreadable files and
    /// [`ServiceError::Validation`] for unreadable packages.
    pub fn import_workbook(
        &self,
        path: &Path,
        schema: SchemaWidth,
    ) -> ServiceResult<(ParameterGrid, ImportSummary)> {
        import_workbook(path, schema).map_err(|err| match err {
            ImportError::Io(message) => ServiceError::SourceFile(message),
            other => ServiceError::Validation(other.to_string()),
        })
    }

    /// Imports a workbook and saves it in one step.
    ///
    /// # Errors
    ///
    /// Propagates import and save failures; a failed save leaves the
    /// previous rows in place.
    pub fn import_and_save(
        &self,
        actor: Option<&User>,
        regulation_id: RegulationId,
        path: &Path,
        schema: SchemaWidth,
    ) -> ServiceResult<(usize, ImportSummary)> {
        let (grid, summary) = self.import_workbook(path, schema)?;
        let saved = self.save_grid(actor, regulation_id, &grid)?;
        Ok((saved, summary))
    }

    /// Generates the C parameter array from the stored table.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::SourceFile`] for a missing template and
    /// [`ServiceError::Storage`] for persistence failures.
    pub fn generate_code(
        &self,
        regulation_id: RegulationId,
        template: &Path,
        output: &Path,
    ) -> ServiceResult<GenerationReport> {
        let rows = self
            .store
            .parameters_for(regulation_id)
            .map_err(|err| ServiceError::Storage(err.to_string()))?;
        generate_to_path(template, output, rows.iter().map(ParameterInput::from)).map_err(
            |err| match err {
                CodegenError::Io(message) => ServiceError::SourceFile(message),
                CodegenError::TooLarge { actual_bytes } => ServiceError::Validation(format!(
                    "template too large: {actual_bytes} bytes"
                )),
            },
        )
    }
}
