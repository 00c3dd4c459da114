// crates/gridreg-store-sqlite/src/parameters.rs
// ============================================================================
// Module: Parameter Repository
// Description: Regulation parameter rows with full-replace semantics.
// Purpose: Persist the parameter table as ordered string-typed rows.
// Dependencies: gridreg-core, rusqlite
// ============================================================================

//! ## Overview
//! Parameter saves are a destructive replace: delete every row for the
//! regulation, then insert one row per table row with `row_order` equal to
//! the table index, all inside one transaction. Loads return rows ordered by
//! `row_order`, which reconstructs the table exactly.

// ============================================================================
// SECTION: Imports
// ============================================================================

use gridreg_core::ParameterId;
use gridreg_core::RegulationId;
use gridreg_core::RegulationParameter;
use gridreg_core::Timestamp;
use rusqlite::Row;
use rusqlite::params;

use crate::store::Store;
use crate::store::StoreError;
use crate::store::now_unix;

// ============================================================================
// SECTION: Input Records
// ============================================================================

/// One parameter table row to persist; `row_order` is assigned by position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewParameter {
    /// Category (merged display column).
    pub category: String,
    /// Parameter name.
    pub parameter_name: String,
    /// Default value.
    pub default_value: String,
    /// Upper limit.
    pub upper_limit: String,
    /// Lower limit.
    pub lower_limit: String,
    /// Measurement unit.
    pub unit: String,
    /// Scaling divisor for code generation.
    pub coefficient: String,
    /// Protocol bit identifier for code generation.
    pub protocol_bit: String,
    /// Free-text remark.
    pub remark: String,
    /// Optional remark image blob.
    pub remark_image: Option<Vec<u8>>,
}

// ============================================================================
// SECTION: Row Mapping
// ============================================================================

/// Maps a parameter row in column order.
fn map_parameter(row: &Row<'_>) -> Result<RegulationParameter, StoreError> {
    let id: i64 = row.get(0).map_err(|err| StoreError::Db(err.to_string()))?;
    let regulation_id: i64 = row.get(1).map_err(|err| StoreError::Db(err.to_string()))?;
    Ok(RegulationParameter {
        id: ParameterId::from_raw(id)
            .ok_or_else(|| StoreError::Invalid(format!("non-positive parameter id: {id}")))?,
        regulation_id: RegulationId::from_raw(regulation_id).ok_or_else(|| {
            StoreError::Invalid(format!("non-positive regulation id: {regulation_id}"))
        })?,
        category: row.get(2).map_err(|err| StoreError::Db(err.to_string()))?,
        parameter_name: row.get(3).map_err(|err| StoreError::Db(err.to_string()))?,
        default_value: row.get(4).map_err(|err| StoreError::Db(err.to_string()))?,
        upper_limit: row.get(5).map_err(|err| StoreError::Db(err.to_string()))?,
        lower_limit: row.get(6).map_err(|err| StoreError::Db(err.to_string()))?,
        unit: row.get(7).map_err(|err| StoreError::Db(err.to_string()))?,
        coefficient: row.get(8).map_err(|err| StoreError::Db(err.to_string()))?,
        protocol_bit: row.get(9).map_err(|err| StoreError::Db(err.to_string()))?,
        remark: row.get(10).map_err(|err| StoreError::Db(err.to_string()))?,
        remark_image: row.get(11).map_err(|err| StoreError::Db(err.to_string()))?,
        row_order: row.get(12).map_err(|err| StoreError::Db(err.to_string()))?,
        created_at: Timestamp::from_unix_seconds(
            row.get(13).map_err(|err| StoreError::Db(err.to_string()))?,
        ),
        updated_at: Timestamp::from_unix_seconds(
            row.get(14).map_err(|err| StoreError::Db(err.to_string()))?,
        ),
    })
}

/// Columns selected for every parameter query.
const PARAMETER_COLUMNS: &str = "id, regulation_id, category, parameter_name, default_value, \
     upper_limit, lower_limit, unit, coefficient, protocol_bit, remark, remark_image, \
     row_order, created_at, updated_at";

// ============================================================================
// SECTION: Repository
// ============================================================================

impl Store {
    /// Replaces every parameter row for the regulation in one transaction.
    ///
    /// Returns the number of rows inserted.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on driver failure; the transaction rolls back
    /// and the previous rows remain.
    pub fn replace_parameters(
        &self,
        regulation_id: RegulationId,
        rows: &[NewParameter],
    ) -> Result<usize, StoreError> {
        let mut guard = self.lock();
        let tx = guard.transaction().map_err(|err| StoreError::from_sqlite(&err))?;
        tx.execute(
            "DELETE FROM regulation_parameters WHERE regulation_id = ?1",
            params![regulation_id.get()],
        )
        .map_err(|err| StoreError::from_sqlite(&err))?;
        let now = now_unix();
        for (index, row) in rows.iter().enumerate() {
            tx.execute(
                "INSERT INTO regulation_parameters
                     (regulation_id, category, parameter_name, default_value, upper_limit,
                      lower_limit, unit, coefficient, protocol_bit, remark, remark_image,
                      row_order, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?13)",
                params![
                    regulation_id.get(),
                    row.category,
                    row.parameter_name,
                    row.default_value,
                    row.upper_limit,
                    row.lower_limit,
                    row.unit,
                    row.coefficient,
                    row.protocol_bit,
                    row.remark,
                    row.remark_image,
                    i64::try_from(index).unwrap_or(i64::MAX),
                    now,
                ],
            )
            .map_err(|err| StoreError::from_sqlite(&err))?;
        }
        tx.commit().map_err(|err| StoreError::from_sqlite(&err))?;
        Ok(rows.len())
    }

    /// Loads parameter rows for a regulation ordered by `row_order`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on driver failure.
    pub fn parameters_for(
        &self,
        regulation_id: RegulationId,
    ) -> Result<Vec<RegulationParameter>, StoreError> {
        let guard = self.lock();
        let mut statement = guard
            .prepare(&format!(
                "SELECT {PARAMETER_COLUMNS} FROM regulation_parameters
                 WHERE regulation_id = ?1 ORDER BY row_order, id"
            ))
            .map_err(|err| StoreError::from_sqlite(&err))?;
        let mut rows = statement
            .query(params![regulation_id.get()])
            .map_err(|err| StoreError::from_sqlite(&err))?;
        let mut parameters = Vec::new();
        while let Some(row) = rows.next().map_err(|err| StoreError::from_sqlite(&err))? {
            parameters.push(map_parameter(row)?);
        }
        Ok(parameters)
    }

    /// Counts parameter rows for a regulation.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on driver failure.
    pub fn parameter_count(&self, regulation_id: RegulationId) -> Result<i64, StoreError> {
        let guard = self.lock();
        guard
            .query_row(
                "SELECT COUNT(*) FROM regulation_parameters WHERE regulation_id = ?1",
                params![regulation_id.get()],
                |row| row.get(0),
            )
            .map_err(|err| StoreError::from_sqlite(&err))
    }
}
