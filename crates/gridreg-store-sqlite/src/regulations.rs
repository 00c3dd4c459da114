// crates/gridreg-store-sqlite/src/regulations.rs
// ============================================================================
// Module: Regulation Repository
// Description: Regulation rows with tags, documents, and code files.
// Purpose: Persist the central entity family under scoped transactions.
// Dependencies: gridreg-core, rusqlite
// ============================================================================

//! ## Overview
//! Regulations own their documents, code files, parameters, and tag links
//! through `ON DELETE CASCADE` foreign keys, so a single row delete removes
//! the whole family. Tag resolution is create-if-absent with case-sensitive
//! exact matching. List filtering composes SQL fragments with text
//! parameters only; integer values are formatted inline.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::str::FromStr;

use gridreg_core::CodeFile;
use gridreg_core::CodeFileId;
use gridreg_core::DocumentId;
use gridreg_core::DocumentType;
use gridreg_core::Regulation;
use gridreg_core::RegulationDocument;
use gridreg_core::RegulationId;
use gridreg_core::RegulationStatus;
use gridreg_core::Timestamp;
use gridreg_core::UserId;
use rusqlite::Row;
use rusqlite::Transaction;
use rusqlite::params;
use rusqlite::params_from_iter;

use crate::store::Store;
use crate::store::StoreError;
use crate::store::now_unix;

// ============================================================================
// SECTION: Input Records
// ============================================================================

/// Fields required to create a regulation.
#[derive(Debug, Clone, Default)]
pub struct NewRegulation {
    /// Unique external code.
    pub code: String,
    /// Display name.
    pub name: String,
    /// Issuing country or region.
    pub country: Option<String>,
    /// Regulation category.
    pub category: Option<String>,
    /// Free-text description.
    pub description: Option<String>,
    /// Lifecycle status.
    pub status: Option<RegulationStatus>,
    /// Regulation document version.
    pub version: Option<String>,
    /// Creating user.
    pub created_by: Option<UserId>,
    /// Tag names resolved create-if-absent.
    pub tags: Vec<String>,
}

/// Partial update for a regulation; absent fields keep their value.
///
/// # Invariants
/// - `tags`, when present, fully replaces the tag set.
#[derive(Debug, Clone, Default)]
pub struct RegulationUpdate {
    /// New code.
    pub code: Option<String>,
    /// New name.
    pub name: Option<String>,
    /// New country.
    pub country: Option<String>,
    /// New category.
    pub category: Option<String>,
    /// New description.
    pub description: Option<String>,
    /// New status.
    pub status: Option<RegulationStatus>,
    /// New version.
    pub version: Option<String>,
    /// Replacement tag set.
    pub tags: Option<Vec<String>>,
}

impl RegulationUpdate {
    /// True when no field is present.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.code.is_none()
            && self.name.is_none()
            && self.country.is_none()
            && self.category.is_none()
            && self.description.is_none()
            && self.status.is_none()
            && self.version.is_none()
            && self.tags.is_none()
    }
}

/// List and search filter; every field is optional and conjunctive.
#[derive(Debug, Clone, Default)]
pub struct RegulationFilter {
    /// Exact country match.
    pub country: Option<String>,
    /// Exact category match.
    pub category: Option<String>,
    /// Exact status match.
    pub status: Option<RegulationStatus>,
    /// At least one tag name must match.
    pub tags: Vec<String>,
    /// Substring match across name, code, and description. Matching uses
    /// `LIKE` under the database default collation: ASCII case-insensitive,
    /// byte-wise otherwise.
    pub keyword: Option<String>,
}

/// Fields required to attach a document.
#[derive(Debug, Clone)]
pub struct NewDocument {
    /// Owning regulation.
    pub regulation_id: RegulationId,
    /// Document format.
    pub doc_type: DocumentType,
    /// Original file name.
    pub file_name: String,
    /// Managed-storage copy path.
    pub file_path: String,
    /// Source size in bytes, when known.
    pub file_size: Option<i64>,
    /// Uploading user.
    pub upload_by: Option<UserId>,
}

/// Fields required to attach a code file.
#[derive(Debug, Clone)]
pub struct NewCodeFile {
    /// Owning regulation.
    pub regulation_id: RegulationId,
    /// Original file name.
    pub file_name: String,
    /// Managed-storage copy path.
    pub file_path: String,
    /// What the file implements.
    pub description: Option<String>,
    /// How to apply the file.
    pub usage_guide: Option<String>,
    /// Code file version.
    pub version: Option<String>,
    /// Creating user.
    pub created_by: Option<UserId>,
}

// ============================================================================
// SECTION: Row Mapping
// ============================================================================

/// Columns selected for every regulation query.
const REGULATION_COLUMNS: &str = "id, code, name, country, category, description, status, \
     version, created_by, created_at, updated_at";

/// Maps a regulation row in column order; tags are attached separately.
fn map_regulation(row: &Row<'_>) -> Result<Regulation, StoreError> {
    let id: i64 = row.get(0).map_err(|err| StoreError::Db(err.to_string()))?;
    let status_label: String = row.get(6).map_err(|err| StoreError::Db(err.to_string()))?;
    let created_by: Option<i64> = row.get(8).map_err(|err| StoreError::Db(err.to_string()))?;
    Ok(Regulation {
        id: RegulationId::from_raw(id)
            .ok_or_else(|| StoreError::Invalid(format!("non-positive regulation id: {id}")))?,
        code: row.get(1).map_err(|err| StoreError::Db(err.to_string()))?,
        name: row.get(2).map_err(|err| StoreError::Db(err.to_string()))?,
        country: row.get(3).map_err(|err| StoreError::Db(err.to_string()))?,
        category: row.get(4).map_err(|err| StoreError::Db(err.to_string()))?,
        description: row.get(5).map_err(|err| StoreError::Db(err.to_string()))?,
        status: RegulationStatus::from_str(&status_label)?,
        version: row.get(7).map_err(|err| StoreError::Db(err.to_string()))?,
        created_by: created_by.and_then(UserId::from_raw),
        created_at: Timestamp::from_unix_seconds(
            row.get(9).map_err(|err| StoreError::Db(err.to_string()))?,
        ),
        updated_at: Timestamp::from_unix_seconds(
            row.get(10).map_err(|err| StoreError::Db(err.to_string()))?,
        ),
        tags: Vec::new(),
    })
}

/// Maps a document row in column order.
fn map_document(row: &Row<'_>) -> Result<RegulationDocument, StoreError> {
    let id: i64 = row.get(0).map_err(|err| StoreError::Db(err.to_string()))?;
    let regulation_id: i64 = row.get(1).map_err(|err| StoreError::Db(err.to_string()))?;
    let doc_type_label: String = row.get(2).map_err(|err| StoreError::Db(err.to_string()))?;
    let upload_by: Option<i64> = row.get(6).map_err(|err| StoreError::Db(err.to_string()))?;
    Ok(RegulationDocument {
        id: DocumentId::from_raw(id)
            .ok_or_else(|| StoreError::Invalid(format!("non-positive document id: {id}")))?,
        regulation_id: RegulationId::from_raw(regulation_id).ok_or_else(|| {
            StoreError::Invalid(format!("non-positive regulation id: {regulation_id}"))
        })?,
        doc_type: DocumentType::from_str(&doc_type_label)?,
        file_name: row.get(3).map_err(|err| StoreError::Db(err.to_string()))?,
        file_path: row.get(4).map_err(|err| StoreError::Db(err.to_string()))?,
        file_size: row.get(5).map_err(|err| StoreError::Db(err.to_string()))?,
        upload_by: upload_by.and_then(UserId::from_raw),
        upload_at: Timestamp::from_unix_seconds(
            row.get(7).map_err(|err| StoreError::Db(err.to_string()))?,
        ),
    })
}

/// Maps a code file row in column order.
fn map_code_file(row: &Row<'_>) -> Result<CodeFile, StoreError> {
    let id: i64 = row.get(0).map_err(|err| StoreError::Db(err.to_string()))?;
    let regulation_id: i64 = row.get(1).map_err(|err| StoreError::Db(err.to_string()))?;
    let created_by: Option<i64> = row.get(7).map_err(|err| StoreError::Db(err.to_string()))?;
    Ok(CodeFile {
        id: CodeFileId::from_raw(id)
            .ok_or_else(|| StoreError::Invalid(format!("non-positive code file id: {id}")))?,
        regulation_id: RegulationId::from_raw(regulation_id).ok_or_else(|| {
            StoreError::Invalid(format!("non-positive regulation id: {regulation_id}"))
        })?,
        file_name: row.get(2).map_err(|err| StoreError::Db(err.to_string()))?,
        file_path: row.get(3).map_err(|err| StoreError::Db(err.to_string()))?,
        description: row.get(4).map_err(|err| StoreError::Db(err.to_string()))?,
        usage_guide: row.get(5).map_err(|err| StoreError::Db(err.to_string()))?,
        version: row.get(6).map_err(|err| StoreError::Db(err.to_string()))?,
        created_by: created_by.and_then(UserId::from_raw),
        created_at: Timestamp::from_unix_seconds(
            row.get(8).map_err(|err| StoreError::Db(err.to_string()))?,
        ),
        updated_at: Timestamp::from_unix_seconds(
            row.get(9).map_err(|err| StoreError::Db(err.to_string()))?,
        ),
    })
}

// ============================================================================
// SECTION: Tag Helpers
// ============================================================================

/// Resolves a tag id by exact name, creating the tag when absent.
fn resolve_tag_in_tx(tx: &Transaction<'_>, name: &str) -> Result<i64, StoreError> {
    let existing: Option<i64> = tx
        .query_row("SELECT id FROM tags WHERE name = ?1", params![name], |row| row.get(0))
        .map(Some)
        .or_else(|err| match err {
            rusqlite::Error::QueryReturnedNoRows => Ok(None),
            other => Err(StoreError::from_sqlite(&other)),
        })?;
    if let Some(id) = existing {
        return Ok(id);
    }
    tx.execute("INSERT INTO tags (name, created_at) VALUES (?1, ?2)", params![name, now_unix()])
        .map_err(|err| StoreError::from_sqlite(&err))?;
    Ok(tx.last_insert_rowid())
}

/// Links the regulation to each tag name, creating tags as needed.
fn attach_tags_in_tx(
    tx: &Transaction<'_>,
    regulation_id: i64,
    tags: &[String],
) -> Result<(), StoreError> {
    for name in tags {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            continue;
        }
        let tag_id = resolve_tag_in_tx(tx, trimmed)?;
        tx.execute(
            "INSERT OR IGNORE INTO regulation_tags (regulation_id, tag_id) VALUES (?1, ?2)",
            params![regulation_id, tag_id],
        )
        .map_err(|err| StoreError::from_sqlite(&err))?;
    }
    Ok(())
}

/// Loads the resolved tag names for a regulation in attach order.
fn tags_for(connection: &rusqlite::Connection, regulation_id: i64) -> Result<Vec<String>, StoreError> {
    let mut statement = connection
        .prepare(
            "SELECT t.name FROM tags t
             JOIN regulation_tags rt ON rt.tag_id = t.id
             WHERE rt.regulation_id = ?1
             ORDER BY t.id",
        )
        .map_err(|err| StoreError::from_sqlite(&err))?;
    let mut rows = statement
        .query(params![regulation_id])
        .map_err(|err| StoreError::from_sqlite(&err))?;
    let mut names = Vec::new();
    while let Some(row) = rows.next().map_err(|err| StoreError::from_sqlite(&err))? {
        names.push(row.get(0).map_err(|err| StoreError::Db(err.to_string()))?);
    }
    Ok(names)
}

// ============================================================================
// SECTION: Repository
// ============================================================================

impl Store {
    /// Inserts a regulation with its tags and returns the stored row.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Constraint`] on a duplicate code.
    pub fn insert_regulation(&self, new: &NewRegulation) -> Result<Regulation, StoreError> {
        let mut guard = self.lock();
        let tx = guard.transaction().map_err(|err| StoreError::from_sqlite(&err))?;
        let now = now_unix();
        let status = new.status.unwrap_or(RegulationStatus::Draft);
        tx.execute(
            "INSERT INTO regulations
                 (code, name, country, category, description, status, version,
                  created_by, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)",
            params![
                new.code,
                new.name,
                new.country,
                new.category,
                new.description,
                status.as_str(),
                new.version,
                new.created_by.map(UserId::get),
                now,
            ],
        )
        .map_err(|err| StoreError::from_sqlite(&err))?;
        let id = tx.last_insert_rowid();
        attach_tags_in_tx(&tx, id, &new.tags)?;
        let mut regulation = tx
            .query_row(
                &format!("SELECT {REGULATION_COLUMNS} FROM regulations WHERE id = ?1"),
                params![id],
                |row| Ok(map_regulation(row)),
            )
            .map_err(|err| StoreError::from_sqlite(&err))??;
        regulation.tags = tags_for(&tx, id)?;
        tx.commit().map_err(|err| StoreError::from_sqlite(&err))?;
        Ok(regulation)
    }

    /// Fetches a regulation (with tags) by id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on driver failure; `Ok(None)` when absent.
    pub fn regulation_by_id(&self, id: RegulationId) -> Result<Option<Regulation>, StoreError> {
        let guard = self.lock();
        let mut statement = guard
            .prepare(&format!("SELECT {REGULATION_COLUMNS} FROM regulations WHERE id = ?1"))
            .map_err(|err| StoreError::from_sqlite(&err))?;
        let mut rows = statement
            .query(params![id.get()])
            .map_err(|err| StoreError::from_sqlite(&err))?;
        match rows.next().map_err(|err| StoreError::from_sqlite(&err))? {
            Some(row) => {
                let mut regulation = map_regulation(row)?;
                drop(rows);
                drop(statement);
                regulation.tags = tags_for(&guard, id.get())?;
                Ok(Some(regulation))
            }
            None => Ok(None),
        }
    }

    /// Fetches a regulation (with tags) by unique code.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on driver failure; `Ok(None)` when absent.
    pub fn regulation_by_code(&self, code: &str) -> Result<Option<Regulation>, StoreError> {
        let guard = self.lock();
        let mut statement = guard
            .prepare(&format!("SELECT {REGULATION_COLUMNS} FROM regulations WHERE code = ?1"))
            .map_err(|err| StoreError::from_sqlite(&err))?;
        let mut rows = statement
            .query(params![code])
            .map_err(|err| StoreError::from_sqlite(&err))?;
        match rows.next().map_err(|err| StoreError::from_sqlite(&err))? {
            Some(row) => {
                let mut regulation = map_regulation(row)?;
                let raw_id = regulation.id.get();
                drop(rows);
                drop(statement);
                regulation.tags = tags_for(&guard, raw_id)?;
                Ok(Some(regulation))
            }
            None => Ok(None),
        }
    }

    /// Applies a partial update and returns the stored row.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] when the regulation does not exist
    /// and [`StoreError::Constraint`] when a new code collides.
    pub fn update_regulation(
        &self,
        id: RegulationId,
        update: &RegulationUpdate,
    ) -> Result<Regulation, StoreError> {
        let mut guard = self.lock();
        let tx = guard.transaction().map_err(|err| StoreError::from_sqlite(&err))?;
        let mut fragments: Vec<String> = Vec::new();
        let mut values: Vec<String> = Vec::new();
        let bind =
            |fragments: &mut Vec<String>, values: &mut Vec<String>, column: &str, value: String| {
                values.push(value);
                fragments.push(format!("{column} = ?{}", values.len()));
            };
        if let Some(value) = &update.code {
            bind(&mut fragments, &mut values, "code", value.clone());
        }
        if let Some(value) = &update.name {
            bind(&mut fragments, &mut values, "name", value.clone());
        }
        if let Some(value) = &update.country {
            bind(&mut fragments, &mut values, "country", value.clone());
        }
        if let Some(value) = &update.category {
            bind(&mut fragments, &mut values, "category", value.clone());
        }
        if let Some(value) = &update.description {
            bind(&mut fragments, &mut values, "description", value.clone());
        }
        if let Some(value) = update.status {
            bind(&mut fragments, &mut values, "status", value.as_str().to_string());
        }
        if let Some(value) = &update.version {
            bind(&mut fragments, &mut values, "version", value.clone());
        }
        if !fragments.is_empty() || update.tags.is_some() {
            let set_clause = if fragments.is_empty() {
                String::new()
            } else {
                format!("{}, ", fragments.join(", "))
            };
            let sql = format!(
                "UPDATE regulations SET {set_clause}updated_at = {now} WHERE id = {id}",
                now = now_unix(),
                id = id.get(),
            );
            let updated = tx
                .execute(&sql, params_from_iter(values.iter()))
                .map_err(|err| StoreError::from_sqlite(&err))?;
            if updated == 0 {
                return Err(StoreError::NotFound(format!("regulation {id}")));
            }
        }
        if let Some(tags) = &update.tags {
            tx.execute(
                "DELETE FROM regulation_tags WHERE regulation_id = ?1",
                params![id.get()],
            )
            .map_err(|err| StoreError::from_sqlite(&err))?;
            attach_tags_in_tx(&tx, id.get(), tags)?;
        }
        let mut regulation = tx
            .query_row(
                &format!("SELECT {REGULATION_COLUMNS} FROM regulations WHERE id = ?1"),
                params![id.get()],
                |row| Ok(map_regulation(row)),
            )
            .or_else(|err| match err {
                rusqlite::Error::QueryReturnedNoRows => {
                    Err(StoreError::NotFound(format!("regulation {id}")))
                }
                other => Err(StoreError::from_sqlite(&other)),
            })??;
        regulation.tags = tags_for(&tx, id.get())?;
        tx.commit().map_err(|err| StoreError::from_sqlite(&err))?;
        Ok(regulation)
    }

    /// Deletes a regulation; cascade removes all dependents.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] when the regulation does not exist.
    pub fn delete_regulation(&self, id: RegulationId) -> Result<(), StoreError> {
        let mut guard = self.lock();
        let tx = guard.transaction().map_err(|err| StoreError::from_sqlite(&err))?;
        let deleted = tx
            .execute("DELETE FROM regulations WHERE id = ?1", params![id.get()])
            .map_err(|err| StoreError::from_sqlite(&err))?;
        if deleted == 0 {
            return Err(StoreError::NotFound(format!("regulation {id}")));
        }
        tx.commit().map_err(|err| StoreError::from_sqlite(&err))?;
        Ok(())
    }

    /// Lists regulations matching the filter, newest created first.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on driver failure.
    pub fn list_regulations(
        &self,
        filter: &RegulationFilter,
    ) -> Result<Vec<Regulation>, StoreError> {
        let guard = self.lock();
        let mut clauses: Vec<String> = Vec::new();
        let mut values: Vec<String> = Vec::new();
        if let Some(country) = &filter.country {
            values.push(country.clone());
            clauses.push(format!("country = ?{}", values.len()));
        }
        if let Some(category) = &filter.category {
            values.push(category.clone());
            clauses.push(format!("category = ?{}", values.len()));
        }
        if let Some(status) = filter.status {
            values.push(status.as_str().to_string());
            clauses.push(format!("status = ?{}", values.len()));
        }
        if let Some(keyword) = &filter.keyword {
            let trimmed = keyword.trim();
            if !trimmed.is_empty() {
                values.push(format!("%{trimmed}%"));
                let index = values.len();
                clauses.push(format!(
                    "(name LIKE ?{index} OR code LIKE ?{index} \
                     OR COALESCE(description, '') LIKE ?{index})"
                ));
            }
        }
        let tag_names: Vec<&String> =
            filter.tags.iter().filter(|name| !name.trim().is_empty()).collect();
        if !tag_names.is_empty() {
            let mut placeholders = Vec::new();
            for name in &tag_names {
                values.push((*name).clone());
                placeholders.push(format!("?{}", values.len()));
            }
            clauses.push(format!(
                "EXISTS (SELECT 1 FROM regulation_tags rt
                         JOIN tags t ON t.id = rt.tag_id
                         WHERE rt.regulation_id = regulations.id
                           AND t.name IN ({}))",
                placeholders.join(", ")
            ));
        }
        let where_clause = if clauses.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", clauses.join(" AND "))
        };
        let sql = format!(
            "SELECT {REGULATION_COLUMNS} FROM regulations{where_clause} \
             ORDER BY created_at DESC, id DESC"
        );
        let mut statement =
            guard.prepare(&sql).map_err(|err| StoreError::from_sqlite(&err))?;
        let mut rows = statement
            .query(params_from_iter(values.iter()))
            .map_err(|err| StoreError::from_sqlite(&err))?;
        let mut regulations = Vec::new();
        while let Some(row) = rows.next().map_err(|err| StoreError::from_sqlite(&err))? {
            regulations.push(map_regulation(row)?);
        }
        drop(rows);
        drop(statement);
        for regulation in &mut regulations {
            regulation.tags = tags_for(&guard, regulation.id.get())?;
        }
        Ok(regulations)
    }

    /// Inserts a document metadata row and returns it.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Constraint`] when the regulation is absent.
    pub fn insert_document(&self, new: &NewDocument) -> Result<RegulationDocument, StoreError> {
        let mut guard = self.lock();
        let tx = guard.transaction().map_err(|err| StoreError::from_sqlite(&err))?;
        tx.execute(
            "INSERT INTO regulation_documents
                 (regulation_id, doc_type, file_name, file_path, file_size, upload_by, upload_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                new.regulation_id.get(),
                new.doc_type.as_str(),
                new.file_name,
                new.file_path,
                new.file_size,
                new.upload_by.map(UserId::get),
                now_unix(),
            ],
        )
        .map_err(|err| StoreError::from_sqlite(&err))?;
        let id = tx.last_insert_rowid();
        let document = tx
            .query_row(
                "SELECT id, regulation_id, doc_type, file_name, file_path, file_size,
                        upload_by, upload_at
                 FROM regulation_documents WHERE id = ?1",
                params![id],
                |row| Ok(map_document(row)),
            )
            .map_err(|err| StoreError::from_sqlite(&err))??;
        tx.commit().map_err(|err| StoreError::from_sqlite(&err))?;
        Ok(document)
    }

    /// Lists document rows for a regulation in upload order.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on driver failure.
    pub fn documents_for(
        &self,
        regulation_id: RegulationId,
    ) -> Result<Vec<RegulationDocument>, StoreError> {
        let guard = self.lock();
        let mut statement = guard
            .prepare(
                "SELECT id, regulation_id, doc_type, file_name, file_path, file_size,
                        upload_by, upload_at
                 FROM regulation_documents WHERE regulation_id = ?1 ORDER BY id",
            )
            .map_err(|err| StoreError::from_sqlite(&err))?;
        let mut rows = statement
            .query(params![regulation_id.get()])
            .map_err(|err| StoreError::from_sqlite(&err))?;
        let mut documents = Vec::new();
        while let Some(row) = rows.next().map_err(|err| StoreError::from_sqlite(&err))? {
            documents.push(map_document(row)?);
        }
        Ok(documents)
    }

    /// Inserts a code file metadata row and returns it.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Constraint`] when the regulation is absent.
    pub fn insert_code_file(&self, new: &NewCodeFile) -> Result<CodeFile, StoreError> {
        let mut guard = self.lock();
        let tx = guard.transaction().map_err(|err| StoreError::from_sqlite(&err))?;
        let now = now_unix();
        tx.execute(
            "INSERT INTO code_files
                 (regulation_id, file_name, file_path, description, usage_guide, version,
                  created_by, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)",
            params![
                new.regulation_id.get(),
                new.file_name,
                new.file_path,
                new.description,
                new.usage_guide,
                new.version,
                new.created_by.map(UserId::get),
                now,
            ],
        )
        .map_err(|err| StoreError::from_sqlite(&err))?;
        let id = tx.last_insert_rowid();
        let code_file = tx
            .query_row(
                "SELECT id, regulation_id, file_name, file_path, description, usage_guide,
                        version, created_by, created_at, updated_at
                 FROM code_files WHERE id = ?1",
                params![id],
                |row| Ok(map_code_file(row)),
            )
            .map_err(|err| StoreError::from_sqlite(&err))??;
        tx.commit().map_err(|err| StoreError::from_sqlite(&err))?;
        Ok(code_file)
    }

    /// Lists code file rows for a regulation in creation order.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on driver failure.
    pub fn code_files_for(
        &self,
        regulation_id: RegulationId,
    ) -> Result<Vec<CodeFile>, StoreError> {
        let guard = self.lock();
        let mut statement = guard
            .prepare(
                "SELECT id, regulation_id, file_name, file_path, description, usage_guide,
                        version, created_by, created_at, updated_at
                 FROM code_files WHERE regulation_id = ?1 ORDER BY id",
            )
            .map_err(|err| StoreError::from_sqlite(&err))?;
        let mut rows = statement
            .query(params![regulation_id.get()])
            .map_err(|err| StoreError::from_sqlite(&err))?;
        let mut code_files = Vec::new();
        while let Some(row) = rows.next().map_err(|err| StoreError::from_sqlite(&err))? {
            code_files.push(map_code_file(row)?);
        }
        Ok(code_files)
    }
}
