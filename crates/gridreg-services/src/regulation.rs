// crates/gridreg-services/src/regulation.rs
// ============================================================================
// Module: Regulation Service
// Description: Regulation lifecycle, uploads, and managed storage.
// Purpose: Run every regulation mutation behind the error taxonomy.
// Dependencies: gridreg-config, gridreg-core, gridreg-store-sqlite, tracing
// ============================================================================

//! ## Overview
//! Create, update, delete, list, and file uploads for regulations. Deletion
//! is two-phase: the entity snapshot is recorded to history first, managed
//! storage removal is attempted and its failures collected as warnings, and
//! the transactional row delete runs regardless, keeping the database the
//! source of truth even if stray files are left behind.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::path::Path;

use gridreg_config::StorageLayout;
use gridreg_core::Capability;
use gridreg_core::ChangeType;
use gridreg_core::CodeFile;
use gridreg_core::DocumentType;
use gridreg_core::EntityType;
use gridreg_core::Regulation;
use gridreg_core::RegulationDocument;
use gridreg_core::RegulationId;
use gridreg_core::RegulationStatus;
use gridreg_core::ServiceError;
use gridreg_core::ServiceResult;
use gridreg_core::User;
use gridreg_core::UserId;
use gridreg_store_sqlite::NewCodeFile;
use gridreg_store_sqlite::NewDocument;
use gridreg_store_sqlite::NewRegulation;
use gridreg_store_sqlite::RegulationFilter;
use gridreg_store_sqlite::RegulationUpdate;
use gridreg_store_sqlite::Store;
use gridreg_store_sqlite::StoreError;
use serde_json::json;
use tracing::info;
use tracing::warn;

use crate::history::HistoryRecorder;

// ============================================================================
// SECTION: Inputs and Outputs
// ============================================================================

/// Fields for creating a regulation.
#[derive(Debug, Clone, Default)]
pub struct CreateRegulation {
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
    /// Lifecycle status; defaults to draft.
    pub status: Option<RegulationStatus>,
    /// Regulation document version.
    pub version: Option<String>,
    /// Tag names, created when absent.
    pub tags: Vec<String>,
}

/// Partial update; absent fields keep their value, `tags` replaces the set.
pub type UpdateRegulation = RegulationUpdate;

/// Outcome of a delete: best-effort storage removal may leave warnings.
#[derive(Debug, Clone, Default)]
pub struct DeleteOutcome {
    /// Storage removal problems; the row delete succeeded regardless.
    pub warnings: Vec<String>,
}

// ============================================================================
// SECTION: Error Mapping
// ============================================================================

/// Maps store failures into the service taxonomy.
fn map_store(error: StoreError, entity: &str) -> ServiceError {
    match error {
        StoreError::Constraint(message) => ServiceError::Duplicate(format!("{entity}: {message}")),
        StoreError::NotFound(message) => ServiceError::NotFound(message),
        StoreError::Io(message) | StoreError::Db(message) | StoreError::Invalid(message) => {
            ServiceError::Storage(message)
        }
    }
}

/// Checks the actor's capability when an actor is supplied.
pub(crate) fn require_capability(
    actor: Option<&User>,
    capability: Capability,
) -> ServiceResult<()> {
    match actor {
        Some(user) if !user.role.allows(capability) => Err(ServiceError::Permission(format!(
            "role {} lacks the required capability",
            user.role
        ))),
        _ => Ok(()),
    }
}

/// Returns the actor id when present.
fn actor_id(actor: Option<&User>) -> Option<UserId> {
    actor.map(|user| user.id)
}

// ============================================================================
// SECTION: Service
// ============================================================================

/// Regulation lifecycle service.
pub struct RegulationService<'a> {
    /// Backing store.
    store: &'a Store,
    /// Managed storage layout.
    storage: StorageLayout,
    /// History recorder.
    history: HistoryRecorder<'a>,
}

impl<'a> RegulationService<'a> {
    /// Creates the service over the store and storage layout.
    #[must_use]
    pub const fn new(store: &'a Store, storage: StorageLayout) -> Self {
        Self {
            store,
            storage,
            history: HistoryRecorder::new(store),
        }
    }

    /// Creates a regulation; fails when the code already exists.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Duplicate`] on a code collision,
    /// [`ServiceError::Validation`] on missing required fields, and
    /// [`ServiceError::Permission`] when the actor cannot write.
    pub fn create(
        &self,
        actor: Option<&User>,
        input: CreateRegulation,
    ) -> ServiceResult<Regulation> {
        require_capability(actor, Capability::Write)?;
        if input.code.trim().is_empty() {
            return Err(ServiceError::Validation("regulation code is required".to_string()));
        }
        if input.name.trim().is_empty() {
            return Err(ServiceError::Validation("regulation name is required".to_string()));
        }
        if self
            .store
            .regulation_by_code(&input.code)
            .map_err(|err| map_store(err, "regulation"))?
            .is_some()
        {
            return Err(ServiceError::Duplicate(format!(
                "regulation code '{}' already exists",
                input.code
            )));
        }
        let new = NewRegulation {
            code: input.code,
            name: input.name,
            country: input.country,
            category: input.category,
            description: input.description,
            status: input.status,
            version: input.version,
            created_by: actor_id(actor),
            tags: input.tags,
        };
        let regulation =
            self.store.insert_regulation(&new).map_err(|err| map_store(err, "regulation"))?;
        if let Some(actor) = actor {
            self.history.record(
                EntityType::Regulation,
                regulation.id.get(),
                ChangeType::Create,
                &regulation,
                &format!("created regulation: {}", regulation.name),
                Some(actor.id),
            );
        }
        info!(code = %regulation.code, "regulation created");
        Ok(regulation)
    }

    /// Applies a partial update; `tags` replaces the whole tag set.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::NotFound`] for an absent id and
    /// [`ServiceError::Duplicate`] when a new code collides.
    pub fn update(
        &self,
        actor: Option<&User>,
        id: RegulationId,
        update: UpdateRegulation,
    ) -> ServiceResult<Regulation> {
        require_capability(actor, Capability::Write)?;
        let before = self
            .store
            .regulation_by_id(id)
            .map_err(|err| map_store(err, "regulation"))?
            .ok_or_else(|| ServiceError::NotFound(format!("regulation {id}")))?;
        let after = self
            .store
            .update_regulation(id, &update)
            .map_err(|err| map_store(err, "regulation"))?;
        if let Some(actor) = actor {
            self.history.record(
                EntityType::Regulation,
                id.get(),
                ChangeType::Update,
                &json!({ "old": before, "new": after }),
                &format!("updated regulation: {}", after.name),
                Some(actor.id),
            );
        }
        Ok(after)
    }

    /// Deletes a regulation in two phases: snapshot, storage, row.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::NotFound`] for an absent id. Storage removal
    /// failures do not fail the call; they surface in
    /// [`DeleteOutcome::warnings`].
    pub fn delete(&self, actor: Option<&User>, id: RegulationId) -> ServiceResult<DeleteOutcome> {
        require_capability(actor, Capability::Delete)?;
        let regulation = self
            .store
            .regulation_by_id(id)
            .map_err(|err| map_store(err, "regulation"))?
            .ok_or_else(|| ServiceError::NotFound(format!("regulation {id}")))?;
        // Snapshot before the row is gone.
        if let Some(actor) = actor {
            self.history.record(
                EntityType::Regulation,
                id.get(),
                ChangeType::Delete,
                &regulation,
                &format!("deleted regulation: {}", regulation.name),
                Some(actor.id),
            );
        }
        let mut outcome = DeleteOutcome::default();
        for directory in
            [self.storage.documents_dir(id.get()), self.storage.codes_dir(id.get())]
        {
            if !directory.exists() {
                continue;
            }
            if let Err(err) = fs::remove_dir_all(&directory) {
                let warning =
                    format!("failed to remove {}: {err}", directory.display());
                warn!("{warning}");
                outcome.warnings.push(warning);
            }
        }
        self.store.delete_regulation(id).map_err(|err| map_store(err, "regulation"))?;
        info!(code = %regulation.code, "regulation deleted");
        Ok(outcome)
    }

    /// Fetches a regulation by id.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::NotFound`] for an absent id.
    pub fn get(&self, id: RegulationId) -> ServiceResult<Regulation> {
        self.store
            .regulation_by_id(id)
            .map_err(|err| map_store(err, "regulation"))?
            .ok_or_else(|| ServiceError::NotFound(format!("regulation {id}")))
    }

    /// Fetches a regulation by its unique code.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::NotFound`] for an absent code.
    pub fn get_by_code(&self, code: &str) -> ServiceResult<Regulation> {
        self.store
            .regulation_by_code(code)
            .map_err(|err| map_store(err, "regulation"))?
            .ok_or_else(|| ServiceError::NotFound(format!("regulation code '{code}'")))
    }

    /// Lists regulations matching the filter, newest created first.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Storage`] on persistence failure.
    pub fn list(&self, filter: &RegulationFilter) -> ServiceResult<Vec<Regulation>> {
        self.store.list_regulations(filter).map_err(|err| map_store(err, "regulation"))
    }

    /// Copies a source document into managed storage and records it.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::SourceFile`] when the source path does not
    /// resolve and [`ServiceError::NotFound`] for an absent regulation.
    pub fn add_document(
        &self,
        actor: Option<&User>,
        regulation_id: RegulationId,
        source: &Path,
        doc_type: DocumentType,
    ) -> ServiceResult<RegulationDocument> {
        require_capability(actor, Capability::Write)?;
        self.get(regulation_id)?;
        let (file_name, target, file_size) =
            self.copy_into(source, &self.storage.documents_dir(regulation_id.get()))?;
        let document = self
            .store
            .insert_document(&NewDocument {
                regulation_id,
                doc_type,
                file_name: file_name.clone(),
                file_path: target,
                file_size: Some(file_size),
                upload_by: actor_id(actor),
            })
            .map_err(|err| map_store(err, "document"))?;
        if let Some(actor) = actor {
            self.history.record(
                EntityType::Regulation,
                regulation_id.get(),
                ChangeType::Update,
                &json!({ "document_id": document.id, "file_name": file_name }),
                &format!("uploaded document: {file_name}"),
                Some(actor.id),
            );
        }
        Ok(document)
    }

    /// Copies a source code file into managed storage and records it.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::SourceFile`] when the source path does not
    /// resolve and [`ServiceError::NotFound`] for an absent regulation.
    pub fn add_code_file(
        &self,
        actor: Option<&User>,
        regulation_id: RegulationId,
        source: &Path,
        description: Option<String>,
        usage_guide: Option<String>,
        version: Option<String>,
    ) -> ServiceResult<CodeFile> {
        require_capability(actor, Capability::Write)?;
        self.get(regulation_id)?;
        let (file_name, target, _) =
            self.copy_into(source, &self.storage.codes_dir(regulation_id.get()))?;
        let code_file = self
            .store
            .insert_code_file(&NewCodeFile {
                regulation_id,
                file_name: file_name.clone(),
                file_path: target,
                description,
                usage_guide,
                version,
                created_by: actor_id(actor),
            })
            .map_err(|err| map_store(err, "code file"))?;
        if let Some(actor) = actor {
            self.history.record(
                EntityType::Regulation,
                regulation_id.get(),
                ChangeType::Update,
                &json!({ "code_file_id": code_file.id, "file_name": file_name }),
                &format!("uploaded code file: {file_name}"),
                Some(actor.id),
            );
        }
        Ok(code_file)
    }

    /// Lists document rows for a regulation.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Storage`] on persistence failure.
    pub fn documents(&self, regulation_id: RegulationId) -> ServiceResult<Vec<RegulationDocument>> {
        self.store.documents_for(regulation_id).map_err(|err| map_store(err, "document"))
    }

    /// Lists code file rows for a regulation.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Storage`] on persistence failure.
    pub fn code_files(&self, regulation_id: RegulationId) -> ServiceResult<Vec<CodeFile>> {
        self.store.code_files_for(regulation_id).map_err(|err| map_store(err, "code file"))
    }

    /// Copies the source into the target directory, creating it on demand.
    ///
    /// Returns the original file name, the managed path, and the size. A
    /// same-named file already in the target is overwritten (last write
    /// wins).
    fn copy_into(&self, source: &Path, target_dir: &Path) -> ServiceResult<(String, String, i64)> {
        let metadata = fs::metadata(source)
            .map_err(|_| ServiceError::SourceFile(format!("{} not found", source.display())))?;
        if !metadata.is_file() {
            return Err(ServiceError::SourceFile(format!(
                "{} is not a file",
                source.display()
            )));
        }
        let file_name = source
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .ok_or_else(|| {
                ServiceError::SourceFile(format!("{} has no file name", source.display()))
            })?;
        fs::create_dir_all(target_dir).map_err(|err| ServiceError::Storage(err.to_string()))?;
        let target = target_dir.join(&file_name);
        fs::copy(source, &target).map_err(|err| ServiceError::Storage(err.to_string()))?;
        let file_size = i64::try_from(metadata.len()).unwrap_or(i64::MAX);
        Ok((file_name, target.to_string_lossy().into_owned(), file_size))
    }
}

/// Infers the document type from a file extension.
#[must_use]
pub fn doc_type_from_extension(path: &Path) -> Option<DocumentType> {
    match path.extension()?.to_string_lossy().to_ascii_lowercase().as_str() {
        "pdf" => Some(DocumentType::Pdf),
        "docx" => Some(DocumentType::Docx),
        "doc" => Some(DocumentType::Doc),
        _ => None,
    }
}
