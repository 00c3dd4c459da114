// crates/gridreg-cli/src/main.rs
// ============================================================================
// Module: Gridreg CLI Entry Point
// Description: Command dispatcher for the regulation manager services.
// Purpose: Provide a scriptable surface over every service operation.
// Dependencies: clap, gridreg-config, gridreg-core, gridreg-services, gridreg-store-sqlite
// ============================================================================

//! ## Overview
//! The CLI wires configuration, the store, and the service layer together
//! and exposes one subcommand per operation: user management, regulation
//! lifecycle, parameter import and code generation, update checks,
//! notifications, data sync, and release publishing. Long-running network
//! calls run on a background worker and deliver their result over a
//! channel, keeping the dispatcher thread free.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;
use gridreg_config::AppConfig;
use gridreg_core::EntityType;
use gridreg_core::NotificationId;
use gridreg_core::RegulationId;
use gridreg_core::RegulationStatus;
use gridreg_core::Role;
use gridreg_core::SchemaWidth;
use gridreg_core::ServiceError;
use gridreg_core::User;
use gridreg_core::merge_category_spans;
use gridreg_services::AuthService;
use gridreg_services::CreateRegulation;
use gridreg_services::ParameterService;
use gridreg_services::RegulationImporter;
use gridreg_services::RegulationService;
use gridreg_services::ReleaseService;
use gridreg_services::SearchService;
use gridreg_services::SyncService;
use gridreg_services::UpdateCheck;
use gridreg_services::UpdateRegulation;
use gridreg_services::UpdateService;
use gridreg_services::VersionDescriptor;
use gridreg_services::doc_type_from_extension;
use gridreg_services::spawn_task;
use gridreg_store_sqlite::RegulationFilter;
use gridreg_store_sqlite::Store;
use gridreg_store_sqlite::StoreConfig;

// ============================================================================
// SECTION: CLI Definition
// ============================================================================

/// Grid-interconnection regulation manager.
#[derive(Debug, Parser)]
#[command(name = "gridreg", version, about = "Grid regulation manager")]
struct Cli {
    /// Path to the configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Act as this username for permission checks and history attribution.
    #[arg(long = "as", global = true, value_name = "USERNAME")]
    actor: Option<String>,
    /// Command to run.
    #[command(subcommand)]
    command: Command,
}

/// Wire form of the role argument.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum RoleArg {
    /// Full control.
    Admin,
    /// Read and write.
    Editor,
    /// Read only.
    Viewer,
}

impl From<RoleArg> for Role {
    fn from(role: RoleArg) -> Self {
        match role {
            RoleArg::Admin => Self::Admin,
            RoleArg::Editor => Self::Editor,
            RoleArg::Viewer => Self::Viewer,
        }
    }
}

/// Wire form of the regulation status argument.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum StatusArg {
    /// Being drafted.
    Draft,
    /// In force.
    Active,
    /// Archived.
    Archived,
    /// Superseded.
    Deprecated,
}

impl From<StatusArg> for RegulationStatus {
    fn from(status: StatusArg) -> Self {
        match status {
            StatusArg::Draft => Self::Draft,
            StatusArg::Active => Self::Active,
            StatusArg::Archived => Self::Archived,
            StatusArg::Deprecated => Self::Deprecated,
        }
    }
}

/// Top-level commands.
#[derive(Debug, Subcommand)]
enum Command {
    /// Register a user account.
    Register {
        /// Login name.
        #[arg(long)]
        username: String,
        /// Password.
        #[arg(long)]
        password: String,
        /// Contact address.
        #[arg(long)]
        email: Option<String>,
        /// Account role.
        #[arg(long, value_enum, default_value = "viewer")]
        role: RoleArg,
    },
    /// Log in and print a session token.
    Login {
        /// Login name.
        #[arg(long)]
        username: String,
        /// Password.
        #[arg(long)]
        password: String,
    },
    /// Change the acting user's password.
    Passwd {
        /// Login name.
        #[arg(long)]
        username: String,
        /// Current password.
        #[arg(long)]
        old_password: String,
        /// Replacement password.
        #[arg(long)]
        new_password: String,
    },
    /// List users (requires a manage-users actor).
    Users,
    /// Change a user's role (requires a manage-users actor).
    SetRole {
        /// Target user id.
        #[arg(long)]
        user_id: i64,
        /// New role.
        #[arg(long, value_enum)]
        role: RoleArg,
    },
    /// Create a regulation.
    Create {
        /// Unique regulation code.
        #[arg(long)]
        code: String,
        /// Display name.
        #[arg(long)]
        name: String,
        /// Issuing country or region.
        #[arg(long)]
        country: Option<String>,
        /// Category.
        #[arg(long)]
        category: Option<String>,
        /// Description.
        #[arg(long)]
        description: Option<String>,
        /// Lifecycle status.
        #[arg(long, value_enum)]
        status: Option<StatusArg>,
        /// Regulation version.
        #[arg(long)]
        reg_version: Option<String>,
        /// Tags, repeatable.
        #[arg(long)]
        tag: Vec<String>,
    },
    /// Update a regulation (absent flags keep their value).
    Update {
        /// Regulation id.
        #[arg(long)]
        id: i64,
        /// New name.
        #[arg(long)]
        name: Option<String>,
        /// New country.
        #[arg(long)]
        country: Option<String>,
        /// New category.
        #[arg(long)]
        category: Option<String>,
        /// New description.
        #[arg(long)]
        description: Option<String>,
        /// New status.
        #[arg(long, value_enum)]
        status: Option<StatusArg>,
        /// New regulation version.
        #[arg(long)]
        reg_version: Option<String>,
        /// Replacement tag set, repeatable; replaces all tags when given.
        #[arg(long)]
        tag: Option<Vec<String>>,
    },
    /// Delete a regulation and its managed storage.
    Delete {
        /// Regulation id.
        #[arg(long)]
        id: i64,
    },
    /// Show one regulation with documents and code files.
    Show {
        /// Regulation id.
        #[arg(long)]
        id: i64,
    },
    /// List regulations with optional filters.
    List {
        /// Country filter.
        #[arg(long)]
        country: Option<String>,
        /// Category filter.
        #[arg(long)]
        category: Option<String>,
        /// Status filter.
        #[arg(long, value_enum)]
        status: Option<StatusArg>,
        /// Tag filter, repeatable; any match qualifies.
        #[arg(long)]
        tag: Vec<String>,
        /// Keyword over name, code, and description.
        #[arg(long)]
        keyword: Option<String>,
    },
    /// Search regulations by keyword.
    Search {
        /// Keyword.
        keyword: String,
        /// Country filter.
        #[arg(long)]
        country: Option<String>,
        /// Category filter.
        #[arg(long)]
        category: Option<String>,
    },
    /// Attach a document to a regulation.
    AddDoc {
        /// Regulation id.
        #[arg(long)]
        id: i64,
        /// Source file path.
        #[arg(long)]
        file: PathBuf,
    },
    /// Attach a code file to a regulation.
    AddCode {
        /// Regulation id.
        #[arg(long)]
        id: i64,
        /// Source file path.
        #[arg(long)]
        file: PathBuf,
        /// Description of the code file.
        #[arg(long)]
        description: Option<String>,
        /// Usage guide.
        #[arg(long)]
        usage: Option<String>,
        /// Code file version.
        #[arg(long)]
        code_version: Option<String>,
    },
    /// Show the stored parameter table.
    Params {
        /// Regulation id.
        #[arg(long)]
        id: i64,
    },
    /// Bulk-import regulations from a JSON document.
    ImportRegulations {
        /// Document path.
        #[arg(long)]
        file: PathBuf,
        /// Overwrite records whose code already exists.
        #[arg(long)]
        overwrite: bool,
    },
    /// Import a spreadsheet into the parameter table.
    ImportParams {
        /// Regulation id.
        #[arg(long)]
        id: i64,
        /// Workbook path (.xlsx).
        #[arg(long)]
        file: PathBuf,
        /// Use the compact seven-column layout.
        #[arg(long)]
        compact: bool,
    },
    /// Generate the C parameter array from the stored table.
    GenCode {
        /// Regulation id.
        #[arg(long)]
        id: i64,
        /// Template source path.
        #[arg(long)]
        template: PathBuf,
        /// Output path.
        #[arg(long)]
        output: PathBuf,
    },
    /// Show change history for an entity.
    History {
        /// Entity kind: regulation, document, code, or user.
        #[arg(long)]
        entity: String,
        /// Entity id.
        #[arg(long)]
        id: i64,
    },
    /// Check the remote descriptor for a newer version.
    CheckUpdate,
    /// List notifications and the unread count.
    Notifications {
        /// Maximum rows shown.
        #[arg(long, default_value_t = 50)]
        limit: usize,
    },
    /// Mark one notification as read.
    MarkRead {
        /// Notification id.
        #[arg(long)]
        id: i64,
    },
    /// Mark every notification as read.
    MarkAllRead,
    /// Delete every notification.
    ClearNotifications,
    /// Show data sync status against the remote.
    SyncStatus,
    /// Fetch the data remote.
    SyncFetch,
    /// Pull data updates from the remote.
    SyncPull,
    /// Create a release, upload an asset, and rewrite version.json.
    Publish {
        /// Release tag.
        #[arg(long)]
        tag: String,
        /// Release display name.
        #[arg(long)]
        name: String,
        /// Release notes body.
        #[arg(long, default_value = "")]
        notes: String,
        /// Asset file to upload.
        #[arg(long)]
        asset: Option<PathBuf>,
        /// version.json path to rewrite.
        #[arg(long)]
        descriptor: Option<PathBuf>,
        /// Artifact download URL placed in the descriptor.
        #[arg(long)]
        download_url: Option<String>,
    },
}

// ============================================================================
// SECTION: Entry Point
// ============================================================================

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Executes the parsed command against the service layer.
fn run() -> Result<(), ServiceError> {
    let cli = Cli::parse();
    let config = AppConfig::load(cli.config.as_deref())
        .map_err(|err| ServiceError::Validation(err.to_string()))?;
    let store = Store::open(&StoreConfig {
        path: config.database_path(),
        busy_timeout_ms: config.database.busy_timeout_ms,
    })
    .map_err(|err| ServiceError::Storage(err.to_string()))?;
    let actor = resolve_actor(&store, cli.actor.as_deref())?;
    dispatch(cli.command, &config, &store, actor.as_ref())
}

/// Loads the acting user when `--as` was given.
fn resolve_actor(store: &Store, username: Option<&str>) -> Result<Option<User>, ServiceError> {
    match username {
        None => Ok(None),
        Some(name) => store
            .user_by_username(name)
            .map_err(|err| ServiceError::Storage(err.to_string()))?
            .map(Some)
            .ok_or_else(|| ServiceError::NotFound(format!("user '{name}'"))),
    }
}

/// Requires an actor for operations that always need one.
fn require_actor<'u>(actor: Option<&'u User>) -> Result<&'u User, ServiceError> {
    actor.ok_or_else(|| {
        ServiceError::Permission("this command requires --as <username>".to_string())
    })
}

/// Parses a raw regulation id argument.
fn regulation_id(raw: i64) -> Result<RegulationId, ServiceError> {
    RegulationId::from_raw(raw)
        .ok_or_else(|| ServiceError::Validation(format!("invalid regulation id: {raw}")))
}

// ============================================================================
// SECTION: Dispatch
// ============================================================================

/// Runs one command.
#[allow(
    clippy::too_many_lines,
    reason = "flat one-arm-per-subcommand dispatcher"
)]
fn dispatch(
    command: Command,
    config: &AppConfig,
    store: &Store,
    actor: Option<&User>,
) -> Result<(), ServiceError> {
    let regulations = RegulationService::new(store, config.storage());
    let parameters = ParameterService::new(store);
    match command {
        Command::Register {
            username,
            password,
            email,
            role,
        } => {
            let auth = AuthService::new(store, &config.auth);
            let user = auth.register(&username, &password, email.as_deref(), role.into())?;
            out(&format!("registered user {} ({})", user.username, user.role))
        }
        Command::Login { username, password } => {
            let auth = AuthService::new(store, &config.auth);
            let session = auth.login(&username, &password)?;
            out(&format!("role: {}", session.user.role))?;
            out(&session.token)
        }
        Command::Passwd {
            username,
            old_password,
            new_password,
        } => {
            let auth = AuthService::new(store, &config.auth);
            auth.change_password(&username, &old_password, &new_password)?;
            out("password changed")
        }
        Command::Users => {
            let auth = AuthService::new(store, &config.auth);
            let users = auth.list_users(require_actor(actor)?)?;
            for user in users {
                out(&format!("{}  {}  {}", user.id, user.username, user.role))?;
            }
            Ok(())
        }
        Command::SetRole { user_id, role } => {
            let auth = AuthService::new(store, &config.auth);
            let target = gridreg_core::UserId::from_raw(user_id)
                .ok_or_else(|| ServiceError::Validation(format!("invalid user id: {user_id}")))?;
            auth.update_user_role(require_actor(actor)?, target, role.into())?;
            out("role updated")
        }
        Command::Create {
            code,
            name,
            country,
            category,
            description,
            status,
            reg_version,
            tag,
        } => {
            let regulation = regulations.create(
                actor,
                CreateRegulation {
                    code,
                    name,
                    country,
                    category,
                    description,
                    status: status.map(Into::into),
                    version: reg_version,
                    tags: tag,
                },
            )?;
            out(&format!("created regulation {} ({})", regulation.code, regulation.id))
        }
        Command::Update {
            id,
            name,
            country,
            category,
            description,
            status,
            reg_version,
            tag,
        } => {
            let regulation = regulations.update(
                actor,
                regulation_id(id)?,
                UpdateRegulation {
                    code: None,
                    name,
                    country,
                    category,
                    description,
                    status: status.map(Into::into),
                    version: reg_version,
                    tags: tag,
                },
            )?;
            out(&format!("updated regulation {}", regulation.code))
        }
        Command::Delete { id } => {
            let outcome = regulations.delete(actor, regulation_id(id)?)?;
            for warning in &outcome.warnings {
                out(&format!("warning: {warning}"))?;
            }
            out("regulation deleted")
        }
        Command::Show { id } => {
            let id = regulation_id(id)?;
            let regulation = regulations.get(id)?;
            out(&format!(
                "{}  {}  [{}]  {}",
                regulation.id,
                regulation.code,
                regulation.status,
                regulation.name
            ))?;
            if !regulation.tags.is_empty() {
                out(&format!("tags: {}", regulation.tags.join(", ")))?;
            }
            for document in regulations.documents(id)? {
                out(&format!("doc: {} ({})", document.file_name, document.doc_type))?;
            }
            for code_file in regulations.code_files(id)? {
                out(&format!("code: {}", code_file.file_name))?;
            }
            Ok(())
        }
        Command::List {
            country,
            category,
            status,
            tag,
            keyword,
        } => {
            let rows = regulations.list(&RegulationFilter {
                country,
                category,
                status: status.map(Into::into),
                tags: tag,
                keyword,
            })?;
            for regulation in rows {
                out(&format!(
                    "{}  {}  [{}]  {}",
                    regulation.id,
                    regulation.code,
                    regulation.status,
                    regulation.name
                ))?;
            }
            Ok(())
        }
        Command::Search {
            keyword,
            country,
            category,
        } => {
            let search = SearchService::new(store);
            let rows = search.search(&keyword, country.as_deref(), category.as_deref())?;
            for regulation in rows {
                out(&format!("{}  {}  {}", regulation.id, regulation.code, regulation.name))?;
            }
            Ok(())
        }
        Command::AddDoc { id, file } => {
            let doc_type = doc_type_from_extension(&file).ok_or_else(|| {
                ServiceError::Validation(format!(
                    "unsupported document type: {}",
                    file.display()
                ))
            })?;
            let document = regulations.add_document(actor, regulation_id(id)?, &file, doc_type)?;
            out(&format!("stored {}", document.file_path))
        }
        Command::AddCode {
            id,
            file,
            description,
            usage,
            code_version,
        } => {
            let code_file = regulations.add_code_file(
                actor,
                regulation_id(id)?,
                &file,
                description,
                usage,
                code_version,
            )?;
            out(&format!("stored {}", code_file.file_path))
        }
        Command::Params { id } => {
            let grid = parameters.load_grid(regulation_id(id)?)?;
            let spans = merge_category_spans(&grid);
            out(&format!("{} rows, {} category spans", grid.len(), spans.len()))?;
            for index in 0..grid.len() {
                out(&grid.storage_row(index).join(" | "))?;
            }
            Ok(())
        }
        Command::ImportRegulations { file, overwrite } => {
            let importer = RegulationImporter::new(store);
            let stats = importer.import_json(&file, actor, overwrite)?;
            out(&format!(
                "imported {} of {} (skipped {}, failed {})",
                stats.succeeded, stats.total, stats.skipped, stats.failed
            ))?;
            for error in &stats.errors {
                out(&format!("  error: {error}"))?;
            }
            Ok(())
        }
        Command::ImportParams { id, file, compact } => {
            let schema = if compact {
                SchemaWidth::Compact
            } else {
                SchemaWidth::Extended
            };
            let (saved, summary) =
                parameters.import_and_save(actor, regulation_id(id)?, &file, schema)?;
            out(&format!(
                "imported {saved} rows ({} image formulas, {} resolved, {} unresolved)",
                summary.image_formulas, summary.images_resolved, summary.images_unresolved
            ))
        }
        Command::GenCode {
            id,
            template,
            output,
        } => {
            let report = parameters.generate_code(regulation_id(id)?, &template, &output)?;
            out(&format!(
                "wrote {} lines ({} rewritten, {} unknown protocol bits)",
                report.lines_total, report.lines_rewritten, report.unknown_bits
            ))
        }
        Command::History { entity, id } => {
            let entity_type: EntityType = entity
                .parse()
                .map_err(|_| ServiceError::Validation(format!("unknown entity: {entity}")))?;
            let records = store
                .history_for_entity(entity_type, id)
                .map_err(|err| ServiceError::Storage(err.to_string()))?;
            for record in records {
                out(&format!(
                    "{}  {}  {}",
                    record.changed_at,
                    record.change_type,
                    record.change_summary.unwrap_or_default()
                ))?;
            }
            Ok(())
        }
        Command::CheckUpdate => {
            let current = config
                .app_version()
                .map_err(|err| ServiceError::Validation(err.to_string()))?;
            let update_config = config.update.clone();
            let worker_store = store.clone();
            // Network call runs off the dispatcher thread; the result comes
            // back over the handle's channel.
            let handle = spawn_task("update-check", move || {
                let service = UpdateService::new(&worker_store, &update_config, current);
                service.check_for_updates()
            });
            match handle.wait() {
                Ok(UpdateCheck::Available(descriptor)) => {
                    out(&format!("update available: {}", descriptor.version))?;
                    for line in &descriptor.changelog {
                        out(&format!("  - {line}"))?;
                    }
                    Ok(())
                }
                Ok(UpdateCheck::UpToDate) => out("no update available"),
                Err(err) => Err(ServiceError::ExternalTool(err.to_string())),
            }
        }
        Command::Notifications { limit } => {
            let current = config
                .app_version()
                .map_err(|err| ServiceError::Validation(err.to_string()))?;
            let updates = UpdateService::new(store, &config.update, current);
            out(&format!("unread: {}", updates.unread_count()?))?;
            for notification in updates.notifications(limit)? {
                let marker = if notification.is_read { " " } else { "*" };
                out(&format!(
                    "{marker} {}  [{}]  {}",
                    notification.id, notification.notification_type, notification.title
                ))?;
            }
            Ok(())
        }
        Command::MarkRead { id } => {
            let current = config
                .app_version()
                .map_err(|err| ServiceError::Validation(err.to_string()))?;
            let updates = UpdateService::new(store, &config.update, current);
            let target = NotificationId::from_raw(id)
                .ok_or_else(|| ServiceError::Validation(format!("invalid notification id: {id}")))?;
            updates.mark_read(target)?;
            out("marked read")
        }
        Command::MarkAllRead => {
            let current = config
                .app_version()
                .map_err(|err| ServiceError::Validation(err.to_string()))?;
            let updates = UpdateService::new(store, &config.update, current);
            out(&format!("marked {} notifications read", updates.mark_all_read()?))
        }
        Command::ClearNotifications => {
            let current = config
                .app_version()
                .map_err(|err| ServiceError::Validation(err.to_string()))?;
            let updates = UpdateService::new(store, &config.update, current);
            out(&format!("cleared {} notifications", updates.clear_all()?))
        }
        Command::SyncStatus => {
            let sync = SyncService::new(&config.sync, &config.data_dir);
            sync.check_repo_status()?;
            let branch = sync.current_branch()?;
            let divergence = sync.divergence()?;
            out(&format!(
                "branch {branch}: {} ahead, {} behind",
                divergence.ahead, divergence.behind
            ))?;
            for change in sync.local_changes()? {
                out(&change)?;
            }
            Ok(())
        }
        Command::SyncFetch => {
            let sync_config = config.sync.clone();
            let data_dir = config.data_dir.clone();
            let handle = spawn_task("sync-fetch", move || {
                SyncService::new(&sync_config, &data_dir).fetch_remote()
            });
            handle
                .wait()
                .map_err(|err| ServiceError::ExternalTool(err.to_string()))??;
            out("fetched")
        }
        Command::SyncPull => {
            let sync_config = config.sync.clone();
            let data_dir = config.data_dir.clone();
            let handle = spawn_task("sync-pull", move || {
                SyncService::new(&sync_config, &data_dir).pull_updates()
            });
            let output = handle
                .wait()
                .map_err(|err| ServiceError::ExternalTool(err.to_string()))??;
            out(output.trim())
        }
        Command::Publish {
            tag,
            name,
            notes,
            asset,
            descriptor,
            download_url,
        } => {
            let releases = ReleaseService::new(&config.release);
            let info = releases.create_release(&tag, &name, &notes)?;
            out(&format!("release {} created", info.id))?;
            if let Some(asset) = asset {
                releases.upload_asset(info.id, &asset)?;
                out("asset uploaded")?;
            }
            if let Some(path) = descriptor {
                releases.write_version_descriptor(
                    &path,
                    &VersionDescriptor {
                        version: tag.trim_start_matches('v').to_string(),
                        release_date: None,
                        download_url,
                        changelog: notes.lines().map(str::to_string).collect(),
                        required: false,
                        min_version: None,
                    },
                )?;
                out("descriptor written")?;
            }
            Ok(())
        }
    }
}

// ============================================================================
// SECTION: Output Helpers
// ============================================================================

/// Writes one line to stdout.
fn out(message: &str) -> Result<(), ServiceError> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}")
        .map_err(|err| ServiceError::Storage(format!("stdout write failed: {err}")))
}

/// Writes the error to stderr and returns the failure code.
fn emit_error(message: &str) -> ExitCode {
    let mut stderr = std::io::stderr();
    let _ = writeln!(&mut stderr, "error: {message}");
    ExitCode::FAILURE
}
