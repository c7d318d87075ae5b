use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use thiserror::Error;

use asset_ledger::{AssetService, Fields, FjallLedger, Identity, LedgerError, SchemaRegistry};

/// CLI-specific errors.
#[derive(Error, Debug)]
pub enum AppError {
    /// Library error
    #[error(transparent)]
    Library(#[from] asset_ledger::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid JSON input or output
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid schema file
    #[error("Schema error in '{path}': {message}")]
    Schema { path: String, message: String },

    /// Missing data input
    #[error("Either --data or --file must be specified")]
    MissingDataInput,

    /// Missing user identity for a write
    #[error("A user is required for writes")]
    MissingUser,
}

impl From<LedgerError> for AppError {
    fn from(e: LedgerError) -> Self {
        Self::Library(e.into())
    }
}

#[derive(Parser)]
#[command(name = "asset-ledger")]
#[command(about = "Versioned asset catalog with append-only history")]
struct Cli {
    /// Store path
    #[arg(long, global = true, default_value = ".asset-ledger", env = "ASSET_LEDGER_PATH")]
    path: PathBuf,

    /// TOML file with field schemas (defaults apply when omitted)
    #[arg(long, global = true)]
    schema: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Identity used for writes.
#[derive(Args)]
struct WriterArgs {
    /// User recorded in the audit fields
    #[arg(long, env = "ASSET_LEDGER_USER")]
    user: Option<String>,

    /// Act with admin privileges
    #[arg(long)]
    admin: bool,
}

impl WriterArgs {
    fn identity(&self) -> Result<Identity, AppError> {
        let user = self
            .user
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .ok_or(AppError::MissingUser)?;
        Ok(Identity {
            user: user.to_string(),
            is_admin: self.admin,
        })
    }
}

/// JSON object input, inline or from a file.
#[derive(Args)]
struct DataArgs {
    /// JSON object with the asset fields
    #[arg(short, long)]
    data: Option<String>,

    /// File containing the JSON object
    #[arg(short, long, conflicts_with = "data")]
    file: Option<PathBuf>,
}

impl DataArgs {
    fn read(&self, required: bool) -> Result<Fields, AppError> {
        let text = match (&self.data, &self.file) {
            (Some(data), _) => data.clone(),
            (None, Some(file)) => std::fs::read_to_string(file)?,
            (None, None) if required => return Err(AppError::MissingDataInput),
            (None, None) => return Ok(Fields::new()),
        };
        Ok(serde_json::from_str(&text)?)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new asset
    Create {
        /// Asset type
        asset_type: String,
        /// Asset id
        asset_id: String,
        #[command(flatten)]
        data: DataArgs,
        #[command(flatten)]
        writer: WriterArgs,
        /// Bypass the admin requirement for new types
        #[arg(long)]
        import: bool,
    },

    /// Show the current state of an asset
    Get {
        asset_type: String,
        asset_id: String,
        /// Show a past version instead
        #[arg(long)]
        version: Option<u64>,
    },

    /// Update fields of an asset
    Edit {
        asset_type: String,
        asset_id: String,
        #[command(flatten)]
        data: DataArgs,
        /// Field to remove (repeatable)
        #[arg(long = "delete-field")]
        delete_fields: Vec<String>,
        #[command(flatten)]
        writer: WriterArgs,
    },

    /// Delete an asset, keeping its history
    Delete {
        asset_type: String,
        asset_id: String,
        #[command(flatten)]
        writer: WriterArgs,
    },

    /// List recent versions, newest first
    Versions {
        asset_type: String,
        asset_id: String,
        /// Maximum number of versions
        #[arg(short, long)]
        limit: Option<usize>,
        /// Print diffs between consecutive versions instead
        #[arg(long)]
        diff: bool,
    },

    /// Diff two versions of an asset
    Diff {
        asset_type: String,
        asset_id: String,
        from: u64,
        to: u64,
    },

    /// List asset types with live asset counts
    Types,
}

fn main() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .try_init();

    let cli = Cli::parse();

    if let Err(err) = run(cli) {
        eprint!("{}", format_error(&err));
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), AppError> {
    let schemas = load_schemas(cli.schema.as_deref())?;
    let ledger = FjallLedger::open_or_init(&cli.path)?;
    let service = AssetService::new(ledger, schemas);

    match cli.command {
        Commands::Create {
            asset_type,
            asset_id,
            data,
            writer,
            import,
        } => {
            let identity = writer.identity()?;
            let version = service.create(&asset_type, &asset_id, data.read(true)?, &identity, import)?;
            println!("Created {}/{} at version {}", asset_type, asset_id, version);
        }
        Commands::Get {
            asset_type,
            asset_id,
            version,
        } => {
            let asset = match version {
                Some(v) => service.get_version(&asset_type, &asset_id, v)?,
                None => service.get(&asset_type, &asset_id)?,
            };
            print_json(&asset)?;
        }
        Commands::Edit {
            asset_type,
            asset_id,
            data,
            delete_fields,
            writer,
        } => {
            let identity = writer.identity()?;
            let version = service.edit(
                &asset_type,
                &asset_id,
                data.read(false)?,
                &delete_fields,
                &identity,
            )?;
            println!("Updated {}/{} to version {}", asset_type, asset_id, version);
        }
        Commands::Delete {
            asset_type,
            asset_id,
            writer,
        } => {
            let identity = writer.identity()?;
            let version = service.remove(&asset_type, &asset_id, &identity)?;
            println!("Deleted {}/{} at version {}", asset_type, asset_id, version);
        }
        Commands::Versions {
            asset_type,
            asset_id,
            limit,
            diff,
        } => {
            if diff {
                print_json(&service.diff_versions(&asset_type, &asset_id, limit)?)?;
            } else {
                print_json(&service.get_versions(&asset_type, &asset_id, limit)?)?;
            }
        }
        Commands::Diff {
            asset_type,
            asset_id,
            from,
            to,
        } => {
            print_json(&service.diff_between(&asset_type, &asset_id, from, to)?)?;
        }
        Commands::Types => {
            for summary in service.list_types()? {
                println!("{}\t{}", summary.name, summary.count);
            }
        }
    }

    Ok(())
}

fn load_schemas(path: Option<&Path>) -> Result<SchemaRegistry, AppError> {
    let Some(path) = path else {
        return Ok(SchemaRegistry::default());
    };
    let content = std::fs::read_to_string(path)?;
    SchemaRegistry::from_toml_str(&content).map_err(|e| AppError::Schema {
        path: path.display().to_string(),
        message: e.to_string(),
    })
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<(), AppError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Format an error for display, with color if stderr is a terminal.
fn format_error(err: &AppError) -> String {
    use std::io::IsTerminal;

    let use_colors = std::io::stderr().is_terminal();

    let (red, yellow, reset) = if use_colors {
        ("\x1b[0;31m", "\x1b[0;33m", "\x1b[0m")
    } else {
        ("", "", "")
    };

    let mut output = format!("{}Error:{} {}\n", red, reset, err);

    if let Some(hint) = get_error_hint(err) {
        output.push_str(&format!("{}Hint:{} {}\n", yellow, reset, hint));
    }

    output
}

/// Get a helpful hint for common errors
fn get_error_hint(err: &AppError) -> Option<&'static str> {
    match err {
        AppError::Library(asset_ledger::Error::ForbiddenType(_)) => {
            Some("Creating a new asset type needs --admin, or --import for bulk loads")
        }
        AppError::Library(asset_ledger::Error::Conflict { .. }) => {
            Some("The asset changed concurrently; read it again and retry the edit")
        }
        AppError::Library(asset_ledger::Error::AlreadyExists { .. }) => {
            Some("Use 'asset-ledger edit' to change an existing asset")
        }
        AppError::MissingUser => Some("Pass --user or set ASSET_LEDGER_USER"),
        AppError::Json(_) => Some("Asset data must be a JSON object, e.g. '{\"name\": \"h1\"}'"),
        _ => None,
    }
}
