//! Docshelf CLI - document repository from the command line

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

use docshelf::storage::DocumentStore;
use docshelf::upload::UploadCoordinator;
use docshelf::{config, output};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

const DEFAULT_PORT: u16 = 3000;

#[derive(Parser)]
#[command(name = "docshelf")]
#[command(version = "0.1.0")]
#[command(about = "Document repository - upload, list, update, download and delete files")]
#[command(long_about = r#"
Docshelf keeps uploaded files alongside their title and description:
  • SQLite record store for document metadata
  • Collision-free storage paths for uploaded files
  • JSON CRUD + multipart upload API

Example usage:
  docshelf serve --port 3000
  docshelf add --title "Handbook" --description "Staff handbook" --file ./handbook.pdf
  docshelf list
"#)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP server
    Serve {
        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,

        /// Path to the database file
        #[arg(short, long)]
        database: Option<PathBuf>,

        /// Directory for uploaded files
        #[arg(short, long)]
        uploads: Option<PathBuf>,
    },

    /// Write a starter docshelf.toml
    Init {
        /// Overwrite an existing config
        #[arg(long)]
        force: bool,
    },

    /// Upload a file from disk
    Add {
        /// Document title
        #[arg(short, long)]
        title: String,

        /// Document description
        #[arg(short = 'D', long)]
        description: String,

        /// File to upload
        #[arg(short, long)]
        file: PathBuf,

        /// Path to the database file
        #[arg(short, long)]
        database: Option<PathBuf>,

        /// Directory for uploaded files
        #[arg(short, long)]
        uploads: Option<PathBuf>,
    },

    /// List all documents
    List {
        /// Path to the database file
        #[arg(short, long)]
        database: Option<PathBuf>,
    },

    /// Show one document's metadata
    Show {
        /// Document id
        #[arg(short, long)]
        id: i64,

        /// Path to the database file
        #[arg(short, long)]
        database: Option<PathBuf>,
    },

    /// Delete a document and its backing file
    Remove {
        /// Document id
        #[arg(short, long)]
        id: i64,

        /// Path to the database file
        #[arg(short, long)]
        database: Option<PathBuf>,

        /// Directory for uploaded files
        #[arg(short, long)]
        uploads: Option<PathBuf>,
    },

    /// Show statistics about the document store
    Stats {
        /// Path to the database file
        #[arg(short, long)]
        database: Option<PathBuf>,
    },
}

/// Resolved locations: CLI flag > config file > default
struct Paths {
    database: PathBuf,
    uploads: PathBuf,
    port: u16,
}

fn resolve_paths(
    database: Option<PathBuf>,
    uploads: Option<PathBuf>,
    port: Option<u16>,
) -> anyhow::Result<Paths> {
    let file_config = config::load_config(None)?.unwrap_or_default();

    let database = database
        .or_else(|| file_config.database.as_ref().map(PathBuf::from))
        .unwrap_or_else(config::default_database_path);
    let uploads = uploads
        .or_else(|| file_config.uploads.as_ref().map(PathBuf::from))
        .unwrap_or_else(config::default_upload_dir);
    let port = port.or(file_config.port).unwrap_or(DEFAULT_PORT);

    config::ensure_db_dir(&database)?;
    Ok(Paths {
        database,
        uploads,
        port,
    })
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    match cli.command {
        Commands::Serve {
            port,
            database,
            uploads,
        } => {
            let paths = resolve_paths(database, uploads, port)?;
            tracing::info!("Serving {:?} on port {}", paths.database, paths.port);

            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(docshelf::server::start_server(
                paths.port,
                paths.database,
                paths.uploads,
            ))?;
        }

        Commands::Init { force } => {
            let config_path = config::default_config_path();
            let config = config::DocshelfConfig {
                database: Some(config::default_database_path().to_string_lossy().into_owned()),
                uploads: Some(config::default_upload_dir().to_string_lossy().into_owned()),
                port: Some(DEFAULT_PORT),
            };
            config::write_config(&config_path, &config, force)?;
            println!("✅ Wrote {}", config_path.display());
        }

        Commands::Add {
            title,
            description,
            file,
            database,
            uploads,
        } => {
            let paths = resolve_paths(database, uploads, None)?;
            let store = Arc::new(DocumentStore::open(&paths.database)?);
            let coordinator = UploadCoordinator::new(store.clone(), paths.uploads)?;

            let filename = file
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default();
            let bytes = std::fs::read(&file)?;

            let id = coordinator.store_upload(&title, &description, &filename, &bytes)?;
            let doc = store.get_document(id)?;

            println!("📄 Uploaded document {} -> {}", id, doc.file_path);
        }

        Commands::List { database } => {
            let paths = resolve_paths(database, None, None)?;
            let store = DocumentStore::open(&paths.database)?;

            let docs = store.list_documents()?;
            if docs.is_empty() {
                println!("∅ No documents.");
            } else {
                println!("{}", output::documents_table(&docs));
            }
        }

        Commands::Show { id, database } => {
            let paths = resolve_paths(database, None, None)?;
            let store = DocumentStore::open(&paths.database)?;

            let doc = store.get_document(id)?;
            println!("📄 {} (id {})", doc.title, doc.id);
            println!("   Description: {}", doc.description);
            println!("   Uploaded: {}", doc.upload_date.as_deref().unwrap_or("-"));
            println!("   File: {}", doc.file_path);
        }

        Commands::Remove {
            id,
            database,
            uploads,
        } => {
            let paths = resolve_paths(database, uploads, None)?;
            let store = Arc::new(DocumentStore::open(&paths.database)?);
            let coordinator = UploadCoordinator::new(store, paths.uploads)?;

            coordinator.remove(id)?;
            println!("🗑️  Removed document {}", id);
        }

        Commands::Stats { database } => {
            let paths = resolve_paths(database, None, None)?;
            let store = DocumentStore::open(&paths.database)?;

            println!("📊 Docshelf Statistics ({:?})", paths.database);
            println!("------------------------------------");
            println!("  Documents: {}", store.count_documents()?);
        }
    }

    Ok(())
}
