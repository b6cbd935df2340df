use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing::{error, info};

use booksapi::books::{MemoryStore, PgBookStore};
use booksapi::database::Database;
use booksapi::{app, logging, AppState, Config, Server};

/// Books CRUD service.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Path to the TOML configuration file.
    #[arg(long, default_value = "config/appsettings.toml")]
    config: PathBuf,

    /// Keep books in memory instead of PostgreSQL.
    #[arg(long)]
    in_memory: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let config = match Config::from_toml_file(&args.config).and_then(|c| c.validate().map(|()| c)) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("cannot load {}: {e}", args.config.display());
            return ExitCode::FAILURE;
        }
    };
    let _log_guard = match logging::init(&config.logging) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("cannot install logging: {e}");
            return ExitCode::FAILURE;
        }
    };

    info!(config = %args.config.display(), in_memory = args.in_memory, "application has started");

    let database = (!args.in_memory).then(|| Database::connect_lazy(&config.database));
    let state = match &database {
        Some(db) => AppState::new(Arc::new(PgBookStore::new(db.pool()))).with_dependency(Arc::new(db.clone())),
        None => AppState::new(Arc::new(MemoryStore::new())),
    };

    let server = Server::bind(config.http.socket_addr())
        .read_timeout(config.http.read_timeout)
        .write_timeout(config.http.write_timeout);

    let result = server.serve(app(state)).await;

    if let Some(db) = database {
        db.close().await;
    }

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("server failed: {e}");
            ExitCode::FAILURE
        }
    }
}
