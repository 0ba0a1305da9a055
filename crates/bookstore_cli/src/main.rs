//! `bookstore` command-line entry point.
//!
//! # Responsibility
//! - Load configuration, start logging and open the catalog database.
//! - Run the HTTP API, apply migrations, or print a linkage probe.

use bookstore_core::db::migrations::latest_version;
use bookstore_core::{
    core_version, init_logging, init_stderr_logging, open_db, open_db_in_memory, ping, AppConfig,
};
use bookstore_http::{AppState, HttpServer};
use clap::{Parser, Subcommand};
use log::info;
use rusqlite::Connection;
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;

type CliResult<T> = Result<T, Box<dyn Error>>;

#[derive(Debug, Parser)]
#[command(name = "bookstore", version, about = "Bookstore catalog service")]
struct Cli {
    /// Config file (defaults to $BOOKSTORE_CONFIG, then ./bookstore.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override the database path (`:memory:` for a throwaway database)
    #[arg(long, global = true)]
    db: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Serve the REST API
    Serve {
        #[arg(long)]
        host: Option<String>,
        #[arg(long)]
        port: Option<u16>,
    },
    /// Open the database and apply pending migrations
    Migrate,
    /// Print core linkage and version
    Ping,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> CliResult<()> {
    if let Command::Ping = cli.command {
        println!("bookstore_core ping={}", ping());
        println!("bookstore_core version={}", core_version());
        return Ok(());
    }

    let mut config = AppConfig::load_from(&AppConfig::resolve_path(cli.config.as_deref()))?;
    if let Some(db) = cli.db {
        config.database.path = db;
    }
    start_logging(&config)?;

    match cli.command {
        Command::Serve { host, port } => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            serve(&config)
        }
        Command::Migrate => {
            open_database(&config)?;
            println!(
                "database={} schema_version={}",
                config.database.path,
                latest_version()
            );
            Ok(())
        }
        Command::Ping => Ok(()),
    }
}

fn start_logging(config: &AppConfig) -> CliResult<()> {
    let level = config.logging.level.as_str();
    match config.logging.dir.as_deref() {
        Some(dir) => init_logging(level, dir)?,
        None => init_stderr_logging(level)?,
    }
    Ok(())
}

fn open_database(config: &AppConfig) -> CliResult<Connection> {
    let conn = if config.database.is_in_memory() {
        open_db_in_memory()?
    } else {
        open_db(&config.database.path)?
    };
    Ok(conn)
}

fn serve(config: &AppConfig) -> CliResult<()> {
    let conn = open_database(config)?;
    let state = AppState::new(conn, config.server.application_name.clone());
    let server = HttpServer::new(config.bind_address(), state);

    let runtime = tokio::runtime::Runtime::new()?;
    info!("event=cli_serve module=cli status=start addr={}", server.addr());
    runtime.block_on(server.run())?;
    Ok(())
}
