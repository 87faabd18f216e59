//! Journal server entry point.
//!
//! # Responsibility
//! - Load configuration, start logging, open the database.
//! - Serve the HTTP surface until interrupted.

use bujo_core::db::migrations::latest_version;
use bujo_core::{init_logging, init_stderr_logging, open_db, AppConfig};
use bujo_http::{build_router, AppState, HeaderIdentity};
use clap::{Parser, Subcommand};
use log::{error, info};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

/// Bullet journal server.
#[derive(Parser, Debug)]
#[command(name = "bujo", version)]
#[command(about = "Daily log and collections with stable bullet ordering")]
struct Args {
    /// TOML config file; `BUJO_*` environment variables override it.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, Copy)]
enum Command {
    /// Serve HTTP (default).
    Serve,
    /// Apply pending schema migrations and exit.
    Migrate,
    /// Print the merged configuration.
    Config,
}

fn main() -> ExitCode {
    let args = Args::parse();
    let config = match AppConfig::load(args.config.as_deref()) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("bujo: {err}");
            return ExitCode::FAILURE;
        }
    };

    let command = args.command.unwrap_or(Command::Serve);
    if let Command::Config = command {
        return match toml::to_string_pretty(&config) {
            Ok(rendered) => {
                print!("{rendered}");
                ExitCode::SUCCESS
            }
            Err(err) => {
                eprintln!("bujo: failed to render config: {err}");
                ExitCode::FAILURE
            }
        };
    }

    let logging = match &config.log_dir {
        Some(dir) => init_logging(&config.log_level, dir),
        None => init_stderr_logging(&config.log_level),
    };
    if let Err(err) = logging {
        eprintln!("bujo: {err}");
        return ExitCode::FAILURE;
    }

    match command {
        Command::Migrate => migrate(&config),
        _ => serve(config),
    }
}

fn migrate(config: &AppConfig) -> ExitCode {
    match open_db(&config.database_path) {
        Ok(_) => {
            info!(
                "event=migrate module=cli status=ok schema_version={}",
                latest_version()
            );
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!("event=migrate module=cli status=error error={err}");
            eprintln!("bujo: {err}");
            ExitCode::FAILURE
        }
    }
}

fn serve(config: AppConfig) -> ExitCode {
    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(err) => {
            eprintln!("bujo: failed to start runtime: {err}");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run_server(config)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            error!("event=serve module=cli status=error error={message}");
            eprintln!("bujo: {message}");
            ExitCode::FAILURE
        }
    }
}

async fn run_server(config: AppConfig) -> Result<(), String> {
    let addr = config.socket_addr().map_err(|err| err.to_string())?;
    let conn = open_db(&config.database_path).map_err(|err| err.to_string())?;
    let state = AppState::new(conn, Arc::new(HeaderIdentity), config.registration_enabled);
    let router = build_router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|err| format!("failed to bind {addr}: {err}"))?;
    info!(
        "event=serve module=cli status=start addr={addr} registration_enabled={}",
        config.registration_enabled
    );

    bujo_http::serve(listener, router)
        .await
        .map_err(|err| format!("server failed: {err}"))?;
    info!("event=serve module=cli status=ok");
    Ok(())
}
