//! tenantdesk - command-line front end for the session manager.
//!
//! Signs in against the product's auth service, keeps the session fresh and
//! answers route-guard questions from the terminal.

mod commands;

use std::io;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use tenantdesk_core::{Config, HttpAuthService, SessionManager};

use commands::Command;

/// Log file name prefix inside the configured log directory
const LOG_FILE_PREFIX: &str = "tenantdesk.log";

/// Initialize the tracing subscriber for logging.
///
/// Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug).
/// When a log directory is configured, a daily rolling file is written too;
/// keep the returned guard alive so buffered lines get flushed.
fn init_tracing(log_dir: Option<&Path>) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    let stderr_layer = fmt::layer().with_writer(io::stderr);

    match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::registry()
                .with(filter)
                .with(stderr_layer)
                .with(fmt::layer().with_ansi(false).with_writer(writer))
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::registry()
                .with(filter)
                .with(stderr_layer)
                .init();
            None
        }
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let command = match Command::parse(std::env::args().skip(1)) {
        Ok(command) => command,
        Err(message) => {
            eprintln!("{}\n\n{}", message, commands::USAGE);
            return Ok(ExitCode::from(2));
        }
    };
    if command == Command::Help {
        println!("{}", commands::USAGE);
        return Ok(ExitCode::SUCCESS);
    }

    let mut config = Config::load().context("Failed to load configuration")?;
    let _log_guard = init_tracing(config.log_dir.as_deref());
    info!(api = %config.api_base_url(), storage = ?config.storage, "tenantdesk starting");

    let service = HttpAuthService::new(config.api_base_url(), config.request_timeout())?;
    let store = config.open_store()?;
    let manager = SessionManager::new(Arc::new(service), store);
    manager.init();

    commands::run(command, &manager, &mut config).await
}
