//! Leasedesk CLI - manage people, properties and rental contracts

mod commands;
mod config;
mod logging;

use anyhow::Result;
use clap::{Parser, ValueEnum};
use commands::Commands;
use leasedesk_http::{FileStorage, LeaseClient};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{Level, error, info, warn};

#[derive(Parser)]
#[command(name = "leasedesk")]
#[command(about = "Manage people, properties and rental contracts")]
#[command(version)]
struct Cli {
    /// Set logging level
    #[arg(short = 'l', long, global = true, default_value = "warn")]
    log_level: LogLevel,

    /// Data directory for the stored session and logs
    #[arg(short = 'd', long, global = true)]
    data_dir: Option<PathBuf>,

    /// Configuration file (TOML)
    #[arg(short = 'c', long, global = true)]
    config: Option<PathBuf>,

    /// API base URL, overrides the configuration file
    #[arg(long, global = true, env = "LEASEDESK_BASE_URL")]
    base_url: Option<String>,

    /// Timeout for the whole command in seconds (0 = no timeout)
    #[arg(short = 't', long, global = true, default_value = "60")]
    timeout: u64,

    /// Disable file logging (only log to stderr)
    #[arg(long, global = true)]
    no_file_log: bool,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    logging::init_logging(cli.log_level.into(), cli.data_dir.as_deref(), cli.no_file_log)?;

    let mut settings = config::AppConfig::load(cli.config.as_deref())?;
    if let Some(base_url) = cli.base_url {
        settings.api.base_url = base_url;
    }
    let session_path = settings.session_path(cli.data_dir.as_deref());
    info!(session = %session_path.display(), base_url = %settings.api.base_url, "Starting");

    let client = LeaseClient::builder()
        .config(settings.api)
        .storage(Arc::new(FileStorage::new(session_path)))
        .on_login_redirect(|| {
            warn!("Session expired; run `leasedesk login` to sign in again");
        })
        .build()?;

    let long_running = cli.command.is_long_running();
    let result = if cli.timeout == 0 || long_running {
        cli.command.execute(client).await
    } else {
        let timeout_duration = Duration::from_secs(cli.timeout);
        match tokio::time::timeout(timeout_duration, cli.command.execute(client)).await {
            Ok(result) => result,
            Err(_) => {
                error!("Command timed out after {} seconds", cli.timeout);
                std::process::exit(1);
            }
        }
    };

    if let Err(e) = result {
        error!("Command failed: {e}");
        eprintln!("error: {e}");
        std::process::exit(1);
    }

    Ok(())
}

#[derive(Clone, Debug, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for Level {
    fn from(log_level: LogLevel) -> Self {
        match log_level {
            LogLevel::Error => Self::ERROR,
            LogLevel::Warn => Self::WARN,
            LogLevel::Info => Self::INFO,
            LogLevel::Debug => Self::DEBUG,
            LogLevel::Trace => Self::TRACE,
        }
    }
}
