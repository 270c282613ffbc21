//! Botwatch - bot log monitoring with Discord webhook notifications.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use botwatch::config::ConfigStore;
use botwatch::monitor::{MonitorSession, MonitorUpdate};

#[derive(Parser)]
#[command(
    name = "botwatch",
    about = "Bot log monitoring with Discord webhook notifications",
    version
)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Monitor bot log folders and forward events to webhooks.
    Run {
        /// Path to the configuration file.
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Validate the configuration and print a routing summary.
    Check {
        /// Path to the configuration file.
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

fn init_tracing(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();
}

fn config_store(path: Option<PathBuf>) -> ConfigStore {
    path.map_or_else(ConfigStore::new, ConfigStore::with_path)
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Run { config } => run(config_store(config)).await,
        Commands::Check { config } => check(&config_store(config)),
    }
}

async fn run(store: ConfigStore) -> ExitCode {
    let mut session = MonitorSession::new(store);
    let mut updates = session.subscribe();

    let started = session.start().await;
    if !started.success {
        tracing::error!(message = %started.message, "Failed to start monitoring");
        return ExitCode::FAILURE;
    }

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Shutting down");
                break;
            }
            update = updates.recv() => match update {
                Ok(MonitorUpdate::Status(status)) => {
                    tracing::info!(
                        monitoring = status.is_monitoring,
                        folders = status.watched_folders.len(),
                        files = status.watched_files.len(),
                        "Watch set changed"
                    );
                }
                Ok(MonitorUpdate::Activity(activity)) => {
                    tracing::info!(bot = %activity.bot, file = %activity.file_name, "New log content");
                }
                Ok(MonitorUpdate::Event(event)) => {
                    tracing::info!(bot = %event.bot, kind = %event.kind, line = %event.raw_line, "Event detected");
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Update channel lagged");
                }
                Err(RecvError::Closed) => break,
            },
        }
    }

    let stopped = session.stop().await;
    if stopped.success {
        ExitCode::SUCCESS
    } else {
        tracing::error!(message = %stopped.message, "Failed to stop monitoring");
        ExitCode::FAILURE
    }
}

fn check(store: &ConfigStore) -> ExitCode {
    let config = match store.load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            return ExitCode::FAILURE;
        }
    };

    if config.base_log_directory.trim().is_empty() {
        eprintln!("Configuration error: no log directory configured");
        return ExitCode::FAILURE;
    }

    println!("Log directory: {}", config.base_log_directory);
    println!("VIP features:  {}", config.vip_features);
    println!(
        "Fallback URL:  {}",
        config.fallback_webhook_url.as_deref().unwrap_or("(none)")
    );
    println!("Bots:          {}", config.bots.len());
    for (name, bot) in &config.bots {
        let routing = match bot.webhook_url.as_deref() {
            Some(url) if !url.trim().is_empty() => "own webhook",
            _ if config.fallback_webhook_url.is_some() => "fallback webhook",
            _ => "no notifications",
        };
        println!("  {name}: {routing}");
    }

    ExitCode::SUCCESS
}
