//! Mailmate - on-device AI writing tools for webmail.
//!
//! Usage:
//!   mailmate check-config                  Validate the configuration
//!   mailmate simulate --action summarize   Drive one tab against a sample page

use std::path::PathBuf;

use clap::Parser;
use tracing::info;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

use mailmate_config::{ConfigLoader, LoggingConfig};

mod cli;
mod cmd_config;
mod cmd_simulate;
mod demo;

use cli::{Cli, Commands};
use cmd_simulate::SimulateOptions;

fn init_tracing(logging: &LoggingConfig) -> anyhow::Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));

    // Console output goes to stderr so command output stays clean.
    let console_text = (!logging.json).then(|| {
        fmt::layer()
            .with_target(true)
            .with_writer(std::io::stderr)
    });
    let console_json = logging
        .json
        .then(|| fmt::layer().json().with_writer(std::io::stderr));

    let file = match &logging.directory {
        Some(directory) => {
            let log_dir = PathBuf::from(ConfigLoader::expand_path(directory));
            std::fs::create_dir_all(&log_dir)?;

            let file_appender = RollingFileAppender::builder()
                .rotation(Rotation::DAILY)
                .filename_prefix("mailmate")
                .filename_suffix("log")
                .max_log_files(30)
                .build(&log_dir)?;
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

            // Dropping the guard stops the writer thread.
            static GUARD: std::sync::OnceLock<tracing_appender::non_blocking::WorkerGuard> =
                std::sync::OnceLock::new();
            let _ = GUARD.set(guard);

            Some(fmt::layer().with_writer(non_blocking).with_ansi(false))
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_text)
        .with(console_json)
        .with(file)
        .try_init()?;

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config_path = cli.config.unwrap_or_else(ConfigLoader::default_path);
    let config = ConfigLoader::load_or_default(&config_path)?;

    init_tracing(&config.logging)?;
    info!("Mailmate v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::CheckConfig => cmd_config::handle_check_config(&config_path, &config),
        Commands::Simulate {
            action,
            surface,
            language,
            no_provider,
        } => {
            cmd_simulate::handle_simulate(
                config,
                SimulateOptions {
                    action,
                    surface,
                    language,
                    no_provider,
                },
            )
            .await
        }
    }
}
