//! CLI definitions for Mailmate.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Mailmate CLI.
#[derive(Parser)]
#[command(name = "mailmate")]
#[command(about = "On-device AI writing tools for webmail")]
#[command(version)]
pub(crate) struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "MAILMATE_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Validate the configuration and print errors and warnings
    CheckConfig,

    /// Drive one tab end to end against a sample mail page
    Simulate {
        /// Tool to activate
        #[arg(long, default_value = "summarize")]
        action: String,

        /// Surface kind to activate it on (defaults to the action's natural surface)
        #[arg(long)]
        surface: Option<String>,

        /// Target language for translate
        #[arg(long)]
        language: Option<String>,

        /// Run without an AI provider
        #[arg(long)]
        no_provider: bool,
    },
}
