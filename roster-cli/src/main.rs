//! Roster: keep every organization member's contacts in line with the directory.
//!
//! # Usage
//!
//! ```text
//! roster sync [--config PATH] [--limit N] [--interactive] [--dry-run] [--concurrency N] [--json] [--log-format text|json]
//! roster members [--config PATH] [--json]
//! roster config init [--path PATH] [--force]
//! roster config show [--config PATH]
//! ```

mod commands;
mod config;
mod context;
mod logging;
mod paths;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{config::ConfigCommand, members::MembersArgs, sync::SyncArgs};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "roster",
    version,
    about = "Sync organization directory members into each member's contacts",
    long_about = None,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Add missing colleagues to every member's contacts and drop departed ones.
    Sync(SyncArgs),

    /// List the directory roster.
    Members(MembersArgs),

    /// Create or inspect the configuration file.
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Sync(args) => args.run(),
        Commands::Members(args) => args.run(),
        Commands::Config { command } => commands::config::run(command),
    }
}
