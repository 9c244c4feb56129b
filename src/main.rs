use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use vigil::commands::{doctor, run};

#[derive(Parser)]
#[command(name = "vigil")]
#[command(about = "Homework review status watcher with Telegram notifications", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the poll-and-notify loop
    Run {
        /// Seconds between poll cycles (default: 600)
        #[arg(long)]
        interval: Option<u64>,

        /// Fixed Unix timestamp to open the first status query window from
        /// (default: now)
        #[arg(long)]
        from_date: Option<i64>,

        /// Use the legacy API contract that never advances the query window
        #[arg(long)]
        legacy_cursor: bool,

        /// Path of the append-only log file (default: vigil.log)
        #[arg(long)]
        log_file: Option<PathBuf>,
    },

    /// Check configuration and connectivity without entering the loop
    Doctor,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            interval,
            from_date,
            legacy_cursor,
            log_file,
        } => run::execute(interval, from_date, legacy_cursor, log_file),
        Commands::Doctor => doctor::execute(),
    }
}
