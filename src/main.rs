//! stint CLI - focus session timer.

use clap::{Parser, Subcommand};
use stint::cli;
use stint::cli::categories::CategoryAction;
use stint::config::load_config;
use stint::logging;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "stint")]
#[command(author, version = env!("STINT_BUILD_VERSION"), about = "Focus session timer", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start an interactive focus session.
    Run {
        /// Category to file the session under.
        category: String,

        /// Countdown length in minutes. Defaults to `timer.default_minutes`.
        #[arg(short, long)]
        minutes: Option<u32>,
    },

    /// List recorded sessions.
    List {
        /// Only show sessions from this day (YYYY-MM-DD).
        #[arg(short, long)]
        date: Option<String>,

        /// Print JSON instead of a table.
        #[arg(long)]
        json: bool,
    },

    /// Delete a recorded session.
    Delete {
        /// Session ID.
        id: i64,
    },

    /// Show focus totals, the last seven days, and time per category.
    Stats {
        /// Print JSON instead of tables.
        #[arg(long)]
        json: bool,
    },

    /// Manage categories.
    Categories {
        #[command(subcommand)]
        action: CategoryAction,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("stint: error: {e}");
            return ExitCode::FAILURE;
        }
    };
    logging::init(&config.logging);

    let result = match cli.command {
        Commands::Run { category, minutes } => cli::run::run(&config, &category, minutes),
        Commands::List { date, json } => cli::list::run(&config, date.as_deref(), json),
        Commands::Delete { id } => cli::delete::run(&config, id),
        Commands::Stats { json } => cli::stats::run(&config, json),
        Commands::Categories { action } => cli::categories::run(&config, &action),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("stint: error: {e}");
            ExitCode::FAILURE
        }
    }
}
