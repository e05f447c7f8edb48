//! # task-cli
//!
//! A small command-line task tracker. Tasks are short text items with a
//! status (`todo`, `in-progress`, `done`) kept in a single JSON file.
//!
//! ## Quick Start
//!
//! ```bash
//! task-cli add Buy groceries
//! task-cli update 1 Buy groceries and cook dinner
//! task-cli mark-in-progress 1
//! task-cli mark-done 1
//! task-cli list
//! task-cli list done
//! task-cli delete 1
//! ```
//!
//! The task file defaults to `tasks.json` next to the executable. Use
//! `--db <PATH>` or `TASK_CLI_DB` to point elsewhere, and `RUST_LOG=debug`
//! to see what the store is doing.
//!
//! Every command exits 0, including "Task not found" and invalid status
//! filters. Pass `--strict` to get distinct exit codes for those outcomes.

use std::io::{self, IsTerminal, Write};
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

pub mod cli;
pub mod cmd;
pub mod fields;
pub mod store;
pub mod task;

use cli::Cli;
use cmd::dispatch;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .with_ansi(io::stderr().is_terminal())
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing();

    let db_path = cli.db_path();
    let mut stdout = io::stdout().lock();
    let result = dispatch(cli.command, &db_path, &mut stdout);
    let _ = stdout.flush();

    match result {
        Ok(outcome) => ExitCode::from(outcome.exit_code(cli.strict)),
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
