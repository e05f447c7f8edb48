use std::path::PathBuf;

use clap::Parser;

use crate::cmd::Commands;

/// Default task file name, resolved next to the executable.
pub const TASK_FILE: &str = "tasks.json";

/// Simple, file-backed task tracker CLI.
/// Storage defaults to tasks.json next to the executable or a path passed via --db.
#[derive(Parser)]
#[command(
    name = "task-cli",
    version,
    about = "Track short text tasks in a local JSON file",
    disable_help_subcommand = true,
    after_help = "Examples:\n  task-cli add Buy groceries\n  task-cli update 1 Buy groceries and cook dinner\n  task-cli mark-done 1\n  task-cli list in-progress"
)]
pub struct Cli {
    /// Path to the JSON task file.
    #[arg(long, global = true, env = "TASK_CLI_DB")]
    pub db: Option<PathBuf>,

    /// Exit non-zero when a task is not found, a status is invalid or the command is unknown.
    #[arg(long, global = true, env = "TASK_CLI_STRICT")]
    pub strict: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// The task file to use: `--db`, else `tasks.json` beside the executable,
    /// else `tasks.json` in the working directory.
    pub fn db_path(&self) -> PathBuf {
        self.db.clone().unwrap_or_else(|| {
            std::env::current_exe()
                .ok()
                .and_then(|exe| exe.parent().map(|dir| dir.join(TASK_FILE)))
                .unwrap_or_else(|| PathBuf::from(TASK_FILE))
        })
    }
}
