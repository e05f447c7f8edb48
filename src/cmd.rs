//! Command implementations for the CLI interface.
//!
//! Each handler runs one store operation and writes a human-readable result
//! to the given writer. Not-found ids, invalid status filters and unknown
//! commands are reported as text and classified as an [`Outcome`]; only I/O
//! failures are returned as errors.

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use clap::Subcommand;
use clap_complete::{generate, Shell};
use tracing::debug;

use crate::fields::Status;
use crate::store::{Store, StoreError};

/// Positional arguments are taken literally: ids and text may start with
/// `-`, `--help` inside a task command is text, and surplus words after an
/// id or status are ignored.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Add a new task.
    #[command(disable_help_flag = true)]
    Add {
        /// Task description. Words are joined with single spaces.
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        text: Vec<String>,
    },

    /// Replace the description of a task.
    #[command(disable_help_flag = true)]
    Update {
        /// Task ID.
        #[arg(allow_hyphen_values = true)]
        id: Option<String>,
        /// New description. Words are joined with single spaces.
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        text: Vec<String>,
    },

    /// Delete a task.
    #[command(disable_help_flag = true)]
    Delete {
        /// Task ID.
        #[arg(allow_hyphen_values = true)]
        id: Option<String>,
        #[arg(trailing_var_arg = true, allow_hyphen_values = true, hide = true)]
        extra: Vec<String>,
    },

    /// Mark a task as in progress.
    #[command(disable_help_flag = true)]
    MarkInProgress {
        /// Task ID.
        #[arg(allow_hyphen_values = true)]
        id: Option<String>,
        #[arg(trailing_var_arg = true, allow_hyphen_values = true, hide = true)]
        extra: Vec<String>,
    },

    /// Mark a task as done.
    #[command(disable_help_flag = true)]
    MarkDone {
        /// Task ID.
        #[arg(allow_hyphen_values = true)]
        id: Option<String>,
        #[arg(trailing_var_arg = true, allow_hyphen_values = true, hide = true)]
        extra: Vec<String>,
    },

    /// List all tasks, or tasks with a status (todo, in-progress, done).
    #[command(disable_help_flag = true)]
    List {
        /// Status filter.
        #[arg(allow_hyphen_values = true)]
        status: Option<String>,
        #[arg(trailing_var_arg = true, allow_hyphen_values = true, hide = true)]
        extra: Vec<String>,
    },

    /// Generate shell completion scripts.
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },

    #[command(external_subcommand)]
    Unknown(Vec<String>),
}

/// How a command ended, for reporting and exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    NotFound,
    InvalidStatus,
    UnknownCommand,
}

impl Outcome {
    /// Process exit code. Every outcome exits 0 unless `strict` is set.
    pub fn exit_code(self, strict: bool) -> u8 {
        if !strict {
            return 0;
        }
        match self {
            Outcome::Success => 0,
            Outcome::NotFound => 3,
            Outcome::InvalidStatus => 4,
            Outcome::UnknownCommand => 5,
        }
    }
}

pub const UNKNOWN_COMMAND: &str = "Unknown command. Use --help for usage information.";

/// Run one parsed command against the task file at `db_path`.
pub fn dispatch(command: Option<Commands>, db_path: &Path, out: &mut impl Write) -> Result<Outcome> {
    let open = || {
        let store = Store::open(db_path)
            .with_context(|| format!("cannot open task file {}", db_path.display()))?;
        debug!(path = %store.path().display(), "opened task file");
        Ok::<_, anyhow::Error>(store)
    };

    match command {
        Some(Commands::Add { text }) => cmd_add(&open()?, text, out),
        Some(Commands::Update { id, text }) => cmd_update(&open()?, id, text, out),
        Some(Commands::Delete { id, extra }) => {
            ignore_extra(&extra);
            cmd_delete(&open()?, id, out)
        }
        Some(Commands::MarkInProgress { id, extra }) => {
            ignore_extra(&extra);
            cmd_mark(&open()?, id, Status::InProgress, out)
        }
        Some(Commands::MarkDone { id, extra }) => {
            ignore_extra(&extra);
            cmd_mark(&open()?, id, Status::Done, out)
        }
        Some(Commands::List { status, extra }) => {
            ignore_extra(&extra);
            cmd_list(&open()?, status, out)
        }
        Some(Commands::Completions { shell }) => cmd_completions(shell, out),
        Some(Commands::Unknown(args)) => {
            debug!(command = ?args.first(), "unknown command");
            cmd_unknown(out)
        }
        None => cmd_unknown(out),
    }
}

/// Add a new task.
pub fn cmd_add(store: &Store, text: Vec<String>, out: &mut impl Write) -> Result<Outcome> {
    let id = store.add(text.join(" "))?;
    writeln!(out, "Task added successfully (ID: {id})")?;
    Ok(Outcome::Success)
}

/// Replace a task's description.
pub fn cmd_update(
    store: &Store,
    id: Option<String>,
    text: Vec<String>,
    out: &mut impl Write,
) -> Result<Outcome> {
    let result = match parse_id(id.as_deref()) {
        Some(id) => store.update(id, text.join(" ")),
        None => Err(StoreError::NotFound(0)),
    };
    report(result, "Task updated successfully", out)
}

/// Delete a task.
pub fn cmd_delete(store: &Store, id: Option<String>, out: &mut impl Write) -> Result<Outcome> {
    let result = match parse_id(id.as_deref()) {
        Some(id) => store.delete(id),
        None => Err(StoreError::NotFound(0)),
    };
    report(result, "Task deleted successfully", out)
}

/// Set a task's status.
pub fn cmd_mark(
    store: &Store,
    id: Option<String>,
    status: Status,
    out: &mut impl Write,
) -> Result<Outcome> {
    let result = match parse_id(id.as_deref()) {
        Some(id) => store.set_status(id, status),
        None => Err(StoreError::NotFound(0)),
    };
    report(result, &format!("Task marked as {status}"), out)
}

/// Print tasks, one per line, optionally filtered by status.
pub fn cmd_list(store: &Store, status: Option<String>, out: &mut impl Write) -> Result<Outcome> {
    let tasks = match store.list(status.as_deref()) {
        Ok(tasks) => tasks,
        Err(e) => return report(Err(e), "", out),
    };
    if tasks.is_empty() {
        writeln!(out, "No tasks found")?;
    }
    for t in &tasks {
        writeln!(out, "{t}")?;
    }
    Ok(Outcome::Success)
}

/// Generate shell completion scripts.
pub fn cmd_completions(shell: Shell, out: &mut impl Write) -> Result<Outcome> {
    use crate::cli::Cli;
    use clap::CommandFactory;

    let mut app = Cli::command();
    let app_name = app.get_name().to_string();
    generate(shell, &mut app, app_name, out);
    Ok(Outcome::Success)
}

fn ignore_extra(extra: &[String]) {
    if !extra.is_empty() {
        debug!(?extra, "ignoring surplus arguments");
    }
}

fn cmd_unknown(out: &mut impl Write) -> Result<Outcome> {
    writeln!(out, "{UNKNOWN_COMMAND}")?;
    Ok(Outcome::UnknownCommand)
}

/// Parse a task id argument. Anything that is not an unsigned integer
/// yields `None`, which never matches a task.
pub fn parse_id(arg: Option<&str>) -> Option<u64> {
    arg.and_then(|s| s.trim().parse().ok())
}

/// Print the message for a store result and classify it. I/O and
/// serialization failures propagate.
fn report(result: Result<(), StoreError>, success: &str, out: &mut impl Write) -> Result<Outcome> {
    let err = match result {
        Ok(()) => {
            writeln!(out, "{success}")?;
            return Ok(Outcome::Success);
        }
        Err(e) => e,
    };
    let outcome = match &err {
        StoreError::NotFound(id) => {
            debug!(id, "no task with this id");
            Some(Outcome::NotFound)
        }
        StoreError::InvalidStatus(status) => {
            debug!(%status, "rejected status filter");
            Some(Outcome::InvalidStatus)
        }
        StoreError::Io { .. } | StoreError::IdsExhausted | StoreError::Serialize(_) => None,
    };
    let Some(outcome) = outcome else {
        return Err(err.into());
    };
    writeln!(out, "{err}")?;
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use clap::Parser;
    use tempfile::TempDir;

    struct Harness {
        dir: TempDir,
    }

    impl Harness {
        fn new() -> Self {
            Harness {
                dir: TempDir::new().unwrap(),
            }
        }

        fn db(&self) -> std::path::PathBuf {
            self.dir.path().join("tasks.json")
        }

        /// Parse argv the way `main` does and run it, returning stdout and the outcome.
        fn run(&self, args: &[&str]) -> (String, Outcome) {
            let argv = std::iter::once("task-cli").chain(args.iter().copied());
            let cli = Cli::try_parse_from(argv).unwrap();
            let mut out = Vec::new();
            let outcome = dispatch(cli.command, &self.db(), &mut out).unwrap();
            (String::from_utf8(out).unwrap(), outcome)
        }

        fn store(&self) -> Store {
            Store::open(self.db()).unwrap()
        }
    }

    #[test]
    fn add_joins_words_and_prints_id() {
        let h = Harness::new();
        let (out, outcome) = h.run(&["add", "buy", "oat", "milk"]);
        assert_eq!(out, "Task added successfully (ID: 1)\n");
        assert_eq!(outcome, Outcome::Success);
        assert_eq!(h.store().load()[0].description, "buy oat milk");
    }

    #[test]
    fn add_keeps_hyphenated_words() {
        let h = Harness::new();
        h.run(&["add", "check", "-v", "output"]);
        assert_eq!(h.store().load()[0].description, "check -v output");
    }

    #[test]
    fn update_replaces_description() {
        let h = Harness::new();
        h.run(&["add", "draft"]);
        let (out, outcome) = h.run(&["update", "1", "final", "version"]);
        assert_eq!(out, "Task updated successfully\n");
        assert_eq!(outcome, Outcome::Success);
        assert_eq!(h.store().load()[0].description, "final version");
    }

    #[test]
    fn update_with_non_numeric_id_reports_not_found() {
        let h = Harness::new();
        h.run(&["add", "draft"]);
        let (out, outcome) = h.run(&["update", "abc", "x"]);
        assert_eq!(out, "Task not found\n");
        assert_eq!(outcome, Outcome::NotFound);
        assert_eq!(h.store().load()[0].description, "draft");
    }

    #[test]
    fn missing_id_reports_not_found() {
        let h = Harness::new();
        let (out, outcome) = h.run(&["delete"]);
        assert_eq!(out, "Task not found\n");
        assert_eq!(outcome, Outcome::NotFound);
    }

    #[test]
    fn delete_prints_confirmation() {
        let h = Harness::new();
        h.run(&["add", "a"]);
        h.run(&["add", "b"]);
        let (out, _) = h.run(&["delete", "1"]);
        assert_eq!(out, "Task deleted successfully\n");
        let tasks = h.store().load();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].id, 2);
    }

    #[test]
    fn mark_commands_set_fixed_statuses() {
        let h = Harness::new();
        h.run(&["add", "a"]);
        h.run(&["add", "b"]);

        let (out, _) = h.run(&["mark-in-progress", "1"]);
        assert_eq!(out, "Task marked as in-progress\n");
        let (out, _) = h.run(&["mark-done", "2"]);
        assert_eq!(out, "Task marked as done\n");

        let tasks = h.store().load();
        assert_eq!(tasks[0].status, Status::InProgress);
        assert_eq!(tasks[1].status, Status::Done);
    }

    #[test]
    fn mark_unknown_id_reports_not_found() {
        let h = Harness::new();
        let (out, outcome) = h.run(&["mark-done", "5"]);
        assert_eq!(out, "Task not found\n");
        assert_eq!(outcome, Outcome::NotFound);
    }

    #[test]
    fn list_prints_one_line_per_task() {
        let h = Harness::new();
        h.run(&["add", "buy", "milk"]);
        h.run(&["add", "walk", "dog"]);
        h.run(&["mark-done", "2"]);

        let (out, _) = h.run(&["list"]);
        assert_eq!(out, "1. buy milk [todo]\n2. walk dog [done]\n");

        let (out, _) = h.run(&["list", "done"]);
        assert_eq!(out, "2. walk dog [done]\n");
    }

    #[test]
    fn list_with_no_matches_says_so() {
        let h = Harness::new();
        let (out, outcome) = h.run(&["list", "in-progress"]);
        assert_eq!(out, "No tasks found\n");
        assert_eq!(outcome, Outcome::Success);
    }

    #[test]
    fn list_with_bogus_status_prints_validation_message() {
        let h = Harness::new();
        h.run(&["add", "a"]);
        let (out, outcome) = h.run(&["list", "bogus"]);
        assert_eq!(
            out,
            "Invalid status. Please use \"todo\", \"in-progress\", or \"done\".\n"
        );
        assert_eq!(outcome, Outcome::InvalidStatus);
    }

    #[test]
    fn unknown_command_prints_message_without_touching_store() {
        let h = Harness::new();
        let (out, outcome) = h.run(&["frobnicate", "1"]);
        assert_eq!(out, format!("{UNKNOWN_COMMAND}\n"));
        assert_eq!(outcome, Outcome::UnknownCommand);
        assert!(!h.db().exists());
    }

    #[test]
    fn command_names_are_case_sensitive() {
        let h = Harness::new();
        let (_, outcome) = h.run(&["Add", "x"]);
        assert_eq!(outcome, Outcome::UnknownCommand);
    }

    #[test]
    fn no_command_is_unknown() {
        let h = Harness::new();
        let (out, outcome) = h.run(&[]);
        assert_eq!(out, format!("{UNKNOWN_COMMAND}\n"));
        assert_eq!(outcome, Outcome::UnknownCommand);
    }

    #[test]
    fn completions_do_not_touch_store() {
        let h = Harness::new();
        let (out, outcome) = h.run(&["completions", "bash"]);
        assert!(out.contains("task-cli"));
        assert_eq!(outcome, Outcome::Success);
        assert!(!h.db().exists());
    }

    #[test]
    fn exit_codes_are_zero_unless_strict() {
        for outcome in [
            Outcome::Success,
            Outcome::NotFound,
            Outcome::InvalidStatus,
            Outcome::UnknownCommand,
        ] {
            assert_eq!(outcome.exit_code(false), 0);
        }
        assert_eq!(Outcome::Success.exit_code(true), 0);
        assert_eq!(Outcome::NotFound.exit_code(true), 3);
        assert_eq!(Outcome::InvalidStatus.exit_code(true), 4);
        assert_eq!(Outcome::UnknownCommand.exit_code(true), 5);
    }

    #[test]
    fn hyphenated_ids_report_not_found() {
        let h = Harness::new();
        h.run(&["add", "keep"]);
        for cmd in ["delete", "mark-done", "mark-in-progress"] {
            let (out, outcome) = h.run(&[cmd, "-1"]);
            assert_eq!(out, "Task not found\n", "{cmd}");
            assert_eq!(outcome, Outcome::NotFound);
        }
        let (out, _) = h.run(&["update", "-3", "x"]);
        assert_eq!(out, "Task not found\n");
        assert_eq!(h.store().load().len(), 1);
    }

    #[test]
    fn surplus_arguments_are_ignored() {
        let h = Harness::new();
        h.run(&["add", "a"]);
        h.run(&["add", "b"]);

        let (out, _) = h.run(&["mark-done", "2", "now", "--please"]);
        assert_eq!(out, "Task marked as done\n");

        let (out, _) = h.run(&["list", "done", "extra"]);
        assert_eq!(out, "2. b [done]\n");

        let (out, outcome) = h.run(&["delete", "1", "2"]);
        assert_eq!(out, "Task deleted successfully\n");
        assert_eq!(outcome, Outcome::Success);
        let tasks = h.store().load();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].id, 2);
    }

    #[test]
    fn help_inside_task_text_is_stored_literally() {
        let h = Harness::new();
        let (out, _) = h.run(&["add", "--help"]);
        assert_eq!(out, "Task added successfully (ID: 1)\n");
        assert_eq!(h.store().load()[0].description, "--help");

        h.run(&["update", "1", "read", "--help", "-h"]);
        assert_eq!(h.store().load()[0].description, "read --help -h");
    }

    #[test]
    fn parse_id_accepts_only_unsigned_integers() {
        assert_eq!(parse_id(Some("12")), Some(12));
        assert_eq!(parse_id(Some(" 3 ")), Some(3));
        assert_eq!(parse_id(Some("abc")), None);
        assert_eq!(parse_id(Some("-1")), None);
        assert_eq!(parse_id(None), None);
    }
}
