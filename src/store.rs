//! File-backed task store.
//!
//! The whole collection lives in a single pretty-printed JSON array. Every
//! mutating operation loads the file, applies one change and writes the full
//! array back through a temp file and a rename, so a crash mid-save leaves
//! the previous contents intact.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::Local;
use thiserror::Error;
use tracing::{debug, warn};

use crate::fields::Status;
use crate::task::Task;

/// Errors produced by [`Store`] operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Task not found")]
    NotFound(u64),
    #[error("Invalid status. Please use \"todo\", \"in-progress\", or \"done\".")]
    InvalidStatus(String),
    #[error("cannot write {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("no task ids left")]
    IdsExhausted,
    #[error("cannot serialize tasks")]
    Serialize(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// Task collection bound to one JSON file.
#[derive(Debug, Clone)]
pub struct Store {
    path: PathBuf,
}

impl Store {
    /// Bind a store to `path`, creating parent directories and an empty
    /// `[]` file when missing.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let store = Store { path: path.into() };
        if let Some(parent) = store.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| StoreError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        if !store.path.exists() {
            debug!(path = %store.path.display(), "creating empty task file");
            store.save(&[])?;
        }
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load all tasks.
    ///
    /// A missing or blank file is an empty store. A file that cannot be read
    /// or parsed is also treated as empty, after a copy of it has been put
    /// aside in the `backup/` directory next to it.
    pub fn load(&self) -> Vec<Task> {
        let buf = match fs::read(&self.path) {
            Ok(buf) => buf,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Vec::new(),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "cannot read task file, starting fresh");
                self.preserve_unreadable();
                return Vec::new();
            }
        };
        if buf.iter().all(u8::is_ascii_whitespace) {
            return Vec::new();
        }
        match serde_json::from_slice(&buf) {
            Ok(tasks) => {
                debug!(path = %self.path.display(), "loaded task file");
                tasks
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "cannot parse task file, starting fresh");
                self.preserve_unreadable();
                Vec::new()
            }
        }
    }

    fn preserve_unreadable(&self) {
        match create_backup(&self.path) {
            Ok(copy) => warn!(backup = %copy.display(), "unreadable task file preserved"),
            Err(e) => warn!(error = %e, "cannot preserve unreadable task file"),
        }
    }

    /// Overwrite the file with `tasks` (temp file + rename).
    pub fn save(&self, tasks: &[Task]) -> Result<()> {
        let data = serde_json::to_string_pretty(tasks)?;
        let tmp = self.path.with_extension("json.tmp");
        let io_err = |source: io::Error| StoreError::Io {
            path: self.path.clone(),
            source,
        };
        let mut f = File::create(&tmp).map_err(io_err)?;
        f.write_all(data.as_bytes()).map_err(io_err)?;
        f.flush().map_err(io_err)?;
        f.sync_all().map_err(io_err)?;
        fs::rename(&tmp, &self.path).map_err(io_err)?;
        debug!(path = %self.path.display(), count = tasks.len(), "saved task file");
        Ok(())
    }

    /// Append a new `todo` task and return its id.
    pub fn add(&self, description: impl Into<String>) -> Result<u64> {
        let mut tasks = self.load();
        let id = next_id(&tasks).ok_or(StoreError::IdsExhausted)?;
        tasks.push(Task::new(id, description));
        self.save(&tasks)?;
        Ok(id)
    }

    /// Replace the description of task `id`.
    pub fn update(&self, id: u64, description: impl Into<String>) -> Result<()> {
        let description = description.into();
        self.modify(id, |t| t.description = description)
    }

    /// Remove task `id`, keeping the order of the others.
    pub fn delete(&self, id: u64) -> Result<()> {
        let mut tasks = self.load();
        let idx = tasks
            .iter()
            .position(|t| t.id == id)
            .ok_or(StoreError::NotFound(id))?;
        tasks.remove(idx);
        self.save(&tasks)
    }

    pub fn set_status(&self, id: u64, status: Status) -> Result<()> {
        self.modify(id, |t| t.status = status)
    }

    /// All tasks in insertion order, or only those whose status is `filter`.
    pub fn list(&self, filter: Option<&str>) -> Result<Vec<Task>> {
        let status = match filter {
            None => None,
            Some(s) => Some(Status::parse(s).ok_or_else(|| StoreError::InvalidStatus(s.to_string()))?),
        };
        let mut tasks = self.load();
        if let Some(status) = status {
            tasks.retain(|t| t.status == status);
        }
        Ok(tasks)
    }

    fn modify(&self, id: u64, f: impl FnOnce(&mut Task)) -> Result<()> {
        let mut tasks = self.load();
        let task = tasks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or(StoreError::NotFound(id))?;
        f(task);
        task.touch();
        self.save(&tasks)
    }
}

/// Next free id: one past the highest id in use, `None` once `u64::MAX` is taken.
pub fn next_id(tasks: &[Task]) -> Option<u64> {
    tasks.iter().map(|t| t.id).max().unwrap_or(0).checked_add(1)
}

/// Copy `path` into a sibling `backup/` directory under a timestamped name.
pub fn create_backup(path: &Path) -> io::Result<PathBuf> {
    let parent_dir = path.parent().unwrap_or_else(|| Path::new("."));
    let backup_dir = parent_dir.join("backup");
    fs::create_dir_all(&backup_dir)?;

    let timestamp = Local::now().format("%Y-%m-%d_%H-%M-%S");
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("tasks.json");
    let backup_path = backup_dir.join(format!("{timestamp}_{file_name}"));
    fs::copy(path, &backup_path)?;
    Ok(backup_path)
}
