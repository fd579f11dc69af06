//! # Display Module
//!
//! Receive-side output: the in-memory display log fed by the read loop, and
//! an optional timestamped session capture file.

use crate::error::Result;
use std::fmt;
use std::fs::OpenOptions;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

/// Append-only log of received text shown to the user.
///
/// Cloning yields another handle to the same log, so the read-loop task and
/// the front end share one sequence of entries. Cleared only on explicit
/// user action or before a new send batch.
#[derive(Clone, Default)]
pub struct DisplayLog {
    entries: Arc<Mutex<Vec<String>>>,
}

impl DisplayLog {
    /// Creates an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one received chunk as a log entry.
    pub fn append(&self, chunk: &str) {
        self.lock().push(chunk.to_string());
    }

    /// Removes all entries.
    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Snapshot of the current entries.
    pub fn entries(&self) -> Vec<String> {
        self.lock().clone()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// True when no entries have been appended since the last clear.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// All entries joined with newlines, ready for display.
    pub fn to_text(&self) -> String {
        self.lock().join("\n")
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<String>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Direction tag for session capture entries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    /// Data written to the port.
    Write,
    /// Data read from the port.
    Read,
    /// A transport error.
    Error,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Write => write!(f, "write"),
            Direction::Read => write!(f, "read"),
            Direction::Error => write!(f, "error"),
        }
    }
}

/// Timestamped capture of serial traffic, appended to a file.
///
/// Each entry carries a millisecond-resolution local timestamp and a
/// direction tag.
pub struct SessionLog {
    path: PathBuf,
}

impl SessionLog {
    /// Creates (or re-opens for append) a capture file at `path`.
    pub fn create(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(SessionLog { path })
    }

    /// Appends one entry to the capture file.
    pub fn record(&self, direction: Direction, data: &str) -> Result<()> {
        let time = chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f");
        let file = OpenOptions::new().append(true).open(&self.path)?;
        let mut write = BufWriter::new(&file);
        writeln!(write, "[{time}-{direction}] {data}")?;
        write.flush()?;
        Ok(())
    }

    /// Path of the capture file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_and_snapshot() {
        let log = DisplayLog::new();
        log.append("one");
        log.append("two");
        assert_eq!(log.entries(), vec!["one".to_string(), "two".to_string()]);
        assert_eq!(log.to_text(), "one\ntwo");
    }

    #[test]
    fn test_clear() {
        let log = DisplayLog::new();
        log.append("one");
        log.clear();
        assert!(log.is_empty());
        assert_eq!(log.to_text(), "");
    }

    #[test]
    fn test_clone_shares_entries() {
        let log = DisplayLog::new();
        let handle = log.clone();
        handle.append("from the other handle");
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn test_session_log_records_tagged_entries() {
        let path = std::env::temp_dir().join(format!(
            "lineport-session-{}-{:?}.log",
            std::process::id(),
            std::thread::current().id()
        ));
        let _ = std::fs::remove_file(&path);

        let session = SessionLog::create(&path).unwrap();
        session.record(Direction::Write, "hello").unwrap();
        session.record(Direction::Read, "world").unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("-write] hello"));
        assert!(content.contains("-read] world"));
        assert_eq!(content.lines().count(), 2);

        let _ = std::fs::remove_file(&path);
    }
}
