//! The in-memory File Entry index: a process-local, non-persistent record
//! of files moved during one engine lifetime.
//!
//! This is explicitly non-authoritative (see the design notes): correctness
//! of collision handling relies on `stat`-ing the filesystem, never on this
//! index. It exists only to let `organize_directory`-style batch callers
//! observe what happened during their own run, and to feed the processed
//! counters the daemon status surface reports.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// A single recorded move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    pub destination: PathBuf,
    pub size_bytes: u64,
    pub recorded_at: SystemTime,
}

/// Process-local index of moved files, keyed by canonicalized destination.
#[derive(Debug, Default)]
pub struct MoveIndex {
    entries: HashMap<PathBuf, FileEntry>,
}

impl MoveIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a successful move. Called only after the Move Executor has
    /// already performed the rename/copy — never speculatively.
    pub fn record(&mut self, destination: PathBuf, size_bytes: u64) {
        let entry = FileEntry {
            destination: destination.clone(),
            size_bytes,
            recorded_at: SystemTime::now(),
        };
        self.entries.insert(destination, entry);
    }

    pub fn get(&self, destination: &Path) -> Option<&FileEntry> {
        self.entries.get(destination)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
