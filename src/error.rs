//! Structured error taxonomy for the organize engine and daemon.
//!
//! Pattern matching and collision resolution never log (per design); they
//! return these types directly and let the caller decide what to do with
//! them. The Move Executor and daemon layers log at the levels noted on
//! each variant's doc comment, then propagate unchanged.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while building or validating a [`crate::config::ConfigSnapshot`].
///
/// Surfaced at engine construction; never retried.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("collision policy {0:?} is not one of rename|skip|overwrite|ask|fail")]
    InvalidCollisionPolicy(String),

    #[error("pattern rule {index} has an empty match glob")]
    EmptyMatch { index: usize },

    #[error("pattern rule {index} has an empty target")]
    EmptyTarget { index: usize },

    #[error("pattern rule {index} has an invalid glob `{glob}`: {source}")]
    InvalidGlob {
        index: usize,
        glob: String,
        #[source]
        source: globset::Error,
    },

    #[error("no watch directories configured")]
    NoWatchDirectories,
}

/// Errors encountered resolving or re-stat'ing the source file of a move.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("source path does not exist: {0}")]
    Missing(PathBuf),

    #[error("source path is not a regular file: {0}")]
    NotARegularFile(PathBuf),

    #[error("access denied reading source: {0}")]
    AccessDenied(PathBuf),
}

/// Errors about the proposed or final destination.
#[derive(Debug, Error)]
pub enum DestinationError {
    #[error("destination parent exists but is not a directory: {0}")]
    ParentNotDirectory(PathBuf),

    #[error("destination already exists: {0}")]
    AlreadyExists(PathBuf),

    #[error("exhausted {attempts} rename candidates for {0}", attempts = 1000)]
    RenameExhausted(PathBuf),
}

/// Top-level error returned by the Move Executor and the Organize Engine.
#[derive(Debug, Error)]
pub enum MoveError {
    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Destination(#[from] DestinationError),

    #[error("failed to create destination parent directory {path}: {source}")]
    CreateDirs {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to create backup of {path}: {source}")]
    BackupFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error moving {from} to {to}: {source}")]
    Io {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors surfaced by a [`crate::watcher::WatchSource`].
#[derive(Debug, Error)]
pub enum WatchSourceError {
    #[error("directory does not exist or is not a directory: {0}")]
    InvalidDirectory(PathBuf),

    #[error("underlying watch backend error: {0}")]
    Backend(#[from] notify::Error),

    /// Watch-limit exhaustion (inotify ENOSPC-class errors) or another
    /// condition that leaves the source unable to guarantee further events.
    #[error("watch source degraded: {0}")]
    Degraded(String),
}

/// Errors raised starting or operating the daemon supervisor.
#[derive(Debug, Error)]
pub enum DaemonError {
    #[error("no directories could be watched")]
    NoDirectoriesToWatch,

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    WatchSource(#[from] WatchSourceError),

    #[error("daemon is already running")]
    AlreadyRunning,
}
