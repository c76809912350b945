//! organizd: a deterministic file-organization watch daemon.
//!
//! Observes one or more directories, matches changed files against an
//! ordered list of glob-to-destination rules, resolves naming collisions
//! at the destination, and moves matched files there — either as a
//! one-shot pass over an existing directory or continuously as a daemon
//! driven by filesystem change notifications.

pub mod callback;
pub mod collision;
pub mod config;
pub mod daemon;
pub mod dispatcher;
pub mod engine;
pub mod error;
pub mod index;
pub mod logging;
pub mod mover;
pub mod pattern;
pub mod watcher;
pub mod worker_pool;

pub use callback::CompletionCallback;
pub use collision::{resolve, Decision};
pub use config::{CollisionPolicy, ConfigSnapshot, PatternRule, RawConfig, Settings};
pub use daemon::{Daemon, DaemonStatus};
pub use dispatcher::{ActivityTracker, WorkItem};
pub use engine::{Counters, OrganizeEngine, OrganizeOutcome};
pub use error::{ConfigError, DaemonError, DestinationError, MoveError, SourceError, WatchSourceError};
pub use mover::{execute_move, MoveOptions, MoveOutcome};
pub use pattern::{match_against_snapshot, match_path, ResolvedDestination};
pub use watcher::{ChangeEvent, ChangeKind, FsWatchSource, WatchSource};
