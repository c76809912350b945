//! Daemon Supervisor: owns the Watch Source, the work channel, and the
//! Worker Pool for the lifetime of one `start()`/`stop()` cycle.
//!
//! `start()` and `stop()` are each idempotent: calling `start()` twice
//! without an intervening `stop()` is a no-op returning
//! [`DaemonError::AlreadyRunning`]; calling `stop()` on an already-stopped
//! daemon is a no-op. Shutdown closes the Watch Source first so no new work
//! can be enqueued, then closes the work channel, then joins the workers —
//! in that order, so nothing is dropped mid-flight.

use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::SystemTime;

use tracing::info;

use crate::callback::CompletionCallback;
use crate::config::ConfigSnapshot;
use crate::dispatcher::{self, ActivityTracker};
use crate::engine::{Counters, OrganizeEngine, OrganizeOutcome};
use crate::error::{DaemonError, MoveError};
use crate::watcher::{FsWatchSource, WatchSource};
use crate::worker_pool;

/// A snapshot of the daemon's running state, safe to hand to a status
/// endpoint or log line without holding any lock open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DaemonStatus {
    pub running: bool,
    pub degraded: bool,
    pub watched_directories: Vec<PathBuf>,
    pub counters: Counters,
    pub last_activity: Option<SystemTime>,
}

struct RunningState {
    watch_source: Arc<dyn WatchSource>,
    work_tx: mpsc::SyncSender<dispatcher::WorkItem>,
    dispatcher_handle: JoinHandle<()>,
    worker_handles: Vec<JoinHandle<()>>,
}

pub struct Daemon {
    engine: Arc<OrganizeEngine>,
    worker_count: usize,
    channel_capacity: usize,
    callback: Mutex<Option<CompletionCallback>>,
    running: Mutex<Option<RunningState>>,
    degraded: Arc<std::sync::atomic::AtomicBool>,
    activity: ActivityTracker,
    require_confirmation: std::sync::atomic::AtomicBool,
}

impl Daemon {
    pub fn new(config: ConfigSnapshot) -> Self {
        let worker_count = config.worker_count;
        let channel_capacity = config.channel_capacity;
        Self {
            engine: Arc::new(OrganizeEngine::new(config)),
            worker_count,
            channel_capacity,
            callback: Mutex::new(None),
            running: Mutex::new(None),
            degraded: Arc::new(std::sync::atomic::AtomicBool::new(false)),
            activity: ActivityTracker::new(),
            require_confirmation: std::sync::atomic::AtomicBool::new(false),
        }
    }

    pub fn set_callback(&self, callback: Option<CompletionCallback>) {
        *self.callback.lock().unwrap() = callback;
    }

    pub fn set_dry_run(&self, dry_run: bool) {
        self.engine.set_dry_run(dry_run);
    }

    /// Advisory flag only: the engine never blocks on confirmation. A front
    /// end that wants a confirm-before-move workflow reads this flag and,
    /// when set, routes `Ask`-resolved collisions through its own prompt
    /// before calling [`Daemon::organize_file`] again rather than relying on
    /// the watch pipeline to pause mid-event.
    pub fn set_require_confirmation(&self, require: bool) {
        self.require_confirmation
            .store(require, std::sync::atomic::Ordering::SeqCst);
    }

    pub fn requires_confirmation(&self) -> bool {
        self.require_confirmation.load(std::sync::atomic::Ordering::SeqCst)
    }

    pub fn add_watch_directory(&self, dir: PathBuf) -> Result<(), DaemonError> {
        let running = self.running.lock().unwrap();
        if let Some(state) = running.as_ref() {
            state
                .watch_source
                .add_directory(&dir)
                .map_err(DaemonError::WatchSource)?;
        }
        Ok(())
    }

    /// Start watching and dispatching. Registers every directory the
    /// config names; if none can be watched, fails without starting
    /// anything (no dispatcher/worker threads are left dangling).
    pub fn start(&self) -> Result<(), DaemonError> {
        let mut running = self.running.lock().unwrap();
        if running.is_some() {
            return Err(DaemonError::AlreadyRunning);
        }

        let watch_source: Arc<dyn WatchSource> = Arc::new(FsWatchSource::new()?);
        let mut registered = 0;
        for dir in &self.engine.watch_directories {
            if watch_source.add_directory(dir).is_ok() {
                registered += 1;
            }
        }
        if registered == 0 {
            return Err(DaemonError::NoDirectoriesToWatch);
        }

        self.degraded.store(false, std::sync::atomic::Ordering::SeqCst);
        let (work_tx, work_rx) = mpsc::sync_channel(self.channel_capacity);
        let dispatcher_handle = dispatcher::spawn(
            Arc::clone(&watch_source),
            work_tx.clone(),
            Arc::clone(&self.degraded),
            self.activity.clone(),
        );
        let callback = self.callback.lock().unwrap().clone();
        let worker_handles = worker_pool::spawn(self.worker_count, work_rx, Arc::clone(&self.engine), callback);

        info!(directories = registered, workers = self.worker_count, "daemon started");

        *running = Some(RunningState {
            watch_source,
            work_tx,
            dispatcher_handle,
            worker_handles,
        });
        Ok(())
    }

    /// Stop watching, drain outstanding work, and join every thread. A
    /// no-op if the daemon isn't running.
    pub fn stop(&self) {
        let state = self.running.lock().unwrap().take();
        let Some(state) = state else { return };

        state.watch_source.close();
        drop(state.work_tx);
        let _ = state.dispatcher_handle.join();
        for handle in state.worker_handles {
            let _ = handle.join();
        }
        info!("daemon stopped");
    }

    pub fn status(&self) -> DaemonStatus {
        let running = self.running.lock().unwrap();
        let watched_directories = running
            .as_ref()
            .map(|s| s.watch_source.watched())
            .unwrap_or_default();
        DaemonStatus {
            running: running.is_some(),
            degraded: self.degraded.load(std::sync::atomic::Ordering::SeqCst),
            watched_directories,
            counters: self.engine.counters(),
            last_activity: self.activity.last_activity(),
        }
    }

    /// Synchronous one-shot organize, bypassing the watch pipeline
    /// entirely. Usable whether or not the daemon is currently running.
    pub fn organize_file(&self, path: &Path) -> Result<OrganizeOutcome, MoveError> {
        self.engine.organize_file(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{PatternRule, Settings};
    use std::fs;
    use tempfile::TempDir;

    fn snapshot_for(dirs: Vec<PathBuf>) -> ConfigSnapshot {
        ConfigSnapshot::with_capacity(
            vec![PatternRule {
                match_glob: "*.txt".into(),
                target: "./out".into(),
            }],
            dirs,
            Settings::default(),
            None,
            2,
            8,
        )
        .unwrap()
    }

    #[test]
    fn start_fails_with_no_watchable_directories() {
        let daemon = Daemon::new(snapshot_for(vec![PathBuf::from("/does/not/exist")]));
        let err = daemon.start().unwrap_err();
        assert!(matches!(err, DaemonError::NoDirectoriesToWatch));
    }

    #[test]
    fn start_is_idempotent_while_running() {
        let dir = TempDir::new().unwrap();
        let daemon = Daemon::new(snapshot_for(vec![dir.path().to_path_buf()]));
        daemon.start().unwrap();
        let err = daemon.start().unwrap_err();
        assert!(matches!(err, DaemonError::AlreadyRunning));
        daemon.stop();
    }

    #[test]
    fn stop_on_unstarted_daemon_is_a_no_op() {
        let dir = TempDir::new().unwrap();
        let daemon = Daemon::new(snapshot_for(vec![dir.path().to_path_buf()]));
        daemon.stop();
        assert!(!daemon.status().running);
    }

    #[test]
    fn organize_file_works_without_starting_the_daemon() {
        let dir = TempDir::new().unwrap();
        let daemon = Daemon::new(ConfigSnapshot::new(
            vec![PatternRule {
                match_glob: "*.txt".into(),
                target: dir.path().join("out").to_string_lossy().into_owned(),
            }],
            vec![],
            Settings {
                dry_run: false,
                create_dirs: true,
                backup: false,
                collision: crate::config::CollisionPolicy::Skip,
            },
            None,
        )
        .unwrap());

        let path = dir.path().join("note.txt");
        fs::write(&path, b"hi").unwrap();
        let outcome = daemon.organize_file(&path).unwrap();
        assert!(matches!(outcome, OrganizeOutcome::Moved { .. }));
    }

    #[test]
    fn status_reports_watched_directories_once_started() {
        let dir = TempDir::new().unwrap();
        let daemon = Daemon::new(snapshot_for(vec![dir.path().to_path_buf()]));
        daemon.start().unwrap();
        let status = daemon.status();
        assert!(status.running);
        assert_eq!(status.watched_directories, vec![dir.path().to_path_buf()]);
        assert!(status.last_activity.is_none());
        daemon.stop();
        assert!(!daemon.status().running);
    }

    #[test]
    fn require_confirmation_flag_is_advisory_and_round_trips() {
        let dir = TempDir::new().unwrap();
        let daemon = Daemon::new(snapshot_for(vec![dir.path().to_path_buf()]));
        assert!(!daemon.requires_confirmation());
        daemon.set_require_confirmation(true);
        assert!(daemon.requires_confirmation());
    }

    #[test]
    fn last_activity_is_set_after_a_watched_file_is_created() {
        let dir = TempDir::new().unwrap();
        let daemon = Daemon::new(snapshot_for(vec![dir.path().to_path_buf()]));
        daemon.start().unwrap();

        fs::write(dir.path().join("note.txt"), b"hi").unwrap();

        let deadline = std::time::Instant::now() + std::time::Duration::from_secs(5);
        while daemon.status().last_activity.is_none() && std::time::Instant::now() < deadline {
            std::thread::sleep(std::time::Duration::from_millis(20));
        }
        assert!(daemon.status().last_activity.is_some());
        daemon.stop();
    }
}
