//! Event Dispatcher: the single consumer of a [`crate::watcher::WatchSource`].
//!
//! Filters the raw change stream down to the events the engine cares about,
//! re-stats the target (a `Created`/`Modified` event can easily be stale by
//! the time it's read), and enqueues onto the bounded work channel the
//! Worker Pool drains. Never blocks the watch source: a full work channel
//! means the file is dropped, loudly, rather than the dispatcher stalling
//! and the watch source's own internal buffers backing up behind it.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::SyncSender;
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::SystemTime;

use tracing::{error, warn};

use crate::error::WatchSourceError;
use crate::watcher::{ChangeKind, WatchSource};

/// One unit of work handed to the Worker Pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkItem {
    pub path: PathBuf,
}

/// Shared, lock-protected "last time the dispatcher saw a real event"
/// timestamp, surfaced on [`crate::daemon::DaemonStatus`].
#[derive(Clone, Default)]
pub struct ActivityTracker(Arc<Mutex<Option<SystemTime>>>);

impl ActivityTracker {
    pub fn new() -> Self {
        Self::default()
    }

    fn touch(&self) {
        *self.0.lock().unwrap() = Some(SystemTime::now());
    }

    pub fn last_activity(&self) -> Option<SystemTime> {
        *self.0.lock().unwrap()
    }
}

/// Runs the dispatcher loop on a dedicated thread until the watch source's
/// event stream closes. `degraded` is flipped to `true` the first time the
/// watch source reports a [`WatchSourceError::Degraded`] condition, so a
/// daemon status snapshot can surface it without polling the error stream
/// itself.
pub fn spawn(
    source: Arc<dyn WatchSource>,
    work_tx: SyncSender<WorkItem>,
    degraded: Arc<AtomicBool>,
    activity: ActivityTracker,
) -> JoinHandle<()> {
    thread::spawn(move || run(source.as_ref(), &work_tx, &degraded, &activity))
}

fn run(source: &dyn WatchSource, work_tx: &SyncSender<WorkItem>, degraded: &AtomicBool, activity: &ActivityTracker) {
    loop {
        if let Some(err) = source.try_recv_error() {
            if matches!(err, WatchSourceError::Degraded(_)) {
                degraded.store(true, Ordering::SeqCst);
            }
            error!(error = %err, "watch source reported an error");
        }

        let Some(event) = source.recv_event() else {
            break;
        };

        if !matches!(event.kind, ChangeKind::Created | ChangeKind::Modified) {
            continue;
        }

        if !event.path.is_file() {
            continue;
        }

        activity.touch();

        match work_tx.try_send(WorkItem { path: event.path.clone() }) {
            Ok(()) => {}
            Err(std::sync::mpsc::TrySendError::Full(_)) => {
                warn!(path = %event.path.display(), "work channel full, dropping event");
            }
            Err(std::sync::mpsc::TrySendError::Disconnected(_)) => break,
        }
    }
}
