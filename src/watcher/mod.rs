//! Watch Source: emits raw, individually-typed filesystem change events.
//!
//! Deliberately not debounced or batched: the Organize Engine needs to see
//! every `Created`/`Modified`/`Removed`/rename-pair event as it happens, with
//! its own timestamp, and must tolerate duplicate `Modified` events rather
//! than have them coalesced away upstream. Coalescing belongs to the Event
//! Dispatcher, if anywhere, not to the source.
//!
//! # Threading
//!
//! A dedicated thread owns the `notify` backend and keeps itself alive until
//! told to shut down; `notify`'s own platform backend (inotify, kqueue,
//! ReadDirectoryChangesW, FSEvents) delivers events on its own thread via the
//! callback passed to [`notify::recommended_watcher`], which simply forwards
//! them onto an `mpsc` channel this module owns.

pub mod fake;

use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, SystemTime};

use notify::event::{ModifyKind, RenameMode};
use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};

use crate::error::WatchSourceError;

/// The kind of change observed. `RenamedOld`/`RenamedNew` are emitted as a
/// pair when the backend can correlate them; a rename the backend cannot
/// correlate surfaces as a `Removed` followed later by a `Created`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Created,
    Modified,
    Removed,
    RenamedOld,
    RenamedNew,
}

/// A single, raw, non-debounced filesystem change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub path: PathBuf,
    pub kind: ChangeKind,
    pub timestamp: SystemTime,
}

/// Abstraction over "something that produces [`ChangeEvent`]s", so the Event
/// Dispatcher can be driven by either the real `notify`-backed source or a
/// scripted test double.
pub trait WatchSource: Send {
    /// Register a new directory to watch recursively.
    fn add_directory(&self, dir: &Path) -> Result<(), WatchSourceError>;

    /// Directories currently registered.
    fn watched(&self) -> Vec<PathBuf>;

    /// Block until the next change event, or `None` once the source has
    /// been closed and has no more buffered events.
    fn recv_event(&self) -> Option<ChangeEvent>;

    /// Non-blocking poll for a backend error (e.g. watch-limit exhaustion).
    /// Kept as a channel distinct from `recv_event` so a degraded condition
    /// never has to be smuggled through the change-event stream.
    fn try_recv_error(&self) -> Option<WatchSourceError>;

    /// Stop watching and release the backend. Idempotent.
    fn close(&self);
}

/// Production [`WatchSource`] backed by `notify::RecommendedWatcher`.
pub struct FsWatchSource {
    watcher: Mutex<RecommendedWatcher>,
    watched: Mutex<Vec<PathBuf>>,
    event_rx: Receiver<ChangeEvent>,
    error_rx: Receiver<WatchSourceError>,
    shutdown: Arc<AtomicBool>,
    _keepalive_thread: Mutex<Option<JoinHandle<()>>>,
}

impl FsWatchSource {
    pub fn new() -> Result<Self, WatchSourceError> {
        let (event_tx, event_rx) = mpsc::channel::<ChangeEvent>();
        let (error_tx, error_rx) = mpsc::channel::<WatchSourceError>();

        let watcher = notify::recommended_watcher(move |result: notify::Result<notify::Event>| {
            handle_notify_result(result, &event_tx, &error_tx);
        })?;

        let shutdown = Arc::new(AtomicBool::new(false));
        let thread_shutdown = Arc::clone(&shutdown);
        let keepalive = thread::spawn(move || {
            while !thread_shutdown.load(Ordering::SeqCst) {
                thread::sleep(Duration::from_millis(200));
            }
        });

        Ok(Self {
            watcher: Mutex::new(watcher),
            watched: Mutex::new(Vec::new()),
            event_rx,
            error_rx,
            shutdown,
            _keepalive_thread: Mutex::new(Some(keepalive)),
        })
    }
}

impl WatchSource for FsWatchSource {
    fn add_directory(&self, dir: &Path) -> Result<(), WatchSourceError> {
        if !dir.is_dir() {
            return Err(WatchSourceError::InvalidDirectory(dir.to_path_buf()));
        }
        self.watcher
            .lock()
            .unwrap()
            .watch(dir, RecursiveMode::Recursive)?;
        self.watched.lock().unwrap().push(dir.to_path_buf());
        Ok(())
    }

    fn watched(&self) -> Vec<PathBuf> {
        self.watched.lock().unwrap().clone()
    }

    fn recv_event(&self) -> Option<ChangeEvent> {
        self.event_rx.recv().ok()
    }

    fn try_recv_error(&self) -> Option<WatchSourceError> {
        self.error_rx.try_recv().ok()
    }

    fn close(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
        for dir in self.watched.lock().unwrap().drain(..) {
            let _ = self.watcher.lock().unwrap().unwatch(&dir);
        }
    }
}

/// Translate one `notify::Event` into zero or more [`ChangeEvent`]s, or a
/// [`WatchSourceError`] on the error channel. A single backend event can
/// carry more than one path (e.g. a batched rename), so this fans out.
fn handle_notify_result(
    result: notify::Result<notify::Event>,
    event_tx: &Sender<ChangeEvent>,
    error_tx: &Sender<WatchSourceError>,
) {
    let event = match result {
        Ok(event) => event,
        Err(err) => {
            let watch_err = if is_watch_limit_error(&err) {
                WatchSourceError::Degraded(err.to_string())
            } else {
                WatchSourceError::Backend(err)
            };
            let _ = error_tx.send(watch_err);
            return;
        }
    };

    let now = SystemTime::now();
    let kinds = translate_kind(event.kind);
    let Some(kind) = kinds else { return };

    for path in event.paths {
        let _ = event_tx.send(ChangeEvent {
            path,
            kind,
            timestamp: now,
        });
    }
}

fn translate_kind(kind: EventKind) -> Option<ChangeKind> {
    match kind {
        EventKind::Create(_) => Some(ChangeKind::Created),
        EventKind::Remove(_) => Some(ChangeKind::Removed),
        EventKind::Modify(ModifyKind::Name(RenameMode::From)) => Some(ChangeKind::RenamedOld),
        EventKind::Modify(ModifyKind::Name(RenameMode::To)) => Some(ChangeKind::RenamedNew),
        EventKind::Modify(_) => Some(ChangeKind::Modified),
        // Access events and anything else carry no information the engine
        // acts on; dropped here rather than forwarded as noise.
        EventKind::Access(_) | EventKind::Any | EventKind::Other => None,
    }
}

fn is_watch_limit_error(err: &notify::Error) -> bool {
    match &err.kind {
        notify::ErrorKind::MaxFilesWatch => true,
        notify::ErrorKind::Io(io_err) => io_err.raw_os_error() == Some(28), // ENOSPC
        _ => false,
    }
}

#[cfg(test)]
#[path = "watcher_tests.rs"]
mod tests;
