//! Scripted [`WatchSource`] test double.
//!
//! Lets dispatcher and daemon tests push a fixed sequence of events/errors
//! and assert on what gets consumed, without touching a real filesystem
//! watch backend.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Condvar, Mutex};

use super::{ChangeEvent, WatchSource};
use crate::error::WatchSourceError;

struct FakeState {
    events: VecDeque<ChangeEvent>,
    errors: VecDeque<WatchSourceError>,
    watched: Vec<PathBuf>,
    closed: bool,
}

/// A [`WatchSource`] driven entirely by calls to [`FakeWatchSource::push_event`]
/// and [`FakeWatchSource::push_error`].
#[derive(Clone)]
pub struct FakeWatchSource {
    inner: Arc<Mutex<FakeState>>,
    notify: Arc<Condvar>,
}

impl FakeWatchSource {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(FakeState {
                events: VecDeque::new(),
                errors: VecDeque::new(),
                watched: Vec::new(),
                closed: false,
            })),
            notify: Arc::new(Condvar::new()),
        }
    }

    pub fn push_event(&self, event: ChangeEvent) {
        let mut state = self.inner.lock().unwrap();
        state.events.push_back(event);
        self.notify.notify_all();
    }

    pub fn push_error(&self, error: WatchSourceError) {
        self.inner.lock().unwrap().errors.push_back(error);
    }

    pub fn is_closed(&self) -> bool {
        self.inner.lock().unwrap().closed
    }
}

impl Default for FakeWatchSource {
    fn default() -> Self {
        Self::new()
    }
}

impl WatchSource for FakeWatchSource {
    fn add_directory(&self, dir: &Path) -> Result<(), WatchSourceError> {
        self.inner.lock().unwrap().watched.push(dir.to_path_buf());
        Ok(())
    }

    fn watched(&self) -> Vec<PathBuf> {
        self.inner.lock().unwrap().watched.clone()
    }

    fn recv_event(&self) -> Option<ChangeEvent> {
        let mut state = self.inner.lock().unwrap();
        loop {
            if let Some(event) = state.events.pop_front() {
                return Some(event);
            }
            if state.closed {
                return None;
            }
            state = self.notify.wait(state).unwrap();
        }
    }

    fn try_recv_error(&self) -> Option<WatchSourceError> {
        self.inner.lock().unwrap().errors.pop_front()
    }

    fn close(&self) {
        let mut state = self.inner.lock().unwrap();
        state.closed = true;
        self.notify.notify_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::watcher::ChangeKind;
    use std::time::SystemTime;

    #[test]
    fn recv_event_returns_pushed_events_in_order() {
        let fake = FakeWatchSource::new();
        fake.push_event(ChangeEvent {
            path: PathBuf::from("/a.txt"),
            kind: ChangeKind::Created,
            timestamp: SystemTime::now(),
        });
        fake.push_event(ChangeEvent {
            path: PathBuf::from("/b.txt"),
            kind: ChangeKind::Modified,
            timestamp: SystemTime::now(),
        });

        assert_eq!(fake.recv_event().unwrap().path, PathBuf::from("/a.txt"));
        assert_eq!(fake.recv_event().unwrap().path, PathBuf::from("/b.txt"));
    }

    #[test]
    fn recv_event_returns_none_after_close_once_drained() {
        let fake = FakeWatchSource::new();
        fake.push_event(ChangeEvent {
            path: PathBuf::from("/a.txt"),
            kind: ChangeKind::Created,
            timestamp: SystemTime::now(),
        });
        fake.close();
        assert!(fake.recv_event().is_some());
        assert!(fake.recv_event().is_none());
    }

    #[test]
    fn add_directory_records_watched_paths() {
        let fake = FakeWatchSource::new();
        fake.add_directory(Path::new("/watched")).unwrap();
        assert_eq!(fake.watched(), vec![PathBuf::from("/watched")]);
    }
}
