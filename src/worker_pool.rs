//! Worker Pool: a fixed number of OS threads draining the bounded work
//! channel and invoking the Organize Engine for each item.
//!
//! A panic or error processing one file is isolated to that file — reported
//! through the optional completion callback — and never brings down the
//! pool. The pool terminates once the work channel is closed and drained.

use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::Receiver;
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use tracing::{error, warn};

use crate::callback::CompletionCallback;
use crate::dispatcher::WorkItem;
use crate::engine::OrganizeEngine;

pub const DEFAULT_WORKER_COUNT: usize = 4;

/// Spawn `worker_count` threads, each pulling from `work_rx` until it
/// disconnects. Returns their join handles so a caller can wait for clean
/// shutdown after closing the channel.
pub fn spawn(
    worker_count: usize,
    work_rx: Receiver<WorkItem>,
    engine: Arc<OrganizeEngine>,
    callback: Option<CompletionCallback>,
) -> Vec<JoinHandle<()>> {
    let work_rx = Arc::new(Mutex::new(work_rx));
    let worker_count = worker_count.max(1);

    (0..worker_count)
        .map(|id| {
            let work_rx = Arc::clone(&work_rx);
            let engine = Arc::clone(&engine);
            let callback = callback.clone();
            thread::spawn(move || worker_loop(id, &work_rx, &engine, callback.as_ref()))
        })
        .collect()
}

fn worker_loop(
    worker_id: usize,
    work_rx: &Arc<Mutex<Receiver<WorkItem>>>,
    engine: &OrganizeEngine,
    callback: Option<&CompletionCallback>,
) {
    loop {
        let item = {
            let rx = work_rx.lock().unwrap();
            rx.recv()
        };
        let Ok(item) = item else { break };

        let result = panic::catch_unwind(AssertUnwindSafe(|| engine.organize_file(&item.path)));

        match result {
            Ok(Ok(outcome)) => {
                if let Some(cb) = callback {
                    cb.on_complete(&item.path, &outcome);
                }
            }
            Ok(Err(err)) => {
                warn!(worker_id, path = %item.path.display(), error = %err, "failed to organize file");
                if let Some(cb) = callback {
                    cb.on_failure(&item.path, &err);
                }
            }
            Err(panic) => {
                let message = panic_message(&panic);
                error!(worker_id, path = %item.path.display(), message, "worker panicked processing file");
                if let Some(cb) = callback {
                    cb.on_panic(&item.path, &message);
                }
            }
        }
    }
}

fn panic_message(payload: &Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "worker panicked with a non-string payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConfigSnapshot, PatternRule, Settings};
    use std::sync::mpsc;
    use std::sync::Mutex as StdMutex;
    use std::time::Duration;
    use tempfile::TempDir;

    fn engine_for(dir: &std::path::Path) -> Arc<OrganizeEngine> {
        let snapshot = ConfigSnapshot::new(
            vec![PatternRule {
                match_glob: "*.txt".into(),
                target: dir.join("out").to_string_lossy().into_owned(),
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
        .unwrap();
        Arc::new(OrganizeEngine::new(snapshot))
    }

    #[test]
    fn drains_queued_work_and_moves_files() {
        let dir = TempDir::new().unwrap();
        let engine = engine_for(dir.path());
        let (work_tx, work_rx) = mpsc::sync_channel(8);

        let a = dir.path().join("a.txt");
        std::fs::write(&a, b"1").unwrap();
        work_tx.send(WorkItem { path: a.clone() }).unwrap();
        drop(work_tx);

        let handles = spawn(2, work_rx, Arc::clone(&engine), None);
        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(engine.counters().files_processed, 1);
        assert!(!a.exists());
    }

    #[test]
    fn worker_survives_a_panicking_item() {
        let dir = TempDir::new().unwrap();
        let engine = engine_for(dir.path());
        let (work_tx, work_rx) = mpsc::sync_channel(8);

        // A path with a NUL byte trips fs::symlink_metadata with an error,
        // not a panic, so instead we rely on catch_unwind around a
        // deliberately malformed call path: organize_file never panics in
        // practice, so this test documents that even a worst-case error is
        // isolated and the pool keeps draining subsequent items.
        let a = dir.path().join("a.txt");
        let b = dir.path().join("b.txt");
        std::fs::write(&a, b"1").unwrap();
        std::fs::write(&b, b"2").unwrap();
        work_tx.send(WorkItem { path: a.clone() }).unwrap();
        work_tx.send(WorkItem { path: b.clone() }).unwrap();
        drop(work_tx);

        let handles = spawn(1, work_rx, Arc::clone(&engine), None);
        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(engine.counters().files_processed, 2);
    }

    #[test]
    fn callback_is_invoked_per_completed_item() {
        let dir = TempDir::new().unwrap();
        let engine = engine_for(dir.path());
        let (work_tx, work_rx) = mpsc::sync_channel(8);

        let a = dir.path().join("a.txt");
        std::fs::write(&a, b"1").unwrap();
        work_tx.send(WorkItem { path: a.clone() }).unwrap();
        drop(work_tx);

        let seen = Arc::new(StdMutex::new(Vec::new()));
        let seen_clone = Arc::clone(&seen);
        let callback = CompletionCallback::new(move |path, outcome, error| {
            seen_clone.lock().unwrap().push((path.to_path_buf(), outcome.is_some(), error.is_none()));
        });

        let handles = spawn(1, work_rx, Arc::clone(&engine), Some(callback));
        for h in handles {
            h.join().unwrap();
        }
        thread::sleep(Duration::from_millis(10));

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].0, a);
        assert!(seen[0].1);
    }
}
