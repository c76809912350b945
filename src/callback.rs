//! Optional per-file completion sink for the Worker Pool.
//!
//! Absence is a no-op: a daemon or one-shot caller that doesn't care about
//! individual file outcomes simply never constructs one. Invocation happens
//! synchronously on whichever worker thread finished the file — a callback
//! that wants to hand off elsewhere (a channel, a UI event loop) owns that
//! hop itself.

use std::path::Path;
use std::sync::Arc;

use crate::engine::OrganizeOutcome;

type CallbackFn = dyn Fn(&Path, Option<&OrganizeOutcome>, Option<&str>) + Send + Sync;

#[derive(Clone)]
pub struct CompletionCallback {
    inner: Arc<CallbackFn>,
}

impl CompletionCallback {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Path, Option<&OrganizeOutcome>, Option<&str>) + Send + Sync + 'static,
    {
        Self { inner: Arc::new(f) }
    }

    pub fn on_complete(&self, path: &Path, outcome: &OrganizeOutcome) {
        (self.inner)(path, Some(outcome), None);
    }

    pub fn on_failure(&self, path: &Path, error: &crate::error::MoveError) {
        let message = error.to_string();
        (self.inner)(path, None, Some(&message));
    }

    pub fn on_panic(&self, path: &Path, message: &str) {
        (self.inner)(path, None, Some(message));
    }
}
