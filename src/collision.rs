//! Collision Resolver: decides what to do when a proposed destination path
//! already exists. Never mutates the filesystem — only `stat`s it.

use std::path::{Path, PathBuf};

use crate::config::CollisionPolicy;
use crate::error::DestinationError;

/// Upper bound on rename candidates probed under the `rename` policy.
const RENAME_PROBE_LIMIT: u32 = 1000;

/// The decision returned by [`resolve`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Use the proposed (or probed) path as-is.
    UseAsIs(PathBuf),
    /// Use a renamed candidate instead of the proposed path.
    UseRenamed(PathBuf),
    /// Leave the source in place; do not move.
    Skip,
    /// A hard error — surfaced to the caller, never retried internally.
    Fail(DestinationError),
}

/// Resolve a proposed destination under `policy`. `source` and
/// `proposed_dest` are compared post-canonicalization so that moving a file
/// onto itself is treated as a no-op [`Decision::Skip`], not an error.
pub fn resolve(source: &Path, proposed_dest: &Path, policy: CollisionPolicy) -> Decision {
    if paths_are_same(source, proposed_dest) {
        return Decision::Skip;
    }

    let exists = proposed_dest.exists();

    match policy {
        CollisionPolicy::Skip => {
            if exists {
                Decision::Skip
            } else {
                Decision::UseAsIs(proposed_dest.to_path_buf())
            }
        }
        CollisionPolicy::Overwrite => Decision::UseAsIs(proposed_dest.to_path_buf()),
        CollisionPolicy::Rename => {
            if !exists {
                return Decision::UseAsIs(proposed_dest.to_path_buf());
            }
            match probe_rename_candidate(proposed_dest) {
                Some(candidate) => Decision::UseRenamed(candidate),
                None => Decision::Fail(DestinationError::RenameExhausted(proposed_dest.to_path_buf())),
            }
        }
        CollisionPolicy::Fail => {
            if exists {
                Decision::Fail(DestinationError::AlreadyExists(proposed_dest.to_path_buf()))
            } else {
                Decision::UseAsIs(proposed_dest.to_path_buf())
            }
        }
        // `ask` never blocks inside the engine: it behaves exactly like
        // `skip` here. Any interactive re-resolution is a collaborator's
        // job performed via the daemon's completion callback, which may
        // re-submit the file under a different policy.
        CollisionPolicy::Ask => {
            if exists {
                Decision::Skip
            } else {
                Decision::UseAsIs(proposed_dest.to_path_buf())
            }
        }
    }
}

fn paths_are_same(a: &Path, b: &Path) -> bool {
    match (std::fs::canonicalize(a), std::fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

/// Find the smallest `k >= 1` such that `{stem}_({k}){ext}` doesn't exist in
/// the destination directory, probing up to [`RENAME_PROBE_LIMIT`]
/// candidates.
fn probe_rename_candidate(proposed_dest: &Path) -> Option<PathBuf> {
    let parent = proposed_dest.parent().unwrap_or_else(|| Path::new(""));
    let stem = proposed_dest.file_stem()?.to_string_lossy().into_owned();
    let ext = proposed_dest.extension().map(|e| e.to_string_lossy().into_owned());

    for k in 1..=RENAME_PROBE_LIMIT {
        let candidate_name = match &ext {
            Some(ext) => format!("{stem}_({k}).{ext}"),
            None => format!("{stem}_({k})"),
        };
        let candidate = parent.join(candidate_name);
        if !candidate.exists() {
            return Some(candidate);
        }
    }
    None
}

#[cfg(test)]
#[path = "collision_tests.rs"]
mod tests;
