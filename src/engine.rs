//! Organize Engine: composes the Pattern Matcher, Collision Resolver, and
//! Move Executor into the `Observed -> Matched -> DestinationResolved ->
//! (Backup?) -> Moved | Skipped | Failed` pipeline (with `NoMatch ->
//! Ignored` as the short-circuit path).
//!
//! The engine owns its [`ConfigSnapshot`]-derived state behind a single
//! reader-writer lock. The lock is held only long enough to read the
//! current rule list and settings, or to record a result afterward — never
//! across the filesystem I/O the Move Executor performs.

use std::path::{Path, PathBuf};
use std::sync::RwLock;

use tracing::warn;
use walkdir::WalkDir;

use crate::collision::{self, Decision};
use crate::config::{CollisionPolicy, CompiledRule, ConfigSnapshot, PatternRule};
use crate::error::MoveError;
use crate::index::MoveIndex;
use crate::mover::{self, MoveOptions};
use crate::pattern::match_path_with;

/// Outcome of [`OrganizeEngine::organize_file`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrganizeOutcome {
    /// No rule matched this file's base name; left untouched.
    Ignored,
    /// The Collision Resolver chose to leave the file in place.
    Skipped,
    /// The file was moved (or, under `dry_run`, would have been).
    Moved { final_dest: PathBuf, size_bytes: u64 },
}

/// Running totals exposed via [`OrganizeEngine::counters`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Counters {
    pub files_processed: u64,
    pub files_skipped: u64,
    pub files_failed: u64,
}

struct EngineState {
    rules: Vec<CompiledRule>,
    dry_run: bool,
    index: MoveIndex,
    counters: Counters,
}

/// Composes pattern matching, collision resolution, and the move executor
/// over one immutable (besides `dry_run` and appended patterns) config.
pub struct OrganizeEngine {
    state: RwLock<EngineState>,
    create_dirs: bool,
    backup: bool,
    collision_policy: CollisionPolicy,
    pub watch_directories: Vec<PathBuf>,
    pub default_directory: Option<PathBuf>,
}

impl OrganizeEngine {
    pub fn new(snapshot: ConfigSnapshot) -> Self {
        Self {
            state: RwLock::new(EngineState {
                rules: snapshot.rules,
                dry_run: snapshot.settings.dry_run,
                index: MoveIndex::new(),
                counters: Counters::default(),
            }),
            create_dirs: snapshot.settings.create_dirs,
            backup: snapshot.settings.backup,
            collision_policy: snapshot.settings.collision,
            watch_directories: snapshot.watch_directories,
            default_directory: snapshot.default_directory,
        }
    }

    pub fn is_dry_run(&self) -> bool {
        self.state.read().unwrap().dry_run
    }

    pub fn set_dry_run(&self, dry_run: bool) {
        self.state.write().unwrap().dry_run = dry_run;
    }

    pub fn counters(&self) -> Counters {
        self.state.read().unwrap().counters
    }

    /// Append a pattern rule to the running engine's rule list. Compiled
    /// leniently: an invalid glob is kept (and skipped with a warning at
    /// match time) rather than rejected outright, since this path bypasses
    /// the strict validation `ConfigSnapshot` performs at construction.
    pub fn add_pattern(&self, rule: PatternRule) {
        let compiled = crate::config::compile_rule_lenient(rule);
        self.state.write().unwrap().rules.push(compiled);
    }

    /// Run one file through the full pipeline.
    pub fn organize_file(&self, path: &Path) -> Result<OrganizeOutcome, MoveError> {
        let (resolved, dry_run) = {
            let state = self.state.read().unwrap();
            let resolved = match_path_with(path, &state.rules, |index, rule, err| {
                warn!(rule_index = index, glob = %rule.match_glob, error = %err, "skipping rule with invalid glob");
            });
            (resolved, state.dry_run)
        };

        let resolved = match resolved {
            Some(r) => r,
            None => return Ok(OrganizeOutcome::Ignored),
        };

        let file_name = match path.file_name() {
            Some(n) => n,
            None => return Ok(OrganizeOutcome::Ignored),
        };
        let proposed_dest = resolved.directory.join(file_name);

        let decision = collision::resolve(path, &proposed_dest, self.collision_policy);
        let final_dest = match decision {
            Decision::Skip => {
                self.state.write().unwrap().counters.files_skipped += 1;
                return Ok(OrganizeOutcome::Skipped);
            }
            Decision::Fail(err) => {
                self.state.write().unwrap().counters.files_failed += 1;
                return Err(err.into());
            }
            Decision::UseAsIs(dest) | Decision::UseRenamed(dest) => dest,
        };

        let options = MoveOptions {
            dry_run,
            create_dirs: self.create_dirs,
            backup: self.backup,
        };

        match mover::execute_move(path, &final_dest, options) {
            Ok(outcome) => {
                if !dry_run {
                    let mut state = self.state.write().unwrap();
                    state.index.record(outcome.final_dest.clone(), outcome.size_bytes);
                    state.counters.files_processed += 1;
                }
                Ok(OrganizeOutcome::Moved {
                    final_dest: outcome.final_dest,
                    size_bytes: outcome.size_bytes,
                })
            }
            Err(err) => {
                self.state.write().unwrap().counters.files_failed += 1;
                Err(err)
            }
        }
    }

    /// Apply [`Self::organize_file`] to each of `paths`, in order. Stops and
    /// returns on the first hard failure (a bubbled-up [`MoveError`]);
    /// non-matching paths are silently skipped rather than recorded.
    pub fn organize_by_patterns(&self, paths: &[PathBuf]) -> Result<Vec<(PathBuf, OrganizeOutcome)>, MoveError> {
        let mut results = Vec::new();
        for path in paths {
            let outcome = self.organize_file(path)?;
            if matches!(outcome, OrganizeOutcome::Ignored) {
                continue;
            }
            results.push((path.clone(), outcome));
        }
        Ok(results)
    }

    pub fn organize_directory(&self, dir: &Path) -> Vec<(PathBuf, Result<OrganizeOutcome, MoveError>)> {
        let mut results = Vec::new();
        let entries = match std::fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(_) => return results,
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let outcome = self.organize_file(&path);
            if matches!(outcome, Ok(OrganizeOutcome::Ignored)) {
                continue;
            }
            results.push((path, outcome));
        }
        results
    }

    /// Recursive variant of [`Self::organize_directory`], added to cover the
    /// common case of a watched tree with nested subdirectories. Never
    /// follows symlinks, matching the path-safety posture the rest of the
    /// engine holds to.
    pub fn organize_directory_recursive(&self, dir: &Path) -> Vec<(PathBuf, Result<OrganizeOutcome, MoveError>)> {
        let mut results = Vec::new();
        for entry in WalkDir::new(dir).follow_links(false).into_iter().flatten() {
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path().to_path_buf();
            let outcome = self.organize_file(&path);
            if matches!(outcome, Ok(OrganizeOutcome::Ignored)) {
                continue;
            }
            results.push((path, outcome));
        }
        results
    }
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
