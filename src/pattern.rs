//! Pattern Matcher: a pure function over a path and an ordered rule list.
//!
//! Never logs to a sink directly — matching is a pure computation returning
//! a `Resolved` value; the engine decides what, if anything, to log.

use std::path::{Path, PathBuf};

use crate::config::{CompiledRule, ConfigSnapshot};

/// The outcome of matching a path against a rule list: which rule matched
/// (by index, for diagnostics) and the directory it resolves to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedDestination {
    pub rule_index: usize,
    pub directory: PathBuf,
}

/// Match `path`'s base name against `rules` in order, returning the first
/// hit. Rules whose glob never compiled are skipped (with a caller-supplied
/// warning callback) rather than aborting the search.
pub fn match_path(path: &Path, rules: &[CompiledRule]) -> Option<ResolvedDestination> {
    match_path_with(path, rules, |_index, _rule, _err| {})
}

/// Same as [`match_path`] but invokes `on_invalid_glob(index, rule, error)`
/// for every rule skipped because its glob never compiled, so a caller can
/// log a warning without this module doing so itself.
pub fn match_path_with(
    path: &Path,
    rules: &[CompiledRule],
    mut on_invalid_glob: impl FnMut(usize, &crate::config::PatternRule, &str),
) -> Option<ResolvedDestination> {
    let base_name = path.file_name()?;

    for (index, compiled) in rules.iter().enumerate() {
        let matcher = match &compiled.matcher {
            Ok(m) => m,
            Err(err) => {
                on_invalid_glob(index, &compiled.rule, err);
                continue;
            }
        };

        if matcher.is_match(base_name) {
            let target = Path::new(&compiled.rule.target);
            let directory = if target.is_absolute() {
                target.to_path_buf()
            } else {
                path.parent()
                    .map(|parent| parent.join(target))
                    .unwrap_or_else(|| target.to_path_buf())
            };
            return Some(ResolvedDestination {
                rule_index: index,
                directory,
            });
        }
    }
    None
}

/// Convenience entry point that matches against a whole [`ConfigSnapshot`].
pub fn match_against_snapshot(path: &Path, snapshot: &ConfigSnapshot) -> Option<ResolvedDestination> {
    match_path_with(path, &snapshot.rules, |index, rule, err| {
        tracing::warn!(rule_index = index, glob = %rule.match_glob, error = %err, "skipping rule with invalid glob");
    })
}

#[cfg(test)]
#[path = "pattern_tests.rs"]
mod tests;
