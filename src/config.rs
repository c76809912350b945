//! Configuration data model: pattern rules, settings, and the immutable
//! snapshot an [`crate::engine::OrganizeEngine`] is constructed from.
//!
//! The wire format in `RawConfig` mirrors the YAML schema documented in the
//! external interface contract. Loading that YAML (or any other front end)
//! is a collaborator's job; this module only validates and compiles an
//! already-parsed value into the immutable snapshot the engine owns.

use std::path::PathBuf;

use globset::{Glob, GlobMatcher};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// A single `match -> target` rule as authored by the user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PatternRule {
    /// Shell-style glob applied to the file's base name.
    #[serde(rename = "match", alias = "pattern")]
    pub match_glob: String,
    /// Destination directory. Absolute, or relative to the source file's
    /// parent directory.
    pub target: String,
}

/// A [`PatternRule`] with its glob pre-compiled for repeated matching.
///
/// Compilation is lenient here even though [`ConfigSnapshot::new`] rejects
/// invalid globs up front: a rule appended later via
/// [`crate::engine::OrganizeEngine::add_pattern`] is not re-validated, so the
/// Pattern Matcher must still tolerate (and skip, with a warning) a rule
/// whose glob never compiled.
#[derive(Clone)]
pub(crate) struct CompiledRule {
    pub rule: PatternRule,
    pub matcher: Result<GlobMatcher, String>,
}

impl std::fmt::Debug for CompiledRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompiledRule").field("rule", &self.rule).finish()
    }
}

/// Collision-handling policy, see §4.2 of the design notes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CollisionPolicy {
    Rename,
    Skip,
    Overwrite,
    Ask,
    Fail,
}

impl Default for CollisionPolicy {
    fn default() -> Self {
        CollisionPolicy::Ask
    }
}

impl std::str::FromStr for CollisionPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "rename" => Ok(CollisionPolicy::Rename),
            "skip" => Ok(CollisionPolicy::Skip),
            "overwrite" => Ok(CollisionPolicy::Overwrite),
            "ask" => Ok(CollisionPolicy::Ask),
            "fail" => Ok(CollisionPolicy::Fail),
            other => Err(ConfigError::InvalidCollisionPolicy(other.to_string())),
        }
    }
}

/// Behavioral settings, independent of the pattern list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Settings {
    #[serde(default = "default_dry_run")]
    pub dry_run: bool,
    #[serde(default = "default_create_dirs")]
    pub create_dirs: bool,
    #[serde(default)]
    pub backup: bool,
    #[serde(default)]
    pub collision: CollisionPolicy,
}

fn default_dry_run() -> bool {
    true
}

fn default_create_dirs() -> bool {
    true
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            dry_run: default_dry_run(),
            create_dirs: default_create_dirs(),
            backup: false,
            collision: CollisionPolicy::default(),
        }
    }
}

/// Raw, unvalidated configuration value matching the documented YAML shape.
///
/// `organize.patterns` and top-level `rules` are both accepted; when both
/// are present, `organize.patterns` takes precedence (open question #1 in
/// the design notes is resolved this way: precedence, not a merge, so the
/// chosen list's ordering is never interleaved with the other's).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawConfig {
    #[serde(default)]
    pub organize: Option<RawOrganize>,
    #[serde(default)]
    pub settings: Option<Settings>,
    #[serde(default)]
    pub directories: Option<RawDirectories>,
    #[serde(default)]
    pub rules: Option<Vec<PatternRule>>,
    #[serde(default)]
    pub watch_mode: Option<RawWatchMode>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawOrganize {
    #[serde(default)]
    pub patterns: Option<Vec<PatternRule>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawDirectories {
    #[serde(default)]
    pub default: Option<String>,
    #[serde(default)]
    pub watch: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawWatchMode {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub interval: Option<u64>,
}

/// The immutable configuration an engine or daemon is built from.
///
/// Reconfiguration requires constructing a fresh engine/daemon; there is no
/// mutation path for the rule list or settings once built (only `add_pattern`
/// appends to a running engine's own copy — see [`crate::engine::OrganizeEngine`]).
#[derive(Clone)]
pub struct ConfigSnapshot {
    pub(crate) rules: Vec<CompiledRule>,
    pub watch_directories: Vec<PathBuf>,
    pub settings: Settings,
    pub default_directory: Option<PathBuf>,
    pub worker_count: usize,
    pub channel_capacity: usize,
}

impl std::fmt::Debug for ConfigSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigSnapshot")
            .field("rules", &self.rules.iter().map(|c| &c.rule).collect::<Vec<_>>())
            .field("watch_directories", &self.watch_directories)
            .field("settings", &self.settings)
            .field("default_directory", &self.default_directory)
            .field("worker_count", &self.worker_count)
            .field("channel_capacity", &self.channel_capacity)
            .finish()
    }
}

const DEFAULT_WORKER_COUNT: usize = 4;
const DEFAULT_CHANNEL_CAPACITY: usize = 100;

impl ConfigSnapshot {
    /// Build and validate a snapshot from already-parsed rules, directories,
    /// and settings. This is the path a collaborator loader (YAML, JSON, ...)
    /// should use once it has deserialized its own file format.
    pub fn new(
        rules: Vec<PatternRule>,
        watch_directories: Vec<PathBuf>,
        settings: Settings,
        default_directory: Option<PathBuf>,
    ) -> Result<Self, ConfigError> {
        Self::with_capacity(
            rules,
            watch_directories,
            settings,
            default_directory,
            DEFAULT_WORKER_COUNT,
            DEFAULT_CHANNEL_CAPACITY,
        )
    }

    /// Same as [`Self::new`] but with an explicit worker count and work-channel
    /// capacity (default 4 workers / 100 slots per the design notes).
    pub fn with_capacity(
        rules: Vec<PatternRule>,
        watch_directories: Vec<PathBuf>,
        settings: Settings,
        default_directory: Option<PathBuf>,
        worker_count: usize,
        channel_capacity: usize,
    ) -> Result<Self, ConfigError> {
        let compiled = compile_rules(rules)?;
        Ok(Self {
            rules: compiled,
            watch_directories,
            settings,
            default_directory,
            worker_count: worker_count.max(1),
            channel_capacity: channel_capacity.max(1),
        })
    }

    /// Merge-and-validate a [`RawConfig`] as documented in the external
    /// interface's YAML schema. Unknown keys are ignored by virtue of serde
    /// already having dropped them during deserialization.
    pub fn try_from_raw(raw: RawConfig) -> Result<Self, ConfigError> {
        let rules = raw
            .organize
            .as_ref()
            .and_then(|o| o.patterns.clone())
            .or(raw.rules)
            .unwrap_or_default();

        let settings = raw.settings.unwrap_or_default();

        let watch_directories = raw
            .directories
            .as_ref()
            .and_then(|d| d.watch.clone())
            .unwrap_or_default()
            .into_iter()
            .map(PathBuf::from)
            .collect();

        let default_directory = raw
            .directories
            .and_then(|d| d.default)
            .map(PathBuf::from);

        Self::new(rules, watch_directories, settings, default_directory)
    }

    pub fn rules(&self) -> impl Iterator<Item = &PatternRule> {
        self.rules.iter().map(|c| &c.rule)
    }
}

/// Strict compilation used at [`ConfigSnapshot`] construction time: a
/// malformed rule aborts construction entirely (a Configuration error, per
/// the error taxonomy, surfaced once at startup and never retried).
pub(crate) fn compile_rules(rules: Vec<PatternRule>) -> Result<Vec<CompiledRule>, ConfigError> {
    rules
        .into_iter()
        .enumerate()
        .map(|(index, rule)| {
            if rule.match_glob.is_empty() {
                return Err(ConfigError::EmptyMatch { index });
            }
            if rule.target.is_empty() {
                return Err(ConfigError::EmptyTarget { index });
            }
            let glob = Glob::new(&rule.match_glob).map_err(|source| ConfigError::InvalidGlob {
                index,
                glob: rule.match_glob.clone(),
                source,
            })?;
            Ok(CompiledRule {
                matcher: Ok(glob.compile_matcher()),
                rule,
            })
        })
        .collect()
}

/// Lenient compilation used by `add_pattern` on a live engine: an invalid
/// glob is kept as an `Err` inside the rule rather than rejected, so the
/// Pattern Matcher can skip it at match time with a warning instead of
/// aborting the whole list (see the Pattern Matcher contract).
pub(crate) fn compile_rule_lenient(rule: PatternRule) -> CompiledRule {
    let matcher = Glob::new(&rule.match_glob)
        .map(|g| g.compile_matcher())
        .map_err(|e| e.to_string());
    CompiledRule { rule, matcher }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn organize_patterns_take_precedence_over_top_level_rules() {
        let raw = RawConfig {
            organize: Some(RawOrganize {
                patterns: Some(vec![PatternRule {
                    match_glob: "*.txt".into(),
                    target: "./documents".into(),
                }]),
            }),
            rules: Some(vec![PatternRule {
                match_glob: "*.jpg".into(),
                target: "./images".into(),
            }]),
            ..Default::default()
        };
        let snapshot = ConfigSnapshot::try_from_raw(raw).unwrap();
        let rules: Vec<_> = snapshot.rules().collect();
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].match_glob, "*.txt");
    }

    #[test]
    fn defaults_match_documented_yaml_defaults() {
        let snapshot = ConfigSnapshot::try_from_raw(RawConfig::default()).unwrap();
        assert!(snapshot.settings.dry_run);
        assert!(snapshot.settings.create_dirs);
        assert!(!snapshot.settings.backup);
        assert_eq!(snapshot.settings.collision, CollisionPolicy::Ask);
    }

    #[test]
    fn empty_match_glob_is_rejected() {
        let err = ConfigSnapshot::new(
            vec![PatternRule {
                match_glob: String::new(),
                target: "./dest".into(),
            }],
            vec![],
            Settings::default(),
            None,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::EmptyMatch { index: 0 }));
    }

    #[test]
    fn invalid_glob_is_rejected_without_aborting() {
        let err = ConfigSnapshot::new(
            vec![PatternRule {
                match_glob: "[".into(),
                target: "./dest".into(),
            }],
            vec![],
            Settings::default(),
            None,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidGlob { index: 0, .. }));
    }

    #[test]
    fn collision_policy_parses_documented_values() {
        for (s, expect) in [
            ("rename", CollisionPolicy::Rename),
            ("skip", CollisionPolicy::Skip),
            ("overwrite", CollisionPolicy::Overwrite),
            ("ask", CollisionPolicy::Ask),
            ("fail", CollisionPolicy::Fail),
        ] {
            assert_eq!(s.parse::<CollisionPolicy>().unwrap(), expect);
        }
        assert!("bogus".parse::<CollisionPolicy>().is_err());
    }
}
