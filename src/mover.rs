//! Move Executor: performs the actual filesystem mutation once a
//! destination has been resolved and cleared by the Collision Resolver.
//!
//! Every step here is ordered deliberately: restat the source right before
//! touching it (it may have disappeared or changed since it was matched),
//! create parent directories before backing up, back up before the real
//! move, and only ever rename-or-copy once everything else has succeeded.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::{info, warn};

use crate::error::{DestinationError, MoveError, SourceError};

/// Parameters controlling one [`execute_move`] call. Mirrors the subset of
/// [`crate::config::Settings`] the executor actually consults.
#[derive(Debug, Clone, Copy)]
pub struct MoveOptions {
    pub dry_run: bool,
    pub create_dirs: bool,
    pub backup: bool,
}

/// Outcome of a move. The Collision Resolver's `Skip`/`Fail` decisions are
/// handled by the caller before this function is ever invoked — by the time
/// `execute_move` runs, a concrete destination has already been chosen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveOutcome {
    pub final_dest: PathBuf,
    pub size_bytes: u64,
}

/// Move `source` to `proposed_dest`, honoring `options`.
///
/// `proposed_dest` is assumed to already be collision-cleared: either the
/// exact path to use, or a path known not to exist yet. This function does
/// not re-run collision resolution; callers (the Organize Engine) own that
/// sequencing.
pub fn execute_move(source: &Path, proposed_dest: &Path, options: MoveOptions) -> Result<MoveOutcome, MoveError> {
    let metadata = fs::symlink_metadata(source).map_err(|_| SourceError::Missing(source.to_path_buf()))?;
    if !metadata.is_file() {
        return Err(SourceError::NotARegularFile(source.to_path_buf()).into());
    }
    let canonical_source = fs::canonicalize(source).map_err(|_| SourceError::AccessDenied(source.to_path_buf()))?;
    let size_bytes = metadata.len();

    if options.dry_run {
        if let Some(parent) = proposed_dest.parent() {
            if !options.create_dirs && parent.exists() && !parent.is_dir() {
                return Err(DestinationError::ParentNotDirectory(parent.to_path_buf()).into());
            }
        }
        info!(
            source = %canonical_source.display(),
            destination = %proposed_dest.display(),
            "dry run: would move file"
        );
        return Ok(MoveOutcome {
            final_dest: proposed_dest.to_path_buf(),
            size_bytes,
        });
    }

    if let Some(parent) = proposed_dest.parent() {
        if options.create_dirs {
            create_dirs_idempotent(parent)?;
        } else if parent.exists() && !parent.is_dir() {
            return Err(DestinationError::ParentNotDirectory(parent.to_path_buf()).into());
        }
    }

    if options.backup && proposed_dest.exists() {
        make_backup(proposed_dest)?;
    }

    perform_move(&canonical_source, proposed_dest, size_bytes)?;

    info!(
        source = %canonical_source.display(),
        destination = %proposed_dest.display(),
        size_bytes,
        "moved file"
    );

    Ok(MoveOutcome {
        final_dest: proposed_dest.to_path_buf(),
        size_bytes,
    })
}

/// Create `dir` and all of its ancestors with mode 0755, tolerating the
/// directory already existing (idempotent, unlike a bare `create_dir`).
fn create_dirs_idempotent(dir: &Path) -> Result<(), MoveError> {
    if dir.is_dir() {
        return Ok(());
    }
    fs::create_dir_all(dir).map_err(|source| MoveError::CreateDirs {
        path: dir.to_path_buf(),
        source,
    })?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let _ = fs::set_permissions(dir, fs::Permissions::from_mode(0o755));
    }

    Ok(())
}

/// Copy `dest` aside to `{dest}.bak.{unix_seconds}` before it gets
/// overwritten, disambiguating with a trailing counter if a backup for the
/// same second already exists (rapid repeated collisions in one process).
fn make_backup(dest: &Path) -> Result<PathBuf, MoveError> {
    let seconds = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);

    let base_name = dest
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let parent = dest.parent().unwrap_or_else(|| Path::new(""));

    let mut candidate = parent.join(format!("{base_name}.bak.{seconds}"));
    let mut counter = 1u32;
    while candidate.exists() {
        candidate = parent.join(format!("{base_name}.bak.{seconds}.{counter}"));
        counter += 1;
    }

    fs::copy(dest, &candidate).map_err(|source| MoveError::BackupFailed {
        path: dest.to_path_buf(),
        source,
    })?;

    warn!(original = %dest.display(), backup = %candidate.display(), "backed up file before overwrite");
    Ok(candidate)
}

/// Rename `source` to `dest`, falling back to copy-then-unlink on a
/// cross-device error (`EXDEV`), via a temporary `.partial` file so a
/// reader never observes a partially-written destination at the real path.
fn perform_move(source: &Path, dest: &Path, size_bytes: u64) -> Result<(), MoveError> {
    match fs::rename(source, dest) {
        Ok(()) => Ok(()),
        Err(err) if is_cross_device(&err) => copy_then_unlink(source, dest, size_bytes),
        Err(source_err) => Err(MoveError::Io {
            from: source.to_path_buf(),
            to: dest.to_path_buf(),
            source: source_err,
        }),
    }
}

#[cfg(unix)]
fn is_cross_device(err: &std::io::Error) -> bool {
    err.raw_os_error() == Some(libc_exdev())
}

#[cfg(unix)]
fn libc_exdev() -> i32 {
    18
}

#[cfg(not(unix))]
fn is_cross_device(err: &std::io::Error) -> bool {
    err.kind() == std::io::ErrorKind::Other
}

fn copy_then_unlink(source: &Path, dest: &Path, _size_bytes: u64) -> Result<(), MoveError> {
    let rand_suffix: u32 = {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.subsec_nanos())
            .unwrap_or(0);
        nanos ^ (std::process::id())
    };
    let parent = dest.parent().unwrap_or_else(|| Path::new(""));
    let partial = parent.join(format!(
        "{}.partial.{rand_suffix}",
        dest.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default()
    ));

    fs::copy(source, &partial).map_err(|err| MoveError::Io {
        from: source.to_path_buf(),
        to: partial.clone(),
        source: err,
    })?;

    fs::rename(&partial, dest).map_err(|err| MoveError::Io {
        from: partial.clone(),
        to: dest.to_path_buf(),
        source: err,
    })?;

    fs::remove_file(source).map_err(|err| MoveError::Io {
        from: source.to_path_buf(),
        to: dest.to_path_buf(),
        source: err,
    })?;

    Ok(())
}

#[cfg(test)]
#[path = "mover_tests.rs"]
mod tests;
