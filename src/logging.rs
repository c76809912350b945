//! Structured logging setup.
//!
//! Mirrors the filtered-registry-plus-fmt-layer shape used across the rest
//! of the pack: `RUST_LOG` (or `info` if unset/invalid) drives an
//! `EnvFilter`, and output goes either to stderr (foreground use) or a
//! rotation-free log file via a non-blocking `tracing-appender` writer
//! (daemon use, where a held `WorkerGuard` must outlive the process).

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Initialize logging to stderr. Suitable for a foreground/one-shot run.
pub fn init_stderr() {
    tracing_subscriber::registry()
        .with(env_filter())
        .with(fmt::layer())
        .init();
}

/// Initialize logging to a file at `log_path`, non-blocking. The returned
/// guard must be held for the lifetime of the process: dropping it early
/// flushes and detaches the writer, silently truncating any logging done
/// after that point.
pub fn init_file(log_path: &Path) -> std::io::Result<WorkerGuard> {
    let dir = log_path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(dir)?;
    let file_name = log_path.file_name().unwrap_or_else(|| std::ffi::OsStr::new("organizd.log"));
    let appender = tracing_appender::rolling::never(dir, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::registry()
        .with(env_filter())
        .with(fmt::layer().with_writer(non_blocking))
        .init();

    Ok(guard)
}
