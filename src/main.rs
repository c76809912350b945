//! organizd entry point.
//!
//! This binary is intentionally thin: it loads no config file format of its
//! own and parses no subcommands. It wires a [`ConfigSnapshot`] built from
//! a couple of environment variables into a [`Daemon`], starts it, and
//! blocks until SIGINT/SIGTERM. Loading a real YAML config file and
//! exposing a full CLI is a front end's job, layered on top of this crate.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use organizd::{CollisionPolicy, ConfigSnapshot, Daemon, PatternRule, Settings};

fn main() -> anyhow::Result<()> {
    organizd::logging::init_stderr();

    let watch_dir = std::env::var("ORGANIZD_WATCH_DIR").unwrap_or_else(|_| ".".to_string());
    let target_dir = std::env::var("ORGANIZD_TARGET_DIR").unwrap_or_else(|_| "./organized".to_string());
    let dry_run = std::env::var("ORGANIZD_DRY_RUN")
        .map(|v| v != "0" && v.to_lowercase() != "false")
        .unwrap_or(true);

    let snapshot = ConfigSnapshot::new(
        vec![PatternRule {
            match_glob: "*".into(),
            target: target_dir,
        }],
        vec![PathBuf::from(watch_dir)],
        Settings {
            dry_run,
            create_dirs: true,
            backup: false,
            collision: CollisionPolicy::Rename,
        },
        None,
    )?;

    let daemon = Arc::new(Daemon::new(snapshot));
    daemon.start()?;

    let shutdown = Arc::new(AtomicBool::new(false));
    signal_hook::flag::register(signal_hook::consts::SIGINT, Arc::clone(&shutdown))?;
    signal_hook::flag::register(signal_hook::consts::SIGTERM, Arc::clone(&shutdown))?;

    tracing::info!("organizd running, press Ctrl-C to stop");
    while !shutdown.load(Ordering::SeqCst) {
        std::thread::sleep(Duration::from_millis(200));
    }

    daemon.stop();
    Ok(())
}
