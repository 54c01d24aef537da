use std::path::{Path, PathBuf};

use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use uidai_core::error::DashboardError;
use uidai_core::settings::LastUsedParams;

/// Data directory used when nothing else is found.
pub const DEFAULT_DATA_DIR: &str = "data";

// ── Directory bootstrap ────────────────────────────────────────────────────────

/// Ensure `~/.uidai-dashboard/` exists.
pub fn ensure_directories() -> anyhow::Result<()> {
    std::fs::create_dir_all(LastUsedParams::app_dir())?;
    Ok(())
}

// ── Logging bootstrap ──────────────────────────────────────────────────────────

/// Initialise the global `tracing` subscriber on stderr.
///
/// `log_level` is one of `DEBUG`, `INFO`, `WARNING`, `ERROR`; anything else
/// falls back to `info`.
pub fn setup_logging(log_level: &str) -> anyhow::Result<()> {
    let filter = EnvFilter::try_new(level_directive(log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let subscriber = fmt::layer()
        .with_target(false)
        .with_thread_ids(false)
        .with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(filter)
        .with(subscriber)
        .try_init()?;

    Ok(())
}

fn level_directive(log_level: &str) -> &'static str {
    match log_level.to_uppercase().as_str() {
        "DEBUG" => "debug",
        "WARNING" | "WARN" => "warn",
        "ERROR" => "error",
        _ => "info",
    }
}

// ── Data-path discovery ────────────────────────────────────────────────────────

/// Resolve the data root.
///
/// An explicit path must exist. Otherwise the first existing of
/// `./data` and `~/.uidai-dashboard/data` is used, falling back to
/// `./data` (which then loads as empty datasets).
pub fn discover_data_path(explicit: Option<&Path>) -> Result<PathBuf, DashboardError> {
    if let Some(path) = explicit {
        if path.is_dir() {
            return Ok(path.to_path_buf());
        }
        return Err(DashboardError::DataPathNotFound(path.to_path_buf()));
    }

    let candidates = [
        PathBuf::from(DEFAULT_DATA_DIR),
        LastUsedParams::app_dir().join(DEFAULT_DATA_DIR),
    ];
    match candidates.iter().find(|p| p.is_dir()) {
        Some(found) => Ok(found.clone()),
        None => {
            tracing::warn!(
                "No data directory found; expected ./{} or {}",
                DEFAULT_DATA_DIR,
                candidates[1].display()
            );
            Ok(PathBuf::from(DEFAULT_DATA_DIR))
        }
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
