use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

// ── Directory bootstrap ────────────────────────────────────────────────────────

/// Ensure the standard `~/.velo-monitor/` directory hierarchy exists.
///
/// Creates the following directories if absent (including any missing parents):
/// - `~/.velo-monitor/`
/// - `~/.velo-monitor/logs/`
pub fn ensure_directories() -> anyhow::Result<()> {
    let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
    let monitor_dir = home.join(".velo-monitor");
    std::fs::create_dir_all(&monitor_dir)?;
    std::fs::create_dir_all(monitor_dir.join("logs"))?;
    Ok(())
}

// ── Logging bootstrap ──────────────────────────────────────────────────────────

/// Initialise the global `tracing` subscriber.
///
/// `log_level` is mapped to a [`tracing_subscriber::EnvFilter`] directive.
/// Falls back to `"info"` if the level string is not recognised.
///
/// The `log_file` parameter is accepted for forward-compatibility but file
/// logging is not yet wired – all output currently goes to stderr.
pub fn setup_logging(log_level: &str, _log_file: Option<&PathBuf>) -> anyhow::Result<()> {
    // Map config level names to tracing level names (tracing uses lowercase).
    let upper = log_level.to_uppercase();
    let normalised = match upper.as_str() {
        "DEBUG" => "debug",
        "INFO" => "info",
        "WARNING" => "warn",
        "ERROR" => "error",
        other => other,
    };

    let filter = EnvFilter::try_new(normalised).unwrap_or_else(|_| EnvFilter::new("info"));

    let subscriber = fmt::layer().with_target(false).with_thread_ids(false);

    tracing_subscriber::registry()
        .with(filter)
        .with(subscriber)
        .init();

    Ok(())
}

// ── Data-path discovery ────────────────────────────────────────────────────────

/// Attempt to locate the bicycle-count dataset on the local system.
///
/// Checks the following paths in order and returns the first that exists:
/// 1. `./monthly_bicycle_data.csv` (the original export name)
/// 2. `./data/`
/// 3. the current directory, when it contains at least one CSV file
///
/// Returns `None` when nothing is found; the `--data` flag overrides this
/// lookup entirely.
pub fn discover_data_path() -> Option<PathBuf> {
    discover_data_path_in(&PathBuf::from("."))
}

/// Same as [`discover_data_path`] but rooted at `base_dir` (used for
/// testing).
pub fn discover_data_path_in(base_dir: &std::path::Path) -> Option<PathBuf> {
    let named_export = base_dir.join("monthly_bicycle_data.csv");
    if named_export.is_file() {
        return Some(named_export);
    }

    let data_dir = base_dir.join("data");
    if data_dir.is_dir() {
        return Some(data_dir);
    }

    if !velo_data::reader::find_csv_files(base_dir).is_empty() {
        return Some(base_dir.to_path_buf());
    }

    None
}

// ── Tests ──────────────────────────────────────────────────────────────────────
