use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Name of the per-user state directory under `$HOME`.
pub const APP_DIR: &str = ".billing-consolidator";

// ── Directory bootstrap ────────────────────────────────────────────────────────

/// Root of the per-user state directory.
pub fn app_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
}

/// Ensure `~/.billing-consolidator/` with its `logs/` and `reports/`
/// subdirectories exists.
pub fn ensure_directories() -> anyhow::Result<()> {
    let root = app_dir();
    std::fs::create_dir_all(&root)?;
    std::fs::create_dir_all(root.join("logs"))?;
    std::fs::create_dir_all(root.join("reports"))?;
    Ok(())
}

// ── Logging bootstrap ──────────────────────────────────────────────────────────

/// Map a CLI level name to a tracing filter directive. Unknown names map to
/// `"info"`.
pub fn filter_directive(log_level: &str) -> &'static str {
    match log_level.to_uppercase().as_str() {
        "DEBUG" => "debug",
        "INFO" => "info",
        "WARNING" | "WARN" => "warn",
        "ERROR" => "error",
        _ => "info",
    }
}

/// Initialise the global `tracing` subscriber, writing to stderr.
///
/// `log_file` is accepted but not wired yet.
pub fn setup_logging(log_level: &str, _log_file: Option<&PathBuf>) -> anyhow::Result<()> {
    let filter = EnvFilter::try_new(filter_directive(log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let layer = fmt::layer()
        .with_target(false)
        .with_thread_ids(false)
        .with_writer(std::io::stderr);

    tracing_subscriber::registry().with(filter).with(layer).init();

    Ok(())
}

// ── Tests ──────────────────────────────────────────────────────────────────────
