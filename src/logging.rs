//! Structured logging for voxmemo using the tracing crate.
//!
//! Writes daily-rotated log files under the XDG state directory and never to
//! the terminal, which belongs to the recorder screen. Only the newest
//! `MAX_LOG_FILES` rotated files are kept.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::SystemTime;
use tracing_appender::rolling;
use tracing_subscriber::prelude::*;

/// Base name of the rolling log files, `voxmemo.log.YYYY-MM-DD` on disk.
pub const LOG_FILE_PREFIX: &str = "voxmemo.log";

const MAX_LOG_FILES: usize = 7;

/// Keeps the non-blocking writer alive for the program lifetime.
static APPENDER_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();

/// Initializes the logging system with file-based output.
///
/// Log level is controlled by the RUST_LOG environment variable (defaults to "info").
///
/// # Errors
/// - If the log directory cannot be determined or created
/// - If logging was already initialized
pub fn init_logging() -> anyhow::Result<()> {
    let log_dir = log_dir()?;
    fs::create_dir_all(&log_dir)?;

    if let Err(e) = cleanup_old_logs(&log_dir) {
        eprintln!("Warning: Failed to cleanup old logs: {e}");
    }

    let file_appender = rolling::daily(&log_dir, LOG_FILE_PREFIX);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    APPENDER_GUARD
        .set(guard)
        .map_err(|_| anyhow::anyhow!("Logging already initialized"))?;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_target(true)
                .with_level(true)
                .with_thread_ids(true)
                .with_ansi(false),
        )
        .init();

    tracing::debug!("Logging initialized. Log directory: {}", log_dir.display());
    Ok(())
}

/// Returns the log directory without creating it.
///
/// Prefers `$XDG_STATE_HOME/voxmemo`, otherwise `~/.local/state/voxmemo`.
///
/// # Errors
/// - If the home directory cannot be determined
pub fn log_dir() -> anyhow::Result<PathBuf> {
    if let Ok(xdg_state) = std::env::var("XDG_STATE_HOME") {
        if !xdg_state.is_empty() {
            return Ok(PathBuf::from(xdg_state).join("voxmemo"));
        }
    }
    let home =
        dirs::home_dir().ok_or_else(|| anyhow::anyhow!("Could not determine home directory"))?;
    Ok(home.join(".local").join("state").join("voxmemo"))
}

/// Rotated log files in `log_dir`, newest first.
///
/// # Errors
/// - If the directory cannot be read
pub fn log_files(log_dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let mut files: Vec<(PathBuf, SystemTime)> = fs::read_dir(log_dir)?
        .filter_map(|entry| {
            let path = entry.ok()?.path();
            let file_name = path.file_name()?.to_str()?;
            if !is_rotated_log(file_name) {
                return None;
            }
            let modified = fs::metadata(&path).ok()?.modified().ok()?;
            Some((path, modified))
        })
        .collect();

    files.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| b.0.cmp(&a.0)));
    Ok(files.into_iter().map(|(path, _)| path).collect())
}

fn is_rotated_log(file_name: &str) -> bool {
    file_name
        .strip_prefix(LOG_FILE_PREFIX)
        .and_then(|rest| rest.strip_prefix('.'))
        .is_some_and(|date| date.matches('-').count() == 2)
}

fn cleanup_old_logs(log_dir: &Path) -> anyhow::Result<()> {
    for path in log_files(log_dir)?.iter().skip(MAX_LOG_FILES) {
        if let Err(e) = fs::remove_file(path) {
            tracing::warn!("Failed to delete old log file {}: {}", path.display(), e);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rotated_log_names() {
        assert!(is_rotated_log("voxmemo.log.2026-10-18"));
        assert!(!is_rotated_log("voxmemo.log"));
        assert!(!is_rotated_log("voxmemo.toml"));
        assert!(!is_rotated_log("other.log.2026-10-18"));
    }

    #[test]
    fn test_cleanup_keeps_newest_files() {
        let dir = tempfile::tempdir().unwrap();
        for day in 1..=9 {
            let path = dir.path().join(format!("voxmemo.log.2026-10-{day:02}"));
            fs::write(&path, "line\n").unwrap();
        }
        fs::write(dir.path().join("notes.txt"), "keep").unwrap();

        cleanup_old_logs(dir.path()).unwrap();

        let remaining = log_files(dir.path()).unwrap();
        assert_eq!(remaining.len(), MAX_LOG_FILES);
        assert!(dir.path().join("notes.txt").exists());
    }
}
