//! Tracing subscriber setup for the binary.

use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// File name of the run log started at `started`.
pub fn run_log_name(started: DateTime<Local>) -> String {
    format!("run_{}.log", started.format("%Y%m%d_%H%M%S"))
}

/// Create `log_dir` if needed and open a fresh run log inside it.
pub fn open_run_log(log_dir: &Path, started: DateTime<Local>) -> Result<(File, PathBuf)> {
    fs::create_dir_all(log_dir)
        .with_context(|| format!("failed to create log directory {}", log_dir.display()))?;
    let path = log_dir.join(run_log_name(started));
    let file = File::create(&path)
        .with_context(|| format!("failed to create log file {}", path.display()))?;
    Ok((file, path))
}

/// Install the global subscriber.
///
/// Events go to stderr and, when `log_dir` is given, also to a fresh
/// `run_YYYYmmdd_HHMMSS.log` inside it. The binary always passes the
/// resolved directory (`logs` unless configured). `RUST_LOG` overrides the default
/// `info` level. Returns the log file path, if one was opened.
pub fn init_logging(log_dir: Option<&Path>) -> Result<Option<PathBuf>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let stderr_layer = fmt::layer().with_writer(std::io::stderr).with_target(false);

    let (file_layer, log_path) = match log_dir {
        Some(dir) => {
            let (file, path) = open_run_log(dir, Local::now())?;
            let layer = fmt::layer()
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .with_target(false);
            (Some(layer), Some(path))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .context("failed to install tracing subscriber")?;

    Ok(log_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn run_log_name_is_second_resolution_timestamp() {
        let started = Local.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();
        assert_eq!(run_log_name(started), "run_20240309_140507.log");
    }

    #[test]
    fn run_log_is_created_under_missing_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("logs");
        let started = Local.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap();
        let (_file, path) = open_run_log(&dir, started).unwrap();
        assert_eq!(path, dir.join("run_20250102_030405.log"));
        assert!(path.is_file());
    }
}
