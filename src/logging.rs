//! Logger setup: a terse stderr layer plus an append-only log file.

use anyhow::{Context, Result};
use std::fs::{self, File, OpenOptions};
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, registry};

/// Stderr level for `-v` repetitions: WARN, INFO, then DEBUG.
pub fn stderr_level(verbosity: u8) -> LevelFilter {
    match verbosity {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        _ => LevelFilter::DEBUG,
    }
}

fn open_log(path: &Path) -> Result<File> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("failed to open log file {}", path.display()))
}

/// Install the global subscriber. The log file always records INFO and up;
/// if it cannot be opened, logging continues on stderr only.
pub fn init_logging(verbosity: u8, log_file: &Path) -> Result<()> {
    let stderr = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .with_filter(stderr_level(verbosity));

    let (file, open_err) = match open_log(log_file) {
        Ok(f) => (
            Some(
                fmt::layer()
                    .with_writer(Mutex::new(f))
                    .with_ansi(false)
                    .with_filter(LevelFilter::INFO),
            ),
            None,
        ),
        Err(e) => (None, Some(e)),
    };

    registry()
        .with(stderr)
        .with(file)
        .try_init()
        .context("failed to install logger")?;

    if let Some(e) = open_err {
        tracing::warn!("{:#}; logging to stderr only", e);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_raises_stderr_level() {
        assert_eq!(stderr_level(0), LevelFilter::WARN);
        assert_eq!(stderr_level(1), LevelFilter::INFO);
        assert_eq!(stderr_level(2), LevelFilter::DEBUG);
        assert_eq!(stderr_level(9), LevelFilter::DEBUG);
    }

    #[test]
    fn log_file_is_created_with_parents() {
        let td = tempfile::tempdir().unwrap();
        let path = td.path().join("nested/dir/contrib-art.log");
        open_log(&path).unwrap();
        assert!(path.exists());
    }
}
