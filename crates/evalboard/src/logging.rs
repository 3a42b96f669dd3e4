#![forbid(unsafe_code)]

//! Log setup.
//!
//! The terminal belongs to the UI, so log lines go to a daily rolling file.
//! `RUST_LOG` controls the filter; it defaults to `info`.

use std::path::{Path, PathBuf};

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use crate::error::{AppError, AppResult};

pub const LOG_FILE_PREFIX: &str = "evalboard.log";

/// Keeps the background writer alive. Drop it last so buffered lines flush.
#[derive(Debug)]
pub struct LogGuard {
    _worker: WorkerGuard,
    dir: PathBuf,
}

impl LogGuard {
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

/// Install the global subscriber writing into `dir`.
pub fn init(dir: &Path, json: bool) -> AppResult<LogGuard> {
    std::fs::create_dir_all(dir)?;
    let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
    let (writer, worker) = tracing_appender::non_blocking(appender);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .with_target(true);
    let installed = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    installed.map_err(|e| AppError::Logging(e.to_string()))?;

    Ok(LogGuard {
        _worker: worker,
        dir: dir.to_path_buf(),
    })
}

/// Log directory for a state file: a `logs` folder next to it.
pub fn default_dir(state_file: &Path) -> PathBuf {
    state_file
        .parent()
        .map_or_else(|| PathBuf::from("logs"), |parent| parent.join("logs"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_dir_sits_next_to_state() {
        assert_eq!(
            default_dir(Path::new("/var/lib/evalboard/state.json")),
            PathBuf::from("/var/lib/evalboard/logs")
        );
    }

    #[test]
    fn init_creates_directory() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let dir = tmp.path().join("nested").join("logs");
        // A subscriber may already be installed by another test; the
        // directory is created either way.
        let _ = init(&dir, false);
        assert!(dir.is_dir());
    }
}
