//! Logging setup built on `tracing` and `tracing-subscriber`.
//!
//! The TUI owns stdout/stderr while it runs, so events go to a file instead.
//! `RUST_LOG` overrides the level picked from `-v` flags. Cell values are
//! never logged; only table names, counts and row positions.

use std::fs::{self, OpenOptions};
use std::io;
use std::path::Path;
use std::sync::Mutex;

use tracing::Level;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::EnvFilter;

/// Map `-v` occurrences to a level: none is info, one is debug, more is trace.
pub fn level_from_verbosity(verbosity: u8) -> Level {
    match verbosity {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

/// Install the global subscriber, appending to `log_file`. Call once at
/// startup; the parent directory is created when missing. Fails if a global
/// subscriber is already installed.
pub fn init_logging(log_file: &Path, verbosity: u8) -> io::Result<()> {
    if let Some(parent) = log_file.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let file = OpenOptions::new().create(true).append(true).open(log_file)?;
    init_logging_with_writer(verbosity, Mutex::new(file)).map_err(io::Error::other)
}

/// Install the global subscriber with a custom writer. Returns the error from
/// `try_init` when a subscriber is already in place.
pub fn init_logging_with_writer<W>(verbosity: u8, writer: W) -> Result<(), TryInitError>
where
    W: for<'writer> MakeWriter<'writer> + Send + Sync + 'static,
{
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(level_from_verbosity(verbosity)).into())
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .with_target(false)
        .finish()
        .try_init()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_maps_to_levels() {
        assert_eq!(level_from_verbosity(0), Level::INFO);
        assert_eq!(level_from_verbosity(1), Level::DEBUG);
        assert_eq!(level_from_verbosity(4), Level::TRACE);
    }

    #[test]
    fn creates_log_file_and_parent_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("viewer.log");

        // Another test may have installed the subscriber first; the file is
        // created either way.
        let _ = init_logging(&path, 0);
        tracing::info!("logging ready");
        assert!(path.exists());
    }

    #[test]
    fn second_install_reports_an_error() {
        let _ = init_logging_with_writer(0, io::sink);
        assert!(init_logging_with_writer(1, io::sink).is_err());
    }
}
