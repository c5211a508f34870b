use std::{
    fs::{self, OpenOptions},
    io,
    path::{Path, PathBuf},
};

use thiserror::Error;
use tracing::{info, subscriber::DefaultGuard};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    fmt::{self, writer::BoxMakeWriter},
    layer::SubscriberExt,
    EnvFilter, Registry,
};

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("failed to open log file {}: {source}", .path.display())]
    OpenLogFile { path: PathBuf, source: io::Error },
}

/// Where log records end up. Stdout is never an option: it carries the
/// protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogSink<'a> {
    File(&'a Path),
    Stderr,
    Disabled,
}

impl<'a> LogSink<'a> {
    pub fn select(debug: bool, log_path: &'a str) -> Self {
        let log_path = log_path.trim();
        if !log_path.is_empty() {
            Self::File(Path::new(log_path))
        } else if debug {
            Self::Stderr
        } else {
            Self::Disabled
        }
    }
}

/// Scoped logging handle. The subscriber stays installed for the current
/// thread while the guard lives; dropping it flushes the file writer.
#[must_use = "logging is torn down when the guard is dropped"]
pub struct LogGuard {
    _subscriber: DefaultGuard,
    _writer: Option<WorkerGuard>,
}

pub fn init_logging(debug: bool, log_path: &str) -> Result<LogGuard, LoggingError> {
    let default_level = if debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let sink = LogSink::select(debug, log_path);
    let (writer, worker, ansi) = match sink {
        LogSink::File(path) => {
            let file = open_log_file(path)?;
            let (non_blocking, worker) = tracing_appender::non_blocking(file);
            (Some(BoxMakeWriter::new(non_blocking)), Some(worker), false)
        }
        LogSink::Stderr => (Some(BoxMakeWriter::new(io::stderr)), None, true),
        LogSink::Disabled => (None, None, false),
    };

    let layer = writer.map(|writer| {
        fmt::layer()
            .with_writer(writer)
            .with_ansi(ansi)
            .with_target(false)
            .compact()
    });
    let subscriber = Registry::default().with(filter).with(layer);
    let guard = LogGuard {
        _subscriber: tracing::subscriber::set_default(subscriber),
        _writer: worker,
    };

    let debug_enabled = debug;
    info!(debug = debug_enabled, log_path = %log_path, "logger initialized");
    Ok(guard)
}

fn open_log_file(path: &Path) -> Result<fs::File, LoggingError> {
    let open_error = |source| LoggingError::OpenLogFile {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(open_error)?;
    }

    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(open_error)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selects_sink_from_settings() {
        assert_eq!(
            LogSink::select(false, "/var/log/mcp.log"),
            LogSink::File(Path::new("/var/log/mcp.log"))
        );
        assert_eq!(LogSink::select(true, ""), LogSink::Stderr);
        assert_eq!(LogSink::select(false, "  "), LogSink::Disabled);
    }

    #[test]
    fn file_sink_receives_records_after_guard_drop() {
        let dir = tempfile::tempdir().expect("temp dir");
        let log_path = dir.path().join("nested").join("server.log");
        let log_path_str = log_path.to_str().expect("utf-8 path").to_string();

        let guard = init_logging(false, &log_path_str).expect("logging should init");
        tracing::info!(tool = "greeting/hello", "test record");
        drop(guard);

        let content = fs::read_to_string(&log_path).expect("log file exists");
        assert!(content.contains("logger initialized"));
        assert!(content.contains("test record"));
    }

    #[test]
    fn unwritable_log_path_fails() {
        let dir = tempfile::tempdir().expect("temp dir");
        let result = init_logging(false, dir.path().to_str().expect("utf-8 path"));
        assert!(matches!(result, Err(LoggingError::OpenLogFile { .. })));
    }
}
