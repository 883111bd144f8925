//! Tracing setup for the bridge binary.
//!
//! Logs go to stderr unless `UIA_BRIDGE_LOG` names a file, in which case a
//! non-blocking appender writes plain (uncoloured) lines to it.

use std::io::IsTerminal;
use std::path::Path;
use std::path::PathBuf;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::EnvFilter;

pub const LOG_FILE_ENV: &str = "UIA_BRIDGE_LOG";

const FALLBACK_LEVEL: &str = "info";

/// Where log lines end up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogSink {
    Stderr,
    File(PathBuf),
}

impl LogSink {
    pub fn from_env() -> Self {
        Self::from_value(std::env::var(LOG_FILE_ENV).ok().as_deref())
    }

    fn from_value(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some(path) if !path.is_empty() => LogSink::File(PathBuf::from(path)),
            _ => LogSink::Stderr,
        }
    }

    fn ansi(&self) -> bool {
        matches!(self, LogSink::Stderr) && std::io::stderr().is_terminal()
    }
}

/// Keeps the non-blocking log writer alive; drop it last in `main`.
#[derive(Debug)]
pub struct TelemetryGuard {
    sink: LogSink,
    _guard: Option<WorkerGuard>,
}

impl TelemetryGuard {
    /// The sink actually in use, after any fallback to stderr.
    pub fn sink(&self) -> &LogSink {
        &self.sink
    }
}

/// `RUST_LOG` wins; otherwise `default_level`, or `info` if that does not
/// parse either.
fn env_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new(FALLBACK_LEVEL))
}

fn open_log_file(path: &Path) -> std::io::Result<std::fs::File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::OpenOptions::new().create(true).append(true).open(path)
}

pub fn init_tracing(default_level: &str) -> TelemetryGuard {
    let (writer, guard, sink) = match LogSink::from_env() {
        LogSink::File(path) => match open_log_file(&path) {
            Ok(file) => {
                let (non_blocking, guard) = tracing_appender::non_blocking(file);
                (BoxMakeWriter::new(non_blocking), Some(guard), LogSink::File(path))
            }
            Err(err) => {
                eprintln!(
                    "Warning: cannot write bridge log to {} ({}); logging to stderr",
                    path.display(),
                    err
                );
                (BoxMakeWriter::new(std::io::stderr), None, LogSink::Stderr)
            }
        },
        LogSink::Stderr => (BoxMakeWriter::new(std::io::stderr), None, LogSink::Stderr),
    };

    let installed = tracing_subscriber::fmt()
        .with_env_filter(env_filter(default_level))
        .with_target(false)
        .with_thread_names(true)
        .with_ansi(sink.ansi())
        .with_writer(writer)
        .try_init()
        .is_ok();

    TelemetryGuard {
        sink,
        // A subscriber was already set (tests); nothing to keep alive.
        _guard: if installed { guard } else { None },
    }
}
