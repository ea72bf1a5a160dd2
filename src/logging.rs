//! Structured logging: JSONL to file plus human-readable stderr output.
//!
//! The run summary is the user-facing report and goes to stdout; tracing
//! covers diagnostics only. `RUST_LOG` overrides the default `info` filter.

use std::fs::{self, OpenOptions};
use std::path::PathBuf;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Guard that must be kept alive for the duration of the program.
/// Dropping it flushes and closes the log file.
pub struct LoggingGuard {
    _file_guard: Option<WorkerGuard>,
}

/// Initialize the dual-output logging system.
///
/// Returns a guard that must be kept alive for the duration of the program.
/// When the log directory cannot be created, only the stderr layer is
/// installed.
pub fn init() -> LoggingGuard {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let pretty_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(true)
        .with_target(true)
        .with_level(true)
        .with_thread_ids(false)
        .compact();

    let file = log_dir().and_then(|dir| {
        fs::create_dir_all(&dir).ok()?;
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(dir.join("theme-sync.jsonl"))
            .ok()
    });

    // An Option<Layer> composes as a no-op when None, so both outputs go
    // through a single subscriber stack
    let (json_layer, file_guard) = match file {
        Some(file) => {
            let (non_blocking_file, file_guard) = tracing_appender::non_blocking(file);
            let json_layer = fmt::layer()
                .json()
                .with_writer(non_blocking_file)
                .with_timer(fmt::time::UtcTime::rfc_3339())
                .with_target(true)
                .with_level(true)
                .with_thread_ids(false)
                .with_thread_names(false)
                .with_file(false)
                .with_line_number(false)
                .with_span_events(FmtSpan::NONE);
            (Some(json_layer), Some(file_guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(pretty_layer)
        .init();

    LoggingGuard {
        _file_guard: file_guard,
    }
}


/// Log directory (`<data dir>/theme-sync/logs/`), temp dir as fallback.
fn log_dir() -> Option<PathBuf> {
    dirs::data_local_dir()
        .map(|d| d.join("theme-sync").join("logs"))
        .or_else(|| Some(std::env::temp_dir().join("theme-sync-logs")))
}
