use thiserror::Error;
use tracing::{error, warn};

/// Domain errors for theme parsing and variable-store sync
#[derive(Error, Debug)]
pub enum SyncError {
    /// The input document is not a JSON object (or failed to decode)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The parser located zero usable modes anywhere in the document
    #[error("Could not locate any schemes in JSON. Expected a theme export with schemes.")]
    NoSchemesFound,

    /// No host integration is present at all
    #[error("Variable store not available. Connect a host store or run the simulation.")]
    HostUnavailable,

    /// A host-store call failed (create/get/set on collections, modes, variables)
    #[error("Host store error: {0}")]
    Host(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SyncError>;

/// Extension trait for best-effort operations whose failures are swallowed.
/// Logs with caller location and returns `None` instead of propagating.
pub trait ResultExt<T> {
    /// Log error and return None. Use for recoverable failures.
    fn log_err(self) -> Option<T>;
    /// Log as warning and return None. Use for expected failures.
    fn warn_on_err(self) -> Option<T>;
}

impl<T, E: std::fmt::Debug> ResultExt<T> for std::result::Result<T, E> {
    #[track_caller]
    fn log_err(self) -> Option<T> {
        match self {
            Ok(value) => Some(value),
            Err(err) => {
                let caller = std::panic::Location::caller();
                error!(
                    error = ?err,
                    file = caller.file(),
                    line = caller.line(),
                    "Operation failed"
                );
                None
            }
        }
    }

    #[track_caller]
    fn warn_on_err(self) -> Option<T> {
        match self {
            Ok(value) => Some(value),
            Err(err) => {
                let caller = std::panic::Location::caller();
                warn!(
                    error = ?err,
                    file = caller.file(),
                    line = caller.line(),
                    "Operation had warning"
                );
                None
            }
        }
    }
}
