use std::path::PathBuf;

use thiserror::Error;

/// Install hint appended to every "watchman is missing" diagnostic.
pub const WATCHMAN_HINT: &str =
    "Please make sure watchman (https://facebook.github.io/watchman) is installed.";

/// Errors talking to the watchman service.
#[derive(Debug, Error)]
pub enum WatchmanError {
    /// The service could not be reached or lacks a required capability.
    #[error("Received the following error when initializing watchman: {message}. {}", WATCHMAN_HINT)]
    Unavailable { message: String },

    #[error("watchman I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("watchman JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The service answered a request with an `error` field.
    #[error("watchman `{command}` failed: {message}")]
    Command { command: String, message: String },

    #[error("watchman closed the connection")]
    Closed,
}

/// Error surface for session setup and the watch loop.
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error(transparent)]
    Locate(#[from] livedev_locator::LocateError),

    #[error(transparent)]
    Core(#[from] livedev_core::CoreError),

    #[error("sync failed: {0}")]
    Sync(#[from] livedev_sync::SyncError),

    #[error(transparent)]
    Watchman(#[from] WatchmanError),

    #[error("restart failed: {0}")]
    Restart(String),

    #[error("cannot derive a script name from {path}; pass --name")]
    ScriptName { path: PathBuf },

    #[error("{0}")]
    Unsupported(String),

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{task} task failed: {message}")]
    Task { task: &'static str, message: String },
}

pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> RuntimeError {
    RuntimeError::Io {
        path: path.into(),
        source,
    }
}
