//! Error types for livedev-sync.

use thiserror::Error;

/// All errors that can arise from a mirror run.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The mirror program could not be started at all.
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The mirror program ran but reported failure.
    #[error("{program} exited with {}: {stderr}", exit_label(.code))]
    MirrorFailed {
        program: String,
        code: Option<i32>,
        stderr: String,
    },
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("status {code}"),
        None => "a signal".to_string(),
    }
}
