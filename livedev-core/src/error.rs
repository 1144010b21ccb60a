//! Error types for livedev-core.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can arise while building core values.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The ignore matcher could not be built from the collected patterns.
    #[error("failed to build ignore rules for {root}: {source}")]
    IgnoreBuild {
        root: PathBuf,
        #[source]
        source: ignore::Error,
    },
}
