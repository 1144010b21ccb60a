use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::paths::EXAMPLE_LIVE_PATH;

/// Configuration errors raised while locating Live. Every variant is fatal at
/// startup and its message tells the user how to fix it.
#[derive(Debug, Error)]
pub enum LocateError {
    #[error(
        "Unable to find Ableton Live under {root}. Please use the `--livePath` flag to specify \
         the path of Ableton Live (e.g. `--livePath=\"{}\"`)",
        EXAMPLE_LIVE_PATH
    )]
    InstallationNotFound { root: PathBuf },

    #[error(
        "Found more than one Ableton Live path ({}). Please use the `--livePath` flag to specify \
         the path of Ableton Live (e.g. `--livePath=\"{}\"`)",
        join_paths(.candidates),
        EXAMPLE_LIVE_PATH
    )]
    AmbiguousInstallation { candidates: Vec<PathBuf> },

    #[error(
        "`{path}` does not look like an Ableton Live installation (expected a name like \
         `Ableton Live 12 Suite.app`)"
    )]
    UnrecognizedInstallation { path: PathBuf },

    #[error(
        "No Ableton Live log file found at {pattern}*. Please start Ableton Live at least once \
         and then restart this tool in order to pick up the right Log.txt"
    )]
    LogDirectoryNotFound { pattern: PathBuf },

    #[error("cannot determine home directory; set $HOME or equivalent")]
    HomeNotFound,

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> LocateError {
    LocateError::Io {
        path: path.into(),
        source,
    }
}

fn join_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| format!("`{}`", Path::display(p)))
        .collect::<Vec<_>>()
        .join(", ")
}
