pub mod paths;
pub mod watch;

use std::path::PathBuf;

use anyhow::{Context, Result};
use livedev_locator::Locator;
use livedev_runtime::{Session, WatchOptions};

/// Resolve a session against the current user's Live locations.
pub(crate) fn prepare_session(options: WatchOptions) -> Result<Session> {
    let locator = Locator::system().context("failed to resolve Live locations")?;
    Session::prepare(options, &locator).context("setup failed")
}

pub(crate) fn home_dir() -> Result<PathBuf> {
    dirs::home_dir().context("could not determine home directory")
}

pub(crate) fn current_dir() -> Result<PathBuf> {
    std::env::current_dir().context("could not determine the current directory")
}
