//! `livedev watch`: sync, restart and relay on every change.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use livedev_runtime::{ensure_macos, start_blocking, WatchOptions};

use super::{current_dir, home_dir, prepare_session};

/// Arguments for `livedev watch`.
#[derive(Args, Debug)]
pub struct WatchArgs {
    /// Path to the Live application bundle, e.g.
    /// "/Applications/Ableton Live 12 Standard.app".
    #[arg(long = "livePath", alias = "live-path", value_name = "PATH")]
    pub live_path: Option<PathBuf>,

    /// Live set to open after every restart; `~` expands to the home directory.
    #[arg(long = "liveSet", alias = "live-set", value_name = "PATH")]
    pub live_set: Option<PathBuf>,

    /// Script name; defaults to the current directory's name.
    #[arg(long)]
    pub name: Option<String>,
}

impl WatchArgs {
    pub fn run(self) -> Result<()> {
        let home = home_dir()?;
        let options = WatchOptions {
            working_dir: current_dir()?,
            live_path: self.live_path,
            live_set: self.live_set.map(|set| expand_tilde(&set, &home)),
            name: self.name,
        };

        let session = prepare_session(options)?;
        ensure_macos()?;
        start_blocking(session).context("watch exited with error")
    }
}

/// Replace a leading `~` component with `home`.
fn expand_tilde(path: &Path, home: &Path) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => home.join(rest),
        Err(_) => path.to_path_buf(),
    }
}
