//! `livedev paths`: show what `watch` would use, without watching.

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use livedev_runtime::{Session, WatchOptions};

use super::{current_dir, prepare_session};

/// Arguments for `livedev paths`.
#[derive(Args, Debug)]
pub struct PathsArgs {
    /// Path to the Live application bundle.
    #[arg(long = "livePath", alias = "live-path", value_name = "PATH")]
    pub live_path: Option<PathBuf>,

    /// Script name; defaults to the current directory's name.
    #[arg(long)]
    pub name: Option<String>,
}

impl PathsArgs {
    pub fn run(self) -> Result<()> {
        let session = prepare_session(WatchOptions {
            working_dir: current_dir()?,
            live_path: self.live_path,
            live_set: None,
            name: self.name,
        })?;

        println!("{:<14}{}", "script", session.script.as_str().green());
        for (label, path) in describe(&session) {
            println!("{:<14}{}", label, path.display());
        }
        Ok(())
    }
}

/// Resolved locations, labelled for display.
fn describe(session: &Session) -> [(&'static str, &Path); 3] {
    [
        ("installation", session.installation.as_path()),
        ("destination", session.destination.as_path()),
        ("log file", session.log_file.as_path()),
    ]
}
