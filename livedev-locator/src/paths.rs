use std::path::{Path, PathBuf};

/// Directory scanned for Live application bundles.
pub const INSTALL_ROOT: &str = "/Applications";

/// Name prefix of Live bundles inside [`INSTALL_ROOT`] (`Ableton Live 12 Suite.app`).
pub const INSTALL_PREFIX: &str = "Ableton Live ";

/// Bundle-relative directory holding control-surface scripts.
pub const REMOTE_SCRIPTS_SUBPATH: &str = "Contents/App-Resources/MIDI Remote Scripts";

/// Name prefix of per-version preference directories (`Live 12.0.5`).
pub const PREFERENCES_PREFIX: &str = "Live ";

pub const LOG_FILE: &str = "Log.txt";

pub const EXAMPLE_LIVE_PATH: &str = "/Applications/Ableton Live 12 Standard.app";

pub fn install_root() -> PathBuf {
    PathBuf::from(INSTALL_ROOT)
}

/// `<home>/Library/Preferences/Ableton`
pub fn preferences_root(home: &Path) -> PathBuf {
    home.join("Library").join("Preferences").join("Ableton")
}
