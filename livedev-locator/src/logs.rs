//! Log directory selection.
//!
//! Live keeps one preferences directory per installed version
//! (`~/Library/Preferences/Ableton/Live 12.0.5`), each with its own `Log.txt`.
//! The directory matching the installation's major version with the highest
//! full version wins.

use std::path::{Path, PathBuf};

use livedev_core::{parse_version, InstallationPath};

use crate::error::LocateError;
use crate::install::{entries_with_prefix, Locator};
use crate::paths::{INSTALL_PREFIX, LOG_FILE, PREFERENCES_PREFIX};

/// Major version encoded in an installation name (`Ableton Live 12 Suite.app` → `12`).
pub fn major_version(installation: &InstallationPath) -> Result<u32, LocateError> {
    let unrecognized = || LocateError::UnrecognizedInstallation {
        path: installation.as_path().to_path_buf(),
    };

    let name = installation.app_name();
    let rest = name.strip_prefix(INSTALL_PREFIX).ok_or_else(unrecognized)?;
    let digits: String = rest.chars().take_while(char::is_ascii_digit).collect();
    digits.parse().map_err(|_| unrecognized())
}

/// `<dir>/Log.txt`
pub fn log_file(dir: &Path) -> PathBuf {
    dir.join(LOG_FILE)
}

impl Locator {
    /// Pick the preferences directory whose log should be tailed.
    pub fn select_log_directory(
        &self,
        installation: &InstallationPath,
    ) -> Result<PathBuf, LocateError> {
        let major = major_version(installation)?;
        let prefix = format!("{PREFERENCES_PREFIX}{major}");
        let candidates = entries_with_prefix(self.preferences_root(), &prefix)?;

        let mut versioned = Vec::with_capacity(candidates.len());
        for dir in candidates {
            let name = dir
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            match parse_version(&name) {
                Some(version) => versioned.push((version, dir)),
                None => tracing::warn!(
                    path = %dir.display(),
                    "skipping preferences directory without a comparable version",
                ),
            }
        }

        versioned.sort_by(|(a, _), (b, _)| a.cmp(b));
        match versioned.pop() {
            Some((version, dir)) => {
                tracing::debug!(%version, path = %dir.display(), "selected Live log directory");
                Ok(dir)
            }
            None => Err(LocateError::LogDirectoryNotFound {
                pattern: self.preferences_root().join(prefix),
            }),
        }
    }
}
