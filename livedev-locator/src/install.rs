//! Installation discovery.
//!
//! Mirrors the glob `/Applications/Ableton Live *`: list the install root and
//! keep entries whose name starts with [`INSTALL_PREFIX`]. Exactly one match is
//! required unless the caller supplies an explicit path.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use livedev_core::{InstallationPath, ScriptName};

use crate::error::{io_err, LocateError};
use crate::paths::{self, INSTALL_PREFIX, REMOTE_SCRIPTS_SUBPATH};

/// Roots consulted during discovery.
///
/// [`Locator::system`] uses the real locations; tests build one with
/// [`Locator::new`] pointing at temporary directories.
#[derive(Debug, Clone)]
pub struct Locator {
    install_root: PathBuf,
    preferences_root: PathBuf,
}

impl Locator {
    pub fn new(install_root: impl Into<PathBuf>, preferences_root: impl Into<PathBuf>) -> Self {
        Self {
            install_root: install_root.into(),
            preferences_root: preferences_root.into(),
        }
    }

    /// Locator for the current user (`/Applications`, `~/Library/Preferences/Ableton`).
    pub fn system() -> Result<Self, LocateError> {
        let home = dirs::home_dir().ok_or(LocateError::HomeNotFound)?;
        Ok(Self::for_home(&home))
    }

    pub fn for_home(home: &Path) -> Self {
        Self::new(paths::install_root(), paths::preferences_root(home))
    }

    pub fn install_root(&self) -> &Path {
        &self.install_root
    }

    pub fn preferences_root(&self) -> &Path {
        &self.preferences_root
    }

    /// Resolve the Live installation.
    ///
    /// An override is trusted verbatim, without an existence check.
    pub fn locate_installation(
        &self,
        override_path: Option<&Path>,
    ) -> Result<InstallationPath, LocateError> {
        if let Some(path) = override_path {
            tracing::debug!(path = %path.display(), "using Live path override");
            return Ok(InstallationPath::from(path));
        }

        let mut candidates = entries_with_prefix(&self.install_root, INSTALL_PREFIX)?;
        match candidates.len() {
            0 => Err(LocateError::InstallationNotFound {
                root: self.install_root.clone(),
            }),
            1 => {
                let path = candidates.remove(0);
                tracing::debug!(path = %path.display(), "discovered Live installation");
                Ok(InstallationPath::from(path))
            }
            _ => Err(LocateError::AmbiguousInstallation { candidates }),
        }
    }
}

/// `<installation>/Contents/App-Resources/MIDI Remote Scripts/<script_name>`
pub fn plugin_destination(installation: &InstallationPath, script_name: &ScriptName) -> PathBuf {
    installation
        .as_path()
        .join(REMOTE_SCRIPTS_SUBPATH)
        .join(script_name.as_str())
}

/// Sorted entries of `dir` whose file name starts with `prefix`.
///
/// A missing `dir` yields no entries rather than an error, matching how a
/// glob over a non-existent directory behaves.
pub(crate) fn entries_with_prefix(dir: &Path, prefix: &str) -> Result<Vec<PathBuf>, LocateError> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => return Err(io_err(dir, err)),
    };

    let mut matches = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| io_err(dir, e))?;
        if entry.file_name().to_string_lossy().starts_with(prefix) {
            matches.push(entry.path());
        }
    }
    matches.sort();
    Ok(matches)
}
