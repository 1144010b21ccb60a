//! Domain newtypes shared across the livedev crates.
//!
//! Both values are resolved once at startup and never change afterwards.

use std::fmt;
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// ScriptName
// ---------------------------------------------------------------------------

/// Name under which the control-surface script appears inside Live.
///
/// Used as the destination directory name and as the highlight pattern for
/// relayed log lines.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ScriptName(pub String);

impl ScriptName {
    /// Derive the script name from a working directory's base name.
    ///
    /// Returns `None` for paths without a final component (e.g. `/`).
    pub fn from_dir(dir: &Path) -> Option<Self> {
        dir.file_name()
            .map(|name| Self(name.to_string_lossy().into_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ScriptName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for ScriptName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ScriptName {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ---------------------------------------------------------------------------
// InstallationPath
// ---------------------------------------------------------------------------

/// Absolute path to the Live application bundle, e.g.
/// `/Applications/Ableton Live 12 Suite.app`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InstallationPath(pub PathBuf);

impl InstallationPath {
    pub fn as_path(&self) -> &Path {
        &self.0
    }

    /// Base name of the bundle, which is also the name AppleScript knows the
    /// application by.
    pub fn app_name(&self) -> String {
        self.0
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.0.display().to_string())
    }
}

impl fmt::Display for InstallationPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.display().fmt(f)
    }
}

impl From<PathBuf> for InstallationPath {
    fn from(path: PathBuf) -> Self {
        Self(path)
    }
}

impl From<&Path> for InstallationPath {
    fn from(path: &Path) -> Self {
        Self(path.to_path_buf())
    }
}

impl AsRef<Path> for InstallationPath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
