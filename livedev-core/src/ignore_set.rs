//! Ignore rules applied to change notifications.
//!
//! Patterns come from the project's `.gitignore` (when present) plus the
//! always-ignored version-control directory. The set is built once at startup
//! and never reloaded.

use std::path::{Path, PathBuf};

use ignore::gitignore::{Gitignore, GitignoreBuilder};

use crate::error::CoreError;

/// Project ignore file read at startup.
pub const IGNORE_FILE: &str = ".gitignore";

/// Pattern appended to every set regardless of the ignore file.
pub const VCS_DIR_PATTERN: &str = ".git";

/// Immutable gitignore matcher rooted at the watched directory.
#[derive(Debug, Clone)]
pub struct IgnoreSet {
    root: PathBuf,
    matcher: Gitignore,
}

impl IgnoreSet {
    /// Load `<root>/.gitignore` (if any) and append the `.git` rule.
    ///
    /// Lines of the ignore file that fail to parse are logged and skipped.
    pub fn load(root: &Path) -> Result<Self, CoreError> {
        let mut builder = GitignoreBuilder::new(root);
        let ignore_file = root.join(IGNORE_FILE);
        if ignore_file.is_file() {
            if let Some(err) = builder.add(&ignore_file) {
                tracing::warn!(
                    path = %ignore_file.display(),
                    error = %err,
                    "skipping unparseable ignore patterns",
                );
            }
        }
        Self::finish(root, builder)
    }

    /// Build a set from in-memory patterns; the `.git` rule is still appended.
    pub fn from_patterns<I, P>(root: &Path, patterns: I) -> Result<Self, CoreError>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<str>,
    {
        let mut builder = GitignoreBuilder::new(root);
        for pattern in patterns {
            builder
                .add_line(None, pattern.as_ref())
                .map_err(|source| build_err(root, source))?;
        }
        Self::finish(root, builder)
    }

    fn finish(root: &Path, mut builder: GitignoreBuilder) -> Result<Self, CoreError> {
        builder
            .add_line(None, VCS_DIR_PATTERN)
            .map_err(|source| build_err(root, source))?;
        let matcher = builder.build().map_err(|source| build_err(root, source))?;
        Ok(Self {
            root: root.to_path_buf(),
            matcher,
        })
    }

    /// Whether `path` (relative to the root, as reported by the watch
    /// service) or any of its parent directories is ignored.
    pub fn ignores(&self, path: impl AsRef<Path>) -> bool {
        let path = path.as_ref();
        // The matcher asserts on rooted paths it cannot strip.
        if path.has_root() && !path.starts_with(&self.root) {
            return false;
        }
        self.matcher
            .matched_path_or_any_parents(path, false)
            .is_ignore()
    }

    /// Number of patterns in the set, including the `.git` rule.
    pub fn len(&self) -> usize {
        self.matcher.num_ignores() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

fn build_err(root: &Path, source: ignore::Error) -> CoreError {
    CoreError::IgnoreBuild {
        root: root.to_path_buf(),
        source,
    }
}
