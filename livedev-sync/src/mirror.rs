//! Directory mirroring through an external program.
//!
//! The default invocation is `rsync -r <source>/ <destination>`; the trailing
//! slash makes rsync copy the *contents* of the source into the destination
//! rather than nesting the source directory inside it.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

use crate::error::SyncError;

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

/// Outcome of a successful mirror run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MirrorReport {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub duration: Duration,
}

// ---------------------------------------------------------------------------
// Mirror
// ---------------------------------------------------------------------------

/// A configured mirror program. Cheap to clone; holds no process state.
#[derive(Debug, Clone)]
pub struct Mirror {
    program: OsString,
    flags: Vec<OsString>,
}

impl Mirror {
    pub fn new<P, I, F>(program: P, flags: I) -> Self
    where
        P: Into<OsString>,
        I: IntoIterator<Item = F>,
        F: Into<OsString>,
    {
        Self {
            program: program.into(),
            flags: flags.into_iter().map(Into::into).collect(),
        }
    }

    /// `rsync -r`, recursive copy without deletion.
    pub fn rsync() -> Self {
        Self::new("rsync", ["-r"])
    }

    pub fn program(&self) -> String {
        self.program.to_string_lossy().into_owned()
    }

    /// Build the command without running it.
    pub fn command(&self, source: &Path, destination: &Path) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.flags)
            .arg(contents_of(source))
            .arg(destination)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());
        cmd
    }

    /// Mirror `source` into `destination`, blocking until the program exits.
    pub fn mirror(&self, source: &Path, destination: &Path) -> Result<MirrorReport, SyncError> {
        let started = Instant::now();
        tracing::debug!(
            program = %self.program(),
            source = %source.display(),
            destination = %destination.display(),
            "starting mirror",
        );

        let output = self
            .command(source, destination)
            .output()
            .map_err(|source| SyncError::Spawn {
                program: self.program(),
                source,
            })?;

        if !output.status.success() {
            return Err(SyncError::MirrorFailed {
                program: self.program(),
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(MirrorReport {
            source: source.to_path_buf(),
            destination: destination.to_path_buf(),
            duration: started.elapsed(),
        })
    }
}

impl Default for Mirror {
    fn default() -> Self {
        Self::rsync()
    }
}

/// `source` with exactly one trailing separator.
fn contents_of(source: &Path) -> OsString {
    let mut arg = source.as_os_str().to_os_string();
    if !arg.to_string_lossy().ends_with('/') {
        arg.push("/");
    }
    arg
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_gets_single_trailing_slash() {
        assert_eq!(contents_of(Path::new("/work/script")), OsString::from("/work/script/"));
        assert_eq!(contents_of(Path::new("/work/script/")), OsString::from("/work/script/"));
    }

    #[test]
    fn rsync_command_is_recursive_contents_copy() {
        let cmd = Mirror::rsync().command(Path::new("/work/script"), Path::new("/dest/Script"));
        assert_eq!(cmd.get_program(), "rsync");
        let args: Vec<_> = cmd.get_args().map(|a| a.to_string_lossy().into_owned()).collect();
        assert_eq!(args, vec!["-r", "/work/script/", "/dest/Script"]);
    }
}
