//! Forwarding Live's log lines to the console.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use colored::Colorize;
use livedev_core::ScriptName;

/// A log line accepted for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayedLine {
    /// The line mentions the script being developed.
    Highlighted(String),
    Plain(String),
}

impl RelayedLine {
    pub fn text(&self) -> &str {
        match self {
            RelayedLine::Highlighted(line) | RelayedLine::Plain(line) => line,
        }
    }

    pub fn render(&self) -> String {
        match self {
            RelayedLine::Highlighted(line) => line.blue().to_string(),
            RelayedLine::Plain(line) => line.clone(),
        }
    }
}

/// Decides which log lines reach the console and how they look.
///
/// Clones share one pause state, so a sync cycle holding a [`PauseGuard`]
/// silences the tail task until the guard drops. Each drop also records a
/// [`Resume`] so the tail can skip whatever was written during the pause.
#[derive(Debug, Clone)]
pub struct LogRelay {
    pause: Arc<PauseState>,
    log_file: Option<Arc<PathBuf>>,
    pattern: String,
}

#[derive(Debug, Default)]
struct PauseState {
    paused: AtomicBool,
    resumes: AtomicU64,
    /// Log length when the last pause ended; `u64::MAX` when unknown.
    resume_offset: AtomicU64,
}

/// Where relaying picks up after the most recent pause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resume {
    /// Increments once per dropped [`PauseGuard`].
    pub epoch: u64,
    /// Log length at the moment the pause ended, when the log was readable.
    pub offset: Option<u64>,
}

impl LogRelay {
    pub fn new(script: &ScriptName) -> Self {
        Self {
            pause: Arc::new(PauseState::default()),
            log_file: None,
            pattern: script.as_str().to_string(),
        }
    }

    /// Record the length of `path` whenever a pause ends.
    pub fn with_log_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.log_file = Some(Arc::new(path.into()));
        self
    }

    pub fn is_paused(&self) -> bool {
        self.pause.paused.load(Ordering::SeqCst)
    }

    pub fn resume(&self) -> Resume {
        let epoch = self.pause.resumes.load(Ordering::SeqCst);
        let offset = self.pause.resume_offset.load(Ordering::SeqCst);
        Resume {
            epoch,
            offset: (offset != u64::MAX).then_some(offset),
        }
    }

    /// Suppress relaying until the returned guard is dropped.
    pub fn pause(&self) -> PauseGuard {
        self.pause.paused.store(true, Ordering::SeqCst);
        PauseGuard {
            pause: Arc::clone(&self.pause),
            log_file: self.log_file.clone(),
        }
    }

    /// `None` while paused; otherwise the line, highlighted when it contains
    /// the script name.
    pub fn relay(&self, line: &str) -> Option<RelayedLine> {
        if self.is_paused() {
            return None;
        }
        if !self.pattern.is_empty() && line.contains(&self.pattern) {
            Some(RelayedLine::Highlighted(line.to_string()))
        } else {
            Some(RelayedLine::Plain(line.to_string()))
        }
    }
}

/// Clears the relay's pause flag on drop, including on early error returns.
#[derive(Debug)]
pub struct PauseGuard {
    pause: Arc<PauseState>,
    log_file: Option<Arc<PathBuf>>,
}

impl Drop for PauseGuard {
    fn drop(&mut self) {
        let offset = self
            .log_file
            .as_deref()
            .and_then(|path| log_len(path))
            .unwrap_or(u64::MAX);
        // Offset first: a reader that sees the new epoch must see its offset.
        self.pause.resume_offset.store(offset, Ordering::SeqCst);
        self.pause.resumes.fetch_add(1, Ordering::SeqCst);
        self.pause.paused.store(false, Ordering::SeqCst);
    }
}

fn log_len(path: &Path) -> Option<u64> {
    match std::fs::metadata(path) {
        Ok(meta) => Some(meta.len()),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Some(0),
        Err(_) => None,
    }
}
