//! Follow a log file from its current end.
//!
//! Only lines appended after [`LogTail::open`] are reported. A file that
//! shrinks (Live truncates `Log.txt` on startup) or disappears is read again
//! from the beginning once it has content.

use std::io::{self, SeekFrom};
use std::path::{Path, PathBuf};

use tokio::io::{AsyncReadExt, AsyncSeekExt};

#[derive(Debug)]
pub struct LogTail {
    path: PathBuf,
    offset: u64,
    /// Bytes after the last newline, held back until the line completes.
    partial: Vec<u8>,
}

impl LogTail {
    /// Start tailing at the current end of `path`, or at 0 if it is missing.
    pub async fn open(path: impl Into<PathBuf>) -> io::Result<Self> {
        let path = path.into();
        let offset = match tokio::fs::metadata(&path).await {
            Ok(meta) => meta.len(),
            Err(err) if err.kind() == io::ErrorKind::NotFound => 0,
            Err(err) => return Err(err),
        };
        tracing::debug!(path = %path.display(), offset, "log tail opened");
        Ok(Self {
            path,
            offset,
            partial: Vec::new(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Complete lines appended since the previous call, without terminators.
    pub async fn read_lines(&mut self) -> io::Result<Vec<String>> {
        let len = match tokio::fs::metadata(&self.path).await {
            Ok(meta) => meta.len(),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                self.reset();
                return Ok(Vec::new());
            }
            Err(err) => return Err(err),
        };

        if len < self.offset {
            tracing::debug!(path = %self.path.display(), "log file truncated, rereading");
            self.reset();
        }
        if len == self.offset {
            return Ok(Vec::new());
        }

        let mut file = tokio::fs::File::open(&self.path).await?;
        file.seek(SeekFrom::Start(self.offset)).await?;
        let mut chunk = Vec::new();
        let read = file.read_to_end(&mut chunk).await?;
        self.offset += read as u64;

        self.partial.extend_from_slice(&chunk);
        Ok(self.drain_complete_lines())
    }

    /// Drop any held partial line and continue from `offset`, or from the
    /// current end when `offset` is `None`. An offset past the end means the
    /// file was truncated since, so reading restarts from the beginning.
    pub async fn skip_to(&mut self, offset: Option<u64>) -> io::Result<()> {
        let len = match tokio::fs::metadata(&self.path).await {
            Ok(meta) => meta.len(),
            Err(err) if err.kind() == io::ErrorKind::NotFound => 0,
            Err(err) => return Err(err),
        };
        self.offset = match offset {
            Some(offset) if offset <= len => offset,
            Some(_) => 0,
            None => len,
        };
        self.partial.clear();
        Ok(())
    }

    fn reset(&mut self) {
        self.offset = 0;
        self.partial.clear();
    }

    fn drain_complete_lines(&mut self) -> Vec<String> {
        let Some(last_newline) = self.partial.iter().rposition(|b| *b == b'\n') else {
            return Vec::new();
        };
        let complete: Vec<u8> = self.partial.drain(..=last_newline).collect();
        complete[..last_newline]
            .split(|b| *b == b'\n')
            .map(|line| {
                let line = line.strip_suffix(b"\r").unwrap_or(line);
                String::from_utf8_lossy(line).into_owned()
            })
            .collect()
    }
}
