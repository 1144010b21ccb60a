//! The watch loop: change detection, sync-and-restart cycles, log relay.
//!
//! - [`watchman`]: JSON protocol client for the file-watching service
//! - [`watcher`]: filtered change batches from a subscription
//! - [`tail`] / [`relay`]: following `Log.txt` and printing it
//! - [`restart`]: AppleScript restart of the Live application
//! - [`runtime`]: session setup and the task runtime tying it together

pub mod error;
pub mod relay;
pub mod restart;
pub mod runtime;
pub mod tail;
pub mod watcher;
pub mod watchman;

pub use error::{RuntimeError, WatchmanError};
pub use relay::{LogRelay, PauseGuard, RelayedLine, Resume};
pub use restart::{ensure_macos, restart_script, Restarter};
pub use runtime::{init_tracing, start_blocking, Cycle, LogFollower, Session, WatchOptions};
pub use tail::LogTail;
pub use watcher::{ChangeBatch, ChangeWatcher};
pub use watchman::{ChangeRecord, WatchmanClient};
