//! Discovery of the Live installation and its preferences/log directory.
//!
//! [`Locator`] answers two questions at startup: which application bundle to
//! sync into and restart, and which `Log.txt` to tail.

mod error;
pub mod install;
pub mod logs;
pub mod paths;

pub use error::LocateError;
pub use install::{plugin_destination, Locator};
pub use logs::{log_file, major_version};
