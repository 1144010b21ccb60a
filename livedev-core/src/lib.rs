//! livedev core library: version normalization, ignore rules, domain types.
//!
//! - [`version`]: completing partial dotted versions and ordering them
//! - [`ignore_set`]: gitignore-backed filter for change notifications
//! - [`types`]: newtypes shared by the other crates
//! - [`error`]: [`CoreError`]

pub mod error;
pub mod ignore_set;
pub mod types;
pub mod version;

pub use error::CoreError;
pub use ignore_set::IgnoreSet;
pub use types::{InstallationPath, ScriptName};
pub use version::{complete_version, parse_version, trailing_version, LiveVersion};
