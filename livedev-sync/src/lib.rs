//! # livedev-sync
//!
//! Mirrors the working directory into Live's remote-scripts directory.
//!
//! Copying is delegated to `rsync -r`; this crate only builds the invocation
//! and turns its exit status into a [`MirrorReport`] or a [`SyncError`].

pub mod error;
pub mod mirror;

pub use error::SyncError;
pub use mirror::{Mirror, MirrorReport};
