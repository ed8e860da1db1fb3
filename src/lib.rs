//! Polling filesystem differ
//!
//! Captures a directory tree as a [`Snapshot`], and on each poll diffs a fresh
//! snapshot against the previous one to produce create, write, remove and
//! rename [`Event`]s. Renames are recognised by file identity (device and
//! inode), so no OS notification API is involved.

mod config;
mod diff;
mod differ;
mod error;
mod events;
mod snapshot;

pub use config::DifferConfig;
pub use diff::diff;
pub use differ::{Differ, DifferStats};
pub use error::{DifferError, Result};
pub use events::{op_label, sort_events, Event, Op};
pub use snapshot::{FileId, FileIdentity, Snapshot};
