//! Common test utilities for the rust-fsdiff library

#![allow(dead_code)]

use filetime::{set_file_mtime, FileTime};
use rust_fsdiff::{Event, Op};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::{Duration, SystemTime};
use tempfile::TempDir;

/// Create a temporary directory for testing
pub fn setup_temp_dir() -> TempDir {
	TempDir::new().expect("Failed to create temp directory")
}

/// Create an empty `data` directory inside `temp_dir` with an old mtime
///
/// Kernel timestamps are coarse, so tests pin every mtime they care about to
/// a fixed offset from [`base_time`] instead of relying on wall-clock order.
pub fn tracked_root(temp_dir: &TempDir) -> PathBuf {
	let root = temp_dir.path().join("data");
	std::fs::create_dir(&root).expect("Failed to create tracked root");
	touch_at(&root, 0);
	root
}

/// A point well in the past that pinned mtimes count up from
pub fn base_time() -> SystemTime {
	static BASE: OnceLock<SystemTime> = OnceLock::new();
	*BASE.get_or_init(|| SystemTime::now() - Duration::from_secs(3600))
}

/// Set the mtime of `path` to `step * 10` seconds after [`base_time`]
pub fn touch_at(path: &Path, step: u64) {
	let when = base_time() + Duration::from_secs(step * 10);
	set_file_mtime(path, FileTime::from_system_time(when)).expect("Failed to set mtime");
}

/// Create a test file with content
pub fn create_test_file(path: &Path, content: &str) -> std::io::Result<()> {
	std::fs::write(path, content)
}

/// Reduce events to `(op, path, old_path)` relative to `root`'s parent
pub fn summarize(root: &Path, events: &[Event]) -> Vec<(Op, String, Option<String>)> {
	let base = root.parent().unwrap_or(root);
	let relative = |p: &Path| {
		p.strip_prefix(base)
			.unwrap_or(p)
			.to_string_lossy()
			.into_owned()
	};
	events
		.iter()
		.map(|e| (e.op, relative(&e.path), e.old_path().map(relative)))
		.collect()
}

pub fn event(op: Op, path: &str) -> (Op, String, Option<String>) {
	(op, path.to_string(), None)
}

pub fn rename(old_path: &str, path: &str) -> (Op, String, Option<String>) {
	(Op::Rename, path.to_string(), Some(old_path.to_string()))
}

/// Build a tree under `temp_dir` holding a file whose full path exceeds PATH_MAX
///
/// Every directory stays short enough to open, but the file can only be
/// listed, not stat'ed. It is created in a shallow directory which is then
/// moved to the bottom of a deep chain. Returns `(root, file)`.
#[cfg(target_os = "linux")]
pub fn tree_with_overlong_file(temp_dir: &TempDir) -> (PathBuf, PathBuf) {
	const CHAIN_LEN: usize = 3950;

	let root = temp_dir.path().join("deep");
	let mut chain = root.clone();
	while chain.as_os_str().len() + 201 <= CHAIN_LEN {
		chain.push("d".repeat(200));
	}
	let pad = CHAIN_LEN.saturating_sub(chain.as_os_str().len() + 1);
	if pad > 0 {
		chain.push("p".repeat(pad));
	}
	std::fs::create_dir_all(&chain).expect("Failed to create deep chain");

	let staging = temp_dir.path().join("leaf");
	std::fs::create_dir(&staging).expect("Failed to create staging directory");
	let name = "f".repeat(250);
	create_test_file(&staging.join(&name), "x").expect("Failed to create file");

	let leaf = chain.join("leaf");
	std::fs::rename(&staging, &leaf).expect("Failed to move leaf into chain");
	let file = leaf.join(name);
	assert!(file.as_os_str().len() > 4096);
	(root, file)
}
