//! Point-in-time capture of a directory tree
//!
//! A [`Snapshot`] maps every visited path to the metadata needed to diff it
//! later: modification time, whether it is a directory, and a platform file
//! identity used to recognise renames.

use crate::error::{DifferError, Result};
use std::collections::HashMap;
use std::fs::{self, Metadata};
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{debug, trace};
use walkdir::WalkDir;

/// Identity of the underlying file object (device + inode)
///
/// Two entries carry equal ids only if they refer to the same file at capture
/// time. Platforms without inode numbers produce no id at all, and entries
/// without an id are never considered renames of each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FileId {
	device: u64,
	inode: u64,
}

impl FileId {
	pub fn new(device: u64, inode: u64) -> Self {
		Self { device, inode }
	}

	pub fn device(&self) -> u64 {
		self.device
	}

	pub fn inode(&self) -> u64 {
		self.inode
	}

	/// Read the id out of already fetched metadata
	pub fn from_metadata(metadata: &Metadata) -> Option<Self> {
		#[cfg(unix)]
		{
			use std::os::unix::fs::MetadataExt;
			Some(Self::new(metadata.dev(), metadata.ino()))
		}

		#[cfg(not(unix))]
		{
			let _ = metadata;
			None
		}
	}
}

/// Metadata captured for a single path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileIdentity {
	pub path: PathBuf,
	pub modified: SystemTime,
	pub id: Option<FileId>,
	pub is_dir: bool,
	/// Length in bytes, regular files only
	pub size: Option<u64>,
}

impl FileIdentity {
	pub fn new(path: impl Into<PathBuf>, modified: SystemTime, id: Option<FileId>) -> Self {
		Self {
			path: path.into(),
			modified,
			id,
			is_dir: false,
			size: None,
		}
	}

	pub fn directory(mut self) -> Self {
		self.is_dir = true;
		self.size = None;
		self
	}

	pub fn with_size(mut self, size: u64) -> Self {
		self.size = Some(size);
		self
	}

	/// Build an identity from metadata that was read without following symlinks
	pub fn from_metadata(path: PathBuf, metadata: &Metadata) -> Result<Self> {
		let modified = metadata
			.modified()
			.map_err(|e| DifferError::filesystem("read modification time", &path, &e))?;

		Ok(FileIdentity {
			id: FileId::from_metadata(metadata),
			is_dir: metadata.is_dir(),
			size: if metadata.is_file() {
				Some(metadata.len())
			} else {
				None
			},
			modified,
			path,
		})
	}

	/// Whether both entries refer to the same underlying file object
	pub fn same_file(&self, other: &FileIdentity) -> bool {
		matches!((self.id, other.id), (Some(a), Some(b)) if a == b)
	}
}

/// Mapping from path to [`FileIdentity`], built once and never mutated
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
	root: PathBuf,
	recursive: bool,
	entries: HashMap<PathBuf, FileIdentity>,
}

impl Snapshot {
	/// Capture the state of `root`
	///
	/// With `recursive` the whole subtree is walked and the root itself is
	/// included. Otherwise only the immediate children of `root` are listed.
	/// Any failure discards everything gathered so far.
	pub fn capture(root: &Path, recursive: bool) -> Result<Self> {
		let mut entries = HashMap::new();

		if recursive {
			Self::walk_tree(root, &mut entries)?;
		} else {
			Self::list_children(root, &mut entries)?;
		}

		debug!(
			"Captured snapshot of {:?} (recursive: {}, entries: {})",
			root,
			recursive,
			entries.len()
		);

		Ok(Self {
			root: root.to_path_buf(),
			recursive,
			entries,
		})
	}

	/// Assemble a snapshot from identities gathered elsewhere
	///
	/// A later identity with the same path replaces an earlier one.
	pub fn from_entries(
		root: impl Into<PathBuf>, recursive: bool, entries: impl IntoIterator<Item = FileIdentity>,
	) -> Self {
		Self {
			root: root.into(),
			recursive,
			entries: entries
				.into_iter()
				.map(|identity| (identity.path.clone(), identity))
				.collect(),
		}
	}

	fn walk_tree(root: &Path, entries: &mut HashMap<PathBuf, FileIdentity>) -> Result<()> {
		for entry in WalkDir::new(root).follow_links(false) {
			let entry = entry.map_err(|e| Self::walk_error(root, &e))?;
			let metadata = entry
				.metadata()
				.map_err(|e| Self::stat_error(entry.path(), &e))?;

			trace!("Visited {}", entry.path().display());
			let identity = FileIdentity::from_metadata(entry.into_path(), &metadata)?;
			entries.insert(identity.path.clone(), identity);
		}
		Ok(())
	}

	fn list_children(root: &Path, entries: &mut HashMap<PathBuf, FileIdentity>) -> Result<()> {
		let dir = fs::read_dir(root)
			.map_err(|e| DifferError::filesystem("open root directory", root, &e))?;

		for entry in dir {
			let entry =
				entry.map_err(|e| DifferError::filesystem("read directory entry", root, &e))?;
			let path = root.join(entry.file_name());
			let metadata = entry
				.metadata()
				.map_err(|e| DifferError::filesystem("read metadata", &path, &e))?;

			trace!("Visited {}", path.display());
			let identity = FileIdentity::from_metadata(path, &metadata)?;
			entries.insert(identity.path.clone(), identity);
		}
		Ok(())
	}

	fn walk_error(root: &Path, err: &walkdir::Error) -> DifferError {
		let operation = if err.depth() == 0 {
			"open root directory"
		} else {
			"walk file system"
		};
		DifferError::FilesystemError {
			operation: operation.to_string(),
			path: err.path().unwrap_or(root).display().to_string(),
			cause: err.to_string(),
			error_code: err.io_error().and_then(|e| e.raw_os_error()),
		}
	}

	fn stat_error(path: &Path, err: &walkdir::Error) -> DifferError {
		match err.io_error() {
			Some(io_err) => DifferError::filesystem("read metadata", path, io_err),
			None => DifferError::FilesystemError {
				operation: "read metadata".to_string(),
				path: path.display().to_string(),
				cause: err.to_string(),
				error_code: None,
			},
		}
	}

	pub fn root(&self) -> &Path {
		&self.root
	}

	pub fn is_recursive(&self) -> bool {
		self.recursive
	}

	pub fn get(&self, path: &Path) -> Option<&FileIdentity> {
		self.entries.get(path)
	}

	pub fn contains(&self, path: &Path) -> bool {
		self.entries.contains_key(path)
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	/// Iterate over all entries in no particular order
	pub fn iter(&self) -> impl Iterator<Item = (&PathBuf, &FileIdentity)> {
		self.entries.iter()
	}

	pub fn paths(&self) -> impl Iterator<Item = &PathBuf> {
		self.entries.keys()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use tempfile::TempDir;

	fn sample_tree() -> TempDir {
		let temp_dir = TempDir::new().expect("Failed to create temp directory");
		let root = temp_dir.path();
		fs::create_dir(root.join("subdir")).unwrap();
		fs::write(root.join("file1.txt"), "content1").unwrap();
		fs::write(root.join("subdir").join("file2.txt"), "content2").unwrap();
		temp_dir
	}

	#[test]
	fn test_non_recursive_lists_one_level() {
		let temp_dir = sample_tree();
		let root = temp_dir.path();

		let snap = Snapshot::capture(root, false).expect("Failed to capture");

		assert_eq!(snap.len(), 2);
		assert!(!snap.contains(root));
		assert!(snap.contains(&root.join("file1.txt")));
		assert!(snap.contains(&root.join("subdir")));
		assert!(!snap.contains(&root.join("subdir").join("file2.txt")));
		assert!(!snap.is_recursive());
	}

	#[test]
	fn test_recursive_includes_root_and_descendants() {
		let temp_dir = sample_tree();
		let root = temp_dir.path();

		let snap = Snapshot::capture(root, true).expect("Failed to capture");

		assert_eq!(snap.len(), 4);
		assert!(snap.get(root).unwrap().is_dir);
		assert!(snap.contains(&root.join("subdir").join("file2.txt")));
		assert!(snap.is_recursive());
		assert_eq!(snap.root(), root);
	}

	#[test]
	fn test_identity_metadata() {
		let temp_dir = sample_tree();
		let root = temp_dir.path();
		let snap = Snapshot::capture(root, false).unwrap();

		let file = snap.get(&root.join("file1.txt")).unwrap();
		assert!(!file.is_dir);
		assert_eq!(file.size, Some(8));

		let dir = snap.get(&root.join("subdir")).unwrap();
		assert!(dir.is_dir);
		assert_eq!(dir.size, None);

		#[cfg(unix)]
		{
			assert!(file.id.is_some());
			assert_ne!(file.id, dir.id);
		}
	}

	#[cfg(unix)]
	#[test]
	fn test_identity_survives_rename() {
		let temp_dir = sample_tree();
		let root = temp_dir.path();
		let before = Snapshot::capture(root, false).unwrap();

		fs::rename(root.join("file1.txt"), root.join("renamed.txt")).unwrap();
		let after = Snapshot::capture(root, false).unwrap();

		let old = before.get(&root.join("file1.txt")).unwrap();
		let new = after.get(&root.join("renamed.txt")).unwrap();
		assert!(old.same_file(new));
	}

	#[test]
	fn test_missing_root_fails() {
		let temp_dir = TempDir::new().unwrap();
		let missing = temp_dir.path().join("does-not-exist");

		for recursive in [false, true] {
			let err = Snapshot::capture(&missing, recursive).unwrap_err();
			match err {
				DifferError::FilesystemError { operation, path, .. } => {
					assert_eq!(operation, "open root directory");
					assert!(path.contains("does-not-exist"));
				}
				other => panic!("Expected FilesystemError, got: {other:?}"),
			}
		}
	}

	#[test]
	fn test_same_file_requires_ids() {
		let now = SystemTime::now();
		let a = FileIdentity::new("a", now, None);
		let b = FileIdentity::new("b", now, None);
		assert!(!a.same_file(&b));

		let c = FileIdentity::new("c", now, Some(FileId::new(1, 7)));
		let d = FileIdentity::new("d", now, Some(FileId::new(1, 7)));
		let e = FileIdentity::new("e", now, Some(FileId::new(2, 7)));
		assert!(c.same_file(&d));
		assert!(!c.same_file(&e));
	}

	#[test]
	fn test_from_entries_last_wins() {
		let now = SystemTime::now();
		let snap = Snapshot::from_entries(
			"root",
			false,
			vec![
				FileIdentity::new("root/a", now, None),
				FileIdentity::new("root/a", now, None).with_size(3),
			],
		);
		assert_eq!(snap.len(), 1);
		assert_eq!(snap.get(Path::new("root/a")).unwrap().size, Some(3));
	}
}
