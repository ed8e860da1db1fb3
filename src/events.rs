use crate::snapshot::FileIdentity;
use serde::{Serialize, Serializer};
use std::borrow::Cow;
use std::fmt;
use std::path::{Path, PathBuf};

/// Kind of change detected between two snapshots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum Op {
	Create = 0,
	Write = 1,
	Remove = 2,
	Rename = 3,
}

/// Label for a raw op code; codes outside the known set read as `UNKNOWN`
pub fn op_label(raw: u8) -> &'static str {
	match raw {
		0 => "CREATE",
		1 => "WRITE",
		2 => "REMOVE",
		3 => "RENAME",
		_ => "UNKNOWN",
	}
}

impl Op {
	pub fn from_raw(raw: u8) -> Option<Op> {
		match raw {
			0 => Some(Op::Create),
			1 => Some(Op::Write),
			2 => Some(Op::Remove),
			3 => Some(Op::Rename),
			_ => None,
		}
	}

	pub fn as_str(self) -> &'static str {
		op_label(self as u8)
	}
}

impl fmt::Display for Op {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl Serialize for Op {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		serializer.serialize_str(self.as_str())
	}
}

/// A single detected change
///
/// `info` is the metadata of the resulting entry, or of the removed entry for
/// [`Op::Remove`]. It is left out of the JSON projection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
	pub op: Op,
	pub path: PathBuf,
	/// Previous path, only set for [`Op::Rename`]
	pub old_path: Option<PathBuf>,
	pub info: FileIdentity,
}

impl Event {
	pub fn create(info: FileIdentity) -> Self {
		Self::new(Op::Create, info)
	}

	pub fn write(info: FileIdentity) -> Self {
		Self::new(Op::Write, info)
	}

	pub fn remove(info: FileIdentity) -> Self {
		Self::new(Op::Remove, info)
	}

	pub fn rename(old_path: PathBuf, info: FileIdentity) -> Self {
		Self {
			old_path: Some(old_path),
			..Self::new(Op::Rename, info)
		}
	}

	fn new(op: Op, info: FileIdentity) -> Self {
		Self {
			op,
			path: info.path.clone(),
			old_path: None,
			info,
		}
	}

	pub fn is_rename(&self) -> bool {
		self.op == Op::Rename
	}

	pub fn old_path(&self) -> Option<&Path> {
		self.old_path.as_deref()
	}

	pub fn to_json(&self) -> serde_json::Result<String> {
		serde_json::to_string(self)
	}
}

/// Wire shape of an [`Event`]
#[derive(Serialize)]
struct EventRecord<'a> {
	oldpath: Cow<'a, str>,
	op: Op,
	path: Cow<'a, str>,
}

impl Serialize for Event {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		EventRecord {
			oldpath: self
				.old_path
				.as_deref()
				.map(Path::to_string_lossy)
				.unwrap_or_default(),
			op: self.op,
			path: self.path.to_string_lossy(),
		}
		.serialize(serializer)
	}
}

/// Order events by path, then op
///
/// Diffs come out of hash maps, so this is the way to get a stable sequence
/// when merging buffered batches or asserting in tests.
pub fn sort_events(events: &mut [Event]) {
	events.sort_by(|a, b| a.path.cmp(&b.path).then(a.op.cmp(&b.op)));
}
