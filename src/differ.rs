use crate::config::DifferConfig;
use crate::diff::diff;
use crate::error::{DifferError, Result};
use crate::events::{Event, Op};
use crate::snapshot::Snapshot;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Whether the differ can still produce diffs
#[derive(Debug)]
enum DifferState {
	/// Healthy; holds events accumulated by `update` but not yet polled
	Idle { pending: Vec<Event> },
	/// An `update` failed. The error is returned by every later `poll`.
	Failed(DifferError),
}

/// Counters describing what a differ has done so far
///
/// Event counts cover events handed to the caller by `poll`. Events still
/// buffered, or dropped when an `update` latches an error, are not counted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DifferStats {
	pub polls: u64,
	pub updates: u64,
	pub failed_captures: u64,
	pub creates: u64,
	pub writes: u64,
	pub removes: u64,
	pub renames: u64,
	pub last_snapshot_entries: usize,
}

impl DifferStats {
	fn record_events(&mut self, events: &[Event]) {
		for event in events {
			match event.op {
				Op::Create => self.creates += 1,
				Op::Write => self.writes += 1,
				Op::Remove => self.removes += 1,
				Op::Rename => self.renames += 1,
			}
		}
	}

	/// Total events delivered by `poll`
	pub fn total_events(&self) -> u64 {
		self.creates + self.writes + self.removes + self.renames
	}
}

/// Diffs a directory tree against the state it had at the previous call
///
/// Each [`poll`](Differ::poll) or [`update`](Differ::update) captures a fresh
/// snapshot, diffs it against the stored one and makes it the new baseline.
/// Both take `&mut self`; share a differ across threads behind a lock.
#[derive(Debug)]
pub struct Differ {
	root: PathBuf,
	recursive: bool,
	latest: Snapshot,
	state: DifferState,
	stats: DifferStats,
}

impl Differ {
	/// Validate `config` and take the initial snapshot
	pub fn new(config: DifferConfig) -> Result<Self> {
		let root = config.validate()?.to_path_buf();
		let latest = Snapshot::capture(&root, config.recursive)
			.map_err(|e| e.context("getting initial file system snapshot"))?;

		info!(
			"Tracking {:?} (recursive: {}, entries: {})",
			root,
			config.recursive,
			latest.len()
		);

		Ok(Self {
			stats: DifferStats {
				last_snapshot_entries: latest.len(),
				..Default::default()
			},
			root,
			recursive: config.recursive,
			latest,
			state: DifferState::Idle { pending: Vec::new() },
		})
	}

	/// Diff the current state of the tree against the previous one
	///
	/// Events buffered by earlier [`update`](Differ::update) calls come first.
	/// A failed capture leaves the baseline and buffer untouched.
	pub fn poll(&mut self) -> Result<Vec<Event>> {
		if let DifferState::Failed(err) = &self.state {
			return Err(err.clone());
		}
		self.stats.polls += 1;

		let mut events = self.advance().map_err(|e| e.context("getting file system snapshot"))?;

		if let DifferState::Idle { pending } = &mut self.state {
			if !pending.is_empty() {
				let mut buffered = std::mem::take(pending);
				buffered.append(&mut events);
				events = buffered;
			}
		}

		self.stats.record_events(&events);
		debug!("Poll returned {} events", events.len());
		Ok(events)
	}

	/// Diff the tree and buffer the events for the next [`poll`](Differ::poll)
	///
	/// A failed capture is latched and reported by every later `poll`. Once
	/// latched, further updates do nothing.
	pub fn update(&mut self) {
		if self.is_failed() {
			debug!("Skipping update, differ already failed");
			return;
		}
		self.stats.updates += 1;

		match self.advance() {
			Ok(mut events) => {
				if let DifferState::Idle { pending } = &mut self.state {
					pending.append(&mut events);
				}
			}
			Err(err) => {
				warn!("Snapshot of {:?} failed during update: {}", self.root, err);
				self.state = DifferState::Failed(err);
			}
		}
	}

	/// Capture, diff against the baseline and move the baseline forward
	fn advance(&mut self) -> Result<Vec<Event>> {
		let current = Snapshot::capture(&self.root, self.recursive).inspect_err(|_| {
			self.stats.failed_captures += 1;
		})?;

		let events = diff(&self.latest, &current);
		self.stats.last_snapshot_entries = current.len();
		self.latest = current;
		Ok(events)
	}

	/// The baseline the next diff is computed against
	pub fn latest(&self) -> &Snapshot {
		&self.latest
	}

	pub fn root(&self) -> &Path {
		&self.root
	}

	pub fn is_recursive(&self) -> bool {
		self.recursive
	}

	/// True once an `update` has latched an error
	pub fn is_failed(&self) -> bool {
		matches!(self.state, DifferState::Failed(_))
	}

	/// Number of events buffered by `update` and not yet polled
	pub fn pending_events(&self) -> usize {
		match &self.state {
			DifferState::Idle { pending } => pending.len(),
			DifferState::Failed(_) => 0,
		}
	}

	pub fn stats(&self) -> &DifferStats {
		&self.stats
	}
}
