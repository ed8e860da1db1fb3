//! Snapshot diffing and identity-based rename detection
//!
//! Paths only in the newer snapshot are candidate creates, paths only in the
//! older one are candidate deletes. A delete and a create that refer to the
//! same file object collapse into a single rename; whatever is left over is
//! reported as plain creates and removes. Paths present in both snapshots
//! with a strictly newer modification time are writes.

use crate::events::{sort_events, Event};
use crate::snapshot::{FileId, FileIdentity, Snapshot};
use std::collections::{HashMap, VecDeque};
use tracing::{debug, trace};

/// Compute the events that turn `older` into `newer`
///
/// `older` must have been captured before `newer` with the same root and
/// recursion setting. Returned events are sorted by path, then op.
pub fn diff(older: &Snapshot, newer: &Snapshot) -> Vec<Event> {
	let mut events = Vec::new();
	let mut creates = Vec::new();

	for (path, current) in newer.iter() {
		match older.get(path) {
			None => creates.push(current),
			Some(previous) if current.modified > previous.modified => {
				events.push(Event::write(current.clone()));
			}
			Some(_) => {}
		}
	}

	let mut deletes: Vec<&FileIdentity> = older
		.iter()
		.filter(|(path, _)| !newer.contains(path))
		.map(|(_, identity)| identity)
		.collect();

	// Path order makes hard-link pairings reproducible
	creates.sort_by(|a, b| a.path.cmp(&b.path));
	deletes.sort_by(|a, b| a.path.cmp(&b.path));

	let mut candidates = CandidateCreates::new(creates);
	for deleted in deletes {
		match candidates.take_match(deleted) {
			Some(created) => {
				trace!("Rename {:?} -> {:?}", deleted.path, created.path);
				events.push(Event::rename(deleted.path.clone(), created.clone()));
			}
			None => events.push(Event::remove(deleted.clone())),
		}
	}
	events.extend(candidates.into_unmatched().map(|created| Event::create(created.clone())));

	sort_events(&mut events);
	debug!("Diff of {:?} produced {} events", newer.root(), events.len());
	events
}

/// Unmatched creates, bucketed by file id for rename lookups
struct CandidateCreates<'a> {
	entries: Vec<Option<&'a FileIdentity>>,
	by_id: HashMap<FileId, VecDeque<usize>>,
}

impl<'a> CandidateCreates<'a> {
	fn new(creates: Vec<&'a FileIdentity>) -> Self {
		let mut by_id: HashMap<FileId, VecDeque<usize>> = HashMap::new();
		for (index, created) in creates.iter().enumerate() {
			if let Some(id) = created.id {
				by_id.entry(id).or_default().push_back(index);
			}
		}

		Self {
			entries: creates.into_iter().map(Some).collect(),
			by_id,
		}
	}

	/// Claim the first unmatched create sharing `deleted`'s file id
	fn take_match(&mut self, deleted: &FileIdentity) -> Option<&'a FileIdentity> {
		let id = deleted.id?;
		let index = self.by_id.get_mut(&id)?.pop_front()?;
		self.entries[index].take()
	}

	fn into_unmatched(self) -> impl Iterator<Item = &'a FileIdentity> {
		self.entries.into_iter().flatten()
	}
}
