use crate::error::{DifferError, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Options a [`Differ`](crate::Differ) is constructed from
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DifferConfig {
	/// Directory to track. Required.
	pub root: Option<PathBuf>,
	/// Walk the whole subtree instead of listing only the root's children
	pub recursive: bool,
}

impl DifferConfig {
	/// Create a configuration tracking `root`, non-recursive
	pub fn with_root(root: impl Into<PathBuf>) -> Self {
		Self {
			root: Some(root.into()),
			..Default::default()
		}
	}

	/// Descend into child directories
	pub fn recursive(mut self) -> Self {
		self.recursive = true;
		self
	}

	/// Validate the configuration and return the root to track
	pub fn validate(&self) -> Result<&Path> {
		match self.root.as_deref() {
			Some(root) if !root.as_os_str().is_empty() => Ok(root),
			_ => Err(DifferError::missing_root()),
		}
	}
}
