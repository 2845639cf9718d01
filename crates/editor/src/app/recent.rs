//! Most-recently-used file list.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};

/// Bounded list of paths, most recent first, without duplicates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecentPaths {
	paths: VecDeque<PathBuf>,
	max: usize,
}

impl RecentPaths {
	pub fn new(max: usize) -> Self {
		Self {
			paths: VecDeque::new(),
			max,
		}
	}

	/// Seeds the list from `paths`, most recent first.
	pub fn from_paths(paths: impl IntoIterator<Item = PathBuf>, max: usize) -> Self {
		let mut recent = Self::new(max);
		let paths: Vec<_> = paths.into_iter().collect();
		for path in paths.into_iter().rev() {
			recent.push(path);
		}
		recent
	}

	/// Moves `path` to the front, dropping the oldest entry past the cap.
	pub fn push(&mut self, path: impl Into<PathBuf>) {
		let path = path.into();
		self.paths.retain(|p| *p != path);
		self.paths.push_front(path);
		self.paths.truncate(self.max);
	}

	pub fn remove(&mut self, path: &Path) -> bool {
		let before = self.paths.len();
		self.paths.retain(|p| p != path);
		self.paths.len() != before
	}

	pub fn max(&self) -> usize {
		self.max
	}

	pub fn set_max(&mut self, max: usize) {
		self.max = max;
		self.paths.truncate(max);
	}

	pub fn len(&self) -> usize {
		self.paths.len()
	}

	pub fn is_empty(&self) -> bool {
		self.paths.is_empty()
	}

	pub fn latest(&self) -> Option<&Path> {
		self.paths.front().map(PathBuf::as_path)
	}

	pub fn iter(&self) -> impl Iterator<Item = &Path> {
		self.paths.iter().map(PathBuf::as_path)
	}
}
