//! Attr-index paths from the document root.

use std::fmt;
use std::ops::Deref;

use smallvec::SmallVec;

/// Sequence of attr indices leading from the document root to a node.
///
/// The empty path addresses the root. Union and stream-adapter nodes expose
/// their single active child at attr index 0.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct TreePath(SmallVec<[usize; 8]>);

impl TreePath {
	pub fn root() -> Self {
		Self::default()
	}

	pub fn from_slice(indices: &[usize]) -> Self {
		Self(SmallVec::from_slice(indices))
	}

	/// Path of the `index`-th child of this node.
	pub fn child(&self, index: usize) -> Self {
		let mut path = self.clone();
		path.0.push(index);
		path
	}

	/// Path of the parent, or `None` at the root.
	pub fn parent(&self) -> Option<Self> {
		let (_, parent) = self.0.split_last()?;
		Some(Self::from_slice(parent))
	}

	/// Attr index of this node within its parent.
	pub fn attr_index(&self) -> Option<usize> {
		self.0.last().copied()
	}

	pub fn push(&mut self, index: usize) {
		self.0.push(index);
	}

	pub fn pop(&mut self) -> Option<usize> {
		self.0.pop()
	}

	/// Returns `true` if `self` is `other` or lies below it.
	pub fn starts_with(&self, other: &TreePath) -> bool {
		self.0.starts_with(&other.0)
	}
}

impl Deref for TreePath {
	type Target = [usize];

	fn deref(&self) -> &[usize] {
		&self.0
	}
}

impl fmt::Display for TreePath {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str("/")?;
		for (i, index) in self.0.iter().enumerate() {
			if i > 0 {
				f.write_str("/")?;
			}
			write!(f, "{index}")?;
		}
		Ok(())
	}
}

impl From<&[usize]> for TreePath {
	fn from(indices: &[usize]) -> Self {
		Self::from_slice(indices)
	}
}

impl<const N: usize> From<[usize; N]> for TreePath {
	fn from(indices: [usize; N]) -> Self {
		Self::from_slice(&indices)
	}
}
