//! Neighbor path resolution over a node tree.
//!
//! Paths are resolved against the document root with an explicit starting
//! [`TreePath`]; `..` simply drops the last attr index. Resolution failures
//! are ordinary values ([`PathError::NoSuchPath`]) so callers can treat the
//! dependent feature as unavailable.

use binilla_schema::{DynNamePath, NeighborLookup, NodePath, PathError, PathStep, Shape, Value};
use tracing::debug;

use crate::node::{Node, NodeData};
use crate::tree_path::TreePath;

impl Node {
	/// Resolves `path` starting at the node addressed by `start`.
	///
	/// `self` must be the document root.
	pub fn resolve(&self, start: &TreePath, path: &NodePath) -> Result<TreePath, PathError> {
		let no_such = |step: usize| PathError::NoSuchPath {
			path: path.to_string(),
			step,
		};

		let mut cursor = start.clone();
		let mut node = self.at(&cursor).ok_or_else(|| no_such(0))?;
		for (i, step) in path.steps().iter().enumerate() {
			match step {
				PathStep::Parent => {
					cursor.pop().ok_or_else(|| no_such(i))?;
				}
				PathStep::Child(name) => {
					let index = child_index(node, name).ok_or_else(|| no_such(i))?;
					cursor.push(index);
				}
				PathStep::Index(index) => {
					if !matches!(node.data(), NodeData::Array(_) | NodeData::Struct(_)) || *index >= node.len() {
						return Err(no_such(i));
					}
					cursor.push(*index);
				}
				PathStep::DynIndex => return Err(no_such(i)),
			}
			node = self.at(&cursor).ok_or_else(|| no_such(i))?;
		}
		Ok(cursor)
	}

	/// Resolves `path` the way a field at `at` sees it: from its parent.
	pub fn neighbor(&self, at: &TreePath, path: &NodePath) -> Result<TreePath, PathError> {
		let parent = at.parent().unwrap_or_default();
		self.resolve(&parent, path)
	}

	/// Resolves `path` from the parent of `at` and returns the referenced node.
	pub fn neighbor_node(&self, at: &TreePath, path: &NodePath) -> Result<&Node, PathError> {
		let target = self.neighbor(at, path)?;
		self.at(&target).ok_or_else(|| PathError::NoSuchPath {
			path: path.to_string(),
			step: path.steps().len(),
		})
	}

	/// Display names computed from a dynamic-name path.
	///
	/// `at` is the field declaring the path: the array itself when the path
	/// has no `[DYN_I]` marker, otherwise the field whose neighbor array is
	/// named. Elements whose name cannot be resolved yield `None`.
	pub fn dynamic_names(&self, at: &TreePath, dyn_path: &DynNamePath) -> Result<Vec<Option<String>>, PathError> {
		let array_at = match &dyn_path.array {
			Some(array) => self.neighbor(at, array)?,
			None => at.clone(),
		};
		let array = self.at(&array_at).ok_or_else(|| PathError::NoSuchPath {
			path: dyn_path.to_string(),
			step: 0,
		})?;
		if !matches!(array.data(), NodeData::Array(_)) {
			return Err(PathError::WrongKind {
				path: dyn_path.to_string(),
				found: array.kind().into(),
				expected: "array",
			});
		}

		let names = (0..array.len())
			.map(|i| {
				let element_at = array_at.child(i);
				match self.resolve(&element_at, &dyn_path.element) {
					Ok(target) => self.at(&target).and_then(label_of),
					Err(e) => {
						debug!(element = i, error = %e, "dynamic name unavailable");
						None
					}
				}
			})
			.collect();
		Ok(names)
	}

	/// Unit scale of the numeric field at `at`, if it declares one and it resolves.
	pub fn unit_scale_at(&self, at: &TreePath) -> Option<f64> {
		let node = self.at(at)?;
		let scale = node.desc().unit_scale()?;
		scale.resolve(&Scope::new(self, at))
	}
}

fn child_index(node: &Node, name: &str) -> Option<usize> {
	match &node.desc().shape {
		Shape::Struct { .. } | Shape::Union { .. } | Shape::StreamAdapter { .. } => node.index_of(name),
		_ => None,
	}
}

/// Text used to label an element from the node a dynamic path lands on.
fn label_of(node: &Node) -> Option<String> {
	match node.value()? {
		Value::Str(s) => Some(s.clone()),
		Value::Int(v) => match node.desc().enum_option(*v) {
			Some(option) => Some(option.name.clone()),
			None => Some(v.to_string()),
		},
		Value::Float(v) => Some(v.to_string()),
		Value::Bytes(_) => None,
	}
}

/// Tree view handed to unit-scale closures: neighbors of one field.
pub struct Scope<'a> {
	root: &'a Node,
	at: TreePath,
}

impl<'a> Scope<'a> {
	pub fn new(root: &'a Node, at: &TreePath) -> Self {
		Self { root, at: at.clone() }
	}
}

impl NeighborLookup for Scope<'_> {
	fn numeric(&self, path: &NodePath) -> Option<f64> {
		match self.root.neighbor_node(&self.at, path) {
			Ok(node) => node.value().and_then(Value::as_f64),
			Err(e) => {
				debug!(at = %self.at, error = %e, "unit scale neighbor unavailable");
				None
			}
		}
	}
}

#[cfg(test)]
mod tests;
