//! Declared sizes and their size neighbors.
//!
//! A field sized by [`SizeSpec::Path`] stores its length in a neighbor
//! integer. Every length-changing mutation is followed by [`Node::sync_size`]
//! so the neighbor always matches the data it sizes. Unions selected by a
//! case neighbor are kept in step the same way by [`Node::sync_union_case`].

use binilla_schema::{Shape, SizeSpec, Value};
use tracing::trace;

use crate::error::{NodeError, Result};
use crate::node::{Node, NodeData};
use crate::tree_path::TreePath;

impl Node {
	/// Size of this node's own data: element count for arrays, bytes otherwise.
	pub fn actual_size(&self) -> Result<usize> {
		match (&self.desc().shape, self.data()) {
			(Shape::Array { .. }, NodeData::Array(elements)) => Ok(elements.len()),
			(Shape::RawBytes { .. }, NodeData::Scalar(Value::Bytes(bytes))) => Ok(bytes.len()),
			(Shape::String { encoding, .. }, NodeData::Scalar(Value::Str(text))) => {
				encoding.encode(text).map(|b| b.len()).map_err(|e| NodeError::BadValue {
					name: self.name().to_string(),
					value: e.to_string(),
				})
			}
			(shape, _) => match self.desc().static_size() {
				Some(size) => Ok(size),
				None => Err(NodeError::WrongKind {
					name: self.name().to_string(),
					found: shape.kind(),
					expected: "a field with a measurable size",
				}),
			},
		}
	}

	/// Declared size of the field at `at`.
	///
	/// Reads the size neighbor for path-sized fields, the constant for fixed
	/// ones and the data itself for remainder-sized ones.
	pub fn get_size(&self, at: &TreePath) -> Result<usize> {
		let node = self.try_at(at)?;
		match node.desc().size_spec() {
			Some(SizeSpec::Fixed(size)) => Ok(*size),
			Some(SizeSpec::Path(path)) => {
				let target = self.neighbor_node(at, path)?;
				target
					.int()
					.and_then(|v| usize::try_from(v).ok())
					.ok_or_else(|| NodeError::BadSize { name: node.name().to_string() })
			}
			Some(SizeSpec::Remainder) | None => node.actual_size(),
		}
	}

	/// Records `size` as the declared size of the field at `at`.
	///
	/// Returns the path and previous value of the size neighbor when one was
	/// written.
	pub fn set_size(&mut self, at: &TreePath, size: usize) -> Result<Option<(TreePath, Value)>> {
		let node = self.try_at(at)?;
		let name = node.name().to_string();
		match node.desc().size_spec().cloned() {
			Some(SizeSpec::Fixed(fixed)) if fixed != size => Err(NodeError::FixedSize { name, size: fixed }),
			Some(SizeSpec::Path(path)) => {
				let target_at = self.neighbor(at, &path)?;
				let target = self.try_at_mut(&target_at)?;
				if target.int() == Some(size as i128) {
					return Ok(None);
				}
				let previous = target.set_value(Value::Int(size as i128)).map_err(|_| NodeError::BadSize { name })?;
				trace!(field = %at, neighbor = %target_at, size, "size neighbor updated");
				Ok(Some((target_at, previous)))
			}
			_ => Ok(None),
		}
	}

	/// Writes the actual size of the field at `at` into its size neighbor.
	pub fn sync_size(&mut self, at: &TreePath) -> Result<Option<(TreePath, Value)>> {
		let node = self.try_at(at)?;
		if !matches!(node.desc().size_spec(), Some(SizeSpec::Path(_))) {
			return Ok(None);
		}
		let size = node.actual_size()?;
		self.set_size(at, size)
	}

	/// Writes the active discriminator of the union at `at` into its case neighbor.
	///
	/// Raw union bodies leave the neighbor alone. Returns the path and previous
	/// value of the neighbor when one was written.
	pub fn sync_union_case(&mut self, at: &TreePath) -> Result<Option<(TreePath, Value)>> {
		let node = self.try_at(at)?;
		let Shape::Union {
			case_path: Some(path), ..
		} = &node.desc().shape
		else {
			return Ok(None);
		};
		let Some(Some(case)) = node.union_case() else {
			return Ok(None);
		};
		let path = path.clone();
		let target_at = self.neighbor(at, &path)?;
		let target = self.try_at_mut(&target_at)?;
		if target.int() == Some(i128::from(case)) {
			return Ok(None);
		}
		let previous = target.set_value(Value::Int(i128::from(case)))?;
		trace!(union = %at, neighbor = %target_at, case, "case neighbor updated");
		Ok(Some((target_at, previous)))
	}

	/// Syncs every path-sized field in the tree; unresolvable ones are skipped.
	pub fn sync_all_sizes(&mut self) {
		let mut sized = Vec::new();
		collect_path_sized(self, &mut TreePath::root(), &mut sized);
		for at in sized {
			if let Err(e) = self.sync_size(&at) {
				trace!(field = %at, error = %e, "size neighbor not synced");
			}
		}
	}
}

fn collect_path_sized(node: &Node, at: &mut TreePath, out: &mut Vec<TreePath>) {
	if matches!(node.desc().size_spec(), Some(SizeSpec::Path(_))) {
		out.push(at.clone());
	}
	for (i, child) in node.children().iter().enumerate() {
		at.push(i);
		collect_path_sized(child, at, out);
		at.pop();
	}
}
