//! Applying edit states to a node tree.

use binilla_node::{CountLimits, Node, NodeData, TreePath};
use binilla_schema::{Shape, Value};
use tracing::trace;

use crate::error::{EditError, Result};
use crate::state::{Change, EditState, UnionState};

/// Document-level switches that shape how edits apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ApplyPolicy {
	/// Array count bounds for forward application.
	///
	/// Undo always restores the previous length, so it runs relaxed.
	pub limits: CountLimits,
}

/// Applies `state` to the tree rooted at `root`.
///
/// With `undo` set the undo side is applied, otherwise the redo side.
/// Applying redo then undo leaves the tree bit-identical. Path-sized targets
/// have their size neighbor synced afterwards.
pub fn apply(root: &mut Node, state: &EditState, undo: bool, policy: &ApplyPolicy) -> Result<()> {
	let target_at = state.target();
	check_target(root, state, &target_at)?;
	let limits = if undo { CountLimits::RELAXED } else { policy.limits };

	match &state.change {
		Change::ScalarSet { undo: u, redo: r } => {
			root.try_at_mut(&target_at)?.set_value(pick(undo, u, r).clone())?;
		}
		Change::BoolSet { mask, undo: u, redo: r } => {
			let node = root.try_at_mut(&target_at)?;
			let data = node.int().ok_or_else(|| mismatch(state, node))?;
			let Shape::BoolMask { encoding, .. } = &node.desc().shape else {
				return Err(mismatch(state, node));
			};
			let encoding = *encoding;
			let mask = u128::from(*mask);
			let set = if *pick(undo, u, r) { mask } else { 0 };
			let bits = (encoding.to_bits(data) & !mask) | set;
			node.set_value(Value::Int(encoding.from_bits(bits)))?;
		}
		Change::EnumSet { undo: u, redo: r } => {
			root.try_at_mut(&target_at)?.set_value(Value::Int(*pick(undo, u, r)))?;
		}
		Change::UnionSwitch {
			undo: u,
			redo: r,
			case_neighbor,
		} => {
			let node = root.try_at_mut(&target_at)?;
			if !matches!(node.data(), NodeData::Union { .. }) {
				return Err(mismatch(state, node));
			}
			let UnionState { case, body } = pick(undo, u, r).clone();
			*node.data_mut() = NodeData::Union { case, body };
			if let Some(neighbor) = case_neighbor {
				root.try_at_mut(&neighbor.path)?.set_value(pick(undo, &neighbor.undo, &neighbor.redo).clone())?;
			}
		}
		Change::ArrayShiftUp { index } => {
			let above = index.checked_sub(1).ok_or_else(|| mismatch_at(root, state, &target_at))?;
			root.try_at_mut(&target_at)?.swap(*index, above)?;
		}
		Change::ArrayShiftDown { index } => root.try_at_mut(&target_at)?.swap(*index, index + 1)?,
		Change::ArrayAdd { node } => {
			let array = root.try_at_mut(&target_at)?;
			if undo {
				let last = array.len().checked_sub(1).ok_or_else(|| mismatch(state, array))?;
				array.delete(last, limits)?;
			} else {
				array.append(node.clone(), limits)?;
			}
		}
		Change::ArrayInsert { index, node } => insert_or_remove(root, &target_at, *index, node, !undo, limits)?,
		Change::ArrayDuplicate { index, node } => insert_or_remove(root, &target_at, index + 1, node, !undo, limits)?,
		Change::ArrayDelete { index, node } => insert_or_remove(root, &target_at, *index, node, undo, limits)?,
		Change::ArrayDeleteAll { nodes } => {
			let array = root.try_at_mut(&target_at)?;
			if undo {
				array.replace_elements(nodes.clone(), limits)?;
			} else {
				array.delete_all(limits)?;
			}
		}
		Change::RawBytesReplace { undo: u, redo: r } => {
			let parent = root.try_at_mut(&state.path)?;
			parent.set(state.attr_index, (**pick(undo, u, r)).clone())?;
		}
		Change::Composite { children } => {
			let node = root.try_at_mut(&target_at)?;
			for (index, u, r) in children {
				let child = node.child_mut(*index).ok_or_else(|| EditError::Mismatch {
					kind: state.kind().into(),
					name: state.desc.name.clone(),
				})?;
				child.set_value(pick(undo, u, r).clone())?;
			}
		}
	}

	root.sync_size(&target_at)?;
	trace!(kind = %state.kind(), target = %target_at, undo, "edit applied");
	Ok(())
}

fn pick<T>(undo: bool, u: T, r: T) -> T {
	if undo { u } else { r }
}

fn insert_or_remove(
	root: &mut Node,
	array_at: &TreePath,
	index: usize,
	node: &Node,
	insert: bool,
	limits: CountLimits,
) -> Result<()> {
	let array = root.try_at_mut(array_at)?;
	if insert {
		array.insert(index, node.clone(), limits)?;
	} else {
		array.delete(index, limits)?;
	}
	Ok(())
}

fn check_target(root: &Node, state: &EditState, target_at: &TreePath) -> Result<()> {
	let found = root.try_at(target_at)?;
	if found.name() == state.desc.name && found.kind() == state.desc.kind() {
		Ok(())
	} else {
		Err(EditError::Stale {
			path: target_at.clone(),
			expected: state.desc.name.clone(),
			found: found.name().to_string(),
		})
	}
}

fn mismatch(state: &EditState, node: &Node) -> EditError {
	EditError::Mismatch {
		kind: state.kind().into(),
		name: node.name().to_string(),
	}
}

fn mismatch_at(root: &Node, state: &EditState, at: &TreePath) -> EditError {
	match root.at(at) {
		Some(node) => mismatch(state, node),
		None => EditError::Mismatch {
			kind: state.kind().into(),
			name: state.desc.name.clone(),
		},
	}
}
