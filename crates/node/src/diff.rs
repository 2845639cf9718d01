//! Structural comparison of node trees.

use crate::node::{Node, NodeData, UnionBody, same_descriptor};
use crate::tree_path::TreePath;

impl Node {
	/// Path of the first node where `self` and `other` differ, in depth-first order.
	///
	/// Returns `None` when the trees are structurally equal.
	pub fn first_difference(&self, other: &Node) -> Option<TreePath> {
		let mut at = TreePath::root();
		if walk(self, other, &mut at) { None } else { Some(at) }
	}
}

/// Returns `true` when equal; on difference `at` is left pointing at it.
fn walk(a: &Node, b: &Node, at: &mut TreePath) -> bool {
	if !same_descriptor(a.desc(), b.desc()) {
		return false;
	}
	match (a.data(), b.data()) {
		(NodeData::Struct(xs), NodeData::Struct(ys)) | (NodeData::Array(xs), NodeData::Array(ys)) => {
			for (i, (x, y)) in xs.iter().zip(ys).enumerate() {
				at.push(i);
				if !walk(x, y, at) {
					return false;
				}
				at.pop();
			}
			xs.len() == ys.len()
		}
		(
			NodeData::Union {
				case: ca,
				body: UnionBody::Active(x),
			},
			NodeData::Union {
				case: cb,
				body: UnionBody::Active(y),
			},
		) => {
			if ca != cb {
				return false;
			}
			at.push(0);
			let equal = walk(x, y, at);
			if equal {
				at.pop();
			}
			equal
		}
		(NodeData::Stream(x), NodeData::Stream(y)) => {
			at.push(0);
			let equal = walk(x, y, at);
			if equal {
				at.pop();
			}
			equal
		}
		(x, y) => x == y,
	}
}
