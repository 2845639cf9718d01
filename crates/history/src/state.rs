//! The edit state record.

use std::sync::Arc;

use binilla_node::{Node, TreePath, UnionBody};
use binilla_schema::{Descriptor, Value};
use strum_macros::{Display, IntoStaticStr};

/// What kind of semantic change an edit state records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum EditKind {
	ScalarSet,
	BoolSet,
	EnumSet,
	UnionSwitch,
	ArrayShiftUp,
	ArrayShiftDown,
	ArrayAdd,
	ArrayInsert,
	ArrayDuplicate,
	ArrayDelete,
	ArrayDeleteAll,
	RawBytesReplace,
	/// Several scalar children of one node set together.
	Composite,
}

/// One side of a union switch.
#[derive(Debug, Clone, PartialEq)]
pub struct UnionState {
	pub case: Option<i64>,
	pub body: UnionBody,
}

/// A neighbor written as a side effect of the edit, e.g. a union's case field.
#[derive(Debug, Clone, PartialEq)]
pub struct NeighborChange {
	pub path: TreePath,
	pub undo: Value,
	pub redo: Value,
}

/// Both sides of a change, per kind.
///
/// Array changes keep the nodes they insert or remove so undo and redo can
/// restore them exactly.
#[derive(Debug, Clone, PartialEq)]
pub enum Change {
	ScalarSet {
		undo: Value,
		redo: Value,
	},
	/// Sets or clears the bits in `mask`.
	BoolSet {
		mask: u64,
		undo: bool,
		redo: bool,
	},
	EnumSet {
		undo: i128,
		redo: i128,
	},
	UnionSwitch {
		undo: UnionState,
		redo: UnionState,
		case_neighbor: Option<NeighborChange>,
	},
	/// Swaps element `index` with `index - 1`.
	ArrayShiftUp {
		index: usize,
	},
	/// Swaps element `index` with `index + 1`.
	ArrayShiftDown {
		index: usize,
	},
	ArrayAdd {
		node: Node,
	},
	ArrayInsert {
		index: usize,
		node: Node,
	},
	/// `node` is the copy inserted after `index`.
	ArrayDuplicate {
		index: usize,
		node: Node,
	},
	ArrayDelete {
		index: usize,
		node: Node,
	},
	ArrayDeleteAll {
		nodes: Vec<Node>,
	},
	/// Replaces the whole target subtree, used by imports and raw-byte edits.
	RawBytesReplace {
		undo: Box<Node>,
		redo: Box<Node>,
	},
	/// `(attr index, undo, redo)` per child of the target.
	Composite {
		children: Vec<(usize, Value, Value)>,
	},
}

impl Change {
	pub fn kind(&self) -> EditKind {
		match self {
			Change::ScalarSet { .. } => EditKind::ScalarSet,
			Change::BoolSet { .. } => EditKind::BoolSet,
			Change::EnumSet { .. } => EditKind::EnumSet,
			Change::UnionSwitch { .. } => EditKind::UnionSwitch,
			Change::ArrayShiftUp { .. } => EditKind::ArrayShiftUp,
			Change::ArrayShiftDown { .. } => EditKind::ArrayShiftDown,
			Change::ArrayAdd { .. } => EditKind::ArrayAdd,
			Change::ArrayInsert { .. } => EditKind::ArrayInsert,
			Change::ArrayDuplicate { .. } => EditKind::ArrayDuplicate,
			Change::ArrayDelete { .. } => EditKind::ArrayDelete,
			Change::ArrayDeleteAll { .. } => EditKind::ArrayDeleteAll,
			Change::RawBytesReplace { .. } => EditKind::RawBytesReplace,
			Change::Composite { .. } => EditKind::Composite,
		}
	}
}

/// Editor state captured alongside a change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EditExtra {
	/// Array selection before the change; `-1` means no selection.
	pub selection_before: Option<isize>,
	/// Array selection after the change.
	pub selection_after: Option<isize>,
}

impl EditExtra {
	pub fn selection(before: isize, after: isize) -> Self {
		Self {
			selection_before: Some(before),
			selection_after: Some(after),
		}
	}

	/// Selection to restore after applying in the given direction.
	pub fn selection_for(&self, undo: bool) -> Option<isize> {
		if undo { self.selection_before } else { self.selection_after }
	}
}

/// A reversible record of one semantic change.
#[derive(Debug, Clone)]
pub struct EditState {
	/// Path of the target's parent.
	pub path: TreePath,
	/// Index of the target within its parent.
	pub attr_index: usize,
	/// Descriptor of the target when the edit was made.
	pub desc: Arc<Descriptor>,
	pub change: Change,
	pub extra: EditExtra,
}

/// Descriptors compare by identity.
impl PartialEq for EditState {
	fn eq(&self, other: &Self) -> bool {
		self.path == other.path
			&& self.attr_index == other.attr_index
			&& Arc::ptr_eq(&self.desc, &other.desc)
			&& self.change == other.change
			&& self.extra == other.extra
	}
}

impl EditState {
	/// Builds a state targeting the node at `target`, which must not be the root.
	pub fn new(target: &TreePath, desc: Arc<Descriptor>, change: Change) -> Option<Self> {
		Some(Self {
			path: target.parent()?,
			attr_index: target.attr_index()?,
			desc,
			change,
			extra: EditExtra::default(),
		})
	}

	pub fn with_extra(mut self, extra: EditExtra) -> Self {
		self.extra = extra;
		self
	}

	pub fn kind(&self) -> EditKind {
		self.change.kind()
	}

	/// Full path of the edited node.
	pub fn target(&self) -> TreePath {
		self.path.child(self.attr_index)
	}
}
