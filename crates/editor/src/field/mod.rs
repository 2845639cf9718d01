//! The field editor tree.
//!
//! Editors form a tree parallel to the node tree. Each editor holds the
//! [`TreePath`] of the node it edits, never the node itself, so either tree
//! can be rebuilt without the other. Every editor implements [`Field`]:
//!
//! - `load` rebinds the editor to the node at a path and reports whether its
//!   subtree must be rebuilt because the descriptor changed shape.
//! - `reload` re-reads the node and refreshes derived display state.
//! - `flush` commits pending user input as an edit state. Input that does not
//!   parse reverts the display and is not an error.
//! - `set_disabled` toggles interactivity for the editor and its descendants.
//! - `apply_style` re-reads presentation parameters, visiting each editor once.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use binilla_config::{Padding, Style};
use binilla_history::{Change, EditState};
use binilla_node::{Node, TreePath};
use binilla_schema::{Descriptor, EditorHint, FieldKind, Shape, Value};

use crate::context::{EditContext, View};
use crate::error::FieldError;

mod array;
mod choice;
mod color;
mod container;
mod entry;
mod raw;
mod text;
mod timestamp;
mod union;

pub use array::{ArrayButtons, ArrayEditor};
pub use choice::{BoolBit, BoolMaskEditor, DynamicEnumEditor, EnumEditor};
pub use color::ColorEditor;
pub use container::StructEditor;
pub use entry::EntryEditor;
pub use raw::RawBytesEditor;
pub use text::{TextEditor, escape_text, unescape_text};
pub use timestamp::{TIMESTAMP_FORMAT, TimestampEditor, format_timestamp, parse_timestamp};
pub use union::{RAW_CASE_LABEL, UnionEditor};


static NEXT_FIELD_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of one editor instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldId(u64);

impl FieldId {
	fn next() -> Self {
		Self(NEXT_FIELD_ID.fetch_add(1, Ordering::Relaxed))
	}
}

impl fmt::Display for FieldId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "field#{}", self.0)
	}
}

/// Result of flushing an editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum FlushOutcome {
	/// Nothing was pending, or the input matched the stored value.
	Unchanged,
	/// Pending input did not parse; the display shows the stored value again.
	Reverted,
	/// An edit state was recorded.
	Committed,
}

impl FlushOutcome {
	/// Combined outcome of flushing several editors.
	pub fn merge(self, other: Self) -> Self {
		self.max(other)
	}
}

/// State shared by every editor kind.
#[derive(Debug, Clone)]
pub struct Frame {
	id: FieldId,
	at: TreePath,
	desc: Arc<Descriptor>,
	disabled: bool,
	edited: bool,
	width: u16,
	padding: Padding,
}

impl Frame {
	pub(crate) fn new(at: &TreePath, desc: &Arc<Descriptor>) -> Self {
		Self {
			id: FieldId::next(),
			at: at.clone(),
			desc: desc.clone(),
			disabled: false,
			edited: false,
			width: 0,
			padding: Padding::default(),
		}
	}

	pub fn id(&self) -> FieldId {
		self.id
	}

	/// Tree path of the edited node.
	pub fn path(&self) -> &TreePath {
		&self.at
	}

	pub fn desc(&self) -> &Arc<Descriptor> {
		&self.desc
	}

	pub fn label(&self) -> &str {
		self.desc.label()
	}

	pub fn is_disabled(&self) -> bool {
		self.disabled
	}

	/// Enabled and not read-only by descriptor.
	pub fn is_interactive(&self) -> bool {
		!self.disabled && self.desc.is_editable()
	}

	/// Whether this editor or a descendant committed an edit since it was built.
	pub fn is_edited(&self) -> bool {
		self.edited
	}

	pub fn width(&self) -> u16 {
		self.width
	}

	pub fn padding(&self) -> Padding {
		self.padding
	}

	pub(crate) fn rebind(&mut self, at: &TreePath, desc: &Arc<Descriptor>) {
		self.at = at.clone();
		self.desc = desc.clone();
	}

	pub(crate) fn mark_edited(&mut self) {
		self.edited = true;
	}

	pub(crate) fn check_interactive(&self) -> Result<(), FieldError> {
		if self.is_interactive() {
			Ok(())
		} else {
			Err(FieldError::ReadOnly(self.desc.name.clone()))
		}
	}

	/// Records the visit; `false` when the editor was already styled.
	pub(crate) fn first_visit(&self, seen: &mut HashSet<FieldId>) -> bool {
		seen.insert(self.id)
	}

	pub(crate) fn style(&mut self, width: u16, padding: Padding) {
		self.width = width;
		self.padding = padding;
	}

	/// `Field::load` for editors without children.
	pub(crate) fn load_leaf(&mut self, view: View<'_>, at: &TreePath) -> bool {
		match view.root.at(at) {
			Some(node) if same_layout(&self.desc, node.desc()) => {
				self.rebind(at, node.desc());
				false
			}
			_ => true,
		}
	}

	/// Node this editor is bound to.
	pub(crate) fn node<'v>(&self, view: View<'v>) -> Option<&'v Node> {
		view.root.at(&self.at)
	}

	/// Builds an edit state targeting this editor's node.
	pub(crate) fn state(&self, change: Change) -> Result<EditState, FieldError> {
		EditState::new(&self.at, self.desc.clone(), change)
			.ok_or(FieldError::Unavailable("the document root cannot be edited in place"))
	}
}

/// Operations every field editor supports.
pub trait Field {
	fn frame(&self) -> &Frame;

	fn frame_mut(&mut self) -> &mut Frame;

	/// Rebinds the editor to the node at `at`.
	///
	/// Returns `true` when the node's descriptor does not fit the editor, in
	/// which case the caller must drop the editor and build a new one.
	fn load(&mut self, view: View<'_>, at: &TreePath) -> bool;

	/// Re-reads the bound node, keeping child editors.
	fn reload(&mut self, view: View<'_>);

	/// Commits pending input.
	///
	/// Idempotent when nothing is pending. Input that does not parse reverts
	/// the display and yields [`FlushOutcome::Reverted`].
	fn flush(&mut self, ctx: &mut EditContext<'_>) -> Result<FlushOutcome, FieldError>;

	/// Toggles interactivity of this editor and every descendant.
	fn set_disabled(&mut self, disabled: bool);

	/// Re-reads presentation parameters; `seen` holds editors already visited.
	fn apply_style(&mut self, style: &Style, seen: &mut HashSet<FieldId>);

	fn id(&self) -> FieldId {
		self.frame().id()
	}

	fn path(&self) -> &TreePath {
		self.frame().path()
	}
}

/// Returns `true` when editors built for `old` can be rebound to nodes of `new`.
pub(crate) fn same_layout(old: &Arc<Descriptor>, new: &Arc<Descriptor>) -> bool {
	if Arc::ptr_eq(old, new) {
		return true;
	}
	if old.name != new.name || old.kind() != new.kind() || old.hint != new.hint {
		return false;
	}
	match (&old.shape, &new.shape) {
		(Shape::Struct { fields: a }, Shape::Struct { fields: b }) => {
			a.len() == b.len() && a.iter().zip(b).all(|(a, b)| same_layout(a, b))
		}
		(Shape::Array { element: a, .. }, Shape::Array { element: b, .. }) => same_layout(a, b),
		(Shape::StreamAdapter { payload: a, .. }, Shape::StreamAdapter { payload: b, .. }) => same_layout(a, b),
		_ => true,
	}
}

/// Stored scalar value of the node at `at`.
pub(crate) fn stored_value(view: View<'_>, at: &TreePath) -> Option<Value> {
	view.root.at(at).and_then(Node::value).cloned()
}

/// A field editor of any kind.
#[derive(Debug)]
pub enum FieldEditor {
	Struct(StructEditor),
	Array(ArrayEditor),
	Union(UnionEditor),
	BoolMask(BoolMaskEditor),
	Enum(EnumEditor),
	DynamicEnum(DynamicEnumEditor),
	Entry(EntryEditor),
	Text(TextEditor),
	Timestamp(TimestampEditor),
	RawBytes(RawBytesEditor),
	Color(ColorEditor),
}

macro_rules! dispatch {
	($self:expr, $editor:ident => $body:expr) => {
		match $self {
			FieldEditor::Struct($editor) => $body,
			FieldEditor::Array($editor) => $body,
			FieldEditor::Union($editor) => $body,
			FieldEditor::BoolMask($editor) => $body,
			FieldEditor::Enum($editor) => $body,
			FieldEditor::DynamicEnum($editor) => $body,
			FieldEditor::Entry($editor) => $body,
			FieldEditor::Text($editor) => $body,
			FieldEditor::Timestamp($editor) => $body,
			FieldEditor::RawBytes($editor) => $body,
			FieldEditor::Color($editor) => $body,
		}
	};
}

impl FieldEditor {
	/// Builds the editor for the node at `at`, dispatching on its descriptor.
	///
	/// Padding and void fields have no editor.
	pub fn build(view: View<'_>, at: &TreePath) -> Option<FieldEditor> {
		let node = view.root.at(at)?;
		let desc = node.desc();
		let editor = match (desc.kind(), desc.hint) {
			(FieldKind::Struct, Some(EditorHint::Color)) => FieldEditor::Color(ColorEditor::new(view, at, desc)),
			(FieldKind::Struct | FieldKind::StreamAdapter, _) => FieldEditor::Struct(StructEditor::new(view, at, desc)),
			(FieldKind::Array, _) => FieldEditor::Array(ArrayEditor::new(view, at, desc)),
			(FieldKind::Union, _) => FieldEditor::Union(UnionEditor::new(view, at, desc)),
			(FieldKind::BoolMask, _) => FieldEditor::BoolMask(BoolMaskEditor::new(view, at, desc)),
			(FieldKind::Enum, _) => FieldEditor::Enum(EnumEditor::new(view, at, desc)),
			(FieldKind::DynamicEnum, _) => FieldEditor::DynamicEnum(DynamicEnumEditor::new(view, at, desc)),
			(FieldKind::String, Some(EditorHint::MultiLine)) => FieldEditor::Text(TextEditor::new(view, at, desc)),
			(FieldKind::Integer | FieldKind::Float | FieldKind::String, _) => {
				FieldEditor::Entry(EntryEditor::new(view, at, desc))
			}
			(FieldKind::Timestamp, _) => FieldEditor::Timestamp(TimestampEditor::new(view, at, desc)),
			(FieldKind::RawBytes, _) => FieldEditor::RawBytes(RawBytesEditor::new(view, at, desc)),
			(FieldKind::Pad | FieldKind::Void, _) => return None,
		};
		Some(editor)
	}

	/// Kind of editor, for diagnostics.
	pub fn kind_name(&self) -> &'static str {
		match self {
			FieldEditor::Struct(_) => "struct",
			FieldEditor::Array(_) => "array",
			FieldEditor::Union(_) => "union",
			FieldEditor::BoolMask(_) => "bool_mask",
			FieldEditor::Enum(_) => "enum",
			FieldEditor::DynamicEnum(_) => "dynamic_enum",
			FieldEditor::Entry(_) => "entry",
			FieldEditor::Text(_) => "text",
			FieldEditor::Timestamp(_) => "timestamp",
			FieldEditor::RawBytes(_) => "raw_bytes",
			FieldEditor::Color(_) => "color",
		}
	}

	/// Direct child editors.
	pub fn children_mut(&mut self) -> Box<dyn Iterator<Item = &mut FieldEditor> + '_> {
		match self {
			FieldEditor::Struct(e) => Box::new(e.children_mut()),
			FieldEditor::Color(e) => Box::new(e.channels_mut()),
			FieldEditor::Array(e) => Box::new(e.child_mut().into_iter()),
			FieldEditor::Union(e) => Box::new(e.child_mut().into_iter()),
			_ => Box::new(std::iter::empty()),
		}
	}

	/// Editor bound to the node at `at`, searching this subtree.
	pub fn find_mut(&mut self, at: &TreePath) -> Option<&mut FieldEditor> {
		if self.path() == at {
			return Some(self);
		}
		for child in self.children_mut() {
			if at.starts_with(child.path()) {
				return child.find_mut(at);
			}
		}
		None
	}

	/// Marks the editor at `at` and every editor above it as edited.
	pub fn mark_edited_along(&mut self, at: &TreePath) {
		if !at.starts_with(self.path()) {
			return;
		}
		self.frame_mut().mark_edited();
		for child in self.children_mut() {
			if at.starts_with(child.path()) {
				child.mark_edited_along(at);
				break;
			}
		}
	}

	pub fn as_struct_mut(&mut self) -> Option<&mut StructEditor> {
		match self {
			FieldEditor::Struct(e) => Some(e),
			_ => None,
		}
	}

	pub fn as_array_mut(&mut self) -> Option<&mut ArrayEditor> {
		match self {
			FieldEditor::Array(e) => Some(e),
			_ => None,
		}
	}

	pub fn as_union_mut(&mut self) -> Option<&mut UnionEditor> {
		match self {
			FieldEditor::Union(e) => Some(e),
			_ => None,
		}
	}

	pub fn as_bool_mask_mut(&mut self) -> Option<&mut BoolMaskEditor> {
		match self {
			FieldEditor::BoolMask(e) => Some(e),
			_ => None,
		}
	}

	pub fn as_entry_mut(&mut self) -> Option<&mut EntryEditor> {
		match self {
			FieldEditor::Entry(e) => Some(e),
			_ => None,
		}
	}

	pub fn as_enum_mut(&mut self) -> Option<&mut EnumEditor> {
		match self {
			FieldEditor::Enum(e) => Some(e),
			_ => None,
		}
	}

	pub fn as_dynamic_enum_mut(&mut self) -> Option<&mut DynamicEnumEditor> {
		match self {
			FieldEditor::DynamicEnum(e) => Some(e),
			_ => None,
		}
	}

	pub fn as_text_mut(&mut self) -> Option<&mut TextEditor> {
		match self {
			FieldEditor::Text(e) => Some(e),
			_ => None,
		}
	}

	pub fn as_timestamp_mut(&mut self) -> Option<&mut TimestampEditor> {
		match self {
			FieldEditor::Timestamp(e) => Some(e),
			_ => None,
		}
	}

	pub fn as_raw_bytes_mut(&mut self) -> Option<&mut RawBytesEditor> {
		match self {
			FieldEditor::RawBytes(e) => Some(e),
			_ => None,
		}
	}

	pub fn as_color_mut(&mut self) -> Option<&mut ColorEditor> {
		match self {
			FieldEditor::Color(e) => Some(e),
			_ => None,
		}
	}
}

impl Field for FieldEditor {
	fn frame(&self) -> &Frame {
		dispatch!(self, e => e.frame())
	}

	fn frame_mut(&mut self) -> &mut Frame {
		dispatch!(self, e => e.frame_mut())
	}

	fn load(&mut self, view: View<'_>, at: &TreePath) -> bool {
		dispatch!(self, e => e.load(view, at))
	}

	fn reload(&mut self, view: View<'_>) {
		dispatch!(self, e => e.reload(view))
	}

	fn flush(&mut self, ctx: &mut EditContext<'_>) -> Result<FlushOutcome, FieldError> {
		dispatch!(self, e => e.flush(ctx))
	}

	fn set_disabled(&mut self, disabled: bool) {
		dispatch!(self, e => e.set_disabled(disabled))
	}

	fn apply_style(&mut self, style: &Style, seen: &mut HashSet<FieldId>) {
		dispatch!(self, e => e.apply_style(style, seen))
	}
}

/// Rebinds `editor` to `at`, replacing it when its layout no longer fits.
///
/// Returns `false` when nothing can edit the node any more.
pub(crate) fn load_or_rebuild(editor: &mut FieldEditor, view: View<'_>, at: &TreePath) -> bool {
	if !editor.load(view, at) {
		return true;
	}
	let disabled = editor.frame().is_disabled();
	match FieldEditor::build(view, at) {
		Some(mut rebuilt) => {
			if disabled {
				rebuilt.set_disabled(true);
			}
			*editor = rebuilt;
			true
		}
		None => false,
	}
}

/// Flushes every editor in `children`, merging the outcomes.
pub(crate) fn flush_all<'e>(
	children: impl Iterator<Item = &'e mut FieldEditor>,
	ctx: &mut EditContext<'_>,
) -> Result<FlushOutcome, FieldError> {
	let mut outcome = FlushOutcome::Unchanged;
	for child in children {
		outcome = outcome.merge(child.flush(ctx)?);
	}
	Ok(outcome)
}
