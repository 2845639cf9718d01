//! Struct editor: one child editor per visible field.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use std::sync::Arc;

use binilla_codec::{parse, serialize};
use binilla_config::{Padding, Style};
use binilla_history::Change;
use binilla_node::TreePath;
use binilla_schema::Descriptor;
use tracing::{debug, warn};

use super::{Field, FieldEditor, FieldId, FlushOutcome, Frame, flush_all, load_or_rebuild, same_layout};
use crate::context::{EditContext, View};
use crate::error::FieldError;

/// Editor for struct and stream-adapter nodes.
#[derive(Debug)]
pub struct StructEditor {
	frame: Frame,
	/// Child editors keyed by attr index; hidden fields have none.
	children: BTreeMap<usize, FieldEditor>,
}

impl StructEditor {
	pub(crate) fn new(view: View<'_>, at: &TreePath, desc: &Arc<Descriptor>) -> Self {
		let mut editor = Self {
			frame: Frame::new(at, desc),
			children: BTreeMap::new(),
		};
		editor.populate(view);
		editor
	}

	/// Drops every child editor and builds them again from the node.
	pub fn populate(&mut self, view: View<'_>) {
		self.children = self.build_children(view, &self.visible_indices(view));
	}

	fn visible_indices(&self, view: View<'_>) -> Vec<usize> {
		let Some(node) = self.frame.node(view) else {
			return Vec::new();
		};
		node.children()
			.iter()
			.enumerate()
			.filter(|(_, child)| view.is_visible(child))
			.map(|(i, _)| i)
			.collect()
	}

	fn build_children(&self, view: View<'_>, indices: &[usize]) -> BTreeMap<usize, FieldEditor> {
		let at = self.frame.path();
		let mut children = BTreeMap::new();
		for &i in indices {
			if let Some(mut editor) = FieldEditor::build(view, &at.child(i)) {
				if self.frame.is_disabled() {
					editor.set_disabled(true);
				}
				children.insert(i, editor);
			}
		}
		children
	}

	pub fn children(&self) -> &BTreeMap<usize, FieldEditor> {
		&self.children
	}

	pub(crate) fn children_mut(&mut self) -> impl Iterator<Item = &mut FieldEditor> {
		self.children.values_mut()
	}

	pub fn child(&self, index: usize) -> Option<&FieldEditor> {
		self.children.get(&index)
	}

	pub fn child_mut(&mut self, index: usize) -> Option<&mut FieldEditor> {
		self.children.get_mut(&index)
	}

	/// Whether the struct draws its own title frame.
	///
	/// A struct with fewer than two visible children lends its space to the
	/// lone child.
	pub fn shows_title(&self) -> bool {
		self.children.len() >= 2
	}

	/// Padding around the struct's frame, zero when the title is suppressed.
	pub fn effective_padding(&self) -> Padding {
		if self.shows_title() {
			self.frame.padding()
		} else {
			Padding {
				horizontal: 0,
				vertical: 0,
			}
		}
	}

	/// Writes the serialized subtree to `path`, returning the byte count.
	pub fn export(&self, view: View<'_>, path: &Path) -> Result<usize, FieldError> {
		if !self.frame.desc().is_portable() {
			return Err(FieldError::NotPortable(self.frame.desc().name.clone()));
		}
		let node = self
			.frame
			.node(view)
			.ok_or(FieldError::Unavailable("the field is no longer in the document"))?;
		let bytes = serialize(node)?;
		std::fs::write(path, &bytes).map_err(|e| FieldError::io(path, e))?;
		debug!(field = %self.frame.path(), path = %path.display(), len = bytes.len(), "subtree exported");
		Ok(bytes.len())
	}

	/// Replaces the subtree with the contents of `path`.
	pub fn import(&mut self, ctx: &mut EditContext<'_>, path: &Path) -> Result<(), FieldError> {
		self.frame.check_interactive()?;
		if !self.frame.desc().is_portable() {
			return Err(FieldError::NotPortable(self.frame.desc().name.clone()));
		}
		let bytes = std::fs::read(path).map_err(|e| FieldError::io(path, e))?;
		let outcome = parse(self.frame.desc(), &bytes, &ctx.settings.parse_options())?;
		if let Some(diagnostic) = &outcome.diagnostic {
			warn!(field = %self.frame.path(), path = %path.display(), error = %diagnostic, "imported a partial subtree");
		}
		let current = ctx
			.root
			.at(self.frame.path())
			.cloned()
			.ok_or(FieldError::Unavailable("the field is no longer in the document"))?;
		let state = self.frame.state(Change::RawBytesReplace {
			undo: Box::new(current),
			redo: Box::new(outcome.root),
		})?;
		ctx.submit(state)?;
		self.frame.mark_edited();
		self.populate(ctx.view());
		Ok(())
	}
}

impl Field for StructEditor {
	fn frame(&self) -> &Frame {
		&self.frame
	}

	fn frame_mut(&mut self) -> &mut Frame {
		&mut self.frame
	}

	fn load(&mut self, view: View<'_>, at: &TreePath) -> bool {
		let Some(node) = view.root.at(at) else {
			return true;
		};
		if !same_layout(self.frame.desc(), node.desc()) {
			return true;
		}
		self.frame.rebind(at, node.desc());

		let visible = self.visible_indices(view);
		if !visible.iter().eq(self.children.keys()) {
			self.populate(view);
			return false;
		}
		let mut gone = Vec::new();
		for (&i, child) in &mut self.children {
			if !load_or_rebuild(child, view, &at.child(i)) {
				gone.push(i);
			}
		}
		for i in gone {
			self.children.remove(&i);
		}
		false
	}

	fn reload(&mut self, view: View<'_>) {
		for child in self.children.values_mut() {
			child.reload(view);
		}
	}

	fn flush(&mut self, ctx: &mut EditContext<'_>) -> Result<FlushOutcome, FieldError> {
		let outcome = flush_all(self.children.values_mut(), ctx)?;
		if outcome == FlushOutcome::Committed {
			self.frame.mark_edited();
		}
		Ok(outcome)
	}

	fn set_disabled(&mut self, disabled: bool) {
		self.frame.disabled = disabled;
		for child in self.children.values_mut() {
			child.set_disabled(disabled);
		}
	}

	fn apply_style(&mut self, style: &Style, seen: &mut HashSet<FieldId>) {
		if !self.frame.first_visit(seen) {
			return;
		}
		self.frame.style(style.widths.title, style.padding);
		for child in self.children.values_mut() {
			child.apply_style(style, seen);
		}
	}
}
