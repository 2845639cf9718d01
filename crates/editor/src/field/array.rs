//! Array editor: one selected element at a time.

use std::collections::HashSet;
use std::sync::Arc;

use binilla_config::Style;
use binilla_history::{Change, EditExtra, EditState};
use binilla_node::{Node, TreePath};
use binilla_schema::{Descriptor, DynNamePath, Shape, SizeSpec};
use tracing::debug;

use super::{Field, FieldEditor, FieldId, FlushOutcome, Frame, same_layout};
use crate::context::{EditContext, View};
use crate::error::FieldError;

/// Which array operations are currently available.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ArrayButtons {
	pub shift_up: bool,
	pub shift_down: bool,
	pub add: bool,
	pub insert: bool,
	pub duplicate: bool,
	pub delete: bool,
	pub delete_all: bool,
}

/// Editor for array nodes.
///
/// Exactly one element has an editor at a time, chosen by `selection`
/// (`-1` when the array is empty).
#[derive(Debug)]
pub struct ArrayEditor {
	frame: Frame,
	selection: isize,
	child: Option<Box<FieldEditor>>,
	options: Vec<String>,
	options_stale: bool,
}

/// Clamps `index` into `[-1, len - 1]`, preferring a real element.
fn clamp_selection(index: isize, len: usize) -> isize {
	if len == 0 {
		-1
	} else {
		index.clamp(0, len as isize - 1)
	}
}

impl ArrayEditor {
	pub(crate) fn new(view: View<'_>, at: &TreePath, desc: &Arc<Descriptor>) -> Self {
		let mut editor = Self {
			frame: Frame::new(at, desc),
			selection: -1,
			child: None,
			options: Vec::new(),
			options_stale: true,
		};
		editor.selection = clamp_selection(0, editor.len(view));
		editor.rebuild_child(view);
		editor
	}

	/// Selected element index, `-1` when nothing is selected.
	pub fn selection(&self) -> isize {
		self.selection
	}

	pub(crate) fn child_mut(&mut self) -> Option<&mut FieldEditor> {
		self.child.as_deref_mut()
	}

	pub fn child(&self) -> Option<&FieldEditor> {
		self.child.as_deref()
	}

	fn len(&self, view: View<'_>) -> usize {
		self.frame.node(view).map_or(0, Node::len)
	}

	fn counts(&self) -> (bool, usize, usize) {
		match &self.frame.desc().shape {
			Shape::Array {
				count,
				min_count,
				max_count,
				..
			} => (matches!(count, SizeSpec::Fixed(_)), *min_count, *max_count),
			_ => (true, 0, 0),
		}
	}

	fn dynamic_name_path(&self) -> Option<&DynNamePath> {
		match &self.frame.desc().shape {
			Shape::Array { dynamic_name_path, .. } => dynamic_name_path.as_ref(),
			_ => None,
		}
	}

	/// Whether option labels depend on sibling values and go stale on their own.
	pub fn is_volatile(&self) -> bool {
		self.dynamic_name_path().is_some()
	}

	/// Labels of the selection dropdown, one per element.
	pub fn options(&mut self, view: View<'_>) -> &[String] {
		if self.options_stale || self.is_volatile() {
			self.options = self.option_labels(view);
			self.options_stale = false;
		}
		&self.options
	}

	/// Focus or hover moved; volatile option labels are recomputed.
	pub fn focus_changed(&mut self, view: View<'_>) {
		if self.is_volatile() {
			self.options = self.option_labels(view);
			self.options_stale = false;
		}
	}

	fn option_labels(&self, view: View<'_>) -> Vec<String> {
		let len = self.len(view);
		let Shape::Array {
			element,
			element_names,
			dynamic_name_path,
			..
		} = &self.frame.desc().shape
		else {
			return Vec::new();
		};
		let fallback = |i: usize| format!("{i}. {}", element.label());

		if !element_names.is_empty() {
			return (0..len)
				.map(|i| element_names.get(i).cloned().unwrap_or_else(|| fallback(i)))
				.collect();
		}
		let dynamic = dynamic_name_path.as_ref().and_then(|path| {
			view.root
				.dynamic_names(self.frame.path(), path)
				.map_err(|e| debug!(field = %self.frame.path(), error = %e, "dynamic names unavailable"))
				.ok()
		});
		(0..len)
			.map(|i| match dynamic.as_ref().and_then(|names| names.get(i).cloned().flatten()) {
				Some(name) => format!("{i}. {name}"),
				None => fallback(i),
			})
			.collect()
	}

	/// Operations available for the current length and selection.
	pub fn buttons(&self, view: View<'_>) -> ArrayButtons {
		if !self.frame.is_interactive() {
			return ArrayButtons::default();
		}
		let len = self.len(view);
		let (fixed, min_count, max_count) = self.counts();
		let settings = view.settings;
		let can_grow = !fixed && !(settings.enforce_max && len >= max_count);
		let can_shrink = !fixed && !(settings.enforce_min && len <= min_count);
		let selected = self.selection >= 0;
		ArrayButtons {
			shift_up: self.selection > 0,
			shift_down: selected && (self.selection as usize) + 1 < len,
			add: can_grow,
			insert: can_grow,
			duplicate: can_grow && selected,
			delete: can_shrink && selected,
			delete_all: !fixed && len > 0 && !(settings.enforce_min && min_count > 0),
		}
	}

	/// Shows the element at `index`, clamped to the array.
	pub fn select(&mut self, view: View<'_>, index: isize) {
		let index = clamp_selection(index, self.len(view));
		if index != self.selection {
			self.selection = index;
			self.rebuild_child(view);
		}
	}

	/// Sets the selection recorded by an undone or redone edit.
	pub fn restore_selection(&mut self, view: View<'_>, index: isize) {
		self.selection = clamp_selection(index, self.len(view));
		self.options_stale = true;
		self.rebuild_child(view);
	}

	fn rebuild_child(&mut self, view: View<'_>) {
		if self.selection < 0 {
			self.child = None;
			return;
		}
		let at = self.frame.path().child(self.selection as usize);
		let reused = match self.child.as_deref_mut() {
			Some(child) => !child.load(view, &at),
			None => false,
		};
		if !reused {
			self.child = FieldEditor::build(view, &at).map(Box::new);
		}
		if let Some(child) = self.child.as_deref_mut() {
			child.set_disabled(self.frame.is_disabled());
		}
	}

	fn selected(&self) -> Result<usize, FieldError> {
		usize::try_from(self.selection).map_err(|_| FieldError::Unavailable("no array element is selected"))
	}

	fn element_at(&self, ctx: &EditContext<'_>, index: usize) -> Result<Node, FieldError> {
		ctx.root
			.at(&self.frame.path().child(index))
			.cloned()
			.ok_or(FieldError::Unavailable("the selected element is gone"))
	}

	fn element_desc(&self) -> Result<&Arc<Descriptor>, FieldError> {
		match &self.frame.desc().shape {
			Shape::Array { element, .. } => Ok(element),
			_ => Err(FieldError::Unavailable("the field is not an array")),
		}
	}

	fn commit(&mut self, ctx: &mut EditContext<'_>, change: Change, after: isize) -> Result<(), FieldError> {
		self.frame.check_interactive()?;
		let state: EditState = self.frame.state(change)?.with_extra(EditExtra::selection(self.selection, after));
		ctx.submit(state)?;
		self.frame.mark_edited();
		self.restore_selection(ctx.view(), after);
		Ok(())
	}

	/// Swaps the selected element with the one above it.
	pub fn shift_up(&mut self, ctx: &mut EditContext<'_>) -> Result<(), FieldError> {
		let index = self.selected()?;
		if index == 0 {
			return Err(FieldError::Unavailable("the first element cannot move up"));
		}
		self.commit(ctx, Change::ArrayShiftUp { index }, index as isize - 1)
	}

	/// Swaps the selected element with the one below it.
	pub fn shift_down(&mut self, ctx: &mut EditContext<'_>) -> Result<(), FieldError> {
		let index = self.selected()?;
		if index + 1 >= self.len(ctx.view()) {
			return Err(FieldError::Unavailable("the last element cannot move down"));
		}
		self.commit(ctx, Change::ArrayShiftDown { index }, index as isize + 1)
	}

	/// Appends a default element and selects it.
	pub fn add(&mut self, ctx: &mut EditContext<'_>) -> Result<(), FieldError> {
		let node = Node::default_for(self.element_desc()?);
		let after = self.len(ctx.view()) as isize;
		self.commit(ctx, Change::ArrayAdd { node }, after)
	}

	/// Inserts a default element at the selection.
	pub fn insert(&mut self, ctx: &mut EditContext<'_>) -> Result<(), FieldError> {
		let node = Node::default_for(self.element_desc()?);
		let index = self.selection.max(0) as usize;
		self.commit(ctx, Change::ArrayInsert { index, node }, index as isize)
	}

	/// Inserts a deep copy of the selected element after it and selects the copy.
	pub fn duplicate(&mut self, ctx: &mut EditContext<'_>) -> Result<(), FieldError> {
		let index = self.selected()?;
		let node = self.element_at(ctx, index)?;
		self.commit(ctx, Change::ArrayDuplicate { index, node }, index as isize + 1)
	}

	/// Removes the selected element.
	pub fn delete(&mut self, ctx: &mut EditContext<'_>) -> Result<(), FieldError> {
		let index = self.selected()?;
		let node = self.element_at(ctx, index)?;
		let after = clamp_selection(index as isize, self.len(ctx.view()) - 1);
		self.commit(ctx, Change::ArrayDelete { index, node }, after)
	}

	/// Removes every element.
	pub fn delete_all(&mut self, ctx: &mut EditContext<'_>) -> Result<(), FieldError> {
		let nodes = self
			.frame
			.node(ctx.view())
			.map(|array| array.children().to_vec())
			.unwrap_or_default();
		self.commit(ctx, Change::ArrayDeleteAll { nodes }, -1)
	}
}

impl Field for ArrayEditor {
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
		self.options_stale = true;
		self.selection = clamp_selection(self.selection.max(0), node.len());
		self.rebuild_child(view);
		false
	}

	fn reload(&mut self, view: View<'_>) {
		self.options_stale = true;
		let selection = clamp_selection(self.selection.max(0), self.len(view));
		if selection != self.selection || self.child.is_none() {
			self.selection = selection;
			self.rebuild_child(view);
		} else if let Some(child) = self.child.as_deref_mut() {
			child.reload(view);
		}
	}

	fn flush(&mut self, ctx: &mut EditContext<'_>) -> Result<FlushOutcome, FieldError> {
		let outcome = match self.child.as_deref_mut() {
			Some(child) => child.flush(ctx)?,
			None => FlushOutcome::Unchanged,
		};
		if outcome == FlushOutcome::Committed {
			self.frame.mark_edited();
			self.options_stale = true;
		}
		Ok(outcome)
	}

	fn set_disabled(&mut self, disabled: bool) {
		self.frame.disabled = disabled;
		if let Some(child) = self.child.as_deref_mut() {
			child.set_disabled(disabled);
		}
	}

	fn apply_style(&mut self, style: &Style, seen: &mut HashSet<FieldId>) {
		if !self.frame.first_visit(seen) {
			return;
		}
		self.frame.style(style.widths.scroll_menu, style.padding);
		if let Some(child) = self.child.as_deref_mut() {
			child.apply_style(style, seen);
		}
	}
}
