//! Union editor: a case dropdown over the active case's editor.

use std::collections::HashSet;
use std::sync::Arc;

use binilla_codec::serialize;
use binilla_config::Style;
use binilla_history::{Change, NeighborChange, UnionState};
use binilla_node::{Node, NodeData, TreePath, UnionBody};
use binilla_schema::{Descriptor, Shape, Value};
use tracing::debug;

use super::{Field, FieldEditor, FieldId, FlushOutcome, Frame, load_or_rebuild, same_layout};
use crate::context::{EditContext, View};
use crate::error::FieldError;

/// Dropdown label of the raw-bytes case.
pub const RAW_CASE_LABEL: &str = "<raw bytes>";

/// Editor for union nodes.
#[derive(Debug)]
pub struct UnionEditor {
	frame: Frame,
	child: Option<Box<FieldEditor>>,
}

impl UnionEditor {
	pub(crate) fn new(view: View<'_>, at: &TreePath, desc: &Arc<Descriptor>) -> Self {
		let mut editor = Self {
			frame: Frame::new(at, desc),
			child: None,
		};
		editor.rebuild_child(view);
		editor
	}

	pub fn child(&self) -> Option<&FieldEditor> {
		self.child.as_deref()
	}

	pub(crate) fn child_mut(&mut self) -> Option<&mut FieldEditor> {
		self.child.as_deref_mut()
	}

	/// Active discriminator; `None` when the body is raw bytes.
	pub fn active_case(&self, view: View<'_>) -> Option<i64> {
		self.frame.node(view).and_then(Node::union_case).flatten()
	}

	/// Dropdown entries: every declared case, then the raw-bytes sentinel.
	pub fn options(&self) -> Vec<(Option<i64>, String)> {
		let Shape::Union { cases, .. } = &self.frame.desc().shape else {
			return Vec::new();
		};
		cases
			.iter()
			.map(|(case, desc)| (Some(*case), desc.label().to_string()))
			.chain(std::iter::once((None, RAW_CASE_LABEL.to_string())))
			.collect()
	}

	fn rebuild_child(&mut self, view: View<'_>) {
		let at = self.frame.path().child(0);
		let has_body = self.frame.node(view).is_some_and(|node| !node.children().is_empty());
		self.child = if has_body {
			FieldEditor::build(view, &at).map(Box::new)
		} else {
			None
		};
		if let Some(child) = self.child.as_deref_mut() {
			child.set_disabled(self.frame.is_disabled());
		}
	}

	/// Switches the union to `case`, or to its raw bytes with `None`.
	///
	/// Switching to raw keeps the current byte image. Switching to a case
	/// starts from that case's defaults and updates the case neighbor.
	pub fn switch_case(&mut self, ctx: &mut EditContext<'_>, case: Option<i64>) -> Result<(), FieldError> {
		self.frame.check_interactive()?;
		let at = self.frame.path().clone();
		let node = ctx
			.root
			.at(&at)
			.ok_or(FieldError::Unavailable("the field is no longer in the document"))?;
		let NodeData::Union { case: current, body } = node.data() else {
			return Err(FieldError::Unavailable("the field is not a union"));
		};
		if *current == case {
			return Ok(());
		}
		let Shape::Union { cases, case_path, .. } = &node.desc().shape else {
			return Err(FieldError::Unavailable("the field is not a union"));
		};

		let redo_body = match case {
			None => UnionBody::Raw(serialize(node)?),
			Some(key) => {
				let case_desc = cases
					.get(&key)
					.ok_or(FieldError::Unavailable("the union has no such case"))?;
				UnionBody::Active(Box::new(Node::default_for(case_desc)))
			}
		};

		let case_neighbor = match (case, case_path) {
			(Some(key), Some(path)) => match ctx.root.neighbor(&at, path) {
				Ok(neighbor_at) => ctx
					.root
					.at(&neighbor_at)
					.and_then(Node::value)
					.filter(|value| value.as_int() != Some(i128::from(key)))
					.map(|value| NeighborChange {
						path: neighbor_at.clone(),
						undo: value.clone(),
						redo: Value::Int(i128::from(key)),
					}),
				Err(e) => {
					debug!(field = %at, error = %e, "union case neighbor unavailable");
					None
				}
			},
			_ => None,
		};

		let change = Change::UnionSwitch {
			undo: UnionState {
				case: *current,
				body: body.clone(),
			},
			redo: UnionState { case, body: redo_body },
			case_neighbor,
		};
		let state = self.frame.state(change)?;
		ctx.submit(state)?;
		self.frame.mark_edited();
		self.rebuild_child(ctx.view());
		Ok(())
	}
}

impl Field for UnionEditor {
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
		let kept = match self.child.as_deref_mut() {
			Some(child) if !node.children().is_empty() => load_or_rebuild(child, view, &at.child(0)),
			_ => false,
		};
		if !kept {
			self.rebuild_child(view);
		}
		false
	}

	fn reload(&mut self, view: View<'_>) {
		let path = self.frame.path().clone();
		if self.load(view, &path) {
			self.rebuild_child(view);
		}
	}

	fn flush(&mut self, ctx: &mut EditContext<'_>) -> Result<FlushOutcome, FieldError> {
		let outcome = match self.child.as_deref_mut() {
			Some(child) => child.flush(ctx)?,
			None => FlushOutcome::Unchanged,
		};
		if outcome == FlushOutcome::Committed {
			self.frame.mark_edited();
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
		self.frame.style(style.widths.enum_menu, style.padding);
		if let Some(child) = self.child.as_deref_mut() {
			child.apply_style(style, seen);
		}
	}
}
