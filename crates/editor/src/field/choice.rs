//! Bool-mask, enum and dynamic-enum editors.
//!
//! All three commit immediately on interaction, so `flush` never has
//! anything pending.

use std::collections::HashSet;
use std::sync::Arc;

use binilla_config::Style;
use binilla_history::Change;
use binilla_node::{Node, TreePath};
use binilla_schema::{Descriptor, Shape};
use tracing::debug;

use super::{Field, FieldId, FlushOutcome, Frame};
use crate::context::{EditContext, View};
use crate::error::FieldError;

/// One checkbox of a bool-mask editor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoolBit {
	pub bit: u8,
	pub name: String,
	pub tooltip: Option<String>,
	pub editable: bool,
}

/// Editor for bool-mask nodes: one checkbox per visible bit.
#[derive(Debug)]
pub struct BoolMaskEditor {
	frame: Frame,
	bits: Arc<[BoolBit]>,
	/// Descriptor identity and `show_all_bools` the bits were computed for.
	bits_key: (usize, bool),
}

fn desc_key(desc: &Arc<Descriptor>) -> usize {
	Arc::as_ptr(desc) as usize
}

impl BoolMaskEditor {
	pub(crate) fn new(view: View<'_>, at: &TreePath, desc: &Arc<Descriptor>) -> Self {
		let show_all = view.settings.show_all_bools;
		Self {
			frame: Frame::new(at, desc),
			bits: Self::compute_bits(desc, show_all, view.settings.show_invisible),
			bits_key: (desc_key(desc), show_all),
		}
	}

	fn compute_bits(desc: &Descriptor, show_all: bool, show_invisible: bool) -> Arc<[BoolBit]> {
		let Shape::BoolMask { encoding, options } = &desc.shape else {
			return Arc::from(Vec::new());
		};
		let named = |bit: u8| options.get(&bit);
		(0..encoding.bits)
			.filter_map(|bit| match named(bit) {
				Some(option) if option.visible || show_all || show_invisible => Some(BoolBit {
					bit,
					name: option.name.clone(),
					tooltip: option.tooltip.clone(),
					editable: option.editable,
				}),
				None if show_all => Some(BoolBit {
					bit,
					name: format!("bit {bit}"),
					tooltip: None,
					editable: true,
				}),
				_ => None,
			})
			.collect()
	}

	/// The checkboxes, recomputed only when the descriptor or the
	/// `show_all_bools` override changes.
	pub fn bits(&mut self, view: View<'_>) -> &[BoolBit] {
		let key = (desc_key(self.frame.desc()), view.settings.show_all_bools);
		if key != self.bits_key {
			self.bits = Self::compute_bits(self.frame.desc(), key.1, view.settings.show_invisible);
			self.bits_key = key;
		}
		&self.bits
	}

	pub fn is_set(&self, view: View<'_>, bit: u8) -> bool {
		self.frame
			.node(view)
			.and_then(Node::int)
			.is_some_and(|value| value & (1i128 << bit) != 0)
	}

	/// Flips one bit.
	pub fn toggle(&mut self, ctx: &mut EditContext<'_>, bit: u8) -> Result<(), FieldError> {
		self.frame.check_interactive()?;
		let editable = self.bits(ctx.view()).iter().find(|b| b.bit == bit).map(|b| b.editable);
		match editable {
			Some(true) => {}
			Some(false) => return Err(FieldError::ReadOnly(format!("{} bit {bit}", self.frame.desc().name))),
			None => return Err(FieldError::Unavailable("the bit is not shown")),
		}
		let current = self.is_set(ctx.view(), bit);
		let state = self.frame.state(Change::BoolSet {
			mask: 1u64 << bit,
			undo: current,
			redo: !current,
		})?;
		ctx.submit(state)?;
		self.frame.mark_edited();
		Ok(())
	}
}

impl Field for BoolMaskEditor {
	fn frame(&self) -> &Frame {
		&self.frame
	}

	fn frame_mut(&mut self) -> &mut Frame {
		&mut self.frame
	}

	fn load(&mut self, view: View<'_>, at: &TreePath) -> bool {
		self.frame.load_leaf(view, at)
	}

	fn reload(&mut self, _view: View<'_>) {}

	fn flush(&mut self, _ctx: &mut EditContext<'_>) -> Result<FlushOutcome, FieldError> {
		Ok(FlushOutcome::Unchanged)
	}

	fn set_disabled(&mut self, disabled: bool) {
		self.frame.disabled = disabled;
	}

	fn apply_style(&mut self, style: &Style, seen: &mut HashSet<FieldId>) {
		if self.frame.first_visit(seen) {
			self.frame.style(style.widths.entry, style.padding);
		}
	}
}

/// Editor for enum nodes.
#[derive(Debug)]
pub struct EnumEditor {
	frame: Frame,
}

impl EnumEditor {
	pub(crate) fn new(_view: View<'_>, at: &TreePath, desc: &Arc<Descriptor>) -> Self {
		Self {
			frame: Frame::new(at, desc),
		}
	}

	/// Dropdown entries as `(value, name)`.
	pub fn options(&self, view: View<'_>) -> Vec<(i128, String)> {
		let Shape::Enum { options, .. } = &self.frame.desc().shape else {
			return Vec::new();
		};
		options
			.iter()
			.filter(|o| o.visible || view.settings.show_invisible)
			.map(|o| (o.value, o.name.clone()))
			.collect()
	}

	/// Dropdown index of the stored value, `-1` when it is not a known option.
	pub fn selection(&self, view: View<'_>) -> isize {
		let Some(value) = self.frame.node(view).and_then(Node::int) else {
			return -1;
		};
		self.options(view)
			.iter()
			.position(|(v, _)| *v == value)
			.map_or(-1, |i| i as isize)
	}

	/// Text shown in the closed dropdown.
	pub fn current_label(&self, view: View<'_>) -> String {
		match self.frame.node(view).and_then(Node::int) {
			Some(value) => match self.frame.desc().enum_option(value) {
				Some(option) => option.name.clone(),
				None => format!("<invalid: {value}>"),
			},
			None => String::new(),
		}
	}

	/// Stores the option at dropdown index `index`.
	pub fn select(&mut self, ctx: &mut EditContext<'_>, index: usize) -> Result<(), FieldError> {
		let value = self
			.options(ctx.view())
			.get(index)
			.map(|(v, _)| *v)
			.ok_or(FieldError::Unavailable("no such enum option"))?;
		commit_int(&mut self.frame, ctx, value)
	}
}

/// Records an enum-set from the stored value to `value`.
fn commit_int(frame: &mut Frame, ctx: &mut EditContext<'_>, value: i128) -> Result<(), FieldError> {
	frame.check_interactive()?;
	let current = frame
		.node(ctx.view())
		.and_then(Node::int)
		.ok_or(FieldError::Unavailable("the field is no longer in the document"))?;
	if current == value {
		return Ok(());
	}
	let state = frame.state(Change::EnumSet {
		undo: current,
		redo: value,
	})?;
	ctx.submit(state)?;
	frame.mark_edited();
	Ok(())
}

impl Field for EnumEditor {
	fn frame(&self) -> &Frame {
		&self.frame
	}

	fn frame_mut(&mut self) -> &mut Frame {
		&mut self.frame
	}

	fn load(&mut self, view: View<'_>, at: &TreePath) -> bool {
		self.frame.load_leaf(view, at)
	}

	fn reload(&mut self, _view: View<'_>) {}

	fn flush(&mut self, _ctx: &mut EditContext<'_>) -> Result<FlushOutcome, FieldError> {
		Ok(FlushOutcome::Unchanged)
	}

	fn set_disabled(&mut self, disabled: bool) {
		self.frame.disabled = disabled;
	}

	fn apply_style(&mut self, style: &Style, seen: &mut HashSet<FieldId>) {
		if self.frame.first_visit(seen) {
			self.frame.style(style.widths.enum_menu, style.padding);
		}
	}
}

/// Editor for dynamic-enum nodes: options are labels of a neighbor array's
/// elements, keyed by element index.
#[derive(Debug)]
pub struct DynamicEnumEditor {
	frame: Frame,
	options: Vec<(i128, String)>,
	options_stale: bool,
}

impl DynamicEnumEditor {
	pub(crate) fn new(_view: View<'_>, at: &TreePath, desc: &Arc<Descriptor>) -> Self {
		Self {
			frame: Frame::new(at, desc),
			options: Vec::new(),
			options_stale: true,
		}
	}

	fn option_labels(&self, view: View<'_>) -> Vec<(i128, String)> {
		let Shape::DynamicEnum { encoding, source } = &self.frame.desc().shape else {
			return Vec::new();
		};
		let mut options = Vec::new();
		if encoding.signed {
			options.push((-1, "-1. NONE".to_string()));
		}
		match view.root.dynamic_names(self.frame.path(), source) {
			Ok(names) => options.extend(names.into_iter().enumerate().map(|(i, name)| {
				let label = match name {
					Some(name) => format!("{i}. {name}"),
					None => i.to_string(),
				};
				(i as i128, label)
			})),
			Err(e) => debug!(field = %self.frame.path(), error = %e, "dynamic enum options unavailable"),
		}
		options
	}

	/// Dropdown entries as `(value, label)`.
	pub fn options(&mut self, view: View<'_>) -> &[(i128, String)] {
		if self.options_stale {
			self.options = self.option_labels(view);
			self.options_stale = false;
		}
		&self.options
	}

	/// Focus moved; labels are recomputed on next use.
	pub fn focus_changed(&mut self) {
		self.options_stale = true;
	}

	/// Dropdown index of the stored value, `-1` when no option matches.
	pub fn selection(&mut self, view: View<'_>) -> isize {
		let Some(value) = self.frame.node(view).and_then(Node::int) else {
			return -1;
		};
		self.options(view)
			.iter()
			.position(|(v, _)| *v == value)
			.map_or(-1, |i| i as isize)
	}

	/// Stores the option at dropdown index `index`.
	pub fn select(&mut self, ctx: &mut EditContext<'_>, index: usize) -> Result<(), FieldError> {
		let value = self
			.options(ctx.view())
			.get(index)
			.map(|(v, _)| *v)
			.ok_or(FieldError::Unavailable("no such option"))?;
		commit_int(&mut self.frame, ctx, value)
	}
}

impl Field for DynamicEnumEditor {
	fn frame(&self) -> &Frame {
		&self.frame
	}

	fn frame_mut(&mut self) -> &mut Frame {
		&mut self.frame
	}

	fn load(&mut self, view: View<'_>, at: &TreePath) -> bool {
		self.options_stale = true;
		self.frame.load_leaf(view, at)
	}

	fn reload(&mut self, _view: View<'_>) {
		self.options_stale = true;
	}

	fn flush(&mut self, _ctx: &mut EditContext<'_>) -> Result<FlushOutcome, FieldError> {
		Ok(FlushOutcome::Unchanged)
	}

	fn set_disabled(&mut self, disabled: bool) {
		self.frame.disabled = disabled;
	}

	fn apply_style(&mut self, style: &Style, seen: &mut HashSet<FieldId>) {
		if self.frame.first_visit(seen) {
			self.frame.style(style.widths.enum_menu, style.padding);
		}
	}
}
