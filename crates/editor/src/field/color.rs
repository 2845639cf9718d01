//! Color editor: channel entries plus a swatch that sets every channel at once.

use std::collections::HashSet;
use std::sync::Arc;

use binilla_config::{Rgb, Style};
use binilla_history::Change;
use binilla_node::{Node, TreePath};
use binilla_schema::{Descriptor, Shape, Value};

use super::{Field, FieldEditor, FieldId, FlushOutcome, Frame, StructEditor};
use crate::context::{EditContext, View};
use crate::error::FieldError;

const CHANNELS: [&str; 3] = ["r", "g", "b"];
const ALPHA: &str = "a";

/// Editor for structs hinted as colors.
#[derive(Debug)]
pub struct ColorEditor {
	channels: StructEditor,
}

/// Channel value as 0..=255, reading floats as 0.0..=1.0.
fn channel_byte(node: &Node) -> Option<u8> {
	match node.value()? {
		Value::Int(v) => Some((*v).clamp(0, 255) as u8),
		Value::Float(v) => Some((v.clamp(0.0, 1.0) * 255.0).round() as u8),
		_ => None,
	}
}

/// Stored value for `byte` in a channel shaped like `node`.
fn channel_value(node: &Node, byte: u8) -> Option<Value> {
	match &node.desc().shape {
		Shape::Integer { .. } => Some(Value::Int(i128::from(byte))),
		Shape::Float { encoding, .. } => Some(Value::Float(encoding.quantize(f64::from(byte) / 255.0))),
		_ => None,
	}
}

impl ColorEditor {
	pub(crate) fn new(view: View<'_>, at: &TreePath, desc: &Arc<Descriptor>) -> Self {
		Self {
			channels: StructEditor::new(view, at, desc),
		}
	}

	pub fn channels(&self) -> &StructEditor {
		&self.channels
	}

	pub(crate) fn channels_mut(&mut self) -> impl Iterator<Item = &mut FieldEditor> {
		self.channels.children_mut()
	}

	/// Swatch color, when every channel reads as a number.
	pub fn rgb(&self, view: View<'_>) -> Option<Rgb> {
		let node = self.channels.frame().node(view)?;
		let [r, g, b] = CHANNELS.map(|name| node.get(name).and_then(channel_byte));
		Some(Rgb::new(r?, g?, b?))
	}

	/// Alpha channel as 0..=255, for colors that have one.
	pub fn alpha(&self, view: View<'_>) -> Option<u8> {
		self.channels.frame().node(view)?.get(ALPHA).and_then(channel_byte)
	}

	/// Sets the red, green and blue channels in one composite edit.
	pub fn pick(&mut self, ctx: &mut EditContext<'_>, color: Rgb) -> Result<(), FieldError> {
		self.set_channels(ctx, &[("r", color.r), ("g", color.g), ("b", color.b)])
	}

	/// Like [`ColorEditor::pick`], also setting alpha when the color has an
	/// `a` channel.
	pub fn pick_rgba(&mut self, ctx: &mut EditContext<'_>, color: Rgb, alpha: u8) -> Result<(), FieldError> {
		self.set_channels(ctx, &[("r", color.r), ("g", color.g), ("b", color.b), (ALPHA, alpha)])
	}

	fn set_channels(&mut self, ctx: &mut EditContext<'_>, bytes: &[(&str, u8)]) -> Result<(), FieldError> {
		let frame = self.channels.frame();
		frame.check_interactive()?;
		let node = frame
			.node(ctx.view())
			.ok_or(FieldError::Unavailable("the field is no longer in the document"))?;
		let mut children = Vec::new();
		for &(name, byte) in bytes {
			let Some(index) = node.index_of(name) else {
				continue;
			};
			let Some(channel) = node.child(index) else {
				continue;
			};
			let (Some(current), Some(value)) = (channel.value(), channel_value(channel, byte)) else {
				continue;
			};
			if *current != value {
				children.push((index, current.clone(), value));
			}
		}
		if children.is_empty() {
			return Ok(());
		}
		let state = frame.state(Change::Composite { children })?;
		ctx.submit(state)?;
		self.channels.frame_mut().mark_edited();
		self.channels.reload(ctx.view());
		Ok(())
	}
}

impl Field for ColorEditor {
	fn frame(&self) -> &Frame {
		self.channels.frame()
	}

	fn frame_mut(&mut self) -> &mut Frame {
		self.channels.frame_mut()
	}

	fn load(&mut self, view: View<'_>, at: &TreePath) -> bool {
		self.channels.load(view, at)
	}

	fn reload(&mut self, view: View<'_>) {
		self.channels.reload(view);
	}

	fn flush(&mut self, ctx: &mut EditContext<'_>) -> Result<FlushOutcome, FieldError> {
		self.channels.flush(ctx)
	}

	fn set_disabled(&mut self, disabled: bool) {
		self.channels.set_disabled(disabled);
	}

	fn apply_style(&mut self, style: &Style, seen: &mut HashSet<FieldId>) {
		self.channels.apply_style(style, seen);
	}
}
