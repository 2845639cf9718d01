//! Multi-line text editor with reversible escapes for control characters.

use std::collections::HashSet;
use std::fmt::Write as _;
use std::sync::Arc;

use binilla_config::Style;
use binilla_history::Change;
use binilla_node::TreePath;
use binilla_schema::{Descriptor, Shape, SizeSpec, Value};
use tracing::debug;

use super::entry::truncate_to;
use super::{Field, FieldId, FlushOutcome, Frame, stored_value};
use crate::context::{EditContext, View};
use crate::error::FieldError;

const ESCAPE_PREFIX: &str = "\\0x";

/// Renders control characters other than `\n` and `\t` as `\0xNN`.
///
/// A backslash that would read as the start of an escape is itself escaped,
/// so [`unescape_text`] restores the input exactly.
pub fn escape_text(text: &str) -> String {
	let mut out = String::with_capacity(text.len());
	for (i, ch) in text.char_indices() {
		let literal_prefix = ch == '\\' && text[i..].starts_with(ESCAPE_PREFIX);
		if literal_prefix || (ch.is_control() && ch != '\n' && ch != '\t' && u32::from(ch) <= 0xff) {
			let _ = write!(out, "{ESCAPE_PREFIX}{:02X}", u32::from(ch));
		} else {
			out.push(ch);
		}
	}
	out
}

/// Reverses [`escape_text`]. Malformed escapes are kept literally.
pub fn unescape_text(text: &str) -> String {
	let mut out = String::with_capacity(text.len());
	let mut rest = text;
	while let Some(start) = rest.find(ESCAPE_PREFIX) {
		out.push_str(&rest[..start]);
		let after = &rest[start + ESCAPE_PREFIX.len()..];
		let decoded = after
			.get(..2)
			.filter(|hex| hex.bytes().all(|b| b.is_ascii_hexdigit()))
			.and_then(|hex| u8::from_str_radix(hex, 16).ok());
		match decoded {
			Some(byte) => {
				out.push(char::from(byte));
				rest = &after[2..];
			}
			None => {
				out.push_str(ESCAPE_PREFIX);
				rest = after;
			}
		}
	}
	out.push_str(rest);
	out
}

/// Editor for multi-line string fields.
#[derive(Debug)]
pub struct TextEditor {
	frame: Frame,
	text: String,
	pending: bool,
}

impl TextEditor {
	pub(crate) fn new(view: View<'_>, at: &TreePath, desc: &Arc<Descriptor>) -> Self {
		let mut editor = Self {
			frame: Frame::new(at, desc),
			text: String::new(),
			pending: false,
		};
		editor.revert(view);
		editor
	}

	/// The escaped text currently shown.
	pub fn text(&self) -> &str {
		&self.text
	}

	pub fn set_text(&mut self, text: impl Into<String>) {
		self.text = text.into();
		self.pending = true;
	}

	fn revert(&mut self, view: View<'_>) {
		self.text = stored_value(view, self.frame.path())
			.and_then(|value| value.as_str().map(escape_text))
			.unwrap_or_default();
		self.pending = false;
	}

	fn parse(&self) -> Result<String, FieldError> {
		let text = unescape_text(&self.text);
		match &self.frame.desc().shape {
			Shape::String {
				encoding,
				size: SizeSpec::Fixed(limit),
			} => truncate_to(&text, *encoding, *limit),
			Shape::String { encoding, .. } => {
				encoding.encode(&text).map_err(|e| FieldError::parse(&self.text, e))?;
				Ok(text)
			}
			_ => Err(FieldError::Unavailable("the field is not a string")),
		}
	}
}

impl Field for TextEditor {
	fn frame(&self) -> &Frame {
		&self.frame
	}

	fn frame_mut(&mut self) -> &mut Frame {
		&mut self.frame
	}

	fn load(&mut self, view: View<'_>, at: &TreePath) -> bool {
		if self.frame.load_leaf(view, at) {
			return true;
		}
		self.revert(view);
		false
	}

	fn reload(&mut self, view: View<'_>) {
		self.revert(view);
	}

	fn flush(&mut self, ctx: &mut EditContext<'_>) -> Result<FlushOutcome, FieldError> {
		if !self.pending {
			return Ok(FlushOutcome::Unchanged);
		}
		let text = match self.parse() {
			Ok(text) if self.frame.is_interactive() => text,
			Ok(_) => {
				self.revert(ctx.view());
				return Ok(FlushOutcome::Reverted);
			}
			Err(e) if e.is_benign() => {
				debug!(field = %self.frame.path(), error = %e, "text reverted");
				self.revert(ctx.view());
				return Ok(FlushOutcome::Reverted);
			}
			Err(e) => return Err(e),
		};
		let current = stored_value(ctx.view(), self.frame.path())
			.ok_or(FieldError::Unavailable("the field is no longer in the document"))?;
		let value = Value::Str(text);
		if current == value {
			self.revert(ctx.view());
			return Ok(FlushOutcome::Unchanged);
		}
		let state = self.frame.state(Change::ScalarSet {
			undo: current,
			redo: value,
		})?;
		ctx.submit(state)?;
		self.frame.mark_edited();
		self.revert(ctx.view());
		Ok(FlushOutcome::Committed)
	}

	fn set_disabled(&mut self, disabled: bool) {
		self.frame.disabled = disabled;
	}

	fn apply_style(&mut self, style: &Style, seen: &mut HashSet<FieldId>) {
		if self.frame.first_visit(seen) {
			self.frame.style(style.widths.text, style.padding);
		}
	}
}
