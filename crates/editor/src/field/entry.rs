//! Single-line entry for integer, float and string fields.

use std::collections::HashSet;
use std::sync::Arc;

use binilla_config::Style;
use binilla_expr::{Number, evaluate};
use binilla_history::Change;
use binilla_node::TreePath;
use binilla_schema::{Descriptor, Shape, SizeSpec, StrEncoding, Value};
use tracing::{debug, warn};

use super::{Field, FieldId, FlushOutcome, Frame, stored_value};
use crate::context::{EditContext, View};
use crate::error::FieldError;

/// Editor holding the text of one scalar field.
///
/// Typing only changes the pending text; [`Field::flush`] parses it and
/// records the edit.
#[derive(Debug)]
pub struct EntryEditor {
	frame: Frame,
	text: String,
	pending: bool,
}

impl EntryEditor {
	pub(crate) fn new(view: View<'_>, at: &TreePath, desc: &Arc<Descriptor>) -> Self {
		let mut editor = Self {
			frame: Frame::new(at, desc),
			text: String::new(),
			pending: false,
		};
		editor.text = editor.display(view);
		editor
	}

	/// The text currently shown.
	pub fn text(&self) -> &str {
		&self.text
	}

	/// Whether typed text is waiting for a flush.
	pub fn is_pending(&self) -> bool {
		self.pending
	}

	/// Replaces the shown text as if the user typed it.
	pub fn set_text(&mut self, text: impl Into<String>) {
		self.text = text.into();
		self.pending = true;
	}

	/// Renders the stored value, multiplied by the unit scale for numbers.
	pub fn display(&self, view: View<'_>) -> String {
		let Some(value) = stored_value(view, self.frame.path()) else {
			return String::new();
		};
		let scale = view.root.unit_scale_at(self.frame.path());
		match (&value, &self.frame.desc().shape) {
			(Value::Int(v), _) => match scale {
				Some(scale) => format_float(*v as f64 * scale, 64),
				None => v.to_string(),
			},
			(Value::Float(v), Shape::Float { encoding, .. }) => format_float(v * scale.unwrap_or(1.0), encoding.bits),
			(Value::Str(s), _) => s.clone(),
			(other, _) => other.to_string(),
		}
	}

	/// Runs the input pipeline, producing the value to store.
	pub fn parse_input(&self, view: View<'_>, input: &str) -> Result<Value, FieldError> {
		match &self.frame.desc().shape {
			Shape::Integer {
				encoding, min, max, ..
			} => {
				let number = self.scaled(view, read_number(view, input)?);
				let value = match number {
					Number::Int(v) => v,
					Number::Float(f) if f.is_finite() => f.round() as i128,
					Number::Float(_) => return Err(FieldError::parse(input, "not a finite number")),
				};
				let value = self.bound(view, value, *min, *max);
				let (lo, hi) = encoding.range();
				if !encoding.contains(value) {
					return Err(FieldError::OutOfRange {
						value: value.to_string(),
						min: lo.to_string(),
						max: hi.to_string(),
					});
				}
				Ok(Value::Int(value))
			}
			Shape::Float {
				encoding, min, max, ..
			} => {
				let value = self.scaled(view, read_number(view, input)?).as_f64();
				if !value.is_finite() {
					return Err(FieldError::parse(input, "not a finite number"));
				}
				Ok(Value::Float(encoding.quantize(self.bound(view, value, *min, *max))))
			}
			Shape::String { encoding, size } => {
				let text = match size {
					SizeSpec::Fixed(limit) => truncate_to(input, *encoding, *limit)?,
					_ => {
						encoding.encode(input).map_err(|e| FieldError::parse(input, e))?;
						input.to_string()
					}
				};
				Ok(Value::Str(text))
			}
			_ => Err(FieldError::Unavailable("the field has no text entry")),
		}
	}

	/// Divides out the unit scale; the display shows stored times scale.
	fn scaled(&self, view: View<'_>, number: Number) -> Number {
		match view.root.unit_scale_at(self.frame.path()) {
			Some(scale) if scale != 0.0 && scale != 1.0 => Number::Float(number.as_f64() / scale),
			_ => number,
		}
	}

	/// Clamps to declared bounds where enforced; otherwise only warns.
	fn bound<T: PartialOrd + Copy + std::fmt::Display>(&self, view: View<'_>, value: T, min: Option<T>, max: Option<T>) -> T {
		let settings = view.settings;
		let name = &self.frame.desc().name;
		if let Some(lo) = min
			&& value < lo
		{
			if settings.enforce_min {
				debug!(field = %name, %value, min = %lo, "clamped to minimum");
				return lo;
			}
			warn!(field = %name, %value, min = %lo, "value below declared minimum");
		}
		if let Some(hi) = max
			&& value > hi
		{
			if settings.enforce_max {
				debug!(field = %name, %value, max = %hi, "clamped to maximum");
				return hi;
			}
			warn!(field = %name, %value, max = %hi, "value above declared maximum");
		}
		value
	}

	fn revert(&mut self, view: View<'_>) {
		self.text = self.display(view);
		self.pending = false;
	}
}

/// Reads a number, through the expression evaluator when enabled.
fn read_number(view: View<'_>, input: &str) -> Result<Number, FieldError> {
	let input = input.trim();
	if view.settings.evaluate_entry_fields {
		return Ok(evaluate(input)?);
	}
	parse_literal(input).ok_or_else(|| FieldError::parse(input, "not a number"))
}

/// Decimal or `0x` hexadecimal integers, else a float literal.
fn parse_literal(input: &str) -> Option<Number> {
	let (negative, digits) = match input.strip_prefix('-') {
		Some(rest) => (true, rest),
		None => (false, input.strip_prefix('+').unwrap_or(input)),
	};
	let int = match digits.strip_prefix("0x").or_else(|| digits.strip_prefix("0X")) {
		Some(hex) => i128::from_str_radix(hex, 16).ok(),
		None => digits.parse::<i128>().ok(),
	};
	match int {
		Some(v) => Some(Number::Int(if negative { -v } else { v })),
		None => input.parse::<f64>().ok().map(Number::Float),
	}
}

/// Drops characters from the right until the encoded text fits `limit` bytes.
pub(super) fn truncate_to(input: &str, encoding: StrEncoding, limit: usize) -> Result<String, FieldError> {
	let mut text = input.to_string();
	while encoding.encode(&text).map_err(|e| FieldError::parse(input, e))?.len() > limit {
		text.pop();
	}
	if text.len() < input.len() {
		debug!(limit, dropped = input.chars().count() - text.chars().count(), "string truncated to fit");
	}
	Ok(text)
}

/// Shortest text that reads back to the same stored float.
fn format_float(value: f64, bits: u8) -> String {
	if bits == 32 {
		(value as f32).to_string()
	} else {
		value.to_string()
	}
}

impl Field for EntryEditor {
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
		if !self.frame.is_interactive() {
			self.revert(ctx.view());
			return Ok(FlushOutcome::Reverted);
		}
		let value = match self.parse_input(ctx.view(), &self.text) {
			Ok(value) => value,
			Err(e) if e.is_benign() => {
				debug!(field = %self.frame.path(), input = %self.text, error = %e, "entry reverted");
				self.revert(ctx.view());
				return Ok(FlushOutcome::Reverted);
			}
			Err(e) => {
				self.revert(ctx.view());
				return Err(e);
			}
		};
		let current = stored_value(ctx.view(), self.frame.path())
			.ok_or(FieldError::Unavailable("the field is no longer in the document"))?;
		if current == value {
			self.revert(ctx.view());
			return Ok(FlushOutcome::Unchanged);
		}
		let state = self.frame.state(Change::ScalarSet {
			undo: current,
			redo: value,
		})?;
		// A refused edit keeps the typed text pending.
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
			self.frame.style(style.widths.entry, style.padding);
		}
	}
}
