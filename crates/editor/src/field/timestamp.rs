//! Timestamp editor: seconds since the UNIX epoch shown as UTC date and time.

use std::collections::HashSet;
use std::sync::Arc;

use binilla_config::Style;
use binilla_history::Change;
use binilla_node::{Node, TreePath};
use binilla_schema::{Descriptor, Shape, Value};
use chrono::{DateTime, NaiveDateTime, Utc};
use tracing::debug;

use super::{Field, FieldId, FlushOutcome, Frame};
use crate::context::{EditContext, View};
use crate::error::FieldError;

/// Display format of timestamps.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Formats `seconds` since the epoch, or the bare number when out of range.
pub fn format_timestamp(seconds: i128) -> String {
	i64::try_from(seconds)
		.ok()
		.and_then(|s| DateTime::<Utc>::from_timestamp(s, 0))
		.map_or_else(|| seconds.to_string(), |t| t.format(TIMESTAMP_FORMAT).to_string())
}

/// Reads RFC 3339, `YYYY-MM-DD HH:MM:SS` (UTC) or plain epoch seconds.
pub fn parse_timestamp(input: &str) -> Result<i128, FieldError> {
	let input = input.trim();
	if let Ok(t) = DateTime::parse_from_rfc3339(input) {
		return Ok(i128::from(t.timestamp()));
	}
	for format in [TIMESTAMP_FORMAT, "%Y-%m-%dT%H:%M:%S"] {
		if let Ok(t) = NaiveDateTime::parse_from_str(input, format) {
			return Ok(i128::from(t.and_utc().timestamp()));
		}
	}
	input
		.parse::<i128>()
		.map_err(|_| FieldError::parse(input, "expected a date like 2024-05-01 12:30:00"))
}

/// Editor for timestamp nodes.
#[derive(Debug)]
pub struct TimestampEditor {
	frame: Frame,
	text: String,
	pending: bool,
}

impl TimestampEditor {
	pub(crate) fn new(view: View<'_>, at: &TreePath, desc: &Arc<Descriptor>) -> Self {
		let mut editor = Self {
			frame: Frame::new(at, desc),
			text: String::new(),
			pending: false,
		};
		editor.revert(view);
		editor
	}

	pub fn text(&self) -> &str {
		&self.text
	}

	pub fn set_text(&mut self, text: impl Into<String>) {
		self.text = text.into();
		self.pending = true;
	}

	fn revert(&mut self, view: View<'_>) {
		self.text = self.frame.node(view).and_then(Node::int).map(format_timestamp).unwrap_or_default();
		self.pending = false;
	}

	fn parse(&self) -> Result<i128, FieldError> {
		let seconds = parse_timestamp(&self.text)?;
		if let Shape::Timestamp { encoding } = &self.frame.desc().shape
			&& !encoding.contains(seconds)
		{
			let (lo, hi) = encoding.range();
			return Err(FieldError::OutOfRange {
				value: seconds.to_string(),
				min: lo.to_string(),
				max: hi.to_string(),
			});
		}
		Ok(seconds)
	}
}

impl Field for TimestampEditor {
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
		let seconds = match self.parse() {
			Ok(seconds) if self.frame.is_interactive() => seconds,
			Ok(_) => {
				self.revert(ctx.view());
				return Ok(FlushOutcome::Reverted);
			}
			Err(e) => {
				debug!(field = %self.frame.path(), error = %e, "timestamp reverted");
				self.revert(ctx.view());
				return Ok(FlushOutcome::Reverted);
			}
		};
		let current = self
			.frame
			.node(ctx.view())
			.and_then(Node::int)
			.ok_or(FieldError::Unavailable("the field is no longer in the document"))?;
		if current == seconds {
			self.revert(ctx.view());
			return Ok(FlushOutcome::Unchanged);
		}
		let state = self.frame.state(Change::ScalarSet {
			undo: Value::Int(current),
			redo: Value::Int(seconds),
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
			self.frame.style(style.widths.entry, style.padding);
		}
	}
}
