//! Raw-bytes editor: import, export and delete of an opaque byte blob.

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use binilla_config::Style;
use binilla_history::Change;
use binilla_node::{Node, TreePath};
use binilla_schema::{Descriptor, SizeSpec, Value};
use tracing::debug;

use super::{Field, FieldId, FlushOutcome, Frame};
use crate::context::{EditContext, View};
use crate::error::FieldError;

/// Editor for raw-bytes nodes.
#[derive(Debug)]
pub struct RawBytesEditor {
	frame: Frame,
}

impl RawBytesEditor {
	pub(crate) fn new(_view: View<'_>, at: &TreePath, desc: &Arc<Descriptor>) -> Self {
		Self {
			frame: Frame::new(at, desc),
		}
	}

	pub fn bytes<'v>(&self, view: View<'v>) -> Option<&'v [u8]> {
		self.frame.node(view).and_then(Node::value).and_then(Value::as_bytes)
	}

	/// Byte count shown next to the buttons.
	pub fn len(&self, view: View<'_>) -> usize {
		self.bytes(view).map_or(0, <[u8]>::len)
	}

	fn fixed_size(&self) -> Option<usize> {
		self.frame.desc().size_spec().and_then(SizeSpec::fixed)
	}

	fn replace(&mut self, ctx: &mut EditContext<'_>, bytes: Vec<u8>) -> Result<(), FieldError> {
		self.frame.check_interactive()?;
		let current = ctx
			.root
			.at(self.frame.path())
			.cloned()
			.ok_or(FieldError::Unavailable("the field is no longer in the document"))?;
		let replacement = Node::scalar(self.frame.desc().clone(), Value::Bytes(bytes));
		let state = self.frame.state(Change::RawBytesReplace {
			undo: Box::new(current),
			redo: Box::new(replacement),
		})?;
		ctx.submit(state)?;
		self.frame.mark_edited();
		Ok(())
	}

	/// Replaces the bytes with the contents of `path`.
	///
	/// Fixed-size fields only accept files of exactly that size.
	pub fn import(&mut self, ctx: &mut EditContext<'_>, path: &Path) -> Result<(), FieldError> {
		if !self.frame.desc().is_portable() {
			return Err(FieldError::NotPortable(self.frame.desc().name.clone()));
		}
		let bytes = std::fs::read(path).map_err(|e| FieldError::io(path, e))?;
		if let Some(size) = self.fixed_size()
			&& bytes.len() != size
		{
			return Err(FieldError::OutOfRange {
				value: bytes.len().to_string(),
				min: size.to_string(),
				max: size.to_string(),
			});
		}
		debug!(field = %self.frame.path(), path = %path.display(), len = bytes.len(), "raw bytes imported");
		self.replace(ctx, bytes)
	}

	/// Writes the bytes to `path`, returning the byte count.
	pub fn export(&self, view: View<'_>, path: &Path) -> Result<usize, FieldError> {
		if !self.frame.desc().is_portable() {
			return Err(FieldError::NotPortable(self.frame.desc().name.clone()));
		}
		let bytes = self.bytes(view).unwrap_or_default();
		std::fs::write(path, bytes).map_err(|e| FieldError::io(path, e))?;
		Ok(bytes.len())
	}

	/// Zeroes the bytes, keeping their length.
	pub fn delete(&mut self, ctx: &mut EditContext<'_>) -> Result<(), FieldError> {
		let bytes = vec![0; self.len(ctx.view())];
		self.replace(ctx, bytes)
	}
}

impl Field for RawBytesEditor {
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
