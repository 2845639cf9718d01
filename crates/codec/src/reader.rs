//! Bounds-checked cursor over an input buffer.

use binilla_node::TreePath;

use crate::error::{CodecError, Result};

/// Cursor over the bytes of one enclosing buffer.
///
/// `base` is the offset of `bytes` within the outermost input so errors
/// report absolute positions even inside union bodies.
pub(crate) struct Reader<'a> {
	bytes: &'a [u8],
	x: usize,
	base: usize,
}

impl<'a> Reader<'a> {
	pub fn new(bytes: &'a [u8]) -> Self {
		Self { bytes, x: 0, base: 0 }
	}

	/// Absolute offset of the cursor.
	pub fn offset(&self) -> usize {
		self.base + self.x
	}

	pub fn remaining(&self) -> usize {
		self.bytes.len() - self.x
	}

	pub fn is_empty(&self) -> bool {
		self.remaining() == 0
	}

	/// Takes the next `size` bytes and advances past them.
	pub fn take(&mut self, size: usize, path: &TreePath) -> Result<&'a [u8]> {
		if size > self.remaining() {
			return Err(CodecError::UnexpectedEof {
				path: path.clone(),
				offset: self.offset(),
				needed: size,
				available: self.remaining(),
			});
		}
		let bytes = &self.bytes[self.x..self.x + size];
		self.x += size;
		Ok(bytes)
	}

	/// Splits off a reader over the next `size` bytes and advances past them.
	pub fn sub(&mut self, size: usize, path: &TreePath) -> Result<Reader<'a>> {
		let base = self.offset();
		let bytes = self.take(size, path)?;
		Ok(Reader { bytes, x: 0, base })
	}
}
