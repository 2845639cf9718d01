//! Codec errors.

use binilla_node::{NodeError, TreePath};
use binilla_schema::EncodingError;
use thiserror::Error;

/// Errors raised while parsing or serializing a document.
///
/// Parse errors carry the byte offset and the tree path of the field being
/// read when the failure happened.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CodecError {
	/// The input ended before the field was complete.
	#[error("field {path} needs {needed} bytes at offset {offset}, only {available} left")]
	UnexpectedEof {
		path: TreePath,
		offset: usize,
		needed: usize,
		available: usize,
	},

	/// A declared size could not be determined.
	#[error("size of field {path} is unavailable: {source}")]
	Size {
		path: TreePath,
		#[source]
		source: NodeError,
	},

	/// Text bytes are not valid in the declared encoding.
	#[error("field {path} at offset {offset}: {source}")]
	Encoding {
		path: TreePath,
		offset: usize,
		#[source]
		source: EncodingError,
	},

	/// A stream adapter refused its input.
	#[error("stream adapter '{adapter}' failed on field {path}: {message}")]
	Adapter { path: TreePath, adapter: String, message: String },

	/// Serialized data does not fit the size its descriptor declares.
	#[error("field {path} holds {actual} bytes but declares {declared}")]
	SizeMismatch { path: TreePath, declared: usize, actual: usize },

	#[error(transparent)]
	Node(#[from] NodeError),
}

impl CodecError {
	/// Tree path of the field the error refers to, when known.
	pub fn path(&self) -> Option<&TreePath> {
		match self {
			CodecError::UnexpectedEof { path, .. }
			| CodecError::Size { path, .. }
			| CodecError::Encoding { path, .. }
			| CodecError::Adapter { path, .. }
			| CodecError::SizeMismatch { path, .. } => Some(path),
			CodecError::Node(_) => None,
		}
	}
}

/// Result type for codec operations.
pub type Result<T> = std::result::Result<T, CodecError>;
