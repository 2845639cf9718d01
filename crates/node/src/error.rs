//! Error types for node tree operations.

use binilla_schema::{FieldKind, PathError};
use thiserror::Error;

/// Errors that can occur while reading or mutating a node tree.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NodeError {
	/// An array mutation would leave the element count outside its bounds.
	#[error("'{name}' would hold {len} elements, allowed range is {min}..={max}")]
	CountOutOfBounds { name: String, len: usize, min: usize, max: usize },

	/// An index does not address an existing child.
	#[error("index {index} out of range for '{name}' with {len} children")]
	IndexOutOfRange { name: String, index: usize, len: usize },

	/// No child node lives at the given tree path.
	#[error("no node at tree path {0}")]
	NoNode(String),

	/// The operation needs a different kind of node.
	#[error("'{name}' is a {found} node, expected {expected}")]
	WrongKind {
		name: String,
		found: FieldKind,
		expected: &'static str,
	},

	/// A replacement child was built from a different descriptor.
	#[error("'{expected}' cannot be replaced by a '{found}' node")]
	DescriptorMismatch { expected: String, found: String },

	/// A scalar value has the wrong type or does not fit the encoding.
	#[error("'{name}' cannot hold {value}")]
	BadValue { name: String, value: String },

	/// The field's size is fixed by its descriptor.
	#[error("'{name}' has a fixed size of {size}")]
	FixedSize { name: String, size: usize },

	/// A size neighbor holds something other than a non-negative integer.
	#[error("size of '{name}' resolved to a non-count value")]
	BadSize { name: String },

	#[error(transparent)]
	Path(#[from] PathError),
}

/// Result type for node operations.
pub type Result<T> = std::result::Result<T, NodeError>;
