//! Edit application errors.

use binilla_node::{NodeError, TreePath};
use thiserror::Error;

/// Errors raised while applying an edit state.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EditError {
	/// The path no longer leads to a node built from the recorded descriptor.
	#[error("edit target {path} is now '{found}', expected '{expected}'")]
	Stale { path: TreePath, expected: String, found: String },

	/// The recorded change does not fit the target node.
	#[error("cannot apply {kind} to '{name}'")]
	Mismatch { kind: &'static str, name: String },

	#[error(transparent)]
	Node(#[from] NodeError),
}

/// Result type for edit operations.
pub type Result<T> = std::result::Result<T, EditError>;
