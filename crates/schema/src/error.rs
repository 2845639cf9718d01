//! Error types for descriptor validation and path handling.

use thiserror::Error;

/// One broken descriptor invariant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
	/// Dotted descriptor path from the validated root, e.g. `header.flags`.
	pub at: String,
	/// Human-readable description of the problem.
	pub message: String,
}

impl std::fmt::Display for Violation {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}: {}", self.at, self.message)
	}
}

/// Errors produced while checking descriptors.
#[derive(Debug, Error)]
pub enum SchemaError {
	/// One or more descriptor invariants do not hold.
	#[error("{} descriptor invariant(s) violated; first: {}", .0.len(), .0[0])]
	Invalid(Vec<Violation>),
}

/// Errors produced while parsing or resolving a neighbor path.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
	/// The path text is malformed.
	#[error("malformed path '{text}' at byte {position}: {message}")]
	Syntax {
		text: String,
		position: usize,
		message: String,
	},

	/// A step of the path does not resolve against the tree.
	#[error("no such path '{path}' (failed at step {step})")]
	NoSuchPath { path: String, step: usize },

	/// The path resolved, but not to a node of the required kind.
	#[error("path '{path}' resolved to a {found} node, expected {expected}")]
	WrongKind {
		path: String,
		found: &'static str,
		expected: &'static str,
	},
}

/// Errors produced while transcoding string fields.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodingError {
	/// A character has no representation in the target encoding.
	#[error("character {ch:?} cannot be encoded as {encoding}")]
	Unencodable { ch: char, encoding: &'static str },

	/// The byte sequence is not valid in the source encoding.
	#[error("invalid {encoding} byte sequence at byte {offset}")]
	Invalid { encoding: &'static str, offset: usize },
}
