//! Keymap errors.

use thiserror::Error;

/// A combo string that does not match the combo grammar.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("parse error at position {position}: {message}")]
pub struct ParseError {
	/// Human-readable description of the parse error.
	pub message: String,
	/// Byte offset in the input where the error occurred.
	pub position: usize,
}

/// Errors from binding tables and their TOML form.
#[derive(Debug, Error)]
pub enum KeymapError {
	#[error("invalid combo '{combo}': {source}")]
	Combo {
		combo: String,
		#[source]
		source: ParseError,
	},

	#[error("failed to read hotkey table: {0}")]
	Decode(#[from] toml::de::Error),

	#[error("failed to write hotkey table: {0}")]
	Encode(#[from] toml::ser::Error),
}
