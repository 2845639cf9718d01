//! Error types for configuration documents.

use std::path::Path;

use binilla_keymap::KeymapError;
use binilla_node::NodeError;
use binilla_persist::PersistError;
use thiserror::Error;

/// Errors that can occur when reading or writing configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
	/// A field the typed view needs is absent from the document.
	#[error("missing required field: {0}")]
	MissingField(String),

	/// A color value could not be parsed.
	#[error("invalid color format: {0}")]
	InvalidColor(String),

	#[error(transparent)]
	Node(#[from] NodeError),

	#[error(transparent)]
	Persist(#[from] PersistError),

	#[error(transparent)]
	Keymap(#[from] KeymapError),
}

/// Result type for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

pub(crate) fn io_error(path: &Path, source: std::io::Error) -> ConfigError {
	ConfigError::Persist(PersistError::Io {
		path: path.to_path_buf(),
		source,
	})
}
