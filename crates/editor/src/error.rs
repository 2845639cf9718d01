//! Error types for field editors and document sessions.

use std::path::PathBuf;

use binilla_codec::CodecError;
use binilla_config::ConfigError;
use binilla_expr::ExprError;
use binilla_history::EditError;
use binilla_keymap::ParseError;
use binilla_node::NodeError;
use binilla_persist::PersistError;
use thiserror::Error;

/// Errors raised by field editors.
///
/// Parse failures of user input never leave [`Field::flush`]; they revert
/// the editor's display instead.
///
/// [`Field::flush`]: crate::Field::flush
#[derive(Debug, Error)]
pub enum FieldError {
	/// User input cannot be coerced into the field's type.
	#[error("cannot read '{input}': {reason}")]
	Parse { input: String, reason: String },

	/// A value lies outside what the field can store.
	#[error("{value} is outside {min}..={max}")]
	OutOfRange { value: String, min: String, max: String },

	#[error(transparent)]
	Expr(#[from] ExprError),

	/// The document is being saved and refuses edits.
	#[error("document is saving")]
	Saving,

	/// The field is disabled or its descriptor is read-only.
	#[error("'{0}' is not editable")]
	ReadOnly(String),

	/// Import and export are not allowed for the field.
	#[error("'{0}' cannot be imported or exported")]
	NotPortable(String),

	/// The operation does not apply in the editor's current state.
	#[error("{0}")]
	Unavailable(&'static str),

	#[error("i/o error on {}", path.display())]
	Io {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error(transparent)]
	Node(#[from] NodeError),

	#[error(transparent)]
	Edit(#[from] EditError),

	#[error(transparent)]
	Codec(#[from] CodecError),
}

impl FieldError {
	pub(crate) fn parse(input: &str, reason: impl ToString) -> Self {
		FieldError::Parse {
			input: input.to_string(),
			reason: reason.to_string(),
		}
	}

	pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
		FieldError::Io {
			path: path.into(),
			source,
		}
	}

	/// Returns `true` for failures of user input, which revert instead of
	/// propagating.
	pub fn is_benign(&self) -> bool {
		matches!(self, FieldError::Parse { .. } | FieldError::OutOfRange { .. } | FieldError::Expr(_))
	}
}

/// Errors raised by document sessions and the application.
#[derive(Debug, Error)]
pub enum SessionError {
	/// A save is in progress; the request has to wait for it.
	#[error("'{0}' is still saving")]
	Saving(String),

	/// The document has never been saved and no path was given.
	#[error("document has no file path")]
	NoPath,

	/// The save target or its directory is read-only.
	#[error("{} is not writable", .0.display())]
	NotWritable(PathBuf),

	/// The file is already open in another session.
	#[error("{} is already open", .0.display())]
	AlreadyOpen(PathBuf),

	/// No open session has the identifier.
	#[error("no open session {0}")]
	UnknownSession(String),

	/// No descriptor is registered under the identifier.
	#[error("unknown descriptor '{0}'")]
	UnknownDescriptor(String),

	/// The background save thread went away without reporting.
	#[error("save worker for {} stopped without a result", .0.display())]
	WorkerLost(PathBuf),

	#[error("cannot start save worker")]
	Spawn(#[source] std::io::Error),

	#[error("i/o error on {}", path.display())]
	Io {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error(transparent)]
	Codec(#[from] CodecError),

	#[error(transparent)]
	Persist(#[from] PersistError),

	#[error(transparent)]
	Edit(#[from] EditError),

	#[error(transparent)]
	Field(#[from] FieldError),

	#[error(transparent)]
	Config(#[from] ConfigError),

	#[error(transparent)]
	Hotkey(#[from] ParseError),
}

impl SessionError {
	pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
		SessionError::Io {
			path: path.into(),
			source,
		}
	}
}

/// Result type for session operations.
pub type Result<T> = std::result::Result<T, SessionError>;
