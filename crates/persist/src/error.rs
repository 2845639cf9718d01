//! Persistence errors.

use std::io;
use std::path::PathBuf;

use binilla_codec::CodecError;
use thiserror::Error;

/// Errors raised while saving, backing up or loading a document.
#[derive(Debug, Error)]
pub enum PersistError {
	#[error("I/O error on {}: {source}", path.display())]
	Io {
		path: PathBuf,
		#[source]
		source: io::Error,
	},

	/// The re-parsed temp file differs from the tree that was saved.
	#[error("integrity test failed for {}: {detail}", temp.display())]
	IntegrityMismatch { temp: PathBuf, detail: String },

	/// The file starts with someone else's signature.
	#[error("bad signature {found:?}, expected {expected:?}")]
	BadSignature { expected: [u8; 4], found: Vec<u8> },

	/// The signature matches but no descriptor exists for the version.
	#[error("unsupported version {version} (current is {current})")]
	UnknownVersion { version: u32, current: u32 },

	/// No upgrader is registered for one step of the chain.
	#[error("no upgrader from version {from} to {}", from + 1)]
	MissingUpgrader { from: u32 },

	#[error("upgrade from version {from} failed: {message}")]
	Upgrade { from: u32, message: String },

	#[error(transparent)]
	Codec(#[from] CodecError),
}

impl PersistError {
	pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
		PersistError::Io {
			path: path.into(),
			source,
		}
	}
}

/// Result type for persistence operations.
pub type Result<T> = std::result::Result<T, PersistError>;
