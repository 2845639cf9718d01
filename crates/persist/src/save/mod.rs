//! The save commit sequence.
//!
//! 1. Write the bytes to `T.temp`.
//! 2. With `integrity_test`, read the temp back and verify it.
//! 3. With a backup policy and an existing target, copy the target into the
//!    backup directory and rotate.
//! 4. Rename the temp over the target, unless `write_as_temp` keeps it.
//!
//! A failure at any step leaves the previous target in place. A temp that
//! failed its integrity test is kept for inspection.

use std::ffi::OsString;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use binilla_codec::{ParseOptions, parse, serialize};
use binilla_node::Node;
use chrono::Utc;
use tracing::{debug, warn};

use crate::backup::BackupPolicy;
use crate::error::{PersistError, Result};

#[cfg(test)]
mod tests;

/// Side file the bytes are written to before they replace `target`.
pub fn temp_path(target: &Path) -> PathBuf {
	let mut name = OsString::from(target.as_os_str());
	name.push(".temp");
	PathBuf::from(name)
}

/// Everything one save needs to know.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavePlan {
	pub target: PathBuf,
	pub temp: PathBuf,
	pub backup: Option<BackupPolicy>,
	pub integrity_test: bool,
	/// Stop after writing the temp file and leave the target alone.
	pub write_as_temp: bool,
}

impl SavePlan {
	pub fn new(target: impl Into<PathBuf>) -> Self {
		let target = target.into();
		Self {
			temp: temp_path(&target),
			target,
			backup: None,
			integrity_test: false,
			write_as_temp: false,
		}
	}

	pub fn with_backup(mut self, policy: BackupPolicy) -> Self {
		self.backup = Some(policy);
		self
	}

	pub fn with_integrity_test(mut self, enabled: bool) -> Self {
		self.integrity_test = enabled;
		self
	}

	pub fn with_write_as_temp(mut self, enabled: bool) -> Self {
		self.write_as_temp = enabled;
		self
	}
}

/// What a completed save did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveReport {
	/// The file now holding the bytes: the target, or the temp with `write_as_temp`.
	pub written: PathBuf,
	pub backup: Option<PathBuf>,
	pub evicted_backups: Vec<PathBuf>,
}

/// Answers to the questions asked before a save starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Preflight {
	pub exists: bool,
	/// The target, or the directory it would be created in, accepts writes.
	pub writable: bool,
	pub backup_needed: bool,
}

/// Inspects the target of `plan` without touching it.
pub fn save_preflight(plan: &SavePlan) -> Result<Preflight> {
	let exists = plan.target.exists();
	let writable = if exists {
		fs::metadata(&plan.target)
			.map(|m| !m.permissions().readonly())
			.map_err(|e| PersistError::io(&plan.target, e))?
	} else {
		let dir = plan.target.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(Path::new("."));
		fs::metadata(dir).is_ok_and(|m| m.is_dir() && !m.permissions().readonly())
	};
	let backup_needed = match &plan.backup {
		Some(policy) if exists && !plan.write_as_temp => policy.would_back_up(&plan.target, Utc::now())?,
		_ => false,
	};
	Ok(Preflight {
		exists,
		writable,
		backup_needed,
	})
}

/// Runs the commit sequence for `bytes`.
///
/// `verify` receives the bytes read back from the temp file and is only
/// called when `plan.integrity_test` is set.
pub fn save_bytes<F>(plan: &SavePlan, bytes: &[u8], verify: F) -> Result<SaveReport>
where
	F: FnOnce(&[u8]) -> Result<()>,
{
	write_synced(&plan.temp, bytes)?;
	debug!(temp = %plan.temp.display(), len = bytes.len(), "temp written");

	if plan.integrity_test {
		let written = fs::read(&plan.temp).map_err(|e| PersistError::io(&plan.temp, e))?;
		if let Err(e) = verify(&written) {
			warn!(temp = %plan.temp.display(), error = %e, "integrity test failed, keeping temp");
			return Err(e);
		}
	}

	if plan.write_as_temp {
		return Ok(SaveReport {
			written: plan.temp.clone(),
			backup: None,
			evicted_backups: Vec::new(),
		});
	}

	let (backup, evicted_backups) = match &plan.backup {
		Some(policy) if plan.target.exists() => {
			let outcome = policy.back_up(&plan.target)?;
			(outcome.created, outcome.evicted)
		}
		_ => (None, Vec::new()),
	};

	fs::rename(&plan.temp, &plan.target).map_err(|e| PersistError::io(&plan.target, e))?;
	debug!(target = %plan.target.display(), "save committed");
	Ok(SaveReport {
		written: plan.target.clone(),
		backup,
		evicted_backups,
	})
}

/// Serializes `root` and saves it; the integrity test re-parses the temp
/// with the root's descriptor and requires an identical tree.
pub fn save_node(plan: &SavePlan, root: &Node) -> Result<SaveReport> {
	let bytes = serialize(root)?;
	save_bytes(plan, &bytes, |written| {
		let reparsed = parse(root.desc(), written, &ParseOptions::default())
			.map_err(|e| integrity_error(plan, format!("re-parse failed: {e}")))?;
		match root.first_difference(&reparsed.root) {
			None => Ok(()),
			Some(at) => Err(integrity_error(plan, format!("trees differ at {at}"))),
		}
	})
}

pub(crate) fn integrity_error(plan: &SavePlan, detail: String) -> PersistError {
	PersistError::IntegrityMismatch {
		temp: plan.temp.clone(),
		detail,
	}
}

fn write_synced(path: &Path, bytes: &[u8]) -> Result<()> {
	let mut file = File::create(path).map_err(|e| PersistError::io(path, e))?;
	file.write_all(bytes).map_err(|e| PersistError::io(path, e))?;
	file.sync_all().map_err(|e| PersistError::io(path, e))
}
