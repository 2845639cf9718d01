//! Timestamped backups of save targets.
//!
//! The backup of target `T` is `<dir>/<basename(T)>.<stamp>`, where the stamp
//! is a decimal count of microseconds since the UNIX epoch. Stamps for one
//! basename only ever grow, so numeric order is age order and rotation
//! evicts the numerically smallest stamps.

use std::ffi::OsStr;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, trace, warn};

use crate::error::{PersistError, Result};

#[cfg(test)]
mod tests;

/// Directory, relative to the target's parent, used when no directory is configured.
pub const DEFAULT_BACKUP_DIR: &str = "backups";

/// Retention rules for backups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupPolicy {
	/// Where backups go; `None` means [`DEFAULT_BACKUP_DIR`] beside the target.
	pub dir: Option<PathBuf>,
	/// Backups kept per target; `0` disables backups.
	pub max_count: usize,
	/// Minimum age of the newest backup before another one is taken.
	pub interval: Duration,
}

impl Default for BackupPolicy {
	fn default() -> Self {
		Self {
			dir: None,
			max_count: 1,
			interval: Duration::ZERO,
		}
	}
}

/// What [`BackupPolicy::back_up`] did.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BackupOutcome {
	/// The backup written, or `None` when it was suppressed.
	pub created: Option<PathBuf>,
	/// Old backups deleted by rotation.
	pub evicted: Vec<PathBuf>,
}

impl BackupPolicy {
	pub fn new(max_count: usize, interval: Duration) -> Self {
		Self {
			dir: None,
			max_count,
			interval,
		}
	}

	pub fn with_dir(mut self, dir: impl Into<PathBuf>) -> Self {
		self.dir = Some(dir.into());
		self
	}

	pub fn is_enabled(&self) -> bool {
		self.max_count > 0
	}

	/// Directory holding the backups of `target`.
	pub fn backup_dir(&self, target: &Path) -> PathBuf {
		match &self.dir {
			Some(dir) => dir.clone(),
			None => target.parent().unwrap_or(Path::new("")).join(DEFAULT_BACKUP_DIR),
		}
	}

	/// Existing backups of `target`, oldest first.
	///
	/// A missing backup directory holds no backups.
	pub fn backups(&self, target: &Path) -> Result<Vec<(u64, PathBuf)>> {
		let dir = self.backup_dir(target);
		let Some(basename) = target.file_name() else {
			return Ok(Vec::new());
		};
		let entries = match fs::read_dir(&dir) {
			Ok(entries) => entries,
			Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
			Err(e) => return Err(PersistError::io(dir, e)),
		};

		let mut found = Vec::new();
		for entry in entries {
			let entry = entry.map_err(|e| PersistError::io(&dir, e))?;
			if let Some(stamp) = backup_stamp(basename, &entry.file_name()) {
				found.push((stamp, entry.path()));
			}
		}
		found.sort_unstable();
		Ok(found)
	}

	/// Whether saving `target` at `now` would take a backup.
	pub fn would_back_up(&self, target: &Path, now: DateTime<Utc>) -> Result<bool> {
		if !self.is_enabled() || !target.exists() {
			return Ok(false);
		}
		let newest = self.backups(target)?.last().map(|(stamp, _)| *stamp);
		Ok(!self.too_recent(newest, now))
	}

	/// Copies `target` into the backup directory and rotates old backups.
	pub fn back_up(&self, target: &Path) -> Result<BackupOutcome> {
		self.back_up_at(target, Utc::now())
	}

	/// [`BackupPolicy::back_up`] with an explicit clock reading.
	pub fn back_up_at(&self, target: &Path, now: DateTime<Utc>) -> Result<BackupOutcome> {
		if !self.is_enabled() {
			return Ok(BackupOutcome::default());
		}
		let Some(basename) = target.file_name() else {
			return Ok(BackupOutcome::default());
		};

		let existing = self.backups(target)?;
		let newest = existing.last().map(|(stamp, _)| *stamp);
		if self.too_recent(newest, now) {
			debug!(target = %target.display(), "backup suppressed by interval");
			return Ok(BackupOutcome::default());
		}

		let now_micros = u64::try_from(now.timestamp_micros()).unwrap_or(0);
		let stamp = match newest {
			Some(newest) if newest >= now_micros => newest + 1,
			_ => now_micros,
		};

		let dir = self.backup_dir(target);
		fs::create_dir_all(&dir).map_err(|e| PersistError::io(&dir, e))?;
		let mut name = basename.to_os_string();
		name.push(format!(".{stamp}"));
		let created = dir.join(name);
		fs::copy(target, &created).map_err(|e| PersistError::io(&created, e))?;
		debug!(target = %target.display(), backup = %created.display(), "backup written");

		let mut backups = existing;
		backups.push((stamp, created.clone()));
		let excess = backups.len().saturating_sub(self.max_count);
		let mut evicted = Vec::with_capacity(excess);
		for (_, path) in backups.drain(..excess) {
			match fs::remove_file(&path) {
				Ok(()) => {
					trace!(backup = %path.display(), "backup evicted");
					evicted.push(path);
				}
				Err(e) => warn!(backup = %path.display(), error = %e, "failed to evict backup"),
			}
		}

		Ok(BackupOutcome {
			created: Some(created),
			evicted,
		})
	}

	fn too_recent(&self, newest: Option<u64>, now: DateTime<Utc>) -> bool {
		if self.interval.is_zero() {
			return false;
		}
		let Some(newest) = newest else {
			return false;
		};
		let now_micros = u64::try_from(now.timestamp_micros()).unwrap_or(0);
		let interval = u64::try_from(self.interval.as_micros()).unwrap_or(u64::MAX);
		now_micros.saturating_sub(newest) < interval
	}
}

/// Stamp of `file` if it names a backup of `basename`.
fn backup_stamp(basename: &OsStr, file: &OsStr) -> Option<u64> {
	let file = file.to_str()?;
	let stamp = file.strip_prefix(basename.to_str()?)?.strip_prefix('.')?;
	if stamp.is_empty() || !stamp.bytes().all(|b| b.is_ascii_digit()) {
		return None;
	}
	stamp.parse().ok()
}
