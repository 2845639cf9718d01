//! Getting documents on and off disk safely.
//!
//! - [`save_bytes`] and [`save_node`] run the commit sequence for one save:
//!   write a `.temp` side file, optionally re-parse it and compare, back the
//!   old target up, then rename the temp over the target.
//! - [`BackupPolicy`] names, rate-limits and rotates timestamped backups.
//! - [`VersionedFormat`] reads and writes documents that start with a
//!   4-byte signature and a little-endian version, upgrading old versions
//!   through a chain of version-pair upgraders.

mod backup;
pub mod error;
mod format;
mod save;

pub use backup::{BackupOutcome, BackupPolicy, DEFAULT_BACKUP_DIR};
pub use error::{PersistError, Result};
pub use format::{HEADER_LEN, Header, Loaded, UpgradeFn, VersionedFormat, copy_by_name};
pub use save::{Preflight, SavePlan, SaveReport, save_bytes, save_node, save_preflight, temp_path};
