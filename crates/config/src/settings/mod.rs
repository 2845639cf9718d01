//! The typed view of the config document.

use std::path::{Path, PathBuf};
use std::time::Duration;

use binilla_codec::ParseOptions;
use binilla_keymap::HotkeyTable;
use binilla_node::{CountLimits, Node};
use binilla_persist::{BackupPolicy, SavePlan, SaveReport};
use tracing::{debug, warn};

use crate::error::{Result, io_error};
use crate::layout::{SettingFlags, config_format};
use crate::view::{field, field_mut, fill_array, int, int_as, mask, set_int, set_text, text};


const DEFAULT_MAX_UNDOS: usize = 1000;

/// Editing and saving switches applied to every document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditorSettings {
	/// Hard cap on history length per document.
	pub max_undos: usize,
	/// Keep the `.temp` file instead of renaming it over the target.
	pub write_as_temp: bool,
	/// Re-parse saved bytes and require an identical tree.
	pub integrity_test: bool,
	pub enforce_min: bool,
	pub enforce_max: bool,
	/// Allow arithmetic expressions in numeric entries.
	pub evaluate_entry_fields: bool,
	/// Keep partial trees when a file fails to parse.
	pub allow_corrupt: bool,
	pub show_invisible: bool,
	pub show_metadata: bool,
	/// Store paths relative to the application's root directory.
	pub sync_offsets_relative: bool,
	/// Show every bit of bool-mask fields, named or not.
	pub show_all_bools: bool,
}

impl Default for EditorSettings {
	fn default() -> Self {
		Self::from_flags(SettingFlags::DEFAULT, DEFAULT_MAX_UNDOS)
	}
}

impl EditorSettings {
	fn from_flags(flags: SettingFlags, max_undos: usize) -> Self {
		Self {
			max_undos,
			write_as_temp: flags.contains(SettingFlags::WRITE_AS_TEMP),
			integrity_test: flags.contains(SettingFlags::INTEGRITY_TEST),
			enforce_min: flags.contains(SettingFlags::ENFORCE_MIN),
			enforce_max: flags.contains(SettingFlags::ENFORCE_MAX),
			evaluate_entry_fields: flags.contains(SettingFlags::EVALUATE_ENTRY_FIELDS),
			allow_corrupt: flags.contains(SettingFlags::ALLOW_CORRUPT),
			show_invisible: flags.contains(SettingFlags::SHOW_INVISIBLE),
			show_metadata: flags.contains(SettingFlags::SHOW_METADATA),
			sync_offsets_relative: flags.contains(SettingFlags::SYNC_OFFSETS_RELATIVE),
			show_all_bools: flags.contains(SettingFlags::SHOW_ALL_BOOLS),
		}
	}

	fn flags(&self) -> SettingFlags {
		let mut flags = SettingFlags::empty();
		flags.set(SettingFlags::WRITE_AS_TEMP, self.write_as_temp);
		flags.set(SettingFlags::INTEGRITY_TEST, self.integrity_test);
		flags.set(SettingFlags::ENFORCE_MIN, self.enforce_min);
		flags.set(SettingFlags::ENFORCE_MAX, self.enforce_max);
		flags.set(SettingFlags::EVALUATE_ENTRY_FIELDS, self.evaluate_entry_fields);
		flags.set(SettingFlags::ALLOW_CORRUPT, self.allow_corrupt);
		flags.set(SettingFlags::SHOW_INVISIBLE, self.show_invisible);
		flags.set(SettingFlags::SHOW_METADATA, self.show_metadata);
		flags.set(SettingFlags::SYNC_OFFSETS_RELATIVE, self.sync_offsets_relative);
		flags.set(SettingFlags::SHOW_ALL_BOOLS, self.show_all_bools);
		flags
	}

	/// Which array count bounds are hard errors.
	pub fn count_limits(&self) -> CountLimits {
		CountLimits {
			enforce_min: self.enforce_min,
			enforce_max: self.enforce_max,
		}
	}

	pub fn parse_options(&self) -> ParseOptions {
		ParseOptions {
			allow_corrupt: self.allow_corrupt,
		}
	}

	/// The save plan for `target` under these settings.
	pub fn save_plan(&self, target: impl Into<PathBuf>, backup: &BackupPolicy) -> SavePlan {
		SavePlan::new(target)
			.with_backup(backup.clone())
			.with_integrity_test(self.integrity_test)
			.with_write_as_temp(self.write_as_temp)
	}
}

/// Position and size of a window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowGeometry {
	pub x: i32,
	pub y: i32,
	pub width: u32,
	pub height: u32,
}

impl Default for WindowGeometry {
	fn default() -> Self {
		Self {
			x: 0,
			y: 0,
			width: 640,
			height: 480,
		}
	}
}

impl WindowGeometry {
	fn read(node: &Node) -> Result<Self> {
		Ok(Self {
			x: int_as(node, "x")?,
			y: int_as(node, "y")?,
			width: int_as(node, "width")?,
			height: int_as(node, "height")?,
		})
	}

	fn write(&self, node: &mut Node) -> Result<()> {
		set_int(node, "x", self.x)?;
		set_int(node, "y", self.y)?;
		set_int(node, "width", self.width)?;
		set_int(node, "height", self.height)
	}
}

/// A document that was open at shutdown and is reopened on startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestoreEntry {
	/// Identifier of the descriptor the document was opened with.
	pub descriptor_id: String,
	pub path: PathBuf,
	pub window: WindowGeometry,
	pub minimized: bool,
}

/// Everything the config document stores.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
	pub settings: EditorSettings,
	pub backup: BackupPolicy,
	pub window: WindowGeometry,
	pub max_recent: usize,
	/// Most recent first.
	pub recent_paths: Vec<PathBuf>,
	pub open_documents: Vec<RestoreEntry>,
	pub hotkeys: HotkeyTable,
}

impl Default for AppConfig {
	fn default() -> Self {
		Self {
			settings: EditorSettings::default(),
			backup: BackupPolicy::default(),
			window: WindowGeometry::default(),
			max_recent: 20,
			recent_paths: Vec::new(),
			open_documents: Vec::new(),
			hotkeys: HotkeyTable::with_defaults(),
		}
	}
}

impl AppConfig {
	/// Reads the typed view out of a current-version config tree.
	///
	/// An empty hotkey list stands for the default bindings.
	pub fn from_node(root: &Node) -> Result<Self> {
		let flags: SettingFlags = mask(root, "flags")?;
		let settings = EditorSettings::from_flags(flags, int_as::<usize>(root, "max_undos")?.max(1));

		let backup_dir = text(root, "backup_dir")?;
		let backup = BackupPolicy {
			dir: (!backup_dir.is_empty()).then(|| PathBuf::from(backup_dir)),
			max_count: int_as(root, "backup_count")?,
			interval: Duration::from_secs(int_as(root, "backup_interval")?),
		};

		let recent_paths = field(root, "recent_paths")?
			.children()
			.iter()
			.map(|entry| text(entry, "path").map(PathBuf::from))
			.collect::<Result<_>>()?;

		let open_documents = field(root, "open_documents")?
			.children()
			.iter()
			.map(|entry| {
				Ok(RestoreEntry {
					descriptor_id: text(entry, "descriptor_id")?,
					path: PathBuf::from(text(entry, "path")?),
					window: WindowGeometry::read(field(entry, "window")?)?,
					minimized: int(entry, "state")? & 1 != 0,
				})
			})
			.collect::<Result<_>>()?;

		let bindings = field(root, "hotkeys")?
			.children()
			.iter()
			.map(|entry| Ok((text(entry, "combo")?, text(entry, "action")?)))
			.collect::<Result<Vec<_>>>()?;
		let hotkeys = if bindings.is_empty() {
			HotkeyTable::with_defaults()
		} else {
			HotkeyTable::from_pairs(bindings)?
		};

		Ok(Self {
			settings,
			backup,
			window: WindowGeometry::read(field(root, "window")?)?,
			max_recent: int_as(root, "max_recent")?,
			recent_paths,
			open_documents,
			hotkeys,
		})
	}

	/// Writes the typed view into a current-version config tree and syncs
	/// every size field.
	pub fn write_node(&self, root: &mut Node) -> Result<()> {
		set_int(root, "flags", self.settings.flags().bits())?;
		set_int(root, "max_undos", saturating(self.settings.max_undos.max(1), u32::MAX))?;
		set_int(root, "backup_count", saturating(self.backup.max_count, u16::MAX))?;
		set_int(root, "backup_interval", self.backup.interval.as_secs().min(u64::from(u32::MAX)))?;
		let backup_dir = self.backup.dir.as_deref().map(path_text).unwrap_or_default();
		set_text(root, "backup_dir", &backup_dir)?;
		self.window.write(field_mut(root, "window")?)?;
		set_int(root, "max_recent", saturating(self.max_recent, u16::MAX))?;

		fill_array(root, "recent_paths", &self.recent_paths, |entry, path| {
			set_text(entry, "path", &path_text(path))
		})?;
		fill_array(root, "open_documents", &self.open_documents, |entry, doc| {
			set_text(entry, "descriptor_id", &doc.descriptor_id)?;
			set_text(entry, "path", &path_text(&doc.path))?;
			doc.window.write(field_mut(entry, "window")?)?;
			set_int(entry, "state", u8::from(doc.minimized))
		})?;
		fill_array(root, "hotkeys", self.hotkeys.iter(), |entry, (combo, action)| {
			set_text(entry, "combo", &combo.to_string())?;
			set_text(entry, "action", action)
		})?;

		root.sync_all_sizes();
		Ok(())
	}

	/// Form in which `path` is stored: relative to `root_dir` when
	/// `sync_offsets_relative` is on and the path lies beneath it.
	pub fn stored_path(&self, path: &Path, root_dir: &Path) -> PathBuf {
		if self.settings.sync_offsets_relative
			&& let Ok(relative) = path.strip_prefix(root_dir)
		{
			return relative.to_path_buf();
		}
		path.to_path_buf()
	}

	/// Inverse of [`AppConfig::stored_path`].
	pub fn resolved_path(&self, stored: &Path, root_dir: &Path) -> PathBuf {
		if self.settings.sync_offsets_relative && stored.is_relative() {
			root_dir.join(stored)
		} else {
			stored.to_path_buf()
		}
	}
}

fn saturating<T: Into<u64>>(value: usize, max: T) -> u64 {
	u64::try_from(value).unwrap_or(u64::MAX).min(max.into())
}

fn path_text(path: &Path) -> String {
	path.to_string_lossy().into_owned()
}

/// Loads the config at `path`, upgrading older versions.
///
/// A missing file yields the defaults and a fresh tree. Returns the typed
/// view and the current-version tree it was read from.
pub fn load_config(path: &Path) -> Result<(AppConfig, Node)> {
	let format = config_format();
	let bytes = match std::fs::read(path) {
		Ok(bytes) => bytes,
		Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
			debug!(path = %path.display(), "no config file, using defaults");
			let config = AppConfig::default();
			let mut root = format.default_document()?;
			config.write_node(&mut root)?;
			return Ok((config, root));
		}
		Err(e) => return Err(io_error(path, e)),
	};

	let loaded = format.load(&bytes, &ParseOptions::default())?;
	if loaded.was_upgraded(&format) {
		debug!(path = %path.display(), from = loaded.version, "config upgraded");
	}
	if let Some(diagnostic) = &loaded.diagnostic {
		warn!(path = %path.display(), error = %diagnostic, "config partially read");
	}
	let config = AppConfig::from_node(&loaded.root)?;
	Ok((config, loaded.root))
}

/// Writes `config` into `root` and saves it to `path` through the regular
/// save pipeline.
///
/// The file is always committed to `path`, whatever `write_as_temp` says.
pub fn save_config(path: &Path, config: &AppConfig, root: &mut Node) -> Result<SaveReport> {
	config.write_node(root)?;
	let plan = config.settings.save_plan(path, &config.backup).with_write_as_temp(false);
	Ok(config_format().save(&plan, root)?)
}
