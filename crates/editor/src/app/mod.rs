//! Application state: open sessions, recent files, configuration, style
//! and hotkeys.
//!
//! Sessions are kept in opening order, which window-tiling hosts rely on.
//! The configuration and style documents live in the application's root
//! directory and are saved through the same pipeline as user documents.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::{fmt, fs};

use binilla_config::{AppConfig, EditorSettings, RestoreEntry, Style, load_config, load_style, save_style};
use binilla_keymap::{ActionTable, HotkeyTable};
use binilla_node::Node;
use binilla_persist::{BackupPolicy, SavePlan, SaveReport};
use binilla_schema::Descriptor;
use indexmap::IndexMap;
use strum_macros::{AsRefStr, Display, EnumIter, EnumString, IntoStaticStr};
use tracing::{debug, info, warn};

use crate::document::{CloseDecision, Document, Prompter};
use crate::error::{Result, SessionError};
use crate::field::Field;

mod recent;

#[cfg(test)]
mod tests;

pub use recent::RecentPaths;

/// File name of the configuration document inside the root directory.
pub const CONFIG_FILE: &str = "binilla.cfg";
/// File name of the style document inside the root directory.
pub const STYLE_FILE: &str = "binilla.sty";

/// Opaque handle of an open session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(u64);

impl fmt::Display for SessionId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "session#{}", self.0)
	}
}

/// Actions hotkeys can be bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, IntoStaticStr, AsRefStr, EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum Action {
	New,
	Open,
	Save,
	SaveAs,
	SaveAll,
	Close,
	Undo,
	Redo,
	Reload,
	Quit,
}

impl Action {
	/// Whether the action acts on the focused document.
	pub fn needs_document(self) -> bool {
		!matches!(self, Action::New | Action::Open | Action::SaveAll | Action::Quit)
	}

	/// Whether completing the action is up to the host, e.g. because it
	/// needs a file dialog.
	pub fn is_hosted(self) -> bool {
		matches!(self, Action::New | Action::Open | Action::SaveAs | Action::Quit)
	}
}

/// Actions offered given whether a document has focus.
struct Available {
	has_document: bool,
}

impl ActionTable for Available {
	fn has_action(&self, action: &str) -> bool {
		action
			.parse::<Action>()
			.is_ok_and(|action| self.has_document || !action.needs_document())
	}
}

/// What a hotkey led to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
	/// No binding, or one the focused session cannot perform.
	Unbound,
	Done(Action),
	/// The host has to finish the action.
	Host(Action),
}

/// Everything open in one application instance.
#[derive(Debug)]
pub struct App {
	root_dir: PathBuf,
	config: AppConfig,
	config_root: Node,
	style: Style,
	style_root: Node,
	descriptors: IndexMap<String, Arc<Descriptor>>,
	sessions: IndexMap<SessionId, Document>,
	active: Option<SessionId>,
	recent: RecentPaths,
	next_id: u64,
}

impl App {
	/// Loads configuration and style from `root_dir`, falling back to
	/// defaults for missing files.
	pub fn load(root_dir: impl Into<PathBuf>) -> Result<Self> {
		let root_dir = root_dir.into();
		let (mut config, config_root) = load_config(&root_dir.join(CONFIG_FILE))?;
		let (style, style_root) = load_style(&root_dir.join(STYLE_FILE));

		let recent = RecentPaths::from_paths(
			config.recent_paths.iter().map(|p| config.resolved_path(p, &root_dir)),
			config.max_recent,
		);
		let resolved: Vec<_> = config
			.open_documents
			.iter()
			.map(|entry| config.resolved_path(&entry.path, &root_dir))
			.collect();
		for (entry, path) in config.open_documents.iter_mut().zip(resolved) {
			entry.path = path;
		}
		info!(
			root = %root_dir.display(),
			recent = recent.len(),
			restorable = config.open_documents.len(),
			"application state loaded"
		);

		Ok(Self {
			root_dir,
			config,
			config_root,
			style,
			style_root,
			descriptors: IndexMap::new(),
			sessions: IndexMap::new(),
			active: None,
			recent,
			next_id: 0,
		})
	}

	pub fn root_dir(&self) -> &Path {
		&self.root_dir
	}

	pub fn config(&self) -> &AppConfig {
		&self.config
	}

	pub fn style(&self) -> &Style {
		&self.style
	}

	pub fn recent(&self) -> &RecentPaths {
		&self.recent
	}

	pub fn hotkeys(&self) -> &HotkeyTable {
		&self.config.hotkeys
	}

	/// Makes `desc` available under `id`, returning what it replaced.
	pub fn register_descriptor(&mut self, id: impl Into<String>, desc: Arc<Descriptor>) -> Option<Arc<Descriptor>> {
		self.descriptors.insert(id.into(), desc)
	}

	pub fn descriptor(&self, id: &str) -> Result<&Arc<Descriptor>> {
		self.descriptors
			.get(id)
			.ok_or_else(|| SessionError::UnknownDescriptor(id.to_string()))
	}

	fn insert(&mut self, mut doc: Document) -> SessionId {
		let id = SessionId(self.next_id);
		self.next_id += 1;
		if let Some(editor) = doc.editor_mut() {
			editor.apply_style(&self.style, &mut HashSet::new());
		}
		self.sessions.insert(id, doc);
		self.active = Some(id);
		debug!(session = %id, "session added");
		id
	}

	/// Opens a new, unsaved document of the given descriptor.
	pub fn new_document(&mut self, descriptor_id: &str) -> Result<SessionId> {
		let desc = self.descriptor(descriptor_id)?.clone();
		let doc = Document::new(descriptor_id, &desc, self.config.settings, self.config.backup.clone());
		Ok(self.insert(doc))
	}

	/// Opens the file at `path`.
	///
	/// A file that is already open is focused and reported as
	/// [`SessionError::AlreadyOpen`]. A path that no longer exists drops out
	/// of the recent list.
	pub fn open(&mut self, descriptor_id: &str, path: impl Into<PathBuf>) -> Result<SessionId> {
		let path = path.into();
		let path = match fs::canonicalize(&path) {
			Ok(path) => path,
			Err(e) => {
				self.recent.remove(&path);
				return Err(SessionError::io(path, e));
			}
		};
		if let Some(existing) = self.find_by_path(&path) {
			self.active = Some(existing);
			return Err(SessionError::AlreadyOpen(path));
		}
		let desc = self.descriptor(descriptor_id)?.clone();
		let doc = Document::open(descriptor_id, &desc, &path, self.config.settings, self.config.backup.clone())?;
		self.recent.push(&path);
		Ok(self.insert(doc))
	}

	pub fn find_by_path(&self, path: &Path) -> Option<SessionId> {
		self.sessions
			.iter()
			.find(|(_, doc)| doc.path() == Some(path))
			.map(|(id, _)| *id)
	}

	pub fn session(&self, id: SessionId) -> Option<&Document> {
		self.sessions.get(&id)
	}

	pub fn session_mut(&mut self, id: SessionId) -> Option<&mut Document> {
		self.sessions.get_mut(&id)
	}

	/// Open sessions in opening order.
	pub fn sessions(&self) -> impl Iterator<Item = (SessionId, &Document)> {
		self.sessions.iter().map(|(id, doc)| (*id, doc))
	}

	pub fn session_count(&self) -> usize {
		self.sessions.len()
	}

	/// The focused session.
	pub fn active(&self) -> Option<SessionId> {
		self.active
	}

	pub fn set_active(&mut self, id: SessionId) -> bool {
		let known = self.sessions.contains_key(&id);
		if known {
			self.active = Some(id);
		}
		known
	}

	/// Closes a session once its document agrees.
	pub fn close(&mut self, id: SessionId, prompter: &mut dyn Prompter) -> Result<CloseDecision> {
		let Some(doc) = self.sessions.get_mut(&id) else {
			return Ok(CloseDecision::Close);
		};
		let decision = doc.request_close(prompter)?;
		if decision == CloseDecision::Close {
			self.sessions.shift_remove(&id);
			if self.active == Some(id) {
				self.active = self.sessions.last().map(|(id, _)| *id);
			}
			info!(session = %id, "session closed");
		}
		Ok(decision)
	}

	/// Starts saving a session to `path` and records the path as recent.
	///
	/// Refuses a path another session already has open.
	pub fn save_as(&mut self, id: SessionId, path: impl Into<PathBuf>, prompter: &mut dyn Prompter) -> Result<()> {
		let path = canonical_target(&path.into())?;
		if let Some(other) = self.find_by_path(&path)
			&& other != id
		{
			return Err(SessionError::AlreadyOpen(path));
		}
		let doc = self
			.sessions
			.get_mut(&id)
			.ok_or_else(|| SessionError::UnknownSession(id.to_string()))?;
		doc.save_as(&path, prompter)?;
		self.recent.push(path);
		Ok(())
	}

	/// Starts saving every modified document that has a path.
	///
	/// Failures are reported through the prompter and do not stop the rest.
	/// Returns how many saves started.
	pub fn save_all(&mut self, prompter: &mut dyn Prompter) -> usize {
		let mut started = 0;
		for (id, doc) in &mut self.sessions {
			if doc.path().is_none() || !doc.is_dirty() || doc.is_saving() {
				continue;
			}
			match doc.save(prompter) {
				Ok(()) => started += 1,
				Err(e) => {
					warn!(session = %id, error = %e, "save failed to start");
					prompter.notify(&e.to_string());
				}
			}
		}
		started
	}

	/// Collects the reports of saves that finished since the last poll.
	pub fn poll_saves(&mut self) -> Vec<(SessionId, Result<SaveReport>)> {
		self.sessions
			.iter_mut()
			.filter_map(|(id, doc)| doc.poll_save().map(|outcome| (*id, outcome)))
			.collect()
	}

	/// Applies new editing settings to the configuration and every session.
	pub fn set_settings(&mut self, settings: EditorSettings) {
		self.config.settings = settings;
		for doc in self.sessions.values_mut() {
			doc.set_settings(settings);
		}
	}

	pub fn set_backup(&mut self, backup: BackupPolicy) {
		for doc in self.sessions.values_mut() {
			doc.set_backup(backup.clone());
		}
		self.config.backup = backup;
	}

	pub fn set_max_recent(&mut self, max: usize) {
		self.config.max_recent = max;
		self.recent.set_max(max);
	}

	/// Replaces the style, restyles every editor and saves the style file.
	pub fn set_style(&mut self, style: Style) -> Result<SaveReport> {
		self.style = style;
		for doc in self.sessions.values_mut() {
			if let Some(editor) = doc.editor_mut() {
				editor.apply_style(&self.style, &mut HashSet::new());
			}
		}
		let plan =
			SavePlan::new(self.root_dir.join(STYLE_FILE)).with_integrity_test(self.config.settings.integrity_test);
		Ok(save_style(&plan, &self.style, &mut self.style_root)?)
	}

	/// Binds `action` to `combo` alone, dropping its other combos.
	pub fn rebind(&mut self, action: Action, combo: &str) -> Result<()> {
		let replaced = self.config.hotkeys.rebind(action.as_ref(), combo)?;
		debug!(%action, combo, ?replaced, "hotkey rebound");
		Ok(())
	}

	/// The action `combo` triggers for the focused session.
	pub fn resolve_hotkey(&self, combo: &str) -> Option<Action> {
		let available = Available {
			has_document: self.active.is_some(),
		};
		self.config.hotkeys.resolve(combo, &available)?.parse().ok()
	}

	/// Resolves `combo` and performs what the core can do itself.
	pub fn dispatch(&mut self, combo: &str, prompter: &mut dyn Prompter) -> Result<Dispatch> {
		let Some(action) = self.resolve_hotkey(combo) else {
			return Ok(Dispatch::Unbound);
		};
		Ok(if self.perform(action, prompter)? {
			Dispatch::Done(action)
		} else {
			Dispatch::Host(action)
		})
	}

	/// Performs `action` on the focused session. Returns `false` when the
	/// host has to complete it.
	pub fn perform(&mut self, action: Action, prompter: &mut dyn Prompter) -> Result<bool> {
		if action.is_hosted() {
			return Ok(false);
		}
		if action == Action::SaveAll {
			self.save_all(prompter);
			return Ok(true);
		}
		let Some(id) = self.active else {
			return Ok(false);
		};
		if action == Action::Close {
			self.close(id, prompter)?;
			return Ok(true);
		}
		let Some(doc) = self.sessions.get_mut(&id) else {
			return Ok(false);
		};
		match action {
			Action::Save if doc.path().is_none() => return Ok(false),
			Action::Save => doc.save(prompter)?,
			Action::Undo => {
				doc.undo(prompter)?;
			}
			Action::Redo => {
				doc.redo(prompter)?;
			}
			Action::Reload => {
				doc.reload(prompter)?;
			}
			_ => return Ok(false),
		}
		Ok(true)
	}

	/// Writes the configuration file.
	pub fn save_config(&mut self) -> Result<SaveReport> {
		let mut stored = self.config.clone();
		stored.recent_paths = self
			.recent
			.iter()
			.map(|path| self.config.stored_path(path, &self.root_dir))
			.collect();
		stored.max_recent = self.recent.max();
		for entry in &mut stored.open_documents {
			entry.path = self.config.stored_path(&entry.path, &self.root_dir);
		}
		let path = self.root_dir.join(CONFIG_FILE);
		Ok(binilla_config::save_config(&path, &stored, &mut self.config_root)?)
	}

	/// Closes every session and records them for the next start.
	///
	/// Returns `false` when a session refused to close. The sessions closed
	/// before it are still recorded, and a later shutdown adds the rest.
	pub fn shutdown(&mut self, prompter: &mut dyn Prompter) -> Result<bool> {
		let mut entries = std::mem::take(&mut self.config.open_documents);
		let ids: Vec<SessionId> = self.sessions.keys().copied().collect();
		for id in ids {
			let entry = self.sessions.get(&id).and_then(Document::restore_entry);
			let decision = self.close(id, prompter)?;
			if decision != CloseDecision::Close {
				info!(session = %id, ?decision, "shutdown interrupted");
				self.config.open_documents = entries;
				self.save_config()?;
				return Ok(false);
			}
			if let Some(entry) = entry
				&& !entries.iter().any(|e| e.path == entry.path)
			{
				entries.push(entry);
			}
		}
		self.config.open_documents = entries;
		self.save_config()?;
		info!("application shut down");
		Ok(true)
	}

	/// Reopens the documents recorded at the last shutdown.
	///
	/// Returns the entries that failed to open, with the reason.
	pub fn restore_sessions(&mut self) -> Vec<(RestoreEntry, SessionError)> {
		let entries = std::mem::take(&mut self.config.open_documents);
		let mut failed = Vec::new();
		for entry in entries {
			match self.open(&entry.descriptor_id, &entry.path) {
				Ok(id) => {
					if let Some(doc) = self.sessions.get_mut(&id) {
						doc.set_window(entry.window, entry.minimized);
					}
				}
				Err(e) => {
					warn!(path = %entry.path.display(), error = %e, "cannot restore document");
					failed.push((entry, e));
				}
			}
		}
		failed
	}
}

/// `path` with its directory resolved, so sessions compare by real location.
fn canonical_target(path: &Path) -> Result<PathBuf> {
	let name = path.file_name().ok_or_else(|| {
		SessionError::io(path, std::io::Error::new(std::io::ErrorKind::InvalidInput, "no file name"))
	})?;
	let dir = match path.parent() {
		Some(dir) if !dir.as_os_str().is_empty() => dir,
		_ => Path::new("."),
	};
	let dir = fs::canonicalize(dir).map_err(|e| SessionError::io(dir, e))?;
	Ok(dir.join(name))
}
