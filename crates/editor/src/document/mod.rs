//! One open document: its tree, history, editor tree and save lifecycle.
//!
//! All mutation happens on the caller's thread. A save flushes every editor,
//! checks the target, and hands a snapshot of the tree to a [`SaveWorker`];
//! until [`Document::poll_save`] collects the report the document refuses
//! edits, undo, redo and further saves.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use binilla_codec::{CodecError, parse};
use binilla_config::{EditorSettings, RestoreEntry, WindowGeometry};
use binilla_history::{ApplyPolicy, EditHistory};
use binilla_node::{Node, TreePath};
use binilla_persist::{BackupPolicy, SaveReport, save_preflight};
use binilla_schema::Descriptor;
use tracing::{debug, info, warn};

use crate::context::{EditContext, View};
use crate::error::{FieldError, Result, SessionError};
use crate::field::{Field, FieldEditor, FlushOutcome};
use crate::worker::SaveWorker;

#[cfg(test)]
mod tests;

/// How often [`Document::wait_for_save`] polls the worker.
pub const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Modal questions and notices a session needs answered by its host.
pub trait Prompter {
	/// Asks what to do with unsaved changes to `title` before closing it.
	fn confirm_close(&mut self, title: &str) -> CloseChoice;

	/// Asks before throwing away unsaved changes to `title`.
	fn confirm_discard(&mut self, title: &str) -> bool;

	/// The history of `title` is full. Returns a larger cap, or `None` to
	/// stop asking until the history drops below the cap again.
	fn offer_history_resize(&mut self, title: &str, current: usize) -> Option<usize>;

	fn notify(&mut self, message: &str);
}

/// Answer to [`Prompter::confirm_close`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseChoice {
	Save,
	Discard,
	Cancel,
}

/// Result of [`Document::request_close`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseDecision {
	Close,
	Cancel,
	/// A save is running; ask again once it finishes.
	StillSaving,
}

/// An open document.
#[derive(Debug)]
pub struct Document {
	descriptor_id: String,
	root: Node,
	history: EditHistory,
	editor: Option<FieldEditor>,
	settings: EditorSettings,
	backup: BackupPolicy,
	path: Option<PathBuf>,
	is_new: bool,
	worker: Option<SaveWorker>,
	/// Path to fall back to if the running save-as fails.
	path_before_save_as: Option<Option<PathBuf>>,
	diagnostic: Option<CodecError>,
	window: WindowGeometry,
	minimized: bool,
}

impl Document {
	/// A new, never-saved document holding the descriptor's defaults.
	pub fn new(
		descriptor_id: impl Into<String>,
		desc: &Arc<Descriptor>,
		settings: EditorSettings,
		backup: BackupPolicy,
	) -> Self {
		let mut root = Node::default_tree(desc);
		root.sync_all_sizes();
		let mut doc = Self::with_root(descriptor_id.into(), root, settings, backup);
		doc.is_new = true;
		doc
	}

	/// Parses the file at `path` against `desc`.
	///
	/// With `allow_corrupt` a bad file opens as a partial tree; the document
	/// then counts as modified and [`Document::diagnostic`] holds the error.
	pub fn open(
		descriptor_id: impl Into<String>,
		desc: &Arc<Descriptor>,
		path: impl Into<PathBuf>,
		settings: EditorSettings,
		backup: BackupPolicy,
	) -> Result<Self> {
		let path = path.into();
		let bytes = std::fs::read(&path).map_err(|e| SessionError::io(&path, e))?;
		let outcome = parse(desc, &bytes, &settings.parse_options())?;

		let mut doc = Self::with_root(descriptor_id.into(), outcome.root, settings, backup);
		doc.path = Some(path);
		if let Some(diagnostic) = outcome.diagnostic {
			warn!(path = %doc.title(), error = %diagnostic, "document partially read");
			doc.history.invalidate_saved();
			doc.diagnostic = Some(diagnostic);
		}
		info!(path = %doc.title(), len = bytes.len(), "document opened");
		Ok(doc)
	}

	fn with_root(descriptor_id: String, root: Node, settings: EditorSettings, backup: BackupPolicy) -> Self {
		let editor = FieldEditor::build(View::new(&root, &settings), &TreePath::root());
		Self {
			descriptor_id,
			history: EditHistory::new(settings.max_undos),
			root,
			editor,
			settings,
			backup,
			path: None,
			is_new: false,
			worker: None,
			path_before_save_as: None,
			diagnostic: None,
			window: WindowGeometry::default(),
			minimized: false,
		}
	}

	pub fn descriptor_id(&self) -> &str {
		&self.descriptor_id
	}

	pub fn root(&self) -> &Node {
		&self.root
	}

	pub fn history(&self) -> &EditHistory {
		&self.history
	}

	pub fn settings(&self) -> &EditorSettings {
		&self.settings
	}

	pub fn path(&self) -> Option<&Path> {
		self.path.as_deref()
	}

	/// Never saved since it was created.
	pub fn is_new(&self) -> bool {
		self.is_new
	}

	/// Has changes that are not on disk.
	pub fn is_dirty(&self) -> bool {
		self.is_new || self.history.is_dirty()
	}

	pub fn is_saving(&self) -> bool {
		self.worker.is_some()
	}

	/// Why the file only partially parsed.
	pub fn diagnostic(&self) -> Option<&CodecError> {
		self.diagnostic.as_ref()
	}

	/// File name, or "untitled" for documents without a path.
	pub fn title(&self) -> String {
		self.path
			.as_deref()
			.and_then(Path::file_name)
			.map_or_else(|| "untitled".to_string(), |name| name.to_string_lossy().into_owned())
	}

	pub fn view(&self) -> View<'_> {
		View::new(&self.root, &self.settings)
	}

	/// Root of the editor tree; `None` when the root has nothing to edit.
	pub fn editor(&self) -> Option<&FieldEditor> {
		self.editor.as_ref()
	}

	/// Editor tree for navigation such as changing an array selection.
	/// Edits go through [`Document::edit`].
	pub fn editor_mut(&mut self) -> Option<&mut FieldEditor> {
		self.editor.as_mut()
	}

	pub fn window(&self) -> (WindowGeometry, bool) {
		(self.window, self.minimized)
	}

	pub fn set_window(&mut self, window: WindowGeometry, minimized: bool) {
		self.window = window;
		self.minimized = minimized;
	}

	/// Applies new editing settings, rebuilding the editors when visibility
	/// changed.
	pub fn set_settings(&mut self, settings: EditorSettings) {
		let visibility_changed = settings.show_invisible != self.settings.show_invisible
			|| settings.show_metadata != self.settings.show_metadata
			|| settings.show_all_bools != self.settings.show_all_bools;
		if settings.max_undos != self.history.max_undos() {
			self.history.resize(settings.max_undos);
		}
		self.settings = settings;
		if visibility_changed {
			self.rebuild_editor();
		}
	}

	pub fn set_backup(&mut self, backup: BackupPolicy) {
		self.backup = backup;
	}

	/// Discards the editor tree and builds a fresh one.
	pub fn rebuild_editor(&mut self) {
		self.editor = FieldEditor::build(self.view(), &TreePath::root());
	}

	fn ensure_idle(&self) -> Result<()> {
		if self.is_saving() {
			return Err(SessionError::Saving(self.title()));
		}
		Ok(())
	}

	/// Runs `op` against the editor tree with edit access to the document.
	///
	/// Edits are refused while saving. When an edit fills the history the
	/// prompter is offered a bigger one.
	pub fn edit<R>(
		&mut self,
		prompter: &mut dyn Prompter,
		op: impl FnOnce(&mut FieldEditor, &mut EditContext<'_>) -> std::result::Result<R, FieldError>,
	) -> Result<R> {
		let Some(editor) = self.editor.as_mut() else {
			return Err(FieldError::Unavailable("the document has nothing to edit").into());
		};
		let mut ctx = EditContext::new(&mut self.root, &mut self.history, &self.settings);
		ctx.saving = self.worker.is_some();
		let result = op(&mut *editor, &mut ctx);
		for target in &ctx.touched {
			editor.mark_edited_along(target);
		}
		if ctx.offer_resize {
			self.offer_resize(prompter);
		}
		Ok(result?)
	}

	fn offer_resize(&mut self, prompter: &mut dyn Prompter) {
		let current = self.history.max_undos();
		match prompter.offer_history_resize(&self.title(), current) {
			Some(max) if max > current => {
				info!(document = %self.title(), from = current, to = max, "history enlarged");
				self.history.resize(max);
				self.settings.max_undos = max;
			}
			_ => self.history.decline_resize(),
		}
	}

	/// Commits input pending in any editor.
	pub fn flush(&mut self, prompter: &mut dyn Prompter) -> Result<FlushOutcome> {
		if self.editor.is_none() {
			return Ok(FlushOutcome::Unchanged);
		}
		self.edit(prompter, |editor, ctx| editor.flush(ctx))
	}

	/// Reverts the last edit. Returns `false` with nothing to undo.
	pub fn undo(&mut self, prompter: &mut dyn Prompter) -> Result<bool> {
		self.step(prompter, true)
	}

	/// Re-applies the last undone edit. Returns `false` with nothing to redo.
	pub fn redo(&mut self, prompter: &mut dyn Prompter) -> Result<bool> {
		self.step(prompter, false)
	}

	fn step(&mut self, prompter: &mut dyn Prompter, undo: bool) -> Result<bool> {
		self.ensure_idle()?;
		self.flush(prompter)?;
		let policy = ApplyPolicy {
			limits: self.settings.count_limits(),
		};
		let moved = if undo {
			self.history.undo(&mut self.root, &policy)?
		} else {
			self.history.redo(&mut self.root, &policy)?
		};
		let Some(state) = moved else {
			return Ok(false);
		};
		let target = state.target();
		let selection = state.extra.selection_for(undo);
		debug!(kind = %state.kind(), target = %target, undo, "history step");
		self.reconcile(&target, selection);
		Ok(true)
	}

	/// Brings the editor tree back in line with the tree after an undo or
	/// redo, restoring the array selection the edit recorded.
	fn reconcile(&mut self, target: &TreePath, selection: Option<isize>) {
		let view = View::new(&self.root, &self.settings);
		let root = TreePath::root();
		let stale = self.editor.as_mut().is_none_or(|editor| editor.load(view, &root));
		if stale {
			self.editor = FieldEditor::build(view, &root);
		}
		let Some(editor) = self.editor.as_mut() else {
			return;
		};
		if let Some(selection) = selection
			&& let Some(array) = editor.find_mut(target).and_then(FieldEditor::as_array_mut)
		{
			array.restore_selection(view, selection);
		}
		editor.mark_edited_along(target);
	}

	/// Starts saving to the document's path.
	///
	/// Pending input is flushed first. The write runs on a worker; collect
	/// its report with [`Document::poll_save`].
	pub fn save(&mut self, prompter: &mut dyn Prompter) -> Result<()> {
		self.ensure_idle()?;
		let path = self.path.clone().ok_or(SessionError::NoPath)?;
		self.flush(prompter)?;

		let plan = self.settings.save_plan(&path, &self.backup);
		let preflight = save_preflight(&plan)?;
		if !preflight.writable {
			return Err(SessionError::NotWritable(path));
		}
		debug!(
			path = %path.display(),
			exists = preflight.exists,
			backup = preflight.backup_needed,
			"save preflight passed"
		);
		self.worker = Some(SaveWorker::spawn(plan, self.root.clone())?);
		Ok(())
	}

	/// Starts saving to `path`, which becomes the document's path.
	///
	/// The previous path comes back if the save fails, now or when polled.
	pub fn save_as(&mut self, path: impl Into<PathBuf>, prompter: &mut dyn Prompter) -> Result<()> {
		self.ensure_idle()?;
		let previous = self.path.replace(path.into());
		if let Err(e) = self.save(prompter) {
			self.path = previous;
			return Err(e);
		}
		self.path_before_save_as = Some(previous);
		Ok(())
	}

	/// Collects the save report once the worker is done.
	///
	/// A committed save marks the document clean. A failed one, or one kept
	/// as a temp file, leaves it dirty.
	pub fn poll_save(&mut self) -> Option<Result<SaveReport>> {
		let outcome = self.worker.as_mut()?.poll()?;
		self.worker = None;
		let previous = self.path_before_save_as.take();
		match &outcome {
			Ok(report) if Some(report.written.as_path()) == self.path.as_deref() => {
				self.history.mark_saved();
				self.is_new = false;
				info!(path = %report.written.display(), backup = ?report.backup, "document saved");
			}
			Ok(report) => info!(temp = %report.written.display(), "document written to temp"),
			Err(e) => {
				warn!(document = %self.title(), error = %e, "save failed");
				if let Some(previous) = previous {
					self.path = previous;
				}
			}
		}
		Some(outcome)
	}

	/// Blocks until the running save finishes. `None` when nothing is saving.
	pub fn wait_for_save(&mut self) -> Option<Result<SaveReport>> {
		loop {
			self.worker.as_ref()?;
			if let Some(outcome) = self.poll_save() {
				return Some(outcome);
			}
			std::thread::sleep(POLL_INTERVAL);
		}
	}

	/// Saves and waits for the outcome.
	pub fn save_blocking(&mut self, prompter: &mut dyn Prompter) -> Result<SaveReport> {
		self.save(prompter)?;
		match self.wait_for_save() {
			Some(outcome) => outcome,
			None => Err(SessionError::WorkerLost(self.path.clone().unwrap_or_default())),
		}
	}

	/// Re-reads the file from disk, dropping the history.
	///
	/// Asks before discarding unsaved changes; returns `false` when declined.
	pub fn reload(&mut self, prompter: &mut dyn Prompter) -> Result<bool> {
		self.ensure_idle()?;
		let path = self.path.clone().ok_or(SessionError::NoPath)?;
		if self.is_dirty() && !prompter.confirm_discard(&self.title()) {
			return Ok(false);
		}
		let bytes = std::fs::read(&path).map_err(|e| SessionError::io(&path, e))?;
		let outcome = parse(self.root.desc(), &bytes, &self.settings.parse_options())?;
		self.root = outcome.root;
		self.history.clear();
		if outcome.diagnostic.is_none() {
			self.history.mark_saved();
		}
		self.diagnostic = outcome.diagnostic;
		self.is_new = false;
		self.rebuild_editor();
		info!(path = %path.display(), "document reloaded");
		Ok(true)
	}

	/// Decides whether the document may close, saving first when asked to.
	pub fn request_close(&mut self, prompter: &mut dyn Prompter) -> Result<CloseDecision> {
		if self.is_saving() {
			prompter.notify(&SessionError::Saving(self.title()).to_string());
			return Ok(CloseDecision::StillSaving);
		}
		self.flush(prompter)?;
		if !self.is_dirty() {
			return Ok(CloseDecision::Close);
		}
		match prompter.confirm_close(&self.title()) {
			CloseChoice::Discard => Ok(CloseDecision::Close),
			CloseChoice::Cancel => Ok(CloseDecision::Cancel),
			CloseChoice::Save => match self.save_blocking(prompter) {
				Ok(_) => Ok(CloseDecision::Close),
				Err(e) => {
					prompter.notify(&e.to_string());
					Ok(CloseDecision::Cancel)
				}
			},
		}
	}

	/// How to reopen this document at the next start.
	pub fn restore_entry(&self) -> Option<RestoreEntry> {
		Some(RestoreEntry {
			descriptor_id: self.descriptor_id.clone(),
			path: self.path.clone()?,
			window: self.window,
			minimized: self.minimized,
		})
	}
}
