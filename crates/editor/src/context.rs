//! What an editor sees of its document while loading and while committing.

use binilla_config::EditorSettings;
use binilla_history::{ApplyPolicy, EditHistory, EditState};
use binilla_node::{Node, TreePath};
use tracing::debug;

use crate::error::FieldError;

/// Read-only view of a document, used to load and refresh editors.
#[derive(Clone, Copy)]
pub struct View<'a> {
	pub root: &'a Node,
	pub settings: &'a EditorSettings,
}

impl<'a> View<'a> {
	pub fn new(root: &'a Node, settings: &'a EditorSettings) -> Self {
		Self { root, settings }
	}

	/// Whether a field with the given visibility is shown under the current
	/// overrides.
	pub fn is_visible(&self, node: &Node) -> bool {
		node.desc()
			.visibility
			.is_visible(self.settings.show_metadata, self.settings.show_invisible)
	}
}

/// Mutable access to one document for the duration of a flush or an
/// editor operation.
pub struct EditContext<'a> {
	pub root: &'a mut Node,
	pub history: &'a mut EditHistory,
	pub settings: &'a EditorSettings,
	/// Set while a background save holds the document.
	pub saving: bool,
	/// Set when a push filled the history and the user should be offered
	/// a bigger one.
	pub offer_resize: bool,
	/// Targets of the states submitted through this context, in order.
	pub touched: Vec<TreePath>,
}

impl<'a> EditContext<'a> {
	pub fn new(root: &'a mut Node, history: &'a mut EditHistory, settings: &'a EditorSettings) -> Self {
		Self {
			root,
			history,
			settings,
			saving: false,
			offer_resize: false,
			touched: Vec::new(),
		}
	}

	pub fn view(&self) -> View<'_> {
		View::new(self.root, self.settings)
	}

	pub fn policy(&self) -> ApplyPolicy {
		ApplyPolicy {
			limits: self.settings.count_limits(),
		}
	}

	/// Applies `state` and records it in the history.
	///
	/// Refused while the document is saving; nothing is recorded when the
	/// apply fails.
	pub fn submit(&mut self, state: EditState) -> Result<(), FieldError> {
		if self.saving {
			debug!(kind = %state.kind(), "edit refused while saving");
			return Err(FieldError::Saving);
		}
		let policy = self.policy();
		let target = state.target();
		let pushed = self.history.push(self.root, state, &policy)?;
		self.offer_resize |= pushed.offer_resize;
		self.touched.push(target);
		Ok(())
	}
}
