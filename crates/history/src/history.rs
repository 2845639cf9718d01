//! Bounded undo/redo log with a cursor and a saved marker.

use std::collections::VecDeque;

use binilla_node::Node;
use tracing::{debug, trace};

use crate::apply::{ApplyPolicy, apply};
use crate::error::Result;
use crate::state::EditState;

/// Default cap on the number of edit states kept per document.
pub const DEFAULT_MAX_UNDOS: usize = 1000;

/// What happened when a state was pushed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pushed {
	/// The oldest state was evicted to make room.
	pub evicted: bool,
	/// The history should offer to grow; the user has not declined yet.
	pub offer_resize: bool,
}

/// Edit states in application order.
///
/// The cursor counts applied states: states before it can be undone, states
/// at or after it can be redone. The saved marker records the cursor value
/// of the last save and is dropped once that point can no longer be reached.
#[derive(Debug, Clone)]
pub struct EditHistory {
	states: VecDeque<EditState>,
	applied: usize,
	saved: Option<usize>,
	max_undos: usize,
	resize_declined: bool,
}

impl Default for EditHistory {
	fn default() -> Self {
		Self::new(DEFAULT_MAX_UNDOS)
	}
}

impl EditHistory {
	/// Creates an empty history holding at most `max_undos` states (at least one).
	///
	/// The empty history counts as saved.
	pub fn new(max_undos: usize) -> Self {
		Self {
			states: VecDeque::new(),
			applied: 0,
			saved: Some(0),
			max_undos: max_undos.max(1),
			resize_declined: false,
		}
	}

	pub fn len(&self) -> usize {
		self.states.len()
	}

	pub fn is_empty(&self) -> bool {
		self.states.is_empty()
	}

	pub fn max_undos(&self) -> usize {
		self.max_undos
	}

	/// Index of the last applied state, if any.
	pub fn edit_index(&self) -> Option<usize> {
		self.applied.checked_sub(1)
	}

	/// Index of the last applied state at the last save.
	///
	/// `Some(None)` means the document was saved with nothing applied; `None`
	/// means the saved point was evicted or truncated away.
	pub fn last_saved_edit_index(&self) -> Option<Option<usize>> {
		self.saved.map(|s| s.checked_sub(1))
	}

	pub fn can_undo(&self) -> bool {
		self.applied > 0
	}

	pub fn can_redo(&self) -> bool {
		self.applied < self.states.len()
	}

	/// Returns `true` when the cursor is not at the saved marker.
	pub fn is_dirty(&self) -> bool {
		self.saved != Some(self.applied)
	}

	/// Records the current cursor as the saved point.
	pub fn mark_saved(&mut self) {
		self.saved = Some(self.applied);
	}

	/// Forgets the saved point, e.g. after a save failed or the file vanished.
	pub fn invalidate_saved(&mut self) {
		self.saved = None;
	}

	pub fn is_full(&self) -> bool {
		self.states.len() >= self.max_undos
	}

	pub fn resize_declined(&self) -> bool {
		self.resize_declined
	}

	/// Stops offering a resize until the cursor leaves the cap.
	pub fn decline_resize(&mut self) {
		self.resize_declined = true;
	}

	/// State that the next [`undo`](Self::undo) would revert.
	pub fn peek_undo(&self) -> Option<&EditState> {
		self.edit_index().and_then(|i| self.states.get(i))
	}

	/// State that the next [`redo`](Self::redo) would apply.
	pub fn peek_redo(&self) -> Option<&EditState> {
		self.states.get(self.applied)
	}

	/// Applies `state` forward and records it.
	///
	/// Nothing is recorded when the apply fails.
	pub fn push(&mut self, root: &mut Node, state: EditState, policy: &ApplyPolicy) -> Result<Pushed> {
		apply(root, &state, false, policy)?;
		Ok(self.add_state(state))
	}

	/// Records an already-applied state after the cursor.
	///
	/// Redo states past the cursor are discarded. When the cap is exceeded the
	/// oldest state is evicted and the saved marker shifts with it.
	pub fn add_state(&mut self, state: EditState) -> Pushed {
		if self.applied < self.states.len() {
			trace!(dropped = self.states.len() - self.applied, "discarding redo states");
			self.states.truncate(self.applied);
			if self.saved.is_some_and(|s| s > self.applied) {
				self.saved = None;
			}
		}
		trace!(kind = %state.kind(), target = %state.target(), "edit recorded");
		self.states.push_back(state);
		self.applied += 1;

		let evicted = self.states.len() > self.max_undos;
		if evicted {
			self.states.pop_front();
			self.applied -= 1;
			self.saved = self.saved.and_then(|s| s.checked_sub(1));
			debug!(max_undos = self.max_undos, "history full, oldest edit evicted");
		}
		Pushed {
			evicted,
			offer_resize: self.is_full() && !self.resize_declined,
		}
	}

	/// Reverts the state at the cursor and moves the cursor back.
	///
	/// Returns the reverted state, or `None` with nothing to undo. The cursor
	/// does not move when the apply fails.
	pub fn undo(&mut self, root: &mut Node, policy: &ApplyPolicy) -> Result<Option<&EditState>> {
		let Some(index) = self.edit_index() else {
			return Ok(None);
		};
		apply(root, &self.states[index], true, policy)?;
		self.applied = index;
		if self.applied < self.max_undos {
			self.resize_declined = false;
		}
		Ok(self.states.get(index))
	}

	/// Re-applies the state after the cursor and moves the cursor forward.
	pub fn redo(&mut self, root: &mut Node, policy: &ApplyPolicy) -> Result<Option<&EditState>> {
		let index = self.applied;
		let Some(state) = self.states.get(index) else {
			return Ok(None);
		};
		apply(root, state, false, policy)?;
		self.applied += 1;
		Ok(self.states.get(index))
	}

	/// Changes the cap, evicting states when it shrinks.
	///
	/// The oldest undo states go first, then redo states from the far end,
	/// so the states nearest the cursor survive.
	pub fn resize(&mut self, max_undos: usize) {
		let max_undos = max_undos.max(1);
		let excess = self.states.len().saturating_sub(max_undos);
		let from_front = excess.min(self.applied);
		let from_back = excess - from_front;

		self.states.drain(..from_front);
		self.applied -= from_front;
		self.saved = self.saved.and_then(|s| s.checked_sub(from_front));

		if from_back > 0 {
			let keep = self.states.len() - from_back;
			self.states.truncate(keep);
			if self.saved.is_some_and(|s| s > keep) {
				self.saved = None;
			}
		}
		if excess > 0 {
			debug!(max_undos, evicted = excess, "history shrunk");
		}
		self.max_undos = max_undos;
		if self.applied < self.max_undos {
			self.resize_declined = false;
		}
	}

	/// Drops every state, keeping the cap.
	pub fn clear(&mut self) {
		self.states.clear();
		self.applied = 0;
		self.saved = None;
		self.resize_declined = false;
	}
}

#[cfg(test)]
mod tests;
