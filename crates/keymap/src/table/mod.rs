//! The hotkey binding table.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::combo::{Combo, parse};
use crate::error::{KeymapError, ParseError};

#[cfg(test)]
mod tests;

/// Bindings installed when no configuration overrides them.
pub const DEFAULT_BINDINGS: &[(&str, &str)] = &[
	("ctrl+n", "new"),
	("ctrl+o", "open"),
	("ctrl+s", "save"),
	("ctrl+shift+s", "save_as"),
	("ctrl+alt+s", "save_all"),
	("ctrl+w", "close"),
	("ctrl+z", "undo"),
	("ctrl+y", "redo"),
	("ctrl+shift+z", "redo"),
	("f5", "reload"),
	("ctrl+q", "quit"),
];

/// The actions a session can currently perform.
///
/// Hotkeys bind to action names; whether a name means anything is decided
/// when the hotkey fires, by whichever session has focus.
pub trait ActionTable {
	fn has_action(&self, action: &str) -> bool;
}

impl<S: AsRef<str>> ActionTable for Vec<S> {
	fn has_action(&self, action: &str) -> bool {
		self.iter().any(|a| a.as_ref() == action)
	}
}

impl<S: AsRef<str>, const N: usize> ActionTable for [S; N] {
	fn has_action(&self, action: &str) -> bool {
		self.iter().any(|a| a.as_ref() == action)
	}
}

/// Maps normalized combos to action names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HotkeyTable {
	bindings: BTreeMap<Combo, String>,
}

impl HotkeyTable {
	pub fn new() -> Self {
		Self::default()
	}

	/// A table holding [`DEFAULT_BINDINGS`].
	pub fn with_defaults() -> Self {
		let bindings = DEFAULT_BINDINGS
			.iter()
			.filter_map(|(combo, action)| Some((parse(combo).ok()?, action.to_string())))
			.collect();
		Self { bindings }
	}

	pub fn len(&self) -> usize {
		self.bindings.len()
	}

	pub fn is_empty(&self) -> bool {
		self.bindings.is_empty()
	}

	/// Iterates bindings in canonical combo order.
	pub fn iter(&self) -> impl Iterator<Item = (&Combo, &str)> {
		self.bindings.iter().map(|(combo, action)| (combo, action.as_str()))
	}

	/// Binds `combo` to `action`, returning the action it was bound to before.
	///
	/// # Errors
	///
	/// Returns a [`ParseError`] if `combo` is not a valid combo string.
	pub fn bind(&mut self, combo: &str, action: impl Into<String>) -> Result<Option<String>, ParseError> {
		let combo = parse(combo)?;
		let action = action.into();
		trace!(combo = %combo, action, "bind hotkey");
		Ok(self.bindings.insert(combo, action))
	}

	/// Removes the binding for `combo`, returning its action.
	///
	/// # Errors
	///
	/// Returns a [`ParseError`] if `combo` is not a valid combo string.
	pub fn unbind(&mut self, combo: &str) -> Result<Option<String>, ParseError> {
		let combo = parse(combo)?;
		Ok(self.bindings.remove(&combo))
	}

	/// Moves `action` to `combo`.
	///
	/// Every combo currently bound to `action` is unbound first. Returns the
	/// action `combo` was bound to before, if it was bound to another one.
	///
	/// # Errors
	///
	/// Returns a [`ParseError`] if `combo` is not a valid combo string; the
	/// table is left unchanged.
	pub fn rebind(&mut self, action: &str, combo: &str) -> Result<Option<String>, ParseError> {
		let combo = parse(combo)?;
		self.bindings.retain(|_, bound| bound != action);
		trace!(combo = %combo, action, "rebind hotkey");
		Ok(self.bindings.insert(combo, action.to_string()))
	}

	/// Combos bound to `action`.
	pub fn combos_for<'a>(&'a self, action: &'a str) -> impl Iterator<Item = &'a Combo> {
		self.bindings.iter().filter(move |(_, bound)| *bound == action).map(|(combo, _)| combo)
	}

	/// The action bound to an already-parsed combo.
	pub fn action(&self, combo: &Combo) -> Option<&str> {
		self.bindings.get(combo).map(String::as_str)
	}

	/// Resolves a combo string to an action `actions` can perform.
	///
	/// Unparseable combos, unbound combos and actions the table does not
	/// offer all resolve to `None`.
	pub fn resolve(&self, combo: &str, actions: &dyn ActionTable) -> Option<&str> {
		let combo = match parse(combo) {
			Ok(combo) => combo,
			Err(error) => {
				debug!(combo, %error, "ignoring malformed hotkey");
				return None;
			}
		};
		let action = self.action(&combo)?;
		if !actions.has_action(action) {
			debug!(combo = %combo, action, "hotkey bound to an action the session lacks");
			return None;
		}
		Some(action)
	}

	/// Copies every binding of `other` over this table.
	pub fn merge(&mut self, other: &HotkeyTable) {
		for (combo, action) in &other.bindings {
			self.bindings.insert(combo.clone(), action.clone());
		}
	}

	/// Builds a table from `(combo, action)` pairs.
	///
	/// # Errors
	///
	/// Returns [`KeymapError::Combo`] for the first invalid combo.
	pub fn from_pairs<I, C, A>(pairs: I) -> Result<Self, KeymapError>
	where
		I: IntoIterator<Item = (C, A)>,
		C: AsRef<str>,
		A: Into<String>,
	{
		let mut table = Self::new();
		for (combo, action) in pairs {
			let combo = combo.as_ref();
			table.bind(combo, action).map_err(|source| KeymapError::Combo {
				combo: combo.to_string(),
				source,
			})?;
		}
		Ok(table)
	}

	/// Reads a table written as `"combo" = "action"` TOML pairs.
	///
	/// # Errors
	///
	/// Returns [`KeymapError::Decode`] if the text is not valid TOML or holds
	/// an invalid combo.
	pub fn from_toml(text: &str) -> Result<Self, KeymapError> {
		Ok(toml::from_str(text)?)
	}

	/// Writes the table as `"combo" = "action"` TOML pairs.
	///
	/// # Errors
	///
	/// Returns [`KeymapError::Encode`] if serialization fails.
	pub fn to_toml(&self) -> Result<String, KeymapError> {
		Ok(toml::to_string(self)?)
	}
}
