//! Hotkey bindings.
//!
//! Provides:
//! - Combo strings: `ctrl+s`, `Ctrl-Shift-Z`, `f5`, parsed into a [`Combo`]
//!   and normalized to `ctrl+alt+shift+super+<key>` order with a lowercase key
//! - A [`HotkeyTable`] from normalized combo to action name, resolved at
//!   dispatch time against an [`ActionTable`]
//! - TOML exchange of binding tables

mod combo;
pub mod error;
mod table;

pub use combo::{Combo, Modifiers, normalize, parse};
pub use error::{KeymapError, ParseError};
pub use table::{ActionTable, DEFAULT_BINDINGS, HotkeyTable};
