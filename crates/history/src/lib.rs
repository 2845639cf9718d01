//! Edit states and the undo/redo history.
//!
//! Every semantic change to a document is an [`EditState`]: a record of both
//! sides of the change plus the tree path of the node it targets. States are
//! applied with [`apply`], which is symmetric under its `undo` flag, and are
//! kept in an [`EditHistory`] with a cursor and a saved marker.
//!
//! Paths are resolved at apply time, so states survive editors being torn
//! down and rebuilt.

pub mod error;
mod apply;
mod history;
mod state;

pub use apply::{ApplyPolicy, apply};
pub use error::{EditError, Result};
pub use history::{DEFAULT_MAX_UNDOS, EditHistory, Pushed};
pub use state::{Change, EditExtra, EditKind, EditState, NeighborChange, UnionState};
