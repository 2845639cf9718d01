//! Field editors, document sessions and application state for binilla.
//!
//! A [`Document`] owns a node tree, its [`EditHistory`](binilla_history::EditHistory)
//! and a tree of [`FieldEditor`]s built from the node tree's descriptors.
//! Editors never hold nodes; they hold tree paths and see the document
//! through a [`View`] while loading or an [`EditContext`] while committing.
//! Every change they make is an edit state pushed through the history.
//!
//! The [`App`] keeps the open documents in order, the recent-files list,
//! the configuration and style documents, and the hotkey table. Hosts
//! answer modal questions through the [`Prompter`] trait.
//!
//! Saving runs on a [`SaveWorker`] thread over a snapshot of the tree; the
//! document refuses edits until [`Document::poll_save`] collects the result.

pub mod app;
pub mod context;
pub mod document;
pub mod error;
pub mod field;
mod worker;

#[cfg(test)]
mod test_support;

pub use app::{Action, App, CONFIG_FILE, Dispatch, RecentPaths, STYLE_FILE, SessionId};
pub use context::{EditContext, View};
pub use document::{CloseChoice, CloseDecision, Document, POLL_INTERVAL, Prompter};
pub use error::{FieldError, Result, SessionError};
pub use field::{Field, FieldEditor, FieldId, FlushOutcome};
pub use worker::SaveWorker;
