//! Parsed node trees.
//!
//! A document is one owned tree of [`Node`]s. Each node exclusively owns its
//! children and refers to its [`Descriptor`] by `Arc`. Nodes never point at
//! their parents: a node is addressed by a [`TreePath`] of attr indices from
//! the document root, and the parent relation is path truncation plus lookup.
//! Editors and edit history hold paths, never references, so the tree can be
//! replaced or re-populated without invalidating them.
//!
//! [`Descriptor`]: binilla_schema::Descriptor

mod defaults;
mod diff;
pub mod error;
mod node;
mod resolve;
mod size;
mod tree_path;

pub use error::{NodeError, Result};
pub use node::{CountLimits, Key, Node, NodeData, UnionBody};
pub use resolve::Scope;
pub use tree_path::TreePath;
