//! Byte-level parse and serialize for descriptor-driven documents.
//!
//! [`parse`] walks a descriptor over a byte slice and builds a [`Node`]
//! tree. Variable sizes are read from neighbors in the partially built tree,
//! so a count field must precede the array it sizes. [`serialize`] is the
//! reverse walk; it trusts the tree's size neighbors, which the node crate
//! keeps in sync with the data.
//!
//! [`Node`]: binilla_node::Node

pub mod error;
mod parse;
mod reader;
mod serialize;
mod xor;

pub use error::{CodecError, Result};
pub use parse::{ParseOptions, ParseOutcome, parse};
pub use serialize::serialize;
pub use xor::XorAdapter;
