//! Field descriptors for binilla documents.
//!
//! A [`Descriptor`] is the immutable metadata describing one node of a parsed
//! file: its kind, byte encoding, constraints, child layout, naming and
//! visibility. Descriptors are supplied by a collaborator (a tag definition
//! loader) and shared by reference counting; nothing in the core mutates them.
//!
//! This crate also owns the neighbor path language ([`NodePath`],
//! [`DynNamePath`]) used to size fields from sibling values, to label array
//! elements and to resolve context-dependent unit scales.
//!
//! # Building descriptors
//!
//! ```
//! use binilla_schema::{Descriptor, SizeSpec};
//!
//! let header = Descriptor::structure("header", vec![
//! 	Descriptor::u16("count").with_int_bounds(Some(0), Some(64)).with_default_int(10),
//! 	Descriptor::array("items", Descriptor::u8("item"), SizeSpec::path("count")),
//! ]);
//! assert!(header.validate().is_ok());
//! ```

mod descriptor;
mod encoding;
pub mod error;
mod path;
mod validate;
mod value;

pub use descriptor::{
	Descriptor, EditorHint, EnumOption, FieldFlags, FieldKind, FlagOption, NeighborLookup, ScaleFn, Shape, SizeSpec, StreamAdapter,
	UnitScale, Visibility,
};
pub use encoding::{Endian, FloatEncoding, IntEncoding, StrEncoding};
pub use error::{EncodingError, PathError, SchemaError, Violation};
pub use path::{DynNamePath, NodePath, PathStep};
pub use value::Value;
