//! The descriptor record and its per-kind layouts.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use bitflags::bitflags;
use strum_macros::{Display, EnumString, IntoStaticStr};

use crate::encoding::{Endian, FloatEncoding, IntEncoding, StrEncoding};
use crate::path::{DynNamePath, NodePath};
use crate::value::Value;

/// Kind of a descriptor, derived from its [`Shape`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum FieldKind {
	Struct,
	Array,
	Union,
	BoolMask,
	Enum,
	DynamicEnum,
	Integer,
	Float,
	Timestamp,
	String,
	RawBytes,
	StreamAdapter,
	Pad,
	Void,
}

impl FieldKind {
	/// Returns `true` for kinds whose node holds child nodes.
	pub fn is_container(self) -> bool {
		matches!(self, FieldKind::Struct | FieldKind::Array | FieldKind::Union | FieldKind::StreamAdapter)
	}
}

/// Who gets to see a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum Visibility {
	#[default]
	Shown,
	Metadata,
	Hidden,
}

impl Visibility {
	/// Applies the `show_metadata`/`show_invisible` overrides.
	pub fn is_visible(self, show_metadata: bool, show_invisible: bool) -> bool {
		match self {
			Visibility::Shown => true,
			Visibility::Metadata => show_metadata || show_invisible,
			Visibility::Hidden => show_invisible,
		}
	}
}

bitflags! {
	/// Per-field behavior switches.
	#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
	pub struct FieldFlags: u8 {
		/// The user may change the value.
		const EDITABLE = 1 << 0;
		/// Import and export of the subtree are allowed.
		const PORTABLE = 1 << 1;
	}
}

impl Default for FieldFlags {
	fn default() -> Self {
		FieldFlags::EDITABLE | FieldFlags::PORTABLE
	}
}

/// Refines which editor a field is presented with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EditorHint {
	/// A struct of `r`, `g`, `b` and optionally `a` channels.
	Color,
	/// A string edited in a multi-line text area.
	MultiLine,
}

/// Where a variable-size field gets its size from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SizeSpec {
	/// A constant byte size (or element count for arrays).
	Fixed(usize),
	/// The integer value of a neighbor, resolved from the field's parent.
	Path(NodePath),
	/// Everything left in the enclosing buffer.
	Remainder,
}

impl SizeSpec {
	pub fn path(text: &str) -> Self {
		SizeSpec::Path(NodePath::lit(text))
	}

	pub fn fixed(&self) -> Option<usize> {
		match self {
			SizeSpec::Fixed(n) => Some(*n),
			_ => None,
		}
	}
}

/// Read access to the tree around a field, handed to custom unit scales.
pub trait NeighborLookup {
	/// Numeric value of the neighbor at `path`, resolved from the field's parent.
	fn numeric(&self, path: &NodePath) -> Option<f64>;
}

/// Closure computing a context-dependent unit scale.
pub type ScaleFn = Arc<dyn Fn(&dyn NeighborLookup) -> Option<f64> + Send + Sync>;

/// Multiplier applied between the stored value and the displayed value.
#[derive(Clone)]
pub enum UnitScale {
	Fixed(f64),
	/// Scale read from a numeric neighbor.
	Neighbor(NodePath),
	Custom(ScaleFn),
}

impl UnitScale {
	/// Evaluates the scale; `None` when a neighbor cannot be resolved.
	pub fn resolve(&self, lookup: &dyn NeighborLookup) -> Option<f64> {
		match self {
			UnitScale::Fixed(scale) => Some(*scale),
			UnitScale::Neighbor(path) => lookup.numeric(path),
			UnitScale::Custom(f) => f(lookup),
		}
		.filter(|scale| scale.is_finite() && *scale != 0.0)
	}
}

impl fmt::Debug for UnitScale {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			UnitScale::Fixed(scale) => f.debug_tuple("Fixed").field(scale).finish(),
			UnitScale::Neighbor(path) => f.debug_tuple("Neighbor").field(&path.to_string()).finish(),
			UnitScale::Custom(_) => f.write_str("Custom(..)"),
		}
	}
}

/// Byte transform wrapped around a nested payload, e.g. an obfuscation layer.
pub trait StreamAdapter: Send + Sync {
	/// Short identifier used in diagnostics.
	fn name(&self) -> &str;

	/// Turns stored bytes into the payload image.
	fn decode(&self, stored: &[u8]) -> Result<Vec<u8>, String>;

	/// Turns a payload image back into stored bytes.
	fn encode(&self, payload: &[u8]) -> Result<Vec<u8>, String>;
}

/// One bit of a bool-mask field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlagOption {
	pub name: String,
	pub tooltip: Option<String>,
	pub visible: bool,
	pub editable: bool,
}

impl FlagOption {
	pub fn new(name: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			tooltip: None,
			visible: true,
			editable: true,
		}
	}

	pub fn hidden(mut self) -> Self {
		self.visible = false;
		self
	}

	pub fn read_only(mut self) -> Self {
		self.editable = false;
		self
	}
}

/// One value of an enum field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumOption {
	pub value: i128,
	pub name: String,
	pub tooltip: Option<String>,
	pub visible: bool,
}

impl EnumOption {
	pub fn new(value: i128, name: impl Into<String>) -> Self {
		Self {
			value,
			name: name.into(),
			tooltip: None,
			visible: true,
		}
	}
}

/// Kind-specific layout of a descriptor.
#[derive(Clone)]
pub enum Shape {
	Struct {
		fields: Vec<Arc<Descriptor>>,
	},
	Array {
		element: Arc<Descriptor>,
		count: SizeSpec,
		min_count: usize,
		max_count: usize,
		dynamic_name_path: Option<DynNamePath>,
		element_names: Vec<String>,
	},
	Union {
		/// Integer neighbor selecting the case when parsing.
		case_path: Option<NodePath>,
		cases: BTreeMap<i64, Arc<Descriptor>>,
		/// Byte size of the union, shared by every case.
		size: usize,
	},
	BoolMask {
		encoding: IntEncoding,
		options: BTreeMap<u8, FlagOption>,
	},
	Enum {
		encoding: IntEncoding,
		options: Vec<EnumOption>,
	},
	DynamicEnum {
		encoding: IntEncoding,
		/// Array whose elements provide the option names.
		source: DynNamePath,
	},
	Integer {
		encoding: IntEncoding,
		min: Option<i128>,
		max: Option<i128>,
		unit_scale: Option<UnitScale>,
	},
	Float {
		encoding: FloatEncoding,
		min: Option<f64>,
		max: Option<f64>,
		unit_scale: Option<UnitScale>,
	},
	/// Seconds since the UNIX epoch.
	Timestamp {
		encoding: IntEncoding,
	},
	String {
		encoding: StrEncoding,
		size: SizeSpec,
	},
	RawBytes {
		size: SizeSpec,
	},
	StreamAdapter {
		payload: Arc<Descriptor>,
		size: SizeSpec,
		adapter: Arc<dyn StreamAdapter>,
	},
	Pad {
		size: usize,
	},
	Void,
}

impl fmt::Debug for Shape {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Shape::Struct { fields } => f
				.debug_struct("Struct")
				.field("fields", &fields.iter().map(|d| d.name.as_str()).collect::<Vec<_>>())
				.finish(),
			Shape::Array {
				element,
				count,
				min_count,
				max_count,
				..
			} => f
				.debug_struct("Array")
				.field("element", &element.name)
				.field("count", count)
				.field("min_count", min_count)
				.field("max_count", max_count)
				.finish(),
			Shape::Union { cases, size, .. } => f
				.debug_struct("Union")
				.field("cases", &cases.keys().collect::<Vec<_>>())
				.field("size", size)
				.finish(),
			Shape::StreamAdapter { payload, size, adapter } => f
				.debug_struct("StreamAdapter")
				.field("payload", &payload.name)
				.field("size", size)
				.field("adapter", &adapter.name())
				.finish(),
			other => f.write_str(other.kind().into()),
		}
	}
}

impl Shape {
	pub fn kind(&self) -> FieldKind {
		match self {
			Shape::Struct { .. } => FieldKind::Struct,
			Shape::Array { .. } => FieldKind::Array,
			Shape::Union { .. } => FieldKind::Union,
			Shape::BoolMask { .. } => FieldKind::BoolMask,
			Shape::Enum { .. } => FieldKind::Enum,
			Shape::DynamicEnum { .. } => FieldKind::DynamicEnum,
			Shape::Integer { .. } => FieldKind::Integer,
			Shape::Float { .. } => FieldKind::Float,
			Shape::Timestamp { .. } => FieldKind::Timestamp,
			Shape::String { .. } => FieldKind::String,
			Shape::RawBytes { .. } => FieldKind::RawBytes,
			Shape::StreamAdapter { .. } => FieldKind::StreamAdapter,
			Shape::Pad { .. } => FieldKind::Pad,
			Shape::Void => FieldKind::Void,
		}
	}
}

/// Immutable metadata describing one node.
#[derive(Debug, Clone)]
pub struct Descriptor {
	pub name: String,
	pub display_name: Option<String>,
	pub tooltip: Option<String>,
	pub side_tip: Option<String>,
	pub visibility: Visibility,
	pub flags: FieldFlags,
	pub default: Option<Value>,
	pub hint: Option<EditorHint>,
	pub shape: Shape,
}

impl Descriptor {
	pub fn new(name: impl Into<String>, shape: Shape) -> Self {
		Self {
			name: name.into(),
			display_name: None,
			tooltip: None,
			side_tip: None,
			visibility: Visibility::Shown,
			flags: FieldFlags::default(),
			default: None,
			hint: None,
			shape,
		}
	}

	pub fn kind(&self) -> FieldKind {
		self.shape.kind()
	}

	/// Label shown to the user.
	pub fn label(&self) -> &str {
		self.display_name.as_deref().unwrap_or(&self.name)
	}

	pub fn is_editable(&self) -> bool {
		self.flags.contains(FieldFlags::EDITABLE)
	}

	pub fn is_portable(&self) -> bool {
		self.flags.contains(FieldFlags::PORTABLE)
	}

	/// Struct fields in layout order; empty for every other kind.
	pub fn fields(&self) -> &[Arc<Descriptor>] {
		match &self.shape {
			Shape::Struct { fields } => fields,
			_ => &[],
		}
	}

	/// Index of the struct field called `name`.
	pub fn field_index(&self, name: &str) -> Option<usize> {
		self.fields().iter().position(|f| f.name == name)
	}

	/// Byte size of the encoded field when it does not depend on data.
	pub fn static_size(&self) -> Option<usize> {
		match &self.shape {
			Shape::Struct { fields } => fields.iter().map(|f| f.static_size()).sum(),
			Shape::Array { element, count, .. } => Some(count.fixed()? * element.static_size()?),
			Shape::Union { size, .. } | Shape::Pad { size } => Some(*size),
			Shape::BoolMask { encoding, .. }
			| Shape::Enum { encoding, .. }
			| Shape::DynamicEnum { encoding, .. }
			| Shape::Integer { encoding, .. }
			| Shape::Timestamp { encoding } => Some(encoding.byte_len()),
			Shape::Float { encoding, .. } => Some(encoding.byte_len()),
			Shape::String { size, .. } | Shape::RawBytes { size } | Shape::StreamAdapter { size, .. } => size.fixed(),
			Shape::Void => Some(0),
		}
	}

	/// Integer encoding of scalar integer-backed kinds.
	pub fn int_encoding(&self) -> Option<IntEncoding> {
		match &self.shape {
			Shape::BoolMask { encoding, .. }
			| Shape::Enum { encoding, .. }
			| Shape::DynamicEnum { encoding, .. }
			| Shape::Integer { encoding, .. }
			| Shape::Timestamp { encoding } => Some(*encoding),
			_ => None,
		}
	}

	pub fn unit_scale(&self) -> Option<&UnitScale> {
		match &self.shape {
			Shape::Integer { unit_scale, .. } | Shape::Float { unit_scale, .. } => unit_scale.as_ref(),
			_ => None,
		}
	}

	pub fn size_spec(&self) -> Option<&SizeSpec> {
		match &self.shape {
			Shape::Array { count, .. } => Some(count),
			Shape::String { size, .. } | Shape::RawBytes { size } | Shape::StreamAdapter { size, .. } => Some(size),
			_ => None,
		}
	}

	/// Enum option carrying `value`, if it is a declared value.
	pub fn enum_option(&self, value: i128) -> Option<&EnumOption> {
		match &self.shape {
			Shape::Enum { options, .. } => options.iter().find(|o| o.value == value),
			_ => None,
		}
	}

	pub fn union_case(&self, discriminator: i64) -> Option<&Arc<Descriptor>> {
		match &self.shape {
			Shape::Union { cases, .. } => cases.get(&discriminator),
			_ => None,
		}
	}
}

/// Constructors and chained setters used to assemble descriptor trees.
impl Descriptor {
	pub fn structure(name: impl Into<String>, fields: Vec<Descriptor>) -> Self {
		Self::new(
			name,
			Shape::Struct {
				fields: fields.into_iter().map(Arc::new).collect(),
			},
		)
	}

	pub fn array(name: impl Into<String>, element: Descriptor, count: SizeSpec) -> Self {
		Self::new(
			name,
			Shape::Array {
				element: Arc::new(element),
				count,
				min_count: 0,
				max_count: usize::MAX,
				dynamic_name_path: None,
				element_names: Vec::new(),
			},
		)
	}

	pub fn union(name: impl Into<String>, size: usize, case_path: Option<&str>, cases: Vec<(i64, Descriptor)>) -> Self {
		Self::new(
			name,
			Shape::Union {
				case_path: case_path.map(NodePath::lit),
				cases: cases.into_iter().map(|(k, d)| (k, Arc::new(d))).collect(),
				size,
			},
		)
	}

	pub fn bool_mask(name: impl Into<String>, encoding: IntEncoding, options: Vec<(u8, FlagOption)>) -> Self {
		Self::new(
			name,
			Shape::BoolMask {
				encoding,
				options: options.into_iter().collect(),
			},
		)
	}

	pub fn enumeration(name: impl Into<String>, encoding: IntEncoding, options: Vec<EnumOption>) -> Self {
		Self::new(name, Shape::Enum { encoding, options })
	}

	pub fn dynamic_enum(name: impl Into<String>, encoding: IntEncoding, source: &str) -> Self {
		Self::new(
			name,
			Shape::DynamicEnum {
				encoding,
				source: DynNamePath::lit(source),
			},
		)
	}

	pub fn integer(name: impl Into<String>, encoding: IntEncoding) -> Self {
		Self::new(
			name,
			Shape::Integer {
				encoding,
				min: None,
				max: None,
				unit_scale: None,
			},
		)
	}

	pub fn u8(name: impl Into<String>) -> Self {
		Self::integer(name, IntEncoding::unsigned(8, Endian::Little))
	}

	pub fn u16(name: impl Into<String>) -> Self {
		Self::integer(name, IntEncoding::unsigned(16, Endian::Little))
	}

	pub fn u32(name: impl Into<String>) -> Self {
		Self::integer(name, IntEncoding::unsigned(32, Endian::Little))
	}

	pub fn i32(name: impl Into<String>) -> Self {
		Self::integer(name, IntEncoding::signed(32, Endian::Little))
	}

	pub fn float(name: impl Into<String>, encoding: FloatEncoding) -> Self {
		Self::new(
			name,
			Shape::Float {
				encoding,
				min: None,
				max: None,
				unit_scale: None,
			},
		)
	}

	pub fn f32(name: impl Into<String>) -> Self {
		Self::float(
			name,
			FloatEncoding {
				bits: 32,
				endian: Endian::Little,
			},
		)
	}

	pub fn f64(name: impl Into<String>) -> Self {
		Self::float(
			name,
			FloatEncoding {
				bits: 64,
				endian: Endian::Little,
			},
		)
	}

	pub fn timestamp(name: impl Into<String>, encoding: IntEncoding) -> Self {
		Self::new(name, Shape::Timestamp { encoding })
	}

	pub fn string(name: impl Into<String>, encoding: StrEncoding, size: SizeSpec) -> Self {
		Self::new(name, Shape::String { encoding, size })
	}

	pub fn raw(name: impl Into<String>, size: SizeSpec) -> Self {
		Self::new(name, Shape::RawBytes { size })
	}

	pub fn stream(name: impl Into<String>, size: SizeSpec, adapter: Arc<dyn StreamAdapter>, payload: Descriptor) -> Self {
		Self::new(
			name,
			Shape::StreamAdapter {
				payload: Arc::new(payload),
				size,
				adapter,
			},
		)
	}

	pub fn pad(size: usize) -> Self {
		let mut pad = Self::new(format!("pad_{size}"), Shape::Pad { size });
		pad.visibility = Visibility::Hidden;
		pad
	}

	pub fn void(name: impl Into<String>) -> Self {
		Self::new(name, Shape::Void)
	}

	pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
		self.display_name = Some(display_name.into());
		self
	}

	pub fn with_tooltip(mut self, tooltip: impl Into<String>) -> Self {
		self.tooltip = Some(tooltip.into());
		self
	}

	pub fn with_side_tip(mut self, side_tip: impl Into<String>) -> Self {
		self.side_tip = Some(side_tip.into());
		self
	}

	pub fn with_visibility(mut self, visibility: Visibility) -> Self {
		self.visibility = visibility;
		self
	}

	pub fn with_flags(mut self, flags: FieldFlags) -> Self {
		self.flags = flags;
		self
	}

	pub fn read_only(mut self) -> Self {
		self.flags.remove(FieldFlags::EDITABLE);
		self
	}

	pub fn with_hint(mut self, hint: EditorHint) -> Self {
		self.hint = Some(hint);
		self
	}

	pub fn with_default(mut self, default: Value) -> Self {
		self.default = Some(default);
		self
	}

	pub fn with_default_int(self, default: i128) -> Self {
		self.with_default(Value::Int(default))
	}

	/// Sets integer bounds; no-op on other kinds.
	pub fn with_int_bounds(mut self, lo: Option<i128>, hi: Option<i128>) -> Self {
		if let Shape::Integer { min, max, .. } = &mut self.shape {
			*min = lo;
			*max = hi;
		}
		self
	}

	/// Sets float bounds; no-op on other kinds.
	pub fn with_float_bounds(mut self, lo: Option<f64>, hi: Option<f64>) -> Self {
		if let Shape::Float { min, max, .. } = &mut self.shape {
			*min = lo;
			*max = hi;
		}
		self
	}

	pub fn with_unit_scale(mut self, scale: UnitScale) -> Self {
		if let Shape::Integer { unit_scale, .. } | Shape::Float { unit_scale, .. } = &mut self.shape {
			*unit_scale = Some(scale);
		}
		self
	}

	/// Sets array count bounds; no-op on other kinds.
	pub fn with_counts(mut self, lo: usize, hi: usize) -> Self {
		if let Shape::Array { min_count, max_count, .. } = &mut self.shape {
			*min_count = lo;
			*max_count = hi;
		}
		self
	}

	pub fn with_dynamic_name(mut self, path: &str) -> Self {
		if let Shape::Array { dynamic_name_path, .. } = &mut self.shape {
			*dynamic_name_path = Some(DynNamePath::lit(path));
		}
		self
	}

	pub fn with_element_names(mut self, names: Vec<String>) -> Self {
		if let Shape::Array { element_names, .. } = &mut self.shape {
			*element_names = names;
		}
		self
	}
}
