//! Primitive values stored in scalar nodes and descriptor defaults.

use std::fmt;

/// A primitive node value.
///
/// Integers of every supported width (including unsigned 64-bit) fit in an
/// `i128`. Floats compare by bit pattern so that tree equality is
/// bit-identical, NaN payloads included.
#[derive(Debug, Clone)]
pub enum Value {
	Int(i128),
	Float(f64),
	Str(String),
	Bytes(Vec<u8>),
}

impl Value {
	pub fn as_int(&self) -> Option<i128> {
		match self {
			Value::Int(v) => Some(*v),
			_ => None,
		}
	}

	pub fn as_float(&self) -> Option<f64> {
		match self {
			Value::Float(v) => Some(*v),
			_ => None,
		}
	}

	/// Numeric view of an integer or float value.
	pub fn as_f64(&self) -> Option<f64> {
		match self {
			Value::Int(v) => Some(*v as f64),
			Value::Float(v) => Some(*v),
			_ => None,
		}
	}

	pub fn as_str(&self) -> Option<&str> {
		match self {
			Value::Str(s) => Some(s),
			_ => None,
		}
	}

	pub fn as_bytes(&self) -> Option<&[u8]> {
		match self {
			Value::Bytes(b) => Some(b),
			_ => None,
		}
	}

	/// Short name of the variant, used in diagnostics.
	pub fn type_name(&self) -> &'static str {
		match self {
			Value::Int(_) => "int",
			Value::Float(_) => "float",
			Value::Str(_) => "string",
			Value::Bytes(_) => "bytes",
		}
	}
}

impl PartialEq for Value {
	fn eq(&self, other: &Self) -> bool {
		match (self, other) {
			(Value::Int(a), Value::Int(b)) => a == b,
			(Value::Float(a), Value::Float(b)) => a.to_bits() == b.to_bits(),
			(Value::Str(a), Value::Str(b)) => a == b,
			(Value::Bytes(a), Value::Bytes(b)) => a == b,
			_ => false,
		}
	}
}

impl Eq for Value {}

impl fmt::Display for Value {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Value::Int(v) => write!(f, "{v}"),
			Value::Float(v) => write!(f, "{v}"),
			Value::Str(s) => f.write_str(s),
			Value::Bytes(b) => write!(f, "<{} bytes>", b.len()),
		}
	}
}

impl From<i128> for Value {
	fn from(v: i128) -> Self {
		Value::Int(v)
	}
}

impl From<f64> for Value {
	fn from(v: f64) -> Self {
		Value::Float(v)
	}
}

impl From<&str> for Value {
	fn from(v: &str) -> Self {
		Value::Str(v.to_string())
	}
}

impl From<String> for Value {
	fn from(v: String) -> Self {
		Value::Str(v)
	}
}

impl From<Vec<u8>> for Value {
	fn from(v: Vec<u8>) -> Self {
		Value::Bytes(v)
	}
}
