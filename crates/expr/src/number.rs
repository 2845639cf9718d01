//! Numeric values with integer/float promotion.

use std::fmt;

use crate::error::{ExprError, Result};

/// Result of an evaluation.
///
/// Integer arithmetic stays integral until a float operand, a true division
/// or a fractional function result promotes it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
	Int(i128),
	Float(f64),
}

impl Number {
	pub fn as_f64(self) -> f64 {
		match self {
			Number::Int(v) => v as f64,
			Number::Float(v) => v,
		}
	}

	/// The value as an integer, if it is one exactly.
	pub fn to_int(self) -> Option<i128> {
		match self {
			Number::Int(v) => Some(v),
			Number::Float(v) if v.is_finite() && v.fract() == 0.0 && v.abs() < 2f64.powi(127) => Some(v as i128),
			Number::Float(_) => None,
		}
	}

	/// Integer when the float is integral and in range, otherwise the float.
	pub(crate) fn integral(value: f64) -> Number {
		match Number::Float(value).to_int() {
			Some(v) => Number::Int(v),
			None => Number::Float(value),
		}
	}

	pub(crate) fn neg(self) -> Result<Number> {
		match self {
			Number::Int(v) => v.checked_neg().map(Number::Int).ok_or(ExprError::Overflow),
			Number::Float(v) => Ok(Number::Float(-v)),
		}
	}

	pub(crate) fn add(self, rhs: Number) -> Result<Number> {
		int_or_float(self, rhs, i128::checked_add, |a, b| a + b)
	}

	pub(crate) fn sub(self, rhs: Number) -> Result<Number> {
		int_or_float(self, rhs, i128::checked_sub, |a, b| a - b)
	}

	pub(crate) fn mul(self, rhs: Number) -> Result<Number> {
		int_or_float(self, rhs, i128::checked_mul, |a, b| a * b)
	}

	/// True division; always a float.
	pub(crate) fn div(self, rhs: Number) -> Result<Number> {
		let divisor = rhs.as_f64();
		if divisor == 0.0 {
			return Err(ExprError::DivisionByZero);
		}
		Ok(Number::Float(self.as_f64() / divisor))
	}

	/// Division rounded toward negative infinity.
	pub(crate) fn floor_div(self, rhs: Number) -> Result<Number> {
		match (self, rhs) {
			(_, Number::Int(0)) => Err(ExprError::DivisionByZero),
			(Number::Int(a), Number::Int(b)) => {
				let q = a.checked_div(b).ok_or(ExprError::Overflow)?;
				Ok(Number::Int(if (a % b != 0) && ((a < 0) != (b < 0)) { q - 1 } else { q }))
			}
			_ => {
				let divisor = rhs.as_f64();
				if divisor == 0.0 {
					return Err(ExprError::DivisionByZero);
				}
				Ok(Number::Float((self.as_f64() / divisor).floor()))
			}
		}
	}

	/// Remainder with the sign of the divisor.
	pub(crate) fn rem(self, rhs: Number) -> Result<Number> {
		match (self, rhs) {
			(_, Number::Int(0)) => Err(ExprError::DivisionByZero),
			(Number::Int(a), Number::Int(b)) => {
				let r = a.checked_rem(b).ok_or(ExprError::Overflow)?;
				Ok(Number::Int(if r != 0 && ((r < 0) != (b < 0)) { r + b } else { r }))
			}
			_ => {
				let (a, b) = (self.as_f64(), rhs.as_f64());
				if b == 0.0 {
					return Err(ExprError::DivisionByZero);
				}
				let r = a % b;
				Ok(Number::Float(if r != 0.0 && ((r < 0.0) != (b < 0.0)) { r + b } else { r }))
			}
		}
	}

	pub(crate) fn pow(self, rhs: Number) -> Result<Number> {
		match (self, rhs) {
			(Number::Int(base), Number::Int(exp)) if exp >= 0 => {
				let exp = u32::try_from(exp).map_err(|_| ExprError::Overflow)?;
				base.checked_pow(exp).map(Number::Int).ok_or(ExprError::Overflow)
			}
			_ => {
				let (base, exp) = (self.as_f64(), rhs.as_f64());
				if base == 0.0 && exp < 0.0 {
					return Err(ExprError::DivisionByZero);
				}
				let value = base.powf(exp);
				if value.is_nan() {
					return Err(ExprError::Domain { name: "pow" });
				}
				Ok(Number::Float(value))
			}
		}
	}
}

fn int_or_float(
	lhs: Number,
	rhs: Number,
	int: fn(i128, i128) -> Option<i128>,
	float: fn(f64, f64) -> f64,
) -> Result<Number> {
	match (lhs, rhs) {
		(Number::Int(a), Number::Int(b)) => int(a, b).map(Number::Int).ok_or(ExprError::Overflow),
		_ => Ok(Number::Float(float(lhs.as_f64(), rhs.as_f64()))),
	}
}

impl fmt::Display for Number {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Number::Int(v) => write!(f, "{v}"),
			Number::Float(v) => write!(f, "{v}"),
		}
	}
}
