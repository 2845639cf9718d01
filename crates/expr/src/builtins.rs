//! The allowlisted constants and functions.

use std::f64::consts;

use crate::error::{ExprError, Result};
use crate::number::Number;

/// Named constants.
pub(crate) const CONSTANTS: &[(&str, f64)] = &[
	("pi", consts::PI),
	("e", consts::E),
	("tau", consts::TAU),
	("inf", f64::INFINITY),
];

/// How many arguments a function takes.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Arity {
	Exactly(usize),
	AtLeast(usize),
}

impl Arity {
	fn accepts(self, n: usize) -> bool {
		match self {
			Arity::Exactly(k) => n == k,
			Arity::AtLeast(k) => n >= k,
		}
	}

	fn describe(self) -> &'static str {
		match self {
			Arity::Exactly(1) => "1",
			Arity::Exactly(2) => "2",
			Arity::Exactly(_) => "a fixed number of",
			Arity::AtLeast(_) => "one or more",
		}
	}
}

pub(crate) struct Function {
	pub name: &'static str,
	pub arity: Arity,
	eval: fn(&[Number]) -> Result<Number>,
}

impl Function {
	pub fn call(&self, args: &[Number]) -> Result<Number> {
		if !self.arity.accepts(args.len()) {
			return Err(ExprError::Arity {
				name: self.name,
				expected: self.arity.describe(),
				found: args.len(),
			});
		}
		(self.eval)(args)
	}
}

macro_rules! unary {
	($name:literal, $f:expr) => {
		Function {
			name: $name,
			arity: Arity::Exactly(1),
			eval: |args| checked($name, ($f)(args[0].as_f64())),
		}
	};
}

macro_rules! binary {
	($name:literal, $f:expr) => {
		Function {
			name: $name,
			arity: Arity::Exactly(2),
			eval: |args| checked($name, ($f)(args[0].as_f64(), args[1].as_f64())),
		}
	};
}

/// A NaN from a finite input means the argument was outside the domain.
fn checked(name: &'static str, value: f64) -> Result<Number> {
	if value.is_nan() {
		Err(ExprError::Domain { name })
	} else {
		Ok(Number::Float(value))
	}
}

pub(crate) const FUNCTIONS: &[Function] = &[
	unary!("sin", f64::sin),
	unary!("cos", f64::cos),
	unary!("tan", f64::tan),
	unary!("asin", f64::asin),
	unary!("acos", f64::acos),
	unary!("atan", f64::atan),
	unary!("sinh", f64::sinh),
	unary!("cosh", f64::cosh),
	unary!("tanh", f64::tanh),
	unary!("exp", f64::exp),
	unary!("log", log),
	unary!("log10", f64::log10),
	unary!("log2", f64::log2),
	unary!("sqrt", f64::sqrt),
	unary!("degrees", f64::to_degrees),
	unary!("radians", f64::to_radians),
	binary!("atan2", f64::atan2),
	binary!("hypot", f64::hypot),
	Function {
		name: "pow",
		arity: Arity::Exactly(2),
		eval: |args| args[0].pow(args[1]),
	},
	Function {
		name: "abs",
		arity: Arity::Exactly(1),
		eval: |args| match args[0] {
			Number::Int(v) => v.checked_abs().map(Number::Int).ok_or(ExprError::Overflow),
			Number::Float(v) => Ok(Number::Float(v.abs())),
		},
	},
	Function {
		name: "floor",
		arity: Arity::Exactly(1),
		eval: |args| Ok(Number::integral(args[0].as_f64().floor())),
	},
	Function {
		name: "ceil",
		arity: Arity::Exactly(1),
		eval: |args| Ok(Number::integral(args[0].as_f64().ceil())),
	},
	Function {
		name: "round",
		arity: Arity::Exactly(1),
		eval: |args| Ok(Number::integral(args[0].as_f64().round_ties_even())),
	},
	Function {
		name: "min",
		arity: Arity::AtLeast(1),
		eval: |args| Ok(pick(args, |a, b| b < a)),
	},
	Function {
		name: "max",
		arity: Arity::AtLeast(1),
		eval: |args| Ok(pick(args, |a, b| b > a)),
	},
];

/// Natural log; non-positive input is a domain error rather than `-inf`.
fn log(x: f64) -> f64 {
	if x <= 0.0 { f64::NAN } else { x.ln() }
}

fn pick(args: &[Number], better: fn(f64, f64) -> bool) -> Number {
	args.iter()
		.copied()
		.reduce(|best, n| if better(best.as_f64(), n.as_f64()) { n } else { best })
		.unwrap_or(Number::Int(0))
}

pub(crate) fn constant(name: &str) -> Option<f64> {
	CONSTANTS.iter().find(|(n, _)| *n == name).map(|(_, v)| *v)
}

pub(crate) fn function(name: &str) -> Option<&'static Function> {
	FUNCTIONS.iter().find(|f| f.name == name)
}
