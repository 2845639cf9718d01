//! Expression errors.

use thiserror::Error;

/// Errors produced while evaluating an expression.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExprError {
	/// The input contains a double underscore.
	#[error("expression rejected as unsafe")]
	Unsafe,

	#[error("syntax error at position {position}: {message}")]
	Syntax { message: String, position: usize },

	/// A name that is neither an allowed constant nor an allowed function.
	#[error("unknown name '{name}' at position {position}")]
	UnknownName { name: String, position: usize },

	#[error("{name}() takes {expected} argument(s), got {found}")]
	Arity {
		name: &'static str,
		expected: &'static str,
		found: usize,
	},

	/// A function was called outside its mathematical domain.
	#[error("{name}() argument out of domain")]
	Domain { name: &'static str },

	#[error("division by zero")]
	DivisionByZero,

	#[error("integer overflow")]
	Overflow,

	#[error("expression nested too deeply")]
	TooDeep,
}

/// Result type for expression evaluation.
pub type Result<T> = std::result::Result<T, ExprError>;
