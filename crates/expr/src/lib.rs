//! Sandboxed arithmetic for numeric entry fields.
//!
//! Users may type expressions such as `0x40 * 3` or `degrees(atan2(1, 1))`
//! into numeric fields. The evaluator understands a small arithmetic grammar
//! and an explicit allowlist of constants and functions; nothing else is
//! reachable. Input containing `__` is refused outright.
//!
//! ```
//! use binilla_expr::{Number, evaluate};
//!
//! assert_eq!(evaluate("7 // 2").unwrap(), Number::Int(3));
//! assert_eq!(evaluate("2 ** 0.5 * 2 ** 0.5").unwrap().to_int(), None);
//! assert!(evaluate("__import__('os')").is_err());
//! ```

mod builtins;
pub mod error;
mod number;
mod parser;

pub use error::{ExprError, Result};
pub use number::Number;
use tracing::debug;

/// Returns `true` for input the evaluator refuses to look at.
pub fn is_unsafe(input: &str) -> bool {
	input.contains("__")
}

/// Evaluates `input` as an arithmetic expression.
pub fn evaluate(input: &str) -> Result<Number> {
	if is_unsafe(input) {
		debug!(input, "rejected unsafe expression");
		return Err(ExprError::Unsafe);
	}
	parser::parse(input)
}

/// Names of the callable functions, sorted.
pub fn function_names() -> Vec<&'static str> {
	let mut names: Vec<_> = builtins::FUNCTIONS.iter().map(|f| f.name).collect();
	names.sort_unstable();
	names
}
