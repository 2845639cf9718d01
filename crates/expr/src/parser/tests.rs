use pretty_assertions::assert_eq;

use super::parse;
use crate::error::ExprError;
use crate::number::Number;
use crate::{evaluate, function_names};

fn float(input: &str) -> f64 {
	parse(input).expect("valid expression").as_f64()
}

#[test]
fn integer_arithmetic_stays_integral() {
	assert_eq!(parse("1 + 2 * 3"), Ok(Number::Int(7)));
	assert_eq!(parse("(1 + 2) * 3"), Ok(Number::Int(9)));
	assert_eq!(parse("0x10 + 0X0f"), Ok(Number::Int(31)));
	assert_eq!(parse("1_000 - 1"), Ok(Number::Int(999)));
}

#[test]
fn division_and_remainder_follow_floor_semantics() {
	assert_eq!(parse("7 / 2"), Ok(Number::Float(3.5)));
	assert_eq!(parse("7 // 2"), Ok(Number::Int(3)));
	assert_eq!(parse("-7 // 2"), Ok(Number::Int(-4)));
	assert_eq!(parse("-7 % 3"), Ok(Number::Int(2)));
	assert_eq!(parse("7.5 // 2"), Ok(Number::Float(3.0)));
	assert_eq!(parse("1 / 0"), Err(ExprError::DivisionByZero));
	assert_eq!(parse("1 // 0"), Err(ExprError::DivisionByZero));
}

#[test]
fn power_is_right_associative_and_binds_tighter_than_negation() {
	assert_eq!(parse("2 ** 3 ** 2"), Ok(Number::Int(512)));
	assert_eq!(parse("-2 ** 2"), Ok(Number::Int(-4)));
	assert_eq!(parse("2 ** -1"), Ok(Number::Float(0.5)));
	assert_eq!(parse("2 ** 200"), Err(ExprError::Overflow));
}

#[test]
fn floats_and_exponents() {
	assert_eq!(parse("1.5e2"), Ok(Number::Float(150.0)));
	assert_eq!(parse(".25 * 4"), Ok(Number::Float(1.0)));
	assert_eq!(parse("2E-1"), Ok(Number::Float(0.2)));
}

#[test]
fn allowlisted_functions_and_constants() {
	assert!((float("sin(pi / 2)") - 1.0).abs() < 1e-12);
	assert!((float("degrees(atan2(1, 1))") - 45.0).abs() < 1e-12);
	assert_eq!(parse("max(3, 9.5, -1)"), Ok(Number::Float(9.5)));
	assert_eq!(parse("min(4, 2)"), Ok(Number::Int(2)));
	assert_eq!(parse("floor(2.7)"), Ok(Number::Int(2)));
	assert_eq!(parse("round(2.5)"), Ok(Number::Int(2)));
	assert_eq!(parse("abs(-3)"), Ok(Number::Int(3)));
	assert_eq!(parse("hypot(3, 4)"), Ok(Number::Float(5.0)));
	assert!(parse("inf").is_ok_and(|n| n.as_f64().is_infinite()));
	assert!(function_names().contains(&"log10"));
}

#[test]
fn domain_and_arity_errors() {
	assert_eq!(parse("sqrt(-1)"), Err(ExprError::Domain { name: "sqrt" }));
	assert_eq!(parse("log(0)"), Err(ExprError::Domain { name: "log" }));
	assert!(matches!(parse("atan2(1)"), Err(ExprError::Arity { name: "atan2", found: 1, .. })));
	assert!(matches!(parse("max()"), Err(ExprError::Arity { name: "max", found: 0, .. })));
}

#[test]
fn names_outside_the_allowlist_are_rejected() {
	assert!(matches!(parse("open(1)"), Err(ExprError::UnknownName { .. })));
	assert!(matches!(parse("x + 1"), Err(ExprError::UnknownName { position: 0, .. })));
	assert!(matches!(parse("'os'"), Err(ExprError::Syntax { .. })));
}

#[test]
fn double_underscore_is_unsafe() {
	assert_eq!(evaluate("__import__('os')"), Err(ExprError::Unsafe));
	assert_eq!(evaluate("1 + pi.__class__"), Err(ExprError::Unsafe));
}

#[test]
fn syntax_errors_report_position() {
	assert_eq!(
		parse("1 +"),
		Err(ExprError::Syntax {
			message: "unexpected end of input".to_string(),
			position: 3,
		})
	);
	assert!(matches!(parse("(1 + 2"), Err(ExprError::Syntax { .. })));
	assert!(matches!(parse("1 2"), Err(ExprError::Syntax { position: 2, .. })));
}

#[test]
fn deep_nesting_is_bounded() {
	let input = format!("{}1{}", "(".repeat(200), ")".repeat(200));
	assert_eq!(parse(&input), Err(ExprError::TooDeep));
	assert_eq!(parse(&"-".repeat(500)), Err(ExprError::TooDeep));
}
