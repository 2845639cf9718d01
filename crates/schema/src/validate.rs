//! Descriptor invariant checks.

use std::collections::HashSet;

use crate::descriptor::{Descriptor, Shape, SizeSpec};
use crate::encoding::IntEncoding;
use crate::error::{SchemaError, Violation};
use crate::value::Value;

impl Descriptor {
	/// Checks the invariants every descriptor tree must satisfy.
	///
	/// All violations are collected rather than stopping at the first one.
	pub fn validate(&self) -> Result<(), SchemaError> {
		let mut violations = Vec::new();
		check(self, &self.name, &mut violations);
		if violations.is_empty() {
			Ok(())
		} else {
			Err(SchemaError::Invalid(violations))
		}
	}
}

fn check(desc: &Descriptor, at: &str, out: &mut Vec<Violation>) {
	let mut report = |message: String| {
		out.push(Violation {
			at: at.to_string(),
			message,
		})
	};

	match &desc.shape {
		Shape::Struct { fields } => {
			let mut names = HashSet::new();
			for field in fields {
				if !matches!(field.shape, Shape::Pad { .. }) && !names.insert(field.name.as_str()) {
					report(format!("duplicate field name '{}'", field.name));
				}
			}
		}
		Shape::Array { min_count, max_count, .. } if min_count > max_count => {
			report(format!("min_count {min_count} exceeds max_count {max_count}"));
		}
		Shape::StreamAdapter {
			size: SizeSpec::Path(path), ..
		} => {
			report(format!("stream adapter sized by '{path}'; only fixed or remainder sizes are supported"));
		}
		Shape::Union { cases, size, .. } => {
			for (disc, case) in cases {
				if let Some(case_size) = case.static_size()
					&& case_size > *size
				{
					report(format!("case {disc} needs {case_size} bytes but the union holds {size}"));
				}
			}
		}
		Shape::BoolMask { encoding, options } => {
			check_encoding(encoding, &mut report);
			for bit in options.keys() {
				if *bit >= encoding.bits {
					report(format!("bit {bit} does not fit in {} bits", encoding.bits));
				}
			}
		}
		Shape::Enum { encoding, options } => {
			check_encoding(encoding, &mut report);
			let mut seen = HashSet::new();
			for option in options {
				if !seen.insert(option.value) {
					report(format!("duplicate enum value {}", option.value));
				}
				if !encoding.contains(option.value) {
					report(format!("enum value {} does not fit the encoding", option.value));
				}
			}
		}
		Shape::DynamicEnum { encoding, .. } | Shape::Timestamp { encoding } => check_encoding(encoding, &mut report),
		Shape::Integer { encoding, min, max, .. } => {
			check_encoding(encoding, &mut report);
			if let (Some(lo), Some(hi)) = (min, max)
				&& lo > hi
			{
				report(format!("min {lo} exceeds max {hi}"));
			}
			if let Some(Value::Int(default)) = &desc.default {
				if min.is_some_and(|lo| *default < lo) || max.is_some_and(|hi| *default > hi) {
					report(format!("default {default} outside [{min:?}, {max:?}]"));
				}
			} else if let Some(other) = &desc.default {
				report(format!("integer field has a {} default", other.type_name()));
			}
		}
		Shape::Float { encoding, min, max, .. } => {
			if encoding.bits != 32 && encoding.bits != 64 {
				report(format!("unsupported float width {}", encoding.bits));
			}
			if let (Some(lo), Some(hi)) = (min, max)
				&& lo > hi
			{
				report(format!("min {lo} exceeds max {hi}"));
			}
			if let Some(default) = desc.default.as_ref().and_then(Value::as_f64)
				&& (min.is_some_and(|lo| default < lo) || max.is_some_and(|hi| default > hi))
			{
				report(format!("default {default} outside [{min:?}, {max:?}]"));
			}
		}
		_ => {}
	}

	match &desc.shape {
		Shape::Struct { fields } => {
			for field in fields {
				check(field, &format!("{at}.{}", field.name), out);
			}
		}
		Shape::Array { element, .. } => check(element, &format!("{at}[]"), out),
		Shape::Union { cases, .. } => {
			for (disc, case) in cases {
				check(case, &format!("{at}<{disc}>"), out);
			}
		}
		Shape::StreamAdapter { payload, .. } => check(payload, &format!("{at}.{}", payload.name), out),
		_ => {}
	}
}

fn check_encoding(encoding: &IntEncoding, report: &mut impl FnMut(String)) {
	if !IntEncoding::SUPPORTED_BITS.contains(&encoding.bits) {
		report(format!("unsupported integer width {}", encoding.bits));
	}
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;

	use super::*;
	use crate::descriptor::{EnumOption, FlagOption};
	use crate::encoding::Endian;
	use crate::StrEncoding;

	#[test]
	fn valid_tree_passes() {
		let desc = Descriptor::structure(
			"root",
			vec![
				Descriptor::u16("count").with_int_bounds(Some(0), Some(8)).with_default_int(2),
				Descriptor::array("items", Descriptor::u8("item"), SizeSpec::path("count")).with_counts(0, 8),
				Descriptor::string("name", StrEncoding::Ascii, SizeSpec::Fixed(16)),
				Descriptor::pad(4),
				Descriptor::pad(4),
			],
		);
		assert!(desc.validate().is_ok());
	}

	#[test]
	fn reports_every_violation() {
		let u8le = IntEncoding::unsigned(8, Endian::Little);
		let desc = Descriptor::structure(
			"root",
			vec![
				Descriptor::u16("a").with_int_bounds(Some(5), Some(1)),
				Descriptor::u16("b").with_int_bounds(Some(0), Some(3)).with_default_int(9),
				Descriptor::array("c", Descriptor::u8("x"), SizeSpec::Fixed(1)).with_counts(4, 2),
				Descriptor::bool_mask("d", u8le, vec![(9, FlagOption::new("nine"))]),
				Descriptor::enumeration("e", u8le, vec![EnumOption::new(1, "one"), EnumOption::new(1, "uno")]),
				Descriptor::u16("a"),
			],
		);

		let Err(SchemaError::Invalid(violations)) = desc.validate() else {
			panic!("expected violations");
		};
		let at: Vec<&str> = violations.iter().map(|v| v.at.as_str()).collect();
		assert_eq!(at, vec!["root", "root.a", "root.b", "root.c", "root.d", "root.e"]);
	}

	#[test]
	fn union_case_larger_than_union() {
		let desc = Descriptor::union("u", 2, None, vec![(0, Descriptor::u32("wide"))]);
		assert!(desc.validate().is_err());
	}
}
