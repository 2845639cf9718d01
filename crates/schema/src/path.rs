//! Neighbor path expressions.
//!
//! ## Syntax
//!
//! ```text
//! path  = step ("/" step)*
//! step  = ".." | "[DYN_I]" | "[" digits "]" | ident
//! ident = (alnum | "_")+
//! ```
//!
//! `..` ascends to the parent, an identifier selects a named child of the
//! current struct or union, `[n]` selects an array element, and `[DYN_I]`
//! marks where a dynamic-name path splits into the array part and the
//! per-element part.

use std::fmt;
use std::str::FromStr;

use crate::error::PathError;

/// A single step of a [`NodePath`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathStep {
	Parent,
	Child(String),
	Index(usize),
	DynIndex,
}

impl fmt::Display for PathStep {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			PathStep::Parent => f.write_str(".."),
			PathStep::Child(name) => f.write_str(name),
			PathStep::Index(i) => write!(f, "[{i}]"),
			PathStep::DynIndex => f.write_str("[DYN_I]"),
		}
	}
}

/// A parsed neighbor path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct NodePath {
	steps: Vec<PathStep>,
}

impl NodePath {
	pub fn new(steps: Vec<PathStep>) -> Self {
		Self { steps }
	}

	pub fn steps(&self) -> &[PathStep] {
		&self.steps
	}

	pub fn is_empty(&self) -> bool {
		self.steps.is_empty()
	}

	/// Parses a path, panicking on malformed input.
	///
	/// Intended for literal paths in descriptor definitions; use
	/// [`str::parse`] for untrusted text.
	pub fn lit(text: &str) -> Self {
		match text.parse() {
			Ok(path) => path,
			Err(e) => panic!("invalid literal path: {e}"),
		}
	}
}

impl fmt::Display for NodePath {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		for (i, step) in self.steps.iter().enumerate() {
			if i > 0 {
				f.write_str("/")?;
			}
			write!(f, "{step}")?;
		}
		Ok(())
	}
}

impl FromStr for NodePath {
	type Err = PathError;

	fn from_str(text: &str) -> Result<Self, Self::Err> {
		let syntax = |position: usize, message: &str| PathError::Syntax {
			text: text.to_string(),
			position,
			message: message.to_string(),
		};

		if text.trim().is_empty() {
			return Ok(Self::default());
		}

		let mut steps = Vec::new();
		let mut offset = 0;
		for raw in text.split('/') {
			let step = match raw {
				"" => return Err(syntax(offset, "empty step")),
				".." => PathStep::Parent,
				"[DYN_I]" => PathStep::DynIndex,
				_ if raw.starts_with('[') => {
					let inner = raw
						.strip_prefix('[')
						.and_then(|r| r.strip_suffix(']'))
						.ok_or_else(|| syntax(offset, "unterminated index"))?;
					let index = inner.parse::<usize>().map_err(|_| syntax(offset + 1, "index is not a number"))?;
					PathStep::Index(index)
				}
				_ => {
					if let Some(bad) = raw.char_indices().find(|(_, ch)| !(ch.is_ascii_alphanumeric() || *ch == '_')) {
						return Err(syntax(offset + bad.0, "unexpected character in name"));
					}
					PathStep::Child(raw.to_string())
				}
			};
			steps.push(step);
			offset += raw.len() + 1;
		}

		Ok(Self { steps })
	}
}

/// A dynamic-name path, split at its `[DYN_I]` marker.
///
/// When `array` is `None` the path labels the elements of the array that
/// declares it, and `element` is resolved from each element. Otherwise
/// `array` is resolved from the declaring field's parent to find the array
/// whose elements are named.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DynNamePath {
	pub array: Option<NodePath>,
	pub element: NodePath,
}

impl DynNamePath {
	pub fn lit(text: &str) -> Self {
		match text.parse() {
			Ok(path) => path,
			Err(e) => panic!("invalid literal dynamic name path: {e}"),
		}
	}
}

impl fmt::Display for DynNamePath {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match &self.array {
			Some(array) if array.is_empty() => write!(f, "[DYN_I]/{}", self.element),
			Some(array) => write!(f, "{array}/[DYN_I]/{}", self.element),
			None => write!(f, "{}", self.element),
		}
	}
}

impl FromStr for DynNamePath {
	type Err = PathError;

	fn from_str(text: &str) -> Result<Self, Self::Err> {
		let path: NodePath = text.parse()?;
		let splits: Vec<usize> = path
			.steps
			.iter()
			.enumerate()
			.filter(|(_, s)| **s == PathStep::DynIndex)
			.map(|(i, _)| i)
			.collect();

		match splits.as_slice() {
			[] => Ok(Self {
				array: None,
				element: path,
			}),
			[at] => {
				let mut steps = path.steps;
				let element = steps.split_off(at + 1);
				steps.pop();
				Ok(Self {
					array: Some(NodePath::new(steps)),
					element: NodePath::new(element),
				})
			}
			_ => Err(PathError::Syntax {
				text: text.to_string(),
				position: 0,
				message: "more than one [DYN_I] marker".to_string(),
			}),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_mixed_steps() {
		let path: NodePath = "../header/[2]/name".parse().unwrap();
		assert_eq!(
			path.steps(),
			&[
				PathStep::Parent,
				PathStep::Child("header".into()),
				PathStep::Index(2),
				PathStep::Child("name".into()),
			]
		);
		assert_eq!(path.to_string(), "../header/[2]/name");
	}

	#[test]
	fn rejects_empty_steps_and_bad_names() {
		assert!(matches!("a//b".parse::<NodePath>(), Err(PathError::Syntax { position: 2, .. })));
		assert!(matches!("a/b-c".parse::<NodePath>(), Err(PathError::Syntax { position: 3, .. })));
		assert!("[x]".parse::<NodePath>().is_err());
	}

	#[test]
	fn empty_text_is_the_empty_path() {
		assert!("".parse::<NodePath>().unwrap().is_empty());
	}

	#[test]
	fn dyn_path_without_marker_is_element_relative() {
		let dyn_path = DynNamePath::lit("name/data");
		assert_eq!(dyn_path.array, None);
		assert_eq!(dyn_path.element.to_string(), "name/data");
	}

	#[test]
	fn dyn_path_splits_at_marker() {
		let dyn_path = DynNamePath::lit("../nodes/[DYN_I]/name");
		assert_eq!(dyn_path.array.as_ref().map(ToString::to_string).as_deref(), Some("../nodes"));
		assert_eq!(dyn_path.element.to_string(), "name");
		assert_eq!(dyn_path.to_string(), "../nodes/[DYN_I]/name");
	}

	#[test]
	fn dyn_path_rejects_two_markers() {
		assert!("[DYN_I]/a/[DYN_I]".parse::<DynNamePath>().is_err());
	}
}
