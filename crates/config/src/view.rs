//! Named-field access shared by the typed views.

use binilla_node::{CountLimits, Node};
use binilla_schema::{Shape, Value};

use crate::error::{ConfigError, Result};

pub(crate) fn field<'a>(node: &'a Node, name: &str) -> Result<&'a Node> {
	node.get(name).ok_or_else(|| missing(node, name))
}

pub(crate) fn field_mut<'a>(node: &'a mut Node, name: &str) -> Result<&'a mut Node> {
	let parent = node.name().to_string();
	node.get_mut(name).ok_or_else(|| ConfigError::MissingField(format!("{parent}.{name}")))
}

fn missing(node: &Node, name: &str) -> ConfigError {
	ConfigError::MissingField(format!("{}.{name}", node.name()))
}

pub(crate) fn int(node: &Node, name: &str) -> Result<i128> {
	let child = field(node, name)?;
	child.int().ok_or_else(|| missing(node, name))
}

/// Integer field clamped into `T`.
pub(crate) fn int_as<T: TryFrom<i128> + Default>(node: &Node, name: &str) -> Result<T> {
	Ok(T::try_from(int(node, name)?).unwrap_or_default())
}

pub(crate) fn text(node: &Node, name: &str) -> Result<String> {
	let child = field(node, name)?;
	child
		.value()
		.and_then(Value::as_str)
		.map(str::to_string)
		.ok_or_else(|| missing(node, name))
}

pub(crate) fn set_int(node: &mut Node, name: &str, value: impl Into<i128>) -> Result<()> {
	field_mut(node, name)?.set_value(Value::Int(value.into()))?;
	Ok(())
}

pub(crate) fn set_text(node: &mut Node, name: &str, value: &str) -> Result<()> {
	field_mut(node, name)?.set_value(Value::Str(value.to_string()))?;
	Ok(())
}

/// Bool-mask bits as a flag set; unknown bits are dropped.
pub(crate) fn mask<F: bitflags::Flags<Bits = u32>>(node: &Node, name: &str) -> Result<F> {
	let bits = u32::try_from(int(node, name)?).unwrap_or_default();
	Ok(F::from_bits_truncate(bits))
}

/// Replaces the elements of array `name` with one default element per item,
/// each passed through `fill`.
pub(crate) fn fill_array<I, F>(node: &mut Node, name: &str, items: I, mut fill: F) -> Result<()>
where
	I: IntoIterator,
	F: FnMut(&mut Node, I::Item) -> Result<()>,
{
	let array = field_mut(node, name)?;
	let Shape::Array { element, .. } = &array.desc().shape else {
		return Err(missing(array, name));
	};
	let element = element.clone();
	let mut elements = Vec::new();
	for item in items {
		let mut child = Node::default_for(&element);
		fill(&mut child, item)?;
		elements.push(child);
	}
	array.replace_elements(elements, CountLimits::RELAXED)?;
	Ok(())
}
