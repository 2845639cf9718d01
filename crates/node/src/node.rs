//! The node type and its structural mutations.

use std::sync::Arc;

use binilla_schema::{Descriptor, FieldKind, Shape, SizeSpec, Value};
use tracing::warn;

use crate::error::{NodeError, Result};

/// A value whose shape is fixed by a descriptor.
#[derive(Debug, Clone)]
pub struct Node {
	desc: Arc<Descriptor>,
	data: NodeData,
}

/// Payload of a node.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeData {
	/// Integers, floats, strings, timestamps, flags, enums and raw bytes.
	Scalar(Value),
	/// Fixed-length tuple of children in descriptor order.
	Struct(Vec<Node>),
	/// Variable-length homogeneous sequence.
	Array(Vec<Node>),
	/// `case` is `None` while the body holds raw bytes.
	Union { case: Option<i64>, body: UnionBody },
	/// Decoded payload of a stream adapter.
	Stream(Box<Node>),
	/// Padding and void fields carry no data.
	Empty,
}

/// Contents of a union node.
#[derive(Debug, Clone, PartialEq)]
pub enum UnionBody {
	Active(Box<Node>),
	Raw(Vec<u8>),
}

/// Addresses a child by attr index or by field name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key<'a> {
	Index(usize),
	Name(&'a str),
}

impl From<usize> for Key<'_> {
	fn from(index: usize) -> Self {
		Key::Index(index)
	}
}

impl<'a> From<&'a str> for Key<'a> {
	fn from(name: &'a str) -> Self {
		Key::Name(name)
	}
}

/// Which array count bounds are hard errors.
///
/// Bounds that are not enforced are still checked and reported as warnings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CountLimits {
	pub enforce_min: bool,
	pub enforce_max: bool,
}

impl CountLimits {
	pub const ENFORCED: Self = Self {
		enforce_min: true,
		enforce_max: true,
	};

	pub const RELAXED: Self = Self {
		enforce_min: false,
		enforce_max: false,
	};

	/// Checks a prospective element count for the array described by `desc`.
	pub fn check(&self, desc: &Descriptor, len: usize) -> Result<()> {
		let Shape::Array { min_count, max_count, .. } = &desc.shape else {
			return Ok(());
		};
		let too_few = len < *min_count;
		let too_many = len > *max_count;
		if (too_few && self.enforce_min) || (too_many && self.enforce_max) {
			return Err(NodeError::CountOutOfBounds {
				name: desc.name.clone(),
				len,
				min: *min_count,
				max: *max_count,
			});
		}
		if too_few || too_many {
			warn!(array = %desc.name, len, min = min_count, max = max_count, "array count outside declared bounds");
		}
		Ok(())
	}
}

/// Returns `true` if a node built from `found` may stand where `expected` is declared.
pub(crate) fn same_descriptor(expected: &Arc<Descriptor>, found: &Arc<Descriptor>) -> bool {
	Arc::ptr_eq(expected, found) || (expected.name == found.name && expected.kind() == found.kind())
}

impl PartialEq for Node {
	fn eq(&self, other: &Self) -> bool {
		same_descriptor(&self.desc, &other.desc) && self.data == other.data
	}
}

impl Node {
	pub fn new(desc: Arc<Descriptor>, data: NodeData) -> Self {
		Self { desc, data }
	}

	pub fn scalar(desc: Arc<Descriptor>, value: Value) -> Self {
		Self::new(desc, NodeData::Scalar(value))
	}

	pub fn desc(&self) -> &Arc<Descriptor> {
		&self.desc
	}

	pub fn data(&self) -> &NodeData {
		&self.data
	}

	pub fn data_mut(&mut self) -> &mut NodeData {
		&mut self.data
	}

	pub fn into_data(self) -> NodeData {
		self.data
	}

	pub fn kind(&self) -> FieldKind {
		self.desc.kind()
	}

	pub fn name(&self) -> &str {
		&self.desc.name
	}

	pub fn value(&self) -> Option<&Value> {
		match &self.data {
			NodeData::Scalar(value) => Some(value),
			_ => None,
		}
	}

	pub fn int(&self) -> Option<i128> {
		self.value().and_then(Value::as_int)
	}

	/// Replaces a scalar value after checking it against the descriptor.
	///
	/// Returns the previous value.
	pub fn set_value(&mut self, value: Value) -> Result<Value> {
		self.check_value(&value)?;
		match &mut self.data {
			NodeData::Scalar(current) => Ok(std::mem::replace(current, value)),
			_ => Err(self.wrong_kind("a scalar")),
		}
	}

	/// Checks that `value` is storable in this node.
	pub fn check_value(&self, value: &Value) -> Result<()> {
		let bad = || NodeError::BadValue {
			name: self.desc.name.clone(),
			value: format!("{} {value}", value.type_name()),
		};
		match (&self.desc.shape, value) {
			(
				Shape::Integer { encoding, .. }
				| Shape::Enum { encoding, .. }
				| Shape::DynamicEnum { encoding, .. }
				| Shape::BoolMask { encoding, .. }
				| Shape::Timestamp { encoding },
				Value::Int(v),
			) if encoding.contains(*v) => Ok(()),
			(Shape::Float { .. }, Value::Float(_)) => Ok(()),
			(Shape::String { .. }, Value::Str(_)) => Ok(()),
			(Shape::RawBytes { size }, Value::Bytes(bytes)) => match size {
				SizeSpec::Fixed(n) if *n != bytes.len() => Err(bad()),
				_ => Ok(()),
			},
			_ => Err(bad()),
		}
	}

	/// Child nodes in attr-index order.
	///
	/// A union exposes its active case and a stream adapter its payload as the
	/// only child; raw union bodies and scalars have none.
	pub fn children(&self) -> &[Node] {
		match &self.data {
			NodeData::Struct(children) | NodeData::Array(children) => children,
			NodeData::Union {
				body: UnionBody::Active(active),
				..
			} => std::slice::from_ref(&**active),
			NodeData::Stream(payload) => std::slice::from_ref(&**payload),
			_ => &[],
		}
	}

	pub fn children_mut(&mut self) -> &mut [Node] {
		match &mut self.data {
			NodeData::Struct(children) | NodeData::Array(children) => children,
			NodeData::Union {
				body: UnionBody::Active(active),
				..
			} => std::slice::from_mut(&mut **active),
			NodeData::Stream(payload) => std::slice::from_mut(&mut **payload),
			_ => &mut [],
		}
	}

	/// Number of children.
	pub fn len(&self) -> usize {
		self.children().len()
	}

	pub fn is_empty(&self) -> bool {
		self.children().is_empty()
	}

	pub fn child(&self, index: usize) -> Option<&Node> {
		self.children().get(index)
	}

	pub fn child_mut(&mut self, index: usize) -> Option<&mut Node> {
		self.children_mut().get_mut(index)
	}

	/// Looks a child up by attr index or field name.
	pub fn get<'k>(&self, key: impl Into<Key<'k>>) -> Option<&Node> {
		match key.into() {
			Key::Index(index) => self.child(index),
			Key::Name(name) => self.children().iter().find(|c| c.desc.name == name),
		}
	}

	pub fn get_mut<'k>(&mut self, key: impl Into<Key<'k>>) -> Option<&mut Node> {
		match key.into() {
			Key::Index(index) => self.child_mut(index),
			Key::Name(name) => self.children_mut().iter_mut().find(|c| c.desc.name == name),
		}
	}

	/// Attr index of the child called `name`.
	pub fn index_of(&self, name: &str) -> Option<usize> {
		self.children().iter().position(|c| c.desc.name == name)
	}

	/// Node at `path` relative to this node.
	pub fn at(&self, path: &[usize]) -> Option<&Node> {
		path.iter().try_fold(self, |node, index| node.child(*index))
	}

	pub fn at_mut(&mut self, path: &[usize]) -> Option<&mut Node> {
		path.iter().try_fold(self, |node, index| node.child_mut(*index))
	}

	pub fn try_at(&self, path: &[usize]) -> Result<&Node> {
		self.at(path).ok_or_else(|| NodeError::NoNode(format!("{path:?}")))
	}

	pub fn try_at_mut(&mut self, path: &[usize]) -> Result<&mut Node> {
		self.at_mut(path).ok_or_else(|| NodeError::NoNode(format!("{path:?}")))
	}

	/// Replaces the child at `index`, returning the old child.
	///
	/// Struct and union children can only be replaced, never added or removed.
	pub fn set(&mut self, index: usize, node: Node) -> Result<Node> {
		let expected = self.child_descriptor(index)?;
		if !same_descriptor(&expected, &node.desc) {
			return Err(NodeError::DescriptorMismatch {
				expected: expected.name.clone(),
				found: node.desc.name.clone(),
			});
		}
		let len = self.len();
		let name = self.desc.name.clone();
		let slot = self.child_mut(index).ok_or(NodeError::IndexOutOfRange { name, index, len })?;
		Ok(std::mem::replace(slot, node))
	}

	/// Descriptor a child at `index` must be built from.
	fn child_descriptor(&self, index: usize) -> Result<Arc<Descriptor>> {
		match &self.desc.shape {
			Shape::Struct { fields } => fields.get(index).cloned().ok_or_else(|| NodeError::IndexOutOfRange {
				name: self.desc.name.clone(),
				index,
				len: fields.len(),
			}),
			Shape::Array { element, .. } => Ok(element.clone()),
			Shape::StreamAdapter { payload, .. } => Ok(payload.clone()),
			Shape::Union { .. } => match &self.data {
				NodeData::Union {
					body: UnionBody::Active(active),
					..
				} => Ok(active.desc.clone()),
				_ => Err(self.wrong_kind("a union with an active case")),
			},
			_ => Err(self.wrong_kind("a container")),
		}
	}

	/// Array elements, after checking the array may change length.
	fn resizable_elements(&mut self) -> Result<&mut Vec<Node>> {
		if let Some(SizeSpec::Fixed(size)) = self.desc.size_spec() {
			return Err(NodeError::FixedSize {
				name: self.desc.name.clone(),
				size: *size,
			});
		}
		match &mut self.data {
			NodeData::Array(elements) => Ok(elements),
			_ => Err(NodeError::WrongKind {
				name: self.desc.name.clone(),
				found: self.desc.kind(),
				expected: "an array",
			}),
		}
	}

	fn check_element(&self, node: &Node) -> Result<()> {
		let expected = self.child_descriptor(0)?;
		if same_descriptor(&expected, &node.desc) {
			Ok(())
		} else {
			Err(NodeError::DescriptorMismatch {
				expected: expected.name.clone(),
				found: node.desc.name.clone(),
			})
		}
	}

	/// Appends an element to an array.
	pub fn append(&mut self, node: Node, limits: CountLimits) -> Result<()> {
		let len = self.len();
		self.insert(len, node, limits)
	}

	/// Inserts an element so that it ends up at `index`.
	pub fn insert(&mut self, index: usize, node: Node, limits: CountLimits) -> Result<()> {
		self.check_element(&node)?;
		let desc = self.desc.clone();
		let elements = self.resizable_elements()?;
		if index > elements.len() {
			return Err(NodeError::IndexOutOfRange {
				name: desc.name.clone(),
				index,
				len: elements.len(),
			});
		}
		limits.check(&desc, elements.len() + 1)?;
		elements.insert(index, node);
		Ok(())
	}

	/// Removes and returns the element at `index`.
	pub fn delete(&mut self, index: usize, limits: CountLimits) -> Result<Node> {
		let desc = self.desc.clone();
		let elements = self.resizable_elements()?;
		if index >= elements.len() {
			return Err(NodeError::IndexOutOfRange {
				name: desc.name.clone(),
				index,
				len: elements.len(),
			});
		}
		limits.check(&desc, elements.len() - 1)?;
		Ok(elements.remove(index))
	}

	/// Removes every element, returning them in order.
	pub fn delete_all(&mut self, limits: CountLimits) -> Result<Vec<Node>> {
		let desc = self.desc.clone();
		let elements = self.resizable_elements()?;
		limits.check(&desc, 0)?;
		Ok(std::mem::take(elements))
	}

	/// Replaces every element at once.
	pub fn replace_elements(&mut self, nodes: Vec<Node>, limits: CountLimits) -> Result<Vec<Node>> {
		for node in &nodes {
			self.check_element(node)?;
		}
		let desc = self.desc.clone();
		let elements = self.resizable_elements()?;
		limits.check(&desc, nodes.len())?;
		Ok(std::mem::replace(elements, nodes))
	}

	/// Swaps two array elements.
	pub fn swap(&mut self, a: usize, b: usize) -> Result<()> {
		let name = self.desc.name.clone();
		match &mut self.data {
			NodeData::Array(elements) => {
				let len = elements.len();
				for index in [a, b] {
					if index >= len {
						return Err(NodeError::IndexOutOfRange { name, index, len });
					}
				}
				elements.swap(a, b);
				Ok(())
			}
			_ => Err(self.wrong_kind("an array")),
		}
	}

	/// Active discriminator of a union node; `Some(None)` when the body is raw.
	pub fn union_case(&self) -> Option<Option<i64>> {
		match &self.data {
			NodeData::Union { case, .. } => Some(*case),
			_ => None,
		}
	}

	pub(crate) fn wrong_kind(&self, expected: &'static str) -> NodeError {
		NodeError::WrongKind {
			name: self.desc.name.clone(),
			found: self.desc.kind(),
			expected,
		}
	}
}
