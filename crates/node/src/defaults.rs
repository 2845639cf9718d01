//! Descriptor-driven default construction.

use std::sync::Arc;

use binilla_schema::{Descriptor, Shape, SizeSpec, Value};

use crate::node::{Node, NodeData, UnionBody};

impl Node {
	/// Builds the default node for `desc`, recursively.
	///
	/// Size neighbors are not synced; use [`Node::default_tree`] for a
	/// document root.
	pub fn default_for(desc: &Arc<Descriptor>) -> Node {
		let data = match &desc.shape {
			Shape::Struct { fields } => NodeData::Struct(fields.iter().map(Node::default_for).collect()),
			Shape::Array {
				element, count, min_count, ..
			} => {
				let len = match count {
					SizeSpec::Fixed(n) => *n,
					_ => *min_count,
				};
				NodeData::Array((0..len).map(|_| Node::default_for(element)).collect())
			}
			Shape::Union { cases, size, .. } => {
				let case = desc
					.default
					.as_ref()
					.and_then(Value::as_int)
					.and_then(|d| i64::try_from(d).ok())
					.filter(|d| cases.contains_key(d));
				match case.and_then(|d| cases.get(&d).map(|c| (d, c))) {
					Some((d, case_desc)) => NodeData::Union {
						case: Some(d),
						body: UnionBody::Active(Box::new(Node::default_for(case_desc))),
					},
					None => NodeData::Union {
						case: None,
						body: UnionBody::Raw(vec![0; *size]),
					},
				}
			}
			Shape::Enum { options, .. } => {
				let value = desc.default.as_ref().and_then(Value::as_int).or_else(|| options.first().map(|o| o.value));
				NodeData::Scalar(Value::Int(value.unwrap_or(0)))
			}
			Shape::Integer { min, max, .. } => {
				let value = desc.default.as_ref().and_then(Value::as_int).unwrap_or(0);
				let value = min.map_or(value, |lo| value.max(lo));
				NodeData::Scalar(Value::Int(max.map_or(value, |hi| value.min(hi))))
			}
			Shape::BoolMask { .. } | Shape::DynamicEnum { .. } | Shape::Timestamp { .. } => {
				NodeData::Scalar(Value::Int(desc.default.as_ref().and_then(Value::as_int).unwrap_or(0)))
			}
			Shape::Float { encoding, min, max, .. } => {
				let value = desc.default.as_ref().and_then(Value::as_f64).unwrap_or(0.0);
				let value = min.map_or(value, |lo| value.max(lo));
				NodeData::Scalar(Value::Float(encoding.quantize(max.map_or(value, |hi| value.min(hi)))))
			}
			Shape::String { .. } => NodeData::Scalar(Value::Str(
				desc.default.as_ref().and_then(Value::as_str).unwrap_or_default().to_string(),
			)),
			Shape::RawBytes { size } => {
				let bytes = match (desc.default.as_ref().and_then(Value::as_bytes), size) {
					(Some(bytes), SizeSpec::Fixed(n)) => {
						let mut bytes = bytes.to_vec();
						bytes.resize(*n, 0);
						bytes
					}
					(Some(bytes), _) => bytes.to_vec(),
					(None, SizeSpec::Fixed(n)) => vec![0; *n],
					(None, _) => Vec::new(),
				};
				NodeData::Scalar(Value::Bytes(bytes))
			}
			Shape::StreamAdapter { payload, .. } => NodeData::Stream(Box::new(Node::default_for(payload))),
			Shape::Pad { .. } | Shape::Void => NodeData::Empty,
		};
		Node::new(desc.clone(), data)
	}

	/// Builds a default document root with every size neighbor in sync.
	pub fn default_tree(desc: &Arc<Descriptor>) -> Node {
		let mut root = Node::default_for(desc);
		root.sync_all_sizes();
		root
	}
}
