//! Node tree back to bytes.

use binilla_node::{Node, NodeData, NodeError, TreePath, UnionBody};
use binilla_schema::{Shape, SizeSpec, Value};

use crate::error::{CodecError, Result};

/// Serializes `node` and everything below it.
///
/// Fixed-size strings are NUL padded, unions are zero padded to their
/// declared size and stream payloads are passed through their adapter.
pub fn serialize(node: &Node) -> Result<Vec<u8>> {
	let mut out = Vec::new();
	write_node(node, &mut TreePath::root(), &mut out)?;
	Ok(out)
}

fn write_node(node: &Node, at: &mut TreePath, out: &mut Vec<u8>) -> Result<()> {
	match (&node.desc().shape, node.data()) {
		(Shape::Struct { .. }, NodeData::Struct(children)) => write_children(children, at, out)?,
		(Shape::Array { count, .. }, NodeData::Array(children)) => {
			if let SizeSpec::Fixed(n) = count
				&& *n != children.len()
			{
				return Err(CodecError::SizeMismatch {
					path: at.clone(),
					declared: *n,
					actual: children.len(),
				});
			}
			write_children(children, at, out)?;
		}
		(Shape::Union { size, .. }, NodeData::Union { body, .. }) => {
			let start = out.len();
			match body {
				UnionBody::Active(child) => {
					at.push(0);
					write_node(child, at, out)?;
					at.pop();
				}
				UnionBody::Raw(bytes) => out.extend_from_slice(bytes),
			}
			pad_to(out, start, *size, at)?;
		}
		(
			Shape::BoolMask { encoding, .. }
			| Shape::Enum { encoding, .. }
			| Shape::DynamicEnum { encoding, .. }
			| Shape::Integer { encoding, .. }
			| Shape::Timestamp { encoding },
			NodeData::Scalar(Value::Int(value)),
		) => out.extend(encoding.write(*value)),
		(Shape::Float { encoding, .. }, NodeData::Scalar(Value::Float(value))) => out.extend(encoding.write(*value)),
		(Shape::String { encoding, size }, NodeData::Scalar(Value::Str(text))) => {
			let start = out.len();
			let bytes = encoding.encode(text).map_err(|source| CodecError::Encoding {
				path: at.clone(),
				offset: start,
				source,
			})?;
			out.extend(bytes);
			if let SizeSpec::Fixed(n) = size {
				pad_to(out, start, *n, at)?;
			}
		}
		(Shape::RawBytes { size }, NodeData::Scalar(Value::Bytes(bytes))) => {
			let start = out.len();
			out.extend_from_slice(bytes);
			if let SizeSpec::Fixed(n) = size {
				pad_to(out, start, *n, at)?;
			}
		}
		(Shape::StreamAdapter { size, adapter, .. }, NodeData::Stream(payload)) => {
			let mut image = Vec::new();
			at.push(0);
			write_node(payload, at, &mut image)?;
			at.pop();
			let stored = adapter.encode(&image).map_err(|message| CodecError::Adapter {
				path: at.clone(),
				adapter: adapter.name().to_string(),
				message,
			})?;
			let start = out.len();
			out.extend(stored);
			if let SizeSpec::Fixed(n) = size {
				pad_to(out, start, *n, at)?;
			}
		}
		(Shape::Pad { size }, _) => out.resize(out.len() + size, 0),
		(Shape::Void, _) => {}
		_ => {
			return Err(NodeError::WrongKind {
				name: node.name().to_string(),
				found: node.kind(),
				expected: "data matching its descriptor",
			}
			.into());
		}
	}
	Ok(())
}

fn write_children(children: &[Node], at: &mut TreePath, out: &mut Vec<u8>) -> Result<()> {
	for (i, child) in children.iter().enumerate() {
		at.push(i);
		write_node(child, at, out)?;
		at.pop();
	}
	Ok(())
}

/// Zero pads everything written since `start` up to `size` bytes.
fn pad_to(out: &mut Vec<u8>, start: usize, size: usize, at: &TreePath) -> Result<()> {
	let actual = out.len() - start;
	if actual > size {
		return Err(CodecError::SizeMismatch {
			path: at.clone(),
			declared: size,
			actual,
		});
	}
	out.resize(start + size, 0);
	Ok(())
}
