//! Descriptor walk from bytes to a node tree.

use std::sync::Arc;

use binilla_node::{CountLimits, Node, NodeData, TreePath, UnionBody};
use binilla_schema::{Descriptor, Shape, SizeSpec, Value};
use tracing::{debug, warn};

use crate::error::{CodecError, Result};
use crate::reader::Reader;

/// Knobs for [`parse`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseOptions {
	/// Return a partially populated tree instead of failing on bad input.
	pub allow_corrupt: bool,
}

/// Result of a successful [`parse`].
#[derive(Debug)]
pub struct ParseOutcome {
	pub root: Node,
	/// The error that cut parsing short, when `allow_corrupt` accepted a bad input.
	pub diagnostic: Option<CodecError>,
}

impl ParseOutcome {
	pub fn is_corrupt(&self) -> bool {
		self.diagnostic.is_some()
	}
}

/// Parses `bytes` as a document described by `desc`.
///
/// The tree starts out default-constructed and is filled field by field, so
/// size paths always see the already-parsed siblings. When `allow_corrupt`
/// is set, a failure leaves the unparsed remainder of every container at its
/// defaults and is reported through [`ParseOutcome::diagnostic`].
pub fn parse(desc: &Arc<Descriptor>, bytes: &[u8], options: &ParseOptions) -> Result<ParseOutcome> {
	let mut root = Node::default_for(desc);
	let mut reader = Reader::new(bytes);
	match parse_at(&mut root, &TreePath::root(), &mut reader) {
		Ok(()) => {
			if !reader.is_empty() {
				debug!(descriptor = %desc.name, trailing = reader.remaining(), "bytes left after the root field");
			}
			Ok(ParseOutcome { root, diagnostic: None })
		}
		Err(e) if options.allow_corrupt => {
			warn!(descriptor = %desc.name, error = %e, "corrupt input, keeping partial tree");
			root.sync_all_sizes();
			Ok(ParseOutcome {
				root,
				diagnostic: Some(e),
			})
		}
		Err(e) => Err(e),
	}
}

fn parse_at(root: &mut Node, at: &TreePath, reader: &mut Reader<'_>) -> Result<()> {
	let desc = root.try_at(at)?.desc().clone();
	match &desc.shape {
		Shape::Struct { fields } => {
			for i in 0..fields.len() {
				parse_at(root, &at.child(i), reader)?;
			}
		}
		Shape::Array { element, count, .. } => parse_array(root, at, &desc, element, count, reader)?,
		Shape::Union { case_path, cases, size } => {
			let mut body = reader.sub(*size, at)?;
			let case = match case_path {
				Some(path) => match root.neighbor_node(at, path) {
					Ok(node) => node.int().and_then(|v| i64::try_from(v).ok()),
					Err(e) => {
						debug!(union = %at, error = %e, "case neighbor unavailable, keeping raw bytes");
						None
					}
				},
				None => root.try_at(at)?.union_case().flatten(),
			};
			match case.and_then(|c| cases.get(&c).map(|d| (c, d))) {
				Some((case, case_desc)) => {
					*root.try_at_mut(at)?.data_mut() = NodeData::Union {
						case: Some(case),
						body: UnionBody::Active(Box::new(Node::default_for(case_desc))),
					};
					parse_at(root, &at.child(0), &mut body)?;
				}
				None => {
					let bytes = body.take(*size, at)?.to_vec();
					*root.try_at_mut(at)?.data_mut() = NodeData::Union {
						case: None,
						body: UnionBody::Raw(bytes),
					};
				}
			}
		}
		Shape::BoolMask { encoding, .. }
		| Shape::Enum { encoding, .. }
		| Shape::DynamicEnum { encoding, .. }
		| Shape::Integer { encoding, .. }
		| Shape::Timestamp { encoding } => {
			let value = encoding.read(reader.take(encoding.byte_len(), at)?);
			set_scalar(root, at, Value::Int(value))?;
		}
		Shape::Float { encoding, .. } => {
			let value = encoding.read(reader.take(encoding.byte_len(), at)?);
			set_scalar(root, at, Value::Float(value))?;
		}
		Shape::String { encoding, size } => {
			let len = field_size(root, at, size, reader)?;
			let offset = reader.offset();
			let mut bytes = reader.take(len, at)?;
			if let SizeSpec::Fixed(_) = size {
				let unit = encoding.unit_len();
				if let Some(nul) = bytes.chunks(unit).position(|c| c.iter().all(|b| *b == 0)) {
					bytes = &bytes[..nul * unit];
				}
			}
			let text = encoding.decode(bytes).map_err(|source| CodecError::Encoding {
				path: at.clone(),
				offset,
				source,
			})?;
			set_scalar(root, at, Value::Str(text))?;
		}
		Shape::RawBytes { size } => {
			let len = field_size(root, at, size, reader)?;
			let bytes = reader.take(len, at)?.to_vec();
			set_scalar(root, at, Value::Bytes(bytes))?;
		}
		Shape::StreamAdapter { payload, size, adapter } => {
			let len = field_size(root, at, size, reader)?;
			let stored = reader.take(len, at)?;
			let image = adapter.decode(stored).map_err(|message| CodecError::Adapter {
				path: at.clone(),
				adapter: adapter.name().to_string(),
				message,
			})?;
			*root.try_at_mut(at)?.data_mut() = NodeData::Stream(Box::new(Node::default_for(payload)));
			parse_at(root, &at.child(0), &mut Reader::new(&image))?;
		}
		Shape::Pad { size } => {
			reader.take(*size, at)?;
		}
		Shape::Void => {}
	}
	Ok(())
}

fn parse_array(
	root: &mut Node,
	at: &TreePath,
	desc: &Descriptor,
	element: &Arc<Descriptor>,
	count: &SizeSpec,
	reader: &mut Reader<'_>,
) -> Result<()> {
	let count = match count {
		SizeSpec::Fixed(n) => {
			for i in 0..*n {
				parse_at(root, &at.child(i), reader)?;
			}
			return Ok(());
		}
		SizeSpec::Path(_) => {
			let n = root.get_size(at).map_err(|source| CodecError::Size { path: at.clone(), source })?;
			if let Some(stride) = element.static_size()
				&& stride > 0
				&& n.saturating_mul(stride) > reader.remaining()
			{
				return Err(CodecError::UnexpectedEof {
					path: at.clone(),
					offset: reader.offset(),
					needed: n.saturating_mul(stride),
					available: reader.remaining(),
				});
			}
			CountLimits::RELAXED.check(desc, n)?;
			Some(n)
		}
		SizeSpec::Remainder => None,
	};

	if let NodeData::Array(elements) = root.try_at_mut(at)?.data_mut() {
		elements.clear();
	}
	let mut i = 0;
	while count.map_or(!reader.is_empty(), |n| i < n) {
		if let NodeData::Array(elements) = root.try_at_mut(at)?.data_mut() {
			elements.push(Node::default_for(element));
		}
		let before = reader.offset();
		parse_at(root, &at.child(i), reader)?;
		i += 1;
		if count.is_none() && reader.offset() == before {
			break;
		}
	}
	Ok(())
}

fn field_size(root: &Node, at: &TreePath, size: &SizeSpec, reader: &Reader<'_>) -> Result<usize> {
	match size {
		SizeSpec::Fixed(n) => Ok(*n),
		SizeSpec::Remainder => Ok(reader.remaining()),
		SizeSpec::Path(_) => root.get_size(at).map_err(|source| CodecError::Size { path: at.clone(), source }),
	}
}

fn set_scalar(root: &mut Node, at: &TreePath, value: Value) -> Result<()> {
	*root.try_at_mut(at)?.data_mut() = NodeData::Scalar(value);
	Ok(())
}

#[cfg(test)]
mod tests;
