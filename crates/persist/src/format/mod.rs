//! Signed, versioned documents and their upgrade chain.
//!
//! A versioned document is an 8-byte header (a 4-byte signature, then the
//! version as a little-endian `u32`) followed by a body laid out by the
//! descriptor registered for that version. Loading an older version runs
//! the upgraders `v → v+1` in order until the current version is reached.
//! Each upgrader reads the old tree and fills a freshly defaulted new one,
//! so fields the old version lacks keep their new defaults.

use std::collections::BTreeMap;
use std::sync::Arc;

use binilla_codec::{CodecError, ParseOptions, parse, serialize};
use binilla_node::{CountLimits, Node, NodeData, UnionBody};
use binilla_schema::{Descriptor, Shape, SizeSpec};
use tracing::{debug, trace, warn};

use crate::error::{PersistError, Result};
use crate::save::{SavePlan, SaveReport, integrity_error, save_bytes};


/// Byte length of the signature and version header.
pub const HEADER_LEN: usize = 8;

/// Upgrades a tree of one version into a default tree of the next.
pub type UpgradeFn = fn(old: &Node, new: &mut Node) -> Result<()>;

/// The leading signature and version of a versioned document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
	pub signature: [u8; 4],
	pub version: u32,
}

impl Header {
	/// Reads the header from the start of `bytes`.
	pub fn read(bytes: &[u8]) -> Option<Self> {
		let signature = bytes.get(..4)?.try_into().ok()?;
		let version = u32::from_le_bytes(bytes.get(4..HEADER_LEN)?.try_into().ok()?);
		Some(Self { signature, version })
	}

	pub fn to_bytes(self) -> [u8; HEADER_LEN] {
		let mut out = [0; HEADER_LEN];
		out[..4].copy_from_slice(&self.signature);
		out[4..].copy_from_slice(&self.version.to_le_bytes());
		out
	}
}

/// A document read by [`VersionedFormat::load`].
#[derive(Debug)]
pub struct Loaded {
	/// The tree, at the current version.
	pub root: Node,
	/// Version found in the file.
	pub version: u32,
	/// Set when the body was corrupt and `allow_corrupt` kept a partial tree.
	pub diagnostic: Option<CodecError>,
}

impl Loaded {
	pub fn was_upgraded(&self, format: &VersionedFormat) -> bool {
		self.version != format.current()
	}
}

/// One signature, its per-version descriptors and the upgraders between them.
#[derive(Debug, Clone)]
pub struct VersionedFormat {
	signature: [u8; 4],
	versions: BTreeMap<u32, Arc<Descriptor>>,
	upgraders: BTreeMap<u32, UpgradeFn>,
}

impl VersionedFormat {
	pub fn new(signature: [u8; 4]) -> Self {
		Self {
			signature,
			versions: BTreeMap::new(),
			upgraders: BTreeMap::new(),
		}
	}

	/// Registers the body descriptor of `version`.
	pub fn version(mut self, version: u32, desc: Arc<Descriptor>) -> Self {
		self.versions.insert(version, desc);
		self
	}

	/// Registers the upgrader from `from` to `from + 1`.
	pub fn upgrader(mut self, from: u32, upgrade: UpgradeFn) -> Self {
		self.upgraders.insert(from, upgrade);
		self
	}

	pub fn signature(&self) -> [u8; 4] {
		self.signature
	}

	/// The highest registered version.
	pub fn current(&self) -> u32 {
		self.versions.keys().next_back().copied().unwrap_or(0)
	}

	pub fn descriptor(&self, version: u32) -> Option<&Arc<Descriptor>> {
		self.versions.get(&version)
	}

	fn descriptor_or_err(&self, version: u32) -> Result<&Arc<Descriptor>> {
		self.descriptor(version).ok_or(PersistError::UnknownVersion {
			version,
			current: self.current(),
		})
	}

	/// A default document at the current version.
	pub fn default_document(&self) -> Result<Node> {
		Ok(Node::default_tree(self.descriptor_or_err(self.current())?))
	}

	/// Checks the header of `bytes`.
	///
	/// The signature is validated before the version is looked at.
	pub fn read_header(&self, bytes: &[u8]) -> Result<Header> {
		let header = Header::read(bytes).ok_or_else(|| PersistError::BadSignature {
			expected: self.signature,
			found: bytes.iter().take(4).copied().collect(),
		})?;
		if header.signature != self.signature {
			return Err(PersistError::BadSignature {
				expected: self.signature,
				found: header.signature.to_vec(),
			});
		}
		self.descriptor_or_err(header.version)?;
		Ok(header)
	}

	/// Parses a versioned document, upgrading it to the current version.
	pub fn load(&self, bytes: &[u8], options: &ParseOptions) -> Result<Loaded> {
		let header = self.read_header(bytes)?;
		let desc = self.descriptor_or_err(header.version)?;
		let outcome = parse(desc, &bytes[HEADER_LEN..], options)?;
		let root = self.upgrade(outcome.root, header.version)?;
		Ok(Loaded {
			root,
			version: header.version,
			diagnostic: outcome.diagnostic,
		})
	}

	/// Runs the upgraders from `from` up to the current version.
	///
	/// A tree already at the current version is returned unchanged.
	pub fn upgrade(&self, mut root: Node, from: u32) -> Result<Node> {
		let current = self.current();
		if from > current {
			return Err(PersistError::UnknownVersion { version: from, current });
		}
		for version in from..current {
			let upgrade = self
				.upgraders
				.get(&version)
				.ok_or(PersistError::MissingUpgrader { from: version })?;
			let mut next = Node::default_tree(self.descriptor_or_err(version + 1)?);
			upgrade(&root, &mut next)?;
			next.sync_all_sizes();
			debug!(signature = %String::from_utf8_lossy(&self.signature), from = version, to = version + 1, "document upgraded");
			root = next;
		}
		Ok(root)
	}

	/// Serializes `root` behind a header for the current version.
	pub fn encode(&self, root: &Node) -> Result<Vec<u8>> {
		let header = Header {
			signature: self.signature,
			version: self.current(),
		};
		let body = serialize(root)?;
		let mut out = Vec::with_capacity(HEADER_LEN + body.len());
		out.extend_from_slice(&header.to_bytes());
		out.extend_from_slice(&body);
		Ok(out)
	}

	/// Encodes `root` and saves it through `plan`; the integrity test loads
	/// the temp back and requires an identical tree.
	pub fn save(&self, plan: &SavePlan, root: &Node) -> Result<SaveReport> {
		let bytes = self.encode(root)?;
		save_bytes(plan, &bytes, |written| {
			let reloaded = self
				.load(written, &ParseOptions::default())
				.map_err(|e| integrity_error(plan, format!("reload failed: {e}")))?;
			match root.first_difference(&reloaded.root) {
				None => Ok(()),
				Some(at) => Err(integrity_error(plan, format!("trees differ at {at}"))),
			}
		})
	}
}

/// Copies every field of `old` into the same-named field of `new`.
///
/// Struct fields match by name, array elements by position and union
/// bodies by case. Fields missing from `old`, and values `new` cannot hold,
/// keep the values already in `new`.
pub fn copy_by_name(old: &Node, new: &mut Node) {
	if old.kind() != new.kind() {
		trace!(field = new.name(), "kind changed, keeping default");
		return;
	}

	let desc = new.desc().clone();
	match (&desc.shape, old.data()) {
		(Shape::Struct { .. }, _) => {
			for child in new.children_mut() {
				if let Some(source) = old.get(child.name()) {
					copy_by_name(source, child);
				}
			}
		}
		(Shape::Array { element, count, .. }, NodeData::Array(old_elements)) => {
			if matches!(count, SizeSpec::Fixed(_)) {
				for (child, source) in new.children_mut().iter_mut().zip(old_elements) {
					copy_by_name(source, child);
				}
				return;
			}
			let elements = old_elements
				.iter()
				.map(|source| {
					let mut child = Node::default_for(element);
					copy_by_name(source, &mut child);
					child
				})
				.collect();
			if let Err(e) = new.replace_elements(elements, CountLimits::RELAXED) {
				warn!(field = new.name(), error = %e, "array not copied");
			}
		}
		(Shape::Union { cases, size, .. }, NodeData::Union { case, body }) => {
			let body = match (case, body) {
				(Some(case), UnionBody::Active(source)) => match cases.get(case) {
					Some(desc) => {
						let mut child = Node::default_for(desc);
						copy_by_name(source, &mut child);
						UnionBody::Active(Box::new(child))
					}
					None => return,
				},
				(_, UnionBody::Raw(bytes)) => {
					let mut bytes = bytes.clone();
					bytes.resize(*size, 0);
					UnionBody::Raw(bytes)
				}
				(None, UnionBody::Active(_)) => return,
			};
			let case = match body {
				UnionBody::Active(_) => *case,
				UnionBody::Raw(_) => None,
			};
			*new.data_mut() = NodeData::Union { case, body };
		}
		(Shape::StreamAdapter { .. }, NodeData::Stream(source)) => {
			if let Some(child) = new.child_mut(0) {
				copy_by_name(source, child);
			}
		}
		(_, NodeData::Scalar(value)) => {
			if let Err(e) = new.set_value(value.clone()) {
				trace!(field = new.name(), error = %e, "value not copied");
			}
		}
		_ => {}
	}
}
