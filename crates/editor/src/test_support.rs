//! Fixtures shared by the unit tests.

use std::path::Path;
use std::sync::Arc;

use binilla_codec::serialize;
use binilla_config::EditorSettings;
use binilla_history::{ApplyPolicy, EditHistory};
use binilla_node::{CountLimits, Node, TreePath};
use binilla_schema::{
	Descriptor, EditorHint, Endian, EnumOption, FlagOption, IntEncoding, NodePath, Shape, SizeSpec, StrEncoding, UnitScale,
	Value, Visibility,
};

use crate::context::{EditContext, View};
use crate::document::{CloseChoice, Document, Prompter};
use crate::error::FieldError;
use crate::field::{Field, FieldEditor, FlushOutcome};

pub(crate) const COUNT: usize = 0;
pub(crate) const ITEMS: usize = 2;
pub(crate) const FLAGS: usize = 3;
pub(crate) const KIND: usize = 4;
pub(crate) const SELECTED: usize = 5;
pub(crate) const SCALE: usize = 6;
pub(crate) const OFFSET: usize = 7;
pub(crate) const NOTE: usize = 8;
pub(crate) const CREATED: usize = 9;
pub(crate) const BLOB_LEN: usize = 10;
pub(crate) const BLOB: usize = 11;
pub(crate) const SHAPE_KIND: usize = 12;
pub(crate) const SHAPE: usize = 13;
pub(crate) const TINT: usize = 14;
pub(crate) const SECRET: usize = 15;

/// A tag exercising every editor kind.
pub(crate) fn tag_descriptor() -> Arc<Descriptor> {
	let u8le = IntEncoding::unsigned(8, Endian::Little);
	let item = Descriptor::structure(
		"item",
		vec![
			Descriptor::string("name", StrEncoding::Ascii, SizeSpec::Fixed(8)),
			Descriptor::u8("value"),
		],
	);
	Arc::new(Descriptor::structure(
		"tag",
		vec![
			Descriptor::u16("count").with_int_bounds(Some(0), Some(64)).with_default_int(10),
			Descriptor::u16("items_count").with_visibility(Visibility::Metadata),
			Descriptor::array("items", item, SizeSpec::path("items_count"))
				.with_counts(0, 4)
				.with_dynamic_name("name"),
			Descriptor::bool_mask(
				"flags",
				u8le,
				vec![
					(0, FlagOption::new("visible")),
					(1, FlagOption::new("locked").read_only()),
					(3, FlagOption::new("shadow")),
					(5, FlagOption::new("legacy").hidden()),
				],
			)
			.with_default_int(0b0000_0001),
			Descriptor::enumeration(
				"kind",
				u8le,
				vec![EnumOption::new(0, "none"), EnumOption::new(1, "box"), EnumOption::new(2, "sphere")],
			),
			Descriptor::dynamic_enum("selected", IntEncoding::signed(16, Endian::Little), "items/[DYN_I]/name"),
			Descriptor::f32("scale").with_default(Value::Float(2.0)),
			Descriptor::i32("offset").with_unit_scale(UnitScale::Neighbor(NodePath::lit("scale"))),
			Descriptor::string("note", StrEncoding::Utf8, SizeSpec::Fixed(16)).with_hint(EditorHint::MultiLine),
			Descriptor::timestamp("created", IntEncoding::unsigned(32, Endian::Little)),
			Descriptor::u32("blob_len").with_visibility(Visibility::Metadata),
			Descriptor::raw("blob", SizeSpec::path("blob_len")),
			Descriptor::u8("shape_kind"),
			Descriptor::union(
				"shape",
				4,
				Some("shape_kind"),
				vec![
					(0, Descriptor::structure("sphere", vec![Descriptor::f32("radius")])),
					(1, Descriptor::structure("box", vec![Descriptor::u16("w"), Descriptor::u16("h")])),
				],
			)
			.with_default_int(0),
			Descriptor::structure("tint", vec![Descriptor::u8("r"), Descriptor::u8("g"), Descriptor::u8("b")])
				.with_hint(EditorHint::Color),
			Descriptor::u8("secret").with_visibility(Visibility::Hidden),
		],
	))
}

/// A default tag with two named items.
pub(crate) fn tag_root() -> Node {
	let desc = tag_descriptor();
	let mut root = Node::default_tree(&desc);
	let Shape::Array { element, .. } = &desc.fields()[ITEMS].shape else {
		panic!("items is an array");
	};
	for (name, value) in [("alpha", 1), ("beta", 2)] {
		let mut item = Node::default_for(element);
		item.get_mut("name").unwrap().set_value(Value::Str(name.into())).unwrap();
		item.get_mut("value").unwrap().set_value(Value::Int(value)).unwrap();
		root.get_mut(ITEMS).unwrap().append(item, CountLimits::ENFORCED).unwrap();
	}
	root.sync_all_sizes();
	root
}

/// A document without the session machinery.
pub(crate) struct Doc {
	pub root: Node,
	pub history: EditHistory,
	pub settings: EditorSettings,
}

impl Doc {
	pub fn new() -> Self {
		Self {
			root: tag_root(),
			history: EditHistory::new(100),
			settings: EditorSettings::default(),
		}
	}

	pub fn view(&self) -> View<'_> {
		View::new(&self.root, &self.settings)
	}

	pub fn ctx(&mut self) -> EditContext<'_> {
		EditContext::new(&mut self.root, &mut self.history, &self.settings)
	}

	pub fn editor(&self) -> FieldEditor {
		FieldEditor::build(self.view(), &TreePath::root()).unwrap()
	}

	pub fn policy(&self) -> ApplyPolicy {
		ApplyPolicy {
			limits: self.settings.count_limits(),
		}
	}

	pub fn undo(&mut self) {
		let policy = self.policy();
		self.history.undo(&mut self.root, &policy).unwrap();
	}

	pub fn redo(&mut self) {
		let policy = self.policy();
		self.history.redo(&mut self.root, &policy).unwrap();
	}

	pub fn int(&self, index: usize) -> i128 {
		self.root.get(index).and_then(Node::int).unwrap()
	}
}

/// A prompter answering from fields and recording what it was asked.
#[derive(Debug)]
pub(crate) struct ScriptedPrompter {
	pub close: CloseChoice,
	pub discard: bool,
	pub resize: Option<usize>,
	pub asked: Vec<String>,
	pub notices: Vec<String>,
}

impl Default for ScriptedPrompter {
	fn default() -> Self {
		Self {
			close: CloseChoice::Cancel,
			discard: false,
			resize: None,
			asked: Vec::new(),
			notices: Vec::new(),
		}
	}
}

impl Prompter for ScriptedPrompter {
	fn confirm_close(&mut self, title: &str) -> CloseChoice {
		self.asked.push(format!("close {title}"));
		self.close
	}

	fn confirm_discard(&mut self, title: &str) -> bool {
		self.asked.push(format!("discard {title}"));
		self.discard
	}

	fn offer_history_resize(&mut self, title: &str, current: usize) -> Option<usize> {
		self.asked.push(format!("resize {title} {current}"));
		self.resize
	}

	fn notify(&mut self, message: &str) {
		self.notices.push(message.to_string());
	}
}

/// Writes the default tag to `path`.
pub(crate) fn write_tag(path: &Path) {
	std::fs::write(path, serialize(&tag_root()).unwrap()).unwrap();
}

/// Sets the entry at `at` to `text` and flushes it.
pub(crate) fn type_into(
	doc: &mut Document,
	prompter: &mut ScriptedPrompter,
	at: &[usize],
	text: &str,
) -> crate::error::Result<FlushOutcome> {
	let at = TreePath::from_slice(at);
	let text = text.to_string();
	doc.edit(prompter, move |editor, ctx| {
		let entry = editor
			.find_mut(&at)
			.and_then(FieldEditor::as_entry_mut)
			.ok_or(FieldError::Unavailable("no entry there"))?;
		entry.set_text(text);
		entry.flush(ctx)
	})
}
