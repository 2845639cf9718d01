use std::path::Path;
use std::sync::Arc;

use binilla_codec::serialize;
use binilla_config::EditorSettings;
use binilla_editor::{CloseChoice, CloseDecision, Document, Field, FieldEditor, FieldError, FlushOutcome, Prompter};
use binilla_node::{CountLimits, Node, TreePath};
use binilla_persist::BackupPolicy;
use binilla_schema::{Descriptor, Endian, FlagOption, IntEncoding, Shape, SizeSpec, Value, Visibility};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

const COUNT: usize = 0;
const VALUES: usize = 2;
const FLAGS: usize = 3;

fn init_tracing() {
	let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn descriptor() -> Arc<Descriptor> {
	let u8le = IntEncoding::unsigned(8, Endian::Little);
	let bits = (0..8).map(|bit| (bit, FlagOption::new(format!("bit{bit}")))).collect();
	Arc::new(Descriptor::structure(
		"doc",
		vec![
			Descriptor::u16("count").with_int_bounds(Some(0), Some(1000)).with_default_int(10),
			Descriptor::u16("values_count").with_visibility(Visibility::Metadata),
			Descriptor::array("values", Descriptor::u16("value"), SizeSpec::path("values_count")).with_counts(0, 6),
			Descriptor::bool_mask("flags", u8le, bits),
		],
	))
}

fn seeded_root(desc: &Arc<Descriptor>) -> Node {
	let mut root = Node::default_tree(desc);
	let Shape::Array { element, .. } = &desc.fields()[VALUES].shape else {
		panic!("values is an array");
	};
	for value in [100, 200] {
		let mut node = Node::default_for(element);
		node.set_value(Value::Int(value)).unwrap();
		root.get_mut(VALUES).unwrap().append(node, CountLimits::ENFORCED).unwrap();
	}
	root.sync_all_sizes();
	root
}

fn open(path: &Path) -> Document {
	let desc = descriptor();
	std::fs::write(path, serialize(&seeded_root(&desc)).unwrap()).unwrap();
	Document::open("doc", &desc, path, EditorSettings::default(), BackupPolicy::default()).unwrap()
}

#[derive(Default)]
struct Host {
	notices: Vec<String>,
}

impl Prompter for Host {
	fn confirm_close(&mut self, _title: &str) -> CloseChoice {
		CloseChoice::Cancel
	}

	fn confirm_discard(&mut self, _title: &str) -> bool {
		false
	}

	fn offer_history_resize(&mut self, _title: &str, _current: usize) -> Option<usize> {
		None
	}

	fn notify(&mut self, message: &str) {
		self.notices.push(message.to_string());
	}
}

fn type_count(doc: &mut Document, host: &mut Host, text: &str) -> FlushOutcome {
	let text = text.to_string();
	doc.edit(host, move |editor, ctx| {
		let entry = editor
			.find_mut(&TreePath::from([COUNT]))
			.and_then(FieldEditor::as_entry_mut)
			.ok_or(FieldError::Unavailable("count entry"))?;
		entry.set_text(text);
		entry.flush(ctx)
	})
	.unwrap()
}

fn toggle(doc: &mut Document, host: &mut Host, bit: u8) {
	doc.edit(host, |editor, ctx| {
		editor
			.find_mut(&TreePath::from([FLAGS]))
			.and_then(FieldEditor::as_bool_mask_mut)
			.ok_or(FieldError::Unavailable("flags"))?
			.toggle(ctx, bit)
	})
	.unwrap();
}

fn int(doc: &Document, index: usize) -> Option<i128> {
	doc.root().get(index).and_then(Node::int)
}

#[test]
fn edit_undo_redo_then_save() {
	init_tracing();
	let dir = tempfile::tempdir().unwrap();
	let path = dir.path().join("a.doc");
	let mut doc = open(&path);
	let mut host = Host::default();

	assert_eq!(type_count(&mut doc, &mut host, "12 * 2 + 1"), FlushOutcome::Committed);
	assert_eq!(int(&doc, COUNT), Some(25));
	assert!(doc.is_dirty());

	assert!(doc.undo(&mut host).unwrap());
	assert_eq!(int(&doc, COUNT), Some(10));
	assert!(!doc.is_dirty());

	assert!(doc.redo(&mut host).unwrap());
	doc.save(&mut host).unwrap();
	let report = doc.wait_for_save().unwrap().unwrap();
	assert_eq!(report.written, path);
	assert!(!doc.is_dirty());
	assert_eq!(doc.request_close(&mut host).unwrap(), CloseDecision::Close);

	let reopened = open_existing(&path);
	assert_eq!(int(&reopened, COUNT), Some(25));
}

fn open_existing(path: &Path) -> Document {
	Document::open("doc", &descriptor(), path, EditorSettings::default(), BackupPolicy::default()).unwrap()
}

#[test]
fn duplicate_then_undo_restores_selection() {
	init_tracing();
	let dir = tempfile::tempdir().unwrap();
	let mut doc = open(&dir.path().join("a.doc"));
	let mut host = Host::default();
	let values = TreePath::from([VALUES]);

	doc.edit(&mut host, |editor, ctx| {
		let array = editor
			.find_mut(&values)
			.and_then(FieldEditor::as_array_mut)
			.ok_or(FieldError::Unavailable("values"))?;
		array.select(ctx.view(), 0);
		array.duplicate(ctx)
	})
	.unwrap();

	let selection = |doc: &mut Document| {
		doc.editor_mut()
			.and_then(|e| e.find_mut(&values))
			.and_then(FieldEditor::as_array_mut)
			.map(|a| a.selection())
	};
	let items = |doc: &Document| -> Vec<i128> {
		let array = doc.root().get(VALUES).unwrap();
		(0..array.len()).filter_map(|i| array.get(i).and_then(Node::int)).collect()
	};
	assert_eq!(items(&doc), [100, 100, 200]);
	assert_eq!(int(&doc, 1), Some(3));
	assert_eq!(selection(&mut doc), Some(1));

	doc.undo(&mut host).unwrap();
	assert_eq!(items(&doc), [100, 200]);
	assert_eq!(int(&doc, 1), Some(2));
	assert_eq!(selection(&mut doc), Some(0));

	doc.redo(&mut host).unwrap();
	assert_eq!(selection(&mut doc), Some(1));
}

#[test]
fn bool_toggle_touches_one_bit() {
	init_tracing();
	let dir = tempfile::tempdir().unwrap();
	let mut doc = open(&dir.path().join("a.doc"));
	let mut host = Host::default();

	toggle(&mut doc, &mut host, 3);
	assert_eq!(int(&doc, FLAGS), Some(0b1000));
	toggle(&mut doc, &mut host, 0);
	assert_eq!(int(&doc, FLAGS), Some(0b1001));

	doc.undo(&mut host).unwrap();
	assert_eq!(int(&doc, FLAGS), Some(0b1000));
	doc.undo(&mut host).unwrap();
	assert_eq!(int(&doc, FLAGS), Some(0));
}

#[test]
fn unsafe_expressions_never_commit() {
	init_tracing();
	let dir = tempfile::tempdir().unwrap();
	let mut doc = open(&dir.path().join("a.doc"));
	let mut host = Host::default();

	for input in ["__import__('os').system('true')", "open('x')", "count.__class__", "lambda: 1"] {
		assert_eq!(type_count(&mut doc, &mut host, input), FlushOutcome::Reverted, "{input}");
	}
	assert_eq!(int(&doc, COUNT), Some(10));
	assert!(!doc.history().can_undo());
	assert!(!doc.is_dirty());
}

#[derive(Debug, Clone)]
enum Op {
	Count(u16),
	Toggle(u8),
}

fn op() -> impl Strategy<Value = Op> {
	prop_oneof![(0..1000u16).prop_map(Op::Count), (0..8u8).prop_map(Op::Toggle)]
}

proptest! {
	#![proptest_config(ProptestConfig::with_cases(32))]

	#[test]
	fn undo_all_then_redo_all(ops in prop::collection::vec(op(), 1..16)) {
		let desc = descriptor();
		let mut doc = Document::new("doc", &desc, EditorSettings::default(), BackupPolicy::default());
		let mut host = Host::default();
		let initial = doc.root().clone();

		for op in &ops {
			match *op {
				Op::Count(v) => {
					type_count(&mut doc, &mut host, &v.to_string());
				}
				Op::Toggle(bit) => toggle(&mut doc, &mut host, bit),
			}
		}
		let edited = doc.root().clone();

		while doc.undo(&mut host).unwrap() {}
		prop_assert_eq!(doc.root(), &initial);
		while doc.redo(&mut host).unwrap() {}
		prop_assert_eq!(doc.root(), &edited);
	}
}
