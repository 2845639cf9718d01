use std::path::PathBuf;

use binilla_node::{Node, TreePath};
use binilla_persist::BackupPolicy;
use binilla_schema::Value;
use pretty_assertions::assert_eq;

use super::*;
use crate::test_support::*;

fn opened(dir: &tempfile::TempDir) -> (Document, PathBuf) {
	let path = dir.path().join("x.tag");
	write_tag(&path);
	let doc = Document::open("tag", &tag_descriptor(), &path, EditorSettings::default(), BackupPolicy::default()).unwrap();
	(doc, path)
}

fn count(doc: &Document) -> Option<i128> {
	doc.root().get(COUNT).and_then(Node::int)
}

fn array_selection(doc: &mut Document) -> isize {
	doc.editor_mut()
		.and_then(|e| e.find_mut(&TreePath::from([ITEMS])))
		.and_then(FieldEditor::as_array_mut)
		.map(|a| a.selection())
		.unwrap()
}

#[test]
fn scalar_edit_undo_redo_tracks_dirty() {
	let dir = tempfile::tempdir().unwrap();
	let (mut doc, _) = opened(&dir);
	let mut prompter = ScriptedPrompter::default();
	assert!(!doc.is_new());
	assert!(!doc.is_dirty());

	type_into(&mut doc, &mut prompter, &[COUNT], "25").unwrap();
	assert_eq!(count(&doc), Some(25));
	assert!(doc.is_dirty());

	assert!(doc.undo(&mut prompter).unwrap());
	assert_eq!(count(&doc), Some(10));
	assert!(!doc.is_dirty());
	assert!(!doc.undo(&mut prompter).unwrap());

	assert!(doc.redo(&mut prompter).unwrap());
	assert_eq!(count(&doc), Some(25));
	assert!(doc.is_dirty());
	assert!(!doc.redo(&mut prompter).unwrap());
}

#[test]
fn undo_flushes_pending_input_first() {
	let dir = tempfile::tempdir().unwrap();
	let (mut doc, _) = opened(&dir);
	let mut prompter = ScriptedPrompter::default();
	doc.editor_mut()
		.and_then(|e| e.find_mut(&TreePath::from([COUNT])))
		.and_then(FieldEditor::as_entry_mut)
		.unwrap()
		.set_text("30");

	assert!(doc.undo(&mut prompter).unwrap());
	assert_eq!(count(&doc), Some(10));
	assert!(doc.redo(&mut prompter).unwrap());
	assert_eq!(count(&doc), Some(30));
}

#[test]
fn array_undo_restores_selection() {
	let dir = tempfile::tempdir().unwrap();
	let (mut doc, _) = opened(&dir);
	let mut prompter = ScriptedPrompter::default();

	doc.edit(&mut prompter, |editor, ctx| {
		let array = editor
			.find_mut(&TreePath::from([ITEMS]))
			.and_then(FieldEditor::as_array_mut)
			.unwrap();
		array.select(ctx.view(), 1);
		array.duplicate(ctx)
	})
	.unwrap();
	assert_eq!(array_selection(&mut doc), 2);
	assert_eq!(doc.root().get(ITEMS).map(Node::len), Some(3));

	type_into(&mut doc, &mut prompter, &[ITEMS, 2, 0], "copy").unwrap();
	let name = |doc: &Document, i: usize| doc.root().at(&[ITEMS, i, 0]).and_then(Node::value).cloned();
	assert_eq!(name(&doc, 1), Some(Value::Str("beta".into())));
	assert_eq!(name(&doc, 2), Some(Value::Str("copy".into())));

	doc.undo(&mut prompter).unwrap();
	doc.undo(&mut prompter).unwrap();
	assert_eq!(doc.root().get(ITEMS).map(Node::len), Some(2));
	assert_eq!(array_selection(&mut doc), 1);

	doc.redo(&mut prompter).unwrap();
	assert_eq!(array_selection(&mut doc), 2);
}

#[test]
fn new_document_saves_through_save_as() {
	let dir = tempfile::tempdir().unwrap();
	let mut doc = Document::new("tag", &tag_descriptor(), EditorSettings::default(), BackupPolicy::default());
	let mut prompter = ScriptedPrompter::default();
	assert!(doc.is_new());
	assert!(doc.is_dirty());
	assert_eq!(doc.title(), "untitled");
	assert!(matches!(doc.save(&mut prompter), Err(SessionError::NoPath)));

	let path = dir.path().join("fresh.tag");
	doc.save_as(&path, &mut prompter).unwrap();
	assert!(doc.is_saving());
	let report = doc.wait_for_save().unwrap().unwrap();
	assert_eq!(report.written, path);
	assert!(!doc.is_new());
	assert!(!doc.is_dirty());
	assert_eq!(doc.title(), "fresh.tag");
	assert!(doc.wait_for_save().is_none());

	let reopened =
		Document::open("tag", &tag_descriptor(), &path, EditorSettings::default(), BackupPolicy::default()).unwrap();
	assert_eq!(reopened.root(), doc.root());
}

#[test]
fn saving_document_refuses_edits() {
	let dir = tempfile::tempdir().unwrap();
	let (mut doc, _) = opened(&dir);
	let mut prompter = ScriptedPrompter::default();
	type_into(&mut doc, &mut prompter, &[COUNT], "25").unwrap();

	doc.save(&mut prompter).unwrap();
	assert!(matches!(
		type_into(&mut doc, &mut prompter, &[COUNT], "30"),
		Err(SessionError::Field(FieldError::Saving))
	));
	assert!(matches!(doc.undo(&mut prompter), Err(SessionError::Saving(_))));
	assert!(matches!(doc.save(&mut prompter), Err(SessionError::Saving(_))));
	assert_eq!(doc.request_close(&mut prompter).unwrap(), CloseDecision::StillSaving);
	assert_eq!(prompter.notices.len(), 1);

	doc.wait_for_save().unwrap().unwrap();
	assert!(!doc.is_dirty());
	// The refused input is still pending and lands on the next flush.
	assert_eq!(doc.flush(&mut prompter).unwrap(), FlushOutcome::Committed);
	assert_eq!(count(&doc), Some(30));
}

#[test]
fn close_asks_only_when_dirty() {
	let dir = tempfile::tempdir().unwrap();
	let (mut doc, path) = opened(&dir);
	let mut prompter = ScriptedPrompter::default();
	assert_eq!(doc.request_close(&mut prompter).unwrap(), CloseDecision::Close);
	assert!(prompter.asked.is_empty());

	type_into(&mut doc, &mut prompter, &[COUNT], "25").unwrap();
	assert_eq!(doc.request_close(&mut prompter).unwrap(), CloseDecision::Cancel);
	assert_eq!(prompter.asked, ["close x.tag"]);

	prompter.close = CloseChoice::Discard;
	assert_eq!(doc.request_close(&mut prompter).unwrap(), CloseDecision::Close);
	assert!(doc.is_dirty());

	prompter.close = CloseChoice::Save;
	assert_eq!(doc.request_close(&mut prompter).unwrap(), CloseDecision::Close);
	assert!(!doc.is_dirty());
	let saved = Document::open("tag", &tag_descriptor(), &path, EditorSettings::default(), BackupPolicy::default())
		.unwrap();
	assert_eq!(count(&saved), Some(25));
}

#[test]
fn full_history_offers_a_resize() {
	let dir = tempfile::tempdir().unwrap();
	let path = dir.path().join("x.tag");
	write_tag(&path);
	let settings = EditorSettings {
		max_undos: 2,
		..EditorSettings::default()
	};
	let mut doc = Document::open("tag", &tag_descriptor(), &path, settings, BackupPolicy::default()).unwrap();
	let mut prompter = ScriptedPrompter::default();

	type_into(&mut doc, &mut prompter, &[COUNT], "1").unwrap();
	assert!(prompter.asked.is_empty());
	type_into(&mut doc, &mut prompter, &[COUNT], "2").unwrap();
	assert_eq!(prompter.asked, ["resize x.tag 2"]);
	assert!(doc.history().resize_declined());

	type_into(&mut doc, &mut prompter, &[COUNT], "3").unwrap();
	assert_eq!(prompter.asked.len(), 1);
	assert_eq!(doc.history().len(), 2);

	doc.undo(&mut prompter).unwrap();
	prompter.resize = Some(10);
	type_into(&mut doc, &mut prompter, &[COUNT], "4").unwrap();
	assert_eq!(prompter.asked.len(), 2);
	assert_eq!(doc.history().max_undos(), 10);
	assert_eq!(doc.settings().max_undos, 10);
}

#[test]
fn reload_asks_before_discarding() {
	let dir = tempfile::tempdir().unwrap();
	let (mut doc, _) = opened(&dir);
	let mut prompter = ScriptedPrompter::default();
	type_into(&mut doc, &mut prompter, &[COUNT], "25").unwrap();

	assert!(!doc.reload(&mut prompter).unwrap());
	assert_eq!(count(&doc), Some(25));

	prompter.discard = true;
	assert!(doc.reload(&mut prompter).unwrap());
	assert_eq!(count(&doc), Some(10));
	assert!(!doc.is_dirty());
	assert!(!doc.history().can_undo());
}

#[test]
fn corrupt_files_open_only_when_allowed() {
	let dir = tempfile::tempdir().unwrap();
	let path = dir.path().join("short.tag");
	std::fs::write(&path, [10, 0, 2]).unwrap();

	let strict = Document::open("tag", &tag_descriptor(), &path, EditorSettings::default(), BackupPolicy::default());
	assert!(matches!(strict, Err(SessionError::Codec(_))));

	let settings = EditorSettings {
		allow_corrupt: true,
		..EditorSettings::default()
	};
	let doc = Document::open("tag", &tag_descriptor(), &path, settings, BackupPolicy::default()).unwrap();
	assert!(doc.diagnostic().is_some());
	assert!(doc.is_dirty());
	assert_eq!(count(&doc), Some(10));
}

#[test]
fn visibility_settings_rebuild_editors() {
	let dir = tempfile::tempdir().unwrap();
	let (mut doc, _) = opened(&dir);
	let shown = |doc: &mut Document| doc.editor_mut().and_then(FieldEditor::as_struct_mut).unwrap().child(1).is_some();
	assert!(!shown(&mut doc));

	doc.set_settings(EditorSettings {
		show_metadata: true,
		..EditorSettings::default()
	});
	assert!(shown(&mut doc));
}

#[test]
fn restore_entry_needs_a_path() {
	let dir = tempfile::tempdir().unwrap();
	let fresh = Document::new("tag", &tag_descriptor(), EditorSettings::default(), BackupPolicy::default());
	assert!(fresh.restore_entry().is_none());

	let (mut doc, path) = opened(&dir);
	let window = WindowGeometry {
		x: 5,
		y: 6,
		width: 300,
		height: 200,
	};
	doc.set_window(window, true);
	assert_eq!(
		doc.restore_entry(),
		Some(RestoreEntry {
			descriptor_id: "tag".into(),
			path,
			window,
			minimized: true,
		})
	);
}

#[test]
fn direct_edits_mark_every_ancestor() {
	let dir = tempfile::tempdir().unwrap();
	let (mut doc, _) = opened(&dir);
	let mut prompter = ScriptedPrompter::default();
	assert!(!doc.editor().unwrap().frame().is_edited());

	doc.edit(&mut prompter, |editor, ctx| {
		editor
			.find_mut(&TreePath::from([FLAGS]))
			.and_then(FieldEditor::as_bool_mask_mut)
			.ok_or(FieldError::Unavailable("flags"))?
			.toggle(ctx, 3)
	})
	.unwrap();
	assert!(doc.editor().unwrap().frame().is_edited());

	doc.edit(&mut prompter, |editor, ctx| {
		let array = editor
			.find_mut(&TreePath::from([ITEMS]))
			.and_then(FieldEditor::as_array_mut)
			.ok_or(FieldError::Unavailable("items"))?;
		array.select(ctx.view(), 0);
		array.duplicate(ctx)
	})
	.unwrap();
	let editor = doc.editor_mut().unwrap();
	assert!(editor.find_mut(&TreePath::from([ITEMS])).unwrap().frame().is_edited());
	assert!(!editor.find_mut(&TreePath::from([COUNT])).unwrap().frame().is_edited());
}

#[test]
fn failed_save_as_keeps_the_old_path() {
	let dir = tempfile::tempdir().unwrap();
	let mut doc = Document::new("tag", &tag_descriptor(), EditorSettings::default(), BackupPolicy::default());
	let mut prompter = ScriptedPrompter::default();
	let occupied = dir.path().join("occupied.tag");
	std::fs::create_dir(&occupied).unwrap();
	std::fs::write(occupied.join("inside"), b"x").unwrap();

	doc.save_as(&occupied, &mut prompter).unwrap();
	assert_eq!(doc.path(), Some(occupied.as_path()));
	assert!(doc.wait_for_save().unwrap().is_err());
	assert_eq!(doc.path(), None);
	assert!(doc.is_new());
	assert!(doc.is_dirty());
	assert!(matches!(doc.save(&mut prompter), Err(SessionError::NoPath)));
}
