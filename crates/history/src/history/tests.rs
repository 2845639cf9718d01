use std::sync::Arc;

use binilla_node::{Node, TreePath};
use binilla_schema::{Descriptor, Value};
use pretty_assertions::assert_eq;

use super::EditHistory;
use crate::{ApplyPolicy, Change, EditState};

fn counter() -> Node {
	let desc = Arc::new(Descriptor::structure("doc", vec![Descriptor::u16("count").with_default_int(10)]));
	Node::default_tree(&desc)
}

fn set_count(root: &Node, redo: i128) -> EditState {
	let target = TreePath::from([0]);
	let node = root.try_at(&target).expect("count");
	let change = Change::ScalarSet {
		undo: node.value().cloned().expect("scalar"),
		redo: Value::Int(redo),
	};
	EditState::new(&target, node.desc().clone(), change).expect("state")
}

fn count(root: &Node) -> Option<i128> {
	root.get("count").and_then(Node::int)
}

fn push(history: &mut EditHistory, root: &mut Node, value: i128) {
	let state = set_count(root, value);
	history.push(root, state, &ApplyPolicy::default()).expect("push");
}

#[test]
fn edit_undo_redo_tracks_dirty_flag() {
	let mut root = counter();
	let mut history = EditHistory::new(10);
	assert!(!history.is_dirty());

	push(&mut history, &mut root, 25);
	assert_eq!(count(&root), Some(25));
	assert!(history.is_dirty());

	history.undo(&mut root, &ApplyPolicy::default()).expect("undo");
	assert_eq!(count(&root), Some(10));
	assert!(!history.is_dirty());

	history.redo(&mut root, &ApplyPolicy::default()).expect("redo");
	assert_eq!(count(&root), Some(25));
	assert!(history.is_dirty());
}

#[test]
fn undo_and_redo_at_the_ends_are_no_ops() {
	let mut root = counter();
	let mut history = EditHistory::new(4);

	assert_eq!(history.undo(&mut root, &ApplyPolicy::default()), Ok(None));
	assert_eq!(history.redo(&mut root, &ApplyPolicy::default()), Ok(None));
	assert_eq!(history.edit_index(), None);
}

#[test]
fn new_edit_after_undo_discards_redo_states() {
	let mut root = counter();
	let mut history = EditHistory::new(10);
	push(&mut history, &mut root, 1);
	push(&mut history, &mut root, 2);
	history.undo(&mut root, &ApplyPolicy::default()).expect("undo");

	push(&mut history, &mut root, 3);
	assert_eq!(history.len(), 2);
	assert!(!history.can_redo());
	assert_eq!(history.edit_index(), Some(1));
}

#[test]
fn saved_marker_lost_when_its_redo_branch_is_discarded() {
	let mut root = counter();
	let mut history = EditHistory::new(10);
	push(&mut history, &mut root, 1);
	push(&mut history, &mut root, 2);
	history.mark_saved();
	history.undo(&mut root, &ApplyPolicy::default()).expect("undo");
	history.undo(&mut root, &ApplyPolicy::default()).expect("undo");

	push(&mut history, &mut root, 5);
	assert_eq!(history.last_saved_edit_index(), None);
	assert!(history.is_dirty());
}

#[test]
fn eviction_shifts_saved_marker() {
	let mut root = counter();
	let mut history = EditHistory::new(3);
	push(&mut history, &mut root, 1);
	push(&mut history, &mut root, 2);
	history.mark_saved();
	assert_eq!(history.last_saved_edit_index(), Some(Some(1)));

	push(&mut history, &mut root, 3);
	push(&mut history, &mut root, 4);
	assert_eq!(history.len(), 3);
	assert_eq!(history.last_saved_edit_index(), Some(Some(0)));

	push(&mut history, &mut root, 5);
	assert_eq!(history.last_saved_edit_index(), Some(None));

	push(&mut history, &mut root, 6);
	assert_eq!(history.last_saved_edit_index(), None);
}

#[test]
fn resize_offer_respects_decline_until_cursor_leaves_cap() {
	let mut root = counter();
	let mut history = EditHistory::new(2);
	push(&mut history, &mut root, 1);

	let state = set_count(&root, 2);
	let pushed = history.push(&mut root, state, &ApplyPolicy::default()).expect("push");
	assert!(pushed.offer_resize);
	assert!(!pushed.evicted);

	history.decline_resize();
	let state = set_count(&root, 3);
	let pushed = history.push(&mut root, state, &ApplyPolicy::default()).expect("push");
	assert!(pushed.evicted);
	assert!(!pushed.offer_resize);

	history.undo(&mut root, &ApplyPolicy::default()).expect("undo");
	assert!(!history.resize_declined());
}

#[test]
fn shrinking_keeps_states_nearest_the_cursor() {
	let mut root = counter();
	let mut history = EditHistory::new(10);
	for v in 1..=6 {
		push(&mut history, &mut root, v);
	}
	history.undo(&mut root, &ApplyPolicy::default()).expect("undo");
	history.undo(&mut root, &ApplyPolicy::default()).expect("undo");
	history.mark_saved();

	history.resize(3);
	assert_eq!(history.len(), 3);
	assert_eq!(history.edit_index(), Some(0));
	assert!(!history.is_dirty());
	assert_eq!(count(&root), Some(4));

	history.undo(&mut root, &ApplyPolicy::default()).expect("undo");
	assert_eq!(count(&root), Some(3));
	assert!(!history.can_undo());

	history.resize(1);
	assert_eq!(history.len(), 1);
	assert_eq!(history.edit_index(), None);
}

#[test]
fn states_compare_descriptors_by_identity() {
	let root = counter();
	let state = set_count(&root, 25);
	assert_eq!(state.clone(), state);
	assert_ne!(set_count(&root, 26), state);

	let lookalike = Arc::new(Descriptor::u16("count").with_default_int(10));
	let rebuilt = EditState {
		desc: lookalike,
		..state.clone()
	};
	assert_ne!(rebuilt, state);

	let mut history = EditHistory::new(10);
	let mut root = root;
	history.push(&mut root, state.clone(), &ApplyPolicy::default()).expect("push");
	assert_eq!(history.peek_undo(), Some(&state));
}
