use std::sync::Arc;

use binilla_history::{ApplyPolicy, Change, EditHistory, EditState};
use binilla_node::{CountLimits, Node, TreePath};
use binilla_schema::{Descriptor, Endian, FlagOption, IntEncoding, Shape, SizeSpec, Value};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Op {
	Set(usize, u16),
	Toggle(u8),
	Add(u16),
	Insert(usize, u16),
	Duplicate(usize),
	Delete(usize),
	ShiftUp(usize),
	DeleteAll,
}

fn op() -> impl Strategy<Value = Op> {
	prop_oneof![
		(0..8usize, any::<u16>()).prop_map(|(i, v)| Op::Set(i, v)),
		(0..8u8).prop_map(Op::Toggle),
		any::<u16>().prop_map(Op::Add),
		(0..8usize, any::<u16>()).prop_map(|(i, v)| Op::Insert(i, v)),
		(0..8usize).prop_map(Op::Duplicate),
		(0..8usize).prop_map(Op::Delete),
		(1..8usize).prop_map(Op::ShiftUp),
		Just(Op::DeleteAll),
	]
}

fn document() -> Node {
	let u8le = IntEncoding::unsigned(8, Endian::Little);
	let options = (0..8).map(|bit| (bit, FlagOption::new(format!("bit{bit}")))).collect();
	let desc = Arc::new(Descriptor::structure(
		"doc",
		vec![
			Descriptor::u8("count"),
			Descriptor::array("values", Descriptor::u16("value"), SizeSpec::path("count")).with_counts(0, 6),
			Descriptor::bool_mask("flags", u8le, options),
		],
	));
	Node::default_tree(&desc)
}

/// Turns `op` into a state valid for the current tree, if it applies at all.
fn state_for(root: &Node, op: &Op) -> Option<EditState> {
	let values_at = TreePath::from([1]);
	let values = root.try_at(&values_at).ok()?;
	let Shape::Array { element, .. } = &values.desc().shape else {
		return None;
	};
	let len = values.len();
	let element_node = |v: u16| Node::scalar(element.clone(), Value::Int(i128::from(v)));
	let on_values = |change| EditState::new(&values_at, values.desc().clone(), change);

	match *op {
		Op::Set(i, v) if i < len => {
			let target = values_at.child(i);
			let node = root.try_at(&target).ok()?;
			let change = Change::ScalarSet {
				undo: node.value()?.clone(),
				redo: Value::Int(i128::from(v)),
			};
			EditState::new(&target, node.desc().clone(), change)
		}
		Op::Toggle(bit) => {
			let target = TreePath::from([2]);
			let node = root.try_at(&target).ok()?;
			let mask = 1u64 << bit;
			let current = node.int()? & i128::from(mask) != 0;
			let change = Change::BoolSet {
				mask,
				undo: current,
				redo: !current,
			};
			EditState::new(&target, node.desc().clone(), change)
		}
		Op::Add(v) => on_values(Change::ArrayAdd { node: element_node(v) }),
		Op::Insert(i, v) if i <= len => on_values(Change::ArrayInsert {
			index: i,
			node: element_node(v),
		}),
		Op::Duplicate(i) if i < len => on_values(Change::ArrayDuplicate {
			index: i,
			node: values.child(i)?.clone(),
		}),
		Op::Delete(i) if i < len => on_values(Change::ArrayDelete {
			index: i,
			node: values.child(i)?.clone(),
		}),
		Op::ShiftUp(i) if i < len => on_values(Change::ArrayShiftUp { index: i }),
		Op::DeleteAll => on_values(Change::ArrayDeleteAll {
			nodes: values.children().to_vec(),
		}),
		_ => None,
	}
}

proptest! {
	#[test]
	fn undoing_everything_restores_the_original(ops in prop::collection::vec(op(), 1..40)) {
		let policy = ApplyPolicy { limits: CountLimits::ENFORCED };
		let mut root = document();
		let original = root.clone();
		let mut history = EditHistory::new(100);

		for op in &ops {
			if let Some(state) = state_for(&root, op) {
				let before = root.clone();
				if history.push(&mut root, state, &policy).is_err() {
					prop_assert_eq!(&root, &before);
				}
			}
		}
		let edited = root.clone();
		let applied = history.len();

		for _ in 0..applied {
			prop_assert!(history.undo(&mut root, &policy).expect("undo").is_some());
		}
		prop_assert_eq!(root.first_difference(&original), None);
		prop_assert!(!history.is_dirty());

		for _ in 0..applied {
			prop_assert!(history.redo(&mut root, &policy).expect("redo").is_some());
		}
		prop_assert_eq!(root.first_difference(&edited), None);
	}
}
