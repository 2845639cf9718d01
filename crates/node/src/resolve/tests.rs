use std::sync::Arc;

use binilla_schema::{
	Descriptor, DynNamePath, Endian, EnumOption, IntEncoding, NodePath, PathError, Shape, SizeSpec, StrEncoding, UnitScale, Value,
};
use pretty_assertions::assert_eq;

use crate::{CountLimits, Node, TreePath};

fn scene() -> Arc<Descriptor> {
	let u8le = IntEncoding::unsigned(8, Endian::Little);
	let node = Descriptor::structure(
		"node",
		vec![
			Descriptor::string("name", StrEncoding::Ascii, SizeSpec::Fixed(8)),
			Descriptor::enumeration("kind", u8le, vec![EnumOption::new(0, "leaf"), EnumOption::new(1, "branch")]),
		],
	);
	Arc::new(Descriptor::structure(
		"root",
		vec![
			Descriptor::u16("node_count"),
			Descriptor::array("nodes", node, SizeSpec::path("node_count")).with_dynamic_name("name"),
			Descriptor::dynamic_enum("selected", u8le, "nodes/[DYN_I]/name"),
			Descriptor::f32("scale"),
			Descriptor::i32("offset").with_unit_scale(UnitScale::Neighbor(NodePath::lit("scale"))),
		],
	))
}

fn populated() -> Node {
	let desc = scene();
	let mut root = Node::default_tree(&desc);
	let Shape::Array { element, .. } = &desc.fields()[1].shape else {
		panic!("nodes is an array");
	};
	let element = Node::default_for(element);
	for (name, kind) in [("alpha", 0), ("beta", 1)] {
		let mut e = element.clone();
		e.get_mut("name").expect("name").set_value(Value::Str(name.into())).expect("name");
		e.get_mut("kind").expect("kind").set_value(Value::Int(kind)).expect("kind");
		root.get_mut("nodes")
			.expect("nodes")
			.append(e, CountLimits::ENFORCED)
			.expect("append");
	}
	root.sync_all_sizes();
	root
}

#[test]
fn neighbor_resolves_from_parent() {
	let root = populated();
	let at = TreePath::from([1]);

	assert_eq!(root.neighbor(&at, &NodePath::lit("node_count")), Ok(TreePath::from([0])));
	assert_eq!(root.neighbor_node(&at, &NodePath::lit("node_count")).ok().and_then(Node::int), Some(2));
}

#[test]
fn resolve_walks_parents_and_indices() {
	let root = populated();
	let name_of_second = root.resolve(&TreePath::from([1, 0, 0]), &NodePath::lit("../../[1]/name"));

	assert_eq!(name_of_second, Ok(TreePath::from([1, 1, 0])));
}

#[test]
fn unresolvable_path_is_a_value_not_a_panic() {
	let root = populated();

	let err = root.neighbor(&TreePath::from([1]), &NodePath::lit("missing")).unwrap_err();
	assert_eq!(
		err,
		PathError::NoSuchPath {
			path: "missing".into(),
			step: 0
		}
	);
	assert!(root.resolve(&TreePath::root(), &NodePath::lit("..")).is_err());
	assert!(root.resolve(&TreePath::root(), &NodePath::lit("nodes/[5]")).is_err());
}

#[test]
fn array_names_come_from_element_fields() {
	let root = populated();
	let at = TreePath::from([1]);
	let names = root.dynamic_names(&at, &DynNamePath::lit("name")).expect("names");

	assert_eq!(names, vec![Some("alpha".to_string()), Some("beta".to_string())]);
}

#[test]
fn dynamic_enum_source_names_neighbor_array() {
	let root = populated();
	let at = TreePath::from([2]);
	let names = root.dynamic_names(&at, &DynNamePath::lit("nodes/[DYN_I]/kind")).expect("names");

	assert_eq!(names, vec![Some("leaf".to_string()), Some("branch".to_string())]);
}

#[test]
fn dynamic_names_on_non_array_is_wrong_kind() {
	let root = populated();
	let err = root.dynamic_names(&TreePath::from([2]), &DynNamePath::lit("scale/[DYN_I]/name")).unwrap_err();

	assert!(matches!(err, PathError::WrongKind { expected: "array", .. }));
}

#[test]
fn unit_scale_reads_neighbor_and_rejects_zero() {
	let mut root = populated();
	let offset = TreePath::from([4]);
	assert_eq!(root.unit_scale_at(&offset), None);

	root.get_mut("scale").expect("scale").set_value(Value::Float(0.5)).expect("scale");
	assert_eq!(root.unit_scale_at(&offset), Some(0.5));
}
