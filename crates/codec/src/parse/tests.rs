use std::sync::Arc;

use binilla_node::{Node, TreePath};
use binilla_schema::{Descriptor, Endian, IntEncoding, SizeSpec, StrEncoding, Value};
use pretty_assertions::assert_eq;

use super::{ParseOptions, parse};
use crate::{CodecError, XorAdapter, serialize};

fn record() -> Arc<Descriptor> {
	Arc::new(Descriptor::structure(
		"record",
		vec![
			Descriptor::u8("count"),
			Descriptor::array("values", Descriptor::u16("value"), SizeSpec::path("count")),
			Descriptor::string("label", StrEncoding::Ascii, SizeSpec::Fixed(6)),
			Descriptor::pad(2),
		],
	))
}

fn strict() -> ParseOptions {
	ParseOptions::default()
}

#[test]
fn size_path_reads_already_parsed_sibling() {
	let bytes = [2, 0x01, 0x00, 0x02, 0x01, b'a', b'b', 0, 0, 0, 0, 0xff, 0xff];
	let outcome = parse(&record(), &bytes, &strict()).expect("parse");
	let root = outcome.root;

	assert!(outcome.diagnostic.is_none());
	let values: Vec<i128> = root.get("values").expect("values").children().iter().filter_map(Node::int).collect();
	assert_eq!(values, vec![1, 0x0102]);
	assert_eq!(root.get("label").and_then(Node::value), Some(&Value::Str("ab".into())));
}

#[test]
fn fixed_strings_are_nul_padded_on_write() {
	let bytes = [1, 0x05, 0x00, b'x', 0, 0, 0, 0, 0, 0, 0];
	let root = parse(&record(), &bytes, &strict()).expect("parse").root;

	assert_eq!(serialize(&root), Ok(bytes.to_vec()));
}

#[test]
fn truncated_input_reports_offset_and_path() {
	let bytes = [3, 0x01, 0x00, 0x02];
	let err = parse(&record(), &bytes, &strict()).unwrap_err();

	assert_eq!(
		err,
		CodecError::UnexpectedEof {
			path: TreePath::from([1]),
			offset: 1,
			needed: 6,
			available: 3,
		}
	);
}

#[test]
fn allow_corrupt_keeps_partial_tree() {
	let bytes = [1, 0x07, 0x00, b'h', b'i'];
	let options = ParseOptions { allow_corrupt: true };
	let outcome = parse(&record(), &bytes, &options).expect("partial tree");

	assert!(outcome.is_corrupt());
	assert_eq!(outcome.diagnostic.as_ref().and_then(CodecError::path), Some(&TreePath::from([2])));
	assert_eq!(outcome.root.at(&[1, 0]).and_then(Node::int), Some(7));
	assert_eq!(outcome.root.get("label").and_then(Node::value), Some(&Value::Str(String::new())));
}

#[test]
fn union_case_comes_from_neighbor() {
	let u8le = IntEncoding::unsigned(8, Endian::Little);
	let desc = Arc::new(Descriptor::structure(
		"tagged",
		vec![
			Descriptor::integer("kind", u8le),
			Descriptor::union(
				"body",
				4,
				Some("kind"),
				vec![(0, Descriptor::u32("number")), (1, Descriptor::raw("blob", SizeSpec::Fixed(2)))],
			),
		],
	));

	let root = parse(&desc, &[0, 0x2a, 0, 0, 0], &strict()).expect("parse").root;
	assert_eq!(root.at(&[1]).and_then(Node::union_case), Some(Some(0)));
	assert_eq!(root.at(&[1, 0]).and_then(Node::int), Some(42));

	let root = parse(&desc, &[1, 0xaa, 0xbb, 0xcc, 0xdd], &strict()).expect("parse").root;
	assert_eq!(root.at(&[1, 0]).and_then(Node::value), Some(&Value::Bytes(vec![0xaa, 0xbb])));
	assert_eq!(serialize(&root), Ok(vec![1, 0xaa, 0xbb, 0, 0]));

	let root = parse(&desc, &[9, 1, 2, 3, 4], &strict()).expect("parse").root;
	assert_eq!(root.at(&[1]).and_then(Node::union_case), Some(None));
	assert_eq!(serialize(&root), Ok(vec![9, 1, 2, 3, 4]));
}

#[test]
fn stream_payload_passes_through_adapter() {
	let desc = Arc::new(Descriptor::structure(
		"wrapped",
		vec![Descriptor::stream(
			"secret",
			SizeSpec::Remainder,
			Arc::new(XorAdapter::new(vec![0xff])),
			Descriptor::structure("inner", vec![Descriptor::u16("a"), Descriptor::u8("b")]),
		)],
	));

	let root = parse(&desc, &[0xfe, 0xff, 0xfd], &strict()).expect("parse").root;
	assert_eq!(root.at(&[0, 0, 0]).and_then(Node::int), Some(1));
	assert_eq!(root.at(&[0, 0, 1]).and_then(Node::int), Some(2));
	assert_eq!(serialize(&root), Ok(vec![0xfe, 0xff, 0xfd]));
}

#[test]
fn remainder_sized_raw_bytes_take_the_rest() {
	let desc = Arc::new(Descriptor::structure(
		"blob",
		vec![Descriptor::u8("version"), Descriptor::raw("data", SizeSpec::Remainder)],
	));

	let root = parse(&desc, &[3, 9, 8, 7], &strict()).expect("parse").root;
	assert_eq!(root.get("data").and_then(Node::value), Some(&Value::Bytes(vec![9, 8, 7])));
}

#[test]
fn invalid_text_is_an_encoding_error() {
	let desc = Arc::new(Descriptor::string("name", StrEncoding::Ascii, SizeSpec::Fixed(2)));
	let err = parse(&desc, &[b'a', 0x80], &strict()).unwrap_err();

	assert!(matches!(err, CodecError::Encoding { offset: 0, .. }));
}

#[test]
fn oversized_fixed_string_does_not_serialize() {
	let mut root = Node::default_tree(&record());
	root.get_mut("label")
		.expect("label")
		.set_value(Value::Str("too long".into()))
		.expect("value");

	let err = serialize(&root).unwrap_err();
	assert_eq!(
		err,
		CodecError::SizeMismatch {
			path: TreePath::from([2]),
			declared: 6,
			actual: 8,
		}
	);
}
