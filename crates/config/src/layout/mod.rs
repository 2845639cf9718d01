//! Descriptors of every config and style version, and the upgraders
//! between them.

use std::sync::Arc;

use binilla_node::Node;
use binilla_persist::{PersistError, VersionedFormat, copy_by_name};
use binilla_schema::{Descriptor, EditorHint, Endian, FlagOption, IntEncoding, SizeSpec, StrEncoding, Visibility};
use bitflags::bitflags;


pub const CONFIG_SIGNATURE: [u8; 4] = *b"CFG!";
pub const CONFIG_VERSION: u32 = 2;
pub const STYLE_SIGNATURE: [u8; 4] = *b"STY!";
pub const STYLE_VERSION: u32 = 2;

bitflags! {
	/// Bits of the config `flags` bool-mask.
	#[derive(Debug, Clone, Copy, PartialEq, Eq)]
	pub(crate) struct SettingFlags: u32 {
		const WRITE_AS_TEMP = 1 << 0;
		const INTEGRITY_TEST = 1 << 1;
		const ENFORCE_MIN = 1 << 2;
		const ENFORCE_MAX = 1 << 3;
		const EVALUATE_ENTRY_FIELDS = 1 << 4;
		const ALLOW_CORRUPT = 1 << 5;
		const SHOW_INVISIBLE = 1 << 6;
		const SHOW_METADATA = 1 << 7;
		const SYNC_OFFSETS_RELATIVE = 1 << 8;
		const SHOW_ALL_BOOLS = 1 << 9;
	}
}

impl SettingFlags {
	pub(crate) const DEFAULT: Self = Self::INTEGRITY_TEST
		.union(Self::ENFORCE_MIN)
		.union(Self::ENFORCE_MAX)
		.union(Self::EVALUATE_ENTRY_FIELDS);
}

bitflags! {
	/// Bits of a font's `flags` bool-mask.
	#[derive(Debug, Clone, Copy, PartialEq, Eq)]
	pub(crate) struct FontFlags: u32 {
		const BOLD = 1 << 0;
		const ITALIC = 1 << 1;
	}
}

/// Names of the style colors, in layout order.
pub(crate) const COLOR_NAMES: [&str; 8] = [
	"default_bg",
	"comment_bg",
	"frame_bg",
	"button",
	"text_normal",
	"text_disabled",
	"text_highlighted",
	"invalid",
];

pub(crate) const DEFAULT_COLORS: [[u8; 3]; 8] = [
	[0xec, 0xe9, 0xd8],
	[0xf5, 0xf5, 0xf5],
	[0xd4, 0xd0, 0xc8],
	[0xc0, 0xc0, 0xc0],
	[0x00, 0x00, 0x00],
	[0x70, 0x70, 0x70],
	[0x33, 0x66, 0xcc],
	[0xcc, 0x33, 0x33],
];

fn le(bits: u8) -> IntEncoding {
	IntEncoding::unsigned(bits, Endian::Little)
}

fn signed(bits: u8) -> IntEncoding {
	IntEncoding::signed(bits, Endian::Little)
}

/// A UTF-8 string sized by a preceding hidden length field.
fn text(name: &str) -> [Descriptor; 2] {
	let len = format!("{name}_len");
	[
		Descriptor::integer(len.clone(), le(16)).with_visibility(Visibility::Metadata),
		Descriptor::string(name, StrEncoding::Utf8, SizeSpec::path(&len)),
	]
}

/// A variable-length array sized by a preceding hidden count field.
fn counted(name: &str, element: Descriptor) -> [Descriptor; 2] {
	let count = format!("{name}_count");
	[
		Descriptor::integer(count.clone(), le(16)).with_visibility(Visibility::Metadata),
		Descriptor::array(name, element, SizeSpec::path(&count)),
	]
}

fn geometry(name: &str) -> Descriptor {
	Descriptor::structure(
		name,
		vec![
			Descriptor::integer("x", signed(32)),
			Descriptor::integer("y", signed(32)),
			Descriptor::integer("width", le(32)).with_default_int(640),
			Descriptor::integer("height", le(32)).with_default_int(480),
		],
	)
}

fn setting_flags(bits: u8, count: usize) -> Descriptor {
	let names = [
		"write_as_temp",
		"integrity_test",
		"enforce_min",
		"enforce_max",
		"evaluate_entry_fields",
		"allow_corrupt",
		"show_invisible",
		"show_metadata",
		"sync_offsets_relative",
		"show_all_bools",
	];
	let options = names
		.iter()
		.take(count)
		.enumerate()
		.map(|(bit, name)| (bit as u8, FlagOption::new(*name)))
		.collect();
	Descriptor::bool_mask("flags", le(bits), options).with_default_int(i128::from(SettingFlags::DEFAULT.bits()))
}

fn recent_path() -> Descriptor {
	Descriptor::structure("recent_path", text("path").into())
}

/// Config layout of version 1.
pub(crate) fn config_v1() -> Arc<Descriptor> {
	let mut fields = vec![
		setting_flags(16, 8),
		Descriptor::integer("undo_limit", le(16)).with_default_int(1000),
		Descriptor::integer("backup_max", le(16)).with_default_int(1),
		geometry("app_window"),
		Descriptor::integer("max_recent", le(16)).with_default_int(20),
	];
	fields.extend(counted("recent_paths", recent_path()));
	Arc::new(Descriptor::structure("config", fields))
}

/// Config layout of the current version.
pub fn config_descriptor() -> Arc<Descriptor> {
	let restore_entry = {
		let mut fields = Vec::new();
		fields.extend(text("descriptor_id"));
		fields.extend(text("path"));
		fields.push(geometry("window"));
		fields.push(Descriptor::bool_mask(
			"state",
			le(8),
			vec![(0, FlagOption::new("minimized"))],
		));
		Descriptor::structure("open_document", fields)
	};
	let hotkey = {
		let mut fields = Vec::new();
		fields.extend(text("combo"));
		fields.extend(text("action"));
		Descriptor::structure("hotkey", fields)
	};

	let mut fields = vec![
		setting_flags(32, 10),
		Descriptor::integer("max_undos", le(32))
			.with_int_bounds(Some(1), None)
			.with_default_int(1000),
		Descriptor::integer("backup_count", le(16)).with_default_int(1),
		Descriptor::integer("backup_interval", le(32)).with_display_name("backup interval (seconds)"),
	];
	fields.extend(text("backup_dir"));
	fields.push(geometry("window"));
	fields.push(Descriptor::integer("max_recent", le(16)).with_default_int(20));
	fields.extend(counted("recent_paths", recent_path()));
	fields.extend(counted("open_documents", restore_entry));
	fields.extend(counted("hotkeys", hotkey));
	Arc::new(Descriptor::structure("config", fields))
}

fn config_v1_to_v2(old: &Node, new: &mut Node) -> binilla_persist::Result<()> {
	copy_by_name(old, new);
	relocate(old, "undo_limit", new, "max_undos")?;
	relocate(old, "backup_max", new, "backup_count")?;
	relocate(old, "app_window", new, "window")?;
	Ok(())
}

/// Format of the config file, versions 1 and 2.
pub fn config_format() -> VersionedFormat {
	VersionedFormat::new(CONFIG_SIGNATURE)
		.version(1, config_v1())
		.version(CONFIG_VERSION, config_descriptor())
		.upgrader(1, config_v1_to_v2)
}

fn color(name: &str, rgb: [u8; 3]) -> Descriptor {
	let channel = |name: &str, value: u8| Descriptor::u8(name).with_default_int(i128::from(value));
	Descriptor::structure(
		name,
		vec![channel("r", rgb[0]), channel("g", rgb[1]), channel("b", rgb[2])],
	)
	.with_hint(EditorHint::Color)
}

fn colors() -> Descriptor {
	Descriptor::structure(
		"colors",
		COLOR_NAMES.iter().zip(DEFAULT_COLORS).map(|(name, rgb)| color(name, rgb)).collect(),
	)
}

fn widths(with_text_height: bool) -> Descriptor {
	let mut fields = vec![
		Descriptor::u16("title_width").with_default_int(300),
		Descriptor::u16("scroll_menu_width").with_default_int(150),
		Descriptor::u16("enum_menu_width").with_default_int(200),
		Descriptor::u16("entry_width").with_default_int(120),
		Descriptor::u16("text_width").with_default_int(400),
	];
	if with_text_height {
		fields.push(Descriptor::u16("text_height").with_default_int(80));
	}
	Descriptor::structure("widths", fields)
}

fn paddings(name: &str) -> Descriptor {
	Descriptor::structure(
		name,
		vec![
			Descriptor::u16("horizontal").with_default_int(10),
			Descriptor::u16("vertical").with_default_int(5),
		],
	)
}

fn font(name: &str, family: &str, size: i128, flags: FontFlags) -> Descriptor {
	let [len, family_field] = text("family");
	let family_len = i128::try_from(family.len()).unwrap_or_default();
	Descriptor::structure(
		name,
		vec![
			len.with_default_int(family_len),
			family_field.with_default(family.into()),
			Descriptor::u8("size").with_default_int(size),
			Descriptor::bool_mask(
				"flags",
				le(8),
				vec![(0, FlagOption::new("bold")), (1, FlagOption::new("italic"))],
			)
			.with_default_int(i128::from(flags.bits())),
		],
	)
}

/// Style layout of version 1.
pub(crate) fn style_v1() -> Arc<Descriptor> {
	Arc::new(Descriptor::structure(
		"style",
		vec![widths(false), paddings("padding"), colors()],
	))
}

/// Style layout of the current version.
pub fn style_descriptor() -> Arc<Descriptor> {
	Arc::new(Descriptor::structure(
		"style",
		vec![
			widths(true),
			paddings("paddings"),
			colors(),
			Descriptor::structure(
				"fonts",
				vec![
					font("default", "sans", 10, FontFlags::empty()),
					font("fixed", "monospace", 10, FontFlags::empty()),
					font("heading", "sans", 12, FontFlags::BOLD),
				],
			),
		],
	))
}

fn style_v1_to_v2(old: &Node, new: &mut Node) -> binilla_persist::Result<()> {
	copy_by_name(old, new);
	relocate(old, "padding", new, "paddings")
}

/// Format of the style file, versions 1 and 2.
pub fn style_format() -> VersionedFormat {
	VersionedFormat::new(STYLE_SIGNATURE)
		.version(1, style_v1())
		.version(STYLE_VERSION, style_descriptor())
		.upgrader(1, style_v1_to_v2)
}

/// Copies the renamed field `from` of `old` into field `to` of `new`.
fn relocate(old: &Node, from: &str, new: &mut Node, to: &str) -> binilla_persist::Result<()> {
	let Some(source) = old.get(from) else {
		return Ok(());
	};
	let target = new.get_mut(to).ok_or_else(|| PersistError::Upgrade {
		from: 1,
		message: format!("'{to}' is missing from the new layout"),
	})?;
	copy_by_name(source, target);
	Ok(())
}
