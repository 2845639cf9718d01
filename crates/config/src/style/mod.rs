//! The typed view of the style document.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use binilla_codec::ParseOptions;
use binilla_node::Node;
use binilla_persist::{SavePlan, SaveReport};
use tracing::{debug, warn};

use crate::error::{ConfigError, Result, io_error};
use crate::layout::{COLOR_NAMES, DEFAULT_COLORS, FontFlags, style_descriptor, style_format};
use crate::view::{field, field_mut, int_as, mask, set_int, set_text, text};


/// An opaque 24-bit color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rgb {
	pub r: u8,
	pub g: u8,
	pub b: u8,
}

impl Rgb {
	pub const fn new(r: u8, g: u8, b: u8) -> Self {
		Self { r, g, b }
	}

	/// Parses `#RGB` or `#RRGGBB`; the leading `#` is optional.
	pub fn parse_hex(value: &str) -> Result<Self> {
		let hex = value.trim().trim_start_matches('#');
		let err = || ConfigError::InvalidColor(format!("#{hex}"));
		if !hex.is_ascii() {
			return Err(err());
		}
		let channel = |digits: &str| u8::from_str_radix(digits, 16).map_err(|_| err());

		match hex.len() {
			3 => Ok(Self::new(
				channel(&hex[0..1].repeat(2))?,
				channel(&hex[1..2].repeat(2))?,
				channel(&hex[2..3].repeat(2))?,
			)),
			6 => Ok(Self::new(channel(&hex[0..2])?, channel(&hex[2..4])?, channel(&hex[4..6])?)),
			_ => Err(err()),
		}
	}

	fn read(node: &Node) -> Result<Self> {
		Ok(Self::new(int_as(node, "r")?, int_as(node, "g")?, int_as(node, "b")?))
	}

	fn write(self, node: &mut Node) -> Result<()> {
		set_int(node, "r", self.r)?;
		set_int(node, "g", self.g)?;
		set_int(node, "b", self.b)
	}
}

impl fmt::Display for Rgb {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
	}
}

impl FromStr for Rgb {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self> {
		Self::parse_hex(s)
	}
}

impl From<[u8; 3]> for Rgb {
	fn from([r, g, b]: [u8; 3]) -> Self {
		Self::new(r, g, b)
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Font {
	pub family: String,
	pub size: u8,
	pub bold: bool,
	pub italic: bool,
}

impl Font {
	fn new(family: &str, size: u8, bold: bool) -> Self {
		Self {
			family: family.to_string(),
			size,
			bold,
			italic: false,
		}
	}

	fn read(node: &Node) -> Result<Self> {
		let flags: FontFlags = mask(node, "flags")?;
		Ok(Self {
			family: text(node, "family")?,
			size: int_as(node, "size")?,
			bold: flags.contains(FontFlags::BOLD),
			italic: flags.contains(FontFlags::ITALIC),
		})
	}

	fn write(&self, node: &mut Node) -> Result<()> {
		let mut flags = FontFlags::empty();
		flags.set(FontFlags::BOLD, self.bold);
		flags.set(FontFlags::ITALIC, self.italic);
		set_text(node, "family", &self.family)?;
		set_int(node, "size", self.size)?;
		set_int(node, "flags", flags.bits())
	}
}

/// Widths, in pixels, of the standard field widgets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Widths {
	pub title: u16,
	pub scroll_menu: u16,
	pub enum_menu: u16,
	pub entry: u16,
	pub text: u16,
	pub text_height: u16,
}

impl Default for Widths {
	fn default() -> Self {
		Self {
			title: 300,
			scroll_menu: 150,
			enum_menu: 200,
			entry: 120,
			text: 400,
			text_height: 80,
		}
	}
}

const WIDTH_FIELDS: [&str; 6] = [
	"title_width",
	"scroll_menu_width",
	"enum_menu_width",
	"entry_width",
	"text_width",
	"text_height",
];

impl Widths {
	fn slots(&mut self) -> [&mut u16; 6] {
		[
			&mut self.title,
			&mut self.scroll_menu,
			&mut self.enum_menu,
			&mut self.entry,
			&mut self.text,
			&mut self.text_height,
		]
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Padding {
	pub horizontal: u16,
	pub vertical: u16,
}

impl Default for Padding {
	fn default() -> Self {
		Self {
			horizontal: 10,
			vertical: 5,
		}
	}
}

/// Everything the style document stores.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Style {
	pub widths: Widths,
	pub padding: Padding,
	colors: [Rgb; COLOR_NAMES.len()],
	pub default_font: Font,
	pub fixed_font: Font,
	pub heading_font: Font,
}

impl Default for Style {
	fn default() -> Self {
		Self {
			widths: Widths::default(),
			padding: Padding::default(),
			colors: DEFAULT_COLORS.map(Rgb::from),
			default_font: Font::new("sans", 10, false),
			fixed_font: Font::new("monospace", 10, false),
			heading_font: Font::new("sans", 12, true),
		}
	}
}

impl Style {
	/// Names of the colors a style defines, in layout order.
	pub fn color_names() -> &'static [&'static str] {
		&COLOR_NAMES
	}

	pub fn color(&self, name: &str) -> Option<Rgb> {
		COLOR_NAMES.iter().position(|n| *n == name).map(|i| self.colors[i])
	}

	pub fn set_color(&mut self, name: &str, rgb: Rgb) -> Result<()> {
		let index = COLOR_NAMES
			.iter()
			.position(|n| *n == name)
			.ok_or_else(|| ConfigError::MissingField(format!("colors.{name}")))?;
		self.colors[index] = rgb;
		Ok(())
	}

	pub fn from_node(root: &Node) -> Result<Self> {
		let mut widths = Widths::default();
		let width_node = field(root, "widths")?;
		for (slot, name) in widths.slots().into_iter().zip(WIDTH_FIELDS) {
			*slot = int_as(width_node, name)?;
		}

		let padding_node = field(root, "paddings")?;
		let padding = Padding {
			horizontal: int_as(padding_node, "horizontal")?,
			vertical: int_as(padding_node, "vertical")?,
		};

		let color_node = field(root, "colors")?;
		let mut colors = DEFAULT_COLORS.map(Rgb::from);
		for (color, name) in colors.iter_mut().zip(COLOR_NAMES) {
			*color = Rgb::read(field(color_node, name)?)?;
		}

		let fonts = field(root, "fonts")?;
		Ok(Self {
			widths,
			padding,
			colors,
			default_font: Font::read(field(fonts, "default")?)?,
			fixed_font: Font::read(field(fonts, "fixed")?)?,
			heading_font: Font::read(field(fonts, "heading")?)?,
		})
	}

	pub fn write_node(&self, root: &mut Node) -> Result<()> {
		let mut widths = self.widths;
		let width_node = field_mut(root, "widths")?;
		for (slot, name) in widths.slots().into_iter().zip(WIDTH_FIELDS) {
			set_int(width_node, name, *slot)?;
		}

		let padding_node = field_mut(root, "paddings")?;
		set_int(padding_node, "horizontal", self.padding.horizontal)?;
		set_int(padding_node, "vertical", self.padding.vertical)?;

		let color_node = field_mut(root, "colors")?;
		for (color, name) in self.colors.iter().zip(COLOR_NAMES) {
			color.write(field_mut(color_node, name)?)?;
		}

		let fonts = field_mut(root, "fonts")?;
		self.default_font.write(field_mut(fonts, "default")?)?;
		self.fixed_font.write(field_mut(fonts, "fixed")?)?;
		self.heading_font.write(field_mut(fonts, "heading")?)?;

		root.sync_all_sizes();
		Ok(())
	}
}

/// Loads the style at `path`, upgrading older versions.
///
/// Style is presentational, so a missing or unreadable file is never an
/// error: it logs and falls back to the defaults.
pub fn load_style(path: &Path) -> (Style, Node) {
	let format = style_format();
	let loaded = std::fs::read(path)
		.map_err(|source| io_error(path, source))
		.and_then(|bytes| Ok(format.load(&bytes, &ParseOptions::default())?))
		.and_then(|loaded| Ok((Style::from_node(&loaded.root)?, loaded.root)));

	match loaded {
		Ok(style) => style,
		Err(e) => {
			if path.exists() {
				warn!(path = %path.display(), error = %e, "unreadable style, using defaults");
			} else {
				debug!(path = %path.display(), "no style file, using defaults");
			}
			default_style()
		}
	}
}

fn default_style() -> (Style, Node) {
	let style = Style::default();
	let mut root = Node::default_tree(&style_descriptor());
	if let Err(e) = style.write_node(&mut root) {
		warn!(error = %e, "default style does not fit its layout");
	}
	(style, root)
}

/// Writes `style` into `root` and saves it through `plan`.
pub fn save_style(plan: &SavePlan, style: &Style, root: &mut Node) -> Result<SaveReport> {
	style.write_node(root)?;
	Ok(style_format().save(plan, root)?)
}
