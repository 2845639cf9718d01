//! # Combo
//!
//! Parsing of plain-text hotkey combos such as `"ctrl+s"` or `"Ctrl-Shift-Z"`
//! into a [`Combo`], and its canonical string form.
//!
//! ## Supported Syntax
//!
//! ```text
//! combo     = (modifier sep)* key
//! sep       = "+" | "-"
//! modifier  = "ctrl" | "control" | "alt" | "option" | "shift" | "super" | "cmd" | "meta" | "win"
//! key       = fn-key | named-key | char
//! fn-key    = "f" digit digit?
//! named-key = "tab" | "return" | "escape" | "delete" | "pageup" | ...
//! char      = printable ascii
//! ```
//!
//! Matching is case-insensitive. The canonical form lists modifiers as
//! `ctrl+alt+shift+super` followed by the lowercase key.

use std::fmt;
use std::str::FromStr;

use bitflags::bitflags;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ParseError;


bitflags! {
	/// Modifier keys held for a combo.
	#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
	pub struct Modifiers: u8 {
		const CTRL = 1 << 0;
		const ALT = 1 << 1;
		const SHIFT = 1 << 2;
		const SUPER = 1 << 3;
	}
}

/// Modifiers in canonical order with their canonical names.
const MODIFIER_ORDER: [(Modifiers, &str); 4] = [
	(Modifiers::CTRL, "ctrl"),
	(Modifiers::ALT, "alt"),
	(Modifiers::SHIFT, "shift"),
	(Modifiers::SUPER, "super"),
];

/// Named keys and the canonical name each one normalizes to.
const NAMED_KEYS: &[(&str, &str)] = &[
	("backspace", "backspace"),
	("tab", "tab"),
	("return", "return"),
	("enter", "return"),
	("escape", "escape"),
	("esc", "escape"),
	("space", "space"),
	("delete", "delete"),
	("del", "delete"),
	("insert", "insert"),
	("home", "home"),
	("end", "end"),
	("pageup", "pageup"),
	("prior", "pageup"),
	("pagedown", "pagedown"),
	("next", "pagedown"),
	("up", "up"),
	("down", "down"),
	("left", "left"),
	("right", "right"),
	("plus", "plus"),
	("minus", "minus"),
	("ctrl", "ctrl"),
	("control", "ctrl"),
	("alt", "alt"),
	("shift", "shift"),
	("super", "super"),
];

fn modifier_named(name: &str) -> Option<Modifiers> {
	match name.to_ascii_lowercase().as_str() {
		"ctrl" | "control" => Some(Modifiers::CTRL),
		"alt" | "option" => Some(Modifiers::ALT),
		"shift" => Some(Modifiers::SHIFT),
		"super" | "cmd" | "meta" | "win" => Some(Modifiers::SUPER),
		_ => None,
	}
}

/// A parsed hotkey combo: held modifiers plus one normalized key token.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Combo {
	pub modifiers: Modifiers,
	key: String,
}

impl Combo {
	/// Builds a combo from a key token, normalizing it.
	///
	/// # Errors
	///
	/// Returns a [`ParseError`] if `key` is not a valid key token.
	pub fn new(modifiers: Modifiers, key: &str) -> Result<Self, ParseError> {
		let mut parser = Parser::new(key);
		let key = parse_key(&mut parser)?;
		parser.expect_end()?;
		Ok(Self { modifiers, key })
	}

	/// The normalized key token.
	pub fn key(&self) -> &str {
		&self.key
	}
}

impl fmt::Display for Combo {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		for (modifier, name) in MODIFIER_ORDER {
			if self.modifiers.contains(modifier) {
				write!(f, "{name}+")?;
			}
		}
		f.write_str(&self.key)
	}
}

impl FromStr for Combo {
	type Err = ParseError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		parse(s)
	}
}

impl Serialize for Combo {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		serializer.collect_str(self)
	}
}

impl<'de> Deserialize<'de> for Combo {
	fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		let s = String::deserialize(deserializer)?;
		parse(&s).map_err(|e| D::Error::custom(format!("invalid combo '{s}': {e}")))
	}
}

/// Maintains the parser's state for recursive descent parsing.
struct Parser<'a> {
	/// The input not yet consumed.
	input: &'a str,
	/// Current byte position in the original input.
	position: usize,
}

impl<'a> Parser<'a> {
	fn new(input: &'a str) -> Self {
		Self { input, position: 0 }
	}

	fn peek(&self) -> Option<char> {
		self.input.chars().next()
	}

	fn peek_at(&self, n: usize) -> Option<char> {
		self.input.chars().nth(n)
	}

	fn next(&mut self) -> Option<char> {
		let ch = self.peek()?;
		self.position += ch.len_utf8();
		self.input = &self.input[ch.len_utf8()..];
		Some(ch)
	}

	fn is_end(&self) -> bool {
		self.input.is_empty()
	}

	/// Restores the parser state if `f` does not produce a value.
	fn try_parse<T, F>(&mut self, f: F) -> Option<T>
	where
		F: FnOnce(&mut Parser<'a>) -> Option<T>,
	{
		let snapshot = (self.input, self.position);
		let parsed = f(self);
		if parsed.is_none() {
			(self.input, self.position) = snapshot;
		}
		parsed
	}

	fn take_while<F>(&mut self, predicate: F) -> &'a str
	where
		F: Fn(char) -> bool,
	{
		let len = self.input.find(|ch| !predicate(ch)).unwrap_or(self.input.len());
		let (taken, rest) = self.input.split_at(len);
		self.position += len;
		self.input = rest;
		taken
	}

	fn expect_end(&self) -> Result<(), ParseError> {
		match self.peek() {
			None => Ok(()),
			Some(ch) => Err(self.error(format!("expected end of input, found '{ch}'"))),
		}
	}

	fn error(&self, message: String) -> ParseError {
		ParseError {
			message,
			position: self.position,
		}
	}
}

/// Parses a combo string.
///
/// # Errors
///
/// Returns a [`ParseError`] if the input does not match the combo grammar,
/// or names the same modifier twice.
///
/// # Examples
///
/// ```
/// use binilla_keymap::{Modifiers, parse};
///
/// let combo = parse("Shift-Ctrl-S").unwrap();
/// assert_eq!(combo.modifiers, Modifiers::CTRL | Modifiers::SHIFT);
/// assert_eq!(combo.to_string(), "ctrl+shift+s");
/// ```
pub fn parse(s: &str) -> Result<Combo, ParseError> {
	let mut parser = Parser::new(s);
	let mut modifiers = Modifiers::empty();

	while let Some((modifier, start)) = try_parse_modifier(&mut parser) {
		if modifiers.contains(modifier) {
			return Err(ParseError {
				message: "modifier given twice".to_string(),
				position: start,
			});
		}
		modifiers |= modifier;
	}

	let key = parse_key(&mut parser)?;
	parser.expect_end()?;
	Ok(Combo { modifiers, key })
}

/// Parses `s` and returns its canonical string form.
///
/// # Errors
///
/// Returns a [`ParseError`] under the same conditions as [`parse`].
pub fn normalize(s: &str) -> Result<String, ParseError> {
	parse(s).map(|combo| combo.to_string())
}

/// Attempts to parse a modifier name followed by a separator.
///
/// A modifier name not followed by a separator is left for the key parser,
/// so a bare `"shift"` binds the shift key itself.
fn try_parse_modifier(parser: &mut Parser) -> Option<(Modifiers, usize)> {
	parser.try_parse(|p| {
		let start = p.position;
		let modifier = modifier_named(p.take_while(|ch| ch.is_ascii_alphabetic()))?;
		match p.next() {
			Some('+' | '-') if !p.is_end() => Some((modifier, start)),
			_ => None,
		}
	})
}

fn parse_key(parser: &mut Parser) -> Result<String, ParseError> {
	if let Some(key) = try_parse_fn_key(parser)? {
		return Ok(key);
	}
	if let Some(key) = parser.try_parse(try_parse_named_key) {
		return Ok(key);
	}
	match parser.peek() {
		Some(ch) if ch.is_ascii_graphic() => {
			parser.next();
			Ok(ch.to_ascii_lowercase().to_string())
		}
		Some(ch) => Err(parser.error(format!("'{}' is not a valid key", ch.escape_default()))),
		None => Err(parser.error("expected a key".to_string())),
	}
}

/// Attempts to parse a function key (`"f1"` to `"f35"`).
///
/// Only activates when the input starts with `f` followed by a digit. Once
/// activated, the digits must form a valid function key number.
fn try_parse_fn_key(parser: &mut Parser) -> Result<Option<String>, ParseError> {
	if !matches!(parser.peek(), Some('f' | 'F')) || !parser.peek_at(1).is_some_and(|ch| ch.is_ascii_digit()) {
		return Ok(None);
	}

	let start = parser.position;
	parser.next();
	let digits = parser.take_while(|ch| ch.is_ascii_digit());
	match digits.parse::<u8>() {
		Ok(n) if (1..=35).contains(&n) => Ok(Some(format!("f{n}"))),
		_ => Err(ParseError {
			message: "invalid function key number (must be 1-35)".to_string(),
			position: start,
		}),
	}
}

fn try_parse_named_key(parser: &mut Parser) -> Option<String> {
	let name = parser.take_while(|ch| ch.is_ascii_alphabetic());
	if name.len() < 2 {
		return None;
	}
	let name = name.to_ascii_lowercase();
	NAMED_KEYS
		.iter()
		.find(|(alias, _)| *alias == name)
		.map(|(_, canonical)| canonical.to_string())
}
