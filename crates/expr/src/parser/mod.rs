//! # Parser
//!
//! Recursive descent evaluation of arithmetic expressions. Values are
//! computed while parsing; there is no intermediate tree.
//!
//! ## Supported Syntax
//!
//! ```text
//! expr    = term (("+" | "-") term)*
//! term    = unary (("*" | "/" | "//" | "%") unary)*
//! unary   = ("+" | "-") unary | power
//! power   = atom ("**" unary)?
//! atom    = number | name | call | "(" expr ")"
//! call    = name "(" expr ("," expr)* ")"
//! number  = "0x" hex+ | digits ("." digits)? (("e" | "E") ("+" | "-")? digits)?
//! ```
//!
//! `**` binds tighter than a unary minus on its left, so `-2 ** 2` is `-4`.

use crate::builtins;
use crate::error::{ExprError, Result};
use crate::number::Number;

#[cfg(test)]
mod tests;

/// Nesting limit for parentheses, calls and unary chains.
const MAX_DEPTH: usize = 64;

/// Maintains the parser's state for recursive descent parsing.
struct Parser<'a> {
	/// The input not yet consumed.
	input: &'a str,
	/// Current byte position in the original input.
	position: usize,
	depth: usize,
}

impl<'a> Parser<'a> {
	fn new(input: &'a str) -> Self {
		Self {
			input,
			position: 0,
			depth: 0,
		}
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

	fn skip_whitespace(&mut self) {
		while self.peek().is_some_and(char::is_whitespace) {
			self.next();
		}
	}

	/// Consumes `token` (after whitespace) if the input starts with it.
	fn eat(&mut self, token: &str) -> bool {
		self.skip_whitespace();
		if self.input.starts_with(token) {
			self.position += token.len();
			self.input = &self.input[token.len()..];
			true
		} else {
			false
		}
	}

	fn take(&mut self, expected: char) -> Result<()> {
		self.skip_whitespace();
		match self.next() {
			Some(ch) if ch == expected => Ok(()),
			Some(ch) => Err(ExprError::Syntax {
				message: format!("expected '{expected}', found '{ch}'"),
				position: self.position - ch.len_utf8(),
			}),
			None => Err(self.error(format!("expected '{expected}', found end of input"))),
		}
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

	fn error(&self, message: String) -> ExprError {
		ExprError::Syntax {
			message,
			position: self.position,
		}
	}

	fn descend(&mut self) -> Result<()> {
		self.depth += 1;
		if self.depth > MAX_DEPTH {
			return Err(ExprError::TooDeep);
		}
		Ok(())
	}

	fn ascend(&mut self) {
		self.depth -= 1;
	}
}

/// Parses and evaluates `input` in one pass.
pub(crate) fn parse(input: &str) -> Result<Number> {
	let mut parser = Parser::new(input);
	let value = parse_expr(&mut parser)?;
	parser.skip_whitespace();
	if let Some(ch) = parser.peek() {
		return Err(parser.error(format!("unexpected '{ch}'")));
	}
	Ok(value)
}

fn parse_expr(parser: &mut Parser) -> Result<Number> {
	let mut value = parse_term(parser)?;
	loop {
		if parser.eat("+") {
			value = value.add(parse_term(parser)?)?;
		} else if parser.eat("-") {
			value = value.sub(parse_term(parser)?)?;
		} else {
			return Ok(value);
		}
	}
}

fn parse_term(parser: &mut Parser) -> Result<Number> {
	let mut value = parse_unary(parser)?;
	loop {
		if parser.eat("//") {
			value = value.floor_div(parse_unary(parser)?)?;
		} else if parser.input_starts_with_single('*') {
			parser.take('*')?;
			value = value.mul(parse_unary(parser)?)?;
		} else if parser.eat("/") {
			value = value.div(parse_unary(parser)?)?;
		} else if parser.eat("%") {
			value = value.rem(parse_unary(parser)?)?;
		} else {
			return Ok(value);
		}
	}
}

impl Parser<'_> {
	/// `true` when the next token is `ch` alone, not the start of a doubled operator.
	fn input_starts_with_single(&mut self, ch: char) -> bool {
		self.skip_whitespace();
		self.peek() == Some(ch) && self.peek_at(1) != Some(ch)
	}
}

fn parse_unary(parser: &mut Parser) -> Result<Number> {
	parser.descend()?;
	let value = if parser.eat("-") {
		parse_unary(parser).and_then(Number::neg)
	} else if parser.eat("+") {
		parse_unary(parser)
	} else {
		parse_power(parser)
	};
	parser.ascend();
	value
}

fn parse_power(parser: &mut Parser) -> Result<Number> {
	let base = parse_atom(parser)?;
	if parser.eat("**") {
		let exponent = parse_unary(parser)?;
		return base.pow(exponent);
	}
	Ok(base)
}

fn parse_atom(parser: &mut Parser) -> Result<Number> {
	parser.skip_whitespace();
	match parser.peek() {
		Some('(') => {
			parser.take('(')?;
			parser.descend()?;
			let value = parse_expr(parser)?;
			parser.ascend();
			parser.take(')')?;
			Ok(value)
		}
		Some(ch) if ch.is_ascii_digit() || ch == '.' => parse_number(parser),
		Some(ch) if ch.is_ascii_alphabetic() || ch == '_' => parse_name(parser),
		Some(ch) => Err(parser.error(format!("unexpected '{ch}'"))),
		None => Err(parser.error("unexpected end of input".to_string())),
	}
}

fn parse_number(parser: &mut Parser) -> Result<Number> {
	let start = parser.position;
	if parser.peek() == Some('0') && matches!(parser.peek_at(1), Some('x' | 'X')) {
		parser.next();
		parser.next();
		let digits = parser.take_while(|ch| ch.is_ascii_hexdigit() || ch == '_');
		return i128::from_str_radix(&digits.replace('_', ""), 16)
			.map(Number::Int)
			.map_err(|_| ExprError::Syntax {
				message: "malformed hex literal".to_string(),
				position: start,
			});
	}

	let mut text = parser.take_while(|ch| ch.is_ascii_digit() || ch == '_').to_string();
	let mut is_float = false;
	if parser.peek() == Some('.') {
		parser.next();
		text.push('.');
		text.push_str(parser.take_while(|ch| ch.is_ascii_digit()));
		is_float = true;
	}
	if matches!(parser.peek(), Some('e' | 'E'))
		&& (parser.peek_at(1).is_some_and(|ch| ch.is_ascii_digit())
			|| (matches!(parser.peek_at(1), Some('+' | '-')) && parser.peek_at(2).is_some_and(|ch| ch.is_ascii_digit())))
	{
		parser.next();
		text.push('e');
		if let Some(sign @ ('+' | '-')) = parser.peek() {
			parser.next();
			text.push(sign);
		}
		text.push_str(parser.take_while(|ch| ch.is_ascii_digit()));
		is_float = true;
	}

	let text = text.replace('_', "");
	let malformed = || ExprError::Syntax {
		message: format!("malformed number '{text}'"),
		position: start,
	};
	if is_float {
		text.parse::<f64>().map(Number::Float).map_err(|_| malformed())
	} else {
		text.parse::<i128>().map(Number::Int).map_err(|_| malformed())
	}
}

fn parse_name(parser: &mut Parser) -> Result<Number> {
	let start = parser.position;
	let name = parser.take_while(|ch| ch.is_ascii_alphanumeric() || ch == '_');

	if !parser.eat("(") {
		return builtins::constant(name).map(Number::Float).ok_or_else(|| ExprError::UnknownName {
			name: name.to_string(),
			position: start,
		});
	}

	let function = builtins::function(name).ok_or_else(|| ExprError::UnknownName {
		name: name.to_string(),
		position: start,
	})?;
	parser.descend()?;
	let mut args = Vec::new();
	if !parser.eat(")") {
		loop {
			args.push(parse_expr(parser)?);
			if parser.eat(",") {
				continue;
			}
			parser.take(')')?;
			break;
		}
	}
	parser.ascend();
	function.call(&args)
}
