//! Parser for Valve's textual "VDF" key/value/nested-block configuration
//! format (spec.md §6), grounded on the `shlex`-based tokenizer in
//! `original_source/src/config.py`'s `vdf2json`. Unlike that function (which
//! only re-serializes text to JSON), this builds a queryable tree directly.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ParseError {
	#[error("{line}:{column}: unexpected end of input inside a block")]
	UnterminatedBlock { line: usize, column: usize },
	#[error("{line}:{column}: expected a value or '{{' after key {key:?}")]
	MissingValue { line: usize, column: usize, key: String },
	#[error("{line}:{column}: unexpected '}}' with no matching '{{'")]
	UnmatchedClose { line: usize, column: usize },
	#[error("malformed token stream: {0}")]
	Lex(String),
}

/// A VDF value: either a leaf string or a nested block.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
	Str(String),
	Dict(Node),
}

impl Value {
	pub fn as_str(&self) -> Option<&str> {
		match self {
			Value::Str(s) => Some(s),
			Value::Dict(_) => None,
		}
	}

	pub fn as_dict(&self) -> Option<&Node> {
		match self {
			Value::Dict(n) => Some(n),
			Value::Str(_) => None,
		}
	}
}

/// An ordered key/value multimap: VDF permits repeated keys at the same
/// level, and the binding compiler's tie-break rule (spec.md §4.5) needs to
/// see every occurrence, not just the last.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Node {
	entries: Vec<(String, Value)>,
}

impl Node {
	fn push(&mut self, key: String, value: Value) {
		self.entries.push((key, value));
	}

	/// The first value bound to `key`, case-insensitively (VDF keys are
	/// conventionally lowercase but profiles in the wild are inconsistent).
	pub fn get(&self, key: &str) -> Option<&Value> {
		self.entries
			.iter()
			.find(|(k, _)| k.eq_ignore_ascii_case(key))
			.map(|(_, v)| v)
	}

	/// Every value bound to `key`, in document order (spec.md §4.5's
	/// duplicate-key tie-break: "the upstream parser joins them into
	/// ordered arrays").
	pub fn get_all<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a Value> + 'a {
		self.entries
			.iter()
			.filter(move |(k, _)| k.eq_ignore_ascii_case(key))
			.map(|(_, v)| v)
	}

	pub fn get_dict(&self, key: &str) -> Option<&Node> {
		self.get(key).and_then(Value::as_dict)
	}

	pub fn get_str(&self, key: &str) -> Option<&str> {
		self.get(key).and_then(Value::as_str)
	}

	pub fn iter(&self) -> impl Iterator<Item = &(String, Value)> {
		self.entries.iter()
	}
}

/// Split raw VDF text into tokens, keeping `{`/`}` as standalone tokens and
/// quoted strings intact, the way `shlex.shlex` does in the source with
/// braces added to its word-break characters.
fn tokenize(input: &str) -> Result<Vec<(String, usize, usize)>, ParseError> {
	let mut spaced = String::with_capacity(input.len());
	let mut in_quotes = false;
	let mut escaped = false;
	for c in input.chars() {
		match c {
			'"' if !escaped => {
				in_quotes = !in_quotes;
				spaced.push(c);
			},
			'{' | '}' if !in_quotes => {
				spaced.push(' ');
				spaced.push(c);
				spaced.push(' ');
			},
			'\\' if in_quotes && !escaped => {
				escaped = true;
				spaced.push(c);
				continue;
			},
			_ => spaced.push(c),
		}
		escaped = false;
	}

	let mut tokens = Vec::new();
	let mut line = 1usize;
	let mut column = 1usize;
	let mut lexer = shlex::Shlex::new(&spaced);
	// shlex::Shlex doesn't track position, so we re-scan `spaced` in lockstep
	// to attribute each token to a line/column for diagnostics.
	let mut cursor = spaced.as_str();
	for token in lexer.by_ref() {
		if let Some(offset) = cursor.find(&token) {
			for c in cursor[..offset].chars() {
				if c == '\n' {
					line += 1;
					column = 1;
				} else {
					column += 1;
				}
			}
			cursor = &cursor[offset + token.len()..];
		}
		tokens.push((token, line, column));
	}
	if lexer.had_error {
		return Err(ParseError::Lex("unterminated quoted string".to_string()));
	}
	Ok(tokens)
}

/// Parse a full VDF document into its root [`Node`].
pub fn parse(input: &str) -> Result<Node, ParseError> {
	let tokens = tokenize(input)?;
	let mut pos = 0;
	let node = parse_block(&tokens, &mut pos)?;
	Ok(node)
}

fn parse_block(tokens: &[(String, usize, usize)], pos: &mut usize) -> Result<Node, ParseError> {
	let mut node = Node::default();
	while *pos < tokens.len() {
		let (token, line, column) = &tokens[*pos];
		if token == "}" {
			*pos += 1;
			return Ok(node);
		}
		let key = token.clone();
		*pos += 1;

		let Some((next, _, _)) = tokens.get(*pos) else {
			return Err(ParseError::MissingValue {
				line: *line,
				column: *column,
				key,
			});
		};

		if next == "{" {
			*pos += 1;
			let child = parse_block(tokens, pos)?;
			node.push(key, Value::Dict(child));
		} else if next == "}" {
			return Err(ParseError::MissingValue {
				line: *line,
				column: *column,
				key,
			});
		} else {
			node.push(key, Value::Str(next.clone()));
			*pos += 1;
		}
	}
	Ok(node)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_flat_key_values() {
		let doc = r#""mode" "dpad" "deadzone" "0.6""#;
		let node = parse(doc).unwrap();
		assert_eq!(node.get_str("mode"), Some("dpad"));
		assert_eq!(node.get_str("deadzone"), Some("0.6"));
	}

	#[test]
	fn parses_nested_blocks() {
		let doc = r#"
			"controller_mappings"
			{
				"group"
				{
					"id" "1"
					"mode" "four_buttons"
				}
			}
		"#;
		let node = parse(doc).unwrap();
		let mappings = node.get_dict("controller_mappings").unwrap();
		let group = mappings.get_dict("group").unwrap();
		assert_eq!(group.get_str("id"), Some("1"));
		assert_eq!(group.get_str("mode"), Some("four_buttons"));
	}

	#[test]
	fn preserves_duplicate_keys_in_order() {
		let doc = r#""group" "a" "group" "b""#;
		let node = parse(doc).unwrap();
		let all: Vec<_> = node.get_all("group").filter_map(Value::as_str).collect();
		assert_eq!(all, vec!["a", "b"]);
	}

	#[test]
	fn missing_value_is_an_error() {
		let doc = r#""mode""#;
		assert!(parse(doc).is_err());
	}

	#[test]
	fn braces_inside_quotes_are_not_tokens() {
		let doc = r#""binding" "key_press {not a block}""#;
		let node = parse(doc).unwrap();
		assert_eq!(node.get_str("binding"), Some("key_press {not a block}"));
	}
}
