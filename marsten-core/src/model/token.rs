use std::fmt;

use serde::{Deserialize, Serialize};

/// A single symbol of the carrier alphabet.
///
/// `End` marks the end of a line and has no successor. The derived ordering
/// puts `End` before every character, and characters compare by their natural
/// value. This ordering is the tie-break used when two transitions carry the
/// same probability.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Token {
	End,
	Char(char),
}

impl Token {
	/// Returns the character carried by this token, if any.
	pub fn as_char(self) -> Option<char> {
		match self {
			Token::End => None,
			Token::Char(c) => Some(c),
		}
	}
}

impl fmt::Display for Token {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Token::End => write!(f, "<end>"),
			Token::Char(c) => write!(f, "{c:?}"),
		}
	}
}

/// A state of the Markov chain: the last `history` tokens seen on the line.
///
/// Positions before the start of the line hold `None` (the start placeholder).
/// The window has a fixed length for a given model.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Context(Vec<Option<char>>);

impl Context {
	/// Creates the context of an empty line: `history` start placeholders.
	pub fn start(history: usize) -> Self {
		Self(vec![None; history])
	}

	/// Returns the number of slots in the window.
	pub fn len(&self) -> usize {
		self.0.len()
	}

	/// Returns `true` for a zero-length window.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	/// Returns the window slots, oldest first.
	pub fn slots(&self) -> &[Option<char>] {
		&self.0
	}

	/// Returns the context reached after `token`: the oldest slot is dropped
	/// and the token is appended. `End` appends the start placeholder.
	pub fn advance(&self, token: Token) -> Self {
		let mut slots = Vec::with_capacity(self.0.len());
		slots.extend(self.0.iter().skip(1).copied());
		slots.push(token.as_char());
		Self(slots)
	}
}

impl fmt::Display for Context {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "[")?;
		for slot in &self.0 {
			match slot {
				Some(c) => write!(f, "{}", c.escape_debug())?,
				None => write!(f, "^")?,
			}
		}
		write!(f, "]")
	}
}
