use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::token::{Context, Token};
use crate::error::ModelError;

/// One probability-annotated successor of a context.
#[derive(Clone, Debug, PartialEq)]
pub struct Transition {
	/// Share of the context's observations that continued with `token`.
	pub probability: f64,
	pub token: Token,
	/// Context reached after emitting `token`.
	pub next: Context,
}

/// Represents a state in the Markov model.
///
/// A `State` corresponds to a fixed context (`key`) and stores all observed
/// transitions from this context to the next token.
///
/// ## Invariants
/// - All transitions belong to the same `key`
/// - Each transition occurrence count is strictly positive
/// - Transitions are kept in token order, so queries are deterministic
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct State {
	/// Identifier of the state.
	key: Context,
	/// Outgoing transitions indexed by the next token.
	/// The value represents how many times this transition was observed.
	transitions: BTreeMap<Token, usize>,
}

impl State {
	/// Creates a new empty state for the given context.
	pub fn new(key: Context) -> Self {
		Self {
			key,
			transitions: BTreeMap::new(),
		}
	}

	/// Records an occurrence of a transition toward `token`.
	pub fn add_transition(&mut self, token: Token) {
		*self.transitions.entry(token).or_insert(0) += 1;
	}

	/// Total number of observations recorded for this context.
	pub fn total(&self) -> usize {
		self.transitions.values().sum()
	}

	/// Returns the transition list in token order (`End` first).
	///
	/// Returns an empty list if the state has no observations.
	pub fn transitions(&self) -> Vec<Transition> {
		let total = self.total();
		if total == 0 {
			return Vec::new();
		}
		self.transitions
			.iter()
			.map(|(token, occurrence)| Transition {
				probability: *occurrence as f64 / total as f64,
				token: *token,
				next: self.key.advance(*token),
			})
			.collect()
	}

	/// Merges another state into this one.
	///
	/// Both states must represent the same context. Occurrence counts are summed.
	///
	/// # Errors
	/// Returns an error if the state keys do not match.
	pub fn merge(&mut self, other: &Self) -> Result<(), ModelError> {
		if self.key != other.key {
			return Err(ModelError::ContextMismatch { expected: self.key.clone(), got: other.key.clone() });
		}

		for (token, occurrence) in &other.transitions {
			*self.transitions.entry(*token).or_insert(0) += *occurrence;
		}

		Ok(())
	}
}
