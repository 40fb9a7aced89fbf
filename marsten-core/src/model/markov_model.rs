use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::state::{State, Transition};
use super::token::Context;
use crate::error::ModelError;

/// An immutable order-`history` Markov chain over characters.
///
/// Produced by [`ModelBuilder::build`](super::builder::ModelBuilder::build).
/// Queries are read-only, so one model can be shared freely between an
/// encoder and a decoder.
///
/// # Invariants
/// - `history` is always >= 1
/// - Every stored state has at least one observation
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct MarkovModel {
	history: usize,
	states: HashMap<Context, State>,
}

impl MarkovModel {
	pub(crate) fn from_states(history: usize, states: HashMap<Context, State>) -> Self {
		Self { history, states }
	}

	/// Number of tokens in a context window.
	pub fn history(&self) -> usize {
		self.history
	}

	/// Number of distinct contexts observed during training.
	pub fn len(&self) -> usize {
		self.states.len()
	}

	pub fn is_empty(&self) -> bool {
		self.states.is_empty()
	}

	/// The context every line starts from.
	pub fn start_context(&self) -> Context {
		Context::start(self.history)
	}

	/// Iterates over every observed context, in no particular order.
	pub fn contexts(&self) -> impl Iterator<Item = &Context> {
		self.states.keys()
	}

	/// Returns the transition list of `context`, sorted by token order.
	///
	/// # Errors
	/// - [`ModelError::ContextLength`] if the window does not match `history`.
	/// - [`ModelError::UnseenContext`] if the context was never observed.
	pub fn transitions(&self, context: &Context) -> Result<Vec<Transition>, ModelError> {
		if context.len() != self.history {
			return Err(ModelError::ContextLength { expected: self.history, got: context.len() });
		}
		let list = self
			.states
			.get(context)
			.map(State::transitions)
			.unwrap_or_default();
		if list.is_empty() {
			return Err(ModelError::UnseenContext(context.clone()));
		}
		Ok(list)
	}

	/// Transition list of the start context.
	pub fn root_transitions(&self) -> Result<Vec<Transition>, ModelError> {
		self.transitions(&self.start_context())
	}
}
