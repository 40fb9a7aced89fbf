use std::collections::HashMap;
use std::sync::mpsc;
use std::thread;

use serde::{Deserialize, Serialize};

use super::markov_model::MarkovModel;
use super::state::State;
use super::token::{Context, Token};
use crate::error::ModelError;

/// Default history length, in tokens.
pub const DEFAULT_HISTORY: usize = 6;

/// Splits a corpus into training lines, one per `'\n'`.
fn training_lines(corpus: &str) -> impl Iterator<Item = &str> {
	corpus.split('\n').map(|line| line.strip_suffix('\r').unwrap_or(line))
}

/// Accumulates transition counts for an order-`history` Markov chain.
///
/// # Responsibilities
/// - Ingest training lines (each line is one training document)
/// - Accumulate counts across any number of `fit` calls
/// - Merge with another builder of the same order
/// - Freeze into an immutable [`MarkovModel`]
///
/// # Invariants
/// - `history` is always >= 1
/// - Each state in `states` corresponds to a unique context of length `history`
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ModelBuilder {
	history: usize,
	states: HashMap<Context, State>,
}

impl ModelBuilder {
	/// Creates an empty builder.
	///
	/// # Errors
	/// Returns an error if `history < 1`.
	pub fn new(history: usize) -> Result<Self, ModelError> {
		if history < 1 {
			return Err(ModelError::InvalidHistory(history));
		}
		Ok(Self { history, states: HashMap::new() })
	}

	pub fn history(&self) -> usize {
		self.history
	}

	/// Adds a single line to the model.
	///
	/// Starting from the start context, every character and then one `End`
	/// marker is counted against the context that precedes it.
	pub fn add_line(&mut self, line: &str) {
		let mut context = Context::start(self.history);
		for token in line.chars().map(Token::Char).chain(std::iter::once(Token::End)) {
			let next = context.advance(token);
			self.states
				.entry(context.clone())
				.or_insert_with(|| State::new(context))
				.add_transition(token);
			context = next;
		}
	}

	/// Fits every line of `corpus`. Counts accumulate over repeated calls.
	///
	/// Lines are split on `'\n'` only, so a trailing newline trains one more
	/// (empty) line, counted as the start context followed directly by `End`.
	/// A `'\r'` ending a line is dropped.
	pub fn fit(&mut self, corpus: &str) -> &mut Self {
		let mut lines = 0;
		for line in training_lines(corpus) {
			self.add_line(line);
			lines += 1;
		}
		log::debug!("fitted {} lines, {} contexts", lines, self.states.len());
		self
	}

	/// Same result as [`fit`](Self::fit), with the lines split across worker threads.
	///
	/// # Behavior
	/// - Splits lines into chunks (based on CPU cores * factor).
	/// - Spawns threads to build partial builders for each chunk.
	/// - Merges all partial builders sequentially.
	///
	/// # Errors
	/// Returns an error if a worker does not report back.
	pub fn fit_parallel(&mut self, corpus: &str) -> Result<&mut Self, ModelError> {
		let lines: Vec<String> = training_lines(corpus).map(str::to_owned).collect();

		let cpus = num_cpus::get();
		let factor = 8;
		let chunks = cpus * factor;
		let chunk_size = lines.len().div_ceil(chunks);

		let (tx, rx) = mpsc::channel();
		let mut workers = 0;
		for chunk in lines.chunks(chunk_size) {
			let tx = tx.clone();
			let chunk: Vec<String> = chunk.to_vec();
			let history = self.history;
			workers += 1;

			thread::spawn(move || {
				let mut partial = ModelBuilder { history, states: HashMap::new() };
				for line in &chunk {
					partial.add_line(line);
				}
				// The receiver outlives every worker.
				let _ = tx.send(partial);
			});
		}
		drop(tx);

		let mut received = 0;
		for partial in rx.iter() {
			self.merge(&partial)?;
			received += 1;
		}
		if received != workers {
			return Err(ModelError::WorkerFailed);
		}

		log::info!("fitted {} lines on {} workers, {} contexts", lines.len(), workers, self.states.len());
		Ok(self)
	}

	/// Merges another builder into this one.
	///
	/// # Errors
	/// Returns an error if the history lengths do not match.
	pub fn merge(&mut self, other: &Self) -> Result<(), ModelError> {
		if self.history != other.history {
			return Err(ModelError::HistoryMismatch { expected: self.history, got: other.history });
		}

		for (key, state) in &other.states {
			if let Some(existing) = self.states.get_mut(key) {
				existing.merge(state)?;
			} else {
				self.states.insert(key.clone(), state.clone());
			}
		}

		Ok(())
	}

	/// Freezes the accumulated counts into an immutable model.
	///
	/// # Errors
	/// Returns [`ModelError::EmptyModel`] if no line was ever fitted.
	pub fn build(self) -> Result<MarkovModel, ModelError> {
		if self.states.is_empty() {
			return Err(ModelError::EmptyModel);
		}
		Ok(MarkovModel::from_states(self.history, self.states))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn rejects_zero_history() {
		assert!(matches!(ModelBuilder::new(0), Err(ModelError::InvalidHistory(0))));
	}

	#[test]
	fn empty_builder_cannot_build() {
		let builder = ModelBuilder::new(2).unwrap();
		assert!(matches!(builder.build(), Err(ModelError::EmptyModel)));
	}

	#[test]
	fn fit_accumulates_across_calls() {
		let mut builder = ModelBuilder::new(1).unwrap();
		builder.fit("ab").fit("ac");
		let model = builder.build().unwrap();

		let after_a = Context::start(1).advance(Token::Char('a'));
		let list = model.transitions(&after_a).unwrap();
		let tokens: Vec<Token> = list.iter().map(|t| t.token).collect();
		assert_eq!(tokens, vec![Token::Char('b'), Token::Char('c')]);
		assert_eq!(model.root_transitions().unwrap()[0].probability, 1.0);
	}

	#[test]
	fn trailing_newline_trains_an_empty_line() {
		let mut builder = ModelBuilder::new(1).unwrap();
		builder.fit("ab\r\n");
		let model = builder.build().unwrap();

		// The start context saw 'a' once and `End` once (the empty last line).
		let root = model.root_transitions().unwrap();
		let tokens: Vec<Token> = root.iter().map(|t| t.token).collect();
		assert_eq!(tokens, vec![Token::End, Token::Char('a')]);
		assert_eq!(root[0].probability, 0.5);

		let after_b = model.start_context().advance(Token::Char('b'));
		let tokens: Vec<Token> = model.transitions(&after_b).unwrap().iter().map(|t| t.token).collect();
		assert_eq!(tokens, vec![Token::End]);
	}

	#[test]
	fn parallel_fit_matches_sequential_fit() {
		let corpus: String = (0..200)
			.map(|i| format!("line {} of the corpus {}", i, i * 7 % 13))
			.collect::<Vec<_>>()
			.join("\n");

		let mut sequential = ModelBuilder::new(3).unwrap();
		sequential.fit(&corpus);
		let mut parallel = ModelBuilder::new(3).unwrap();
		parallel.fit_parallel(&corpus).unwrap();

		let sequential = sequential.build().unwrap();
		let parallel = parallel.build().unwrap();
		assert_eq!(sequential.len(), parallel.len());
		for context in sequential.contexts() {
			assert_eq!(sequential.transitions(context).unwrap(), parallel.transitions(context).unwrap());
		}
	}

	#[test]
	fn merge_propagates_state_mismatch() {
		let start = Context::start(1);
		let elsewhere = start.advance(Token::Char('z'));
		let mut left = ModelBuilder::new(1).unwrap();
		left.fit("a");
		let right = ModelBuilder {
			history: 1,
			states: HashMap::from([(start, State::new(elsewhere))]),
		};
		assert!(matches!(left.merge(&right), Err(ModelError::ContextMismatch { .. })));
	}

	#[test]
	fn merge_rejects_other_history() {
		let mut left = ModelBuilder::new(2).unwrap();
		let right = ModelBuilder::new(3).unwrap();
		assert!(matches!(
			left.merge(&right),
			Err(ModelError::HistoryMismatch { expected: 2, got: 3 })
		));
	}
}
