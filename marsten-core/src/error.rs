//! Error types for model fitting, configuration, the codec and persistence.

use rand::distr::weighted;
use thiserror::Error;

use crate::model::token::{Context, Token};

/// Errors raised while building or querying a Markov model.
#[derive(Error, Debug)]
pub enum ModelError {
	/// History length must be at least one token.
	#[error("history length must be >= 1, got {0}")]
	InvalidHistory(usize),

	/// The context was never observed during training.
	#[error("unseen context {0}")]
	UnseenContext(Context),

	/// The context window does not match the model history length.
	#[error("context has {got} slots, model history is {expected}")]
	ContextLength { expected: usize, got: usize },

	/// Two builders of different order cannot be merged.
	#[error("history mismatch: expected {expected}, got {got}")]
	HistoryMismatch { expected: usize, got: usize },

	/// Counts recorded under one context cannot be merged into another.
	#[error("context mismatch: {expected} vs {got}")]
	ContextMismatch { expected: Context, got: Context },

	/// No training line was ever fitted.
	#[error("model has no observations")]
	EmptyModel,

	/// A parallel fitting worker exited without reporting its partial model.
	#[error("fitting worker failed")]
	WorkerFailed,
}

/// Invalid codec settings.
#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
	#[error("margin must be between 0.0 and 1.0, got {0}")]
	InvalidMargin(f64),

	#[error("stall limit must be >= 1")]
	InvalidStallLimit,
}

/// Errors raised while hiding a payload.
#[derive(Error, Debug)]
pub enum EncodeError {
	#[error(transparent)]
	Model(#[from] ModelError),

	/// The candidate weights did not form a valid distribution.
	#[error("sampling failed: {0}")]
	Sampling(#[from] weighted::Error),

	/// Too many consecutive lines were generated without embedding a whole byte.
	#[error("no payload byte embedded after {attempts} consecutive lines")]
	Stalled { attempts: usize },
}

/// Errors raised while recovering a payload.
#[derive(Error, Debug)]
pub enum DecodeError {
	#[error(transparent)]
	Model(#[from] ModelError),

	/// A token does not belong to either half of a balanced partition, or is
	/// not a successor of its context at all.
	#[error("unknown transition {token} at position {position}")]
	UnknownTransition { position: usize, token: Token },
}

/// Errors raised while saving or loading a codec.
#[derive(Error, Debug)]
pub enum StoreError {
	#[error("I/O error: {0}")]
	Io(#[from] std::io::Error),

	#[error("invalid model file: {0}")]
	Format(#[from] postcard::Error),

	#[error("invalid codec settings: {0}")]
	Config(#[from] ConfigError),

	#[error(transparent)]
	Model(#[from] ModelError),
}
