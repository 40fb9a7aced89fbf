//! Character-level Markov language model.
//!
//! - Tokens and context windows (`Token`, `Context`)
//! - Per-context transition counts (`State`)
//! - Mutable fitting (`ModelBuilder`) and immutable querying (`MarkovModel`)

/// Mutable model under construction.
///
/// Handles line ingestion, parallel fitting and merging.
pub mod builder;

/// Immutable, queryable model.
pub mod markov_model;

/// Transition counts of a single context.
pub mod state;

/// Carrier alphabet and context windows.
pub mod token;

pub use builder::{ModelBuilder, DEFAULT_HISTORY};
pub use markov_model::MarkovModel;
pub use state::Transition;
pub use token::{Context, Token};
