//! Markov-chain text steganography.
//!
//! This crate hides an arbitrary byte payload in text generated by a
//! character-level Markov model:
//! - Order-k character models (`model`)
//! - Balanced partitions of the next-character distribution (`codec::partition`)
//! - Bit-level encoder/decoder and line framing (`codec`)
//! - Corpus loading and model persistence (`io`)
//!
//! ```no_run
//! use marsten_core::codec::{Codec, CodecConfig};
//! use marsten_core::model::ModelBuilder;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut builder = ModelBuilder::new(3)?;
//! builder.fit("the quick brown fox\njumps over the lazy dog");
//! let codec = Codec::new(builder.build()?, CodecConfig::default())?;
//!
//! let text = codec.encode(b"hi", &mut rand::rng())?;
//! assert_eq!(codec.decode(&text)?, b"hi");
//! # Ok(())
//! # }
//! ```

/// Steganographic encoder and decoder.
pub mod codec;

/// Error types.
pub mod error;

/// File helpers (corpus loading, binary model files).
pub mod io;

/// Markov language model: fitting and transition queries.
pub mod model;

pub use codec::{Codec, CodecConfig};
pub use error::{ConfigError, DecodeError, EncodeError, ModelError, StoreError};
pub use model::{MarkovModel, ModelBuilder};
