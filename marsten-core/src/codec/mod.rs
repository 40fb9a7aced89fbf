//! Steganographic codec on top of a [`MarkovModel`].
//!
//! Payload bits are hidden in the choices made while generating text: at
//! every step whose transitions split evenly, the next bit selects which
//! half the following character is drawn from. The receiver replays the
//! same walk with the same model and reads the bits back.

/// Margin and stall limit.
pub mod config;

/// Payload → lines.
pub mod encoder;

/// Lines → payload.
pub mod decoder;

/// Lines ↔ document text.
pub mod framing;

/// Balanced two-way split of a transition list.
pub mod partition;

use std::path::Path;

use rand::Rng;
use serde::{Deserialize, Serialize};

pub use config::CodecConfig;
pub use decoder::{DecodeReport, DecodedMessage};
pub use framing::Message;
pub use partition::{Partition, balanced_contexts, partition};

use crate::error::{ConfigError, EncodeError, ModelError, StoreError};
use crate::io;
use crate::model::MarkovModel;

/// A fitted model paired with the settings both parties must agree on.
///
/// Immutable once created; encoding and decoding only borrow it.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Codec {
	model: MarkovModel,
	config: CodecConfig,
}

/// Shape of a codec, for display.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ModelSummary {
	pub history: usize,
	pub contexts: usize,
	pub balanced_contexts: usize,
	pub margin: f64,
}

impl Codec {
	/// Pairs a model with a configuration.
	///
	/// # Errors
	/// Returns an error if the configuration is invalid.
	pub fn new(model: MarkovModel, config: CodecConfig) -> Result<Self, ConfigError> {
		config.validate()?;
		Ok(Self { model, config })
	}

	pub fn model(&self) -> &MarkovModel {
		&self.model
	}

	pub fn config(&self) -> &CodecConfig {
		&self.config
	}

	/// Hides `payload` in a newline-separated document.
	///
	/// An empty payload produces an empty document.
	pub fn encode<R: Rng + ?Sized>(&self, payload: &[u8], rng: &mut R) -> Result<String, EncodeError> {
		let messages = self.encode_messages(payload, rng)?;
		Ok(framing::serialize(&messages))
	}

	pub fn summary(&self) -> ModelSummary {
		ModelSummary {
			history: self.model.history(),
			contexts: self.model.len(),
			balanced_contexts: balanced_contexts(&self.model, self.config.margin()),
			margin: self.config.margin(),
		}
	}

	/// Writes the codec to `path` in `postcard` format.
	pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), StoreError> {
		io::write_binary(path, self)
	}

	/// Reads a codec written by [`save`](Self::save).
	///
	/// # Errors
	/// Returns an error if the file cannot be read or does not hold a valid codec.
	pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
		let codec: Self = io::read_binary(&path)?;
		codec.config.validate()?;
		if codec.model.is_empty() {
			return Err(ModelError::EmptyModel.into());
		}
		log::info!(
			"loaded model from {}: history {}, {} contexts",
			path.as_ref().display(),
			codec.model.history(),
			codec.model.len()
		);
		Ok(codec)
	}
}

#[cfg(test)]
mod tests {
	use rand::SeedableRng;
	use rand::rngs::StdRng;

	use std::collections::HashMap;
	use std::fs;
	use std::path::PathBuf;

	use super::*;
	use crate::error::DecodeError;
	use crate::model::{ModelBuilder, Token};

	/// Same layout as [`Codec`], with the config as raw fields so invalid
	/// values can be written.
	#[derive(Serialize)]
	struct RawCodec<'a> {
		model: &'a MarkovModel,
		config: (f64, usize),
	}

	fn scratch(name: &str) -> PathBuf {
		std::env::temp_dir().join(format!("marsten-codec-{}-{}.bin", name, std::process::id()))
	}

	fn codec(corpus: &str, history: usize, margin: f64) -> Codec {
		let mut builder = ModelBuilder::new(history).unwrap();
		builder.fit(corpus);
		Codec::new(builder.build().unwrap(), CodecConfig::with_margin(margin).unwrap()).unwrap()
	}

	#[test]
	fn abab_zero_byte_walks_the_only_balanced_branch() {
		// Only the context after 'b' is balanced: p0 = {END}, p1 = {'a'}.
		// Eight zero bits pick 'a' eight times, whatever the random source.
		let codec = codec("abab", 1, 0.1);
		let mut rng = StdRng::seed_from_u64(7);

		let (message, rest) = codec.encode_chunk(&[0x00], &mut rng).unwrap();
		let line: String = message.iter().collect();
		assert_eq!(line, "ababababababababa");
		assert!(rest.is_empty());

		let document = codec.encode(&[0x00], &mut rng).unwrap();
		assert_eq!(document, "ababababababababa");
		assert_eq!(codec.decode(&document).unwrap(), vec![0x00]);
	}

	#[test]
	fn one_bits_that_always_end_the_line_stall() {
		// A set bit after 'b' can only be carried by END, so no byte ever completes.
		let mut config = CodecConfig::default();
		config.set_max_stalled_chunks(5).unwrap();
		let codec = Codec::new(codec("abab", 1, 0.1).model, config).unwrap();
		let mut rng = StdRng::seed_from_u64(1);

		let (message, rest) = codec.encode_chunk(&[0xff], &mut rng).unwrap();
		assert_eq!(message, vec!['a', 'b']);
		assert_eq!(rest, &[0xff]);

		let result = codec.encode(&[0xff], &mut rng);
		assert!(matches!(result, Err(EncodeError::Stalled { attempts: 6 })));
	}

	#[test]
	fn empty_payload_is_an_empty_document() {
		let codec = codec("abab", 1, 0.1);
		let mut rng = StdRng::seed_from_u64(3);
		assert!(codec.encode_messages(&[], &mut rng).unwrap().is_empty());
		assert_eq!(codec.encode(b"", &mut rng).unwrap(), "");
		assert_eq!(codec.decode("").unwrap(), Vec::<u8>::new());
	}

	#[test]
	fn foreign_token_is_an_unknown_transition() {
		let codec = codec("abab", 1, 0.1);

		// Filler step at the start context: only 'a' was ever seen.
		let result = codec.decode("x");
		assert!(matches!(
			result,
			Err(DecodeError::UnknownTransition { position: 0, token: Token::Char('x') })
		));

		// Balanced step after 'b': neither half holds 'q'.
		let result = codec.decode("abq");
		assert!(matches!(
			result,
			Err(DecodeError::UnknownTransition { position: 2, token: Token::Char('q') })
		));
	}

	#[test]
	fn incomplete_bytes_are_reported_and_dropped() {
		let codec = codec("abab", 1, 0.1);
		// Three balanced steps, each choosing 'a' (bit 0).
		let report = codec.decode_report("abababa").unwrap();
		assert_eq!(report.payload, Vec::<u8>::new());
		assert_eq!(report.trailing_bits, 3);
	}

	#[test]
	fn summary_reflects_model_and_margin() {
		let summary = codec("abab", 1, 0.1).summary();
		assert_eq!(
			summary,
			ModelSummary { history: 1, contexts: 3, balanced_contexts: 1, margin: 0.1 }
		);
	}

	#[test]
	fn load_rejects_out_of_range_margin() {
		let codec = codec("abab", 1, 0.1);
		let path = scratch("margin");
		io::write_binary(&path, &RawCodec { model: &codec.model, config: (1.5, 16) }).unwrap();
		let result = Codec::load(&path);
		fs::remove_file(&path).unwrap();

		assert!(matches!(result, Err(StoreError::Config(ConfigError::InvalidMargin(m))) if m == 1.5));
	}

	#[test]
	fn load_rejects_zero_stall_limit() {
		let codec = codec("abab", 1, 0.1);
		let path = scratch("stall");
		io::write_binary(&path, &RawCodec { model: &codec.model, config: (0.1, 0) }).unwrap();
		let result = Codec::load(&path);
		fs::remove_file(&path).unwrap();

		assert!(matches!(result, Err(StoreError::Config(ConfigError::InvalidStallLimit))));
	}

	#[test]
	fn load_rejects_empty_model() {
		let empty = MarkovModel::from_states(1, HashMap::new());
		let path = scratch("empty");
		io::write_binary(&path, &Codec { model: empty, config: CodecConfig::default() }).unwrap();
		let result = Codec::load(&path);
		fs::remove_file(&path).unwrap();

		assert!(matches!(result, Err(StoreError::Model(ModelError::EmptyModel))));
	}

	#[test]
	fn load_rejects_garbage_and_truncated_files() {
		let path = scratch("garbage");
		fs::write(&path, b"not a model").unwrap();
		assert!(matches!(Codec::load(&path), Err(StoreError::Format(_))));

		codec("abab", 1, 0.1).save(&path).unwrap();
		let bytes = fs::read(&path).unwrap();
		fs::write(&path, &bytes[..bytes.len() / 2]).unwrap();
		let result = Codec::load(&path);
		fs::remove_file(&path).unwrap();

		assert!(matches!(result, Err(StoreError::Format(_))));
	}

	#[test]
	fn load_reports_missing_file() {
		let result = Codec::load(scratch("missing"));
		assert!(matches!(result, Err(StoreError::Io(_))));
	}
}
