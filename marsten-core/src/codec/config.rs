use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Default balance tolerance: a usable split carries between 45% and 55%
/// of the probability mass.
pub const DEFAULT_MARGIN: f64 = 0.1;

/// Default number of consecutive lines allowed to embed no whole byte.
pub const DEFAULT_MAX_STALLED_CHUNKS: usize = 1024;

/// Codec parameters.
///
/// # Invariants
/// - `margin` is finite and in `[0.0, 1.0]`
/// - `max_stalled_chunks` is >= 1
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct CodecConfig {
	/// Tolerance around a 50/50 split. Lower values are less detectable but
	/// need longer carrier text per payload bit.
	margin: f64,

	/// Upper bound on consecutive generated lines that consume no payload byte.
	max_stalled_chunks: usize,
}

impl Default for CodecConfig {
	fn default() -> Self {
		Self { margin: DEFAULT_MARGIN, max_stalled_chunks: DEFAULT_MAX_STALLED_CHUNKS }
	}
}

impl CodecConfig {
	/// Creates a configuration with the given margin and the default stall limit.
	///
	/// # Errors
	/// Returns an error if the margin is outside `[0.0, 1.0]`.
	pub fn with_margin(margin: f64) -> Result<Self, ConfigError> {
		let mut config = Self::default();
		config.set_margin(margin)?;
		Ok(config)
	}

	pub fn margin(&self) -> f64 {
		self.margin
	}

	pub fn max_stalled_chunks(&self) -> usize {
		self.max_stalled_chunks
	}

	/// Sets the balance margin (0.0..=1.0).
	///
	/// # Errors
	/// Returns an error if the value is outside the valid range.
	pub fn set_margin(&mut self, margin: f64) -> Result<(), ConfigError> {
		if !(0.0..=1.0).contains(&margin) {
			return Err(ConfigError::InvalidMargin(margin));
		}
		self.margin = margin;
		Ok(())
	}

	/// Sets the stall limit.
	///
	/// # Errors
	/// Returns an error if `limit` is zero.
	pub fn set_max_stalled_chunks(&mut self, limit: usize) -> Result<(), ConfigError> {
		if limit == 0 {
			return Err(ConfigError::InvalidStallLimit);
		}
		self.max_stalled_chunks = limit;
		Ok(())
	}

	/// Checks the invariants, e.g. after deserialization.
	pub fn validate(&self) -> Result<(), ConfigError> {
		let mut check = Self::default();
		check.set_margin(self.margin)?;
		check.set_max_stalled_chunks(self.max_stalled_chunks)
	}
}
