use super::Codec;
use super::framing::tokenize;
use super::partition::partition;
use crate::error::DecodeError;
use crate::model::Token;

/// Bytes recovered from one message.
#[derive(Debug, Default, PartialEq)]
pub struct DecodedMessage {
	pub bytes: Vec<u8>,
	/// Bits left over at the end of the message that do not form a whole byte.
	/// They are discarded.
	pub trailing_bits: usize,
}

/// Bytes recovered from a whole document.
#[derive(Debug, Default, PartialEq)]
pub struct DecodeReport {
	pub payload: Vec<u8>,
	/// Sum of the discarded trailing bits of every message.
	pub trailing_bits: usize,
}

/// Packs bits into bytes, bit `i` of a byte having weight `2^i`.
#[derive(Debug, Default)]
struct ByteAccumulator {
	current: u8,
	count: u8,
	bytes: Vec<u8>,
}

impl ByteAccumulator {
	fn push(&mut self, bit: bool) {
		if bit {
			self.current |= 1 << self.count;
		}
		self.count += 1;
		if self.count == 8 {
			self.bytes.push(self.current);
			self.current = 0;
			self.count = 0;
		}
	}

	fn finish(self) -> DecodedMessage {
		DecodedMessage { bytes: self.bytes, trailing_bits: self.count as usize }
	}
}

impl Codec {
	/// Replays the generation of one message to recover the bits it carries.
	///
	/// # Errors
	/// - [`DecodeError::UnknownTransition`] if a token is not a successor of its
	///   context (wrong model or corrupted text).
	/// - [`DecodeError::Model`] if the walk reaches a context the model never saw.
	pub fn decode_message(&self, message: &[char]) -> Result<DecodedMessage, DecodeError> {
		let mut context = self.model.start_context();
		let mut accumulator = ByteAccumulator::default();

		for (position, c) in message.iter().enumerate() {
			let token = Token::Char(*c);
			let transitions = self.model.transitions(&context)?;
			let split = partition(&transitions, self.config.margin());

			if !split.balanced {
				context = transitions
					.iter()
					.find(|t| t.token == token)
					.map(|t| t.next.clone())
					.ok_or(DecodeError::UnknownTransition { position, token })?;
				continue;
			}

			let (bit, next) = split.locate(token).ok_or(DecodeError::UnknownTransition { position, token })?;
			accumulator.push(bit);
			context = next.clone();
		}

		Ok(accumulator.finish())
	}

	/// Decodes every line of `document` and reports discarded trailing bits.
	pub fn decode_report(&self, document: &str) -> Result<DecodeReport, DecodeError> {
		let mut report = DecodeReport::default();
		for (line, message) in tokenize(document).iter().enumerate() {
			let decoded = self.decode_message(message)?;
			if decoded.trailing_bits > 0 {
				log::debug!("line {}: discarding {} trailing bits", line, decoded.trailing_bits);
			}
			report.payload.extend(decoded.bytes);
			report.trailing_bits += decoded.trailing_bits;
		}
		Ok(report)
	}

	/// Recovers the payload hidden in `document`.
	///
	/// Trailing bits that do not complete a byte are dropped silently.
	pub fn decode(&self, document: &str) -> Result<Vec<u8>, DecodeError> {
		self.decode_report(document).map(|report| report.payload)
	}
}
