use rand::Rng;
use rand::distr::Distribution;
use rand::distr::weighted::WeightedIndex;

use super::Codec;
use super::framing::Message;
use super::partition::partition;
use crate::error::EncodeError;
use crate::model::{Token, Transition};

/// Read position in the payload, least-significant bit first within each byte.
#[derive(Debug, Default)]
struct BitCursor {
	byte: usize,
	bit: u8,
}

impl BitCursor {
	fn read(&self, data: &[u8]) -> bool {
		data[self.byte] & (1 << self.bit) != 0
	}

	/// Moves to the next bit. Returns `true` when a byte was completed.
	fn advance(&mut self) -> bool {
		self.bit += 1;
		if self.bit == 8 {
			self.bit = 0;
			self.byte += 1;
			return true;
		}
		false
	}
}

/// Draws one transition, with probability proportional to its share of
/// the candidates' total mass.
fn draw<'a, R: Rng + ?Sized>(candidates: &[&'a Transition], rng: &mut R) -> Result<&'a Transition, EncodeError> {
	let weights = WeightedIndex::new(candidates.iter().map(|t| t.probability))?;
	Ok(candidates[weights.sample(rng)])
}

impl Codec {
	/// Generates one line carrying as many whole bytes of `data` as the walk allows.
	///
	/// At each step the partition of the current context is computed. When it is
	/// balanced, the next payload bit restricts the draw to `p0` (bit 1) or `p1`
	/// (bit 0). Otherwise the step is filler and draws from the full list.
	///
	/// # Returns
	/// The generated message and the bytes that are not fully embedded in it.
	///
	/// # Notes
	/// - A bit only counts once its token is in the message. A step that draws
	///   `End` ends the line and its bit is sent again in the next chunk.
	/// - The line stops right after the token carrying the last bit of `data`.
	/// - Bits of an incomplete byte are left in the message; the decoder drops them.
	pub fn encode_chunk<'d, R: Rng + ?Sized>(
		&self,
		data: &'d [u8],
		rng: &mut R,
	) -> Result<(Message, &'d [u8]), EncodeError> {
		let mut message = Message::new();
		if data.is_empty() {
			return Ok((message, data));
		}

		let mut context = self.model.start_context();
		let mut cursor = BitCursor::default();

		loop {
			let transitions = self.model.transitions(&context)?;
			let split = partition(&transitions, self.config.margin());

			let carries_bit = split.balanced;
			let choice = if carries_bit {
				draw(split.half(cursor.read(data)), rng)?
			} else {
				let all: Vec<&Transition> = transitions.iter().collect();
				draw(&all, rng)?
			};

			let c = match choice.token {
				Token::End => break,
				Token::Char(c) => c,
			};
			message.push(c);
			context = choice.next.clone();

			if carries_bit && cursor.advance() && cursor.byte == data.len() {
				break;
			}
		}

		log::debug!("chunk of {} chars embeds {} of {} bytes", message.len(), cursor.byte, data.len());
		Ok((message, &data[cursor.byte..]))
	}

	/// Embeds the whole payload into a list of messages.
	///
	/// An empty payload yields no message.
	///
	/// # Errors
	/// Returns [`EncodeError::Stalled`] after more than `max_stalled_chunks`
	/// consecutive lines embed no whole byte.
	pub fn encode_messages<R: Rng + ?Sized>(&self, payload: &[u8], rng: &mut R) -> Result<Vec<Message>, EncodeError> {
		let mut messages = Vec::new();
		let mut remaining = payload;
		let mut stalled = 0;

		while !remaining.is_empty() {
			let (message, rest) = self.encode_chunk(remaining, rng)?;
			if rest.len() == remaining.len() {
				stalled += 1;
				if stalled > self.config.max_stalled_chunks() {
					log::warn!("giving up with {} bytes left after {} stalled lines", remaining.len(), stalled);
					return Err(EncodeError::Stalled { attempts: stalled });
				}
			} else {
				stalled = 0;
			}
			messages.push(message);
			remaining = rest;
		}

		log::info!("encoded {} bytes into {} lines", payload.len(), messages.len());
		Ok(messages)
	}
}
