use log::debug;
use rand::Rng;
use rand::distr::Distribution;
use rand::distr::weighted::WeightedIndex;

use super::sequence_model::SequenceModel;
use super::state::HiddenState;
use crate::error::{Error, Result};
use crate::vocabulary::{TERMINATOR, Vocabulary};

/// Upper bound on the characters a single completion may sample.
pub const DEFAULT_COMPLETION_LIMIT: usize = 10_000;

/// Prefixes used by [`Sampler::random_prediction`].
pub const LATIN_PREPOSITIONS: [&str; 27] = [
	"a", "ab", "abante", "ad", "apud", "con", "contra", "coram",
	"cum", "de", "e", "ex", "extra", "in", "inter", "iuxta",
	"ob", "palam", "per", "post", "prae", "pro", "propter",
	"sine", "sub", "super", "trans",
];

/// Read-only text generation on top of a [`SequenceModel`].
///
/// # Responsibilities
/// - Warm the recurrent state up on a prompt
/// - Draw characters from the temperature-scaled output distribution
/// - Stop after a fixed length (`generate`) or at the terminator (`complete`)
///
/// All randomness comes from the `rng` given to each call, so a seeded
/// generator makes every method reproducible.
pub struct Sampler<'a> {
	model: &'a SequenceModel,
	vocabulary: &'a Vocabulary,
	/// Maximum number of characters `complete` samples before giving up.
	completion_limit: usize,
}

impl<'a> Sampler<'a> {
	/// # Errors
	/// Returns `ModelShapeMismatch` if the vocabulary and the model output
	/// layer disagree on the number of characters.
	pub fn new(model: &'a SequenceModel, vocabulary: &'a Vocabulary) -> Result<Self> {
		if model.config().vocab_size != vocabulary.len() {
			return Err(Error::ModelShapeMismatch(format!(
				"model predicts {} characters, vocabulary holds {}",
				model.config().vocab_size,
				vocabulary.len()
			)));
		}
		Ok(Self { model, vocabulary, completion_limit: DEFAULT_COMPLETION_LIMIT })
	}

	pub fn with_completion_limit(mut self, completion_limit: usize) -> Self {
		self.completion_limit = completion_limit;
		self
	}

	pub fn vocabulary(&self) -> &Vocabulary {
		self.vocabulary
	}

	/// Extends `prompt` by exactly `length` sampled characters.
	///
	/// # Errors
	/// - `InvalidTemperature` if `temperature <= 0`, before anything is sampled
	/// - `EmptyPrompt` / `OutOfVocabulary` for an unusable prompt
	pub fn generate<R: Rng + ?Sized>(
		&self,
		prompt: &str,
		length: usize,
		temperature: f64,
		rng: &mut R,
	) -> Result<String> {
		check_temperature(temperature)?;
		let (mut last, mut state) = self.warm_up(prompt)?;

		let mut predicted = prompt.to_owned();
		for _ in 0..length {
			let (next, next_state) = self.sample_next(last, &state, temperature, rng)?;
			predicted.push(self.vocabulary.char_at(next as usize)?);
			last = next;
			state = next_state;
		}

		Ok(predicted)
	}

	/// Extends `prompt` until the terminator is sampled.
	///
	/// The returned string is the prompt followed by every sampled character,
	/// the terminator included.
	///
	/// # Errors
	/// - `InvalidTemperature` if `temperature <= 0`, before anything is sampled
	/// - `OutOfVocabulary` if the vocabulary has no terminator
	/// - `CompletionLimit` if no terminator shows up within the completion limit
	pub fn complete<R: Rng + ?Sized>(&self, prompt: &str, temperature: f64, rng: &mut R) -> Result<String> {
		check_temperature(temperature)?;
		let terminator = self.vocabulary.index_of(TERMINATOR)?;
		let (mut last, mut state) = self.warm_up(prompt)?;

		let mut predicted = prompt.to_owned();
		for _ in 0..self.completion_limit {
			let (next, next_state) = self.sample_next(last, &state, temperature, rng)?;
			predicted.push(self.vocabulary.char_at(next as usize)?);
			if next == terminator {
				return Ok(predicted);
			}
			last = next;
			state = next_state;
		}

		debug!("Completion of {:?} hit the limit: {:?}", prompt, predicted);
		Err(Error::CompletionLimit(self.completion_limit))
	}

	/// Completes a random Latin preposition followed by a space.
	pub fn random_prediction<R: Rng + ?Sized>(&self, temperature: f64, rng: &mut R) -> Result<String> {
		let preposition = LATIN_PREPOSITIONS[rng.random_range(0..LATIN_PREPOSITIONS.len())];
		self.complete(&format!("{} ", preposition), temperature, rng)
	}

	/// Runs the model over all but the last prompt character.
	///
	/// Returns the last prompt character, still to be fed, and the state
	/// reached just before it.
	fn warm_up(&self, prompt: &str) -> Result<(u32, HiddenState)> {
		let input = self.vocabulary.encode(prompt)?;
		let (&last, head) = input.split_last().ok_or(Error::EmptyPrompt)?;

		let mut state = self.model.init_hidden(1)?;
		for &index in head {
			let (_, next_state) = self.model.step(index, &state)?;
			state = next_state;
		}

		Ok((last, state))
	}

	/// One model step followed by a draw proportional to `exp(logits / temperature)`.
	///
	/// The weights are left unnormalized: the draw only needs them up to a
	/// common factor.
	fn sample_next<R: Rng + ?Sized>(
		&self,
		last: u32,
		state: &HiddenState,
		temperature: f64,
		rng: &mut R,
	) -> Result<(u32, HiddenState)> {
		let (logits, next_state) = self.model.step(last, state)?;
		let weights = logits.squeeze(0)?.affine(1.0 / temperature, 0.0)?.exp()?.to_vec1::<f32>()?;

		let distribution = WeightedIndex::new(&weights)?;
		Ok((distribution.sample(rng) as u32, next_state))
	}
}

/// Temperatures must be strictly positive (NaN is rejected too).
pub(crate) fn check_temperature(temperature: f64) -> Result<()> {
	if !(temperature > 0.0) {
		return Err(Error::InvalidTemperature(temperature));
	}
	Ok(())
}
