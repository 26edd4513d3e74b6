use thiserror::Error;

/// Every failure the generator can report.
///
/// None of these are retried: the operation that hits one (a training run,
/// a single generation call, a single model load) is aborted.
#[derive(Error, Debug)]
pub enum Error {
	#[error("character {0:?} is not part of the vocabulary")]
	OutOfVocabulary(char),

	#[error("index {index} is outside a vocabulary of {size} characters")]
	IndexOutOfRange { index: usize, size: usize },

	#[error("invalid vocabulary: {0}")]
	InvalidVocabulary(String),

	#[error("corpus of {len} characters is too short for chunks of {chunk_len} (needs at least {})", .chunk_len + 1)]
	CorpusTooShort { len: usize, chunk_len: usize },

	#[error("temperature must be strictly positive, got {0}")]
	InvalidTemperature(f64),

	#[error("model shape mismatch: {0}")]
	ModelShapeMismatch(String),

	#[error("prompt must contain at least one character")]
	EmptyPrompt,

	#[error("no terminator sampled within {0} characters")]
	CompletionLimit(usize),

	#[error("invalid configuration: {0}")]
	InvalidConfig(String),

	#[error("cannot sample from the output distribution: {0}")]
	Distribution(String),

	#[error("tensor backend error: {0}")]
	Backend(#[from] candle_core::Error),

	#[error("i/o error: {0}")]
	Io(#[from] std::io::Error),

	#[error("serialization error: {0}")]
	Serialization(#[from] postcard::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<rand::distr::weighted::Error> for Error {
	fn from(e: rand::distr::weighted::Error) -> Self {
		Error::Distribution(e.to_string())
	}
}
