//! Character-level LSTM text generation library.
//!
//! This crate provides everything needed to learn a text style and imitate it:
//! - A fixed character vocabulary and an ASCII-flattened training corpus
//! - A recurrent sequence model stepped one character at a time
//! - A trainer that fits the model on random corpus chunks
//! - Temperature sampling, prompt completion and completion statistics
//!
//! ```no_run
//! use lstm_gen_core::{Corpus, Trainer, TrainerConfig, Vocabulary, device::choose_device};
//!
//! # fn main() -> Result<(), lstm_gen_core::Error> {
//! let vocabulary = Vocabulary::default();
//! let corpus = Corpus::from_file("data/data.txt", &vocabulary)?;
//! let mut trainer = Trainer::new(TrainerConfig::default(), corpus, vocabulary, &choose_device())?;
//! trainer.train(&mut rand::rng())?;
//! trainer.save("case_predictor.bin")?;
//! # Ok(())
//! # }
//! ```

/// Character ↔ index mapping.
pub mod vocabulary;

/// Training text and chunk sampling.
pub mod corpus;

/// Sequence model, sampler and estimator.
pub mod model;

/// Training loop and hyperparameters.
pub mod trainer;

/// Numeric backend selection.
pub mod device;

/// Error taxonomy shared by every module.
pub mod error;

/// I/O utilities (text loading, atomic writes).
///
/// Not exposed
pub(crate) mod io;

pub use candle_core::Device;
pub use corpus::{Corpus, TrainingExample};
pub use error::{Error, Result};
pub use model::{HiddenState, ModelConfig, Sampler, SequenceModel, estimate_distribution};
pub use trainer::{Trainer, TrainerConfig, TrainingSummary};
pub use vocabulary::{TERMINATOR, Vocabulary};
