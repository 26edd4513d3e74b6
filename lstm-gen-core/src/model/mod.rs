//! Neural side of the generator.
//!
//! - `SequenceModel`: embedding → stacked LSTM → per-character logits
//! - `HiddenState`: recurrent memory threaded explicitly through every step
//! - `Sampler`: temperature sampling, fixed-length generation and completion
//! - `estimate_distribution`: empirical distribution of completions

/// Embedding, stacked LSTM and output projection, plus persistence.
pub mod sequence_model;

/// Hidden and cell state carried between character steps.
pub mod state;

/// Prompt warm-up and temperature sampling.
pub mod sampler;

/// Tally of repeated completions.
pub mod estimator;

/// Persisted parameter blob. Not exposed.
mod checkpoint;

pub use estimator::estimate_distribution;
pub use sampler::Sampler;
pub use sequence_model::{ModelConfig, SequenceModel};
pub use state::HiddenState;
