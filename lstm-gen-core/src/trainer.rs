use std::path::Path;

use candle_core::{Device, Tensor};
use candle_nn::loss::cross_entropy;
use candle_nn::{AdamW, Optimizer, ParamsAdamW};
use log::{debug, info};
use rand::Rng;

use crate::corpus::{Corpus, TrainingExample};
use crate::error::{Error, Result};
use crate::model::sampler::check_temperature;
use crate::model::{ModelConfig, Sampler, SequenceModel};
use crate::vocabulary::Vocabulary;

/// Training hyperparameters.
///
/// Every field can be overridden before handing the configuration to
/// [`Trainer::new`], which validates it.
#[derive(Clone, Debug, PartialEq)]
pub struct TrainerConfig {
	/// Characters per training example.
	pub chunk_len: usize,
	/// Number of chunks (one optimizer step each).
	pub epochs: usize,
	/// Sequences per step. Only 1 is supported.
	pub batch_size: usize,
	pub hidden_size: usize,
	pub num_layers: usize,
	pub learning_rate: f64,
	/// A progress report is logged every `progress_interval` epochs.
	pub progress_interval: usize,
	/// Prompt of the sample shown with each progress report.
	pub sample_prompt: String,
	/// Characters generated for each progress sample.
	pub sample_len: usize,
	pub sample_temperature: f64,
}

impl Default for TrainerConfig {
	fn default() -> Self {
		Self {
			chunk_len: 250,
			epochs: 5000,
			batch_size: 1,
			hidden_size: 256,
			num_layers: 2,
			learning_rate: 0.003,
			progress_interval: 50,
			sample_prompt: "a".to_owned(),
			sample_len: 100,
			sample_temperature: 0.85,
		}
	}
}

impl TrainerConfig {
	/// # Errors
	/// Returns `InvalidConfig` for zero sizes, a batch size other than 1 or a
	/// non-positive learning rate, and `InvalidTemperature` for the sample temperature.
	pub fn validate(&self) -> Result<()> {
		let zero = [
			("chunk_len", self.chunk_len),
			("epochs", self.epochs),
			("hidden_size", self.hidden_size),
			("num_layers", self.num_layers),
			("progress_interval", self.progress_interval),
		];
		if let Some((name, _)) = zero.iter().find(|(_, value)| *value == 0) {
			return Err(Error::InvalidConfig(format!("{} must be greater than 0", name)));
		}
		if self.batch_size != 1 {
			return Err(Error::InvalidConfig(format!("batch_size must be 1, got {}", self.batch_size)));
		}
		if !(self.learning_rate > 0.0) {
			return Err(Error::InvalidConfig(format!("learning_rate must be positive, got {}", self.learning_rate)));
		}
		check_temperature(self.sample_temperature)
	}

	pub fn model_config(&self, vocabulary: &Vocabulary) -> ModelConfig {
		ModelConfig {
			vocab_size: vocabulary.len(),
			hidden_size: self.hidden_size,
			num_layers: self.num_layers,
		}
	}
}

/// Outcome of [`Trainer::train`].
#[derive(Clone, Debug, PartialEq)]
pub struct TrainingSummary {
	pub epochs: usize,
	/// Per-character loss of every epoch, in order.
	pub losses: Vec<f32>,
}

impl TrainingSummary {
	pub fn final_loss(&self) -> Option<f32> {
		self.losses.last().copied()
	}
}

/// Fits a fresh [`SequenceModel`] to a corpus, one random chunk per epoch.
///
/// # Responsibilities
/// - Draw shifted (input, target) chunks from the corpus
/// - Step the model through a whole chunk, carrying the hidden state
/// - Sum the per-character losses and apply one Adam update per chunk
/// - Report progress with a sample generation
pub struct Trainer {
	config: TrainerConfig,
	corpus: Corpus,
	vocabulary: Vocabulary,
	model: SequenceModel,
	optimizer: AdamW,
}

impl Trainer {
	/// Builds a randomly initialized model for `vocabulary` on `device`.
	///
	/// # Errors
	/// - `InvalidConfig` / `InvalidTemperature` for an invalid configuration
	/// - `CorpusTooShort` if the corpus cannot hold a single chunk
	/// - `EmptyPrompt` / `OutOfVocabulary` if the progress sample prompt is unusable
	pub fn new(config: TrainerConfig, corpus: Corpus, vocabulary: Vocabulary, device: &Device) -> Result<Self> {
		config.validate()?;
		corpus.check_chunk_len(config.chunk_len)?;
		if vocabulary.encode(&config.sample_prompt)?.is_empty() {
			return Err(Error::EmptyPrompt);
		}

		let model = SequenceModel::new(config.model_config(&vocabulary), device)?;
		// Adam: AdamW without weight decay.
		let params = ParamsAdamW { lr: config.learning_rate, weight_decay: 0.0, ..Default::default() };
		let optimizer = AdamW::new(model.vars(), params)?;

		Ok(Self { config, corpus, vocabulary, model, optimizer })
	}

	pub fn config(&self) -> &TrainerConfig {
		&self.config
	}

	pub fn model(&self) -> &SequenceModel {
		&self.model
	}

	pub fn vocabulary(&self) -> &Vocabulary {
		&self.vocabulary
	}

	pub fn into_model(self) -> SequenceModel {
		self.model
	}

	/// Sampler over the model in its current state.
	pub fn sampler(&self) -> Result<Sampler<'_>> {
		Sampler::new(&self.model, &self.vocabulary)
	}

	/// One optimizer step on `example`.
	///
	/// The hidden state starts at zero and is carried through every character
	/// of the chunk; the loss is summed over the chunk and backpropagated once.
	/// Returns the loss divided by the chunk length.
	pub fn train_example(&mut self, example: &TrainingExample) -> Result<f32> {
		let device = self.model.device().clone();
		let mut state = self.model.init_hidden(self.config.batch_size)?;

		let mut losses = Vec::with_capacity(example.input_ids.len());
		for (&input, &target) in example.input_ids.iter().zip(&example.target_ids) {
			let (logits, next_state) = self.model.step(input, &state)?;
			losses.push(cross_entropy(&logits, &Tensor::new(&[target], &device)?)?);
			state = next_state;
		}
		let loss = Tensor::stack(&losses, 0)?.sum_all()?;

		// Gradients are rebuilt from scratch by each backward pass.
		self.optimizer.backward_step(&loss)?;

		Ok(loss.to_scalar::<f32>()? / example.input_ids.len() as f32)
	}

	/// Draws a random chunk and trains on it.
	pub fn train_epoch<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<f32> {
		let example = self.corpus.random_example(self.config.chunk_len, rng)?;
		self.train_example(&example)
	}

	/// Runs every epoch, logging a progress report every `progress_interval` epochs.
	///
	/// The progress sample is drawn from `rng` but never touches the parameters.
	pub fn train<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<TrainingSummary> {
		let epochs = self.config.epochs;
		info!(
			"Starting training: {} epochs of {} characters on {} characters of corpus",
			epochs,
			self.config.chunk_len,
			self.corpus.len()
		);

		let mut losses = Vec::with_capacity(epochs);
		for epoch in 1..=epochs {
			let loss = self.train_epoch(rng)?;
			debug!("Epoch {} loss {}", epoch, loss);
			losses.push(loss);

			if epoch % self.config.progress_interval == 0 {
				let sample = self.sampler()?.generate(
					&self.config.sample_prompt,
					self.config.sample_len,
					self.config.sample_temperature,
					rng,
				)?;
				info!("Epoch: {}", epoch);
				info!("{}% trained", epoch as f64 / epochs as f64 * 100.0);
				info!("Loss: {}", loss);
				info!("Sample:\n{}", sample);
			}
		}

		info!("Training finished");
		Ok(TrainingSummary { epochs, losses })
	}

	/// Persists the model parameters.
	pub fn save<P: AsRef<Path>>(&self, filepath: P) -> Result<()> {
		self.model.save(filepath)
	}
}
