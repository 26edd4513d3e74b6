use std::path::Path;

use candle_core::{DType, Device, Tensor, Var};
use candle_nn::rnn::LSTMConfig;
use candle_nn::{Embedding, LSTM, Linear, Module, RNN, VarBuilder, VarMap};
use log::info;
use serde::{Deserialize, Serialize};

use super::checkpoint::ModelBlob;
use super::state::HiddenState;
use crate::error::{Error, Result};
use crate::io::write_atomic;

/// Architecture of a [`SequenceModel`].
///
/// Stored next to the parameters so a persisted model can only be reloaded
/// into matching shapes.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct ModelConfig {
	/// Number of characters in the vocabulary (`V`).
	pub vocab_size: usize,
	/// Width of the embedding and of every LSTM layer (`H`).
	pub hidden_size: usize,
	/// Number of stacked LSTM layers.
	pub num_layers: usize,
}

impl Default for ModelConfig {
	fn default() -> Self {
		Self { vocab_size: 28, hidden_size: 256, num_layers: 2 }
	}
}

impl ModelConfig {
	/// # Errors
	/// Returns `InvalidConfig` if any dimension is zero.
	pub fn validate(&self) -> Result<()> {
		if self.vocab_size == 0 || self.hidden_size == 0 || self.num_layers == 0 {
			return Err(Error::InvalidConfig(format!("model dimensions must be non-zero: {:?}", self)));
		}
		Ok(())
	}
}

/// Character embedding → stacked LSTM → linear projection to per-character logits.
///
/// # Responsibilities
/// - Own the trainable parameters (through a `VarMap`)
/// - Advance one character at a time from an explicit [`HiddenState`]
/// - Save and reload its parameters along with the architecture metadata
///
/// The model holds no randomness and no per-sequence state: given the same
/// parameters and the same input state, `step` always returns the same output.
pub struct SequenceModel {
	config: ModelConfig,
	device: Device,
	varmap: VarMap,
	embedding: Embedding,
	/// Layer `l` feeds layer `l + 1`.
	layers: Vec<LSTM>,
	projection: Linear,
}

impl SequenceModel {
	/// Creates a randomly initialized model on `device`.
	pub fn new(config: ModelConfig, device: &Device) -> Result<Self> {
		config.validate()?;

		let varmap = VarMap::new();
		let vb = VarBuilder::from_varmap(&varmap, DType::F32, device);

		let embedding = candle_nn::embedding(config.vocab_size, config.hidden_size, vb.pp("embed"))?;
		let mut layers = Vec::with_capacity(config.num_layers);
		for layer_idx in 0..config.num_layers {
			let lstm_config = LSTMConfig { layer_idx, ..Default::default() };
			layers.push(candle_nn::lstm(config.hidden_size, config.hidden_size, lstm_config, vb.pp("lstm"))?);
		}
		let projection = candle_nn::linear(config.hidden_size, config.vocab_size, vb.pp("fc"))?;

		Ok(Self { config, device: device.clone(), varmap, embedding, layers, projection })
	}

	pub fn config(&self) -> &ModelConfig {
		&self.config
	}

	pub fn device(&self) -> &Device {
		&self.device
	}

	/// Trainable variables, handed to the optimizer.
	pub fn vars(&self) -> Vec<Var> {
		self.varmap.all_vars()
	}

	/// Zeroed hidden and cell state sized `(num_layers, batch_size, hidden_size)`.
	pub fn init_hidden(&self, batch_size: usize) -> Result<HiddenState> {
		HiddenState::zeros(self.config.num_layers, batch_size, self.config.hidden_size, &self.device)
	}

	/// Consumes one character index and advances the network by one time step.
	///
	/// Returns the unnormalized logits, shaped `(1, vocab_size)`, and the next state.
	///
	/// # Errors
	/// Returns `IndexOutOfRange` if `index` is not a vocabulary index.
	pub fn step(&self, index: u32, state: &HiddenState) -> Result<(Tensor, HiddenState)> {
		if index as usize >= self.config.vocab_size {
			return Err(Error::IndexOutOfRange { index: index as usize, size: self.config.vocab_size });
		}

		let input = Tensor::new(&[index], &self.device)?;
		let mut x = self.embedding.forward(&input)?;

		let mut next = Vec::with_capacity(self.layers.len());
		for (layer_idx, lstm) in self.layers.iter().enumerate() {
			let layer_state = lstm.step(&x, &state.layer(layer_idx)?)?;
			x = layer_state.h().clone();
			next.push(layer_state);
		}

		let logits = self.projection.forward(&x)?;
		Ok((logits, HiddenState::from_layers(&next)?))
	}

	/// Writes the parameters and the architecture to `filepath`.
	pub fn save<P: AsRef<Path>>(&self, filepath: P) -> Result<()> {
		let blob = ModelBlob::capture(&self.config, &self.varmap)?;
		let bytes = postcard::to_stdvec(&blob)?;
		write_atomic(&filepath, &bytes)?;
		info!("Saved model to {} ({} bytes)", filepath.as_ref().display(), bytes.len());
		Ok(())
	}

	/// Reloads a model, rebuilding it from the architecture stored in the file.
	///
	/// # Errors
	/// - `Io` / `Serialization` if the file cannot be read or decoded
	/// - `ModelShapeMismatch` if the stored parameters do not fit the stored architecture
	pub fn load<P: AsRef<Path>>(filepath: P, device: &Device) -> Result<Self> {
		let blob = ModelBlob::read(&filepath)?;
		Self::from_blob(blob, device, &filepath)
	}

	/// Like [`SequenceModel::load`], but also requires the stored architecture
	/// to equal `expected`.
	pub fn load_expecting<P: AsRef<Path>>(filepath: P, expected: &ModelConfig, device: &Device) -> Result<Self> {
		let blob = ModelBlob::read(&filepath)?;
		if blob.config != *expected {
			return Err(Error::ModelShapeMismatch(format!(
				"stored architecture {:?} does not match expected {:?}",
				blob.config, expected
			)));
		}
		Self::from_blob(blob, device, &filepath)
	}

	#[cfg(test)]
	pub(crate) fn varmap_for_tests(&self) -> &VarMap {
		&self.varmap
	}

	fn from_blob<P: AsRef<Path>>(blob: ModelBlob, device: &Device, filepath: P) -> Result<Self> {
		let model = Self::new(blob.config, device)?;
		blob.restore(&model.varmap, device)?;
		info!("Loaded model from {} ({:?})", filepath.as_ref().display(), model.config);
		Ok(model)
	}
}
