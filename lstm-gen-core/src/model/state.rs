use candle_core::{DType, Device, Tensor};
use candle_nn::rnn::LSTMState;

use crate::error::Result;

/// Recurrent memory carried between two consecutive character steps.
///
/// A `HiddenState` is a plain value: `SequenceModel::step` consumes a
/// reference to one and returns a new one. Nothing keeps it between calls,
/// so every sequence (training chunk, generation, completion) starts from
/// [`HiddenState::zeros`].
///
/// ## Invariants
/// - `hidden` and `cell` share the shape `(num_layers, batch_size, hidden_size)`
#[derive(Clone, Debug)]
pub struct HiddenState {
	/// Per-layer hidden output `h`.
	hidden: Tensor,
	/// Per-layer cell memory `c`.
	cell: Tensor,
}

impl HiddenState {
	/// Zeroed state for a fresh sequence.
	pub fn zeros(num_layers: usize, batch_size: usize, hidden_size: usize, device: &Device) -> Result<Self> {
		let shape = (num_layers, batch_size, hidden_size);
		Ok(Self {
			hidden: Tensor::zeros(shape, DType::F32, device)?,
			cell: Tensor::zeros(shape, DType::F32, device)?,
		})
	}

	pub fn hidden(&self) -> &Tensor {
		&self.hidden
	}

	pub fn cell(&self) -> &Tensor {
		&self.cell
	}

	pub fn num_layers(&self) -> usize {
		self.hidden.dims().first().copied().unwrap_or(0)
	}

	/// State of a single layer, as consumed by a candle LSTM cell.
	pub(crate) fn layer(&self, layer: usize) -> Result<LSTMState> {
		Ok(LSTMState::new(self.hidden.get(layer)?, self.cell.get(layer)?))
	}

	/// Reassembles a state from one `LSTMState` per layer, bottom layer first.
	pub(crate) fn from_layers(layers: &[LSTMState]) -> Result<Self> {
		let hidden: Vec<&Tensor> = layers.iter().map(|s| s.h()).collect();
		let cell: Vec<&Tensor> = layers.iter().map(|s| s.c()).collect();
		Ok(Self {
			hidden: Tensor::stack(&hidden, 0)?,
			cell: Tensor::stack(&cell, 0)?,
		})
	}
}
