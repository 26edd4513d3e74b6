use std::collections::HashSet;
use std::path::Path;

use candle_core::{Device, Tensor};
use candle_nn::VarMap;
use serde::{Deserialize, Serialize};

use super::sequence_model::ModelConfig;
use crate::error::{Error, Result};

const MAGIC: [u8; 8] = *b"LSTMGEN1";

/// One named parameter tensor, flattened in row-major order.
#[derive(Serialize, Deserialize, Debug, PartialEq)]
pub(crate) struct StoredTensor {
	name: String,
	shape: Vec<usize>,
	values: Vec<f32>,
}

/// On-disk form of a trained model: architecture plus every parameter.
///
/// Serialized with `postcard`. Tensors are sorted by name so identical
/// parameters always produce identical bytes.
#[derive(Serialize, Deserialize, Debug, PartialEq)]
pub(crate) struct ModelBlob {
	magic: [u8; 8],
	pub(crate) config: ModelConfig,
	tensors: Vec<StoredTensor>,
}

fn lock_error() -> Error {
	Error::Backend(candle_core::Error::Msg("parameter store lock poisoned".to_owned()))
}

impl ModelBlob {
	/// Copies every variable of `varmap` out of the tensor backend.
	pub(crate) fn capture(config: &ModelConfig, varmap: &VarMap) -> Result<Self> {
		let data = varmap.data().lock().map_err(|_| lock_error())?;

		let mut tensors = Vec::with_capacity(data.len());
		for (name, var) in data.iter() {
			tensors.push(StoredTensor {
				name: name.clone(),
				shape: var.dims().to_vec(),
				values: var.as_tensor().flatten_all()?.to_vec1::<f32>()?,
			});
		}
		tensors.sort_by(|a, b| a.name.cmp(&b.name));

		Ok(Self { magic: MAGIC, config: *config, tensors })
	}

	/// Reads and decodes a blob written by [`SequenceModel::save`](super::SequenceModel::save).
	pub(crate) fn read<P: AsRef<Path>>(filepath: P) -> Result<Self> {
		let bytes = std::fs::read(&filepath)?;
		let blob: ModelBlob = postcard::from_bytes(&bytes)?;
		if blob.magic != MAGIC {
			return Err(Error::ModelShapeMismatch(format!(
				"{} is not a model file",
				filepath.as_ref().display()
			)));
		}
		Ok(blob)
	}

	/// Overwrites the variables of `varmap` with the stored parameters.
	///
	/// # Errors
	/// Returns `ModelShapeMismatch` unless the stored tensors have exactly the
	/// names and shapes of the variables in `varmap`.
	pub(crate) fn restore(&self, varmap: &VarMap, device: &Device) -> Result<()> {
		let data = varmap.data().lock().map_err(|_| lock_error())?;

		let stored: HashSet<&str> = self.tensors.iter().map(|t| t.name.as_str()).collect();
		if let Some(missing) = data.keys().find(|name| !stored.contains(name.as_str())) {
			return Err(Error::ModelShapeMismatch(format!("parameter {} is missing", missing)));
		}

		for tensor in &self.tensors {
			let var = data.get(&tensor.name).ok_or_else(|| {
				Error::ModelShapeMismatch(format!("unexpected parameter {}", tensor.name))
			})?;
			if var.dims() != tensor.shape.as_slice() {
				return Err(Error::ModelShapeMismatch(format!(
					"parameter {} has shape {:?}, expected {:?}",
					tensor.name,
					tensor.shape,
					var.dims()
				)));
			}
			if tensor.values.len() != tensor.shape.iter().product::<usize>() {
				return Err(Error::ModelShapeMismatch(format!(
					"parameter {} holds {} values for shape {:?}",
					tensor.name,
					tensor.values.len(),
					tensor.shape
				)));
			}
			var.set(&Tensor::from_vec(tensor.values.clone(), tensor.shape.clone(), device)?)?;
		}

		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::model::SequenceModel;

	fn config() -> ModelConfig {
		ModelConfig { vocab_size: 5, hidden_size: 6, num_layers: 1 }
	}

	#[test]
	fn test_capture_is_sorted_and_complete() {
		let model = SequenceModel::new(config(), &Device::Cpu).unwrap();
		let blob = ModelBlob::capture(model.config(), model.varmap_for_tests()).unwrap();

		let names: Vec<&str> = blob.tensors.iter().map(|t| t.name.as_str()).collect();
		let mut sorted = names.clone();
		sorted.sort();
		assert_eq!(names, sorted);
		assert!(names.contains(&"embed.weight"));
		assert!(names.contains(&"lstm.weight_ih_l0"));
		assert!(names.contains(&"fc.weight"));
		assert_eq!(names.len(), model.vars().len());
	}

	#[test]
	fn test_restore_rejects_other_shapes() {
		let small = SequenceModel::new(config(), &Device::Cpu).unwrap();
		let blob = ModelBlob::capture(small.config(), small.varmap_for_tests()).unwrap();

		let wider = SequenceModel::new(ModelConfig { hidden_size: 7, ..config() }, &Device::Cpu).unwrap();
		let err = blob.restore(wider.varmap_for_tests(), &Device::Cpu).unwrap_err();
		assert!(matches!(err, Error::ModelShapeMismatch(_)));

		let deeper = SequenceModel::new(ModelConfig { num_layers: 2, ..config() }, &Device::Cpu).unwrap();
		let err = blob.restore(deeper.varmap_for_tests(), &Device::Cpu).unwrap_err();
		assert!(matches!(err, Error::ModelShapeMismatch(_)));
	}

	#[test]
	fn test_read_rejects_foreign_file() {
		let path = std::env::temp_dir().join(format!("lstm-gen-foreign-{}.bin", std::process::id()));
		let foreign = ModelBlob { magic: *b"NOTAMODL", config: config(), tensors: Vec::new() };
		std::fs::write(&path, postcard::to_stdvec(&foreign).unwrap()).unwrap();

		assert!(matches!(ModelBlob::read(&path), Err(Error::ModelShapeMismatch(_))));

		std::fs::remove_file(&path).unwrap();
	}
}
