use candle_core::Device;
use log::info;

/// Picks the numeric backend: the first CUDA device when one is usable,
/// the CPU otherwise.
///
/// Training and sampling behave the same on either; only speed differs.
pub fn choose_device() -> Device {
	match Device::cuda_if_available(0) {
		Ok(device) => {
			info!("Using device {:?}", device);
			device
		}
		Err(e) => {
			info!("CUDA unavailable ({}), falling back to CPU", e);
			Device::Cpu
		}
	}
}
