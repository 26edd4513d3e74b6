use std::collections::HashMap;

use rand::Rng;

use super::sampler::{Sampler, check_temperature};
use crate::error::Result;

/// Empirical distribution of the completions of `prompt`.
///
/// Runs `n_samples` independent [`Sampler::complete`] calls and counts each
/// distinct output. Counts are raw: divide by `n_samples` for probabilities.
///
/// # Errors
/// Any error from `complete` aborts the whole estimation.
pub fn estimate_distribution<R: Rng + ?Sized>(
	sampler: &Sampler,
	prompt: &str,
	n_samples: usize,
	temperature: f64,
	rng: &mut R,
) -> Result<HashMap<String, usize>> {
	check_temperature(temperature)?;

	let mut samples: HashMap<String, usize> = HashMap::new();
	for _ in 0..n_samples {
		let sample = sampler.complete(prompt, temperature, rng)?;
		*samples.entry(sample).or_insert(0) += 1;
	}
	Ok(samples)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::error::Error;
	use crate::model::sampler::tests::{small_model, small_vocabulary};
	use rand::SeedableRng;
	use rand::rngs::StdRng;

	#[test]
	fn test_counts_sum_to_n_samples() {
		let model = small_model();
		let vocabulary = small_vocabulary();
		let sampler = Sampler::new(&model, &vocabulary).unwrap();
		let mut rng = StdRng::seed_from_u64(5);

		let tally = estimate_distribution(&sampler, "a", 40, 0.85, &mut rng).unwrap();
		assert_eq!(tally.values().sum::<usize>(), 40);
		assert!(tally.keys().all(|s| s.starts_with('a') && s.ends_with('\n')));
	}

	#[test]
	fn test_zero_samples() {
		let model = small_model();
		let vocabulary = small_vocabulary();
		let sampler = Sampler::new(&model, &vocabulary).unwrap();
		let mut rng = StdRng::seed_from_u64(5);

		assert!(estimate_distribution(&sampler, "a", 0, 1.0, &mut rng).unwrap().is_empty());
	}

	#[test]
	fn test_invalid_temperature() {
		let model = small_model();
		let vocabulary = small_vocabulary();
		let sampler = Sampler::new(&model, &vocabulary).unwrap();
		let mut rng = StdRng::seed_from_u64(5);

		let err = estimate_distribution(&sampler, "a", 0, 0.0, &mut rng).unwrap_err();
		assert!(matches!(err, Error::InvalidTemperature(_)));
	}
}
