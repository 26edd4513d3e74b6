use candle_core::Device;
use lstm_gen_core::{
	Corpus, Error, ModelConfig, Sampler, SequenceModel, Trainer, TrainerConfig, Vocabulary, estimate_distribution,
};
use rand::SeedableRng;
use rand::rngs::StdRng;

fn tiny_trainer(epochs: usize) -> Trainer {
	let vocabulary = Vocabulary::new("ab \n").unwrap();
	let corpus = Corpus::from_text("ab ab ab\n", &vocabulary).unwrap();
	let config = TrainerConfig {
		chunk_len: 4,
		epochs,
		hidden_size: 16,
		num_layers: 2,
		progress_interval: 2,
		sample_len: 10,
		..TrainerConfig::default()
	};
	Trainer::new(config, corpus, vocabulary, &Device::Cpu).unwrap()
}

#[test]
fn train_then_complete() {
	let mut trainer = tiny_trainer(5);
	let mut rng = StdRng::seed_from_u64(2024);
	trainer.train(&mut rng).unwrap();

	let sampler = trainer.sampler().unwrap();
	let completion = sampler.complete("a", 0.8, &mut StdRng::seed_from_u64(7)).unwrap();
	assert!(completion.starts_with('a'));
	assert!(completion.ends_with('\n'));

	let again = sampler.complete("a", 0.8, &mut StdRng::seed_from_u64(7)).unwrap();
	assert_eq!(completion, again);
}

#[test]
fn trained_model_survives_a_reload() {
	let path = std::env::temp_dir().join(format!("lstm-gen-e2e-{}.bin", std::process::id()));
	let mut trainer = tiny_trainer(3);
	trainer.train(&mut StdRng::seed_from_u64(1)).unwrap();
	trainer.save(&path).unwrap();

	let expected = *trainer.model().config();
	let reloaded = SequenceModel::load_expecting(&path, &expected, &Device::Cpu).unwrap();
	let vocabulary = trainer.vocabulary().clone();

	let original = trainer.sampler().unwrap().generate("ab", 20, 0.9, &mut StdRng::seed_from_u64(5)).unwrap();
	let restored = Sampler::new(&reloaded, &vocabulary)
		.unwrap()
		.generate("ab", 20, 0.9, &mut StdRng::seed_from_u64(5))
		.unwrap();
	assert_eq!(original, restored);

	let default_shape = ModelConfig { vocab_size: 4, ..ModelConfig::default() };
	let err = SequenceModel::load_expecting(&path, &default_shape, &Device::Cpu).err().unwrap();
	assert!(matches!(err, Error::ModelShapeMismatch(_)));

	std::fs::remove_file(&path).unwrap();
}

#[test]
fn estimate_after_training() {
	let mut trainer = tiny_trainer(4);
	trainer.train(&mut StdRng::seed_from_u64(3)).unwrap();

	let sampler = trainer.sampler().unwrap();
	let tally = estimate_distribution(&sampler, "ab", 25, 0.85, &mut StdRng::seed_from_u64(4)).unwrap();
	assert_eq!(tally.values().sum::<usize>(), 25);

	let total: f64 = tally.values().map(|&count| count as f64 / 25.0).sum();
	assert!((total - 1.0).abs() < 1e-9);
}
