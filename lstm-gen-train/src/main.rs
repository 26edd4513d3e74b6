use lstm_gen_core::device::choose_device;
use lstm_gen_core::{Corpus, Trainer, TrainerConfig, Vocabulary};
use log::info;

/// Training text, flattened to ASCII on load.
const CORPUS_PATH: &str = "data/data.txt";

/// Where the trained model is written.
const MODEL_PATH: &str = "case_predictor.bin";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // Lowercase letters, space and newline
    let vocabulary = Vocabulary::default();

    // Fails on the first character the vocabulary cannot encode
    let corpus = Corpus::from_file(CORPUS_PATH, &vocabulary)?;

    // chunk_len=250, epochs=5000, hidden_size=256, num_layers=2, learning_rate=0.003
    let config = TrainerConfig::default();

    let device = choose_device();
    let mut trainer = Trainer::new(config, corpus, vocabulary, &device)?;

    info!("=> Starting training");
    let summary = trainer.train(&mut rand::rng())?;
    if let Some(loss) = summary.final_loss() {
        info!("Final loss after {} epochs: {}", summary.epochs, loss);
    }

    trainer.save(MODEL_PATH)?;

    Ok(())
}
