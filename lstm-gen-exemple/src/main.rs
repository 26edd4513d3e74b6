use lstm_gen_core::device::choose_device;
use lstm_gen_core::{Sampler, SequenceModel, Vocabulary, estimate_distribution};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // Load the model written by `lstm-gen-train`
    // The architecture is read back from the file itself
    let model = SequenceModel::load("case_predictor.bin", &choose_device())?;

    // Must be the vocabulary the model was trained with
    let vocabulary = Vocabulary::default();

    // Give up on a completion after 500 characters without a newline
    let sampler = Sampler::new(&model, &vocabulary)?.with_completion_limit(500);

    let mut rng = rand::rng();

    // Fixed-length generation: the prompt is followed by exactly 100 characters
    for prompt in ["in insul", "ab insul", "de insul", "in memori", "a memori", "de memori"] {
        println!("{}", sampler.generate(prompt, 100, 0.85, &mut rng)?);
        println!();
    }

    // Completion stops at the first sampled newline
    print!("{}", sampler.complete("de memori", 0.85, &mut rng)?);

    // Completion of a random Latin preposition
    print!("{}", sampler.random_prediction(0.85, &mut rng)?);

    // A temperature must be strictly positive
    match sampler.generate("a", 10, 0.0, &mut rng) {
        Ok(_) => println!("Should not happen"),
        Err(e) => println!("{}", e),
    }

    // Empirical distribution of the completions of "in memori"
    // Counts are raw, normalize them here
    let n = 200;
    let tally = estimate_distribution(&sampler, "in memori", n, 0.85, &mut rng)?;
    let mut outcomes: Vec<(String, usize)> = tally.into_iter().collect();
    outcomes.sort_by(|a, b| b.1.cmp(&a.1));
    for (completion, count) in outcomes.iter().take(10) {
        println!("{:.3} {}", *count as f64 / n as f64, completion.trim_end());
    }

    Ok(())
}
