use std::path::Path;

use log::{debug, info};
use rand::Rng;

use crate::error::{Error, Result};
use crate::io::read_ascii_text;
use crate::vocabulary::Vocabulary;

/// One next-character prediction example.
///
/// `target_ids[i]` is the character following `input_ids[i]` in the corpus.
#[derive(Clone, Debug, PartialEq)]
pub struct TrainingExample {
	/// Offset of `input_ids[0]` in the corpus.
	pub start: usize,
	pub input_ids: Vec<u32>,
	pub target_ids: Vec<u32>,
}

/// Training text held in memory together with its encoded form.
///
/// # Invariants
/// - Every character of `text` belongs to the vocabulary it was loaded with
/// - `ids.len()` equals the number of characters of `text`
#[derive(Clone, Debug)]
pub struct Corpus {
	text: String,
	ids: Vec<u32>,
}

impl Corpus {
	/// Loads a corpus file, transliterating it to ASCII first.
	///
	/// # Errors
	/// - `Io` if the file cannot be read
	/// - `OutOfVocabulary` for the first character the vocabulary cannot encode
	pub fn from_file<P: AsRef<Path>>(filepath: P, vocabulary: &Vocabulary) -> Result<Self> {
		let text = read_ascii_text(&filepath)?;
		let corpus = Self::from_text(text, vocabulary)?;
		info!("Loaded corpus {} ({} characters)", filepath.as_ref().display(), corpus.len());
		Ok(corpus)
	}

	/// Builds a corpus from text that is already restricted to `vocabulary`.
	pub fn from_text<S: Into<String>>(text: S, vocabulary: &Vocabulary) -> Result<Self> {
		let text = text.into();
		let ids = vocabulary.encode(&text)?;
		Ok(Self { text, ids })
	}

	/// Number of characters (`L`).
	pub fn len(&self) -> usize {
		self.ids.len()
	}

	pub fn is_empty(&self) -> bool {
		self.ids.is_empty()
	}

	pub fn text(&self) -> &str {
		&self.text
	}

	pub fn ids(&self) -> &[u32] {
		&self.ids
	}

	/// Fails with `CorpusTooShort` unless a chunk of `chunk_len` inputs
	/// (plus the final target) fits in the corpus.
	pub fn check_chunk_len(&self, chunk_len: usize) -> Result<()> {
		if self.len() < chunk_len + 1 {
			return Err(Error::CorpusTooShort { len: self.len(), chunk_len });
		}
		Ok(())
	}

	/// Draws a random chunk of `chunk_len + 1` characters and splits it into
	/// shifted input and target sequences.
	///
	/// The start offset is uniform in `[0, L - chunk_len - 1]`, so a corpus of
	/// exactly `chunk_len + 1` characters always yields offset 0.
	pub fn random_example<R: Rng + ?Sized>(&self, chunk_len: usize, rng: &mut R) -> Result<TrainingExample> {
		self.check_chunk_len(chunk_len)?;

		let start = rng.random_range(0..=self.len() - chunk_len - 1);
		debug!("Sampled chunk at offset {}", start);
		Ok(self.example_at(start, chunk_len))
	}

	/// Example starting at `start`. The caller guarantees the chunk fits.
	fn example_at(&self, start: usize, chunk_len: usize) -> TrainingExample {
		let chunk = &self.ids[start..start + chunk_len + 1];
		TrainingExample {
			start,
			input_ids: chunk[..chunk_len].to_vec(),
			target_ids: chunk[1..].to_vec(),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rand::SeedableRng;
	use rand::rngs::StdRng;

	#[test]
	fn test_examples_are_shifted_by_one() {
		let vocabulary = Vocabulary::default();
		let corpus = Corpus::from_text("in memoria aeterna erit iustus\n", &vocabulary).unwrap();
		let mut rng = StdRng::seed_from_u64(7);

		for _ in 0..200 {
			let example = corpus.random_example(10, &mut rng).unwrap();
			assert_eq!(example.input_ids.len(), 10);
			assert_eq!(example.target_ids.len(), 10);
			for i in 0..10 {
				assert_eq!(example.input_ids[i], corpus.ids()[example.start + i]);
				assert_eq!(example.target_ids[i], corpus.ids()[example.start + i + 1]);
			}
		}
	}

	#[test]
	fn test_chunk_of_whole_corpus_minus_one() {
		let vocabulary = Vocabulary::new("ab \n").unwrap();
		let corpus = Corpus::from_text("ab ab ab\n", &vocabulary).unwrap();
		let mut rng = StdRng::seed_from_u64(0);

		let example = corpus.random_example(corpus.len() - 1, &mut rng).unwrap();
		assert_eq!(example.start, 0);
		assert_eq!(vocabulary.decode(&example.input_ids).unwrap(), "ab ab ab");
		assert_eq!(vocabulary.decode(&example.target_ids).unwrap(), "b ab ab\n");
	}

	#[test]
	fn test_corpus_too_short() {
		let vocabulary = Vocabulary::default();
		let corpus = Corpus::from_text("abc", &vocabulary).unwrap();
		let mut rng = StdRng::seed_from_u64(0);

		let err = corpus.random_example(3, &mut rng).unwrap_err();
		assert!(matches!(err, Error::CorpusTooShort { len: 3, chunk_len: 3 }));
	}

	#[test]
	fn test_out_of_vocabulary_corpus() {
		let vocabulary = Vocabulary::default();
		let err = Corpus::from_text("Gallia est omnis divisa", &vocabulary).unwrap_err();
		assert!(matches!(err, Error::OutOfVocabulary('G')));
	}

	#[test]
	fn test_from_file_transliterates() {
		let path = std::env::temp_dir().join(format!("lstm-gen-corpus-{}.txt", std::process::id()));
		std::fs::write(&path, "cæsar\n").unwrap();

		let corpus = Corpus::from_file(&path, &Vocabulary::default()).unwrap();
		assert_eq!(corpus.text(), "caesar\n");
		assert_eq!(corpus.len(), 7);

		std::fs::remove_file(&path).unwrap();
	}

	#[test]
	fn test_from_file_keeps_line_structure() {
		let path = std::env::temp_dir().join(format!("lstm-gen-corpus-lines-{}.txt", std::process::id()));
		std::fs::write(&path, "in insula\r\nde memori\u{101}\nab urbe\n").unwrap();

		let corpus = Corpus::from_file(&path, &Vocabulary::default()).unwrap();
		assert_eq!(corpus.text(), "in insula\nde memoria\nab urbe\n");
		assert_eq!(corpus.text().matches('\n').count(), 3);

		std::fs::remove_file(&path).unwrap();
	}
}
