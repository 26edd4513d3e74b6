use std::collections::HashMap;

use crate::error::{Error, Result};

/// Alphabet used when no custom vocabulary is given: `a..z`, space, newline.
pub const DEFAULT_ALPHABET: &str = "abcdefghijklmnopqrstuvwxyz \n";

/// Character that ends a completion.
pub const TERMINATOR: char = '\n';

/// Fixed, ordered alphabet mapping characters to model indices and back.
///
/// ## Invariants
/// - Characters are unique and the alphabet is never empty
/// - `index_of(char_at(i)) == i` for every `i < len()`
#[derive(Clone, Debug, PartialEq)]
pub struct Vocabulary {
	/// Characters in index order.
	chars: Vec<char>,
	/// Reverse lookup of `chars`.
	indices: HashMap<char, u32>,
}

impl Default for Vocabulary {
	fn default() -> Self {
		let chars: Vec<char> = DEFAULT_ALPHABET.chars().collect();
		let indices = chars.iter().enumerate().map(|(i, &c)| (c, i as u32)).collect();
		Self { chars, indices }
	}
}

impl Vocabulary {
	/// Builds a vocabulary from an alphabet, in the order given.
	///
	/// # Errors
	/// Returns `InvalidVocabulary` if the alphabet is empty or repeats a character.
	pub fn new(alphabet: &str) -> Result<Self> {
		let mut chars = Vec::new();
		let mut indices = HashMap::new();

		for c in alphabet.chars() {
			if indices.insert(c, chars.len() as u32).is_some() {
				return Err(Error::InvalidVocabulary(format!("duplicate character {:?}", c)));
			}
			chars.push(c);
		}

		if chars.is_empty() {
			return Err(Error::InvalidVocabulary("alphabet is empty".to_owned()));
		}

		Ok(Self { chars, indices })
	}

	/// Number of characters (`V`).
	pub fn len(&self) -> usize {
		self.chars.len()
	}

	pub fn is_empty(&self) -> bool {
		self.chars.is_empty()
	}

	/// Characters in index order.
	pub fn chars(&self) -> &[char] {
		&self.chars
	}

	pub fn contains(&self, c: char) -> bool {
		self.indices.contains_key(&c)
	}

	/// Index of `c`.
	///
	/// # Errors
	/// Returns `OutOfVocabulary` if `c` is not part of the alphabet.
	pub fn index_of(&self, c: char) -> Result<u32> {
		self.indices.get(&c).copied().ok_or(Error::OutOfVocabulary(c))
	}

	/// Character stored at `index`.
	///
	/// # Errors
	/// Returns `IndexOutOfRange` if `index >= len()`.
	pub fn char_at(&self, index: usize) -> Result<char> {
		self.chars.get(index).copied().ok_or(Error::IndexOutOfRange { index, size: self.chars.len() })
	}

	/// Encodes every character of `text`, one index per character.
	pub fn encode(&self, text: &str) -> Result<Vec<u32>> {
		text.chars().map(|c| self.index_of(c)).collect()
	}

	/// Inverse of [`Vocabulary::encode`].
	pub fn decode(&self, indices: &[u32]) -> Result<String> {
		indices.iter().map(|&i| self.char_at(i as usize)).collect()
	}
}
