use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use std::{fs, io};

/// Reads a text file and flattens it to ASCII.
///
/// - Reads the entire file into memory
/// - Folds `\r\n` and lone `\r` line endings to `\n`
/// - Transliterates every non-ASCII character (see [`to_ascii`])
pub(crate) fn read_ascii_text<P: AsRef<Path>>(filename: P) -> io::Result<String> {
	let mut contents = String::new();
	File::open(filename)?.read_to_string(&mut contents)?;
	Ok(to_ascii(&contents.replace("\r\n", "\n").replace('\r', "\n")))
}

/// Replaces each non-ASCII character by its closest ASCII approximation
/// (`"é"` → `"e"`, `"æ"` → `"ae"`).
///
/// ASCII characters, newlines included, are copied unchanged. A character
/// with no known approximation is kept as is, so the vocabulary check
/// reports it.
pub(crate) fn to_ascii(text: &str) -> String {
	let mut ascii = String::with_capacity(text.len());
	for c in text.chars() {
		if c.is_ascii() {
			ascii.push(c);
		} else {
			match deunicode::deunicode_char(c) {
				Some(replacement) => ascii.push_str(replacement),
				None => ascii.push(c),
			}
		}
	}
	ascii
}

/// Writes `bytes` to `path` through a temporary sibling file, then renames it.
///
/// A crash mid-write leaves the previous file (if any) untouched.
pub(crate) fn write_atomic<P: AsRef<Path>>(path: P, bytes: &[u8]) -> io::Result<()> {
	let path = path.as_ref();
	let mut tmp = path.as_os_str().to_owned();
	tmp.push(".tmp");

	{
		let mut file = File::create(&tmp)?;
		file.write_all(bytes)?;
		file.flush()?;
	}
	fs::rename(&tmp, path)
}
