use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::StoreError;

/// Reads several training files and joins them with newlines.
///
/// The boundary between two files is a line boundary, so the last line of one
/// file never runs into the first line of the next.
pub fn read_corpus<P: AsRef<Path>>(paths: &[P]) -> io::Result<String> {
	let mut texts = Vec::with_capacity(paths.len());
	for path in paths {
		texts.push(fs::read_to_string(path)?);
	}
	Ok(texts.join("\n"))
}

/// Builds an output path based on an input path and a new extension.
///
/// Example:
/// `data/input.txt` + `"bin"` → `data/input.bin`
pub fn build_output_path<P: AsRef<Path>>(input_path: P, output_extension: &str) -> io::Result<PathBuf> {
	let input_path = input_path.as_ref();

	let parent = input_path.parent().unwrap_or_else(|| Path::new("."));
	let file_stem = input_path
		.file_stem()
		.ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "Input path has no filename"))?;

	let mut output = PathBuf::from(parent);
	output.push(file_stem);
	output.set_extension(output_extension);

	Ok(output)
}

/// Serializes `value` with `postcard` and writes it to `path`.
pub(crate) fn write_binary<P: AsRef<Path>, T: Serialize>(path: P, value: &T) -> Result<(), StoreError> {
	let bytes = postcard::to_stdvec(value)?;
	fs::write(path, bytes)?;
	Ok(())
}

/// Reads a `postcard` value written by [`write_binary`].
pub(crate) fn read_binary<P: AsRef<Path>, T: DeserializeOwned>(path: P) -> Result<T, StoreError> {
	let bytes = fs::read(path)?;
	Ok(postcard::from_bytes(&bytes)?)
}
