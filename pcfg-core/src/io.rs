use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::{fs, io};

/// On-disk encoding of checkpoints and exported grammars.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
	/// Compact binary encoding (default).
	Postcard,
	/// Human-readable encoding, selected by a `.json` extension.
	Json,
}

impl Format {
	/// Picks the format from the file extension.
	///
	/// Examples:
	/// - `model.json` → `Json`
	/// - `model.bin`, `model` → `Postcard`
	pub fn from_path<P: AsRef<Path>>(path: P) -> Self {
		match path.as_ref().extension().and_then(|e| e.to_str()) {
			Some(ext) if ext.eq_ignore_ascii_case("json") => Format::Json,
			_ => Format::Postcard,
		}
	}
}

/// Reads a whole file into memory.
pub(crate) fn read_bytes<P: AsRef<Path>>(filename: P) -> io::Result<Vec<u8>> {
	let mut contents = Vec::new();
	File::open(filename)?.read_to_end(&mut contents)?;
	Ok(contents)
}

/// Writes `bytes` in a single call, creating the parent folder if needed.
pub(crate) fn write_bytes<P: AsRef<Path>>(filename: P, bytes: &[u8]) -> io::Result<()> {
	let filename = filename.as_ref();
	if let Some(parent) = filename.parent() {
		if !parent.as_os_str().is_empty() {
			fs::create_dir_all(parent)?;
		}
	}
	File::create(filename)?.write_all(bytes)
}

/// Builds an output path based on an input path and a new extension.
///
/// Example:
/// `models/run1.bin` + `"pcfg"` → `models/run1.pcfg`
pub fn build_output_path<P: AsRef<Path>>(
	input_path: P,
	output_extension: &str,
) -> io::Result<PathBuf> {
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
