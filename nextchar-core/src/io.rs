use std::ffi::OsStr;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::{env, fs, io};

/// Extension of plain-text corpus files (`word|count` lines).
pub const CORPUS_EXTENSION: &str = "dat";

/// Extension of the binary corpus cache written next to a corpus file.
pub(crate) const CACHE_EXTENSION: &str = "bin";

/// Reads a corpus file line by line.
///
/// A trailing `\r` is left on each line; record parsing strips it.
pub(crate) fn read_lines<P: AsRef<Path>>(path: P) -> io::Result<Vec<String>> {
	BufReader::new(File::open(path)?).lines().collect()
}

/// Returns the cache path of a corpus file.
///
/// Example:
/// `data/freqs.dat` → `data/freqs.bin`
pub(crate) fn cache_path<P: AsRef<Path>>(corpus_path: P) -> io::Result<PathBuf> {
	let corpus_path = corpus_path.as_ref();
	if corpus_path.file_stem().is_none() {
		return Err(io::Error::new(io::ErrorKind::InvalidInput, "Corpus path has no filename"));
	}
	Ok(corpus_path.with_extension(CACHE_EXTENSION))
}

/// Extracts the corpus name (file name without extension).
///
/// `"./data/freqs.dat"` → `"freqs"`
pub(crate) fn corpus_name<P: AsRef<Path>>(path: P) -> io::Result<String> {
	let stem = path
		.as_ref()
		.file_stem()
		.ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "Path has no filename"))?;

	Ok(stem.to_string_lossy().to_string())
}

/// Normalize a folder path.
///
/// `"."` and `"./"` resolve to the current working directory, other paths
/// are returned as-is.
pub fn normalize_folder(input: &str) -> PathBuf {
	if input == "." || input == "./" {
		env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
	} else {
		PathBuf::from(input)
	}
}

/// Lists the corpus names (`*.dat` files, extension stripped) in `dir`.
///
/// Names are sorted so listings are stable.
pub fn list_corpora<P: AsRef<Path>>(dir: P) -> io::Result<Vec<String>> {
	let mut names = Vec::new();

	for entry in fs::read_dir(dir)? {
		let path = entry?.path();
		if path.is_file() && path.extension() == Some(OsStr::new(CORPUS_EXTENSION)) {
			names.push(corpus_name(&path)?);
		}
	}

	names.sort();
	Ok(names)
}
