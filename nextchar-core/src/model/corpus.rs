use std::fs;
use std::io;
use std::path::Path;
use std::sync::mpsc;
use std::thread;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use super::alphabet::Slot;
use super::count_row::CountRow;
use super::frequency_table::FrequencyTable;
use crate::error::LoadError;
use crate::io::{cache_path, read_lines};

/// Number of parsing chunks per CPU when loading a corpus file.
const CHUNK_FACTOR: usize = 8;

/// One parsed corpus line.
///
/// A line `"<word>|<count>"` says that after the context `word[..last]`
/// the character `word[last]` was observed `count` times.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorpusRecord {
	pub prefix: String,
	pub next: Slot,
	pub count: u64,
}

impl CorpusRecord {
	/// Parses one line of a corpus source.
	///
	/// `line_number` is 1-based and only used for error reporting.
	///
	/// # Errors
	/// - `MissingSeparator` / `TooManyFields` unless there is exactly one `|`
	///   (an empty line is missing its separator)
	/// - `EmptyWord` if nothing precedes the `|`
	/// - `InvalidCount` unless the count is a base-10 non-negative integer
	///   (surrounding whitespace is tolerated)
	pub fn parse(line_number: usize, line: &str) -> Result<Self, LoadError> {
		let text = line.trim_end_matches(['\r', '\n']);

		let Some((word, count)) = text.split_once('|') else {
			return Err(LoadError::MissingSeparator { line: line_number, text: text.to_owned() });
		};
		if count.contains('|') {
			return Err(LoadError::TooManyFields { line: line_number, text: text.to_owned() });
		}

		let mut chars = word.chars();
		let Some(next) = chars.next_back() else {
			return Err(LoadError::EmptyWord { line: line_number, text: text.to_owned() });
		};

		let count = count
			.trim()
			.parse::<u64>()
			.map_err(|_| LoadError::InvalidCount { line: line_number, count: count.to_owned() })?;

		Ok(Self {
			prefix: chars.as_str().to_owned(),
			next: Slot::of(next),
			count,
		})
	}
}

/// Parses a run of lines whose first line has number `first_line`.
fn parse_chunk<S: AsRef<str>>(first_line: usize, lines: &[S]) -> Result<Vec<CorpusRecord>, LoadError> {
	lines
		.iter()
		.enumerate()
		.map(|(offset, line)| CorpusRecord::parse(first_line + offset, line.as_ref()))
		.collect()
}

/// Static, pre-trained next-character counts.
///
/// Built once from a corpus source and never modified afterwards: the type
/// exposes no mutating method once constructed. Sessions share it through
/// an `Arc`.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct CorpusTable {
	table: FrequencyTable,
}

impl CorpusTable {
	/// Builds a table from `word|count` lines, in order.
	///
	/// Duplicate `(prefix, next)` pairs keep the last count seen.
	///
	/// # Errors
	/// Returns the first malformed record's error. No partial table is
	/// returned.
	pub fn from_records<I, S>(lines: I) -> Result<Self, LoadError>
	where
		I: IntoIterator<Item = S>,
		S: AsRef<str>,
	{
		let mut corpus = Self::default();
		for (index, line) in lines.into_iter().enumerate() {
			corpus.apply(CorpusRecord::parse(index + 1, line.as_ref())?);
		}
		Ok(corpus)
	}

	/// Loads a corpus file, using its binary cache when available.
	///
	/// - If `<name>.bin` exists next to `<name>.dat` and is not older than
	///   it, the cache is decoded with `postcard`.
	/// - Otherwise the text file is parsed with `from_lines_parallel` and the
	///   cache is (re)written for the next start. A failed cache write is
	///   logged and otherwise ignored.
	///
	/// # Errors
	/// `LoadError::Io` if the file cannot be read, `LoadError::Cache` if the
	/// cache exists but cannot be decoded, or any record error.
	pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, LoadError> {
		let path = path.as_ref();
		let cache = cache_path(path)?;

		if Self::cache_is_fresh(path, &cache) {
			debug!("Loading corpus cache {}", cache.display());
			let bytes = fs::read(&cache)?;
			return postcard::from_bytes(&bytes).map_err(|source| LoadError::Cache { path: cache, source });
		}

		debug!("Parsing corpus {}", path.display());
		let corpus = Self::from_lines_parallel(read_lines(path)?)?;
		debug!("Corpus {} holds {} contexts", path.display(), corpus.len());

		if let Err(e) = corpus.write_cache(&cache) {
			warn!("Could not write corpus cache {}: {e}", cache.display());
		}

		Ok(corpus)
	}

	/// Parses lines on worker threads and applies the results in line order.
	///
	/// # Behavior
	/// - Splits the lines into `CPUs * CHUNK_FACTOR` chunks.
	/// - Each thread parses one chunk into records and sends them back
	///   tagged with the chunk index.
	/// - Records are applied chunk by chunk, so the result is identical to
	///   `from_records` (including last-write-wins across chunks).
	/// - The reported error, if any, is the one with the lowest line number.
	pub fn from_lines_parallel(lines: Vec<String>) -> Result<Self, LoadError> {
		if lines.is_empty() {
			return Ok(Self::default());
		}

		let chunks = num_cpus::get() * CHUNK_FACTOR;
		let chunk_size = lines.len().div_ceil(chunks);

		let (tx, rx) = mpsc::channel();
		let mut spawned = 0;
		for (index, chunk) in lines.chunks(chunk_size).enumerate() {
			let tx = tx.clone();
			let chunk: Vec<String> = chunk.to_vec();
			let first_line = index * chunk_size + 1;

			thread::spawn(move || {
				// The receiver only goes away once every chunk is collected
				let _ = tx.send((index, parse_chunk(first_line, &chunk)));
			});
			spawned += 1;
		}
		drop(tx);

		let mut parsed: Vec<Option<Result<Vec<CorpusRecord>, LoadError>>> = (0..spawned).map(|_| None).collect();
		for (index, result) in rx.iter() {
			parsed[index] = Some(result);
		}

		let mut corpus = Self::default();
		for result in parsed {
			let records = result.ok_or_else(|| io::Error::other("corpus parser thread exited early"))??;
			for record in records {
				corpus.apply(record);
			}
		}
		Ok(corpus)
	}

	fn apply(&mut self, record: CorpusRecord) {
		self.table.set(&record.prefix, record.next, record.count);
	}

	/// A cache is usable when it exists and its source is missing or older.
	fn cache_is_fresh(corpus: &Path, cache: &Path) -> bool {
		let Ok(cached) = fs::metadata(cache).and_then(|m| m.modified()) else {
			return false;
		};
		match fs::metadata(corpus).and_then(|m| m.modified()) {
			Ok(source) => cached >= source,
			Err(_) => true,
		}
	}

	fn write_cache(&self, cache: &Path) -> io::Result<()> {
		let bytes = postcard::to_stdvec(self).map_err(io::Error::other)?;
		fs::write(cache, bytes)
	}

	/// Returns the stored count, `0` for unseen contexts.
	pub fn count(&self, context: &str, slot: Slot) -> u64 {
		self.table.count(context, slot)
	}

	pub fn row_or_zero(&self, context: &str) -> &CountRow {
		self.table.row_or_zero(context)
	}

	/// Number of contexts with at least one stored count.
	pub fn len(&self) -> usize {
		self.table.len()
	}

	pub fn is_empty(&self) -> bool {
		self.table.is_empty()
	}

	/// Read-only view of the underlying table.
	pub fn table(&self) -> &FrequencyTable {
		&self.table
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn slot(c: char) -> Slot {
		Slot::of(c)
	}

	#[test]
	fn parse_splits_prefix_and_next_character() {
		let record = CorpusRecord::parse(1, "the|50").unwrap();
		assert_eq!(record, CorpusRecord { prefix: "th".to_owned(), next: slot('e'), count: 50 });
	}

	#[test]
	fn parse_single_character_word_has_empty_prefix() {
		let record = CorpusRecord::parse(1, "a|9").unwrap();
		assert_eq!(record.prefix, "");
		assert_eq!(record.next, slot('a'));
	}

	#[test]
	fn parse_keeps_spaces_inside_word() {
		let record = CorpusRecord::parse(1, " th |4").unwrap();
		assert_eq!(record.prefix, " th");
		assert_eq!(record.next, Slot::BOUNDARY);
	}

	#[test]
	fn parse_tolerates_whitespace_around_count() {
		let record = CorpusRecord::parse(1, "ab| 12 \r").unwrap();
		assert_eq!(record.count, 12);
	}

	#[test]
	fn parse_rejects_empty_lines() {
		assert!(matches!(
			CorpusRecord::parse(3, ""),
			Err(LoadError::MissingSeparator { line: 3, .. })
		));
		assert!(matches!(
			CorpusRecord::parse(3, "\r"),
			Err(LoadError::MissingSeparator { line: 3, .. })
		));
	}

	#[test]
	fn parse_accepts_counts_beyond_u32() {
		let record = CorpusRecord::parse(1, "e|5000000000").unwrap();
		assert_eq!(record.prefix, "");
		assert_eq!(record.count, 5_000_000_000);
	}

	#[test]
	fn parse_rejects_malformed_lines() {
		assert!(matches!(
			CorpusRecord::parse(2, "the50"),
			Err(LoadError::MissingSeparator { line: 2, .. })
		));
		assert!(matches!(
			CorpusRecord::parse(4, "a|b|3"),
			Err(LoadError::TooManyFields { line: 4, .. })
		));
		assert!(matches!(CorpusRecord::parse(5, "|3"), Err(LoadError::EmptyWord { line: 5, .. })));
		assert!(matches!(
			CorpusRecord::parse(6, "ab|x"),
			Err(LoadError::InvalidCount { line: 6, .. })
		));
		assert!(matches!(
			CorpusRecord::parse(7, "ab|-1"),
			Err(LoadError::InvalidCount { line: 7, .. })
		));
		assert!(matches!(
			CorpusRecord::parse(8, "   "),
			Err(LoadError::MissingSeparator { line: 8, .. })
		));
	}

	#[test]
	fn from_records_last_write_wins() {
		let corpus = CorpusTable::from_records(["the|50", "the|7", "thy|2"]).unwrap();
		assert_eq!(corpus.count("th", slot('e')), 7);
		assert_eq!(corpus.count("th", slot('y')), 2);
		assert_eq!(corpus.len(), 1);
	}

	#[test]
	fn from_records_reports_line_of_first_error() {
		let err = CorpusTable::from_records(["the|50", "oops", "x|y"]).unwrap_err();
		assert_eq!(err.line(), Some(2));
	}

	#[test]
	fn blank_interior_line_fails_the_whole_load() {
		let err = CorpusTable::from_records(["the|50", "", "cat|3"]).unwrap_err();
		assert!(matches!(err, LoadError::MissingSeparator { line: 2, .. }));
	}

	#[test]
	fn parallel_load_matches_sequential_load() {
		// Enough lines to span many chunks, with duplicates crossing chunk boundaries
		let mut lines = Vec::new();
		for i in 0..5_000u32 {
			let a = (b'a' + (i % 26) as u8) as char;
			let b = (b'a' + (i / 26 % 26) as u8) as char;
			lines.push(format!("{a}{b}e|{i}"));
		}
		let sequential = CorpusTable::from_records(&lines).unwrap();
		let parallel = CorpusTable::from_lines_parallel(lines).unwrap();
		assert_eq!(parallel, sequential);
	}

	#[test]
	fn parallel_load_reports_lowest_line_error() {
		let mut lines: Vec<String> = (0..2_000).map(|_| "ab|1".to_owned()).collect();
		lines[1_500] = "bad".to_owned();
		lines[700] = "worse".to_owned();
		let err = CorpusTable::from_lines_parallel(lines).unwrap_err();
		assert_eq!(err.line(), Some(701));
	}

	#[test]
	fn parallel_load_of_nothing_is_empty() {
		assert!(CorpusTable::from_lines_parallel(Vec::new()).unwrap().is_empty());
	}
}
