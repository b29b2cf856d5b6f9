use std::sync::Arc;

use super::alphabet::Slot;
use super::corpus::CorpusTable;
use super::count_row::CountRow;
use super::frequency_table::FrequencyTable;

/// The two count tables a session ranks from.
///
/// # Responsibilities
/// - Hold a shared, read-only corpus table
/// - Own the session table, which starts empty and only grows
///
/// Reads never mutate either table; only `increment_session_count` writes,
/// and only to the session table.
#[derive(Clone, Debug)]
pub struct FrequencyStore {
	corpus: Arc<CorpusTable>,
	session: FrequencyTable,
}

impl FrequencyStore {
	/// Creates a store over `corpus` with an empty session table.
	pub fn new(corpus: Arc<CorpusTable>) -> Self {
		Self { corpus, session: FrequencyTable::new() }
	}

	pub fn get_corpus_count(&self, context: &str, slot: Slot) -> u64 {
		self.corpus.count(context, slot)
	}

	pub fn get_session_count(&self, context: &str, slot: Slot) -> u64 {
		self.session.count(context, slot)
	}

	/// Records one accepted `slot` after `context` in the session table.
	pub fn increment_session_count(&mut self, context: &str, slot: Slot) {
		self.session.increment(context, slot);
	}

	/// Both rows for `context`, zero-filled when unseen.
	pub fn rows(&self, context: &str) -> (&CountRow, &CountRow) {
		(self.corpus.row_or_zero(context), self.session.row_or_zero(context))
	}

	pub fn corpus(&self) -> &Arc<CorpusTable> {
		&self.corpus
	}

	pub fn session(&self) -> &FrequencyTable {
		&self.session
	}
}
