use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::alphabet::{Slot, context_key};
use super::count_row::CountRow;

/// Mapping from a context (a short suffix of typed text) to its count row.
///
/// The `FrequencyTable` backs both the corpus and the session tables. Keys
/// are case-folded on every access, so `"Th"` and `"th"` address the same
/// row.
///
/// # Invariants
/// - A context with no stored row reads as [`CountRow::ZERO`]
/// - Stored rows are only created by `set` or `increment`
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct FrequencyTable {
	rows: HashMap<String, CountRow>,
}

impl FrequencyTable {
	pub fn new() -> Self {
		Self { rows: HashMap::new() }
	}

	/// Returns the row for `context`, or the zero row if it was never seen.
	pub fn row_or_zero(&self, context: &str) -> &CountRow {
		self.rows.get(&*context_key(context)).unwrap_or(&CountRow::ZERO)
	}

	/// Returns the stored count, `0` for unseen contexts.
	pub fn count(&self, context: &str, slot: Slot) -> u64 {
		self.row_or_zero(context).get(slot)
	}

	/// Overwrites a single count, creating the row if needed.
	pub fn set(&mut self, context: &str, slot: Slot, count: u64) {
		self.row_mut(context).set(slot, count);
	}

	/// Adds one occurrence, creating the row on first touch.
	pub fn increment(&mut self, context: &str, slot: Slot) {
		self.row_mut(context).increment(slot);
	}

	fn row_mut(&mut self, context: &str) -> &mut CountRow {
		self.rows.entry(context_key(context).into_owned()).or_default()
	}

	/// Number of contexts with a stored row.
	pub fn len(&self) -> usize {
		self.rows.len()
	}

	pub fn is_empty(&self) -> bool {
		self.rows.is_empty()
	}

	/// Iterates over stored contexts and their rows, in no particular order.
	pub fn iter(&self) -> impl Iterator<Item = (&str, &CountRow)> {
		self.rows.iter().map(|(k, v)| (k.as_str(), v))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn unseen_context_reads_as_zero() {
		let table = FrequencyTable::new();
		assert_eq!(table.row_or_zero("zzz"), &CountRow::ZERO);
		assert_eq!(table.count("", Slot::of('a')), 0);
		// Reads never create rows
		assert!(table.is_empty());
	}

	#[test]
	fn increment_creates_row_on_first_touch() {
		let mut table = FrequencyTable::new();
		table.increment("th", Slot::of('e'));
		table.increment("th", Slot::of('e'));
		assert_eq!(table.len(), 1);
		assert_eq!(table.count("th", Slot::of('e')), 2);
		assert_eq!(table.count("th", Slot::of('a')), 0);
	}

	#[test]
	fn keys_are_case_folded() {
		let mut table = FrequencyTable::new();
		table.set("TH", Slot::of('E'), 7);
		assert_eq!(table.count("th", Slot::of('e')), 7);
		assert_eq!(table.count("Th", Slot::of('e')), 7);
		assert_eq!(table.len(), 1);
	}

	#[test]
	fn contexts_of_different_length_are_distinct() {
		let mut table = FrequencyTable::new();
		table.set("h", Slot::of('e'), 1);
		table.set("th", Slot::of('e'), 2);
		table.set(" th", Slot::of('e'), 3);
		assert_eq!(table.count("h", Slot::of('e')), 1);
		assert_eq!(table.count("th", Slot::of('e')), 2);
		assert_eq!(table.count(" th", Slot::of('e')), 3);
	}
}
