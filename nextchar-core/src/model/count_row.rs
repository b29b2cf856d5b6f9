use serde::{Deserialize, Serialize};

use super::alphabet::{SLOT_COUNT, Slot};

/// Next-character counts observed after one context.
///
/// A row belongs to exactly one context in exactly one table. Counts are
/// non-negative by construction and only ever grow in session tables.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct CountRow {
	counts: [u64; SLOT_COUNT],
}

impl CountRow {
	/// The row every unseen context implicitly has.
	pub const ZERO: CountRow = CountRow { counts: [0; SLOT_COUNT] };

	pub fn get(&self, slot: Slot) -> u64 {
		self.counts[slot.index()]
	}

	/// Overwrites the count for `slot` (corpus semantics: last write wins).
	pub fn set(&mut self, slot: Slot, count: u64) {
		self.counts[slot.index()] = count;
	}

	/// Records one more occurrence of `slot`.
	///
	/// Saturates instead of wrapping so counts never decrease.
	pub fn increment(&mut self, slot: Slot) {
		let count = &mut self.counts[slot.index()];
		*count = count.saturating_add(1);
	}

	pub fn is_zero(&self) -> bool {
		self.counts.iter().all(|&c| c == 0)
	}

	/// Iterates over `(slot, count)` pairs in alphabet order.
	pub fn iter(&self) -> impl Iterator<Item = (Slot, u64)> + '_ {
		Slot::all().map(|slot| (slot, self.get(slot)))
	}
}

impl Default for CountRow {
	fn default() -> Self {
		Self::ZERO
	}
}
