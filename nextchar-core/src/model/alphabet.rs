use std::borrow::Cow;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Number of candidate next characters: 26 letters plus the boundary slot.
pub const SLOT_COUNT: usize = 27;

/// Symbol used to render the boundary slot in a ranking.
pub const BOUNDARY_CHAR: char = '_';

/// The fixed candidate alphabet, in tie-break order.
pub const ALPHABET: [char; SLOT_COUNT] = [
	'a', 'b', 'c', 'd', 'e', 'f', 'g', 'h', 'i', 'j', 'k', 'l', 'm',
	'n', 'o', 'p', 'q', 'r', 's', 't', 'u', 'v', 'w', 'x', 'y', 'z',
	BOUNDARY_CHAR,
];

/// Index of a next-character bucket in a count row.
///
/// Slots `0..26` are the letters `a`..`z` (case-insensitive). Slot `26`
/// collects everything else: space, punctuation, digits, and any non-ASCII
/// character. Every `char` therefore has exactly one slot.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Slot(u8);

impl Slot {
	/// The non-letter slot.
	pub const BOUNDARY: Slot = Slot(26);

	/// Classifies a character into its slot.
	pub fn of(c: char) -> Self {
		if c.is_ascii_alphabetic() {
			Slot(c.to_ascii_lowercase() as u8 - b'a')
		} else {
			Self::BOUNDARY
		}
	}

	/// Iterates over all slots in alphabet order.
	pub fn all() -> impl Iterator<Item = Slot> {
		(0..SLOT_COUNT as u8).map(Slot)
	}

	pub fn index(self) -> usize {
		self.0 as usize
	}

	/// The candidate character shown for this slot.
	pub fn symbol(self) -> char {
		ALPHABET[self.index()]
	}
}

impl fmt::Display for Slot {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.symbol())
	}
}

/// Case-folds a single typed character.
///
/// Only ASCII letters are folded; everything else is kept verbatim so that
/// contexts such as `" th"` and `".th"` remain distinct keys.
pub fn fold(c: char) -> char {
	c.to_ascii_lowercase()
}

/// Normalizes a context string into a table key.
///
/// Borrows when the context is already folded, which is the common case
/// for contexts built from history.
pub fn context_key(context: &str) -> Cow<'_, str> {
	if context.bytes().any(|b| b.is_ascii_uppercase()) {
		Cow::Owned(context.chars().map(fold).collect())
	} else {
		Cow::Borrowed(context)
	}
}
