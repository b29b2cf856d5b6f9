use std::cmp::Ordering;
use std::collections::VecDeque;
use std::path::Path;
use std::sync::Arc;

use log::trace;

use super::alphabet::{SLOT_COUNT, Slot, fold};
use super::corpus::CorpusTable;
use super::frequency_store::FrequencyStore;
use super::settings::PredictorSettings;
use crate::error::LoadError;

/// Character the history starts with, standing for "beginning of text".
pub const HISTORY_SEED: char = ' ';

/// Minimum number of history characters kept in memory.
///
/// Only the last `max_lookback + 1` characters ever influence ranking or
/// learning; the rest is kept for display.
const HISTORY_RETENTION: usize = 64;

/// A candidate with its per-context scores, longest context first.
pub type KeyVector = (char, Vec<f64>);

/// Ranks the next character for one typing session.
///
/// # Responsibilities
/// - Score each candidate under every suffix of the recent history
/// - Order candidates by comparing those scores from the longest context
///   to the shortest (back-off ranking)
/// - Learn from accepted characters through the session table
///
/// Ranking is a pure function of (corpus, session, history): calling
/// `rank` any number of times changes nothing. Only `accept` mutates.
#[derive(Clone, Debug)]
pub struct Predictor {
	store: FrequencyStore,
	settings: PredictorSettings,
	/// Accepted characters, case-folded, seeded with `HISTORY_SEED`.
	history: VecDeque<char>,
}

impl Predictor {
	/// Starts a session over `corpus` with default settings.
	pub fn new(corpus: Arc<CorpusTable>) -> Self {
		Self::with_settings(corpus, PredictorSettings::default())
	}

	pub fn with_settings(corpus: Arc<CorpusTable>, settings: PredictorSettings) -> Self {
		Self {
			store: FrequencyStore::new(corpus),
			settings,
			history: VecDeque::from([HISTORY_SEED]),
		}
	}

	/// Builds the corpus from `word|count` lines and starts a session.
	///
	/// # Errors
	/// Any `LoadError` from parsing; the predictor is then unavailable.
	pub fn from_records<I, S>(lines: I) -> Result<Self, LoadError>
	where
		I: IntoIterator<Item = S>,
		S: AsRef<str>,
	{
		Ok(Self::new(Arc::new(CorpusTable::from_records(lines)?)))
	}

	/// Loads a corpus file (see `CorpusTable::open`) and starts a session.
	pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, LoadError> {
		Ok(Self::new(Arc::new(CorpusTable::open(path)?)))
	}

	pub fn settings(&self) -> &PredictorSettings {
		&self.settings
	}

	pub fn store(&self) -> &FrequencyStore {
		&self.store
	}

	/// Retained history, oldest character first.
	pub fn history(&self) -> String {
		self.history.iter().collect()
	}

	/// Score of `candidate` after one specific `context`.
	///
	/// `max(corpus, 1) * (1 + learn_rate * session ^ exponent)`
	///
	/// The corpus term is floored at 1, so every score is at least 1.
	pub fn score(&self, context: &str, candidate: char) -> f64 {
		let slot = Slot::of(candidate);
		self.weight(self.store.get_corpus_count(context, slot), self.store.get_session_count(context, slot))
	}

	fn weight(&self, corpus: u64, session: u64) -> f64 {
		let session = (session as f64).powf(self.settings.session_exponent());
		corpus.max(1) as f64 * (1.0 + self.settings.learn_rate() * session)
	}

	/// Scores of all candidates after `context`, indexed by slot.
	fn context_scores(&self, context: &str) -> [f64; SLOT_COUNT] {
		let (corpus, session) = self.store.rows(context);
		let mut scores = [0.0; SLOT_COUNT];
		for slot in Slot::all() {
			scores[slot.index()] = self.weight(corpus.get(slot), session.get(slot));
		}
		scores
	}

	/// Key vectors of all candidates, in ranked order.
	///
	/// Only the last `max_lookback` characters of `history_tail` are used.
	/// Each vector holds one score per suffix of that window, longest
	/// first, down to the single most recent character. An empty tail gives
	/// empty vectors, and the ranking falls back to alphabet order.
	pub fn scores(&self, history_tail: &str) -> Vec<KeyVector> {
		let chars: Vec<char> = history_tail.chars().map(fold).collect();
		self.rank_window(Self::window(&chars, self.settings.max_lookback()))
	}

	/// Orders the 27 candidates, most likely next character first.
	///
	/// Always returns a permutation of `a..z` followed by the boundary
	/// symbol; candidates whose key vectors are equal keep that order.
	pub fn rank(&self, history_tail: &str) -> Vec<char> {
		self.scores(history_tail).into_iter().map(|(c, _)| c).collect()
	}

	/// Ranking for the session's own history.
	pub fn predictions(&self) -> Vec<char> {
		let chars: Vec<char> = self.history.iter().copied().collect();
		self.rank_window(Self::window(&chars, self.settings.max_lookback()))
			.into_iter()
			.map(|(c, _)| c)
			.collect()
	}

	fn window(chars: &[char], lookback: usize) -> &[char] {
		&chars[chars.len().saturating_sub(lookback)..]
	}

	fn rank_window(&self, recent: &[char]) -> Vec<KeyVector> {
		let per_context: Vec<[f64; SLOT_COUNT]> = (0..recent.len())
			.map(|start| {
				let context: String = recent[start..].iter().collect();
				self.context_scores(&context)
			})
			.collect();

		let mut keyed: Vec<KeyVector> = Slot::all()
			.map(|slot| {
				let key: Vec<f64> = per_context.iter().map(|scores| scores[slot.index()]).collect();
				(slot.symbol(), key)
			})
			.collect();

		// Stable: equal keys stay in alphabet order
		keyed.sort_by(|a, b| compare_keys(&b.1, &a.1));
		keyed
	}

	/// Appends `c` to the history and reinforces the contexts that led to it.
	///
	/// For each learned lookback `k` (see
	/// `PredictorSettings::learned_lookbacks`), the `k` characters right
	/// before `c` get one more occurrence of `c`. When fewer than `k`
	/// characters precede `c`, the whole preceding history is used instead,
	/// so early in a session the same context is reinforced once per
	/// missing length.
	///
	/// Characters outside `a..z` are counted in the boundary slot but kept
	/// verbatim in the history.
	pub fn accept(&mut self, c: char) {
		let c = fold(c);
		self.history.push_back(c);

		let slot = Slot::of(c);
		let preceding = self.history.len() - 1;
		for k in self.settings.learned_lookbacks() {
			let prefix: String = self.history.range(preceding.saturating_sub(k)..preceding).collect();
			trace!("Reinforcing {prefix:?} -> {slot}");
			self.store.increment_session_count(&prefix, slot);
		}

		let retention = HISTORY_RETENTION.max(self.settings.max_lookback() + 1);
		while self.history.len() > retention {
			self.history.pop_front();
		}
	}

	/// Accepts `c`, then ranks the updated history.
	pub fn accept_and_rank(&mut self, c: char) -> Vec<char> {
		self.accept(c);
		self.predictions()
	}
}

/// Lexicographic comparison of two key vectors.
///
/// Scores are compared exactly (`total_cmp`); the first differing context
/// decides. Vectors of one ranking always have the same length.
fn compare_keys(a: &[f64], b: &[f64]) -> Ordering {
	a.iter()
		.zip(b)
		.map(|(x, y)| x.total_cmp(y))
		.find(|ordering| ordering.is_ne())
		.unwrap_or_else(|| a.len().cmp(&b.len()))
}

#[cfg(test)]
mod tests {
	use super::*;

	fn predictor(lines: &[&str]) -> Predictor {
		Predictor::from_records(lines).unwrap()
	}

	fn approx(a: f64, b: f64) -> bool {
		(a - b).abs() < 1e-9
	}

	#[test]
	fn unseen_candidate_scores_one() {
		let p = predictor(&[]);
		assert_eq!(p.score("zq", 'x'), 1.0);
		assert_eq!(p.score("", '_'), 1.0);
	}

	#[test]
	fn score_combines_corpus_and_session() {
		let mut p = predictor(&["abe|10"]);
		// Four acceptances of 'e' after "ab": 10 * (1 + 0.05 * 4^1.5)
		for _ in 0..4 {
			for c in "abe".chars() {
				p.accept(c);
			}
		}
		assert_eq!(p.store().get_session_count("ab", Slot::of('e')), 4);
		assert!(approx(p.score("ab", 'e'), 14.0));
	}

	#[test]
	fn counts_beyond_u32_keep_their_weight() {
		let p = predictor(&["e|5000000000", "ae|5000000000", "ab|4000000000"]);
		assert_eq!(p.store().get_corpus_count("", Slot::of('e')), 5_000_000_000);
		assert_eq!(p.score("a", 'e'), 5_000_000_000.0);
		assert_eq!(&p.rank("a")[..2], &['e', 'b']);
	}

	#[test]
	fn session_learning_lifts_zero_corpus_candidates() {
		let mut p = predictor(&[]);
		p.accept('q');
		p.accept('z');
		assert!(p.score("q", 'z') > 1.0);
		assert_eq!(p.rank("q")[0], 'z');
	}

	#[test]
	fn empty_history_ranks_alphabetically() {
		let p = predictor(&["the|50"]);
		let ranked: String = p.rank("").into_iter().collect();
		assert_eq!(ranked, "abcdefghijklmnopqrstuvwxyz_");
	}

	#[test]
	fn longer_context_decides_before_shorter() {
		let p = predictor(&["the|100", "he|100", "hi|200"]);
		let ranked = p.rank("th");
		assert_eq!(ranked[0], 'e');
		assert_eq!(ranked[1], 'i');

		// 'i' still leads when only the short context is available
		assert_eq!(p.rank("h")[0], 'i');
	}

	#[test]
	fn shorter_context_breaks_longer_ties() {
		// Both unseen after "xh", so "h" decides
		let p = predictor(&["he|5", "ha|9"]);
		let ranked = p.rank("xh");
		assert_eq!(&ranked[..2], &['a', 'e']);
	}

	#[test]
	fn only_last_lookback_characters_matter() {
		// "eabcd" is five characters long and never consulted
		let p = predictor(&["eabcdx|9", "bcde|7"]);
		assert_eq!(p.rank("eabcd"), p.rank("abcd"));
		assert_eq!(p.rank("eabcd")[0], 'e');
	}

	#[test]
	fn key_vectors_run_longest_context_first() {
		let p = predictor(&["the|50", "he|3"]);
		let scores = p.scores("th");
		let (c, key) = &scores[0];
		assert_eq!(*c, 'e');
		assert_eq!(key, &vec![50.0, 3.0]);
		assert!(scores.iter().all(|(_, key)| key.len() == 2));
	}

	#[test]
	fn ranking_is_case_insensitive() {
		let p = predictor(&["THE|50"]);
		assert_eq!(p.rank("Th"), p.rank("th"));
		assert_eq!(p.rank("TH")[0], 'e');
	}

	#[test]
	fn accept_reinforces_preceding_contexts() {
		let mut p = predictor(&[]);
		for c in "th".chars() {
			p.accept(c);
		}
		let before = p.score("h", 'e');
		p.accept('e');
		assert!(p.score("h", 'e') > before);
		assert_eq!(p.store().get_session_count("h", Slot::of('e')), 1);
		assert_eq!(p.store().get_session_count("th", Slot::of('e')), 1);
		assert_eq!(p.store().get_session_count(" th", Slot::of('e')), 1);
	}

	#[test]
	fn longest_ranking_context_is_never_learned() {
		// Learning covers lengths 1..=3 while ranking reads up to 4
		let mut p = predictor(&[]);
		for c in "abcde".chars() {
			p.accept(c);
		}
		assert_eq!(p.store().get_session_count("bcd", Slot::of('e')), 1);
		assert_eq!(p.store().get_session_count("abcd", Slot::of('e')), 0);
	}

	#[test]
	fn symmetric_learning_covers_longest_context() {
		let mut settings = PredictorSettings::default();
		settings.symmetric_learning = true;
		let mut p = Predictor::with_settings(Arc::new(CorpusTable::default()), settings);
		for c in "abcde".chars() {
			p.accept(c);
		}
		assert_eq!(p.store().get_session_count("abcd", Slot::of('e')), 1);
	}

	#[test]
	fn short_history_reinforces_whole_prefix_per_missing_length() {
		let mut p = predictor(&[]);
		// History " a": lengths 1, 2 and 3 all resolve to " "
		p.accept('a');
		assert_eq!(p.store().get_session_count(" ", Slot::of('a')), 3);
		assert_eq!(p.store().session().len(), 1);

		// History " ab": length 1 is "a", lengths 2 and 3 resolve to " a"
		p.accept('b');
		assert_eq!(p.store().get_session_count("a", Slot::of('b')), 1);
		assert_eq!(p.store().get_session_count(" a", Slot::of('b')), 2);

		// History " abc": every length fits
		p.accept('c');
		assert_eq!(p.store().get_session_count("b", Slot::of('c')), 1);
		assert_eq!(p.store().get_session_count("ab", Slot::of('c')), 1);
		assert_eq!(p.store().get_session_count(" ab", Slot::of('c')), 1);
	}

	#[test]
	fn non_letters_count_as_boundary() {
		let mut p = predictor(&[]);
		p.accept('x');
		p.accept('!');
		assert_eq!(p.store().get_session_count("x", Slot::BOUNDARY), 1);
		assert!(p.history().ends_with("x!"));
	}

	#[test]
	fn rank_is_idempotent() {
		let mut p = predictor(&["the|50", "tha|20"]);
		p.accept('t');
		p.accept('h');
		let session = p.store().session().clone();
		let first = p.rank("th");
		for _ in 0..10 {
			assert_eq!(p.rank("th"), first);
			assert_eq!(p.predictions(), p.predictions());
		}
		assert_eq!(p.store().session(), &session);
	}

	#[test]
	fn predictions_follow_own_history() {
		let mut p = predictor(&["the|50", " t|40"]);
		assert_eq!(p.predictions()[0], 't');
		p.accept('t');
		assert_eq!(p.accept_and_rank('h')[0], 'e');
		assert_eq!(p.predictions(), p.rank(&p.history()));
	}

	#[test]
	fn history_is_seeded_and_bounded() {
		let mut p = predictor(&[]);
		assert_eq!(p.history(), " ");
		for _ in 0..500 {
			p.accept('a');
		}
		assert_eq!(p.history().len(), HISTORY_RETENTION);
	}

	#[test]
	fn compare_keys_is_lexicographic() {
		assert_eq!(compare_keys(&[2.0, 1.0], &[1.0, 9.0]), Ordering::Greater);
		assert_eq!(compare_keys(&[1.0, 1.0], &[1.0, 9.0]), Ordering::Less);
		assert_eq!(compare_keys(&[3.0], &[3.0]), Ordering::Equal);
		assert_eq!(compare_keys(&[], &[]), Ordering::Equal);
	}
}
