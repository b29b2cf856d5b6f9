use std::ops::RangeInclusive;

/// Longest context consulted when ranking.
pub const MAX_LOOKBACK: usize = 4;

/// Weight of session counts relative to corpus counts.
pub const LEARN_RATE: f64 = 0.05;

/// Exponent applied to session counts in the score.
pub const SESSION_EXPONENT: f64 = 1.5;

/// Tunable parameters of a `Predictor`.
///
/// Defaults reproduce the fixed ranking behaviour: lookback 4, learn rate
/// 0.05, exponent 1.5, asymmetric learning.
///
/// # Invariants
/// - `max_lookback >= 1`
/// - `learn_rate` and `session_exponent` are finite and `>= 0.0`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PredictorSettings {
	/// Longest context used for ranking.
	max_lookback: usize,

	learn_rate: f64,

	session_exponent: f64,

	/// When `true`, learning also reinforces contexts of length
	/// `max_lookback`. The default only reinforces lengths
	/// `1..max_lookback`, so the longest ranking context never learns.
	pub symmetric_learning: bool,
}

impl Default for PredictorSettings {
	fn default() -> Self {
		Self {
			max_lookback: MAX_LOOKBACK,
			learn_rate: LEARN_RATE,
			session_exponent: SESSION_EXPONENT,
			symmetric_learning: false,
		}
	}
}

impl PredictorSettings {
	pub fn max_lookback(&self) -> usize {
		self.max_lookback
	}

	pub fn learn_rate(&self) -> f64 {
		self.learn_rate
	}

	pub fn session_exponent(&self) -> f64 {
		self.session_exponent
	}

	/// Sets the longest ranking context.
	///
	/// # Errors
	/// Returns an error if `max_lookback` is zero.
	pub fn set_max_lookback(&mut self, max_lookback: usize) -> Result<(), String> {
		if max_lookback == 0 {
			return Err("Lookback must be at least 1".to_owned());
		}
		self.max_lookback = max_lookback;
		Ok(())
	}

	/// # Errors
	/// Returns an error if the value is negative, NaN or infinite.
	pub fn set_learn_rate(&mut self, learn_rate: f64) -> Result<(), String> {
		if !learn_rate.is_finite() || learn_rate < 0.0 {
			return Err(format!("Learn rate must be a finite value >= 0.0, got {learn_rate}"));
		}
		self.learn_rate = learn_rate;
		Ok(())
	}

	/// # Errors
	/// Returns an error if the value is negative, NaN or infinite.
	pub fn set_session_exponent(&mut self, exponent: f64) -> Result<(), String> {
		if !exponent.is_finite() || exponent < 0.0 {
			return Err(format!("Session exponent must be a finite value >= 0.0, got {exponent}"));
		}
		self.session_exponent = exponent;
		Ok(())
	}

	/// Context lengths reinforced when a character is accepted.
	pub fn learned_lookbacks(&self) -> RangeInclusive<usize> {
		if self.symmetric_learning {
			1..=self.max_lookback
		} else {
			1..=self.max_lookback - 1
		}
	}
}
