//! Next-character ranking library.
//!
//! This crate ranks the 27 characters a user may type next (`a`..`z` plus a
//! word-boundary symbol) from what has been typed so far. It provides:
//! - A static corpus frequency table, loaded once from `word|count` records
//! - A per-session frequency table that learns from accepted characters
//! - A back-off ranking that prefers long contexts over short ones
//!
//! The high-level entry point is [`model::predictor::Predictor`].

/// Prediction model: alphabet, count tables, and the predictor itself.
pub mod model;

/// Errors raised while loading a corpus.
pub mod error;

/// File helpers (line reading, cache paths, folder listing).
///
/// Only corpus discovery (`list_corpora`, `normalize_folder`) is used
/// outside the crate.
pub mod io;

pub use error::LoadError;
pub use model::alphabet::{ALPHABET, BOUNDARY_CHAR, Slot};
pub use model::predictor::Predictor;
pub use model::settings::PredictorSettings;
