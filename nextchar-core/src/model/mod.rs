//! Prediction model.
//!
//! - Fixed candidate alphabet and slot mapping (`alphabet`)
//! - Count rows and context-keyed tables (`count_row`, `frequency_table`)
//! - The static corpus table and its loader (`corpus`)
//! - Corpus + session tables side by side (`frequency_store`)
//! - Ranking and online learning (`predictor`, `settings`)

/// Candidate characters and their slots.
pub mod alphabet;

/// Fixed-size next-character count row.
pub mod count_row;

/// Context → count row mapping with explicit zero rows.
pub mod frequency_table;

/// Corpus parsing, parallel loading, and binary caching.
pub mod corpus;

/// Corpus and session tables of one session.
pub mod frequency_store;

/// Back-off ranking over the recent history and session learning.
pub mod predictor;

/// Ranking parameters with validated setters.
pub mod settings;
