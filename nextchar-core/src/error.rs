use std::path::PathBuf;

/// Failure to build a corpus table.
///
/// Loading is all-or-nothing: when any of these is returned, no table
/// (partial or otherwise) is handed to the caller.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
	#[error("failed to read corpus: {0}")]
	Io(#[from] std::io::Error),

	#[error("line {line}: missing '|' separator in {text:?}")]
	MissingSeparator { line: usize, text: String },

	#[error("line {line}: expected a single '|' separator in {text:?}")]
	TooManyFields { line: usize, text: String },

	#[error("line {line}: empty word in {text:?}")]
	EmptyWord { line: usize, text: String },

	#[error("line {line}: invalid count {count:?}")]
	InvalidCount { line: usize, count: String },

	#[error("corrupt corpus cache {}: {source}", .path.display())]
	Cache {
		path: PathBuf,
		#[source]
		source: postcard::Error,
	},
}

impl LoadError {
	/// Returns the 1-based line number of a malformed record, if any.
	pub fn line(&self) -> Option<usize> {
		match self {
			LoadError::MissingSeparator { line, .. }
			| LoadError::TooManyFields { line, .. }
			| LoadError::EmptyWord { line, .. }
			| LoadError::InvalidCount { line, .. } => Some(*line),
			LoadError::Io(_) | LoadError::Cache { .. } => None,
		}
	}
}
