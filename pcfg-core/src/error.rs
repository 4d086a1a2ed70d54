use std::fmt;
use std::path::{Path, PathBuf};

/// Errors raised while exporting a grammar from a checkpoint.
///
/// None of these are transient: every variant describes an input that is
/// structurally unusable, so callers are expected to abort the run.
#[derive(Debug, Clone, PartialEq)]
pub enum PcfgError {
	/// The checkpoint is missing, unreadable or does not have the expected shape.
	Load { path: PathBuf, reason: String },
	/// The reduced mappings could not be translated into a grammar record.
	Translation(TranslationError),
	/// Export parameters are incompatible (precision, threshold, start label).
	Configuration(String),
	/// The exported grammar could not be written.
	Export { path: PathBuf, reason: String },
}

/// Failures of the grammar translator.
#[derive(Debug, Clone, PartialEq)]
pub enum TranslationError {
	/// A terminal successor has no entry in the symbol dictionary.
	UnknownTerminal { rule: String, terminal: u32 },
	/// A non-terminal of the model already uses the reserved start label.
	StartLabelCollision { label: String },
}

pub type Result<T> = std::result::Result<T, PcfgError>;

impl PcfgError {
	pub(crate) fn load<P: AsRef<Path>>(path: P, reason: impl fmt::Display) -> Self {
		PcfgError::Load { path: path.as_ref().to_path_buf(), reason: reason.to_string() }
	}

	pub(crate) fn export<P: AsRef<Path>>(path: P, reason: impl fmt::Display) -> Self {
		PcfgError::Export { path: path.as_ref().to_path_buf(), reason: reason.to_string() }
	}
}

impl fmt::Display for PcfgError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Load { path, reason } => {
				write!(f, "could not load checkpoint {}: {reason}", path.display())
			}
			Self::Translation(err) => write!(f, "translation failed: {err}"),
			Self::Configuration(msg) => write!(f, "invalid configuration: {msg}"),
			Self::Export { path, reason } => {
				write!(f, "could not write grammar to {}: {reason}", path.display())
			}
		}
	}
}

impl fmt::Display for TranslationError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::UnknownTerminal { rule, terminal } => {
				write!(f, "rule {rule} refers to terminal {terminal} which is not in the dictionary")
			}
			Self::StartLabelCollision { label } => {
				write!(f, "non-terminal {label} collides with the start label")
			}
		}
	}
}

impl std::error::Error for PcfgError {}

impl std::error::Error for TranslationError {}

impl From<TranslationError> for PcfgError {
	fn from(err: TranslationError) -> Self {
		PcfgError::Translation(err)
	}
}
