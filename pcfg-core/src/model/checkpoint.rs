use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::symbol::{Successor, SymbolDictionary};
use crate::error::{PcfgError, Result};
use crate::io::{self, Format};

/// Dense transition row of one non-terminal.
///
/// `probabilities[i]` is the probability of expanding into the successor at
/// index `i` of the table's successor space.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct TransitionRow {
	pub label: String,
	pub probabilities: Vec<f64>,
}

impl TransitionRow {
	pub fn new(label: &str, probabilities: Vec<f64>) -> Self {
		Self { label: label.to_owned(), probabilities }
	}
}

/// Per non-terminal probability vectors over every possible successor.
///
/// All rows share `successors` as their index-to-symbol lookup. The number
/// of rows is the authoritative non-terminal count of the model: row `i`
/// is the non-terminal weighted by entry `i` of the start distribution.
///
/// ## Invariants
/// - Every row has exactly `successors.len()` entries
/// - Row labels are unique
/// - Each row conceptually sums to 1
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct TransitionTable {
	pub successors: Vec<Successor>,
	pub rows: Vec<TransitionRow>,
}

impl TransitionTable {
	pub fn non_terminal_count(&self) -> usize {
		self.rows.len()
	}

	/// Pairs every entry of `row` with the successor it stands for.
	pub fn entries<'a>(&'a self, row: &'a TransitionRow) -> impl Iterator<Item = (&'a Successor, f64)> + 'a {
		self.successors.iter().zip(row.probabilities.iter().copied())
	}

	fn check_shape(&self) -> std::result::Result<(), String> {
		if self.rows.is_empty() {
			return Err("transition table has no non-terminals".to_owned());
		}
		let width = self.successors.len();
		let mut labels = HashSet::new();
		for row in &self.rows {
			if row.probabilities.len() != width {
				return Err(format!(
					"row {} has {} entries but the successor space has {}",
					row.label,
					row.probabilities.len(),
					width
				));
			}
			if let Some(p) = row.probabilities.iter().find(|p| !p.is_finite() || **p < 0.0) {
				return Err(format!("row {} holds {} which is not a probability", row.label, p));
			}
			if !labels.insert(row.label.as_str()) {
				return Err(format!("non-terminal {} appears twice", row.label));
			}
		}
		Ok(())
	}
}

/// Everything the exporter needs from a trained model.
///
/// `start` may be longer than the number of non-terminals; entries past
/// `table.non_terminal_count()` are padding.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Checkpoint {
	pub symbols: SymbolDictionary,
	pub table: TransitionTable,
	pub start: Vec<f64>,
}

impl Checkpoint {
	/// Loads a checkpoint from disk.
	///
	/// - `.json` files are read as JSON, anything else as postcard binary
	/// - The checkpoint is only read, never modified
	///
	/// # Errors
	/// Returns a load error if the file cannot be read or decoded, or if
	/// the decoded artifact does not have the expected shape.
	pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
		let path = path.as_ref();
		let bytes = io::read_bytes(path).map_err(|e| PcfgError::load(path, e))?;
		let checkpoint: Checkpoint = match Format::from_path(path) {
			Format::Json => serde_json::from_slice(&bytes).map_err(|e| PcfgError::load(path, e))?,
			Format::Postcard => postcard::from_bytes(&bytes).map_err(|e| PcfgError::load(path, e))?,
		};
		checkpoint.check_shape().map_err(|reason| PcfgError::load(path, reason))?;
		log::debug!(
			"loaded {}: {} terminals, {} non-terminals, {} successors",
			path.display(),
			checkpoint.symbols.len(),
			checkpoint.table.non_terminal_count(),
			checkpoint.table.successors.len()
		);
		Ok(checkpoint)
	}

	/// Writes the checkpoint in the format selected by the path extension.
	pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
		let path = path.as_ref();
		let bytes = match Format::from_path(path) {
			Format::Json => serde_json::to_vec_pretty(self).map_err(|e| PcfgError::export(path, e))?,
			Format::Postcard => postcard::to_stdvec(self).map_err(|e| PcfgError::export(path, e))?,
		};
		io::write_bytes(path, &bytes).map_err(|e| PcfgError::export(path, e))
	}

	fn check_shape(&self) -> std::result::Result<(), String> {
		if self.symbols.is_empty() {
			return Err("symbol dictionary is missing or empty".to_owned());
		}
		self.table.check_shape()?;
		if self.start.len() < self.table.non_terminal_count() {
			return Err(format!(
				"start distribution has {} entries for {} non-terminals",
				self.start.len(),
				self.table.non_terminal_count()
			));
		}
		if let Some(p) = self.start.iter().find(|p| !p.is_finite() || **p < 0.0) {
			return Err(format!("start distribution holds {} which is not a probability", p));
		}
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn checkpoint() -> Checkpoint {
		Checkpoint {
			symbols: vec![(0, "cat".to_owned()), (1, "dog".to_owned())].into_iter().collect(),
			table: TransitionTable {
				successors: vec![Successor::Terminal(0), Successor::Terminal(1), Successor::non_terminal("B")],
				rows: vec![
					TransitionRow::new("A", vec![0.6, 0.4, 0.0]),
					TransitionRow::new("B", vec![0.5, 0.5, 0.0]),
				],
			},
			start: vec![1.0, 0.0, 0.0],
		}
	}

	#[test]
	fn valid_shape() {
		assert_eq!(checkpoint().check_shape(), Ok(()));
	}

	#[test]
	fn rejects_ragged_rows() {
		let mut c = checkpoint();
		c.table.rows[1].probabilities.pop();
		assert!(c.check_shape().is_err());
	}

	#[test]
	fn rejects_short_start_distribution() {
		let mut c = checkpoint();
		c.start = vec![1.0];
		assert!(c.check_shape().is_err());
	}

	#[test]
	fn rejects_missing_parts() {
		let mut c = checkpoint();
		c.symbols = SymbolDictionary::default();
		assert!(c.check_shape().is_err());

		let mut c = checkpoint();
		c.table.rows.clear();
		assert!(c.check_shape().is_err());
	}

	#[test]
	fn rejects_duplicate_labels_and_bad_values() {
		let mut c = checkpoint();
		c.table.rows[1].label = "A".to_owned();
		assert!(c.check_shape().is_err());

		let mut c = checkpoint();
		c.table.rows[0].probabilities[0] = f64::NAN;
		assert!(c.check_shape().is_err());

		let mut c = checkpoint();
		c.start[0] = -1.0;
		assert!(c.check_shape().is_err());
	}
}
