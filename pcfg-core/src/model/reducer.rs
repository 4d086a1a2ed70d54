use super::checkpoint::TransitionTable;
use super::symbol::SparseRow;
use crate::config::ExportConfig;

/// Sparse transitions of every non-terminal, in non-terminal index order.
///
/// Produced either by pruning (`reduce`) or by dropping only the zero
/// entries (`exact`). Both shapes are consumed the same way downstream.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ReducedTransitions {
	rows: Vec<(String, SparseRow)>,
}

impl ReducedTransitions {
	/// Keeps every nonzero entry of every row verbatim, without rounding.
	pub fn exact(table: &TransitionTable) -> Self {
		let rows = table
			.rows
			.iter()
			.map(|row| {
				let sparse: SparseRow = table
					.entries(row)
					.filter(|(_, probability)| *probability != 0.0)
					.map(|(successor, probability)| (successor.clone(), probability))
					.collect();
				(row.label.clone(), sparse)
			})
			.collect();
		Self { rows }
	}

	/// Prunes every row of `table`.
	///
	/// An entry is kept if its probability, rounded to
	/// `config.rounding_precision` digits, is strictly greater than
	/// `config.selection_threshold`. Kept entries carry their unrounded
	/// probability, so a reduced row never holds more mass than the dense
	/// one and holds all of it when nothing is pruned. Rows are not
	/// renormalized. A row where nothing survives becomes an empty mapping.
	pub fn reduce(table: &TransitionTable, config: &ExportConfig) -> Self {
		let rows = table
			.rows
			.iter()
			.map(|row| {
				let sparse: SparseRow = table
					.entries(row)
					.filter(|(_, probability)| config.keeps(*probability))
					.map(|(successor, probability)| (successor.clone(), probability))
					.collect();
				if sparse.is_empty() {
					log::warn!("no transition of {} survives reduction, it becomes a dead end", row.label);
				}
				(row.label.clone(), sparse)
			})
			.collect();
		Self { rows }
	}

	/// Sparse row of the non-terminal at `index`.
	pub fn row(&self, index: usize) -> Option<&SparseRow> {
		self.rows.get(index).map(|(_, row)| row)
	}

	/// Sparse row of the non-terminal called `label`.
	pub fn get(&self, label: &str) -> Option<&SparseRow> {
		self.rows.iter().find(|(l, _)| l == label).map(|(_, row)| row)
	}

	/// Iterates over `(label, row)` pairs in non-terminal index order.
	pub fn iter(&self) -> impl Iterator<Item = (&str, &SparseRow)> {
		self.rows.iter().map(|(label, row)| (label.as_str(), row))
	}

	pub fn len(&self) -> usize {
		self.rows.len()
	}

	pub fn is_empty(&self) -> bool {
		self.rows.is_empty()
	}

	/// Total number of transitions kept over all rows.
	pub fn transition_count(&self) -> usize {
		self.rows.iter().map(|(_, row)| row.len()).sum()
	}
}
