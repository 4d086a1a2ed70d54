use super::reducer::ReducedTransitions;
use super::symbol::SparseRow;
use crate::config::ExportConfig;

/// Flattens the start distribution into a single set of start transitions.
///
/// The start vector is first cut to the real non-terminal count (the
/// number of rows of `transitions`); anything past it is padding. Which
/// non-terminals take part depends on `config.reduce`:
/// - reduced: weights are rounded and thresholded like transition rows
/// - exact: every nonzero weight is used as is
///
/// Each selected non-terminal `s` with weight `w` then contributes
/// `w * p` to every successor of its own row. Entries appear in the order
/// their successor is first seen.
pub fn compose(transitions: &ReducedTransitions, start: &[f64], config: &ExportConfig) -> SparseRow {
	let count = transitions.len();
	let (live, padding) = start.split_at(count.min(start.len()));
	if padding.iter().any(|w| *w != 0.0) {
		log::warn!(
			"start distribution has nonzero weight past the {} non-terminals, ignoring it",
			count
		);
	}

	let weights: Vec<(usize, f64)> = if config.reduce {
		live.iter()
			.enumerate()
			.filter_map(|(state, weight)| config.select(*weight).map(|w| (state, w)))
			.collect()
	} else {
		live.iter()
			.enumerate()
			.filter(|(_, weight)| **weight != 0.0)
			.map(|(state, weight)| (state, *weight))
			.collect()
	};

	let start_transitions = mix(transitions, &weights);
	log::debug!(
		"start state mixes {} non-terminals into {} transitions",
		weights.len(),
		start_transitions.len()
	);
	start_transitions
}

/// Probability weighted sum of the rows selected by `weights`.
fn mix(transitions: &ReducedTransitions, weights: &[(usize, f64)]) -> SparseRow {
	let mut start_transitions = SparseRow::new();
	for &(state, weight) in weights {
		// `state` is below `transitions.len()` by construction
		let Some(row) = transitions.row(state) else { continue };
		for (successor, probability) in row.iter() {
			start_transitions.accumulate(successor, weight * probability);
		}
	}
	start_transitions
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::model::checkpoint::{TransitionRow, TransitionTable};
	use crate::model::symbol::Successor;

	fn table() -> TransitionTable {
		TransitionTable {
			successors: vec![Successor::Terminal(0), Successor::Terminal(1), Successor::non_terminal("A")],
			rows: vec![
				TransitionRow::new("A", vec![0.6, 0.4, 0.0]),
				TransitionRow::new("B", vec![0.0, 0.5, 0.5]),
			],
		}
	}

	fn entries(row: &SparseRow) -> Vec<(Successor, f64)> {
		row.iter().map(|(s, p)| (s.clone(), p)).collect()
	}

	#[test]
	fn single_start_state_is_conserved() {
		let exact = ReducedTransitions::exact(&table());
		let start = compose(&exact, &[1.0, 0.0], &ExportConfig::default());
		assert_eq!(&start, exact.get("A").unwrap());
		assert_eq!(entries(&start), vec![(Successor::Terminal(0), 0.6), (Successor::Terminal(1), 0.4)]);

		let config = ExportConfig::new(3, None, true).unwrap();
		let reduced = ReducedTransitions::reduce(&table(), &config);
		let start = compose(&reduced, &[0.0, 1.0], &config);
		assert_eq!(&start, reduced.get("B").unwrap());
	}

	#[test]
	fn shared_successors_are_summed() {
		let exact = ReducedTransitions::exact(&table());
		let start = compose(&exact, &[0.5, 0.5], &ExportConfig::default());
		assert_eq!(
			entries(&start),
			vec![
				(Successor::Terminal(0), 0.3),
				(Successor::Terminal(1), 0.45),
				(Successor::non_terminal("A"), 0.25),
			]
		);
		assert!((start.total_mass() - 1.0).abs() < 1e-12);
	}

	#[test]
	fn padding_is_ignored() {
		let exact = ReducedTransitions::exact(&table());
		let start = compose(&exact, &[1.0, 0.0, 0.7, 0.3], &ExportConfig::default());
		assert_eq!(&start, exact.get("A").unwrap());
	}

	#[test]
	fn weights_keep_their_own_index() {
		// The only live weight belongs to the second non-terminal.
		let exact = ReducedTransitions::exact(&table());
		let start = compose(&exact, &[0.0, 1.0, 0.0], &ExportConfig::default());
		assert_eq!(&start, exact.get("B").unwrap());
	}

	#[test]
	fn reduced_start_weights_are_thresholded() {
		let config = ExportConfig::new(2, Some(0.05), true).unwrap();
		let reduced = ReducedTransitions::reduce(&table(), &config);
		let start = compose(&reduced, &[0.96, 0.04], &config);
		assert_eq!(
			entries(&start),
			vec![(Successor::Terminal(0), 0.96 * 0.6), (Successor::Terminal(1), 0.96 * 0.4)]
		);
	}

	#[test]
	fn empty_start_is_representable() {
		let exact = ReducedTransitions::exact(&table());
		assert!(compose(&exact, &[0.0, 0.0], &ExportConfig::default()).is_empty());

		let config = ExportConfig::new(3, None, true).unwrap();
		let reduced = ReducedTransitions::reduce(&table(), &config);
		assert!(compose(&reduced, &[0.0004, 0.0001], &config).is_empty());
	}
}
