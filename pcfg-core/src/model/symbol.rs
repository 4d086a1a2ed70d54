use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};

/// A symbol a non-terminal can expand into.
///
/// Terminals and non-terminals share one index space inside the model, so
/// every successor carries its kind explicitly.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Successor {
	/// Terminal id, resolved through the `SymbolDictionary`.
	Terminal(u32),
	/// Label of another non-terminal.
	NonTerminal(String),
}

impl Successor {
	pub fn non_terminal(label: &str) -> Self {
		Successor::NonTerminal(label.to_owned())
	}
}

impl fmt::Display for Successor {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Successor::Terminal(id) => write!(f, "T {}", id),
			Successor::NonTerminal(label) => write!(f, "Nt \"{}\"", label),
		}
	}
}

/// Terminal id to surface form mapping of a trained model.
///
/// Immutable once loaded.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(transparent)]
pub struct SymbolDictionary {
	symbols: BTreeMap<u32, String>,
}

impl SymbolDictionary {
	pub fn new(symbols: BTreeMap<u32, String>) -> Self {
		Self { symbols }
	}

	/// Surface form of terminal `id`, if known.
	pub fn get(&self, id: u32) -> Option<&str> {
		self.symbols.get(&id).map(String::as_str)
	}

	pub fn len(&self) -> usize {
		self.symbols.len()
	}

	pub fn is_empty(&self) -> bool {
		self.symbols.is_empty()
	}

	/// Iterates over the surface forms in id order.
	pub fn surface_forms(&self) -> impl Iterator<Item = &str> {
		self.symbols.values().map(String::as_str)
	}
}

impl FromIterator<(u32, String)> for SymbolDictionary {
	fn from_iter<I: IntoIterator<Item = (u32, String)>>(iter: I) -> Self {
		Self { symbols: iter.into_iter().collect() }
	}
}

/// Sparse, insertion-ordered mapping from successor to probability.
///
/// This is what remains of a dense model row once the zero (or pruned)
/// entries are gone.
///
/// ## Invariants
/// - Each successor appears at most once
/// - `index[s]` is the position of `s` in `entries`
#[derive(Clone, Debug, Default)]
pub struct SparseRow {
	entries: Vec<(Successor, f64)>,
	index: HashMap<Successor, usize>,
}

impl SparseRow {
	pub fn new() -> Self {
		Self::default()
	}

	/// Sets the probability of `successor`, keeping its original position
	/// if it was already present.
	pub fn insert(&mut self, successor: Successor, probability: f64) {
		match self.index.get(&successor) {
			Some(&position) => self.entries[position].1 = probability,
			None => {
				self.index.insert(successor.clone(), self.entries.len());
				self.entries.push((successor, probability));
			}
		}
	}

	/// Adds `probability` to the mass of `successor`, starting from 0 on
	/// first sight.
	pub fn accumulate(&mut self, successor: &Successor, probability: f64) {
		match self.index.get(successor) {
			Some(&position) => self.entries[position].1 += probability,
			None => {
				self.index.insert(successor.clone(), self.entries.len());
				self.entries.push((successor.clone(), probability));
			}
		}
	}

	pub fn get(&self, successor: &Successor) -> Option<f64> {
		self.index.get(successor).map(|&position| self.entries[position].1)
	}

	/// Iterates over the entries in insertion order.
	pub fn iter(&self) -> impl Iterator<Item = (&Successor, f64)> {
		self.entries.iter().map(|(successor, probability)| (successor, *probability))
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	/// Sum of all probabilities in the row.
	pub fn total_mass(&self) -> f64 {
		self.entries.iter().map(|(_, probability)| probability).sum()
	}
}

/// Two rows are equal when they hold the same entries in the same order.
impl PartialEq for SparseRow {
	fn eq(&self, other: &Self) -> bool {
		self.entries == other.entries
	}
}

impl FromIterator<(Successor, f64)> for SparseRow {
	fn from_iter<I: IntoIterator<Item = (Successor, f64)>>(iter: I) -> Self {
		let mut row = SparseRow::new();
		for (successor, probability) in iter {
			row.insert(successor, probability);
		}
		row
	}
}
