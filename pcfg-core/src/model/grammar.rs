use std::collections::BTreeMap;
use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::reducer::ReducedTransitions;
use super::symbol::{SparseRow, Successor, SymbolDictionary};
use crate::config::round_to;
use crate::error::TranslationError;

/// Decimal digits shown for probabilities unless the format asks otherwise.
const DISPLAY_PRECISION: u32 = 6;

/// Right-hand side of an exported rule.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub enum Rhs {
	/// Surface forms of the emitted terminals (always a single one here).
	Terminals(Vec<String>),
	/// Label of the non-terminal to expand next.
	NonTerminal(String),
}

impl fmt::Display for Rhs {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Rhs::Terminals(words) => {
				let mut iter = words.iter().peekable();
				while let Some(word) = iter.next() {
					write!(f, "T \"{}\"", word)?;
					if iter.peek().is_some() {
						write!(f, " ")?;
					}
				}
				Ok(())
			}
			Rhs::NonTerminal(label) => write!(f, "Nt \"{}\"", label),
		}
	}
}

/// One weighted alternative of a rule.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Production {
	pub rhs: Rhs,
	pub probability: f64,
}

/// Exported PCFG: every non-terminal label, plus the start label, mapped to
/// its weighted alternatives.
///
/// Alternatives keep the order of the sparse rows they come from; that order
/// carries no meaning.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct GrammarRecord {
	pub start_label: String,
	pub rules: BTreeMap<String, Vec<Production>>,
}

/// Per-terminal entry of the terminal table.
///
/// Features are placeholders, filled in by consumers of the export.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct TerminalEntry {
	pub features: Vec<Option<f64>>,
	pub rules: Option<Vec<String>>,
}

impl Default for TerminalEntry {
	fn default() -> Self {
		Self { features: vec![None], rules: None }
	}
}

/// Surface form to terminal entry.
pub type TerminalTable = BTreeMap<String, TerminalEntry>;

/// The artifact handed to the writer: grammar and terminal table.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ExportedGrammar {
	pub grammar: GrammarRecord,
	pub terminals: TerminalTable,
}

/// Translates sparse transitions into an exported grammar.
///
/// - Terminal successors become a one-word `Rhs::Terminals` with their
///   surface form
/// - Non-terminal successors are passed through by label
/// - `start` is emitted under `start_label`
/// - The terminal table holds one placeholder entry per surface form
///
/// # Errors
/// - `UnknownTerminal` if a terminal id is missing from `symbols`
/// - `StartLabelCollision` if a non-terminal already uses `start_label`
pub fn translate(
	transitions: &ReducedTransitions,
	start: &SparseRow,
	symbols: &SymbolDictionary,
	start_label: &str,
) -> Result<ExportedGrammar, TranslationError> {
	let mut rules = BTreeMap::new();
	for (label, row) in transitions.iter() {
		if label == start_label {
			return Err(TranslationError::StartLabelCollision { label: label.to_owned() });
		}
		rules.insert(label.to_owned(), productions(label, row, symbols)?);
	}
	rules.insert(start_label.to_owned(), productions(start_label, start, symbols)?);

	let terminals = symbols
		.surface_forms()
		.map(|word| (word.to_owned(), TerminalEntry::default()))
		.collect();

	Ok(ExportedGrammar {
		grammar: GrammarRecord { start_label: start_label.to_owned(), rules },
		terminals,
	})
}

fn productions(rule: &str, row: &SparseRow, symbols: &SymbolDictionary) -> Result<Vec<Production>, TranslationError> {
	row.iter()
		.map(|(successor, probability)| {
			let rhs = match successor {
				Successor::Terminal(id) => {
					let word = symbols.get(*id).ok_or_else(|| TranslationError::UnknownTerminal {
						rule: rule.to_owned(),
						terminal: *id,
					})?;
					Rhs::Terminals(vec![word.to_owned()])
				}
				Successor::NonTerminal(label) => Rhs::NonTerminal(label.clone()),
			};
			Ok(Production { rhs, probability })
		})
		.collect()
}

/// A sampled path from the start label down to a terminal.
#[derive(Clone, Debug, PartialEq)]
pub struct Derivation {
	/// Labels expanded along the way, starting with the start label.
	pub labels: Vec<String>,
	/// Terminals emitted by the last expansion.
	pub words: Vec<String>,
}

impl GrammarRecord {
	/// Productions of `label`, if the grammar has such a rule.
	pub fn rule(&self, label: &str) -> Option<&[Production]> {
		self.rules.get(label).map(Vec::as_slice)
	}

	/// Picks one production of `label` at random.
	///
	/// The chance of a production is proportional to its probability, so
	/// reduced rules that no longer sum to one are still usable.
	///
	/// Returns `None` if the rule is unknown, empty or has no mass.
	fn choose<R: Rng + ?Sized>(&self, label: &str, rng: &mut R) -> Option<&Production> {
		let productions = self.rules.get(label)?;
		let total: f64 = productions.iter().map(|p| p.probability).sum();
		if productions.is_empty() || total <= 0.0 {
			return None;
		}

		let mut r = rng.random_range(0.0..total);
		let mut fallback = None;
		for production in productions {
			if r < production.probability {
				return Some(production);
			}
			r -= production.probability;
			if production.probability > 0.0 {
				fallback = Some(production);
			}
		}

		// Only reached through rounding at the top of the range
		fallback
	}

	/// Samples a derivation starting at the start label.
	///
	/// Non-terminal productions are followed until a terminal production is
	/// drawn. Returns `None` on a dead end (unknown or empty rule) or when
	/// `max_steps` expansions did not reach a terminal.
	pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R, max_steps: usize) -> Option<Derivation> {
		let mut label = self.start_label.clone();
		let mut labels = Vec::new();
		for _ in 0..max_steps {
			let production = self.choose(&label, rng)?;
			labels.push(label);
			match &production.rhs {
				Rhs::Terminals(words) => return Some(Derivation { labels, words: words.clone() }),
				Rhs::NonTerminal(next) => label = next.clone(),
			}
		}
		None
	}
}

/// One rule per line, start rule first:
/// `"A" → T "cat"  # 0.6`
///
/// Probabilities are rounded to six digits, or to the precision of the
/// format (`{:.3}`).
impl fmt::Display for GrammarRecord {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let digits = f.precision().map_or(DISPLAY_PRECISION, |p| p.min(15) as u32);
		let start = self.rules.get_key_value(&self.start_label);
		let others = self.rules.iter().filter(|(label, _)| **label != self.start_label);
		for (label, productions) in start.into_iter().chain(others) {
			for production in productions {
				writeln!(f, "\"{}\" → {}  # {}", label, production.rhs, round_to(production.probability, digits))?;
			}
		}
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::config::ExportConfig;
	use crate::model::checkpoint::{TransitionRow, TransitionTable};
	use crate::model::start_state::compose;
	use rand::SeedableRng;
	use rand::rngs::StdRng;

	fn symbols() -> SymbolDictionary {
		vec![(0, "cat".to_owned()), (1, "dog".to_owned())].into_iter().collect()
	}

	fn table() -> TransitionTable {
		TransitionTable {
			successors: vec![Successor::Terminal(0), Successor::Terminal(1), Successor::non_terminal("B")],
			rows: vec![
				TransitionRow::new("A", vec![0.6, 0.4, 0.0]),
				TransitionRow::new("B", vec![0.0, 0.2, 0.8]),
			],
		}
	}

	fn word(w: &str) -> Rhs {
		Rhs::Terminals(vec![w.to_owned()])
	}

	#[test]
	fn start_rule_from_single_state() {
		let exact = ReducedTransitions::exact(&table());
		let start = compose(&exact, &[1.0, 0.0], &ExportConfig::default());
		let export = translate(&exact, &start, &symbols(), "S0").unwrap();

		assert_eq!(
			export.grammar.rule("S0").unwrap(),
			&[
				Production { rhs: word("cat"), probability: 0.6 },
				Production { rhs: word("dog"), probability: 0.4 },
			]
		);
		assert_eq!(
			export.grammar.rule("B").unwrap(),
			&[
				Production { rhs: word("dog"), probability: 0.2 },
				Production { rhs: Rhs::NonTerminal("B".to_owned()), probability: 0.8 },
			]
		);
		assert_eq!(export.grammar.rules.len(), 3);
	}

	#[test]
	fn terminal_table_has_placeholders() {
		let exact = ReducedTransitions::exact(&table());
		let export = translate(&exact, &SparseRow::new(), &symbols(), "S0").unwrap();

		assert_eq!(export.terminals.len(), 2);
		let entry = &export.terminals["cat"];
		assert_eq!(entry.features, vec![None]);
		assert_eq!(entry.rules, None);
		// An empty start rule is still a valid grammar
		assert_eq!(export.grammar.rule("S0"), Some(&[][..]));
	}

	#[test]
	fn unknown_terminal_fails() {
		let mut table = table();
		table.successors[1] = Successor::Terminal(9);
		let exact = ReducedTransitions::exact(&table);
		let err = translate(&exact, &SparseRow::new(), &symbols(), "S0").unwrap_err();
		assert_eq!(err, TranslationError::UnknownTerminal { rule: "A".to_owned(), terminal: 9 });
	}

	#[test]
	fn start_label_collision_fails() {
		let exact = ReducedTransitions::exact(&table());
		let err = translate(&exact, &SparseRow::new(), &symbols(), "B").unwrap_err();
		assert_eq!(err, TranslationError::StartLabelCollision { label: "B".to_owned() });
	}

	#[test]
	fn display_lists_start_rule_first() {
		let exact = ReducedTransitions::exact(&table());
		let start = compose(&exact, &[1.0, 0.0], &ExportConfig::default());
		let export = translate(&exact, &start, &symbols(), "S0").unwrap();
		let text = export.grammar.to_string();
		let lines: Vec<&str> = text.lines().collect();

		assert_eq!(lines[0], "\"S0\" → T \"cat\"  # 0.6");
		assert!(lines.contains(&"\"B\" → Nt \"B\"  # 0.8"));
		assert_eq!(lines.len(), 6);
	}

	#[test]
	fn display_rounds_probabilities() {
		let mut rules = BTreeMap::new();
		rules.insert("S0".to_owned(), vec![
			Production { rhs: word("cat"), probability: 0.1 + 0.2 },
			Production { rhs: word("dog"), probability: 0.123456789 },
		]);
		let grammar = GrammarRecord { start_label: "S0".to_owned(), rules };

		let text = grammar.to_string();
		let lines: Vec<&str> = text.lines().collect();
		assert_eq!(lines, vec!["\"S0\" → T \"cat\"  # 0.3", "\"S0\" → T \"dog\"  # 0.123457"]);

		let text = format!("{:.2}", grammar);
		assert_eq!(text.lines().nth(1), Some("\"S0\" → T \"dog\"  # 0.12"));
	}

	#[test]
	fn sampling_reaches_terminals() {
		let exact = ReducedTransitions::exact(&table());
		let start = compose(&exact, &[0.0, 1.0], &ExportConfig::default());
		let export = translate(&exact, &start, &symbols(), "S0").unwrap();
		let mut rng = StdRng::seed_from_u64(7);

		for _ in 0..50 {
			if let Some(derivation) = export.grammar.sample(&mut rng, 1000) {
				assert_eq!(derivation.labels[0], "S0");
				assert!(derivation.words == vec!["cat".to_owned()] || derivation.words == vec!["dog".to_owned()]);
			}
		}
	}

	#[test]
	fn sampling_stops_at_dead_ends() {
		let mut rules = BTreeMap::new();
		rules.insert("S0".to_owned(), vec![Production { rhs: Rhs::NonTerminal("X".to_owned()), probability: 1.0 }]);
		rules.insert("X".to_owned(), Vec::new());
		let grammar = GrammarRecord { start_label: "S0".to_owned(), rules };
		let mut rng = StdRng::seed_from_u64(1);
		assert_eq!(grammar.sample(&mut rng, 10), None);

		let mut rules = BTreeMap::new();
		rules.insert("S0".to_owned(), vec![Production { rhs: Rhs::NonTerminal("S0".to_owned()), probability: 1.0 }]);
		let grammar = GrammarRecord { start_label: "S0".to_owned(), rules };
		assert_eq!(grammar.sample(&mut rng, 10), None);
	}
}
