use std::path::Path;

use crate::config::ExportConfig;
use crate::error::{PcfgError, Result};
use crate::io::{self, Format};
use crate::model::checkpoint::Checkpoint;
use crate::model::grammar::{ExportedGrammar, translate};
use crate::model::reducer::ReducedTransitions;
use crate::model::start_state::compose;

/// Exports the grammar of an already loaded checkpoint.
///
/// Runs the stages in order, aborting on the first error:
/// - configuration check
/// - reduction (or exact conversion when `config.reduce` is off)
/// - start state composition
/// - translation
///
/// The checkpoint is not modified and the same input always yields the
/// same record.
pub fn export(checkpoint: &Checkpoint, config: &ExportConfig) -> Result<ExportedGrammar> {
	config.validate()?;

	let transitions = if config.reduce {
		log::info!("reducing PCFG probabilities to a rounding accuracy of {}", config.rounding_precision);
		ReducedTransitions::reduce(&checkpoint.table, config)
	} else {
		ReducedTransitions::exact(&checkpoint.table)
	};
	log::debug!(
		"kept {} transitions over {} non-terminals",
		transitions.transition_count(),
		transitions.len()
	);

	let start = compose(&transitions, &checkpoint.start, config);
	let export = translate(&transitions, &start, &checkpoint.symbols, &config.start_label)?;
	log::debug!(
		"exported {} rules and {} terminals",
		export.grammar.rules.len(),
		export.terminals.len()
	);
	Ok(export)
}

/// Loads the checkpoint at `path` and exports its grammar.
///
/// The configuration is checked before the checkpoint is touched.
pub fn export_from_path<P: AsRef<Path>>(path: P, config: &ExportConfig) -> Result<ExportedGrammar> {
	config.validate()?;
	let checkpoint = Checkpoint::load(path)?;
	export(&checkpoint, config)
}

/// Writes an exported grammar, as JSON for `.json` paths and postcard
/// otherwise.
///
/// The whole record is encoded before the file is created, so a failed
/// encoding leaves nothing behind.
pub fn write_export<P: AsRef<Path>>(export: &ExportedGrammar, path: P) -> Result<()> {
	let path = path.as_ref();
	let bytes = match Format::from_path(path) {
		Format::Json => serde_json::to_vec_pretty(export).map_err(|e| PcfgError::export(path, e))?,
		Format::Postcard => postcard::to_stdvec(export).map_err(|e| PcfgError::export(path, e))?,
	};
	io::write_bytes(path, &bytes).map_err(|e| PcfgError::export(path, e))
}

/// Reads back a grammar written by `write_export`.
pub fn read_export<P: AsRef<Path>>(path: P) -> Result<ExportedGrammar> {
	let path = path.as_ref();
	let bytes = io::read_bytes(path).map_err(|e| PcfgError::load(path, e))?;
	match Format::from_path(path) {
		Format::Json => serde_json::from_slice(&bytes).map_err(|e| PcfgError::load(path, e)),
		Format::Postcard => postcard::from_bytes(&bytes).map_err(|e| PcfgError::load(path, e)),
	}
}
