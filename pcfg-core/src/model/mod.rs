//! Model side of the exporter.
//!
//! Stages, in the order a run goes through them:
//! - Loading a trained model (`Checkpoint`)
//! - Pruning its dense rows (`ReducedTransitions`)
//! - Folding the start distribution into start transitions (`compose`)
//! - Translating the result into a grammar record (`translate`)

/// Trained model artifacts: symbol dictionary, dense transition table and
/// start distribution, with postcard/JSON loading.
pub mod checkpoint;

/// Successor symbols, the symbol dictionary and sparse rows.
pub mod symbol;

/// Dense to sparse conversion of transition rows, exact or pruned.
pub mod reducer;

/// Start distribution composition.
pub mod start_state;

/// Exported grammar record, terminal table, rendering and sampling.
pub mod grammar;
