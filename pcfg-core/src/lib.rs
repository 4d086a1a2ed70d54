//! Readable PCFG extraction from trained grammar-induction models.
//!
//! This crate turns the dense transition tables of a trained model into a
//! sparse probabilistic context-free grammar:
//! - Loading model checkpoints (postcard or JSON)
//! - Optional pruning of low probability transitions
//! - Composition of the start distribution into a start rule
//! - Translation into an exportable grammar record
//!
//! `pipeline` chains these stages; the stages themselves live in `model`.

/// Model artifacts and the individual pipeline stages.
pub mod model;

/// Export parameters (rounding precision, selection threshold, mode).
pub mod config;

/// Error taxonomy shared by all stages.
pub mod error;

/// Load → reduce → compose → translate, plus writing the result.
pub mod pipeline;

/// File helpers (format detection, output paths).
///
/// Not exposed
pub(crate) mod io;

pub use config::ExportConfig;
pub use error::{PcfgError, Result, TranslationError};
pub use io::build_output_path;
pub use model::checkpoint::Checkpoint;
pub use model::grammar::ExportedGrammar;
