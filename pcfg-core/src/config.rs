use crate::error::{PcfgError, Result};

/// Rounding precision used when none is given.
pub const DEFAULT_ROUNDING_PRECISION: u32 = 3;

/// Label of the rule set composed from the start distribution.
pub const DEFAULT_START_LABEL: &str = "S0";

/// Largest precision that still means something for an `f64`.
const MAX_ROUNDING_PRECISION: u32 = 15;

/// Parameters of one export run.
///
/// The value is validated once and then handed to every stage of the
/// pipeline, so no stage has to guess at its parameters.
///
/// # Invariants
/// - `1 <= rounding_precision <= 15` when `reduce` is set
/// - `0.0 <= selection_threshold < 1.0` when `reduce` is set
/// - `start_label` is not empty
#[derive(Debug, Clone, PartialEq)]
pub struct ExportConfig {
	/// Number of decimal digits kept when rounding probabilities.
	pub rounding_precision: u32,

	/// Rounded probabilities must be strictly greater than this to survive.
	pub selection_threshold: f64,

	/// Prune low probability transitions instead of exporting them verbatim.
	pub reduce: bool,

	/// Rule label under which the composed start transitions are exported.
	pub start_label: String,
}

impl ExportConfig {
	/// Builds a validated configuration.
	///
	/// When `selection_threshold` is `None` it is derived from the precision
	/// as `10^-rounding_precision` (precision 3 gives 0.001).
	///
	/// Precision and threshold only drive reduction: without `reduce` they
	/// are ignored and the defaults are kept.
	///
	/// # Errors
	/// Returns a configuration error if, with `reduce`, the precision is out
	/// of range or the threshold is not a probability below 1.
	pub fn new(rounding_precision: i64, selection_threshold: Option<f64>, reduce: bool) -> Result<Self> {
		if !reduce {
			return Ok(Self::default());
		}
		if rounding_precision < 1 || rounding_precision > MAX_ROUNDING_PRECISION as i64 {
			return Err(PcfgError::Configuration(format!(
				"rounding precision must be between 1 and {MAX_ROUNDING_PRECISION}, got {rounding_precision}"
			)));
		}
		let rounding_precision = rounding_precision as u32;
		let config = Self {
			rounding_precision,
			selection_threshold: selection_threshold.unwrap_or_else(|| threshold_for(rounding_precision)),
			reduce,
			start_label: DEFAULT_START_LABEL.to_owned(),
		};
		config.validate()?;
		Ok(config)
	}

	/// Replaces the start label.
	pub fn with_start_label(mut self, label: &str) -> Result<Self> {
		self.start_label = label.to_owned();
		self.validate()?;
		Ok(self)
	}

	/// Checks the invariants listed on the type.
	///
	/// Fields are public, so the pipeline calls this again before running.
	pub fn validate(&self) -> Result<()> {
		if self.start_label.is_empty() {
			return Err(PcfgError::Configuration("start label cannot be empty".to_owned()));
		}
		if !self.reduce {
			return Ok(());
		}
		if !(1..=MAX_ROUNDING_PRECISION).contains(&self.rounding_precision) {
			return Err(PcfgError::Configuration(format!(
				"rounding precision must be between 1 and {MAX_ROUNDING_PRECISION}, got {}",
				self.rounding_precision
			)));
		}
		if !self.selection_threshold.is_finite() || !(0.0..1.0).contains(&self.selection_threshold) {
			return Err(PcfgError::Configuration(format!(
				"selection threshold must be in [0, 1), got {}",
				self.selection_threshold
			)));
		}
		Ok(())
	}

	/// Rounds `probability` to the configured number of decimal digits.
	pub fn round(&self, probability: f64) -> f64 {
		round_to(probability, self.rounding_precision)
	}

	/// Whether `probability`, once rounded, clears the selection threshold.
	pub fn keeps(&self, probability: f64) -> bool {
		self.round(probability) > self.selection_threshold
	}

	/// Rounds `probability` and returns it if it clears the selection threshold.
	pub fn select(&self, probability: f64) -> Option<f64> {
		let rounded = self.round(probability);
		(rounded > self.selection_threshold).then_some(rounded)
	}
}

impl Default for ExportConfig {
	fn default() -> Self {
		Self {
			rounding_precision: DEFAULT_ROUNDING_PRECISION,
			selection_threshold: threshold_for(DEFAULT_ROUNDING_PRECISION),
			reduce: false,
			start_label: DEFAULT_START_LABEL.to_owned(),
		}
	}
}

/// Selection threshold matching a rounding precision: `10^-precision`.
pub fn threshold_for(rounding_precision: u32) -> f64 {
	1.0 / 10f64.powi(rounding_precision as i32)
}

/// Rounds half to even at `digits` decimal places.
pub fn round_to(value: f64, digits: u32) -> f64 {
	let scale = 10f64.powi(digits as i32);
	(value * scale).round_ties_even() / scale
}
