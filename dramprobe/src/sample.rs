//! Samples

// Imports
use {crate::engine::MeasurementConfig, std::fmt};

/// Cycles elapsed during a single trial
#[derive(PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy, Debug)]
pub struct CycleSample(pub u64);

impl CycleSample {
	/// Returns the number of cycles
	pub fn cycles(self) -> u64 {
		self.0
	}
}

/// What a series measured
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub enum SeriesTag {
	/// First read of a freshly invalidated row
	FirstAccess,

	/// Second read of the same row, without invalidation in between
	SecondAccess,

	/// Read of a freshly invalidated, different row
	CrossRow,

	/// Bulk copy of `size` bytes
	Copy { size: usize },
}

impl fmt::Display for SeriesTag {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::FirstAccess => write!(f, "same-row first access"),
			Self::SecondAccess => write!(f, "same-row second access"),
			Self::CrossRow => write!(f, "different-row access"),
			Self::Copy { size } => write!(f, "copy of {size} B"),
		}
	}
}

/// Samples of a single measured quantity, in trial order.
///
/// All samples were measured under the same configuration.
#[derive(Clone, Debug)]
pub struct SampleSeries {
	/// Tag
	tag: SeriesTag,

	/// Configuration every sample was measured under
	config: MeasurementConfig,

	/// Samples
	samples: Vec<CycleSample>,
}

impl SampleSeries {
	/// Creates an empty series, reserving space for every trial of `config`
	pub fn new(tag: SeriesTag, config: MeasurementConfig) -> Self {
		Self {
			tag,
			config,
			samples: Vec::with_capacity(config.trial_count),
		}
	}

	/// Creates a series from existing samples
	pub fn from_samples(tag: SeriesTag, config: MeasurementConfig, samples: Vec<CycleSample>) -> Self {
		Self { tag, config, samples }
	}

	/// Appends a sample
	pub fn push(&mut self, sample: CycleSample) {
		self.samples.push(sample);
	}

	/// Returns the tag
	pub fn tag(&self) -> SeriesTag {
		self.tag
	}

	/// Returns the configuration
	pub fn config(&self) -> &MeasurementConfig {
		&self.config
	}

	/// Returns all samples, in trial order
	pub fn samples(&self) -> &[CycleSample] {
		&self.samples
	}

	/// Returns the number of samples
	pub fn len(&self) -> usize {
		self.samples.len()
	}

	/// Returns if there are no samples
	pub fn is_empty(&self) -> bool {
		self.samples.is_empty()
	}
}
