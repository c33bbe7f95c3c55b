//! Statistics

// Imports
use {
	crate::{
		error::StatisticsError,
		sample::{CycleSample, SampleSeries},
	},
	itertools::Itertools,
	std::fmt,
};

/// Summary of a sample series
#[derive(PartialEq, Clone, Copy, Debug)]
pub struct SummaryStatistics {
	/// Number of samples
	pub count: usize,

	/// Mean, in cycles
	pub mean: f64,

	/// Population standard deviation, in cycles
	pub std_dev: f64,

	/// Minimum, in cycles
	pub min: u64,

	/// Maximum, in cycles
	pub max: u64,

	/// Median, in cycles.
	///
	/// For an even count, this is the upper of the two middle samples
	/// (index `count / 2` once sorted), never their average.
	pub median: u64,
}

/// Summarizes a series.
///
/// # Errors
/// Returns an error if the series is empty.
pub fn summarize(series: &SampleSeries) -> Result<SummaryStatistics, StatisticsError> {
	summarize_samples(series.samples())
}

/// Summarizes raw samples, in any order.
///
/// # Errors
/// Returns an error if `samples` is empty.
pub fn summarize_samples(samples: &[CycleSample]) -> Result<SummaryStatistics, StatisticsError> {
	let sorted = samples.iter().map(|sample| sample.cycles()).sorted_unstable().collect_vec();
	let (&min, &max) = sorted
		.first()
		.zip(sorted.last())
		.ok_or(StatisticsError::EmptySeries)?;
	let median = sorted[sorted.len() / 2];

	// Note: `Variance` accumulates with Welford's algorithm
	let variance = sorted.iter().map(|&cycles| cycles as f64).collect::<average::Variance>();

	// Note: Rounding may push the mean a hair past the extremes
	let mean = variance.mean().clamp(min as f64, max as f64);
	let std_dev = match sorted.len() {
		1 => 0.0,
		_ => variance.population_variance().max(0.0).sqrt(),
	};

	Ok(SummaryStatistics {
		count: sorted.len(),
		mean,
		std_dev,
		min,
		max,
		median,
	})
}

impl fmt::Display for SummaryStatistics {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let Self {
			count,
			mean,
			std_dev,
			min,
			max,
			median,
		} = self;

		write!(
			f,
			"count={count}, mean={mean:.2} cycles, std={std_dev:.2}, min={min}, max={max}, median={median}"
		)
	}
}
