//! DRAM row buffer policy experiment
//!
//! Each trial reads the first row twice, invalidating only before the first
//! read, then reads a second, invalidated, row. If the second read of the
//! first row is markedly cheaper, the row buffer was left open.

// Imports
use {
	crate::{
		arena::{MemoryArena, PinOutcome},
		cache::CacheController,
		classify::{Classification, PolicyClassifier},
		config::RowPolicyConfig,
		engine::{AccessPattern, BufferPair, MeasurementConfig, MeasurementEngine},
		error::ExportError,
		report,
		sample::{SampleSeries, SeriesTag},
		statistics::{self, SummaryStatistics},
		timestamp::TimestampSource,
	},
	anyhow::Context,
	std::path::{Path, PathBuf},
};

/// Outcome of [`run_row_policy`]
#[derive(Debug)]
pub struct RowPolicyOutcome {
	/// Outcome of the pinning request
	pub pin: PinOutcome,

	/// First access to the first row
	pub first: Measured,

	/// Second access to the first row
	pub second: Measured,

	/// Access to the second row
	pub cross_row: Measured,

	/// Classification
	pub classification: Classification,
}

/// A series along with its summary
#[derive(Debug)]
pub struct Measured {
	/// Series
	pub series: SampleSeries,

	/// Summary
	pub summary: SummaryStatistics,
}

impl RowPolicyOutcome {
	/// Exports the raw samples of all series into `dir`, returning the written paths
	pub fn export_raw(&self, dir: &Path) -> Result<Vec<PathBuf>, ExportError> {
		[&self.first, &self.second, &self.cross_row]
			.into_iter()
			.map(|measured| -> Result<PathBuf, ExportError> {
				let path = dir.join(csv_file_name(measured.series.tag()));
				report::export_raw(&measured.series, &path)?;
				Ok(path)
			})
			.collect()
	}
}

/// Returns the raw samples file name of a row policy series
pub fn csv_file_name(tag: SeriesTag) -> &'static str {
	match tag {
		SeriesTag::FirstAccess => "row_policy_first_access.csv",
		SeriesTag::SecondAccess => "row_policy_second_access.csv",
		SeriesTag::CrossRow => "row_policy_cross_row.csv",
		SeriesTag::Copy { .. } => "row_policy_copy.csv",
	}
}

/// Runs the row policy experiment.
///
/// Allocates and fills both rows, pins memory, then measures and classifies.
pub fn run_row_policy<T: TimestampSource, C: CacheController>(
	engine: &mut MeasurementEngine<T, C>,
	arena: &mut MemoryArena,
	config: &RowPolicyConfig,
) -> Result<RowPolicyOutcome, anyhow::Error> {
	tracing::info!("Testing DRAM row buffer policy (row size: {} bytes)", config.row_size);

	let mut buffers = BufferPair {
		primary:   arena
			.allocate(config.row_size, config.alignment)
			.context("Unable to allocate first row")?,
		secondary: arena
			.allocate(config.row_size, config.alignment)
			.context("Unable to allocate second row")?,
	};
	arena.fill(&mut buffers.primary, config.first_fill);
	arena.fill(&mut buffers.secondary, config.second_fill);
	let pin = arena.pin();

	let configs = [AccessPattern::SameRowRepeated, AccessPattern::CrossRow].map(|access_pattern| {
		MeasurementConfig {
			buffer_size: config.row_size,
			trial_count: config.trials,
			access_pattern,
		}
	});
	tracing::info!("Performing {} test iterations...", config.trials);
	let series = engine
		.run_interleaved(&configs, &mut buffers)
		.context("Unable to measure row accesses")?;

	let BufferPair { primary, secondary } = buffers;
	arena.release(primary);
	arena.release(secondary);

	let [first, second, cross_row]: [SampleSeries; 3] = series
		.try_into()
		.map_err(|series: Vec<_>| anyhow::anyhow!("Expected 3 series, found {}", series.len()))?;
	let measure = |series: SampleSeries| -> Result<Measured, anyhow::Error> {
		let summary =
			statistics::summarize(&series).with_context(|| format!("Unable to summarize {}", series.tag()))?;
		Ok(Measured { series, summary })
	};
	let first = measure(first)?;
	let second = measure(second)?;
	let cross_row = measure(cross_row)?;

	let classification = PolicyClassifier::new(config.open_row_threshold)
		.classify_with_ratio(first.summary.mean, second.summary.mean);
	tracing::debug!(?classification, "Classified row policy");

	Ok(RowPolicyOutcome {
		pin,
		first,
		second,
		cross_row,
		classification,
	})
}

#[cfg(test)]
mod tests {
	use {
		super::*,
		crate::{
			arena::PinPolicy,
			classify::RowPolicy,
			testing::{CountingTimestamp, TrackingCache},
		},
	};

	fn small_config() -> RowPolicyConfig {
		RowPolicyConfig {
			trials: 50,
			..RowPolicyConfig::default()
		}
	}

	#[test]
	fn produces_three_series() {
		let mut engine = MeasurementEngine::new(CountingTimestamp::new(4), TrackingCache::new());
		let mut arena = MemoryArena::new(PinPolicy::Skip);
		let outcome = run_row_policy(&mut engine, &mut arena, &small_config()).expect("Unable to run");

		assert!(matches!(outcome.pin, PinOutcome::Skipped));
		for (measured, tag) in [
			(&outcome.first, SeriesTag::FirstAccess),
			(&outcome.second, SeriesTag::SecondAccess),
			(&outcome.cross_row, SeriesTag::CrossRow),
		] {
			assert_eq!(measured.series.tag(), tag);
			assert_eq!(measured.series.len(), 50);
			assert_eq!(measured.summary.count, 50);
			assert_eq!(measured.summary.mean, 4.0);
		}

		// Equal timings mean no speedup
		assert_eq!(outcome.classification.ratio, 1.0);
		assert_eq!(outcome.classification.policy, RowPolicy::ClosedRow);
	}

	#[test]
	fn threshold_comes_from_config() {
		let mut engine = MeasurementEngine::new(CountingTimestamp::new(4), TrackingCache::new());
		let mut arena = MemoryArena::new(PinPolicy::Skip);
		let config = RowPolicyConfig {
			open_row_threshold: 0.5,
			..small_config()
		};
		let outcome = run_row_policy(&mut engine, &mut arena, &config).expect("Unable to run");
		assert_eq!(outcome.classification.policy, RowPolicy::OpenRow);
	}

	#[test]
	fn exports_every_series() {
		let dir = tempfile::tempdir().expect("Unable to create temp dir");
		let mut engine = MeasurementEngine::new(CountingTimestamp::new(2), TrackingCache::new());
		let mut arena = MemoryArena::new(PinPolicy::Skip);
		let outcome = run_row_policy(&mut engine, &mut arena, &small_config()).expect("Unable to run");

		let paths = outcome.export_raw(dir.path()).expect("Unable to export");
		assert_eq!(paths.len(), 3);
		for path in paths {
			assert_eq!(report::read_raw(&path).expect("Unable to read back").len(), 50);
		}
	}
}
