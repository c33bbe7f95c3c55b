//! Copy latency sweep

// Imports
use {
	crate::{
		arena::{MemoryArena, PinOutcome},
		cache::CacheController,
		config::SweepConfig,
		engine::{AccessPattern, BufferPair, MeasurementConfig, MeasurementEngine},
		error::ExportError,
		report::{self, ResultSink},
		statistics::{self, SummaryStatistics},
		timestamp::TimestampSource,
	},
	anyhow::Context,
	itertools::Itertools,
	std::{
		io,
		path::{Path, PathBuf},
	},
};

/// Which sizes to sweep
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub enum SizeSelection {
	/// Every configured size
	All,

	/// Only `2^exponent`
	Single(u32),
}

impl SizeSelection {
	/// Parses the optional size selector argument.
	///
	/// Anything that isn't one of `exponents` selects every size.
	pub fn from_arg(arg: Option<&str>, exponents: &[u32]) -> Self {
		let Some(arg) = arg else {
			return Self::All;
		};

		match arg.trim().parse::<u32>() {
			Ok(exponent) if exponents.contains(&exponent) => Self::Single(exponent),
			_ => {
				tracing::warn!(?arg, "Unrecognized size selector, sweeping every size");
				Self::All
			},
		}
	}

	/// Returns the selected exponents, in configured order
	pub fn exponents(self, exponents: &[u32]) -> Vec<u32> {
		match self {
			Self::All => exponents.to_vec(),
			Self::Single(exponent) => vec![exponent],
		}
	}
}

/// Returns the raw samples file name for a copy of `size = 2^exponent` bytes
pub fn csv_file_name(exponent: u32, size: usize) -> String {
	format!("memcpy_2pow{exponent}_{size}b.csv")
}

/// Outcome of [`run_sweep`]
#[derive(Debug)]
pub struct SweepOutcome {
	/// Outcome of the pinning request
	pub pin: PinOutcome,

	/// Sizes measured and exported
	pub completed: Vec<SizeResult>,

	/// Sizes skipped because their samples couldn't be exported
	pub skipped: Vec<SkippedSize>,
}

/// Result of a single size
#[derive(Debug)]
pub struct SizeResult {
	/// Exponent
	pub exponent: u32,

	/// Size, in bytes
	pub size: usize,

	/// Raw samples file
	pub csv_path: PathBuf,

	/// Summary
	pub summary: SummaryStatistics,
}

/// A size skipped due to an export error
#[derive(Debug)]
pub struct SkippedSize {
	/// Exponent
	pub exponent: u32,

	/// Error
	pub err: ExportError,
}

/// Sweeps copy latency over the selected sizes.
///
/// Raw samples of each size are written to `output_dir`, and summaries to `sink`.
/// If the samples of a size can't be exported, that size is skipped and the sweep
/// continues. Allocation and measurement failures abort the sweep.
pub fn run_sweep<T: TimestampSource, C: CacheController>(
	engine: &mut MeasurementEngine<T, C>,
	arena: &mut MemoryArena,
	config: &SweepConfig,
	selection: SizeSelection,
	output_dir: &Path,
	sink: &mut ResultSink<impl io::Write>,
) -> Result<SweepOutcome, anyhow::Error> {
	let exponents = selection.exponents(&config.exponents);
	tracing::info!("Sweeping sizes 2^{{{}}}", exponents.iter().join(", "));

	let pin = arena.pin();

	let mut completed = vec![];
	let mut skipped = vec![];
	for exponent in exponents {
		let size = 1_usize
			.checked_shl(exponent)
			.with_context(|| format!("Size 2^{exponent} doesn't fit in memory"))?;
		let trials = config.trials_for(size);
		tracing::info!("Testing 2^{exponent} = {size} B, trials={trials}");

		let mut buffers = BufferPair {
			primary:   arena
				.allocate(size, config.alignment)
				.context("Unable to allocate source buffer")?,
			secondary: arena
				.allocate(size, config.alignment)
				.context("Unable to allocate destination buffer")?,
		};
		arena.fill(&mut buffers.primary, config.source_fill);
		arena.fill(&mut buffers.secondary, config.destination_fill);

		engine
			.warm_up(size, &mut buffers, config.warmup_copies)
			.context("Unable to warm up")?;

		let measurement = MeasurementConfig {
			buffer_size:    size,
			trial_count:    trials,
			access_pattern: AccessPattern::SequentialCopy,
		};
		let series = engine
			.run(&measurement, &mut buffers)
			.with_context(|| format!("Unable to measure copies of {size} B"))?
			.pop()
			.context("Copy measurement produced no series")?;

		let BufferPair { primary, secondary } = buffers;
		arena.release(primary);
		arena.release(secondary);

		let csv_path = output_dir.join(csv_file_name(exponent, size));
		if let Err(err) = report::export_raw(&series, &csv_path) {
			tracing::error!(?csv_path, err = %err_chain(&err), "Unable to write raw samples, skipping size");
			skipped.push(SkippedSize { exponent, err });
			continue;
		}
		tracing::info!("Wrote per-trial CSV: {csv_path:?}");

		let summary = statistics::summarize(&series).context("Unable to summarize copies")?;
		sink.report_copy(size, &summary).context("Unable to report summary")?;

		completed.push(SizeResult {
			exponent,
			size,
			csv_path,
			summary,
		});
	}

	Ok(SweepOutcome { pin, completed, skipped })
}

/// Renders an export error along with its source
fn err_chain(err: &ExportError) -> String {
	match std::error::Error::source(err) {
		Some(source) => format!("{err}: {source}"),
		None => err.to_string(),
	}
}

#[cfg(test)]
mod tests {
	use {
		super::*,
		crate::{
			arena::PinPolicy,
			config::DEFAULT_EXPONENTS,
			testing::{CountingTimestamp, TrackingCache},
		},
	};

	#[test]
	fn selector_picks_known_exponent() {
		assert_eq!(SizeSelection::from_arg(Some("12"), &DEFAULT_EXPONENTS), SizeSelection::Single(12));
		assert_eq!(SizeSelection::from_arg(Some("21"), &DEFAULT_EXPONENTS), SizeSelection::Single(21));
	}

	#[test]
	fn selector_falls_back_to_every_size() {
		for arg in [None, Some("17"), Some("0"), Some("-3"), Some("twelve"), Some("")] {
			assert_eq!(SizeSelection::from_arg(arg, &DEFAULT_EXPONENTS), SizeSelection::All, "{arg:?}");
		}
		assert_eq!(SizeSelection::All.exponents(&DEFAULT_EXPONENTS), DEFAULT_EXPONENTS);
		assert_eq!(SizeSelection::Single(9).exponents(&DEFAULT_EXPONENTS), [9]);
	}

	#[test]
	fn csv_names_are_deterministic() {
		assert_eq!(csv_file_name(6, 64), "memcpy_2pow6_64b.csv");
		assert_eq!(csv_file_name(12, 4096), "memcpy_2pow12_4096b.csv");
		assert_eq!(csv_file_name(21, 1 << 21), "memcpy_2pow21_2097152b.csv");
	}

	fn small_config(exponents: Vec<u32>) -> SweepConfig {
		SweepConfig {
			exponents,
			trial_tiers: vec![],
			fallback_trials: 20,
			..SweepConfig::default()
		}
	}

	#[test]
	fn sweep_writes_one_file_per_size() {
		let dir = tempfile::tempdir().expect("Unable to create temp dir");
		let mut engine = MeasurementEngine::new(CountingTimestamp::new(11), TrackingCache::new());
		let mut arena = MemoryArena::new(PinPolicy::Skip);
		let mut sink = ResultSink::new(vec![]);

		let outcome = run_sweep(
			&mut engine,
			&mut arena,
			&small_config(vec![6, 7, 8]),
			SizeSelection::All,
			dir.path(),
			&mut sink,
		)
		.expect("Unable to sweep");

		assert!(matches!(outcome.pin, PinOutcome::Skipped));
		assert!(outcome.skipped.is_empty());
		assert_eq!(outcome.completed.iter().map(|res| res.size).collect::<Vec<_>>(), [64, 128, 256]);
		for res in &outcome.completed {
			assert_eq!(res.summary.count, 20);
			assert_eq!(res.summary.median, 11);
			let samples = report::read_raw(&res.csv_path).expect("Unable to read back");
			assert_eq!(samples.len(), 20);
		}

		let output = String::from_utf8(sink.into_inner()).expect("Utf-8");
		assert_eq!(output.lines().count(), 3);
		assert!(output.starts_with("size=64 B: mean=11.00 cycles, median=11"));
	}

	#[test]
	fn sweep_skips_sizes_that_cannot_be_exported() {
		let dir = tempfile::tempdir().expect("Unable to create temp dir");

		// Note: A directory in the way of the csv file makes it impossible to create
		std::fs::create_dir(dir.path().join(csv_file_name(7, 128))).expect("Unable to create dir");

		let mut engine = MeasurementEngine::new(CountingTimestamp::new(1), TrackingCache::new());
		let mut arena = MemoryArena::new(PinPolicy::Skip);
		let mut sink = ResultSink::new(vec![]);
		let outcome = run_sweep(
			&mut engine,
			&mut arena,
			&small_config(vec![6, 7, 8]),
			SizeSelection::All,
			dir.path(),
			&mut sink,
		)
		.expect("Unable to sweep");

		assert_eq!(outcome.completed.iter().map(|res| res.exponent).collect::<Vec<_>>(), [6, 8]);
		assert_eq!(outcome.skipped.len(), 1);
		assert_eq!(outcome.skipped[0].exponent, 7);
		assert!(matches!(outcome.skipped[0].err, ExportError::Create { .. }));
	}
}
