//! Measurement engine
//!
//! Runs repeated trials of an access pattern over a pair of test buffers,
//! producing one [`SampleSeries`] per measured quantity.
//!
//! Each trial invalidates the buffers it touches, then brackets the timed
//! operation with the timestamp source. Every loaded or copied value is folded
//! into an opaque accumulator, so the timed accesses cannot be elided.

// Imports
use {
	crate::{
		arena::TestBuffer,
		cache::CacheController,
		error::MeasurementError,
		sample::{CycleSample, SampleSeries, SeriesTag},
		timestamp::TimestampSource,
	},
	itertools::Itertools,
	std::{hint, mem, ops::Range, ptr},
};

/// Word read by the timed loads
type Word = u64;

/// Access pattern of a trial
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub enum AccessPattern {
	/// Invalidate the primary buffer, then time two reads of its first word.
	///
	/// There is no invalidation between both reads, so the second one shows
	/// whether the DRAM row was left open.
	SameRowRepeated,

	/// Invalidate the secondary buffer, then time a read of its first word
	CrossRow,

	/// Invalidate both buffers, then time a copy from the primary to the secondary
	SequentialCopy,
}

/// Measurement configuration
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub struct MeasurementConfig {
	/// Bytes of each buffer that are invalidated and accessed
	pub buffer_size: usize,

	/// Number of trials
	pub trial_count: usize,

	/// Access pattern
	pub access_pattern: AccessPattern,
}

impl MeasurementConfig {
	/// Returns the tags of the series produced by this configuration
	pub fn series_tags(&self) -> Vec<SeriesTag> {
		match self.access_pattern {
			AccessPattern::SameRowRepeated => vec![SeriesTag::FirstAccess, SeriesTag::SecondAccess],
			AccessPattern::CrossRow => vec![SeriesTag::CrossRow],
			AccessPattern::SequentialCopy => vec![SeriesTag::Copy { size: self.buffer_size }],
		}
	}
}

/// Buffers under test.
///
/// Same-row reads use the primary, cross-row reads use the secondary, and
/// copies go from the primary to the secondary.
#[derive(Debug)]
pub struct BufferPair {
	/// Primary buffer
	pub primary: TestBuffer,

	/// Secondary buffer
	pub secondary: TestBuffer,
}

/// Measurement engine
#[derive(Debug)]
pub struct MeasurementEngine<T, C> {
	/// Timestamp source
	timestamps: T,

	/// Cache controller
	cache: C,

	/// Accumulator of every value observed by a timed access
	sink: u64,
}

impl<T: TimestampSource, C: CacheController> MeasurementEngine<T, C> {
	/// Creates a new engine
	pub fn new(timestamps: T, cache: C) -> Self {
		Self {
			timestamps,
			cache,
			sink: 0,
		}
	}

	/// Returns the accumulator of all observed values
	pub fn sink(&self) -> u64 {
		self.sink
	}

	/// Returns the cache controller
	pub fn cache(&self) -> &C {
		&self.cache
	}

	/// Returns the timestamp source and cache controller
	pub fn into_parts(self) -> (T, C) {
		(self.timestamps, self.cache)
	}

	/// Runs all trials of `config`.
	///
	/// Returns one series per measured quantity, see [`MeasurementConfig::series_tags`].
	pub fn run(
		&mut self,
		config: &MeasurementConfig,
		buffers: &mut BufferPair,
	) -> Result<Vec<SampleSeries>, MeasurementError> {
		self.run_interleaved(std::slice::from_ref(config), buffers)
	}

	/// Runs several configurations with interleaved trials.
	///
	/// Each trial runs every configuration once, in order, so all series cover
	/// the same time window. All configurations must have the same trial count.
	///
	/// Returns the series of every configuration, in order.
	pub fn run_interleaved(
		&mut self,
		configs: &[MeasurementConfig],
		buffers: &mut BufferPair,
	) -> Result<Vec<SampleSeries>, MeasurementError> {
		let trial_count = configs.first().ok_or(MeasurementError::EmptyPlan)?.trial_count;
		for config in configs {
			if config.trial_count != trial_count {
				return Err(MeasurementError::MismatchedTrials {
					expected: trial_count,
					found:    config.trial_count,
				});
			}
			Self::check_buffers(config, buffers)?;
		}

		// Create all series up front, remembering where each configuration's series are
		let mut series = vec![];
		let mut series_ranges = Vec::with_capacity(configs.len());
		for config in configs {
			let start = series.len();
			series.extend(
				config
					.series_tags()
					.into_iter()
					.map(|tag| SampleSeries::new(tag, *config)),
			);
			series_ranges.push(start..series.len());
		}
		tracing::debug!(
			trial_count,
			series = %series.iter().map(SampleSeries::tag).join(", "),
			"Starting measurement"
		);

		for _ in 0..trial_count {
			for (config, range) in configs.iter().zip(&series_ranges) {
				self.trial(config, buffers, &mut series[Range::clone(range)])?;
			}
		}

		tracing::debug!(sink = self.sink, "Finished measurement");
		Ok(series)
	}

	/// Performs `copies` untimed copies of `buffer_size` bytes, then invalidates both buffers
	pub fn warm_up(
		&mut self,
		buffer_size: usize,
		buffers: &mut BufferPair,
		copies: usize,
	) -> Result<(), MeasurementError> {
		Self::check_len(buffer_size, &buffers.primary)?;
		Self::check_len(buffer_size, &buffers.secondary)?;

		let src = &buffers.primary.as_slice()[..buffer_size];
		let dst = &mut buffers.secondary.as_mut_slice()[..buffer_size];
		for _ in 0..copies {
			dst.copy_from_slice(src);
			self.observe_copy(dst);
		}

		self.cache.invalidate(src);
		self.cache.invalidate(dst);

		Ok(())
	}

	/// Performs a single trial of `config`, pushing onto `series`
	fn trial(
		&mut self,
		config: &MeasurementConfig,
		buffers: &mut BufferPair,
		series: &mut [SampleSeries],
	) -> Result<(), MeasurementError> {
		let size = config.buffer_size;
		match config.access_pattern {
			AccessPattern::SameRowRepeated => {
				let region = &buffers.primary.as_slice()[..size];
				self.cache.invalidate(region);

				// Note: No invalidation between both reads
				let first = self.timed_read(region)?;
				let second = self.timed_read(region)?;

				series[0].push(first);
				series[1].push(second);
			},

			AccessPattern::CrossRow => {
				let region = &buffers.secondary.as_slice()[..size];
				self.cache.invalidate(region);

				let sample = self.timed_read(region)?;
				series[0].push(sample);
			},

			AccessPattern::SequentialCopy => {
				let src = &buffers.primary.as_slice()[..size];
				let dst = &mut buffers.secondary.as_mut_slice()[..size];
				self.cache.invalidate(src);
				self.cache.invalidate(dst);

				let start = self.timestamps.start();
				dst.copy_from_slice(src);
				let end = self.timestamps.end();

				self.observe_copy(dst);
				self.cache.touch(src);
				self.cache.touch(dst);
				series[0].push(end.cycles_since(start)?);
			},
		}

		Ok(())
	}

	/// Times a read of the first word of `region`
	#[inline(always)]
	fn timed_read(&mut self, region: &[u8]) -> Result<CycleSample, MeasurementError> {
		let word = region.as_ptr().cast::<Word>();

		let start = self.timestamps.start();
		// SAFETY: `region` is at least one word long and cache-line aligned.
		let value = hint::black_box(unsafe { ptr::read_volatile(word) });
		let end = self.timestamps.end();

		self.sink = self.sink.wrapping_add(value);
		self.cache.touch(&region[..mem::size_of::<Word>()]);
		end.cycles_since(start)
	}

	/// Folds the result of a copy into the accumulator
	fn observe_copy(&mut self, dst: &mut [u8]) {
		let dst = hint::black_box(dst);
		if let Some(&last) = dst.last() {
			self.sink = self.sink.wrapping_add(u64::from(last));
		}
	}

	/// Checks that `buffers` are usable by `config`
	fn check_buffers(config: &MeasurementConfig, buffers: &BufferPair) -> Result<(), MeasurementError> {
		let size = config.buffer_size;
		match config.access_pattern {
			AccessPattern::SameRowRepeated => Self::check_read(size, &buffers.primary),
			AccessPattern::CrossRow => Self::check_read(size, &buffers.secondary),
			AccessPattern::SequentialCopy => {
				Self::check_len(size, &buffers.primary)?;
				Self::check_len(size, &buffers.secondary)
			},
		}
	}

	/// Checks that `buffer` can serve timed reads of `size` bytes
	fn check_read(size: usize, buffer: &TestBuffer) -> Result<(), MeasurementError> {
		if size < mem::size_of::<Word>() {
			return Err(MeasurementError::ReadTooLarge {
				size,
				word: mem::size_of::<Word>(),
			});
		}
		Self::check_len(size, buffer)
	}

	/// Checks that `buffer` holds at least `size` bytes
	fn check_len(size: usize, buffer: &TestBuffer) -> Result<(), MeasurementError> {
		match buffer.len() >= size {
			true => Ok(()),
			false => Err(MeasurementError::BufferTooSmall {
				required: size,
				actual:   buffer.len(),
			}),
		}
	}
}
