//! Errors

// Imports
use std::{io, path::PathBuf};

/// Error allocating a test buffer
#[derive(Debug, thiserror::Error)]
pub enum AllocationError {
	/// Size or alignment cannot describe a valid buffer
	#[error("Invalid buffer layout: {size} bytes aligned to {alignment}")]
	InvalidLayout { size: usize, alignment: usize },

	/// Platform allocator refused the request
	#[error("Unable to allocate {size} bytes aligned to {alignment}")]
	OutOfMemory { size: usize, alignment: usize },
}

/// Failure to pin memory.
///
/// Non-fatal: measurements proceed, but may contain outliers caused by paging.
#[derive(Debug, thiserror::Error)]
#[error("Unable to lock memory")]
pub struct PinningWarning(#[source] pub io::Error);

/// Error exporting or re-reading raw samples
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
	/// Unable to create the destination
	#[error("Unable to create {path:?}")]
	Create {
		path:   PathBuf,
		#[source]
		source: io::Error,
	},

	/// Unable to open an existing export
	#[error("Unable to open {path:?}")]
	Open {
		path:   PathBuf,
		#[source]
		source: io::Error,
	},

	/// Unable to write to (or read from) the destination
	#[error("Unable to access {path:?}")]
	Io {
		path:   PathBuf,
		#[source]
		source: io::Error,
	},

	/// Malformed row while reading an export back
	#[error("Malformed row {line} in {path:?}: {message}")]
	Parse { path: PathBuf, line: usize, message: String },
}

/// Error during a measurement run
#[derive(Debug, thiserror::Error)]
pub enum MeasurementError {
	/// A buffer is smaller than the configured buffer size
	#[error("Buffer too small: {actual} bytes, but {required} bytes are required")]
	BufferTooSmall { required: usize, actual: usize },

	/// A timed read needs at least one word
	#[error("Buffer size {size} cannot hold a {word}-byte read")]
	ReadTooLarge { size: usize, word: usize },

	/// End timestamp preceded the start timestamp
	#[error("Timestamp went backwards: started at {start}, ended at {end}")]
	NonMonotonic { start: u64, end: u64 },

	/// Interleaved configurations disagree on the trial count
	#[error("Interleaved configurations have differing trial counts ({expected} vs {found})")]
	MismatchedTrials { expected: usize, found: usize },

	/// Nothing to measure
	#[error("No configurations were given")]
	EmptyPlan,
}

/// Error summarizing a series
#[derive(Debug, thiserror::Error)]
pub enum StatisticsError {
	/// Series had no samples
	#[error("Cannot summarize an empty series")]
	EmptySeries,
}
