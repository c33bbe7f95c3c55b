//! DRAM probe (`dramprobe`)
//!
//! Cycle-accurate memory microbenchmarks: DRAM row buffer policy and copy latency.

#[cfg(not(target_arch = "x86_64"))]
compile_error!("`dramprobe` requires `x86_64` for `rdtscp`, `cpuid` and `clflush`");

// Modules
pub mod arena;
pub mod cache;
pub mod classify;
pub mod config;
pub mod engine;
pub mod error;
pub mod report;
pub mod row_policy;
pub mod sample;
pub mod statistics;
pub mod sweep;
pub mod testing;
pub mod timestamp;

// Exports
pub use self::{
	arena::{MemoryArena, PinOutcome, PinPolicy, TestBuffer},
	cache::{CacheController, Clflush},
	classify::{PolicyClassifier, RowPolicy},
	engine::{AccessPattern, BufferPair, MeasurementConfig, MeasurementEngine},
	report::ResultSink,
	sample::{CycleSample, SampleSeries, SeriesTag},
	statistics::{summarize, SummaryStatistics},
	timestamp::{TimestampSource, Tsc},
};
