//! Measurements on the real timestamp counter and caches

// Imports
use dramprobe::{
	arena::PAGE_SIZE,
	config::SweepConfig,
	report,
	sweep::{self, SizeSelection},
	AccessPattern,
	BufferPair,
	Clflush,
	MeasurementConfig,
	MeasurementEngine,
	MemoryArena,
	PinPolicy,
	ResultSink,
	SeriesTag,
	Tsc,
};

#[test]
fn same_row_end_to_end() {
	let mut arena = MemoryArena::new(PinPolicy::Pin);
	let mut primary = arena.allocate(8192, PAGE_SIZE).expect("Unable to allocate");
	let mut secondary = arena.allocate(8192, PAGE_SIZE).expect("Unable to allocate");
	arena.fill(&mut primary, 0x5a);
	arena.fill(&mut secondary, 0xa5);

	// Note: Pinning may fail without privileges, which only adds outliers
	let _ = arena.pin();

	let mut buffers = BufferPair { primary, secondary };
	let mut engine = MeasurementEngine::new(Tsc, Clflush);
	let config = MeasurementConfig {
		buffer_size:    8192,
		trial_count:    1000,
		access_pattern: AccessPattern::SameRowRepeated,
	};
	let series = engine.run(&config, &mut buffers).expect("Unable to run");

	assert_eq!(series.len(), 2);
	assert_eq!(series[0].tag(), SeriesTag::FirstAccess);
	assert_eq!(series[1].tag(), SeriesTag::SecondAccess);
	for series in &series {
		assert_eq!(series.len(), 1000);
		assert!(series.samples().iter().all(|sample| sample.cycles() > 0));

		let summary = dramprobe::summarize(series).expect("Non-empty");
		assert_eq!(summary.count, 1000);
		assert!(summary.min <= summary.median && summary.median <= summary.max);
	}

	// Every read saw the fill pattern
	assert_eq!(engine.sink(), u64::from_ne_bytes([0x5a; 8]).wrapping_mul(2000));

	let BufferPair { primary, secondary } = buffers;
	arena.release(primary);
	arena.release(secondary);
}

#[test]
fn cross_row_and_copy_end_to_end() {
	let arena = MemoryArena::new(PinPolicy::Skip);
	let mut primary = arena.allocate(16384, PAGE_SIZE).expect("Unable to allocate");
	let mut secondary = arena.allocate(16384, PAGE_SIZE).expect("Unable to allocate");
	arena.fill(&mut primary, 0x5a);
	arena.fill(&mut secondary, 0xa5);
	let mut buffers = BufferPair { primary, secondary };

	let mut engine = MeasurementEngine::new(Tsc, Clflush);
	let configs = [AccessPattern::CrossRow, AccessPattern::SequentialCopy].map(|access_pattern| MeasurementConfig {
		buffer_size: 16384,
		trial_count: 200,
		access_pattern,
	});
	let series = engine.run_interleaved(&configs, &mut buffers).expect("Unable to run");

	assert_eq!(series.len(), 2);
	assert_eq!(series[0].tag(), SeriesTag::CrossRow);
	assert_eq!(series[1].tag(), SeriesTag::Copy { size: 16384 });
	assert!(series.iter().all(|series| series.len() == 200));
	assert!(series
		.iter()
		.flat_map(|series| series.samples())
		.all(|sample| sample.cycles() > 0));
	assert!(buffers.secondary.as_slice().iter().all(|&byte| byte == 0x5a));
}

#[test]
fn selector_runs_a_single_size() {
	let dir = tempfile::tempdir().expect("Unable to create temp dir");
	let config = SweepConfig {
		trial_tiers: vec![],
		fallback_trials: 100,
		..SweepConfig::default()
	};
	let selection = SizeSelection::from_arg(Some("12"), &config.exponents);

	let mut engine = MeasurementEngine::new(Tsc, Clflush);
	let mut arena = MemoryArena::new(PinPolicy::Skip);
	let mut sink = ResultSink::new(vec![]);
	let outcome = sweep::run_sweep(&mut engine, &mut arena, &config, selection, dir.path(), &mut sink)
		.expect("Unable to sweep");

	assert_eq!(outcome.completed.len(), 1);
	assert_eq!(outcome.completed[0].size, 4096);

	let files = std::fs::read_dir(dir.path())
		.expect("Unable to read output dir")
		.map(|entry| entry.expect("Unable to read entry").file_name())
		.collect::<Vec<_>>();
	assert_eq!(files, ["memcpy_2pow12_4096b.csv"]);

	let samples = report::read_raw(&dir.path().join("memcpy_2pow12_4096b.csv")).expect("Unable to read back");
	assert_eq!(samples.len(), 100);
	assert!(samples.iter().all(|sample| sample.cycles() > 0));

	let output = String::from_utf8(sink.into_inner()).expect("Utf-8");
	assert!(output.starts_with("size=4096 B: mean="));
}
