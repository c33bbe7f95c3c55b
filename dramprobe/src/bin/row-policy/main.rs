//! DRAM row buffer policy probe

// Modules
mod args;

// Imports
use {
	self::args::Args,
	anyhow::Context,
	clap::Parser,
	dramprobe::{
		config::{self, RowPolicyConfig},
		row_policy,
		Clflush,
		MeasurementEngine,
		MemoryArena,
		PinPolicy,
		ResultSink,
		Tsc,
	},
	dramprobe_util::logger,
};

fn main() -> Result<(), anyhow::Error> {
	// Get arguments
	let args = Args::parse();
	logger::pre_init::debug(format!("Args: {args:?}"));

	// Initialize logging
	logger::init(args.log_file.as_deref(), args.log_file_append);

	// Read the config, and apply any overrides
	let mut config = config::load::<RowPolicyConfig>(args.config_file.as_deref())?;
	if let Some(trials) = args.trials {
		config.trials = trials;
	}
	if let Some(threshold) = args.threshold {
		config.open_row_threshold = threshold;
	}
	tracing::debug!(?config, "Loaded config");

	// Run the experiment
	let mut arena = MemoryArena::new(match args.no_pin {
		true => PinPolicy::Skip,
		false => PinPolicy::Pin,
	});
	let mut engine = MeasurementEngine::new(Tsc, Clflush);
	let outcome =
		row_policy::run_row_policy(&mut engine, &mut arena, &config).context("Unable to run row policy probe")?;
	tracing::debug!(sink = engine.sink(), "Row policy probe finished");

	// Report the results
	let mut sink = ResultSink::stdout();
	for measured in [&outcome.first, &outcome.second, &outcome.cross_row] {
		sink.report(&measured.series.tag().to_string(), &measured.summary)
			.context("Unable to report summary")?;
	}
	sink.report_row_policy(
		&outcome.first.summary,
		&outcome.second.summary,
		&outcome.cross_row.summary,
		&outcome.classification,
	)
	.context("Unable to report conclusion")?;

	// Finally export the raw samples, if requested
	if let Some(export_dir) = &args.export_dir {
		let paths = outcome
			.export_raw(export_dir)
			.context("Unable to export raw samples")?;
		for path in paths {
			tracing::info!("Wrote per-trial CSV: {path:?}");
		}
	}

	Ok(())
}
