//! Copy latency sweep across power-of-two sizes

// Modules
mod args;

// Imports
use {
	self::args::Args,
	anyhow::Context,
	clap::Parser,
	dramprobe::{
		config::{self, SweepConfig},
		sweep::{self, SizeSelection},
		Clflush,
		MeasurementEngine,
		MemoryArena,
		PinPolicy,
		ResultSink,
		Tsc,
	},
	dramprobe_util::logger,
	itertools::Itertools,
};

fn main() -> Result<(), anyhow::Error> {
	// Get arguments
	let args = Args::parse();
	logger::pre_init::debug(format!("Args: {args:?}"));

	// Initialize logging
	logger::init(args.log_file.as_deref(), args.log_file_append);

	// Read the config
	let config = config::load::<SweepConfig>(args.config_file.as_deref())?;
	tracing::debug!(?config, "Loaded config");
	let selection = SizeSelection::from_arg(args.size_exponent.as_deref(), &config.exponents);

	// Then run the sweep
	let mut arena = MemoryArena::new(match args.no_pin {
		true => PinPolicy::Skip,
		false => PinPolicy::Pin,
	});
	let mut engine = MeasurementEngine::new(Tsc, Clflush);
	let mut sink = ResultSink::stdout();
	let outcome = sweep::run_sweep(
		&mut engine,
		&mut arena,
		&config,
		selection,
		&args.output_dir,
		&mut sink,
	)
	.context("Unable to run sweep")?;
	tracing::debug!(sink = engine.sink(), "Sweep finished");

	if !outcome.skipped.is_empty() {
		let skipped = outcome
			.skipped
			.iter()
			.map(|skipped| format!("2^{}", skipped.exponent))
			.join(", ");
		anyhow::bail!("Unable to export samples of sizes {skipped}");
	}

	Ok(())
}
