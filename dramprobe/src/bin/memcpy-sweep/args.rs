//! Arguments

// Imports
use std::path::PathBuf;

/// Arguments
#[derive(Debug)]
#[derive(clap::Parser)]
pub struct Args {
	/// Log file
	///
	/// Specifies a file to perform verbose logging to.
	/// You can use `RUST_LOG_FILE` to set filtering options
	#[clap(long = "log-file")]
	pub log_file: Option<PathBuf>,

	/// Whether to append to the log file
	#[clap(long = "log-file-append")]
	pub log_file_append: bool,

	/// Size selector
	///
	/// Exponent of a single size to test (e.g. `12` for 4096 bytes).
	/// If it isn't one of the configured exponents, every size is tested.
	pub size_exponent: Option<String>,

	/// Config file
	#[clap(long = "config")]
	pub config_file: Option<PathBuf>,

	/// Output directory for the per-trial csv files
	#[clap(long = "output-dir", default_value = ".")]
	pub output_dir: PathBuf,

	/// Don't lock memory before measuring
	#[clap(long = "no-pin")]
	pub no_pin: bool,
}
