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

	/// Config file
	#[clap(long = "config")]
	pub config_file: Option<PathBuf>,

	/// Number of trials, overrides the config
	#[clap(long = "trials")]
	pub trials: Option<usize>,

	/// First / second access ratio above which the policy is open-row, overrides the config
	#[clap(long = "threshold")]
	pub threshold: Option<f64>,

	/// Directory to export the per-trial samples of each series to
	#[clap(long = "export-dir")]
	pub export_dir: Option<PathBuf>,

	/// Don't lock memory before measuring
	#[clap(long = "no-pin")]
	pub no_pin: bool,
}
