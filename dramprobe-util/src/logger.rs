//! Logger
//!
//! Logs to stderr, filtered by `RUST_LOG`, and optionally to a file,
//! filtered by `RUST_LOG_FILE`.

// Imports
use {
	std::{
		fs,
		path::Path,
		sync::{Arc, Mutex},
	},
	tracing_subscriber::{prelude::*, EnvFilter, Layer},
};

/// Default filter for stderr
const DEFAULT_STDERR_FILTER: &str = "info";

/// Default filter for the log file
const DEFAULT_FILE_FILTER: &str = "debug";

/// Initializes the logger.
///
/// Any messages logged through [`pre_init`] are emitted right after.
/// If the log file cannot be opened, logging continues on stderr only.
pub fn init(log_file: Option<&Path>, log_file_append: bool) {
	let stderr_layer = tracing_subscriber::fmt::layer()
		.with_writer(std::io::stderr)
		.with_filter(env_filter("RUST_LOG", DEFAULT_STDERR_FILTER));

	let mut file_open_err = None;
	let file_layer = log_file.and_then(|path| {
		let file = fs::OpenOptions::new()
			.create(true)
			.write(true)
			.append(log_file_append)
			.truncate(!log_file_append)
			.open(path);

		match file {
			Ok(file) => Some(
				tracing_subscriber::fmt::layer()
					.with_ansi(false)
					.with_writer(Arc::new(file))
					.with_filter(env_filter("RUST_LOG_FILE", DEFAULT_FILE_FILTER)),
			),
			Err(err) => {
				file_open_err = Some((path.to_path_buf(), err));
				None
			},
		}
	});

	if let Err(err) = tracing_subscriber::registry()
		.with(stderr_layer)
		.with(file_layer)
		.try_init()
	{
		eprintln!("Unable to initialize logger: {err}");
	}

	if let Some((path, err)) = file_open_err {
		tracing::warn!(?path, ?err, "Unable to open log file");
	}

	for msg in pre_init::take() {
		tracing::debug!("{msg}");
	}
}

/// Creates an env filter from `var`, falling back to `default`
fn env_filter(var: &str, default: &str) -> EnvFilter {
	EnvFilter::try_from_env(var).unwrap_or_else(|_| EnvFilter::new(default))
}

/// Logging before the logger is initialized
pub mod pre_init {
	use super::*;

	/// Messages queued before initialization
	static QUEUED: Mutex<Vec<String>> = Mutex::new(Vec::new());

	/// Queues a debug message to be logged once the logger is initialized
	pub fn debug(msg: impl Into<String>) {
		// Note: A poisoned queue only means another thread panicked while pushing
		QUEUED.lock().unwrap_or_else(|err| err.into_inner()).push(msg.into());
	}

	/// Takes all queued messages
	pub(super) fn take() -> Vec<String> {
		std::mem::take(&mut *QUEUED.lock().unwrap_or_else(|err| err.into_inner()))
	}
}
