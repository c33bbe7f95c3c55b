//! Result reporting
//!
//! Summaries are rendered as console text, raw series as `rep,cycles` CSV.

// Imports
use {
	crate::{
		classify::{Classification, RowPolicy},
		error::ExportError,
		sample::{CycleSample, SampleSeries},
		statistics::SummaryStatistics,
	},
	std::{
		fs,
		io::{self, BufRead, BufReader, BufWriter, Write},
		path::Path,
	},
};

/// Header of raw sample exports
pub const CSV_HEADER: &str = "rep,cycles";

/// Sink for human-readable results
#[derive(Debug)]
pub struct ResultSink<W> {
	/// Writer
	writer: W,
}

impl ResultSink<io::Stdout> {
	/// Creates a sink writing to stdout
	pub fn stdout() -> Self {
		Self::new(io::stdout())
	}
}

impl<W: Write> ResultSink<W> {
	/// Creates a new sink
	pub fn new(writer: W) -> Self {
		Self { writer }
	}

	/// Returns the inner writer
	pub fn into_inner(self) -> W {
		self.writer
	}

	/// Reports a labeled summary on a single line
	pub fn report(&mut self, label: &str, summary: &SummaryStatistics) -> Result<(), io::Error> {
		writeln!(self.writer, "{label}: {summary}")
	}

	/// Reports the summary of a copy of `size` bytes
	pub fn report_copy(&mut self, size: usize, summary: &SummaryStatistics) -> Result<(), io::Error> {
		writeln!(
			self.writer,
			"size={size} B: mean={:.2} cycles, median={}, std={:.2}, min={}, max={}",
			summary.mean, summary.median, summary.std_dev, summary.min, summary.max
		)
	}

	/// Reports the results and conclusion of the row policy experiment
	pub fn report_row_policy(
		&mut self,
		first: &SummaryStatistics,
		second: &SummaryStatistics,
		cross_row: &SummaryStatistics,
		classification: &Classification,
	) -> Result<(), io::Error> {
		let w = &mut self.writer;
		writeln!(w)?;
		writeln!(w, "=== RESULTS ===")?;
		writeln!(w, "First access to row:       {:.2} cycles", first.mean)?;
		writeln!(w, "Second access to same row: {:.2} cycles", second.mean)?;
		writeln!(w, "Access to different row:   {:.2} cycles", cross_row.mean)?;
		writeln!(w, "Speedup ratio (first/second): {:.2}x", classification.ratio)?;

		writeln!(w)?;
		writeln!(w, "=== CONCLUSION ===")?;
		match classification.policy {
			RowPolicy::OpenRow => {
				writeln!(w, "DRAM uses OPEN-ROW policy")?;
				writeln!(
					w,
					"Second access is {:.2}x faster - row buffer was kept open",
					classification.ratio
				)?;
			},
			RowPolicy::ClosedRow => {
				writeln!(w, "DRAM uses CLOSED-ROW policy")?;
				writeln!(w, "Second access shows minimal speedup ({:.2}x)", classification.ratio)?;
			},
		}

		w.flush()
	}
}

/// Writes every sample of `series` to `path`, as `rep,cycles` CSV.
///
/// Any existing file at `path` is overwritten.
pub fn export_raw(series: &SampleSeries, path: &Path) -> Result<(), ExportError> {
	let file = fs::File::create(path).map_err(|source| ExportError::Create {
		path: path.to_path_buf(),
		source,
	})?;
	let mut writer = BufWriter::new(file);

	let write = |writer: &mut BufWriter<fs::File>| -> Result<(), io::Error> {
		writeln!(writer, "{CSV_HEADER}")?;
		for (rep, sample) in series.samples().iter().enumerate() {
			writeln!(writer, "{rep},{}", sample.cycles())?;
		}
		writer.flush()
	};
	write(&mut writer).map_err(|source| ExportError::Io {
		path: path.to_path_buf(),
		source,
	})?;

	tracing::debug!(?path, samples = series.len(), tag = %series.tag(), "Exported raw samples");
	Ok(())
}

/// Reads back samples written by [`export_raw`], in trial order
pub fn read_raw(path: &Path) -> Result<Vec<CycleSample>, ExportError> {
	let file = fs::File::open(path).map_err(|source| ExportError::Open {
		path: path.to_path_buf(),
		source,
	})?;

	let parse_err = |line: usize, message: String| ExportError::Parse {
		path: path.to_path_buf(),
		line,
		message,
	};

	let mut samples = vec![];
	let mut found_header = false;
	for (line_idx, line) in BufReader::new(file).lines().enumerate() {
		let line = line.map_err(|source| ExportError::Io {
			path: path.to_path_buf(),
			source,
		})?;
		let line_num = line_idx + 1;

		if line_idx == 0 {
			if line != CSV_HEADER {
				return Err(parse_err(line_num, format!("Expected header {CSV_HEADER:?}, found {line:?}")));
			}
			found_header = true;
			continue;
		}

		let (rep, cycles) = line
			.split_once(',')
			.ok_or_else(|| parse_err(line_num, "Missing `,`".to_owned()))?;
		let rep = rep
			.parse::<usize>()
			.map_err(|err| parse_err(line_num, format!("Invalid rep {rep:?}: {err}")))?;
		if rep != samples.len() {
			return Err(parse_err(line_num, format!("Expected rep {}, found {rep}", samples.len())));
		}
		let cycles = cycles
			.parse::<u64>()
			.map_err(|err| parse_err(line_num, format!("Invalid cycles {cycles:?}: {err}")))?;

		samples.push(CycleSample(cycles));
	}

	match found_header {
		true => Ok(samples),
		false => Err(parse_err(1, "Missing header".to_owned())),
	}
}
