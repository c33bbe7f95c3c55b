//! Configuration
//!
//! Both experiments may be configured by a json file, where every field is optional.

// Imports
use {
	crate::{arena::PAGE_SIZE, classify::DEFAULT_OPEN_ROW_THRESHOLD},
	anyhow::Context,
	serde::de::DeserializeOwned,
	std::{fs, path::Path},
};

/// Size exponents swept by default: `2^6 ..= 2^16`, `2^20` and `2^21`
pub const DEFAULT_EXPONENTS: [u32; 13] = [6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16, 20, 21];

/// Loads a configuration from a json file, or the default if `path` is `None`
pub fn load<T: DeserializeOwned + Default>(path: Option<&Path>) -> Result<T, anyhow::Error> {
	let Some(path) = path else {
		return Ok(T::default());
	};

	let file = fs::File::open(path).with_context(|| format!("Unable to open config file {path:?}"))?;
	serde_json::from_reader(file).with_context(|| format!("Unable to parse config file {path:?}"))
}

/// Copy sweep configuration
#[derive(Clone, Debug)]
#[derive(serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct SweepConfig {
	/// Exponents of the sizes to sweep
	pub exponents: Vec<u32>,

	/// Trial counts by size, in ascending `max_size` order
	pub trial_tiers: Vec<TrialTier>,

	/// Trial count for sizes above every tier
	pub fallback_trials: usize,

	/// Untimed copies before the first trial of each size
	pub warmup_copies: usize,

	/// Fill byte of the source buffer
	pub source_fill: u8,

	/// Fill byte of the destination buffer
	pub destination_fill: u8,

	/// Buffer alignment
	pub alignment: usize,
}

impl SweepConfig {
	/// Returns the number of trials for a copy of `size` bytes
	pub fn trials_for(&self, size: usize) -> usize {
		self.trial_tiers
			.iter()
			.find(|tier| size <= tier.max_size)
			.map_or(self.fallback_trials, |tier| tier.trials)
	}
}

impl Default for SweepConfig {
	fn default() -> Self {
		Self {
			exponents:        DEFAULT_EXPONENTS.to_vec(),
			// Note: Larger copies get fewer trials
			trial_tiers:      vec![
				TrialTier {
					max_size: 4096,
					trials:   200_000,
				},
				TrialTier {
					max_size: 65536,
					trials:   50_000,
				},
				TrialTier {
					max_size: 262_144,
					trials:   20_000,
				},
				TrialTier {
					max_size: 1_048_576,
					trials:   8_000,
				},
			],
			fallback_trials:  2_000,
			warmup_copies:    5,
			source_fill:      0x5a,
			destination_fill: 0xa5,
			alignment:        PAGE_SIZE,
		}
	}
}

/// Trial count for all sizes up to `max_size`
#[derive(Clone, Copy, Debug)]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct TrialTier {
	pub max_size: usize,
	pub trials:   usize,
}

/// Row policy experiment configuration
#[derive(Clone, Debug)]
#[derive(serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct RowPolicyConfig {
	/// Size of each row buffer
	pub row_size: usize,

	/// Number of trials
	pub trials: usize,

	/// First / second access ratio above which the policy is open-row
	pub open_row_threshold: f64,

	/// Fill byte of the first row
	pub first_fill: u8,

	/// Fill byte of the second row
	pub second_fill: u8,

	/// Buffer alignment
	pub alignment: usize,
}

impl Default for RowPolicyConfig {
	fn default() -> Self {
		Self {
			row_size:           8 * 1024,
			trials:             100_000,
			open_row_threshold: DEFAULT_OPEN_ROW_THRESHOLD,
			first_fill:         0x5a,
			second_fill:        0xa5,
			alignment:          PAGE_SIZE,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn default_trial_schedule() {
		let config = SweepConfig::default();
		assert_eq!(config.trials_for(64), 200_000);
		assert_eq!(config.trials_for(4096), 200_000);
		assert_eq!(config.trials_for(8192), 50_000);
		assert_eq!(config.trials_for(65536), 50_000);
		assert_eq!(config.trials_for(131_072), 20_000);
		assert_eq!(config.trials_for(1 << 20), 8_000);
		assert_eq!(config.trials_for(1 << 21), 2_000);
	}

	#[test]
	fn missing_fields_use_defaults() {
		let config = serde_json::from_str::<SweepConfig>(r#"{ "exponents": [12], "fallback_trials": 10 }"#)
			.expect("Unable to parse");
		assert_eq!(config.exponents, [12]);
		assert_eq!(config.fallback_trials, 10);
		assert_eq!(config.warmup_copies, 5);
		assert_eq!(config.trials_for(4096), 200_000);

		let config = serde_json::from_str::<RowPolicyConfig>(r#"{ "trials": 500, "open_row_threshold": 2.0 }"#)
			.expect("Unable to parse");
		assert_eq!(config.trials, 500);
		assert_eq!(config.open_row_threshold, 2.0);
		assert_eq!(config.row_size, 8192);
	}

	#[test]
	fn load_without_path_is_default() {
		let config = load::<RowPolicyConfig>(None).expect("Unable to load");
		assert_eq!(config.trials, 100_000);
	}

	#[test]
	fn load_reports_bad_files() {
		let dir = tempfile::tempdir().expect("Unable to create temp dir");
		let path = dir.path().join("config.json");
		fs::write(&path, "{ not json").expect("Unable to write");
		assert!(load::<SweepConfig>(Some(&path)).is_err());
		assert!(load::<SweepConfig>(Some(&dir.path().join("missing.json"))).is_err());
	}
}
