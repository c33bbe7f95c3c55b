//! Row buffer policy classification

// Imports
use std::fmt;

/// Default ratio above which the row buffer is considered open.
///
/// Empirical, not a property of the hardware.
pub const DEFAULT_OPEN_ROW_THRESHOLD: f64 = 1.5;

/// DRAM row buffer policy
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub enum RowPolicy {
	/// Row stays latched after an access
	OpenRow,

	/// Row is closed after every access
	ClosedRow,
}

impl fmt::Display for RowPolicy {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::OpenRow => write!(f, "open-row"),
			Self::ClosedRow => write!(f, "closed-row"),
		}
	}
}

/// Classification along with the ratio it was decided on
#[derive(PartialEq, Clone, Copy, Debug)]
pub struct Classification {
	/// Policy
	pub policy: RowPolicy,

	/// First access mean over second access mean
	pub ratio: f64,
}

/// Policy classifier
#[derive(Clone, Copy, Debug)]
pub struct PolicyClassifier {
	/// Ratio that must be exceeded to classify as open-row
	threshold: f64,
}

impl PolicyClassifier {
	/// Creates a classifier with a custom threshold
	pub fn new(threshold: f64) -> Self {
		Self { threshold }
	}

	/// Returns the threshold
	pub fn threshold(&self) -> f64 {
		self.threshold
	}

	/// Classifies the policy from the mean first and second access times.
	///
	/// Open-row iff `first / second` is strictly above the threshold.
	pub fn classify(&self, first_access_mean: f64, second_access_mean: f64) -> RowPolicy {
		self.classify_with_ratio(first_access_mean, second_access_mean).policy
	}

	/// Like [`Self::classify`], but also returns the ratio
	pub fn classify_with_ratio(&self, first_access_mean: f64, second_access_mean: f64) -> Classification {
		let ratio = first_access_mean / second_access_mean;

		// Note: `NaN` compares false, so it's classified as closed-row
		let policy = match ratio > self.threshold {
			true => RowPolicy::OpenRow,
			false => RowPolicy::ClosedRow,
		};

		Classification { policy, ratio }
	}
}

impl Default for PolicyClassifier {
	fn default() -> Self {
		Self::new(DEFAULT_OPEN_ROW_THRESHOLD)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn classify_default_threshold() {
		let classifier = PolicyClassifier::default();
		assert_eq!(classifier.classify(3.0, 1.0), RowPolicy::OpenRow);
		assert_eq!(classifier.classify(1.1, 1.0), RowPolicy::ClosedRow);
	}

	#[test]
	fn threshold_is_exclusive() {
		assert_eq!(PolicyClassifier::default().classify(1.5, 1.0), RowPolicy::ClosedRow);
		assert_eq!(PolicyClassifier::default().classify(301.0, 200.0), RowPolicy::OpenRow);
	}

	#[test]
	fn threshold_is_tunable() {
		let classifier = PolicyClassifier::new(1.05);
		assert_eq!(classifier.threshold(), 1.05);
		assert_eq!(classifier.classify(1.1, 1.0), RowPolicy::OpenRow);

		let classifier = PolicyClassifier::new(4.0);
		assert_eq!(classifier.classify(3.0, 1.0), RowPolicy::ClosedRow);
	}

	#[test]
	fn ratio_is_reported() {
		let classification = PolicyClassifier::default().classify_with_ratio(450.0, 150.0);
		assert_eq!(classification.ratio, 3.0);
		assert_eq!(classification.policy, RowPolicy::OpenRow);
	}

	#[test]
	fn degenerate_means() {
		let classifier = PolicyClassifier::default();
		assert_eq!(classifier.classify(0.0, 0.0), RowPolicy::ClosedRow);
		assert_eq!(classifier.classify(10.0, 0.0), RowPolicy::OpenRow);
	}
}
