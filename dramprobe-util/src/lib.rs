//! Utilities

// Modules
pub mod logger;

/// Extension trait for `usize` to align addresses
#[extend::ext(name = AlignExt)]
pub impl usize {
	/// Rounds this value down to a multiple of `align`.
	///
	/// `align` must be a power of two.
	fn align_down(self, align: usize) -> usize {
		debug_assert!(align.is_power_of_two(), "Alignment must be a power of two");
		self & !(align - 1)
	}
}
