//! Serialized timestamp counter.
//!
//! Every timed interval is bracketed by [`TimestampSource::start`] and
//! [`TimestampSource::end`]. Both serialize the pipeline so the interval
//! contains exactly the instructions issued between the two calls.

// Imports
use crate::{error::MeasurementError, sample::CycleSample};

/// A raw cycle counter reading
#[derive(PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Debug)]
pub struct Timestamp(pub u64);

impl Timestamp {
	/// Returns the cycles elapsed from `start` to `self`.
	///
	/// # Errors
	/// Returns an error if `self` precedes `start`, which means the
	/// serialization protocol was violated.
	pub fn cycles_since(self, start: Self) -> Result<CycleSample, MeasurementError> {
		self.0
			.checked_sub(start.0)
			.map(CycleSample)
			.ok_or(MeasurementError::NonMonotonic {
				start: start.0,
				end:   self.0,
			})
	}
}

/// Source of ordering-safe timestamps
pub trait TimestampSource {
	/// Reads the counter after all prior instructions have retired
	fn start(&mut self) -> Timestamp;

	/// Reads the counter once all prior instructions have retired, and
	/// before any later instruction may begin.
	fn end(&mut self) -> Timestamp;
}

/// Time stamp counter, serialized with `cpuid`.
///
/// `start` is `cpuid; rdtsc`, `end` is `rdtscp; cpuid`.
#[derive(Clone, Copy, Default, Debug)]
pub struct Tsc;

impl TimestampSource for Tsc {
	#[inline(always)]
	fn start(&mut self) -> Timestamp {
		let lo: u32;
		let hi: u32;

		// SAFETY: `cpuid` and `rdtsc` are available on every `x86_64` cpu
		//         and only touch the registers declared below.
		// Note: `rbx` is reserved by the compiler, so we save it by hand.
		//       We don't pass `nomem` so the compiler can't move memory
		//       accesses across this block.
		unsafe {
			core::arch::asm!(
				"mov {rbx_save}, rbx",
				"cpuid",
				"mov rbx, {rbx_save}",
				"rdtsc",
				rbx_save = out(reg) _,
				inout("eax") 0u32 => lo,
				out("ecx") _,
				out("edx") hi,
				options(nostack, preserves_flags),
			);
		}

		Timestamp((u64::from(hi) << 32) | u64::from(lo))
	}

	#[inline(always)]
	fn end(&mut self) -> Timestamp {
		let lo: u32;
		let hi: u32;

		// SAFETY: See `start`. `rdtscp` additionally writes `ecx`.
		unsafe {
			core::arch::asm!(
				"rdtscp",
				"mov {lo:e}, eax",
				"mov {hi:e}, edx",
				"mov {rbx_save}, rbx",
				"xor eax, eax",
				"cpuid",
				"mov rbx, {rbx_save}",
				lo = out(reg) lo,
				hi = out(reg) hi,
				rbx_save = out(reg) _,
				out("eax") _,
				out("ecx") _,
				out("edx") _,
				options(nostack),
			);
		}

		Timestamp((u64::from(hi) << 32) | u64::from(lo))
	}
}
