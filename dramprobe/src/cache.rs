//! Cache line invalidation

// Imports
use dramprobe_util::AlignExt;

/// Cache line size, in bytes
pub const CACHE_LINE_SIZE: usize = 64;

/// Evicts memory regions from the cache hierarchy
pub trait CacheController {
	/// Evicts every cache line backing `region` from all cache levels.
	///
	/// Once this returns, the invalidation is globally visible, so the next
	/// access to `region` must be served from memory.
	fn invalidate(&mut self, region: &[u8]);

	/// Notifies the controller that `region` was just accessed.
	///
	/// Called outside of timed intervals. Hardware caches track this on their own.
	fn touch(&mut self, _region: &[u8]) {}
}

/// Returns the address of every cache line overlapping `[addr, addr + len)`.
///
/// Covers the partial lines at both ends, so the last byte's line is always included.
pub fn cache_lines(addr: usize, len: usize) -> impl Iterator<Item = usize> {
	let first = addr.align_down(CACHE_LINE_SIZE);
	let end = match len {
		0 => first,
		_ => addr + len,
	};

	(first..end).step_by(CACHE_LINE_SIZE)
}

/// Invalidates with `clflush`, followed by an `mfence`
#[derive(Clone, Copy, Default, Debug)]
pub struct Clflush;

impl CacheController for Clflush {
	#[inline]
	fn invalidate(&mut self, region: &[u8]) {
		let base = region.as_ptr();
		let base_addr = base as usize;
		for line_addr in cache_lines(base_addr, region.len()) {
			// Note: The first line may start before `region`, so stay within it
			let offset = line_addr.saturating_sub(base_addr);

			// SAFETY: `offset < region.len()`, so the pointer is within `region`.
			//         `clflush` is part of `sse2`, which every `x86_64` cpu has.
			unsafe {
				core::arch::x86_64::_mm_clflush(base.add(offset));
			}
		}

		// SAFETY: `mfence` is part of `sse2`.
		unsafe {
			core::arch::x86_64::_mm_mfence();
		}
	}
}
