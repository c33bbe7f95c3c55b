//! Test buffer allocation

// Imports
use {
	crate::{
		cache::CACHE_LINE_SIZE,
		error::{AllocationError, PinningWarning},
	},
	std::{
		alloc::{self, Layout},
		fmt,
		io,
		ptr::NonNull,
		slice,
	},
};

/// Page size, in bytes
pub const PAGE_SIZE: usize = 4096;

/// Whether to lock the process' memory before measuring
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub enum PinPolicy {
	/// Lock all current and future pages
	Pin,

	/// Leave paging alone
	Skip,
}

/// Outcome of [`MemoryArena::pin`]
#[derive(Debug)]
pub enum PinOutcome {
	/// Pages are locked
	Pinned,

	/// Pinning was not requested
	Skipped,

	/// Pinning failed, measurements may contain paging outliers
	Failed(PinningWarning),
}

/// Memory arena.
///
/// Hands out aligned test buffers, and holds the process-wide pinning request.
#[derive(Debug)]
pub struct MemoryArena {
	/// Pin policy
	pin_policy: PinPolicy,

	/// Whether pinning already succeeded
	pinned: bool,
}

impl MemoryArena {
	/// Creates a new arena
	pub fn new(pin_policy: PinPolicy) -> Self {
		Self {
			pin_policy,
			pinned: false,
		}
	}

	/// Allocates a zeroed buffer of `size` bytes, aligned to `alignment`.
	///
	/// # Errors
	/// Returns an error if `size` is zero, if `alignment` isn't a power of two
	/// of at least [`CACHE_LINE_SIZE`], or if the allocator fails.
	pub fn allocate(&self, size: usize, alignment: usize) -> Result<TestBuffer, AllocationError> {
		let invalid = AllocationError::InvalidLayout { size, alignment };
		if size == 0 || alignment < CACHE_LINE_SIZE {
			return Err(invalid);
		}
		let layout = Layout::from_size_align(size, alignment).map_err(|_| invalid)?;

		// SAFETY: `layout` has a non-zero size.
		let ptr = unsafe { alloc::alloc_zeroed(layout) };
		let ptr = NonNull::new(ptr).ok_or(AllocationError::OutOfMemory { size, alignment })?;
		tracing::trace!(?ptr, size, alignment, "Allocated test buffer");

		Ok(TestBuffer { ptr, layout })
	}

	/// Fills `buffer` with `byte`.
	///
	/// Touches every page, so none of them stays backed by the zero page.
	pub fn fill(&self, buffer: &mut TestBuffer, byte: u8) {
		buffer.as_mut_slice().fill(byte);
		std::hint::black_box(buffer.as_mut_slice());
	}

	/// Locks all current and future pages of the process into memory.
	///
	/// Best effort: failure is reported, never fatal.
	pub fn pin(&mut self) -> PinOutcome {
		match (self.pin_policy, self.pinned) {
			(PinPolicy::Skip, _) => return PinOutcome::Skipped,
			(PinPolicy::Pin, true) => return PinOutcome::Pinned,
			(PinPolicy::Pin, false) => (),
		}

		// SAFETY: `mlockall` only affects paging, not memory contents.
		let res = unsafe { libc::mlockall(libc::MCL_CURRENT | libc::MCL_FUTURE) };
		match res {
			0 => {
				self.pinned = true;
				tracing::info!("Memory pinned");
				PinOutcome::Pinned
			},
			_ => {
				let warning = PinningWarning(io::Error::last_os_error());
				tracing::warn!(err = %warning.0, "Unable to pin memory, samples may include paging outliers");
				PinOutcome::Failed(warning)
			},
		}
	}

	/// Releases `buffer`.
	///
	/// Equivalent to dropping it, but makes the end of its lifetime explicit.
	pub fn release(&self, buffer: TestBuffer) {
		drop(buffer);
	}
}

/// An owned, aligned, test buffer
pub struct TestBuffer {
	/// Pointer to the start
	ptr: NonNull<u8>,

	/// Layout allocated with
	layout: Layout,
}

impl TestBuffer {
	/// Returns the size, in bytes
	pub fn len(&self) -> usize {
		self.layout.size()
	}

	/// Returns if the buffer is empty.
	///
	/// Never true, since the arena refuses empty buffers
	pub fn is_empty(&self) -> bool {
		self.layout.size() == 0
	}

	/// Returns the alignment
	pub fn alignment(&self) -> usize {
		self.layout.align()
	}

	/// Returns a pointer to the start
	pub fn as_ptr(&self) -> *const u8 {
		self.ptr.as_ptr()
	}

	/// Returns the contents
	pub fn as_slice(&self) -> &[u8] {
		// SAFETY: We own `len` initialized bytes at `ptr`.
		unsafe { slice::from_raw_parts(self.ptr.as_ptr(), self.len()) }
	}

	/// Returns the contents, mutably
	pub fn as_mut_slice(&mut self) -> &mut [u8] {
		// SAFETY: We own `len` initialized bytes at `ptr`, and we're borrowed mutably.
		unsafe { slice::from_raw_parts_mut(self.ptr.as_ptr(), self.len()) }
	}
}

impl Drop for TestBuffer {
	fn drop(&mut self) {
		tracing::trace!(ptr = ?self.ptr, size = self.len(), "Releasing test buffer");

		// SAFETY: `ptr` was allocated by the global allocator with `layout`.
		unsafe {
			alloc::dealloc(self.ptr.as_ptr(), self.layout);
		}
	}
}

impl fmt::Debug for TestBuffer {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("TestBuffer")
			.field("ptr", &self.ptr)
			.field("len", &self.len())
			.field("alignment", &self.alignment())
			.finish()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn allocate_is_aligned() {
		let arena = MemoryArena::new(PinPolicy::Skip);
		for alignment in [CACHE_LINE_SIZE, PAGE_SIZE, 2 * PAGE_SIZE] {
			let buffer = arena.allocate(8192, alignment).expect("Unable to allocate");
			assert_eq!(buffer.as_ptr() as usize % alignment, 0);
			assert_eq!(buffer.len(), 8192);
			assert_eq!(buffer.alignment(), alignment);
		}
	}

	#[test]
	fn allocate_rejects_bad_layouts() {
		let arena = MemoryArena::new(PinPolicy::Skip);
		assert!(matches!(
			arena.allocate(0, PAGE_SIZE),
			Err(AllocationError::InvalidLayout { .. })
		));
		assert!(matches!(
			arena.allocate(4096, 32),
			Err(AllocationError::InvalidLayout { .. })
		));
		assert!(matches!(
			arena.allocate(4096, 3 * CACHE_LINE_SIZE),
			Err(AllocationError::InvalidLayout { .. })
		));
		assert!(matches!(
			arena.allocate(usize::MAX - 10, PAGE_SIZE),
			Err(AllocationError::InvalidLayout { .. })
		));
	}

	#[test]
	fn fill_writes_every_byte() {
		let arena = MemoryArena::new(PinPolicy::Skip);
		let mut a = arena.allocate(3 * PAGE_SIZE + 17, PAGE_SIZE).expect("Unable to allocate");
		let mut b = arena.allocate(3 * PAGE_SIZE + 17, PAGE_SIZE).expect("Unable to allocate");
		arena.fill(&mut a, 0x5a);
		arena.fill(&mut b, 0xa5);

		assert!(a.as_slice().iter().all(|&byte| byte == 0x5a));
		assert!(b.as_slice().iter().all(|&byte| byte == 0xa5));

		arena.release(a);
		arena.release(b);
	}

	#[test]
	fn skipped_pin_does_nothing() {
		let mut arena = MemoryArena::new(PinPolicy::Skip);
		assert!(matches!(arena.pin(), PinOutcome::Skipped));
	}
}
