//! Aligned buffers for direct (unbuffered) transfers.
//!
//! Direct I/O requires the transfer buffer to be aligned to the host's
//! transfer alignment, which is the OS memory-page size but never less than
//! one sector. Every sector operation stages its data through an
//! [`AlignedBuf`]; the allocation is released when the buffer drops, on
//! every exit path.

use std::alloc::{self, Layout};
use std::ops::{Deref, DerefMut};
use std::ptr::NonNull;
use std::sync::OnceLock;

use crate::codec::round_up;
use crate::error::DeviceError;
use crate::layout::SECTOR_SIZE;

static TRANSFER_ALIGNMENT: OnceLock<usize> = OnceLock::new();

/// Host transfer alignment: the OS memory-page size, clamped to at least one
/// sector. Queried once per process.
pub fn transfer_alignment() -> usize {
    *TRANSFER_ALIGNMENT.get_or_init(query_alignment)
}

#[cfg(unix)]
fn query_alignment() -> usize {
    let page_size = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
    if page_size < SECTOR_SIZE as libc::c_long {
        SECTOR_SIZE
    } else {
        page_size as usize
    }
}

#[cfg(windows)]
fn query_alignment() -> usize {
    4096
}

/// Heap allocation whose address is a multiple of the requested alignment
/// and whose length is `size` rounded up to that alignment.
pub struct AlignedBuf {
    ptr: NonNull<u8>,
    layout: Layout,
}

impl AlignedBuf {
    /// Allocate a zero-filled aligned buffer able to hold `size` bytes.
    pub fn zeroed(size: usize, alignment: usize) -> Result<Self, DeviceError> {
        let len = round_up(size.max(1), alignment);
        let layout = Layout::from_size_align(len, alignment)
            .map_err(|_| DeviceError::Allocation { size: len })?;
        let ptr = unsafe { alloc::alloc_zeroed(layout) };
        let ptr = NonNull::new(ptr).ok_or(DeviceError::Allocation { size: len })?;
        Ok(Self { ptr, layout })
    }

    pub fn len(&self) -> usize {
        self.layout.size()
    }

    pub fn is_empty(&self) -> bool {
        self.layout.size() == 0
    }
}

impl Deref for AlignedBuf {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        unsafe { std::slice::from_raw_parts(self.ptr.as_ptr(), self.layout.size()) }
    }
}

impl DerefMut for AlignedBuf {
    fn deref_mut(&mut self) -> &mut [u8] {
        unsafe { std::slice::from_raw_parts_mut(self.ptr.as_ptr(), self.layout.size()) }
    }
}

impl Drop for AlignedBuf {
    fn drop(&mut self) {
        unsafe { alloc::dealloc(self.ptr.as_ptr(), self.layout) };
    }
}

// The buffer is exclusively owned plain memory.
unsafe impl Send for AlignedBuf {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alignment_is_at_least_one_sector() {
        let alignment = transfer_alignment();
        assert!(alignment >= SECTOR_SIZE);
        assert!(alignment.is_power_of_two());
    }

    #[test]
    fn allocations_are_aligned_and_rounded() {
        let alignment = transfer_alignment();
        let buf = AlignedBuf::zeroed(5, alignment).expect("aligned alloc");
        assert_eq!(buf.as_ptr() as usize % alignment, 0);
        assert_eq!(buf.len(), alignment);
        assert!(buf.iter().all(|&byte| byte == 0));
    }

    #[test]
    fn exact_multiples_keep_their_size() {
        let alignment = transfer_alignment();
        let buf = AlignedBuf::zeroed(alignment * 3, alignment).expect("aligned alloc");
        assert_eq!(buf.len(), alignment * 3);
    }

    #[test]
    fn buffers_are_writable() {
        let alignment = transfer_alignment();
        let mut buf = AlignedBuf::zeroed(SECTOR_SIZE, alignment).expect("aligned alloc");
        buf[0] = 0xA5;
        buf[SECTOR_SIZE - 1] = 0x5A;
        assert_eq!(buf[0], 0xA5);
        assert_eq!(buf[SECTOR_SIZE - 1], 0x5A);
    }
}
