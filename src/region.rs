use std::ptr::{self, NonNull};

use crate::{
    error::PoolError,
    kernel::{self, page_size},
    utils::align,
};

/// The single contiguous span of bytes the pool carves into blocks.
///
/// [`libc::mmap`] (or `VirtualAlloc` on windows) gives us memory regions aligned
/// with the computer page size, so the mapping is rounded up to whole pages.
/// Only the first `size` bytes are ever handed out.
///
/// ```text
///  start                                              start + size    mapped
///    |                                                       |           |
///    v                                                       v           v
///    +------------+------------+------------+-------+--------+-----------+
///    |  Block 0   |  Block 1   |  Block 2   |  ...  | unused | page tail |
///    +------------+------------+------------+-------+--------+-----------+
///    <-block_size->
/// ```
///
/// The region is acquired once, never moved or resized, and given back to
/// the kernel when dropped.
pub(crate) struct Region {
    /// Start address returned by the kernel.
    start: NonNull<u8>,
    /// Usable size requested by the pool.
    size: usize,
    /// Length actually mapped (a multiple of the page size).
    mapped: usize,
}

impl Region {
    /// Acquires a zero filled region of at least `size` bytes.
    ///
    /// `size` must be greater than zero.
    pub(crate) fn acquire(size: usize) -> Result<Self, PoolError> {
        debug_assert!(size > 0);

        let mapped = align(size, page_size());

        let Some(start) = (unsafe { kernel::request_memory(mapped) }) else {
            tracing::error!(size, mapped, "kernel refused to map the pool region");
            return Err(PoolError::RegionUnavailable { size });
        };

        tracing::debug!(size, mapped, start = ?start, "pool region acquired");

        Ok(Self {
            start,
            size,
            mapped,
        })
    }

    #[inline]
    pub(crate) fn start(&self) -> NonNull<u8> {
        self.start
    }

    #[inline]
    pub(crate) fn size(&self) -> usize {
        self.size
    }

    /// Address of the byte at `offset`.
    #[inline]
    pub(crate) fn at(&self, offset: usize) -> NonNull<u8> {
        debug_assert!(offset < self.size);

        unsafe { self.start.add(offset) }
    }

    /// Offset of `addr` from the start of the region, if it lies inside it.
    pub(crate) fn offset_of(&self, addr: NonNull<u8>) -> Option<usize> {
        let offset = (addr.as_ptr() as usize).checked_sub(self.start.as_ptr() as usize)?;

        (offset < self.size).then_some(offset)
    }

    /// Fills `len` bytes starting at `offset` with zeroes.
    pub(crate) fn zero(&mut self, offset: usize, len: usize) {
        debug_assert!(offset + len <= self.size);

        unsafe { ptr::write_bytes(self.start.as_ptr().add(offset), 0, len) }
    }
}

impl Drop for Region {
    fn drop(&mut self) {
        if unsafe { kernel::return_memory(self.start, self.mapped) } {
            tracing::debug!(size = self.size, mapped = self.mapped, "pool region released");
        } else {
            tracing::warn!(
                size = self.size,
                mapped = self.mapped,
                "kernel refused to take the pool region back"
            );
        }
    }
}
