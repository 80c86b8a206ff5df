use std::ptr::NonNull;

/// View of a run of blocks handed out by a [`FixedPool`](crate::FixedPool).
///
/// A `MemoryBlock` is just an `(address, size)` pair. It does not own the
/// memory it points to, the pool does. The *empty* block (null address, zero
/// size) is what allocation returns when it cannot be satisfied and what a
/// successful [`FixedPool::free`](crate::FixedPool::free) leaves behind.
///
/// ```text
///            ptr
///             |
///             v
/// +-----------+-----------+-----------+-----------+
/// |  Block i  |  Block i+1|  Block i+2|  Block i+3|   (region)
/// +-----------+-----------+-----------+-----------+
///             <---------- size ------------------->
/// ```
///
/// The handle must be given back to the pool exactly once. After that the
/// address must not be used again.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MemoryBlock {
    ptr: Option<NonNull<u8>>,
    size: usize,
}

impl MemoryBlock {
    pub(crate) fn new(ptr: NonNull<u8>, size: usize) -> Self {
        Self {
            ptr: Some(ptr),
            size,
        }
    }

    /// The empty block, signalling a failed allocation.
    pub const fn empty() -> Self {
        Self { ptr: None, size: 0 }
    }

    /// Whether this is the empty block.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ptr.is_none()
    }

    /// Start address of the run, `None` for the empty block.
    #[inline]
    pub fn ptr(&self) -> Option<NonNull<u8>> {
        self.ptr
    }

    /// Start address of the run as a raw pointer, null for the empty block.
    #[inline]
    pub fn as_ptr(&self) -> *mut u8 {
        self.ptr.map_or(std::ptr::null_mut(), NonNull::as_ptr)
    }

    /// Granted size in bytes, always a multiple of the pool's block size.
    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    /// The granted bytes as a slice.
    ///
    /// **SAFETY**: the block must still be allocated in a live pool and no
    /// mutable access to the same bytes may exist for the returned lifetime.
    pub unsafe fn as_slice<'a>(&self) -> &'a [u8] {
        match self.ptr {
            Some(ptr) => unsafe { std::slice::from_raw_parts(ptr.as_ptr(), self.size) },
            None => &[],
        }
    }

    /// The granted bytes as a mutable slice.
    ///
    /// **SAFETY**: the block must still be allocated in a live pool and no
    /// other access to the same bytes may exist for the returned lifetime.
    pub unsafe fn as_mut_slice<'a>(&mut self) -> &'a mut [u8] {
        match self.ptr {
            Some(ptr) => unsafe { std::slice::from_raw_parts_mut(ptr.as_ptr(), self.size) },
            None => &mut [],
        }
    }

    /// Turns the handle into the empty block.
    #[inline]
    pub(crate) fn clear(&mut self) {
        *self = Self::empty();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_empty() {
        let block = MemoryBlock::default();

        assert!(block.is_empty());
        assert_eq!(block, MemoryBlock::empty());
        assert_eq!(block.size(), 0);
        assert!(block.as_ptr().is_null());
        assert!(unsafe { block.as_slice() }.is_empty());
    }

    #[test]
    fn clear_empties_the_handle() {
        let mut backing = [0u8; 16];
        let mut block = MemoryBlock::new(NonNull::from(&mut backing).cast(), 16);

        assert!(!block.is_empty());
        assert_eq!(unsafe { block.as_slice() }.len(), 16);

        block.clear();
        assert!(block.is_empty());
        assert_eq!(block.size(), 0);
    }
}
