//! Helper functions for the pool that don't particularly belong to any
//! concrete module of the crate.

/// It aligns `to_be_aligned` up to the next multiple of `alignment`.
///
/// `alignment` must be a power of two. This is used to round the region
/// mapping up to a whole number of pages, see [`crate::kernel::page_size`].
pub(crate) fn align(to_be_aligned: usize, alignment: usize) -> usize {
    debug_assert!(alignment.is_power_of_two());

    (to_be_aligned + alignment - 1) & !(alignment - 1)
}

/// Number of `block_size` blocks needed to hold `size` bytes.
#[inline]
pub(crate) fn blocks_for(size: usize, block_size: usize) -> usize {
    size.div_ceil(block_size)
}
