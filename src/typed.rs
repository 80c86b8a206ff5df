//! Typed values living in pool blocks.
//!
//! [`FixedPool::construct`] turns a raw [`MemoryBlock`] into a live `T` and
//! [`FixedPool::destruct`] turns it back. A [`Constructed`] is the block plus
//! the type, stamped with the pool and group it came from. Its value lives
//! exactly as long as that allocation does; a handle presented to any other
//! pool, or after its block was released and handed out again, is refused.
//!
//! Values that are still constructed when the pool is dropped are never
//! dropped, their bytes are simply unmapped with the region.

use std::{fmt, marker::PhantomData, mem, ptr::NonNull};

use crate::{block::GroupId, memory_block::MemoryBlock, pool::FixedPool};

/// A single `T` constructed inside pool memory.
///
/// Access goes through the pool ([`FixedPool::get`], [`FixedPool::get_mut`]),
/// which checks that the value has not been destructed yet.
pub struct Constructed<T> {
    block: MemoryBlock,
    pool: u64,
    group: GroupId,
    _value: PhantomData<T>,
}

impl<T> Constructed<T> {
    /// Raw pointer to the value, `None` once destructed.
    pub fn as_ptr(&self) -> Option<NonNull<T>> {
        self.block.ptr().map(NonNull::cast)
    }

    /// The block backing the value.
    pub fn block(&self) -> &MemoryBlock {
        &self.block
    }

    /// Whether [`FixedPool::destruct`] already succeeded on this handle.
    pub fn is_destructed(&self) -> bool {
        self.block.is_empty()
    }
}

impl<T> fmt::Debug for Constructed<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Constructed")
            .field("type", &std::any::type_name::<T>())
            .field("block", &self.block)
            .finish()
    }
}

/// `count` values of `T` constructed back to back inside pool memory.
pub struct ConstructedArray<T> {
    block: MemoryBlock,
    pool: u64,
    group: GroupId,
    count: usize,
    _value: PhantomData<T>,
}

impl<T> ConstructedArray<T> {
    /// Number of live elements, 0 once destructed.
    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Raw pointer to the first element, `None` once destructed.
    pub fn as_ptr(&self) -> Option<NonNull<T>> {
        self.block.ptr().map(NonNull::cast)
    }

    /// The block backing the elements.
    pub fn block(&self) -> &MemoryBlock {
        &self.block
    }
}

impl<T> fmt::Debug for ConstructedArray<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConstructedArray")
            .field("type", &std::any::type_name::<T>())
            .field("count", &self.count)
            .field("block", &self.block)
            .finish()
    }
}

/// Drops the initialized prefix of an array and frees its block unless
/// disarmed. Covers both `Err` from an initializer and a panic in one.
struct InitGuard<'a, T> {
    pool: &'a mut FixedPool,
    block: MemoryBlock,
    group: GroupId,
    initialized: usize,
    _value: PhantomData<T>,
}

impl<T> InitGuard<'_, T> {
    fn base(&self) -> *mut T {
        self.block.as_ptr().cast::<T>()
    }

    fn disarm(mut self) -> (MemoryBlock, GroupId) {
        let block = self.block;
        let group = self.group;
        self.initialized = 0;
        self.block = MemoryBlock::empty();
        (block, group)
    }
}

impl<T> Drop for InitGuard<'_, T> {
    fn drop(&mut self) {
        if self.block.is_empty() {
            return;
        }

        unsafe {
            let initialized = std::ptr::slice_from_raw_parts_mut(self.base(), self.initialized);
            std::ptr::drop_in_place(initialized);
        }
        self.pool.free(&mut self.block);
    }
}

impl FixedPool {
    /// Grants a block fit for `bytes` bytes aligned for `T`.
    fn allocate_for<T>(&mut self, bytes: usize) -> Option<(MemoryBlock, GroupId)> {
        let mut block = self.allocate_sized(bytes);
        let group = self.live_group(&block)?;

        if block.size() < bytes || !block.as_ptr().cast::<T>().is_aligned() {
            tracing::trace!(
                ty = std::any::type_name::<T>(),
                size = block.size(),
                "granted block cannot hold the value"
            );
            self.free(&mut block);
            return None;
        }

        Some((block, group))
    }

    /// Whether `block` is still the allocation this pool stamped with `group`.
    fn owns(&self, block: &MemoryBlock, pool: u64, group: GroupId) -> bool {
        pool == self.id() && self.live_group(block) == Some(group)
    }

    /// Moves `value` into pool memory.
    ///
    /// Returns `None` (dropping `value`) if no suitable block is available,
    /// including for zero-sized types.
    ///
    /// ```
    /// use blockpool::FixedPool;
    ///
    /// let mut pool = FixedPool::new(1024, 64).unwrap();
    ///
    /// let mut point = pool.construct((12.0f32, 25.0f32)).unwrap();
    /// assert_eq!(pool.get(&point), Some(&(12.0, 25.0)));
    ///
    /// assert!(pool.destruct(&mut point));
    /// assert!(!pool.destruct(&mut point));
    /// ```
    pub fn construct<T>(&mut self, value: T) -> Option<Constructed<T>> {
        self.construct_with(|| value)
    }

    /// Builds a `T` in pool memory. `init` only runs once space is granted.
    pub fn construct_with<T>(&mut self, init: impl FnOnce() -> T) -> Option<Constructed<T>> {
        let (block, group) = self.allocate_for::<T>(mem::size_of::<T>())?;
        let pool = self.id();

        let mut guard = InitGuard::<T> {
            pool: self,
            block,
            group,
            initialized: 0,
            _value: PhantomData,
        };
        let value = init();
        unsafe { guard.base().write(value) };
        guard.initialized = 1;

        let (block, group) = guard.disarm();
        Some(Constructed {
            block,
            pool,
            group,
            _value: PhantomData,
        })
    }

    /// Drops the value in place and releases its block.
    ///
    /// Returns `false`, touching nothing, if the handle was already destructed
    /// or does not belong to this pool.
    pub fn destruct<T>(&mut self, constructed: &mut Constructed<T>) -> bool {
        if !self.owns(&constructed.block, constructed.pool, constructed.group) {
            return false;
        }

        unsafe { std::ptr::drop_in_place(constructed.block.as_ptr().cast::<T>()) };

        self.free(&mut constructed.block)
    }

    /// Shared access to a constructed value, `None` once destructed.
    pub fn get<'a, T>(&'a self, constructed: &Constructed<T>) -> Option<&'a T> {
        if !self.owns(&constructed.block, constructed.pool, constructed.group) {
            return None;
        }

        constructed.as_ptr().map(|ptr| unsafe { ptr.as_ref() })
    }

    /// Exclusive access to a constructed value, `None` once destructed.
    pub fn get_mut<'a, T>(&'a mut self, constructed: &Constructed<T>) -> Option<&'a mut T> {
        if !self.owns(&constructed.block, constructed.pool, constructed.group) {
            return None;
        }

        constructed.as_ptr().map(|mut ptr| unsafe { ptr.as_mut() })
    }

    /// Constructs `count` default values back to back.
    pub fn construct_array<T: Default>(&mut self, count: usize) -> Option<ConstructedArray<T>> {
        self.construct_array_with(count, |_| T::default())
    }

    /// Constructs `count` values back to back, element `i` from `init(i)`,
    /// in index order.
    pub fn construct_array_with<T>(
        &mut self,
        count: usize,
        mut init: impl FnMut(usize) -> T,
    ) -> Option<ConstructedArray<T>> {
        match self.try_construct_array_with(count, |index| Ok::<T, std::convert::Infallible>(init(index))) {
            Ok(array) => array,
            Err(never) => match never {},
        }
    }

    /// Constructs `count` values back to back from a fallible initializer.
    ///
    /// `Ok(None)` means no suitable run was available. If `init` fails for any
    /// element, the elements already built are dropped, the whole run is
    /// released and the error is returned.
    pub fn try_construct_array_with<T, E>(
        &mut self,
        count: usize,
        mut init: impl FnMut(usize) -> Result<T, E>,
    ) -> Result<Option<ConstructedArray<T>>, E> {
        let Some(bytes) = mem::size_of::<T>().checked_mul(count) else {
            return Ok(None);
        };

        let Some((block, group)) = self.allocate_for::<T>(bytes) else {
            return Ok(None);
        };
        let pool = self.id();

        let mut guard = InitGuard::<T> {
            pool: self,
            block,
            group,
            initialized: 0,
            _value: PhantomData,
        };

        for index in 0..count {
            let value = init(index)?;
            unsafe { guard.base().add(index).write(value) };
            guard.initialized += 1;
        }

        let (block, group) = guard.disarm();
        Ok(Some(ConstructedArray {
            block,
            pool,
            group,
            count,
            _value: PhantomData,
        }))
    }

    /// Drops every element in index order, then releases the run as one unit.
    ///
    /// Returns `false`, touching nothing, if the array was already destructed
    /// or does not belong to this pool.
    pub fn destruct_array<T>(&mut self, array: &mut ConstructedArray<T>) -> bool {
        if !self.owns(&array.block, array.pool, array.group) {
            return false;
        }

        unsafe {
            let elements = std::ptr::slice_from_raw_parts_mut(array.block.as_ptr().cast::<T>(), array.count);
            std::ptr::drop_in_place(elements);
        }

        let released = self.free(&mut array.block);
        array.count = 0;
        released
    }

    /// Shared access to a constructed array, `None` once destructed.
    pub fn get_slice<'a, T>(&'a self, array: &ConstructedArray<T>) -> Option<&'a [T]> {
        if !self.owns(&array.block, array.pool, array.group) {
            return None;
        }

        array
            .as_ptr()
            .map(|ptr| unsafe { std::slice::from_raw_parts(ptr.as_ptr(), array.count) })
    }

    /// Exclusive access to a constructed array, `None` once destructed.
    pub fn get_slice_mut<'a, T>(&'a mut self, array: &ConstructedArray<T>) -> Option<&'a mut [T]> {
        if !self.owns(&array.block, array.pool, array.group) {
            return None;
        }

        array
            .as_ptr()
            .map(|ptr| unsafe { std::slice::from_raw_parts_mut(ptr.as_ptr(), array.count) })
    }
}
