use std::{
    fmt,
    ops::Range,
    ptr::NonNull,
    sync::atomic::{AtomicU64, Ordering},
};

use crate::{
    block::GroupId,
    config::PoolConfig,
    error::PoolError,
    memory_block::MemoryBlock,
    policy::{DistributionPolicy, Partitions},
    region::Region,
    table::BlockTable,
    utils::blocks_for,
};

/// Source of pool ids. Every pool gets a fresh one, so handles can tell a pool
/// apart from a later one that was handed the same mapping.
static NEXT_POOL_ID: AtomicU64 = AtomicU64::new(1);

/// A fixed-region memory pool.
///
/// The pool maps one contiguous [`Region`] when it is created and carves it
/// into `block_count` blocks of `block_size` bytes. Allocations hand out a
/// single block or a run of contiguous blocks, described by a [`MemoryBlock`],
/// and releases give them back. The region is never grown, moved or
/// compacted.
///
/// ```text
///   FixedPool
///   ├── Region      one mapping of `total_size` bytes (page rounded)
///   ├── BlockTable  one descriptor per block: free, or the group id of the
///   │               allocation holding it
///   └── counters    used bytes, free blocks
/// ```
///
/// Failures are data, not errors: an empty [`MemoryBlock`] means there was no
/// room, `false` from [`FixedPool::free`] means the handle was not a live
/// allocation of this pool. Only construction returns a [`PoolError`].
///
/// # Threading
///
/// The pool is meant to be driven by a single owner. It is neither `Send` nor
/// `Sync`; callers that need to share one must wrap every call in their own
/// mutual exclusion.
pub struct FixedPool {
    id: u64,
    region: Region,
    table: BlockTable,
    block_size: usize,
    partitions: Partitions,
    policy: DistributionPolicy,
    used_size: usize,
}

impl FixedPool {
    /// Creates a pool of `total_size` bytes split into `block_size` blocks,
    /// with a single partition and [`DistributionPolicy::None`].
    ///
    /// ```
    /// use blockpool::FixedPool;
    ///
    /// let pool = FixedPool::new(1024, 256).unwrap();
    /// assert_eq!(pool.block_count(), 4);
    /// ```
    pub fn new(total_size: usize, block_size: usize) -> Result<Self, PoolError> {
        Self::with_config(PoolConfig::new(total_size, block_size))
    }

    /// Creates a pool from a full [`PoolConfig`].
    ///
    /// A block size larger than the total size is clamped down to it, and any
    /// trailing bytes that do not fill a whole block are never handed out.
    pub fn with_config(config: PoolConfig) -> Result<Self, PoolError> {
        config.validate()?;

        let block_size = config.effective_block_size();
        let block_count = config.block_count();

        let region = Region::acquire(config.total_size)?;

        tracing::debug!(
            total_size = config.total_size,
            block_size,
            block_count,
            partitions = config.partition_count,
            policy = %config.policy,
            "pool created"
        );

        Ok(Self {
            id: NEXT_POOL_ID.fetch_add(1, Ordering::Relaxed),
            region,
            table: BlockTable::new(block_count),
            block_size,
            partitions: Partitions::new(config.partition_count, block_count),
            policy: config.policy,
            used_size: 0,
        })
    }

    /// Hands out the first free block.
    ///
    /// Returns the empty block if every block is in use.
    pub fn allocate(&mut self) -> MemoryBlock {
        match self.table.find_free_block() {
            Some(index) => self.claim(index..index + 1),
            None => {
                tracing::trace!("no free block left");
                MemoryBlock::empty()
            }
        }
    }

    /// Hands out a run of contiguous blocks large enough for `size` bytes.
    ///
    /// The granted size is `size` rounded up to a whole number of blocks.
    /// Where the search starts, and whether it may leave the request's
    /// partition, is decided by the pool's [`DistributionPolicy`].
    ///
    /// Returns the empty block if `size` is zero, if the request is larger
    /// than the pool, if the policy rejects it, or if no run is free.
    pub fn allocate_sized(&mut self, size: usize) -> MemoryBlock {
        let needed = blocks_for(size, self.block_size);

        if needed == 0 || needed > self.table.len() {
            tracing::trace!(size, needed, "sized request outside pool bounds");
            return MemoryBlock::empty();
        }

        let Some(window) = self.policy.search_window(self.partitions, needed) else {
            tracing::trace!(size, needed, policy = %self.policy, "request larger than one partition");
            return MemoryBlock::empty();
        };

        match self.table.find_run(needed, window.clone()) {
            Some(run) => self.claim(run),
            None => {
                tracing::trace!(size, needed, ?window, "no free run");
                MemoryBlock::empty()
            }
        }
    }

    fn claim(&mut self, run: Range<usize>) -> MemoryBlock {
        let Some(group) = self.table.claim(run.clone()) else {
            tracing::warn!("group ids exhausted, pool cannot allocate any more");
            return MemoryBlock::empty();
        };

        let size = run.len() * self.block_size;
        let ptr = self.region.at(run.start * self.block_size);

        self.used_size += size;

        tracing::trace!(first = run.start, blocks = run.len(), %group, "blocks allocated");

        MemoryBlock::new(ptr, size)
    }

    /// Gives a block previously handed out by this pool back to it.
    ///
    /// Every block of the allocation is released, its bytes are zeroed and
    /// `block` is turned into the empty block.
    ///
    /// Returns `false`, touching nothing, unless `block` is exactly a live
    /// allocation of this pool (see [`FixedPool::is_live`]). An empty handle,
    /// an address inside a run, a stale copy of a released handle, or a
    /// handle whose size differs from the run now starting at its address are
    /// all rejected.
    pub fn free(&mut self, block: &mut MemoryBlock) -> bool {
        let Some((head, _)) = self.live_head(block) else {
            tracing::trace!(ptr = ?block.ptr(), size = block.size(), "rejected release of a block that is not live");
            return false;
        };

        let Some(run) = self.table.release_group(head) else {
            return false;
        };

        let size = run.len() * self.block_size;
        self.region.zero(run.start * self.block_size, size);
        self.used_size -= size;

        tracing::trace!(first = run.start, blocks = run.len(), "blocks released");

        block.clear();
        true
    }

    /// Index of the block starting exactly at `ptr`.
    fn head_index(&self, ptr: NonNull<u8>) -> Option<usize> {
        let offset = self.region.offset_of(ptr)?;

        (offset % self.block_size == 0)
            .then(|| offset / self.block_size)
            .filter(|index| *index < self.table.len())
    }

    /// Whether `block` is exactly a live allocation of this pool: it starts an
    /// occupied group and covers all of it.
    pub fn is_live(&self, block: &MemoryBlock) -> bool {
        self.live_group(block).is_some()
    }

    /// Group id of the live allocation `block` describes exactly.
    pub(crate) fn live_group(&self, block: &MemoryBlock) -> Option<GroupId> {
        self.live_head(block).map(|(_, group)| group)
    }

    /// First block index and group of the live allocation `block` describes
    /// exactly.
    fn live_head(&self, block: &MemoryBlock) -> Option<(usize, GroupId)> {
        let head = block.ptr().and_then(|ptr| self.head_index(ptr))?;

        if !self.table.is_group_head(head) {
            return None;
        }

        let group = self.table.get(head).and_then(|info| info.group())?;
        let blocks = self
            .table
            .iter()
            .skip(head)
            .take_while(|info| info.group() == Some(group))
            .count();

        (blocks * self.block_size == block.size()).then_some((head, group))
    }

    /// Identifier of this pool, unique among every pool of the process.
    pub(crate) fn id(&self) -> u64 {
        self.id
    }

    /// Size of the region in bytes.
    #[inline]
    pub fn total_size(&self) -> usize {
        self.region.size()
    }

    /// Bytes currently handed out, a multiple of the block size.
    #[inline]
    pub fn used_size(&self) -> usize {
        self.used_size
    }

    /// Size of one block in bytes.
    #[inline]
    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Number of blocks the region is carved into.
    #[inline]
    pub fn block_count(&self) -> usize {
        self.table.len()
    }

    /// Number of blocks not currently handed out.
    #[inline]
    pub fn free_block_count(&self) -> usize {
        self.table.free_count()
    }

    /// Number of blocks currently handed out.
    #[inline]
    pub fn used_block_count(&self) -> usize {
        self.table.len() - self.table.free_count()
    }

    /// Number of partitions used by the distribution policy.
    #[inline]
    pub fn partition_count(&self) -> usize {
        self.partitions.count()
    }

    /// The distribution policy fixed at construction.
    #[inline]
    pub fn policy(&self) -> DistributionPolicy {
        self.policy
    }

    pub(crate) fn table(&self) -> &BlockTable {
        &self.table
    }

    pub(crate) fn block_address(&self, index: usize) -> NonNull<u8> {
        self.region.at(index * self.block_size)
    }
}

impl fmt::Debug for FixedPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FixedPool")
            .field("id", &self.id)
            .field("start", &self.region.start())
            .field("total_size", &self.total_size())
            .field("used_size", &self.used_size)
            .field("block_size", &self.block_size)
            .field("block_count", &self.block_count())
            .field("free_block_count", &self.free_block_count())
            .field("partitions", &self.partitions.count())
            .field("policy", &self.policy)
            .finish()
    }
}
