use std::{fmt, ops::Range};

/// Strategy controlling where in the block table a multi-block search starts.
///
/// The table is conceptually split into `partition_count` equal partitions.
/// A request of `n` blocks is given a size class, the partition whose index is
/// proportional to `n` relative to one partition's capacity, so requests of
/// similar sizes end up next to each other:
///
/// ```text
///  partition_count = 4, 64 blocks, capacity 16 blocks each
///
///  +----------------+----------------+----------------+----------------+
///  |  1 ..= 4 blk   |  5 ..= 8 blk   |  9 ..= 12 blk  | 13 ..= 16 blk  |
///  +----------------+----------------+----------------+----------------+
///  0               16               32               48               64
/// ```
///
/// Single block allocations ignore the policy.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum DistributionPolicy {
    /// Every search starts at block 0 and may use the whole table.
    #[default]
    None,
    /// The search is confined to the request's partition. Requests larger
    /// than one partition always fail.
    CloseRanges,
    /// The search starts at the request's partition but may spill over into
    /// the partitions after it. Requests larger than one partition have no
    /// size class and are searched for across the whole table.
    OpenRanges,
}

impl fmt::Display for DistributionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::None => "none",
            Self::CloseRanges => "close-ranges",
            Self::OpenRanges => "open-ranges",
        };
        f.write_str(name)
    }
}

/// The partition layout of one pool.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Partitions {
    /// Number of partitions, at least 1.
    count: usize,
    /// Blocks in the table.
    blocks: usize,
}

impl Partitions {
    /// `count` must be in `1..=blocks`.
    pub(crate) fn new(count: usize, blocks: usize) -> Self {
        debug_assert!(count >= 1 && count <= blocks);

        Self { count, blocks }
    }

    #[inline]
    pub(crate) fn count(&self) -> usize {
        self.count
    }

    /// Blocks in one partition.
    #[inline]
    pub(crate) fn capacity(&self) -> usize {
        self.blocks / self.count
    }

    /// Partition index of a request of `needed` blocks, or `None` if the
    /// request does not fit in one partition.
    pub(crate) fn size_class(&self, needed: usize) -> Option<usize> {
        let capacity = self.capacity();

        if needed == 0 || needed > capacity {
            return None;
        }

        Some(((needed - 1) * self.count / capacity).min(self.count - 1))
    }

    /// Block range covered by `partition`. The last partition also owns the
    /// trailing blocks left over by the integer division.
    pub(crate) fn range(&self, partition: usize) -> Range<usize> {
        let start = partition * self.capacity();
        let end = if partition + 1 == self.count {
            self.blocks
        } else {
            start + self.capacity()
        };

        start..end
    }
}

impl DistributionPolicy {
    /// Block range a run of `needed` blocks may be placed in, or `None` if the
    /// policy rejects the request outright.
    pub(crate) fn search_window(self, partitions: Partitions, needed: usize) -> Option<Range<usize>> {
        let whole = 0..partitions.blocks;

        match self {
            Self::None => Some(whole),
            Self::CloseRanges => partitions
                .size_class(needed)
                .map(|class| partitions.range(class)),
            Self::OpenRanges => match partitions.size_class(needed) {
                Some(class) => Some(partitions.range(class).start..whole.end),
                None => Some(whole),
            },
        }
    }
}
