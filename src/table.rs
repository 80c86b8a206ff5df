use std::ops::Range;

use crate::block::{BlockInfo, GroupId};

/// Arena of [`BlockInfo`] descriptors, one per block of the region.
///
/// The table only knows about indices. Turning an index into an address (and
/// back) is the job of the pool, which owns the [`Region`](crate::region::Region).
///
/// Runs handed out by [`BlockTable::claim`] are always contiguous, so the
/// blocks of a group can be found by walking forward from its first block:
///
/// ```text
///   index:   0     1     2     3     4     5     6     7
///          +-----+-----+-----+-----+-----+-----+-----+-----+
///   group: |  1  |  2  |  2  |  2  |  -  |  4  |  -  |  -  |
///          +-----+-----+-----+-----+-----+-----+-----+-----+
///            ^     ^---------------^           ^
///            |          run of 3               |
///          single                            single
/// ```
#[derive(Debug)]
pub(crate) struct BlockTable {
    blocks: Vec<BlockInfo>,
    /// Number of descriptors with no group. Always equal to a full scan.
    free: usize,
    /// Id stamped on the next claimed run, `None` once every id was used.
    next_group: Option<GroupId>,
}

impl BlockTable {
    /// Creates a table of `count` free blocks.
    pub(crate) fn new(count: usize) -> Self {
        Self {
            blocks: vec![BlockInfo::default(); count],
            free: count,
            next_group: Some(GroupId::FIRST),
        }
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.blocks.len()
    }

    #[inline]
    pub(crate) fn free_count(&self) -> usize {
        self.free
    }

    #[inline]
    pub(crate) fn get(&self, index: usize) -> Option<&BlockInfo> {
        self.blocks.get(index)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &BlockInfo> {
        self.blocks.iter()
    }

    /// Index of the first free block, scanning from 0.
    pub(crate) fn find_free_block(&self) -> Option<usize> {
        if self.free == 0 {
            return None;
        }

        self.blocks.iter().position(|info| !info.is_occupied())
    }

    /// Returns the first run of `needed` consecutive free blocks that fits
    /// entirely inside `window`.
    ///
    /// This is a first-fit search. It never looks at indices before
    /// `window.start`, and whenever it hits an occupied block it restarts
    /// right after it, so every block is inspected at most once.
    pub(crate) fn find_run(&self, needed: usize, window: Range<usize>) -> Option<Range<usize>> {
        let end = window.end.min(self.blocks.len());

        if needed == 0 || needed > self.free || window.start >= end {
            return None;
        }

        let mut run_start = window.start;
        let mut index = window.start;

        while index < end {
            if end - run_start < needed {
                // Not enough room left in the window for a run starting here.
                return None;
            }

            if self.blocks[index].is_occupied() {
                run_start = index + 1;
            } else if index + 1 - run_start == needed {
                return Some(run_start..index + 1);
            }

            index += 1;
        }

        None
    }

    /// Marks every block of `run` as occupied under a fresh group id.
    ///
    /// Every block in `run` must be free. Returns `None`, leaving the table
    /// untouched, once all `u64` group ids have been handed out: reusing one
    /// could merge two adjacent runs.
    pub(crate) fn claim(&mut self, run: Range<usize>) -> Option<GroupId> {
        let group = self.next_group?;
        self.next_group = group.next();

        for info in &mut self.blocks[run.clone()] {
            info.occupy(group);
        }
        self.free -= run.len();

        Some(group)
    }

    /// Whether `index` is the first block of an occupied group.
    ///
    /// Only these indices correspond to addresses the pool ever handed out.
    pub(crate) fn is_group_head(&self, index: usize) -> bool {
        let Some(group) = self.get(index).and_then(BlockInfo::group) else {
            return false;
        };

        index == 0 || self.blocks[index - 1].group() != Some(group)
    }

    /// Frees the group whose first block is `head` and returns the range of
    /// blocks it covered, or `None` if `head` is not the first block of an
    /// occupied group.
    pub(crate) fn release_group(&mut self, head: usize) -> Option<Range<usize>> {
        if !self.is_group_head(head) {
            return None;
        }

        let group = self.blocks[head].group();
        let len = self.blocks[head..]
            .iter()
            .take_while(|info| info.group() == group)
            .count();

        for info in &mut self.blocks[head..head + len] {
            info.clear();
        }
        self.free += len;

        Some(head..head + len)
    }
}
