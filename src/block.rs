use std::{fmt, num::NonZeroU64};

/// Identifier binding the blocks of one allocation together.
///
/// Every successful allocation, single block or run, is stamped with a fresh
/// id so that releasing its first block can find the rest of the run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupId(NonZeroU64);

impl GroupId {
    pub(crate) const FIRST: Self = Self(NonZeroU64::MIN);

    #[cfg(test)]
    pub(crate) const LAST: Self = Self(NonZeroU64::MAX);

    /// The id handed out after this one, `None` once the id space is used up.
    pub(crate) fn next(self) -> Option<Self> {
        self.0.checked_add(1).map(Self)
    }

    /// Raw numeric value of the id.
    pub fn get(self) -> u64 {
        self.0.get()
    }
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Bookkeeping for one fixed-size slice of the region.
///
/// Unlike the payload, descriptors live outside the region, in the
/// [`BlockTable`](crate::table::BlockTable). Block `i` always covers bytes
/// `i * block_size .. (i + 1) * block_size` of the region.
///
/// ```text
/// +---------------------+
/// |   occupied (1b)     |
/// +---------------------+
/// |   group: GroupId?   |  -> None whenever occupied is false
/// +---------------------+
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct BlockInfo {
    /// Group of the allocation currently holding the block.
    group: Option<GroupId>,
}

impl BlockInfo {
    #[inline]
    pub(crate) fn is_occupied(&self) -> bool {
        self.group.is_some()
    }

    #[inline]
    pub(crate) fn group(&self) -> Option<GroupId> {
        self.group
    }

    #[inline]
    pub(crate) fn occupy(&mut self, group: GroupId) {
        debug_assert!(!self.is_occupied());
        self.group = Some(group);
    }

    #[inline]
    pub(crate) fn clear(&mut self) {
        self.group = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cleared_block_has_no_group() {
        let mut info = BlockInfo::default();
        assert!(!info.is_occupied());

        info.occupy(GroupId::FIRST);
        assert!(info.is_occupied());
        assert_eq!(info.group(), Some(GroupId::FIRST));

        info.clear();
        assert!(!info.is_occupied());
        assert_eq!(info.group(), None);
    }

    #[test]
    fn group_ids_increase() {
        let first = GroupId::FIRST;
        let second = first.next().unwrap();

        assert_eq!(first.get(), 1);
        assert_eq!(second.get(), 2);
        assert!(second > first);
    }

    #[test]
    fn last_group_id_has_no_successor() {
        assert_eq!(GroupId::LAST.get(), u64::MAX);
        assert_eq!(GroupId::LAST.next(), None);
    }
}
