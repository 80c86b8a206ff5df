//! Pool construction errors.
//!
//! Allocation and release never fail with an error: running out of blocks is
//! reported with an empty [`MemoryBlock`](crate::MemoryBlock) and a rejected
//! release with `false`. Only building the pool itself can go wrong.

use thiserror::Error;

/// Errors that can occur while constructing a [`FixedPool`](crate::FixedPool).
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum PoolError {
    /// The requested total size was zero.
    #[error("total pool size must be greater than zero")]
    ZeroTotalSize,

    /// The requested block size was zero.
    #[error("block size must be greater than zero")]
    ZeroBlockSize,

    /// The partition count was zero.
    #[error("partition count must be at least one")]
    ZeroPartitions,

    /// More partitions were requested than there are blocks to put in them.
    #[error("cannot split {blocks} blocks into {partitions} partitions")]
    TooManyPartitions {
        /// Requested partition count.
        partitions: usize,
        /// Blocks available after block size clamping.
        blocks: usize,
    },

    /// The kernel refused to map the backing region.
    #[error("could not acquire a {size} byte region from the kernel")]
    RegionUnavailable {
        /// Number of bytes requested.
        size: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_numbers() {
        let err = PoolError::TooManyPartitions {
            partitions: 8,
            blocks: 4,
        };
        assert_eq!(err.to_string(), "cannot split 4 blocks into 8 partitions");

        let err = PoolError::RegionUnavailable { size: 1024 };
        assert_eq!(
            err.to_string(),
            "could not acquire a 1024 byte region from the kernel"
        );
    }
}
