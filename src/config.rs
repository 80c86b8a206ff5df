//! Pool configuration parameters.

use crate::{error::PoolError, policy::DistributionPolicy};

/// Configuration for a [`FixedPool`](crate::FixedPool).
///
/// Controls region size, block granularity and multi-block placement.
/// Validated at construction; all values are immutable after creation.
///
/// ```
/// use blockpool::{DistributionPolicy, FixedPool, PoolConfig};
///
/// let config = PoolConfig::new(1024, 16)
///     .with_partitions(4)
///     .with_policy(DistributionPolicy::CloseRanges);
///
/// let pool = FixedPool::with_config(config).unwrap();
/// assert_eq!(pool.block_count(), 64);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PoolConfig {
    /// Size of the region in bytes. Must be greater than zero.
    pub total_size: usize,

    /// Size of one block in bytes. Must be greater than zero.
    ///
    /// Clamped to `total_size` when larger, which leaves a single block.
    pub block_size: usize,

    /// Number of equal partitions the block table is split into for the
    /// distribution policy.
    ///
    /// Default: 1. Must be at least 1 and at most the block count.
    pub partition_count: usize,

    /// Where multi-block searches start.
    ///
    /// Default: [`DistributionPolicy::None`].
    pub policy: DistributionPolicy,
}

impl PoolConfig {
    /// Default partition count.
    pub const DEFAULT_PARTITION_COUNT: usize = 1;

    /// Create a new pool config for the given sizes.
    ///
    /// Uses default values for all other parameters.
    pub fn new(total_size: usize, block_size: usize) -> Self {
        Self {
            total_size,
            block_size,
            partition_count: Self::DEFAULT_PARTITION_COUNT,
            policy: DistributionPolicy::default(),
        }
    }

    /// Sets the partition count.
    #[must_use]
    pub fn with_partitions(mut self, partition_count: usize) -> Self {
        self.partition_count = partition_count;
        self
    }

    /// Sets the distribution policy.
    #[must_use]
    pub fn with_policy(mut self, policy: DistributionPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Block size after clamping to the total size.
    pub fn effective_block_size(&self) -> usize {
        self.block_size.min(self.total_size)
    }

    /// Number of whole blocks the region is carved into.
    pub fn block_count(&self) -> usize {
        match self.effective_block_size() {
            0 => 0,
            block_size => self.total_size / block_size,
        }
    }

    /// Checks every parameter, including the partition count against the
    /// clamped block count.
    pub fn validate(&self) -> Result<(), PoolError> {
        if self.total_size == 0 {
            return Err(PoolError::ZeroTotalSize);
        }
        if self.block_size == 0 {
            return Err(PoolError::ZeroBlockSize);
        }
        if self.partition_count == 0 {
            return Err(PoolError::ZeroPartitions);
        }

        let blocks = self.block_count();
        if self.partition_count > blocks {
            return Err(PoolError::TooManyPartitions {
                partitions: self.partition_count,
                blocks,
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = PoolConfig::new(1024, 256);

        assert_eq!(config.partition_count, 1);
        assert_eq!(config.policy, DistributionPolicy::None);
        assert_eq!(config.block_count(), 4);
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn oversized_block_is_clamped() {
        let config = PoolConfig::new(32, 50);

        assert_eq!(config.effective_block_size(), 32);
        assert_eq!(config.block_count(), 1);
    }

    #[test]
    fn trailing_bytes_are_not_a_block() {
        let config = PoolConfig::new(64, 50);

        assert_eq!(config.effective_block_size(), 50);
        assert_eq!(config.block_count(), 1);
    }

    #[test]
    fn zero_values_are_rejected() {
        assert_eq!(PoolConfig::new(0, 16).validate(), Err(PoolError::ZeroTotalSize));
        assert_eq!(PoolConfig::new(16, 0).validate(), Err(PoolError::ZeroBlockSize));
        assert_eq!(
            PoolConfig::new(16, 16).with_partitions(0).validate(),
            Err(PoolError::ZeroPartitions)
        );
    }

    #[test]
    fn partitions_need_a_block_each() {
        let config = PoolConfig::new(64, 16).with_partitions(5);

        assert_eq!(
            config.validate(),
            Err(PoolError::TooManyPartitions {
                partitions: 5,
                blocks: 4,
            })
        );
        assert_eq!(config.with_partitions(4).validate(), Ok(()));
    }
}
