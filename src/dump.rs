use std::{fmt, ptr::NonNull};

use crate::{block::GroupId, pool::FixedPool};

/// State of one block at the time of a [`PoolDump`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlockReport {
    /// Position of the block in the table.
    pub index: usize,
    /// Group of the allocation holding the block, `None` if free.
    pub group: Option<GroupId>,
    /// Start address of the block, only reported for used blocks.
    pub address: Option<NonNull<u8>>,
}

impl BlockReport {
    /// Whether the block belonged to an allocation when the dump was taken.
    pub fn is_occupied(&self) -> bool {
        self.group.is_some()
    }
}

/// Snapshot of a pool's counters and of every block, for diagnostics.
///
/// Rendered with [`fmt::Display`]:
///
/// ```text
/// ================
/// Total Memory size : 1024, Used Memory size : 512
/// Total Blocks : 4, Used Blocks : 2, Free Blocks : 2
/// ================
/// Block[0] = USED; group : 1; ptr : 0x7f5a2c000000
/// Block[1] = USED; group : 2; ptr : 0x7f5a2c000100
/// Block[2] = FREE
/// Block[3] = FREE
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PoolDump {
    /// Size of the region in bytes.
    pub total_size: usize,
    /// Bytes handed out, a multiple of `block_size`.
    pub used_size: usize,
    /// Size of one block in bytes.
    pub block_size: usize,
    /// Blocks not held by any allocation.
    pub free_block_count: usize,
    /// Blocks held by an allocation.
    pub used_block_count: usize,
    /// One report per block, in table order.
    pub blocks: Vec<BlockReport>,
}

impl fmt::Display for PoolDump {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "================")?;
        writeln!(
            f,
            "Total Memory size : {}, Used Memory size : {}",
            self.total_size, self.used_size
        )?;
        writeln!(
            f,
            "Total Blocks : {}, Used Blocks : {}, Free Blocks : {}",
            self.blocks.len(),
            self.used_block_count,
            self.free_block_count
        )?;
        writeln!(f, "================")?;

        for block in &self.blocks {
            match (block.group, block.address) {
                (Some(group), Some(address)) => writeln!(
                    f,
                    "Block[{}] = USED; group : {group}; ptr : {address:p}",
                    block.index
                )?,
                _ => writeln!(f, "Block[{}] = FREE", block.index)?,
            }
        }

        Ok(())
    }
}

impl FixedPool {
    /// Takes a snapshot of the pool for diagnostics.
    pub fn dump(&self) -> PoolDump {
        let blocks = self
            .table()
            .iter()
            .enumerate()
            .map(|(index, info)| BlockReport {
                index,
                group: info.group(),
                address: info.is_occupied().then(|| self.block_address(index)),
            })
            .collect();

        PoolDump {
            total_size: self.total_size(),
            used_size: self.used_size(),
            block_size: self.block_size(),
            free_block_count: self.free_block_count(),
            used_block_count: self.used_block_count(),
            blocks,
        }
    }

    /// Emits [`FixedPool::dump`] through `tracing` at debug level.
    pub fn log_memory(&self) {
        tracing::debug!("\n{}", self.dump());
    }
}
