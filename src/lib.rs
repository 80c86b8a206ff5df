//! # blockpool - A fixed-region memory pool
//!
//! This crate carves one large, contiguously mapped region into equal-sized
//! blocks and hands out single blocks, or contiguous runs of blocks, without
//! going through the global allocator on every request.
//!
//! ```text
//!   Region (mapped once, never moved):
//!
//!   +---------+---------+---------+---------+---------+---------+---------+
//!   | Block 0 | Block 1 | Block 2 | Block 3 | Block 4 | Block 5 |   ...   |
//!   +---------+---------+---------+---------+---------+---------+---------+
//!   |<-used-->|<-------- one run ---------->|<-free-->|<-used-->|
//!    group 1          group 2                          group 3
//! ```
//!
//! Every allocation is stamped with a group id in the block table, so
//! releasing the first block of a run releases all of it. Where a
//! multi-block search starts is controlled by a [`DistributionPolicy`], which
//! keeps similarly sized requests together to reduce fragmentation between
//! size classes.
//!
//! ## Crate Structure
//!
//! ```text
//!   blockpool
//!   ├── kernel        - mmap / VirtualAlloc behind a platform trait (internal)
//!   ├── region        - the owned, page-rounded region (internal)
//!   ├── block, table  - block descriptors and first-fit run search (internal)
//!   ├── policy        - DistributionPolicy and partition math
//!   ├── memory_block  - MemoryBlock handle
//!   ├── config, error - PoolConfig, PoolError
//!   ├── pool          - FixedPool engine
//!   ├── typed         - construct / destruct of typed values
//!   └── dump          - diagnostic dump
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use blockpool::FixedPool;
//!
//! let mut pool = FixedPool::new(1024, 256).unwrap();
//!
//! let mut block = pool.allocate();
//! assert_eq!(block.size(), 256);
//!
//! let mut run = pool.allocate_sized(300);
//! assert_eq!(run.size(), 512);
//! assert_eq!(pool.free_block_count(), 1);
//!
//! assert!(pool.free(&mut block));
//! assert!(pool.free(&mut run));
//! assert!(block.is_empty());
//! assert_eq!(pool.used_size(), 0);
//! ```
//!
//! ## Limitations
//!
//! - **Single owner only**: no synchronization; the pool is neither `Send`
//!   nor `Sync`.
//! - **No coalescing or compaction**: blocks never merge beyond the block
//!   granularity and live allocations never move.
//! - **Fixed size**: the region is never grown after construction.

mod block;
mod config;
mod dump;
mod error;
mod kernel;
mod memory_block;
mod policy;
mod pool;
mod region;
mod table;
mod typed;
mod utils;

pub use block::GroupId;
pub use config::PoolConfig;
pub use dump::{BlockReport, PoolDump};
pub use error::PoolError;
pub use memory_block::MemoryBlock;
pub use policy::DistributionPolicy;
pub use pool::FixedPool;
pub use typed::{Constructed, ConstructedArray};
