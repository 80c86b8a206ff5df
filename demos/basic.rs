//! Allocates single blocks and block runs, then prints the block table.
//!
//! Run with `RUST_LOG=blockpool=trace cargo run --example basic` to see
//! the pool's own tracing output.

use blockpool::{DistributionPolicy, FixedPool, PoolConfig};
use tracing_subscriber::EnvFilter;

fn log_block(label: &str, block: &blockpool::MemoryBlock) {
    println!("{label}: requested block at {:?}, {} bytes", block.ptr(), block.size());
}

fn main() -> Result<(), blockpool::PoolError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut pool = FixedPool::new(1024, 256)?;

    let mut first = pool.allocate();
    log_block("first", &first);

    let mut run = pool.allocate_sized(300);
    log_block("run", &run);

    print!("{}", pool.dump());

    pool.free(&mut first);
    pool.free(&mut run);
    println!("after free: {} bytes in use", pool.used_size());

    let config = PoolConfig::new(64 * 16, 64)
        .with_partitions(4)
        .with_policy(DistributionPolicy::CloseRanges);
    let mut grouped = FixedPool::with_config(config)?;

    let small = grouped.allocate_sized(64);
    let large = grouped.allocate_sized(256);
    log_block("small", &small);
    log_block("large", &large);

    grouped.log_memory();
    print!("{}", grouped.dump());

    Ok(())
}
