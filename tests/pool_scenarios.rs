//! End-to-end scenarios through the public API.

use blockpool::{DistributionPolicy, FixedPool, MemoryBlock, PoolConfig, PoolError};

fn partitioned(policy: DistributionPolicy) -> FixedPool {
    let config = PoolConfig::new(1024, 16)
        .with_partitions(4)
        .with_policy(policy);
    FixedPool::with_config(config).unwrap()
}

#[test]
fn three_single_blocks_then_free_the_middle_one() {
    let mut pool = FixedPool::new(1024, 256).unwrap();

    let _a = pool.allocate();
    let mut b = pool.allocate();
    let _c = pool.allocate();

    assert_eq!(pool.free_block_count(), 1);
    assert_eq!(pool.used_size(), 768);

    assert!(pool.free(&mut b));
    assert_eq!(pool.free_block_count(), 2);
    assert_eq!(pool.used_size(), 512);
}

#[test]
fn close_ranges_rejects_a_run_wider_than_a_partition() {
    let mut pool = partitioned(DistributionPolicy::CloseRanges);

    let block = pool.allocate_sized(64 * 16);

    assert!(block.is_empty());
    assert_eq!(pool.free_block_count(), 64);
    assert_eq!(pool.used_size(), 0);
}

#[test]
fn open_ranges_spills_past_partition_boundaries() {
    let mut pool = partitioned(DistributionPolicy::OpenRanges);

    let mut block = pool.allocate_sized(64 * 16);

    assert_eq!(block.size(), 1024);
    assert_eq!(pool.free_block_count(), 0);

    assert!(pool.free(&mut block));
    assert_eq!(pool.free_block_count(), 64);
}

#[test]
fn construct_larger_than_the_pool_leaks_nothing() {
    let mut pool = FixedPool::new(8, 4).unwrap();

    assert!(pool.construct([0_u64; 4]).is_none());
    assert!(pool.construct_array::<u64>(2).is_none());

    assert_eq!(pool.used_size(), 0);
    assert_eq!(pool.free_block_count(), 2);
}

#[test]
fn invalid_configurations_are_reported() {
    assert_eq!(FixedPool::new(0, 16).unwrap_err(), PoolError::ZeroTotalSize);
    assert_eq!(FixedPool::new(16, 0).unwrap_err(), PoolError::ZeroBlockSize);

    let err = FixedPool::with_config(PoolConfig::new(64, 16).with_partitions(8)).unwrap_err();
    assert_eq!(
        err,
        PoolError::TooManyPartitions {
            partitions: 8,
            blocks: 4,
        }
    );
    assert_eq!(err.to_string(), "cannot split 4 blocks into 8 partitions");
}

#[test]
fn handles_from_another_pool_are_rejected() {
    let mut first = FixedPool::new(256, 64).unwrap();
    let mut second = FixedPool::new(256, 64).unwrap();

    let mut block = first.allocate();
    assert!(!second.free(&mut block));
    assert!(!block.is_empty());
    assert!(first.free(&mut block));

    let mut empty = MemoryBlock::empty();
    assert!(!first.free(&mut empty));
}

#[test]
fn data_survives_until_free() {
    let mut pool = FixedPool::new(512, 64).unwrap();

    let mut block = pool.allocate_sized(100);
    // SAFETY: The block is live and only accessed through this slice.
    unsafe { block.as_mut_slice() }.fill(0xAB);

    let mut other = pool.allocate();
    // SAFETY: The block is live and not aliased.
    assert!(unsafe { other.as_mut_slice() }.iter().all(|&byte| byte == 0));
    // SAFETY: As above.
    assert!(unsafe { block.as_slice() }.iter().all(|&byte| byte == 0xAB));

    let address = block.as_ptr();
    assert!(pool.free(&mut block));

    let mut again = pool.allocate_sized(100);
    assert_eq!(again.as_ptr(), address);
    // SAFETY: The block is live and not aliased.
    assert!(unsafe { again.as_slice() }.iter().all(|&byte| byte == 0));

    assert!(pool.free(&mut again));
    assert!(pool.free(&mut other));
}

#[test]
fn typed_values_round_trip() {
    #[derive(Debug, PartialEq)]
    struct Point {
        x: f32,
        y: f32,
    }

    let mut pool = FixedPool::new(1024, 32).unwrap();

    let mut point = pool.construct(Point { x: 12.0, y: 25.0 }).unwrap();
    let mut squares = pool.construct_array_with(20, |i| i * i).unwrap();

    assert_eq!(pool.get(&point), Some(&Point { x: 12.0, y: 25.0 }));
    assert_eq!(pool.get_slice(&squares).unwrap()[7], 49);

    assert!(pool.destruct_array(&mut squares));
    assert!(pool.destruct(&mut point));
    assert!(pool.get(&point).is_none());
    assert_eq!(pool.used_size(), 0);
}
