//! Property tests for the pool's bookkeeping.

use blockpool::{DistributionPolicy, FixedPool, MemoryBlock, PoolConfig};
use proptest::prelude::*;

#[derive(Clone, Debug)]
enum Op {
    Allocate,
    AllocateSized(usize),
    Free(usize),
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        Just(Op::Allocate),
        (0usize..600).prop_map(Op::AllocateSized),
        any::<usize>().prop_map(Op::Free),
    ]
}

fn arb_policy() -> impl Strategy<Value = DistributionPolicy> {
    prop_oneof![
        Just(DistributionPolicy::None),
        Just(DistributionPolicy::CloseRanges),
        Just(DistributionPolicy::OpenRanges),
    ]
}

fn check_counters(pool: &FixedPool) -> Result<(), TestCaseError> {
    prop_assert_eq!(
        pool.free_block_count() + pool.used_block_count(),
        pool.block_count()
    );
    prop_assert_eq!(pool.used_size(), pool.used_block_count() * pool.block_size());
    prop_assert!(pool.used_size() <= pool.total_size());
    Ok(())
}

fn check_disjoint(live: &[MemoryBlock]) -> Result<(), TestCaseError> {
    let mut spans: Vec<(usize, usize)> = live
        .iter()
        .map(|block| (block.as_ptr() as usize, block.size()))
        .collect();
    spans.sort_unstable();

    for pair in spans.windows(2) {
        prop_assert!(pair[0].0 + pair[0].1 <= pair[1].0);
    }
    Ok(())
}

proptest! {
    #[test]
    fn bookkeeping_holds_under_random_traffic(
        block_size in 8usize..64,
        blocks in 4usize..64,
        partitions in 1usize..4,
        policy in arb_policy(),
        ops in prop::collection::vec(arb_op(), 1..120),
    ) {
        let config = PoolConfig::new(block_size * blocks, block_size)
            .with_partitions(partitions)
            .with_policy(policy);
        let mut pool = FixedPool::with_config(config).unwrap();
        let mut live: Vec<MemoryBlock> = Vec::new();

        for op in ops {
            match op {
                Op::Allocate => {
                    let block = pool.allocate();
                    if !block.is_empty() {
                        prop_assert_eq!(block.size(), block_size);
                        live.push(block);
                    }
                }
                Op::AllocateSized(size) => {
                    let block = pool.allocate_sized(size);
                    if size == 0 || size > pool.total_size() {
                        prop_assert!(block.is_empty());
                    } else if !block.is_empty() {
                        prop_assert_eq!(block.size(), size.div_ceil(block_size) * block_size);
                        live.push(block);
                    }
                }
                Op::Free(pick) => {
                    if !live.is_empty() {
                        let mut block = live.swap_remove(pick % live.len());
                        prop_assert!(pool.free(&mut block));
                        prop_assert!(block.is_empty());
                        prop_assert!(!pool.free(&mut block));
                    }
                }
            }

            check_counters(&pool)?;
            check_disjoint(&live)?;
        }

        let held: usize = live.iter().map(MemoryBlock::size).sum();
        prop_assert_eq!(pool.used_size(), held);

        for block in &mut live {
            prop_assert!(pool.free(block));
        }
        prop_assert_eq!(pool.free_block_count(), pool.block_count());
    }

    #[test]
    fn free_space_is_reusable(block_size in 8usize..64, blocks in 1usize..32) {
        let mut pool = FixedPool::new(block_size * blocks, block_size).unwrap();

        let mut all = pool.allocate_sized(block_size * blocks);
        prop_assert_eq!(all.size(), block_size * blocks);
        prop_assert!(pool.allocate().is_empty());

        prop_assert!(pool.free(&mut all));
        let again = pool.allocate_sized(block_size * blocks);
        prop_assert!(!again.is_empty());
    }
}
