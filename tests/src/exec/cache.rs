use armjit_core::{LocationDescriptor, MicroBuilder};
use armjit_exec::{lower, BlockCache, TacBlock};

fn loc(pc: u32) -> LocationDescriptor {
    LocationDescriptor::new(pc, false, false)
}

fn empty_block(pc: u32) -> TacBlock {
    lower(&MicroBuilder::new(loc(pc)).block)
}

#[test]
fn lookup_after_insert() {
    let mut cache = BlockCache::new();
    assert!(cache.is_empty());
    cache.insert(loc(0x100), empty_block(0x100));
    assert!(cache.get(&loc(0x100)).is_some());
    // A different residual condition is a different block.
    assert!(cache
        .get(&loc(0x100).with_cond(armjit_core::Cond::EQ))
        .is_none());
}

#[test]
fn clear_empties_the_map() {
    let mut cache = BlockCache::new();
    cache.insert(loc(0x100), empty_block(0x100));
    cache.insert(loc(0x200), empty_block(0x200));
    cache.clear();
    assert!(cache.is_empty());
}

#[test]
fn invalidate_range_is_half_open() {
    let mut cache = BlockCache::new();
    cache.insert(loc(0x0FC), empty_block(0x0FC));
    cache.insert(loc(0x100), empty_block(0x100));
    cache.insert(loc(0x104), empty_block(0x104));

    cache.invalidate_range(0x100, 4);
    assert!(cache.get(&loc(0x0FC)).is_some());
    assert!(cache.get(&loc(0x100)).is_none());
    assert!(cache.get(&loc(0x104)).is_some());

    cache.invalidate_range(0, 0x200);
    assert!(cache.is_empty());
}

#[test]
fn invalidation_covers_every_residual_variant() {
    let mut cache = BlockCache::new();
    cache.insert(loc(0x100), empty_block(0x100));
    cache.insert(
        loc(0x100).with_cond(armjit_core::Cond::EQ),
        empty_block(0x100),
    );
    cache.invalidate_range(0x100, 4);
    assert!(cache.is_empty());
}
