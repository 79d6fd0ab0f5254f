//! The block cache: location descriptor → lowered block.

use std::collections::HashMap;

use armjit_core::LocationDescriptor;

use crate::tac::TacBlock;

/// Owned by the executor; only the emulation thread mutates it.
/// Entries are immutable once inserted.
pub struct BlockCache {
    map: HashMap<LocationDescriptor, TacBlock>,
}

impl BlockCache {
    pub fn new() -> Self {
        Self {
            map: HashMap::new(),
        }
    }

    pub fn get(&self, location: &LocationDescriptor) -> Option<&TacBlock> {
        self.map.get(location)
    }

    pub fn insert(&mut self, location: LocationDescriptor, block: TacBlock) {
        self.map.insert(location, block);
    }

    /// Drop every cached block.
    pub fn clear(&mut self) {
        self.map.clear();
    }

    /// Drop every block whose source PC lies in
    /// `[start, start + length)`.
    pub fn invalidate_range(&mut self, start: u32, length: usize) {
        self.map
            .retain(|loc, _| loc.arm_pc.wrapping_sub(start) as usize >= length);
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

impl Default for BlockCache {
    fn default() -> Self {
        Self::new()
    }
}
