//! Shared test fixtures.

use std::collections::HashMap;
use std::rc::Rc;

use armjit_exec::{Cpu, SliceTimer};
use armjit_frontend::GuestMemory;

/// Sparse word-granular guest memory. Unmapped reads return an
/// undefined-instruction word so a runaway translation stops at the
/// first hole instead of chewing through zeroes.
pub struct TestMemory {
    words: HashMap<u32, u32>,
}

pub const UNMAPPED: u32 = 0xF7FF_FFFF;

impl TestMemory {
    pub fn new() -> Self {
        Self {
            words: HashMap::new(),
        }
    }

    pub fn load_words(&mut self, base: u32, words: &[u32]) {
        for (i, &word) in words.iter().enumerate() {
            self.words.insert(base + 4 * i as u32, word);
        }
    }

    pub fn with_program(base: u32, words: &[u32]) -> Self {
        let mut mem = Self::new();
        mem.load_words(base, words);
        mem
    }
}

impl GuestMemory for TestMemory {
    fn read_u32(&self, vaddr: u32) -> u32 {
        *self.words.get(&(vaddr & !3)).unwrap_or(&UNMAPPED)
    }
}

/// A core wired to a program at `base` and a timer slice of `slice`
/// instructions.
pub fn make_cpu(base: u32, program: &[u32], slice: i64) -> Cpu {
    let mem = Rc::new(TestMemory::with_program(base, program));
    let timer = Rc::new(SliceTimer::new(slice));
    Cpu::new(0, timer, mem)
}
