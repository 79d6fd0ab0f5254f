//! Guest memory access, as seen by the translator and the executor.

/// Synchronous guest-memory fetch.
///
/// The translator fetches instruction words through this (always from
/// `arm_pc & 0xFFFF_FFFC`); the executor routes the `Read32` micro-op
/// through it at run time. Faults are the memory implementation's
/// problem; the core assumes synchronous success.
pub trait GuestMemory {
    fn read_u32(&self, vaddr: u32) -> u32;
}
