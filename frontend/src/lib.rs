//! Guest frontend — instruction decoding and micro-IR generation.
//!
//! Provides the ARMv6 decoder, the basic-block translator, and the
//! guest-memory seam both the translator and the executor fetch
//! through.

pub mod arm;
pub mod mem;

pub use arm::{decode_arm, translate, ArmInst};
pub use mem::GuestMemory;
