//! ARM frontend — ARMv6 user-mode instruction translation.

pub mod decode;
mod translate;

pub use decode::{decode_arm, decode_arm_name, decode_call_count, ArmInst, DpOp};
pub use translate::translate;
