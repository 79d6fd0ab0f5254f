//! SSA micro-instruction IR for an ARM11 dynamic binary translator.
//!
//! Each IR node is a microinstruction of an idealised ARM CPU, chosen
//! for ease of analysis and lowering rather than to model any real
//! microarchitecture. A basic block is a [`MicroBlock`]: an ordered
//! list of values followed by exactly one [`MicroTerminal`].

pub mod block;
pub mod builder;
pub mod flags;
pub mod location;
pub mod op;

pub use block::{MicroBlock, MicroTerminal, Value, ValueData, ValueId};
pub use builder::MicroBuilder;
pub use flags::ArmFlags;
pub use location::{ArmReg, Cond, LocationDescriptor, ShiftType, SignExtendRotation};
pub use op::{op_info, MicroOp, MicroOpInfo, MicroType};
