//! Convenience layer for constructing micro-blocks.

use crate::block::{MicroBlock, MicroTerminal, ValueData, ValueId};
use crate::flags::ArmFlags;
use crate::location::{ArmReg, LocationDescriptor};
use crate::op::{op_info, MicroOp};

/// Builds one [`MicroBlock`]. Tracks the union of all flags written so
/// far so the translator's condition check is O(1).
pub struct MicroBuilder {
    pub block: MicroBlock,
    pub flags_written: ArmFlags,
}

impl MicroBuilder {
    pub fn new(location: LocationDescriptor) -> Self {
        Self {
            block: MicroBlock::new(location),
            flags_written: ArmFlags::NONE,
        }
    }

    pub fn const_u32(&mut self, value: u32) -> ValueId {
        self.block.push(ValueData::ConstU32(value))
    }

    pub fn get_gpr(&mut self, reg: ArmReg) -> ValueId {
        self.block.push(ValueData::GetGpr(reg))
    }

    pub fn set_gpr(&mut self, reg: ArmReg, a: ValueId) -> ValueId {
        self.block.push(ValueData::SetGpr(reg, a))
    }

    pub fn inst0(&mut self, op: MicroOp) -> ValueId {
        self.inst(op, Vec::new(), ArmFlags::NONE)
    }

    pub fn inst1(&mut self, op: MicroOp, a: ValueId, write_flags: ArmFlags) -> ValueId {
        self.inst(op, vec![a], write_flags)
    }

    pub fn inst2(
        &mut self,
        op: MicroOp,
        a: ValueId,
        b: ValueId,
        write_flags: ArmFlags,
    ) -> ValueId {
        self.inst(op, vec![a, b], write_flags)
    }

    fn inst(&mut self, op: MicroOp, args: Vec<ValueId>, write_flags: ArmFlags) -> ValueId {
        let id = self.block.push(ValueData::Inst {
            op,
            args,
            write_flags: op_info(op).default_write_flags,
        });
        // The requested write set must be a subset of what the op can
        // write; set_write_flags asserts this.
        self.block.set_write_flags(id, write_flags);
        self.flags_written = self.flags_written | write_flags;
        id
    }

    pub fn set_term(&mut self, term: MicroTerminal) {
        self.block.terminal = term;
    }
}
