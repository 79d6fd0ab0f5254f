//! Micro-operation tags and their static definitions.

use crate::flags::ArmFlags;

/// The operation performed by one micro-instruction. A single guest
/// instruction translates into zero or more of these.
///
/// The `u16` discriminant doubles as the opcode field of the lowered
/// three-address form, so variant order is part of the encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum MicroOp {
    // -- Basic loads/stores --
    ConstU32 = 0, // value := const
    GetGpr,       // value := R[reg]
    SetGpr,       // R[reg] := $0

    // -- Optimization hints --
    PushRsbHint, // R[14] := $0, pushing return info onto the RSB

    // -- ARM PC writes --
    AluWritePc,  // R[15] := $0 & (T ? 0xFFFFFFFE : 0xFFFFFFFC)
    LoadWritePc, // T := $0 & 1, R[15] := $0 masked by the new T

    // -- ARM ALU --
    Add,          // value := $0 + $1
    AddWithCarry, // value := $0 + $1 + C
    Sub,          // value := $0 - $1

    And, // value := $0 & $1
    Eor, // value := $0 ^ $1
    Not, // value := ~$0

    Lsl, // value := $0 LSL $1
    Lsr, // value := $0 LSR $1
    Asr, // value := $0 ASR $1
    Ror, // value := $0 ROR $1
    Rrx, // value := $0 rotated right through C

    CountLeadingZeros, // value := CLZ $0

    // -- Synchronisation --
    ClearExclusive, // clears the exclusive access record

    // -- Memory --
    Read32, // value := mem[$0]

    // -- Dynamic control flow --
    BranchWritePc, // R[15] := $0 & (T ? 0xFFFFFFFE : 0xFFFFFFFC)
    BxWritePc,     // T := $0 & 1, R[15] := $0 masked by the new T

    // Sentinel — must be last.
    Count,
}

impl MicroOp {
    /// Recover an op from its raw discriminant.
    pub fn from_raw(raw: u16) -> Option<MicroOp> {
        if raw < MicroOp::Count as u16 {
            // SAFETY: MicroOp is repr(u16) with contiguous
            // discriminants below Count.
            Some(unsafe { std::mem::transmute::<u16, MicroOp>(raw) })
        } else {
            None
        }
    }

    pub fn info(self) -> &'static MicroOpInfo {
        op_info(self)
    }
}

/// Type of a micro-instruction's result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MicroType {
    Void,
    U32,
}

/// Static definition of one micro-operation.
#[derive(Debug)]
pub struct MicroOpInfo {
    pub name: &'static str,
    /// Type of the value this op produces.
    pub ret_type: MicroType,
    /// Flags this op reads.
    pub read_flags: ArmFlags,
    /// Flags this op may write. An instruction's actual write set is
    /// restricted to a subset of this.
    pub default_write_flags: ArmFlags,
    /// Required argument types, in order.
    pub arg_types: &'static [MicroType],
}

impl MicroOpInfo {
    pub fn num_args(&self) -> usize {
        self.arg_types.len()
    }
}

const U32: MicroType = MicroType::U32;
const VOID: MicroType = MicroType::Void;
const NONE: ArmFlags = ArmFlags::NONE;

const NO_ARGS: &[MicroType] = &[];
const UNARY: &[MicroType] = &[U32];
const BINARY: &[MicroType] = &[U32, U32];

macro_rules! def {
    ($name:literal, $ret:expr, $read:expr, $write:expr, $args:expr) => {
        MicroOpInfo {
            name: $name,
            ret_type: $ret,
            read_flags: $read,
            default_write_flags: $write,
            arg_types: $args,
        }
    };
}

/// Static op definition table, indexed by `MicroOp as usize`.
static OP_INFO: [MicroOpInfo; MicroOp::Count as usize] = [
    def!("const_u32", U32, NONE, NONE, NO_ARGS),
    def!("get_gpr", U32, NONE, NONE, NO_ARGS),
    def!("set_gpr", VOID, NONE, NONE, UNARY),
    def!("push_rsb_hint", VOID, NONE, NONE, UNARY),
    def!("alu_write_pc", VOID, NONE, NONE, UNARY),
    def!("load_write_pc", VOID, NONE, NONE, UNARY),
    def!("add", U32, NONE, ArmFlags::NZCV, BINARY),
    def!("adc", U32, ArmFlags::C, ArmFlags::NZCV, BINARY),
    def!("sub", U32, NONE, ArmFlags::NZCV, BINARY),
    def!("and", U32, NONE, ArmFlags::NZC, BINARY),
    def!("eor", U32, NONE, ArmFlags::NZC, BINARY),
    def!("not", U32, NONE, NONE, UNARY),
    def!("lsl", U32, NONE, ArmFlags::C, BINARY),
    def!("lsr", U32, NONE, ArmFlags::C, BINARY),
    def!("asr", U32, NONE, ArmFlags::C, BINARY),
    def!("ror", U32, NONE, ArmFlags::C, BINARY),
    def!("rrx", U32, ArmFlags::C, ArmFlags::C, UNARY),
    def!("clz", U32, NONE, NONE, UNARY),
    def!("clear_exclusive", VOID, NONE, NONE, NO_ARGS),
    def!("read32", U32, NONE, NONE, UNARY),
    def!("branch_write_pc", VOID, NONE, NONE, UNARY),
    def!("bx_write_pc", VOID, NONE, NONE, UNARY),
];

/// Get the static definition of `op`.
pub fn op_info(op: MicroOp) -> &'static MicroOpInfo {
    &OP_INFO[op as usize]
}
