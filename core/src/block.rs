//! The SSA micro-instruction graph.
//!
//! Every value lives in a single arena owned by its [`MicroBlock`] and
//! is addressed by [`ValueId`]; uses are (user, slot) index pairs, so
//! the graph has no reference cycles and use rewriting is an index
//! rewrite. The instruction list is ordered and the order is
//! semantically significant: flag accesses and memory operations must
//! execute in insertion order.

use crate::flags::ArmFlags;
use crate::location::{ArmReg, Cond, LocationDescriptor};
use crate::op::{op_info, MicroOp, MicroType};

/// Index of a value in its block's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ValueId(pub u32);

/// One use of a value: `user`'s argument slot `slot` refers to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Use {
    user: ValueId,
    slot: usize,
}

/// The node payload of a value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueData {
    /// Literal value load.
    ConstU32(u32),
    /// Guest register read (at block entry).
    GetGpr(ArmReg),
    /// Guest register write. Sink; produces no result.
    SetGpr(ArmReg, ValueId),
    /// General micro-operation.
    Inst {
        op: MicroOp,
        args: Vec<ValueId>,
        write_flags: ArmFlags,
    },
}

/// An SSA node: payload plus its use list.
#[derive(Debug, Clone)]
pub struct Value {
    data: ValueData,
    uses: Vec<Use>,
}

impl Value {
    pub fn data(&self) -> &ValueData {
        &self.data
    }

    pub fn op(&self) -> MicroOp {
        match self.data {
            ValueData::ConstU32(_) => MicroOp::ConstU32,
            ValueData::GetGpr(_) => MicroOp::GetGpr,
            ValueData::SetGpr(..) => MicroOp::SetGpr,
            ValueData::Inst { op, .. } => op,
        }
    }

    pub fn ty(&self) -> MicroType {
        op_info(self.op()).ret_type
    }

    pub fn num_args(&self) -> usize {
        match &self.data {
            ValueData::ConstU32(_) | ValueData::GetGpr(_) => 0,
            ValueData::SetGpr(..) => 1,
            ValueData::Inst { args, .. } => args.len(),
        }
    }

    pub fn arg(&self, index: usize) -> ValueId {
        match &self.data {
            ValueData::SetGpr(_, arg) => {
                assert_eq!(index, 0, "set_gpr has a single argument");
                *arg
            }
            ValueData::Inst { args, .. } => args[index],
            _ => panic!("{:?} has no arguments", self.op()),
        }
    }

    /// Flags this value reads when executed.
    pub fn read_flags(&self) -> ArmFlags {
        op_info(self.op()).read_flags
    }

    /// Flags this value writes when executed.
    pub fn write_flags(&self) -> ArmFlags {
        match &self.data {
            ValueData::Inst { write_flags, .. } => *write_flags,
            _ => ArmFlags::NONE,
        }
    }

    pub fn has_uses(&self) -> bool {
        !self.uses.is_empty()
    }

    pub fn has_one_use(&self) -> bool {
        self.uses.len() == 1
    }

    pub fn has_many_uses(&self) -> bool {
        self.uses.len() > 1
    }
}

/// The terminal instruction of a block. Terminals are plain values,
/// not SSA nodes: control flow expressed by a value (`BranchWritePc`,
/// `BxWritePc`) is an instruction, not a terminal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MicroTerminal {
    /// Yield to the dispatcher; the next location is read from R15
    /// and the CPSR.
    ReturnToDispatch,
    /// Consult the return stack buffer; on miss, behave as
    /// `ReturnToDispatch`.
    PopRsbHint,
    /// Fall back to a guest interpreter starting at `next`. The
    /// interpreter must execute at least one instruction.
    Interpret { next: LocationDescriptor },
    /// Jump to the block at `next` if cycle budget remains, else
    /// return to the dispatcher.
    LinkBlock { next: LocationDescriptor },
    /// Jump to the block at `next` unconditionally. Only legal when
    /// the translator can prove this cannot hang; a back-end may
    /// implement it exactly as `LinkBlock`.
    LinkBlockFast { next: LocationDescriptor },
    /// Select a terminal on the run-time state of the ARM flags.
    If {
        cond: Cond,
        then_: Box<MicroTerminal>,
        else_: Box<MicroTerminal>,
    },
}

/// A translated basic block: zero or more micro-instructions followed
/// by exactly one terminal.
#[derive(Debug, Clone)]
pub struct MicroBlock {
    pub location: LocationDescriptor,
    values: Vec<Value>,
    instructions: Vec<ValueId>,
    pub terminal: MicroTerminal,
    pub cycles_consumed: usize,
}

impl MicroBlock {
    pub fn new(location: LocationDescriptor) -> Self {
        Self {
            location,
            values: Vec::new(),
            instructions: Vec::new(),
            terminal: MicroTerminal::ReturnToDispatch,
            cycles_consumed: 0,
        }
    }

    pub fn value(&self, id: ValueId) -> &Value {
        &self.values[id.0 as usize]
    }

    /// The block's instructions in program order.
    pub fn instructions(&self) -> &[ValueId] {
        &self.instructions
    }

    /// Append a new value to the block, wiring up the use list of
    /// every argument. Argument arity and types are validated against
    /// the op definition.
    pub(crate) fn push(&mut self, data: ValueData) -> ValueId {
        let id = ValueId(self.values.len() as u32);
        match &data {
            ValueData::ConstU32(_) | ValueData::GetGpr(_) => {}
            ValueData::SetGpr(_, arg) => {
                self.check_arg_type(MicroOp::SetGpr, 0, *arg);
                self.add_use(*arg, id, 0);
            }
            ValueData::Inst { op, args, .. } => {
                let info = op_info(*op);
                assert_eq!(
                    args.len(),
                    info.num_args(),
                    "{} takes {} arguments",
                    info.name,
                    info.num_args()
                );
                for (slot, arg) in args.iter().enumerate() {
                    self.check_arg_type(*op, slot, *arg);
                    self.add_use(*arg, id, slot);
                }
            }
        }
        self.values.push(Value { data, uses: Vec::new() });
        self.instructions.push(id);
        id
    }

    /// Rewrite argument slot `index` of `user` to `new`, keeping both
    /// use lists consistent.
    pub fn set_arg(&mut self, user: ValueId, index: usize, new: ValueId) {
        let old = self.value(user).arg(index);
        self.check_arg_type(self.value(user).op(), index, new);
        self.remove_use(old, user, index);
        match &mut self.values[user.0 as usize].data {
            ValueData::SetGpr(_, arg) => *arg = new,
            ValueData::Inst { args, .. } => args[index] = new,
            _ => unreachable!(),
        }
        self.add_use(new, user, index);
    }

    /// Restrict the write-flag set of an instruction. The restriction
    /// must be a subset of the op's default write set.
    pub fn set_write_flags(&mut self, inst: ValueId, flags: ArmFlags) {
        let op = self.value(inst).op();
        let default = op_info(op).default_write_flags;
        assert!(
            (flags & !default).is_empty(),
            "{}: write set {:?} is not a subset of {:?}",
            op_info(op).name,
            flags,
            default
        );
        match &mut self.values[inst.0 as usize].data {
            ValueData::Inst { write_flags, .. } => *write_flags = flags,
            _ => panic!("cannot set write flags on {op:?}"),
        }
    }

    /// Atomically rewrite every user of `x` to refer to `y`.
    ///
    /// `x`'s use list is empty afterwards; `y` inherits the uses. The
    /// two values must have the same type.
    pub fn replace_uses_with(&mut self, x: ValueId, y: ValueId) {
        assert_ne!(x, y, "replacing a value with itself");
        assert_eq!(
            self.value(x).ty(),
            self.value(y).ty(),
            "replacement type mismatch"
        );
        let uses = std::mem::take(&mut self.values[x.0 as usize].uses);
        for u in &uses {
            let user = &mut self.values[u.user.0 as usize];
            match &mut user.data {
                ValueData::SetGpr(_, arg) => {
                    assert_eq!(*arg, x, "use list out of sync");
                    *arg = y;
                }
                ValueData::Inst { args, .. } => {
                    assert_eq!(args[u.slot], x, "use list out of sync");
                    args[u.slot] = y;
                }
                _ => panic!("use list names a value without arguments"),
            }
            self.values[y.0 as usize].uses.push(*u);
        }
        assert!(!self.value(x).has_uses());
    }

    fn check_arg_type(&self, op: MicroOp, slot: usize, arg: ValueId) {
        let expected = op_info(op).arg_types[slot];
        assert_eq!(
            self.value(arg).ty(),
            expected,
            "{} argument {} must be {:?}",
            op_info(op).name,
            slot,
            expected
        );
    }

    fn add_use(&mut self, value: ValueId, user: ValueId, slot: usize) {
        self.values[value.0 as usize].uses.push(Use { user, slot });
    }

    fn remove_use(&mut self, value: ValueId, user: ValueId, slot: usize) {
        let uses = &mut self.values[value.0 as usize].uses;
        let pos = uses
            .iter()
            .position(|u| u.user == user && u.slot == slot)
            .expect("remove_use without matching add_use");
        uses.remove(pos);
    }
}
