//! ARM basic-block translation — micro-IR generation.
//!
//! Walks guest instructions from a location descriptor until a block
//! boundary, dispatching each decoded bundle to exactly one visitor
//! arm. Repetitive data-processing logic is factored into a shared
//! emitter parameterised by [`DpOp`]; everything without an IR
//! lowering reifies as an `Interpret` terminal and lets the guest
//! interpreter take over.

use armjit_core::{
    ArmFlags, ArmReg, Cond, LocationDescriptor, MicroBlock, MicroBuilder, MicroOp,
    MicroTerminal, ShiftType, ValueData, ValueId,
};

use super::decode::{decode_arm, ArmInst, DpOp, Imm24, Imm4, Imm5, Imm8, Imm12};
use crate::mem::GuestMemory;

/// Translate one basic block of guest code starting at `location`.
pub fn translate(location: LocationDescriptor, mem: &dyn GuestMemory) -> MicroBlock {
    ArmTranslator::new(location, mem).translate()
}

struct ArmTranslator<'a> {
    ir: MicroBuilder,
    current: LocationDescriptor,
    instructions_translated: usize,
    stop_compilation: bool,
    /// Last value bound to each GPR in this block. Flushed to
    /// `SetGpr`s when translation ends.
    reg_values: [Option<ValueId>; 15],
    mem: &'a dyn GuestMemory,
}

impl<'a> ArmTranslator<'a> {
    fn new(location: LocationDescriptor, mem: &'a dyn GuestMemory) -> Self {
        Self {
            ir: MicroBuilder::new(location),
            current: location,
            instructions_translated: 0,
            stop_compilation: false,
            reg_values: [None; 15],
            mem,
        }
    }

    fn translate(mut self) -> MicroBlock {
        debug_assert!(!self.stop_compilation);

        if self.current.t_flag {
            // No Thumb translation; the interpreter runs the block.
            self.instructions_translated += 1;
            self.fallback_to_interpreter();
        } else {
            loop {
                self.instructions_translated += 1;
                self.translate_single_arm_instruction();
                if self.stop_compilation || self.current.arm_pc & 0xFFF == 0 {
                    break;
                }
            }
        }

        if !self.stop_compilation {
            // Translation ended purely because the cursor crossed a
            // page boundary; chain into the next page.
            self.ir
                .set_term(MicroTerminal::LinkBlock { next: self.current });
        }

        // The GPR values have been taken out and played with; put the
        // modified ones back.
        for i in 0..15 {
            if let Some(value) = self.reg_values[i] {
                let reg = ArmReg::new(i as u32);
                if *self.ir.block.value(value).data() != ValueData::GetGpr(reg) {
                    self.ir.set_gpr(reg, value);
                }
            }
        }

        self.ir.block.cycles_consumed = self.instructions_translated;
        self.ir.block
    }

    fn translate_single_arm_instruction(&mut self) {
        let word = self.mem.read_u32(self.current.arm_pc & 0xFFFF_FFFC);

        match decode_arm(word) {
            None => {
                log::trace!(
                    "undefined encoding {:08x} at {:08x}, deferring to interpreter",
                    word,
                    self.current.arm_pc
                );
                self.fallback_to_interpreter();
            }
            Some(inst) => {
                let old = self.current;
                self.visit(inst);
                debug_assert_eq!(old, self.current, "visitors must not move the cursor");
                self.current.arm_pc = self.current.arm_pc.wrapping_add(4);
            }
        }
    }

    // -- Register access ------------------------------------

    /// Read a guest register. PC reads resolve to the constant
    /// `arm_pc + 8`; other registers are read once and cached.
    fn get_reg(&mut self, reg: ArmReg) -> ValueId {
        if reg == ArmReg::PC {
            return self.ir.const_u32(self.pc());
        }
        match self.reg_values[reg.index()] {
            Some(value) => value,
            None => {
                let value = self.ir.get_gpr(reg);
                self.reg_values[reg.index()] = Some(value);
                value
            }
        }
    }

    /// Bind a guest register to a value. The store itself is batched
    /// into the end-of-translation flush.
    fn set_reg(&mut self, reg: ArmReg, value: ValueId) {
        debug_assert_ne!(reg, ArmReg::PC, "PC writes go through the *_write_pc helpers");
        self.reg_values[reg.index()] = Some(value);
    }

    /// The value a PC read yields under the ARM "PC + 8" rule.
    fn pc(&self) -> u32 {
        self.current.arm_pc.wrapping_add(8)
    }

    // -- Block termination ----------------------------------

    fn fallback_to_interpreter(&mut self) {
        self.ir
            .set_term(MicroTerminal::Interpret { next: self.current });
        self.stop_compilation = true;
    }

    /// Check the instruction's condition against the block's residual
    /// condition. On mismatch the instruction is untranslated: rewind
    /// the counter and re-dispatch with the condition overridden.
    fn condition_passed(&mut self, cond: Cond) -> bool {
        if cond == self.current.cond && self.ir.flags_written.is_empty() {
            // TODO(flags): finer-grained checks on flags_written —
            // e.g. GE only needs N and V to be untouched.
            return true;
        }

        self.instructions_translated -= 1;
        let next = self.current.with_cond(cond);
        self.ir.set_term(MicroTerminal::LinkBlock { next });
        self.stop_compilation = true;
        false
    }

    fn alu_write_pc(&mut self, new_pc: ValueId) {
        // ARMv6 behaviour.
        self.branch_write_pc(new_pc);
    }

    fn load_write_pc(&mut self, new_pc: ValueId) {
        // ARMv6 behaviour.
        self.bx_write_pc(new_pc);
    }

    fn branch_write_pc_const(&mut self, new_pc: u32) {
        let next = self.current.with_arm_pc(new_pc);
        self.ir.set_term(MicroTerminal::LinkBlock { next });
        self.stop_compilation = true;
    }

    fn branch_write_pc(&mut self, new_pc: ValueId) {
        if let ValueData::ConstU32(value) = *self.ir.block.value(new_pc).data() {
            return self.branch_write_pc_const(value);
        }
        self.ir
            .inst1(MicroOp::BranchWritePc, new_pc, ArmFlags::NONE);
        self.ir.set_term(MicroTerminal::ReturnToDispatch);
        self.stop_compilation = true;
    }

    fn bx_write_pc_const(&mut self, new_pc: u32) {
        let mut next = self.current;
        next.t_flag = new_pc & 1 != 0;
        next.arm_pc = new_pc & if next.t_flag { 0xFFFF_FFFE } else { 0xFFFF_FFFC };
        self.ir.set_term(MicroTerminal::LinkBlock { next });
        self.stop_compilation = true;
    }

    fn bx_write_pc(&mut self, new_pc: ValueId) {
        if let ValueData::ConstU32(value) = *self.ir.block.value(new_pc).data() {
            return self.bx_write_pc_const(value);
        }
        self.ir.inst1(MicroOp::BxWritePc, new_pc, ArmFlags::NONE);
        self.ir.set_term(MicroTerminal::ReturnToDispatch);
        self.stop_compilation = true;
    }

    // -- Operand helpers ------------------------------------

    fn arm_expand_imm(&self, imm8: Imm8, rotate: Imm4) -> u32 {
        (imm8 as u32).rotate_right(2 * rotate as u32)
    }

    fn sign_extend(value: u32, bits: u32) -> u32 {
        let shift = 32 - bits;
        (((value << shift) as i32) >> shift) as u32
    }

    fn branch_offset(imm24: Imm24) -> u32 {
        Self::sign_extend(imm24 << 2, 26)
    }

    /// Materialise a shift-by-immediate barrel shifter operand.
    /// When `want_carry` is set the shifter's carry-out is written to
    /// C (a logical instruction with S takes C from the shifter); the
    /// `LSL #0` identity case leaves C untouched, as architected.
    fn emit_shift_imm(
        &mut self,
        rm: ValueId,
        shift: ShiftType,
        imm5: Imm5,
        want_carry: bool,
    ) -> ValueId {
        let write = if want_carry { ArmFlags::C } else { ArmFlags::NONE };
        match shift {
            ShiftType::LSL if imm5 == 0 => rm,
            ShiftType::LSL => {
                let amount = self.ir.const_u32(imm5 as u32);
                self.ir.inst2(MicroOp::Lsl, rm, amount, write)
            }
            ShiftType::LSR => {
                let amount = self.ir.const_u32(if imm5 == 0 { 32 } else { imm5 as u32 });
                self.ir.inst2(MicroOp::Lsr, rm, amount, write)
            }
            ShiftType::ASR => {
                let amount = self.ir.const_u32(if imm5 == 0 { 32 } else { imm5 as u32 });
                self.ir.inst2(MicroOp::Asr, rm, amount, write)
            }
            ShiftType::ROR if imm5 == 0 => self.ir.inst1(MicroOp::Rrx, rm, write),
            ShiftType::ROR => {
                let amount = self.ir.const_u32(imm5 as u32);
                self.ir.inst2(MicroOp::Ror, rm, amount, write)
            }
        }
    }

    // -- Visitor dispatch -----------------------------------

    fn visit(&mut self, inst: ArmInst) {
        use ArmInst::*;
        match inst {
            // Branch instructions
            B { cond, imm24 } => self.b(cond, imm24),
            Bl { cond, imm24 } => self.bl(cond, imm24),
            BlxImm { h, imm24 } => self.blx_imm(h, imm24),
            BlxReg { cond, m } => self.blx_reg(cond, m),
            Bx { cond, m } => self.bx(cond, m),
            Bxj { .. } => self.fallback_to_interpreter(),

            // Data processing instructions
            DataProcImm {
                op,
                cond,
                s,
                n,
                d,
                rotate,
                imm8,
            } => self.data_proc_imm(op, cond, s, n, d, rotate, imm8),
            DataProcReg {
                op,
                cond,
                s,
                n,
                d,
                imm5,
                shift,
                m,
            } => self.data_proc_reg(op, cond, s, n, d, imm5, shift, m),
            DataProcRsr { .. } => self.fallback_to_interpreter(),

            // Miscellaneous instructions
            Clz { cond, d, m } => self.clz(cond, d, m),
            Nop => {}
            Sel { .. } => self.fallback_to_interpreter(),

            // Load/store instructions
            LdrImm {
                cond,
                p,
                u,
                w,
                n,
                d,
                imm12,
            } => self.ldr_imm(cond, p, u, w, n, d, imm12),

            // Synchronization primitives
            Clrex => self.clrex(),

            // Status register access
            Setend { e } => self.setend(e),

            // Coprocessor instructions
            Cdp | Ldc | Mcr | Mcrr | Mrc | Mrrc | Stc => self.fallback_to_interpreter(),

            // Exception generation instructions
            Bkpt { .. } | Svc { .. } | Udf => self.fallback_to_interpreter(),

            // Extension functions
            Extend { .. } => self.fallback_to_interpreter(),

            // Hint instructions
            Pld | Sev | Wfe | Wfi | Yield => self.fallback_to_interpreter(),

            // Load/store forms without a lowering
            LdrReg { .. } | LdrbImm { .. } | LdrbReg { .. } | Ldrbt | LdrdImm { .. }
            | LdrdReg { .. } | LdrhImm { .. } | LdrhReg { .. } | Ldrht | LdrsbImm { .. }
            | LdrsbReg { .. } | Ldrsbt | LdrshImm { .. } | LdrshReg { .. } | Ldrsht | Ldrt
            | StrImm { .. } | StrReg { .. } | StrbImm { .. } | StrbReg { .. } | Strbt
            | StrdImm { .. } | StrdReg { .. } | StrhImm { .. } | StrhReg { .. } | Strht
            | Strt => self.fallback_to_interpreter(),

            // Load/store multiple instructions
            Ldm { .. } | LdmUsr | LdmEret | Stm { .. } | StmUsr => {
                self.fallback_to_interpreter()
            }

            // Media instructions
            Usad8 { .. } | Usada8 { .. } | Pkhbt { .. } | Pkhtb { .. } | Rev { .. }
            | Rev16 { .. } | Revsh { .. } | Ssat { .. } | Ssat16 { .. } | Usat { .. }
            | Usat16 { .. } => self.fallback_to_interpreter(),

            // Multiply instructions
            Mla { .. } | Mul { .. } | Smlal { .. } | Smull { .. } | Umaal { .. }
            | Umlal { .. } | Umull { .. } | Smlalxy { .. } | Smlaxy { .. } | Smulxy { .. }
            | Smlawy { .. } | Smulwy { .. } | Smmla { .. } | Smmls { .. } | Smmul { .. }
            | Smlad { .. } | Smlald { .. } | Smlsd { .. } | Smlsld { .. } | Smuad { .. }
            | Smusd { .. } => self.fallback_to_interpreter(),

            // Parallel and saturated arithmetic
            Parallel { .. } | Qadd { .. } | Qsub { .. } | Qdadd { .. } | Qdsub { .. } => {
                self.fallback_to_interpreter()
            }

            // Exclusive monitors and swaps
            Ldrex { .. } | Ldrexb { .. } | Ldrexd { .. } | Ldrexh { .. } | Strex { .. }
            | Strexb { .. } | Strexd { .. } | Strexh { .. } | Swp { .. } | Swpb { .. } => {
                self.fallback_to_interpreter()
            }

            // Status register access
            Cps | Mrs | Msr | Rfe | Srs => self.fallback_to_interpreter(),

            // Thumb-prefix stubs
            ThumbBlxPrefix { .. } | ThumbBlxSuffix { .. } => self.fallback_to_interpreter(),
        }
    }

    // -- Branch instructions --------------------------------

    fn b(&mut self, cond: Cond, imm24: Imm24) {
        let imm32 = Self::branch_offset(imm24);

        if !self.condition_passed(cond) {
            return;
        }

        self.branch_write_pc_const(self.pc().wrapping_add(imm32));
    }

    fn bl(&mut self, cond: Cond, imm24: Imm24) {
        let imm32 = Self::branch_offset(imm24);

        if !self.condition_passed(cond) {
            return;
        }

        self.push_link(self.current.arm_pc.wrapping_add(4));
        self.branch_write_pc_const(self.pc().wrapping_add(imm32));
    }

    fn blx_imm(&mut self, h: bool, imm24: Imm24) {
        let imm32 = Self::branch_offset(imm24).wrapping_add((h as u32) << 1);

        // Unconditional-space encoding; normalise the residual first.
        if !self.condition_passed(Cond::AL) {
            return;
        }

        self.push_link(self.current.arm_pc.wrapping_add(4));
        let mut next = self.current;
        next.arm_pc = self.pc().wrapping_add(imm32);
        next.t_flag = true;
        self.ir.set_term(MicroTerminal::LinkBlock { next });
        self.stop_compilation = true;
    }

    fn blx_reg(&mut self, cond: Cond, m: ArmReg) {
        if !self.condition_passed(cond) {
            return;
        }

        // Read Rm before the link write in case m == LR.
        let rm = self.get_reg(m);
        self.push_link(self.current.arm_pc.wrapping_add(4));
        self.bx_write_pc(rm);
    }

    fn bx(&mut self, cond: Cond, m: ArmReg) {
        if !self.condition_passed(cond) {
            return;
        }

        let rm = self.get_reg(m);
        self.bx_write_pc(rm);
    }

    /// Emit the function-call link write. The RSB hint performs the
    /// r14 store itself, so any cached r14 binding is dead.
    fn push_link(&mut self, return_address: u32) {
        let ret = self.ir.const_u32(return_address);
        self.ir.inst1(MicroOp::PushRsbHint, ret, ArmFlags::NONE);
        self.reg_values[ArmReg::LR.index()] = None;
    }

    // -- Data processing instructions -----------------------

    /// Whether a data-processing op takes its S-bit carry from the
    /// barrel shifter rather than from the ALU.
    fn dp_is_logical(op: DpOp) -> bool {
        matches!(
            op,
            DpOp::And | DpOp::Eor | DpOp::Tst | DpOp::Teq | DpOp::Bic | DpOp::Mov | DpOp::Mvn
        )
    }

    fn data_proc_imm(
        &mut self,
        op: DpOp,
        cond: Cond,
        s: bool,
        n: ArmReg,
        d: ArmReg,
        rotate: Imm4,
        imm8: Imm8,
    ) {
        // A rotated immediate shifts its own carry out; there is no
        // IR expression for that, so flag-setting logical forms with
        // rotate != 0 go to the interpreter.
        if Self::dp_is_logical(op) && s && rotate != 0 {
            return self.fallback_to_interpreter();
        }
        if matches!(op, DpOp::Orr) || (matches!(op, DpOp::Mov | DpOp::Mvn) && s) {
            return self.fallback_to_interpreter();
        }

        let imm32 = self.arm_expand_imm(imm8, rotate);

        if !self.condition_passed(cond) {
            return;
        }

        let rn = Self::dp_reads_rn(op).then(|| self.get_reg(n));
        let operand = self.ir.const_u32(imm32);
        self.emit_data_proc(op, s, rn, d, operand);
    }

    fn data_proc_reg(
        &mut self,
        op: DpOp,
        cond: Cond,
        s: bool,
        n: ArmReg,
        d: ArmReg,
        imm5: Imm5,
        shift: ShiftType,
        m: ArmReg,
    ) {
        if matches!(op, DpOp::Orr) || (matches!(op, DpOp::Mov | DpOp::Mvn) && s) {
            return self.fallback_to_interpreter();
        }

        if !self.condition_passed(cond) {
            return;
        }

        let rm = self.get_reg(m);
        let want_carry = s && Self::dp_is_logical(op);
        let operand = self.emit_shift_imm(rm, shift, imm5, want_carry);
        let rn = Self::dp_reads_rn(op).then(|| self.get_reg(n));
        self.emit_data_proc(op, s, rn, d, operand);
    }

    /// Whether a data-processing op reads Rn at all.
    fn dp_reads_rn(op: DpOp) -> bool {
        !matches!(op, DpOp::Mov | DpOp::Mvn)
    }

    /// Shared data-processing tail: apply `op` to (Rn, operand) and
    /// route the result. Arithmetic ops write NZCV under S; logical
    /// ops write N and Z (their carry came from the shifter).
    fn emit_data_proc(
        &mut self,
        op: DpOp,
        s: bool,
        rn: Option<ValueId>,
        d: ArmReg,
        operand: ValueId,
    ) {
        use MicroOp::*;

        let arith = if s { ArmFlags::NZCV } else { ArmFlags::NONE };
        let logical = if s { ArmFlags::NZ } else { ArmFlags::NONE };
        let require_rn = || rn.expect("data-processing op reads Rn");

        let result = match op {
            DpOp::And => {
                let rn = require_rn();
                self.ir.inst2(And, rn, operand, logical)
            }
            DpOp::Eor => {
                let rn = require_rn();
                self.ir.inst2(Eor, rn, operand, logical)
            }
            DpOp::Bic => {
                let rn = require_rn();
                let mask = self.ir.inst1(Not, operand, ArmFlags::NONE);
                self.ir.inst2(And, rn, mask, logical)
            }
            DpOp::Sub => {
                let rn = require_rn();
                self.ir.inst2(Sub, rn, operand, arith)
            }
            DpOp::Rsb => {
                let rn = require_rn();
                self.ir.inst2(Sub, operand, rn, arith)
            }
            DpOp::Add => {
                let rn = require_rn();
                self.ir.inst2(Add, rn, operand, arith)
            }
            DpOp::Adc => {
                let rn = require_rn();
                self.ir.inst2(AddWithCarry, rn, operand, arith)
            }
            DpOp::Sbc => {
                // Rn - operand - NOT C == Rn + NOT operand + C
                let rn = require_rn();
                let inverted = self.ir.inst1(Not, operand, ArmFlags::NONE);
                self.ir.inst2(AddWithCarry, rn, inverted, arith)
            }
            DpOp::Rsc => {
                let rn = require_rn();
                let inverted = self.ir.inst1(Not, rn, ArmFlags::NONE);
                self.ir.inst2(AddWithCarry, inverted, operand, arith)
            }
            DpOp::Tst => {
                let rn = require_rn();
                self.ir.inst2(And, rn, operand, ArmFlags::NZ);
                return;
            }
            DpOp::Teq => {
                let rn = require_rn();
                self.ir.inst2(Eor, rn, operand, ArmFlags::NZ);
                return;
            }
            DpOp::Cmp => {
                let rn = require_rn();
                self.ir.inst2(Sub, rn, operand, ArmFlags::NZCV);
                return;
            }
            DpOp::Cmn => {
                let rn = require_rn();
                self.ir.inst2(Add, rn, operand, ArmFlags::NZCV);
                return;
            }
            DpOp::Mov => operand,
            DpOp::Mvn => self.ir.inst1(Not, operand, ArmFlags::NONE),
            // Filtered by the callers: no Or micro-op exists.
            DpOp::Orr => unreachable!("ORR has no lowering"),
        };

        if d == ArmReg::PC {
            self.alu_write_pc(result);
        } else {
            self.set_reg(d, result);
        }
    }

    // -- Miscellaneous instructions -------------------------

    fn clz(&mut self, cond: Cond, d: ArmReg, m: ArmReg) {
        if d == ArmReg::PC {
            // UNPREDICTABLE; let the interpreter decide.
            return self.fallback_to_interpreter();
        }

        if !self.condition_passed(cond) {
            return;
        }

        let rm = self.get_reg(m);
        let result = self.ir.inst1(MicroOp::CountLeadingZeros, rm, ArmFlags::NONE);
        self.set_reg(d, result);
    }

    fn clrex(&mut self) {
        if !self.condition_passed(Cond::AL) {
            return;
        }
        self.ir.inst0(MicroOp::ClearExclusive);
    }

    fn setend(&mut self, e: bool) {
        if !self.condition_passed(Cond::AL) {
            return;
        }
        let next = self
            .current
            .with_arm_pc(self.current.arm_pc.wrapping_add(4))
            .with_e_flag(e);
        self.ir.set_term(MicroTerminal::LinkBlock { next });
        self.stop_compilation = true;
    }

    // -- Load/store instructions ----------------------------

    fn ldr_imm(
        &mut self,
        cond: Cond,
        p: bool,
        u: bool,
        w: bool,
        n: ArmReg,
        d: ArmReg,
        imm12: Imm12,
    ) {
        if !p && w {
            // LDRT territory (user-mode access semantics).
            return self.fallback_to_interpreter();
        }
        if (!p || w) && (n == ArmReg::PC || n == d) {
            // Writeback to PC or to the loaded register is
            // UNPREDICTABLE.
            return self.fallback_to_interpreter();
        }

        if !self.condition_passed(cond) {
            return;
        }

        let rn = self.get_reg(n);
        let offset = self.ir.const_u32(imm12 as u32);
        let offset_addr = if u {
            self.ir.inst2(MicroOp::Add, rn, offset, ArmFlags::NONE)
        } else {
            self.ir.inst2(MicroOp::Sub, rn, offset, ArmFlags::NONE)
        };
        let address = if p { offset_addr } else { rn };
        let data = self.ir.inst1(MicroOp::Read32, address, ArmFlags::NONE);

        if !p || w {
            self.set_reg(n, offset_addr);
        }

        if d == ArmReg::PC {
            self.load_write_pc(data);
        } else {
            self.set_reg(d, data);
        }
    }
}
