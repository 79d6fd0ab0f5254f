//! The three-address-code interpreter.
//!
//! Runs one lowered block against the guest CPU state: guest GPRs are
//! copied into the low register-file slots, the CPSR flags are
//! unpacked into locals, the instructions execute in order, the
//! terminal installs the next location, and everything is written
//! back.

use armjit_core::{Cond, MicroOp, MicroTerminal};
use armjit_frontend::GuestMemory;

use crate::cpu::CpuState;
use crate::tac::{TacBlock, REG_FILE_SIZE};

const CPSR_T: u32 = 1 << 5;
const CPSR_E: u32 = 1 << 9;
const CPSR_V: u32 = 1 << 28;
const CPSR_C: u32 = 1 << 29;
const CPSR_Z: u32 = 1 << 30;
const CPSR_N: u32 = 1 << 31;

/// Mutable state of the TAC interpreter that survives across blocks.
pub struct RunState {
    pub regs: Box<[u32; REG_FILE_SIZE]>,
    /// Residual condition carried between blocks.
    pub cond: Cond,
}

impl RunState {
    pub fn new() -> Self {
        Self {
            regs: vec![0u32; REG_FILE_SIZE]
                .into_boxed_slice()
                .try_into()
                .expect("register file size"),
            cond: Cond::AL,
        }
    }
}

impl Default for RunState {
    fn default() -> Self {
        Self::new()
    }
}

fn sign(x: u32) -> bool {
    x & 0x8000_0000 != 0
}

/// Execute one block. Only the emulation thread may call this; blocks
/// run to completion, with no mid-block suspension point.
pub fn run_tac(
    cpu: &mut CpuState,
    state: &mut RunState,
    block: &TacBlock,
    mem: &dyn GuestMemory,
) {
    state.regs[..16].copy_from_slice(&cpu.regs);

    let mut t_flag = cpu.cpsr & CPSR_T != 0;
    let mut e_flag = cpu.cpsr & CPSR_E != 0;
    let mut n_flag = cpu.cpsr & CPSR_N != 0;
    let mut z_flag = cpu.cpsr & CPSR_Z != 0;
    let mut c_flag = cpu.cpsr & CPSR_C != 0;
    let mut v_flag = cpu.cpsr & CPSR_V != 0;

    let regs = &mut state.regs;

    for inst in &block.instructions {
        let wf = inst.writes_flags();
        match inst.op() {
            MicroOp::GetGpr => regs[inst.dest as usize] = regs[inst.a() as usize],
            MicroOp::SetGpr => regs[inst.a() as usize] = regs[inst.b() as usize],
            MicroOp::ConstU32 => regs[inst.dest as usize] = inst.imm32(),
            MicroOp::PushRsbHint => {
                // No return stack buffer in this back-end; just the
                // architectural link write.
                regs[14] = regs[inst.a() as usize];
            }
            MicroOp::AluWritePc | MicroOp::BranchWritePc => {
                let target = regs[inst.a() as usize];
                regs[15] = target & if t_flag { 0xFFFF_FFFE } else { 0xFFFF_FFFC };
            }
            MicroOp::LoadWritePc | MicroOp::BxWritePc => {
                let target = regs[inst.a() as usize];
                t_flag = target & 1 != 0;
                regs[15] = target & if t_flag { 0xFFFF_FFFE } else { 0xFFFF_FFFC };
            }
            MicroOp::Add => {
                let a = regs[inst.a() as usize];
                let b = regs[inst.b() as usize];
                let result = a.wrapping_add(b);
                regs[inst.dest as usize] = result;
                if wf {
                    n_flag = sign(result);
                    z_flag = result == 0;
                    c_flag = result < a;
                    v_flag = sign(a) == sign(b) && sign(result) != sign(a);
                }
            }
            MicroOp::AddWithCarry => {
                let a = regs[inst.a() as usize];
                let b = regs[inst.b() as usize];
                let sum = a as u64 + b as u64 + c_flag as u64;
                let result = sum as u32;
                regs[inst.dest as usize] = result;
                if wf {
                    n_flag = sign(result);
                    z_flag = result == 0;
                    c_flag = sum > u32::MAX as u64;
                    v_flag = sign(a) == sign(b) && sign(result) != sign(a);
                }
            }
            MicroOp::Sub => {
                let a = regs[inst.a() as usize];
                let b = regs[inst.b() as usize];
                let result = a.wrapping_sub(b);
                regs[inst.dest as usize] = result;
                if wf {
                    n_flag = sign(result);
                    z_flag = result == 0;
                    // C is NOT borrow.
                    c_flag = a >= b;
                    v_flag = sign(a) != sign(b) && sign(result) != sign(a);
                }
            }
            MicroOp::And | MicroOp::Eor => {
                let a = regs[inst.a() as usize];
                let b = regs[inst.b() as usize];
                let result = if inst.op() == MicroOp::And { a & b } else { a ^ b };
                regs[inst.dest as usize] = result;
                if wf {
                    // The carry of a flag-setting logical op comes
                    // from the shifter operand, never from here.
                    n_flag = sign(result);
                    z_flag = result == 0;
                }
            }
            MicroOp::Not => {
                regs[inst.dest as usize] = !regs[inst.a() as usize];
            }
            MicroOp::Lsl => {
                let a = regs[inst.a() as usize];
                let amount = regs[inst.b() as usize];
                let result = match amount {
                    0 => a,
                    1..=31 => {
                        if wf {
                            c_flag = (a >> (32 - amount)) & 1 != 0;
                        }
                        a << amount
                    }
                    32 => {
                        if wf {
                            c_flag = a & 1 != 0;
                        }
                        0
                    }
                    _ => {
                        if wf {
                            c_flag = false;
                        }
                        0
                    }
                };
                regs[inst.dest as usize] = result;
            }
            MicroOp::Lsr => {
                let a = regs[inst.a() as usize];
                let amount = regs[inst.b() as usize];
                let result = match amount {
                    0 => a,
                    1..=31 => {
                        if wf {
                            c_flag = (a >> (amount - 1)) & 1 != 0;
                        }
                        a >> amount
                    }
                    32 => {
                        if wf {
                            c_flag = sign(a);
                        }
                        0
                    }
                    _ => {
                        if wf {
                            c_flag = false;
                        }
                        0
                    }
                };
                regs[inst.dest as usize] = result;
            }
            MicroOp::Asr => {
                let a = regs[inst.a() as usize];
                let amount = regs[inst.b() as usize];
                let result = match amount {
                    0 => a,
                    1..=31 => {
                        if wf {
                            c_flag = (a >> (amount - 1)) & 1 != 0;
                        }
                        ((a as i32) >> amount) as u32
                    }
                    _ => {
                        if wf {
                            c_flag = sign(a);
                        }
                        if sign(a) {
                            u32::MAX
                        } else {
                            0
                        }
                    }
                };
                regs[inst.dest as usize] = result;
            }
            MicroOp::Ror => {
                let a = regs[inst.a() as usize];
                let amount = regs[inst.b() as usize];
                let result = if amount == 0 {
                    a
                } else if amount & 31 == 0 {
                    if wf {
                        c_flag = sign(a);
                    }
                    a
                } else {
                    let r = a.rotate_right(amount & 31);
                    if wf {
                        c_flag = sign(r);
                    }
                    r
                };
                regs[inst.dest as usize] = result;
            }
            MicroOp::Rrx => {
                let a = regs[inst.a() as usize];
                let result = ((c_flag as u32) << 31) | (a >> 1);
                regs[inst.dest as usize] = result;
                if wf {
                    c_flag = a & 1 != 0;
                }
            }
            MicroOp::CountLeadingZeros => {
                regs[inst.dest as usize] = regs[inst.a() as usize].leading_zeros();
            }
            MicroOp::ClearExclusive => {
                // Monitor state lives with the memory system; the
                // exclusive-access family falls back to the
                // interpreter, so there is nothing to clear here.
            }
            MicroOp::Read32 => {
                regs[inst.dest as usize] = mem.read_u32(regs[inst.a() as usize]);
            }
            MicroOp::Count => unreachable!("sentinel opcode in lowered block"),
        }
    }

    apply_terminal(
        &block.terminal,
        regs,
        &mut t_flag,
        &mut e_flag,
        &mut state.cond,
        (n_flag, z_flag, c_flag, v_flag),
    );

    cpu.cpsr &= !(CPSR_T | CPSR_E | CPSR_N | CPSR_Z | CPSR_C | CPSR_V);
    if t_flag {
        cpu.cpsr |= CPSR_T;
    }
    if e_flag {
        cpu.cpsr |= CPSR_E;
    }
    if n_flag {
        cpu.cpsr |= CPSR_N;
    }
    if z_flag {
        cpu.cpsr |= CPSR_Z;
    }
    if c_flag {
        cpu.cpsr |= CPSR_C;
    }
    if v_flag {
        cpu.cpsr |= CPSR_V;
    }

    cpu.regs.copy_from_slice(&state.regs[..16]);
}

fn apply_terminal(
    terminal: &MicroTerminal,
    regs: &mut [u32; REG_FILE_SIZE],
    t_flag: &mut bool,
    e_flag: &mut bool,
    residual: &mut Cond,
    nzcv: (bool, bool, bool, bool),
) {
    match terminal {
        MicroTerminal::ReturnToDispatch | MicroTerminal::PopRsbHint => {
            // No RSB to pop; the dispatcher resolves R15.
            *residual = Cond::AL;
        }
        MicroTerminal::LinkBlock { next } | MicroTerminal::LinkBlockFast { next } => {
            regs[15] = next.arm_pc;
            *t_flag = next.t_flag;
            *e_flag = next.e_flag;
            *residual = next.cond;
        }
        MicroTerminal::Interpret { next } => {
            // No external interpreter is wired into this back-end;
            // install the location and let the dispatcher's caller
            // deal with it.
            log::trace!("interpret fallback at {:08x}", next.arm_pc);
            regs[15] = next.arm_pc;
            *t_flag = next.t_flag;
            *e_flag = next.e_flag;
            *residual = next.cond;
        }
        MicroTerminal::If { cond, then_, else_ } => {
            let (n, z, c, v) = nzcv;
            let chosen = if cond.holds(n, z, c, v) { then_ } else { else_ };
            apply_terminal(chosen, regs, t_flag, e_flag, residual, nzcv);
        }
    }
}
