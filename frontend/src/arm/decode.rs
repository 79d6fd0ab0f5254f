//! Generic ARMv6 instruction decoder.
//!
//! A table of 32-bit patterns is matched in order; the first hit wins,
//! so table order encodes decode precedence (hints before MSR, the
//! multiply space before data-processing register forms, and so on).
//! Each entry extracts its operand fields into an [`ArmInst`] bundle.
//! The decoder carries no semantics; the translator dispatches on the
//! bundle with an exhaustive match.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::OnceLock;

use armjit_core::{ArmReg, Cond, ShiftType, SignExtendRotation};

pub type Imm4 = u8;
pub type Imm5 = u8;
pub type Imm8 = u8;
pub type Imm11 = u16;
pub type Imm12 = u16;
pub type Imm24 = u32;
pub type RegList = u16;

/// Data-processing operation, in encoding order (bits 24:21).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DpOp {
    And,
    Eor,
    Sub,
    Rsb,
    Add,
    Adc,
    Sbc,
    Rsc,
    Tst,
    Teq,
    Cmp,
    Cmn,
    Orr,
    Mov,
    Bic,
    Mvn,
}

/// Extension (sign/zero extend) operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtendOp {
    Sxtab,
    Sxtab16,
    Sxtah,
    Sxtb,
    Sxtb16,
    Sxth,
    Uxtab,
    Uxtab16,
    Uxtah,
    Uxtb,
    Uxtb16,
    Uxth,
}

/// Parallel add/subtract arithmetic family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParallelSet {
    Modulo,
    Saturating,
    Halving,
}

/// Parallel add/subtract lane operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParallelOp {
    Add8,
    Add16,
    Asx,
    Sax,
    Sub8,
    Sub16,
}

/// A decoded ARM instruction: opcode family plus operand fields, each
/// sized exactly as the architecture specifies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArmInst {
    // -- Branches --
    BlxImm { h: bool, imm24: Imm24 },
    BlxReg { cond: Cond, m: ArmReg },
    B { cond: Cond, imm24: Imm24 },
    Bl { cond: Cond, imm24: Imm24 },
    Bx { cond: Cond, m: ArmReg },
    Bxj { cond: Cond, m: ArmReg },

    // -- Coprocessor --
    Cdp,
    Ldc,
    Mcr,
    Mcrr,
    Mrc,
    Mrrc,
    Stc,

    // -- Data processing --
    DataProcImm {
        op: DpOp,
        cond: Cond,
        s: bool,
        n: ArmReg,
        d: ArmReg,
        rotate: Imm4,
        imm8: Imm8,
    },
    DataProcReg {
        op: DpOp,
        cond: Cond,
        s: bool,
        n: ArmReg,
        d: ArmReg,
        imm5: Imm5,
        shift: ShiftType,
        m: ArmReg,
    },
    DataProcRsr {
        op: DpOp,
        cond: Cond,
        s: bool,
        n: ArmReg,
        d: ArmReg,
        s_reg: ArmReg,
        shift: ShiftType,
        m: ArmReg,
    },

    // -- Exception generation --
    Bkpt { cond: Cond, imm12: Imm12, imm4: Imm4 },
    Svc { cond: Cond, imm24: Imm24 },
    Udf,

    // -- Extension --
    Extend {
        op: ExtendOp,
        cond: Cond,
        n: ArmReg,
        d: ArmReg,
        rotate: SignExtendRotation,
        m: ArmReg,
    },

    // -- Hints --
    Pld,
    Sev,
    Wfe,
    Wfi,
    Yield,

    // -- Synchronization primitives --
    Clrex,
    Ldrex { cond: Cond, n: ArmReg, d: ArmReg },
    Ldrexb { cond: Cond, n: ArmReg, d: ArmReg },
    Ldrexd { cond: Cond, n: ArmReg, d: ArmReg },
    Ldrexh { cond: Cond, n: ArmReg, d: ArmReg },
    Strex { cond: Cond, n: ArmReg, d: ArmReg, m: ArmReg },
    Strexb { cond: Cond, n: ArmReg, d: ArmReg, m: ArmReg },
    Strexd { cond: Cond, n: ArmReg, d: ArmReg, m: ArmReg },
    Strexh { cond: Cond, n: ArmReg, d: ArmReg, m: ArmReg },
    Swp { cond: Cond, n: ArmReg, d: ArmReg, m: ArmReg },
    Swpb { cond: Cond, n: ArmReg, d: ArmReg, m: ArmReg },

    // -- Load/store (single) --
    LdrImm { cond: Cond, p: bool, u: bool, w: bool, n: ArmReg, d: ArmReg, imm12: Imm12 },
    LdrReg { cond: Cond, p: bool, u: bool, w: bool, n: ArmReg, d: ArmReg, imm5: Imm5, shift: ShiftType, m: ArmReg },
    LdrbImm { cond: Cond, p: bool, u: bool, w: bool, n: ArmReg, d: ArmReg, imm12: Imm12 },
    LdrbReg { cond: Cond, p: bool, u: bool, w: bool, n: ArmReg, d: ArmReg, imm5: Imm5, shift: ShiftType, m: ArmReg },
    Ldrbt,
    LdrdImm { cond: Cond, p: bool, u: bool, w: bool, n: ArmReg, d: ArmReg, imm8a: Imm4, imm8b: Imm4 },
    LdrdReg { cond: Cond, p: bool, u: bool, w: bool, n: ArmReg, d: ArmReg, m: ArmReg },
    LdrhImm { cond: Cond, p: bool, u: bool, w: bool, n: ArmReg, d: ArmReg, imm8a: Imm4, imm8b: Imm4 },
    LdrhReg { cond: Cond, p: bool, u: bool, w: bool, n: ArmReg, d: ArmReg, m: ArmReg },
    Ldrht,
    LdrsbImm { cond: Cond, p: bool, u: bool, w: bool, n: ArmReg, d: ArmReg, imm8a: Imm4, imm8b: Imm4 },
    LdrsbReg { cond: Cond, p: bool, u: bool, w: bool, n: ArmReg, d: ArmReg, m: ArmReg },
    Ldrsbt,
    LdrshImm { cond: Cond, p: bool, u: bool, w: bool, n: ArmReg, d: ArmReg, imm8a: Imm4, imm8b: Imm4 },
    LdrshReg { cond: Cond, p: bool, u: bool, w: bool, n: ArmReg, d: ArmReg, m: ArmReg },
    Ldrsht,
    Ldrt,
    StrImm { cond: Cond, p: bool, u: bool, w: bool, n: ArmReg, d: ArmReg, imm12: Imm12 },
    StrReg { cond: Cond, p: bool, u: bool, w: bool, n: ArmReg, d: ArmReg, imm5: Imm5, shift: ShiftType, m: ArmReg },
    StrbImm { cond: Cond, p: bool, u: bool, w: bool, n: ArmReg, d: ArmReg, imm12: Imm12 },
    StrbReg { cond: Cond, p: bool, u: bool, w: bool, n: ArmReg, d: ArmReg, imm5: Imm5, shift: ShiftType, m: ArmReg },
    Strbt,
    StrdImm { cond: Cond, p: bool, u: bool, w: bool, n: ArmReg, d: ArmReg, imm8a: Imm4, imm8b: Imm4 },
    StrdReg { cond: Cond, p: bool, u: bool, w: bool, n: ArmReg, d: ArmReg, m: ArmReg },
    StrhImm { cond: Cond, p: bool, u: bool, w: bool, n: ArmReg, d: ArmReg, imm8a: Imm4, imm8b: Imm4 },
    StrhReg { cond: Cond, p: bool, u: bool, w: bool, n: ArmReg, d: ArmReg, m: ArmReg },
    Strht,
    Strt,

    // -- Load/store multiple --
    Ldm { cond: Cond, p: bool, u: bool, w: bool, n: ArmReg, list: RegList },
    LdmUsr,
    LdmEret,
    Stm { cond: Cond, p: bool, u: bool, w: bool, n: ArmReg, list: RegList },
    StmUsr,

    // -- Miscellaneous --
    Clz { cond: Cond, d: ArmReg, m: ArmReg },
    Nop,
    Sel { cond: Cond, n: ArmReg, d: ArmReg, m: ArmReg },

    // -- Unsigned sum of absolute differences --
    Usad8 { cond: Cond, d: ArmReg, m: ArmReg, n: ArmReg },
    Usada8 { cond: Cond, d: ArmReg, a: ArmReg, m: ArmReg, n: ArmReg },

    // -- Packing --
    Pkhbt { cond: Cond, n: ArmReg, d: ArmReg, imm5: Imm5, m: ArmReg },
    Pkhtb { cond: Cond, n: ArmReg, d: ArmReg, imm5: Imm5, m: ArmReg },

    // -- Reversal --
    Rev { cond: Cond, d: ArmReg, m: ArmReg },
    Rev16 { cond: Cond, d: ArmReg, m: ArmReg },
    Revsh { cond: Cond, d: ArmReg, m: ArmReg },

    // -- Saturation --
    Ssat { cond: Cond, sat_imm: Imm5, d: ArmReg, imm5: Imm5, sh: bool, n: ArmReg },
    Ssat16 { cond: Cond, sat_imm: Imm4, d: ArmReg, n: ArmReg },
    Usat { cond: Cond, sat_imm: Imm5, d: ArmReg, imm5: Imm5, sh: bool, n: ArmReg },
    Usat16 { cond: Cond, sat_imm: Imm4, d: ArmReg, n: ArmReg },

    // -- Multiply (normal) --
    Mla { cond: Cond, s: bool, d: ArmReg, a: ArmReg, m: ArmReg, n: ArmReg },
    Mul { cond: Cond, s: bool, d: ArmReg, m: ArmReg, n: ArmReg },

    // -- Multiply (long) --
    Smlal { cond: Cond, s: bool, d_hi: ArmReg, d_lo: ArmReg, m: ArmReg, n: ArmReg },
    Smull { cond: Cond, s: bool, d_hi: ArmReg, d_lo: ArmReg, m: ArmReg, n: ArmReg },
    Umaal { cond: Cond, d_hi: ArmReg, d_lo: ArmReg, m: ArmReg, n: ArmReg },
    Umlal { cond: Cond, s: bool, d_hi: ArmReg, d_lo: ArmReg, m: ArmReg, n: ArmReg },
    Umull { cond: Cond, s: bool, d_hi: ArmReg, d_lo: ArmReg, m: ArmReg, n: ArmReg },

    // -- Multiply (halfword) --
    Smlalxy { cond: Cond, d_hi: ArmReg, d_lo: ArmReg, m: ArmReg, m_hi: bool, n_hi: bool, n: ArmReg },
    Smlaxy { cond: Cond, d: ArmReg, a: ArmReg, m: ArmReg, m_hi: bool, n_hi: bool, n: ArmReg },
    Smulxy { cond: Cond, d: ArmReg, m: ArmReg, m_hi: bool, n_hi: bool, n: ArmReg },

    // -- Multiply (word by halfword) --
    Smlawy { cond: Cond, d: ArmReg, a: ArmReg, m: ArmReg, m_hi: bool, n: ArmReg },
    Smulwy { cond: Cond, d: ArmReg, m: ArmReg, m_hi: bool, n: ArmReg },

    // -- Multiply (most significant word) --
    Smmla { cond: Cond, d: ArmReg, a: ArmReg, m: ArmReg, round: bool, n: ArmReg },
    Smmls { cond: Cond, d: ArmReg, a: ArmReg, m: ArmReg, round: bool, n: ArmReg },
    Smmul { cond: Cond, d: ArmReg, m: ArmReg, round: bool, n: ArmReg },

    // -- Multiply (dual) --
    Smlad { cond: Cond, d: ArmReg, a: ArmReg, m: ArmReg, m_swap: bool, n: ArmReg },
    Smlald { cond: Cond, d_hi: ArmReg, d_lo: ArmReg, m: ArmReg, m_swap: bool, n: ArmReg },
    Smlsd { cond: Cond, d: ArmReg, a: ArmReg, m: ArmReg, m_swap: bool, n: ArmReg },
    Smlsld { cond: Cond, d_hi: ArmReg, d_lo: ArmReg, m: ArmReg, m_swap: bool, n: ArmReg },
    Smuad { cond: Cond, d: ArmReg, m: ArmReg, m_swap: bool, n: ArmReg },
    Smusd { cond: Cond, d: ArmReg, m: ArmReg, m_swap: bool, n: ArmReg },

    // -- Parallel add/subtract --
    Parallel {
        set: ParallelSet,
        signed: bool,
        op: ParallelOp,
        cond: Cond,
        n: ArmReg,
        d: ArmReg,
        m: ArmReg,
    },

    // -- Saturated add/subtract --
    Qadd { cond: Cond, n: ArmReg, d: ArmReg, m: ArmReg },
    Qsub { cond: Cond, n: ArmReg, d: ArmReg, m: ArmReg },
    Qdadd { cond: Cond, n: ArmReg, d: ArmReg, m: ArmReg },
    Qdsub { cond: Cond, n: ArmReg, d: ArmReg, m: ArmReg },

    // -- Status register access --
    Cps,
    Mrs,
    Msr,
    Rfe,
    Setend { e: bool },
    Srs,

    // -- Thumb-prefix stubs (produced by a Thumb decoder, never by
    //    the ARM table) --
    ThumbBlxPrefix { imm11: Imm11 },
    ThumbBlxSuffix { l: bool, imm11: Imm11 },
}

// -- Field extraction helpers --

fn cond(w: u32) -> Cond {
    Cond::from_bits(w >> 28)
}

fn bit(w: u32, n: u32) -> bool {
    (w >> n) & 1 != 0
}

fn bits(w: u32, hi: u32, lo: u32) -> u32 {
    (w >> lo) & ((1 << (hi - lo + 1)) - 1)
}

fn reg(w: u32, lo: u32) -> ArmReg {
    ArmReg::new(bits(w, lo + 3, lo))
}

fn shift(w: u32) -> ShiftType {
    ShiftType::from_bits(bits(w, 6, 5))
}

type DecodeFn = Box<dyn Fn(u32) -> Option<ArmInst> + Send + Sync>;

struct Matcher {
    name: &'static str,
    bit_mask: u32,
    expected: u32,
    decode: DecodeFn,
}

impl Matcher {
    fn matches(&self, word: u32) -> bool {
        word & self.bit_mask == self.expected
    }
}

/// Build a matcher from a 32-character pattern. `0`/`1` are fixed
/// bits; any other character is an operand or don't-care bit, skipped
/// by the mask (operand extraction lives in the decode closure).
fn matcher(name: &'static str, pattern: &'static str, decode: DecodeFn) -> Matcher {
    assert_eq!(pattern.len(), 32, "{name}: bad pattern length");
    let mut bit_mask = 0u32;
    let mut expected = 0u32;
    for (i, ch) in pattern.bytes().enumerate() {
        let bit = 1u32 << (31 - i);
        match ch {
            b'0' => bit_mask |= bit,
            b'1' => {
                bit_mask |= bit;
                expected |= bit;
            }
            _ => {}
        }
    }
    Matcher {
        name,
        bit_mask,
        expected,
        decode,
    }
}

// -- Shared decode closures --

fn dp_imm(op: DpOp) -> DecodeFn {
    Box::new(move |w| {
        Some(ArmInst::DataProcImm {
            op,
            cond: cond(w),
            s: bit(w, 20),
            n: reg(w, 16),
            d: reg(w, 12),
            rotate: bits(w, 11, 8) as Imm4,
            imm8: (w & 0xFF) as Imm8,
        })
    })
}

fn dp_reg(op: DpOp) -> DecodeFn {
    Box::new(move |w| {
        Some(ArmInst::DataProcReg {
            op,
            cond: cond(w),
            s: bit(w, 20),
            n: reg(w, 16),
            d: reg(w, 12),
            imm5: bits(w, 11, 7) as Imm5,
            shift: shift(w),
            m: reg(w, 0),
        })
    })
}

fn dp_rsr(op: DpOp) -> DecodeFn {
    Box::new(move |w| {
        Some(ArmInst::DataProcRsr {
            op,
            cond: cond(w),
            s: bit(w, 20),
            n: reg(w, 16),
            d: reg(w, 12),
            s_reg: reg(w, 8),
            shift: shift(w),
            m: reg(w, 0),
        })
    })
}

fn extend(op: ExtendOp) -> DecodeFn {
    Box::new(move |w| {
        Some(ArmInst::Extend {
            op,
            cond: cond(w),
            n: reg(w, 16),
            d: reg(w, 12),
            rotate: SignExtendRotation::from_bits(bits(w, 11, 10)),
            m: reg(w, 0),
        })
    })
}

fn parallel(set: ParallelSet, signed: bool, op: ParallelOp) -> DecodeFn {
    Box::new(move |w| {
        Some(ArmInst::Parallel {
            set,
            signed,
            op,
            cond: cond(w),
            n: reg(w, 16),
            d: reg(w, 12),
            m: reg(w, 0),
        })
    })
}

fn unit(inst: ArmInst) -> DecodeFn {
    Box::new(move |_| Some(inst))
}

fn ls_imm(f: fn(Cond, bool, bool, bool, ArmReg, ArmReg, Imm12) -> ArmInst) -> DecodeFn {
    Box::new(move |w| {
        Some(f(
            cond(w),
            bit(w, 24),
            bit(w, 23),
            bit(w, 21),
            reg(w, 16),
            reg(w, 12),
            (w & 0xFFF) as Imm12,
        ))
    })
}

fn ls_reg(
    f: fn(Cond, bool, bool, bool, ArmReg, ArmReg, Imm5, ShiftType, ArmReg) -> ArmInst,
) -> DecodeFn {
    Box::new(move |w| {
        Some(f(
            cond(w),
            bit(w, 24),
            bit(w, 23),
            bit(w, 21),
            reg(w, 16),
            reg(w, 12),
            bits(w, 11, 7) as Imm5,
            shift(w),
            reg(w, 0),
        ))
    })
}

fn ls_misc_imm(f: fn(Cond, bool, bool, bool, ArmReg, ArmReg, Imm4, Imm4) -> ArmInst) -> DecodeFn {
    Box::new(move |w| {
        Some(f(
            cond(w),
            bit(w, 24),
            bit(w, 23),
            bit(w, 21),
            reg(w, 16),
            reg(w, 12),
            bits(w, 11, 8) as Imm4,
            bits(w, 3, 0) as Imm4,
        ))
    })
}

fn ls_misc_reg(f: fn(Cond, bool, bool, bool, ArmReg, ArmReg, ArmReg) -> ArmInst) -> DecodeFn {
    Box::new(move |w| {
        Some(f(
            cond(w),
            bit(w, 24),
            bit(w, 23),
            bit(w, 21),
            reg(w, 16),
            reg(w, 12),
            reg(w, 0),
        ))
    })
}

fn build_table() -> Vec<Matcher> {
    use ArmInst::*;
    let mut t = Vec::with_capacity(200);
    let mut m = |name, pattern, decode| t.push(matcher(name, pattern, decode));

    // Branch instructions
    m("BLX (immediate)", "1111101hvvvvvvvvvvvvvvvvvvvvvvvv",
      Box::new(|w| Some(BlxImm { h: bit(w, 24), imm24: w & 0x00FF_FFFF })) as DecodeFn);
    m("BLX (register)", "cccc000100101111111111110011mmmm",
      Box::new(|w| Some(BlxReg { cond: cond(w), m: reg(w, 0) })));
    m("B", "cccc1010vvvvvvvvvvvvvvvvvvvvvvvv",
      Box::new(|w| Some(B { cond: cond(w), imm24: w & 0x00FF_FFFF })));
    m("BL", "cccc1011vvvvvvvvvvvvvvvvvvvvvvvv",
      Box::new(|w| Some(Bl { cond: cond(w), imm24: w & 0x00FF_FFFF })));
    m("BX", "cccc000100101111111111110001mmmm",
      Box::new(|w| Some(Bx { cond: cond(w), m: reg(w, 0) })));
    m("BXJ", "cccc000100101111111111110010mmmm",
      Box::new(|w| Some(Bxj { cond: cond(w), m: reg(w, 0) })));

    // Coprocessor instructions
    m("CDP2", "11111110-------------------1----", unit(Cdp));
    m("CDP", "----1110-------------------0----", unit(Cdp));
    m("LDC2", "1111110----1--------------------", unit(Ldc));
    m("LDC", "----110----1--------------------", unit(Ldc));
    m("MCR2", "----1110---0---------------1----", unit(Mcr));
    m("MCR", "----1110---0---------------1----", unit(Mcr));
    m("MCRR2", "111111000100--------------------", unit(Mcrr));
    m("MCRR", "----11000100--------------------", unit(Mcrr));
    m("MRC2", "11111110---1---------------1----", unit(Mrc));
    m("MRC", "----1110---1---------------1----", unit(Mrc));
    m("MRRC2", "111111000101--------------------", unit(Mrrc));
    m("MRRC", "----11000101--------------------", unit(Mrrc));
    m("STC2", "1111110----0--------------------", unit(Stc));
    m("STC", "----110----0--------------------", unit(Stc));

    // Data processing instructions
    m("ADC (imm)", "cccc0010101Snnnnddddrrrrvvvvvvvv", dp_imm(DpOp::Adc));
    m("ADC (reg)", "cccc0000101Snnnnddddvvvvvrr0mmmm", dp_reg(DpOp::Adc));
    m("ADC (rsr)", "cccc0000101Snnnnddddssss0rr1mmmm", dp_rsr(DpOp::Adc));
    m("ADD (imm)", "cccc0010100Snnnnddddrrrrvvvvvvvv", dp_imm(DpOp::Add));
    m("ADD (reg)", "cccc0000100Snnnnddddvvvvvrr0mmmm", dp_reg(DpOp::Add));
    m("ADD (rsr)", "cccc0000100Snnnnddddssss0rr1mmmm", dp_rsr(DpOp::Add));
    m("AND (imm)", "cccc0010000Snnnnddddrrrrvvvvvvvv", dp_imm(DpOp::And));
    m("AND (reg)", "cccc0000000Snnnnddddvvvvvrr0mmmm", dp_reg(DpOp::And));
    m("AND (rsr)", "cccc0000000Snnnnddddssss0rr1mmmm", dp_rsr(DpOp::And));
    m("BIC (imm)", "cccc0011110Snnnnddddrrrrvvvvvvvv", dp_imm(DpOp::Bic));
    m("BIC (reg)", "cccc0001110Snnnnddddvvvvvrr0mmmm", dp_reg(DpOp::Bic));
    m("BIC (rsr)", "cccc0001110Snnnnddddssss0rr1mmmm", dp_rsr(DpOp::Bic));
    m("CMN (imm)", "cccc00110111nnnn0000rrrrvvvvvvvv", dp_imm(DpOp::Cmn));
    m("CMN (reg)", "cccc00010111nnnn0000vvvvvrr0mmmm", dp_reg(DpOp::Cmn));
    m("CMN (rsr)", "cccc00010111nnnn0000ssss0rr1mmmm", dp_rsr(DpOp::Cmn));
    m("CMP (imm)", "cccc00110101nnnn0000rrrrvvvvvvvv", dp_imm(DpOp::Cmp));
    m("CMP (reg)", "cccc00010101nnnn0000vvvvvrr0mmmm", dp_reg(DpOp::Cmp));
    m("CMP (rsr)", "cccc00010101nnnn0000ssss0rr1mmmm", dp_rsr(DpOp::Cmp));
    m("EOR (imm)", "cccc0010001Snnnnddddrrrrvvvvvvvv", dp_imm(DpOp::Eor));
    m("EOR (reg)", "cccc0000001Snnnnddddvvvvvrr0mmmm", dp_reg(DpOp::Eor));
    m("EOR (rsr)", "cccc0000001Snnnnddddssss0rr1mmmm", dp_rsr(DpOp::Eor));
    m("MOV (imm)", "cccc0011101S0000ddddrrrrvvvvvvvv", dp_imm(DpOp::Mov));
    m("MOV (reg)", "cccc0001101S0000ddddvvvvvrr0mmmm", dp_reg(DpOp::Mov));
    m("MOV (rsr)", "cccc0001101S0000ddddssss0rr1mmmm", dp_rsr(DpOp::Mov));
    m("MVN (imm)", "cccc0011111S0000ddddrrrrvvvvvvvv", dp_imm(DpOp::Mvn));
    m("MVN (reg)", "cccc0001111S0000ddddvvvvvrr0mmmm", dp_reg(DpOp::Mvn));
    m("MVN (rsr)", "cccc0001111S0000ddddssss0rr1mmmm", dp_rsr(DpOp::Mvn));
    m("ORR (imm)", "cccc0011100Snnnnddddrrrrvvvvvvvv", dp_imm(DpOp::Orr));
    m("ORR (reg)", "cccc0001100Snnnnddddvvvvvrr0mmmm", dp_reg(DpOp::Orr));
    m("ORR (rsr)", "cccc0001100Snnnnddddssss0rr1mmmm", dp_rsr(DpOp::Orr));
    m("RSB (imm)", "cccc0010011Snnnnddddrrrrvvvvvvvv", dp_imm(DpOp::Rsb));
    m("RSB (reg)", "cccc0000011Snnnnddddvvvvvrr0mmmm", dp_reg(DpOp::Rsb));
    m("RSB (rsr)", "cccc0000011Snnnnddddssss0rr1mmmm", dp_rsr(DpOp::Rsb));
    m("RSC (imm)", "cccc0010111Snnnnddddrrrrvvvvvvvv", dp_imm(DpOp::Rsc));
    m("RSC (reg)", "cccc0000111Snnnnddddvvvvvrr0mmmm", dp_reg(DpOp::Rsc));
    m("RSC (rsr)", "cccc0000111Snnnnddddssss0rr1mmmm", dp_rsr(DpOp::Rsc));
    m("SBC (imm)", "cccc0010110Snnnnddddrrrrvvvvvvvv", dp_imm(DpOp::Sbc));
    m("SBC (reg)", "cccc0000110Snnnnddddvvvvvrr0mmmm", dp_reg(DpOp::Sbc));
    m("SBC (rsr)", "cccc0000110Snnnnddddssss0rr1mmmm", dp_rsr(DpOp::Sbc));
    m("SUB (imm)", "cccc0010010Snnnnddddrrrrvvvvvvvv", dp_imm(DpOp::Sub));
    m("SUB (reg)", "cccc0000010Snnnnddddvvvvvrr0mmmm", dp_reg(DpOp::Sub));
    m("SUB (rsr)", "cccc0000010Snnnnddddssss0rr1mmmm", dp_rsr(DpOp::Sub));
    m("TEQ (imm)", "cccc00110011nnnn0000rrrrvvvvvvvv", dp_imm(DpOp::Teq));
    m("TEQ (reg)", "cccc00010011nnnn0000vvvvvrr0mmmm", dp_reg(DpOp::Teq));
    m("TEQ (rsr)", "cccc00010011nnnn0000ssss0rr1mmmm", dp_rsr(DpOp::Teq));
    m("TST (imm)", "cccc00110001nnnn0000rrrrvvvvvvvv", dp_imm(DpOp::Tst));
    m("TST (reg)", "cccc00010001nnnn0000vvvvvrr0mmmm", dp_reg(DpOp::Tst));
    m("TST (rsr)", "cccc00010001nnnn0000ssss0rr1mmmm", dp_rsr(DpOp::Tst));

    // Exception generating instructions
    m("BKPT", "----00010010------------0111----",
      Box::new(|w| Some(Bkpt {
          cond: cond(w),
          imm12: bits(w, 19, 8) as Imm12,
          imm4: bits(w, 3, 0) as Imm4,
      })));
    m("SVC", "----1111------------------------",
      Box::new(|w| Some(Svc { cond: cond(w), imm24: w & 0x00FF_FFFF })));
    m("UDF", "111001111111------------1111----", unit(Udf));

    // Extension instructions
    m("SXTB", "----011010101111------000111----", extend(ExtendOp::Sxtb));
    m("SXTB16", "----011010001111------000111----", extend(ExtendOp::Sxtb16));
    m("SXTH", "----011010111111------000111----", extend(ExtendOp::Sxth));
    m("SXTAB", "----01101010----------000111----", extend(ExtendOp::Sxtab));
    m("SXTAB16", "----01101000----------000111----", extend(ExtendOp::Sxtab16));
    m("SXTAH", "----01101011----------000111----", extend(ExtendOp::Sxtah));
    m("UXTB", "----011011101111------000111----", extend(ExtendOp::Uxtb));
    m("UXTB16", "----011011001111------000111----", extend(ExtendOp::Uxtb16));
    m("UXTH", "----011011111111------000111----", extend(ExtendOp::Uxth));
    m("UXTAB", "----01101110----------000111----", extend(ExtendOp::Uxtab));
    m("UXTAB16", "----01101100----------000111----", extend(ExtendOp::Uxtab16));
    m("UXTAH", "----01101111----------000111----", extend(ExtendOp::Uxtah));

    // Hint instructions
    m("PLD", "111101---101----1111------------", unit(Pld));
    m("SEV", "----0011001000001111000000000100", unit(Sev));
    m("WFE", "----0011001000001111000000000010", unit(Wfe));
    m("WFI", "----0011001000001111000000000011", unit(Wfi));
    m("YIELD", "----0011001000001111000000000001", unit(Yield));

    // Synchronization primitive instructions
    m("CLREX", "11110101011111111111000000011111", unit(Clrex));
    m("LDREX", "----00011001--------111110011111",
      Box::new(|w| Some(Ldrex { cond: cond(w), n: reg(w, 16), d: reg(w, 12) })));
    m("LDREXB", "----00011101--------111110011111",
      Box::new(|w| Some(Ldrexb { cond: cond(w), n: reg(w, 16), d: reg(w, 12) })));
    m("LDREXD", "----00011011--------111110011111",
      Box::new(|w| Some(Ldrexd { cond: cond(w), n: reg(w, 16), d: reg(w, 12) })));
    m("LDREXH", "----00011111--------111110011111",
      Box::new(|w| Some(Ldrexh { cond: cond(w), n: reg(w, 16), d: reg(w, 12) })));
    m("STREX", "----00011000--------11111001----",
      Box::new(|w| Some(Strex { cond: cond(w), n: reg(w, 16), d: reg(w, 12), m: reg(w, 0) })));
    m("STREXB", "----00011100--------11111001----",
      Box::new(|w| Some(Strexb { cond: cond(w), n: reg(w, 16), d: reg(w, 12), m: reg(w, 0) })));
    m("STREXD", "----00011010--------11111001----",
      Box::new(|w| Some(Strexd { cond: cond(w), n: reg(w, 16), d: reg(w, 12), m: reg(w, 0) })));
    m("STREXH", "----00011110--------11111001----",
      Box::new(|w| Some(Strexh { cond: cond(w), n: reg(w, 16), d: reg(w, 12), m: reg(w, 0) })));
    m("SWP", "----00010-00--------00001001----",
      Box::new(|w| {
          let (c, n, d, mm) = (cond(w), reg(w, 16), reg(w, 12), reg(w, 0));
          Some(if bit(w, 22) {
              Swpb { cond: c, n, d, m: mm }
          } else {
              Swp { cond: c, n, d, m: mm }
          })
      }));

    // Load/store instructions
    m("LDR (imm)", "cccc010pu0w1nnnnddddvvvvvvvvvvvv",
      ls_imm(|cond, p, u, w, n, d, imm12| LdrImm { cond, p, u, w, n, d, imm12 }));
    m("LDR (reg)", "cccc011pu0w1nnnnddddvvvvvrr0mmmm",
      ls_reg(|cond, p, u, w, n, d, imm5, shift, m| LdrReg { cond, p, u, w, n, d, imm5, shift, m }));
    m("LDRB (imm)", "cccc010pu1w1nnnnddddvvvvvvvvvvvv",
      ls_imm(|cond, p, u, w, n, d, imm12| LdrbImm { cond, p, u, w, n, d, imm12 }));
    m("LDRB (reg)", "cccc011pu1w1nnnnddddvvvvvrr0mmmm",
      ls_reg(|cond, p, u, w, n, d, imm5, shift, m| LdrbReg { cond, p, u, w, n, d, imm5, shift, m }));
    m("LDRBT (A1)", "----0100-111--------------------", unit(Ldrbt));
    m("LDRBT (A2)", "----0110-111---------------0----", unit(Ldrbt));
    m("LDRD (imm)", "cccc000pu1w0nnnnddddvvvv1101vvvv",
      ls_misc_imm(|cond, p, u, w, n, d, imm8a, imm8b| LdrdImm { cond, p, u, w, n, d, imm8a, imm8b }));
    m("LDRD (reg)", "cccc000pu0w0nnnndddd00001101mmmm",
      ls_misc_reg(|cond, p, u, w, n, d, m| LdrdReg { cond, p, u, w, n, d, m }));
    m("LDRH (imm)", "cccc000pu1w1nnnnddddvvvv1011vvvv",
      ls_misc_imm(|cond, p, u, w, n, d, imm8a, imm8b| LdrhImm { cond, p, u, w, n, d, imm8a, imm8b }));
    m("LDRH (reg)", "cccc000pu0w1nnnndddd00001011mmmm",
      ls_misc_reg(|cond, p, u, w, n, d, m| LdrhReg { cond, p, u, w, n, d, m }));
    m("LDRHT (A1)", "----0000-111------------1011----", unit(Ldrht));
    m("LDRHT (A2)", "----0000-011--------00001011----", unit(Ldrht));
    m("LDRSB (imm)", "cccc000pu1w1nnnnddddvvvv1101vvvv",
      ls_misc_imm(|cond, p, u, w, n, d, imm8a, imm8b| LdrsbImm { cond, p, u, w, n, d, imm8a, imm8b }));
    m("LDRSB (reg)", "cccc000pu0w1nnnndddd00001101mmmm",
      ls_misc_reg(|cond, p, u, w, n, d, m| LdrsbReg { cond, p, u, w, n, d, m }));
    m("LDRSBT (A1)", "----0000-111------------1101----", unit(Ldrsbt));
    m("LDRSBT (A2)", "----0000-011--------00001101----", unit(Ldrsbt));
    m("LDRSH (imm)", "cccc000pu1w1nnnnddddvvvv1111vvvv",
      ls_misc_imm(|cond, p, u, w, n, d, imm8a, imm8b| LdrshImm { cond, p, u, w, n, d, imm8a, imm8b }));
    m("LDRSH (reg)", "cccc000pu0w1nnnndddd00001111mmmm",
      ls_misc_reg(|cond, p, u, w, n, d, m| LdrshReg { cond, p, u, w, n, d, m }));
    m("LDRSHT (A1)", "----0000-111------------1111----", unit(Ldrsht));
    m("LDRSHT (A2)", "----0000-011--------00001111----", unit(Ldrsht));
    m("LDRT (A1)", "----0100-011--------------------", unit(Ldrt));
    m("LDRT (A2)", "----0110-011---------------0----", unit(Ldrt));
    m("STR (imm)", "cccc010pu0w0nnnnddddvvvvvvvvvvvv",
      ls_imm(|cond, p, u, w, n, d, imm12| StrImm { cond, p, u, w, n, d, imm12 }));
    m("STR (reg)", "cccc011pu0w0nnnnddddvvvvvrr0mmmm",
      ls_reg(|cond, p, u, w, n, d, imm5, shift, m| StrReg { cond, p, u, w, n, d, imm5, shift, m }));
    m("STRB (imm)", "cccc010pu1w0nnnnddddvvvvvvvvvvvv",
      ls_imm(|cond, p, u, w, n, d, imm12| StrbImm { cond, p, u, w, n, d, imm12 }));
    m("STRB (reg)", "cccc011pu1w0nnnnddddvvvvvrr0mmmm",
      ls_reg(|cond, p, u, w, n, d, imm5, shift, m| StrbReg { cond, p, u, w, n, d, imm5, shift, m }));
    m("STRBT (A1)", "----0100-110--------------------", unit(Strbt));
    m("STRBT (A2)", "----0110-110---------------0----", unit(Strbt));
    m("STRD (imm)", "cccc000pu1w0nnnnddddvvvv1111vvvv",
      ls_misc_imm(|cond, p, u, w, n, d, imm8a, imm8b| StrdImm { cond, p, u, w, n, d, imm8a, imm8b }));
    m("STRD (reg)", "cccc000pu0w0nnnndddd00001111mmmm",
      ls_misc_reg(|cond, p, u, w, n, d, m| StrdReg { cond, p, u, w, n, d, m }));
    m("STRH (imm)", "cccc000pu1w0nnnnddddvvvv1011vvvv",
      ls_misc_imm(|cond, p, u, w, n, d, imm8a, imm8b| StrhImm { cond, p, u, w, n, d, imm8a, imm8b }));
    m("STRH (reg)", "cccc000pu0w0nnnndddd00001011mmmm",
      ls_misc_reg(|cond, p, u, w, n, d, m| StrhReg { cond, p, u, w, n, d, m }));
    m("STRHT (A1)", "----0000-110------------1011----", unit(Strht));
    m("STRHT (A2)", "----0000-010--------00001011----", unit(Strht));
    m("STRT (A1)", "----0100-010--------------------", unit(Strt));
    m("STRT (A2)", "----0110-010---------------0----", unit(Strt));

    // Load/store multiple instructions
    m("LDM", "cccc100pu0w1nnnnxxxxxxxxxxxxxxxx",
      Box::new(|w| Some(Ldm {
          cond: cond(w),
          p: bit(w, 24),
          u: bit(w, 23),
          w: bit(w, 21),
          n: reg(w, 16),
          list: (w & 0xFFFF) as RegList,
      })));
    m("LDM (usr reg)", "----100--101--------------------", unit(LdmUsr));
    m("LDM (exce ret)", "----100--1-1----1---------------", unit(LdmEret));
    m("STM", "cccc100pu0w0nnnnxxxxxxxxxxxxxxxx",
      Box::new(|w| Some(Stm {
          cond: cond(w),
          p: bit(w, 24),
          u: bit(w, 23),
          w: bit(w, 21),
          n: reg(w, 16),
          list: (w & 0xFFFF) as RegList,
      })));
    m("STM (usr reg)", "----100--100--------------------", unit(StmUsr));

    // Miscellaneous instructions
    m("CLZ", "----000101101111----11110001----",
      Box::new(|w| Some(Clz { cond: cond(w), d: reg(w, 12), m: reg(w, 0) })));
    m("NOP", "----001100100000111100000000----", unit(Nop));
    m("SEL", "----01101000--------11111011----",
      Box::new(|w| Some(Sel { cond: cond(w), n: reg(w, 16), d: reg(w, 12), m: reg(w, 0) })));

    // Unsigned sum of absolute differences instructions
    m("USAD8", "----01111000----1111----0001----",
      Box::new(|w| Some(Usad8 { cond: cond(w), d: reg(w, 16), m: reg(w, 8), n: reg(w, 0) })));
    m("USADA8", "----01111000------------0001----",
      Box::new(|w| Some(Usada8 {
          cond: cond(w),
          d: reg(w, 16),
          a: reg(w, 12),
          m: reg(w, 8),
          n: reg(w, 0),
      })));

    // Packing instructions
    m("PKHBT", "cccc01101000nnnnddddvvvvv001mmmm",
      Box::new(|w| Some(Pkhbt {
          cond: cond(w),
          n: reg(w, 16),
          d: reg(w, 12),
          imm5: bits(w, 11, 7) as Imm5,
          m: reg(w, 0),
      })));
    m("PKHTB", "cccc01101000nnnnddddvvvvv101mmmm",
      Box::new(|w| Some(Pkhtb {
          cond: cond(w),
          n: reg(w, 16),
          d: reg(w, 12),
          imm5: bits(w, 11, 7) as Imm5,
          m: reg(w, 0),
      })));

    // Reversal instructions
    m("REV", "----011010111111----11110011----",
      Box::new(|w| Some(Rev { cond: cond(w), d: reg(w, 12), m: reg(w, 0) })));
    m("REV16", "----011010111111----11111011----",
      Box::new(|w| Some(Rev16 { cond: cond(w), d: reg(w, 12), m: reg(w, 0) })));
    m("REVSH", "----011011111111----11111011----",
      Box::new(|w| Some(Revsh { cond: cond(w), d: reg(w, 12), m: reg(w, 0) })));

    // Saturation instructions
    m("SSAT", "----0110101---------------01----",
      Box::new(|w| Some(Ssat {
          cond: cond(w),
          sat_imm: bits(w, 20, 16) as Imm5,
          d: reg(w, 12),
          imm5: bits(w, 11, 7) as Imm5,
          sh: bit(w, 6),
          n: reg(w, 0),
      })));
    m("SSAT16", "----01101010--------11110011----",
      Box::new(|w| Some(Ssat16 {
          cond: cond(w),
          sat_imm: bits(w, 19, 16) as Imm4,
          d: reg(w, 12),
          n: reg(w, 0),
      })));
    m("USAT", "----0110111---------------01----",
      Box::new(|w| Some(Usat {
          cond: cond(w),
          sat_imm: bits(w, 20, 16) as Imm5,
          d: reg(w, 12),
          imm5: bits(w, 11, 7) as Imm5,
          sh: bit(w, 6),
          n: reg(w, 0),
      })));
    m("USAT16", "----01101110--------11110011----",
      Box::new(|w| Some(Usat16 {
          cond: cond(w),
          sat_imm: bits(w, 19, 16) as Imm4,
          d: reg(w, 12),
          n: reg(w, 0),
      })));

    // Multiply (normal) instructions. Rd == PC is UNPREDICTABLE and
    // decodes as undefined.
    m("MLA", "----0000001-------------1001----",
      Box::new(|w| {
          let d = reg(w, 16);
          if d == ArmReg::PC {
              return None;
          }
          Some(Mla { cond: cond(w), s: bit(w, 20), d, a: reg(w, 12), m: reg(w, 8), n: reg(w, 0) })
      }));
    m("MUL", "----0000000-----0000----1001----",
      Box::new(|w| {
          let d = reg(w, 16);
          if d == ArmReg::PC {
              return None;
          }
          Some(Mul { cond: cond(w), s: bit(w, 20), d, m: reg(w, 8), n: reg(w, 0) })
      }));

    // Multiply (long) instructions
    m("SMLAL", "----0000111-------------1001----",
      Box::new(|w| mul_long(w, |c, s, hi, lo, m, n| Smlal { cond: c, s, d_hi: hi, d_lo: lo, m, n })));
    m("SMULL", "----0000110-------------1001----",
      Box::new(|w| mul_long(w, |c, s, hi, lo, m, n| Smull { cond: c, s, d_hi: hi, d_lo: lo, m, n })));
    m("UMAAL", "----00000100------------1001----",
      Box::new(|w| mul_long(w, |c, _s, hi, lo, m, n| Umaal { cond: c, d_hi: hi, d_lo: lo, m, n })));
    m("UMLAL", "----0000101-------------1001----",
      Box::new(|w| mul_long(w, |c, s, hi, lo, m, n| Umlal { cond: c, s, d_hi: hi, d_lo: lo, m, n })));
    m("UMULL", "----0000100-------------1001----",
      Box::new(|w| mul_long(w, |c, s, hi, lo, m, n| Umull { cond: c, s, d_hi: hi, d_lo: lo, m, n })));

    // Multiply (halfword) instructions
    m("SMLALXY", "----00010100------------1--0----",
      Box::new(|w| mul_long(w, |c, _s, hi, lo, m, n| Smlalxy {
          cond: c, d_hi: hi, d_lo: lo, m, m_hi: bit(w, 6), n_hi: bit(w, 5), n,
      })));
    m("SMLAXY", "----00010000------------1--0----",
      Box::new(|w| {
          let d = reg(w, 16);
          if d == ArmReg::PC {
              return None;
          }
          Some(Smlaxy {
              cond: cond(w),
              d,
              a: reg(w, 12),
              m: reg(w, 8),
              m_hi: bit(w, 6),
              n_hi: bit(w, 5),
              n: reg(w, 0),
          })
      }));
    m("SMULXY", "----00010110----0000----1--0----",
      Box::new(|w| {
          let d = reg(w, 16);
          if d == ArmReg::PC {
              return None;
          }
          Some(Smulxy {
              cond: cond(w),
              d,
              m: reg(w, 8),
              m_hi: bit(w, 6),
              n_hi: bit(w, 5),
              n: reg(w, 0),
          })
      }));

    // Multiply (word by halfword) instructions
    m("SMLAWY", "----00010010------------1-00----",
      Box::new(|w| {
          let d = reg(w, 16);
          if d == ArmReg::PC {
              return None;
          }
          Some(Smlawy { cond: cond(w), d, a: reg(w, 12), m: reg(w, 8), m_hi: bit(w, 6), n: reg(w, 0) })
      }));
    m("SMULWY", "----00010010----0000----1-10----",
      Box::new(|w| {
          let d = reg(w, 16);
          if d == ArmReg::PC {
              return None;
          }
          Some(Smulwy { cond: cond(w), d, m: reg(w, 8), m_hi: bit(w, 6), n: reg(w, 0) })
      }));

    // Multiply (most significant word) instructions
    m("SMMUL", "----01110101----1111----00-1----",
      Box::new(|w| {
          let d = reg(w, 16);
          if d == ArmReg::PC {
              return None;
          }
          Some(Smmul { cond: cond(w), d, m: reg(w, 8), round: bit(w, 5), n: reg(w, 0) })
      }));
    m("SMMLA", "----01110101------------00-1----",
      Box::new(|w| {
          let d = reg(w, 16);
          if d == ArmReg::PC {
              return None;
          }
          Some(Smmla { cond: cond(w), d, a: reg(w, 12), m: reg(w, 8), round: bit(w, 5), n: reg(w, 0) })
      }));
    m("SMMLS", "----01110101------------11-1----",
      Box::new(|w| {
          let d = reg(w, 16);
          if d == ArmReg::PC {
              return None;
          }
          Some(Smmls { cond: cond(w), d, a: reg(w, 12), m: reg(w, 8), round: bit(w, 5), n: reg(w, 0) })
      }));

    // Multiply (dual) instructions
    m("SMLAD", "----01110000------------00-1----",
      Box::new(|w| {
          let d = reg(w, 16);
          if d == ArmReg::PC {
              return None;
          }
          Some(Smlad { cond: cond(w), d, a: reg(w, 12), m: reg(w, 8), m_swap: bit(w, 5), n: reg(w, 0) })
      }));
    m("SMLALD", "----01110100------------00-1----",
      Box::new(|w| mul_long(w, |c, _s, hi, lo, m, n| Smlald {
          cond: c, d_hi: hi, d_lo: lo, m, m_swap: bit(w, 5), n,
      })));
    m("SMLSD", "----01110000------------01-1----",
      Box::new(|w| {
          let d = reg(w, 16);
          if d == ArmReg::PC {
              return None;
          }
          Some(Smlsd { cond: cond(w), d, a: reg(w, 12), m: reg(w, 8), m_swap: bit(w, 5), n: reg(w, 0) })
      }));
    m("SMLSLD", "----01110100------------01-1----",
      Box::new(|w| mul_long(w, |c, _s, hi, lo, m, n| Smlsld {
          cond: c, d_hi: hi, d_lo: lo, m, m_swap: bit(w, 5), n,
      })));
    m("SMUAD", "----01110000----1111----00-1----",
      Box::new(|w| {
          let d = reg(w, 16);
          if d == ArmReg::PC {
              return None;
          }
          Some(Smuad { cond: cond(w), d, m: reg(w, 8), m_swap: bit(w, 5), n: reg(w, 0) })
      }));
    m("SMUSD", "----01110000----1111----01-1----",
      Box::new(|w| {
          let d = reg(w, 16);
          if d == ArmReg::PC {
              return None;
          }
          Some(Smusd { cond: cond(w), d, m: reg(w, 8), m_swap: bit(w, 5), n: reg(w, 0) })
      }));

    // Parallel add/subtract (modulo) instructions
    m("SADD8", "----01100001--------11111001----", parallel(ParallelSet::Modulo, true, ParallelOp::Add8));
    m("SADD16", "----01100001--------11110001----", parallel(ParallelSet::Modulo, true, ParallelOp::Add16));
    m("SASX", "----01100001--------11110011----", parallel(ParallelSet::Modulo, true, ParallelOp::Asx));
    m("SSAX", "----01100001--------11110101----", parallel(ParallelSet::Modulo, true, ParallelOp::Sax));
    m("SSUB8", "----01100001--------11111111----", parallel(ParallelSet::Modulo, true, ParallelOp::Sub8));
    m("SSUB16", "----01100001--------11110111----", parallel(ParallelSet::Modulo, true, ParallelOp::Sub16));
    m("UADD8", "----01100101--------11111001----", parallel(ParallelSet::Modulo, false, ParallelOp::Add8));
    m("UADD16", "----01100101--------11110001----", parallel(ParallelSet::Modulo, false, ParallelOp::Add16));
    m("UASX", "----01100101--------11110011----", parallel(ParallelSet::Modulo, false, ParallelOp::Asx));
    m("USAX", "----01100101--------11110101----", parallel(ParallelSet::Modulo, false, ParallelOp::Sax));
    m("USUB8", "----01100101--------11111111----", parallel(ParallelSet::Modulo, false, ParallelOp::Sub8));
    m("USUB16", "----01100101--------11110111----", parallel(ParallelSet::Modulo, false, ParallelOp::Sub16));

    // Parallel add/subtract (saturating) instructions
    m("QADD8", "----01100010--------11111001----", parallel(ParallelSet::Saturating, true, ParallelOp::Add8));
    m("QADD16", "----01100010--------11110001----", parallel(ParallelSet::Saturating, true, ParallelOp::Add16));
    m("QASX", "----01100010--------11110011----", parallel(ParallelSet::Saturating, true, ParallelOp::Asx));
    m("QSAX", "----01100010--------11110101----", parallel(ParallelSet::Saturating, true, ParallelOp::Sax));
    m("QSUB8", "----01100010--------11111111----", parallel(ParallelSet::Saturating, true, ParallelOp::Sub8));
    m("QSUB16", "----01100010--------11110111----", parallel(ParallelSet::Saturating, true, ParallelOp::Sub16));
    m("UQADD8", "----01100110--------11111001----", parallel(ParallelSet::Saturating, false, ParallelOp::Add8));
    m("UQADD16", "----01100110--------11110001----", parallel(ParallelSet::Saturating, false, ParallelOp::Add16));
    m("UQASX", "----01100110--------11110011----", parallel(ParallelSet::Saturating, false, ParallelOp::Asx));
    m("UQSAX", "----01100110--------11110101----", parallel(ParallelSet::Saturating, false, ParallelOp::Sax));
    m("UQSUB8", "----01100110--------11111111----", parallel(ParallelSet::Saturating, false, ParallelOp::Sub8));
    m("UQSUB16", "----01100110--------11110111----", parallel(ParallelSet::Saturating, false, ParallelOp::Sub16));

    // Parallel add/subtract (halving) instructions
    m("SHADD8", "----01100011--------11111001----", parallel(ParallelSet::Halving, true, ParallelOp::Add8));
    m("SHADD16", "----01100011--------11110001----", parallel(ParallelSet::Halving, true, ParallelOp::Add16));
    m("SHASX", "----01100011--------11110011----", parallel(ParallelSet::Halving, true, ParallelOp::Asx));
    m("SHSAX", "----01100011--------11110101----", parallel(ParallelSet::Halving, true, ParallelOp::Sax));
    m("SHSUB8", "----01100011--------11111111----", parallel(ParallelSet::Halving, true, ParallelOp::Sub8));
    m("SHSUB16", "----01100011--------11110111----", parallel(ParallelSet::Halving, true, ParallelOp::Sub16));
    m("UHADD8", "----01100111--------11111001----", parallel(ParallelSet::Halving, false, ParallelOp::Add8));
    m("UHADD16", "----01100111--------11110001----", parallel(ParallelSet::Halving, false, ParallelOp::Add16));
    m("UHASX", "----01100111--------11110011----", parallel(ParallelSet::Halving, false, ParallelOp::Asx));
    m("UHSAX", "----01100111--------11110101----", parallel(ParallelSet::Halving, false, ParallelOp::Sax));
    m("UHSUB8", "----01100111--------11111111----", parallel(ParallelSet::Halving, false, ParallelOp::Sub8));
    m("UHSUB16", "----01100111--------11110111----", parallel(ParallelSet::Halving, false, ParallelOp::Sub16));

    // Saturated add/subtract instructions
    m("QADD", "----00010000--------00000101----",
      Box::new(|w| Some(Qadd { cond: cond(w), n: reg(w, 16), d: reg(w, 12), m: reg(w, 0) })));
    m("QSUB", "----00010010--------00000101----",
      Box::new(|w| Some(Qsub { cond: cond(w), n: reg(w, 16), d: reg(w, 12), m: reg(w, 0) })));
    m("QDADD", "----00010100--------00000101----",
      Box::new(|w| Some(Qdadd { cond: cond(w), n: reg(w, 16), d: reg(w, 12), m: reg(w, 0) })));
    m("QDSUB", "----00010110--------00000101----",
      Box::new(|w| Some(Qdsub { cond: cond(w), n: reg(w, 16), d: reg(w, 12), m: reg(w, 0) })));

    // Status register access instructions
    m("CPS", "111100010000---00000000---0-----", unit(Cps));
    m("SETEND", "1111000100000001000000e000000000",
      Box::new(|w| Some(Setend { e: bit(w, 9) })));
    m("MRS", "----00010-00--------00--00000000", unit(Mrs));
    m("MSR", "----00-10-10----1111------------", unit(Msr));
    m("RFE", "----0001101-0000---------110----", unit(Rfe));
    m("SRS", "0000011--0-00000000000000001----", unit(Srs));

    t
}

// Long-multiply operand shape: RdHi at 19:16, RdLo at 15:12, Rm at
// 11:8, Rn at 3:0. Either destination being PC is UNPREDICTABLE and
// decodes as undefined.
fn mul_long(
    w: u32,
    f: impl FnOnce(Cond, bool, ArmReg, ArmReg, ArmReg, ArmReg) -> ArmInst,
) -> Option<ArmInst> {
    let d_hi = reg(w, 16);
    let d_lo = reg(w, 12);
    if d_hi == ArmReg::PC || d_lo == ArmReg::PC {
        return None;
    }
    Some(f(cond(w), bit(w, 20), d_hi, d_lo, reg(w, 8), reg(w, 0)))
}

static DECODE_TABLE: OnceLock<Vec<Matcher>> = OnceLock::new();

fn table() -> &'static [Matcher] {
    DECODE_TABLE.get_or_init(build_table)
}

/// Number of `decode_arm` invocations since process start. Relaxed;
/// intended for instrumentation and tests only.
static DECODE_CALLS: AtomicU64 = AtomicU64::new(0);

pub fn decode_call_count() -> u64 {
    DECODE_CALLS.load(Ordering::Relaxed)
}

/// Classify a 32-bit ARM word.
///
/// Returns the decoded operand bundle, or `None` for undefined and
/// UNPREDICTABLE encodings; the caller falls back to the interpreter.
pub fn decode_arm(word: u32) -> Option<ArmInst> {
    DECODE_CALLS.fetch_add(1, Ordering::Relaxed);
    table()
        .iter()
        .find(|entry| entry.matches(word))
        .and_then(|entry| (entry.decode)(word))
}

/// Name of the table entry a word matches, for diagnostics.
pub fn decode_arm_name(word: u32) -> Option<&'static str> {
    table()
        .iter()
        .find(|entry| entry.matches(word))
        .map(|entry| entry.name)
}
