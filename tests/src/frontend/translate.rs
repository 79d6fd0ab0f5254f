//! Translator tests — feed encoded programs through `translate` and
//! check the produced micro-blocks instruction by instruction.

use armjit_core::{
    ArmFlags, ArmReg, Cond, LocationDescriptor, MicroBlock, MicroOp, MicroTerminal, ValueData,
};
use armjit_frontend::translate;

use crate::support::TestMemory;

fn loc(pc: u32) -> LocationDescriptor {
    LocationDescriptor::new(pc, false, false)
}

fn translate_at(pc: u32, program: &[u32]) -> MicroBlock {
    let mem = TestMemory::with_program(pc, program);
    translate(loc(pc), &mem)
}

fn ops_of(block: &MicroBlock) -> Vec<MicroOp> {
    block
        .instructions()
        .iter()
        .map(|&id| block.value(id).op())
        .collect()
}

#[test]
fn unconditional_branch_is_a_static_link() {
    // b +8 at pc 0 lands on 16 (PC reads as 8).
    let block = translate_at(0, &[0xEA00_0002]);
    assert!(block.instructions().is_empty());
    assert_eq!(
        block.terminal,
        MicroTerminal::LinkBlock { next: loc(16) }
    );
    assert_eq!(block.cycles_consumed, 1);
}

#[test]
fn undefined_word_falls_back_to_the_interpreter() {
    let block = translate_at(0, &[0xF7FF_FFFF]);
    assert!(block.instructions().is_empty());
    assert_eq!(block.terminal, MicroTerminal::Interpret { next: loc(0) });
    assert_eq!(block.cycles_consumed, 1);
}

#[test]
fn condition_mismatch_re_dispatches() {
    // moveq r0, r1 under an AL residual: zero-instruction block
    // linking to the same PC with the condition overridden.
    let block = translate_at(0, &[0x01A0_0001]);
    assert!(block.instructions().is_empty());
    assert_eq!(
        block.terminal,
        MicroTerminal::LinkBlock {
            next: loc(0).with_cond(Cond::EQ)
        }
    );
    assert_eq!(block.cycles_consumed, 0);
}

#[test]
fn adds_block_shape() {
    // adds r1, r2, #3; b .
    // The flag write forces the branch into its own block, so this
    // one carries the ALU work and links to the branch.
    let block = translate_at(0, &[0xE292_1003, 0xEAFF_FFFE]);
    assert_eq!(
        ops_of(&block),
        vec![
            MicroOp::GetGpr,
            MicroOp::ConstU32,
            MicroOp::Add,
            MicroOp::SetGpr
        ]
    );

    let ids = block.instructions();
    assert_eq!(*block.value(ids[0]).data(), ValueData::GetGpr(ArmReg::new(2)));
    assert_eq!(*block.value(ids[1]).data(), ValueData::ConstU32(3));
    assert_eq!(block.value(ids[2]).write_flags(), ArmFlags::NZCV);
    match block.value(ids[3]).data() {
        ValueData::SetGpr(reg, arg) => {
            assert_eq!(*reg, ArmReg::new(1));
            assert_eq!(*arg, ids[2]);
        }
        other => panic!("expected a SetGpr, got {other:?}"),
    }

    assert_eq!(block.terminal, MicroTerminal::LinkBlock { next: loc(4) });
    assert_eq!(block.cycles_consumed, 1);
}

#[test]
fn flag_free_instructions_chain_in_one_block() {
    // add r1, r2, #3; add r3, r4, #5; b .
    let block = translate_at(0, &[0xE282_1003, 0xE284_3005, 0xEAFF_FFFE]);
    assert_eq!(
        ops_of(&block),
        vec![
            MicroOp::GetGpr,
            MicroOp::ConstU32,
            MicroOp::Add,
            MicroOp::GetGpr,
            MicroOp::ConstU32,
            MicroOp::Add,
            MicroOp::SetGpr,
            MicroOp::SetGpr,
        ]
    );
    // The branch at 8 was translated too, and targets itself.
    assert_eq!(block.terminal, MicroTerminal::LinkBlock { next: loc(8) });
    assert_eq!(block.cycles_consumed, 3);
}

#[test]
fn page_boundary_ends_the_block() {
    // Two translatable adds straddling 0x1000: translation stops at
    // the boundary even though more would decode.
    let block = translate_at(0xFF8, &[0xE282_1003, 0xE284_3005, 0xE282_1003]);
    assert_eq!(
        block.terminal,
        MicroTerminal::LinkBlock { next: loc(0x1000) }
    );
    assert_eq!(block.cycles_consumed, 2);
}

#[test]
fn pc_reads_resolve_to_pc_plus_8() {
    // add r0, pc, #0 — the Rn read materialises as the constant 8.
    let block = translate_at(0, &[0xE28F_0000, 0xEAFF_FFFE]);
    let ids = block.instructions();
    assert_eq!(*block.value(ids[0]).data(), ValueData::ConstU32(8));
    assert_eq!(*block.value(ids[1]).data(), ValueData::ConstU32(0));
    assert_eq!(block.value(ids[2]).op(), MicroOp::Add);
}

#[test]
fn cross_register_move_is_flushed() {
    // mov r0, r1; b .
    let block = translate_at(0, &[0xE1A0_0001, 0xEAFF_FFFE]);
    assert_eq!(ops_of(&block), vec![MicroOp::GetGpr, MicroOp::SetGpr]);
    let ids = block.instructions();
    match block.value(ids[1]).data() {
        ValueData::SetGpr(reg, arg) => {
            assert_eq!(*reg, ArmReg::new(0));
            assert_eq!(*arg, ids[0]);
        }
        other => panic!("expected a SetGpr, got {other:?}"),
    }
}

#[test]
fn identity_move_is_not_flushed() {
    // mov r1, r1; b . — the slot still holds its own GetGpr.
    let block = translate_at(0, &[0xE1A0_1001, 0xEAFF_FFFE]);
    assert_eq!(ops_of(&block), vec![MicroOp::GetGpr]);
}

#[test]
fn compare_sets_flags_without_a_writeback() {
    // cmp r1, #5
    let block = translate_at(0, &[0xE351_0005]);
    assert_eq!(
        ops_of(&block),
        vec![MicroOp::GetGpr, MicroOp::ConstU32, MicroOp::Sub]
    );
    let sub = block.instructions()[2];
    assert_eq!(block.value(sub).write_flags(), ArmFlags::NZCV);
}

#[test]
fn register_branch_returns_to_dispatch() {
    // bx lr
    let block = translate_at(0, &[0xE12F_FF1E]);
    assert_eq!(ops_of(&block), vec![MicroOp::GetGpr, MicroOp::BxWritePc]);
    assert_eq!(block.terminal, MicroTerminal::ReturnToDispatch);
}

#[test]
fn bx_pc_is_a_static_link() {
    // bx pc reads the constant 8, so the exchange resolves at
    // translation time (and stays in ARM state). The constant node
    // is left behind, unused.
    let block = translate_at(0, &[0xE12F_FF1F]);
    assert_eq!(ops_of(&block), vec![MicroOp::ConstU32]);
    assert!(!block.value(block.instructions()[0]).has_uses());
    assert_eq!(block.terminal, MicroTerminal::LinkBlock { next: loc(8) });
}

#[test]
fn branch_with_link_pushes_the_return_address() {
    // bl +0 at pc 0: link is 4, target is 8.
    let block = translate_at(0, &[0xEB00_0000]);
    assert_eq!(ops_of(&block), vec![MicroOp::ConstU32, MicroOp::PushRsbHint]);
    let ids = block.instructions();
    assert_eq!(*block.value(ids[0]).data(), ValueData::ConstU32(4));
    assert_eq!(block.terminal, MicroTerminal::LinkBlock { next: loc(8) });
}

#[test]
fn blx_immediate_switches_to_thumb() {
    // blx +8 (H clear) at 0: target 16, Thumb.
    let block = translate_at(0, &[0xFA00_0002]);
    assert_eq!(ops_of(&block), vec![MicroOp::ConstU32, MicroOp::PushRsbHint]);
    let next = LocationDescriptor {
        t_flag: true,
        ..loc(16)
    };
    assert_eq!(block.terminal, MicroTerminal::LinkBlock { next });
}

#[test]
fn load_to_pc_uses_exchange_semantics() {
    // ldr pc, [r1]
    let block = translate_at(0, &[0xE591_F000]);
    assert_eq!(
        ops_of(&block),
        vec![
            MicroOp::GetGpr,
            MicroOp::ConstU32,
            MicroOp::Add,
            MicroOp::Read32,
            MicroOp::BxWritePc
        ]
    );
    assert_eq!(block.terminal, MicroTerminal::ReturnToDispatch);
}

#[test]
fn load_with_writeback_updates_the_base() {
    // ldr r0, [r1], #4 — post-indexed.
    let block = translate_at(0, &[0xE491_0004, 0xEAFF_FFFE]);
    assert_eq!(
        ops_of(&block),
        vec![
            MicroOp::GetGpr,
            MicroOp::ConstU32,
            MicroOp::Add,
            MicroOp::Read32,
            MicroOp::SetGpr, // r0 := loaded value
            MicroOp::SetGpr, // r1 := r1 + 4
        ]
    );
    let ids = block.instructions();
    // The load reads the *unadjusted* base.
    assert_eq!(block.value(ids[3]).arg(0), ids[0]);
}

#[test]
fn setend_rewrites_the_endian_flag() {
    let block = translate_at(0, &[0xF101_0200]);
    assert!(block.instructions().is_empty());
    assert_eq!(
        block.terminal,
        MicroTerminal::LinkBlock {
            next: loc(4).with_e_flag(true)
        }
    );
}

#[test]
fn clrex_emits_clear_exclusive() {
    let block = translate_at(0, &[0xF57F_F01F, 0xEAFF_FFFE]);
    assert_eq!(ops_of(&block), vec![MicroOp::ClearExclusive]);
}

#[test]
fn clz_lowering() {
    // clz r1, r2; b .
    let block = translate_at(0, &[0xE16F_1F12, 0xEAFF_FFFE]);
    assert_eq!(
        ops_of(&block),
        vec![MicroOp::GetGpr, MicroOp::CountLeadingZeros, MicroOp::SetGpr]
    );
}

#[test]
fn flag_setting_logical_takes_carry_from_the_shifter() {
    // ands r0, r1, r2, lsr #4; then the block ends (flags written).
    let block = translate_at(0, &[0xE011_0222]);
    assert_eq!(
        ops_of(&block),
        vec![
            MicroOp::GetGpr, // r2
            MicroOp::ConstU32,
            MicroOp::Lsr,
            MicroOp::GetGpr, // r1
            MicroOp::And,
            MicroOp::SetGpr,
        ]
    );
    let ids = block.instructions();
    assert_eq!(block.value(ids[2]).write_flags(), ArmFlags::C);
    assert_eq!(block.value(ids[4]).write_flags(), ArmFlags::NZ);
}

#[test]
fn nop_translates_to_nothing() {
    let block = translate_at(0, &[0xE320_F000, 0xEAFF_FFFE]);
    assert!(block.instructions().is_empty());
    assert_eq!(block.terminal, MicroTerminal::LinkBlock { next: loc(4) });
    assert_eq!(block.cycles_consumed, 2);
}

#[test]
fn rotated_flag_setting_immediate_falls_back() {
    // ands r0, r1, #0xFF000000 — carry comes out of the rotate.
    let block = translate_at(0, &[0xE211_04FF]);
    assert_eq!(block.terminal, MicroTerminal::Interpret { next: loc(0) });
}

#[test]
fn thumb_locations_are_interpreted() {
    let mem = TestMemory::with_program(0, &[0xE1A0_0000]);
    let location = LocationDescriptor {
        t_flag: true,
        ..loc(0)
    };
    let block = translate(location, &mem);
    assert!(block.instructions().is_empty());
    assert_eq!(block.terminal, MicroTerminal::Interpret { next: location });
    assert_eq!(block.cycles_consumed, 1);
}

#[test]
fn translating_twice_is_deterministic() {
    let mem = TestMemory::with_program(0, &[0xE292_1003, 0xEAFF_FFFE]);
    let a = translate(loc(0), &mem);
    let b = translate(loc(0), &mem);
    assert_eq!(ops_of(&a), ops_of(&b));
    assert_eq!(a.terminal, b.terminal);
    assert_eq!(a.cycles_consumed, b.cycles_consumed);
}
