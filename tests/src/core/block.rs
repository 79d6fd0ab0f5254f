use armjit_core::{
    ArmFlags, ArmReg, Cond, LocationDescriptor, MicroBuilder, MicroOp, MicroTerminal, ValueData,
};

fn loc() -> LocationDescriptor {
    LocationDescriptor::new(0, false, false)
}

#[test]
fn fresh_block_returns_to_dispatch() {
    let ir = MicroBuilder::new(loc());
    assert_eq!(ir.block.terminal, MicroTerminal::ReturnToDispatch);
    assert!(ir.block.instructions().is_empty());
    assert_eq!(ir.block.cycles_consumed, 0);
}

#[test]
fn use_lists_track_arguments() {
    let mut ir = MicroBuilder::new(loc());
    let rn = ir.get_gpr(ArmReg::new(2));
    let imm = ir.const_u32(3);
    let sum = ir.inst2(MicroOp::Add, rn, imm, ArmFlags::NZCV);
    let store = ir.set_gpr(ArmReg::new(1), sum);

    let block = &ir.block;
    assert!(block.value(rn).has_one_use());
    assert!(block.value(imm).has_one_use());
    assert!(block.value(sum).has_one_use());
    assert!(!block.value(store).has_uses());

    assert_eq!(block.instructions(), &[rn, imm, sum, store]);
    assert_eq!(block.value(sum).arg(0), rn);
    assert_eq!(block.value(sum).arg(1), imm);
    assert_eq!(block.value(store).arg(0), sum);
    assert_eq!(block.value(sum).write_flags(), ArmFlags::NZCV);
}

#[test]
fn set_arg_moves_the_use() {
    let mut ir = MicroBuilder::new(loc());
    let a = ir.const_u32(1);
    let b = ir.const_u32(2);
    let sum = ir.inst2(MicroOp::Add, a, a, ArmFlags::NONE);
    assert!(ir.block.value(a).has_many_uses());

    ir.block.set_arg(sum, 1, b);
    assert!(ir.block.value(a).has_one_use());
    assert!(ir.block.value(b).has_one_use());
    assert_eq!(ir.block.value(sum).arg(0), a);
    assert_eq!(ir.block.value(sum).arg(1), b);
}

#[test]
fn replace_uses_with_rewrites_every_user() {
    let mut ir = MicroBuilder::new(loc());
    let x = ir.const_u32(7);
    let y = ir.const_u32(9);
    let sum = ir.inst2(MicroOp::Add, x, x, ArmFlags::NONE);
    let store = ir.set_gpr(ArmReg::new(0), x);

    ir.block.replace_uses_with(x, y);

    assert!(!ir.block.value(x).has_uses());
    assert!(ir.block.value(y).has_many_uses());
    assert_eq!(ir.block.value(sum).arg(0), y);
    assert_eq!(ir.block.value(sum).arg(1), y);
    assert_eq!(ir.block.value(store).arg(0), y);
}

#[test]
#[should_panic(expected = "type mismatch")]
fn replace_uses_with_requires_matching_types() {
    let mut ir = MicroBuilder::new(loc());
    let x = ir.const_u32(7);
    let other = ir.const_u32(1);
    let _use_of_x = ir.set_gpr(ArmReg::new(0), x);
    let void = ir.set_gpr(ArmReg::new(1), other);
    ir.block.replace_uses_with(x, void);
}

#[test]
#[should_panic(expected = "takes 2 arguments")]
fn inst_arity_is_validated() {
    let mut ir = MicroBuilder::new(loc());
    let a = ir.const_u32(1);
    ir.inst1(MicroOp::Add, a, ArmFlags::NONE);
}

#[test]
#[should_panic(expected = "must be U32")]
fn inst_argument_types_are_validated() {
    let mut ir = MicroBuilder::new(loc());
    let a = ir.const_u32(1);
    let void = ir.set_gpr(ArmReg::new(0), a);
    ir.inst1(MicroOp::Not, void, ArmFlags::NONE);
}

#[test]
#[should_panic(expected = "not a subset")]
fn write_flag_restriction_must_shrink() {
    let mut ir = MicroBuilder::new(loc());
    let a = ir.const_u32(1);
    // Not cannot write any flag.
    ir.inst1(MicroOp::Not, a, ArmFlags::C);
}

#[test]
fn value_data_is_inspectable() {
    let mut ir = MicroBuilder::new(loc());
    let c = ir.const_u32(0x1234);
    let r = ir.get_gpr(ArmReg::new(5));
    assert_eq!(*ir.block.value(c).data(), ValueData::ConstU32(0x1234));
    assert_eq!(*ir.block.value(r).data(), ValueData::GetGpr(ArmReg::new(5)));
    assert_eq!(ir.block.value(r).op(), MicroOp::GetGpr);
}

#[test]
fn if_terminal_nests() {
    let mut ir = MicroBuilder::new(loc());
    let then_ = MicroTerminal::LinkBlock {
        next: loc().with_arm_pc(0x10),
    };
    let else_ = MicroTerminal::ReturnToDispatch;
    ir.set_term(MicroTerminal::If {
        cond: Cond::EQ,
        then_: Box::new(then_.clone()),
        else_: Box::new(else_.clone()),
    });
    match &ir.block.terminal {
        MicroTerminal::If { cond, then_: t, else_: e } => {
            assert_eq!(*cond, Cond::EQ);
            assert_eq!(**t, then_);
            assert_eq!(**e, else_);
        }
        other => panic!("unexpected terminal {other:?}"),
    }
}
