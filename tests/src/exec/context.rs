use crate::support::make_cpu;

#[test]
fn reset_context_enters_user_mode() {
    let cpu = make_cpu(0, &[], 1);
    let mut ctx = cpu.new_context();
    ctx.cpu_registers[5] = 0xAAAA_AAAA;
    ctx.fpu_registers[10] = 0xBBBB_BBBB;

    cpu.reset_context(&mut ctx, 0x1000_0000, 0x0010_0000, 42);

    assert_eq!(ctx.cpu_registers[0], 42);
    assert_eq!(ctx.pc, 0x0010_0000);
    assert_eq!(ctx.sp, 0x1000_0000);
    assert_eq!(ctx.cpsr, 0x1F);
    assert_eq!(ctx.cpu_registers[5], 0);
    assert_eq!(ctx.fpu_registers[10], 0);
}

#[test]
fn save_load_round_trips_the_register_file() {
    let mut cpu = make_cpu(0, &[], 1);
    for i in 0..16 {
        cpu.set_reg(i, 0x100 + i as u32);
    }
    cpu.set_cpsr(0x6000_001F);
    for i in 0..64 {
        cpu.set_vfp_reg(i, 0x4000_0000 + i as u32);
    }
    cpu.set_vfp_system_reg(armjit_exec::VfpSystemRegister::Fpscr, 0x0300_0000);
    cpu.set_vfp_system_reg(armjit_exec::VfpSystemRegister::Fpexc, 0x4000_0000);

    let mut ctx = cpu.new_context();
    cpu.save_context(&mut ctx);

    let mut other = make_cpu(0, &[], 1);
    other.load_context(&ctx);

    for i in 0..16 {
        assert_eq!(other.get_reg(i), 0x100 + i as u32);
    }
    assert_eq!(other.get_cpsr(), 0x6000_001F);
    for i in 0..64 {
        assert_eq!(other.get_vfp_reg(i), 0x4000_0000 + i as u32);
    }
    assert_eq!(
        other.get_vfp_system_reg(armjit_exec::VfpSystemRegister::Fpscr),
        0x0300_0000
    );
}

#[test]
fn repeated_save_load_is_a_no_op() {
    let mut cpu = make_cpu(0, &[], 1);
    cpu.set_reg(3, 7);
    cpu.set_reg(13, 0xCAFE_0000);
    cpu.set_cpsr(0x8000_001F);

    let mut ctx = cpu.new_context();
    cpu.save_context(&mut ctx);
    cpu.load_context(&ctx);

    let mut again = cpu.new_context();
    cpu.save_context(&mut again);
    assert_eq!(ctx, again);
}
