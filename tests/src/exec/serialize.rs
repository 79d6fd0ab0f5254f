use std::io::Cursor;

use armjit_exec::{
    load_core, load_thread_context, save_core, save_thread_context, Cp15Register,
    PageTableHandle, PageTableResolver, StateError, VfpSystemRegister,
};

use crate::support::make_cpu;

/// Resolver for cores that carry no page table.
struct NoTables;

impl PageTableResolver for NoTables {
    fn index_of(&self, _table: &PageTableHandle) -> u64 {
        panic!("no tables registered");
    }

    fn table_at(&self, _index: u64) -> Option<PageTableHandle> {
        None
    }
}

#[test]
fn thread_context_round_trip() {
    let cpu = make_cpu(0, &[], 1);
    let mut ctx = cpu.new_context();
    for (i, r) in ctx.cpu_registers.iter_mut().enumerate() {
        *r = 0x10 + i as u32;
    }
    ctx.sp = 0x0FFF_F000;
    ctx.lr = 0x0010_0004;
    ctx.pc = 0x0010_0000;
    ctx.cpsr = 0x2000_001F;
    for (i, r) in ctx.fpu_registers.iter_mut().enumerate() {
        *r = 0x3F80_0000 + i as u32;
    }
    ctx.fpscr = 0x0300_001F;
    ctx.fpexc = 0x4000_0000;

    let mut bytes = Vec::new();
    save_thread_context(&ctx, &mut bytes).unwrap();
    let loaded = load_thread_context(&mut Cursor::new(&bytes)).unwrap();
    assert_eq!(ctx, loaded);
}

#[test]
fn bad_magic_is_rejected() {
    let mut bytes = Vec::new();
    let cpu = make_cpu(0, &[], 1);
    save_thread_context(&cpu.new_context(), &mut bytes).unwrap();
    bytes[0] ^= 0xFF;
    match load_thread_context(&mut Cursor::new(&bytes)) {
        Err(StateError::BadMagic) => {}
        other => panic!("expected BadMagic, got {other:?}"),
    }
}

#[test]
fn truncated_stream_is_an_io_error() {
    let mut bytes = Vec::new();
    let cpu = make_cpu(0, &[], 1);
    save_thread_context(&cpu.new_context(), &mut bytes).unwrap();
    bytes.truncate(bytes.len() - 3);
    match load_thread_context(&mut Cursor::new(&bytes)) {
        Err(StateError::Io(_)) => {}
        other => panic!("expected an i/o error, got {other:?}"),
    }
}

#[test]
fn core_round_trip() {
    let mut cpu = make_cpu(0, &[], 1);
    for i in 0..16 {
        cpu.set_reg(i, 0xA000_0000 + i as u32);
    }
    cpu.set_cpsr(0x9000_001F);
    for i in 0..64 {
        cpu.set_vfp_reg(i, i as u32 * 3);
    }
    cpu.set_vfp_system_reg(VfpSystemRegister::Fpscr, 1);
    cpu.set_vfp_system_reg(VfpSystemRegister::Fpexc, 2);
    cpu.set_cp15_register(Cp15Register::ThreadUprw, 3);
    cpu.set_cp15_register(Cp15Register::ThreadUro, 4);

    let mut bytes = Vec::new();
    save_core(&cpu, &mut bytes, &NoTables).unwrap();

    let mut other = make_cpu(0, &[], 1);
    load_core(&mut other, &mut Cursor::new(&bytes), &NoTables).unwrap();

    for i in 0..16 {
        assert_eq!(other.get_reg(i), 0xA000_0000 + i as u32);
    }
    assert_eq!(other.get_cpsr(), 0x9000_001F);
    for i in 0..64 {
        assert_eq!(other.get_vfp_reg(i), i as u32 * 3);
    }
    assert_eq!(other.get_vfp_system_reg(VfpSystemRegister::Fpscr), 1);
    assert_eq!(other.get_vfp_system_reg(VfpSystemRegister::Fpexc), 2);
    assert_eq!(other.get_cp15_register(Cp15Register::ThreadUprw), 3);
    assert_eq!(other.get_cp15_register(Cp15Register::ThreadUro), 4);
    assert_eq!(other.id(), cpu.id());
    assert!(other.get_page_table().is_none());
}

#[test]
fn page_table_indices_round_trip() {
    use std::rc::Rc;

    struct OneTable {
        table: PageTableHandle,
    }

    impl PageTableResolver for OneTable {
        fn index_of(&self, _table: &PageTableHandle) -> u64 {
            7
        }

        fn table_at(&self, index: u64) -> Option<PageTableHandle> {
            (index == 7).then(|| Rc::clone(&self.table))
        }
    }

    let resolver = OneTable {
        table: Rc::new(0u8),
    };

    let mut cpu = make_cpu(0, &[], 1);
    cpu.set_page_table(Some(Rc::clone(&resolver.table)));

    let mut bytes = Vec::new();
    save_core(&cpu, &mut bytes, &resolver).unwrap();

    let mut other = make_cpu(0, &[], 1);
    load_core(&mut other, &mut Cursor::new(&bytes), &resolver).unwrap();
    assert!(other.get_page_table().is_some());
}
