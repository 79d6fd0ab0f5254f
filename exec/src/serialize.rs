//! Binary serialization of contexts and cores.
//!
//! Little-endian streams, each magic-tagged and versioned:
//!
//!   context: magic "A11T" + version + 16 CPU regs + FPU regs
//!            (16 at version 0, 64 from version 1) + cpsr + fpscr
//!            + fpexc
//!   core:    magic "A11C" + version + page-table index + core id
//!            + r0..r14 + pc + cpsr + VFP regs (32 at version 0,
//!            64 from version 1) + fpscr + fpexc + CP15 THREAD_UPRW
//!            + THREAD_URO
//!
//! The page-table handle is mapped to a stable index through a
//! host-side [`PageTableResolver`]; timer handles do not serialize
//! and are re-bound by the host after a load.

use std::io::{self, Read, Write};

use thiserror::Error;

use crate::context::ThreadContext;
use crate::cpu::{Cp15Register, Cpu, PageTableHandle, VfpSystemRegister};

const CONTEXT_MAGIC: &[u8; 4] = b"A11T";
const CORE_MAGIC: &[u8; 4] = b"A11C";
const VERSION: u16 = 1;

/// Index stored when a core has no page table bound.
pub const NO_PAGE_TABLE: u64 = u64::MAX;

#[derive(Debug, Error)]
pub enum StateError {
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
    #[error("bad magic")]
    BadMagic,
    #[error("unsupported version {0}")]
    UnsupportedVersion(u16),
    #[error("unknown page table index {0}")]
    UnknownPageTable(u64),
}

/// Host-side protocol mapping page-table handles to stable indices
/// and back.
pub trait PageTableResolver {
    fn index_of(&self, table: &PageTableHandle) -> u64;
    fn table_at(&self, index: u64) -> Option<PageTableHandle>;
}

// -- Write helpers --

fn write_u16(w: &mut impl Write, v: u16) -> io::Result<()> {
    w.write_all(&v.to_le_bytes())
}

fn write_u32(w: &mut impl Write, v: u32) -> io::Result<()> {
    w.write_all(&v.to_le_bytes())
}

fn write_u64(w: &mut impl Write, v: u64) -> io::Result<()> {
    w.write_all(&v.to_le_bytes())
}

// -- Read helpers --

fn read_u16(r: &mut impl Read) -> io::Result<u16> {
    let mut buf = [0u8; 2];
    r.read_exact(&mut buf)?;
    Ok(u16::from_le_bytes(buf))
}

fn read_u32(r: &mut impl Read) -> io::Result<u32> {
    let mut buf = [0u8; 4];
    r.read_exact(&mut buf)?;
    Ok(u32::from_le_bytes(buf))
}

fn read_u64(r: &mut impl Read) -> io::Result<u64> {
    let mut buf = [0u8; 8];
    r.read_exact(&mut buf)?;
    Ok(u64::from_le_bytes(buf))
}

fn check_magic(r: &mut impl Read, magic: &[u8; 4]) -> Result<(), StateError> {
    let mut buf = [0u8; 4];
    r.read_exact(&mut buf)?;
    if &buf != magic {
        return Err(StateError::BadMagic);
    }
    Ok(())
}

fn check_version(r: &mut impl Read) -> Result<u16, StateError> {
    let version = read_u16(r)?;
    if version > VERSION {
        return Err(StateError::UnsupportedVersion(version));
    }
    Ok(version)
}

// -- Thread contexts --

pub fn save_thread_context(ctx: &ThreadContext, w: &mut impl Write) -> Result<(), StateError> {
    w.write_all(CONTEXT_MAGIC)?;
    write_u16(w, VERSION)?;

    for &r in &ctx.cpu_registers {
        write_u32(w, r)?;
    }
    write_u32(w, ctx.sp)?;
    write_u32(w, ctx.lr)?;
    write_u32(w, ctx.pc)?;
    for &r in &ctx.fpu_registers {
        write_u32(w, r)?;
    }
    write_u32(w, ctx.cpsr)?;
    write_u32(w, ctx.fpscr)?;
    write_u32(w, ctx.fpexc)?;

    Ok(())
}

pub fn load_thread_context(r: &mut impl Read) -> Result<ThreadContext, StateError> {
    check_magic(r, CONTEXT_MAGIC)?;
    let version = check_version(r)?;

    let mut ctx = ThreadContext::new();
    for reg in &mut ctx.cpu_registers {
        *reg = read_u32(r)?;
    }
    ctx.sp = read_u32(r)?;
    ctx.lr = read_u32(r)?;
    ctx.pc = read_u32(r)?;
    let fpu_reg_count = if version == 0 { 16 } else { 64 };
    for reg in ctx.fpu_registers.iter_mut().take(fpu_reg_count) {
        *reg = read_u32(r)?;
    }
    ctx.cpsr = read_u32(r)?;
    ctx.fpscr = read_u32(r)?;
    ctx.fpexc = read_u32(r)?;

    Ok(ctx)
}

// -- Cores --

pub fn save_core(
    cpu: &Cpu,
    w: &mut impl Write,
    resolver: &dyn PageTableResolver,
) -> Result<(), StateError> {
    w.write_all(CORE_MAGIC)?;
    write_u16(w, VERSION)?;

    let page_table_index = cpu
        .get_page_table()
        .map_or(NO_PAGE_TABLE, |table| resolver.index_of(&table));
    write_u64(w, page_table_index)?;
    write_u32(w, cpu.id())?;

    for i in 0..15 {
        write_u32(w, cpu.get_reg(i))?;
    }
    write_u32(w, cpu.get_pc())?;
    write_u32(w, cpu.get_cpsr())?;
    for i in 0..64 {
        write_u32(w, cpu.get_vfp_reg(i))?;
    }
    write_u32(w, cpu.get_vfp_system_reg(VfpSystemRegister::Fpscr))?;
    write_u32(w, cpu.get_vfp_system_reg(VfpSystemRegister::Fpexc))?;
    write_u32(w, cpu.get_cp15_register(Cp15Register::ThreadUprw))?;
    write_u32(w, cpu.get_cp15_register(Cp15Register::ThreadUro))?;

    Ok(())
}

/// Restore a core from a stream. Translation state is purged first;
/// the timer handle is left as-is.
pub fn load_core(
    cpu: &mut Cpu,
    r: &mut impl Read,
    resolver: &dyn PageTableResolver,
) -> Result<(), StateError> {
    check_magic(r, CORE_MAGIC)?;
    let version = check_version(r)?;

    cpu.purge_state();

    let page_table_index = read_u64(r)?;
    if page_table_index == NO_PAGE_TABLE {
        cpu.set_page_table(None);
    } else {
        let table = resolver
            .table_at(page_table_index)
            .ok_or(StateError::UnknownPageTable(page_table_index))?;
        cpu.set_page_table(Some(table));
    }
    cpu.id = read_u32(r)?;

    for i in 0..15 {
        let value = read_u32(r)?;
        cpu.set_reg(i, value);
    }
    let pc = read_u32(r)?;
    cpu.set_pc(pc);
    let cpsr = read_u32(r)?;
    cpu.set_cpsr(cpsr);
    let vfp_reg_count = if version == 0 { 32 } else { 64 };
    for i in 0..vfp_reg_count {
        let value = read_u32(r)?;
        cpu.set_vfp_reg(i, value);
    }
    let fpscr = read_u32(r)?;
    cpu.set_vfp_system_reg(VfpSystemRegister::Fpscr, fpscr);
    let fpexc = read_u32(r)?;
    cpu.set_vfp_system_reg(VfpSystemRegister::Fpexc, fpexc);
    let uprw = read_u32(r)?;
    cpu.set_cp15_register(Cp15Register::ThreadUprw, uprw);
    let uro = read_u32(r)?;
    cpu.set_cp15_register(Cp15Register::ThreadUro, uro);

    Ok(())
}
