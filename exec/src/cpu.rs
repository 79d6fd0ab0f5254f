//! The guest CPU core: state, dispatch loop and public interface.

use std::any::Any;
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};

use armjit_core::{Cond, LocationDescriptor};
use armjit_frontend::{translate, GuestMemory};

use crate::cache::BlockCache;
use crate::context::ThreadContext;
use crate::run::{run_tac, RunState};
use crate::tac::lower;
use crate::timer::Timer;

/// VFP system registers exposed through the core interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VfpSystemRegister {
    Fpscr,
    Fpexc,
}

/// CP15 registers exposed through the core interface. Only the
/// user-visible thread-ID registers; other CP15 access is undefined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cp15Register {
    ThreadUprw,
    ThreadUro,
}

/// Opaque page-table handle. The core stores it and hands it back;
/// it never looks inside.
pub type PageTableHandle = Rc<dyn Any>;

const USER32_MODE: u32 = 0x1F;

/// Architectural state of the guest core.
pub struct CpuState {
    pub regs: [u32; 16],
    pub cpsr: u32,
    pub vfp: [u32; 64],
    pub fpscr: u32,
    pub fpexc: u32,
    pub cp15_thread_uprw: u32,
    pub cp15_thread_uro: u32,
}

impl CpuState {
    pub fn new() -> Self {
        Self {
            regs: [0; 16],
            cpsr: USER32_MODE,
            vfp: [0; 64],
            fpscr: 0,
            fpexc: 0,
            cp15_thread_uprw: 0,
            cp15_thread_uro: 0,
        }
    }
}

impl Default for CpuState {
    fn default() -> Self {
        Self::new()
    }
}

/// Statistics for profiling the dispatch pipeline.
#[derive(Default)]
pub struct DispatchStats {
    pub loop_iters: u64,
    pub cache_hits: u64,
    pub translations: u64,
}

impl fmt::Display for DispatchStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let total = self.cache_hits + self.translations;
        writeln!(f, "=== Dispatch Stats ===")?;
        writeln!(f, "loop iters:  {}", self.loop_iters)?;
        writeln!(
            f,
            "cache hits:  {} ({:.1}%)",
            self.cache_hits,
            pct(self.cache_hits, total)
        )?;
        writeln!(
            f,
            "translated:  {} ({:.1}%)",
            self.translations,
            pct(self.translations, total)
        )?;
        Ok(())
    }
}

fn pct(n: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        n as f64 / total as f64 * 100.0
    }
}

/// One ARM11 guest core, driven by translated blocks.
pub struct Cpu {
    pub(crate) id: u32,
    timer: Rc<dyn Timer>,
    mem: Rc<dyn GuestMemory>,
    page_table: Option<PageTableHandle>,
    pub(crate) state: CpuState,
    run_state: RunState,
    cache: BlockCache,
    /// Set from outside the dispatch loop; observed at block
    /// boundaries only.
    reschedule: AtomicBool,
    stats: DispatchStats,
}

impl Cpu {
    pub fn new(id: u32, timer: Rc<dyn Timer>, mem: Rc<dyn GuestMemory>) -> Self {
        Self {
            id,
            timer,
            mem,
            page_table: None,
            state: CpuState::new(),
            run_state: RunState::new(),
            cache: BlockCache::new(),
            reschedule: AtomicBool::new(false),
            stats: DispatchStats::default(),
        }
    }

    // -- Execution ------------------------------------------

    /// Run until the timer slice is spent or a reschedule is
    /// requested.
    pub fn run(&mut self) {
        let budget = self.timer.down_count().max(1);
        let consumed = self.execute_instructions(budget);
        self.add_ticks(consumed);
    }

    /// Execute at least one guest instruction (possibly a whole
    /// block).
    pub fn step(&mut self) {
        let consumed = self.execute_instructions(1);
        self.add_ticks(consumed);
    }

    fn execute_instructions(&mut self, mut num_instructions: i64) -> u64 {
        self.reschedule.store(false, Ordering::Relaxed);
        let mut consumed = 0u64;

        loop {
            self.stats.loop_iters += 1;
            let location = self.current_location();

            if self.cache.get(&location).is_none() {
                let micro = translate(location, &*self.mem);
                self.cache.insert(location, lower(&micro));
                self.stats.translations += 1;
            } else {
                self.stats.cache_hits += 1;
            }

            let block = self.cache.get(&location).expect("block just inserted");
            run_tac(&mut self.state, &mut self.run_state, block, &*self.mem);

            num_instructions -= block.cycles_consumed as i64;
            consumed += block.cycles_consumed as u64;

            if self.reschedule.load(Ordering::Relaxed) || num_instructions <= 0 {
                break;
            }
        }

        consumed
    }

    fn current_location(&self) -> LocationDescriptor {
        // T and E inside the CPSR are authoritative; the residual
        // condition lives with the run state.
        LocationDescriptor {
            arm_pc: self.state.regs[15],
            t_flag: self.state.cpsr & (1 << 5) != 0,
            e_flag: self.state.cpsr & (1 << 9) != 0,
            cond: self.run_state.cond,
        }
    }

    fn add_ticks(&self, ticks: u64) {
        self.timer.add_ticks(ticks);
        if self.timer.down_count() < 0 {
            self.timer.advance();
        }
    }

    /// Request the dispatch loop to yield at the next block boundary.
    pub fn prepare_reschedule(&self) {
        self.reschedule.store(true, Ordering::Relaxed);
    }

    // -- Cache maintenance ----------------------------------

    pub fn clear_instruction_cache(&mut self) {
        log::debug!("core {}: instruction cache cleared", self.id);
        self.cache.clear();
    }

    pub fn invalidate_cache_range(&mut self, start_address: u32, length: usize) {
        log::debug!(
            "core {}: invalidating [{start_address:08x}, +{length:#x})",
            self.id
        );
        self.cache.invalidate_range(start_address, length);
    }

    /// Drop all derived state; only the architectural registers
    /// survive.
    pub fn purge_state(&mut self) {
        self.cache.clear();
        self.run_state.cond = Cond::AL;
    }

    // -- Register access ------------------------------------

    pub fn set_pc(&mut self, addr: u32) {
        self.state.regs[15] = addr;
    }

    pub fn get_pc(&self) -> u32 {
        self.state.regs[15]
    }

    pub fn get_reg(&self, index: usize) -> u32 {
        self.state.regs[index]
    }

    pub fn set_reg(&mut self, index: usize, value: u32) {
        self.state.regs[index] = value;
    }

    pub fn get_vfp_reg(&self, index: usize) -> u32 {
        self.state.vfp[index]
    }

    pub fn set_vfp_reg(&mut self, index: usize, value: u32) {
        self.state.vfp[index] = value;
    }

    pub fn get_vfp_system_reg(&self, reg: VfpSystemRegister) -> u32 {
        match reg {
            VfpSystemRegister::Fpscr => self.state.fpscr,
            VfpSystemRegister::Fpexc => self.state.fpexc,
        }
    }

    pub fn set_vfp_system_reg(&mut self, reg: VfpSystemRegister, value: u32) {
        match reg {
            VfpSystemRegister::Fpscr => self.state.fpscr = value,
            VfpSystemRegister::Fpexc => self.state.fpexc = value,
        }
    }

    pub fn get_cpsr(&self) -> u32 {
        self.state.cpsr
    }

    pub fn set_cpsr(&mut self, cpsr: u32) {
        self.state.cpsr = cpsr;
    }

    pub fn get_cp15_register(&self, reg: Cp15Register) -> u32 {
        match reg {
            Cp15Register::ThreadUprw => self.state.cp15_thread_uprw,
            Cp15Register::ThreadUro => self.state.cp15_thread_uro,
        }
    }

    pub fn set_cp15_register(&mut self, reg: Cp15Register, value: u32) {
        match reg {
            Cp15Register::ThreadUprw => self.state.cp15_thread_uprw = value,
            Cp15Register::ThreadUro => self.state.cp15_thread_uro = value,
        }
    }

    // -- Page table -----------------------------------------

    pub fn set_page_table(&mut self, page_table: Option<PageTableHandle>) {
        self.page_table = page_table;
    }

    pub fn get_page_table(&self) -> Option<PageTableHandle> {
        self.page_table.clone()
    }

    // -- Thread contexts ------------------------------------

    /// Create a context for use with this core.
    pub fn new_context(&self) -> ThreadContext {
        ThreadContext::new()
    }

    /// Zero `ctx`, then arrange for it to enter `entry_point` in user
    /// mode with the given stack and argument.
    pub fn reset_context(
        &self,
        ctx: &mut ThreadContext,
        stack_top: u32,
        entry_point: u32,
        arg: u32,
    ) {
        ctx.reset();
        ctx.cpu_registers[0] = arg;
        ctx.pc = entry_point;
        ctx.sp = stack_top;
        ctx.cpsr = USER32_MODE;
    }

    pub fn save_context(&self, ctx: &mut ThreadContext) {
        ctx.cpu_registers.copy_from_slice(&self.state.regs[..13]);
        ctx.fpu_registers.copy_from_slice(&self.state.vfp);

        ctx.sp = self.state.regs[13];
        ctx.lr = self.state.regs[14];
        ctx.pc = self.state.regs[15];
        ctx.cpsr = self.state.cpsr;

        ctx.fpscr = self.state.fpscr;
        ctx.fpexc = self.state.fpexc;
    }

    pub fn load_context(&mut self, ctx: &ThreadContext) {
        self.state.regs[..13].copy_from_slice(&ctx.cpu_registers);
        self.state.vfp.copy_from_slice(&ctx.fpu_registers);

        self.state.regs[13] = ctx.sp;
        self.state.regs[14] = ctx.lr;
        self.state.regs[15] = ctx.pc;
        self.state.cpsr = ctx.cpsr;

        self.state.fpscr = ctx.fpscr;
        self.state.fpexc = ctx.fpexc;
    }

    // -- Identity -------------------------------------------

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn get_timer(&self) -> Rc<dyn Timer> {
        Rc::clone(&self.timer)
    }

    pub fn stats(&self) -> &DispatchStats {
        &self.stats
    }
}
