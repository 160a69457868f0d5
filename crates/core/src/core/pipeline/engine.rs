//! Pipeline control engine.
//!
//! The per-cycle update function for the five-stage in-order pipeline.
//! Stages are driven writeback-first so that every stage reads latches as
//! they stood at the end of the previous cycle; all writes land in the next
//! snapshot, which is committed atomically at the end of the cycle. The
//! engine owns both caches, the stage simulator, and every piece of scalar
//! state — there are no globals.

use crate::common::constants::{EXCEPTION_HANDLER_ADDR, INSTRUCTION_BYTES};
use crate::common::{ConfigError, SimError};
use crate::config::SimConfig;
use crate::core::pipeline::hazards::{self, Operand};
use crate::core::pipeline::latches::{PipeInstr, PipelineSnapshot, StageStatus};
use crate::core::units::cache::{Cache, CacheOp};
use crate::sim::StageSim;
use crate::stats::SimulationStats;
use crate::trace::{PipeTraceRecord, TraceSink};
use std::fs::File;
use std::io::{BufWriter, Write};

/// Result of a `run_cycles` call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunStatus {
    /// The requested cycle budget ran out before a HALT retired.
    Completed,
    /// A HALT instruction reached writeback; the machine is stopped.
    Halted,
}

/// Outcome of one cycle.
enum CycleOutcome {
    Continue,
    Halt,
}

/// Outstanding cache-miss countdown.
#[derive(Clone, Copy, Debug, Default)]
struct MissTracker {
    active: bool,
    remaining: u64,
}

impl MissTracker {
    fn start(&mut self, latency: u64) {
        self.active = true;
        self.remaining = latency;
    }

    fn clear(&mut self) {
        self.active = false;
        self.remaining = 0;
    }

    /// Still counting down; the affected stage holds.
    fn holding(&self) -> bool {
        self.active && self.remaining > 0
    }

    /// Countdown expired this cycle; the withheld access completes now.
    fn completing(&self) -> bool {
        self.active && self.remaining == 0
    }
}

/// The pipeline engine: five latches, two caches, one stage simulator.
pub struct PipelineEngine<S: StageSim> {
    sim: S,
    icache: Cache,
    dcache: Cache,
    sink: TraceSink,
    snapshot: PipelineSnapshot,
    pc: u64,
    cycle_count: u64,
    load_use_stalls: u64,
    // Control-hazard countdown for a branch parked in decode, and whether
    // its blocking producer was a load.
    branch_stall: u8,
    branch_stall_on_load: bool,
    imiss: MissTracker,
    dmiss: MissTracker,
    halted: bool,
    trace: bool,
}

impl<S: StageSim> PipelineEngine<S> {
    /// Builds an engine from a validated configuration.
    ///
    /// All latches start as `NOP(IDLE)` and the PC at the configured reset
    /// address.
    ///
    /// # Errors
    ///
    /// [`ConfigError`] when either cache geometry violates the
    /// construction contract.
    pub fn new(config: &SimConfig, sim: S, sink: TraceSink) -> Result<Self, ConfigError> {
        Ok(Self {
            sim,
            icache: Cache::new(&config.icache)?,
            dcache: Cache::new(&config.dcache)?,
            sink,
            snapshot: PipelineSnapshot::default(),
            pc: config.general.start_pc,
            cycle_count: 0,
            load_use_stalls: 0,
            branch_stall: 0,
            branch_stall_on_load: false,
            imiss: MissTracker::default(),
            dmiss: MissTracker::default(),
            halted: false,
            trace: config.general.trace,
        })
    }

    /// Runs `n` cycles; `0` means run until HALT.
    ///
    /// Once halted, further calls return [`RunStatus::Halted`] immediately
    /// with no side effects.
    pub fn run_cycles(&mut self, n: u64) -> Result<RunStatus, SimError> {
        if self.halted {
            return Ok(RunStatus::Halted);
        }
        let mut count = 0u64;
        while n == 0 || count < n {
            count += 1;
            if let CycleOutcome::Halt = self.cycle()? {
                return Ok(RunStatus::Halted);
            }
        }
        Ok(RunStatus::Completed)
    }

    /// Single-cycle ticks until HALT.
    pub fn run_till_halt(&mut self) -> Result<RunStatus, SimError> {
        loop {
            if let RunStatus::Halted = self.run_cycles(1)? {
                return Ok(RunStatus::Halted);
            }
        }
    }

    /// Executes one clock cycle.
    fn cycle(&mut self) -> Result<CycleOutcome, SimError> {
        let old = self.snapshot;
        let mut next = PipelineSnapshot::default();

        // 1. The trace record reflects the snapshot at the start of the
        //    cycle, before anything mutates.
        self.sink
            .record(&PipeTraceRecord::capture(self.cycle_count, &old))?;
        if self.trace {
            self.print_diagram(&old);
        }
        self.cycle_count += 1;

        // 2. Outstanding-miss countdowns.
        if self.imiss.remaining > 0 {
            self.imiss.remaining -= 1;
        }
        if self.dmiss.remaining > 0 {
            self.dmiss.remaining -= 1;
        }
        let i_hold = self.imiss.holding();
        let d_hold = self.dmiss.holding();
        let d_completing = self.dmiss.completing();

        // 3. Writeback. While a D-miss is outstanding the MEM latch is
        //    holding an uncommitted instruction; WB gets a bubble so it is
        //    not written back early.
        next.writeback = if self.dmiss.active {
            PipeInstr::bubble()
        } else {
            self.sim.sim_wb(old.memory)
        };
        if next.writeback.status == StageStatus::Normal && next.writeback.is_halt() {
            self.snapshot.writeback = next.writeback;
            self.halted = true;
            return Ok(CycleOutcome::Halt);
        }

        // 4. Exception detection. A memory trap is older than anything in
        //    ID, so it wins over an illegal-instruction trap.
        let illegal_trap = old.decode.status == StageStatus::Normal
            && !old.decode.is_nop()
            && !old.decode.is_halt()
            && !old.decode.is_legal();
        let mem_trap = old.memory.status == StageStatus::Normal && old.memory.mem_trap;
        if mem_trap {
            next.memory = PipeInstr::squashed();
            next.execute = PipeInstr::squashed();
            next.decode = PipeInstr::squashed();
            next.fetch = PipeInstr::squashed();
            self.pc = EXCEPTION_HANDLER_ADDR;
            self.imiss.clear();
            self.dmiss.clear();
            self.branch_stall = 0;
            self.snapshot = next;
            return Ok(CycleOutcome::Continue);
        }

        // 5. Hazard detection.
        let load_use = hazards::load_use_hazard(&old.execute, &old.decode);

        let mut release_branch = false;
        let mut branch_hold = false;
        let mut branch_ticked = false;
        if self.branch_stall > 0 {
            if self.dmiss.active {
                // The countdown models cycles of pipeline motion; freeze it
                // while the pipe is stopped on a D-miss.
                branch_hold = true;
            } else {
                self.branch_stall -= 1;
                branch_ticked = true;
                if self.branch_stall == 0 {
                    release_branch = true;
                } else {
                    branch_hold = true;
                }
            }
        }

        let pipeline_stall = load_use || branch_hold || d_hold;

        // Count a load-attributable stall cycle at most once, and only when
        // it is the binding reason (not when a D-miss already stalls MEM).
        if (load_use && !d_hold) || (branch_ticked && self.branch_stall_on_load) {
            self.load_use_stalls += 1;
        }

        // 6. Memory stage.
        let mut d_started = false;
        if d_hold {
            next.memory = old.memory;
        } else if d_completing {
            next.memory = self.sim.sim_mem(old.memory);
            self.dmiss.clear();
        } else {
            let mut cand = old.execute;
            // Stores read their data operand one stage late; pick up values
            // the stall logic deliberately did not wait for.
            if cand.writes_mem() && cand.status == StageStatus::Normal {
                cand.op2 = hazards::forward(
                    &cand,
                    None,
                    &old.memory,
                    &old.writeback,
                    cand.op2,
                    Operand::Rs2,
                );
            }
            let accesses = cand.status == StageStatus::Normal
                && cand.is_legal()
                && !cand.is_nop()
                && cand.touches_mem();
            if accesses {
                let op = if cand.writes_mem() {
                    CacheOp::Write
                } else {
                    CacheOp::Read
                };
                if self.dcache.access(cand.mem_addr, op) {
                    next.memory = self.sim.sim_mem(cand);
                } else {
                    self.dmiss.start(self.dcache.miss_latency());
                    // Held in MEM without running the access; it completes
                    // when the countdown expires.
                    next.memory = cand;
                    d_started = true;
                }
            } else {
                next.memory = self.sim.sim_mem(cand);
            }
        }
        // A miss declared or completing this cycle blocks EX/ID/IF advance.
        let mem_busy = d_started || d_completing;

        // 7. Execute stage, plus resolution of a branch leaving its stall.
        let mut branch_taken = false;
        let mut branch_target = 0u64;
        let mut id_written = false;

        if release_branch && mem_busy {
            // The producer ahead of the parked branch just missed in the
            // D-cache; keep the branch parked one more motion cycle.
            self.branch_stall = 1;
            release_branch = false;
        }

        if release_branch {
            let mut b = old.decode;
            if b.reads_rs1 {
                b.op1 = hazards::forward(
                    &b,
                    Some(&old.execute),
                    &old.memory,
                    &old.writeback,
                    b.op1,
                    Operand::Rs1,
                );
            }
            if b.reads_rs2 {
                b.op2 = hazards::forward(
                    &b,
                    Some(&old.execute),
                    &old.memory,
                    &old.writeback,
                    b.op2,
                    Operand::Rs2,
                );
            }
            b = self.sim.resolve_next_pc(b);
            if b.next_pc != b.pc.wrapping_add(INSTRUCTION_BYTES) {
                branch_taken = true;
                branch_target = b.next_pc;
            }
            next.execute = self.sim.sim_ex(b);
            // The fetch behind the branch may be wrong-path; decode emits a
            // bubble and IF holds until the redirect decision lands.
            next.decode = PipeInstr::bubble();
            id_written = true;
        } else if !pipeline_stall && !illegal_trap && !mem_busy {
            let mut c = old.decode;
            if c.reads_rs1 {
                c.op1 = hazards::forward(
                    &c,
                    Some(&old.execute),
                    &old.memory,
                    &old.writeback,
                    c.op1,
                    Operand::Rs1,
                );
            }
            if c.reads_rs2 {
                c.op2 = hazards::forward(
                    &c,
                    Some(&old.execute),
                    &old.memory,
                    &old.writeback,
                    c.op2,
                    Operand::Rs2,
                );
            }
            next.execute = self.sim.sim_ex(c);
        } else {
            next.execute = PipeInstr::bubble();
        }

        // 8. Decode stage.
        let mut branch_deferred = false;
        if !id_written {
            let allow_id = !pipeline_stall
                && !mem_busy
                && !illegal_trap
                && !i_hold
                && !self.imiss.active;
            if allow_id {
                let mut d = self.sim.sim_id(old.fetch);
                if d.status == StageStatus::Speculative {
                    d.status = StageStatus::Normal;
                }
                if d.status == StageStatus::Normal
                    && d.is_legal()
                    && !d.is_nop()
                    && d.is_control_flow()
                {
                    // Producers entering EX and MEM this cycle are exactly
                    // old.decode and old.execute (this path implies both
                    // stages advanced).
                    let delay = hazards::branch_delay(&d, &old.decode, &old.execute);
                    if delay.cycles > 0 {
                        self.branch_stall = delay.cycles;
                        self.branch_stall_on_load = delay.on_load;
                        branch_deferred = true;
                    } else {
                        if d.reads_rs1 {
                            d.op1 = hazards::forward(
                                &d,
                                Some(&old.execute),
                                &old.memory,
                                &old.writeback,
                                d.op1,
                                Operand::Rs1,
                            );
                        }
                        if d.reads_rs2 {
                            d.op2 = hazards::forward(
                                &d,
                                Some(&old.execute),
                                &old.memory,
                                &old.writeback,
                                d.op2,
                                Operand::Rs2,
                            );
                        }
                        d = self.sim.resolve_next_pc(d);
                        if d.next_pc != d.pc.wrapping_add(INSTRUCTION_BYTES) {
                            branch_taken = true;
                            branch_target = d.next_pc;
                        }
                    }
                }
                next.decode = d;
            } else {
                next.decode = old.decode;
            }
        }

        // 9. Fetch stage.
        let fetch_blocked = pipeline_stall
            || mem_busy
            || illegal_trap
            || i_hold
            || self.imiss.active
            || release_branch;
        if !fetch_blocked {
            let mut f = self.sim.sim_if(self.pc);
            if self.icache.access(self.pc, CacheOp::Read) {
                // A fetched control-flow op may redirect one cycle later; a
                // fetch behind an unresolved branch rides on its outcome.
                f.status = if f.is_control_flow() || branch_deferred {
                    StageStatus::Speculative
                } else {
                    StageStatus::Normal
                };
                next.fetch = f;
                self.pc = self.pc.wrapping_add(INSTRUCTION_BYTES);
            } else {
                self.imiss.start(self.icache.miss_latency());
                // Held in IF; PC advances when the miss retires.
                f.status = StageStatus::Normal;
                next.fetch = f;
            }
        } else {
            next.fetch = old.fetch;
        }

        // 10. Taken-branch redirect.
        if branch_taken {
            next.fetch = PipeInstr::squashed();
            self.pc = branch_target;
            self.imiss.clear();
        }

        // 11. Illegal-instruction trap. Applied after the branch redirect:
        //     the illegal instruction in ID is older than any branch that
        //     resolved behind it this cycle.
        if illegal_trap {
            next.decode = PipeInstr::squashed();
            next.execute = PipeInstr::squashed();
            next.fetch = PipeInstr::squashed();
            self.pc = EXCEPTION_HANDLER_ADDR;
            self.branch_stall = 0;
        }

        // 12. I-miss retirement: the withheld fetch address is now good.
        if self.imiss.completing() {
            self.imiss.clear();
            self.pc = self.pc.wrapping_add(INSTRUCTION_BYTES);
        }

        // 13. Commit.
        self.snapshot = next;
        Ok(CycleOutcome::Continue)
    }

    /// Writes the final register/memory dump and statistics files, then
    /// returns the aggregate statistics.
    pub fn finalize(&mut self) -> Result<SimulationStats, SimError> {
        let stats = self.stats();
        if let Some(base) = self.sink.base() {
            let path = format!("{}_reg_mem.out", base);
            let mut out = BufWriter::new(File::create(path)?);
            self.sim.dump_state(&mut out)?;
            out.flush()?;
        }
        self.sink.finish(&stats)?;
        Ok(stats)
    }

    /// Aggregate statistics so far.
    pub fn stats(&self) -> SimulationStats {
        SimulationStats {
            instructions: self.sim.retired(),
            cycles: self.cycle_count,
            icache_hits: self.icache.hits(),
            icache_misses: self.icache.misses(),
            dcache_hits: self.dcache.hits(),
            dcache_misses: self.dcache.misses(),
            load_use_stalls: self.load_use_stalls,
        }
    }

    /// Current pipeline snapshot.
    pub fn snapshot(&self) -> &PipelineSnapshot {
        &self.snapshot
    }

    /// Current program counter.
    pub fn pc(&self) -> u64 {
        self.pc
    }

    /// Cycles executed so far.
    pub fn cycles(&self) -> u64 {
        self.cycle_count
    }

    /// Load-use stall cycles so far.
    pub fn load_use_stalls(&self) -> u64 {
        self.load_use_stalls
    }

    /// Whether a HALT has retired.
    pub fn halted(&self) -> bool {
        self.halted
    }

    /// The instruction cache.
    pub fn icache(&self) -> &Cache {
        &self.icache
    }

    /// The data cache.
    pub fn dcache(&self) -> &Cache {
        &self.dcache
    }

    /// The stage simulator.
    pub fn sim(&self) -> &S {
        &self.sim
    }

    /// Mutable access to the stage simulator.
    pub fn sim_mut(&mut self) -> &mut S {
        &mut self.sim
    }

    fn print_diagram(&self, snap: &PipelineSnapshot) {
        let cell = |i: &PipeInstr| {
            if i.status.is_terminal() || i.is_nop() {
                format!("[{:^10}]", "--")
            } else {
                format!("[{:#010x}]", i.pc)
            }
        };
        eprintln!(
            "cycle {:>6}: {} > {} > {} > {} > {}",
            self.cycle_count,
            cell(&snap.fetch),
            cell(&snap.decode),
            cell(&snap.execute),
            cell(&snap.memory),
            cell(&snap.writeback),
        );
    }
}
