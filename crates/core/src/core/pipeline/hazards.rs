//! Data hazard detection and operand forwarding.
//!
//! Pure functions over pipeline latches:
//! 1. **Forwarding:** Resolves an operand by scanning later-stage sources in
//!    priority order, bypassing the register file.
//! 2. **Load-Use Detection:** Identifies the one RAW hazard forwarding cannot
//!    cover: a load's consumer arriving one cycle too early.
//! 3. **Control-Hazard Policy:** Computes how long a branch must wait in
//!    decode before its operands become forwardable.

use crate::core::pipeline::latches::PipeInstr;

/// Which source operand a forwarding request is for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operand {
    /// First source register.
    Rs1,
    /// Second source register.
    Rs2,
}

/// Stall policy decision for a control-flow instruction in decode.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BranchDelay {
    /// Cycles the branch must wait before resolving; zero means resolve now.
    pub cycles: u8,
    /// Whether the blocking producer is a load (counts toward load-use stalls).
    pub on_load: bool,
}

/// Whether `consumer` reads a register that `producer` writes.
pub fn depends_on(consumer: &PipeInstr, producer: &PipeInstr) -> bool {
    if producer.status.is_terminal() || !producer.writes_rd || producer.rd == 0 {
        return false;
    }
    (consumer.reads_rs1 && consumer.rs1 == producer.rd)
        || (consumer.reads_rs2 && consumer.rs2 == producer.rd)
}

/// Resolves one source operand against later-stage results.
///
/// Sources are inspected youngest-first: the EX/MEM latch, then the MEM/WB
/// latch, then the post-writeback latch. A source matches when it writes a
/// non-zero `rd` equal to the requested operand's register and is not an
/// empty or discarded slot; the first match wins. A load cannot supply its
/// value from the EX/MEM latch (the access has not happened yet) — that
/// case is a hazard, not a forward — so a load there is skipped and an
/// older source may satisfy the request instead.
///
/// # Arguments
///
/// * `inst` - The consumer needing the operand.
/// * `ex_src` - EX/MEM latch source, if one is visible to the consumer.
/// * `mem_src` - MEM/WB latch source.
/// * `wb_src` - Post-writeback source.
/// * `orig` - Value latched from the register file.
/// * `which` - Which of the consumer's operands to resolve.
///
/// # Returns
///
/// The forwarded value, or `orig` when no source matches.
pub fn forward(
    inst: &PipeInstr,
    ex_src: Option<&PipeInstr>,
    mem_src: &PipeInstr,
    wb_src: &PipeInstr,
    orig: u64,
    which: Operand,
) -> u64 {
    let reg = match which {
        Operand::Rs1 => inst.rs1,
        Operand::Rs2 => inst.rs2,
    };
    if reg == 0 {
        return orig;
    }

    let matches = |src: &PipeInstr| {
        !src.status.is_terminal() && src.writes_rd && src.rd != 0 && src.rd == reg
    };

    if let Some(ex) = ex_src {
        if matches(ex) && !ex.reads_mem() {
            return ex.alu;
        }
    }
    if matches(mem_src) {
        return if mem_src.reads_mem() {
            mem_src.mem_result
        } else {
            mem_src.alu
        };
    }
    if matches(wb_src) {
        return if wb_src.reads_mem() {
            wb_src.mem_result
        } else {
            wb_src.alu
        };
    }
    orig
}

/// Detects a load-use hazard between the EX and ID latches.
///
/// Raised when the instruction in execute is a load writing a non-zero
/// register that the instruction in decode reads. A store's data operand
/// (`rs2`) is exempt: it is late-forwarded at the memory stage and
/// therefore never needs a stall.
pub fn load_use_hazard(execute: &PipeInstr, decode: &PipeInstr) -> bool {
    if execute.status.is_terminal()
        || !execute.reads_mem()
        || !execute.writes_rd
        || execute.rd == 0
    {
        return false;
    }
    if decode.status.is_terminal() {
        return false;
    }
    (decode.reads_rs1 && decode.rs1 == execute.rd)
        || (decode.reads_rs2 && decode.rs2 == execute.rd && !decode.writes_mem())
}

/// Computes the control-hazard stall for a branch entering decode.
///
/// `ex_next` is the instruction advancing into execute this cycle and
/// `mem_next` the one advancing into memory. The policy:
///
/// - producer entering EX, non-load: 1 cycle (result forwardable from the
///   EX/MEM latch next cycle);
/// - producer entering EX, load: 2 cycles (result arrives after MEM);
/// - producer entering MEM, load: 1 cycle;
/// - otherwise the operands are already forwardable and the branch
///   resolves immediately.
pub fn branch_delay(branch: &PipeInstr, ex_next: &PipeInstr, mem_next: &PipeInstr) -> BranchDelay {
    if depends_on(branch, ex_next) {
        return BranchDelay {
            cycles: if ex_next.reads_mem() { 2 } else { 1 },
            on_load: ex_next.reads_mem(),
        };
    }
    if depends_on(branch, mem_next) && mem_next.reads_mem() {
        return BranchDelay {
            cycles: 1,
            on_load: true,
        };
    }
    BranchDelay::default()
}
