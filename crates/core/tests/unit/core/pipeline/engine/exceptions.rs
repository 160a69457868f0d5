//! Precise exception scenarios.
//!
//! Traps redirect the PC to the handler address and squash every latch
//! strictly younger than the trapping instruction; older instructions
//! retire normally.

use crate::common::builder::InstructionBuilder;
use crate::common::harness::{test_config, TestContext};
use pipesim_core::common::constants::EXCEPTION_HANDLER_ADDR;
use pipesim_core::core::pipeline::latches::StageStatus;
use pipesim_core::RunStatus;

/// Illegal instruction in decode: IF/ID/EX squashed, PC redirected, the
/// older instruction ahead of it still retires.
///
///   0: addi x1, x0, 3
///   4: .word 0xFFFFFFFF   (illegal)
///   8: addi x5, x0, 9     (younger; must never execute)
///  12: ecall
#[test]
fn illegal_instruction_traps_precisely() {
    let program = [
        InstructionBuilder::new().addi(1, 0, 3).build(),
        0xFFFF_FFFF,
        InstructionBuilder::new().addi(5, 0, 9).build(),
        InstructionBuilder::ecall(),
    ];
    let mut ctx = TestContext::with_config(&test_config(1, 1), &program);

    // c5 is the trap cycle: the illegal word sits in decode at its start.
    ctx.run(5);
    assert_eq!(ctx.engine.pc(), EXCEPTION_HANDLER_ADDR);
    assert_eq!(ctx.engine.snapshot().fetch.status, StageStatus::Squashed);
    assert_eq!(ctx.engine.snapshot().decode.status, StageStatus::Squashed);
    assert_eq!(ctx.engine.snapshot().execute.status, StageStatus::Squashed);
    // The older ADDI kept moving and is in the memory latch.
    assert_eq!(ctx.engine.snapshot().memory.raw, program[0]);

    // The handler address holds zero words, which trap again; execution
    // never halts but architectural state stays precise.
    let status = ctx.run(25);
    assert_eq!(status, RunStatus::Completed);
    assert_eq!(ctx.reg(1), 3, "older instruction retires");
    assert_eq!(ctx.reg(5), 0, "younger instruction is squashed");
}

/// Misaligned load: the fault is detected in the memory stage; IF, ID, EX
/// and MEM are squashed in the next snapshot, outstanding misses are
/// cleared, and the faulting instruction commits no register write.
#[test]
fn misaligned_load_takes_memory_trap() {
    let program = [
        InstructionBuilder::new().lw(1, 2, 0).build(),
        InstructionBuilder::ecall(),
    ];
    let mut ctx = TestContext::with_config(&test_config(1, 1), &program);
    ctx.set_reg(2, 0x101);

    // c5 declares the D-miss, c6 completes the access and flags the
    // fault, c7 takes the trap.
    ctx.run(7);
    assert_eq!(ctx.engine.pc(), EXCEPTION_HANDLER_ADDR);
    let snap = *ctx.engine.snapshot();
    assert_eq!(snap.fetch.status, StageStatus::Squashed);
    assert_eq!(snap.decode.status, StageStatus::Squashed);
    assert_eq!(snap.execute.status, StageStatus::Squashed);
    assert_eq!(snap.memory.status, StageStatus::Squashed);
    assert_eq!(snap.writeback.raw, program[0]);
    assert!(snap.writeback.mem_trap);
    assert_eq!(ctx.reg(1), 0, "faulting load must not write back");
}

/// An out-of-range access faults the same way as a misaligned one.
#[test]
fn out_of_range_load_takes_memory_trap() {
    let program = [
        InstructionBuilder::new().lw(1, 2, 0).build(),
        InstructionBuilder::ecall(),
    ];
    let mut ctx = TestContext::with_config(&test_config(1, 1), &program);
    // Aligned, but far beyond the 1 MiB store.
    ctx.set_reg(2, 0x4000_0000);

    ctx.run(7);
    assert_eq!(ctx.engine.pc(), EXCEPTION_HANDLER_ADDR);
    assert_eq!(ctx.engine.snapshot().memory.status, StageStatus::Squashed);
    assert_eq!(ctx.reg(1), 0);
}

/// The HALT sitting in decode behind a faulting load is squashed by the
/// memory trap: the machine keeps running at the handler instead of
/// halting on a wrong-path HALT.
#[test]
fn memory_trap_squashes_younger_halt() {
    let program = [
        InstructionBuilder::new().lw(1, 2, 0).build(),
        InstructionBuilder::ecall(),
    ];
    let mut ctx = TestContext::with_config(&test_config(1, 1), &program);
    ctx.set_reg(2, 0x101);

    let status = ctx.run(30);
    assert_eq!(status, RunStatus::Completed, "squashed HALT must not stop the machine");
    assert!(!ctx.engine.halted());
}
