//! Straight-line execution tests.
//!
//! With no hazards and no data accesses, a program of N instructions
//! (HALT included) retires in `N + 4 + sum-of-miss-latencies` cycles: the
//! classic fill time plus whatever the cold instruction fetch costs.

use crate::common::builder::InstructionBuilder;
use crate::common::harness::{test_config, TestContext};

fn two_addi_then_halt() -> [u32; 3] {
    [
        InstructionBuilder::new().addi(1, 0, 5).build(),
        InstructionBuilder::new().addi(2, 0, 7).build(),
        InstructionBuilder::ecall(),
    ]
}

/// Default machine: the first fetch misses with a 10-cycle latency, every
/// later fetch hits in the same 32-byte line.
#[test]
fn cold_straight_line_cycle_count() {
    let mut ctx = TestContext::new(&two_addi_then_halt());
    ctx.run_to_halt(100);

    assert_eq!(ctx.reg(1), 5);
    assert_eq!(ctx.reg(2), 7);
    // 3 instructions + 4 fill cycles + 10-cycle cold fetch miss.
    assert_eq!(ctx.engine.cycles(), 17);
    assert_eq!(ctx.engine.icache().misses(), 1);
    assert_eq!(ctx.engine.load_use_stalls(), 0);
    assert_eq!(ctx.engine.dcache().hits() + ctx.engine.dcache().misses(), 0);
}

/// The same program with a 2-cycle fetch miss latency.
#[test]
fn miss_latency_shifts_halt_linearly() {
    let mut ctx = TestContext::with_config(&test_config(2, 1), &two_addi_then_halt());
    ctx.run_to_halt(100);
    assert_eq!(ctx.engine.cycles(), 9);
}

/// Inserting a NOP costs exactly one cycle and introduces no stalls.
#[test]
fn nop_is_one_cycle_and_hazard_free() {
    let program = [
        InstructionBuilder::new().addi(1, 0, 5).build(),
        InstructionBuilder::new().nop().build(),
        InstructionBuilder::new().addi(2, 0, 7).build(),
        InstructionBuilder::ecall(),
    ];
    let mut ctx = TestContext::with_config(&test_config(2, 1), &program);
    ctx.run_to_halt(100);

    assert_eq!(ctx.reg(1), 5);
    assert_eq!(ctx.reg(2), 7);
    assert_eq!(ctx.engine.cycles(), 10);
    assert_eq!(ctx.engine.load_use_stalls(), 0);
}

/// Aggregate statistics mirror the engine counters.
#[test]
fn stats_record_matches_run() {
    let mut ctx = TestContext::new(&two_addi_then_halt());
    ctx.run_to_halt(100);

    let stats = ctx.engine.stats();
    assert_eq!(stats.cycles, 17);
    assert_eq!(stats.instructions, 3, "two ADDIs plus the HALT retire");
    assert_eq!(stats.icache_misses, 1);
    assert_eq!(stats.icache_hits, 4);
    assert_eq!(stats.load_use_stalls, 0);
    assert_eq!(stats.dcache_hits + stats.dcache_misses, 0);
}

/// An ALU producer feeding the next instruction is covered by the EX/EX
/// bypass: no stall, correct value.
#[test]
fn back_to_back_alu_dependency_forwards() {
    let program = [
        InstructionBuilder::new().addi(1, 0, 21).build(),
        InstructionBuilder::new().add(2, 1, 1).build(),
        InstructionBuilder::new().sub(3, 2, 1).build(),
        InstructionBuilder::ecall(),
    ];
    let mut ctx = TestContext::with_config(&test_config(1, 1), &program);
    ctx.run_to_halt(100);

    assert_eq!(ctx.reg(1), 21);
    assert_eq!(ctx.reg(2), 42);
    assert_eq!(ctx.reg(3), 21);
    assert_eq!(ctx.engine.load_use_stalls(), 0);
}
