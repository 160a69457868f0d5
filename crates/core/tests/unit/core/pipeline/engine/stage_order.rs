//! Stage-invocation ordering.
//!
//! Within a cycle the engine drives stages writeback-first, so every
//! stage reads latches as they stood at the end of the previous cycle.
//! Verified against the mocked stage-simulator seam.

use crate::common::mocks::MockStage;
use mockall::Sequence;
use pipesim_core::core::pipeline::latches::PipeInstr;
use pipesim_core::{PipelineEngine, SimConfig, TraceSink};

/// One cold cycle calls WB, MEM, EX, ID, IF — in that order, once each.
#[test]
fn stages_run_writeback_first() {
    let mut seq = Sequence::new();
    let mut mock = MockStage::new();

    mock.expect_sim_wb()
        .times(1)
        .in_sequence(&mut seq)
        .returning(|inst| inst);
    mock.expect_sim_mem()
        .times(1)
        .in_sequence(&mut seq)
        .returning(|inst| inst);
    mock.expect_sim_ex()
        .times(1)
        .in_sequence(&mut seq)
        .returning(|inst| inst);
    mock.expect_sim_id()
        .times(1)
        .in_sequence(&mut seq)
        .returning(|inst| inst);
    mock.expect_sim_if()
        .times(1)
        .in_sequence(&mut seq)
        .returning(|pc| {
            let mut inst = PipeInstr::idle();
            inst.pc = pc;
            inst
        });

    let config = SimConfig::default();
    let mut engine =
        PipelineEngine::new(&config, mock, TraceSink::disabled()).expect("valid config");
    engine.run_cycles(1).expect("one cycle");
}

/// The fetch stage is asked for the configured reset PC.
#[test]
fn fetch_uses_start_pc() {
    let mut mock = MockStage::new();
    mock.expect_sim_wb().returning(|inst| inst);
    mock.expect_sim_mem().returning(|inst| inst);
    mock.expect_sim_ex().returning(|inst| inst);
    mock.expect_sim_id().returning(|inst| inst);
    mock.expect_sim_if()
        .withf(|pc| *pc == 0x400)
        .returning(|pc| {
            let mut inst = PipeInstr::idle();
            inst.pc = pc;
            inst
        });

    let mut config = SimConfig::default();
    config.general.start_pc = 0x400;
    let mut engine =
        PipelineEngine::new(&config, mock, TraceSink::disabled()).expect("valid config");
    engine.run_cycles(1).expect("one cycle");
}
