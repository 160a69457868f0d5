//! The five-stage pipeline: latches, hazard logic, and the control engine.

/// Per-cycle pipeline control engine.
pub mod engine;
/// Hazard detection and operand forwarding.
pub mod hazards;
/// Latch and instruction descriptor structures.
pub mod latches;

pub use engine::{PipelineEngine, RunStatus};
pub use latches::{PipeInstr, PipelineSnapshot, StageStatus};
