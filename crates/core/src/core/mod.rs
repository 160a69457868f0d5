//! Processor core: pipeline control and hardware units.

/// Pipeline latches, hazards, and the control engine.
pub mod pipeline;
/// Caches and other units.
pub mod units;

pub use pipeline::{PipelineEngine, RunStatus};
