//! Cycle-accurate five-stage pipeline simulator library.
//!
//! This crate implements an in-order IF/ID/EX/MEM/WB pipeline with split
//! instruction and data caches. It provides:
//! 1. **Core:** The pipeline control engine — hazards, forwarding, early
//!    branch resolution with speculation recovery, cache-miss overlap, and
//!    precise exceptions.
//! 2. **Units:** A set-associative true-LRU timing-only cache.
//! 3. **Simulation:** The stage simulator (decoder, ALU, register file),
//!    memory store, and program loaders.
//! 4. **Output:** Per-cycle pipeline traces, final state dumps, and
//!    aggregate statistics.

/// Common constants and error types.
pub mod common;
/// Simulator configuration (defaults, per-cache geometry, validation).
pub mod config;
/// Processor core (pipeline engine, caches).
pub mod core;
/// Instruction set (opcodes, decoding, classification).
pub mod isa;
/// Flat memory store.
pub mod mem;
/// Stage simulator and program loaders.
pub mod sim;
/// Aggregate simulation statistics.
pub mod stats;
/// Per-cycle trace records and output sinks.
pub mod trace;

/// Per-cache geometry and root configuration.
pub use crate::config::{CacheParams, SimConfig};
/// The pipeline engine; construct with [`PipelineEngine::new`].
pub use crate::core::pipeline::engine::{PipelineEngine, RunStatus};
/// Flat memory store backing all architectural accesses.
pub use crate::mem::MemoryStore;
/// Concrete stage simulator and its trait seam.
pub use crate::sim::{Simulator, StageSim};
/// Aggregate statistics record.
pub use crate::stats::SimulationStats;
/// Trace output sink.
pub use crate::trace::TraceSink;
