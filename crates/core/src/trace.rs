//! Per-cycle trace records and output sinks.
//!
//! The engine emits one [`PipeTraceRecord`] per cycle, reflecting the
//! snapshot as it stood at the start of that cycle — before any stage
//! mutates state. Records are appended to `<base>_pipe_state.out`; the
//! final register/memory dump and the statistics report go to
//! `<base>_reg_mem.out` and `<base>_sim_stats.out` at finalization.

use crate::core::pipeline::latches::{PipelineSnapshot, StageStatus};
use crate::stats::SimulationStats;
use std::fs::File;
use std::io::{self, BufWriter, Write};

/// Snapshot of the five stage latches at the start of one cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipeTraceRecord {
    /// Cycle number (first record is cycle 0).
    pub cycle: u64,
    /// PC of the instruction in the fetch latch.
    pub fetch_pc: u64,
    /// Status of the fetch latch.
    pub fetch_status: StageStatus,
    /// Instruction word in the decode latch.
    pub decode_raw: u32,
    /// Status of the decode latch.
    pub decode_status: StageStatus,
    /// Instruction word in the execute latch.
    pub execute_raw: u32,
    /// Status of the execute latch.
    pub execute_status: StageStatus,
    /// Instruction word in the memory latch.
    pub memory_raw: u32,
    /// Status of the memory latch.
    pub memory_status: StageStatus,
    /// Instruction word in the writeback latch.
    pub writeback_raw: u32,
    /// Status of the writeback latch.
    pub writeback_status: StageStatus,
}

impl PipeTraceRecord {
    /// Captures a snapshot into a trace record.
    pub fn capture(cycle: u64, snap: &PipelineSnapshot) -> Self {
        Self {
            cycle,
            fetch_pc: snap.fetch.pc,
            fetch_status: snap.fetch.status,
            decode_raw: snap.decode.raw,
            decode_status: snap.decode.status,
            execute_raw: snap.execute.raw,
            execute_status: snap.execute.status,
            memory_raw: snap.memory.raw,
            memory_status: snap.memory.status,
            writeback_raw: snap.writeback.raw,
            writeback_status: snap.writeback.status,
        }
    }

    /// Writes this record as one formatted line.
    pub fn write_to(&self, out: &mut dyn Write) -> io::Result<()> {
        writeln!(
            out,
            "cycle {:>8}  IF pc={:#010x} {:<11}  ID {:#010x} {:<11}  EX {:#010x} {:<11}  MEM {:#010x} {:<11}  WB {:#010x} {:<11}",
            self.cycle,
            self.fetch_pc,
            self.fetch_status.to_string(),
            self.decode_raw,
            self.decode_status.to_string(),
            self.execute_raw,
            self.execute_status.to_string(),
            self.memory_raw,
            self.memory_status.to_string(),
            self.writeback_raw,
            self.writeback_status.to_string(),
        )
    }
}

/// Destination for trace records and finalization dumps.
pub enum TraceSink {
    /// Discard everything; used by tests and library embedders.
    Disabled,
    /// Append to files named from a user-supplied base.
    Files {
        /// Output base; files are `<base>_pipe_state.out`,
        /// `<base>_reg_mem.out`, and `<base>_sim_stats.out`.
        base: String,
        /// Writer for the per-cycle pipeline trace.
        pipe: BufWriter<File>,
    },
}

impl TraceSink {
    /// A sink that discards all output.
    pub fn disabled() -> Self {
        TraceSink::Disabled
    }

    /// Opens the pipeline trace file for the given output base.
    pub fn to_files(base: &str) -> io::Result<Self> {
        let pipe = BufWriter::new(File::create(format!("{}_pipe_state.out", base))?);
        Ok(TraceSink::Files {
            base: base.to_string(),
            pipe,
        })
    }

    /// Appends one per-cycle record.
    pub fn record(&mut self, rec: &PipeTraceRecord) -> io::Result<()> {
        match self {
            TraceSink::Disabled => Ok(()),
            TraceSink::Files { pipe, .. } => rec.write_to(pipe),
        }
    }

    /// Flushes the pipeline trace and writes the statistics file.
    ///
    /// The register/memory dump is written by the engine, which owns the
    /// simulator; this method only handles the sink-owned files.
    pub fn finish(&mut self, stats: &SimulationStats) -> io::Result<()> {
        match self {
            TraceSink::Disabled => Ok(()),
            TraceSink::Files { base, pipe } => {
                pipe.flush()?;
                let mut out = BufWriter::new(File::create(format!("{}_sim_stats.out", base))?);
                stats.write_report(&mut out)?;
                out.flush()
            }
        }
    }

    /// The output base, when writing to files.
    pub fn base(&self) -> Option<&str> {
        match self {
            TraceSink::Disabled => None,
            TraceSink::Files { base, .. } => Some(base),
        }
    }
}
