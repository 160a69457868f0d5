//! Simulation statistics.
//!
//! Aggregate counters for one run: retired instructions, cycles, per-cache
//! hit/miss totals, and load-use stall cycles. The same record backs the
//! console report and the statistics dump file.

use std::io::{self, Write};

/// Aggregate statistics for a simulation run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SimulationStats {
    /// Dynamic instruction count (committed at writeback).
    pub instructions: u64,
    /// Total cycles executed.
    pub cycles: u64,
    /// Instruction cache hits.
    pub icache_hits: u64,
    /// Instruction cache misses.
    pub icache_misses: u64,
    /// Data cache hits.
    pub dcache_hits: u64,
    /// Data cache misses.
    pub dcache_misses: u64,
    /// Cycles stalled on load-use hazards.
    pub load_use_stalls: u64,
}

impl SimulationStats {
    /// Writes the formatted report.
    pub fn write_report(&self, out: &mut dyn Write) -> io::Result<()> {
        writeln!(out, "=========================================")?;
        writeln!(out, "[General]")?;
        writeln!(out, "  Cycles:               {}", self.cycles)?;
        writeln!(out, "  Instructions Retired: {}", self.instructions)?;
        let cpi = if self.instructions > 0 {
            self.cycles as f64 / self.instructions as f64
        } else {
            0.0
        };
        writeln!(out, "  CPI:                  {:.4}", cpi)?;
        writeln!(out)?;
        writeln!(out, "[Pipeline Stalls]")?;
        writeln!(out, "  Load-Use Stalls:      {}", self.load_use_stalls)?;
        writeln!(out)?;
        writeln!(out, "[Caches]")?;

        let mut cache_line = |name: &str, hits: u64, misses: u64| -> io::Result<()> {
            let total = hits + misses;
            if total > 0 {
                writeln!(
                    out,
                    "  {:<12} {:.2}% hit rate ({} / {})",
                    name,
                    (hits as f64 / total as f64) * 100.0,
                    hits,
                    total
                )
            } else {
                writeln!(out, "  {:<12} no accesses", name)
            }
        };
        cache_line("I-Cache:", self.icache_hits, self.icache_misses)?;
        cache_line("D-Cache:", self.dcache_hits, self.dcache_misses)?;
        writeln!(out, "=========================================")?;
        Ok(())
    }

    /// Prints the report to stdout.
    pub fn print(&self) {
        let stdout = io::stdout();
        let _ = self.write_report(&mut stdout.lock());
    }
}
