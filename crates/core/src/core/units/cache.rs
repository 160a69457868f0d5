//! Set-associative cache simulator.
//!
//! Timing-only model: a lookup reports hit or miss and updates replacement
//! state, but no data moves through it — payloads live in the memory store,
//! and miss latency is applied by the pipeline engine. Replacement is true
//! LRU, implemented with a monotonic per-cache access counter stamped into
//! each line's `last_used` field.

use crate::common::ConfigError;
use crate::config::CacheParams;

/// Cache operation kind.
///
/// Recorded for accounting; it does not alter placement or replacement.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CacheOp {
    /// Read access (instruction fetch or data load).
    Read,
    /// Write access (data store).
    Write,
}

/// Cache line entry: validity, tag, and the LRU timestamp.
#[derive(Clone, Default)]
struct CacheLine {
    valid: bool,
    tag: u64,
    last_used: u64,
}

/// A set-associative, true-LRU, timing-only cache.
pub struct Cache {
    // Flat line storage; index = (set * ways) + way.
    lines: Vec<CacheLine>,
    num_sets: u64,
    ways: u64,
    block_offset_bits: u32,
    set_index_bits: u32,
    set_index_mask: u64,
    miss_latency: u64,
    access_counter: u64,
    hits: u64,
    misses: u64,
}

impl Cache {
    /// Builds a cache from validated geometry.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the geometry violates the construction
    /// contract (non-power-of-two fields, size not divisible by
    /// `line_bytes * ways`, or a zero miss latency).
    pub fn new(params: &CacheParams) -> Result<Self, ConfigError> {
        params.validate()?;

        let num_sets = params.size_bytes / (params.line_bytes * params.ways);
        // A one-line or one-set geometry collapses the corresponding field
        // to zero bits; the mask is then zero and everything aliases.
        let block_offset_bits = params.line_bytes.trailing_zeros();
        let set_index_bits = num_sets.trailing_zeros();

        Ok(Self {
            lines: vec![CacheLine::default(); (num_sets * params.ways) as usize],
            num_sets,
            ways: params.ways,
            block_offset_bits,
            set_index_bits,
            set_index_mask: num_sets - 1,
            miss_latency: params.miss_latency,
            access_counter: 0,
            hits: 0,
            misses: 0,
        })
    }

    fn set_index(&self, addr: u64) -> u64 {
        (addr >> self.block_offset_bits) & self.set_index_mask
    }

    fn tag(&self, addr: u64) -> u64 {
        addr >> (self.block_offset_bits + self.set_index_bits)
    }

    /// Looks up `addr`, updating hit/miss counters and replacement state.
    ///
    /// On a miss the line is installed immediately: the victim is the first
    /// invalid way, or the valid way with the smallest `last_used` stamp.
    /// Never blocks; the engine charges the configured miss latency.
    ///
    /// # Returns
    ///
    /// `true` on a hit, `false` on a miss.
    pub fn access(&mut self, addr: u64, _op: CacheOp) -> bool {
        let base = (self.set_index(addr) * self.ways) as usize;
        let tag = self.tag(addr);

        for way in 0..self.ways as usize {
            let idx = base + way;
            if self.lines[idx].valid && self.lines[idx].tag == tag {
                self.hits += 1;
                self.access_counter += 1;
                self.lines[idx].last_used = self.access_counter;
                return true;
            }
        }

        self.misses += 1;
        let mut victim = base;
        for way in 0..self.ways as usize {
            let idx = base + way;
            if !self.lines[idx].valid {
                victim = idx;
                break;
            }
            if self.lines[idx].last_used < self.lines[victim].last_used {
                victim = idx;
            }
        }

        self.access_counter += 1;
        self.lines[victim] = CacheLine {
            valid: true,
            tag,
            last_used: self.access_counter,
        };
        false
    }

    /// Whether `addr` is currently resident, without touching any state.
    pub fn contains(&self, addr: u64) -> bool {
        let base = (self.set_index(addr) * self.ways) as usize;
        let tag = self.tag(addr);
        (0..self.ways as usize).any(|way| {
            let line = &self.lines[base + way];
            line.valid && line.tag == tag
        })
    }

    /// Total hits recorded so far.
    pub fn hits(&self) -> u64 {
        self.hits
    }

    /// Total misses recorded so far.
    pub fn misses(&self) -> u64 {
        self.misses
    }

    /// Configured miss latency in cycles.
    pub fn miss_latency(&self) -> u64 {
        self.miss_latency
    }

    /// Number of sets in this cache.
    pub fn num_sets(&self) -> u64 {
        self.num_sets
    }
}
