//! Simulator configuration.
//!
//! This module defines the configuration structures used to parameterize a
//! simulation run:
//! 1. **Defaults:** Baseline machine constants (cache geometry, memory size).
//! 2. **Structures:** General, memory, and per-cache configuration.
//! 3. **Validation:** The construction-time cache geometry contract.
//!
//! Configuration is supplied as JSON (see the example below) or via
//! `SimConfig::default()`.

use crate::common::ConfigError;
use serde::Deserialize;

/// Default configuration constants.
mod defaults {
    /// Default cache size in bytes (1 KiB).
    pub const CACHE_SIZE: u64 = 1024;

    /// Default cache line size in bytes.
    pub const CACHE_LINE: u64 = 32;

    /// Default cache associativity.
    pub const CACHE_WAYS: u64 = 2;

    /// Default additional miss latency in cycles.
    pub const MISS_LATENCY: u64 = 10;

    /// Default memory store size (1 MiB).
    pub const MEMORY_BYTES: u64 = 1024 * 1024;

    /// Default reset program counter.
    pub const START_PC: u64 = 0;
}

/// Root configuration for one simulation.
///
/// # Examples
///
/// Deserializing from JSON:
///
/// ```
/// use pipesim_core::config::SimConfig;
///
/// let json = r#"{
///     "general": { "start_pc": 0, "trace": false },
///     "memory": { "size_bytes": 1048576 },
///     "icache": { "size_bytes": 1024, "line_bytes": 32, "ways": 2, "miss_latency": 10 },
///     "dcache": { "size_bytes": 2048, "line_bytes": 64, "ways": 4, "miss_latency": 20 }
/// }"#;
///
/// let config: SimConfig = serde_json::from_str(json).unwrap();
/// assert_eq!(config.dcache.ways, 4);
/// assert_eq!(config.dcache.miss_latency, 20);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SimConfig {
    /// General simulation settings.
    #[serde(default)]
    pub general: GeneralConfig,
    /// Memory store configuration.
    #[serde(default)]
    pub memory: MemoryConfig,
    /// Instruction cache configuration.
    #[serde(default)]
    pub icache: CacheParams,
    /// Data cache configuration.
    #[serde(default)]
    pub dcache: CacheParams,
}

impl SimConfig {
    /// Validates both cache configurations.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.icache.validate()?;
        self.dcache.validate()
    }
}

/// General simulation settings.
#[derive(Debug, Clone, Deserialize)]
pub struct GeneralConfig {
    /// Reset program counter.
    #[serde(default = "GeneralConfig::default_start_pc")]
    pub start_pc: u64,

    /// Enable per-cycle pipeline diagrams on stderr.
    #[serde(default)]
    pub trace: bool,
}

impl GeneralConfig {
    fn default_start_pc() -> u64 {
        defaults::START_PC
    }
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            start_pc: defaults::START_PC,
            trace: false,
        }
    }
}

/// Memory store configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct MemoryConfig {
    /// Memory store size in bytes.
    #[serde(default = "MemoryConfig::default_size")]
    pub size_bytes: u64,
}

impl MemoryConfig {
    fn default_size() -> u64 {
        defaults::MEMORY_BYTES
    }
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            size_bytes: defaults::MEMORY_BYTES,
        }
    }
}

/// Geometry and timing of one cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct CacheParams {
    /// Total cache size in bytes.
    #[serde(default = "CacheParams::default_size")]
    pub size_bytes: u64,

    /// Cache line size in bytes.
    #[serde(default = "CacheParams::default_line")]
    pub line_bytes: u64,

    /// Associativity (number of ways).
    #[serde(default = "CacheParams::default_ways")]
    pub ways: u64,

    /// Additional miss latency in cycles.
    #[serde(default = "CacheParams::default_miss_latency")]
    pub miss_latency: u64,
}

impl CacheParams {
    fn default_size() -> u64 {
        defaults::CACHE_SIZE
    }

    fn default_line() -> u64 {
        defaults::CACHE_LINE
    }

    fn default_ways() -> u64 {
        defaults::CACHE_WAYS
    }

    fn default_miss_latency() -> u64 {
        defaults::MISS_LATENCY
    }

    /// Checks the construction-time geometry contract.
    ///
    /// `size_bytes`, `line_bytes` and `ways` must be positive powers of
    /// two, the size must divide evenly into `line_bytes * ways` sets, and
    /// the miss latency must be at least one cycle.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.size_bytes.is_power_of_two() {
            return Err(ConfigError::NotPowerOfTwo("size_bytes", self.size_bytes));
        }
        if !self.line_bytes.is_power_of_two() {
            return Err(ConfigError::NotPowerOfTwo("line_bytes", self.line_bytes));
        }
        if !self.ways.is_power_of_two() {
            return Err(ConfigError::NotPowerOfTwo("ways", self.ways));
        }
        let set_bytes = self.line_bytes * self.ways;
        if self.size_bytes < set_bytes || self.size_bytes % set_bytes != 0 {
            return Err(ConfigError::GeometryMismatch {
                size_bytes: self.size_bytes,
                line_bytes: self.line_bytes,
                ways: self.ways,
            });
        }
        if self.miss_latency == 0 {
            return Err(ConfigError::ZeroMissLatency);
        }
        Ok(())
    }
}

impl Default for CacheParams {
    fn default() -> Self {
        Self {
            size_bytes: defaults::CACHE_SIZE,
            line_bytes: defaults::CACHE_LINE,
            ways: defaults::CACHE_WAYS,
            miss_latency: defaults::MISS_LATENCY,
        }
    }
}
