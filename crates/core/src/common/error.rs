//! Error definitions.
//!
//! This module defines the error types surfaced by the simulator:
//! 1. **Configuration Errors:** Construction-time contract violations (bad cache geometry).
//! 2. **Simulation Errors:** I/O failures while emitting trace or dump files.
//!
//! Both integrate with the standard Rust error traits for system-level reporting.
//! Architectural exceptions (illegal instruction, memory fault) are not errors:
//! they are recovered by a precise redirect inside the pipeline.

use std::fmt;
use std::io;

/// Construction-time configuration violation.
///
/// Cache geometry must satisfy the hardware contract: all of `size_bytes`,
/// `line_bytes` and `ways` are positive powers of two, the size divides
/// evenly into `line_bytes * ways`, and the miss latency is at least one
/// cycle. Violations fail construction; nothing is retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// A geometry field that must be a positive power of two is not.
    ///
    /// Carries the field name and the offending value.
    NotPowerOfTwo(&'static str, u64),

    /// `size_bytes` is not an exact multiple of `line_bytes * ways`.
    GeometryMismatch {
        /// Configured total cache size in bytes.
        size_bytes: u64,
        /// Configured line size in bytes.
        line_bytes: u64,
        /// Configured associativity.
        ways: u64,
    },

    /// The configured miss latency is zero; a miss always costs at least one cycle.
    ZeroMissLatency,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::NotPowerOfTwo(field, value) => {
                write!(f, "cache {} must be a positive power of two, got {}", field, value)
            }
            ConfigError::GeometryMismatch {
                size_bytes,
                line_bytes,
                ways,
            } => write!(
                f,
                "cache size {} is not divisible by line_bytes ({}) * ways ({})",
                size_bytes, line_bytes, ways
            ),
            ConfigError::ZeroMissLatency => write!(f, "cache miss latency must be >= 1 cycle"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Runtime simulation failure.
///
/// The pipeline itself has no fail path; the only runtime errors are I/O
/// failures while writing the per-cycle trace or the final dump files.
#[derive(Debug)]
pub enum SimError {
    /// An output sink could not be written.
    Io(io::Error),
}

impl fmt::Display for SimError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimError::Io(e) => write!(f, "output write failed: {}", e),
        }
    }
}

impl std::error::Error for SimError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SimError::Io(e) => Some(e),
        }
    }
}

impl From<io::Error> for SimError {
    fn from(e: io::Error) -> Self {
        SimError::Io(e)
    }
}
