//! Common utilities and types shared across the simulator.
//!
//! 1. **Constants:** Architectural constants and instruction field masks.
//! 2. **Error Handling:** Configuration and runtime error types.

/// Common constants used throughout the simulator.
pub mod constants;

/// Error types.
pub mod error;

pub use error::{ConfigError, SimError};
