//! Hardware units consulted by the pipeline.

/// Set-associative timing-only cache.
pub mod cache;

pub use cache::{Cache, CacheOp};
