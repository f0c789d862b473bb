//! Configuration errors.
//!
//! Runtime code clamps out-of-range options instead of failing; these errors exist for hosts
//! that load options from configuration and want to reject bad values up front.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OptionsError {
    /// `chunk_size` must be at least one byte.
    #[error("chunk size must be greater than zero")]
    ZeroChunkSize,

    /// The fence growth cap must allow at least a full chunk.
    #[error("fence growth limit of {percent}% is below the chunk size (minimum 100%)")]
    GrowthBelowChunk { percent: usize },

    /// Each reveal must disclose at least one segment.
    #[error("reveal increment must be greater than zero")]
    ZeroIncrement,
}
