//! Error taxonomy for the rank filter.
//!
//! All validation happens before any output is written, so a returned
//! error guarantees the destination buffer is untouched.

use thiserror::Error;

/// Errors reported by the rank filter entry points.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RankFilterError {
    /// The window cannot be formed: reflection needs `half_length + 1`
    /// real samples per line.
    #[error("window half length {half_length} does not fit a line of length {len} (need half_length + 1 <= len)")]
    InvalidWindow { half_length: usize, len: usize },

    /// The requested quantile rank is outside `[0, 1]`.
    #[error("rank {rank} is outside [0, 1]")]
    InvalidRank { rank: f64 },

    /// The requested axis does not exist in the input array.
    #[error("axis {axis} is out of bounds for array of dimension {ndim}")]
    InvalidAxis { axis: usize, ndim: usize },
}
