//! Streaming rank-order (quantile) filter.
//!
//! Pure Rust implementation of a sliding-window rank-order filter with
//! reflective boundary handling. The 1-D core maintains the k-th order
//! statistic of the moving window incrementally, one tree
//! insert/remove pair per sample instead of a sort per window; the
//! orchestration layer applies it along any axis of an ndarray.

pub mod error;
pub mod float_trait;
pub mod line_filter;
pub mod orchestration;
mod sorted_window;

// Re-export commonly used items at the crate root
pub use error::RankFilterError;
pub use float_trait::RankFloat;
pub use line_filter::{apply_1d_rank_filter, rank_filter_line_in_place};
pub use orchestration::{rank_filter_axis, rank_filter_axis_in_place};
