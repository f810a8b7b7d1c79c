//! Float trait abstraction for f32/f64 support.
//!
//! This module provides a unified trait for floating-point samples,
//! enabling the rank filter to work with both f32 and f64 precision.

use num_traits::{Float, FromPrimitive, NumAssign};
use std::cmp::Ordering;
use std::fmt::Debug;
use std::iter::Sum;

/// Trait alias for floating point types supported by the rank filter.
///
/// This trait combines all the bounds needed for the filter core:
/// - Basic float operations (Float, NumAssign)
/// - Conversion from primitive types (FromPrimitive)
/// - Iteration support (Sum)
/// - Debug printing
///
/// It also exposes the IEEE-754 `totalOrder` comparison, which the
/// sorted window relies on: every pair of samples must compare, NaN
/// included, or the ordered structure loses elements.
pub trait RankFloat:
    Float + FromPrimitive + NumAssign + Sum + Debug + Send + Sync + 'static
{
    /// IEEE-754 total-order comparison (NaN sorts above +inf, -NaN below -inf).
    fn total_cmp(&self, other: &Self) -> Ordering;
}

impl RankFloat for f32 {
    #[inline]
    fn total_cmp(&self, other: &Self) -> Ordering {
        f32::total_cmp(self, other)
    }
}

impl RankFloat for f64 {
    #[inline]
    fn total_cmp(&self, other: &Self) -> Ordering {
        f64::total_cmp(self, other)
    }
}
