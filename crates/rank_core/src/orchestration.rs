//! nd-array orchestration around the 1-D filter core.
//!
//! An n-dimensional rank filter along one axis is just the 1-D filter
//! applied to every lane along that axis; lanes share no state, so
//! large arrays run lane-parallel under rayon while small ones stay
//! sequential with one reused scratch buffer.

use crate::error::RankFilterError;
use crate::float_trait::RankFloat;
use crate::line_filter::{rank_filter_line_in_place, validate_line};
use log::debug;
use ndarray::{ArrayD, ArrayViewD, ArrayViewMutD, Axis};
use rayon::prelude::*;

/// Minimum number of lanes before the parallel path pays for itself.
/// Set high to avoid rayon overhead for smaller arrays.
const PARALLEL_LANE_THRESHOLD: usize = 64;

fn validate_axis<F: RankFloat>(
    input: &ArrayViewD<'_, F>,
    half_length: usize,
    rank: f64,
    axis: usize,
) -> Result<(), RankFilterError> {
    if axis >= input.ndim() {
        return Err(RankFilterError::InvalidAxis {
            axis,
            ndim: input.ndim(),
        });
    }
    validate_line(input.len_of(Axis(axis)), half_length, rank)
}

/// Rank-order filter along `axis`, returning a new array.
///
/// Every lane along `axis` is filtered independently with reflective
/// boundaries. Fails before any output is allocated.
pub fn rank_filter_axis<F: RankFloat>(
    input: ArrayViewD<'_, F>,
    half_length: usize,
    rank: f64,
    axis: usize,
) -> Result<ArrayD<F>, RankFilterError> {
    validate_axis(&input, half_length, rank, axis)?;
    let mut output = input.to_owned();
    filter_lanes(output.view_mut(), half_length, rank, axis);
    Ok(output)
}

/// Rank-order filter along `axis`, overwriting `data`.
///
/// Fails before any element is modified.
pub fn rank_filter_axis_in_place<F: RankFloat>(
    data: ArrayViewMutD<'_, F>,
    half_length: usize,
    rank: f64,
    axis: usize,
) -> Result<(), RankFilterError> {
    validate_axis(&data.view(), half_length, rank, axis)?;
    filter_lanes(data, half_length, rank, axis);
    Ok(())
}

/// Filter every lane of a pre-validated view. Lanes are copied into a
/// contiguous scratch buffer so strided views work unchanged.
fn filter_lanes<F: RankFloat>(
    mut data: ArrayViewMutD<'_, F>,
    half_length: usize,
    rank: f64,
    axis: usize,
) {
    let lane_len = data.len_of(Axis(axis));
    let lane_count = data.len() / lane_len;
    let parallel = lane_count >= PARALLEL_LANE_THRESHOLD;
    debug!(
        "rank filter: shape {:?}, axis {}, window {}, rank {}, {} lanes, parallel={}",
        data.shape(),
        axis,
        2 * half_length + 1,
        rank,
        lane_count,
        parallel
    );

    if parallel {
        let lanes: Vec<_> = data.lanes_mut(Axis(axis)).into_iter().collect();
        lanes.into_par_iter().for_each(|mut lane| {
            let mut scratch: Vec<F> = lane.iter().copied().collect();
            // Arguments were validated once for all lanes.
            rank_filter_line_in_place(&mut scratch, half_length, rank).unwrap();
            for (dst, &src) in lane.iter_mut().zip(scratch.iter()) {
                *dst = src;
            }
        });
    } else {
        let mut scratch: Vec<F> = Vec::with_capacity(lane_len);
        for mut lane in data.lanes_mut(Axis(axis)) {
            scratch.clear();
            scratch.extend(lane.iter().copied());
            rank_filter_line_in_place(&mut scratch, half_length, rank).unwrap();
            for (dst, &src) in lane.iter_mut().zip(scratch.iter()) {
                *dst = src;
            }
        }
    }
}
