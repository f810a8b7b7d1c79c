//! Streaming 1-D rank-order filter.
//!
//! One pass over a line maintains the k-th order statistic of a
//! sliding window of `2 * half_length + 1` samples. The window lives
//! in two structures at once: a [`SortedWindow`] ordered by value and
//! a `VecDeque` of handles ordered by arrival time. Each step evicts
//! the oldest entry, inserts the incoming sample, and repositions the
//! rank pointer by at most one sorted position, so a step costs one
//! tree insert/remove pair instead of a re-sort.
//!
//! Boundaries are mirror-reflected: the window at position 0 sees
//! `x[h], .., x[1], x[0], x[1], .., x[h]` (the edge sample is not
//! repeated), and the tail is flushed symmetrically by reading
//! already-windowed values back out of the temporal queue.

use crate::error::RankFilterError;
use crate::float_trait::RankFloat;
use crate::sorted_window::{NodeHandle, SortedWindow};
use std::collections::VecDeque;

/// Where the evicted and inserted samples sit relative to the current
/// rank value. Exactly one variant applies per step; the variant alone
/// decides whether the rank pointer holds, retreats, or advances.
///
/// "Below" here means at-or-below in window order. Value ties resolve
/// by age: the evicted entry is the oldest in the window, so on a tie
/// it orders below the pointer; the inserted entry is the newest, so
/// on a tie it orders above. That is why plain value comparisons are
/// enough to classify correctly.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum WindowShift {
    /// Evicted above the rank, inserted at/above: pointer unchanged.
    EvictAboveInsertAbove,
    /// Evicted at/below, inserted below: the pointer's sorted index is
    /// unchanged (one entry below it left, one entered), so it holds —
    /// unless the pointer is itself the evicted entry, in which case it
    /// retreats onto the entry that now occupies its index.
    EvictBelowInsertBelow,
    /// Evicted above, inserted below: pointer retreats one entry.
    EvictAboveInsertBelow,
    /// Evicted at/below, inserted at/above: pointer advances one entry.
    EvictBelowInsertAbove,
}

/// Classify one slide step from the three values alone.
pub(crate) fn classify<F: RankFloat>(rank_value: F, evicted: F, inserted: F) -> WindowShift {
    let above_evicted = rank_value.total_cmp(&evicted).is_lt();
    let below_inserted = rank_value.total_cmp(&inserted).is_le();
    match (above_evicted, below_inserted) {
        (true, true) => WindowShift::EvictAboveInsertAbove,
        (false, false) => WindowShift::EvictBelowInsertBelow,
        (true, false) => WindowShift::EvictAboveInsertBelow,
        (false, true) => WindowShift::EvictBelowInsertAbove,
    }
}

/// Mirror-reflect the head of a line: returns `[x[h], x[h-1], .., x[0]]`.
///
/// Requires `half_length < line.len()`, checked by the caller.
fn reflect_head<F: RankFloat>(line: &[F], half_length: usize) -> Vec<F> {
    let mut head: Vec<F> = line[..=half_length].to_vec();
    head.reverse();
    head
}

/// Validate the line-level contract: rank in [0, 1] and enough samples
/// to reflect a full window.
pub(crate) fn validate_line(
    len: usize,
    half_length: usize,
    rank: f64,
) -> Result<(), RankFilterError> {
    if !(0.0..=1.0).contains(&rank) {
        return Err(RankFilterError::InvalidRank { rank });
    }
    if half_length + 1 > len {
        return Err(RankFilterError::InvalidWindow { half_length, len });
    }
    Ok(())
}

/// One slide of the window: `evicted` has already been popped from the
/// temporal queue; insert `next_value`, fix up the rank pointer, and
/// return the new rank value.
///
/// When the pointer sits on the evicted entry, the insert happens
/// first and the pointer steps to a neighbor while the evicted entry
/// is still in the tree; only then is it removed. In every other case
/// the pointer is not on the evicted entry and remove-then-insert is
/// safe.
fn slide_step<F: RankFloat>(
    window: &mut SortedWindow<F>,
    queue: &mut VecDeque<NodeHandle>,
    rank_point: &mut NodeHandle,
    evicted: NodeHandle,
    next_value: F,
    seq: u64,
) -> F {
    let rank_value = window.value(*rank_point);
    let evicted_value = window.value(evicted);

    match classify(rank_value, evicted_value, next_value) {
        WindowShift::EvictAboveInsertAbove => {
            window.remove(evicted);
            queue.push_back(window.insert(next_value, seq));
        }
        WindowShift::EvictBelowInsertBelow => {
            if *rank_point == evicted {
                queue.push_back(window.insert(next_value, seq));
                *rank_point = window.prev(evicted).unwrap();
                window.remove(evicted);
            } else {
                // One entry below the pointer out, one in: its sorted
                // index is unchanged.
                window.remove(evicted);
                queue.push_back(window.insert(next_value, seq));
            }
        }
        WindowShift::EvictAboveInsertBelow => {
            window.remove(evicted);
            queue.push_back(window.insert(next_value, seq));
            *rank_point = window.prev(*rank_point).unwrap();
        }
        WindowShift::EvictBelowInsertAbove => {
            if *rank_point == evicted {
                queue.push_back(window.insert(next_value, seq));
                *rank_point = window.next(evicted).unwrap();
                window.remove(evicted);
            } else {
                window.remove(evicted);
                queue.push_back(window.insert(next_value, seq));
                *rank_point = window.next(*rank_point).unwrap();
            }
        }
    }

    window.value(*rank_point)
}

/// Rank-order filter one line in place.
///
/// Safe to run in place because the pass reads position `t + half_length`
/// or later before it writes position `t`; the write cursor never
/// catches up to the read cursor.
pub fn rank_filter_line_in_place<F: RankFloat>(
    line: &mut [F],
    half_length: usize,
    rank: f64,
) -> Result<(), RankFilterError> {
    validate_line(line.len(), half_length, rank)?;

    let len = line.len();
    let window_len = 2 * half_length + 1;

    let mut window: SortedWindow<F> = SortedWindow::with_capacity(window_len + 1);
    let mut queue: VecDeque<NodeHandle> = VecDeque::with_capacity(window_len);
    let mut seq: u64 = 0;

    // Seed the window with the reflected head: x[h]..x[1], then x[0]..x[h].
    let head = reflect_head(line, half_length);
    for &v in head.iter().take(half_length) {
        queue.push_back(window.insert(v, seq));
        seq += 1;
    }
    for &v in head.iter().rev() {
        queue.push_back(window.insert(v, seq));
        seq += 1;
    }

    debug_assert_eq!(window.len(), window_len);

    let rank_index = (rank * (window_len - 1) as f64).round() as usize;
    let mut rank_point = window.nth(rank_index);
    line[0] = window.value(rank_point);

    // Roll the window forward one sample at a time. After the real
    // input runs out, `reflect_pos` walks back through the temporal
    // queue two entries per step, mirroring the tail the same way the
    // head was mirrored.
    let mut read_pos = half_length + 1;
    let mut reflect_pos = window_len - 1;
    let mut write_pos = 1;
    while read_pos < len || reflect_pos > 0 {
        let evicted = queue.pop_front().unwrap();
        let next_value = if read_pos < len {
            let v = line[read_pos];
            read_pos += 1;
            v
        } else {
            reflect_pos -= 2;
            window.value(queue[reflect_pos])
        };
        line[write_pos] = slide_step(
            &mut window,
            &mut queue,
            &mut rank_point,
            evicted,
            next_value,
            seq,
        );
        seq += 1;
        write_pos += 1;
    }
    debug_assert_eq!(write_pos, len);

    Ok(())
}

/// Rank-order filter `input` into `output` with reflective boundaries.
///
/// `output[i]` becomes the value at sorted position
/// `round(rank * 2 * half_length)` of the window centered at `i`.
/// Validation happens before `output` is touched; on error the buffer
/// is returned unmodified.
pub fn apply_1d_rank_filter<F: RankFloat>(
    input: &[F],
    output: &mut [F],
    half_length: usize,
    rank: f64,
) -> Result<(), RankFilterError> {
    validate_line(input.len(), half_length, rank)?;
    assert!(
        output.len() >= input.len(),
        "output length {} shorter than input length {}",
        output.len(),
        input.len()
    );

    let out = &mut output[..input.len()];
    out.copy_from_slice(input);
    rank_filter_line_in_place(out, half_length, rank)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Reference oracle: sort the mirrored window explicitly at every
    /// position and pick the rounded rank index.
    fn brute_force_line(line: &[f64], half_length: usize, rank: f64) -> Vec<f64> {
        let len = line.len();
        let window_len = 2 * half_length + 1;
        let rank_index = (rank * (window_len - 1) as f64).round() as usize;

        let mirror = |j: isize| -> f64 {
            let p = if j < 0 {
                -j
            } else if j as usize >= len {
                2 * (len as isize - 1) - j
            } else {
                j
            };
            line[p as usize]
        };

        (0..len as isize)
            .map(|i| {
                let mut window: Vec<f64> =
                    (i - half_length as isize..=i + half_length as isize).map(mirror).collect();
                window.sort_by(|a, b| a.total_cmp(b));
                window[rank_index]
            })
            .collect()
    }

    fn run(line: &[f64], half_length: usize, rank: f64) -> Vec<f64> {
        let mut output = vec![0.0; line.len()];
        apply_1d_rank_filter(line, &mut output, half_length, rank).unwrap();
        output
    }

    // ==================== Classifier Tests ====================

    #[test]
    fn test_classify_truth_table() {
        // rank value strictly between evicted and inserted, all cases.
        assert_eq!(classify(2.0, 5.0, 3.0), WindowShift::EvictAboveInsertAbove);
        assert_eq!(classify(4.0, 3.0, 1.0), WindowShift::EvictBelowInsertBelow);
        assert_eq!(classify(4.0, 5.0, 1.0), WindowShift::EvictAboveInsertBelow);
        assert_eq!(classify(4.0, 3.0, 9.0), WindowShift::EvictBelowInsertAbove);
    }

    #[test]
    fn test_classify_ties_resolve_by_age() {
        // Evicted equals the rank value: the evicted entry is older,
        // so it counts as at-or-below.
        assert_eq!(classify(5.0, 5.0, 1.0), WindowShift::EvictBelowInsertBelow);
        assert_eq!(classify(5.0, 5.0, 9.0), WindowShift::EvictBelowInsertAbove);
        // Inserted equals the rank value: the new entry is younger,
        // so it counts as at-or-above.
        assert_eq!(classify(5.0, 7.0, 5.0), WindowShift::EvictAboveInsertAbove);
        assert_eq!(classify(5.0, 5.0, 5.0), WindowShift::EvictBelowInsertAbove);
    }

    // ==================== Golden Vector Tests ====================

    #[test]
    fn test_golden_median_vector() {
        let output = run(&[1.0, 5.0, 2.0, 8.0, 3.0], 1, 0.5);
        assert_eq!(output, vec![5.0, 2.0, 5.0, 3.0, 8.0]);
    }

    #[test]
    fn test_pointer_holds_when_both_changes_are_below() {
        // At index 2 the window slides from [1,2,3] to [2,3,0]: the
        // evicted 1 and the inserted 0 are both below the median
        // holder, whose sorted index therefore does not move. A
        // spurious retreat here would emit 0 instead of 2.
        let output = run(&[1.0, 2.0, 3.0, 0.0], 1, 0.5);
        assert_eq!(output, vec![2.0, 2.0, 2.0, 3.0]);
        assert_eq!(output, brute_force_line(&[1.0, 2.0, 3.0, 0.0], 1, 0.5));
    }

    #[test]
    fn test_length_preserved() {
        for len in 1..12usize {
            let line: Vec<f64> = (0..len).map(|i| (i as f64).sin()).collect();
            for half_length in 0..len {
                assert_eq!(run(&line, half_length, 0.5).len(), len);
            }
        }
    }

    #[test]
    fn test_constant_line_is_fixed_point() {
        let line = vec![3.25f64; 17];
        for half_length in 0..17 {
            for rank in [0.0, 0.25, 0.5, 1.0] {
                assert_eq!(run(&line, half_length, rank), line);
            }
        }
    }

    #[test]
    fn test_zero_half_length_is_identity() {
        let line = vec![4.0, -1.0, 7.5, 0.0, 2.0];
        for rank in [0.0, 0.5, 1.0] {
            assert_eq!(run(&line, 0, rank), line);
        }
    }

    #[test]
    fn test_rank_endpoints_are_window_min_max() {
        let line = vec![4.0, -1.0, 7.5, 0.0, 2.0, 2.0, -3.5, 9.0];
        for half_length in 1..4 {
            assert_eq!(
                run(&line, half_length, 0.0),
                brute_force_line(&line, half_length, 0.0),
                "min filter, half_length {}",
                half_length
            );
            assert_eq!(
                run(&line, half_length, 1.0),
                brute_force_line(&line, half_length, 1.0),
                "max filter, half_length {}",
                half_length
            );
        }
    }

    #[test]
    fn test_palindrome_stays_palindrome() {
        let line = vec![1.0, 4.0, 2.0, 7.0, 2.0, 4.0, 1.0];
        for half_length in 0..4 {
            for rank in [0.0, 0.5, 1.0] {
                let output = run(&line, half_length, rank);
                let reversed: Vec<f64> = output.iter().rev().copied().collect();
                assert_eq!(output, reversed, "h={} rank={}", half_length, rank);
            }
        }
    }

    // ==================== Brute Force Equivalence ====================

    #[test]
    fn test_matches_brute_force_grid() {
        // Deterministic pseudo-random lines; every valid half_length
        // and a spread of ranks.
        for len in [1usize, 2, 3, 5, 8, 13, 21, 50] {
            let line: Vec<f64> = (0..len)
                .map(|i| (((i as u64 * 2654435761) % 97) as f64) - 48.0)
                .collect();
            for half_length in 0..len {
                for rank in [0.0, 0.1, 0.25, 0.5, 0.75, 0.9, 1.0] {
                    assert_eq!(
                        run(&line, half_length, rank),
                        brute_force_line(&line, half_length, rank),
                        "len={} h={} rank={}",
                        len,
                        half_length,
                        rank
                    );
                }
            }
        }
    }

    #[test]
    fn test_matches_brute_force_with_ties() {
        // Heavy value collisions exercise the seq tie-break.
        let line: Vec<f64> = (0..30).map(|i| ((i * 7) % 3) as f64).collect();
        for half_length in 0..30 {
            for rank in [0.0, 0.5, 1.0] {
                assert_eq!(
                    run(&line, half_length, rank),
                    brute_force_line(&line, half_length, rank),
                    "h={} rank={}",
                    half_length,
                    rank
                );
            }
        }
    }

    #[test]
    fn test_f32_matches_f64_on_exact_values() {
        let line64 = vec![4.0f64, -1.0, 7.5, 0.0, 2.0, 2.0, -3.5, 9.0];
        let line32: Vec<f32> = line64.iter().map(|&v| v as f32).collect();
        let mut out64 = vec![0.0f64; line64.len()];
        let mut out32 = vec![0.0f32; line32.len()];
        apply_1d_rank_filter(&line64, &mut out64, 2, 0.5).unwrap();
        apply_1d_rank_filter(&line32, &mut out32, 2, 0.5).unwrap();
        let widened: Vec<f64> = out32.iter().map(|&v| v as f64).collect();
        assert_eq!(out64, widened);
    }

    // ==================== Validation Tests ====================

    #[test]
    fn test_window_too_large_fails_before_writing() {
        let input = vec![1.0, 2.0, 3.0];
        let mut output = vec![-7.0; 3];
        let err = apply_1d_rank_filter(&input, &mut output, 3, 0.5).unwrap_err();
        assert_eq!(
            err,
            RankFilterError::InvalidWindow {
                half_length: 3,
                len: 3
            }
        );
        assert_eq!(output, vec![-7.0; 3], "output must be untouched on error");
    }

    #[test]
    fn test_rank_out_of_range_fails_before_writing() {
        let input = vec![1.0, 2.0, 3.0];
        let mut output = vec![-7.0; 3];
        let err = apply_1d_rank_filter(&input, &mut output, 1, 1.5).unwrap_err();
        assert_eq!(err, RankFilterError::InvalidRank { rank: 1.5 });
        assert_eq!(output, vec![-7.0; 3]);

        let err = apply_1d_rank_filter(&input, &mut output, 1, -0.1).unwrap_err();
        assert_eq!(err, RankFilterError::InvalidRank { rank: -0.1 });
    }

    #[test]
    fn test_nan_rank_is_rejected() {
        let input = vec![1.0, 2.0, 3.0];
        let mut output = vec![0.0; 3];
        assert!(matches!(
            apply_1d_rank_filter(&input, &mut output, 1, f64::NAN),
            Err(RankFilterError::InvalidRank { .. })
        ));
    }

    #[test]
    fn test_in_place_matches_copy_variant() {
        let line = vec![4.0, -1.0, 7.5, 0.0, 2.0, 2.0, -3.5, 9.0, 1.0, 1.0];
        for half_length in 0..10 {
            for rank in [0.0, 0.3, 0.5, 1.0] {
                let copied = run(&line, half_length, rank);
                let mut in_place = line.clone();
                rank_filter_line_in_place(&mut in_place, half_length, rank).unwrap();
                assert_eq!(copied, in_place, "h={} rank={}", half_length, rank);
            }
        }
    }

    // ==================== Property Tests ====================

    mod properties {
        use super::*;
        use proptest::prelude::*;

        fn line_args() -> impl Strategy<Value = (Vec<f64>, usize, f64)> {
            (1usize..40).prop_flat_map(|len| {
                (
                    prop::collection::vec(-100.0f64..100.0, len..=len),
                    0..len,
                    0.0f64..=1.0,
                )
            })
        }

        proptest! {
            #[test]
            fn prop_matches_brute_force((line, half_length, rank) in line_args()) {
                // Outputs are copies of input samples, never arithmetic
                // on them, so equality is exact.
                prop_assert_eq!(
                    run(&line, half_length, rank),
                    brute_force_line(&line, half_length, rank)
                );
            }

            #[test]
            fn prop_output_values_come_from_input((line, half_length, rank) in line_args()) {
                for v in run(&line, half_length, rank) {
                    prop_assert!(line.contains(&v));
                }
            }
        }
    }
}
