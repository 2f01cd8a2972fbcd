//! Keep-range normalization.
//!
//! The cut stage relies on its input being non-overlapping and
//! chronologically ordered; the concat demuxer produces output in list
//! order, so a violated precondition would reorder or duplicate
//! content. This merge guarantees the precondition for any input.

use vtrim_models::KeepRange;

/// Normalize a list of keep-ranges into a non-overlapping, ordered
/// sequence.
///
/// Sorts by start ascending (ties broken by end ascending), then sweeps
/// left to right coalescing ranges that touch or overlap the current
/// accumulator. Degenerate ranges (`end <= start`) are dropped. Empty
/// input produces empty output, which callers must treat as "keep
/// nothing" rather than "keep everything".
pub fn merge_keep_ranges(ranges: &[KeepRange]) -> Vec<KeepRange> {
    let mut sorted: Vec<KeepRange> = ranges.iter().copied().filter(|r| !r.is_degenerate()).collect();
    sorted.sort_by(|a, b| {
        a.start
            .partial_cmp(&b.start)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.end.partial_cmp(&b.end).unwrap_or(std::cmp::Ordering::Equal))
    });

    let mut merged: Vec<KeepRange> = Vec::with_capacity(sorted.len());
    for range in sorted {
        match merged.last_mut() {
            Some(acc) if range.start <= acc.end => {
                if range.end > acc.end {
                    acc.end = range.end;
                }
            }
            _ => merged.push(range),
        }
    }

    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ranges(pairs: &[(f64, f64)]) -> Vec<KeepRange> {
        pairs.iter().map(|&(s, e)| KeepRange::new(s, e)).collect()
    }

    #[test]
    fn test_overlapping_ranges_coalesce() {
        let input = ranges(&[(0.0, 5.0), (4.0, 9.0), (12.0, 15.0)]);
        assert_eq!(merge_keep_ranges(&input), ranges(&[(0.0, 9.0), (12.0, 15.0)]));
    }

    #[test]
    fn test_touching_ranges_coalesce() {
        let input = ranges(&[(0.0, 5.0), (5.0, 9.0)]);
        assert_eq!(merge_keep_ranges(&input), ranges(&[(0.0, 9.0)]));
    }

    #[test]
    fn test_empty_input() {
        assert!(merge_keep_ranges(&[]).is_empty());
    }

    #[test]
    fn test_degenerate_ranges_dropped() {
        assert!(merge_keep_ranges(&ranges(&[(5.0, 3.0)])).is_empty());
        assert_eq!(
            merge_keep_ranges(&ranges(&[(5.0, 3.0), (1.0, 2.0), (4.0, 4.0)])),
            ranges(&[(1.0, 2.0)])
        );
    }

    #[test]
    fn test_unsorted_input() {
        let input = ranges(&[(12.0, 15.0), (0.0, 5.0), (4.0, 9.0)]);
        assert_eq!(merge_keep_ranges(&input), ranges(&[(0.0, 9.0), (12.0, 15.0)]));
    }

    #[test]
    fn test_contained_range_absorbed() {
        let input = ranges(&[(0.0, 10.0), (2.0, 3.0)]);
        assert_eq!(merge_keep_ranges(&input), ranges(&[(0.0, 10.0)]));
    }

    #[test]
    fn test_merge_is_idempotent() {
        let input = ranges(&[(3.0, 8.0), (0.0, 4.0), (10.0, 11.0), (10.5, 12.0)]);
        let once = merge_keep_ranges(&input);
        let twice = merge_keep_ranges(&once);
        assert_eq!(once, twice);
    }
}
