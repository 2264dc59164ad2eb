//! Nearest-time lookup over sorted sequences

use super::{is_negative_infinity, is_positive_infinity, Time};

/// Index of the element of `times[start..end]` closest to `value`
///
/// `times` must be sorted ascending. On a tie between two neighbours the
/// later (higher) element wins. Returns `None` for an empty range or a NaN
/// value.
pub fn sorted_find_closest_index(
    times: &[Time],
    value: f64,
    start: usize,
    end: usize,
) -> Option<usize> {
    let end = end.min(times.len());
    if start >= end || value.is_nan() {
        return None;
    }

    if value < times[start] as f64 {
        return Some(start);
    }
    if value > times[end - 1] as f64 {
        return Some(end - 1);
    }

    // times[start] <= value <= times[end - 1] from here on
    let mut lo = start;
    let mut hi = end - 1;
    while lo <= hi {
        let mid = lo + (hi - lo + 1) / 2;
        let time = times[mid] as f64;
        if value < time {
            hi = mid - 1;
        } else if value > time {
            lo = mid + 1;
        } else {
            return Some(mid);
        }
    }

    // lo == hi + 1 and times[hi] < value < times[lo]
    if times[lo] as f64 - value <= value - times[hi] as f64 {
        Some(lo)
    } else {
        Some(hi)
    }
}

/// Index of the time closest to `target`, or `None` when it is farther away
/// than `tolerance`
///
/// `-∞` resolves to the first element and `+∞` to the last, regardless of
/// the tolerance.
pub fn find_closest_time_index(
    times: &[Time],
    target: f64,
    tolerance: Option<Time>,
) -> Option<usize> {
    if times.is_empty() {
        return None;
    }
    if is_negative_infinity(target) {
        return Some(0);
    }
    if is_positive_infinity(target) {
        return Some(times.len() - 1);
    }

    let index = sorted_find_closest_index(times, target, 0, times.len())?;
    if let Some(tolerance) = tolerance {
        if (times[index] as f64 - target).abs() > tolerance as f64 {
            return None;
        }
    }
    Some(index)
}

/// The time closest to `target`; see [`find_closest_time_index`]
pub fn find_closest_time(times: &[Time], target: f64, tolerance: Option<Time>) -> Option<Time> {
    find_closest_time_index(times, target, tolerance).map(|index| times[index])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_and_nearest() {
        let times = [2000, 2005, 2010];
        assert_eq!(find_closest_time(&times, 2005.0, None), Some(2005));
        assert_eq!(find_closest_time(&times, 2001.0, None), Some(2000));
        assert_eq!(find_closest_time(&times, 2009.0, None), Some(2010));
        assert_eq!(find_closest_time(&times, 1900.0, None), Some(2000));
        assert_eq!(find_closest_time(&times, 2100.0, None), Some(2010));
    }

    #[test]
    fn test_tie_prefers_later_time() {
        assert_eq!(find_closest_time(&[2000, 2005, 2010], 2007.5, None), Some(2010));
        assert_eq!(find_closest_time(&[2009, 2011], 2010.0, None), Some(2011));
        assert_eq!(sorted_find_closest_index(&[1, 3, 5, 7], 4.0, 0, 4), Some(2));
    }

    #[test]
    fn test_tolerance_excludes_far_candidates() {
        let times = [2000, 2010];
        assert_eq!(find_closest_time(&times, 2003.0, Some(3)), Some(2000));
        assert_eq!(find_closest_time(&times, 2004.0, Some(3)), None);
        assert_eq!(find_closest_time(&times, 2005.0, Some(5)), Some(2010));
        assert_eq!(find_closest_time(&times, 2005.0, Some(0)), None);
    }

    #[test]
    fn test_infinite_targets_resolve_to_bounds() {
        let times = [1990, 2000, 2020];
        assert_eq!(find_closest_time(&times, f64::NEG_INFINITY, Some(0)), Some(1990));
        assert_eq!(find_closest_time(&times, f64::INFINITY, Some(0)), Some(2020));
    }

    #[test]
    fn test_empty_and_nan() {
        assert_eq!(find_closest_time(&[], 2000.0, None), None);
        assert_eq!(find_closest_time(&[], f64::INFINITY, None), None);
        assert_eq!(find_closest_time(&[2000], f64::NAN, None), None);
    }

    #[test]
    fn test_subrange_search() {
        let times = [1, 2, 3, 10, 20];
        assert_eq!(sorted_find_closest_index(&times, 2.0, 3, 5), Some(3));
        assert_eq!(sorted_find_closest_index(&times, 16.0, 3, 5), Some(4));
        assert_eq!(sorted_find_closest_index(&times, 16.0, 5, 5), None);
    }

    #[test]
    fn test_matches_linear_scan() {
        let times: Vec<Time> = vec![-40, -3, 0, 4, 9, 10, 25, 61];
        for step in -100..140 {
            let target = step as f64 / 2.0;
            let expected = times
                .iter()
                .copied()
                .min_by(|a, b| {
                    let da = (*a as f64 - target).abs();
                    let db = (*b as f64 - target).abs();
                    da.partial_cmp(&db).unwrap().then(b.cmp(a))
                })
                .unwrap();
            assert_eq!(find_closest_time(&times, target, None), Some(expected), "target {}", target);
        }
    }
}
