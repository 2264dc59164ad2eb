//! Pairing of two irregular time series

use ahash::AHashSet;

use super::{sorted_find_closest_index, Time};

/// Match times of `sorted_a` with times of `sorted_b`
///
/// Every returned pair is at most `max_diff` apart (`None` means unbounded)
/// and no time of either side is used twice. This is a heuristic, not an
/// optimal assignment: `a` is swept once with a monotonic pointer into `b`.
/// A pair is decided on the spot when the lower candidate is strictly
/// closer than the higher one or when the times are equal. All other
/// in-range candidates are settled afterwards by ascending distance, each
/// accepted only while both of its times are still free.
pub fn get_closest_time_pairs(
    sorted_a: &[Time],
    sorted_b: &[Time],
    max_diff: Option<Time>,
) -> Vec<(Time, Time)> {
    if sorted_a.is_empty() || sorted_b.is_empty() {
        return Vec::new();
    }

    let within = |distance: Time| max_diff.map_or(true, |max| distance <= max);

    let mut decided: Vec<(Time, Time)> = Vec::new();
    let mut undecided: Vec<(Time, Time)> = Vec::new();
    let mut used_a: AHashSet<Time> = AHashSet::new();
    let mut used_b: AHashSet<Time> = AHashSet::new();

    let mut index_b = 0;
    for &time_a in sorted_a {
        let Some(closest) =
            sorted_find_closest_index(sorted_b, time_a as f64, index_b, sorted_b.len())
        else {
            break;
        };

        // Candidate strictly below time_a
        let low = if sorted_b[closest] < time_a {
            Some(closest)
        } else if closest > index_b {
            Some(closest - 1)
        } else {
            None
        };
        // Candidate at or above time_a
        let high = (sorted_b[closest] >= time_a).then_some(closest);

        let free = |time_b: Time| !used_a.contains(&time_a) && !used_b.contains(&time_b);

        let decision = match (low, high) {
            (Some(lo), Some(hi))
                if within(time_a - sorted_b[lo])
                    && time_a - sorted_b[lo] < sorted_b[hi] - time_a
                    && free(sorted_b[lo]) =>
            {
                Some(sorted_b[lo])
            }
            (_, Some(hi)) if sorted_b[hi] == time_a && free(sorted_b[hi]) => Some(sorted_b[hi]),
            _ => None,
        };

        match decision {
            Some(time_b) => {
                decided.push((time_a, time_b));
                used_a.insert(time_a);
                used_b.insert(time_b);
            }
            None => {
                if let Some(lo) = low.filter(|&lo| within(time_a - sorted_b[lo])) {
                    undecided.push((time_a, sorted_b[lo]));
                }
                if let Some(hi) = high.filter(|&hi| within(sorted_b[hi] - time_a)) {
                    undecided.push((time_a, sorted_b[hi]));
                }
            }
        }

        index_b = closest;
    }

    // Stable: equal distances keep sweep order
    undecided.sort_by_key(|(time_a, time_b)| (time_a - time_b).abs());
    for (time_a, time_b) in undecided {
        if !used_a.contains(&time_a) && !used_b.contains(&time_b) {
            decided.push((time_a, time_b));
            used_a.insert(time_a);
            used_b.insert(time_b);
        }
    }

    decided
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_valid(pairs: &[(Time, Time)], max_diff: Option<Time>) {
        let mut seen_a = AHashSet::new();
        let mut seen_b = AHashSet::new();
        for &(a, b) in pairs {
            if let Some(max) = max_diff {
                assert!((a - b).abs() <= max, "pair ({}, {}) exceeds {}", a, b, max);
            }
            assert!(seen_a.insert(a), "time {} of A reused", a);
            assert!(seen_b.insert(b), "time {} of B reused", b);
        }
    }

    #[test]
    fn test_simple_offsets() {
        let pairs = get_closest_time_pairs(&[1, 5, 10], &[2, 6, 11], Some(2));
        assert_eq!(pairs, vec![(1, 2), (5, 6), (10, 11)]);
    }

    #[test]
    fn test_exact_matches_are_decided() {
        let pairs = get_closest_time_pairs(&[2000, 2001, 2002], &[2000, 2002], Some(0));
        assert_eq!(pairs, vec![(2000, 2000), (2002, 2002)]);
    }

    #[test]
    fn test_empty_inputs() {
        assert!(get_closest_time_pairs(&[], &[1, 2], None).is_empty());
        assert!(get_closest_time_pairs(&[1, 2], &[], None).is_empty());
    }

    #[test]
    fn test_max_diff_excludes_far_pairs() {
        let pairs = get_closest_time_pairs(&[0, 100], &[3, 101], Some(2));
        assert_eq!(pairs, vec![(100, 101)]);
    }

    #[test]
    fn test_no_time_reused_when_neighbours_compete() {
        // Both times of A are nearest to 2; only the closer one gets it
        let pairs = get_closest_time_pairs(&[3, 4], &[2, 10], None);
        assert_valid(&pairs, None);
        assert_eq!(pairs, vec![(3, 2)]);
    }

    #[test]
    fn test_undecided_resolved_by_distance() {
        // 2 sits between 1 and 4 of B at distances 1 and 2; 3 wants 4 at distance 1
        let pairs = get_closest_time_pairs(&[2, 3], &[1, 4], Some(2));
        assert_valid(&pairs, Some(2));
        assert_eq!(pairs.len(), 2);
        assert!(pairs.contains(&(2, 1)));
        assert!(pairs.contains(&(3, 4)));
    }

    #[test]
    fn test_widening_max_diff_keeps_pairs() {
        let cases: [(&[Time], &[Time]); 4] = [
            (&[1, 5, 10], &[2, 6, 11]),
            (&[5, 6], &[3, 7]),
            (&[1990, 1995, 2000, 2005], &[1991, 1999, 2003, 2010]),
            (&[0, 3, 7, 8, 15], &[1, 2, 9, 14, 30]),
        ];

        for (a, b) in cases {
            let mut previous = 0;
            for max_diff in 0..20 {
                let pairs = get_closest_time_pairs(a, b, Some(max_diff));
                assert_valid(&pairs, Some(max_diff));
                assert!(
                    pairs.len() >= previous,
                    "{:?} vs {:?}: max_diff {} returned fewer pairs",
                    a,
                    b,
                    max_diff
                );
                previous = pairs.len();
            }
        }
    }
}
