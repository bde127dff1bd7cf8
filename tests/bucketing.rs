use livethreads::{bin_edges, ceil_to_multiple, floor_to_multiple, Histogram};
use time::macros::datetime;

#[test]
fn hourly_buckets_anchor_at_epoch_multiples() {
    let h = Histogram::from_timestamps(&[100.0, 3700.0, 7199.0], 3600).unwrap();
    assert_eq!(h.edges, vec![0, 3600, 7200]);
    assert_eq!(h.counts, vec![1, 2]);
    assert_eq!(h.total(), 3);
}

#[test]
fn floor_and_ceil() {
    assert_eq!(floor_to_multiple(7199, 3600), Some(3600));
    assert_eq!(floor_to_multiple(7200, 3600), Some(7200));
    assert_eq!(ceil_to_multiple(7199, 3600), Some(7200));
    assert_eq!(ceil_to_multiple(7200, 3600), Some(7200));
    assert_eq!(floor_to_multiple(-1, 3600), Some(-3600));
    assert_eq!(floor_to_multiple(5, 0), None);
}

/// First edge <= min, last edge >= max, consecutive edges one width apart, every
/// edge a multiple of the width.
#[test]
fn edges_cover_the_data() {
    let cases: &[(&[f64], i64)] = &[
        (&[1_645_671_601.5, 1_645_700_000.0, 1_645_999_999.9], 900),
        (&[1_646_000_000.0], 86_400),
        (&[10.0, 10.0, 10.0], 60),
        (&[0.0, 21_600.0], 21_600),
    ];
    for &(ts, w) in cases {
        let h = Histogram::from_timestamps(ts, w).unwrap();
        let min = ts.iter().cloned().fold(f64::INFINITY, f64::min);
        let max = ts.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        assert!(h.edges[0] as f64 <= min);
        assert!(*h.edges.last().unwrap() as f64 >= max);
        assert!(h.edges.windows(2).all(|e| e[1] - e[0] == w));
        assert!(h.edges.iter().all(|e| e % w == 0));
        assert_eq!(h.counts.len(), h.edges.len() - 1);
        assert_eq!(h.total(), ts.len() as u64, "every timestamp lands in a bucket");
    }
}

/// A timestamp sitting on the final edge belongs to the last bucket.
#[test]
fn last_bucket_is_closed_on_the_right() {
    let h = Histogram::from_timestamps(&[0.0, 3600.0, 7200.0], 3600).unwrap();
    assert_eq!(h.edges, vec![0, 3600, 7200]);
    assert_eq!(h.counts, vec![1, 2]);
}

#[test]
fn single_aligned_timestamp_gets_one_bucket() {
    assert_eq!(bin_edges(7200.0, 7200.0, 3600).unwrap(), vec![7200, 10800]);
    let h = Histogram::from_timestamps(&[7200.0], 3600).unwrap();
    assert_eq!(h.counts, vec![1]);
}

#[test]
fn empty_input_and_bad_width() {
    let h = Histogram::from_timestamps(&[], 3600).unwrap();
    assert!(h.is_empty());
    assert!(h.series().is_empty());
    assert!(Histogram::from_timestamps(&[1.0], 0).is_err());
    assert!(Histogram::from_timestamps(&[1.0], -60).is_err());
    assert!(Histogram::from_timestamps(&[1.0, f64::NAN], 60).is_err());
}

#[test]
fn series_window_is_inclusive() {
    let h = Histogram::from_timestamps(&[0.0, 3600.0, 7200.0, 10_800.0, 14_399.0], 3600).unwrap();
    let s = h.series();
    assert_eq!(s.len(), 4);

    let w = s.within(datetime!(1970-01-01 01:00 UTC), datetime!(1970-01-01 03:00 UTC));
    let starts: Vec<i64> = w.points.iter().map(|b| b.start).collect();
    assert_eq!(starts, vec![3600, 7200, 10_800]);
    assert_eq!(w.get(7200), Some(1));
    assert_eq!(w.get(0), None);
    assert_eq!(w.align(7300), Some(7200));
}

/// Arithmetic at the ends of `i64` reports overflow instead of wrapping.
#[test]
fn rounding_near_i64_limits_does_not_overflow() {
    assert_eq!(ceil_to_multiple(i64::MAX, 3600), None);
    assert_eq!(floor_to_multiple(i64::MIN, 3600), None);
    assert_eq!(floor_to_multiple(i64::MAX, 3600), Some(i64::MAX - i64::MAX.rem_euclid(3600)));
}

/// Timestamps beyond any representable date are refused with an error.
#[test]
fn extreme_timestamps_are_an_error() {
    for bad in [1e19, -1e19, f64::MAX, 1.0e15] {
        assert!(Histogram::from_timestamps(&[1_645_671_600.0, bad], 3600).is_err(), "{bad}");
    }
    assert!(bin_edges(0.0, 1e19, 60).is_err());
}

/// Millisecond epochs mixed with second epochs would need far too many buckets.
#[test]
fn span_too_wide_for_the_width_is_an_error() {
    let err = Histogram::from_timestamps(&[1_645_671_600.0, 1_645_671_600_000.0 / 10.0], 1).unwrap_err();
    assert!(err.to_string().contains("buckets"), "{err}");
    // The same span at a daily width is fine.
    assert!(Histogram::from_timestamps(&[1_645_671_600.0, 1_645_671_600_000.0 / 10.0], 86_400).is_ok());
}
