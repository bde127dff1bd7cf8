//! Fixed-width time binning anchored to epoch zero.
//!
//! Bucket boundaries are multiples of the width, independent of where the data
//! starts, so two runs over different inputs produce comparable buckets.

use anyhow::{anyhow, bail, Result};
use time::OffsetDateTime;

use crate::date::epoch_in_range;

/// Upper bound on buckets in one histogram; wider spans are refused, not allocated.
pub const MAX_BUCKETS: i64 = 10_000_000;

/// `ts - (ts mod width)`; `None` on overflow or a non-positive width.
pub fn floor_to_multiple(ts: i64, width: i64) -> Option<i64> {
    if width <= 0 {
        return None;
    }
    ts.checked_sub(ts.rem_euclid(width))
}

/// `ts + (width - ts mod width)`, or `ts` itself when already aligned.
pub fn ceil_to_multiple(ts: i64, width: i64) -> Option<i64> {
    if width <= 0 {
        return None;
    }
    match ts.rem_euclid(width) {
        0 => Some(ts),
        r => ts.checked_add(width - r),
    }
}

/// Edges from `floor(min)` to `ceil(max)` inclusive, stepping by `width`.
///
/// When both ends collapse onto one aligned instant a second edge is added so that
/// at least one bucket exists. Fails on a non-positive width, on bounds outside
/// the representable dates and on more than [`MAX_BUCKETS`] buckets.
pub fn bin_edges(min_ts: f64, max_ts: f64, width: i64) -> Result<Vec<i64>> {
    if width <= 0 {
        bail!("bucket width must be positive, got {width}");
    }
    for ts in [min_ts, max_ts] {
        if !epoch_in_range(ts) {
            bail!("timestamp {ts} is outside the representable date range");
        }
    }
    let overflow = || anyhow!("bucket edges for [{min_ts}, {max_ts}] at width {width} overflow");
    let first = floor_to_multiple(min_ts.floor() as i64, width).ok_or_else(overflow)?;
    let mut last = ceil_to_multiple(max_ts.ceil() as i64, width).ok_or_else(overflow)?;
    if last <= first {
        last = first.checked_add(width).ok_or_else(overflow)?;
    }
    let buckets = (last - first) / width;
    if buckets > MAX_BUCKETS {
        bail!("{buckets} buckets of {width}s between {min_ts} and {max_ts}; at most {MAX_BUCKETS} are allowed");
    }
    Ok((first..=last).step_by(width as usize).collect())
}

/// Comment counts per bucket. `counts[i]` covers `[edges[i], edges[i + 1])`; the
/// final bucket also takes a timestamp sitting exactly on the last edge.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Histogram {
    pub width: i64,
    pub edges: Vec<i64>,
    pub counts: Vec<u64>,
}

impl Histogram {
    pub fn from_timestamps(timestamps: &[f64], width: i64) -> Result<Self> {
        if width <= 0 {
            bail!("bucket width must be positive, got {width}");
        }
        if let Some(bad) = timestamps.iter().find(|t| !t.is_finite()) {
            bail!("non-finite timestamp {bad}");
        }
        let Some((min, max)) = timestamps.iter().fold(None, |acc: Option<(f64, f64)>, &t| match acc {
            None => Some((t, t)),
            Some((lo, hi)) => Some((lo.min(t), hi.max(t))),
        }) else {
            return Ok(Self { width, edges: Vec::new(), counts: Vec::new() });
        };

        let edges = bin_edges(min, max, width)?;
        let first = edges[0];
        let last_bucket = edges.len() - 2;
        let mut counts = vec![0u64; edges.len() - 1];
        for &ts in timestamps {
            let idx = ((ts.floor() as i64 - first).div_euclid(width)) as usize;
            counts[idx.min(last_bucket)] += 1;
        }
        Ok(Self { width, edges, counts })
    }

    pub fn is_empty(&self) -> bool { self.counts.is_empty() }
    pub fn total(&self) -> u64 { self.counts.iter().sum() }
    pub fn first_edge(&self) -> Option<i64> { self.edges.first().copied() }
    pub fn last_edge(&self) -> Option<i64> { self.edges.last().copied() }

    /// One point per bucket, keyed by bucket start.
    pub fn series(&self) -> Series {
        let points = self
            .edges
            .iter()
            .zip(&self.counts)
            .map(|(&start, &count)| Bucket { start, count })
            .collect();
        Series { width: self.width, points }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Bucket {
    /// Epoch seconds of the bucket's left edge.
    pub start: i64,
    pub count: u64,
}

/// Buckets ordered by start time.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Series {
    pub width: i64,
    pub points: Vec<Bucket>,
}

impl Series {
    pub fn len(&self) -> usize { self.points.len() }
    pub fn is_empty(&self) -> bool { self.points.is_empty() }
    pub fn max_count(&self) -> u64 { self.points.iter().map(|b| b.count).max().unwrap_or(0) }

    /// Buckets whose start lies in `[begin, end]`. Bucket boundaries are untouched.
    pub fn within(&self, begin: OffsetDateTime, end: OffsetDateTime) -> Series {
        let (lo, hi) = (begin.unix_timestamp(), end.unix_timestamp());
        Series {
            width: self.width,
            points: self.points.iter().copied().filter(|b| lo <= b.start && b.start <= hi).collect(),
        }
    }

    /// Count of the bucket starting exactly at `start`.
    pub fn get(&self, start: i64) -> Option<u64> {
        self.points
            .binary_search_by_key(&start, |b| b.start)
            .ok()
            .map(|i| self.points[i].count)
    }

    /// Start of the bucket `ts` falls in, whether or not that bucket is present.
    pub fn align(&self, ts: i64) -> Option<i64> {
        floor_to_multiple(ts, self.width)
    }
}
