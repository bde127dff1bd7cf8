//! The viewer: the chart driven by a bucket width picked from a fixed set of
//! choices plus a from/to date pair clamped to the data.

use anyhow::{bail, Result};
use std::fmt;
use std::str::FromStr;
use time::{Date, Duration, OffsetDateTime};

use crate::bucketing::{Histogram, Series};
use crate::chart::{layout_chart, ChartLayout};
use crate::config::ChartConfig;
use crate::date::datetime_from_epoch;

/// Selectable bucket widths.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Interval {
    FifteenMinutes,
    ThirtyMinutes,
    #[default]
    OneHour,
    ThreeHours,
    SixHours,
    TwelveHours,
    OneDay,
}

impl Interval {
    pub const ALL: [Interval; 7] = [
        Interval::FifteenMinutes,
        Interval::ThirtyMinutes,
        Interval::OneHour,
        Interval::ThreeHours,
        Interval::SixHours,
        Interval::TwelveHours,
        Interval::OneDay,
    ];

    pub fn seconds(self) -> i64 {
        match self {
            Interval::FifteenMinutes => 900,
            Interval::ThirtyMinutes => 1_800,
            Interval::OneHour => 3_600,
            Interval::ThreeHours => 10_800,
            Interval::SixHours => 21_600,
            Interval::TwelveHours => 43_200,
            Interval::OneDay => 86_400,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Interval::FifteenMinutes => "15 minutes",
            Interval::ThirtyMinutes => "30 minutes",
            Interval::OneHour => "1 hour",
            Interval::ThreeHours => "3 hours",
            Interval::SixHours => "6 hours",
            Interval::TwelveHours => "12 hours",
            Interval::OneDay => "1 day",
        }
    }

    fn short(self) -> &'static str {
        match self {
            Interval::FifteenMinutes => "15m",
            Interval::ThirtyMinutes => "30m",
            Interval::OneHour => "1h",
            Interval::ThreeHours => "3h",
            Interval::SixHours => "6h",
            Interval::TwelveHours => "12h",
            Interval::OneDay => "1d",
        }
    }

    /// Y axis caption, e.g. "Comments per 6 hours" ("Hourly comments" for one hour).
    pub fn axis_label(self) -> String {
        match self {
            Interval::OneHour => "Hourly comments".to_string(),
            other => format!("Comments per {}", other.label()),
        }
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Interval {
    type Err = String;
    /// Accepts the label ("6 hours"), the short form ("6h") or the seconds ("21600").
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_lowercase();
        Interval::ALL
            .into_iter()
            .find(|i| s == i.label() || s == i.short() || s == i.seconds().to_string())
            .ok_or_else(|| {
                let choices: Vec<&str> = Interval::ALL.iter().map(|i| i.label()).collect();
                format!("unknown interval {s:?}; choose one of: {}", choices.join(", "))
            })
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct ViewRequest {
    pub interval: Interval,
    pub from: Option<Date>,
    pub to: Option<Date>,
}

#[derive(Clone, Debug)]
pub struct View {
    pub interval: Interval,
    /// Dates the from/to controls may take: first and last bucket edge.
    pub min_date: Date,
    pub max_date: Date,
    pub from: Date,
    pub to: Date,
    /// Display window: `from` 00:00 to the day after `to`, 00:00.
    pub begin: OffsetDateTime,
    pub end: OffsetDateTime,
    pub series: Series,
    pub layout: ChartLayout,
}

/// Bins `timestamps` at the requested width and windows the result.
/// Requested dates outside the data are clamped to it.
pub fn build_view(timestamps: &[f64], req: &ViewRequest, chart: &ChartConfig) -> Result<View> {
    let hist = Histogram::from_timestamps(timestamps, req.interval.seconds())?;
    let (Some(first), Some(last)) = (hist.first_edge(), hist.last_edge()) else {
        bail!("no comment timestamps to view");
    };
    let min_date = datetime_from_epoch(first)?.date();
    let max_date = datetime_from_epoch(last)?.date();

    let from = req.from.unwrap_or(min_date).clamp(min_date, max_date);
    let to = req.to.unwrap_or(max_date).clamp(from, max_date);
    let begin = from.midnight().assume_utc();
    let end = to.midnight().assume_utc() + Duration::days(1);

    let series = hist.series().within(begin, end);
    let layout = layout_chart(&series, chart, begin, end);
    Ok(View { interval: req.interval, min_date, max_date, from, to, begin, end, series, layout })
}
