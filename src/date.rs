//! Calendar helpers over the `time` crate: epoch conversions, the `created_at`
//! text format used in the CSV files, and the half-open crawl window.

use anyhow::{anyhow, Context, Result};
use time::format_description::well_known::Rfc3339;
use time::format_description::FormatItem;
use time::macros::{datetime, format_description};
use time::{Date, Duration, OffsetDateTime, PrimitiveDateTime, Time};

/// `2022-02-24 03:00:00`, the layout of `created_at` and `updated_on`.
pub const TIMESTAMP_FORMAT: &[FormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");

const DATE_FORMAT: &[FormatItem<'static>] = format_description!("[year]-[month]-[day]");

/// First day a live thread could exist.
pub const DEFAULT_WINDOW_BEGIN: OffsetDateTime = datetime!(2022-02-01 00:00 UTC);

/// Converts whole epoch seconds to a UTC datetime.
pub fn datetime_from_epoch(ts: i64) -> Result<OffsetDateTime> {
    OffsetDateTime::from_unix_timestamp(ts).map_err(|e| anyhow!("epoch {ts} out of range: {e}"))
}

/// True when `ts` (epoch seconds) names an instant `OffsetDateTime` can hold.
pub fn epoch_in_range(ts: f64) -> bool {
    ts.is_finite() && OffsetDateTime::from_unix_timestamp(ts.floor() as i64).is_ok()
}

/// Formats a datetime (converted to UTC) as `YYYY-MM-DD HH:MM:SS`.
pub fn format_timestamp(dt: OffsetDateTime) -> Result<String> {
    dt.to_offset(time::UtcOffset::UTC)
        .format(TIMESTAMP_FORMAT)
        .context("format timestamp")
}

/// `created_at` for a fractional epoch: the sub-second part is dropped.
pub fn created_at_from_epoch(ts: f64) -> Result<String> {
    format_timestamp(datetime_from_epoch(ts.floor() as i64)?)
}

/// The current instant truncated to whole seconds.
pub fn now_truncated() -> OffsetDateTime {
    let now = OffsetDateTime::now_utc();
    now.replace_nanosecond(0).unwrap_or(now)
}

/// UTC midnight of `now` minus twelve hours: threads younger than that are still live.
pub fn default_window_end(now: OffsetDateTime) -> OffsetDateTime {
    let utc = now.to_offset(time::UtcOffset::UTC);
    utc.replace_time(Time::MIDNIGHT) - Duration::hours(12)
}

/// Accepts `YYYY-MM-DD`, `YYYY-MM-DD HH:MM:SS` (both UTC) or RFC 3339.
pub fn parse_datetime(s: &str) -> Result<OffsetDateTime> {
    let s = s.trim();
    if let Ok(dt) = OffsetDateTime::parse(s, &Rfc3339) {
        return Ok(dt);
    }
    if let Ok(dt) = PrimitiveDateTime::parse(s, TIMESTAMP_FORMAT) {
        return Ok(dt.assume_utc());
    }
    let date = Date::parse(s, DATE_FORMAT).with_context(|| format!("invalid date {s:?}"))?;
    Ok(date.midnight().assume_utc())
}

/// Parses `YYYY-MM-DD`.
pub fn parse_date(s: &str) -> Result<Date> {
    Date::parse(s.trim(), DATE_FORMAT).with_context(|| format!("invalid date {s:?}"))
}

/// Half-open `[begin, end)` window over epoch seconds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimeWindow {
    pub begin: OffsetDateTime,
    pub end: OffsetDateTime,
}

impl TimeWindow {
    pub fn new(begin: OffsetDateTime, end: OffsetDateTime) -> Self {
        Self { begin, end }
    }

    /// The default crawl window as of `now`.
    pub fn default_as_of(now: OffsetDateTime) -> Self {
        Self::new(DEFAULT_WINDOW_BEGIN, default_window_end(now))
    }

    pub fn contains_epoch(&self, ts: f64) -> bool {
        let begin = self.begin.unix_timestamp() as f64;
        let end = self.end.unix_timestamp() as f64;
        begin <= ts && ts < end
    }
}
