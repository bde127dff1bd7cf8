//! Historical events pinned onto the comment-volume series.

use serde::{Deserialize, Serialize};
use time::macros::datetime;
use time::OffsetDateTime;
use tracing::debug;

use crate::bucketing::Series;

/// A labelled instant. `at` carries the source zone's UTC offset in effect at that
/// moment; `zone` names that zone for display.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Event {
    #[serde(with = "time::serde::rfc3339")]
    pub at: OffsetDateTime,
    #[serde(default)]
    pub zone: String,
    pub label: String,
}

impl Event {
    pub fn new(at: OffsetDateTime, zone: impl Into<String>, label: impl Into<String>) -> Self {
        Self { at, zone: zone.into(), label: label.into() }
    }
}

/// Free-standing remark drawn at the baseline, e.g. a known gap in the data.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Note {
    #[serde(with = "time::serde::rfc3339")]
    pub at: OffsetDateTime,
    pub label: String,
}

pub fn default_events() -> Vec<Event> {
    vec![
        Event::new(
            datetime!(2022-02-21 22:35 +03:00),
            "Europe/Moscow",
            "Russia recognizes the\nindependence of\nbreakaway regions",
        ),
        Event::new(
            datetime!(2022-02-24 06:00 +03:00),
            "Europe/Moscow",
            "Putin announces the\n\"special military operation\"\nin Ukraine",
        ),
        Event::new(
            datetime!(2022-03-16 18:00 +02:00),
            "Europe/Kyiv",
            "Chernihiv breadline massacre\n and Mariupol theatre airstrike",
        ),
        Event::new(datetime!(2022-04-03 20:42 +03:00), "Europe/Kyiv", "Discovery of the\nBucha massacre"),
        Event::new(datetime!(2022-04-13 20:42 +03:00), "Europe/Kyiv", "Sinking of the Moskva"),
        Event::new(datetime!(2022-04-28 06:49 UTC), "UTC", "US Government approves\nLend-lease for Ukraine"),
    ]
}

/// A mod deleted a misnamed thread on 26 Feb 2022, leaving about an hour without comments.
pub fn default_notes() -> Vec<Note> {
    vec![Note { at: datetime!(2022-02-26 06:45 UTC), label: "Mod-deleted post".into() }]
}

/// An event resolved to the bucket holding it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Annotation {
    pub bucket_start: i64,
    pub count: u64,
    pub label: String,
}

/// Aligns the event to its UTC bucket and reads that bucket's count.
/// `None` when the bucket is not part of `series` (e.g. windowed out).
pub fn locate_event(series: &Series, event: &Event) -> Option<Annotation> {
    let start = series.align(event.at.unix_timestamp())?;
    match series.get(start) {
        Some(count) => Some(Annotation { bucket_start: start, count, label: event.label.clone() }),
        None => {
            debug!("event {:?} ({}) falls outside the displayed series, not annotated", event.label, event.zone);
            None
        }
    }
}

/// Every event that lands inside `series`; the rest are dropped silently.
pub fn locate_events(series: &Series, events: &[Event]) -> Vec<Annotation> {
    events.iter().filter_map(|e| locate_event(series, e)).collect()
}
