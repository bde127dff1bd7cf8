//! Live-thread selection: title prefix match plus creation-time window.

use crate::api::Submission;
use crate::date::TimeWindow;

/// Trimmed, lowercased title used for prefix matching.
#[inline]
pub fn normalize_title(title: &str) -> String {
    title.trim().to_lowercase()
}

/// True when the normalized title starts with any accepted (lowercase) prefix.
pub fn title_matches(title: &str, prefixes: &[String]) -> bool {
    let t = normalize_title(title);
    prefixes.iter().any(|p| t.starts_with(p.as_str()))
}

pub fn is_live_thread(sub: &Submission, prefixes: &[String], window: &TimeWindow) -> bool {
    title_matches(&sub.title, prefixes) && window.contains_epoch(sub.created_utc)
}
