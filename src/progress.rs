//! Count-style progress bars for the per-thread and per-file loops.

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

const COUNT_TEMPLATE: &str = "{spinner:.green} {msg} {pos}/{len} [{bar:.cyan/blue}] {percent:>3}%  \
                              it/s: {per_sec}  elapsed: {elapsed_precise}  eta: {eta_precise}";

/// Items processed out of `total`, with an optional label.
pub fn make_count_progress(total: u64, label: &str) -> ProgressBar {
    let pb = ProgressBar::new(total);
    let style = ProgressStyle::with_template(COUNT_TEMPLATE)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ");
    pb.set_style(style);
    if !label.is_empty() {
        pb.set_message(label.to_string());
    }
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// A bar when `enabled`, otherwise a hidden one so call sites stay branch-free.
pub fn count_progress_if(enabled: bool, total: u64, label: &str) -> ProgressBar {
    if enabled { make_count_progress(total, label) } else { ProgressBar::hidden() }
}
