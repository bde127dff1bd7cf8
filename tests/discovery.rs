#[path = "common/mod.rs"]
mod common;

use common::*;
use livethreads::{discover_threads, hash_author, EtlOptions, TimeWindow, DEFAULT_TITLE_PREFIXES};

fn opts(accounts: &[&str]) -> EtlOptions {
    let (begin, end) = spring_2022();
    EtlOptions::default()
        .with_accounts(accounts.iter().copied())
        .with_title_prefixes(DEFAULT_TITLE_PREFIXES.iter().copied())
        .with_window(TimeWindow::new(begin, end))
        .with_progress(false)
}

/// Title matching is a case-insensitive prefix test on the trimmed title.
#[test]
fn keeps_only_live_thread_titles() {
    let api = FakeApi::new().with_posts(
        "WorldNewsMods",
        vec![
            submission("a1", "  R/WorldNews Live Thread: Day 5", INVASION_DAY),
            submission("a2", "Worldnews discussion thread", INVASION_DAY),
            submission("a3", "worldnews live thread for Russian invasion", INVASION_DAY + 60.0),
            submission("a4", "Live thread: /r/worldnews", INVASION_DAY),
        ],
    );

    let report = discover_threads(&api, &opts(&["WorldNewsMods"])).unwrap();
    let ids: Vec<&str> = report.threads.iter().map(|t| t.id.as_str()).collect();
    assert_eq!(ids, vec!["a1", "a3"]);
    assert_eq!(report.posts_seen, 4);
}

/// A suspended or deleted account is reported but the other accounts are still scanned.
#[test]
fn failing_account_is_skipped() {
    let api = FakeApi::new()
        .with_posts("first", vec![submission("b1", "/r/worldnews live thread: day 1", INVASION_DAY)])
        .with_posts("third", vec![submission("b3", "/r/worldnews live thread: day 3", INVASION_DAY + 7200.0)]);

    let report = discover_threads(&api, &opts(&["first", "suspended", "third"])).unwrap();

    assert_eq!(report.accounts_scanned, 3);
    assert_eq!(report.failed_accounts.len(), 1);
    assert_eq!(report.failed_accounts[0].0, "suspended");
    let ids: Vec<&str> = report.threads.iter().map(|t| t.id.as_str()).collect();
    assert_eq!(ids, vec!["b1", "b3"]);
    assert_eq!(api.submission_calls.lock().len(), 3);
}

/// The window is `[begin, end)`: a post at `begin` counts, one at `end` does not.
#[test]
fn window_is_half_open() {
    let (begin, end) = spring_2022();
    let title = "/r/worldnews live thread";
    let api = FakeApi::new().with_posts(
        "mods",
        vec![
            submission("early", title, begin.unix_timestamp() as f64 - 1.0),
            submission("at_begin", title, begin.unix_timestamp() as f64),
            submission("before_end", title, end.unix_timestamp() as f64 - 0.5),
            submission("at_end", title, end.unix_timestamp() as f64),
        ],
    );

    let report = discover_threads(&api, &opts(&["mods"])).unwrap();
    let ids: Vec<&str> = report.threads.iter().map(|t| t.id.as_str()).collect();
    assert_eq!(ids, vec!["at_begin", "before_end"]);
}

/// A thread seen under two accounts appears once; output is ordered by creation time.
#[test]
fn dedups_and_sorts_by_creation() {
    let title = "worldnews live thread";
    let api = FakeApi::new()
        .with_posts("x", vec![submission("late", title, INVASION_DAY + 86_400.0), submission("mid", title, INVASION_DAY)])
        .with_posts("y", vec![submission("mid", title, INVASION_DAY), submission("early", title, INVASION_DAY - 86_400.0)]);

    let report = discover_threads(&api, &opts(&["x", "y"])).unwrap();
    let ids: Vec<&str> = report.threads.iter().map(|t| t.id.as_str()).collect();
    assert_eq!(ids, vec!["early", "mid", "late"]);
}

/// Authors are stored as a stable pseudonym, never in clear; `created_at` drops sub-seconds.
#[test]
fn thread_rows_are_pseudonymized() {
    let mut post = submission("c1", "/r/worldnews live thread", INVASION_DAY + 0.75);
    post.author = Some("WorldNewsMods".into());
    let mut gone = submission("c2", "/r/worldnews live thread", INVASION_DAY + 10.0);
    gone.author = None;
    let api = FakeApi::new().with_posts("mods", vec![post, gone]);

    let report = discover_threads(&api, &opts(&["mods"])).unwrap();
    let first = &report.threads[0];
    assert_eq!(first.author.as_deref(), Some(hash_author("WorldNewsMods").as_str()));
    assert_ne!(first.author.as_deref(), Some("WorldNewsMods"));
    assert_eq!(first.created_at.as_deref(), Some("2022-02-24 03:00:00"));
    assert_eq!(first.name.as_deref(), Some("t3_c1"));
    assert_eq!(report.threads[1].author, None);
}

/// Lookback caps how many posts per account are inspected.
#[test]
fn lookback_limits_posts_per_account() {
    let title = "/r/worldnews live thread";
    let posts = (0..5).map(|i| submission(&format!("p{i}"), title, INVASION_DAY + i as f64)).collect();
    let api = FakeApi::new().with_posts("mods", posts);

    let report = discover_threads(&api, &opts(&["mods"]).with_lookback(2)).unwrap();
    assert_eq!(report.posts_seen, 2);
    assert_eq!(report.threads.len(), 2);
}
