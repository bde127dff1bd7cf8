#[path = "common/mod.rs"]
mod common;

use common::*;
use livethreads::{load_index, merge_with_fallback, write_index, LiveThreadETL, ThreadRecord, INDEX_COLUMNS};
use time::macros::datetime;

fn row(id: &str, created_utc: f64, title: &str, num_comments: i64) -> ThreadRecord {
    ThreadRecord {
        id: id.to_string(),
        name: Some(format!("t3_{id}")),
        title: Some(title.to_string()),
        created_utc: Some(created_utc),
        num_comments: Some(num_comments),
        ..Default::default()
    }
}

/// Fresh values win, missing fresh values fall back to the old row, and rows the scan
/// no longer reaches are kept untouched.
#[test]
fn merge_prefers_fresh_and_keeps_old_rows() {
    let now = datetime!(2022-03-10 12:00:00.750 UTC);
    let mut old_a = row("a", INVASION_DAY, "old title", 5);
    old_a.permalink = Some("/r/worldnews/comments/a/".into());
    old_a.updated_on = Some("2022-03-01 00:00:00".into());
    let old_gone = row("gone", INVASION_DAY - 86_400.0, "aged out", 7);

    let mut fresh_a = row("a", INVASION_DAY, "new title", 50);
    fresh_a.permalink = None;
    let fresh_b = row("b", INVASION_DAY + 3600.0, "brand new", 1);

    let merged = merge_with_fallback(vec![fresh_a, fresh_b], vec![old_a, old_gone.clone()], now).unwrap();
    let ids: Vec<&str> = merged.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["gone", "a", "b"]);

    assert_eq!(merged[0], old_gone, "unreached rows are untouched, including updated_on");

    let a = &merged[1];
    assert_eq!(a.title.as_deref(), Some("new title"));
    assert_eq!(a.num_comments, Some(50));
    assert_eq!(a.permalink.as_deref(), Some("/r/worldnews/comments/a/"));
    assert_eq!(a.updated_on.as_deref(), Some("2022-03-10 12:00:00"));

    assert_eq!(merged[2].updated_on.as_deref(), Some("2022-03-10 12:00:00"));
}

/// Every id of the previous index survives a merge, whatever the fresh scan returns.
#[test]
fn merge_never_drops_previous_ids() {
    let previous: Vec<ThreadRecord> = (0..20).map(|i| row(&format!("p{i}"), INVASION_DAY + i as f64, "t", i)).collect();
    let fresh: Vec<ThreadRecord> = (15..25).map(|i| row(&format!("p{i}"), INVASION_DAY + i as f64, "t2", i * 10)).collect();

    let merged = merge_with_fallback(fresh, previous.clone(), datetime!(2022-04-01 00:00 UTC)).unwrap();
    assert_eq!(merged.len(), 25);
    for p in &previous {
        assert!(merged.iter().any(|m| m.id == p.id), "{} lost", p.id);
    }
    assert!(merged.windows(2).all(|w| w[0].created_utc <= w[1].created_utc));
}

#[test]
fn index_file_survives_a_write_and_reload() {
    let dir = temp_data_dir();
    let path = dir.join("threads.csv");
    let mut r = row("t1", INVASION_DAY, "Title, with a comma", 3);
    r.upvote_ratio = Some(0.93);
    r.updated_on = Some("2022-03-01 10:00:00".into());
    let rows = vec![r, ThreadRecord { id: "bare".into(), ..Default::default() }];

    write_index(&path, &rows).unwrap();
    let (header, _) = read_csv(&path);
    assert_eq!(header, INDEX_COLUMNS);
    assert!(!dir.join("threads.csv.part").exists());

    let back = load_index(&path).unwrap();
    assert_eq!(back, rows);
}

#[test]
fn empty_index_still_has_a_header() {
    let dir = temp_data_dir();
    let path = dir.join("threads.csv");
    write_index(&path, &[]).unwrap();
    let (header, rows) = read_csv(&path);
    assert_eq!(header, INDEX_COLUMNS);
    assert!(rows.is_empty());
    assert!(load_index(&path).unwrap().is_empty());
}

#[test]
fn missing_index_loads_as_empty() {
    let dir = temp_data_dir();
    assert!(load_index(&dir.join("threads.csv")).unwrap().is_empty());
}

/// Two index runs: the second scan no longer sees the first thread, which stays in the file.
#[test]
fn update_index_keeps_threads_the_scan_lost() {
    let dir = temp_data_dir();
    let (begin, end) = spring_2022();
    let title = "/r/worldnews live thread";
    let etl = LiveThreadETL::new()
        .data_dir(&dir)
        .accounts(["mods"])
        .window(begin, end)
        .progress(false);

    let first = FakeApi::new().with_posts("mods", vec![submission("one", title, INVASION_DAY)]);
    etl.update_index_at(&first, datetime!(2022-03-01 00:00 UTC)).unwrap();

    let second = FakeApi::new().with_posts("mods", vec![submission("two", title, INVASION_DAY + 86_400.0)]);
    let update = etl.update_index_at(&second, datetime!(2022-03-02 00:00 UTC)).unwrap();

    let ids: Vec<&str> = update.rows.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["one", "two"]);
    assert_eq!(column(&dir.join("threads.csv"), "updated_on"), vec!["2022-03-01 00:00:00", "2022-03-02 00:00:00"]);
}
