#![allow(dead_code)]

use livethreads::api::{ApiError, Comment, RedditApi, Submission};
use livethreads::{CommentRecord, DataLayout};
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use time::macros::datetime;
use time::OffsetDateTime;

/// 2022-02-24 03:00:00 UTC.
pub const INVASION_DAY: f64 = 1_645_671_600.0;

/// In-memory stand-in for Reddit. Accounts missing from `posts` answer `NotFound`,
/// as a suspended account would; threads listed in `broken` fail with a status error.
#[derive(Default)]
pub struct FakeApi {
    pub posts: HashMap<String, Vec<Submission>>,
    pub forests: HashMap<String, Vec<Comment>>,
    pub broken: Vec<String>,
    pub submission_calls: Mutex<Vec<String>>,
    pub forest_calls: Mutex<Vec<String>>,
}

impl FakeApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_posts(mut self, account: &str, posts: Vec<Submission>) -> Self {
        self.posts.insert(account.to_string(), posts);
        self
    }

    pub fn with_forest(mut self, thread_id: &str, forest: Vec<Comment>) -> Self {
        self.forests.insert(thread_id.to_string(), forest);
        self
    }

    pub fn with_broken_thread(mut self, thread_id: &str) -> Self {
        self.broken.push(thread_id.to_string());
        self
    }

    pub fn forest_calls(&self) -> Vec<String> {
        self.forest_calls.lock().clone()
    }
}

impl RedditApi for FakeApi {
    fn user_submissions(&self, username: &str, limit: usize) -> Result<Vec<Submission>, ApiError> {
        self.submission_calls.lock().push(username.to_string());
        match self.posts.get(username) {
            Some(p) => Ok(p.iter().take(limit).cloned().collect()),
            None => Err(ApiError::NotFound(format!("/user/{username}/submitted"))),
        }
    }

    fn comment_forest(&self, thread_id: &str) -> Result<Vec<Comment>, ApiError> {
        self.forest_calls.lock().push(thread_id.to_string());
        if self.broken.iter().any(|b| b == thread_id) {
            return Err(ApiError::Status { status: 500, url: format!("/comments/{thread_id}") });
        }
        Ok(self.forests.get(thread_id).cloned().unwrap_or_default())
    }
}

pub fn submission(id: &str, title: &str, created_utc: f64) -> Submission {
    Submission {
        id: id.to_string(),
        name: format!("t3_{id}"),
        author: Some("WorldNewsMods".to_string()),
        title: title.to_string(),
        created_utc,
        num_comments: 10,
        score: 100,
        upvote_ratio: 0.95,
        permalink: format!("/r/worldnews/comments/{id}/"),
    }
}

pub fn comment(id: &str, parent_id: &str, created_utc: f64, replies: Vec<Comment>) -> Comment {
    Comment {
        id: id.to_string(),
        author: Some(format!("user_{id}")),
        body: format!("body of {id}"),
        created_utc,
        link_id: "t3_thread".to_string(),
        parent_id: parent_id.to_string(),
        ups: 1,
        score: 1,
        gildings: BTreeMap::new(),
        replies,
        ..Default::default()
    }
}

/// Window covering February through April 2022.
pub fn spring_2022() -> (OffsetDateTime, OffsetDateTime) {
    (datetime!(2022-02-01 00:00 UTC), datetime!(2022-05-01 00:00 UTC))
}

/// A fresh temp dir that outlives the test (kept for inspection on failure).
pub fn temp_data_dir() -> PathBuf {
    tempfile::tempdir().unwrap().into_path()
}

/// Writes a comment file with only the columns the aggregation reads.
pub fn write_raw_comment_file(layout: &DataLayout, thread_id: &str, body: &str) -> PathBuf {
    let path = layout.comment_path(thread_id);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, body).unwrap();
    path
}

/// Writes a well-formed comment file whose `created_utc` values are `timestamps`.
pub fn write_comment_timestamps(layout: &DataLayout, thread_id: &str, timestamps: &[f64]) -> PathBuf {
    let rows: Vec<CommentRecord> = timestamps
        .iter()
        .enumerate()
        .map(|(i, &ts)| CommentRecord {
            submission_id: thread_id.to_string(),
            id: format!("{thread_id}c{i}"),
            created_utc: ts,
            link_id: format!("t3_{thread_id}"),
            parent_id: format!("t3_{thread_id}"),
            ..Default::default()
        })
        .collect();
    let path = layout.comment_path(thread_id);
    livethreads::write_comment_file(&path, &rows).unwrap();
    path
}

/// Reads a CSV file into (header, rows) as plain strings.
pub fn read_csv(path: &Path) -> (Vec<String>, Vec<Vec<String>>) {
    let mut rdr = csv::Reader::from_path(path).unwrap();
    let header = rdr.headers().unwrap().iter().map(str::to_string).collect();
    let rows = rdr
        .records()
        .map(|r| r.unwrap().iter().map(str::to_string).collect())
        .collect();
    (header, rows)
}

/// Column `name` of every row.
pub fn column(path: &Path, name: &str) -> Vec<String> {
    let (header, rows) = read_csv(path);
    let idx = header.iter().position(|h| h == name).unwrap();
    rows.into_iter().map(|r| r[idx].clone()).collect()
}
