//! The remote API seam. Everything that talks to Reddit goes through [`RedditApi`],
//! so discovery and fetch can run against [`RedditClient`] or an in-memory fake.

pub mod client;
pub mod listing;

use std::collections::BTreeMap;

pub use client::RedditClient;
pub use listing::{CommentForest, MoreRequest, Thing};

/// Failures from the remote API.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("{url} returned HTTP {status}")]
    Status { status: u16, url: String },
    /// Suspended, deleted or otherwise unreachable account/thread.
    #[error("not found: {0}")]
    NotFound(String),
    #[error("authentication failed: {0}")]
    Auth(String),
    /// Still throttled after waiting out every advertised reset.
    #[error("rate limited: {0}")]
    RateLimited(String),
    #[error("unexpected payload: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("{0}")]
    Other(String),
}

/// A post as returned by an account's submission listing.
#[derive(Clone, Debug, PartialEq)]
pub struct Submission {
    pub id: String,
    pub name: String,
    /// `None` when the author deleted their account.
    pub author: Option<String>,
    pub title: String,
    pub created_utc: f64,
    pub num_comments: i64,
    pub score: i64,
    pub upvote_ratio: f64,
    pub permalink: String,
}

/// One node of a fully expanded comment tree.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Comment {
    pub id: String,
    pub author: Option<String>,
    pub body: String,
    /// Edit time, `None` when never edited.
    pub edited: Option<f64>,
    pub created_utc: f64,
    pub link_id: String,
    pub parent_id: String,
    pub distinguished: Option<String>,
    pub depth: i64,
    pub ups: i64,
    pub downs: i64,
    pub score: i64,
    pub total_awards_received: i64,
    pub gilded: i64,
    pub gildings: BTreeMap<String, i64>,
    pub replies: Vec<Comment>,
}

/// What the crawler needs from Reddit.
pub trait RedditApi {
    /// Newest-first submissions of `username`, at most `limit` of them.
    fn user_submissions(&self, username: &str, limit: usize) -> Result<Vec<Submission>, ApiError>;

    /// The complete top-level comment list of a thread with every "load more"
    /// placeholder already expanded.
    fn comment_forest(&self, thread_id: &str) -> Result<Vec<Comment>, ApiError>;
}

impl<T: RedditApi + ?Sized> RedditApi for &T {
    fn user_submissions(&self, username: &str, limit: usize) -> Result<Vec<Submission>, ApiError> {
        (**self).user_submissions(username, limit)
    }
    fn comment_forest(&self, thread_id: &str) -> Result<Vec<Comment>, ApiError> {
        (**self).comment_forest(thread_id)
    }
}
