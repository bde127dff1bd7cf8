//! CSV row shapes for `threads.csv` and `comments__<id>.csv`.

use anyhow::Result;
use serde::{Deserialize, Serialize, Serializer};

use crate::api::{Comment, Submission};
use crate::date::created_at_from_epoch;
use crate::util::hash_author;

/// One row of the thread index. Every column but `id` may be empty on disk, which
/// is what lets a fresh scan be overlaid field by field onto an older row.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ThreadRecord {
    pub id: String,
    pub name: Option<String>,
    pub author: Option<String>, // hashed
    pub title: Option<String>,
    pub created_utc: Option<f64>,
    pub created_at: Option<String>,
    pub num_comments: Option<i64>,
    pub score: Option<i64>,
    pub upvote_ratio: Option<f64>,
    pub permalink: Option<String>,
    #[serde(default)]
    pub updated_on: Option<String>,
}

impl ThreadRecord {
    pub fn from_submission(sub: &Submission) -> Result<Self> {
        Ok(Self {
            id: sub.id.clone(),
            name: Some(sub.name.clone()),
            author: sub.author.as_deref().map(hash_author),
            title: Some(sub.title.clone()),
            created_utc: Some(sub.created_utc),
            created_at: Some(created_at_from_epoch(sub.created_utc)?),
            num_comments: Some(sub.num_comments),
            score: Some(sub.score),
            upvote_ratio: Some(sub.upvote_ratio),
            permalink: Some(sub.permalink.clone()),
            updated_on: None,
        })
    }

    /// Field-wise coalesce: keep `self`'s value where present, else take `older`'s.
    pub fn overlay(self, older: ThreadRecord) -> ThreadRecord {
        ThreadRecord {
            id: self.id,
            name: self.name.or(older.name),
            author: self.author.or(older.author),
            title: self.title.or(older.title),
            created_utc: self.created_utc.or(older.created_utc),
            created_at: self.created_at.or(older.created_at),
            num_comments: self.num_comments.or(older.num_comments),
            score: self.score.or(older.score),
            upvote_ratio: self.upvote_ratio.or(older.upvote_ratio),
            permalink: self.permalink.or(older.permalink),
            updated_on: self.updated_on.or(older.updated_on),
        }
    }
}

/// `edited` column: `False`, or the epoch of the last edit.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum Edited {
    #[default]
    No,
    At(f64),
}

impl Serialize for Edited {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        match self {
            Edited::No => s.serialize_str("False"),
            Edited::At(ts) => s.serialize_f64(*ts),
        }
    }
}

/// One row of a per-thread comment file.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct CommentRecord {
    pub author: Option<String>, // hashed, empty when the account is gone
    pub submission_id: String,
    pub id: String,
    pub body: String,
    pub edited: Edited,
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
    pub gildings: Option<String>,
}

pub const COMMENT_COLUMNS: &[&str] = &[
    "author", "submission_id", "id", "body", "edited", "created_utc", "link_id", "parent_id",
    "distinguished", "depth", "ups", "downs", "score", "total_awards_received", "gilded", "gildings",
];

impl CommentRecord {
    /// Row for `comment` (its replies are ignored).
    pub fn from_comment(comment: &Comment, submission_id: &str) -> Self {
        let gildings = if comment.gildings.is_empty() {
            None
        } else {
            serde_json::to_string(&comment.gildings).ok()
        };
        Self {
            author: comment.author.as_deref().map(hash_author),
            submission_id: submission_id.to_string(),
            id: comment.id.clone(),
            body: comment.body.clone(),
            edited: comment.edited.map_or(Edited::No, Edited::At),
            created_utc: comment.created_utc,
            link_id: comment.link_id.clone(),
            parent_id: comment.parent_id.clone(),
            distinguished: comment.distinguished.clone(),
            depth: comment.depth,
            ups: comment.ups,
            downs: comment.downs,
            score: comment.score,
            total_awards_received: comment.total_awards_received,
            gilded: comment.gilded,
            gildings,
        }
    }
}
