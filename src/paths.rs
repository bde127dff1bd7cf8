use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use walkdir::WalkDir;

use crate::records::ThreadRecord;

pub const INDEX_FILE: &str = "threads.csv";
pub const COMMENTS_DIR: &str = "comments";
pub const METADATA_FILE: &str = "dataset-metadata.json";

fn comment_file_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^comments__([A-Za-z0-9_]+)\.csv$").expect("static regex"))
}

/// On-disk layout of a crawl:
///
/// ```text
/// <data_dir>/threads.csv
/// <data_dir>/comments/comments__<thread id>.csv
/// ```
#[derive(Clone, Debug)]
pub struct DataLayout {
    pub data_dir: PathBuf,
}

/// A comment file found on disk, with the thread id recovered from its name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommentFile {
    pub thread_id: String,
    pub path: PathBuf,
}

impl DataLayout {
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        Self { data_dir: data_dir.as_ref().to_path_buf() }
    }

    pub fn index_path(&self) -> PathBuf { self.data_dir.join(INDEX_FILE) }
    pub fn comments_dir(&self) -> PathBuf { self.data_dir.join(COMMENTS_DIR) }
    pub fn metadata_path(&self) -> PathBuf { self.data_dir.join(METADATA_FILE) }

    pub fn comment_path(&self, thread_id: &str) -> PathBuf {
        self.comments_dir().join(format!("comments__{thread_id}.csv"))
    }

    /// True once a thread's comment file has been promoted into place.
    /// In-flight `.part` files never count.
    pub fn is_fetched(&self, thread_id: &str) -> bool {
        self.comment_path(thread_id).is_file()
    }

    /// All `comments__<id>.csv` files, sorted by thread id.
    pub fn discover_comment_files(&self) -> Vec<CommentFile> {
        let dir = self.comments_dir();
        let mut out = Vec::new();
        if !dir.exists() {
            return out;
        }
        for ent in WalkDir::new(&dir).min_depth(1).max_depth(1).into_iter().flatten() {
            if !ent.file_type().is_file() {
                continue;
            }
            let Some(name) = ent.file_name().to_str() else { continue };
            if let Some(caps) = comment_file_re().captures(name) {
                out.push(CommentFile { thread_id: caps[1].to_string(), path: ent.path().to_path_buf() });
            }
        }
        out.sort_by(|a, b| a.thread_id.cmp(&b.thread_id));
        out
    }

    /// Comment files for the threads listed in `index`, skipping those not fetched yet.
    pub fn comment_files_for(&self, index: &[ThreadRecord]) -> Vec<CommentFile> {
        index
            .iter()
            .filter(|t| self.is_fetched(&t.id))
            .map(|t| CommentFile { thread_id: t.id.clone(), path: self.comment_path(&t.id) })
            .collect()
    }
}
