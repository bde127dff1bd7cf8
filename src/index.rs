//! The thread index (`threads.csv`): load, merge-with-fallback, atomic write.

use ahash::AHashMap;
use anyhow::{Context, Result};
use std::cmp::Ordering;
use std::io::BufWriter;
use std::path::Path;
use time::OffsetDateTime;

use crate::date::format_timestamp;
use crate::records::ThreadRecord;
use crate::util::{create_with_backoff, open_with_backoff, part_path, replace_file_atomic_backoff};

pub const INDEX_COLUMNS: &[&str] = &[
    "id", "name", "author", "title", "created_utc", "created_at", "num_comments", "score",
    "upvote_ratio", "permalink", "updated_on",
];

/// Ascending by `created_utc` (rows without one last), ties by id.
pub fn sort_by_created(rows: &mut [ThreadRecord]) {
    rows.sort_by(|a, b| {
        let by_time = match (a.created_utc, b.created_utc) {
            (Some(x), Some(y)) => x.total_cmp(&y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        };
        by_time.then_with(|| a.id.cmp(&b.id))
    });
}

/// Reads the index; a missing file is an empty index.
pub fn load_index(path: &Path) -> Result<Vec<ThreadRecord>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let f = open_with_backoff(path, 16, 50).with_context(|| format!("open {}", path.display()))?;
    let mut rdr = csv::Reader::from_reader(f);
    let mut rows = Vec::new();
    for (i, rec) in rdr.deserialize::<ThreadRecord>().enumerate() {
        rows.push(rec.with_context(|| format!("{} row {}", path.display(), i + 1))?);
    }
    Ok(rows)
}

/// Outer join of `fresh` and `previous` on id. For every column the fresh value wins
/// when present, otherwise the previous one is kept; rows only in `previous` survive
/// unchanged. Rows present in `fresh` are stamped with `updated_on = now`
/// (whole seconds). Output is sorted by creation time.
pub fn merge_with_fallback(
    fresh: Vec<ThreadRecord>,
    previous: Vec<ThreadRecord>,
    now: OffsetDateTime,
) -> Result<Vec<ThreadRecord>> {
    let stamp = format_timestamp(now)?;
    let mut merged: AHashMap<String, ThreadRecord> = previous.into_iter().map(|r| (r.id.clone(), r)).collect();

    for mut row in fresh {
        row.updated_on = Some(stamp.clone());
        let combined = match merged.remove(&row.id) {
            Some(old) => row.overlay(old),
            None => row,
        };
        merged.insert(combined.id.clone(), combined);
    }

    let mut rows: Vec<ThreadRecord> = merged.into_values().collect();
    sort_by_created(&mut rows);
    Ok(rows)
}

/// Writes the index via a `.part` sibling and an atomic replace, so a reader never
/// sees a half-written file.
pub fn write_index(path: &Path, rows: &[ThreadRecord]) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
    }
    let tmp = part_path(path);
    {
        let f = create_with_backoff(&tmp, 16, 50).with_context(|| format!("create {}", tmp.display()))?;
        // Header written by hand so that an empty index still carries its columns.
        let mut w = csv::WriterBuilder::new().has_headers(false).from_writer(BufWriter::new(f));
        w.write_record(INDEX_COLUMNS)?;
        for row in rows {
            w.serialize(row)?;
        }
        w.flush().with_context(|| format!("flush {}", tmp.display()))?;
    }
    replace_file_atomic_backoff(&tmp, path)
}
