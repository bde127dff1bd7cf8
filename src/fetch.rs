//! Incremental comment fetch: one file per thread, written once.
//!
//! A thread whose file exists is skipped unconditionally. Files are written to a
//! `.part` sibling and renamed into place, so an interrupted run leaves no file
//! that would later pass as "already fetched".

use anyhow::{Context, Result};
use std::io::BufWriter;
use std::path::Path;
use std::time::Instant;
use tracing::{info, warn};

use crate::api::RedditApi;
use crate::flatten::flatten_comments;
use crate::paths::DataLayout;
use crate::progress::count_progress_if;
use crate::records::{CommentRecord, COMMENT_COLUMNS};
use crate::util::{create_with_backoff, part_path, replace_file_atomic_backoff};

#[derive(Clone, Copy, Debug, Default)]
pub struct FetchOptions {
    pub fail_fast: bool,
    pub progress: bool,
}

#[derive(Debug, Default)]
pub struct FetchReport {
    pub fetched: Vec<String>,
    pub skipped: usize,
    pub failed: Vec<(String, String)>,
    pub comments_written: usize,
}

/// Writes `rows` as a complete comment file at `dest`.
pub fn write_comment_file(dest: &Path, rows: &[CommentRecord]) -> Result<()> {
    if let Some(parent) = dest.parent() {
        std::fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
    }
    let tmp = part_path(dest);
    {
        let f = create_with_backoff(&tmp, 16, 50).with_context(|| format!("create {}", tmp.display()))?;
        let mut w = csv::WriterBuilder::new().has_headers(false).from_writer(BufWriter::new(f));
        w.write_record(COMMENT_COLUMNS)?;
        for row in rows {
            w.serialize(row)?;
        }
        w.flush().with_context(|| format!("flush {}", tmp.display()))?;
    }
    replace_file_atomic_backoff(&tmp, dest)
}

/// Fetches, flattens and stores one thread. Returns the number of comments written.
pub fn fetch_thread<A: RedditApi + ?Sized>(api: &A, layout: &DataLayout, thread_id: &str) -> Result<usize> {
    let t0 = Instant::now();
    let forest = api.comment_forest(thread_id).with_context(|| format!("fetch comments of {thread_id}"))?;
    let rows = flatten_comments(forest, thread_id);
    write_comment_file(&layout.comment_path(thread_id), &rows)?;
    info!("Done processing {} comments from {thread_id}: {:.1}s", rows.len(), t0.elapsed().as_secs_f64());
    Ok(rows.len())
}

/// Fetches every thread in `thread_ids` that has no comment file yet.
///
/// A thread failure is logged and the run moves on, unless `opts.fail_fast`.
pub fn fetch_missing_threads<A: RedditApi + ?Sized>(
    api: &A,
    layout: &DataLayout,
    thread_ids: &[String],
    opts: FetchOptions,
) -> Result<FetchReport> {
    std::fs::create_dir_all(layout.comments_dir())
        .with_context(|| format!("create {}", layout.comments_dir().display()))?;

    let mut report = FetchReport::default();
    let pb = count_progress_if(opts.progress, thread_ids.len() as u64, "Fetch threads");

    for id in thread_ids {
        pb.inc(1);
        if layout.is_fetched(id) {
            report.skipped += 1;
            continue;
        }
        pb.set_message(format!("Fetch {id}"));
        match fetch_thread(api, layout, id) {
            Ok(n) => {
                report.comments_written += n;
                report.fetched.push(id.clone());
            }
            Err(e) if opts.fail_fast => {
                pb.abandon();
                return Err(e.context(format!("thread {id}")));
            }
            Err(e) => {
                warn!("thread {id} failed, continuing: {e:#}");
                report.failed.push((id.clone(), format!("{e:#}")));
            }
        }
    }

    pb.finish_with_message("Fetch threads done");
    info!(
        "Fetch: {} fetched ({} comments), {} already present, {} failed",
        report.fetched.len(),
        report.comments_written,
        report.skipped,
        report.failed.len()
    );
    Ok(report)
}
