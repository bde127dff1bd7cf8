use anyhow::{Context, Result};
use std::path::Path;
use time::OffsetDateTime;
use tracing::info;

use crate::aggregate::{load_comment_timings, TimingLoad};
use crate::api::RedditApi;
use crate::bucketing::Histogram;
use crate::config::EtlOptions;
use crate::date::{now_truncated, TimeWindow};
use crate::discovery::{discover_threads, DiscoveryReport};
use crate::fetch::{fetch_missing_threads, FetchOptions, FetchReport};
use crate::index::{load_index, merge_with_fallback, write_index};
use crate::paths::DataLayout;
use crate::records::ThreadRecord;
use crate::util::init_tracing_once;

/// Entry point for both pipelines: ingestion (discover, index, fetch) and
/// aggregation (load, bin).
#[derive(Clone, Default)]
pub struct LiveThreadETL {
    pub(crate) opts: EtlOptions,
}

#[derive(Debug)]
pub struct IndexUpdate {
    pub discovery: DiscoveryReport,
    /// Rows written, including rows no longer reachable by the scan.
    pub rows: Vec<ThreadRecord>,
}

#[derive(Debug)]
pub struct CrawlSummary {
    pub index: IndexUpdate,
    pub fetch: FetchReport,
}

impl LiveThreadETL {
    pub fn new() -> Self {
        Self { opts: EtlOptions::default() }
    }

    pub fn from_options(opts: EtlOptions) -> Self {
        Self { opts }
    }

    // -------- Builder methods --------
    pub fn data_dir(mut self, dir: impl AsRef<Path>) -> Self { self.opts = self.opts.with_data_dir(dir); self }
    pub fn accounts<I, S>(mut self, accounts: I) -> Self where I: IntoIterator<Item = S>, S: Into<String> { self.opts = self.opts.with_accounts(accounts); self }
    pub fn title_prefixes<I, S>(mut self, prefixes: I) -> Self where I: IntoIterator<Item = S>, S: AsRef<str> { self.opts = self.opts.with_title_prefixes(prefixes); self }
    pub fn window(mut self, begin: OffsetDateTime, end: OffsetDateTime) -> Self { self.opts = self.opts.with_window(TimeWindow::new(begin, end)); self }
    pub fn lookback(mut self, n: usize) -> Self { self.opts = self.opts.with_lookback(n); self }
    pub fn fail_fast(mut self, yes: bool) -> Self { self.opts = self.opts.with_fail_fast(yes); self }
    pub fn parallelism(mut self, threads: usize) -> Self { self.opts = self.opts.with_parallelism(threads); self }
    pub fn progress(mut self, yes: bool) -> Self { self.opts = self.opts.with_progress(yes); self }

    pub fn options(&self) -> &EtlOptions { &self.opts }
    pub fn layout(&self) -> DataLayout { DataLayout::new(&self.opts.data_dir) }

    // -------- Ingestion --------

    /// Discovers live threads and merges them into `threads.csv`, stamping
    /// `updated_on` with `now`.
    pub fn update_index_at<A: RedditApi + ?Sized>(&self, api: &A, now: OffsetDateTime) -> Result<IndexUpdate> {
        init_tracing_once();
        let layout = self.layout();
        let discovery = discover_threads(api, &self.opts)?;
        let previous = load_index(&layout.index_path())?;
        let n_prev = previous.len();
        let rows = merge_with_fallback(discovery.threads.clone(), previous, now)?;
        write_index(&layout.index_path(), &rows)?;
        info!(
            "Index: {} rows written to {} ({} previously, {} from this scan)",
            rows.len(),
            layout.index_path().display(),
            n_prev,
            discovery.threads.len()
        );
        Ok(IndexUpdate { discovery, rows })
    }

    pub fn update_index<A: RedditApi + ?Sized>(&self, api: &A) -> Result<IndexUpdate> {
        self.update_index_at(api, now_truncated())
    }

    /// Fetches every indexed thread that has no comment file yet. The index is read
    /// from disk, so only a fully written index drives the fetch.
    pub fn fetch_comments<A: RedditApi + ?Sized>(&self, api: &A) -> Result<FetchReport> {
        init_tracing_once();
        let layout = self.layout();
        let index = load_index(&layout.index_path())
            .with_context(|| format!("load index {}", layout.index_path().display()))?;
        let ids: Vec<String> = index.into_iter().map(|r| r.id).collect();
        let opts = FetchOptions { fail_fast: self.opts.fail_fast, progress: self.opts.progress };
        fetch_missing_threads(api, &layout, &ids, opts)
    }

    /// `update_index` then `fetch_comments`.
    pub fn crawl<A: RedditApi + ?Sized>(&self, api: &A) -> Result<CrawlSummary> {
        let index = self.update_index(api)?;
        let fetch = self.fetch_comments(api)?;
        Ok(CrawlSummary { index, fetch })
    }

    // -------- Aggregation --------

    fn with_pool<T: Send>(&self, f: impl FnOnce() -> T + Send) -> Result<T> {
        match self.opts.parallelism {
            Some(n) if n > 0 => {
                let pool = rayon::ThreadPoolBuilder::new().num_threads(n).build()?;
                Ok(pool.install(f))
            }
            _ => Ok(f()),
        }
    }

    /// Timestamps from every comment file in the comments directory.
    pub fn load_timings(&self) -> Result<TimingLoad> {
        init_tracing_once();
        let files = self.layout().discover_comment_files();
        let progress = self.opts.progress;
        let load = self.with_pool(|| load_comment_timings(&files, progress))?;
        info!(
            "Loaded {} timestamps from {} files ({} rejected)",
            load.timestamps.len(),
            load.files_read,
            load.rejected.len()
        );
        Ok(load)
    }

    /// Timestamps from the comment files of indexed threads only.
    pub fn load_indexed_timings(&self) -> Result<TimingLoad> {
        init_tracing_once();
        let layout = self.layout();
        let index = load_index(&layout.index_path())?;
        let files = layout.comment_files_for(&index);
        let progress = self.opts.progress;
        self.with_pool(|| load_comment_timings(&files, progress))
    }

    /// Loads all comment files and bins them at `width` seconds.
    pub fn histogram(&self, width: i64) -> Result<Histogram> {
        let load = self.load_timings()?;
        Histogram::from_timestamps(&load.timestamps, width)
    }
}
