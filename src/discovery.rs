//! Thread discovery: walk each privileged account's recent posts and keep the
//! live threads inside the crawl window.

use ahash::AHashMap;
use anyhow::Result;
use tracing::{info, warn};

use crate::api::{RedditApi, Submission};
use crate::config::EtlOptions;
use crate::filters::is_live_thread;
use crate::index::sort_by_created;
use crate::records::ThreadRecord;

#[derive(Debug, Default)]
pub struct DiscoveryReport {
    /// Matching threads, one per id, ascending by creation time.
    pub threads: Vec<ThreadRecord>,
    pub accounts_scanned: usize,
    /// Accounts whose lookup failed, with the error text.
    pub failed_accounts: Vec<(String, String)>,
    pub posts_seen: usize,
}

/// Scans `opts.accounts`. A failing account (suspended, deleted, transient error)
/// is logged and skipped; the scan always covers the remaining accounts.
pub fn discover_threads<A: RedditApi + ?Sized>(api: &A, opts: &EtlOptions) -> Result<DiscoveryReport> {
    let mut report = DiscoveryReport::default();
    let mut by_id: AHashMap<String, Submission> = AHashMap::new();

    for account in &opts.accounts {
        report.accounts_scanned += 1;
        let posts = match api.user_submissions(account, opts.lookback) {
            Ok(p) => p,
            Err(e) => {
                warn!("skipping account {account}: {e}");
                report.failed_accounts.push((account.clone(), e.to_string()));
                continue;
            }
        };
        report.posts_seen += posts.len();
        for post in posts {
            if is_live_thread(&post, &opts.title_prefixes, &opts.window) {
                by_id.entry(post.id.clone()).or_insert(post);
            }
        }
    }

    let mut threads = by_id.values().map(ThreadRecord::from_submission).collect::<Result<Vec<_>>>()?;
    sort_by_created(&mut threads);
    info!(
        "Discovery: {} live threads from {} posts ({} of {} accounts failed)",
        threads.len(),
        report.posts_seen,
        report.failed_accounts.len(),
        report.accounts_scanned
    );
    report.threads = threads;
    Ok(report)
}
