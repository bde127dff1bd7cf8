//! Loading comment timestamps for binning.
//!
//! Each comment file is read and validated on its own. A file that fails validation
//! is reported and left out; the remaining files still feed the histogram.

use anyhow::{Context, Result};
use parking_lot::Mutex;
use rayon::prelude::*;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::date::epoch_in_range;
use crate::paths::CommentFile;
use crate::progress::count_progress_if;
use crate::util::open_with_backoff;

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ValidationError {
    #[error("no `created_utc` column")]
    MissingColumn,
    #[error("row {row}: `created_utc` is empty")]
    MissingTimestamp { row: usize },
    #[error("row {row}: `created_utc` is not a float ({value:?})")]
    NotFloat { row: usize, value: String },
    #[error("row {row}: `created_utc` {value} is not a representable date")]
    OutOfRange { row: usize, value: f64 },
    /// Every value is written as an integer, so the column is not a float column.
    #[error("`created_utc` holds integers, not floats")]
    IntegerColumn,
}

/// `1645671600.0`, `1.6e9`: written the way a float column is.
fn has_float_form(raw: &str) -> bool {
    raw.contains(['.', 'e', 'E'])
}

/// Reads the `created_utc` column of one comment file. Any empty, non-numeric
/// (including NaN/inf) or out-of-range value rejects the whole file, as does a
/// column where no value is written as a float. A file without rows is accepted.
pub fn read_validate_thread(path: &Path) -> Result<Vec<f64>> {
    let f = open_with_backoff(path, 16, 50).with_context(|| format!("open {}", path.display()))?;
    let mut rdr = csv::Reader::from_reader(BufReader::new(f));
    let col = rdr
        .headers()
        .with_context(|| format!("read header of {}", path.display()))?
        .iter()
        .position(|h| h == "created_utc")
        .ok_or(ValidationError::MissingColumn)?;

    let mut out = Vec::new();
    let mut float_form = false;
    for (i, rec) in rdr.records().enumerate() {
        let row = i + 1;
        let rec = rec.with_context(|| format!("{} row {row}", path.display()))?;
        let raw = rec.get(col).unwrap_or("").trim();
        if raw.is_empty() {
            return Err(ValidationError::MissingTimestamp { row }.into());
        }
        match raw.parse::<f64>() {
            Ok(v) if !v.is_finite() => return Err(ValidationError::NotFloat { row, value: raw.to_string() }.into()),
            Ok(v) if !epoch_in_range(v) => return Err(ValidationError::OutOfRange { row, value: v }.into()),
            Ok(v) => out.push(v),
            Err(_) => return Err(ValidationError::NotFloat { row, value: raw.to_string() }.into()),
        }
        float_form |= has_float_form(raw);
    }
    if !out.is_empty() && !float_form {
        return Err(ValidationError::IntegerColumn.into());
    }
    Ok(out)
}

#[derive(Debug, Default)]
pub struct TimingLoad {
    pub timestamps: Vec<f64>,
    pub files_read: usize,
    /// Files left out, with the reason.
    pub rejected: Vec<(PathBuf, String)>,
}

/// Reads and validates `files` in parallel on the current rayon pool.
pub fn load_comment_timings(files: &[CommentFile], progress: bool) -> TimingLoad {
    let pb = count_progress_if(progress, files.len() as u64, "Load comment files");
    let rejected = Mutex::new(Vec::<(PathBuf, String)>::new());

    let parts: Vec<Vec<f64>> = files
        .par_iter()
        .filter_map(|file| {
            let res = read_validate_thread(&file.path);
            pb.inc(1);
            match res {
                Ok(ts) => Some(ts),
                Err(e) => {
                    warn!("Error reading {}: {e:#}", file.path.display());
                    rejected.lock().push((file.path.clone(), format!("{e:#}")));
                    None
                }
            }
        })
        .collect();
    pb.finish_with_message("Load comment files done");

    let mut rejected = rejected.into_inner();
    rejected.sort();
    TimingLoad {
        files_read: parts.len(),
        timestamps: parts.into_iter().flatten().collect(),
        rejected,
    }
}
