mod config;
mod date;
mod paths;
mod util;
mod progress;

pub mod api;
mod records;
mod filters;
mod discovery;
mod index;
mod flatten;
mod fetch;

mod aggregate;
mod bucketing;
mod events;
mod chart;
mod viewer;
mod manifest;
mod pipeline;

pub use crate::config::{ChartConfig, Credentials, EtlOptions, FileConfig, DEFAULT_ACCOUNTS, DEFAULT_LOOKBACK, DEFAULT_TITLE_PREFIXES};
pub use crate::date::{created_at_from_epoch, format_timestamp, parse_date, parse_datetime, TimeWindow};
pub use crate::paths::{CommentFile, DataLayout};
pub use crate::pipeline::{CrawlSummary, IndexUpdate, LiveThreadETL};

// records and the index file
pub use crate::records::{CommentRecord, Edited, ThreadRecord, COMMENT_COLUMNS};
pub use crate::index::{load_index, merge_with_fallback, sort_by_created, write_index, INDEX_COLUMNS};

// ingestion stages
pub use crate::filters::{is_live_thread, normalize_title, title_matches};
pub use crate::discovery::{discover_threads, DiscoveryReport};
pub use crate::flatten::flatten_comments;
pub use crate::fetch::{fetch_missing_threads, fetch_thread, write_comment_file, FetchOptions, FetchReport};

// aggregation & charting
pub use crate::aggregate::{load_comment_timings, read_validate_thread, TimingLoad, ValidationError};
pub use crate::bucketing::{bin_edges, ceil_to_multiple, floor_to_multiple, Bucket, Histogram, Series};
pub use crate::events::{default_events, default_notes, locate_event, locate_events, Annotation, Event, Note};
pub use crate::chart::{layout_chart, render_png, ChartLayout, PlacedAnnotation, PlacedNote};
pub use crate::viewer::{build_view, Interval, View, ViewRequest};
pub use crate::manifest::{comment_resources, prepare_metadata, version_note, Resource, COMMENT_SCHEMA};

pub use crate::util::{hash_author, init_tracing_once};
