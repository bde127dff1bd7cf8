use clap::{Args, Parser, Subcommand};
use livethreads::Interval;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "livethreads")]
#[command(about = "Crawl r/worldnews live threads and chart their comment volume", long_about = None)]
pub struct Cli {
    /// Directory holding threads.csv and comments/
    #[arg(long, global = true, default_value = "./data")]
    pub data_dir: PathBuf,

    /// JSON file overriding accounts, title prefixes, window, events and notes
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Disable progress bars
    #[arg(long, global = true)]
    pub no_progress: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Discover live threads and merge them into threads.csv
    Index,
    /// Download comment files for indexed threads that have none yet
    Fetch(FetchArgs),
    /// Index, then fetch
    Crawl(FetchArgs),
    /// Render the comment-volume chart from all comment files
    Chart(ChartArgs),
    /// Render the chart for a chosen interval and date range of indexed threads
    View(ChartArgs),
    /// Write dataset-metadata.json describing every comment file
    Package(PackageArgs),
}

#[derive(Debug, Args)]
pub struct FetchArgs {
    /// Stop at the first thread that fails instead of moving on
    #[arg(long)]
    pub fail_fast: bool,
}

#[derive(Debug, Args)]
pub struct ChartArgs {
    /// Bucket width: 15m, 30m, 1h, 3h, 6h, 12h or 1d (labels such as "6 hours" work too)
    #[arg(long, default_value = "1h", value_parser = parse_interval)]
    pub interval: Interval,

    /// First day shown (YYYY-MM-DD)
    #[arg(long)]
    pub from: Option<String>,

    /// Last day shown (YYYY-MM-DD)
    #[arg(long)]
    pub to: Option<String>,

    /// Output PNG
    #[arg(long, default_value = "worldnews.png")]
    pub out: PathBuf,

    /// Rayon threads used to read comment files
    #[arg(long)]
    pub threads: Option<usize>,
}

#[derive(Debug, Args)]
pub struct PackageArgs {
    /// Base metadata document whose `resources` get extended
    #[arg(long, default_value = "dataset-metadata.json")]
    pub base: PathBuf,
}

fn parse_interval(s: &str) -> Result<Interval, String> {
    s.parse()
}
