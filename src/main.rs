use anyhow::Result;
use clap::Parser;
use dotenv::dotenv;
use livethreads::api::RedditClient;
use livethreads::{
    build_view, init_tracing_once, parse_date, prepare_metadata, render_png, version_note, ChartConfig, Credentials,
    EtlOptions, FileConfig, LiveThreadETL, ViewRequest,
};
use time::OffsetDateTime;
use tracing::{info, warn};

mod cli;

use cli::{ChartArgs, Cli, Command};

fn main() -> Result<()> {
    dotenv().ok();
    init_tracing_once();
    let cli = Cli::parse();

    let mut chart_cfg = ChartConfig::default();
    let mut opts = EtlOptions::default().with_data_dir(&cli.data_dir).with_progress(!cli.no_progress);
    if let Some(path) = &cli.config {
        opts = FileConfig::load(path)?.apply(opts, &mut chart_cfg)?;
    }

    match cli.command {
        Command::Index => {
            let etl = LiveThreadETL::from_options(opts);
            let client = RedditClient::login(&Credentials::from_env()?)?;
            let update = etl.update_index(&client)?;
            info!("{} threads indexed", update.rows.len());
        }
        Command::Fetch(args) => {
            let etl = LiveThreadETL::from_options(opts.with_fail_fast(args.fail_fast));
            let client = RedditClient::login(&Credentials::from_env()?)?;
            report_fetch(&etl.fetch_comments(&client)?);
        }
        Command::Crawl(args) => {
            let etl = LiveThreadETL::from_options(opts.with_fail_fast(args.fail_fast));
            let client = RedditClient::login(&Credentials::from_env()?)?;
            let summary = etl.crawl(&client)?;
            info!("{} threads indexed", summary.index.rows.len());
            report_fetch(&summary.fetch);
        }
        Command::Chart(args) => chart(opts, &chart_cfg, &args, false)?,
        Command::View(args) => chart(opts, &chart_cfg, &args, true)?,
        Command::Package(args) => {
            let etl = LiveThreadETL::from_options(opts);
            let written = prepare_metadata(&args.base, &etl.layout())?;
            info!("Wrote {}", written.display());
            info!("{}", version_note(OffsetDateTime::now_utc())?);
        }
    }
    Ok(())
}

fn report_fetch(report: &livethreads::FetchReport) {
    for (id, err) in &report.failed {
        warn!("not fetched: {id}: {err}");
    }
    info!(
        "{} threads fetched, {} already present, {} failed",
        report.fetched.len(),
        report.skipped,
        report.failed.len()
    );
}

/// `indexed_only` restricts loading to threads listed in threads.csv (the viewer);
/// otherwise every comment file on disk is used.
fn chart(opts: EtlOptions, chart_cfg: &ChartConfig, args: &ChartArgs, indexed_only: bool) -> Result<()> {
    let opts = match args.threads {
        Some(n) => opts.with_parallelism(n),
        None => opts,
    };
    let etl = LiveThreadETL::from_options(opts);
    let load = if indexed_only { etl.load_indexed_timings()? } else { etl.load_timings()? };
    for (path, err) in &load.rejected {
        warn!("excluded {}: {err}", path.display());
    }

    let req = ViewRequest {
        interval: args.interval,
        from: args.from.as_deref().map(parse_date).transpose()?,
        to: args.to.as_deref().map(parse_date).transpose()?,
    };
    let view = build_view(&load.timestamps, &req, chart_cfg)?;
    info!(
        "{} buckets of {} between {} and {} (data covers {} to {}), {} events annotated",
        view.series.len(),
        view.interval,
        view.from,
        view.to,
        view.min_date,
        view.max_date,
        view.layout.annotations.len()
    );
    render_png(&view.layout, chart_cfg, &view.interval.axis_label(), &args.out)?;
    info!("Wrote {}", args.out.display());
    Ok(())
}
