//! Line chart of comment volume with annotated events.
//!
//! [`layout_chart`] decides what goes where in data coordinates; [`render_png`]
//! draws that layout with plotters.

use anyhow::{anyhow, Context, Result};
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use std::path::Path;
use time::macros::format_description;
use time::OffsetDateTime;

use crate::bucketing::Series;
use crate::config::ChartConfig;
use crate::date::datetime_from_epoch;
use crate::events::{locate_events, Note};

/// An arrow from a label to a point on the line.
#[derive(Clone, Debug, PartialEq)]
pub struct PlacedAnnotation {
    pub label: String,
    pub tip: (i64, f64),
    pub text_at: (i64, f64),
}

#[derive(Clone, Debug, PartialEq)]
pub struct PlacedNote {
    pub label: String,
    pub tip: (i64, f64),
    pub text_at: (i64, f64),
}

#[derive(Clone, Debug, PartialEq)]
pub struct ChartLayout {
    pub points: Vec<(i64, f64)>,
    /// Visible x range in epoch seconds.
    pub x_range: (i64, i64),
    pub y_top: f64,
    pub annotations: Vec<PlacedAnnotation>,
    pub notes: Vec<PlacedNote>,
}

/// Lays out `series` (already windowed) over `[begin, end]`.
///
/// Event labels sit `label_offset_secs` left of their bucket and a tenth of the
/// y range above it. Events outside the series are omitted; notes outside the
/// x range likewise.
pub fn layout_chart(series: &Series, cfg: &ChartConfig, begin: OffsetDateTime, end: OffsetDateTime) -> ChartLayout {
    let x_range = (begin.unix_timestamp(), end.unix_timestamp().max(begin.unix_timestamp() + 1));
    let peak = series.max_count() as f64;
    let lift = (peak / 10.0).max(1.0);
    let y_top = (peak + 2.0 * lift).max(10.0);

    let annotations = locate_events(series, &cfg.events)
        .into_iter()
        .map(|a| {
            let tip = (a.bucket_start, a.count as f64);
            PlacedAnnotation { text_at: (tip.0 - cfg.label_offset_secs, tip.1 + lift), tip, label: a.label }
        })
        .collect();

    let notes = cfg
        .notes
        .iter()
        .filter(|n| in_range(n, x_range))
        .map(|n| {
            let x = n.at.unix_timestamp();
            PlacedNote { label: n.label.clone(), tip: (x, 0.0), text_at: (x + 86_400, 0.0) }
        })
        .collect();

    ChartLayout {
        points: series.points.iter().map(|b| (b.start, b.count as f64)).collect(),
        x_range,
        y_top,
        annotations,
        notes,
    }
}

fn in_range(note: &Note, (lo, hi): (i64, i64)) -> bool {
    let x = note.at.unix_timestamp();
    lo <= x && x <= hi
}

fn rgb((r, g, b): (u8, u8, u8)) -> RGBColor {
    RGBColor(r, g, b)
}

/// `Feb 24` style tick label.
fn day_label(ts: i64) -> String {
    datetime_from_epoch(ts)
        .ok()
        .and_then(|dt| dt.format(format_description!("[month repr:short] [day]")).ok())
        .unwrap_or_default()
}

/// `12K` for thousands, plain below that.
fn thousands_label(v: f64) -> String {
    if v >= 1000.0 { format!("{}K", (v / 1000.0).round() as i64) } else { format!("{}", v.round() as i64) }
}

fn draw_err<E: std::fmt::Display>(e: E) -> anyhow::Error {
    anyhow!("draw chart: {e}")
}

/// Renders `layout` to a PNG at `out`.
pub fn render_png(layout: &ChartLayout, cfg: &ChartConfig, y_label: &str, out: &Path) -> Result<()> {
    if let Some(parent) = out.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
    }
    let root = BitMapBackend::new(out, cfg.size).into_drawing_area();
    root.fill(&WHITE).map_err(draw_err)?;

    let (x0, x1) = layout.x_range;
    let mut chart = ChartBuilder::on(&root)
        .caption(&cfg.title, ("sans-serif", 40))
        .margin(30)
        .x_label_area_size(60)
        .y_label_area_size(90)
        .build_cartesian_2d(x0..x1, 0f64..layout.y_top)
        .map_err(draw_err)?;

    chart.plotting_area().fill(&rgb(cfg.face_color)).map_err(draw_err)?;
    let days = ((x1 - x0) / 86_400).clamp(2, 60) as usize;
    chart
        .configure_mesh()
        .x_labels(days)
        .y_labels(8)
        .x_label_formatter(&|x| day_label(*x))
        .y_label_formatter(&|y| thousands_label(*y))
        .x_desc(cfg.x_label.as_str())
        .y_desc(y_label)
        .bold_line_style(rgb(cfg.grid_color))
        .light_line_style(rgb(cfg.grid_color).mix(0.5))
        .label_style(("sans-serif", 18))
        .axis_desc_style(("sans-serif", 24))
        .draw()
        .map_err(draw_err)?;

    chart
        .draw_series(LineSeries::new(layout.points.iter().copied(), rgb(cfg.line_color).stroke_width(2)))
        .map_err(draw_err)?;

    let label_style = TextStyle::from(("sans-serif", 18).into_font()).pos(Pos::new(HPos::Right, VPos::Bottom));
    for a in &layout.annotations {
        chart
            .draw_series(std::iter::once(PathElement::new(vec![a.text_at, a.tip], BLACK.stroke_width(1))))
            .map_err(draw_err)?;
        chart.draw_series(std::iter::once(Circle::new(a.tip, 4, BLACK.filled()))).map_err(draw_err)?;
        let lines: Vec<&str> = a.label.lines().collect();
        let n = lines.len() as i32;
        for (i, line) in lines.iter().enumerate() {
            let dy = (i as i32 - n + 1) * 20;
            chart
                .draw_series(std::iter::once(
                    EmptyElement::at(a.text_at) + Text::new(line.trim().to_string(), (0, dy), label_style.clone()),
                ))
                .map_err(draw_err)?;
        }
    }

    let faint = BLACK.mix(0.5);
    let note_style = TextStyle::from(("sans-serif", 18).into_font())
        .color(&faint)
        .pos(Pos::new(HPos::Left, VPos::Center));
    for n in &layout.notes {
        chart
            .draw_series(std::iter::once(PathElement::new(vec![n.text_at, n.tip], faint.stroke_width(1))))
            .map_err(draw_err)?;
        chart
            .draw_series(std::iter::once(
                EmptyElement::at(n.text_at) + Text::new(n.label.clone(), (4, -10), note_style.clone()),
            ))
            .map_err(draw_err)?;
    }

    let (w, _) = cfg.size;
    let tag_style = TextStyle::from(("sans-serif", 18).into_font()).pos(Pos::new(HPos::Right, VPos::Top));
    root.draw(&Text::new(cfg.tag.clone(), (w as i32 - 40, 90), tag_style)).map_err(draw_err)?;

    root.present().map_err(draw_err)?;
    Ok(())
}
