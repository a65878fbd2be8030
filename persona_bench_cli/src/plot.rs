use std::f64::consts::PI;
use std::iter;
use std::panic;
use std::path::Path;

use anyhow::Result;
use persona_bench::{LineChart, MethodColor, RadarChart};
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};

const LINE_SIZE: (u32, u32) = (1280, 720);
const RADAR_SIZE: (u32, u32) = (900, 900);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChartKind {
    Png,
    Svg,
}

impl ChartKind {
    pub fn extension(self) -> &'static str {
        match self {
            ChartKind::Png => "png",
            ChartKind::Svg => "svg",
        }
    }
}

/// Font lookup inside the plotting backends can panic on hosts without
/// system fonts; turn that into an error the caller can log and skip.
pub fn render_chart_guard<F>(render: F) -> Result<(), String>
where
    F: FnOnce() -> Result<()>,
{
    panic::catch_unwind(panic::AssertUnwindSafe(render))
        .map_err(|_| "plotting backend panicked".to_string())?
        .map_err(|err| format!("plotting error: {err}"))
}

pub fn render_al_curve(chart: &LineChart, y_title: &str, path: &Path, kind: ChartKind) -> Result<()> {
    match kind {
        ChartKind::Png => {
            let root = BitMapBackend::new(path, LINE_SIZE).into_drawing_area();
            draw_line_chart(root, chart, y_title)
        }
        ChartKind::Svg => {
            let root = SVGBackend::new(path, LINE_SIZE).into_drawing_area();
            draw_line_chart(root, chart, y_title)
        }
    }
}

pub fn render_radar(chart: &RadarChart, path: &Path, kind: ChartKind) -> Result<()> {
    match kind {
        ChartKind::Png => {
            let root = BitMapBackend::new(path, RADAR_SIZE).into_drawing_area();
            draw_radar_chart(root, chart)
        }
        ChartKind::Svg => {
            let root = SVGBackend::new(path, RADAR_SIZE).into_drawing_area();
            draw_radar_chart(root, chart)
        }
    }
}

fn rgb(color: MethodColor) -> RGBColor {
    let (r, g, b) = color.rgb;
    RGBColor(r, g, b)
}

fn draw_line_chart<DB>(area: DrawingArea<DB, Shift>, chart: &LineChart, y_title: &str) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    area.fill(&WHITE)?;
    let turns = chart.labels.len().max(1);
    let mut ctx = ChartBuilder::on(&area)
        .margin(25)
        .set_label_area_size(LabelAreaPosition::Left, 60)
        .set_label_area_size(LabelAreaPosition::Bottom, 40)
        .build_cartesian_2d(0.5f64..turns as f64 + 0.5, chart.y_min..chart.y_max)?;

    let labels = &chart.labels;
    let turn_label = |v: &f64| {
        let idx = v.round();
        if (v - idx).abs() > 1e-6 || idx < 1.0 {
            return String::new();
        }
        labels.get(idx as usize - 1).cloned().unwrap_or_default()
    };
    ctx.configure_mesh()
        .light_line_style(&TRANSPARENT)
        .bold_line_style(&BLACK.mix(0.08))
        .x_labels(turns)
        .x_label_formatter(&turn_label)
        .y_label_formatter(&|v| format!("{:.0}", v))
        .y_desc(y_title)
        .label_style(("sans-serif", 18).into_font().color(&BLACK.mix(0.85)))
        .draw()?;

    for ds in &chart.datasets {
        let color = rgb(ds.color);
        let points: Vec<(f64, f64)> = ds
            .data
            .iter()
            .enumerate()
            .map(|(i, v)| ((i + 1) as f64, *v))
            .collect();
        ctx.draw_series(LineSeries::new(points.iter().copied(), color.stroke_width(3)))?
            .label(ds.label.clone())
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 30, y)], color));
        ctx.draw_series(points.iter().map(|p| Circle::new(*p, 4, color.filled())))?;
    }

    ctx.configure_series_labels()
        .background_style(&WHITE.mix(0.7))
        .border_style(&BLACK.mix(0.3))
        .label_font(("sans-serif", 18).into_font().color(&BLACK))
        .position(SeriesLabelPosition::UpperLeft)
        .draw()?;

    area.present()?;
    Ok(())
}

fn draw_radar_chart<DB>(area: DrawingArea<DB, Shift>, chart: &RadarChart) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    area.fill(&WHITE)?;
    let axes = chart.labels.len();
    if axes == 0 {
        area.present()?;
        return Ok(());
    }
    let mut ctx = ChartBuilder::on(&area)
        .margin(40)
        .build_cartesian_2d(-1.35f64..1.35, -1.35f64..1.35)?;

    // First axis points straight up, the rest follow clockwise.
    let point = |axis: usize, r: f64| -> (f64, f64) {
        let angle = PI / 2.0 - 2.0 * PI * axis as f64 / axes as f64;
        (r * angle.cos(), r * angle.sin())
    };
    let span = (chart.r_max - chart.r_min).max(f64::EPSILON);
    let radius = |v: f64| ((v - chart.r_min) / span).clamp(0.0, 1.0);

    for ring in 1..=5 {
        let r = ring as f64 / 5.0;
        let outline: Vec<(f64, f64)> = (0..=axes).map(|i| point(i % axes, r)).collect();
        ctx.draw_series(iter::once(PathElement::new(outline, BLACK.mix(0.15))))?;
    }
    let label_style = ("sans-serif", 18)
        .into_font()
        .color(&BLACK.mix(0.8))
        .pos(Pos::new(HPos::Center, VPos::Center));
    for (i, label) in chart.labels.iter().enumerate() {
        ctx.draw_series(iter::once(PathElement::new(
            vec![(0.0, 0.0), point(i, 1.0)],
            BLACK.mix(0.15),
        )))?;
        ctx.draw_series(iter::once(Text::new(
            label.clone(),
            point(i, 1.18),
            label_style.clone(),
        )))?;
    }

    for ds in &chart.datasets {
        let color = rgb(ds.color);
        // Axes without a value collapse to the centre.
        let vertices: Vec<(f64, f64)> = ds
            .data
            .iter()
            .enumerate()
            .map(|(i, v)| point(i, v.map(radius).unwrap_or(0.0)))
            .collect();
        let Some(first) = vertices.first().copied() else {
            continue;
        };
        ctx.draw_series(iter::once(Polygon::new(vertices.clone(), color.mix(0.2))))?;
        let mut outline = vertices;
        outline.push(first);
        ctx.draw_series(iter::once(PathElement::new(outline, color.stroke_width(2))))?
            .label(ds.label.clone())
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 30, y)], color));
    }

    ctx.configure_series_labels()
        .background_style(&WHITE.mix(0.7))
        .border_style(&BLACK.mix(0.3))
        .label_font(("sans-serif", 18).into_font().color(&BLACK))
        .position(SeriesLabelPosition::UpperRight)
        .draw()?;

    area.present()?;
    Ok(())
}
