use super::{plot_err, y_upper, LABEL_FONT, PURPLE, TEAL, TITLE_FONT};
use crate::analyzers::spatial::Histogram;
use crate::error::{ProcessingError, Result};
use crate::utils::constants::{CHART_HEIGHT, CHART_WIDTH};
use plotters::prelude::*;
use std::path::Path;

/// Histogram bars with a density curve scaled to the count axis
pub fn histogram_with_density(
    path: &Path,
    title: &str,
    x_desc: &str,
    histogram: &Histogram,
    density: &[(f64, f64)],
) -> Result<()> {
    let (Some(&x_min), Some(&x_max)) = (histogram.edges.first(), histogram.edges.last()) else {
        return Err(ProcessingError::Plot("histogram has no bins".to_string()));
    };

    let total: usize = histogram.counts.iter().sum();
    let scale = total as f64 * histogram.bin_width();
    let curve: Vec<(f64, f64)> = density.iter().map(|&(x, d)| (x, d * scale)).collect();

    let tallest_bar = histogram.counts.iter().copied().max().unwrap_or(0) as f64;
    let peak = curve.iter().map(|&(_, y)| y).fold(tallest_bar, f64::max);

    let root = BitMapBackend::new(path, (CHART_WIDTH, CHART_HEIGHT)).into_drawing_area();
    root.fill(&WHITE).map_err(plot_err)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(title, TITLE_FONT)
        .margin(20)
        .x_label_area_size(60)
        .y_label_area_size(90)
        .build_cartesian_2d(x_min..x_max, 0f64..y_upper(peak))
        .map_err(plot_err)?;

    chart
        .configure_mesh()
        .x_desc(x_desc)
        .y_desc("Sampled points")
        .x_label_formatter(&|v| format!("{:.4}", v))
        .label_style(LABEL_FONT)
        .draw()
        .map_err(plot_err)?;

    chart
        .draw_series(histogram.counts.iter().enumerate().map(|(i, &count)| {
            Rectangle::new(
                [
                    (histogram.edges[i], 0.0),
                    (histogram.edges[i + 1], count as f64),
                ],
                PURPLE.mix(0.6).filled(),
            )
        }))
        .map_err(plot_err)?;

    if !curve.is_empty() {
        chart
            .draw_series(LineSeries::new(curve, PURPLE.stroke_width(3)))
            .map_err(plot_err)?;
    }

    root.present().map_err(plot_err)?;
    Ok(())
}

/// Line with point markers over consecutive integer positions `0..values.len()`
pub fn line_chart(
    path: &Path,
    title: &str,
    x_desc: &str,
    y_desc: &str,
    values: &[f64],
) -> Result<()> {
    if values.is_empty() {
        return Err(ProcessingError::Plot("no values to draw".to_string()));
    }

    let root = BitMapBackend::new(path, (CHART_WIDTH, CHART_HEIGHT)).into_drawing_area();
    root.fill(&WHITE).map_err(plot_err)?;

    let last = (values.len() - 1).max(1) as u32;
    let y_max = y_upper(values.iter().copied().fold(0.0, f64::max));
    let mut chart = ChartBuilder::on(&root)
        .caption(title, TITLE_FONT)
        .margin(20)
        .x_label_area_size(60)
        .y_label_area_size(90)
        .build_cartesian_2d(0u32..last, 0f64..y_max)
        .map_err(plot_err)?;

    chart
        .configure_mesh()
        .x_labels(values.len().min(24))
        .x_desc(x_desc)
        .y_desc(y_desc)
        .label_style(LABEL_FONT)
        .draw()
        .map_err(plot_err)?;

    let points: Vec<(u32, f64)> = values
        .iter()
        .enumerate()
        .map(|(i, &v)| (i as u32, v))
        .collect();

    chart
        .draw_series(LineSeries::new(points.iter().copied(), TEAL.stroke_width(3)))
        .map_err(plot_err)?;
    chart
        .draw_series(
            points
                .iter()
                .map(|&point| Circle::new(point, 5, TEAL.filled())),
        )
        .map_err(plot_err)?;

    root.present().map_err(plot_err)?;
    Ok(())
}
