use super::{category_color, plot_err, y_upper, LABEL_FONT, TITLE_FONT};
use crate::error::{ProcessingError, Result};
use crate::utils::constants::{CHART_HEIGHT, CHART_WIDTH};
use plotters::prelude::*;
use std::path::Path;

/// Axis text for a categorical segment
fn segment_label(labels: &[String], value: &SegmentValue<usize>) -> String {
    match value {
        SegmentValue::CenterOf(i) => labels.get(*i).cloned().unwrap_or_default(),
        _ => String::new(),
    }
}

fn check_shape(labels: &[String], values: usize) -> Result<()> {
    if labels.is_empty() {
        return Err(ProcessingError::Plot("no categories to draw".to_string()));
    }
    if labels.len() != values {
        return Err(ProcessingError::Plot(format!(
            "{} labels but {} values",
            labels.len(),
            values
        )));
    }
    Ok(())
}

/// One bar per label, drawn in the given order
pub fn bar_chart(
    path: &Path,
    title: &str,
    x_desc: &str,
    y_desc: &str,
    labels: &[String],
    values: &[f64],
) -> Result<()> {
    check_shape(labels, values.len())?;

    let root = BitMapBackend::new(path, (CHART_WIDTH, CHART_HEIGHT)).into_drawing_area();
    root.fill(&WHITE).map_err(plot_err)?;

    let y_max = y_upper(values.iter().copied().fold(0.0, f64::max));
    let mut chart = ChartBuilder::on(&root)
        .caption(title, TITLE_FONT)
        .margin(20)
        .x_label_area_size(70)
        .y_label_area_size(90)
        .build_cartesian_2d((0..labels.len()).into_segmented(), 0f64..y_max)
        .map_err(plot_err)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(labels.len())
        .x_label_formatter(&|v| segment_label(labels, v))
        .x_desc(x_desc)
        .y_desc(y_desc)
        .label_style(LABEL_FONT)
        .draw()
        .map_err(plot_err)?;

    chart
        .draw_series(values.iter().enumerate().map(|(i, &v)| {
            let mut bar = Rectangle::new(
                [(SegmentValue::Exact(i), 0.0), (SegmentValue::Exact(i + 1), v)],
                category_color(i).filled(),
            );
            bar.set_margin(0, 0, 12, 12);
            bar
        }))
        .map_err(plot_err)?;

    root.present().map_err(plot_err)?;
    Ok(())
}

/// Side-by-side bars, one group per label and one bar per series
pub fn grouped_bar_chart(
    path: &Path,
    title: &str,
    x_desc: &str,
    y_desc: &str,
    labels: &[String],
    series: &[(&str, &[f64])],
) -> Result<()> {
    for (_, values) in series {
        check_shape(labels, values.len())?;
    }
    if series.is_empty() {
        return Err(ProcessingError::Plot("no series to draw".to_string()));
    }

    let root = BitMapBackend::new(path, (CHART_WIDTH, CHART_HEIGHT)).into_drawing_area();
    root.fill(&WHITE).map_err(plot_err)?;

    let y_max = y_upper(
        series
            .iter()
            .flat_map(|(_, values)| values.iter().copied())
            .fold(0.0, f64::max),
    );
    let mut chart = ChartBuilder::on(&root)
        .caption(title, TITLE_FONT)
        .margin(20)
        .x_label_area_size(70)
        .y_label_area_size(90)
        .build_cartesian_2d((0..labels.len()).into_segmented(), 0f64..y_max)
        .map_err(plot_err)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(labels.len())
        .x_label_formatter(&|v| segment_label(labels, v))
        .x_desc(x_desc)
        .y_desc(y_desc)
        .label_style(LABEL_FONT)
        .draw()
        .map_err(plot_err)?;

    // Bars are positioned inside each segment with pixel margins
    let (plot_width, _) = chart.plotting_area().dim_in_pixel();
    let segment = plot_width / labels.len() as u32;
    let padding = segment / 10;
    let bar_width = segment.saturating_sub(2 * padding) / series.len() as u32;

    for (s, (name, values)) in series.iter().enumerate() {
        let color = category_color(s);
        let left = padding + s as u32 * bar_width;
        let right = segment.saturating_sub(padding + (s as u32 + 1) * bar_width);

        chart
            .draw_series(values.iter().enumerate().map(|(i, &v)| {
                let mut bar = Rectangle::new(
                    [(SegmentValue::Exact(i), 0.0), (SegmentValue::Exact(i + 1), v)],
                    color.filled(),
                );
                bar.set_margin(0, 0, left, right);
                bar
            }))
            .map_err(plot_err)?
            .label(*name)
            .legend(move |(x, y)| Rectangle::new([(x, y - 6), (x + 16, y + 6)], color.filled()));
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperRight)
        .background_style(WHITE.mix(0.85))
        .border_style(BLACK)
        .label_font(LABEL_FONT)
        .draw()
        .map_err(plot_err)?;

    root.present().map_err(plot_err)?;
    Ok(())
}

/// One stacked bar per row of `counts[row][category]`; segments are stacked
/// bottom-up in category order for every bar
pub fn stacked_bar_chart(
    path: &Path,
    title: &str,
    x_desc: &str,
    y_desc: &str,
    labels: &[String],
    categories: &[String],
    counts: &[Vec<usize>],
) -> Result<()> {
    check_shape(labels, counts.len())?;
    if categories.is_empty() {
        return Err(ProcessingError::Plot("no categories to stack".to_string()));
    }

    let root = BitMapBackend::new(path, (CHART_WIDTH, CHART_HEIGHT)).into_drawing_area();
    root.fill(&WHITE).map_err(plot_err)?;

    let totals: Vec<f64> = counts
        .iter()
        .map(|row| row.iter().sum::<usize>() as f64)
        .collect();
    let y_max = y_upper(totals.iter().copied().fold(0.0, f64::max));

    let mut chart = ChartBuilder::on(&root)
        .caption(title, TITLE_FONT)
        .margin(20)
        .x_label_area_size(70)
        .y_label_area_size(90)
        .build_cartesian_2d((0..labels.len()).into_segmented(), 0f64..y_max)
        .map_err(plot_err)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(labels.len())
        .x_label_formatter(&|v| segment_label(labels, v))
        .x_desc(x_desc)
        .y_desc(y_desc)
        .label_style(LABEL_FONT)
        .draw()
        .map_err(plot_err)?;

    let mut base = vec![0.0f64; labels.len()];
    for (c, category) in categories.iter().enumerate() {
        let color = category_color(c);
        let segments: Vec<(usize, f64, f64)> = counts
            .iter()
            .enumerate()
            .map(|(i, row)| {
                let height = row.get(c).copied().unwrap_or(0) as f64;
                let bottom = base[i];
                base[i] += height;
                (i, bottom, bottom + height)
            })
            .collect();

        chart
            .draw_series(segments.into_iter().map(|(i, bottom, top)| {
                let mut bar = Rectangle::new(
                    [(SegmentValue::Exact(i), bottom), (SegmentValue::Exact(i + 1), top)],
                    color.filled(),
                );
                bar.set_margin(0, 0, 15, 15);
                bar
            }))
            .map_err(plot_err)?
            .label(category.as_str())
            .legend(move |(x, y)| Rectangle::new([(x, y - 6), (x + 16, y + 6)], color.filled()));
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperRight)
        .background_style(WHITE.mix(0.85))
        .border_style(BLACK)
        .label_font(LABEL_FONT)
        .draw()
        .map_err(plot_err)?;

    root.present().map_err(plot_err)?;
    Ok(())
}
