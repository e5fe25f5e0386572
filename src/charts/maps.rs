use super::{category_color, heat_color, plot_err, LABEL_FONT, TITLE_FONT};
use crate::analyzers::spatial::DensityGrid;
use crate::error::{ProcessingError, Result};
use crate::utils::constants::{CHART_HEIGHT, CHART_WIDTH};
use crate::utils::GeoBounds;
use plotters::prelude::*;
use std::path::Path;

const COLORBAR_WIDTH: u32 = 170;
const COLORBAR_STEPS: usize = 100;

/// Longitude/latitude scatter, one colour per group
pub fn scatter_map(
    path: &Path,
    title: &str,
    groups: &[(String, Vec<(f64, f64)>)],
    bounds: GeoBounds,
) -> Result<()> {
    if groups.iter().all(|(_, points)| points.is_empty()) {
        return Err(ProcessingError::Plot("no points to draw".to_string()));
    }

    let root = BitMapBackend::new(path, (CHART_WIDTH, CHART_HEIGHT)).into_drawing_area();
    root.fill(&WHITE).map_err(plot_err)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(title, TITLE_FONT)
        .margin(20)
        .x_label_area_size(60)
        .y_label_area_size(90)
        .build_cartesian_2d(
            bounds.min_lon..bounds.max_lon,
            bounds.min_lat..bounds.max_lat,
        )
        .map_err(plot_err)?;

    chart
        .configure_mesh()
        .x_desc("Longitude")
        .y_desc("Latitude")
        .x_label_formatter(&|v| format!("{:.2}", v))
        .y_label_formatter(&|v| format!("{:.2}", v))
        .label_style(LABEL_FONT)
        .light_line_style(WHITE.mix(0.0))
        .draw()
        .map_err(plot_err)?;

    for (i, (name, points)) in groups.iter().enumerate() {
        let color = category_color(i);
        chart
            .draw_series(
                points
                    .iter()
                    .map(|&(lon, lat)| Circle::new((lon, lat), 1, color.mix(0.18).filled())),
            )
            .map_err(plot_err)?
            .label(name.as_str())
            .legend(move |(x, y)| Circle::new((x + 8, y), 5, color.filled()));
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperLeft)
        .background_style(WHITE.mix(0.85))
        .border_style(BLACK)
        .label_font(LABEL_FONT)
        .draw()
        .map_err(plot_err)?;

    root.present().map_err(plot_err)?;
    Ok(())
}

/// Binned point density on a log colour scale. Empty bins are left blank.
pub fn density_heatmap(path: &Path, title: &str, grid: &DensityGrid) -> Result<()> {
    let (Some(min), max) = (grid.min_positive(), grid.max_count()) else {
        return Err(ProcessingError::Plot("density grid is empty".to_string()));
    };

    let root = BitMapBackend::new(path, (CHART_WIDTH, CHART_HEIGHT)).into_drawing_area();
    root.fill(&WHITE).map_err(plot_err)?;
    let root = root
        .titled(title, TITLE_FONT)
        .map_err(plot_err)?;
    let (map_area, bar_area) = root.split_horizontally(CHART_WIDTH - COLORBAR_WIDTH);

    let bounds = grid.bounds;
    let mut chart = ChartBuilder::on(&map_area)
        .margin(20)
        .x_label_area_size(60)
        .y_label_area_size(90)
        .build_cartesian_2d(
            bounds.min_lon..bounds.max_lon,
            bounds.min_lat..bounds.max_lat,
        )
        .map_err(plot_err)?;

    chart
        .configure_mesh()
        .disable_mesh()
        .x_desc("Longitude")
        .y_desc("Latitude")
        .x_label_formatter(&|v| format!("{:.2}", v))
        .y_label_formatter(&|v| format!("{:.2}", v))
        .label_style(LABEL_FONT)
        .draw()
        .map_err(plot_err)?;

    let cells = (0..grid.bins).flat_map(|x| (0..grid.bins).map(move |y| (x, y)));
    chart
        .draw_series(cells.filter_map(|(x, y)| {
            let t = grid.log_intensity(grid.counts[x][y])?;
            let (lower, upper) = grid.cell(x, y);
            Some(Rectangle::new([lower, upper], heat_color(t).filled()))
        }))
        .map_err(plot_err)?;

    // Colour bar on a log axis from the smallest to the largest bin count
    let lo = min as f64;
    let hi = if max > min { max as f64 } else { lo * 10.0 };
    let mut bar = ChartBuilder::on(&bar_area)
        .margin_top(20)
        .margin_bottom(80)
        .margin_right(20)
        .y_label_area_size(80)
        .build_cartesian_2d(0f64..1f64, (lo..hi).log_scale())
        .map_err(plot_err)?;

    bar.configure_mesh()
        .disable_mesh()
        .disable_x_axis()
        .y_desc("Complaints per bin")
        .y_label_formatter(&|v| format!("{:.0}", v))
        .label_style(LABEL_FONT)
        .draw()
        .map_err(plot_err)?;

    let ratio = hi / lo;
    bar.draw_series((0..COLORBAR_STEPS).map(|i| {
        let t0 = i as f64 / COLORBAR_STEPS as f64;
        let t1 = (i + 1) as f64 / COLORBAR_STEPS as f64;
        Rectangle::new(
            [(0.0, lo * ratio.powf(t0)), (1.0, lo * ratio.powf(t1))],
            heat_color(t0).filled(),
        )
    }))
    .map_err(plot_err)?;

    root.present().map_err(plot_err)?;
    Ok(())
}
