use eframe::egui::Ui;
use egui_plot::{Bar, BarChart, Legend, Line, Plot, PlotPoints, Points};

use crate::color::{series_color, series_palette};
use crate::data::chart::{ChartData, Series};

// ---------------------------------------------------------------------------
// Chart (per-file visualization)
// ---------------------------------------------------------------------------

/// Render prepared chart data. `id` keeps plots of different files apart.
pub fn chart(ui: &mut Ui, id: impl std::hash::Hash, data: &ChartData) {
    let plot = Plot::new(id)
        .legend(Legend::default())
        .height(240.0)
        .allow_drag(true)
        .allow_scroll(false)
        .allow_zoom(true);

    match data {
        ChartData::Bar(series) => {
            let colors = series_palette(series.len());
            // Group bars per row: each series gets a slot inside the row.
            let width = 0.8 / series.len() as f64;
            plot.x_axis_label("row").show(ui, |plot_ui| {
                for (s, (column, color)) in series.iter().zip(colors).enumerate() {
                    let offset = (s as f64 + 0.5) * width - 0.4;
                    let bars: Vec<Bar> = column
                        .values
                        .iter()
                        .enumerate()
                        .filter_map(|(row, v)| {
                            v.map(|v| Bar::new(row as f64 + offset, v).width(width * 0.95))
                        })
                        .collect();
                    plot_ui.bar_chart(BarChart::new(bars).name(&column.name).color(color));
                }
            });
        }
        ChartData::Line(series) => {
            let colors = series_palette(series.len());
            plot.x_axis_label("row").show(ui, |plot_ui| {
                for (column, color) in series.iter().zip(colors) {
                    // A missing value splits the line into separate segments.
                    for segment in segments(column) {
                        let points: PlotPoints = segment.into_iter().collect();
                        plot_ui.line(Line::new(points).name(&column.name).color(color).width(2.0));
                    }
                }
            });
        }
        ChartData::Scatter { x, y, points } => {
            plot.x_axis_label(x.as_str())
                .y_axis_label(y.as_str())
                .show(ui, |plot_ui| {
                    let pts: PlotPoints = points.iter().copied().collect();
                    plot_ui.points(
                        Points::new(pts)
                            .name(format!("{y} vs {x}"))
                            .radius(4.0)
                            .color(series_color(0, 1)),
                    );
                });
        }
    }
}

/// Consecutive runs of present values, as `[row, value]` points.
fn segments(series: &Series) -> Vec<Vec<[f64; 2]>> {
    let mut out = Vec::new();
    let mut current = Vec::new();
    for (row, value) in series.values.iter().enumerate() {
        match value {
            Some(v) => current.push([row as f64, *v]),
            None if !current.is_empty() => out.push(std::mem::take(&mut current)),
            None => {}
        }
    }
    if !current.is_empty() {
        out.push(current);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gaps_split_line_segments() {
        let series = Series {
            name: "v".into(),
            values: vec![Some(1.0), Some(2.0), None, Some(4.0), None],
        };
        assert_eq!(
            segments(&series),
            vec![vec![[0.0, 1.0], [1.0, 2.0]], vec![[3.0, 4.0]]]
        );
    }
}
