use std::collections::{BTreeMap, BTreeSet};

use book_dashboard::data::aggregate::{HistogramBin, Series};
use eframe::egui::{Color32, Ui};
use egui_plot::{Bar, BarChart, Line, Plot, PlotPoint, PlotPoints, Points, Text};

use crate::color::{star_color, ColorMap};

const CHART_HEIGHT: f32 = 280.0;

/// Label for the category at an integer axis position, blank elsewhere.
fn category_label(labels: &[String], value: f64) -> String {
    let idx = value.round();
    if (value - idx).abs() > 1e-6 || idx < 0.0 {
        return String::new();
    }
    labels.get(idx as usize).cloned().unwrap_or_default()
}

fn base_plot(id: &str) -> Plot {
    Plot::new(id.to_owned())
        .height(CHART_HEIGHT)
        .allow_drag(false)
        .allow_scroll(false)
        .allow_zoom(false)
        .allow_boxed_zoom(false)
        .show_grid([false, true])
}

// ---------------------------------------------------------------------------
// Bar charts
// ---------------------------------------------------------------------------

/// Horizontal bars, one per series point, labelled on the y axis.
/// Genre labels take their colour from `colors`.
pub fn horizontal_bars(
    ui: &mut Ui,
    id: &str,
    title: &str,
    series: &Series,
    value_label: &str,
    colors: Option<&ColorMap>,
) {
    ui.strong(title);
    let labels: Vec<String> = series.iter().map(|(l, _)| l.clone()).collect();
    let bars: Vec<Bar> = series
        .iter()
        .enumerate()
        .map(|(i, (label, value))| {
            let fill = colors.map_or(Color32::LIGHT_BLUE, |cm| cm.color_for(label));
            Bar::new(i as f64, *value)
                .name(label)
                .fill(fill)
                .width(0.7)
        })
        .collect();

    base_plot(id)
        .x_axis_label(value_label.to_owned())
        .y_axis_formatter(move |mark, _range| category_label(&labels, mark.value))
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(BarChart::new(bars).horizontal());
        });
}

/// Vertical bars over categorical x labels with a shared fill colour.
pub fn vertical_bars(
    ui: &mut Ui,
    id: &str,
    title: &str,
    series: &Series,
    value_label: &str,
    fill: Color32,
) {
    ui.strong(title);
    let labels: Vec<String> = series.iter().map(|(l, _)| l.clone()).collect();
    let bars: Vec<Bar> = series
        .iter()
        .enumerate()
        .map(|(i, (label, value))| Bar::new(i as f64, *value).name(label).fill(fill).width(0.7))
        .collect();

    base_plot(id)
        .y_axis_label(value_label.to_owned())
        .x_axis_formatter(move |mark, _range| category_label(&labels, mark.value))
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(BarChart::new(bars));
        });
}

// ---------------------------------------------------------------------------
// Time series
// ---------------------------------------------------------------------------

/// Line with markers; only points whose label is in `annotate` get a value
/// label.
pub fn line_chart(
    ui: &mut Ui,
    id: &str,
    title: &str,
    series: &Series,
    value_label: &str,
    annotate: &BTreeSet<String>,
) {
    ui.strong(title);
    let labels: Vec<String> = series.iter().map(|(l, _)| short_month(l)).collect();
    let coords: Vec<[f64; 2]> = series
        .iter()
        .enumerate()
        .map(|(i, (_, v))| [i as f64, *v])
        .collect();
    let annotations: Vec<(PlotPoint, String)> = series
        .iter()
        .enumerate()
        .filter(|(_, (label, _))| annotate.contains(label))
        .map(|(i, (_, v))| (PlotPoint::new(i as f64, *v), format!("{v:.0}")))
        .collect();

    let line_color = Color32::from_rgb(0x2E, 0x86, 0xAB);
    base_plot(id)
        .y_axis_label(value_label.to_owned())
        .x_axis_formatter(move |mark, _range| category_label(&labels, mark.value))
        .show(ui, |plot_ui| {
            plot_ui.line(
                Line::new(PlotPoints::from(coords.clone()))
                    .color(line_color)
                    .width(3.0),
            );
            plot_ui.points(
                Points::new(PlotPoints::from(coords))
                    .radius(4.0)
                    .color(Color32::from_rgb(0x06, 0x00, 0x79)),
            );
            for (pos, text) in annotations {
                plot_ui.text(Text::new(pos, text));
            }
        });
}

fn short_month(label: &str) -> String {
    label.chars().take(3).collect()
}

// ---------------------------------------------------------------------------
// Histograms
// ---------------------------------------------------------------------------

fn histogram_bars(bins: &[HistogramBin], fill: Color32) -> Vec<Bar> {
    bins.iter()
        .map(|b| {
            Bar::new(b.center(), b.count as f64)
                .width(b.width())
                .name(format!("{:.2} – {:.2}", b.start, b.end))
                .fill(fill)
                .stroke(eframe::egui::Stroke::new(1.0, Color32::WHITE))
        })
        .collect()
}

/// Single-series histogram over a numeric x axis.
pub fn histogram(
    ui: &mut Ui,
    id: &str,
    title: &str,
    bins: &[HistogramBin],
    x_label: &str,
    fill: Color32,
) {
    ui.strong(title);
    let chart = BarChart::new(histogram_bars(bins, fill));
    base_plot(id)
        .x_axis_label(x_label.to_owned())
        .y_axis_label("Count")
        .show(ui, |plot_ui| plot_ui.bar_chart(chart));
}

/// Histogram stacked by star category, highest rating on top.
pub fn stacked_histogram(
    ui: &mut Ui,
    id: &str,
    title: &str,
    groups: &BTreeMap<u8, Vec<HistogramBin>>,
    x_label: &str,
) {
    ui.strong(title);
    let mut charts: Vec<BarChart> = Vec::new();
    for (stars, bins) in groups {
        let chart = BarChart::new(histogram_bars(bins, star_color(*stars)))
            .name(format!("{stars} ★"))
            .color(star_color(*stars));
        let below: Vec<&BarChart> = charts.iter().collect();
        let chart = chart.stack_on(&below);
        charts.push(chart);
    }

    base_plot(id)
        .x_axis_label(x_label.to_owned())
        .y_axis_label("Count")
        .legend(egui_plot::Legend::default())
        .show(ui, |plot_ui| {
            for chart in charts {
                plot_ui.bar_chart(chart);
            }
        });
}
