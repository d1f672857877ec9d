use book_dashboard::config::ColumnNames;
use book_dashboard::data::aggregate::{self, RatingsSummary, SalesSummary};
use book_dashboard::data::filter::View;
use book_dashboard::data::model::SalesTable;
use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};
use egui_extras::{Column, TableBuilder};

use crate::color::ColorMap;
use crate::state::{AppState, PageState};
use crate::ui::plot;

const ACCENT: Color32 = Color32::from_rgb(0x1A, 0x32, 0x93);
const DISCOUNT_RED: Color32 = Color32::from_rgb(0xC0, 0x39, 0x2B);

// ---------------------------------------------------------------------------
// Central panel
// ---------------------------------------------------------------------------

/// Render the active page: metrics, charts and the filtered rows.
pub fn page(ui: &mut Ui, state: &AppState) {
    let page = state.page();

    if let Some(err) = &page.error {
        ui.centered_and_justified(|ui: &mut Ui| {
            let message = format!(
                "Could not load data.\n\n{err}\n\nUse File → Open… to pick another file."
            );
            ui.label(RichText::new(message).color(Color32::RED));
        });
        return;
    }

    let (Some(dataset), Some(filtered)) = (&page.dataset, &page.filtered) else {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Open a file to view the dashboard  (File → Open…)");
        });
        return;
    };

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            match page.view {
                View::Sales => sales_metrics(ui, dataset),
                View::Ratings => ratings_metrics(ui, dataset),
            }
            ui.separator();

            if filtered.is_empty() {
                ui.label(
                    RichText::new("No data matches the selected filters. Try widening them.")
                        .color(Color32::YELLOW),
                );
                return;
            }

            match page.view {
                View::Sales => sales_charts(ui, page, filtered, state),
                View::Ratings => ratings_charts(ui, page, filtered, state),
            }

            ui.separator();
            egui::CollapsingHeader::new("Filtered rows")
                .id_salt(("rows", page.view.title()))
                .default_open(false)
                .show(ui, |ui: &mut Ui| data_table(ui, filtered, &state.config.columns));
        });
}

// ---------------------------------------------------------------------------
// Metrics
// ---------------------------------------------------------------------------

fn metric(ui: &mut Ui, label: &str, value: String) {
    ui.group(|ui: &mut Ui| {
        ui.vertical(|ui: &mut Ui| {
            ui.label(label);
            ui.heading(value);
        });
    });
}

fn sales_metrics(ui: &mut Ui, table: &SalesTable) {
    let Some(summary) = SalesSummary::compute(table) else {
        return;
    };
    ui.horizontal(|ui: &mut Ui| {
        metric(ui, "Total sales", summary.total_sales.to_string());
        metric(ui, "Revenue", format!("$ {:.2}", summary.revenue));
        metric(ui, "Average price", format!("$ {:.2}", summary.mean_price));
        metric(ui, "Active genres", summary.active_genres.to_string());
    });
}

fn ratings_metrics(ui: &mut Ui, table: &SalesTable) {
    let Some(summary) = RatingsSummary::compute(table) else {
        return;
    };
    let rating = summary
        .mean_rating
        .map_or_else(|| "–".to_string(), |r| format!("{r:.1}/5"));
    ui.horizontal(|ui: &mut Ui| {
        metric(ui, "Average rating", rating);
        metric(ui, "Total reviews", summary.total_reviews.to_string());
        metric(ui, "Average price", format!("$ {:.2}", summary.mean_price));
        metric(ui, "Satisfaction rate", format!("{:.1}%", summary.satisfaction_rate));
    });
}

// ---------------------------------------------------------------------------
// Chart grids
// ---------------------------------------------------------------------------

fn sales_charts(ui: &mut Ui, page: &PageState, table: &SalesTable, state: &AppState) {
    let colors: Option<&ColorMap> = page.colors.as_ref();
    let bins = state.config.histogram_bins;
    let top_n = state.config.top_n;

    ui.heading("By genre");
    ui.columns(2, |cols| {
        plot::horizontal_bars(
            &mut cols[0],
            "mean_price_genre",
            "Average price by genre",
            &aggregate::mean_price_by_genre(table),
            "Average price ($)",
            colors,
        );
        plot::horizontal_bars(
            &mut cols[1],
            "sales_genre",
            "Sales by genre",
            &aggregate::sales_count_by_genre(table),
            "Number of sales",
            colors,
        );
    });
    ui.separator();

    ui.heading("Over time");
    let revenue = aggregate::monthly_revenue(table);
    let extremes = aggregate::extreme_labels(&revenue, 3);
    ui.columns(2, |cols| {
        plot::line_chart(
            &mut cols[0],
            "monthly_revenue",
            "Monthly revenue",
            &revenue,
            "Revenue ($)",
            &extremes,
        );
        plot::vertical_bars(
            &mut cols[1],
            "monthly_discounts",
            "Discount value by month",
            &aggregate::monthly_discount_value(table),
            "Discounts ($)",
            DISCOUNT_RED,
        );
    });
    ui.separator();

    ui.heading("Prices and revenue");
    ui.columns(2, |cols| {
        plot::histogram(
            &mut cols[0],
            "price_hist",
            "Sales by price",
            &aggregate::price_histogram(table, bins),
            "Price ($)",
            ACCENT,
        );
        plot::horizontal_bars(
            &mut cols[1],
            "top_revenue",
            &format!("Top {top_n} genres by revenue"),
            &aggregate::top_revenue_by_genre(table, top_n),
            "Revenue ($)",
            colors,
        );
    });
}

fn ratings_charts(ui: &mut Ui, page: &PageState, table: &SalesTable, state: &AppState) {
    let colors: Option<&ColorMap> = page.colors.as_ref();
    let bins = state.config.histogram_bins;
    let top_n = state.config.top_n;

    ui.heading("Price by rating");
    ui.columns(2, |cols| {
        plot::horizontal_bars(
            &mut cols[0],
            "mean_price_rating",
            "Average price by rating (★)",
            &aggregate::mean_price_by_rating(table),
            "Average price ($)",
            None,
        );
        plot::horizontal_bars(
            &mut cols[1],
            "rating_dist",
            "Rating distribution (★)",
            &aggregate::rating_distribution(table),
            "Number of reviews",
            None,
        );
    });
    ui.separator();

    ui.heading("Satisfaction by genre");
    ui.columns(2, |cols| {
        plot::horizontal_bars(
            &mut cols[0],
            "mean_rating_genre",
            "Average rating by genre",
            &aggregate::mean_rating_by_genre(table),
            "Average rating",
            colors,
        );
        plot::horizontal_bars(
            &mut cols[1],
            "reviews_genre",
            "Reviews by genre",
            &aggregate::reviews_by_genre(table),
            "Number of reviews",
            colors,
        );
    });
    ui.separator();

    ui.heading("Value");
    ui.columns(2, |cols| {
        plot::stacked_histogram(
            &mut cols[0],
            "price_hist_rating",
            "Price distribution by rating",
            &aggregate::price_histogram_by_rating(table, bins),
            "Price ($)",
        );
        plot::horizontal_bars(
            &mut cols[1],
            "value_for_money",
            &format!("Top {top_n} genres by value for money"),
            &aggregate::top_value_for_money(table, top_n),
            "Rating per $ × 10",
            colors,
        );
    });
}

// ---------------------------------------------------------------------------
// Filtered rows
// ---------------------------------------------------------------------------

fn data_table(ui: &mut Ui, table: &SalesTable, names: &ColumnNames) {
    let columns = &table.columns;
    TableBuilder::new(ui)
        .striped(true)
        .max_scroll_height(320.0)
        .columns(Column::auto().at_least(60.0), columns.len())
        .header(20.0, |mut header| {
            for name in columns {
                header.col(|ui| {
                    ui.strong(name.as_str());
                });
            }
        })
        .body(|body| {
            body.rows(18.0, table.len(), |mut row| {
                let record = &table.records[row.index()];
                for name in columns {
                    let text = record.display_cell(name, names);
                    row.col(|ui| {
                        ui.label(text);
                    });
                }
            });
        });
}
