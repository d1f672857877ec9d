use std::path::PathBuf;

use book_dashboard::data::filter::{DiscountFilter, View};
use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};

use crate::state::AppState;

// ---------------------------------------------------------------------------
// Left side panel – filter widgets
// ---------------------------------------------------------------------------

/// Render the left filter panel for the active page.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Filters");
    ui.separator();

    let view = state.active;
    let page = state.page_mut();

    let (genres, bounds) = match &page.dataset {
        Some(ds) => (ds.genres.clone(), ds.price_bounds()),
        None => {
            ui.label("No dataset loaded.");
            return;
        }
    };
    let colors = page.colors.clone();

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            let Some(selected) = page.controls.as_ref().map(|c| c.genres.clone()) else {
                return;
            };

            // ---- Genre multi-select ----
            let header_text = format!("Genres  ({}/{})", selected.len(), genres.len());
            egui::CollapsingHeader::new(RichText::new(header_text).strong())
                .id_salt("genres")
                .default_open(true)
                .show(ui, |ui: &mut Ui| {
                    ui.horizontal(|ui: &mut Ui| {
                        if ui.small_button("All").clicked() {
                            page.select_all_genres();
                        }
                        if ui
                            .small_button("Clear")
                            .on_hover_text("No genre ticked shows every genre")
                            .clicked()
                        {
                            page.clear_genres();
                        }
                    });

                    for genre in &genres {
                        let mut text = RichText::new(genre);
                        if let Some(cm) = &colors {
                            text = text.color(cm.color_for(genre));
                        }
                        let mut checked = selected.contains(genre);
                        if ui.checkbox(&mut checked, text).changed() {
                            page.toggle_genre(genre);
                        }
                    }
                });
            ui.separator();

            let Some(mut controls) = page.controls.clone() else {
                return;
            };

            // ---- Price range ----
            if let Some((lo, hi)) = bounds {
                ui.strong("Price range");
                ui.add(
                    egui::Slider::new(&mut controls.price_min, lo..=hi)
                        .text("min")
                        .fixed_decimals(2),
                );
                ui.add(
                    egui::Slider::new(&mut controls.price_max, lo..=hi)
                        .text("max")
                        .fixed_decimals(2),
                );
                ui.separator();
            }

            // ---- Discount (Sales page only) ----
            if view == View::Sales {
                ui.strong("Discount");
                for option in [DiscountFilter::AllProducts, DiscountFilter::DiscountedOnly] {
                    ui.radio_value(&mut controls.discount, option, option.label());
                }
            }

            // Refilter only when a widget actually moved.
            if page.controls.as_ref() != Some(&controls) {
                page.controls = Some(controls);
                page.refilter();
            }
        });
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu, page tabs and status line.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open sales data…").clicked() {
                if let Some(path) = pick_file("Open sales data") {
                    state.open_file(View::Sales, path);
                }
                ui.close_menu();
            }
            if ui.button("Open ratings data…").clicked() {
                if let Some(path) = pick_file("Open ratings data") {
                    state.open_file(View::Ratings, path);
                }
                ui.close_menu();
            }
        });

        ui.separator();

        for view in [View::Sales, View::Ratings] {
            if ui
                .selectable_label(state.active == view, view.title())
                .clicked()
            {
                state.set_active(view);
            }
        }

        ui.separator();

        let page = state.page();
        match (&page.dataset, &page.error) {
            (Some(ds), _) => {
                ui.label(format!(
                    "{}: {} rows loaded, {} visible",
                    page.source.display(),
                    ds.len(),
                    page.visible_len()
                ));
            }
            (None, Some(_)) => {
                ui.label(RichText::new("Data unavailable").color(Color32::RED));
            }
            (None, None) => {}
        }
    });
}

// ---------------------------------------------------------------------------
// File dialog
// ---------------------------------------------------------------------------

fn pick_file(title: &str) -> Option<PathBuf> {
    rfd::FileDialog::new()
        .set_title(title)
        .add_filter("Supported files", &["csv", "json", "parquet", "pq"])
        .add_filter("CSV", &["csv"])
        .add_filter("JSON", &["json"])
        .add_filter("Parquet", &["parquet", "pq"])
        .pick_file()
}
