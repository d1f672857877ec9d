mod app;
mod color;
mod state;
mod ui;

use app::BookDashboardApp;
use book_dashboard::config::DashboardConfig;
use eframe::egui;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let config = DashboardConfig::discover()?.with_paths(std::env::args().skip(1));
    log::info!(
        "Sales data: {}, ratings data: {}, cache: {:?}",
        config.sales_path.display(),
        config.ratings_path.display(),
        config.cache
    );

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1400.0, 900.0])
            .with_min_inner_size([800.0, 500.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Book Dashboard – Sales & Ratings",
        options,
        Box::new(|_cc| Ok(Box::new(BookDashboardApp::new(config)))),
    )
    .map_err(|e| anyhow::anyhow!("running the dashboard window: {e}"))
}
