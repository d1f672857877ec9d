use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;

use book_dashboard::config::DashboardConfig;
use book_dashboard::data::cache::DatasetStore;
use book_dashboard::data::filter::{
    filter_table, DiscountFilter, FilterSelection, GenreSelection, PriceRange, View,
};
use book_dashboard::data::model::SalesTable;

use crate::color::ColorMap;

// ---------------------------------------------------------------------------
// Sidebar widget values
// ---------------------------------------------------------------------------

/// Current values of the filter widgets for one page.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterControls {
    /// Genres ticked in the side panel. Empty shows every genre.
    pub genres: BTreeSet<String>,
    pub price_min: f64,
    pub price_max: f64,
    /// Only consulted on the Sales page.
    pub discount: DiscountFilter,
}

impl FilterControls {
    /// Everything selected: all genres ticked, full price range.
    pub fn for_table(table: &SalesTable) -> Self {
        let range = PriceRange::covering(table);
        Self {
            genres: table.genres.clone(),
            price_min: range.min,
            price_max: range.max,
            discount: DiscountFilter::AllProducts,
        }
    }

    /// Build a fresh, immutable selection from the widget values.
    pub fn selection(&self, view: View) -> FilterSelection {
        let genres = GenreSelection::from_selected(self.genres.clone());
        let price = PriceRange::new(self.price_min, self.price_max);
        match view {
            View::Sales => FilterSelection::WithDiscount {
                genres,
                price,
                discount: self.discount,
            },
            View::Ratings => FilterSelection::GenreAndPrice { genres, price },
        }
    }
}

// ---------------------------------------------------------------------------
// Per-page state
// ---------------------------------------------------------------------------

pub struct PageState {
    pub view: View,
    pub source: PathBuf,
    /// Full table shared with the store's cache.
    pub dataset: Option<Arc<SalesTable>>,
    pub controls: Option<FilterControls>,
    /// Result of the latest filter pass.
    pub filtered: Option<SalesTable>,
    pub colors: Option<ColorMap>,
    /// Load failure shown instead of the page body.
    pub error: Option<String>,
}

impl PageState {
    fn new(view: View, source: PathBuf) -> Self {
        Self {
            view,
            source,
            dataset: None,
            controls: None,
            filtered: None,
            colors: None,
            error: None,
        }
    }

    /// Load (or fetch from the cache) this page's dataset.
    pub fn load(&mut self, store: &DatasetStore) {
        match store.load(&self.source) {
            Ok(table) => {
                log::info!("{} page: {} rows", self.view.title(), table.len());
                let keep_controls = self
                    .dataset
                    .as_ref()
                    .is_some_and(|current| Arc::ptr_eq(current, &table));
                if !keep_controls || self.controls.is_none() {
                    self.controls = Some(FilterControls::for_table(&table));
                }
                self.colors = Some(ColorMap::new(&table.genres));
                self.dataset = Some(table);
                self.error = None;
                self.refilter();
            }
            Err(e) => {
                log::error!("Failed to load {}: {e}", self.source.display());
                self.dataset = None;
                self.controls = None;
                self.filtered = None;
                self.error = Some(e.to_string());
            }
        }
    }

    /// Recompute `filtered` after a widget change.
    pub fn refilter(&mut self) {
        if let (Some(ds), Some(controls)) = (&self.dataset, &self.controls) {
            self.filtered = Some(filter_table(ds, &controls.selection(self.view)));
        }
    }

    pub fn visible_len(&self) -> usize {
        self.filtered.as_ref().map_or(0, SalesTable::len)
    }

    /// Toggle a single genre in the side panel.
    pub fn toggle_genre(&mut self, genre: &str) {
        if let Some(controls) = &mut self.controls {
            if !controls.genres.remove(genre) {
                controls.genres.insert(genre.to_string());
            }
            self.refilter();
        }
    }

    /// Tick every genre.
    pub fn select_all_genres(&mut self) {
        if let (Some(ds), Some(controls)) = (&self.dataset, &mut self.controls) {
            controls.genres = ds.genres.clone();
            self.refilter();
        }
    }

    /// Untick every genre, which shows all of them.
    pub fn clear_genres(&mut self) {
        if let Some(controls) = &mut self.controls {
            controls.genres.clear();
            self.refilter();
        }
    }
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    pub config: DashboardConfig,
    pub store: DatasetStore,
    pub active: View,
    pub sales: PageState,
    pub ratings: PageState,
}

impl AppState {
    pub fn new(config: DashboardConfig) -> Self {
        let store = DatasetStore::new(config.columns.clone(), config.cache);
        let mut state = Self {
            sales: PageState::new(View::Sales, config.sales_path.clone()),
            ratings: PageState::new(View::Ratings, config.ratings_path.clone()),
            active: View::Sales,
            store,
            config,
        };
        state.sales.load(&state.store);
        state.ratings.load(&state.store);
        state
    }

    pub fn page(&self) -> &PageState {
        match self.active {
            View::Sales => &self.sales,
            View::Ratings => &self.ratings,
        }
    }

    pub fn page_mut(&mut self) -> &mut PageState {
        match self.active {
            View::Sales => &mut self.sales,
            View::Ratings => &mut self.ratings,
        }
    }

    /// Switch pages, re-fetching the page's table through the store.
    pub fn set_active(&mut self, view: View) {
        if self.active == view {
            return;
        }
        self.active = view;
        let store = &self.store;
        match view {
            View::Sales => self.sales.load(store),
            View::Ratings => self.ratings.load(store),
        }
    }

    /// Point a page at a different file and load it.
    pub fn open_file(&mut self, view: View, path: PathBuf) {
        let store = &self.store;
        let page = match view {
            View::Sales => &mut self.sales,
            View::Ratings => &mut self.ratings,
        };
        page.source = path;
        page.load(store);
        self.active = view;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use book_dashboard::data::cache::CachePolicy;
    use tempfile::tempdir;

    fn config_with(dir: &std::path::Path) -> DashboardConfig {
        let sales = dir.join("df.csv");
        let ratings = dir.join("ratings.csv");
        std::fs::write(
            &sales,
            "order_id,genre_desc,price,discount,sale_date\n\
             1,Romance,10,0.1,2023-01-05\n\
             2,Romance,25,0,2023-02-11\n\
             3,Mystery,10,0,2023-03-02\n",
        )
        .unwrap();
        std::fs::write(&ratings, "genre_desc,price,rating\nRomance,10,5\nMystery,30,2\n").unwrap();
        DashboardConfig {
            sales_path: sales,
            ratings_path: ratings,
            cache: CachePolicy::Forever,
            ..DashboardConfig::default()
        }
    }

    #[test]
    fn both_pages_load_with_everything_selected() {
        let dir = tempdir().unwrap();
        let state = AppState::new(config_with(dir.path()));
        assert_eq!(state.sales.visible_len(), 3);
        assert_eq!(state.ratings.visible_len(), 2);
        assert!(state.sales.error.is_none());
    }

    #[test]
    fn widget_changes_refilter() {
        let dir = tempdir().unwrap();
        let mut state = AppState::new(config_with(dir.path()));

        state.sales.toggle_genre("Mystery");
        assert_eq!(state.sales.visible_len(), 2);

        state.sales.clear_genres();
        assert_eq!(state.sales.visible_len(), 3);

        if let Some(controls) = &mut state.sales.controls {
            controls.discount = DiscountFilter::DiscountedOnly;
            controls.price_max = 20.0;
        }
        state.sales.refilter();
        assert_eq!(state.sales.visible_len(), 1);

        state.sales.select_all_genres();
        assert_eq!(state.sales.visible_len(), 1);
    }

    #[test]
    fn ratings_selection_has_no_discount_predicate() {
        let dir = tempdir().unwrap();
        let state = AppState::new(config_with(dir.path()));
        let controls = state.ratings.controls.clone().unwrap();
        assert!(matches!(
            controls.selection(View::Ratings),
            FilterSelection::GenreAndPrice { .. }
        ));
    }

    #[test]
    fn missing_file_shows_an_error_instead_of_a_page() {
        let dir = tempdir().unwrap();
        let mut state = AppState::new(config_with(dir.path()));
        state.open_file(View::Ratings, dir.path().join("missing.csv"));
        assert_eq!(state.active, View::Ratings);
        assert!(state.page().error.as_deref().unwrap().contains("missing.csv"));
        assert!(state.page().filtered.is_none());
    }
}
