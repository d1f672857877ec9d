use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::data::cache::CachePolicy;

/// Environment variable naming a JSON configuration file.
pub const CONFIG_ENV: &str = "BOOK_DASHBOARD_CONFIG";

/// Configuration file picked up from the working directory when
/// [`CONFIG_ENV`] is unset.
pub const DEFAULT_CONFIG_FILE: &str = "dashboard.json";

/// Source column names for each attribute the dashboard interprets.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ColumnNames {
    /// Order identifier used for de-duplication.
    pub order_id: String,
    /// Category label (genre).
    pub genre: String,
    pub price: String,
    pub rating: String,
    /// Discount fraction (0–1).
    pub discount: String,
    pub sale_date: String,
}

impl Default for ColumnNames {
    fn default() -> Self {
        Self {
            order_id: "order_id".into(),
            genre: "genre_desc".into(),
            price: "price".into(),
            rating: "rating".into(),
            discount: "discount".into(),
            sale_date: "sale_date".into(),
        }
    }
}

impl ColumnNames {
    /// Whether `name` is one of the interpreted columns.
    pub fn is_known(&self, name: &str) -> bool {
        [
            &self.order_id,
            &self.genre,
            &self.price,
            &self.rating,
            &self.discount,
            &self.sale_date,
        ]
        .iter()
        .any(|c| c.as_str() == name)
    }
}

/// Top-level dashboard configuration.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Sales dataset shown on the Sales page.
    pub sales_path: PathBuf,
    /// Ratings dataset shown on the Ratings page.
    pub ratings_path: PathBuf,
    pub columns: ColumnNames,
    /// Memoisation policy for loaded tables.
    pub cache: CachePolicy,
    /// Number of bins in price histograms.
    pub histogram_bins: usize,
    /// How many genres the "top N" charts keep.
    pub top_n: usize,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            sales_path: PathBuf::from("df.csv"),
            ratings_path: PathBuf::from("book_rating_price.csv"),
            columns: ColumnNames::default(),
            cache: CachePolicy::default(),
            histogram_bins: 10,
            top_n: 5,
        }
    }
}

impl DashboardConfig {
    /// Read a JSON configuration file. Missing fields take their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        let config: DashboardConfig = serde_json::from_str(&text)
            .with_context(|| format!("parsing config file {}", path.display()))?;
        Ok(config.normalized())
    }

    /// Locate the configuration: `$BOOK_DASHBOARD_CONFIG`, then
    /// `./dashboard.json`, then built-in defaults.
    pub fn discover() -> Result<Self> {
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            return Self::from_json_file(Path::new(&path));
        }
        let local = Path::new(DEFAULT_CONFIG_FILE);
        if local.exists() {
            return Self::from_json_file(local);
        }
        log::warn!("no {DEFAULT_CONFIG_FILE} found, using default configuration");
        Ok(Self::default())
    }

    /// Apply positional overrides: `[SALES_FILE] [RATINGS_FILE]`.
    pub fn with_paths<I>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        let mut args = args.into_iter();
        if let Some(sales) = args.next() {
            self.sales_path = PathBuf::from(sales);
        }
        if let Some(ratings) = args.next() {
            self.ratings_path = PathBuf::from(ratings);
        }
        self
    }

    fn normalized(mut self) -> Self {
        self.histogram_bins = self.histogram_bins.max(1);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn defaults_match_the_bundled_datasets() {
        let config = DashboardConfig::default();
        assert_eq!(config.sales_path, PathBuf::from("df.csv"));
        assert_eq!(config.ratings_path, PathBuf::from("book_rating_price.csv"));
        assert_eq!(config.columns.genre, "genre_desc");
        assert_eq!(config.cache, CachePolicy::Forever);
        assert_eq!(config.histogram_bins, 10);
    }

    #[test]
    fn partial_json_keeps_remaining_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{
                "sales_path": "data/sales.csv",
                "columns": {{ "genre": "category" }},
                "cache": {{ "kind": "ttl", "seconds": 30 }},
                "histogram_bins": 0
            }}"#
        )
        .unwrap();

        let config = DashboardConfig::from_json_file(file.path()).unwrap();
        assert_eq!(config.sales_path, PathBuf::from("data/sales.csv"));
        assert_eq!(config.ratings_path, PathBuf::from("book_rating_price.csv"));
        assert_eq!(config.columns.genre, "category");
        assert_eq!(config.columns.price, "price");
        assert_eq!(config.cache, CachePolicy::Ttl { seconds: 30 });
        assert_eq!(config.histogram_bins, 1);
    }

    #[test]
    fn malformed_json_reports_the_path() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();
        let err = DashboardConfig::from_json_file(file.path()).unwrap_err();
        assert!(format!("{err:#}").contains("parsing config file"));
    }

    #[test]
    fn positional_args_override_paths() {
        let config = DashboardConfig::default()
            .with_paths(vec!["a.csv".to_string(), "b.parquet".to_string()]);
        assert_eq!(config.sales_path, PathBuf::from("a.csv"));
        assert_eq!(config.ratings_path, PathBuf::from("b.parquet"));

        let only_sales = DashboardConfig::default().with_paths(vec!["a.csv".to_string()]);
        assert_eq!(only_sales.ratings_path, PathBuf::from("book_rating_price.csv"));
    }

    #[test]
    fn known_columns() {
        let cols = ColumnNames::default();
        assert!(cols.is_known("discount"));
        assert!(!cols.is_known("title"));
    }
}
