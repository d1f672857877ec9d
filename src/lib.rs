//! Book sales and ratings dashboard: the data pipeline behind the UI.

pub mod config;
pub mod data;
pub mod errors;

pub use data::cache::{CachePolicy, DatasetStore};
pub use data::filter::{filter_table, FilterSelection};
pub use data::model::{SaleRecord, SalesTable};
pub use errors::DataError;
