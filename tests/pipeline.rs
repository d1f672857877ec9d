use std::collections::BTreeSet;
use std::sync::Arc;

use book_dashboard::config::{ColumnNames, DashboardConfig};
use book_dashboard::data::aggregate::{self, SalesSummary};
use book_dashboard::data::filter::{
    filter_table, DiscountFilter, FilterSelection, GenreSelection, PriceRange, View,
};
use book_dashboard::{CachePolicy, DataError, DatasetStore};
use tempfile::tempdir;

const SALES_CSV: &str = "\
order_id,genre_desc,price,discount,sale_date,store
1,Romance,10,0.1,2023-07-03,north
2,Romance,25,0,2023-07-15,south
3,Mystery,10,0,2023-08-01,north
2,Romance,25,0,2023-07-15,south
4,SciFi/Fantasy,14.5,0.2,2023-12-20,north
5,SciFi/Fantasy,8,0,2023-12-21,
";

fn store() -> DatasetStore {
    DatasetStore::new(ColumnNames::default(), CachePolicy::Forever)
}

fn genres(names: &[&str]) -> GenreSelection {
    GenreSelection::from_selected(names.iter().map(|s| s.to_string()).collect::<BTreeSet<_>>())
}

#[test]
fn load_filter_aggregate_round() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("df.csv");
    std::fs::write(&path, SALES_CSV).unwrap();

    let store = store();
    let table = store.load(&path).unwrap();

    // Repeated order 2 is dropped.
    assert_eq!(table.len(), 5);
    let ids: Vec<_> = table.records.iter().filter_map(|r| r.order_id.as_deref()).collect();
    assert_eq!(ids, vec!["1", "2", "3", "4", "5"]);
    assert!(table.has_column("store"));

    let selection = FilterSelection::WithDiscount {
        genres: genres(&["Romance", "SciFi/Fantasy"]),
        price: PriceRange::new(0.0, 20.0),
        discount: DiscountFilter::DiscountedOnly,
    };
    let filtered = filter_table(&table, &selection);
    let ids: Vec<_> = filtered.records.iter().filter_map(|r| r.order_id.as_deref()).collect();
    assert_eq!(ids, vec!["1", "4"]);

    let summary = SalesSummary::compute(&filtered).unwrap();
    assert_eq!(summary.total_sales, 2);
    assert!((summary.revenue - 24.5).abs() < 1e-9);

    let monthly = aggregate::monthly_revenue(&filtered);
    assert_eq!(monthly[6], ("July".to_string(), 10.0));
    assert_eq!(monthly[11], ("December".to_string(), 14.5));

    // The cached table is untouched by filtering.
    let again = store.load(&path).unwrap();
    assert!(Arc::ptr_eq(&table, &again));
    assert_eq!(again.len(), 5);
}

#[test]
fn concrete_three_row_scenario() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("three.csv");
    std::fs::write(
        &path,
        "order_id,genre_desc,price,discount\n1,Romance,10,0.1\n2,Romance,25,0\n3,Mystery,10,0\n",
    )
    .unwrap();

    let table = store().load(&path).unwrap();
    let selection = FilterSelection::WithDiscount {
        genres: genres(&["Romance"]),
        price: PriceRange::new(0.0, 20.0),
        discount: DiscountFilter::DiscountedOnly,
    };
    let result = filter_table(&table, &selection);
    assert_eq!(result.len(), 1);
    assert_eq!(result.records[0].order_id.as_deref(), Some("1"));
    assert_eq!(result.records[0].genre, "Romance");
    assert_eq!(result.records[0].price, 10.0);
    assert_eq!(result.records[0].discount, Some(0.1));
}

#[test]
fn empty_result_is_not_an_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("df.csv");
    std::fs::write(&path, SALES_CSV).unwrap();

    let table = store().load(&path).unwrap();
    let selection = FilterSelection::GenreAndPrice {
        genres: GenreSelection::All,
        price: PriceRange::new(100.0, 200.0),
    };
    let result = filter_table(&table, &selection);
    assert!(result.is_empty());
    assert!(SalesSummary::compute(&result).is_none());
    assert!(aggregate::mean_price_by_genre(&result).is_empty());
}

#[test]
fn default_selection_keeps_every_row() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("df.csv");
    std::fs::write(&path, SALES_CSV).unwrap();

    let table = store().load(&path).unwrap();
    for view in [View::Sales, View::Ratings] {
        let selection = FilterSelection::for_view(view, &table);
        assert_eq!(&filter_table(&table, &selection), table.as_ref());
    }
}

#[test]
fn missing_file_is_data_unavailable() {
    let err = store().load("does_not_exist.csv").unwrap_err();
    let DataError::DataUnavailable { path, reason } = err;
    assert_eq!(path, "does_not_exist.csv");
    assert!(!reason.is_empty());
}

#[test]
fn configured_column_names_reach_the_loader() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("books.csv");
    std::fs::write(&path, "sku,category,amount\nA,Poetry,4\nA,Poetry,5\nB,Memoir,20\n").unwrap();

    let config = DashboardConfig {
        columns: ColumnNames {
            order_id: "sku".into(),
            genre: "category".into(),
            price: "amount".into(),
            ..ColumnNames::default()
        },
        cache: CachePolicy::Disabled,
        ..DashboardConfig::default()
    }
    .with_paths(vec![path.display().to_string()]);

    let store = DatasetStore::new(config.columns.clone(), config.cache);
    let table = store.load(&config.sales_path).unwrap();
    assert_eq!(table.len(), 2);
    assert_eq!(
        aggregate::mean_price_by_genre(&table),
        vec![("Poetry".to_string(), 4.0), ("Memoir".to_string(), 20.0)]
    );
}
